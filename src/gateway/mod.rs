//! Chat-platform gateway seam
//!
//! The scanner and the service layer never talk to the platform API
//! directly; they go through [`GatewayClient`] so recovery logic can be
//! tested against an in-memory double without a live connection.

use anyhow::Result;
use async_trait::async_trait;

/// A message fetched back from the platform
#[derive(Debug, Clone)]
pub struct GatewayMessage {
    pub author_id: String,
    pub content: String,
}

/// Minimal read-side view of the chat platform
#[async_trait]
pub trait GatewayClient: Send + Sync {
    /// Whether the bot is still a member of the guild
    async fn guild_exists(&self, guild_id: &str) -> Result<bool>;

    /// The current name of a thread, or `None` if it was deleted
    async fn thread_name(&self, thread_id: &str) -> Result<Option<String>>;

    /// Fetch a message by id, `None` if it was deleted
    async fn fetch_message(
        &self,
        thread_id: &str,
        message_id: &str,
    ) -> Result<Option<GatewayMessage>>;
}

/// In-memory gateway for tests and offline runs
#[derive(Default)]
pub struct MemoryGateway {
    guilds: std::collections::HashSet<String>,
    threads: std::collections::HashMap<String, String>,
    messages: std::collections::HashMap<(String, String), GatewayMessage>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_guild(&mut self, guild_id: &str) {
        self.guilds.insert(guild_id.to_string());
    }

    pub fn add_thread(&mut self, thread_id: &str, name: &str) {
        self.threads.insert(thread_id.to_string(), name.to_string());
    }

    pub fn add_message(&mut self, thread_id: &str, message_id: &str, author_id: &str, content: &str) {
        self.messages.insert(
            (thread_id.to_string(), message_id.to_string()),
            GatewayMessage {
                author_id: author_id.to_string(),
                content: content.to_string(),
            },
        );
    }
}

#[async_trait]
impl GatewayClient for MemoryGateway {
    async fn guild_exists(&self, guild_id: &str) -> Result<bool> {
        Ok(self.guilds.contains(guild_id))
    }

    async fn thread_name(&self, thread_id: &str) -> Result<Option<String>> {
        Ok(self.threads.get(thread_id).cloned())
    }

    async fn fetch_message(
        &self,
        thread_id: &str,
        message_id: &str,
    ) -> Result<Option<GatewayMessage>> {
        Ok(self
            .messages
            .get(&(thread_id.to_string(), message_id.to_string()))
            .cloned())
    }
}
