//! CodeDojo - AI-reviewed coding challenges for chat servers
//!
//! This library implements the challenge-review subsystem of the bot:
//! extracting code from messages, admitting submissions through a bounded
//! queue, reviewing them against a static challenge catalog via an LLM,
//! and keeping a transactional points/streak ledger per user.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod extract;
pub mod gateway;
pub mod llm;
pub mod review;
pub mod scan;
pub mod storage;

/// Re-export commonly used types
pub use catalog::{Challenge, ChallengeCatalog, Difficulty};
pub use config::BotConfig;
pub use review::{ReviewEngine, SubmissionEvent, SubmitOutcome};
pub use scan::Scanner;
pub use storage::Database;

/// Application-wide error type
pub use anyhow::Result;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "codedojo";
