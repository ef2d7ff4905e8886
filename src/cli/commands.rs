//! Command implementations

use crate::catalog::{ChallengeCatalog, Difficulty};
use crate::config::BotConfig;
use crate::llm::{parse_verdict, LlmClient, Verdict};
use crate::storage::Database;
use anyhow::Result;
use std::path::Path;

use super::OutputFormat;

/// Show database statistics
pub fn stats(
    db_path: &Path,
    user: Option<&str>,
    guild: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let db = Database::open(db_path)?;
    let stats = db.get_stats()?;

    let user_stats = match (user, guild) {
        (Some(u), Some(g)) => db.get_user_stats(u, g)?,
        (Some(_), None) => {
            anyhow::bail!("--user requires --guild");
        }
        _ => None,
    };

    match format {
        OutputFormat::Json => {
            let mut out = serde_json::json!({
                "submissions": stats.submissions,
                "pending": stats.pending,
                "reviewing": stats.reviewing,
                "reviewed": stats.reviewed,
                "failed": stats.failed,
                "users_tracked": stats.users_tracked,
            });
            if let Some(us) = user_stats {
                out["user"] = serde_json::json!({
                    "user_id": us.user_id,
                    "guild_id": us.guild_id,
                    "total_solved": us.total_solved,
                    "total_points": us.total_points,
                    "current_streak": us.current_streak,
                    "best_streak": us.best_streak,
                    "last_solved_at": us.last_solved_at.map(|t| t.to_rfc3339()),
                });
            }
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            println!("Submissions: {}", stats.submissions);
            println!("  Pending:   {}", stats.pending);
            println!("  Reviewing: {}", stats.reviewing);
            println!("  Reviewed:  {}", stats.reviewed);
            println!("  Failed:    {}", stats.failed);
            println!("Users tracked: {}", stats.users_tracked);

            if let Some(us) = user_stats {
                println!("\nUser {} in guild {}:", us.user_id, us.guild_id);
                println!("  Solved: {}", us.total_solved);
                println!("  Points: {}", us.total_points);
                println!(
                    "  Streak: {} (best {})",
                    us.current_streak, us.best_streak
                );
            }
        }
    }

    Ok(())
}

/// List the challenge catalog
pub fn catalog(tier: Option<&str>, detailed: bool, format: OutputFormat) -> Result<()> {
    let catalog = ChallengeCatalog::load();

    let tier = match tier {
        Some(s) => Some(
            Difficulty::parse(s)
                .ok_or_else(|| anyhow::anyhow!("unknown difficulty: {s}"))?,
        ),
        None => None,
    };

    let challenges: Vec<_> = match tier {
        Some(t) => catalog.tier(t).collect(),
        None => catalog.entries().iter().collect(),
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&challenges)?);
        }
        OutputFormat::Text => {
            for challenge in challenges {
                println!(
                    "{:<4} [{}] {}",
                    challenge.id, challenge.difficulty, challenge.title
                );
                if detailed {
                    println!("     {}", challenge.description);
                    if !challenge.tags.is_empty() {
                        println!("     tags: {}", challenge.tags.join(", "));
                    }
                }
            }
        }
    }

    Ok(())
}

/// Check connectivity to the review endpoint
pub async fn check_llm(config: &BotConfig, probe: bool) -> Result<()> {
    let client = LlmClient::new(config.llm.to_client_config());

    if !client.is_available().await {
        anyhow::bail!("LLM endpoint {} is not reachable", config.llm.endpoint);
    }
    println!("✓ Endpoint reachable: {}", config.llm.endpoint);
    println!("  Model: {}", config.llm.model);

    if probe {
        let reply = client
            .complete(
                "Reply with exactly this JSON and nothing else: \
                 {\"is_correct\": true, \"confidence\": 1.0, \"explanation\": \"probe\"}",
            )
            .await?;

        match parse_verdict(&reply.content) {
            Verdict::Parsed(v) => {
                println!("✓ Probe verdict parsed (confidence {:?})", v.confidence);
            }
            Verdict::Unparseable { raw } => {
                println!("⚠ Probe reply did not parse as a verdict:");
                println!("  {:.200}", raw);
            }
        }
    }

    Ok(())
}
