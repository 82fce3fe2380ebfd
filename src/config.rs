//! Configuration management
//! Load settings from the environment / .env file
//!
//! Author: AI-Generated
//! Created: 2026-08-30

use anyhow::{Context, Result};

// Re-export BotConfig for external access
pub use crate::types::BotConfig;
use crate::types::SubmissionPolicy;

/// Load deployment configuration from the environment. Every setting has
/// a default matching the reference deployment; only malformed values
/// are an error, absent ones are not.
pub fn load_config() -> Result<BotConfig> {
    dotenv::dotenv().ok();

    let defaults = BotConfig::default();

    let store_file = std::env::var("WHITELIST_FILE").unwrap_or(defaults.store_file);

    let message_limit = match std::env::var("MESSAGE_LIMIT") {
        Ok(v) => v.parse().context("MESSAGE_LIMIT must be a positive integer")?,
        Err(_) => defaults.message_limit,
    };

    let policy = match std::env::var("SUBMISSION_POLICY") {
        Ok(v) => SubmissionPolicy::parse(&v).with_context(|| {
            format!("SUBMISSION_POLICY must be 'per-user' or 'open', got '{}'", v)
        })?,
        Err(_) => defaults.policy,
    };

    let verbose_replies = match std::env::var("VERBOSE_REPLIES") {
        Ok(v) => v.parse().context("VERBOSE_REPLIES must be true or false")?,
        Err(_) => defaults.verbose_replies,
    };

    Ok(BotConfig {
        store_file,
        message_limit,
        policy,
        verbose_replies,
    })
}
