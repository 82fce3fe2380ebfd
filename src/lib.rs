//! Solana Address Whitelist Bot Library
//!
//! Scans chat messages for Solana-address-shaped tokens and keeps a
//! per-chat whitelist of first-seen addresses behind an admin-controlled
//! admission gate. Transport-agnostic: the chat platform is injected
//! through the ChatAdminApi capability.
//!
//! Author: AI-Generated
//! Created: 2026-08-30

pub mod admission;
pub mod commands;
pub mod config;
pub mod engine;
pub mod lister;
pub mod matcher;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use admission::{AdmissionPolicy, ChatAdminApi};
pub use commands::{handle_command, handle_text, Command};
pub use config::load_config;
pub use engine::ChatWhitelistEngine;
pub use store::{StoreError, WhitelistStore};
pub use types::{
    BotConfig, CandidateOutcome, ChatId, ChatKind, ChatRef, ChatWhitelist, MessageOutcome,
    SubmissionPolicy, ToggleOutcome, UserId, WhitelistEntry, WhitelistSnapshot,
};
