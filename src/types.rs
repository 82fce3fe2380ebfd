//! Core data structures for the whitelist bot
//!
//! Shared across the store, engine, and command layers.
//!
//! Author: AI-Generated
//! Created: 2026-08-30

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Stable identifier of a chat (private, group, or channel).
/// Matches the Telegram id space; stored as a string key in the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identifier of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What kind of conversation a message arrived from.
/// Private chats make every participant implicitly an admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatKind {
    Private,
    Group,
    Channel,
}

/// Chat identity plus kind, as delivered by the transport per event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatRef {
    pub id: ChatId,
    pub kind: ChatKind,
}

impl ChatRef {
    pub fn new(id: ChatId, kind: ChatKind) -> Self {
        Self { id, kind }
    }

    pub fn is_private(&self) -> bool {
        self.kind == ChatKind::Private
    }
}

/// Deduplication policy applied when a candidate address passes the
/// admission gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionPolicy {
    /// One address per submitter per chat; first submission wins.
    PerUser,
    /// No per-user cap; an address may appear at most once per chat.
    OpenSet,
}

impl SubmissionPolicy {
    /// Parse from a config string ("per-user" | "open").
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "per-user" | "per_user" | "peruser" => Some(SubmissionPolicy::PerUser),
            "open" | "open-set" | "open_set" => Some(SubmissionPolicy::OpenSet),
            _ => None,
        }
    }
}

impl fmt::Display for SubmissionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SubmissionPolicy::PerUser => write!(f, "per-user"),
            SubmissionPolicy::OpenSet => write!(f, "open"),
        }
    }
}

/// One accepted address, with the submitter it was first seen from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistEntry {
    pub user: UserId,
    pub address: String,
}

/// Per-chat whitelist state: the admission gate plus accepted entries.
///
/// Entries are kept as an insertion-ordered list rather than a map so the
/// listing output is deterministic. Chats are small; dedup is a linear scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatWhitelist {
    /// Whether new submissions are currently accepted. New chats start closed.
    #[serde(default)]
    pub adding_allowed: bool,
    /// Accepted entries in first-seen order.
    #[serde(default)]
    pub entries: Vec<WhitelistEntry>,
}

impl ChatWhitelist {
    /// Entry recorded by this submitter, if any.
    pub fn entry_for(&self, user: UserId) -> Option<&WhitelistEntry> {
        self.entries.iter().find(|e| e.user == user)
    }

    /// Is this address already recorded anywhere in the chat?
    pub fn contains_address(&self, address: &str) -> bool {
        self.entries.iter().any(|e| e.address == address)
    }
}

/// Full persisted state: chat id (stringified) -> per-chat whitelist.
pub type WhitelistSnapshot = HashMap<String, ChatWhitelist>;

/// Outcome for a single candidate address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateOutcome {
    /// Address recorded and durably persisted.
    Saved(String),
    /// Per-user policy: submitter already holds an entry in this chat.
    DuplicateSubmitter,
    /// Open-set policy: address already present in this chat.
    DuplicateAddress,
    /// The store rejected the write; the attempted entry was discarded
    /// and remaining candidates were not processed.
    SaveFailed,
}

/// Overall outcome of handling one inbound text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    /// Chat unknown or adding disabled; nothing was touched.
    AdmissionClosed,
    /// No address-shaped tokens in the message.
    NoCandidates,
    /// One outcome per candidate, in matcher order.
    Candidates(Vec<CandidateOutcome>),
}

/// Outcome of an admin-only admission toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// State now matches the requested value (idempotent set).
    Applied { adding_allowed: bool },
    /// Caller is not an admin of the chat; state untouched.
    Unauthorized,
    /// The store rejected the write; the durable state is unchanged.
    SaveFailed,
}

/// Deployment configuration for the engine and its collaborators.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Path of the JSON snapshot file.
    pub store_file: String,
    /// Platform message size ceiling used by the lister (4096 on Telegram).
    pub message_limit: usize,
    /// Which dedup policy the engine applies.
    pub policy: SubmissionPolicy,
    /// Whether informational (non-Saved) outcomes produce replies.
    pub verbose_replies: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            store_file: "solana_addresses_by_chat.json".to_string(),
            message_limit: 4096,
            policy: SubmissionPolicy::PerUser,
            verbose_replies: false,
        }
    }
}
