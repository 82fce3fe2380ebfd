//! Command surface and reply rendering
//!
//! Transport-facing glue with no transport dependency: parses the bot's
//! command names, drives the engine, and turns outcomes into reply
//! strings. The verbosity setting suppresses informational replies only;
//! Saved confirmations always go out.
//!
//! Author: AI-Generated
//! Created: 2026-08-30

use crate::admission::ChatAdminApi;
use crate::engine::ChatWhitelistEngine;
use crate::types::{CandidateOutcome, ChatRef, MessageOutcome, ToggleOutcome, UserId};

pub const REPLY_ADMIN_ONLY: &str = "This command can only be used by administrators.";
pub const REPLY_ADDING_ENABLED: &str = "Adding new Solana addresses is now allowed.";
pub const REPLY_ADDING_DISABLED: &str = "Adding new Solana addresses is now disabled.";
pub const REPLY_ADMISSION_CLOSED: &str =
    "Adding new Solana addresses is currently not allowed in this chat.";
pub const REPLY_NO_CANDIDATES: &str =
    "Please provide a valid Solana address. This whitelist only accepts Solana addresses.";
pub const REPLY_ONE_PER_USER: &str = "Each user can only save one address.";
pub const REPLY_ALREADY_LISTED: &str = "This address is already whitelisted in this chat.";
pub const REPLY_SAVE_FAILED: &str = "Could not save the address right now. Please try again.";

/// Commands the transport layer dispatches to the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// /start: open admission (admin-only).
    StartAdding,
    /// /stop: close admission (admin-only).
    StopAdding,
    /// /list: chunked whitelist, any member.
    List,
    /// /yap: flip reply verbosity (admin-only).
    ToggleVerbose,
}

impl Command {
    /// Parse a command message. Accepts the `/cmd@BotName` form groups use.
    /// Non-commands return None and fall through to the message handler.
    pub fn parse(text: &str) -> Option<Self> {
        let first = text.trim().split_whitespace().next()?;
        if !first.starts_with('/') {
            return None;
        }
        let name = first[1..].split('@').next().unwrap_or("");
        match name {
            "start" => Some(Command::StartAdding),
            "stop" => Some(Command::StopAdding),
            "list" => Some(Command::List),
            "yap" => Some(Command::ToggleVerbose),
            _ => None,
        }
    }
}

/// Execute a command against the engine and produce the replies to send,
/// in order. An empty vector means stay silent.
pub async fn handle_command<A: ChatAdminApi>(
    engine: &ChatWhitelistEngine<A>,
    chat: ChatRef,
    user: UserId,
    command: Command,
) -> Vec<String> {
    match command {
        Command::StartAdding => toggle_replies(
            engine.set_adding_allowed(chat, user, true).await,
            engine.verbose(),
        ),
        Command::StopAdding => toggle_replies(
            engine.set_adding_allowed(chat, user, false).await,
            engine.verbose(),
        ),
        Command::List => engine.list(chat.id),
        Command::ToggleVerbose => match engine.toggle_verbose(chat, user).await {
            Some(verbose) => vec![format!("Yapp is set to {}", verbose)],
            None if engine.verbose() => vec![REPLY_ADMIN_ONLY.to_string()],
            None => vec![],
        },
    }
}

/// Scan a free-text message and produce the replies to send.
pub async fn handle_text<A: ChatAdminApi>(
    engine: &ChatWhitelistEngine<A>,
    chat: ChatRef,
    user: UserId,
    text: &str,
) -> Vec<String> {
    let outcome = engine.handle_message(chat, user, text).await;
    message_replies(&outcome, engine.verbose())
}

fn toggle_replies(outcome: ToggleOutcome, verbose: bool) -> Vec<String> {
    match outcome {
        ToggleOutcome::Applied { adding_allowed } if verbose => {
            let reply = if adding_allowed {
                REPLY_ADDING_ENABLED
            } else {
                REPLY_ADDING_DISABLED
            };
            vec![reply.to_string()]
        }
        ToggleOutcome::Applied { .. } => vec![],
        ToggleOutcome::Unauthorized if verbose => vec![REPLY_ADMIN_ONLY.to_string()],
        ToggleOutcome::Unauthorized => vec![],
        // A failed write is always reported; the caller must not believe
        // the toggle landed.
        ToggleOutcome::SaveFailed => vec![REPLY_SAVE_FAILED.to_string()],
    }
}

/// Replies for a scanned message. Saved is unconditional; everything
/// else only speaks when verbose.
pub fn message_replies(outcome: &MessageOutcome, verbose: bool) -> Vec<String> {
    match outcome {
        MessageOutcome::AdmissionClosed if verbose => vec![REPLY_ADMISSION_CLOSED.to_string()],
        MessageOutcome::AdmissionClosed => vec![],
        MessageOutcome::NoCandidates if verbose => vec![REPLY_NO_CANDIDATES.to_string()],
        MessageOutcome::NoCandidates => vec![],
        MessageOutcome::Candidates(outcomes) => outcomes
            .iter()
            .filter_map(|c| match c {
                CandidateOutcome::Saved(address) => {
                    Some(format!("Saved Solana address: {}", address))
                }
                CandidateOutcome::DuplicateSubmitter if verbose => {
                    Some(REPLY_ONE_PER_USER.to_string())
                }
                CandidateOutcome::DuplicateAddress if verbose => {
                    Some(REPLY_ALREADY_LISTED.to_string())
                }
                CandidateOutcome::SaveFailed => Some(REPLY_SAVE_FAILED.to_string()),
                _ => None,
            })
            .collect(),
    }
}
