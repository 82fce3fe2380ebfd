//! Whitelist listing: chunked rendering
//!
//! Renders a chat's whitelist as one or more message-sized text chunks.
//! Greedy packing against the platform ceiling; every chunk restarts
//! with the header line so each stands alone when delivered.
//!
//! Author: AI-Generated
//! Created: 2026-08-30

use crate::types::ChatWhitelist;

/// First line of every chunk.
pub const LIST_HEADER: &str = "Whitelisted Solana addresses:";

/// Reply used when the chat has no entries.
pub const EMPTY_LIST_MESSAGE: &str = "No whitelisted Solana addresses found for this chat.";

/// Render the whitelist as chunks of at most `limit` characters, one
/// address per line in insertion order. An empty whitelist yields a
/// single informational chunk.
pub fn render(whitelist: &ChatWhitelist, limit: usize) -> Vec<String> {
    if whitelist.entries.is_empty() {
        return vec![EMPTY_LIST_MESSAGE.to_string()];
    }

    let base = format!("{}\n", LIST_HEADER);
    let mut chunks = Vec::new();
    let mut current = base.clone();

    for entry in &whitelist.entries {
        // +1 for the trailing newline
        if current.len() + entry.address.len() + 1 > limit && current != base {
            chunks.push(current.trim_end().to_string());
            current = base.clone();
        }
        current.push_str(&entry.address);
        current.push('\n');
    }

    if current != base {
        chunks.push(current.trim_end().to_string());
    }

    chunks
}
