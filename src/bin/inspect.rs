//! Whitelist Inspect CLI
//!
//! Operational tool for looking inside a whitelist snapshot file without
//! going through the chat transport.
//!
//! Usage:
//!   cargo run --bin wl-inspect                       # summary of all chats
//!   cargo run --bin wl-inspect -- --chat -100123     # one chat's listing
//!
//! Author: AI-Generated
//! Created: 2026-08-30

use anyhow::Result;
use clap::Parser;
use solwl_bot::lister;
use solwl_bot::{load_config, WhitelistStore};
use tracing::{info, Level};

/// Solana Whitelist Bot snapshot inspector
#[derive(Parser)]
#[command(name = "wl-inspect")]
struct Args {
    /// Snapshot file to inspect (defaults to WHITELIST_FILE / config default)
    #[arg(short, long, env = "WHITELIST_FILE")]
    file: Option<String>,

    /// Print the chunked listing for this chat id instead of the summary
    #[arg(short, long)]
    chat: Option<i64>,

    /// Message size ceiling used when chunking the listing
    #[arg(short, long, default_value_t = 4096)]
    limit: usize,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = load_config()?;
    let file = args.file.unwrap_or(config.store_file);

    info!("Inspecting snapshot: {}", file);
    let store = WhitelistStore::new(&file);
    let snapshot = store.load();

    match args.chat {
        Some(chat_id) => {
            let whitelist = snapshot.get(&chat_id.to_string()).cloned().unwrap_or_default();
            let gate = if whitelist.adding_allowed { "open" } else { "closed" };
            println!("chat {} — admission {}, {} entries", chat_id, gate, whitelist.entries.len());
            for (i, chunk) in lister::render(&whitelist, args.limit).iter().enumerate() {
                println!("--- chunk {} ({} chars) ---", i + 1, chunk.len());
                println!("{}", chunk);
            }
        }
        None => {
            println!("{} chats in snapshot", snapshot.len());
            let mut chats: Vec<_> = snapshot.iter().collect();
            chats.sort_by(|a, b| a.0.cmp(b.0));
            for (chat_id, whitelist) in chats {
                let gate = if whitelist.adding_allowed { "open" } else { "closed" };
                println!(
                    "  chat {:>15}  admission {:<6}  {} entries",
                    chat_id,
                    gate,
                    whitelist.entries.len()
                );
            }
        }
    }

    Ok(())
}
