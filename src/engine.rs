//! Chat whitelist engine
//!
//! Orchestrates one inbound event end to end: admission gate, candidate
//! extraction, dedup against the stored snapshot, save-then-report
//! persistence. Every load-mutate-save unit runs under one store-wide
//! lock: the backing file holds all chats in a single snapshot, so any
//! two concurrent mutations race on it regardless of chat — a per-chat
//! lock cannot prevent the lost-write.
//!
//! Author: AI-Generated
//! Created: 2026-08-30

use crate::admission::{AdmissionPolicy, ChatAdminApi};
use crate::lister;
use crate::matcher;
use crate::store::WhitelistStore;
use crate::types::{
    BotConfig, CandidateOutcome, ChatId, ChatRef, ChatWhitelist, MessageOutcome,
    SubmissionPolicy, ToggleOutcome, UserId, WhitelistEntry,
};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

/// The core orchestrator. One instance per process, shared across events.
pub struct ChatWhitelistEngine<A: ChatAdminApi> {
    store: WhitelistStore,
    admission: AdmissionPolicy<A>,
    policy: SubmissionPolicy,
    message_limit: usize,
    /// Process-wide reply verbosity; mutated only through set_verbose
    /// (admin-gated by the command layer). Saved replies ignore this.
    verbose: AtomicBool,
    /// Serializes load-mutate-save over the shared snapshot file.
    store_lock: Mutex<()>,
}

impl<A: ChatAdminApi> ChatWhitelistEngine<A> {
    pub fn new(config: &BotConfig, admin_api: A) -> Self {
        info!(
            "Whitelist engine: policy={}, store={}, verbose={}",
            config.policy, config.store_file, config.verbose_replies
        );
        Self {
            store: WhitelistStore::new(&config.store_file),
            admission: AdmissionPolicy::new(admin_api),
            policy: config.policy,
            message_limit: config.message_limit,
            verbose: AtomicBool::new(config.verbose_replies),
            store_lock: Mutex::new(()),
        }
    }

    pub fn submission_policy(&self) -> SubmissionPolicy {
        self.policy
    }

    pub fn verbose(&self) -> bool {
        self.verbose.load(Ordering::Relaxed)
    }

    pub fn set_verbose(&self, verbose: bool) {
        self.verbose.store(verbose, Ordering::Relaxed);
    }

    /// Flip verbosity and return the new value (admin-gated /yap).
    pub async fn toggle_verbose(&self, chat: ChatRef, user: UserId) -> Option<bool> {
        if !self.admission.is_admin(chat, user).await {
            return None;
        }
        let new = !self.verbose();
        self.set_verbose(new);
        Some(new)
    }

    /// Scan one text message for address candidates and record the
    /// accepted ones. Policy, in candidate order:
    /// - gate closed or chat unknown: AdmissionClosed, nothing touched;
    /// - no candidates: NoCandidates;
    /// - per-user policy: first submission per user wins, later ones are
    ///   DuplicateSubmitter and never overwrite;
    /// - open-set policy: an address registers at most once per chat;
    /// - each accepted address is durable before its Saved outcome exists
    ///   (save-then-notify). A failed save discards that entry, yields
    ///   SaveFailed, and stops the scan.
    pub async fn handle_message(
        &self,
        chat: ChatRef,
        submitter: UserId,
        text: &str,
    ) -> MessageOutcome {
        let _guard = self.store_lock.lock().await;

        let mut snapshot = self.store.load();
        let key = chat.id.to_string();

        let allowed = snapshot.get(&key).map(|c| c.adding_allowed).unwrap_or(false);
        if !allowed {
            debug!("Chat {}: admission closed, message ignored", chat.id);
            return MessageOutcome::AdmissionClosed;
        }

        let candidates = matcher::extract_candidates(text);
        if candidates.is_empty() {
            return MessageOutcome::NoCandidates;
        }

        let mut outcomes = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let wl = snapshot.entry(key.clone()).or_default();

            let duplicate = match self.policy {
                SubmissionPolicy::PerUser if wl.entry_for(submitter).is_some() => {
                    Some(CandidateOutcome::DuplicateSubmitter)
                }
                SubmissionPolicy::OpenSet if wl.contains_address(candidate) => {
                    Some(CandidateOutcome::DuplicateAddress)
                }
                _ => None,
            };
            if let Some(outcome) = duplicate {
                outcomes.push(outcome);
                continue;
            }

            wl.entries.push(WhitelistEntry {
                user: submitter,
                address: candidate.to_string(),
            });

            // Save-then-notify: the entry must be durable before Saved exists
            match self.store.save(&snapshot) {
                Ok(()) => {
                    info!("Chat {}: saved address {} from user {}", chat.id, candidate, submitter);
                    outcomes.push(CandidateOutcome::Saved(candidate.to_string()));
                }
                Err(e) => {
                    error!("Chat {}: store write failed: {} — discarding entry", chat.id, e);
                    // Discard the attempted mutation and stop scanning
                    if let Some(wl) = snapshot.get_mut(&key) {
                        wl.entries.pop();
                    }
                    outcomes.push(CandidateOutcome::SaveFailed);
                    break;
                }
            }
        }

        MessageOutcome::Candidates(outcomes)
    }

    /// Open or close admission for a chat. Admin-only (any user counts as
    /// admin in a private chat); refusal leaves state untouched. A
    /// previously unseen chat is created closed, then the toggle applies.
    pub async fn set_adding_allowed(
        &self,
        chat: ChatRef,
        user: UserId,
        allowed: bool,
    ) -> ToggleOutcome {
        if !self.admission.is_admin(chat, user).await {
            debug!("Chat {}: user {} is not an admin, toggle refused", chat.id, user);
            return ToggleOutcome::Unauthorized;
        }

        let _guard = self.store_lock.lock().await;

        let mut snapshot = self.store.load();
        let wl = snapshot.entry(chat.id.to_string()).or_default();
        let previous = wl.adding_allowed;
        wl.adding_allowed = allowed;

        match self.store.save(&snapshot) {
            Ok(()) => {
                info!(
                    "Chat {}: adding_allowed {} -> {} (by user {})",
                    chat.id, previous, allowed, user
                );
                ToggleOutcome::Applied { adding_allowed: allowed }
            }
            Err(e) => {
                error!("Chat {}: store write failed on toggle: {}", chat.id, e);
                ToggleOutcome::SaveFailed
            }
        }
    }

    /// Current whitelist state of a chat (empty default if unseen).
    pub fn chat_state(&self, chat_id: ChatId) -> ChatWhitelist {
        self.store
            .load()
            .remove(&chat_id.to_string())
            .unwrap_or_default()
    }

    /// Render a chat's whitelist as message-sized chunks. Open to any
    /// member; read-only, so no lock is taken.
    pub fn list(&self, chat_id: ChatId) -> Vec<String> {
        lister::render(&self.chat_state(chat_id), self.message_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WhitelistSnapshot;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::env;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Arc;

    const ADDR_A: &str = "4Nd1mZ2LbkxyYyBM5TQDLYaDgGeyYcvMnbFqRRvGpump";
    const ADDR_B: &str = "11111111111111111111111111111111111111111111";

    const ADMIN: UserId = UserId(1);
    const MEMBER: UserId = UserId(2);

    struct FakeAdminApi {
        admins: HashSet<UserId>,
    }

    #[async_trait]
    impl ChatAdminApi for FakeAdminApi {
        async fn chat_administrators(&self, _chat_id: ChatId) -> Result<HashSet<UserId>> {
            Ok(self.admins.clone())
        }
    }

    fn test_engine(name: &str, policy: SubmissionPolicy) -> (ChatWhitelistEngine<FakeAdminApi>, PathBuf) {
        let dir = env::temp_dir().join("solwl_engine_test");
        let _ = fs::create_dir_all(&dir);
        let path = dir.join(format!("{}.json", name));
        let _ = fs::remove_file(&path);

        let config = BotConfig {
            store_file: path.to_string_lossy().to_string(),
            policy,
            ..BotConfig::default()
        };
        let api = FakeAdminApi {
            admins: [ADMIN].into_iter().collect(),
        };
        (ChatWhitelistEngine::new(&config, api), path)
    }

    fn group(id: i64) -> ChatRef {
        ChatRef::new(ChatId(id), crate::types::ChatKind::Group)
    }

    #[tokio::test]
    async fn test_closed_chat_ignores_addresses() {
        let (engine, path) = test_engine("closed", SubmissionPolicy::PerUser);
        let chat = group(-100);

        let outcome = engine.handle_message(chat, MEMBER, ADDR_A).await;
        assert_eq!(outcome, MessageOutcome::AdmissionClosed);
        // No store write at all
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_saved_then_duplicate_submitter() {
        let (engine, path) = test_engine("dup_submitter", SubmissionPolicy::PerUser);
        let chat = group(-100);

        engine.set_adding_allowed(chat, ADMIN, true).await;

        let first = engine.handle_message(chat, MEMBER, ADDR_A).await;
        assert_eq!(
            first,
            MessageOutcome::Candidates(vec![CandidateOutcome::Saved(ADDR_A.to_string())])
        );

        // Second, distinct address from the same user: first submission wins
        let second = engine.handle_message(chat, MEMBER, ADDR_B).await;
        assert_eq!(
            second,
            MessageOutcome::Candidates(vec![CandidateOutcome::DuplicateSubmitter])
        );

        let state = engine.chat_state(chat.id);
        assert_eq!(state.entries.len(), 1);
        assert_eq!(state.entries[0].address, ADDR_A);

        let _ = fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_open_set_deduplicates_by_address() {
        let (engine, path) = test_engine("dup_address", SubmissionPolicy::OpenSet);
        let chat = group(-100);

        engine.set_adding_allowed(chat, ADMIN, true).await;

        engine.handle_message(chat, MEMBER, ADDR_A).await;
        // Same address from a different user: rejected under open-set
        let outcome = engine.handle_message(chat, UserId(3), ADDR_A).await;
        assert_eq!(
            outcome,
            MessageOutcome::Candidates(vec![CandidateOutcome::DuplicateAddress])
        );

        // A different address from the first user is fine (no per-user cap)
        let outcome = engine.handle_message(chat, MEMBER, ADDR_B).await;
        assert_eq!(
            outcome,
            MessageOutcome::Candidates(vec![CandidateOutcome::Saved(ADDR_B.to_string())])
        );

        let _ = fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_no_candidates() {
        let (engine, path) = test_engine("no_candidates", SubmissionPolicy::PerUser);
        let chat = group(-100);

        engine.set_adding_allowed(chat, ADMIN, true).await;
        let outcome = engine.handle_message(chat, MEMBER, "just chatting").await;
        assert_eq!(outcome, MessageOutcome::NoCandidates);

        let _ = fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_multiple_candidates_in_one_message() {
        let (engine, path) = test_engine("multi", SubmissionPolicy::PerUser);
        let chat = group(-100);

        engine.set_adding_allowed(chat, ADMIN, true).await;
        let text = format!("{} and {}", ADDR_A, ADDR_B);
        let outcome = engine.handle_message(chat, MEMBER, &text).await;

        // First candidate saved, second hits the per-user cap
        assert_eq!(
            outcome,
            MessageOutcome::Candidates(vec![
                CandidateOutcome::Saved(ADDR_A.to_string()),
                CandidateOutcome::DuplicateSubmitter,
            ])
        );

        let _ = fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_per_chat_isolation() {
        let (engine, path) = test_engine("isolation", SubmissionPolicy::PerUser);
        let chat_a = group(-100);
        let chat_b = group(-200);

        engine.set_adding_allowed(chat_a, ADMIN, true).await;
        engine.handle_message(chat_a, MEMBER, ADDR_A).await;

        assert_eq!(engine.chat_state(chat_a.id).entries.len(), 1);
        assert!(engine.chat_state(chat_b.id).entries.is_empty());

        let _ = fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_non_admin_cannot_toggle() {
        let (engine, path) = test_engine("unauthorized", SubmissionPolicy::PerUser);
        let chat = group(-100);

        let outcome = engine.set_adding_allowed(chat, MEMBER, true).await;
        assert_eq!(outcome, ToggleOutcome::Unauthorized);
        assert!(!engine.chat_state(chat.id).adding_allowed);

        let _ = fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_private_chat_user_is_admin() {
        let (engine, path) = test_engine("private", SubmissionPolicy::PerUser);
        let chat = ChatRef::new(ChatId(55), crate::types::ChatKind::Private);

        // MEMBER is not in the admin set, but the chat is private
        let outcome = engine.set_adding_allowed(chat, MEMBER, true).await;
        assert_eq!(outcome, ToggleOutcome::Applied { adding_allowed: true });

        let _ = fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_toggle_is_durable() {
        let dir = env::temp_dir().join("solwl_engine_test");
        let _ = fs::create_dir_all(&dir);
        let path = dir.join("durable.json");
        let _ = fs::remove_file(&path);

        let config = BotConfig {
            store_file: path.to_string_lossy().to_string(),
            ..BotConfig::default()
        };
        let chat = group(-100);

        {
            let api = FakeAdminApi { admins: [ADMIN].into_iter().collect() };
            let engine = ChatWhitelistEngine::new(&config, api);
            engine.set_adding_allowed(chat, ADMIN, true).await;
        }

        // Fresh engine over the same file: state survives the "restart"
        let api = FakeAdminApi { admins: [ADMIN].into_iter().collect() };
        let engine = ChatWhitelistEngine::new(&config, api);
        assert!(engine.chat_state(chat.id).adding_allowed);

        let _ = fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_toggle_close_stops_admission() {
        let (engine, path) = test_engine("reclose", SubmissionPolicy::PerUser);
        let chat = group(-100);

        engine.set_adding_allowed(chat, ADMIN, true).await;
        engine.set_adding_allowed(chat, ADMIN, false).await;

        let outcome = engine.handle_message(chat, MEMBER, ADDR_A).await;
        assert_eq!(outcome, MessageOutcome::AdmissionClosed);

        let _ = fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_concurrent_same_chat_submissions_both_land() {
        let (engine, path) = test_engine("concurrent", SubmissionPolicy::PerUser);
        let chat = group(-100);
        engine.set_adding_allowed(chat, ADMIN, true).await;

        let engine = Arc::new(engine);
        let e1 = Arc::clone(&engine);
        let e2 = Arc::clone(&engine);
        let t1 = tokio::spawn(async move { e1.handle_message(chat, UserId(10), ADDR_A).await });
        let t2 = tokio::spawn(async move { e2.handle_message(chat, UserId(11), ADDR_B).await });
        t1.await.unwrap();
        t2.await.unwrap();

        // Neither write may be lost to a stale-snapshot race
        let state = engine.chat_state(chat.id);
        assert_eq!(state.entries.len(), 2);

        let _ = fs::remove_file(path);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_cross_chat_submissions_not_lost() {
        let (engine, path) = test_engine("cross_chat", SubmissionPolicy::PerUser);
        let chat_a = group(-1);
        let chat_b = group(-2);
        engine.set_adding_allowed(chat_a, ADMIN, true).await;
        engine.set_adding_allowed(chat_b, ADMIN, true).await;

        // Base-58 only: 32 ones + chat tag + round index
        const B58: &[u8] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijk";
        let addr = |tag: char, round: usize| {
            format!("{}{}{}", "1".repeat(32), tag, B58[round] as char)
        };

        let engine = Arc::new(engine);
        let rounds = 40;
        for round in 0..rounds {
            let e1 = Arc::clone(&engine);
            let e2 = Arc::clone(&engine);
            let a = addr('a', round);
            let b = addr('b', round);
            let u1 = UserId(1000 + round as i64);
            let u2 = UserId(2000 + round as i64);
            let t1 = tokio::spawn(async move { e1.handle_message(chat_a, u1, &a).await });
            let t2 = tokio::spawn(async move { e2.handle_message(chat_b, u2, &b).await });
            t1.await.unwrap();
            t2.await.unwrap();
        }

        // One whole-file snapshot backs every chat: a submission to chat A
        // must never clobber a concurrent submission to chat B.
        assert_eq!(engine.chat_state(chat_a.id).entries.len(), rounds);
        assert_eq!(engine.chat_state(chat_b.id).entries.len(), rounds);

        let _ = fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_save_failure_discards_entry() {
        let dir = env::temp_dir().join("solwl_engine_test");
        let _ = fs::create_dir_all(&dir);
        // Filename at the 255-byte limit: the snapshot itself is readable,
        // but the save's longer temp sibling can never be created.
        let path = dir.join(format!("{}.json", "1".repeat(250)));

        // Seed an open chat with one entry, bypassing the store
        let mut snapshot = WhitelistSnapshot::new();
        snapshot.insert(
            "-100".to_string(),
            ChatWhitelist {
                adding_allowed: true,
                entries: vec![WhitelistEntry {
                    user: MEMBER,
                    address: ADDR_A.to_string(),
                }],
            },
        );
        fs::write(&path, serde_json::to_string(&snapshot).unwrap()).unwrap();

        let config = BotConfig {
            store_file: path.to_string_lossy().to_string(),
            ..BotConfig::default()
        };
        let api = FakeAdminApi { admins: [ADMIN].into_iter().collect() };
        let engine = ChatWhitelistEngine::new(&config, api);
        let chat = group(-100);

        let outcome = engine.handle_message(chat, UserId(9), ADDR_B).await;
        assert_eq!(
            outcome,
            MessageOutcome::Candidates(vec![CandidateOutcome::SaveFailed])
        );

        // No false "saved": the durable state still holds only the seed
        let state = engine.chat_state(chat.id);
        assert_eq!(state.entries.len(), 1);
        assert_eq!(state.entries[0].address, ADDR_A);

        let _ = fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_toggle_save_failure_reported() {
        // Parent directory missing: load degrades to empty, save fails
        let base = env::temp_dir().join("solwl_engine_test_missing_dir");
        let _ = fs::remove_dir_all(&base);
        let path = base.join("nope").join("wl.json");

        let config = BotConfig {
            store_file: path.to_string_lossy().to_string(),
            ..BotConfig::default()
        };
        let api = FakeAdminApi { admins: [ADMIN].into_iter().collect() };
        let engine = ChatWhitelistEngine::new(&config, api);
        let chat = group(-100);

        let outcome = engine.set_adding_allowed(chat, ADMIN, true).await;
        assert_eq!(outcome, ToggleOutcome::SaveFailed);
        assert!(!engine.chat_state(chat.id).adding_allowed);
    }

    #[tokio::test]
    async fn test_toggle_verbose_admin_gated() {
        let (engine, path) = test_engine("yap", SubmissionPolicy::PerUser);
        let chat = group(-100);

        assert_eq!(engine.toggle_verbose(chat, MEMBER).await, None);
        assert_eq!(engine.toggle_verbose(chat, ADMIN).await, Some(true));
        assert_eq!(engine.toggle_verbose(chat, ADMIN).await, Some(false));

        let _ = fs::remove_file(path);
    }
}
