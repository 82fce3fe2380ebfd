//! Admission policy: who may open or close a chat's whitelist
//!
//! Wraps the injected admin-lookup capability and the durable
//! adding_allowed toggle. Private chats treat every participant as an
//! admin; elsewhere the transport's administrator set decides.
//!
//! Author: AI-Generated
//! Created: 2026-08-30

use crate::types::{ChatId, ChatRef, UserId};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use tracing::warn;

/// Admin-set lookup, implemented by the chat transport.
/// Injected so the core stays transport-free and unit-testable.
#[async_trait]
pub trait ChatAdminApi: Send + Sync {
    /// Current administrator set of a non-private chat.
    async fn chat_administrators(&self, chat_id: ChatId) -> Result<HashSet<UserId>>;
}

/// Decides whether a caller holds admin capability for a chat.
pub struct AdmissionPolicy<A: ChatAdminApi> {
    admin_api: A,
}

impl<A: ChatAdminApi> AdmissionPolicy<A> {
    pub fn new(admin_api: A) -> Self {
        Self { admin_api }
    }

    /// True unconditionally in private chats; otherwise true iff the user
    /// is in the chat's administrator set. A failed lookup denies: a
    /// transport hiccup must never open admission.
    pub async fn is_admin(&self, chat: ChatRef, user: UserId) -> bool {
        if chat.is_private() {
            return true;
        }

        match self.admin_api.chat_administrators(chat.id).await {
            Ok(admins) => admins.contains(&user),
            Err(e) => {
                warn!("Admin lookup failed for chat {}: {} — denying", chat.id, e);
                false
            }
        }
    }
}
