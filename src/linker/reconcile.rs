use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use tracing::{info, warn};

use crate::config::LinkDefaults;
use crate::error::{AppError, AppResult};
use crate::store::{Account, AccountStore, NewAccount, NewUser, RecordId, User, UserStore};

use super::locks::KeyedLocks;

/// Optional profile data accompanying a reconciliation, typically sourced
/// from the provider's directory profile. Anything absent falls back to
/// documented placeholder defaults, which callers should treat as
/// provisional data pending later completion.
#[derive(Debug, Clone, Default)]
pub struct ProfileHints {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub mobile_number: Option<i64>,
    pub address: Option<String>,
    pub pincode: Option<i64>,
    pub avatar: Option<String>,
    pub subscription_plan: Option<String>,
    pub subscription_status: Option<String>,
}

/// Outcome of one reconciliation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The user already had a canonical linked account; no writes performed.
    AlreadyLinked { account_id: RecordId },
    /// User and account were created (or completed) and linked by this call.
    Created { user_id: RecordId, account_id: RecordId },
}

impl LinkOutcome {
    pub fn account_id(&self) -> &str {
        match self {
            LinkOutcome::AlreadyLinked { account_id } => account_id,
            LinkOutcome::Created { account_id, .. } => account_id,
        }
    }
}

/// Idempotently ensures a User and Account exist and are linked for a given
/// subject id. Collaborators are injected at construction; the linker holds
/// no state beyond its per-subject lock table.
pub struct AccountLinker {
    users: Arc<dyn UserStore>,
    accounts: Arc<dyn AccountStore>,
    locks: KeyedLocks,
    defaults: LinkDefaults,
}

impl AccountLinker {
    pub fn new(
        users: Arc<dyn UserStore>,
        accounts: Arc<dyn AccountStore>,
        defaults: LinkDefaults,
    ) -> Self {
        Self { users, accounts, locks: KeyedLocks::new(), defaults }
    }

    /// Get-or-create-and-link for `subject_id`. Safe under concurrent
    /// retries: the already-linked fast path is checked before any write on
    /// every call, and the create path runs under a per-subject lock so
    /// duplicate logins collapse into exactly one account creation.
    ///
    /// The subject id must come from a verified `Principal`; this method
    /// never validates identity itself.
    ///
    /// Cancellation mid-call leaves committed partial state in place; a
    /// retry re-enters at the fast path and self-heals.
    pub async fn reconcile(&self, subject_id: &str, hints: &ProfileHints) -> AppResult<LinkOutcome> {
        // Fast path: user exists and is linked. No writes.
        if let Some(user) = self.users.find_by_subject_id(subject_id).await? {
            if let Some(account_id) = user.account_id {
                return Ok(LinkOutcome::AlreadyLinked { account_id });
            }
        }

        let lock = self.locks.for_key(subject_id);
        let _guard = lock.lock().await;

        // Re-check under the lock; a racing call may have finished the link
        // between the fast path and acquisition.
        let user = match self.users.find_by_subject_id(subject_id).await? {
            Some(user) => user,
            None => self.create_user(subject_id, hints).await?,
        };
        // Covers both the locked re-read and a duplicate-key recovery that
        // re-read a user another process had already linked.
        if let Some(account_id) = user.account_id.clone() {
            return Ok(LinkOutcome::AlreadyLinked { account_id });
        }

        // User exists without a canonical account: create and link.
        let account = self.accounts.insert(self.build_account(&user, hints)).await?;
        info!(target: "idlink::linker", "account created id={} owner={}", account.id, user.id);

        let linked = self.users.link_account(&user.id, &account.id).await?;
        if !linked {
            // Conditional write lost to a concurrent reconciliation in
            // another process. The account just created stays correctly
            // owned but never becomes canonical; report the winner's link.
            let current = self
                .users
                .find_by_subject_id(subject_id)
                .await?
                .and_then(|u| u.account_id)
                .ok_or_else(|| {
                    AppError::internal(
                        "reconcile_race".to_string(),
                        format!("link for subject '{}' vanished after conditional write", subject_id),
                    )
                })?;
            warn!(
                target: "idlink::linker",
                "conditional link lost race subject={} orphan_account={} canonical={}",
                subject_id, account.id, current
            );
            return Ok(LinkOutcome::AlreadyLinked { account_id: current });
        }

        info!(target: "idlink::linker", "user linked subject={} user={} account={}", subject_id, user.id, account.id);
        Ok(LinkOutcome::Created { user_id: user.id, account_id: account.id })
    }

    /// Fetch the canonical account for `subject_id`, or None when the user
    /// is unknown or not yet linked. Read-only; callers must source the
    /// subject id from a verified `Principal`.
    pub async fn lookup_account(&self, subject_id: &str) -> AppResult<Option<Account>> {
        let Some(user) = self.users.find_by_subject_id(subject_id).await? else {
            return Ok(None);
        };
        let Some(account_id) = user.account_id else {
            return Ok(None);
        };
        self.accounts.find_by_id(&account_id).await
    }

    async fn create_user(&self, subject_id: &str, hints: &ProfileHints) -> AppResult<User> {
        match self.users.insert(self.build_user(subject_id, hints)).await {
            Ok(user) => {
                info!(target: "idlink::linker", "user created id={} subject={}", user.id, subject_id);
                Ok(user)
            }
            // Uniqueness backstop fired: another process inserted this
            // subject first. Re-read and continue on its record.
            Err(e) if e.is_conflict() => {
                warn!(target: "idlink::linker", "duplicate user insert subject={}, re-reading", subject_id);
                self.users.find_by_subject_id(subject_id).await?.ok_or_else(|| {
                    AppError::internal(
                        "reconcile_race".to_string(),
                        format!("user for subject '{}' vanished after duplicate-key conflict", subject_id),
                    )
                })
            }
            Err(e) => Err(e),
        }
    }

    fn build_user(&self, subject_id: &str, hints: &ProfileHints) -> NewUser {
        NewUser {
            subject_id: subject_id.to_string(),
            role: "primary_parent".to_string(),
            // Placeholder email is subject-scoped so the store's email
            // uniqueness backstop cannot trip across hintless users.
            email: hints
                .email
                .clone()
                .unwrap_or_else(|| format!("{}@placeholder.invalid", subject_id)),
            first_name: hints.first_name.clone().unwrap_or_else(|| "User".to_string()),
            last_name: hints.last_name.clone().unwrap_or_else(|| "Name".to_string()),
            mobile_number: hints.mobile_number.unwrap_or(1234567890),
            address: hints.address.clone().unwrap_or_else(|| "123 Main Street".to_string()),
            pincode: hints.pincode.unwrap_or(12345),
            avatar: hints
                .avatar
                .clone()
                .unwrap_or_else(|| "https://via.placeholder.com/150".to_string()),
            settings: json!({"theme": "light"}),
            custom_claims: json!({"role": "parent"}),
            last_login: Utc::now(),
        }
    }

    fn build_account(&self, owner: &User, hints: &ProfileHints) -> NewAccount {
        let now = Utc::now();
        NewAccount {
            owner_user_id: owner.id.clone(),
            subscription_plan: hints
                .subscription_plan
                .clone()
                .unwrap_or_else(|| self.defaults.subscription_plan.clone()),
            subscription_status: hints
                .subscription_status
                .clone()
                .unwrap_or_else(|| self.defaults.subscription_status.clone()),
            subscription_start: now,
            subscription_end: now + Duration::days(self.defaults.subscription_days),
        }
    }
}
