use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AppResult;

use super::model::{Account, NewAccount, NewUser, User};

/// User-collection contract over the external document store. The store is
/// assumed to provide per-document atomic writes but no multi-document
/// transactions, and enforces uniqueness on subject id and email as a
/// backstop (surfaced as a Conflict error on violation).
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_subject_id(&self, subject_id: &str) -> AppResult<Option<User>>;

    /// Insert a new user and return the stored record with its assigned id.
    /// Fails with Conflict on a duplicate subject id or email.
    async fn insert(&self, user: NewUser) -> AppResult<User>;

    /// Conditional link write: set `account_id` only where it is currently
    /// absent. Returns false (no-op) when a link is already present, which
    /// signals the caller that it lost a race.
    async fn link_account(&self, user_id: &str, account_id: &str) -> AppResult<bool>;

    async fn update_last_login(&self, user_id: &str, at: DateTime<Utc>) -> AppResult<()>;

    /// Bulk clear. Test-seeding support only; never invoked by the core.
    async fn clear(&self) -> AppResult<()>;
}

/// Account-collection contract. Accounts are write-once from this crate's
/// point of view.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn insert(&self, account: NewAccount) -> AppResult<Account>;

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Account>>;

    /// Number of accounts whose owner is `user_id`. Test support for the
    /// no-duplicate-account property.
    async fn count_for_owner(&self, user_id: &str) -> AppResult<usize>;

    /// Bulk clear. Test-seeding support only.
    async fn clear(&self) -> AppResult<()>;
}
