//! In-memory document store adapter for the dev binary and tests.
//! Mirrors the collaborating store's semantics: per-record atomic writes,
//! no cross-record transactions, and the uniqueness backstop on the user
//! collection (subject id and email).

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

use super::contract::{AccountStore, UserStore};
use super::model::{Account, NewAccount, NewUser, User};

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, User>>,
    accounts: RwLock<HashMap<String, Account>>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    fn next_id() -> String { Uuid::new_v4().to_string() }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_subject_id(&self, subject_id: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .read()
            .values()
            .find(|u| u.subject_id == subject_id)
            .cloned())
    }

    async fn insert(&self, user: NewUser) -> AppResult<User> {
        let mut users = self.users.write();
        if users.values().any(|u| u.subject_id == user.subject_id) {
            return Err(AppError::conflict(
                "duplicate_key".to_string(),
                format!("user with subject id '{}' already exists", user.subject_id),
            ));
        }
        if users.values().any(|u| u.email == user.email) {
            return Err(AppError::conflict(
                "duplicate_key".to_string(),
                format!("user with email '{}' already exists", user.email),
            ));
        }
        let id = Self::next_id();
        let stored = User {
            id: id.clone(),
            subject_id: user.subject_id,
            account_id: None,
            role: user.role,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            mobile_number: user.mobile_number,
            address: user.address,
            pincode: user.pincode,
            avatar: user.avatar,
            settings: user.settings,
            custom_claims: user.custom_claims,
            last_login: user.last_login,
        };
        users.insert(id.clone(), stored.clone());
        debug!(target: "idlink::store", "user inserted id={} subject={}", id, stored.subject_id);
        Ok(stored)
    }

    async fn link_account(&self, user_id: &str, account_id: &str) -> AppResult<bool> {
        let mut users = self.users.write();
        let Some(user) = users.get_mut(user_id) else {
            return Err(AppError::not_found(
                "user_not_found".to_string(),
                format!("no user with id '{}'", user_id),
            ));
        };
        if user.account_id.is_some() {
            return Ok(false);
        }
        user.account_id = Some(account_id.to_string());
        debug!(target: "idlink::store", "user linked id={} account={}", user_id, account_id);
        Ok(true)
    }

    async fn update_last_login(&self, user_id: &str, at: DateTime<Utc>) -> AppResult<()> {
        let mut users = self.users.write();
        match users.get_mut(user_id) {
            Some(user) => {
                user.last_login = at;
                Ok(())
            }
            None => Err(AppError::not_found(
                "user_not_found".to_string(),
                format!("no user with id '{}'", user_id),
            )),
        }
    }

    async fn clear(&self) -> AppResult<()> {
        self.users.write().clear();
        Ok(())
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn insert(&self, account: NewAccount) -> AppResult<Account> {
        let now = Utc::now();
        let id = Self::next_id();
        let stored = Account {
            id: id.clone(),
            owner_user_id: account.owner_user_id,
            subscription_plan: account.subscription_plan,
            subscription_status: account.subscription_status,
            subscription_start: account.subscription_start,
            subscription_end: account.subscription_end,
            created_at: now,
            updated_at: now,
        };
        self.accounts.write().insert(id.clone(), stored.clone());
        debug!(target: "idlink::store", "account inserted id={} owner={}", id, stored.owner_user_id);
        Ok(stored)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Account>> {
        Ok(self.accounts.read().get(id).cloned())
    }

    async fn count_for_owner(&self, user_id: &str) -> AppResult<usize> {
        Ok(self
            .accounts
            .read()
            .values()
            .filter(|a| a.owner_user_id == user_id)
            .count())
    }

    async fn clear(&self) -> AppResult<()> {
        self.accounts.write().clear();
        Ok(())
    }
}
