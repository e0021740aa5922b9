use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned record identifier. Opaque and stable for the record's
/// lifetime; distinct from the provider subject id.
pub type RecordId = String;

/// Persisted user record. `subject_id` is the external identity anchor and
/// the primary lookup key; `account_id`, once set, is never cleared or
/// repointed by this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: RecordId,
    pub subject_id: String,
    #[serde(default)]
    pub account_id: Option<RecordId>,
    pub role: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub mobile_number: i64,
    pub address: String,
    pub pincode: i64,
    pub avatar: String,
    pub settings: serde_json::Value,
    pub custom_claims: serde_json::Value,
    pub last_login: DateTime<Utc>,
}

/// Insert form for a user; the store assigns `id` and the record starts
/// with no linked account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub subject_id: String,
    pub role: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub mobile_number: i64,
    pub address: String,
    pub pincode: i64,
    pub avatar: String,
    pub settings: serde_json::Value,
    pub custom_claims: serde_json::Value,
    pub last_login: DateTime<Utc>,
}

/// Persisted billing/subscription account. Created exactly once per user
/// and never mutated or deleted by this crate afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: RecordId,
    /// Owning user's store record id. Set at creation, immutable.
    pub owner_user_id: RecordId,
    pub subscription_plan: String,
    pub subscription_status: String,
    pub subscription_start: DateTime<Utc>,
    pub subscription_end: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub owner_user_id: RecordId,
    pub subscription_plan: String,
    pub subscription_status: String,
    pub subscription_start: DateTime<Utc>,
    pub subscription_end: DateTime<Utc>,
}
