use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{AppError, AppResult};

/// Decoded claims returned by the provider for a valid credential.
#[derive(Debug, Clone)]
pub struct VerifiedToken {
    pub subject_id: String,
    pub email: String,
    pub email_verified: bool,
    pub claims: serde_json::Map<String, serde_json::Value>,
}

/// Directory profile held by the provider for a known subject.
#[derive(Debug, Clone, Default)]
pub struct ProviderProfile {
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub email_verified: bool,
}

/// External identity-verification provider. Sole authority on credential
/// validity; the credential format is opaque to this crate. Both calls are
/// network round trips and honour caller cancellation by being dropped.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Validate a raw bearer credential and return its decoded claims.
    /// Rejection (expired, malformed, revoked, bad signature) is an error
    /// carrying the provider's diagnostic.
    async fn verify_token(&self, raw: &str) -> AppResult<VerifiedToken>;

    /// Fetch the provider-side profile for a subject, or None if unknown.
    async fn fetch_profile(&self, subject_id: &str) -> AppResult<Option<ProviderProfile>>;
}

/// In-process provider backed by a static token table. Used by the dev
/// binary and tests; real deployments inject an adapter over the actual
/// provider SDK.
#[derive(Default)]
pub struct StaticTokenProvider {
    tokens: RwLock<HashMap<String, VerifiedToken>>,
    profiles: RwLock<HashMap<String, ProviderProfile>>,
    verify_calls: RwLock<usize>,
}

impl StaticTokenProvider {
    pub fn new() -> Self { Self::default() }

    /// Register a credential so that `verify_token(raw)` succeeds.
    pub fn register_token(&self, raw: &str, token: VerifiedToken) {
        self.tokens.write().insert(raw.to_string(), token);
    }

    /// Register a directory profile for `fetch_profile`.
    pub fn register_profile(&self, subject_id: &str, profile: ProviderProfile) {
        self.profiles.write().insert(subject_id.to_string(), profile);
    }

    /// Number of `verify_token` invocations seen so far.
    pub fn verify_calls(&self) -> usize { *self.verify_calls.read() }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn verify_token(&self, raw: &str) -> AppResult<VerifiedToken> {
        *self.verify_calls.write() += 1;
        self.tokens
            .read()
            .get(raw)
            .cloned()
            .ok_or_else(|| AppError::auth("invalid_token", "token not recognized by provider"))
    }

    async fn fetch_profile(&self, subject_id: &str) -> AppResult<Option<ProviderProfile>> {
        Ok(self.profiles.read().get(subject_id).cloned())
    }
}
