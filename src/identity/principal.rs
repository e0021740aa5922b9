use serde::{Deserialize, Serialize};

/// Trusted identity attached to a request after token verification.
/// Built only from provider-decoded claims, never from client-supplied
/// fields, and never persisted by this crate.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    /// Stable provider-assigned subject identifier. This is the external
    /// identity anchor for all account scoping, not a store record id.
    pub subject_id: String,
    #[serde(default)]
    pub email: String,
    /// Provider-asserted verification flag; true when the provider does not
    /// distinguish.
    #[serde(default = "default_true")]
    pub email_verified: bool,
    /// Opaque custom-claims blob as decoded from the token.
    #[serde(default)]
    pub claims: serde_json::Map<String, serde_json::Value>,
}

fn default_true() -> bool { true }
