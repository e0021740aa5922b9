//! Login orchestration: verify the bearer credential, enrich profile hints
//! from the provider directory, then reconcile the user/account pair. This
//! is the composition the transport layer invokes on login; the subject id
//! fed to the linker always comes from the verified principal.

use std::sync::Arc;

use tracing::info;

use crate::error::AppResult;
use crate::identity::{IdentityGate, Principal, TokenProvider};
use crate::linker::{AccountLinker, LinkOutcome, ProfileHints};

/// Result of a completed login: the trusted principal plus the linking
/// outcome for its subject.
#[derive(Debug, Clone)]
pub struct LoginSummary {
    pub principal: Principal,
    pub outcome: LinkOutcome,
}

/// Split a provider display name into first/last hints the way the profile
/// model stores them.
fn name_hints(display_name: Option<&str>) -> (Option<String>, Option<String>) {
    let Some(name) = display_name else { return (None, None) };
    let mut parts = name.split_whitespace();
    let first = parts.next().map(str::to_string);
    let last = parts.next().map(str::to_string);
    (first, last)
}

pub async fn handle_login(
    gate: &IdentityGate,
    provider: &Arc<dyn TokenProvider>,
    linker: &AccountLinker,
    raw_token: Option<&str>,
) -> AppResult<LoginSummary> {
    let principal = gate.authenticate(raw_token).await?;

    // Directory profile is best-effort enrichment; the token claims already
    // carry enough to reconcile.
    let profile = provider.fetch_profile(&principal.subject_id).await?;
    let (first_name, last_name) = name_hints(
        profile.as_ref().and_then(|p| p.display_name.as_deref()),
    );
    let hints = ProfileHints {
        email: profile
            .as_ref()
            .map(|p| p.email.clone())
            .or_else(|| (!principal.email.is_empty()).then(|| principal.email.clone())),
        first_name,
        last_name,
        avatar: profile.as_ref().and_then(|p| p.photo_url.clone()),
        ..ProfileHints::default()
    };

    let outcome = linker.reconcile(&principal.subject_id, &hints).await?;
    info!(
        target: "idlink::login",
        "login completed subject={} outcome={}",
        principal.subject_id,
        match &outcome {
            LinkOutcome::AlreadyLinked { .. } => "already_linked",
            LinkOutcome::Created { .. } => "created",
        }
    );
    Ok(LoginSummary { principal, outcome })
}
