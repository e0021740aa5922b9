use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{AppError, AppResult};

use super::principal::Principal;
use super::provider::TokenProvider;
use super::request_context::RequestContext;

/// Converts an inbound bearer credential into a trusted Principal, or
/// refuses the request. Leaf component; constructed once at bootstrap with
/// an injected provider client and shared across requests.
pub struct IdentityGate {
    provider: Arc<dyn TokenProvider>,
}

impl IdentityGate {
    pub fn new(provider: Arc<dyn TokenProvider>) -> Self { Self { provider } }

    /// Verify `raw` against the provider and build a Principal from its
    /// decoded claims. An absent credential fails immediately with no
    /// provider call; a provider rejection is surfaced as Auth with the
    /// provider diagnostic wrapped, and is never retried here.
    pub async fn authenticate(&self, raw: Option<&str>) -> AppResult<Principal> {
        let Some(raw) = raw else {
            return Err(AppError::auth("missing_token", "no token provided"));
        };
        let token = match self.provider.verify_token(raw).await {
            Ok(t) => t,
            Err(e) => {
                warn!(target: "idlink::gate", "token verification failed: {}", e.message());
                return Err(AppError::auth(
                    "invalid_token".to_string(),
                    format!("invalid token: {}", e.message()),
                ));
            }
        };
        let principal = Principal {
            subject_id: token.subject_id,
            email: token.email,
            email_verified: token.email_verified,
            claims: token.claims,
        };
        debug!(target: "idlink::gate", "token verified subject={} email={}", principal.subject_id, principal.email);
        Ok(principal)
    }

    /// `authenticate`, additionally attaching the Principal to the request
    /// context for downstream handlers.
    pub async fn authenticate_into(
        &self,
        raw: Option<&str>,
        ctx: &mut RequestContext,
    ) -> AppResult<Principal> {
        let principal = self.authenticate(raw).await?;
        ctx.principal = Some(principal.clone());
        Ok(principal)
    }
}
