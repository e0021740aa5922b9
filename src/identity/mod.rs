//! Token-verification gate and trusted-principal types.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod provider;
mod gate;
mod request_context;

pub use principal::Principal;
pub use provider::{TokenProvider, VerifiedToken, ProviderProfile, StaticTokenProvider};
pub use gate::IdentityGate;
pub use request_context::RequestContext;
