use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};
use tracing::info;

use idlink::config::LinkDefaults;
use idlink::identity::{IdentityGate, StaticTokenProvider, TokenProvider, VerifiedToken};
use idlink::linker::AccountLinker;
use idlink::login::handle_login;
use idlink::store::MemoryStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    fmt().with_env_filter(filter).init();

    // Startup banner at info level so something always prints at default verbosity
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    let defaults = LinkDefaults::from_env();
    info!(
        target: "idlink",
        "idlink dev harness starting: RUST_LOG='{}', default_plan='{}', default_status='{}', subscription_days={}",
        rust_log, defaults.subscription_plan, defaults.subscription_status, defaults.subscription_days
    );

    // Wire the in-memory adapters through one demo login to show the flow.
    let store = Arc::new(MemoryStore::new());
    let static_provider = Arc::new(StaticTokenProvider::new());
    static_provider.register_token(
        "demo-token",
        VerifiedToken {
            subject_id: "sub_demo".to_string(),
            email: "demo@example.com".to_string(),
            email_verified: true,
            claims: serde_json::Map::new(),
        },
    );
    let provider: Arc<dyn TokenProvider> = static_provider;

    let gate = IdentityGate::new(provider.clone());
    let linker = AccountLinker::new(store.clone(), store.clone(), defaults);

    let first = handle_login(&gate, &provider, &linker, Some("demo-token")).await?;
    info!(target: "idlink", "first login outcome: {:?}", first.outcome);
    let second = handle_login(&gate, &provider, &linker, Some("demo-token")).await?;
    info!(target: "idlink", "second login outcome: {:?}", second.outcome);

    Ok(())
}
