//! Deployment-configurable defaults for newly created subscription accounts.

/// Defaults applied when profile hints omit subscription fields. Read from
/// `IDLINK_*` environment variables at bootstrap; fallbacks match the
/// shipped deployment.
#[derive(Debug, Clone)]
pub struct LinkDefaults {
    pub subscription_plan: String,
    pub subscription_status: String,
    /// Length of the default subscription window in days, starting "now".
    pub subscription_days: i64,
}

impl Default for LinkDefaults {
    fn default() -> Self {
        Self {
            subscription_plan: "premium".to_string(),
            subscription_status: "active".to_string(),
            subscription_days: 365,
        }
    }
}

impl LinkDefaults {
    /// Resolve defaults from the environment: `IDLINK_DEFAULT_PLAN`,
    /// `IDLINK_DEFAULT_STATUS`, `IDLINK_SUBSCRIPTION_DAYS`. Unset or
    /// unparseable values fall back to `Default`.
    pub fn from_env() -> Self {
        let base = Self::default();
        let subscription_plan =
            std::env::var("IDLINK_DEFAULT_PLAN").unwrap_or(base.subscription_plan);
        let subscription_status =
            std::env::var("IDLINK_DEFAULT_STATUS").unwrap_or(base.subscription_status);
        let subscription_days = std::env::var("IDLINK_SUBSCRIPTION_DAYS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|d| *d > 0)
            .unwrap_or(base.subscription_days);
        Self { subscription_plan, subscription_status, subscription_days }
    }
}
