//! Client configuration, read from `RXSTOCK_*` environment variables.

use std::str::FromStr;

use anyhow::{Context, Result, bail};
use rust_decimal::Decimal;

use rxstock_inventory::{ExpiryThresholds, PricingPolicy};

pub const DEFAULT_API_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    pub auth_token: Option<String>,
    /// Upper bound on ledger rows per fetch.
    pub movement_limit: u32,
    /// Look-ahead for the expiring lots report.
    pub expiry_window_days: i64,
    pub pricing: PricingPolicy,
    pub expiry_thresholds: ExpiryThresholds,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            auth_token: None,
            movement_limit: 500,
            expiry_window_days: 90,
            pricing: PricingPolicy::default(),
            expiry_thresholds: ExpiryThresholds::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (environment, file, test map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let api_url = lookup("RXSTOCK_API_URL")
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or(defaults.api_url);

        let auth_token = lookup("RXSTOCK_AUTH_TOKEN").filter(|t| !t.trim().is_empty());
        if auth_token.is_none() {
            tracing::info!("RXSTOCK_AUTH_TOKEN not set; requests will be unauthenticated");
        }

        let movement_limit: u32 = parse_var(&lookup, "RXSTOCK_MOVEMENT_LIMIT", defaults.movement_limit)?;
        if movement_limit == 0 {
            bail!("RXSTOCK_MOVEMENT_LIMIT must be positive");
        }

        let expiry_window_days: i64 =
            parse_var(&lookup, "RXSTOCK_EXPIRY_WINDOW_DAYS", defaults.expiry_window_days)?;
        if expiry_window_days < 0 {
            bail!("RXSTOCK_EXPIRY_WINDOW_DAYS cannot be negative");
        }

        let markup: Decimal = parse_var(
            &lookup,
            "RXSTOCK_DEFAULT_MARKUP",
            defaults.pricing.default_markup(),
        )?;
        let pricing = PricingPolicy::new(markup).context("invalid RXSTOCK_DEFAULT_MARKUP")?;

        let expiry_thresholds = ExpiryThresholds::new(
            parse_var(&lookup, "RXSTOCK_EXPIRY_CRITICAL_DAYS", defaults.expiry_thresholds.critical_days)?,
            parse_var(&lookup, "RXSTOCK_EXPIRY_WARNING_DAYS", defaults.expiry_thresholds.warning_days)?,
        )
        .context("invalid expiry thresholds")?;

        Ok(Self {
            api_url,
            auth_token,
            movement_limit,
            expiry_window_days,
            pricing,
            expiry_thresholds,
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        _ => Ok(default),
    }
}
