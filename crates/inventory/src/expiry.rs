//! Expiry math and risk tiers.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use rxstock_core::{DomainError, DomainResult};

use crate::lot::{ExpiringLot, StockLot};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Whole days from `as_of` until the start of `expiry_date` (UTC), rounded up.
///
/// Negative for lots that have already expired.
pub fn days_until_expiry(expiry_date: NaiveDate, as_of: DateTime<Utc>) -> i64 {
    let expires_at = expiry_date.and_time(NaiveTime::MIN).and_utc();
    let millis = (expires_at - as_of).num_milliseconds();
    // ceil(millis / day) for either sign
    -((-millis).div_euclid(MILLIS_PER_DAY))
}

pub fn days_until_expiry_now(expiry_date: NaiveDate) -> i64 {
    days_until_expiry(expiry_date, Utc::now())
}

/// Day boundaries for the expiry risk tiers (both inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryThresholds {
    pub critical_days: i64,
    pub warning_days: i64,
}

impl Default for ExpiryThresholds {
    fn default() -> Self {
        Self {
            critical_days: 7,
            warning_days: 30,
        }
    }
}

impl ExpiryThresholds {
    pub fn new(critical_days: i64, warning_days: i64) -> DomainResult<Self> {
        if critical_days < 0 {
            return Err(DomainError::validation("critical threshold cannot be negative"));
        }
        if warning_days < critical_days {
            return Err(DomainError::validation(
                "warning threshold must be at least the critical threshold",
            ));
        }
        Ok(Self {
            critical_days,
            warning_days,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpiryRisk {
    Critical,
    Warning,
    Normal,
}

impl ExpiryRisk {
    pub fn classify(days_remaining: i64, thresholds: ExpiryThresholds) -> Self {
        if days_remaining <= thresholds.critical_days {
            ExpiryRisk::Critical
        } else if days_remaining <= thresholds.warning_days {
            ExpiryRisk::Warning
        } else {
            ExpiryRisk::Normal
        }
    }
}

/// Lots expiring within `window_days` of `as_of` (expired lots included),
/// soonest first. Lots with nothing on hand are skipped.
pub fn expiring_lots(lots: &[StockLot], window_days: i64, as_of: DateTime<Utc>) -> Vec<ExpiringLot> {
    let mut out: Vec<ExpiringLot> = lots
        .iter()
        .filter(|lot| lot.quantity > 0)
        .map(|lot| ExpiringLot::from_lot(lot.clone(), as_of))
        .filter(|e| e.days_remaining <= window_days)
        .collect();

    // stable: ties keep input order
    out.sort_by_key(|e| e.days_remaining);
    out
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTotals {
    pub lots: usize,
    pub quantity: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskBuckets {
    pub critical: TierTotals,
    pub warning: TierTotals,
    pub normal: TierTotals,
}

impl RiskBuckets {
    pub fn tier(&self, risk: ExpiryRisk) -> TierTotals {
        match risk {
            ExpiryRisk::Critical => self.critical,
            ExpiryRisk::Warning => self.warning,
            ExpiryRisk::Normal => self.normal,
        }
    }
}

pub fn risk_buckets(lots: &[ExpiringLot], thresholds: ExpiryThresholds) -> RiskBuckets {
    let mut buckets = RiskBuckets::default();
    for e in lots {
        let tier = match ExpiryRisk::classify(e.days_remaining, thresholds) {
            ExpiryRisk::Critical => &mut buckets.critical,
            ExpiryRisk::Warning => &mut buckets.warning,
            ExpiryRisk::Normal => &mut buckets.normal,
        };
        tier.lots += 1;
        tier.quantity = tier.quantity.saturating_add(e.lot.quantity);
    }
    buckets
}
