//! Monthly generation allowance for free-tier users.
//!
//! Free users get [`FREE_MONTHLY_LIMIT`] recipe generations per period. A
//! period ends at the stored reset time; the first check at or after it
//! starts a new period of [`RESET_PERIOD_DAYS`]. Premium users are never
//! limited and their records are never touched.
//!
//! Every ledger implementation makes its decision through [`evaluate`] so the
//! in-memory and database ledgers agree.

mod memory;

pub use memory::InMemoryQuotaLedger;

use crate::types::SubscriptionTier;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

pub const FREE_MONTHLY_LIMIT: u32 = 3;
pub const RESET_PERIOD_DAYS: i64 = 30;

#[derive(Error, Debug)]
pub enum QuotaError {
    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    #[error("Quota storage error: {0}")]
    Storage(String),
}

/// A user's quota state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaRecord {
    pub tier: SubscriptionTier,
    pub generations_used: u32,
    pub reset_at: DateTime<Utc>,
}

impl QuotaRecord {
    /// A fresh free-tier record whose first period starts at `now`.
    pub fn new_free(now: DateTime<Utc>) -> Self {
        Self {
            tier: SubscriptionTier::Free,
            generations_used: 0,
            reset_at: next_reset(now),
        }
    }

    pub fn premium(now: DateTime<Utc>) -> Self {
        Self {
            tier: SubscriptionTier::Premium,
            ..Self::new_free(now)
        }
    }

    /// Generations left this period, or `None` when unlimited.
    pub fn remaining(&self) -> Option<u32> {
        match self.tier {
            SubscriptionTier::Premium => None,
            SubscriptionTier::Free => {
                Some(FREE_MONTHLY_LIMIT.saturating_sub(self.generations_used))
            }
        }
    }
}

/// Reset time for a period starting at `now`.
pub fn next_reset(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::days(RESET_PERIOD_DAYS)
}

/// Outcome of checking a record against the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allowance {
    /// Premium tier. Nothing to update.
    Unlimited,
    /// The period has ended. The caller must store `used = 0` and `next_reset`.
    Reset { next_reset: DateTime<Utc> },
    /// Inside the current period with room left.
    Within { remaining: u32 },
    /// Inside the current period and at or over the limit.
    Exhausted,
}

impl Allowance {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Allowance::Exhausted)
    }
}

/// Decide whether `record` may generate at `now`.
pub fn evaluate(record: &QuotaRecord, now: DateTime<Utc>) -> Allowance {
    if record.tier.is_premium() {
        return Allowance::Unlimited;
    }
    if now >= record.reset_at {
        return Allowance::Reset {
            next_reset: next_reset(now),
        };
    }
    if record.generations_used < FREE_MONTHLY_LIMIT {
        Allowance::Within {
            remaining: FREE_MONTHLY_LIMIT - record.generations_used,
        }
    } else {
        Allowance::Exhausted
    }
}

/// Usage summary shown to a user.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    pub generations_used: u32,
    /// `None` means unlimited.
    pub generations_remaining: Option<u32>,
    pub is_premium: bool,
    pub member_since: DateTime<Utc>,
    pub total_meal_plans: u64,
    /// `None` for premium users.
    pub next_reset_date: Option<DateTime<Utc>>,
}

impl UsageStats {
    pub fn new(record: &QuotaRecord, member_since: DateTime<Utc>, total_meal_plans: u64) -> Self {
        let is_premium = record.tier.is_premium();
        Self {
            generations_used: record.generations_used,
            generations_remaining: record.remaining(),
            is_premium,
            member_since,
            total_meal_plans,
            next_reset_date: (!is_premium).then_some(record.reset_at),
        }
    }
}

/// Per-user generation allowance.
#[async_trait]
pub trait QuotaLedger: Send + Sync + fmt::Debug {
    /// Whether the user may generate now. Starts a new period (and persists
    /// it) when the current one has ended.
    async fn check_allowance(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<bool, QuotaError>;

    /// Count one successful generation. Free tier only, and the cap is not
    /// re-checked.
    async fn record_usage(&self, user_id: Uuid) -> Result<(), QuotaError>;

    /// Current state without side effects.
    async fn usage(&self, user_id: Uuid) -> Result<QuotaRecord, QuotaError>;
}
