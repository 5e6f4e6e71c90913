//! In-process ledger for tests and local development.

use super::{evaluate, Allowance, QuotaError, QuotaLedger, QuotaRecord};
use crate::types::SubscriptionTier;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct InMemoryQuotaLedger {
    records: Mutex<HashMap<Uuid, QuotaRecord>>,
}

impl InMemoryQuotaLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> MutexGuard<'_, HashMap<Uuid, QuotaRecord>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn insert(&self, user_id: Uuid, record: QuotaRecord) {
        self.records().insert(user_id, record);
    }

    pub fn get(&self, user_id: Uuid) -> Option<QuotaRecord> {
        self.records().get(&user_id).copied()
    }
}

#[async_trait]
impl QuotaLedger for InMemoryQuotaLedger {
    async fn check_allowance(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<bool, QuotaError> {
        let mut records = self.records();
        let record = records
            .get_mut(&user_id)
            .ok_or(QuotaError::UserNotFound(user_id))?;

        let allowance = evaluate(record, now);
        if let Allowance::Reset { next_reset } = allowance {
            tracing::info!(%user_id, %next_reset, "Starting new quota period");
            record.generations_used = 0;
            record.reset_at = next_reset;
        }
        Ok(allowance.is_allowed())
    }

    async fn record_usage(&self, user_id: Uuid) -> Result<(), QuotaError> {
        let mut records = self.records();
        let record = records
            .get_mut(&user_id)
            .ok_or(QuotaError::UserNotFound(user_id))?;

        if record.tier == SubscriptionTier::Free {
            record.generations_used = record.generations_used.saturating_add(1);
        }
        Ok(())
    }

    async fn usage(&self, user_id: Uuid) -> Result<QuotaRecord, QuotaError> {
        self.get(user_id).ok_or(QuotaError::UserNotFound(user_id))
    }
}
