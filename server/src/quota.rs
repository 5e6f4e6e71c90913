//! Postgres-backed quota ledger over the `users` table.

use crate::db::{with_conn, DbError, DbPool};
use crate::schema::users;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use seasonal_core::quota::{evaluate, Allowance};
use seasonal_core::{QuotaError, QuotaLedger, QuotaRecord, SubscriptionTier};
use std::sync::Arc;
use uuid::Uuid;

const FREE_TIER: &str = "free";

#[derive(Debug, Clone)]
pub struct PgQuotaLedger {
    pool: Arc<DbPool>,
}

impl PgQuotaLedger {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

impl From<DbError> for QuotaError {
    fn from(e: DbError) -> Self {
        QuotaError::Storage(e.to_string())
    }
}

type QuotaRow = (String, i32, DateTime<Utc>);

fn to_record((tier, used, reset_at): QuotaRow) -> QuotaRecord {
    QuotaRecord {
        tier: SubscriptionTier::parse(&tier).unwrap_or(SubscriptionTier::Free),
        generations_used: used.max(0) as u32,
        reset_at,
    }
}

fn load(conn: &mut PgConnection, user_id: Uuid) -> QueryResult<Option<QuotaRecord>> {
    users::table
        .filter(users::id.eq(user_id))
        .filter(users::deleted_at.is_null())
        .select((
            users::subscription_tier,
            users::free_generations_used,
            users::free_generations_reset,
        ))
        .first::<QuotaRow>(conn)
        .optional()
        .map(|row| row.map(to_record))
}

#[async_trait]
impl QuotaLedger for PgQuotaLedger {
    async fn check_allowance(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<bool, QuotaError> {
        let allowance = with_conn(&self.pool, move |conn| {
            let Some(record) = load(conn, user_id)? else {
                return Ok(None);
            };
            let allowance = evaluate(&record, now);
            if let Allowance::Reset { next_reset } = allowance {
                // Only the first request past the boundary starts the new period.
                let started = diesel::update(
                    users::table
                        .filter(users::id.eq(user_id))
                        .filter(users::subscription_tier.eq(FREE_TIER))
                        .filter(users::free_generations_reset.le(now)),
                )
                .set((
                    users::free_generations_used.eq(0),
                    users::free_generations_reset.eq(next_reset),
                    users::updated_at.eq(now),
                ))
                .execute(conn)?;
                if started > 0 {
                    tracing::info!(%user_id, %next_reset, "Starting new quota period");
                }
            }
            Ok(Some(allowance))
        })
        .await?
        .ok_or(QuotaError::UserNotFound(user_id))?;

        Ok(allowance.is_allowed())
    }

    async fn record_usage(&self, user_id: Uuid) -> Result<(), QuotaError> {
        let found = with_conn(&self.pool, move |conn| {
            let updated = diesel::update(
                users::table
                    .filter(users::id.eq(user_id))
                    .filter(users::subscription_tier.eq(FREE_TIER)),
            )
            .set((
                users::free_generations_used.eq(users::free_generations_used + 1),
                users::updated_at.eq(Utc::now()),
            ))
            .execute(conn)?;
            if updated > 0 {
                return Ok(true);
            }
            // Premium users match nothing above; make sure the user exists at all.
            Ok(load(conn, user_id)?.is_some())
        })
        .await?;

        if found {
            Ok(())
        } else {
            Err(QuotaError::UserNotFound(user_id))
        }
    }

    async fn usage(&self, user_id: Uuid) -> Result<QuotaRecord, QuotaError> {
        with_conn(&self.pool, move |conn| load(conn, user_id))
            .await?
            .ok_or(QuotaError::UserNotFound(user_id))
    }
}
