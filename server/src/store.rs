//! Postgres-backed meal plan and document stores.

use crate::db::{with_conn, DbError, DbPool};
use crate::models::{MealPlanRow, PdfDocumentRow};
use crate::schema::{meal_plans, pdf_documents};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use seasonal_core::{
    ArtifactDocument, ArtifactKind, DocumentStore, MealPlanRecord, MealPlanStore, StoreError,
};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: Arc<DbPool>,
}

impl PgStore {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    pub async fn count_meal_plans(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let count: i64 = with_conn(&self.pool, move |conn| {
            meal_plans::table
                .filter(meal_plans::user_id.eq(user_id))
                .count()
                .get_result(conn)
        })
        .await
        .map_err(store_error)?;
        Ok(count.max(0) as u64)
    }
}

fn store_error(e: DbError) -> StoreError {
    StoreError::Database(e.to_string())
}

fn meal_plan_row(record: &MealPlanRecord) -> Result<MealPlanRow, StoreError> {
    Ok(MealPlanRow {
        id: record.id,
        user_id: record.user_id,
        title: record.title.clone(),
        description: record.description.clone(),
        seasonal_focus: record.seasonal_focus.clone(),
        servings_per_meal: i32::try_from(record.servings_per_meal).unwrap_or(i32::MAX),
        start_date: record.start_date,
        end_date: record.end_date,
        pdf_url: record.pdf_url.clone(),
        content: serde_json::to_value(&record.content)?,
        created_at: record.created_at,
    })
}

fn meal_plan_record(row: MealPlanRow) -> Result<MealPlanRecord, StoreError> {
    Ok(MealPlanRecord {
        id: row.id,
        user_id: row.user_id,
        title: row.title,
        description: row.description,
        seasonal_focus: row.seasonal_focus,
        servings_per_meal: row.servings_per_meal.max(0) as u32,
        start_date: row.start_date,
        end_date: row.end_date,
        pdf_url: row.pdf_url,
        content: serde_json::from_value(row.content)?,
        created_at: row.created_at,
    })
}

fn document_row(document: &ArtifactDocument) -> PdfDocumentRow {
    PdfDocumentRow {
        id: document.id,
        user_id: document.user_id,
        url: document.url.clone(),
        storage_key: document.storage_key.clone(),
        kind: document.kind.as_str().to_string(),
        title: document.title.clone(),
        created_at: document.created_at,
        expires_at: document.expires_at,
    }
}

fn document(row: PdfDocumentRow) -> Result<ArtifactDocument, StoreError> {
    let kind = ArtifactKind::parse(&row.kind)
        .ok_or_else(|| StoreError::Database(format!("unknown document kind: {}", row.kind)))?;
    Ok(ArtifactDocument {
        id: row.id,
        user_id: row.user_id,
        url: row.url,
        storage_key: row.storage_key,
        kind,
        title: row.title,
        created_at: row.created_at,
        expires_at: row.expires_at,
    })
}

#[async_trait]
impl MealPlanStore for PgStore {
    async fn save_meal_plan(&self, record: &MealPlanRecord) -> Result<(), StoreError> {
        let row = meal_plan_row(record)?;
        with_conn(&self.pool, move |conn| {
            diesel::insert_into(meal_plans::table)
                .values(&row)
                .execute(conn)
        })
        .await
        .map_err(store_error)?;
        Ok(())
    }

    async fn list_meal_plans(&self, user_id: Uuid) -> Result<Vec<MealPlanRecord>, StoreError> {
        let rows = with_conn(&self.pool, move |conn| {
            meal_plans::table
                .filter(meal_plans::user_id.eq(user_id))
                .order(meal_plans::created_at.desc())
                .select(MealPlanRow::as_select())
                .load(conn)
        })
        .await
        .map_err(store_error)?;
        rows.into_iter().map(meal_plan_record).collect()
    }

    async fn get_meal_plan(&self, user_id: Uuid, id: Uuid) -> Result<MealPlanRecord, StoreError> {
        let row = with_conn(&self.pool, move |conn| {
            meal_plans::table
                .filter(meal_plans::id.eq(id))
                .filter(meal_plans::user_id.eq(user_id))
                .select(MealPlanRow::as_select())
                .first(conn)
                .optional()
        })
        .await
        .map_err(store_error)?
        .ok_or(StoreError::NotFound)?;
        meal_plan_record(row)
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn record_document(&self, document: &ArtifactDocument) -> Result<(), StoreError> {
        let row = document_row(document);
        with_conn(&self.pool, move |conn| {
            diesel::insert_into(pdf_documents::table)
                .values(&row)
                .execute(conn)
        })
        .await
        .map_err(store_error)?;
        Ok(())
    }

    async fn list_documents(&self, user_id: Uuid) -> Result<Vec<ArtifactDocument>, StoreError> {
        let rows = with_conn(&self.pool, move |conn| {
            pdf_documents::table
                .filter(pdf_documents::user_id.eq(user_id))
                .order(pdf_documents::created_at.desc())
                .select(PdfDocumentRow::as_select())
                .load(conn)
        })
        .await
        .map_err(store_error)?;
        rows.into_iter().map(document).collect()
    }

    async fn expired_documents(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<ArtifactDocument>, StoreError> {
        let rows = with_conn(&self.pool, move |conn| {
            pdf_documents::table
                .filter(pdf_documents::user_id.eq(user_id))
                .filter(pdf_documents::expires_at.lt(now))
                .order(pdf_documents::expires_at.asc())
                .select(PdfDocumentRow::as_select())
                .load(conn)
        })
        .await
        .map_err(store_error)?;
        rows.into_iter().map(document).collect()
    }

    async fn delete_document(&self, id: Uuid) -> Result<(), StoreError> {
        let deleted = with_conn(&self.pool, move |conn| {
            diesel::delete(pdf_documents::table.filter(pdf_documents::id.eq(id))).execute(conn)
        })
        .await
        .map_err(store_error)?;
        if deleted == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seasonal_core::llm::sample_meal_plan_json;
    use seasonal_core::MealPlan;

    #[test]
    fn test_meal_plan_row_round_trip() {
        let plan: MealPlan = serde_json::from_str(&sample_meal_plan_json()).unwrap();
        let record = MealPlanRecord::new(Uuid::new_v4(), "Autumn", 4, plan, None, Utc::now());

        let restored = meal_plan_record(meal_plan_row(&record).unwrap()).unwrap();
        assert_eq!(restored, record);
    }

    #[test]
    fn test_document_row_keeps_storage_key_and_kind() {
        let doc = ArtifactDocument::new(
            Uuid::new_v4(),
            ArtifactKind::MealPlan,
            "Autumn 5-Day Meal Plan",
            "meal-plans/u/autumn-meal-plan-1.pdf",
            "https://files.test/meal-plans/u/autumn-meal-plan-1.pdf",
            Utc::now(),
        );
        let row = document_row(&doc);
        assert_eq!(row.kind, "meal_plan");

        let restored = document(row).unwrap();
        assert_eq!(restored, doc);
    }

    #[test]
    fn test_unknown_kind_is_an_error() {
        let mut row = document_row(&ArtifactDocument::new(
            Uuid::new_v4(),
            ArtifactKind::Recipe,
            "Soup",
            "recipes/u/soup.pdf",
            "https://files.test/recipes/u/soup.pdf",
            Utc::now(),
        ));
        row.kind = "poster".to_string();
        assert!(matches!(document(row), Err(StoreError::Database(_))));
    }
}
