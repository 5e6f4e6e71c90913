//! Persistence contracts for generated meal plans and rendered documents.

use crate::documents::ArtifactDocument;
use crate::types::{MealPlan, MEAL_PLAN_DAYS};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A saved meal plan.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub seasonal_focus: String,
    pub servings_per_meal: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    pub content: MealPlan,
    pub created_at: DateTime<Utc>,
}

impl MealPlanRecord {
    /// A new record covering five days starting today.
    pub fn new(
        user_id: Uuid,
        seasonal_focus: &str,
        servings_per_meal: u32,
        content: MealPlan,
        pdf_url: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let focus = seasonal_focus.trim();
        let start_date = now.date_naive();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: format!("{} {}-Day Meal Plan", focus, MEAL_PLAN_DAYS),
            description: format!("A {} meal plan for {} people", focus, servings_per_meal),
            seasonal_focus: focus.to_string(),
            servings_per_meal,
            start_date,
            end_date: start_date + Duration::days(MEAL_PLAN_DAYS as i64 - 1),
            pdf_url,
            content,
            created_at: now,
        }
    }
}

#[async_trait]
pub trait MealPlanStore: Send + Sync + fmt::Debug {
    async fn save_meal_plan(&self, record: &MealPlanRecord) -> Result<(), StoreError>;

    /// The user's meal plans, newest first.
    async fn list_meal_plans(&self, user_id: Uuid) -> Result<Vec<MealPlanRecord>, StoreError>;

    /// One meal plan, only if it belongs to `user_id`.
    async fn get_meal_plan(&self, user_id: Uuid, id: Uuid) -> Result<MealPlanRecord, StoreError>;
}

#[async_trait]
pub trait DocumentStore: Send + Sync + fmt::Debug {
    async fn record_document(&self, document: &ArtifactDocument) -> Result<(), StoreError>;

    /// The user's documents, newest first.
    async fn list_documents(&self, user_id: Uuid) -> Result<Vec<ArtifactDocument>, StoreError>;

    /// The user's documents whose expiry is before `now`.
    async fn expired_documents(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<ArtifactDocument>, StoreError>;

    async fn delete_document(&self, id: Uuid) -> Result<(), StoreError>;
}

/// In-memory meal plan and document store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    meal_plans: Mutex<HashMap<Uuid, MealPlanRecord>>,
    documents: Mutex<HashMap<Uuid, ArtifactDocument>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn meal_plan_count(&self) -> usize {
        lock(&self.meal_plans).len()
    }

    pub fn document_count(&self) -> usize {
        lock(&self.documents).len()
    }
}

#[async_trait]
impl MealPlanStore for MemoryStore {
    async fn save_meal_plan(&self, record: &MealPlanRecord) -> Result<(), StoreError> {
        lock(&self.meal_plans).insert(record.id, record.clone());
        Ok(())
    }

    async fn list_meal_plans(&self, user_id: Uuid) -> Result<Vec<MealPlanRecord>, StoreError> {
        let mut plans: Vec<MealPlanRecord> = lock(&self.meal_plans)
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        plans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(plans)
    }

    async fn get_meal_plan(&self, user_id: Uuid, id: Uuid) -> Result<MealPlanRecord, StoreError> {
        lock(&self.meal_plans)
            .get(&id)
            .filter(|p| p.user_id == user_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn record_document(&self, document: &ArtifactDocument) -> Result<(), StoreError> {
        lock(&self.documents).insert(document.id, document.clone());
        Ok(())
    }

    async fn list_documents(&self, user_id: Uuid) -> Result<Vec<ArtifactDocument>, StoreError> {
        let mut documents: Vec<ArtifactDocument> = lock(&self.documents)
            .values()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect();
        documents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(documents)
    }

    async fn expired_documents(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<ArtifactDocument>, StoreError> {
        Ok(self
            .list_documents(user_id)
            .await?
            .into_iter()
            .filter(|d| d.is_expired(now))
            .collect())
    }

    async fn delete_document(&self, id: Uuid) -> Result<(), StoreError> {
        lock(&self.documents)
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::sample_meal_plan_json;
    use crate::generation::parse_meal_plan;
    use chrono::TimeZone;

    fn plan() -> MealPlan {
        parse_meal_plan(&sample_meal_plan_json()).unwrap()
    }

    #[test]
    fn test_record_title_and_dates() {
        let now = Utc.with_ymd_and_hms(2025, 10, 6, 9, 30, 0).unwrap();
        let record = MealPlanRecord::new(Uuid::new_v4(), " Autumn ", 4, plan(), None, now);
        assert_eq!(record.title, "Autumn 5-Day Meal Plan");
        assert_eq!(record.description, "A Autumn meal plan for 4 people");
        assert_eq!(record.start_date, NaiveDate::from_ymd_opt(2025, 10, 6).unwrap());
        assert_eq!(record.end_date, NaiveDate::from_ymd_opt(2025, 10, 10).unwrap());
    }

    #[tokio::test]
    async fn test_meal_plans_scoped_to_owner() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let record = MealPlanRecord::new(owner, "Winter", 2, plan(), None, Utc::now());
        store.save_meal_plan(&record).await.unwrap();

        assert_eq!(store.get_meal_plan(owner, record.id).await.unwrap(), record);
        assert!(matches!(
            store.get_meal_plan(Uuid::new_v4(), record.id).await,
            Err(StoreError::NotFound)
        ));
        assert!(store.list_meal_plans(Uuid::new_v4()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_documents_newest_first() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let now = Utc::now();
        let older = ArtifactDocument::new(
            user,
            crate::types::ArtifactKind::MealPlan,
            "Old",
            "meal-plans/u/old.pdf",
            "u1",
            now - Duration::days(3),
        );
        let newer = ArtifactDocument::new(
            user,
            crate::types::ArtifactKind::MealPlan,
            "New",
            "meal-plans/u/new.pdf",
            "u2",
            now,
        );
        store.record_document(&older).await.unwrap();
        store.record_document(&newer).await.unwrap();

        let titles: Vec<_> = store
            .list_documents(user)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.title)
            .collect();
        assert_eq!(titles, vec!["New", "Old"]);
    }
}
