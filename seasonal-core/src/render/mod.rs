//! Rendering generated artifacts to PDF and publishing them.

pub mod layout;
pub mod pdf;

use crate::documents::ArtifactDocument;
use crate::storage::{BlobStore, StorageError};
use crate::store::{DocumentStore, StoreError};
use crate::types::{Artifact, ArtifactKind, MEAL_PLAN_DAYS};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to build PDF: {0}")]
    Pdf(String),

    #[error("Failed to upload PDF: {0}")]
    Upload(#[from] StorageError),

    #[error("Failed to record document: {0}")]
    Record(#[from] StoreError),
}

/// Per-request details the artifact itself doesn't carry.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub generated_at: DateTime<Utc>,
    pub seasonal_focus: Option<String>,
}

impl RenderContext {
    pub fn new(generated_at: DateTime<Utc>) -> Self {
        Self {
            generated_at,
            seasonal_focus: None,
        }
    }

    pub fn with_seasonal_focus(mut self, focus: impl Into<String>) -> Self {
        self.seasonal_focus = Some(focus.into());
        self
    }

    fn focus(&self) -> &str {
        self.seasonal_focus
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .unwrap_or("Seasonal")
    }
}

/// Document title for `artifact`.
pub fn document_title(artifact: &Artifact, context: &RenderContext) -> String {
    match artifact {
        Artifact::Recipe(recipe) => recipe.name.trim().to_string(),
        Artifact::MealPlan(_) => format!("{} {}-Day Meal Plan", context.focus(), MEAL_PLAN_DAYS),
    }
}

/// Lowercase ASCII letters and digits joined by single dashes.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

/// Storage key: `{kind prefix}/{user}/{slug}-{unix millis}.pdf`.
pub fn object_key(kind: ArtifactKind, user_id: Uuid, name: &str, at: DateTime<Utc>) -> String {
    let mut slug = slugify(name);
    if slug.is_empty() {
        slug = kind.storage_prefix().trim_end_matches('s').to_string();
    }
    format!(
        "{}/{}/{}-{}.pdf",
        kind.storage_prefix(),
        user_id,
        slug,
        at.timestamp_millis()
    )
}

/// Produces a document for an artifact and returns its public URL.
#[async_trait]
pub trait ArtifactRenderer: Send + Sync + fmt::Debug {
    async fn render(
        &self,
        artifact: &Artifact,
        user_id: Uuid,
        context: &RenderContext,
    ) -> Result<String, RenderError>;
}

/// Renders to PDF, uploads to a [`BlobStore`] and records meal plan documents.
#[derive(Debug, Clone)]
pub struct PdfArtifactRenderer {
    blobs: Arc<dyn BlobStore>,
    documents: Arc<dyn DocumentStore>,
}

impl PdfArtifactRenderer {
    pub fn new(blobs: Arc<dyn BlobStore>, documents: Arc<dyn DocumentStore>) -> Self {
        Self { blobs, documents }
    }

    pub fn build(artifact: &Artifact, context: &RenderContext) -> Result<Vec<u8>, RenderError> {
        let title = document_title(artifact, context);
        let layout = match artifact {
            Artifact::Recipe(recipe) => layout::recipe_card(recipe, context.generated_at),
            Artifact::MealPlan(plan) => {
                layout::meal_plan(plan, &title, context.focus(), context.generated_at)
            }
        };
        pdf::render_pdf(&layout)
    }
}

#[async_trait]
impl ArtifactRenderer for PdfArtifactRenderer {
    async fn render(
        &self,
        artifact: &Artifact,
        user_id: Uuid,
        context: &RenderContext,
    ) -> Result<String, RenderError> {
        let kind = artifact.kind();
        let title = document_title(artifact, context);
        let bytes = Self::build(artifact, context)?;

        let name = match kind {
            ArtifactKind::Recipe => title.clone(),
            ArtifactKind::MealPlan => format!("{} meal plan", context.focus()),
        };
        let key = object_key(kind, user_id, &name, context.generated_at);
        let size = bytes.len();
        let url = self.blobs.put(&key, bytes, PDF_CONTENT_TYPE).await?;

        tracing::info!(
            %user_id,
            kind = kind.as_str(),
            key = %key,
            size,
            backend = self.blobs.backend_name(),
            "Uploaded PDF"
        );

        if kind == ArtifactKind::MealPlan {
            let document =
                ArtifactDocument::new(user_id, kind, title, key.clone(), url.clone(), context.generated_at);
            if let Err(e) = self.documents.record_document(&document).await {
                // Without a row the blob would never be listed or cleaned up.
                if let Err(delete_err) = self.blobs.delete(&key).await {
                    tracing::warn!(
                        %user_id,
                        key = %key,
                        error = %delete_err,
                        "Failed to remove unrecorded PDF"
                    );
                }
                return Err(RenderError::Record(e));
            }
        }

        Ok(url)
    }
}
