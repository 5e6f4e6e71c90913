pub mod documents;
pub mod error;
pub mod generation;
pub mod llm;
pub mod orchestrator;
pub mod quota;
pub mod render;
pub mod shopping_list;
pub mod storage;
pub mod store;
pub mod types;

pub use documents::{cleanup_expired, ArtifactDocument, CleanupReport};
pub use error::GenerationError;
pub use generation::{GenerateError, GenerationClient, ModelSelection, RetryPolicy};
pub use llm::{create_provider, LlmConfig, LlmError, LlmProvider};
pub use orchestrator::{GenerationOrchestrator, MealPlanOutcome, PdfStatus, RecipeOutcome, Timeouts};
pub use quota::{InMemoryQuotaLedger, QuotaError, QuotaLedger, QuotaRecord, UsageStats};
pub use render::{ArtifactRenderer, PdfArtifactRenderer, RenderContext, RenderError};
pub use storage::{BlobStore, DiskBlobStore, MemoryBlobStore, StorageError};
pub use store::{DocumentStore, MealPlanRecord, MealPlanStore, MemoryStore, StoreError};
pub use types::{
    Artifact, ArtifactKind, Caller, MealPlan, MealPlanRequest, Nutrition, Recipe, RecipeRequest,
    SubscriptionTier,
};
