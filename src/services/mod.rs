pub mod classification_policy;
pub mod classifier;
pub mod llm_service;
pub mod progress_store;
pub mod prompt;

pub use classification_policy::{ClassificationPolicy, Verdict};
pub use classifier::Classifier;
pub use llm_service::LlmService;
pub use progress_store::{ProgressStore, StoreOptions};
