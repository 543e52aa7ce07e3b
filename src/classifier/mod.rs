//! Sentiment classification
//!
//! - `SentimentModel` abstracts the pretrained three-class model
//! - `InferenceApiModel` calls a hosted text-classification endpoint
//! - `BatchClassifier` feeds normalized comments through the model in
//!   fixed-size batches and applies the batch failure policy

mod batch;
mod label;
mod model;

pub use batch::{BatchClassifier, BatchErrorPolicy, ClassifyOutput, DEFAULT_BATCH_SIZE};
pub use label::{Classification, LabelMap, SentimentLabel};
pub use model::{truncate_for_model, InferenceApiModel, ModelError, SentimentModel};
