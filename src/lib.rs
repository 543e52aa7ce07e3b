//! Tubesent - YouTube comment sentiment analysis
//!
//! Resolves a video link to an identifier, fetches the video's top-level
//! comments, cleans them, classifies each one as positive, neutral or
//! negative with a pretrained Indonesian sentiment model, and aggregates
//! the results into distributions, samples, term frequencies and a
//! timeline.

pub mod aggregate;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod normalize;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod session;
pub mod youtube;

pub use error::{Result, TubesentError};
