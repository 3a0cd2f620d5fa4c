pub mod error;
pub mod frequency;
pub mod generator;
pub mod patterns;
pub mod recency;
pub mod report;

pub use error::AnalysisError;
