pub mod analyze;
pub mod blob;
pub mod config;
pub mod error;
pub mod gemini;
pub mod image;
pub mod models;
pub mod prompt;
pub mod reconcile;
pub mod routes;

pub use analyze::{AnalysisOutcome, Analyzer};
pub use config::{AnalysisProfile, Config};
pub use routes::router;
