//! cilscope - static analysis for CIL/ECMA-335 modules

pub mod analysis;
pub mod cli;
pub mod errors;
pub mod model;

pub use analysis::{AnalysisConfig, AnalysisSession, CancellationToken};
pub use errors::{AnalysisError, AnalysisResult};
