// Analysis kernel - organized by feature area

pub mod call_graph;
pub mod context; // AnalysisConfig, CancellationToken
pub mod control_flow;
pub mod dependencies;
pub mod identity; // stable content-addressed ids
pub mod index; // type/member indexes
pub mod obfuscation;
pub mod patterns;
pub mod sanitize;
pub mod search;
pub mod session; // ArtifactStore, AnalysisSession facade
pub mod xref;

// Minimal re-exports only where ergonomic
pub use context::{AnalysisConfig, CancellationToken};
pub use session::{AnalysisSession, ArtifactStore};
