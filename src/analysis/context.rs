use crate::errors::{AnalysisError, AnalysisResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Tunable analysis constants. The defaults reproduce the reference behavior;
/// the CLI can load overrides from JSON or TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Backward scan distance (bytes) when resolving reflection call targets.
    #[serde(default = "default_reflection_scan_window")]
    pub reflection_scan_window: u32,
    /// Distance (bytes) between a `ldftn` and the closure `newobj` it feeds.
    #[serde(default = "default_lambda_ldftn_window")]
    pub lambda_ldftn_window: u32,
    /// Recursion cap when expanding type-level dependencies.
    #[serde(default = "default_max_type_depth")]
    pub max_type_depth: usize,
    /// Result cap applied when a search request does not set one.
    #[serde(default = "default_search_limit")]
    pub default_search_limit: usize,
    /// Proxy-method count above which the obfuscation pass reports.
    #[serde(default = "default_proxy_threshold")]
    pub proxy_method_threshold: usize,
    /// Static byte[] field count above which string encryption is suspected.
    #[serde(default = "default_encrypted_blob_threshold")]
    pub encrypted_blob_threshold: usize,
}

fn default_reflection_scan_window() -> u32 {
    50
}
fn default_lambda_ldftn_window() -> u32 {
    20
}
fn default_max_type_depth() -> usize {
    5
}
fn default_search_limit() -> usize {
    100
}
fn default_proxy_threshold() -> usize {
    20
}
fn default_encrypted_blob_threshold() -> usize {
    20
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            reflection_scan_window: default_reflection_scan_window(),
            lambda_ldftn_window: default_lambda_ldftn_window(),
            max_type_depth: default_max_type_depth(),
            default_search_limit: default_search_limit(),
            proxy_method_threshold: default_proxy_threshold(),
            encrypted_blob_threshold: default_encrypted_blob_threshold(),
        }
    }
}

/// Cloneable cooperative-cancellation flag. Every long-running analysis polls
/// it at least once per outer-loop iteration and returns
/// `AnalysisError::Cancelled` instead of partial data.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Poll point: `Err(Cancelled)` once the flag is set.
    pub fn ensure_live(&self) -> AnalysisResult<()> {
        if self.is_cancelled() {
            Err(AnalysisError::Cancelled)
        } else {
            Ok(())
        }
    }
}
