pub mod callgraph;
pub mod cfg;
pub mod deps;
pub mod index;
pub mod obfuscation;
pub mod patterns;
pub mod search;
pub mod xref;

use crate::analysis::{AnalysisConfig, AnalysisSession};
use crate::cli::OutputFormat;
use crate::errors::{AnalysisError, AnalysisResult};
use crate::model::{JsonModuleProvider, ModuleProvider};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Load a serialized module, apply an optional config file, and open an
/// analysis session over both.
pub(crate) fn load_session(
    module_path: &Path,
    config_path: Option<&Path>,
) -> Result<AnalysisSession> {
    let mut provider = JsonModuleProvider::new();
    let module = provider
        .load(module_path)
        .with_context(|| format!("Failed to load module from {}", module_path.display()))?;
    match config_path {
        Some(path) => Ok(AnalysisSession::with_config(module, load_config(path)?)),
        None => Ok(AnalysisSession::new(module)),
    }
}

/// AnalysisConfig from JSON or TOML, picked by file extension.
fn load_config(path: &Path) -> Result<AnalysisConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    let parsed = if ext == "toml" {
        toml::from_str(&raw).map_err(|e| anyhow::anyhow!(e))?
    } else {
        serde_json::from_str(&raw).map_err(|e| anyhow::anyhow!(e))?
    };
    Ok(parsed)
}

/// Result envelope printed by every command: success flag, stable error code,
/// human message, payload.
#[derive(Debug, Serialize)]
pub(crate) struct Envelope<T: Serialize> {
    pub is_success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<T>,
}

impl<T: Serialize> Envelope<T> {
    pub fn from_result(result: AnalysisResult<T>) -> Self {
        match result {
            Ok(payload) => Envelope {
                is_success: true,
                error_code: None,
                message: None,
                payload: Some(payload),
            },
            Err(err) => Envelope::from_error(&err),
        }
    }

    pub fn from_error(err: &AnalysisError) -> Self {
        Envelope {
            is_success: false,
            error_code: Some(err.code()),
            message: Some(err.to_string()),
            payload: None,
        }
    }
}

pub(crate) fn print_envelope<T: Serialize>(envelope: &Envelope<T>, format: OutputFormat) -> Result<()> {
    let json = match format {
        OutputFormat::Json => serde_json::to_string(envelope),
        OutputFormat::Pretty => serde_json::to_string_pretty(envelope),
    }
    .with_context(|| "Failed to serialize result envelope")?;
    println!("{json}");
    Ok(())
}
