use crate::model::module::Module;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadErrorKind {
    FileNotFound,
    InvalidFormat,
    AccessDenied,
    Unknown,
}

#[derive(Debug, Error)]
#[error("{kind:?}: {message}")]
pub struct LoadError {
    pub kind: LoadErrorKind,
    pub message: String,
}

impl LoadError {
    pub fn new(kind: LoadErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for LoadError {
    fn from(err: std::io::Error) -> Self {
        let kind = match err.kind() {
            ErrorKind::NotFound => LoadErrorKind::FileNotFound,
            ErrorKind::PermissionDenied => LoadErrorKind::AccessDenied,
            _ => LoadErrorKind::Unknown,
        };
        LoadError::new(kind, err.to_string())
    }
}

/// Contract of the parser/loader collaborator. The kernel only ever sees the
/// `Module` value it returns.
pub trait ModuleProvider {
    fn load(&mut self, path: &Path) -> Result<Module, LoadError>;
}

/// Provider reading a serialized Module Model. The real binary loader lives
/// outside this crate; the CLI uses this one for its inputs.
#[derive(Debug, Default)]
pub struct JsonModuleProvider;

impl JsonModuleProvider {
    pub fn new() -> Self {
        Self
    }
}

impl ModuleProvider for JsonModuleProvider {
    fn load(&mut self, path: &Path) -> Result<Module, LoadError> {
        let data = std::fs::read_to_string(path).map_err(LoadError::from)?;
        serde_json::from_str(&data)
            .map_err(|e| LoadError::new(LoadErrorKind::InvalidFormat, e.to_string()))
    }
}
