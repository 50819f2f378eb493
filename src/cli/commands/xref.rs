use crate::analysis::CancellationToken;
use crate::cli::commands::{Envelope, load_session, print_envelope};
use crate::cli::{OutputFormat, XrefQueryKind};
use crate::errors::AnalysisError;
use anyhow::Result;
use std::path::PathBuf;

pub fn execute(
    module: PathBuf,
    config: Option<PathBuf>,
    kind: XrefQueryKind,
    type_name: String,
    member: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let session = load_session(&module, config.as_deref())?;
    let cancel = CancellationToken::new();

    let need_member = || {
        member.clone().ok_or_else(|| {
            AnalysisError::InvalidInput("--member is required for this query".to_string())
        })
    };

    let result = match kind {
        XrefQueryKind::TypeRefs => session.find_references_to_type(&type_name, &cancel),
        XrefQueryKind::Calls => {
            need_member().and_then(|m| session.find_calls_to_method(&type_name, &m, &cancel))
        }
        XrefQueryKind::FieldUsages => {
            need_member().and_then(|m| session.find_field_usages(&type_name, &m, &cancel))
        }
        XrefQueryKind::Overrides => {
            need_member().and_then(|m| session.find_method_overrides(&type_name, &m, &cancel))
        }
        XrefQueryKind::InterfaceImpls => {
            need_member().and_then(|m| session.find_interface_impls(&type_name, &m, &cancel))
        }
    };
    print_envelope(&Envelope::from_result(result), format)
}
