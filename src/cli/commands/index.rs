use crate::analysis::index::{MemberIndexEntry, NamespaceListing, TypeIndexEntry};
use crate::cli::OutputFormat;
use crate::cli::commands::{Envelope, load_session, print_envelope};
use crate::errors::AnalysisResult;
use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
struct IndexPayload {
    module_guid: String,
    type_count: usize,
    member_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<NamespaceListing>,
    types: Vec<TypeIndexEntry>,
    members: Vec<MemberIndexEntry>,
}

pub fn execute(
    module: PathBuf,
    config: Option<PathBuf>,
    namespace: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let session = load_session(&module, config.as_deref())?;
    let types = session.type_index();
    let members = session.member_index();

    let listing = namespace.as_deref().map(|ns| session.browse_namespace(ns));
    let type_entries: Vec<TypeIndexEntry> = match &listing {
        Some(l) => l.types.clone(),
        None => types.entries().to_vec(),
    };
    let member_entries: Vec<MemberIndexEntry> = match &listing {
        Some(l) => l
            .types
            .iter()
            .flat_map(|t| members.by_declaring_type(&t.full_name))
            .cloned()
            .collect(),
        None => members.entries().to_vec(),
    };

    let result: AnalysisResult<IndexPayload> = Ok(IndexPayload {
        module_guid: session.module().guid.to_string(),
        type_count: types.len(),
        member_count: members.len(),
        namespace: listing,
        types: type_entries,
        members: member_entries,
    });
    print_envelope(&Envelope::from_result(result), format)
}
