use crate::analysis::CancellationToken;
use crate::analysis::dependencies::{DependencyGraph, DependencyLevel};
use crate::cli::commands::{Envelope, load_session, print_envelope};
use crate::cli::{DepsLevel, OutputFormat};
use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
struct DepsPayload {
    graph: DependencyGraph,
    #[serde(skip_serializing_if = "Option::is_none")]
    cycles: Option<Vec<Vec<String>>>,
}

pub fn execute(
    module: PathBuf,
    config: Option<PathBuf>,
    level: DepsLevel,
    root: Option<String>,
    max_depth: Option<usize>,
    cycles: bool,
    mermaid: bool,
    format: OutputFormat,
) -> Result<()> {
    let session = load_session(&module, config.as_deref())?;
    let cancel = CancellationToken::new();
    let level = match level {
        DepsLevel::Assembly => DependencyLevel::Assembly,
        DepsLevel::Namespace => DependencyLevel::Namespace,
        DepsLevel::Type => DependencyLevel::Type,
    };

    let result = session
        .build_dependency_graph(level, root.as_deref(), max_depth, &cancel)
        .map(|graph| {
            let found = cycles.then(|| graph.find_cycles());
            DepsPayload {
                cycles: found,
                graph,
            }
        });

    if mermaid {
        match &result {
            Ok(payload) => {
                println!("{}", payload.graph.to_mermaid());
                return Ok(());
            }
            Err(err) => {
                print_envelope(&Envelope::<DepsPayload>::from_error(err), format)?;
                return Ok(());
            }
        }
    }
    print_envelope(&Envelope::from_result(result), format)
}
