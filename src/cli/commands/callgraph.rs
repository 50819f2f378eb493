use crate::analysis::CancellationToken;
use crate::analysis::call_graph::{CallGraph, Recursion};
use crate::cli::OutputFormat;
use crate::cli::commands::{Envelope, load_session, print_envelope};
use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
struct CallGraphPayload {
    graph: CallGraph,
    #[serde(skip_serializing_if = "Option::is_none")]
    recursion: Option<Vec<Recursion>>,
}

pub fn execute(
    module: PathBuf,
    config: Option<PathBuf>,
    recursion: bool,
    format: OutputFormat,
) -> Result<()> {
    let session = load_session(&module, config.as_deref())?;
    let cancel = CancellationToken::new();

    let result = session.build_call_graph(&cancel).map(|graph| {
        let cycles = recursion.then(|| session.detect_recursion(&graph));
        CallGraphPayload {
            recursion: cycles,
            graph,
        }
    });
    print_envelope(&Envelope::from_result(result), format)
}
