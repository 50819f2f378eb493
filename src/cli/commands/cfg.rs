use crate::analysis::CancellationToken;
use crate::analysis::control_flow::{
    CfgStats, ControlFlowGraph, DominatorAnalysis, LivenessResult, ReachingDefsResult,
};
use crate::cli::OutputFormat;
use crate::cli::commands::{Envelope, load_session, print_envelope};
use crate::errors::AnalysisResult;
use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
struct CfgPayload {
    cfg: ControlFlowGraph,
    stats: CfgStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    dominators: Option<DominatorAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    liveness: Option<LivenessResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reaching_defs: Option<ReachingDefsResult>,
}

pub fn execute(
    module: PathBuf,
    config: Option<PathBuf>,
    type_name: String,
    method: String,
    dominators: bool,
    dataflow: bool,
    mermaid: bool,
    format: OutputFormat,
) -> Result<()> {
    let session = load_session(&module, config.as_deref())?;
    let _cancel = CancellationToken::new();

    let result: AnalysisResult<CfgPayload> = session.build_cfg(&type_name, &method).map(|cfg| {
        let doms = dominators.then(|| session.analyze_dominators(&cfg));
        let (liveness, reaching) = if dataflow {
            match session.method_body(&type_name, &method) {
                Ok(body) => (
                    Some(session.analyze_liveness(&cfg, body)),
                    Some(session.analyze_reaching_defs(&cfg, body)),
                ),
                Err(_) => (None, None),
            }
        } else {
            (None, None)
        };
        CfgPayload {
            stats: cfg.stats(),
            dominators: doms,
            liveness,
            reaching_defs: reaching,
            cfg,
        }
    });

    if mermaid {
        match &result {
            Ok(payload) => {
                println!("{}", payload.cfg.to_mermaid());
                return Ok(());
            }
            Err(err) => {
                print_envelope(&Envelope::<CfgPayload>::from_error(err), format)?;
                return Ok(());
            }
        }
    }

    print_envelope(&Envelope::from_result(result), format)
}
