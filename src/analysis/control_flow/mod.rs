//! Per-method control-flow analysis: basic blocks, edges, exception regions,
//! natural loops, dominance, and the classic data-flow fixpoints.

pub mod block;
pub mod builder;
pub mod dataflow;
pub mod dominators;
pub mod edge;
pub mod graph;
pub mod loops;

pub use block::{BasicBlock, BlockId, TerminatorKind};
pub use builder::build;
pub use dataflow::{
    DefSite, LivenessResult, ReachingDefsResult, analyze_liveness, analyze_reaching_defs,
};
pub use dominators::{DominatorAnalysis, DominatorTree, analyze as analyze_dominators};
pub use edge::{CfgEdge, EdgeKind};
pub use graph::{CfgStats, ControlFlowGraph, ExceptionRegion, LoopInfo};
