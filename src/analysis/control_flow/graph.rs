use crate::analysis::control_flow::block::{BasicBlock, BlockId, TerminatorKind};
use crate::analysis::control_flow::edge::{CfgEdge, EdgeKind};
use crate::analysis::sanitize;
use crate::model::HandlerKind;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// One exception-handling region mapped onto blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExceptionRegion {
    pub kind: HandlerKind,
    pub catch_type: Option<String>,
    pub try_blocks: Vec<BlockId>,
    pub handler_blocks: Vec<BlockId>,
}

/// A natural loop: every block that can reach a back-edge tail without
/// leaving the header's dominated region, plus the header itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopInfo {
    pub id: u32,
    pub header: BlockId,
    /// Sorted member set; always contains `header`.
    pub body: Vec<BlockId>,
    pub back_edge_sources: Vec<BlockId>,
    /// Members with at least one successor outside the body.
    pub exits: Vec<BlockId>,
    pub parent: Option<u32>,
    pub nesting_level: usize,
}

/// Per-method control-flow graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlFlowGraph {
    pub method_id: String,
    pub method_name: String,
    pub entry: BlockId,
    pub exits: Vec<BlockId>,
    pub blocks: Vec<BasicBlock>,
    pub edges: Vec<CfgEdge>,
    pub exception_regions: Vec<ExceptionRegion>,
    pub loops: Vec<LoopInfo>,
}

/// Summary counters for a CFG.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CfgStats {
    pub block_count: usize,
    pub edge_count: usize,
    pub loop_count: usize,
    pub exit_count: usize,
    pub exception_region_count: usize,
    pub cyclomatic_complexity: usize,
}

impl ControlFlowGraph {
    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.get(id.0 as usize)
    }

    /// Block containing the given instruction offset.
    pub fn block_at_offset(&self, offset: u32) -> Option<&BasicBlock> {
        self.blocks.iter().find(|b| b.contains_offset(offset))
    }

    pub fn successors(&self, id: BlockId) -> Vec<BlockId> {
        self.edges
            .iter()
            .filter(|e| e.from == id)
            .map(|e| e.to)
            .collect()
    }

    pub fn predecessors(&self, id: BlockId) -> Vec<BlockId> {
        self.edges
            .iter()
            .filter(|e| e.to == id)
            .map(|e| e.from)
            .collect()
    }

    pub fn edges_from(&self, id: BlockId) -> Vec<&CfgEdge> {
        self.edges.iter().filter(|e| e.from == id).collect()
    }

    /// Cyclomatic complexity `M = E - N + 2P` with a floor of 1.
    pub fn cyclomatic_complexity(&self) -> usize {
        let e = self.edges.len() as isize;
        let n = self.blocks.len() as isize;
        let p = if self.blocks.is_empty() { 0 } else { 1 };
        (e - n + 2 * p).max(1) as usize
    }

    pub fn stats(&self) -> CfgStats {
        CfgStats {
            block_count: self.blocks.len(),
            edge_count: self.edges.len(),
            loop_count: self.loops.len(),
            exit_count: self.exits.len(),
            exception_region_count: self.exception_regions.len(),
            cyclomatic_complexity: self.cyclomatic_complexity(),
        }
    }

    /// Mermaid-style rendering: `id["text"]` node lines followed by
    /// `A --> B` / `A -->|label| B` edge lines.
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph TD\n");
        for b in &self.blocks {
            let term = match b.terminator {
                TerminatorKind::FallThrough => "fall_through",
                TerminatorKind::Branch => "branch",
                TerminatorKind::CondBranch => "cond_branch",
                TerminatorKind::Switch => "switch",
                TerminatorKind::Return => "return",
                TerminatorKind::Throw => "throw",
            };
            let _ = writeln!(
                out,
                "    {}[\"{}: IL_{:04X}..IL_{:04X} ({})\"]",
                b.id, b.id, b.start_offset, b.end_offset, term
            );
        }
        for e in &self.edges {
            let label = e.kind.label();
            if label.is_empty() {
                let _ = writeln!(out, "    {} --> {}", e.from, e.to);
            } else {
                let _ = writeln!(out, "    {} -->|{}| {}", e.from, sanitize::sanitize(label), e.to);
            }
        }
        out
    }
}
