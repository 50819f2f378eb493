use crate::analysis::control_flow::block::{BasicBlock, BlockId, TerminatorKind};
use crate::analysis::control_flow::edge::{CfgEdge, EdgeKind};
use crate::analysis::control_flow::graph::{ControlFlowGraph, ExceptionRegion};
use crate::analysis::control_flow::loops;
use crate::errors::{AnalysisError, AnalysisResult};
use crate::model::{FlowControl, MethodBody, MethodDef};
use log::warn;
use std::collections::{BTreeSet, HashMap};

/// Build the control-flow graph for one method body.
///
/// `method_id` is the caller-supplied stable id recorded on the graph.
/// Malformed bodies degrade: a branch to an offset that is not an
/// instruction boundary is dropped (no edge), never mapped to a
/// neighboring block.
pub fn build(method: &MethodDef, method_id: String) -> AnalysisResult<ControlFlowGraph> {
    let body = method
        .body
        .as_ref()
        .ok_or_else(|| AnalysisError::NoBody(method.full_name.clone()))?;
    if body.instructions.is_empty() {
        return Err(AnalysisError::NoBody(format!(
            "{} (empty body)",
            method.full_name
        )));
    }

    let instructions = &body.instructions;
    let offsets: BTreeSet<u32> = instructions.iter().map(|i| i.offset).collect();

    let leaders = collect_leaders(body, &offsets);
    let mut blocks = build_blocks(instructions, &leaders);

    // Offset of each block start -> block id, for edge targets.
    let block_at: HashMap<u32, BlockId> = blocks
        .iter()
        .map(|b| (b.start_offset, b.id))
        .collect();

    let mut edges = Vec::new();
    let mut exits = Vec::new();
    for (idx, block) in blocks.iter().enumerate() {
        let next = blocks.get(idx + 1).map(|b| b.id);
        build_block_edges(block, next, &block_at, &mut edges, &mut exits, method);
    }

    let exception_regions = map_exception_regions(body, &mut blocks, &mut edges);

    let mut cfg = ControlFlowGraph {
        method_id,
        method_name: method.full_name.clone(),
        entry: BlockId(0),
        exits,
        blocks,
        edges,
        exception_regions,
        loops: Vec::new(),
    };
    loops::detect(&mut cfg);
    Ok(cfg)
}

/// Leader set: first offset, every branch/switch target, every instruction
/// following a branch/return/throw, and every exception-region boundary.
fn collect_leaders(body: &MethodBody, offsets: &BTreeSet<u32>) -> Vec<u32> {
    let instructions = &body.instructions;
    let mut leaders: BTreeSet<u32> = BTreeSet::new();
    leaders.insert(instructions[0].offset);

    for (i, instr) in instructions.iter().enumerate() {
        let mut mark_next = false;
        match instr.flow {
            FlowControl::Branch | FlowControl::CondBranch => {
                if let Some(targets) = instr.switch_targets() {
                    for &t in targets {
                        mark_target(t, offsets, &mut leaders, instr.offset);
                    }
                } else if let Some(t) = instr.branch_target() {
                    mark_target(t, offsets, &mut leaders, instr.offset);
                }
                mark_next = true;
            }
            FlowControl::Return | FlowControl::Throw => mark_next = true,
            _ => {}
        }
        if mark_next && let Some(next) = instructions.get(i + 1) {
            leaders.insert(next.offset);
        }
    }

    for h in &body.exception_handlers {
        for boundary in [
            Some(h.try_start),
            Some(h.try_end),
            Some(h.handler_start),
            Some(h.handler_end),
            h.filter_start,
        ]
        .into_iter()
        .flatten()
        {
            if offsets.contains(&boundary) {
                leaders.insert(boundary);
            }
        }
    }

    leaders.into_iter().collect()
}

fn mark_target(target: u32, offsets: &BTreeSet<u32>, leaders: &mut BTreeSet<u32>, from: u32) {
    if offsets.contains(&target) {
        leaders.insert(target);
    } else {
        warn!("orphan branch target IL_{target:04X} at IL_{from:04X}; dropped");
    }
}

/// Slice instructions into half-open leader spans; only non-empty blocks
/// are emitted, ids assigned in ascending offset order.
fn build_blocks(
    instructions: &[crate::model::Instruction],
    leaders: &[u32],
) -> Vec<BasicBlock> {
    let mut blocks = Vec::new();
    for (i, &start) in leaders.iter().enumerate() {
        let end = leaders.get(i + 1).copied();
        let span: Vec<_> = instructions
            .iter()
            .filter(|ins| ins.offset >= start && end.map_or(true, |e| ins.offset < e))
            .cloned()
            .collect();
        if span.is_empty() {
            continue;
        }
        let end_offset = end.unwrap_or_else(|| span.last().map(|i| i.offset + 1).unwrap_or(start));
        let terminator = terminator_of(span.last().expect("non-empty span"));
        blocks.push(BasicBlock {
            id: BlockId(blocks.len() as u32),
            start_offset: start,
            end_offset,
            instructions: span,
            terminator,
            is_in_try: false,
            handler_kind: None,
            is_loop_header: false,
            loop_id: None,
        });
    }
    blocks
}

fn terminator_of(last: &crate::model::Instruction) -> TerminatorKind {
    if last.is_switch() {
        return TerminatorKind::Switch;
    }
    match last.flow {
        FlowControl::Return => TerminatorKind::Return,
        FlowControl::Throw => TerminatorKind::Throw,
        FlowControl::Branch => TerminatorKind::Branch,
        FlowControl::CondBranch => TerminatorKind::CondBranch,
        _ => TerminatorKind::FallThrough,
    }
}

fn build_block_edges(
    block: &BasicBlock,
    next: Option<BlockId>,
    block_at: &HashMap<u32, BlockId>,
    edges: &mut Vec<CfgEdge>,
    exits: &mut Vec<BlockId>,
    method: &MethodDef,
) {
    let last = block.last_instruction().expect("blocks are non-empty");
    match block.terminator {
        TerminatorKind::Return | TerminatorKind::Throw => exits.push(block.id),
        TerminatorKind::Branch => {
            if let Some(to) = last.branch_target().and_then(|t| block_at.get(&t)) {
                edges.push(CfgEdge::new(block.id, *to, EdgeKind::Unconditional));
            } else {
                warn!(
                    "{}: unconditional branch at IL_{:04X} has no resolvable target",
                    method.full_name, last.offset
                );
            }
        }
        TerminatorKind::CondBranch => {
            if let Some(to) = last.branch_target().and_then(|t| block_at.get(&t)) {
                edges.push(CfgEdge::new(block.id, *to, EdgeKind::CondTrue));
            }
            if let Some(next) = next {
                edges.push(CfgEdge::new(block.id, next, EdgeKind::CondFalse));
            }
        }
        TerminatorKind::Switch => {
            if let Some(targets) = last.switch_targets() {
                for (i, t) in targets.iter().enumerate() {
                    if let Some(to) = block_at.get(t) {
                        edges.push(CfgEdge::new(
                            block.id,
                            *to,
                            EdgeKind::Switch(format!("case_{i}")),
                        ));
                    }
                }
            }
            if let Some(next) = next {
                edges.push(CfgEdge::new(
                    block.id,
                    next,
                    EdgeKind::Switch("default".to_string()),
                ));
            }
        }
        TerminatorKind::FallThrough => {
            if let Some(next) = next {
                edges.push(CfgEdge::new(block.id, next, EdgeKind::FallThrough));
            } else {
                // A trailing block that falls off the end is still an exit.
                exits.push(block.id);
            }
        }
    }
}

/// Map exception handlers onto blocks by offset inclusion and connect the
/// last try-block to the first handler-block with a labeled exception edge.
fn map_exception_regions(
    body: &MethodBody,
    blocks: &mut [BasicBlock],
    edges: &mut Vec<CfgEdge>,
) -> Vec<ExceptionRegion> {
    let mut regions = Vec::new();
    for h in &body.exception_handlers {
        let try_blocks: Vec<BlockId> = blocks
            .iter()
            .filter(|b| b.start_offset >= h.try_start && b.start_offset < h.try_end)
            .map(|b| b.id)
            .collect();
        let handler_blocks: Vec<BlockId> = blocks
            .iter()
            .filter(|b| b.start_offset >= h.handler_start && b.start_offset < h.handler_end)
            .map(|b| b.id)
            .collect();

        for id in &try_blocks {
            blocks[id.0 as usize].is_in_try = true;
        }
        if let Some(entry) = handler_blocks.first() {
            blocks[entry.0 as usize].handler_kind = Some(h.kind);
        }

        let label = h
            .catch_type
            .clone()
            .unwrap_or_else(|| h.kind.to_string());
        if let (Some(&from), Some(&to)) = (try_blocks.last(), handler_blocks.first()) {
            edges.push(CfgEdge::new(from, to, EdgeKind::Exception(label.clone())));
        }

        regions.push(ExceptionRegion {
            kind: h.kind,
            catch_type: h.catch_type.clone(),
            try_blocks,
            handler_blocks,
        });
    }
    regions
}
