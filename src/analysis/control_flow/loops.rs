use crate::analysis::control_flow::block::BlockId;
use crate::analysis::control_flow::edge::EdgeKind;
use crate::analysis::control_flow::graph::{ControlFlowGraph, LoopInfo};
use std::collections::{BTreeMap, BTreeSet};

/// Detect natural loops: DFS back-edge discovery, backward-reachability loop
/// bodies, subset-containment nesting. Back edges are retyped on the graph
/// and header/membership flags are written onto the blocks.
pub fn detect(cfg: &mut ControlFlowGraph) {
    let n = cfg.blocks.len();
    if n == 0 {
        return;
    }

    let mut succ: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut pred: Vec<Vec<usize>> = vec![Vec::new(); n];
    for e in &cfg.edges {
        let (f, t) = (e.from.0 as usize, e.to.0 as usize);
        if f < n && t < n {
            succ[f].push(t);
            pred[t].push(f);
        }
    }

    let back_edges = find_back_edges(cfg.entry.0 as usize, &succ);

    // Loops sharing a header merge into one body with several tails.
    let mut by_header: BTreeMap<usize, (BTreeSet<usize>, Vec<usize>)> = BTreeMap::new();
    for &(tail, header) in &back_edges {
        let entry = by_header
            .entry(header)
            .or_insert_with(|| (BTreeSet::from([header]), Vec::new()));
        entry.1.push(tail);
        natural_loop_body(tail, header, &pred, &mut entry.0);
    }

    let mut loops: Vec<LoopInfo> = by_header
        .into_iter()
        .enumerate()
        .map(|(i, (header, (body, tails)))| {
            let exits = body
                .iter()
                .filter(|&&b| succ[b].iter().any(|s| !body.contains(s)))
                .map(|&b| BlockId(b as u32))
                .collect();
            LoopInfo {
                id: i as u32,
                header: BlockId(header as u32),
                body: body.iter().map(|&b| BlockId(b as u32)).collect(),
                back_edge_sources: tails.iter().map(|&t| BlockId(t as u32)).collect(),
                exits,
                parent: None,
                nesting_level: 0,
            }
        })
        .collect();

    assign_nesting(&mut loops);

    // Retype back edges in place.
    let back_set: BTreeSet<(u32, u32)> = back_edges
        .iter()
        .map(|&(t, h)| (t as u32, h as u32))
        .collect();
    for e in &mut cfg.edges {
        if back_set.contains(&(e.from.0, e.to.0)) {
            e.kind = EdgeKind::BackEdge;
        }
    }

    // Headers and innermost membership on the blocks.
    for l in &loops {
        cfg.blocks[l.header.0 as usize].is_loop_header = true;
    }
    for block in &mut cfg.blocks {
        let innermost = loops
            .iter()
            .filter(|l| l.body.contains(&block.id))
            .min_by_key(|l| l.body.len());
        block.loop_id = innermost.map(|l| l.id);
    }

    cfg.loops = loops;
}

/// DFS from the entry; an edge into a node still on the stack is a back edge.
fn find_back_edges(entry: usize, succ: &[Vec<usize>]) -> Vec<(usize, usize)> {
    const WHITE: u8 = 0;
    const GRAY: u8 = 1;
    const BLACK: u8 = 2;

    let mut color = vec![WHITE; succ.len()];
    let mut back = Vec::new();
    if entry >= succ.len() {
        return back;
    }
    let mut stack: Vec<(usize, usize)> = vec![(entry, 0)];
    color[entry] = GRAY;
    while let Some(frame) = stack.last_mut() {
        let (node, next_child) = *frame;
        if next_child < succ[node].len() {
            frame.1 += 1;
            let child = succ[node][next_child];
            match color[child] {
                WHITE => {
                    color[child] = GRAY;
                    stack.push((child, 0));
                }
                GRAY => back.push((node, child)),
                _ => {}
            }
        } else {
            color[node] = BLACK;
            stack.pop();
        }
    }
    back.sort_unstable();
    back.dedup();
    back
}

/// Backward reachability from `tail` that never walks past `header`.
fn natural_loop_body(
    tail: usize,
    header: usize,
    pred: &[Vec<usize>],
    body: &mut BTreeSet<usize>,
) {
    let mut work = Vec::new();
    if body.insert(tail) || tail != header {
        work.push(tail);
    }
    while let Some(node) = work.pop() {
        if node == header {
            continue;
        }
        for &p in &pred[node] {
            if body.insert(p) {
                work.push(p);
            }
        }
    }
}

/// Immediate parent of a loop is the smallest strict superset; nesting level
/// is the length of the parent chain.
fn assign_nesting(loops: &mut [LoopInfo]) {
    let bodies: Vec<BTreeSet<BlockId>> = loops
        .iter()
        .map(|l| l.body.iter().copied().collect())
        .collect();
    for i in 0..loops.len() {
        let mut parent: Option<usize> = None;
        for j in 0..loops.len() {
            if i == j || bodies[i].len() >= bodies[j].len() {
                continue;
            }
            if bodies[i].is_subset(&bodies[j])
                && parent.map_or(true, |p| bodies[j].len() < bodies[p].len())
            {
                parent = Some(j);
            }
        }
        loops[i].parent = parent.map(|p| loops[p].id);
    }
    for i in 0..loops.len() {
        let mut level = 0;
        let mut cursor = loops[i].parent;
        while let Some(p) = cursor {
            level += 1;
            cursor = loops
                .iter()
                .find(|l| l.id == p)
                .and_then(|l| l.parent);
        }
        loops[i].nesting_level = level;
    }
}
