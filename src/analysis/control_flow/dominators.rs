use crate::analysis::control_flow::block::BlockId;
use crate::analysis::control_flow::graph::ControlFlowGraph;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Dominator (or post-dominator) tree over a CFG. For the post variant the
/// root is `BlockId::VIRTUAL_EXIT`, which sinks every return/throw block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DominatorTree {
    pub is_post: bool,
    pub root: BlockId,
    /// Immediate dominator; the root maps to `None`.
    pub idom: BTreeMap<BlockId, Option<BlockId>>,
    pub children: BTreeMap<BlockId, Vec<BlockId>>,
    dom_sets: BTreeMap<BlockId, BTreeSet<BlockId>>,
}

impl DominatorTree {
    /// `a` dominates `b` (reflexive).
    pub fn dominates(&self, a: BlockId, b: BlockId) -> bool {
        self.dom_sets.get(&b).is_some_and(|set| set.contains(&a))
    }

    pub fn strictly_dominates(&self, a: BlockId, b: BlockId) -> bool {
        a != b && self.dominates(a, b)
    }

    pub fn dominators_of(&self, b: BlockId) -> Option<&BTreeSet<BlockId>> {
        self.dom_sets.get(&b)
    }

    pub fn idom_of(&self, b: BlockId) -> Option<BlockId> {
        self.idom.get(&b).copied().flatten()
    }
}

/// Combined result of the dominance analyses over one CFG.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DominatorAnalysis {
    pub dominators: DominatorTree,
    pub post_dominators: DominatorTree,
    /// DF(b): blocks just outside b's dominated region.
    pub dominance_frontier: BTreeMap<BlockId, BTreeSet<BlockId>>,
    /// control_dependence[b]: blocks whose execution depends on the branch at b.
    pub control_dependence: BTreeMap<BlockId, BTreeSet<BlockId>>,
}

pub fn analyze(cfg: &ControlFlowGraph) -> DominatorAnalysis {
    let forward = forward_edges(cfg);
    let dominators = iterative_dominators(cfg.entry, &forward, false);

    let reverse = reverse_edges(cfg);
    let post_dominators = iterative_dominators(BlockId::VIRTUAL_EXIT, &reverse, true);

    let dominance_frontier = frontier(&forward, &dominators);
    let control_dependence = control_dependence(&forward, &post_dominators);

    DominatorAnalysis {
        dominators,
        post_dominators,
        dominance_frontier,
        control_dependence,
    }
}

type EdgeMap = BTreeMap<BlockId, Vec<BlockId>>;

/// Successor map over all edges (normal and exception alike).
fn forward_edges(cfg: &ControlFlowGraph) -> EdgeMap {
    let mut map: EdgeMap = cfg.blocks.iter().map(|b| (b.id, Vec::new())).collect();
    for e in &cfg.edges {
        if let Some(succs) = map.get_mut(&e.from) {
            if !succs.contains(&e.to) {
                succs.push(e.to);
            }
        }
    }
    map
}

/// Reversed graph with the virtual exit: exits flow into `VIRTUAL_EXIT`,
/// which becomes the traversal root.
fn reverse_edges(cfg: &ControlFlowGraph) -> EdgeMap {
    let mut map: EdgeMap = cfg.blocks.iter().map(|b| (b.id, Vec::new())).collect();
    map.insert(BlockId::VIRTUAL_EXIT, Vec::new());
    for e in &cfg.edges {
        if let Some(succs) = map.get_mut(&e.to) {
            if !succs.contains(&e.from) {
                succs.push(e.from);
            }
        }
    }
    let exit_succs = map
        .get_mut(&BlockId::VIRTUAL_EXIT)
        .expect("virtual exit present");
    for &exit in &cfg.exits {
        if !exit_succs.contains(&exit) {
            exit_succs.push(exit);
        }
    }
    map
}

/// Iterative set-based dominator fixpoint over reverse postorder:
/// `dom(root) = {root}`, `dom(b) = {b} ∪ ⋂ dom(p)` over processed
/// predecessors, until nothing changes.
fn iterative_dominators(root: BlockId, succ: &EdgeMap, is_post: bool) -> DominatorTree {
    let order = reverse_postorder(root, succ);
    let reachable: BTreeSet<BlockId> = order.iter().copied().collect();

    // Predecessors restricted to the reachable region.
    let mut preds: BTreeMap<BlockId, Vec<BlockId>> =
        order.iter().map(|&b| (b, Vec::new())).collect();
    for (&from, tos) in succ {
        if !reachable.contains(&from) {
            continue;
        }
        for to in tos {
            if let Some(p) = preds.get_mut(to) {
                p.push(from);
            }
        }
    }

    let all: BTreeSet<BlockId> = reachable.clone();
    let mut dom: BTreeMap<BlockId, BTreeSet<BlockId>> = BTreeMap::new();
    for &b in &order {
        if b == root {
            dom.insert(b, BTreeSet::from([b]));
        } else {
            dom.insert(b, all.clone());
        }
    }

    let mut changed = true;
    while changed {
        changed = false;
        for &b in &order {
            if b == root {
                continue;
            }
            let mut acc: Option<BTreeSet<BlockId>> = None;
            for p in &preds[&b] {
                let pset = &dom[p];
                acc = Some(match acc {
                    None => pset.clone(),
                    Some(cur) => cur.intersection(pset).copied().collect(),
                });
            }
            let mut next = acc.unwrap_or_default();
            next.insert(b);
            if next != dom[&b] {
                dom.insert(b, next);
                changed = true;
            }
        }
    }

    // idom(b): the strict dominator dominated by every other strict
    // dominator, i.e. the one with the largest dominator set.
    let mut idom: BTreeMap<BlockId, Option<BlockId>> = BTreeMap::new();
    let mut children: BTreeMap<BlockId, Vec<BlockId>> =
        order.iter().map(|&b| (b, Vec::new())).collect();
    for &b in &order {
        if b == root {
            idom.insert(b, None);
            continue;
        }
        let parent = dom[&b]
            .iter()
            .filter(|&&d| d != b)
            .max_by_key(|&&d| dom[&d].len())
            .copied();
        idom.insert(b, parent);
        if let Some(p) = parent {
            children.entry(p).or_default().push(b);
        }
    }

    DominatorTree {
        is_post,
        root,
        idom,
        children,
        dom_sets: dom,
    }
}

fn reverse_postorder(root: BlockId, succ: &EdgeMap) -> Vec<BlockId> {
    let mut visited = BTreeSet::new();
    let mut postorder = Vec::new();
    if !succ.contains_key(&root) {
        return postorder;
    }
    // Iterative DFS with an explicit child cursor.
    let mut stack: Vec<(BlockId, usize)> = vec![(root, 0)];
    visited.insert(root);
    while let Some(frame) = stack.last_mut() {
        let (node, cursor) = *frame;
        let succs = &succ[&node];
        if cursor < succs.len() {
            frame.1 += 1;
            let child = succs[cursor];
            if succ.contains_key(&child) && visited.insert(child) {
                stack.push((child, 0));
            }
        } else {
            postorder.push(node);
            stack.pop();
        }
    }
    postorder.reverse();
    postorder
}

/// Runner-walk dominance frontier: for each join block, walk each
/// predecessor's idom chain up to the join's idom.
fn frontier(
    succ: &EdgeMap,
    tree: &DominatorTree,
) -> BTreeMap<BlockId, BTreeSet<BlockId>> {
    let mut preds: BTreeMap<BlockId, Vec<BlockId>> = BTreeMap::new();
    for (&from, tos) in succ {
        for &to in tos {
            preds.entry(to).or_default().push(from);
        }
    }

    let mut df: BTreeMap<BlockId, BTreeSet<BlockId>> =
        succ.keys().map(|&b| (b, BTreeSet::new())).collect();
    for (&b, bpreds) in &preds {
        if bpreds.len() < 2 {
            continue;
        }
        let Some(idom_b) = tree.idom_of(b) else {
            continue;
        };
        for &p in bpreds {
            let mut runner = Some(p);
            while let Some(r) = runner {
                if r == idom_b {
                    break;
                }
                df.entry(r).or_default().insert(b);
                runner = tree.idom_of(r);
            }
        }
    }
    df
}

/// Control dependence from the post-dominator tree: from each branching
/// block `b` and each successor `s`, every node on the post-idom chain from
/// `s` up to (excluding) post-idom(b) depends on `b`.
fn control_dependence(
    succ: &EdgeMap,
    post: &DominatorTree,
) -> BTreeMap<BlockId, BTreeSet<BlockId>> {
    let mut deps: BTreeMap<BlockId, BTreeSet<BlockId>> =
        succ.keys().map(|&b| (b, BTreeSet::new())).collect();
    for (&b, succs) in succ {
        if succs.len() < 2 {
            continue;
        }
        let stop = post.idom_of(b);
        for &s in succs {
            let mut runner = Some(s);
            while let Some(r) = runner {
                if Some(r) == stop || r == BlockId::VIRTUAL_EXIT {
                    break;
                }
                deps.entry(b).or_default().insert(r);
                runner = post.idom_of(r);
            }
        }
    }
    deps
}
