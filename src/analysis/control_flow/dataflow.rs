use crate::analysis::control_flow::block::BlockId;
use crate::analysis::control_flow::graph::ControlFlowGraph;
use crate::model::MethodBody;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Block-level liveness of local-variable slots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LivenessResult {
    pub live_in: BTreeMap<BlockId, BTreeSet<u16>>,
    pub live_out: BTreeMap<BlockId, BTreeSet<u16>>,
    /// Slots read before any in-block definition.
    pub use_sets: BTreeMap<BlockId, BTreeSet<u16>>,
    /// Slots defined in the block.
    pub def_sets: BTreeMap<BlockId, BTreeSet<u16>>,
}

/// One store-local site, globally indexed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefSite {
    pub index: usize,
    pub block: BlockId,
    pub offset: u32,
    pub local: u16,
}

/// Reaching definitions over the global definition-site enumeration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReachingDefsResult {
    pub definitions: Vec<DefSite>,
    pub reach_in: BTreeMap<BlockId, BTreeSet<usize>>,
    pub reach_out: BTreeMap<BlockId, BTreeSet<usize>>,
    pub gen_sets: BTreeMap<BlockId, BTreeSet<usize>>,
    pub kill_sets: BTreeMap<BlockId, BTreeSet<usize>>,
}

fn successor_map(cfg: &ControlFlowGraph) -> BTreeMap<BlockId, Vec<BlockId>> {
    let mut map: BTreeMap<BlockId, Vec<BlockId>> =
        cfg.blocks.iter().map(|b| (b.id, Vec::new())).collect();
    for e in &cfg.edges {
        if let Some(succs) = map.get_mut(&e.from) {
            if !succs.contains(&e.to) {
                succs.push(e.to);
            }
        }
    }
    map
}

/// Backward fixpoint:
/// `LiveOut(B) = ⋃ LiveIn(S)`, `LiveIn(B) = use(B) ∪ (LiveOut(B) \ def(B))`.
pub fn analyze_liveness(cfg: &ControlFlowGraph, _body: &MethodBody) -> LivenessResult {
    let succ = successor_map(cfg);

    let mut use_sets: BTreeMap<BlockId, BTreeSet<u16>> = BTreeMap::new();
    let mut def_sets: BTreeMap<BlockId, BTreeSet<u16>> = BTreeMap::new();
    for block in &cfg.blocks {
        let mut uses = BTreeSet::new();
        let mut defs = BTreeSet::new();
        for instr in &block.instructions {
            if let Some(slot) = instr.load_local_slot() {
                if !defs.contains(&slot) {
                    uses.insert(slot);
                }
            }
            if let Some(slot) = instr.store_local_slot() {
                defs.insert(slot);
            }
        }
        use_sets.insert(block.id, uses);
        def_sets.insert(block.id, defs);
    }

    let mut live_in: BTreeMap<BlockId, BTreeSet<u16>> =
        cfg.blocks.iter().map(|b| (b.id, BTreeSet::new())).collect();
    let mut live_out = live_in.clone();

    let mut changed = true;
    while changed {
        changed = false;
        // Reverse block order converges quickly for a backward problem.
        for block in cfg.blocks.iter().rev() {
            let id = block.id;
            let mut out = BTreeSet::new();
            for s in &succ[&id] {
                out.extend(live_in[s].iter().copied());
            }
            let mut inn: BTreeSet<u16> = use_sets[&id].clone();
            inn.extend(out.difference(&def_sets[&id]).copied());
            if out != live_out[&id] {
                live_out.insert(id, out);
                changed = true;
            }
            if inn != live_in[&id] {
                live_in.insert(id, inn);
                changed = true;
            }
        }
    }

    LivenessResult {
        live_in,
        live_out,
        use_sets,
        def_sets,
    }
}

/// Forward fixpoint:
/// `ReachIn(B) = ⋃ ReachOut(P)`, `ReachOut(B) = gen(B) ∪ (ReachIn(B) \ kill(B))`.
pub fn analyze_reaching_defs(cfg: &ControlFlowGraph, _body: &MethodBody) -> ReachingDefsResult {
    // Global definition-site enumeration in block order, then instruction order.
    let mut definitions = Vec::new();
    for block in &cfg.blocks {
        for instr in &block.instructions {
            if let Some(slot) = instr.store_local_slot() {
                definitions.push(DefSite {
                    index: definitions.len(),
                    block: block.id,
                    offset: instr.offset,
                    local: slot,
                });
            }
        }
    }

    let mut sites_by_local: BTreeMap<u16, Vec<usize>> = BTreeMap::new();
    for site in &definitions {
        sites_by_local.entry(site.local).or_default().push(site.index);
    }

    let mut gen_sets: BTreeMap<BlockId, BTreeSet<usize>> = BTreeMap::new();
    let mut kill_sets: BTreeMap<BlockId, BTreeSet<usize>> = BTreeMap::new();
    for block in &cfg.blocks {
        // Last definition per local inside the block survives.
        let mut last_def: BTreeMap<u16, usize> = BTreeMap::new();
        for site in definitions.iter().filter(|s| s.block == block.id) {
            last_def.insert(site.local, site.index);
        }
        let generated: BTreeSet<usize> = last_def.values().copied().collect();
        let mut killed = BTreeSet::new();
        for (&local, _) in &last_def {
            for &site in &sites_by_local[&local] {
                if !generated.contains(&site) {
                    killed.insert(site);
                }
            }
        }
        gen_sets.insert(block.id, generated);
        kill_sets.insert(block.id, killed);
    }

    let mut pred: BTreeMap<BlockId, Vec<BlockId>> =
        cfg.blocks.iter().map(|b| (b.id, Vec::new())).collect();
    for e in &cfg.edges {
        if let Some(p) = pred.get_mut(&e.to) {
            if !p.contains(&e.from) {
                p.push(e.from);
            }
        }
    }

    let mut reach_in: BTreeMap<BlockId, BTreeSet<usize>> =
        cfg.blocks.iter().map(|b| (b.id, BTreeSet::new())).collect();
    let mut reach_out = reach_in.clone();

    let mut changed = true;
    while changed {
        changed = false;
        for block in &cfg.blocks {
            let id = block.id;
            let mut inn = BTreeSet::new();
            for p in &pred[&id] {
                inn.extend(reach_out[p].iter().copied());
            }
            let mut out: BTreeSet<usize> = gen_sets[&id].clone();
            out.extend(inn.difference(&kill_sets[&id]).copied());
            if inn != reach_in[&id] {
                reach_in.insert(id, inn);
                changed = true;
            }
            if out != reach_out[&id] {
                reach_out.insert(id, out);
                changed = true;
            }
        }
    }

    ReachingDefsResult {
        definitions,
        reach_in,
        reach_out,
        gen_sets,
        kill_sets,
    }
}
