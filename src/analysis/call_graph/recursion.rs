use crate::analysis::call_graph::CallGraph;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecursionKind {
    DirectRecursion,
    IndirectRecursion,
}

/// One recursion site: a self-loop or a strongly connected component of the
/// call graph, with the member method ids in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recursion {
    pub kind: RecursionKind,
    pub cycle: Vec<String>,
}

/// Tarjan SCC over the call graph. Self-loops become direct recursion; any
/// larger component becomes indirect recursion with its full cycle.
pub fn detect_recursion(graph: &CallGraph) -> Vec<Recursion> {
    let mut g: DiGraph<&str, ()> = DiGraph::new();
    let mut index: HashMap<&str, NodeIndex> = HashMap::new();
    for id in graph.nodes.keys() {
        index.insert(id.as_str(), g.add_node(id.as_str()));
    }
    for edge in &graph.edges {
        if let (Some(&from), Some(&to)) = (
            index.get(edge.caller.as_str()),
            index.get(edge.callee.as_str()),
        ) {
            g.add_edge(from, to, ());
        }
    }

    let mut out = Vec::new();
    for scc in tarjan_scc(&g) {
        if scc.len() == 1 {
            let node = scc[0];
            if g.find_edge(node, node).is_some() {
                out.push(Recursion {
                    kind: RecursionKind::DirectRecursion,
                    cycle: vec![g[node].to_string()],
                });
            }
            continue;
        }
        let mut cycle: Vec<String> = scc.iter().map(|&n| g[n].to_string()).collect();
        // Rotate so the smallest id leads; keeps output deterministic.
        if let Some(min_pos) = cycle
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.cmp(b.1))
            .map(|(i, _)| i)
        {
            cycle.rotate_left(min_pos);
        }
        out.push(Recursion {
            kind: RecursionKind::IndirectRecursion,
            cycle,
        });
    }
    out.sort_by(|a, b| a.cycle.cmp(&b.cycle));
    out
}
