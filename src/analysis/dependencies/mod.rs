//! Dependency graphs at assembly, namespace, and type granularity. All three
//! share the weighted aggregation: a re-discovered relation bumps the edge
//! weight instead of adding a duplicate edge.

pub mod builder;

pub use builder::build;

use crate::analysis::sanitize;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fmt::Write;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyLevel {
    Assembly,
    Namespace,
    Type,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Assembly,
    Namespace,
    Type,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    Inheritance,
    Implementation,
    FieldType,
    ReturnType,
    ParameterType,
    LocalVariable,
    MethodCall,
    FieldAccess,
    TypeReference,
    AssemblyReference,
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DependencyKind::Inheritance => "inheritance",
            DependencyKind::Implementation => "implementation",
            DependencyKind::FieldType => "field_type",
            DependencyKind::ReturnType => "return_type",
            DependencyKind::ParameterType => "parameter_type",
            DependencyKind::LocalVariable => "local_variable",
            DependencyKind::MethodCall => "method_call",
            DependencyKind::FieldAccess => "field_access",
            DependencyKind::TypeReference => "type_reference",
            DependencyKind::AssemblyReference => "assembly_reference",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyNode {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    /// Not defined by the module under analysis.
    pub is_external: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub from: String,
    pub to: String,
    pub kind: DependencyKind,
    /// Count of primitive relations aggregated into this edge.
    pub weight: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyGraph {
    pub level: DependencyLevel,
    pub nodes: BTreeMap<String, DependencyNode>,
    pub edges: Vec<DependencyEdge>,
    #[serde(skip)]
    edge_index: HashMap<(String, String, Option<DependencyKind>), usize>,
}

impl DependencyGraph {
    pub fn new(level: DependencyLevel) -> Self {
        Self {
            level,
            nodes: BTreeMap::new(),
            edges: Vec::new(),
            edge_index: HashMap::new(),
        }
    }

    pub fn add_node(&mut self, id: &str, kind: NodeKind, is_external: bool) {
        self.nodes.entry(id.to_string()).or_insert(DependencyNode {
            id: id.to_string(),
            name: id.to_string(),
            kind,
            is_external,
        });
    }

    /// Record one primitive relation. At type level edges are discriminated
    /// by kind; at namespace/assembly level the first-seen kind wins and
    /// later relations only accumulate weight.
    pub fn add_relation(&mut self, from: &str, to: &str, kind: DependencyKind) {
        let key = match self.level {
            DependencyLevel::Type => (from.to_string(), to.to_string(), Some(kind)),
            _ => (from.to_string(), to.to_string(), None),
        };
        if let Some(&idx) = self.edge_index.get(&key) {
            self.edges[idx].weight += 1;
            return;
        }
        self.edge_index.insert(key, self.edges.len());
        self.edges.push(DependencyEdge {
            from: from.to_string(),
            to: to.to_string(),
            kind,
            weight: 1,
        });
    }

    /// Strongly connected components with more than one member, each sorted,
    /// listed in deterministic order.
    pub fn find_cycles(&self) -> Vec<Vec<String>> {
        let mut g: DiGraph<&str, ()> = DiGraph::new();
        let mut index: HashMap<&str, NodeIndex> = HashMap::new();
        for id in self.nodes.keys() {
            index.insert(id.as_str(), g.add_node(id.as_str()));
        }
        for e in &self.edges {
            if let (Some(&f), Some(&t)) = (index.get(e.from.as_str()), index.get(e.to.as_str())) {
                g.add_edge(f, t, ());
            }
        }
        let mut cycles: Vec<Vec<String>> = tarjan_scc(&g)
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .map(|scc| {
                let mut names: Vec<String> = scc.iter().map(|&n| g[n].to_string()).collect();
                names.sort();
                names
            })
            .collect();
        cycles.sort();
        cycles
    }

    /// Mermaid-style rendering with stable synthetic node ids.
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph TD\n");
        let mut ids: BTreeMap<&str, String> = BTreeMap::new();
        for (i, (key, node)) in self.nodes.iter().enumerate() {
            let short = format!("n{i}");
            let _ = writeln!(out, "    {short}[\"{}\"]", sanitize::sanitize(&node.name));
            ids.insert(key.as_str(), short);
        }
        for e in &self.edges {
            let (Some(from), Some(to)) = (ids.get(e.from.as_str()), ids.get(e.to.as_str()))
            else {
                continue;
            };
            if e.weight > 1 {
                let _ = writeln!(out, "    {from} -->|{} x{}| {to}", e.kind, e.weight);
            } else {
                let _ = writeln!(out, "    {from} -->|{}| {to}", e.kind);
            }
        }
        out
    }
}
