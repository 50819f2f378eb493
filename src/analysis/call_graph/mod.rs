//! Call-graph construction: direct, virtual, interface, constructor,
//! delegate, lambda, and reflection edges over per-method bytecode, plus
//! hierarchy-driven virtual resolution and SCC recursion detection.

pub mod builder;
pub mod hierarchy;
pub mod recursion;

pub use builder::build;
pub use hierarchy::TypeHierarchy;
pub use recursion::{Recursion, RecursionKind, detect_recursion};

use crate::model::ModuleGuid;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    Direct,
    Virtual,
    Constructor,
    Delegate,
    Lambda,
    Reflection,
    Interface,
}

/// One call site. `caller`/`callee` are qualified method names
/// (`Declaring.Type.Method`), the arena key of `CallGraph::nodes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallEdge {
    pub caller: String,
    pub callee: String,
    pub il_offset: u32,
    pub kind: CallKind,
    pub is_external: bool,
    pub requires_resolution: bool,
    #[serde(default)]
    pub possible_targets: Vec<String>,
    pub is_polymorphic: bool,
    pub delegate_type: Option<String>,
    pub reflection_pattern: Option<String>,
    pub is_compiler_generated: bool,
}

/// Node in the call-graph arena. Nodes are stored by id and edges refer to
/// ids, so the graph stays acyclic in ownership terms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallNode {
    pub id: String,
    pub name: String,
    pub declaring_type: String,
    /// Stable content-addressed id when the method is defined in the module.
    pub member_id: Option<String>,
    pub is_external: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallGraph {
    pub module_guid: ModuleGuid,
    pub nodes: BTreeMap<String, CallNode>,
    pub edges: Vec<CallEdge>,
}

impl CallGraph {
    pub fn edges_from<'a>(&'a self, id: &str) -> Vec<&'a CallEdge> {
        self.edges.iter().filter(|e| e.caller == id).collect()
    }

    pub fn edges_to<'a>(&'a self, id: &str) -> Vec<&'a CallEdge> {
        self.edges.iter().filter(|e| e.callee == id).collect()
    }

    pub fn node(&self, id: &str) -> Option<&CallNode> {
        self.nodes.get(id)
    }
}
