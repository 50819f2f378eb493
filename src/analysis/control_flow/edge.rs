use crate::analysis::control_flow::block::BlockId;
use serde::{Deserialize, Serialize};

/// Edge classification. A `Switch` label is `case_<i>` or `default`; an
/// `Exception` label names the catch type or the handler kind. Edges whose
/// target dominates their source are retyped `BackEdge` after loop detection.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    FallThrough,
    Unconditional,
    CondTrue,
    CondFalse,
    Switch(String),
    Exception(String),
    BackEdge,
}

impl EdgeKind {
    /// Label rendered on diagram exports; empty for plain flow.
    pub fn label(&self) -> &str {
        match self {
            EdgeKind::FallThrough | EdgeKind::Unconditional => "",
            EdgeKind::CondTrue => "true",
            EdgeKind::CondFalse => "false",
            EdgeKind::Switch(label) | EdgeKind::Exception(label) => label,
            EdgeKind::BackEdge => "back",
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct CfgEdge {
    pub from: BlockId,
    pub to: BlockId,
    pub kind: EdgeKind,
}

impl CfgEdge {
    pub fn new(from: BlockId, to: BlockId, kind: EdgeKind) -> Self {
        Self { from, to, kind }
    }
}
