use crate::model::{HandlerKind, Instruction};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a basic block within a CFG. Ids are dense: block `BlockId(i)`
/// is `cfg.blocks[i]`, with blocks sorted by start offset.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
pub struct BlockId(pub u32);

impl BlockId {
    /// Synthetic sink used by post-dominance; never present in `blocks`.
    pub const VIRTUAL_EXIT: BlockId = BlockId(u32::MAX);
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == BlockId::VIRTUAL_EXIT {
            f.write_str("EXIT")
        } else {
            write!(f, "B{}", self.0)
        }
    }
}

/// Classification of a block's final instruction.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminatorKind {
    FallThrough,
    Branch,
    CondBranch,
    Switch,
    Return,
    Throw,
}

/// A maximal straight-line instruction sequence. Offsets are half-open:
/// `start_offset <= instruction.offset < end_offset`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicBlock {
    pub id: BlockId,
    pub start_offset: u32,
    pub end_offset: u32,
    pub instructions: Vec<Instruction>,
    pub terminator: TerminatorKind,
    pub is_in_try: bool,
    pub handler_kind: Option<HandlerKind>,
    pub is_loop_header: bool,
    pub loop_id: Option<u32>,
}

impl BasicBlock {
    pub fn last_instruction(&self) -> Option<&Instruction> {
        self.instructions.last()
    }

    pub fn contains_offset(&self, offset: u32) -> bool {
        self.start_offset <= offset && offset < self.end_offset
    }
}
