use serde::{Deserialize, Serialize};
use std::fmt;

/// Control-flow class of an instruction, as the metadata reader reports it.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowControl {
    #[default]
    Next,
    Branch,
    CondBranch,
    Return,
    Throw,
    Call,
    Break,
}

/// Reference to a method in an instruction operand.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct MethodRef {
    pub declaring_type: String,
    pub name: String,
    #[serde(default)]
    pub params: Vec<String>,
    pub return_type: String,
}

impl MethodRef {
    /// `DeclaringType.Name`, the identity used by call-site matching.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.declaring_type, self.name)
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.declaring_type, self.name)
    }
}

#[derive(Debug, Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct FieldRef {
    pub declaring_type: String,
    pub name: String,
    pub field_type: String,
}

#[derive(Debug, Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TypeRef {
    pub full_name: String,
}

/// Tagged instruction operand. Analyses never reach back into raw bytes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    #[default]
    None,
    /// Branch target offset.
    Target(u32),
    /// Switch jump table.
    Switch(Vec<u32>),
    Method(MethodRef),
    Field(FieldRef),
    Type(TypeRef),
    Local(u16),
    Argument(u16),
    String(String),
    I4(i32),
    I8(i64),
    R4(f32),
    R8(f64),
    Token(u32),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Instruction {
    pub offset: u32,
    /// CIL mnemonic, e.g. `ldloc.0`, `callvirt`, `br.s`.
    pub opcode: String,
    pub flow: FlowControl,
    pub operand: Operand,
}

impl Instruction {
    pub fn new(offset: u32, opcode: &str, flow: FlowControl, operand: Operand) -> Self {
        Self {
            offset,
            opcode: opcode.to_string(),
            flow,
            operand,
        }
    }

    pub fn branch_target(&self) -> Option<u32> {
        match self.operand {
            Operand::Target(t) => Some(t),
            _ => None,
        }
    }

    pub fn switch_targets(&self) -> Option<&[u32]> {
        match &self.operand {
            Operand::Switch(targets) => Some(targets),
            _ => None,
        }
    }

    pub fn is_switch(&self) -> bool {
        self.opcode == "switch"
    }

    /// Local slot read by this instruction, if it is in the load-local family.
    /// Covers the embedded-index short forms and the explicit-operand forms,
    /// address loads included.
    pub fn load_local_slot(&self) -> Option<u16> {
        match self.opcode.as_str() {
            "ldloc.0" => Some(0),
            "ldloc.1" => Some(1),
            "ldloc.2" => Some(2),
            "ldloc.3" => Some(3),
            "ldloc" | "ldloc.s" | "ldloca" | "ldloca.s" => match self.operand {
                Operand::Local(i) => Some(i),
                _ => None,
            },
            _ => None,
        }
    }

    /// Local slot written by this instruction, if it is in the store-local family.
    pub fn store_local_slot(&self) -> Option<u16> {
        match self.opcode.as_str() {
            "stloc.0" => Some(0),
            "stloc.1" => Some(1),
            "stloc.2" => Some(2),
            "stloc.3" => Some(3),
            "stloc" | "stloc.s" => match self.operand {
                Operand::Local(i) => Some(i),
                _ => None,
            },
            _ => None,
        }
    }

    /// Argument slot read by this instruction, if it is in the load-argument family.
    pub fn load_argument_slot(&self) -> Option<u16> {
        match self.opcode.as_str() {
            "ldarg.0" => Some(0),
            "ldarg.1" => Some(1),
            "ldarg.2" => Some(2),
            "ldarg.3" => Some(3),
            "ldarg" | "ldarg.s" | "ldarga" | "ldarga.s" => match self.operand {
                Operand::Argument(i) => Some(i),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn is_call(&self) -> bool {
        matches!(self.opcode.as_str(), "call" | "callvirt")
    }

    pub fn is_newobj(&self) -> bool {
        self.opcode == "newobj"
    }

    /// Load-function-pointer family used by delegate and lambda construction.
    pub fn is_load_function_pointer(&self) -> bool {
        matches!(self.opcode.as_str(), "ldftn" | "ldvirtftn")
    }

    /// Method operand of a call-family instruction (`call`, `callvirt`,
    /// `newobj`, `ldftn`, `ldvirtftn`).
    pub fn method_operand(&self) -> Option<&MethodRef> {
        match &self.operand {
            Operand::Method(m) => Some(m),
            _ => None,
        }
    }

    pub fn field_operand(&self) -> Option<&FieldRef> {
        match &self.operand {
            Operand::Field(f) => Some(f),
            _ => None,
        }
    }

    pub fn type_operand(&self) -> Option<&TypeRef> {
        match &self.operand {
            Operand::Type(t) => Some(t),
            _ => None,
        }
    }

    /// True for `ldfld`/`ldflda`/`ldsfld`/`ldsflda`.
    pub fn is_field_read(&self) -> bool {
        matches!(
            self.opcode.as_str(),
            "ldfld" | "ldflda" | "ldsfld" | "ldsflda"
        )
    }

    /// True for `stfld`/`stsfld`.
    pub fn is_field_write(&self) -> bool {
        matches!(self.opcode.as_str(), "stfld" | "stsfld")
    }

    pub fn is_load_string(&self) -> bool {
        self.opcode == "ldstr"
    }

    /// Integer/float constant loads used by the literal search strategy.
    /// The `ldc.i4.N` short forms embed the value in the mnemonic.
    pub fn constant_operand(&self) -> Option<String> {
        if let Some(rest) = self.opcode.strip_prefix("ldc.i4.") {
            if rest == "m1" {
                return Some("-1".to_string());
            }
            if let Ok(v) = rest.parse::<i32>() {
                return Some(v.to_string());
            }
            // "ldc.i4.s" carries an explicit operand
        }
        match &self.operand {
            Operand::I4(v) if self.opcode.starts_with("ldc.i4") => Some(v.to_string()),
            Operand::I8(v) if self.opcode.starts_with("ldc.i8") => Some(v.to_string()),
            Operand::R4(v) if self.opcode.starts_with("ldc.r4") => Some(v.to_string()),
            Operand::R8(v) if self.opcode.starts_with("ldc.r8") => Some(v.to_string()),
            _ => None,
        }
    }
}
