// Module Model - the read-only view of a parsed CIL module that every
// analysis consumes. Produced by a ModuleProvider collaborator.

pub mod instruction;
pub mod module;
pub mod provider;

pub use instruction::{FieldRef, FlowControl, Instruction, MethodRef, Operand, TypeRef};
pub use module::{
    AssemblyInfo, AssemblyRef, ConstantValue, CustomAttribute, EventDef, ExceptionHandler,
    FieldDef, HandlerKind, LocalVar, MemberAccess, MethodBody, MethodDef, Module, ModuleGuid,
    ParamDef, PInvokeInfo, PropertyDef, TypeDef, TypeVisibility,
};
pub use provider::{JsonModuleProvider, LoadError, LoadErrorKind, ModuleProvider};
