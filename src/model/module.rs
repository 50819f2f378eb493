use crate::model::instruction::Instruction;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable 128-bit module identifier (the MVID). All derived artifact ids are
/// keyed by this value; re-parsing an unchanged module yields the same guid.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleGuid(pub u128);

impl fmt::Display for ModuleGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// A parsed module: assembly identity plus its top-level types.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Module {
    pub guid: ModuleGuid,
    pub assembly: AssemblyInfo,
    pub types: Vec<TypeDef>,
}

impl Module {
    /// All types in declared order, nested types following their declaring type.
    pub fn types_recursive(&self) -> Vec<&TypeDef> {
        let mut out = Vec::new();
        for t in &self.types {
            collect_types(t, &mut out);
        }
        out
    }

    /// Find a type definition by full name, searching nested types too.
    pub fn find_type(&self, full_name: &str) -> Option<&TypeDef> {
        self.types_recursive()
            .into_iter()
            .find(|t| t.full_name == full_name)
    }

    /// Find a method by declaring-type full name and method name.
    /// Returns the first declared overload.
    pub fn find_method(&self, type_name: &str, method_name: &str) -> Option<&MethodDef> {
        self.find_type(type_name)
            .and_then(|t| t.methods.iter().find(|m| m.name == method_name))
    }
}

fn collect_types<'a>(t: &'a TypeDef, out: &mut Vec<&'a TypeDef>) {
    out.push(t);
    for nested in &t.nested_types {
        collect_types(nested, out);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssemblyInfo {
    pub name: String,
    pub version: String,
    pub references: Vec<AssemblyRef>,
    pub strong_name: Option<String>,
    #[serde(default)]
    pub custom_attributes: Vec<CustomAttribute>,
    /// Assemblies named in InternalsVisibleTo attributes, as supplied by the provider.
    #[serde(default)]
    pub friend_assemblies: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssemblyRef {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomAttribute {
    /// Full name of the attribute type.
    pub attribute_type: String,
}

/// ECMA-335 type visibility, including the nested variants.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeVisibility {
    #[default]
    Assembly,
    Public,
    NestedPublic,
    NestedPrivate,
    NestedFamily,
    NestedAssembly,
    NestedFamAndAssem,
    NestedFamOrAssem,
}

impl TypeVisibility {
    pub fn is_nested(self) -> bool {
        !matches!(self, TypeVisibility::Public | TypeVisibility::Assembly)
    }

    /// The member-access lattice point this visibility corresponds to,
    /// used when computing effective access of members of nested types.
    pub fn as_member_access(self) -> MemberAccess {
        match self {
            TypeVisibility::Public | TypeVisibility::NestedPublic => MemberAccess::Public,
            TypeVisibility::Assembly | TypeVisibility::NestedAssembly => MemberAccess::Assembly,
            TypeVisibility::NestedPrivate => MemberAccess::Private,
            TypeVisibility::NestedFamily => MemberAccess::Family,
            TypeVisibility::NestedFamAndAssem => MemberAccess::FamAndAssem,
            TypeVisibility::NestedFamOrAssem => MemberAccess::FamOrAssem,
        }
    }
}

/// Member accessibility, ordered from most to least restrictive so that
/// `min` yields the effective access under the nested-visibility rule.
#[derive(
    Debug, Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MemberAccess {
    #[default]
    Private,
    FamAndAssem,
    Assembly,
    Family,
    FamOrAssem,
    Public,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeDef {
    pub full_name: String,
    pub namespace: String,
    pub name: String,
    pub visibility: TypeVisibility,
    pub is_interface: bool,
    pub is_enum: bool,
    pub is_value_type: bool,
    pub is_abstract: bool,
    pub is_sealed: bool,
    pub base_type: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub methods: Vec<MethodDef>,
    #[serde(default)]
    pub properties: Vec<PropertyDef>,
    #[serde(default)]
    pub events: Vec<EventDef>,
    #[serde(default)]
    pub nested_types: Vec<TypeDef>,
    #[serde(default)]
    pub custom_attributes: Vec<CustomAttribute>,
    pub metadata_token: u32,
}

impl TypeDef {
    /// True when the base type marks this as a delegate type.
    pub fn is_delegate(&self) -> bool {
        matches!(
            self.base_type.as_deref(),
            Some("System.MulticastDelegate") | Some("System.Delegate")
        )
    }

    pub fn find_method(&self, name: &str) -> Option<&MethodDef> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn find_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub field_type: String,
    pub access: MemberAccess,
    pub is_static: bool,
    /// Compile-time constant field (`const` in C#).
    pub is_literal: bool,
    pub constant: Option<ConstantValue>,
    pub metadata_token: u32,
}

/// Constant value attached to a literal field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstantValue {
    String(String),
    I4(i32),
    I8(i64),
    R8(f64),
    Bool(bool),
}

impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantValue::String(s) => write!(f, "{s}"),
            ConstantValue::I4(v) => write!(f, "{v}"),
            ConstantValue::I8(v) => write!(f, "{v}"),
            ConstantValue::R8(v) => write!(f, "{v}"),
            ConstantValue::Bool(v) => write!(f, "{v}"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParamDef {
    pub name: String,
    pub param_type: String,
    #[serde(default)]
    pub is_optional: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PInvokeInfo {
    /// Native entry point; defaults to the method name when absent.
    pub entry_point: Option<String>,
    /// Native module name as written in the DllImport attribute.
    pub module: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MethodDef {
    pub name: String,
    pub full_name: String,
    pub declaring_type: String,
    pub access: MemberAccess,
    pub is_static: bool,
    pub is_virtual: bool,
    pub is_abstract: bool,
    pub is_constructor: bool,
    pub is_pinvoke: bool,
    pub pinvoke: Option<PInvokeInfo>,
    pub return_type: String,
    #[serde(default)]
    pub parameters: Vec<ParamDef>,
    /// Explicit override/implementation targets as `DeclaringType.Name`.
    #[serde(default)]
    pub overrides: Vec<String>,
    pub body: Option<MethodBody>,
    pub metadata_token: u32,
}

impl MethodDef {
    /// Static constructor (`.cctor`).
    pub fn is_static_constructor(&self) -> bool {
        self.name == ".cctor"
    }

    /// Parameter type full names in declared order.
    pub fn parameter_types(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.param_type.as_str()).collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,
    pub property_type: String,
    pub access: MemberAccess,
    pub is_static: bool,
    pub has_getter: bool,
    pub has_setter: bool,
    pub metadata_token: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventDef {
    pub name: String,
    pub event_type: String,
    pub metadata_token: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalVar {
    pub index: u16,
    pub var_type: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MethodBody {
    pub instructions: Vec<Instruction>,
    #[serde(default)]
    pub local_variables: Vec<LocalVar>,
    #[serde(default)]
    pub exception_handlers: Vec<ExceptionHandler>,
}

/// Exception-handler region kinds of the CIL method data section.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerKind {
    Catch,
    Filter,
    Finally,
    Fault,
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HandlerKind::Catch => "catch",
            HandlerKind::Filter => "filter",
            HandlerKind::Finally => "finally",
            HandlerKind::Fault => "fault",
        };
        f.write_str(s)
    }
}

/// Half-open offset ranges: `start <= offset < end`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExceptionHandler {
    pub kind: HandlerKind,
    pub try_start: u32,
    pub try_end: u32,
    pub handler_start: u32,
    pub handler_end: u32,
    pub filter_start: Option<u32>,
    pub catch_type: Option<String>,
}
