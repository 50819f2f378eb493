use crate::model::{FieldDef, MethodDef, Module, ModuleGuid, PropertyDef, TypeDef};

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for b in bytes {
        hash ^= u64::from(*b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Content-addressed id for a member signature under a module guid.
/// Pure: the same (guid, signature) pair always yields the same id, so
/// re-parsing an unchanged module reproduces every id.
pub fn member_id(guid: ModuleGuid, signature: &str) -> String {
    let mut data = Vec::with_capacity(16 + signature.len());
    data.extend_from_slice(&guid.0.to_be_bytes());
    data.extend_from_slice(signature.as_bytes());
    format!("{:016x}", fnv1a64(&data))
}

/// Canonical signature for a type: its full name.
pub fn type_signature(t: &TypeDef) -> String {
    t.full_name.clone()
}

/// Canonical signature for a method: declaring type, name, parameter types
/// and return type, so overloads stay distinct.
pub fn method_signature(m: &MethodDef) -> String {
    let params = m
        .parameters
        .iter()
        .map(|p| p.param_type.as_str())
        .collect::<Vec<_>>()
        .join(",");
    format!(
        "{}::{}({})->{}",
        m.declaring_type, m.name, params, m.return_type
    )
}

pub fn field_signature(declaring_type: &str, f: &FieldDef) -> String {
    format!("{}::{}", declaring_type, f.name)
}

pub fn property_signature(declaring_type: &str, p: &PropertyDef) -> String {
    format!("{}::{}", declaring_type, p.name)
}

pub fn event_signature(declaring_type: &str, name: &str) -> String {
    format!("{}::{}", declaring_type, name)
}

pub fn type_id(module: &Module, t: &TypeDef) -> String {
    member_id(module.guid, &type_signature(t))
}

pub fn method_id(module: &Module, m: &MethodDef) -> String {
    member_id(module.guid, &method_signature(m))
}
