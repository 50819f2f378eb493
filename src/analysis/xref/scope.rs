use crate::model::{MemberAccess, Module, TypeDef};
use std::collections::HashMap;

/// Effective access of every type: the minimum of its own visibility and all
/// enclosing types' visibilities (ECMA-335 nested-visibility rule).
pub fn effective_type_access(module: &Module) -> HashMap<String, MemberAccess> {
    let mut out = HashMap::new();
    for t in &module.types {
        walk(t, None, &mut out);
    }
    out
}

fn walk(t: &TypeDef, enclosing: Option<MemberAccess>, out: &mut HashMap<String, MemberAccess>) {
    let own = t.visibility.as_member_access();
    let effective = match enclosing {
        Some(outer) => own.min(outer),
        None => own,
    };
    out.insert(t.full_name.clone(), effective);
    for nested in &t.nested_types {
        walk(nested, Some(effective), out);
    }
}

/// Effective access of a member: min of its own access and its declaring
/// type's effective access.
pub fn effective_member_access(
    type_access: &HashMap<String, MemberAccess>,
    declaring_type: &str,
    member: MemberAccess,
) -> MemberAccess {
    match type_access.get(declaring_type) {
        Some(&t) => member.min(t),
        None => member,
    }
}

/// The set of types whose bodies can possibly reference a target with the
/// given effective access, plus the friend modules that widen the scope.
#[derive(Debug, Clone)]
pub struct ReferenceScope {
    /// Full names of the types to scan, in module order.
    pub types: Vec<String>,
    pub includes_friends: bool,
    pub friend_modules: Vec<String>,
}

pub fn reference_scope(
    module: &Module,
    declaring_type: &str,
    effective: MemberAccess,
) -> ReferenceScope {
    match effective {
        MemberAccess::Private => {
            // Only the declaring type and its nested types can see it.
            let mut types = Vec::new();
            if let Some(t) = module.find_type(declaring_type) {
                collect_with_nested(t, &mut types);
            }
            ReferenceScope {
                types,
                includes_friends: false,
                friend_modules: Vec::new(),
            }
        }
        MemberAccess::Family => ReferenceScope {
            // Derived types in other assemblies cannot be enumerated;
            // scanning the whole module is the conservative answer.
            types: all_type_names(module),
            includes_friends: false,
            friend_modules: Vec::new(),
        },
        MemberAccess::Assembly
        | MemberAccess::FamAndAssem
        | MemberAccess::FamOrAssem
        | MemberAccess::Public => ReferenceScope {
            types: all_type_names(module),
            includes_friends: true,
            friend_modules: module.assembly.friend_assemblies.clone(),
        },
    }
}

fn all_type_names(module: &Module) -> Vec<String> {
    module
        .types_recursive()
        .into_iter()
        .map(|t| t.full_name.clone())
        .collect()
}

fn collect_with_nested(t: &TypeDef, out: &mut Vec<String>) {
    out.push(t.full_name.clone());
    for nested in &t.nested_types {
        collect_with_nested(nested, out);
    }
}
