//! Type and member indexes: denormalized summaries built once per module,
//! read-only afterwards. Discovery order (module order, then type order, then
//! field/method/property/event order) is kept and acts as the tie-breaker for
//! every lookup and search.

use crate::analysis::identity;
use crate::model::{MemberAccess, Module, ModuleGuid, TypeDef, TypeVisibility};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Class,
    Interface,
    Struct,
    Enum,
    Delegate,
}

impl TypeKind {
    pub fn of(t: &TypeDef) -> TypeKind {
        if t.is_interface {
            TypeKind::Interface
        } else if t.is_enum {
            TypeKind::Enum
        } else if t.is_value_type {
            TypeKind::Struct
        } else if t.is_delegate() {
            TypeKind::Delegate
        } else {
            TypeKind::Class
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeIndexEntry {
    pub id: String,
    pub full_name: String,
    pub namespace: String,
    pub name: String,
    pub kind: TypeKind,
    pub visibility: TypeVisibility,
    pub is_abstract: bool,
    pub is_sealed: bool,
    pub base_type: Option<String>,
    pub interfaces: Vec<String>,
    pub method_count: usize,
    pub field_count: usize,
    pub property_count: usize,
    pub event_count: usize,
    pub nested_count: usize,
    pub metadata_token: u32,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Method,
    Constructor,
    Field,
    Property,
    Event,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberIndexEntry {
    pub id: String,
    pub name: String,
    pub declaring_type: String,
    pub kind: MemberKind,
    pub signature: String,
    pub access: MemberAccess,
    pub is_static: bool,
    pub metadata_token: u32,
}

/// True for the metadata artifacts the indexes hide: the `<Module>` type,
/// compiler-generated `<...>` names, and `__` marker names.
pub fn is_compiler_artifact(name: &str) -> bool {
    name == "<Module>" || name.starts_with('<') || name.contains("__")
}

#[derive(Debug, Default)]
pub struct TypeIndex {
    module_guid: ModuleGuid,
    entries: Vec<TypeIndexEntry>,
    by_id: HashMap<String, usize>,
    by_full_name: HashMap<String, usize>,
    by_simple_name: HashMap<String, Vec<usize>>,
}

impl TypeIndex {
    pub fn build(module: &Module) -> Self {
        let mut index = TypeIndex {
            module_guid: module.guid,
            ..TypeIndex::default()
        };
        for t in module.types_recursive() {
            if is_compiler_artifact(&t.name) {
                debug!("type index: skipping compiler artifact {}", t.full_name);
                continue;
            }
            let entry = TypeIndexEntry {
                id: identity::type_id(module, t),
                full_name: t.full_name.clone(),
                namespace: t.namespace.clone(),
                name: t.name.clone(),
                kind: TypeKind::of(t),
                visibility: t.visibility,
                is_abstract: t.is_abstract,
                is_sealed: t.is_sealed,
                base_type: t.base_type.clone(),
                interfaces: t.interfaces.clone(),
                method_count: t.methods.len(),
                field_count: t.fields.len(),
                property_count: t.properties.len(),
                event_count: t.events.len(),
                nested_count: t.nested_types.len(),
                metadata_token: t.metadata_token,
            };
            index.push(entry);
        }
        index
    }

    fn push(&mut self, entry: TypeIndexEntry) {
        let idx = self.entries.len();
        self.by_id.insert(entry.id.clone(), idx);
        self.by_full_name.insert(entry.full_name.clone(), idx);
        self.by_simple_name
            .entry(entry.name.to_lowercase())
            .or_default()
            .push(idx);
        self.entries.push(entry);
    }

    pub fn module_guid(&self) -> ModuleGuid {
        self.module_guid
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[TypeIndexEntry] {
        &self.entries
    }

    pub fn by_id(&self, id: &str) -> Option<&TypeIndexEntry> {
        self.by_id.get(id).map(|&i| &self.entries[i])
    }

    pub fn by_full_name(&self, full_name: &str) -> Option<&TypeIndexEntry> {
        self.by_full_name.get(full_name).map(|&i| &self.entries[i])
    }

    /// Case-insensitive simple-name lookup; multi-valued, discovery order.
    pub fn by_simple_name(&self, name: &str) -> Vec<&TypeIndexEntry> {
        self.by_simple_name
            .get(&name.to_lowercase())
            .map(|idxs| idxs.iter().map(|&i| &self.entries[i]).collect())
            .unwrap_or_default()
    }

    /// Substring search over simple and full names, capped at `limit`.
    /// The boolean reports whether candidates were left behind.
    pub fn search(&self, needle: &str, limit: usize) -> (Vec<&TypeIndexEntry>, bool) {
        let needle = needle.to_lowercase();
        let mut hits = Vec::new();
        let mut has_more = false;
        for entry in &self.entries {
            if entry.name.to_lowercase().contains(&needle)
                || entry.full_name.to_lowercase().contains(&needle)
            {
                if hits.len() == limit {
                    has_more = true;
                    break;
                }
                hits.push(entry);
            }
        }
        (hits, has_more)
    }

    /// Distinct namespaces in sorted order.
    pub fn namespaces(&self) -> BTreeSet<String> {
        self.entries
            .iter()
            .map(|e| e.namespace.clone())
            .filter(|ns| !ns.is_empty())
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct MemberIndex {
    module_guid: ModuleGuid,
    entries: Vec<MemberIndexEntry>,
    by_id: HashMap<String, usize>,
    by_simple_name: HashMap<String, Vec<usize>>,
    by_declaring_type: HashMap<String, Vec<usize>>,
}

impl MemberIndex {
    pub fn build(module: &Module) -> Self {
        let mut index = MemberIndex {
            module_guid: module.guid,
            ..MemberIndex::default()
        };
        for t in module.types_recursive() {
            if is_compiler_artifact(&t.name) {
                continue;
            }
            for f in &t.fields {
                if is_compiler_artifact(&f.name) {
                    continue;
                }
                let signature = identity::field_signature(&t.full_name, f);
                index.push(MemberIndexEntry {
                    id: identity::member_id(module.guid, &signature),
                    name: f.name.clone(),
                    declaring_type: t.full_name.clone(),
                    kind: MemberKind::Field,
                    signature,
                    access: f.access,
                    is_static: f.is_static,
                    metadata_token: f.metadata_token,
                });
            }
            for m in &t.methods {
                // Static constructors never participate in lookups.
                if m.is_static_constructor() {
                    continue;
                }
                if !m.is_constructor && is_compiler_artifact(&m.name) {
                    continue;
                }
                let signature = identity::method_signature(m);
                index.push(MemberIndexEntry {
                    id: identity::member_id(module.guid, &signature),
                    name: m.name.clone(),
                    declaring_type: t.full_name.clone(),
                    kind: if m.is_constructor {
                        MemberKind::Constructor
                    } else {
                        MemberKind::Method
                    },
                    signature,
                    access: m.access,
                    is_static: m.is_static,
                    metadata_token: m.metadata_token,
                });
            }
            for p in &t.properties {
                let signature = identity::property_signature(&t.full_name, p);
                index.push(MemberIndexEntry {
                    id: identity::member_id(module.guid, &signature),
                    name: p.name.clone(),
                    declaring_type: t.full_name.clone(),
                    kind: MemberKind::Property,
                    signature,
                    access: p.access,
                    is_static: p.is_static,
                    metadata_token: p.metadata_token,
                });
            }
            for e in &t.events {
                let signature = identity::event_signature(&t.full_name, &e.name);
                index.push(MemberIndexEntry {
                    id: identity::member_id(module.guid, &signature),
                    name: e.name.clone(),
                    declaring_type: t.full_name.clone(),
                    kind: MemberKind::Event,
                    signature,
                    access: MemberAccess::Public,
                    is_static: false,
                    metadata_token: e.metadata_token,
                });
            }
        }
        index
    }

    fn push(&mut self, entry: MemberIndexEntry) {
        let idx = self.entries.len();
        self.by_id.insert(entry.id.clone(), idx);
        self.by_simple_name
            .entry(entry.name.to_lowercase())
            .or_default()
            .push(idx);
        self.by_declaring_type
            .entry(entry.declaring_type.clone())
            .or_default()
            .push(idx);
        self.entries.push(entry);
    }

    pub fn module_guid(&self) -> ModuleGuid {
        self.module_guid
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[MemberIndexEntry] {
        &self.entries
    }

    pub fn by_id(&self, id: &str) -> Option<&MemberIndexEntry> {
        self.by_id.get(id).map(|&i| &self.entries[i])
    }

    pub fn by_simple_name(&self, name: &str) -> Vec<&MemberIndexEntry> {
        self.by_simple_name
            .get(&name.to_lowercase())
            .map(|idxs| idxs.iter().map(|&i| &self.entries[i]).collect())
            .unwrap_or_default()
    }

    pub fn by_declaring_type(&self, type_full_name: &str) -> Vec<&MemberIndexEntry> {
        self.by_declaring_type
            .get(type_full_name)
            .map(|idxs| idxs.iter().map(|&i| &self.entries[i]).collect())
            .unwrap_or_default()
    }

    pub fn search(&self, needle: &str, limit: usize) -> (Vec<&MemberIndexEntry>, bool) {
        let needle = needle.to_lowercase();
        let mut hits = Vec::new();
        let mut has_more = false;
        for entry in &self.entries {
            if entry.name.to_lowercase().contains(&needle) {
                if hits.len() == limit {
                    has_more = true;
                    break;
                }
                hits.push(entry);
            }
        }
        (hits, has_more)
    }
}

/// One fully denormalized type: the index entry plus its members.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDetail {
    pub entry: TypeIndexEntry,
    pub members: Vec<MemberIndexEntry>,
}

/// Contents of a namespace: its immediate child namespaces and types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceListing {
    pub namespace: String,
    pub child_namespaces: Vec<String>,
    pub types: Vec<TypeIndexEntry>,
}

pub fn type_detail(types: &TypeIndex, members: &MemberIndex, type_id: &str) -> Option<TypeDetail> {
    let entry = types.by_id(type_id)?.clone();
    let members = members
        .by_declaring_type(&entry.full_name)
        .into_iter()
        .cloned()
        .collect();
    Some(TypeDetail { entry, members })
}

/// List a namespace: direct types plus the immediate child-namespace segments.
/// An empty `ns` lists the root.
pub fn browse_namespace(types: &TypeIndex, ns: &str) -> NamespaceListing {
    let mut children: BTreeMap<String, ()> = BTreeMap::new();
    let mut direct = Vec::new();
    for entry in types.entries() {
        if entry.namespace == ns {
            direct.push(entry.clone());
            continue;
        }
        let is_below = if ns.is_empty() {
            !entry.namespace.is_empty()
        } else {
            entry
                .namespace
                .starts_with(&format!("{ns}."))
        };
        if is_below {
            let rest = if ns.is_empty() {
                entry.namespace.as_str()
            } else {
                &entry.namespace[ns.len() + 1..]
            };
            let first = rest.split('.').next().unwrap_or(rest);
            let child = if ns.is_empty() {
                first.to_string()
            } else {
                format!("{ns}.{first}")
            };
            children.insert(child, ());
        }
    }
    NamespaceListing {
        namespace: ns.to_string(),
        child_namespaces: children.into_keys().collect(),
        types: direct,
    }
}
