use crate::model::Module;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Type-hierarchy index: direct subtypes and interface implementors by full
/// name. Built once per analysis session and shared read-only.
#[derive(Debug, Default)]
pub struct TypeHierarchy {
    subtypes: BTreeMap<String, Vec<String>>,
    implementors: BTreeMap<String, Vec<String>>,
    interfaces: BTreeSet<String>,
    delegates: BTreeSet<String>,
    defined: BTreeSet<String>,
    /// Virtual (non-abstract or abstract) method names per type.
    virtual_methods: BTreeMap<String, Vec<String>>,
}

impl TypeHierarchy {
    pub fn build(module: &Module) -> Self {
        let mut h = TypeHierarchy::default();
        for t in module.types_recursive() {
            h.defined.insert(t.full_name.clone());
            if t.is_interface {
                h.interfaces.insert(t.full_name.clone());
            }
            if t.is_delegate() {
                h.delegates.insert(t.full_name.clone());
            }
            if let Some(base) = &t.base_type {
                h.subtypes
                    .entry(base.clone())
                    .or_default()
                    .push(t.full_name.clone());
            }
            for iface in &t.interfaces {
                h.implementors
                    .entry(iface.clone())
                    .or_default()
                    .push(t.full_name.clone());
            }
            let virtuals: Vec<String> = t
                .methods
                .iter()
                .filter(|m| m.is_virtual)
                .map(|m| m.name.clone())
                .collect();
            if !virtuals.is_empty() {
                h.virtual_methods.insert(t.full_name.clone(), virtuals);
            }
        }
        h
    }

    pub fn is_interface(&self, full_name: &str) -> bool {
        self.interfaces.contains(full_name)
    }

    pub fn is_delegate(&self, full_name: &str) -> bool {
        self.delegates.contains(full_name)
    }

    pub fn is_defined(&self, full_name: &str) -> bool {
        self.defined.contains(full_name)
    }

    pub fn direct_subtypes(&self, full_name: &str) -> &[String] {
        self.subtypes
            .get(full_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn direct_implementors(&self, full_name: &str) -> &[String] {
        self.implementors
            .get(full_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Transitive subtypes (for interfaces: implementors and their subtypes),
    /// breadth-first in declaration order, deduplicated.
    pub fn transitive_subtypes(&self, full_name: &str) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut order = Vec::new();
        let mut work: VecDeque<&str> = VecDeque::new();
        let seed = if self.is_interface(full_name) {
            self.direct_implementors(full_name)
        } else {
            self.direct_subtypes(full_name)
        };
        for s in seed {
            work.push_back(s);
        }
        while let Some(name) = work.pop_front() {
            if !seen.insert(name.to_string()) {
                continue;
            }
            order.push(name.to_string());
            for sub in self.direct_subtypes(name) {
                work.push_back(sub);
            }
        }
        order
    }

    /// Candidate implementations of a virtual dispatch `T.m`: the virtual
    /// methods named `m` in every transitive subtype (or implementor) of `T`.
    /// Resolution failures yield an empty list, never an error.
    pub fn virtual_candidates(&self, declaring_type: &str, method: &str) -> Vec<String> {
        self.transitive_subtypes(declaring_type)
            .into_iter()
            .filter(|sub| {
                self.virtual_methods
                    .get(sub)
                    .is_some_and(|ms| ms.iter().any(|m| m == method))
            })
            .map(|sub| format!("{sub}.{method}"))
            .collect()
    }
}
