//! Heuristic GoF design-pattern detection. Each detector is a value behind
//! the `PatternDetector` trait; the registry iterates the list per type and
//! collects at most one `DetectedPattern` per (detector, type) with a clamped
//! confidence and human-readable evidence.

pub mod behavioral;
pub mod creational;
pub mod structural;

use crate::analysis::call_graph::TypeHierarchy;
use crate::analysis::context::CancellationToken;
use crate::analysis::identity;
use crate::errors::{AnalysisError, AnalysisResult};
use crate::model::{Module, TypeDef};
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    Singleton,
    Factory,
    AbstractFactory,
    Builder,
    Prototype,
    Adapter,
    Bridge,
    Composite,
    Decorator,
    Facade,
    Flyweight,
    Proxy,
    Strategy,
    Command,
    State,
    TemplateMethod,
    Visitor,
    Observer,
    Iterator,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedPattern {
    pub kind: PatternKind,
    pub type_id: String,
    pub type_name: String,
    /// Heuristic confidence in [0, 1].
    pub confidence: f64,
    pub evidence: Vec<String>,
}

pub struct DetectorContext<'a> {
    pub module: &'a Module,
    pub hierarchy: &'a TypeHierarchy,
}

impl DetectorContext<'_> {
    /// Is the named type defined in the module and not an interface?
    pub fn is_concrete(&self, full_name: &str) -> bool {
        self.hierarchy.is_defined(full_name) && !self.hierarchy.is_interface(full_name)
    }
}

pub trait PatternDetector: Sync {
    fn kind(&self) -> PatternKind;
    fn detect(&self, t: &TypeDef, ctx: &DetectorContext<'_>) -> Option<DetectedPattern>;
}

/// Shared constructor for detector results; clamps confidence into [0, 1].
pub(crate) fn pattern(
    kind: PatternKind,
    module: &Module,
    t: &TypeDef,
    confidence: f64,
    evidence: Vec<String>,
) -> DetectedPattern {
    DetectedPattern {
        kind,
        type_id: identity::type_id(module, t),
        type_name: t.full_name.clone(),
        confidence: confidence.clamp(0.0, 1.0),
        evidence,
    }
}

fn all_detectors() -> Vec<Box<dyn PatternDetector>> {
    vec![
        Box::new(creational::SingletonDetector),
        Box::new(creational::FactoryDetector),
        Box::new(creational::AbstractFactoryDetector),
        Box::new(creational::BuilderDetector),
        Box::new(creational::PrototypeDetector),
        Box::new(structural::AdapterDetector),
        Box::new(structural::BridgeDetector),
        Box::new(structural::CompositeDetector),
        Box::new(structural::DecoratorDetector),
        Box::new(structural::FacadeDetector),
        Box::new(structural::FlyweightDetector),
        Box::new(structural::ProxyDetector),
        Box::new(behavioral::StrategyDetector),
        Box::new(behavioral::CommandDetector),
        Box::new(behavioral::StateDetector),
        Box::new(behavioral::TemplateMethodDetector),
        Box::new(behavioral::VisitorDetector),
        Box::new(behavioral::ObserverDetector),
        Box::new(behavioral::IteratorDetector),
    ]
}

fn is_compiler_generated(t: &TypeDef) -> bool {
    t.name.contains('<') || t.name.contains('$')
}

/// Run every detector over one type or the whole module. Output order is
/// module type order, then detector registration order; no randomness.
pub fn detect_patterns(
    module: &Module,
    hierarchy: &TypeHierarchy,
    type_name: Option<&str>,
    cancel: &CancellationToken,
) -> AnalysisResult<Vec<DetectedPattern>> {
    let ctx = DetectorContext { module, hierarchy };
    let detectors = all_detectors();

    let targets: Vec<&TypeDef> = match type_name {
        Some(name) => vec![
            module
                .find_type(name)
                .ok_or_else(|| AnalysisError::NotFound(name.to_string()))?,
        ],
        None => module.types_recursive(),
    };

    let mut out = Vec::new();
    for t in targets {
        cancel.ensure_live()?;
        if is_compiler_generated(t) {
            continue;
        }
        for d in &detectors {
            if let Some(p) = d.detect(t, &ctx) {
                out.push(p);
            }
        }
    }
    Ok(out)
}

/// Naming helpers shared by the detectors.
pub(crate) mod signals {
    use crate::model::{MemberAccess, MethodDef, TypeDef};

    pub fn name_contains(t: &TypeDef, needle: &str) -> bool {
        t.name.to_lowercase().contains(&needle.to_lowercase())
    }

    pub fn public_methods(t: &TypeDef) -> impl Iterator<Item = &MethodDef> {
        t.methods
            .iter()
            .filter(|m| m.access == MemberAccess::Public && !m.is_constructor)
    }

    pub fn instance_constructors(t: &TypeDef) -> impl Iterator<Item = &MethodDef> {
        t.methods
            .iter()
            .filter(|m| m.is_constructor && !m.is_static)
    }

    /// Methods returning the declaring type itself (fluent style).
    pub fn fluent_methods(t: &TypeDef) -> Vec<&MethodDef> {
        t.methods
            .iter()
            .filter(|m| !m.is_constructor && m.return_type == t.full_name)
            .collect()
    }
}
