use crate::analysis::patterns::signals::name_contains;
use crate::analysis::patterns::{DetectedPattern, DetectorContext, PatternDetector, PatternKind, pattern};
use crate::analysis::xref::scanner;
use crate::model::{FieldDef, TypeDef};

/// Fields typed as an interface defined in this module.
fn interface_fields<'a>(t: &'a TypeDef, ctx: &DetectorContext<'_>) -> Vec<&'a FieldDef> {
    t.fields
        .iter()
        .filter(|f| ctx.hierarchy.is_interface(&f.field_type))
        .collect()
}

/// Fields whose type is one of the interfaces the type itself implements.
fn wrapped_fields<'a>(t: &'a TypeDef) -> Vec<&'a FieldDef> {
    t.fields
        .iter()
        .filter(|f| t.interfaces.iter().any(|i| i == &f.field_type))
        .collect()
}

pub struct AdapterDetector;

impl PatternDetector for AdapterDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::Adapter
    }

    fn detect(&self, t: &TypeDef, ctx: &DetectorContext<'_>) -> Option<DetectedPattern> {
        if t.is_interface || t.interfaces.is_empty() {
            return None;
        }
        // Adapts a concrete collaborator behind an interface it exposes.
        let adaptee = t.fields.iter().find(|f| {
            ctx.is_concrete(&f.field_type)
                && f.field_type != t.full_name
                && !t.interfaces.iter().any(|i| i == &f.field_type)
        })?;
        let mut confidence = 0.4;
        let mut evidence = vec![
            format!("Implements {}", t.interfaces.join(", ")),
            format!("Wraps concrete '{}'", adaptee.field_type),
        ];
        if name_contains(t, "adapter") || name_contains(t, "wrapper") {
            confidence += 0.3;
            evidence.push("Adapter-style type name".to_string());
        }
        if confidence < 0.5 && !name_contains(t, "adapter") {
            // Weak structural signal alone is too noisy without the name.
            return None;
        }
        Some(pattern(self.kind(), ctx.module, t, confidence, evidence))
    }
}

pub struct BridgeDetector;

impl PatternDetector for BridgeDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::Bridge
    }

    fn detect(&self, t: &TypeDef, ctx: &DetectorContext<'_>) -> Option<DetectedPattern> {
        if t.is_interface {
            return None;
        }
        let fields = interface_fields(t, ctx);
        let implementor = fields
            .iter()
            .find(|f| !t.interfaces.iter().any(|i| i == &f.field_type))?;
        let mut confidence = 0.4;
        let mut evidence = vec![format!(
            "Delegates to implementor interface '{}'",
            implementor.field_type
        )];
        if t.is_abstract {
            confidence += 0.2;
            evidence.push("Abstraction side is abstract".to_string());
        }
        if name_contains(t, "bridge") {
            confidence += 0.3;
        }
        if confidence < 0.6 {
            return None;
        }
        Some(pattern(self.kind(), ctx.module, t, confidence, evidence))
    }
}

pub struct CompositeDetector;

impl PatternDetector for CompositeDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::Composite
    }

    fn detect(&self, t: &TypeDef, ctx: &DetectorContext<'_>) -> Option<DetectedPattern> {
        if t.is_interface {
            return None;
        }
        // A collection of the component type the composite itself is part of.
        let component = t.full_name.as_str();
        let base_or_iface: Vec<&str> = t
            .interfaces
            .iter()
            .map(String::as_str)
            .chain(t.base_type.as_deref())
            .collect();
        let children = t.fields.iter().find(|f| {
            let is_collection = f.field_type.ends_with("[]")
                || f.field_type.contains("List`1")
                || f.field_type.contains("Collection`1")
                || f.field_type.contains("IEnumerable`1");
            is_collection
                && scanner::type_constituents(&f.field_type)
                    .iter()
                    .any(|c| c == component || base_or_iface.contains(&c.as_str()))
        })?;
        let mut confidence = 0.5;
        let mut evidence = vec![format!("Child collection '{}'", children.name)];
        let has_add = t.methods.iter().any(|m| m.name == "Add" || m.name == "AddChild");
        let has_remove = t
            .methods
            .iter()
            .any(|m| m.name == "Remove" || m.name == "RemoveChild");
        if has_add && has_remove {
            confidence += 0.2;
            evidence.push("Add/Remove child management".to_string());
        }
        if name_contains(t, "composite") || name_contains(t, "node") {
            confidence += 0.1;
        }
        Some(pattern(self.kind(), ctx.module, t, confidence, evidence))
    }
}

pub struct DecoratorDetector;

impl PatternDetector for DecoratorDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::Decorator
    }

    fn detect(&self, t: &TypeDef, ctx: &DetectorContext<'_>) -> Option<DetectedPattern> {
        if t.is_interface {
            return None;
        }
        let wrapped = wrapped_fields(t);
        let field = wrapped.first()?;
        let mut confidence = 0.5;
        let mut evidence = vec![format!(
            "Wraps '{}' behind the same interface",
            field.field_type
        )];
        let ctor_takes_component = t.methods.iter().any(|m| {
            m.is_constructor
                && m.parameters
                    .iter()
                    .any(|p| p.param_type == field.field_type)
        });
        if ctor_takes_component {
            confidence += 0.2;
            evidence.push("Constructor accepts the wrapped component".to_string());
        }
        if name_contains(t, "decorator") {
            confidence += 0.3;
        }
        Some(pattern(self.kind(), ctx.module, t, confidence, evidence))
    }
}

pub struct FacadeDetector;

impl PatternDetector for FacadeDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::Facade
    }

    fn detect(&self, t: &TypeDef, ctx: &DetectorContext<'_>) -> Option<DetectedPattern> {
        if t.is_interface || t.is_abstract {
            return None;
        }
        let mut subsystem_types: Vec<&str> = t
            .fields
            .iter()
            .filter(|f| ctx.hierarchy.is_defined(&f.field_type) && f.field_type != t.full_name)
            .map(|f| f.field_type.as_str())
            .collect();
        subsystem_types.sort_unstable();
        subsystem_types.dedup();
        if subsystem_types.len() < 3 {
            return None;
        }
        let mut confidence = 0.4;
        let mut evidence = vec![format!(
            "Aggregates {} subsystem types",
            subsystem_types.len()
        )];
        if subsystem_types.len() >= 5 {
            confidence += 0.1;
        }
        if name_contains(t, "facade") || name_contains(t, "service") {
            confidence += 0.3;
            evidence.push("Facade-style type name".to_string());
        }
        Some(pattern(self.kind(), ctx.module, t, confidence, evidence))
    }
}

pub struct FlyweightDetector;

impl PatternDetector for FlyweightDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::Flyweight
    }

    fn detect(&self, t: &TypeDef, ctx: &DetectorContext<'_>) -> Option<DetectedPattern> {
        if t.is_interface {
            return None;
        }
        // Static cache keyed by value, handed out through a getter.
        let cache = t.fields.iter().find(|f| {
            f.is_static
                && (f.field_type.contains("Dictionary`2")
                    || f.field_type.contains("Hashtable")
                    || f.field_type.contains("ConcurrentDictionary`2"))
        })?;
        let getter = t
            .methods
            .iter()
            .find(|m| m.is_static && m.name.starts_with("Get") && !m.parameters.is_empty());
        let mut confidence = 0.4;
        let mut evidence = vec![format!("Static cache field '{}'", cache.name)];
        if let Some(g) = getter {
            confidence += 0.2;
            evidence.push(format!("Keyed accessor '{}'", g.name));
        }
        if name_contains(t, "flyweight") || name_contains(t, "pool") || name_contains(t, "cache") {
            confidence += 0.3;
            evidence.push("Flyweight-style type name".to_string());
        }
        if confidence < 0.6 {
            return None;
        }
        Some(pattern(self.kind(), ctx.module, t, confidence, evidence))
    }
}

pub struct ProxyDetector;

impl PatternDetector for ProxyDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::Proxy
    }

    fn detect(&self, t: &TypeDef, ctx: &DetectorContext<'_>) -> Option<DetectedPattern> {
        if t.is_interface {
            return None;
        }
        let wrapped = wrapped_fields(t);
        let field = wrapped.first()?;
        if !name_contains(t, "proxy") {
            return None;
        }
        let mut confidence = 0.4 + 0.3;
        let evidence = vec![
            format!("Forwards to '{}' behind '{}'", field.name, field.field_type),
            "Proxy-style type name".to_string(),
        ];
        let lazy = t
            .methods
            .iter()
            .any(|m| !m.is_constructor && method_stores_field(m, &field.name));
        if lazy {
            confidence += 0.1;
        }
        Some(pattern(self.kind(), ctx.module, t, confidence, evidence))
    }
}

fn method_stores_field(m: &crate::model::MethodDef, field_name: &str) -> bool {
    m.body.as_ref().is_some_and(|b| {
        b.instructions.iter().any(|i| {
            i.is_field_write() && i.field_operand().is_some_and(|f| f.name == field_name)
        })
    })
}
