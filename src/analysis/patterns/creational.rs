use crate::analysis::patterns::signals::{
    fluent_methods, instance_constructors, name_contains, public_methods,
};
use crate::analysis::patterns::{DetectedPattern, DetectorContext, PatternDetector, PatternKind, pattern};
use crate::model::{MemberAccess, TypeDef};

pub struct SingletonDetector;

impl PatternDetector for SingletonDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::Singleton
    }

    fn detect(&self, t: &TypeDef, ctx: &DetectorContext<'_>) -> Option<DetectedPattern> {
        if t.is_interface || t.is_enum {
            return None;
        }
        let instance_field = t
            .fields
            .iter()
            .find(|f| f.is_static && f.field_type == t.full_name)?;

        let ctors: Vec<_> = instance_constructors(t).collect();
        let private_ctor = !ctors.is_empty()
            && ctors.iter().all(|c| c.access == MemberAccess::Private);
        if !private_ctor {
            return None;
        }

        let accessor = t
            .properties
            .iter()
            .any(|p| p.is_static && p.access == MemberAccess::Public && p.name == "Instance")
            || t.methods.iter().any(|m| {
                m.is_static
                    && m.access == MemberAccess::Public
                    && (m.name == "GetInstance" || m.name == "get_Instance")
            })
            || (instance_field.is_static && instance_field.access == MemberAccess::Public);
        if !accessor {
            return None;
        }

        let mut confidence = 0.5;
        let mut evidence = vec![
            "Static instance field".to_string(),
            "Public static Instance accessor".to_string(),
        ];
        confidence += 0.3;
        evidence.push("Private constructor".to_string());
        if t.is_sealed {
            confidence += 0.1;
            evidence.push("Sealed type".to_string());
        }
        if instance_field.name.to_lowercase().contains("instance") {
            confidence += 0.1;
            evidence.push(format!("Instance field '{}'", instance_field.name));
        }
        Some(pattern(self.kind(), ctx.module, t, confidence, evidence))
    }
}

const FACTORY_PREFIXES: &[&str] = &["Create", "Make", "Build", "New"];

fn factory_methods(t: &TypeDef) -> Vec<&crate::model::MethodDef> {
    public_methods(t)
        .filter(|m| {
            FACTORY_PREFIXES.iter().any(|p| m.name.starts_with(p))
                && m.return_type != t.full_name
                && m.return_type != "System.Void"
        })
        .collect()
}

pub struct FactoryDetector;

impl PatternDetector for FactoryDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::Factory
    }

    fn detect(&self, t: &TypeDef, ctx: &DetectorContext<'_>) -> Option<DetectedPattern> {
        if t.is_interface || t.is_abstract {
            return None;
        }
        let creators = factory_methods(t);
        if creators.is_empty() {
            return None;
        }
        let mut confidence = 0.4;
        let mut evidence: Vec<String> = creators
            .iter()
            .take(3)
            .map(|m| format!("Creation method '{}' returns {}", m.name, m.return_type))
            .collect();
        if creators.len() >= 2 {
            confidence += 0.2;
        }
        if creators.len() >= 3 {
            confidence += 0.1;
        }
        if name_contains(t, "factory") {
            confidence += 0.3;
            evidence.push("Type name contains 'Factory'".to_string());
        }
        Some(pattern(self.kind(), ctx.module, t, confidence, evidence))
    }
}

pub struct AbstractFactoryDetector;

impl PatternDetector for AbstractFactoryDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::AbstractFactory
    }

    fn detect(&self, t: &TypeDef, ctx: &DetectorContext<'_>) -> Option<DetectedPattern> {
        if !t.is_interface && !t.is_abstract {
            return None;
        }
        let abstract_creators: Vec<_> = t
            .methods
            .iter()
            .filter(|m| (m.is_abstract || t.is_interface) && m.name.starts_with("Create"))
            .collect();
        if abstract_creators.len() < 2 {
            return None;
        }
        let mut confidence = 0.5;
        let mut evidence = vec![format!(
            "{} abstract creation methods",
            abstract_creators.len()
        )];
        if abstract_creators.len() >= 3 {
            confidence += 0.2;
        }
        if name_contains(t, "factory") {
            confidence += 0.3;
            evidence.push("Type name contains 'Factory'".to_string());
        }
        Some(pattern(self.kind(), ctx.module, t, confidence, evidence))
    }
}

pub struct BuilderDetector;

impl PatternDetector for BuilderDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::Builder
    }

    fn detect(&self, t: &TypeDef, ctx: &DetectorContext<'_>) -> Option<DetectedPattern> {
        if t.is_interface {
            return None;
        }
        let build = t.methods.iter().find(|m| m.name == "Build")?;
        let fluent: Vec<_> = fluent_methods(t)
            .into_iter()
            .filter(|m| m.name.starts_with("With") || m.name.starts_with("Set"))
            .collect();
        if fluent.len() < 2 {
            return None;
        }
        let mut confidence = 0.4;
        let mut evidence = vec![
            format!("'Build' returns {}", build.return_type),
            format!("{} fluent With*/Set* methods", fluent.len()),
        ];
        if fluent.len() >= 3 {
            confidence += 0.2;
        }
        if fluent.len() >= 5 {
            confidence += 0.1;
        }
        if name_contains(t, "builder") {
            confidence += 0.3;
            evidence.push("Type name contains 'Builder'".to_string());
        }
        Some(pattern(self.kind(), ctx.module, t, confidence, evidence))
    }
}

pub struct PrototypeDetector;

impl PatternDetector for PrototypeDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::Prototype
    }

    fn detect(&self, t: &TypeDef, ctx: &DetectorContext<'_>) -> Option<DetectedPattern> {
        if t.is_interface {
            return None;
        }
        let cloneable = t.interfaces.iter().any(|i| i == "System.ICloneable");
        let clone = t
            .methods
            .iter()
            .find(|m| m.name == "Clone" && m.parameters.is_empty());
        if !cloneable && clone.is_none() {
            return None;
        }
        let mut confidence = 0.4;
        let mut evidence = Vec::new();
        if cloneable {
            confidence += 0.2;
            evidence.push("Implements System.ICloneable".to_string());
        }
        if let Some(c) = clone {
            evidence.push("Parameterless 'Clone' method".to_string());
            if c.return_type == t.full_name {
                confidence += 0.1;
                evidence.push("Clone returns own type".to_string());
            }
        }
        Some(pattern(self.kind(), ctx.module, t, confidence, evidence))
    }
}
