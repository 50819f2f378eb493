use crate::analysis::patterns::signals::name_contains;
use crate::analysis::patterns::{DetectedPattern, DetectorContext, PatternDetector, PatternKind, pattern};
use crate::model::{MemberAccess, TypeDef};

pub struct StrategyDetector;

impl PatternDetector for StrategyDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::Strategy
    }

    fn detect(&self, t: &TypeDef, ctx: &DetectorContext<'_>) -> Option<DetectedPattern> {
        if !t.is_interface {
            return None;
        }
        let count = t.methods.len();
        if !(1..=3).contains(&count) {
            return None;
        }
        let mut confidence = 0.4;
        let mut evidence = vec![format!("Interface with {count} operation(s)")];
        if name_contains(t, "strategy") || name_contains(t, "policy") {
            confidence += 0.3;
            evidence.push("Strategy-style type name".to_string());
        }
        if count == 1 {
            confidence += 0.2;
            evidence.push("Single interchangeable operation".to_string());
        }
        if confidence < 0.6 {
            return None;
        }
        Some(pattern(self.kind(), ctx.module, t, confidence, evidence))
    }
}

pub struct CommandDetector;

impl PatternDetector for CommandDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::Command
    }

    fn detect(&self, t: &TypeDef, ctx: &DetectorContext<'_>) -> Option<DetectedPattern> {
        let implements_icommand = t
            .interfaces
            .iter()
            .any(|i| i.rsplit('.').next().is_some_and(|n| n == "ICommand"));
        let execute = t
            .methods
            .iter()
            .find(|m| m.name == "Execute" && m.parameters.len() <= 1);
        if !implements_icommand && execute.is_none() {
            return None;
        }
        let mut confidence = 0.4;
        let mut evidence = Vec::new();
        if implements_icommand {
            confidence += 0.2;
            evidence.push("Implements ICommand".to_string());
        }
        if execute.is_some() {
            evidence.push("'Execute' operation".to_string());
        }
        if t.methods.iter().any(|m| m.name == "Undo") {
            confidence += 0.2;
            evidence.push("'Undo' operation".to_string());
        }
        if name_contains(t, "command") {
            confidence += 0.3;
            evidence.push("Command-style type name".to_string());
        }
        if confidence < 0.6 {
            return None;
        }
        Some(pattern(self.kind(), ctx.module, t, confidence, evidence))
    }
}

pub struct StateDetector;

impl PatternDetector for StateDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::State
    }

    fn detect(&self, t: &TypeDef, ctx: &DetectorContext<'_>) -> Option<DetectedPattern> {
        let transition = t.methods.iter().find(|m| {
            matches!(m.name.as_str(), "SetState" | "ChangeState" | "TransitionTo")
        });
        let state_field = t
            .fields
            .iter()
            .find(|f| ctx.hierarchy.is_interface(&f.field_type) && f.field_type.contains("State"));
        let named_state = name_contains(t, "state") && (t.is_interface || t.is_abstract);
        if transition.is_none() && state_field.is_none() && !named_state {
            return None;
        }
        let mut confidence = 0.4;
        let mut evidence = Vec::new();
        if let Some(m) = transition {
            confidence += 0.2;
            evidence.push(format!("Transition method '{}'", m.name));
        }
        if let Some(f) = state_field {
            confidence += 0.2;
            evidence.push(format!("Current-state field '{}'", f.name));
        }
        if named_state {
            confidence += 0.2;
            evidence.push("Abstract state contract".to_string());
        }
        if confidence < 0.6 {
            return None;
        }
        Some(pattern(self.kind(), ctx.module, t, confidence, evidence))
    }
}

pub struct TemplateMethodDetector;

impl PatternDetector for TemplateMethodDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::TemplateMethod
    }

    fn detect(&self, t: &TypeDef, ctx: &DetectorContext<'_>) -> Option<DetectedPattern> {
        if !t.is_abstract || t.is_interface {
            return None;
        }
        let hooks: Vec<_> = t.methods.iter().filter(|m| m.is_abstract).collect();
        let skeleton = t.methods.iter().find(|m| {
            !m.is_abstract && !m.is_constructor && m.access == MemberAccess::Public
        });
        if hooks.len() < 2 || skeleton.is_none() {
            return None;
        }
        let mut confidence = 0.4;
        let mut evidence = vec![
            format!("Concrete skeleton '{}'", skeleton.map(|m| m.name.as_str()).unwrap_or("")),
            format!("{} abstract hook methods", hooks.len()),
        ];
        if hooks.len() >= 3 {
            confidence += 0.2;
        }
        if name_contains(t, "template") || name_contains(t, "base") {
            confidence += 0.1;
            evidence.push("Template-style type name".to_string());
        }
        Some(pattern(self.kind(), ctx.module, t, confidence, evidence))
    }
}

pub struct VisitorDetector;

impl PatternDetector for VisitorDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::Visitor
    }

    fn detect(&self, t: &TypeDef, ctx: &DetectorContext<'_>) -> Option<DetectedPattern> {
        let visits: Vec<_> = t
            .methods
            .iter()
            .filter(|m| m.name.starts_with("Visit") && !m.parameters.is_empty())
            .collect();
        let accept = t.methods.iter().find(|m| {
            m.name == "Accept"
                && m.parameters
                    .iter()
                    .any(|p| p.param_type.contains("Visitor"))
        });
        if visits.len() < 2 && accept.is_none() {
            return None;
        }
        let mut confidence = 0.4;
        let mut evidence = Vec::new();
        if visits.len() >= 2 {
            evidence.push(format!("{} Visit* overloads", visits.len()));
        }
        if visits.len() >= 3 {
            confidence += 0.2;
        }
        if accept.is_some() {
            confidence += 0.2;
            evidence.push("'Accept(visitor)' entry point".to_string());
        }
        if name_contains(t, "visitor") {
            confidence += 0.3;
            evidence.push("Visitor-style type name".to_string());
        }
        if confidence < 0.6 {
            return None;
        }
        Some(pattern(self.kind(), ctx.module, t, confidence, evidence))
    }
}

pub struct ObserverDetector;

impl PatternDetector for ObserverDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::Observer
    }

    fn detect(&self, t: &TypeDef, ctx: &DetectorContext<'_>) -> Option<DetectedPattern> {
        let iobserver = t.interfaces.iter().any(|i| {
            i.starts_with("System.IObserver") || i.starts_with("System.IObservable")
        });
        let has_events = !t.events.is_empty();
        let subscribe = t.methods.iter().any(|m| m.name == "Subscribe");
        let unsubscribe = t
            .methods
            .iter()
            .any(|m| m.name == "Unsubscribe" || m.name == "Dispose");
        let pair = subscribe && unsubscribe;
        if !iobserver && !has_events && !pair {
            return None;
        }
        let mut confidence: f64 = 0.0;
        let mut evidence = Vec::new();
        if iobserver {
            confidence += 0.5;
            evidence.push("Implements IObserver/IObservable".to_string());
        }
        if has_events {
            confidence += 0.4;
            evidence.push(format!("{} declared event(s)", t.events.len()));
        }
        if pair {
            confidence += 0.3;
            evidence.push("Subscribe/Unsubscribe pair".to_string());
        }
        Some(pattern(self.kind(), ctx.module, t, confidence, evidence))
    }
}

pub struct IteratorDetector;

impl PatternDetector for IteratorDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::Iterator
    }

    fn detect(&self, t: &TypeDef, ctx: &DetectorContext<'_>) -> Option<DetectedPattern> {
        let enumerable = t
            .interfaces
            .iter()
            .any(|i| i.contains("IEnumerable") || i.contains("IEnumerator"));
        let get_enumerator = t.methods.iter().any(|m| m.name == "GetEnumerator");
        let move_next = t.methods.iter().any(|m| m.name == "MoveNext");
        if !enumerable && !get_enumerator && !move_next {
            return None;
        }
        let mut confidence = 0.4;
        let mut evidence = Vec::new();
        if enumerable {
            confidence += 0.2;
            evidence.push("Implements enumeration interface".to_string());
        }
        if get_enumerator {
            evidence.push("'GetEnumerator' factory".to_string());
        }
        if move_next {
            confidence += 0.1;
            evidence.push("'MoveNext' cursor".to_string());
        }
        if name_contains(t, "iterator") || name_contains(t, "enumerator") {
            confidence += 0.2;
            evidence.push("Iterator-style type name".to_string());
        }
        if confidence < 0.6 {
            return None;
        }
        Some(pattern(self.kind(), ctx.module, t, confidence, evidence))
    }
}
