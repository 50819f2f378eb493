use crate::analysis::context::AnalysisConfig;
use crate::analysis::identity;
use crate::analysis::index::{TypeKind, is_compiler_artifact};
use crate::analysis::sanitize;
use crate::analysis::search::query::{EffectiveMode, QueryMatcher, SearchRequest};
use crate::errors::{AnalysisError, AnalysisResult};
use crate::model::Module;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchHitKind {
    Class,
    Interface,
    Struct,
    Enum,
    Delegate,
    Method,
    Constructor,
    Field,
    Property,
    Event,
    StringLiteral,
    NumericLiteral,
}

impl SearchHitKind {
    fn of_type(kind: TypeKind) -> Self {
        match kind {
            TypeKind::Class => SearchHitKind::Class,
            TypeKind::Interface => SearchHitKind::Interface,
            TypeKind::Struct => SearchHitKind::Struct,
            TypeKind::Enum => SearchHitKind::Enum,
            TypeKind::Delegate => SearchHitKind::Delegate,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub name: String,
    pub full_name: String,
    pub kind: SearchHitKind,
    pub declaring_type: Option<String>,
    /// Literal value, token hex, or other strategy-specific context.
    pub detail: Option<String>,
    pub il_offset: Option<u32>,
    pub relevance: f64,
}

/// Shared result sink. Duplicate ids collapse; `total` counts every match
/// seen so `has_more` can be derived after the limit cut.
#[derive(Debug, Default)]
pub struct SearchAccumulator {
    seen: HashSet<String>,
    pub hits: Vec<SearchHit>,
    pub total: usize,
}

impl SearchAccumulator {
    pub fn push(&mut self, hit: SearchHit) {
        if self.seen.insert(hit.id.clone()) {
            self.total += 1;
            self.hits.push(hit);
        }
    }
}

pub struct SearchContext<'a> {
    pub module: &'a Module,
    pub matcher: &'a QueryMatcher,
    pub request: &'a SearchRequest,
    pub config: &'a AnalysisConfig,
}

impl SearchContext<'_> {
    fn namespace_allowed(&self, ns: &str) -> bool {
        match &self.request.namespace_filter {
            Some(filter) => ns == filter || ns.starts_with(&format!("{filter}.")),
            None => true,
        }
    }

    /// Relevance: base 1.0, x2 exact, x1.5 keyword prefix, scaled down for
    /// long names, x1.5 for constants.
    fn score(&self, name: &str, is_constant: bool) -> f64 {
        let mut score = 1.0;
        if self.matcher.is_exact_match(name) {
            score *= 2.0;
        }
        if self.matcher.has_prefix_match(name) {
            score *= 1.5;
        }
        score *= (1.0 - name.len() as f64 / 100.0).max(0.5);
        if is_constant {
            score *= 1.5;
        }
        score
    }
}

/// A search strategy is a value; the engine keeps a list and iterates.
pub trait SearchStrategy: Sync {
    fn name(&self) -> &'static str;
    fn supports(&self, mode: EffectiveMode) -> bool;
    fn run(&self, ctx: &SearchContext<'_>, sink: &mut SearchAccumulator) -> AnalysisResult<()>;
}

pub struct TypeStrategy;

impl SearchStrategy for TypeStrategy {
    fn name(&self) -> &'static str {
        "types"
    }

    fn supports(&self, mode: EffectiveMode) -> bool {
        matches!(
            mode,
            EffectiveMode::TypesAndMembers | EffectiveMode::TypesOnly
        )
    }

    fn run(&self, ctx: &SearchContext<'_>, sink: &mut SearchAccumulator) -> AnalysisResult<()> {
        for t in ctx.module.types_recursive() {
            if t.name == "<Module>" || !ctx.namespace_allowed(&t.namespace) {
                continue;
            }
            if ctx.matcher.matches(&t.name) || ctx.matcher.matches(&t.full_name) {
                sink.push(SearchHit {
                    id: identity::type_id(ctx.module, t),
                    name: t.name.clone(),
                    full_name: t.full_name.clone(),
                    kind: SearchHitKind::of_type(TypeKind::of(t)),
                    declaring_type: None,
                    detail: None,
                    il_offset: None,
                    relevance: ctx.score(&t.name, false),
                });
            }
        }
        Ok(())
    }
}

pub struct MemberStrategy;

impl SearchStrategy for MemberStrategy {
    fn name(&self) -> &'static str {
        "members"
    }

    fn supports(&self, mode: EffectiveMode) -> bool {
        matches!(
            mode,
            EffectiveMode::TypesAndMembers | EffectiveMode::MembersOnly
        )
    }

    fn run(&self, ctx: &SearchContext<'_>, sink: &mut SearchAccumulator) -> AnalysisResult<()> {
        let guid = ctx.module.guid;
        for t in ctx.module.types_recursive() {
            if is_compiler_artifact(&t.name) || !ctx.namespace_allowed(&t.namespace) {
                continue;
            }
            for m in &t.methods {
                if m.is_static_constructor() || !ctx.matcher.matches(&m.name) {
                    continue;
                }
                sink.push(SearchHit {
                    id: identity::member_id(guid, &identity::method_signature(m)),
                    name: m.name.clone(),
                    full_name: format!("{}.{}", t.full_name, m.name),
                    kind: if m.is_constructor {
                        SearchHitKind::Constructor
                    } else {
                        SearchHitKind::Method
                    },
                    declaring_type: Some(t.full_name.clone()),
                    detail: None,
                    il_offset: None,
                    relevance: ctx.score(&m.name, false),
                });
            }
            for f in &t.fields {
                if !ctx.matcher.matches(&f.name) {
                    continue;
                }
                sink.push(SearchHit {
                    id: identity::member_id(guid, &identity::field_signature(&t.full_name, f)),
                    name: f.name.clone(),
                    full_name: format!("{}.{}", t.full_name, f.name),
                    kind: SearchHitKind::Field,
                    declaring_type: Some(t.full_name.clone()),
                    detail: None,
                    il_offset: None,
                    relevance: ctx.score(&f.name, f.is_literal),
                });
            }
            for p in &t.properties {
                if !ctx.matcher.matches(&p.name) {
                    continue;
                }
                sink.push(SearchHit {
                    id: identity::member_id(guid, &identity::property_signature(&t.full_name, p)),
                    name: p.name.clone(),
                    full_name: format!("{}.{}", t.full_name, p.name),
                    kind: SearchHitKind::Property,
                    declaring_type: Some(t.full_name.clone()),
                    detail: None,
                    il_offset: None,
                    relevance: ctx.score(&p.name, false),
                });
            }
            for e in &t.events {
                if !ctx.matcher.matches(&e.name) {
                    continue;
                }
                sink.push(SearchHit {
                    id: identity::member_id(guid, &identity::event_signature(&t.full_name, &e.name)),
                    name: e.name.clone(),
                    full_name: format!("{}.{}", t.full_name, e.name),
                    kind: SearchHitKind::Event,
                    declaring_type: Some(t.full_name.clone()),
                    detail: None,
                    il_offset: None,
                    relevance: ctx.score(&e.name, false),
                });
            }
        }
        Ok(())
    }
}

pub struct LiteralStrategy;

impl LiteralStrategy {
    fn matches_number(ctx: &SearchContext<'_>, value: &str) -> bool {
        if ctx.matcher.matches(value) {
            return true;
        }
        let query = ctx.request.query.trim();
        match (query.parse::<f64>(), value.parse::<f64>()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

impl SearchStrategy for LiteralStrategy {
    fn name(&self) -> &'static str {
        "literals"
    }

    fn supports(&self, mode: EffectiveMode) -> bool {
        mode == EffectiveMode::Literals
    }

    fn run(&self, ctx: &SearchContext<'_>, sink: &mut SearchAccumulator) -> AnalysisResult<()> {
        let guid = ctx.module.guid;
        for t in ctx.module.types_recursive() {
            if !ctx.namespace_allowed(&t.namespace) {
                continue;
            }
            // Constant static fields carry literal values too.
            for f in &t.fields {
                let Some(value) = f.constant.as_ref().map(|c| c.to_string()) else {
                    continue;
                };
                let hit = ctx.matcher.matches(&value) || Self::matches_number(ctx, &value);
                if !hit {
                    continue;
                }
                sink.push(SearchHit {
                    id: identity::member_id(guid, &format!("const:{}::{}", t.full_name, f.name)),
                    name: sanitize::sanitize(&value),
                    full_name: format!("{}.{}", t.full_name, f.name),
                    kind: literal_kind(&value),
                    declaring_type: Some(t.full_name.clone()),
                    detail: Some(value.clone()),
                    il_offset: None,
                    relevance: ctx.score(&value, true),
                });
            }
            for m in &t.methods {
                let Some(body) = &m.body else {
                    continue;
                };
                for instr in &body.instructions {
                    let (value, kind) = if instr.is_load_string() {
                        match &instr.operand {
                            crate::model::Operand::String(s) => {
                                (s.clone(), SearchHitKind::StringLiteral)
                            }
                            _ => continue,
                        }
                    } else if let Some(v) = instr.constant_operand() {
                        (v, SearchHitKind::NumericLiteral)
                    } else {
                        continue;
                    };
                    let matched = match kind {
                        SearchHitKind::StringLiteral => ctx.matcher.matches(&value),
                        _ => Self::matches_number(ctx, &value),
                    };
                    if !matched {
                        continue;
                    }
                    sink.push(SearchHit {
                        id: identity::member_id(
                            guid,
                            &format!(
                                "literal:{}::{}@{}",
                                t.full_name, m.name, instr.offset
                            ),
                        ),
                        name: sanitize::sanitize(&value),
                        full_name: format!("{}.{}", t.full_name, m.name),
                        kind,
                        declaring_type: Some(t.full_name.clone()),
                        detail: Some(sanitize::sanitize(&value)),
                        il_offset: Some(instr.offset),
                        relevance: ctx.score(&value, false),
                    });
                }
            }
        }
        Ok(())
    }
}

fn literal_kind(value: &str) -> SearchHitKind {
    if value.parse::<f64>().is_ok() {
        SearchHitKind::NumericLiteral
    } else {
        SearchHitKind::StringLiteral
    }
}

pub struct TokenStrategy;

impl SearchStrategy for TokenStrategy {
    fn name(&self) -> &'static str {
        "token"
    }

    fn supports(&self, mode: EffectiveMode) -> bool {
        mode == EffectiveMode::Token
    }

    fn run(&self, ctx: &SearchContext<'_>, sink: &mut SearchAccumulator) -> AnalysisResult<()> {
        let raw = ctx.request.query.trim();
        let hex = raw
            .strip_prefix("0x")
            .or_else(|| raw.strip_prefix("0X"))
            .unwrap_or(raw);
        let token = u32::from_str_radix(hex, 16)
            .map_err(|_| AnalysisError::InvalidInput(format!("bad metadata token: {raw}")))?;

        for t in ctx.module.types_recursive() {
            if t.metadata_token == token {
                sink.push(SearchHit {
                    id: identity::type_id(ctx.module, t),
                    name: t.name.clone(),
                    full_name: t.full_name.clone(),
                    kind: SearchHitKind::of_type(TypeKind::of(t)),
                    declaring_type: None,
                    detail: Some(format!("0x{token:08X}")),
                    il_offset: None,
                    relevance: 2.0,
                });
                return Ok(());
            }
            for m in &t.methods {
                if m.metadata_token == token {
                    sink.push(SearchHit {
                        id: identity::member_id(
                            ctx.module.guid,
                            &identity::method_signature(m),
                        ),
                        name: m.name.clone(),
                        full_name: format!("{}.{}", t.full_name, m.name),
                        kind: SearchHitKind::Method,
                        declaring_type: Some(t.full_name.clone()),
                        detail: Some(format!("0x{token:08X}")),
                        il_offset: None,
                        relevance: 2.0,
                    });
                    return Ok(());
                }
            }
            for f in &t.fields {
                if f.metadata_token == token {
                    sink.push(SearchHit {
                        id: identity::member_id(
                            ctx.module.guid,
                            &identity::field_signature(&t.full_name, f),
                        ),
                        name: f.name.clone(),
                        full_name: format!("{}.{}", t.full_name, f.name),
                        kind: SearchHitKind::Field,
                        declaring_type: Some(t.full_name.clone()),
                        detail: Some(format!("0x{token:08X}")),
                        il_offset: None,
                        relevance: 2.0,
                    });
                    return Ok(());
                }
            }
        }
        Ok(())
    }
}
