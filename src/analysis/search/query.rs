use crate::errors::{AnalysisError, AnalysisResult};
use nom::IResult;
use nom::branch::alt;
use nom::bytes::complete::{take_till, take_till1};
use nom::character::complete::{char, multispace0};
use nom::combinator::map;
use nom::multi::many0;
use nom::sequence::{delimited, preceded};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    #[default]
    Auto,
    Types,
    Members,
    Literals,
    Token,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub mode: SearchMode,
    pub namespace_filter: Option<String>,
    pub limit: Option<usize>,
}

/// Resolved mode after auto-detection.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum EffectiveMode {
    TypesAndMembers,
    TypesOnly,
    MembersOnly,
    Literals,
    Token,
}

/// Auto-detection: `0x…` is a metadata-token search, a quoted string or a
/// parseable number is a literal search, anything else hits types and members.
pub fn detect_mode(request: &SearchRequest) -> EffectiveMode {
    match request.mode {
        SearchMode::Types => EffectiveMode::TypesOnly,
        SearchMode::Members => EffectiveMode::MembersOnly,
        SearchMode::Literals => EffectiveMode::Literals,
        SearchMode::Token => EffectiveMode::Token,
        SearchMode::Auto => {
            let q = request.query.trim();
            if q.starts_with("0x") || q.starts_with("0X") {
                EffectiveMode::Token
            } else if (q.starts_with('"') && q.ends_with('"') && q.len() >= 2)
                || q.parse::<i64>().is_ok()
                || q.parse::<f64>().is_ok()
            {
                EffectiveMode::Literals
            } else {
                EffectiveMode::TypesAndMembers
            }
        }
    }
}

/// One parsed query term.
#[derive(Debug, Clone)]
pub enum QueryTerm {
    /// `+term`: must appear.
    Require(String),
    /// `-term`: must not appear.
    Exclude(String),
    /// `=term`: exact, case-insensitive, arity suffix ignored.
    Exact(String),
    /// `~term`: subsequence match.
    Fuzzy(String),
    /// Bare term: substring match.
    Substring(String),
}

/// Compiled query: terms plus an optional regex that replaces substring
/// matching.
#[derive(Debug)]
pub struct QueryMatcher {
    terms: Vec<QueryTerm>,
    regex: Option<Regex>,
}

fn quoted_token(input: &str) -> IResult<&str, String> {
    map(
        delimited(char('"'), take_till(|c| c == '"'), char('"')),
        |s: &str| s.to_string(),
    )(input)
}

fn bare_token(input: &str) -> IResult<&str, String> {
    map(take_till1(|c: char| c.is_whitespace()), |s: &str| {
        s.to_string()
    })(input)
}

/// Whitespace-separated tokens; double-quoted substrings stay one token.
fn tokenize(input: &str) -> Vec<String> {
    let mut parser = many0(preceded(multispace0, alt((quoted_token, bare_token))));
    match parser(input) {
        Ok((_, tokens)) => tokens,
        Err(_) => Vec::new(),
    }
}

impl QueryMatcher {
    pub fn parse(query: &str) -> AnalysisResult<Self> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(AnalysisError::InvalidInput("empty query".to_string()));
        }

        // A whole-query /regex/ replaces substring matching.
        if trimmed.len() >= 2 && trimmed.starts_with('/') && trimmed.ends_with('/') {
            let pattern = &trimmed[1..trimmed.len() - 1];
            let regex = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| AnalysisError::InvalidInput(format!("bad regex: {e}")))?;
            return Ok(Self {
                terms: Vec::new(),
                regex: Some(regex),
            });
        }

        let mut terms = Vec::new();
        for raw in tokenize(trimmed) {
            let term = if let Some(rest) = raw.strip_prefix('+') {
                QueryTerm::Require(unquote(rest))
            } else if let Some(rest) = raw.strip_prefix('-') {
                QueryTerm::Exclude(unquote(rest))
            } else if let Some(rest) = raw.strip_prefix('=') {
                QueryTerm::Exact(unquote(rest))
            } else if let Some(rest) = raw.strip_prefix('~') {
                QueryTerm::Fuzzy(unquote(rest))
            } else {
                QueryTerm::Substring(unquote(&raw))
            };
            terms.push(term);
        }
        if terms.is_empty() {
            return Err(AnalysisError::InvalidInput("empty query".to_string()));
        }
        Ok(Self { terms, regex: None })
    }

    pub fn matches(&self, name: &str) -> bool {
        if let Some(re) = &self.regex {
            return re.is_match(name);
        }
        let lower = name.to_lowercase();
        let exactable = strip_arity(&lower);
        for term in &self.terms {
            let ok = match term {
                QueryTerm::Require(t) | QueryTerm::Substring(t) => {
                    lower.contains(&t.to_lowercase())
                }
                QueryTerm::Exclude(t) => !lower.contains(&t.to_lowercase()),
                QueryTerm::Exact(t) => exactable == t.to_lowercase(),
                QueryTerm::Fuzzy(t) => is_subsequence(&t.to_lowercase(), &lower),
            };
            if !ok {
                return false;
            }
        }
        true
    }

    /// Whole-name equality against any positive term (arity-insensitive).
    pub fn is_exact_match(&self, name: &str) -> bool {
        let lower = strip_arity(&name.to_lowercase()).to_string();
        self.positive_terms()
            .iter()
            .any(|t| t.to_lowercase() == lower)
    }

    /// Any positive keyword is a prefix of the name.
    pub fn has_prefix_match(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.positive_terms()
            .iter()
            .any(|t| !t.is_empty() && lower.starts_with(&t.to_lowercase()))
    }

    fn positive_terms(&self) -> Vec<&str> {
        self.terms
            .iter()
            .filter_map(|t| match t {
                QueryTerm::Require(s)
                | QueryTerm::Exact(s)
                | QueryTerm::Fuzzy(s)
                | QueryTerm::Substring(s) => Some(s.as_str()),
                QueryTerm::Exclude(_) => None,
            })
            .collect()
    }
}

fn unquote(s: &str) -> String {
    let s = s.trim();
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}

/// Strip a trailing `` `N `` generic-arity suffix.
fn strip_arity(s: &str) -> &str {
    match s.rfind('`') {
        Some(pos) if s[pos + 1..].chars().all(|c| c.is_ascii_digit()) => &s[..pos],
        _ => s,
    }
}

fn is_subsequence(needle: &str, haystack: &str) -> bool {
    let mut chars = haystack.chars();
    'outer: for n in needle.chars() {
        for h in chars.by_ref() {
            if h == n {
                continue 'outer;
            }
        }
        return false;
    }
    true
}
