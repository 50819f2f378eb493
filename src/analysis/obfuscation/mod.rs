//! Obfuscation triage: seven heuristic passes produce scored indicators and
//! a weighted total in [0, 100]. Evidence strings embedding raw names pass
//! through the sanitizer, so hostile identifiers stay printable.

use crate::analysis::context::{AnalysisConfig, CancellationToken};
use crate::analysis::sanitize;
use crate::errors::AnalysisResult;
use crate::model::{MethodDef, Module, TypeDef};
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorCategory {
    ToolMarker,
    InvalidIdentifier,
    SuspiciousNaming,
    ControlFlowFlattening,
    StringEncryption,
    AntiDebug,
    ProxyMethods,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObfuscationIndicator {
    pub category: IndicatorCategory,
    pub severity: Severity,
    pub description: String,
    pub location: String,
    pub evidence: Vec<String>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObfuscationResult {
    pub score: f64,
    pub is_obfuscated: bool,
    pub confidence: Confidence,
    pub detected_tools: Vec<String>,
    pub indicators: Vec<ObfuscationIndicator>,
}

const KNOWN_TOOLS: &[&str] = &[
    "Dotfuscator",
    "ConfuserEx",
    "Confuser",
    "SmartAssembly",
    "Eazfuscator",
    "Babel",
    ".NET Reactor",
    "DotNetReactor",
    "VMProtect",
    "Enigma",
    "Obfuscar",
    "CryptoObfuscator",
    "ILProtector",
    "Agile.NET",
];

/// Two-character names that are ordinary in hand-written code.
const COMMON_SHORT_NAMES: &[&str] = &["T", "K", "V", "E", "I", "Id", "ID", "OK", "UI"];

const ANTI_DEBUG_APIS: &[&str] = &[
    "Debugger.get_IsAttached",
    "Debugger.IsAttached",
    "Debugger.IsLogging",
    "IsDebuggerPresent",
    "CheckRemoteDebuggerPresent",
    "OutputDebugString",
];

pub fn detect_obfuscation(
    module: &Module,
    config: &AnalysisConfig,
    cancel: &CancellationToken,
) -> AnalysisResult<ObfuscationResult> {
    let types = module.types_recursive();
    let mut indicators = Vec::new();

    cancel.ensure_live()?;
    let (marker_count, detected_tools) = scan_tool_markers(module, &types, &mut indicators);

    cancel.ensure_live()?;
    let invalid_ratio = scan_invalid_identifiers(&types, &mut indicators);

    cancel.ensure_live()?;
    let short_names = scan_name_entropy(&types, &mut indicators);

    cancel.ensure_live()?;
    let flattened = scan_flattening(&types, &mut indicators);

    cancel.ensure_live()?;
    let encryption = scan_string_encryption(&types, config, &mut indicators);

    cancel.ensure_live()?;
    let anti_debug = scan_anti_debug(&types, &mut indicators);

    cancel.ensure_live()?;
    let proxies = scan_proxy_methods(&types, config, &mut indicators);

    let score = (30.0 * marker_count as f64
        + 50.0 * invalid_ratio
        + (short_names as f64).min(20.0)
        + 10.0 * flattened as f64
        + 5.0 * encryption as f64
        + (proxies as f64 / 5.0).min(10.0)
        + 15.0 * anti_debug as f64)
        .clamp(0.0, 100.0);

    let confidence = if score >= 70.0 {
        Confidence::High
    } else if score >= 40.0 {
        Confidence::Medium
    } else {
        Confidence::Low
    };
    debug!(
        "obfuscation: score {score:.1} ({} indicators, tools {:?})",
        indicators.len(),
        detected_tools
    );

    Ok(ObfuscationResult {
        score,
        is_obfuscated: score >= 30.0,
        confidence,
        detected_tools,
        indicators,
    })
}

/// Pass 1: known tool names in module/assembly custom-attribute type names
/// or in the first 100 type names. Each (tool, location) hit is one marker,
/// so a tool naming both the attribute and its embedded attribute type
/// weighs twice.
fn scan_tool_markers(
    module: &Module,
    types: &[&TypeDef],
    indicators: &mut Vec<ObfuscationIndicator>,
) -> (usize, Vec<String>) {
    let attribute_names: Vec<&String> = module
        .assembly
        .custom_attributes
        .iter()
        .map(|a| &a.attribute_type)
        .collect();
    let type_names: Vec<&String> = types.iter().take(100).map(|t| &t.full_name).collect();

    let mut marker_count = 0usize;
    let mut found: Vec<String> = Vec::new();
    for tool in KNOWN_TOOLS {
        let normalized = tool.replace([' ', '.'], "").to_lowercase();
        // "Confuser" must not re-match every ConfuserEx marker.
        if found
            .iter()
            .any(|f| f.contains(*tool) || tool.contains(f.as_str()))
        {
            continue;
        }
        let mut tool_hit = false;
        for (location, names) in [("assembly attributes", &attribute_names), ("type names", &type_names)] {
            let hit = names
                .iter()
                .find(|h| h.replace([' ', '.'], "").to_lowercase().contains(&normalized));
            if let Some(h) = hit {
                tool_hit = true;
                marker_count += 1;
                indicators.push(ObfuscationIndicator {
                    category: IndicatorCategory::ToolMarker,
                    severity: Severity::High,
                    description: format!("Obfuscator marker '{tool}' in {location}"),
                    location: location.to_string(),
                    evidence: vec![sanitize::sanitize(h.as_str())],
                });
            }
        }
        if tool_hit {
            found.push(tool.to_string());
        }
    }
    (marker_count, found)
}

/// Pass 2: identifiers that no compiler emits for source names.
fn is_invalid_identifier(name: &str) -> bool {
    if name.is_empty() {
        return true;
    }
    let has_hostile_bytes = name
        .chars()
        .any(|c| (c as u32) < 0x20 || (c as u32) >= 0x7f);
    if has_hostile_bytes {
        return true;
    }
    // Well-formed compiler markers (`<Foo>d__3`) are legitimate.
    if name.starts_with('<') && name.contains('>') {
        return false;
    }
    let mut chars = name.chars();
    let first = chars.next().expect("non-empty");
    if !first.is_ascii_alphabetic() && first != '_' {
        return true;
    }
    name.chars()
        .any(|c| !c.is_ascii_alphanumeric() && c != '_' && c != '`')
}

fn scan_invalid_identifiers(
    types: &[&TypeDef],
    indicators: &mut Vec<ObfuscationIndicator>,
) -> f64 {
    let invalid: Vec<&&TypeDef> = types
        .iter()
        .filter(|t| is_invalid_identifier(&t.name))
        .collect();
    if invalid.is_empty() || types.is_empty() {
        return 0.0;
    }
    indicators.push(ObfuscationIndicator {
        category: IndicatorCategory::InvalidIdentifier,
        severity: Severity::High,
        description: format!("{} type name(s) are not valid identifiers", invalid.len()),
        location: "module".to_string(),
        evidence: invalid
            .iter()
            .take(10)
            .map(|t| sanitize::sanitize_type_name(&t.name))
            .collect(),
    });
    invalid.len() as f64 / types.len() as f64
}

/// Pass 3: minified or generated-looking names.
fn scan_name_entropy(types: &[&TypeDef], indicators: &mut Vec<ObfuscationIndicator>) -> usize {
    let random_re = Regex::new("^[A-Z]{10,}$|^[a-z]{10,}$|^[A-Za-z0-9]{20,}$")
        .expect("static pattern compiles");
    let mut suspicious = Vec::new();
    for t in types {
        let name = t.name.as_str();
        let short = name.len() <= 2 && !COMMON_SHORT_NAMES.contains(&name);
        let random = name.len() >= 8
            && (max_consonant_run(name) > 5
                || max_vowel_run(name) > 4
                || (name.len() > 10 && digit_ratio(name) > 0.3)
                || random_re.is_match(name));
        if short || random {
            suspicious.push(name);
        }
    }
    if !suspicious.is_empty() {
        indicators.push(ObfuscationIndicator {
            category: IndicatorCategory::SuspiciousNaming,
            severity: Severity::Medium,
            description: format!("{} short or random-looking type name(s)", suspicious.len()),
            location: "module".to_string(),
            evidence: suspicious
                .iter()
                .take(10)
                .map(|n| sanitize::sanitize_type_name(n))
                .collect(),
        });
    }
    suspicious.len()
}

fn max_consonant_run(name: &str) -> usize {
    max_run(name, |c| {
        c.is_ascii_alphabetic() && !"aeiouAEIOU".contains(c)
    })
}

fn max_vowel_run(name: &str) -> usize {
    max_run(name, |c| "aeiouAEIOU".contains(c))
}

fn max_run(name: &str, pred: impl Fn(char) -> bool) -> usize {
    let mut best = 0;
    let mut current = 0;
    for c in name.chars() {
        if pred(c) {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best
}

fn digit_ratio(name: &str) -> f64 {
    if name.is_empty() {
        return 0.0;
    }
    name.chars().filter(char::is_ascii_digit).count() as f64 / name.len() as f64
}

/// Pass 4: dispatcher-switch control-flow flattening.
fn scan_flattening(types: &[&TypeDef], indicators: &mut Vec<ObfuscationIndicator>) -> usize {
    let mut count = 0;
    for t in types {
        for m in &t.methods {
            let Some(body) = &m.body else {
                continue;
            };
            let instr_count = body.instructions.len();
            let switches = body.instructions.iter().filter(|i| i.is_switch()).count();
            let branches = body
                .instructions
                .iter()
                .filter(|i| {
                    matches!(
                        i.flow,
                        crate::model::FlowControl::Branch | crate::model::FlowControl::CondBranch
                    )
                })
                .count();
            if instr_count > 100 && switches >= 1 && branches > 20 && body.local_variables.len() > 5
            {
                count += 1;
                indicators.push(ObfuscationIndicator {
                    category: IndicatorCategory::ControlFlowFlattening,
                    severity: Severity::High,
                    description: "Dispatcher-style flattened control flow".to_string(),
                    location: format!("{}.{}", t.full_name, sanitize::sanitize_method_name(&m.name)),
                    evidence: vec![format!(
                        "{instr_count} instructions, {switches} switch(es), {branches} branches"
                    )],
                });
            }
        }
    }
    count
}

/// Pass 5: string decryption helpers and opaque blob storage.
fn scan_string_encryption(
    types: &[&TypeDef],
    config: &AnalysisConfig,
    indicators: &mut Vec<ObfuscationIndicator>,
) -> usize {
    let mut count = 0;
    for t in types {
        for m in &t.methods {
            let lowered = m.name.to_lowercase();
            if lowered.contains("decrypt") || lowered.contains("deobfuscate") {
                count += 1;
                indicators.push(ObfuscationIndicator {
                    category: IndicatorCategory::StringEncryption,
                    severity: Severity::Medium,
                    description: "Decryption-style method name".to_string(),
                    location: format!("{}.{}", t.full_name, sanitize::sanitize_method_name(&m.name)),
                    evidence: vec![sanitize::sanitize_method_name(&m.name)],
                });
            }
            let Some(body) = &m.body else {
                continue;
            };
            let getstring_calls = body
                .instructions
                .iter()
                .filter(|i| {
                    i.is_call()
                        && i.method_operand().is_some_and(|r| {
                            r.name == "GetString" && r.params == ["System.Int32"]
                        })
                })
                .count();
            if getstring_calls > 0 {
                count += 1;
                indicators.push(ObfuscationIndicator {
                    category: IndicatorCategory::StringEncryption,
                    severity: Severity::Medium,
                    description: "Indexed GetString(int32) decryption call".to_string(),
                    location: format!("{}.{}", t.full_name, sanitize::sanitize_method_name(&m.name)),
                    evidence: vec![format!("{getstring_calls} call site(s)")],
                });
            }
        }
    }

    let blob_fields: usize = types
        .iter()
        .flat_map(|t| &t.fields)
        .filter(|f| f.is_static && f.field_type == "System.Byte[]")
        .count();
    if blob_fields > config.encrypted_blob_threshold {
        count += 1;
        indicators.push(ObfuscationIndicator {
            category: IndicatorCategory::StringEncryption,
            severity: Severity::Medium,
            description: format!("{blob_fields} static byte[] blob fields"),
            location: "module".to_string(),
            evidence: Vec::new(),
        });
    }
    count
}

/// Pass 6: debugger-detection call sites.
fn scan_anti_debug(types: &[&TypeDef], indicators: &mut Vec<ObfuscationIndicator>) -> usize {
    let mut found: Vec<&str> = Vec::new();
    for t in types {
        for m in &t.methods {
            let Some(body) = &m.body else {
                continue;
            };
            for instr in &body.instructions {
                let Some(target) = instr.method_operand() else {
                    continue;
                };
                let qualified = target.qualified_name();
                for api in ANTI_DEBUG_APIS {
                    if qualified.ends_with(api) || target.name == *api {
                        if !found.contains(api) {
                            found.push(api);
                            indicators.push(ObfuscationIndicator {
                                category: IndicatorCategory::AntiDebug,
                                severity: Severity::High,
                                description: format!("Anti-debug call to {api}"),
                                location: format!(
                                    "{}.{}",
                                    t.full_name,
                                    sanitize::sanitize_method_name(&m.name)
                                ),
                                evidence: vec![sanitize::sanitize(&qualified)],
                            });
                        }
                    }
                }
            }
        }
    }
    found.len()
}

/// Pass 7: argument-forwarding proxy methods (2-5 instructions: loads,
/// exactly one call, ret).
fn is_proxy_method(m: &MethodDef) -> bool {
    let Some(body) = &m.body else {
        return false;
    };
    let instrs = &body.instructions;
    if !(2..=5).contains(&instrs.len()) {
        return false;
    }
    let Some(last) = instrs.last() else {
        return false;
    };
    if last.opcode != "ret" {
        return false;
    }
    let call_pos = instrs.len() - 2;
    if !instrs[call_pos].is_call() {
        return false;
    }
    instrs[..call_pos]
        .iter()
        .all(|i| i.load_argument_slot().is_some())
}

fn scan_proxy_methods(
    types: &[&TypeDef],
    config: &AnalysisConfig,
    indicators: &mut Vec<ObfuscationIndicator>,
) -> usize {
    let mut count = 0;
    for t in types {
        for m in &t.methods {
            if is_proxy_method(m) {
                count += 1;
            }
        }
    }
    if count > config.proxy_method_threshold {
        indicators.push(ObfuscationIndicator {
            category: IndicatorCategory::ProxyMethods,
            severity: Severity::Medium,
            description: format!("{count} argument-forwarding proxy methods"),
            location: "module".to_string(),
            evidence: Vec::new(),
        });
    }
    count
}
