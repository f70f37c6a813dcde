//! LLM response parser for structured narrative output.
//!
//! The model is asked for JSON matching the `NarrativeResponse` schema but
//! routinely returns something else: JSON behind a `Scene #7:` label, JSON
//! inside a markdown code fence, truncated JSON, or plain prose. This
//! module turns any of that into a usable response without ever surfacing
//! raw structure to the player.
//!
//! Fallback chain:
//! 1. strict JSON parse
//! 2. strip a leading scene label, retry
//! 3. unwrap a fenced code block, retry
//! 4. per-field regex/scan recovery driven by `FIELD_TABLE` - every known
//!    schema field has an extraction rule here, so adding a field to the
//!    schema is a one-line table entry rather than a new code path
//! 5. scrub JSON syntax from the raw text so *something* readable remains
//!
//! Nothing in here returns an error; degraded parses are logged and the
//! caller gets the best narrative we could recover.

use regex_lite::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

use worldarch_protocol::{DebugInfo, NarrativeResponse};

/// Shown when no narrative text at all could be recovered.
pub const PLACEHOLDER_NARRATIVE: &str =
    "The story continues, though the details are hazy for a moment.";

/// Which step of the fallback chain produced the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStage {
    /// Input was valid JSON as-is.
    Strict,
    /// Valid JSON after removing a `Scene #N:` label.
    PrefixStripped,
    /// Valid JSON inside a markdown code fence.
    CodeFence,
    /// Recovered field-by-field from broken JSON.
    FieldExtraction,
    /// No fields recoverable; JSON syntax scrubbed from the raw text.
    PlainText,
}

impl ParseStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::PrefixStripped => "prefix_stripped",
            Self::CodeFence => "code_fence",
            Self::FieldExtraction => "field_extraction",
            Self::PlainText => "plain_text",
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::FieldExtraction | Self::PlainText)
    }
}

/// Result of parsing one raw LLM response.
///
/// `response.debug_info` is always `Some` here; stripping for non-debug
/// callers happens at the HTTP boundary, never inside the parser.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub response: NarrativeResponse,
    pub stage: ParseStage,
}

impl ParseOutcome {
    /// The state changes to merge after this turn. Never absent, possibly empty.
    pub fn state_updates(&self) -> &Map<String, Value> {
        static EMPTY: LazyLock<Map<String, Value>> = LazyLock::new(Map::new);
        self.response
            .debug_info
            .as_ref()
            .map(|d| &d.state_updates)
            .unwrap_or(&EMPTY)
    }

    /// Entity names the model claims to have mentioned. Never absent, possibly empty.
    pub fn entities_mentioned(&self) -> &[String] {
        self.response
            .debug_info
            .as_ref()
            .map(|d| d.entities_mentioned.as_slice())
            .unwrap_or(&[])
    }
}

static SCENE_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)^\s*scene\s*#\d+\s*:\s*").expect("valid regex"));

static CODE_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("valid regex"));

static STRING_LITERAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""((?:[^"\\]|\\.)*)""#).expect("valid regex"));

/// How a field's value is recovered on the field-extraction path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    /// JSON string value.
    Text,
    /// JSON array of strings.
    TextList,
    /// JSON object, recovered with a balanced-brace scan.
    Object,
}

/// Every known schema field and how to recover it. New schema fields are
/// added HERE so the fallback path can never silently drop them again.
const FIELD_TABLE: &[(&str, FieldKind)] = &[
    ("session_header", FieldKind::Text),
    ("resources", FieldKind::Text),
    ("location_confirmed", FieldKind::Text),
    ("dice_rolls", FieldKind::TextList),
    ("narrative", FieldKind::Text),
    ("planning_block", FieldKind::Text),
    ("god_mode_response", FieldKind::Text),
    ("dm_notes", FieldKind::TextList),
    ("entities_mentioned", FieldKind::TextList),
    ("state_rationale", FieldKind::Text),
    ("state_updates", FieldKind::Object),
    ("debug_info", FieldKind::Object),
];

/// Compiled extraction regexes, one per table entry.
static FIELD_PATTERNS: LazyLock<Vec<(&'static str, FieldKind, Regex)>> = LazyLock::new(|| {
    FIELD_TABLE
        .iter()
        .map(|&(name, kind)| {
            let pattern = match kind {
                FieldKind::Text => {
                    format!(r#""{name}"\s*:\s*"((?:[^"\\]|\\.)*)""#)
                }
                FieldKind::TextList => format!(r#""{name}"\s*:\s*\[([^\]]*)\]"#),
                // Object fields only need the opening position; the
                // balanced scan takes it from there.
                FieldKind::Object => format!(r#""{name}"\s*:\s*\{{"#),
            };
            (name, kind, Regex::new(&pattern).expect("valid regex"))
        })
        .collect()
});

/// Parse a raw LLM response into a `NarrativeResponse`, degrading through
/// the fallback chain instead of failing.
pub fn parse_narrative_response(raw: &str) -> ParseOutcome {
    let trimmed = raw.trim();

    // 1. Strict parse of the whole payload.
    if let Some(response) = try_strict_parse(trimmed) {
        return finish(response, ParseStage::Strict, raw);
    }

    // 2. Strip a leading scene label and retry.
    let unprefixed = SCENE_PREFIX_RE.replace(trimmed, "");
    if unprefixed != trimmed {
        if let Some(response) = try_strict_parse(unprefixed.trim()) {
            return finish(response, ParseStage::PrefixStripped, raw);
        }
    }

    // 3. Unwrap a markdown code fence (with or without the label) and retry.
    if let Some(caps) = CODE_FENCE_RE.captures(&unprefixed) {
        if let Some(inner) = caps.get(1) {
            if let Some(response) = try_strict_parse(inner.as_str().trim()) {
                return finish(response, ParseStage::CodeFence, raw);
            }
        }
    }

    // 4. Field-by-field recovery from broken JSON.
    if let Some(response) = extract_fields(&unprefixed) {
        return finish(response, ParseStage::FieldExtraction, raw);
    }

    // 5. Nothing structured recoverable - scrub the syntax and show what's left.
    let mut narrative = strip_json_syntax(&unprefixed);
    if narrative.is_empty() {
        narrative = PLACEHOLDER_NARRATIVE.to_string();
        tracing::error!(
            sample = %truncate_for_log(raw),
            "No narrative recoverable from LLM response, using placeholder"
        );
    }
    let response = NarrativeResponse {
        narrative,
        debug_info: Some(DebugInfo::default()),
        ..Default::default()
    };
    finish(response, ParseStage::PlainText, raw)
}

fn finish(mut response: NarrativeResponse, stage: ParseStage, raw: &str) -> ParseOutcome {
    if response.debug_info.is_none() {
        response.debug_info = Some(DebugInfo::default());
    }
    if stage.is_degraded() {
        tracing::warn!(
            stage = stage.as_str(),
            sample = %truncate_for_log(raw),
            "LLM response required degraded parsing"
        );
    }
    ParseOutcome { response, stage }
}

fn truncate_for_log(raw: &str) -> String {
    raw.chars().take(200).collect()
}

// =============================================================================
// Strict path
// =============================================================================

fn try_strict_parse(text: &str) -> Option<NarrativeResponse> {
    if !text.starts_with('{') {
        return None;
    }
    let value: Value = serde_json::from_str(text).ok()?;
    Some(normalize_value(value))
}

/// Convert an arbitrary parsed JSON value into the response shape,
/// coercing malformed fields to safe defaults instead of failing.
fn normalize_value(value: Value) -> NarrativeResponse {
    let mut obj = match value {
        Value::Object(obj) => obj,
        other => {
            tracing::warn!(
                value_type = json_type_name(&other),
                "LLM response parsed as non-object JSON"
            );
            return NarrativeResponse::default();
        }
    };

    let mut debug = match obj.remove("debug_info") {
        Some(Value::Object(debug_obj)) => normalize_debug_info(debug_obj),
        Some(other) if !other.is_null() => {
            tracing::warn!(
                value_type = json_type_name(&other),
                "debug_info is not an object, dropping"
            );
            DebugInfo::default()
        }
        _ => DebugInfo::default(),
    };

    // `entities_mentioned` and `state_updates` are canonically inside
    // debug_info, but models regularly emit them at the top level too.
    // Fold those in rather than losing them.
    if let Some(value) = obj.remove("entities_mentioned") {
        for name in coerce_string_list(value, "entities_mentioned") {
            if !debug.entities_mentioned.contains(&name) {
                debug.entities_mentioned.push(name);
            }
        }
    }
    if let Some(value) = obj.remove("state_updates") {
        for (key, update) in coerce_object(value, "state_updates") {
            debug.state_updates.entry(key).or_insert(update);
        }
    }
    if let Some(value) = obj.remove("dm_notes") {
        debug.dm_notes.extend(coerce_string_list(value, "dm_notes"));
    }

    NarrativeResponse {
        session_header: coerce_string(obj.remove("session_header"), "session_header"),
        resources: coerce_string(obj.remove("resources"), "resources"),
        location_confirmed: coerce_string(obj.remove("location_confirmed"), "location_confirmed"),
        dice_rolls: obj
            .remove("dice_rolls")
            .map(|v| coerce_string_list(v, "dice_rolls"))
            .unwrap_or_default(),
        narrative: coerce_string(obj.remove("narrative"), "narrative"),
        planning_block: coerce_string(obj.remove("planning_block"), "planning_block"),
        god_mode_response: match obj.remove("god_mode_response") {
            Some(Value::String(s)) => Some(s),
            Some(Value::Null) | None => None,
            Some(other) => {
                tracing::warn!(
                    value_type = json_type_name(&other),
                    "god_mode_response is not a string, dropping"
                );
                None
            }
        },
        debug_info: Some(debug),
    }
}

fn normalize_debug_info(mut obj: Map<String, Value>) -> DebugInfo {
    DebugInfo {
        dm_notes: obj
            .remove("dm_notes")
            .map(|v| coerce_string_list(v, "dm_notes"))
            .unwrap_or_default(),
        entities_mentioned: obj
            .remove("entities_mentioned")
            .map(|v| coerce_string_list(v, "entities_mentioned"))
            .unwrap_or_default(),
        state_rationale: coerce_string(obj.remove("state_rationale"), "state_rationale"),
        state_updates: obj
            .remove("state_updates")
            .map(|v| coerce_object(v, "state_updates"))
            .unwrap_or_default(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn coerce_string(value: Option<Value>, field: &str) -> String {
    match value {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => String::new(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => {
            tracing::warn!(
                field,
                value_type = json_type_name(&other),
                "Expected string field, coercing to empty"
            );
            String::new()
        }
    }
}

fn coerce_string_list(value: Value, field: &str) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                Value::Number(n) => Some(n.to_string()),
                Value::Null => None,
                other => {
                    tracing::warn!(
                        field,
                        value_type = json_type_name(&other),
                        "Dropping non-string list entry"
                    );
                    None
                }
            })
            .collect(),
        Value::String(s) if !s.is_empty() => vec![s],
        Value::Null | Value::String(_) => Vec::new(),
        other => {
            tracing::warn!(
                field,
                value_type = json_type_name(&other),
                "Expected list field, coercing to empty"
            );
            Vec::new()
        }
    }
}

/// Coerce a value that must be a JSON object. Anything else becomes an
/// empty map with a warning - a bare string slipping into `state_updates`
/// must not propagate downstream.
fn coerce_object(value: Value, field: &str) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            tracing::warn!(
                field,
                value_type = json_type_name(&other),
                "Expected object field, coercing to empty"
            );
            Map::new()
        }
    }
}

// =============================================================================
// Field-extraction path
// =============================================================================

/// Recover whatever fields survive in broken JSON. Returns `None` only if
/// not a single field was found.
fn extract_fields(raw: &str) -> Option<NarrativeResponse> {
    let mut found_any = false;
    let mut response = NarrativeResponse::default();
    let mut debug = DebugInfo::default();
    let mut top_level_entities: Vec<String> = Vec::new();
    let mut top_level_updates = Map::new();

    for (name, kind, regex) in FIELD_PATTERNS.iter() {
        match kind {
            FieldKind::Text => {
                let Some(caps) = regex.captures(raw) else {
                    continue;
                };
                let Some(m) = caps.get(1) else { continue };
                let text = unescape_json_string(m.as_str());
                found_any = true;
                match *name {
                    "session_header" => response.session_header = text,
                    "resources" => response.resources = text,
                    "location_confirmed" => response.location_confirmed = text,
                    "narrative" => response.narrative = text,
                    "planning_block" => response.planning_block = text,
                    "god_mode_response" => response.god_mode_response = Some(text),
                    "state_rationale" => debug.state_rationale = text,
                    _ => {}
                }
            }
            FieldKind::TextList => {
                let Some(caps) = regex.captures(raw) else {
                    continue;
                };
                let Some(m) = caps.get(1) else { continue };
                let items: Vec<String> = STRING_LITERAL_RE
                    .captures_iter(m.as_str())
                    .filter_map(|c| c.get(1).map(|s| unescape_json_string(s.as_str())))
                    .collect();
                found_any = true;
                match *name {
                    "dice_rolls" => response.dice_rolls = items,
                    "dm_notes" => debug.dm_notes = items,
                    "entities_mentioned" => top_level_entities = items,
                    _ => {}
                }
            }
            FieldKind::Object => {
                let Some(m) = regex.find(raw) else { continue };
                // The regex match ends at the opening brace.
                let brace_at = m.end() - 1;
                let Some(object_text) = scan_balanced_object(raw, brace_at) else {
                    continue;
                };
                let Ok(value) = serde_json::from_str::<Value>(object_text) else {
                    tracing::warn!(field = *name, "Recovered object snippet is not valid JSON");
                    continue;
                };
                found_any = true;
                match *name {
                    "state_updates" => top_level_updates = coerce_object(value, "state_updates"),
                    "debug_info" => {
                        if let Value::Object(obj) = value {
                            let nested = normalize_debug_info(obj);
                            // Prefer the explicit debug_info block but keep
                            // anything already collected that it lacks.
                            if !nested.dm_notes.is_empty() {
                                debug.dm_notes = nested.dm_notes;
                            }
                            if !nested.entities_mentioned.is_empty() {
                                debug.entities_mentioned = nested.entities_mentioned;
                            }
                            if !nested.state_rationale.is_empty() {
                                debug.state_rationale = nested.state_rationale;
                            }
                            if !nested.state_updates.is_empty() {
                                debug.state_updates = nested.state_updates;
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    if !found_any {
        return None;
    }

    for name in top_level_entities {
        if !debug.entities_mentioned.contains(&name) {
            debug.entities_mentioned.push(name);
        }
    }
    for (key, update) in top_level_updates {
        debug.state_updates.entry(key).or_insert(update);
    }

    if response.narrative.is_empty() {
        // Other fields survived but the narrative did not; show the
        // scrubbed text rather than raw structure.
        response.narrative = strip_json_syntax(raw);
        if response.narrative.is_empty() {
            response.narrative = PLACEHOLDER_NARRATIVE.to_string();
        }
    }

    response.debug_info = Some(debug);
    Some(response)
}

/// Find the matching close brace for the object opening at `start`,
/// respecting JSON string literals and escapes. Returns the full
/// `{...}` slice, or `None` if the object is truncated.
fn scan_balanced_object(raw: &str, start: usize) -> Option<&str> {
    let bytes = raw.as_bytes();
    if bytes.get(start) != Some(&b'{') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, byte) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if *byte == b'\\' {
                escaped = true;
            } else if *byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Undo JSON string escaping on regex-recovered text.
fn unescape_json_string(escaped: &str) -> String {
    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => out.push('\u{FFFD}'),
                }
            }
            Some(other) => {
                // Unknown escape, keep it readable.
                out.push(other);
            }
            None => {}
        }
    }

    out
}

// =============================================================================
// Last-resort scrub
// =============================================================================

static FIELD_NAME_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    let names = FIELD_TABLE
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r#""(?:{names})"\s*:\s*"#)).expect("valid regex")
});

/// Remove JSON structure from text that refused every parse, leaving the
/// prose. Guarantees no braces, brackets, or field-name tokens survive.
fn strip_json_syntax(raw: &str) -> String {
    let without_fields = FIELD_NAME_TOKEN_RE.replace_all(raw, "");
    let unescaped = unescape_json_string(&without_fields);

    let cleaned: String = unescaped
        .chars()
        .filter(|c| !matches!(c, '{' | '}' | '[' | ']' | '"'))
        .collect();

    cleaned
        .lines()
        .map(|line| line.trim().trim_end_matches(','))
        .filter(|line| !line.is_empty() && *line != ",")
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clean_json_parses_strict() {
        let raw = json!({
            "session_header": "Session 4",
            "resources": "HP 10/12, Gold 3",
            "location_confirmed": "Great Hall",
            "dice_rolls": ["d20: 14"],
            "narrative": "You enter the hall.",
            "planning_block": "1. Search\n2. Leave",
            "debug_info": {
                "dm_notes": ["cautious player"],
                "entities_mentioned": ["Cassian"],
                "state_rationale": "moved rooms",
                "state_updates": {"location": "great_hall"}
            }
        })
        .to_string();

        let outcome = parse_narrative_response(&raw);

        assert_eq!(outcome.stage, ParseStage::Strict);
        assert_eq!(outcome.response.narrative, "You enter the hall.");
        assert_eq!(outcome.response.dice_rolls, vec!["d20: 14"]);
        assert_eq!(outcome.entities_mentioned(), ["Cassian"]);
        assert_eq!(
            outcome.state_updates().get("location"),
            Some(&json!("great_hall"))
        );
    }

    #[test]
    fn test_clean_pass_leaves_no_artifacts() {
        let raw = json!({"narrative": "A quiet night at the inn."}).to_string();
        let outcome = parse_narrative_response(&raw);

        assert!(!outcome.response.narrative.contains('{'));
        assert!(!outcome.response.narrative.contains('}'));
        assert!(!outcome.response.narrative.contains("\"narrative\":"));
        assert_eq!(outcome.response.narrative, "A quiet night at the inn.");
    }

    #[test]
    fn test_scene_prefix_variants_parse_identically() {
        let body = json!({"narrative": "The gate creaks open."}).to_string();
        let bare = parse_narrative_response(&body);

        for prefix in ["Scene #1: ", "scene  #42:", "Scene#7:"] {
            let outcome = parse_narrative_response(&format!("{prefix}{body}"));
            assert_eq!(outcome.stage, ParseStage::PrefixStripped, "prefix {prefix:?}");
            assert_eq!(outcome.response, bare.response, "prefix {prefix:?}");
        }
    }

    #[test]
    fn test_code_fence_unwrapped() {
        let raw = format!(
            "```json\n{}\n```",
            json!({"narrative": "Rain hammers the roof."})
        );
        let outcome = parse_narrative_response(&raw);

        assert_eq!(outcome.stage, ParseStage::CodeFence);
        assert_eq!(outcome.response.narrative, "Rain hammers the roof.");
    }

    #[test]
    fn test_prefixed_fence_unwrapped() {
        let raw = format!(
            "Scene #3: ```json\n{}\n```",
            json!({"narrative": "Dust swirls."})
        );
        let outcome = parse_narrative_response(&raw);

        assert_eq!(outcome.stage, ParseStage::CodeFence);
        assert_eq!(outcome.response.narrative, "Dust swirls.");
    }

    #[test]
    fn test_truncated_json_keeps_all_fields_before_the_break() {
        // Regression test: the fallback path used to recover only the
        // narrative and silently drop everything else.
        let raw = r#"Scene #7: {"narrative": "The guard slumps.", "god_mode_response": "Guard removed from play.", "debug_info": {"state_updates": {"npc_guard_003": "__DELETE__"}, "entities_mentioned": ["Guard"]"#;

        let outcome = parse_narrative_response(raw);

        assert_eq!(outcome.stage, ParseStage::FieldExtraction);
        assert_eq!(outcome.response.narrative, "The guard slumps.");
        assert_eq!(
            outcome.response.god_mode_response.as_deref(),
            Some("Guard removed from play.")
        );
        assert_eq!(
            outcome.state_updates().get("npc_guard_003"),
            Some(&json!("__DELETE__"))
        );
    }

    #[test]
    fn test_prefixed_response_with_top_level_fields() {
        let raw = r#"Scene #2: {"narrative": "You enter the hall.", "god_mode_response": "", "entities_mentioned": ["Mark"], "debug_info": {"state_updates": {"hp": 10}}}"#;

        let outcome = parse_narrative_response(raw);

        assert_eq!(outcome.response.narrative, "You enter the hall.");
        assert_eq!(outcome.entities_mentioned(), ["Mark"]);
        assert_eq!(outcome.state_updates().get("hp"), Some(&json!(10)));
        assert!(!outcome.response.narrative.contains("Scene #2:"));
        assert!(!outcome.response.narrative.contains('{'));
        assert!(!outcome.response.narrative.contains('"'));
    }

    #[test]
    fn test_escaped_text_recovered_verbatim() {
        let raw = r#"{"narrative": "She said \"run\".\nYou run.", "planning_block": "1. Keep running"#;
        let outcome = parse_narrative_response(raw);

        assert_eq!(outcome.stage, ParseStage::FieldExtraction);
        assert_eq!(outcome.response.narrative, "She said \"run\".\nYou run.");
    }

    #[test]
    fn test_state_updates_wrong_type_coerced_to_empty() {
        let raw = json!({
            "narrative": "Nothing changes.",
            "debug_info": {"state_updates": "oops, a string"}
        })
        .to_string();

        let outcome = parse_narrative_response(&raw);

        assert_eq!(outcome.stage, ParseStage::Strict);
        assert!(outcome.state_updates().is_empty());
        assert_eq!(outcome.response.narrative, "Nothing changes.");
    }

    #[test]
    fn test_plain_prose_passes_through() {
        let raw = "The innkeeper waves you toward an empty table by the fire.";
        let outcome = parse_narrative_response(raw);

        assert_eq!(outcome.stage, ParseStage::PlainText);
        assert_eq!(outcome.response.narrative, raw);
        assert!(outcome.state_updates().is_empty());
        assert!(outcome.entities_mentioned().is_empty());
    }

    #[test]
    fn test_garbage_json_degrades_to_readable_text() {
        let raw = "{\"narrative\" \"The door is locked. broken json here";
        let outcome = parse_narrative_response(raw);

        assert_eq!(outcome.stage, ParseStage::PlainText);
        assert!(!outcome.response.narrative.contains('{'));
        assert!(!outcome.response.narrative.contains('"'));
        assert!(outcome.response.narrative.contains("The door is locked."));
    }

    #[test]
    fn test_empty_input_yields_placeholder() {
        let outcome = parse_narrative_response("   ");

        assert_eq!(outcome.stage, ParseStage::PlainText);
        assert_eq!(outcome.response.narrative, PLACEHOLDER_NARRATIVE);
    }

    #[test]
    fn test_every_schema_field_has_an_extraction_rule() {
        // Guards the field-loss bug class: a field present in the wire
        // schema but missing from FIELD_TABLE would silently vanish on
        // the fallback path.
        let schema = serde_json::to_value(NarrativeResponse {
            god_mode_response: Some(String::new()),
            debug_info: Some(DebugInfo::default()),
            ..Default::default()
        })
        .expect("serializes");
        let top_level: Vec<&str> = schema
            .as_object()
            .expect("object")
            .keys()
            .map(String::as_str)
            .collect();

        for field in top_level {
            assert!(
                FIELD_TABLE.iter().any(|(name, _)| *name == field),
                "schema field '{field}' has no extraction rule"
            );
        }
    }

    #[test]
    fn test_truncated_object_is_not_recovered_partially() {
        // state_updates is cut mid-object; the scan must not return a
        // mangled fragment.
        let raw = r#"{"narrative": "Fine.", "debug_info": {"state_updates": {"hp": 1"#;
        let outcome = parse_narrative_response(raw);

        assert_eq!(outcome.response.narrative, "Fine.");
        assert!(outcome.state_updates().is_empty());
    }

    #[test]
    fn test_dice_rolls_and_dm_notes_recovered_from_broken_json() {
        let raw = r#"{"dice_rolls": ["d20: 3", "d6: 5"], "narrative": "You fumble.", "debug_info": {"dm_notes": ["bad luck"], "state_rationale": "failed check""#;
        let outcome = parse_narrative_response(raw);

        assert_eq!(outcome.stage, ParseStage::FieldExtraction);
        assert_eq!(outcome.response.dice_rolls, vec!["d20: 3", "d6: 5"]);
        let debug = outcome.response.debug_info.as_ref().expect("debug info");
        assert_eq!(debug.dm_notes, vec!["bad luck"]);
        assert_eq!(debug.state_rationale, "failed check");
    }

    #[test]
    fn test_unescape_handles_unicode() {
        assert_eq!(unescape_json_string(r"café"), "café");
        assert_eq!(unescape_json_string(r"a\\b\nc"), "a\\b\nc");
        assert_eq!(unescape_json_string(r"bad\uZZZZ"), "bad\u{FFFD}");
    }

    #[test]
    fn test_balanced_scan_ignores_braces_in_strings() {
        let raw = r#"{"note": "a { tricky } string", "inner": {"x": 1}}"#;
        let scanned = scan_balanced_object(raw, 0).expect("balanced");
        assert_eq!(scanned, raw);
    }
}
