//! Decoded values exchanged with submissions.
//!
//! Test case text is decoded into [`Value`] before invocation, and whatever
//! the routine returns comes back from the runtime as a [`Value`] as well.
//! The model follows the scripting dialect's data model closely enough for
//! grading: `undefined` and `null` are distinct, numbers are `f64` (so NaN and
//! the infinities exist), objects keep their key order for display, and
//! arrays keep their holes and any extra named properties.

use serde::Deserialize;
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

/// Deepest composite nesting a value may have, in either direction.
pub const MAX_VALUE_DEPTH: usize = 512;

#[derive(Debug, Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    /// Elements (holes included) plus own enumerable non-index properties
    Array { items: Vec<Value>, props: Vec<(String, Value)> },
    /// Own enumerable properties, in the runtime's key order
    Object(Vec<(String, Value)>),
    /// Values with no structured form (bigints, functions, symbols)
    Opaque { kind: OpaqueKind, text: String },
    /// Back-reference to an enclosing composite
    Circular,
    /// Missing element of a sparse array; only ever an array item
    Hole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpaqueKind {
    BigInt,
    Function,
    Symbol,
}

/// Why a value has no JSON rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SerializeError {
    #[error("value contains a circular reference")]
    Circular,
    #[error("value contains a bigint")]
    BigInt,
    #[error("value has no JSON representation")]
    Unrepresentable,
}

/// Decode test case text into a value.
///
/// Empty text means "no value supplied" and yields `None`. Anything that is
/// valid JSON nested at most [`MAX_VALUE_DEPTH`] levels decodes structurally;
/// everything else is taken verbatim as a string.
pub fn decode(text: &str) -> Option<Value> {
    if text.is_empty() {
        return None;
    }

    if nesting_depth(text) > MAX_VALUE_DEPTH {
        return Some(Value::String(text.to_string()));
    }

    match parse_json(text) {
        Ok(json) => Some(Value::from(json)),
        Err(_) => Some(Value::String(text.to_string())),
    }
}

/// serde_json's own recursion cap is far below `MAX_VALUE_DEPTH`, so depth is
/// bounded by `nesting_depth` instead.
fn parse_json(text: &str) -> serde_json::Result<serde_json::Value> {
    let mut deserializer = serde_json::Deserializer::from_str(text);
    deserializer.disable_recursion_limit();
    let json = serde_json::Value::deserialize(&mut deserializer)?;
    deserializer.end()?;
    Ok(json)
}

/// Deepest bracket nesting outside string literals.
fn nesting_depth(text: &str) -> usize {
    let mut depth = 0usize;
    let mut deepest = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for byte in text.bytes() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }

    deepest
}

impl Value {
    /// A dense array with no extra properties.
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array { items, props: Vec::new() }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, Value::Array { .. } | Value::Object(_))
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, Value::Number(n) if n.is_nan())
    }

    /// Own enumerable properties of a composite, keyed the way the runtime
    /// enumerates them: array indices (holes skipped), then named properties.
    pub fn entries(&self) -> Vec<(Cow<'_, str>, &Value)> {
        match self {
            Value::Array { items, props } => items
                .iter()
                .enumerate()
                .filter(|(_, item)| !matches!(item, Value::Hole))
                .map(|(idx, item)| (Cow::Owned(idx.to_string()), item))
                .chain(props.iter().map(|(k, v)| (Cow::Borrowed(k.as_str()), v)))
                .collect(),
            Value::Object(entries) => entries.iter().map(|(k, v)| (Cow::Borrowed(k.as_str()), v)).collect(),
            _ => Vec::new(),
        }
    }

    /// Render as JSON, following `JSON.stringify` rules: non-finite numbers
    /// become `null`, `undefined`/functions/symbols/holes become `null` inside
    /// arrays and are dropped from objects, and named array properties are
    /// not written.
    pub fn to_json(&self) -> Result<serde_json::Value, SerializeError> {
        self.json_member()?.ok_or(SerializeError::Unrepresentable)
    }

    fn json_member(&self) -> Result<Option<serde_json::Value>, SerializeError> {
        use serde_json::Value as Json;

        let json = match self {
            Value::Undefined | Value::Hole => return Ok(None),
            Value::Opaque { kind: OpaqueKind::BigInt, .. } => return Err(SerializeError::BigInt),
            Value::Opaque { .. } => return Ok(None),
            Value::Circular => return Err(SerializeError::Circular),
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::String(s) => Json::String(s.clone()),
            Value::Array { items, .. } => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(item.json_member()?.unwrap_or(Json::Null));
                }
                Json::Array(out)
            }
            Value::Object(entries) => {
                let mut map = serde_json::Map::new();
                for (key, value) in entries {
                    if let Some(json) = value.json_member()? {
                        map.insert(key.clone(), json);
                    }
                }
                Json::Object(map)
            }
        };

        Ok(Some(json))
    }

    /// String coercion as the runtime would do it (`String(value)`).
    pub fn coerce_to_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => js_number_text(*n),
            Value::String(s) => s.clone(),
            Value::Array { items, .. } => items
                .iter()
                .map(|item| match item {
                    Value::Undefined | Value::Null | Value::Circular | Value::Hole => String::new(),
                    other => other.coerce_to_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) => "[object Object]".to_string(),
            Value::Opaque { text, .. } => text.clone(),
            Value::Circular | Value::Hole => String::new(),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::array(items.into_iter().map(Value::from).collect()),
            Json::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::formatter::format_value(self))
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    if !n.is_finite() {
        return serde_json::Value::Null;
    }
    if n.fract() == 0.0 && n.abs() < 9.0e18 {
        return serde_json::Value::from(n as i64);
    }
    serde_json::Number::from_f64(n)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

/// Number text as the runtime prints it: integral values below 1e21 in full,
/// shortest round-trip digits otherwise, and exponents always signed.
pub(crate) fn js_number_text(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        let name = if n > 0.0 { "Infinity" } else { "-Infinity" };
        return name.to_string();
    }
    if n.fract() == 0.0 && n.abs() < 1e21 {
        return format!("{}", n as i128);
    }

    let text = serde_json::Number::from_f64(n)
        .map(|num| num.to_string())
        .unwrap_or_else(|| n.to_string());
    match text.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => format!("{}e+{}", mantissa, exponent),
        _ => text,
    }
}

/// One node of the flat value table written by the runtime harness.
/// Composites refer to their children by index.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub(crate) enum WireNode {
    Undefined,
    Null,
    Hole,
    Boolean {
        value: bool,
    },
    Number {
        value: WireNumber,
    },
    String {
        value: String,
    },
    Array {
        items: Vec<usize>,
        #[serde(default)]
        props: Vec<(String, usize)>,
    },
    Object {
        entries: Vec<(String, usize)>,
    },
    Bigint {
        text: String,
    },
    Function {
        text: String,
    },
    Symbol {
        text: String,
    },
    Circular,
}

/// Finite numbers travel as JSON numbers, the rest by name.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum WireNumber {
    Finite(f64),
    Named(String),
}

/// Why a node table does not describe a value tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("result envelope carries no value")]
    Empty,
    #[error("result node {0} is missing or referenced more than once")]
    BadReference(usize),
    #[error("Returned value is nested more than {0} levels deep")]
    TooDeep(usize),
}

/// Rebuild the tree rooted at node 0. Each node may be used once, so a
/// malformed table can neither loop nor fan out.
pub(crate) fn from_wire(nodes: Vec<WireNode>) -> Result<Value, WireError> {
    if nodes.is_empty() {
        return Err(WireError::Empty);
    }
    let mut slots: Vec<Option<WireNode>> = nodes.into_iter().map(Some).collect();
    take_node(&mut slots, 0, 0)
}

fn take_node(slots: &mut [Option<WireNode>], idx: usize, depth: usize) -> Result<Value, WireError> {
    let node = slots
        .get_mut(idx)
        .and_then(Option::take)
        .ok_or(WireError::BadReference(idx))?;

    let value = match node {
        WireNode::Undefined => Value::Undefined,
        WireNode::Null => Value::Null,
        WireNode::Hole => Value::Hole,
        WireNode::Boolean { value } => Value::Bool(value),
        WireNode::Number { value: WireNumber::Finite(n) } => Value::Number(n),
        WireNode::Number { value: WireNumber::Named(name) } => Value::Number(match name.as_str() {
            "Infinity" => f64::INFINITY,
            "-Infinity" => f64::NEG_INFINITY,
            _ => f64::NAN,
        }),
        WireNode::String { value } => Value::String(value),
        WireNode::Bigint { text } => Value::Opaque { kind: OpaqueKind::BigInt, text },
        WireNode::Function { text } => Value::Opaque { kind: OpaqueKind::Function, text },
        WireNode::Symbol { text } => Value::Opaque { kind: OpaqueKind::Symbol, text },
        WireNode::Circular => Value::Circular,
        WireNode::Array { items, props } => {
            if depth >= MAX_VALUE_DEPTH {
                return Err(WireError::TooDeep(MAX_VALUE_DEPTH));
            }
            let items = items
                .into_iter()
                .map(|child| take_node(slots, child, depth + 1))
                .collect::<Result<Vec<_>, _>>()?;
            let props = take_entries(slots, props, depth + 1)?;
            Value::Array { items, props }
        }
        WireNode::Object { entries } => {
            if depth >= MAX_VALUE_DEPTH {
                return Err(WireError::TooDeep(MAX_VALUE_DEPTH));
            }
            Value::Object(take_entries(slots, entries, depth + 1)?)
        }
    };

    Ok(value)
}

fn take_entries(
    slots: &mut [Option<WireNode>],
    entries: Vec<(String, usize)>,
    depth: usize,
) -> Result<Vec<(String, Value)>, WireError> {
    entries
        .into_iter()
        .map(|(key, child)| take_node(slots, child, depth).map(|value| (key, value)))
        .collect()
}
