/// Value Comparator - Structural Equality for Grading
///
/// **Rules (applied in order):**
/// 1. Strict primitive equality (`undefined`, `null`, booleans, numbers, strings)
/// 2. NaN equals NaN
/// 3. A primitive never equals a composite
/// 4. Composites: same enumerable key set (array holes are absent keys, named
///    array properties are keys), and every key's value equal
/// 5. Arrays additionally: same length, every element equal
/// 6. An array never equals a non-array
///
/// Comparison recurses without reference identity. Past `MAX_COMPARE_DEPTH`
/// levels the values are reported unequal instead of recursing further.
use crate::value::{OpaqueKind, Value};
use std::collections::HashMap;
use tracing::warn;

pub const MAX_COMPARE_DEPTH: usize = 512;

/// Deep equality between two decoded values.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    equal_at(a, b, 0)
}

fn equal_at(a: &Value, b: &Value, depth: usize) -> bool {
    if depth > MAX_COMPARE_DEPTH {
        warn!(max_depth = MAX_COMPARE_DEPTH, "Comparison depth exceeded; treating values as unequal");
        return false;
    }

    if strict_equal(a, b) {
        return true;
    }

    if a.is_nan() && b.is_nan() {
        return true;
    }

    if !a.is_composite() || !b.is_composite() {
        return false;
    }

    // Enumerable key set: same cardinality, every key of `a` present in `b`
    let left = a.entries();
    let right_entries = b.entries();
    let right: HashMap<&str, &Value> = right_entries.iter().map(|(k, v)| (&**k, *v)).collect();
    if left.len() != right.len() || left.iter().any(|(key, _)| !right.contains_key(&**key)) {
        return false;
    }

    // Sequence rule on top of the key set
    match (a, b) {
        (Value::Array { items: l, .. }, Value::Array { items: r, .. }) => {
            if l.len() != r.len() {
                return false;
            }
        }
        (Value::Array { .. }, _) | (_, Value::Array { .. }) => return false,
        _ => {}
    }

    // Index keys are compared positionally, named keys by name
    left.iter()
        .all(|(key, l)| right.get(&**key).map_or(false, |r| equal_at(l, r, depth + 1)))
}

/// Primitive `===`. Composites have no identity here, so they never match.
fn strict_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined, Value::Undefined) => true,
        (Value::Hole, Value::Hole) => true,
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (
            Value::Opaque { kind: OpaqueKind::BigInt, text: x },
            Value::Opaque { kind: OpaqueKind::BigInt, text: y },
        ) => x == y,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::format_value;
    use crate::value::decode;

    fn v(text: &str) -> Value {
        decode(text).expect("test values are non-empty")
    }

    fn obj(entries: &[(&str, Value)]) -> Value {
        Value::Object(entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect())
    }

    #[test]
    fn test_primitives() {
        assert!(values_equal(&v("5"), &v("5.0")));
        assert!(values_equal(&v("\"a\""), &v("\"a\"")));
        assert!(values_equal(&v("true"), &v("true")));
        assert!(values_equal(&Value::Undefined, &Value::Undefined));
        assert!(!values_equal(&v("5"), &v("\"5\"")));
        assert!(!values_equal(&v("0"), &v("false")));
        assert!(values_equal(&Value::Number(0.0), &Value::Number(-0.0)));
    }

    #[test]
    fn test_undefined_is_not_null() {
        assert!(!values_equal(&Value::Undefined, &Value::Null));
        assert!(!values_equal(&Value::Null, &Value::Undefined));
    }

    #[test]
    fn test_nan_is_reflexive() {
        let nan = Value::Number(f64::NAN);
        assert!(values_equal(&nan, &nan));
        assert!(values_equal(&nan, &Value::Number(f64::NAN)));
        assert!(!values_equal(&nan, &Value::Number(0.0)));
        assert!(!values_equal(&Value::Number(0.0), &nan));
    }

    #[test]
    fn test_primitive_vs_composite() {
        assert!(!values_equal(&v("[]"), &v("0")));
        assert!(!values_equal(&Value::Null, &v("{}")));
        assert!(!values_equal(&v("\"\""), &v("[]")));
    }

    #[test]
    fn test_empty_composites() {
        assert!(values_equal(&v("[]"), &v("[]")));
        assert!(values_equal(&v("{}"), &v("{}")));
        assert!(!values_equal(&v("[]"), &v("{}")));
    }

    #[test]
    fn test_array_vs_object_with_same_keys() {
        let array = v("[1,2]");
        let object = obj(&[("0", Value::Number(1.0)), ("1", Value::Number(2.0))]);
        assert!(!values_equal(&array, &object));
        assert!(!values_equal(&object, &array));
    }

    #[test]
    fn test_arrays() {
        assert!(values_equal(&v("[1,[2,3]]"), &v("[1,[2,3]]")));
        assert!(!values_equal(&v("[1,2]"), &v("[2,1]")));
        assert!(!values_equal(&v("[1,2]"), &v("[1,2,3]")));
        assert!(!values_equal(&v("[null]"), &Value::array(vec![Value::Undefined])));
    }

    #[test]
    fn test_objects_ignore_key_order() {
        let a = obj(&[("x", Value::Number(1.0)), ("y", Value::Number(2.0))]);
        let b = obj(&[("y", Value::Number(2.0)), ("x", Value::Number(1.0))]);
        assert!(values_equal(&a, &b));
    }

    #[test]
    fn test_objects_differ() {
        assert!(!values_equal(&v(r#"{"a":1}"#), &v(r#"{"a":1,"b":2}"#)));
        assert!(!values_equal(&v(r#"{"a":1}"#), &v(r#"{"b":1}"#)));
        assert!(!values_equal(&v(r#"{"a":{"b":[1]}}"#), &v(r#"{"a":{"b":[2]}}"#)));
    }

    #[test]
    fn test_undefined_member_still_counts_as_key() {
        let with_undefined = obj(&[("a", Value::Undefined)]);
        assert!(!values_equal(&with_undefined, &v("{}")));
        assert!(values_equal(&with_undefined, &obj(&[("a", Value::Undefined)])));
    }

    #[test]
    fn test_deeply_nested_mixed() {
        let text = r#"{"users":[{"name":"ada","tags":["x",{"k":null}]},{"name":"bob","tags":[]}],"n":1.25}"#;
        assert!(values_equal(&v(text), &v(text)));
    }

    #[test]
    fn test_recursion_guard() {
        let mut deep = Value::Number(1.0);
        for _ in 0..(MAX_COMPARE_DEPTH + 8) {
            deep = Value::array(vec![deep]);
        }
        assert!(!values_equal(&deep, &deep.clone()));
    }

    #[test]
    fn test_array_named_properties_count_as_keys() {
        let tagged = Value::Array {
            items: vec![Value::Number(1.0), Value::Number(2.0)],
            props: vec![("extra".to_string(), Value::Number(3.0))],
        };
        assert!(!values_equal(&tagged, &v("[1,2]")));
        assert!(!values_equal(&v("[1,2]"), &tagged));
        assert!(values_equal(&tagged, &tagged.clone()));

        let other_tag = Value::Array {
            items: vec![Value::Number(1.0), Value::Number(2.0)],
            props: vec![("extra".to_string(), Value::Number(4.0))],
        };
        assert!(!values_equal(&tagged, &other_tag));
    }

    #[test]
    fn test_holes_are_missing_keys() {
        let sparse = Value::array(vec![Value::Number(1.0), Value::Hole, Value::Number(3.0)]);
        let dense = Value::array(vec![Value::Number(1.0), Value::Undefined, Value::Number(3.0)]);
        assert!(!values_equal(&sparse, &dense));
        assert!(values_equal(&sparse, &sparse.clone()));

        // same key set {0}, different lengths
        let trailing_hole = Value::array(vec![Value::Number(1.0), Value::Hole]);
        assert!(!values_equal(&trailing_hole, &v("[1]")));
    }

    #[test]
    fn test_wide_object_comparison() {
        let wide: String = format!(
            "{{{}}}",
            (0..20_000).map(|i| format!("\"k{}\":{}", i, i)).collect::<Vec<_>>().join(",")
        );
        assert!(values_equal(&v(&wide), &v(&wide)));
    }

    #[test]
    fn test_circular_never_equal() {
        assert!(!values_equal(&Value::Circular, &Value::Circular));
    }

    #[test]
    fn test_format_then_decode_roundtrip() {
        let samples = [
            r#"{"a":[1,2,{"b":"c"}],"d":null,"e":true}"#,
            "[[],[[]],{}]",
            r#"[0.5,-3,"text with \"quotes\""]"#,
        ];

        for text in samples {
            let original = v(text);
            let redecoded = v(&format_value(&original));
            assert!(values_equal(&redecoded, &original), "roundtrip failed for {}", text);
        }
    }
}
