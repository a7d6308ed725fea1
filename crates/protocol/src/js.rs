//! Value encoding for `evaluateExpression` calls.
//!
//! JavaScript values cross the wire in a tagged form rather than plain JSON:
//! `{"s": "text"}` for strings, `{"n": 3}` for numbers, `{"b": true}` for
//! booleans, `{"v": "null"}` for null-like sentinels, `{"a": [...]}` for
//! arrays and `{"o": [{"k": ..., "v": ...}]}` for objects. [`to_wire`] and
//! [`from_wire`] convert between that form and `serde_json::Value`.

use serde_json::{Map, Value, json};

/// Encodes a JSON value into the tagged wire representation.
pub fn to_wire(value: &Value) -> Value {
	match value {
		Value::Null => json!({"v": "null"}),
		Value::Bool(b) => json!({"b": b}),
		Value::Number(n) => json!({"n": n}),
		Value::String(s) => json!({"s": s}),
		Value::Array(items) => {
			let encoded: Vec<Value> = items.iter().map(to_wire).collect();
			json!({"a": encoded})
		}
		Value::Object(map) => {
			let entries: Vec<Value> = map
				.iter()
				.map(|(k, v)| json!({"k": k, "v": to_wire(v)}))
				.collect();
			json!({"o": entries})
		}
	}
}

/// Decodes a tagged wire value back into plain JSON.
///
/// Sentinels without a JSON counterpart (`undefined`, `NaN`, the infinities)
/// decode to `Null`. Dates and bigints decode to their string form.
pub fn from_wire(value: &Value) -> Value {
	let Some(obj) = value.as_object() else {
		return value.clone();
	};

	if let Some(v) = obj.get("v") {
		return match v.as_str() {
			Some("-0") => json!(0),
			_ => Value::Null,
		};
	}
	if let Some(n) = obj.get("n") {
		return n.clone();
	}
	if let Some(s) = obj.get("s") {
		return s.clone();
	}
	if let Some(b) = obj.get("b") {
		return b.clone();
	}
	if let Some(d) = obj.get("d") {
		return d.clone();
	}
	if let Some(bi) = obj.get("bi") {
		return bi.clone();
	}
	if let Some(items) = obj.get("a").and_then(Value::as_array) {
		return Value::Array(items.iter().map(from_wire).collect());
	}
	if let Some(entries) = obj.get("o").and_then(Value::as_array) {
		let mut map = Map::new();
		for entry in entries {
			if let (Some(k), Some(v)) = (entry.get("k").and_then(Value::as_str), entry.get("v")) {
				map.insert(k.to_string(), from_wire(v));
			}
		}
		return Value::Object(map);
	}

	value.clone()
}

/// Builds the `arg` parameter for an `evaluateExpression` call.
///
/// Plain-data arguments only; handle references are not supported here.
pub fn evaluate_argument(value: &Value) -> Value {
	json!({
		"value": to_wire(value),
		"handles": []
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn scalars_round_trip() {
		for value in [json!(42), json!("hello"), json!(true), json!(1.5)] {
			assert_eq!(from_wire(&to_wire(&value)), value);
		}
	}

	#[test]
	fn null_encodes_as_sentinel() {
		assert_eq!(to_wire(&Value::Null), json!({"v": "null"}));
		assert_eq!(from_wire(&json!({"v": "null"})), Value::Null);
	}

	#[test]
	fn undefined_decodes_to_null() {
		assert_eq!(from_wire(&json!({"v": "undefined"})), Value::Null);
		assert_eq!(from_wire(&json!({"v": "NaN"})), Value::Null);
	}

	#[test]
	fn nested_structures_round_trip() {
		let value = json!({
			"playlist": [
				{"id": "1", "title": "Numb"},
				{"id": "2", "title": "Blinding Lights"}
			],
			"count": 2
		});
		assert_eq!(from_wire(&to_wire(&value)), value);
	}

	#[test]
	fn object_encodes_as_key_value_entries() {
		let encoded = to_wire(&json!({"id": "42"}));
		assert_eq!(encoded, json!({"o": [{"k": "id", "v": {"s": "42"}}]}));
	}

	#[test]
	fn argument_wraps_value_with_empty_handles() {
		let arg = evaluate_argument(&json!(["#q", "<tr></tr>"]));
		assert_eq!(arg["handles"], json!([]));
		assert_eq!(arg["value"]["a"][0], json!({"s": "#q"}));
	}

	#[test]
	fn date_decodes_to_string() {
		let decoded = from_wire(&json!({"d": "2024-01-01T00:00:00.000Z"}));
		assert_eq!(decoded, json!("2024-01-01T00:00:00.000Z"));
	}
}
