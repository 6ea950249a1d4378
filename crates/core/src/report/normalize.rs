use serde_json::Value;

use crate::report::form::FormData;

/// Unwraps values that multi-select widgets deliver as `["<json>"]`: the single string is parsed
/// as JSON, or kept as a bare string when it is not JSON. Applied once; the parsed value is not
/// inspected again.
pub fn normalize_value(value: Value) -> Value {
    if let Value::Array(items) = &value {
        if let [Value::String(raw)] = items.as_slice() {
            return serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone()));
        }
    }
    value
}

pub fn normalize_form_data(data: &FormData) -> FormData {
    data.iter().map(|(field, value)| (field.clone(), normalize_value(value.clone()))).collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{normalize_form_data, normalize_value};
    use crate::report::form::FormData;

    fn data(value: serde_json::Value) -> FormData {
        value.as_object().cloned().expect("object literal")
    }

    #[test]
    fn wrapped_json_array_is_unwrapped() {
        let normalized = normalize_form_data(&data(json!({ "suspect_points": ["[\"a\",\"b\"]"] })));
        assert_eq!(normalized, data(json!({ "suspect_points": ["a", "b"] })));
    }

    #[test]
    fn wrapped_plain_text_collapses_to_string() {
        let normalized = normalize_form_data(&data(json!({ "general_comment": ["not json"] })));
        assert_eq!(normalized, data(json!({ "general_comment": "not json" })));
    }

    #[test]
    fn other_shapes_pass_through() {
        let input = data(json!({
            "brand_name": "Omega",
            "overall_score": 87,
            "suspect_points": ["a", "b"],
            "empty": [],
            "numbers": [3],
            "flag": true
        }));
        assert_eq!(normalize_form_data(&input), input);
    }

    #[test]
    fn wrapped_scalars_are_parsed() {
        assert_eq!(normalize_value(json!(["42"])), json!(42));
        assert_eq!(normalize_value(json!(["true"])), json!(true));
    }

    #[test]
    fn single_choice_multi_select_stays_a_list() {
        assert_eq!(normalize_value(json!(["[\"crown\"]"])), json!(["crown"]));
        assert_eq!(normalize_value(json!(["[\"[\\\"deep\\\"]\"]"])), json!(["[\"deep\"]"]));
    }

    #[test]
    fn normalization_is_idempotent() {
        let inputs = [
            json!({ "suspect_points": ["[\"a\",\"b\"]"], "general_comment": ["not json"] }),
            json!({ "quoted": ["\"already a string\""], "score": ["7"], "flag": ["false"] }),
            json!({ "brand_name": "Omega", "suspect_points": ["a", "b"], "empty": [] }),
        ];

        for input in inputs {
            let once = normalize_form_data(&data(input));
            let twice = normalize_form_data(&once);
            assert_eq!(once, twice);
        }
    }
}
