use serde_json::Value;

use super::result_of;

/// Print just the root put and call values.
pub fn print_minimal(value: &Value) {
    for line in minimal_lines(value) {
        println!("{}", line);
    }
}

fn minimal_lines(value: &Value) -> Vec<String> {
    let result = result_of(value);

    let lines: Vec<String> = ["put_value", "call_value"]
        .iter()
        .filter_map(|key| {
            result
                .get(*key)
                .filter(|v| !v.is_null())
                .map(|v| format!("{}: {}", key.trim_end_matches("_value"), format_minimal(v)))
        })
        .collect();

    if lines.is_empty() {
        // Not a lattice envelope, just print directly
        vec![format_minimal(result)]
    } else {
        lines
    }
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
