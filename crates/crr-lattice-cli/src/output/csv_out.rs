use serde_json::Value;
use std::io::{self, Write};

use super::result_of;

/// Write output as CSV to stdout: one row per lattice node when present.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    write_csv(stdout.lock(), value);
}

fn write_csv<W: Write>(out: W, value: &Value) {
    let mut wtr = csv::Writer::from_writer(out);

    match result_of(value) {
        Value::Object(result) => {
            if let Some(Value::Array(nodes)) = result.get("nodes") {
                write_array_csv(&mut wtr, nodes);
            } else {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in result {
                    let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
                }
            }
        }
        Value::Array(arr) => {
            write_array_csv(&mut wtr, arr);
        }
        other => {
            let _ = wtr.write_record([&format_csv_value(other)]);
        }
    }

    let _ = wtr.flush();
}

fn write_array_csv<W: Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    // Headers from first object
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(value: &Value) -> String {
        let mut buf = Vec::new();
        write_csv(&mut buf, value);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_nodes_become_rows() {
        let v = json!({"result": {
            "put_value": "1",
            "nodes": [
                {"step": 0, "up_count": 0, "spot": "100", "put_decision": "hold"},
                {"step": 1, "up_count": 0, "spot": "90", "put_decision": "exercise"}
            ]
        }});
        let out = render(&v);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("step") && lines[0].contains("spot"));
        assert!(lines[2].contains("exercise"));
    }

    #[test]
    fn test_plain_object_is_field_value() {
        let out = render(&json!({"result": {"put_value": "1.5"}}));
        assert_eq!(out, "field,value\nput_value,1.5\n");
    }
}
