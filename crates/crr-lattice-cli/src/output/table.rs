use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;
use tabled::{builder::Builder, Table};

/// Decimal places shown in tables. JSON and CSV keep full precision.
const TABLE_DP: u32 = 6;

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    print!("{}", render(value));
}

fn render(value: &Value) -> String {
    let mut out = String::new();
    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => {
                out.push_str(&summary_table(result).to_string());
                out.push('\n');
                if let Some(boundary) = boundary_table(result) {
                    out.push_str(&format!("\nExercise boundary:\n{}\n", boundary));
                }
                if let Some(Value::Array(nodes)) = result.get("nodes") {
                    out.push_str(&format!("\nNodes:\n{}\n", node_table(nodes)));
                }
                push_envelope_notes(&mut out, map);
            }
            _ => {
                out.push_str(&summary_table(map).to_string());
                out.push('\n');
            }
        },
        other => {
            out.push_str(&format_value(other));
            out.push('\n');
        }
    }
    out
}

/// Scalar result fields; nested objects flattened as `parent.child`.
fn summary_table(result: &Map<String, Value>) -> Table {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in result {
        match val {
            Value::Array(_) => {}
            Value::Object(inner) => {
                for (k, v) in inner {
                    builder.push_record([format!("{key}.{k}"), format_value(v)]);
                }
            }
            _ => {
                builder.push_record([key.clone(), format_value(val)]);
            }
        }
    }
    builder.build()
}

fn boundary_table(result: &Map<String, Value>) -> Option<Table> {
    let put = result.get("put_exercise_boundary")?.as_array()?;
    let call = result.get("call_exercise_boundary")?.as_array()?;

    let mut builder = Builder::default();
    builder.push_record(["Step", "Put boundary", "Call boundary"]);
    for (step, (p, c)) in put.iter().zip(call).enumerate() {
        builder.push_record([step.to_string(), format_value(p), format_value(c)]);
    }
    Some(builder.build())
}

fn node_table(nodes: &[Value]) -> Table {
    let columns = [
        ("step", "Step"),
        ("up_count", "Up"),
        ("spot", "Spot"),
        ("put_value", "Put"),
        ("put_decision", "Put decision"),
        ("call_value", "Call"),
        ("call_decision", "Call decision"),
    ];

    let mut builder = Builder::default();
    builder.push_record(columns.iter().map(|(_, header)| header.to_string()));
    for node in nodes {
        builder.push_record(
            columns
                .iter()
                .map(|(key, _)| node.get(*key).map(format_value).unwrap_or_default()),
        );
    }
    builder.build()
}

fn push_envelope_notes(out: &mut String, envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            out.push_str("\nWarnings:\n");
            for w in warnings {
                if let Value::String(s) = w {
                    out.push_str(&format!("  - {}\n", s));
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        out.push_str(&format!("\nMethodology: {}\n", meth));
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => match Decimal::from_str(s) {
            Ok(d) => d.round_dp(TABLE_DP).normalize().to_string(),
            Err(_) => s.clone(),
        },
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
