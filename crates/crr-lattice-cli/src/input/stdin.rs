use serde_json::Value;
use std::io::{self, Read};

/// Read a piped JSON or YAML document from stdin.
/// Returns None if stdin is a TTY (interactive) or empty.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    parse_document(&buffer)
}

/// YAML is a superset of JSON, so one parser covers both.
fn parse_document(buffer: &str) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let value: Value = serde_yaml::from_str(trimmed)?;
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_none() {
        assert!(parse_document("  \n").unwrap().is_none());
    }

    #[test]
    fn test_json_and_yaml_documents() {
        let json = parse_document(r#"{"steps": 4, "style": "european"}"#).unwrap().unwrap();
        let yaml = parse_document("steps: 4\nstyle: european\n").unwrap().unwrap();
        assert_eq!(json, yaml);
        assert_eq!(json["steps"], 4);
    }
}
