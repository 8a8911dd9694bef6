//! Piped JSON input and JSON output helpers

use std::io::{IsTerminal, Read};

use anyhow::Result;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::PriorError;

pub type JsonObject = Map<String, Value>;

/// Read a JSON object piped on stdin. An interactive terminal or empty input is `None`.
pub fn read_stdin_object() -> Result<Option<JsonObject>, PriorError> {
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }
    parse_object(stdin.lock())
}

pub fn parse_object<R: Read>(mut reader: R) -> Result<Option<JsonObject>, PriorError> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|e| PriorError::validation(format!("cannot read stdin: {}", e)))?;

    if text.trim().is_empty() {
        return Ok(None);
    }
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(map)) => Ok(Some(map)),
        Ok(_) => Err(PriorError::validation("stdin must be a JSON object")),
        Err(e) => Err(PriorError::validation(format!("invalid JSON on stdin: {}", e))),
    }
}

/// Set `key`, dropping any alias spellings the input used for the same field
pub fn override_field(map: &mut JsonObject, key: &str, aliases: &[&str], value: Value) {
    for alias in aliases {
        map.remove(*alias);
    }
    map.insert(key.to_string(), value);
}

/// Move an aliased field to its canonical key unless the canonical key is set
pub fn canonicalize(map: &mut JsonObject, key: &str, aliases: &[&str]) {
    for alias in aliases {
        if let Some(value) = map.remove(*alias) {
            map.entry(key.to_string()).or_insert(value);
        }
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Number the server reported, or `?`
pub fn fmt_number(value: Option<f64>) -> String {
    value.map_or_else(|| "?".to_string(), |v| v.to_string())
}

/// First `max` characters of `s`
pub fn preview(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_parse_object() {
        let map = parse_object(r#"{"a": 1}"#.as_bytes()).unwrap().unwrap();
        assert_eq!(map.get("a"), Some(&json!(1)));
    }

    #[test]
    fn test_empty_input_is_none() {
        assert!(parse_object("".as_bytes()).unwrap().is_none());
        assert!(parse_object("   \n  ".as_bytes()).unwrap().is_none());
    }

    #[test]
    fn test_rejects_non_objects() {
        for input in ["{bad", "[1, 2]", "42"] {
            let err = parse_object(input.as_bytes()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "input: {}", input);
        }
    }

    #[test]
    fn test_override_drops_aliases() {
        let mut map = json!({"entryId": "k_old", "outcome": "useful"})
            .as_object()
            .cloned()
            .unwrap();
        override_field(&mut map, "id", &["entryId", "entry_id"], json!("k_new"));
        assert_eq!(map.get("id"), Some(&json!("k_new")));
        assert!(map.get("entryId").is_none());
    }

    #[test]
    fn test_canonicalize_keeps_canonical_value() {
        let mut map = json!({"id": "k_1", "entry_id": "k_2"}).as_object().cloned().unwrap();
        canonicalize(&mut map, "id", &["entryId", "entry_id"]);
        assert_eq!(map.get("id"), Some(&json!("k_1")));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_fmt_number() {
        assert_eq!(fmt_number(Some(1.0)), "1");
        assert_eq!(fmt_number(Some(0.5)), "0.5");
        assert_eq!(fmt_number(None), "?");
    }
}
