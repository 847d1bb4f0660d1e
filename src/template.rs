//! Minimal `{{.Field}}` formatter for `ps --format` and `inspect --format`.
//!
//! The engine does not ship a template language. A format string is a plain
//! string with `{{.Path.To.Field}}` placeholders which are resolved against
//! the JSON form of the record, matching keys case-insensitively per path
//! segment. Unknown fields render as the empty string.

use serde_json::Value;

/// Apply a format string to a JSON record.
pub fn render(format: &str, record: &Value) -> String {
    let mut out = String::with_capacity(format.len());
    let mut rest = format;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                out.push_str(&lookup(after[..end].trim(), record));
                rest = &after[end + 2..];
            }
            None => {
                // unbalanced placeholder, emit verbatim
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);

    out
}

fn lookup(expr: &str, record: &Value) -> String {
    let path = expr.trim_start_matches('.');
    if path.is_empty() {
        return String::new();
    }

    let mut current = record;
    for segment in path.split('.') {
        match current {
            Value::Object(map) => {
                let found = map
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(segment))
                    .map(|(_, v)| v);
                match found {
                    Some(v) => current = v,
                    None => return String::new(),
                }
            }
            _ => return String::new(),
        }
    }

    match current {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_simple_field() {
        let record = json!({"names": "web", "status": "running"});
        assert_eq!(render("{{.Names}}: {{.Status}}", &record), "web: running");
    }

    #[test]
    fn test_nested_and_unknown_fields() {
        let record = json!({"config": {"Env": ["A=1"]}});
        assert_eq!(render("{{.Config.Env}}", &record), r#"["A=1"]"#);
        assert_eq!(render("{{.Missing}}", &record), "");
    }

    #[test]
    fn test_literal_text_preserved() {
        let record = json!({"id": "abc"});
        assert_eq!(render("id={{.Id}} done", &record), "id=abc done");
        assert_eq!(render("no placeholders", &record), "no placeholders");
    }
}
