//! Parameter binding for MySQL queries
//!
//! Parameters are bound by substituting escaped SQL literals into the query
//! text before execution: positional values replace `?` placeholders in
//! order, named values replace `:name` tokens. A `:name` token with no
//! matching parameter is left literal.

use flowdb_core::{Params, Value};
use regex::{Captures, Regex};
use std::sync::OnceLock;

fn named_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r":(\w+)").expect("named-parameter regex is valid"))
}

/// Substitute parameters into the query text.
pub fn bind_parameters(sql: &str, params: &Params) -> String {
    match params {
        Params::Empty => sql.to_string(),
        Params::Positional(values) => {
            let mut result = sql.to_string();
            for value in values {
                let literal = value_to_mysql_literal(value);
                result = result.replacen('?', &literal, 1);
            }
            result
        }
        Params::Named(map) => named_token_regex()
            .replace_all(sql, |caps: &Captures<'_>| match map.get(&caps[1]) {
                Some(value) => value_to_mysql_literal(value),
                None => caps[0].to_string(),
            })
            .into_owned(),
    }
}

/// Escape a value for SQL literal inclusion (for MySQL)
pub fn value_to_mysql_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(v) => if *v { "TRUE" } else { "FALSE" }.to_string(),
        Value::Int64(v) => v.to_string(),
        Value::Float64(v) => v.to_string(),
        Value::String(v) => quote_string(v),
        Value::Bytes(v) => {
            // Hex literal form, safe for arbitrary bytes
            let hex: String = v.iter().map(|b| format!("{:02x}", b)).collect();
            format!("X'{}'", hex)
        }
        Value::Date(v) => format!("'{}'", v.format("%Y-%m-%d")),
        Value::DateTime(v) => format!("'{}'", v.format("%Y-%m-%d %H:%M:%S")),
        Value::Json(v) => {
            let json = serde_json::to_string(v).unwrap_or_else(|_| "null".to_string());
            quote_string(&json)
        }
    }
}

fn quote_string(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn named(pairs: &[(&str, Value)]) -> Params {
        Params::Named(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    #[test]
    fn named_token_substitutes_escaped_literal() {
        let params = named(&[("a", Value::Int64(1))]);
        assert_eq!(bind_parameters("SELECT :a", &params), "SELECT 1");
    }

    #[test]
    fn unknown_named_token_stays_literal() {
        let params = named(&[("a", Value::Int64(1))]);
        assert_eq!(
            bind_parameters("SELECT :a, :missing", &params),
            "SELECT 1, :missing"
        );
    }

    #[test]
    fn named_string_values_are_quoted_and_escaped() {
        let params = named(&[("name", Value::String("O'Brien".into()))]);
        assert_eq!(
            bind_parameters("SELECT * FROM users WHERE name = :name", &params),
            "SELECT * FROM users WHERE name = 'O''Brien'"
        );
    }

    #[test]
    fn backslashes_are_escaped() {
        let params = named(&[("p", Value::String(r"C:\tmp".into()))]);
        assert_eq!(
            bind_parameters("SELECT :p", &params),
            r"SELECT 'C:\\tmp'"
        );
    }

    #[test]
    fn positional_values_replace_placeholders_in_order() {
        let params = Params::Positional(vec![
            Value::Int64(7),
            Value::String("x".into()),
            Value::Null,
        ]);
        assert_eq!(
            bind_parameters("INSERT INTO t VALUES (?, ?, ?)", &params),
            "INSERT INTO t VALUES (7, 'x', NULL)"
        );
    }

    #[test]
    fn empty_params_leave_query_untouched() {
        assert_eq!(
            bind_parameters("SELECT :a, ?", &Params::Empty),
            "SELECT :a, ?"
        );
    }

    #[test]
    fn repeated_named_token_substitutes_everywhere() {
        let params = named(&[("id", Value::Int64(3))]);
        assert_eq!(
            bind_parameters("SELECT :id, :id", &params),
            "SELECT 3, 3"
        );
    }

    #[test]
    fn bytes_render_as_hex_literal() {
        assert_eq!(
            value_to_mysql_literal(&Value::Bytes(vec![0xde, 0xad])),
            "X'dead'"
        );
    }

    #[test]
    fn json_values_bind_as_quoted_json_text() {
        let params = named(&[("doc", Value::Json(serde_json::json!({"k": 1})))]);
        assert_eq!(
            bind_parameters("UPDATE t SET doc = :doc", &params),
            r#"UPDATE t SET doc = '{"k":1}'"#
        );
    }
}
