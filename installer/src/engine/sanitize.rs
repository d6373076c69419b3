// Input sanitization
//
// Every text value the user typed is HTML-entity encoded before it is handed to a controller
// or stored, so it can be redisplayed verbatim. Values kept from a previous submission are
// already encoded and are left alone. The token field never reaches storage.

use std::collections::BTreeSet;

use crate::models::{FieldValue, FieldValues};

use super::token::TOKEN_FIELD;

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn sanitize_values(values: FieldValues, supplied: &BTreeSet<String>) -> FieldValues {
    values
        .into_iter()
        .filter(|(key, _)| key != TOKEN_FIELD)
        .map(|(key, value)| {
            let value = match value {
                FieldValue::Text(s) if supplied.contains(&key) => FieldValue::Text(escape_html(&s)),
                other => other,
            };
            (key, value)
        })
        .collect()
}
