// Input validation utilities
//
// Turns raw driver input into typed field values, per field kind. This is the boundary
// between a front-end and a step controller: the engine calls it, but it has no
// knowledge of step flow.

use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{Feedback, FieldDescriptor, FieldKind, FieldValue, FieldValues};

/// Raw value as collected by a driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Text(String),
    Bool(bool),
}

pub type RawInput = BTreeMap<String, RawValue>;

/// How raw input was collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Typed at a prompt: empty input means "keep the current value".
    Interactive,
    /// Submitted as a form: what was sent is what the user left in the field. Password
    /// inputs are never pre-filled, so an empty one still keeps the current value.
    Structured,
}

/// Whether an empty answer for `kind` keeps the field's current value.
fn keeps_prior_when_empty(kind: FieldKind, mode: InputMode) -> bool {
    mode == InputMode::Interactive || kind == FieldKind::Password
}

/// Outcome of resolving a whole submission. Valid fields are always collected; the first
/// invalid one produces the rejection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub values: FieldValues,
    /// Keys whose value is free text typed by the user (as opposed to a kept prior value,
    /// a boolean, or one of a select's own options).
    pub supplied: BTreeSet<String>,
    pub rejection: Option<Feedback>,
}

pub const INVALID_EMAIL: &str = "Invalid e-mail address. Please enter a valid e-mail address.";
pub const INVALID_YES_NO: &str = "Invalid input. Please enter 'yes' or 'no'.";
pub const INVALID_OPTION: &str = "Invalid option selected.";

/// Validate an e-mail address (local@domain.tld).
pub fn is_valid_email(input: &str) -> bool {
    let re = match Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    ) {
        Ok(re) => re,
        Err(e) => {
            log::error!("Internal error: failed to compile e-mail regex: {}", e);
            return false;
        }
    };
    input.len() <= 254 && !input.contains("..") && re.is_match(input)
}

/// Parse a yes/no style answer. `None` when the input is not recognized.
pub fn parse_yes_no(input: &str) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" | "1" | "on" => Some(true),
        "no" | "n" | "false" | "0" | "off" => Some(false),
        _ => None,
    }
}

/// Resolve a select answer given either as a 1-based index or as a literal option.
pub fn resolve_select(options: &[String], input: &str) -> Option<String> {
    let input = input.trim();
    if let Ok(n) = input.parse::<usize>() {
        if let Some(option) = n.checked_sub(1).and_then(|i| options.get(i)) {
            return Some(option.clone());
        }
    }
    options.iter().find(|o| o.as_str() == input).cloned()
}

/// Resolve one field. `Ok(None)` for display-only fields.
pub fn resolve_field(
    field: &FieldDescriptor,
    raw: Option<&RawValue>,
    mode: InputMode,
) -> Result<Option<FieldValue>, String> {
    let prior = field.value.clone();
    let value = match field.kind {
        FieldKind::Info => return Ok(None),
        FieldKind::Text | FieldKind::Password => match raw {
            None => prior,
            Some(RawValue::Bool(b)) => FieldValue::Text(b.to_string()),
            Some(RawValue::Text(s))
                if s.trim().is_empty() && keeps_prior_when_empty(field.kind, mode) =>
            {
                prior
            }
            Some(RawValue::Text(s)) => FieldValue::Text(s.clone()),
        },
        FieldKind::Email => match raw {
            None => prior,
            Some(RawValue::Bool(_)) => return Err(INVALID_EMAIL.to_string()),
            Some(RawValue::Text(s)) if s.trim().is_empty() => {
                if mode == InputMode::Interactive {
                    prior
                } else {
                    FieldValue::Text(String::new())
                }
            }
            Some(RawValue::Text(s)) => {
                let s = s.trim();
                if !is_valid_email(s) {
                    return Err(INVALID_EMAIL.to_string());
                }
                FieldValue::Text(s.to_string())
            }
        },
        FieldKind::Checkbox => match (raw, mode) {
            (Some(RawValue::Bool(b)), _) => FieldValue::Bool(*b),
            // An unchecked HTML checkbox is simply not sent.
            (None, InputMode::Structured) => FieldValue::Bool(false),
            (None, InputMode::Interactive) => prior,
            (Some(RawValue::Text(s)), InputMode::Interactive) if s.trim().is_empty() => prior,
            (Some(RawValue::Text(s)), _) => match parse_yes_no(s) {
                Some(b) => FieldValue::Bool(b),
                None => return Err(INVALID_YES_NO.to_string()),
            },
        },
        FieldKind::Select => match raw {
            None => prior,
            Some(RawValue::Bool(_)) => return Err(INVALID_OPTION.to_string()),
            Some(RawValue::Text(s)) if s.trim().is_empty() => prior,
            Some(RawValue::Text(s)) => match resolve_select(&field.options, s) {
                Some(option) => FieldValue::Text(option),
                None => return Err(INVALID_OPTION.to_string()),
            },
        },
    };
    Ok(Some(value))
}

fn is_supplied_text(kind: FieldKind, raw: Option<&RawValue>, mode: InputMode) -> bool {
    let free_text = matches!(kind, FieldKind::Text | FieldKind::Password | FieldKind::Email);
    match raw {
        Some(RawValue::Text(s)) => {
            free_text && !(s.trim().is_empty() && keeps_prior_when_empty(kind, mode))
        }
        _ => false,
    }
}

/// Resolve every input field of a step. Keys that are not declared fields are ignored.
pub fn resolve_submission(
    fields: &[FieldDescriptor],
    raw: &RawInput,
    mode: InputMode,
) -> Resolution {
    resolve_fields(fields, raw, mode, false)
}

/// Like [`resolve_submission`], but nothing the user entered is discarded: a value that
/// fails its kind's check is kept as the text that was typed. Used when leaving a step
/// backwards, where there is no validation gate.
pub fn resolve_retreat(fields: &[FieldDescriptor], raw: &RawInput, mode: InputMode) -> Resolution {
    resolve_fields(fields, raw, mode, true)
}

fn resolve_fields(
    fields: &[FieldDescriptor],
    raw: &RawInput,
    mode: InputMode,
    keep_invalid: bool,
) -> Resolution {
    let mut resolution = Resolution::default();
    for field in fields {
        let submitted = raw.get(&field.key);
        match resolve_field(field, submitted, mode) {
            Ok(Some(value)) => {
                if is_supplied_text(field.kind, submitted, mode) {
                    resolution.supplied.insert(field.key.clone());
                }
                resolution.values.insert(field.key.clone(), value);
            }
            Ok(None) => {}
            Err(message) => {
                if keep_invalid {
                    if let Some(RawValue::Text(typed)) = submitted {
                        resolution.supplied.insert(field.key.clone());
                        resolution
                            .values
                            .insert(field.key.clone(), FieldValue::Text(typed.clone()));
                    }
                }
                if resolution.rejection.is_none() {
                    let label = if field.label.is_empty() {
                        field.key.as_str()
                    } else {
                        field.label.as_str()
                    };
                    resolution.rejection = Some(Feedback::error(format!("{}: {}", label, message)));
                }
            }
        }
    }
    resolution
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> RawValue {
        RawValue::Text(s.to_string())
    }

    #[test]
    fn email_grammar() {
        assert!(is_valid_email("admin@example.com"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));
        assert!(!is_valid_email("admin@localhost"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a@@example.com"));
        assert!(!is_valid_email("a..b@example.com"));
    }

    #[test]
    fn interactive_text_falls_back_to_prior_value() {
        let field = FieldDescriptor::text("db_name", "Name", "localhost");
        let v = resolve_field(&field, Some(&text("  ")), InputMode::Interactive).unwrap();
        assert_eq!(v, Some(FieldValue::text("localhost")));
        let v = resolve_field(&field, Some(&text("wizard")), InputMode::Interactive).unwrap();
        assert_eq!(v, Some(FieldValue::text("wizard")));
    }

    #[test]
    fn structured_text_keeps_empty_submission() {
        let field = FieldDescriptor::text("db_host", "Host", "localhost");
        let v = resolve_field(&field, Some(&text("")), InputMode::Structured).unwrap();
        assert_eq!(v, Some(FieldValue::text("")));
        // Absent keeps the prior value.
        let v = resolve_field(&field, None, InputMode::Structured).unwrap();
        assert_eq!(v, Some(FieldValue::text("localhost")));
    }

    #[test]
    fn empty_password_keeps_prior_value_in_both_modes() {
        let mut field = FieldDescriptor::password("db_password", "Password");
        field.value = FieldValue::text("s3cret");
        for mode in [InputMode::Structured, InputMode::Interactive] {
            let v = resolve_field(&field, Some(&text("")), mode).unwrap();
            assert_eq!(v, Some(FieldValue::text("s3cret")), "mode {:?}", mode);
        }
        let v = resolve_field(&field, Some(&text("n3w")), InputMode::Structured).unwrap();
        assert_eq!(v, Some(FieldValue::text("n3w")));

        let mut raw = RawInput::new();
        raw.insert("db_password".into(), text(""));
        let res = resolve_submission(&[field], &raw, InputMode::Structured);
        assert!(!res.supplied.contains("db_password"), "kept value is not re-escaped");
    }

    #[test]
    fn retreat_keeps_invalid_entries_as_typed_text() {
        let fields = vec![
            FieldDescriptor::email("admin_email", "E-mail", ""),
            FieldDescriptor::select("letter", "Letter", &["a", "b"], "a"),
            FieldDescriptor::text("name", "Name", ""),
        ];
        let mut raw = RawInput::new();
        raw.insert("admin_email".into(), text("half@typed"));
        raw.insert("letter".into(), text("q"));
        raw.insert("name".into(), text("wizard"));

        let res = resolve_retreat(&fields, &raw, InputMode::Structured);
        assert_eq!(res.values.get("admin_email"), Some(&FieldValue::text("half@typed")));
        assert_eq!(res.values.get("letter"), Some(&FieldValue::text("q")));
        assert_eq!(res.values.get("name"), Some(&FieldValue::text("wizard")));
        assert!(res.supplied.contains("admin_email"));
        assert!(res.rejection.is_some());

        let strict = resolve_submission(&fields, &raw, InputMode::Structured);
        assert!(!strict.values.contains_key("admin_email"));
    }

    #[test]
    fn email_is_validated_when_non_empty() {
        let field = FieldDescriptor::email("admin_email", "E-mail", "old@example.com");
        let err = resolve_field(&field, Some(&text("bogus")), InputMode::Interactive).unwrap_err();
        assert_eq!(err, INVALID_EMAIL);
        let v = resolve_field(&field, Some(&text("")), InputMode::Interactive).unwrap();
        assert_eq!(v, Some(FieldValue::text("old@example.com")));
    }

    #[test]
    fn checkbox_normalization() {
        let field = FieldDescriptor::checkbox("terms", "Terms", true);
        for (input, expected) in [("yes", true), ("Y", true), ("no", false), ("n", false)] {
            let v = resolve_field(&field, Some(&text(input)), InputMode::Interactive).unwrap();
            assert_eq!(v, Some(FieldValue::Bool(expected)), "input '{}'", input);
        }
        let v = resolve_field(&field, Some(&text("")), InputMode::Interactive).unwrap();
        assert_eq!(v, Some(FieldValue::Bool(true)));
        assert!(resolve_field(&field, Some(&text("maybe")), InputMode::Interactive).is_err());

        let v = resolve_field(&field, None, InputMode::Structured).unwrap();
        assert_eq!(v, Some(FieldValue::Bool(false)));
        let v = resolve_field(&field, Some(&text("on")), InputMode::Structured).unwrap();
        assert_eq!(v, Some(FieldValue::Bool(true)));
        let v = resolve_field(&field, Some(&RawValue::Bool(false)), InputMode::Structured).unwrap();
        assert_eq!(v, Some(FieldValue::Bool(false)));
    }

    #[test]
    fn select_accepts_index_or_literal() {
        let field = FieldDescriptor::select("letter", "Letter", &["a", "b", "c"], "b");
        let v = resolve_field(&field, Some(&text("3")), InputMode::Interactive).unwrap();
        assert_eq!(v, Some(FieldValue::text("c")));
        let v = resolve_field(&field, Some(&text("a")), InputMode::Interactive).unwrap();
        assert_eq!(v, Some(FieldValue::text("a")));
        let v = resolve_field(&field, Some(&text("")), InputMode::Interactive).unwrap();
        assert_eq!(v, Some(FieldValue::text("b")));
        for bad in ["0", "4", "z"] {
            assert_eq!(
                resolve_field(&field, Some(&text(bad)), InputMode::Interactive).unwrap_err(),
                INVALID_OPTION,
                "input '{}'",
                bad
            );
        }
    }

    #[test]
    fn submission_skips_info_and_unknown_keys_and_reports_first_rejection() {
        let fields = vec![
            FieldDescriptor::info("intro", "", "Hello"),
            FieldDescriptor::email("admin_email", "E-mail", ""),
            FieldDescriptor::select("letter", "Letter", &["a"], "a"),
            FieldDescriptor::text("name", "Name", ""),
        ];
        let mut raw = RawInput::new();
        raw.insert("admin_email".into(), text("bad"));
        raw.insert("letter".into(), text("q"));
        raw.insert("name".into(), text("wizard"));
        raw.insert("csrf_token".into(), text("abc"));

        let res = resolve_submission(&fields, &raw, InputMode::Structured);
        assert_eq!(res.values.len(), 1);
        assert_eq!(res.values.get("name"), Some(&FieldValue::text("wizard")));
        assert!(res.supplied.contains("name"));
        assert!(!res.supplied.contains("letter"));
        let rejection = res.rejection.expect("rejected");
        assert!(rejection.message.starts_with("E-mail:"), "got: {}", rejection.message);
    }
}
