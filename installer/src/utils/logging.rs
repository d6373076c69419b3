// Logging utilities
// Structured logging with JSON and human-readable formats

use log::Level;
use serde_json::json;

/// Mask sensitive data in logs
pub fn mask_sensitive(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    if chars.len() <= 8 {
        return "***".to_string();
    }

    let visible = 4;
    let start: String = chars[..visible].iter().collect();
    let end: String = chars[chars.len() - visible..].iter().collect();

    format!("{}...{}", start, end)
}

/// Mask a `KEY=value` line when the key names a secret.
pub fn mask_env_line(line: &str) -> String {
    match line.split_once('=') {
        Some((key, value)) if is_secret_key(key) => format!("{}={}", key, mask_sensitive(value)),
        _ => line.to_string(),
    }
}

fn is_secret_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    ["password", "passwd", "pwd", "secret", "token"]
        .iter()
        .any(|k| key.contains(k))
}

/// Parse phase and step from log message
/// Extracts [PHASE: ...] and [STEP: ...] patterns
pub fn parse_log_metadata(message: &str) -> (Option<String>, Option<String>, String) {
    let (phase, cleaned) = extract_tag(message, "[PHASE:");
    let (step, cleaned) = extract_tag(&cleaned, "[STEP:");
    (phase, step, cleaned)
}

fn extract_tag(message: &str, open: &str) -> (Option<String>, String) {
    if let Some(start) = message.find(open) {
        if let Some(end) = message[start..].find(']') {
            let value = message[start + open.len()..start + end].trim().to_string();
            let cleaned = format!("{} {}", &message[..start], &message[start + end + 1..])
                .trim()
                .to_string();
            return (Some(value), cleaned);
        }
    }
    (None, message.to_string())
}

/// Format log entry as JSON for structured logging
pub fn format_json_log(
    timestamp: &str,
    level: Level,
    target: &str,
    message: &str,
    phase: Option<&str>,
    step: Option<&str>,
) -> String {
    let mut log_entry = json!({
        "timestamp": timestamp,
        "level": level.as_str(),
        "target": target,
        "message": message,
    });

    if let Some(phase) = phase {
        log_entry["phase"] = json!(phase);
    }

    if let Some(step) = step {
        log_entry["step"] = json!(step);
    }

    serde_json::to_string(&log_entry).unwrap_or_else(|_| "{}".to_string())
}

/// Format log entry as human-readable text
pub fn format_human_readable_log(
    timestamp: &str,
    level: Level,
    target: &str,
    message: &str,
    phase: Option<&str>,
    step: Option<&str>,
) -> String {
    let mut log_line = format!("[{}] [{}]", timestamp, level.as_str());

    if let Some(phase) = phase {
        log_line.push_str(&format!(" [PHASE: {}]", phase));
    }

    if let Some(step) = step {
        log_line.push_str(&format!(" [STEP: {}]", step));
    }

    log_line.push_str(&format!(" [{}] {}", target, message));
    log_line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_sensitive_short_values_fully_masked() {
        assert_eq!(mask_sensitive("abc"), "***");
        assert_eq!(mask_sensitive("12345678"), "***");
        assert_eq!(mask_sensitive(""), "***");
    }

    #[test]
    fn mask_sensitive_long_values_partially_masked() {
        let masked = mask_sensitive("abcdefghijklmnop");
        assert_eq!(masked, "abcd...mnop");
    }

    #[test]
    fn mask_sensitive_handles_multibyte_chars() {
        let masked = mask_sensitive("pässwördpässwörd");
        assert!(masked.starts_with("päss"), "got: {}", masked);
        assert!(masked.ends_with("wörd"), "got: {}", masked);
    }

    #[test]
    fn mask_env_line_hides_only_secret_keys() {
        assert_eq!(
            mask_env_line("DB_PASSWORD=supersecretvalue"),
            "DB_PASSWORD=supe...alue"
        );
        assert_eq!(mask_env_line("DB_PASSWORD=short"), "DB_PASSWORD=***");
        assert_eq!(mask_env_line("DB_HOST=localhost"), "DB_HOST=localhost");
        assert_eq!(mask_env_line("no equals sign"), "no equals sign");
    }

    #[test]
    fn parse_log_metadata_extracts_phase_and_step() {
        let (phase, step, msg) =
            parse_log_metadata("[PHASE: flow] [STEP: submit] action=next on step 1/3");
        assert_eq!(phase.as_deref(), Some("flow"));
        assert_eq!(step.as_deref(), Some("submit"));
        assert_eq!(msg, "action=next on step 1/3");
    }

    #[test]
    fn parse_log_metadata_without_tags_is_unchanged() {
        let (phase, step, msg) = parse_log_metadata("plain message");
        assert!(phase.is_none());
        assert!(step.is_none());
        assert_eq!(msg, "plain message");
    }

    #[test]
    fn json_log_includes_optional_tags() {
        let line = format_json_log(
            "2024-01-01T00:00:00Z",
            Level::Info,
            "install_wizard::engine",
            "hello",
            Some("flow"),
            None,
        );
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["level"], "INFO");
        assert_eq!(value["phase"], "flow");
        assert!(value.get("step").is_none());
    }

    #[test]
    fn human_readable_log_layout() {
        let line = format_human_readable_log(
            "2024-01-01 00:00:00.000",
            Level::Warn,
            "web",
            "hello",
            Some("web"),
            Some("serve"),
        );
        assert_eq!(
            line,
            "[2024-01-01 00:00:00.000] [WARN] [PHASE: web] [STEP: serve] [web] hello"
        );
    }
}
