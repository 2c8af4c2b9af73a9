//! Human and JSON output for CLI commands

use rift_core::domain::{Conflict, ConflictRecord};

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        matches!(self, OutputFormat::Json)
    }
}

/// Trait for formatting CLI output
pub trait OutputFormatter {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    fn warn(&self, message: &str);
    fn info(&self, message: &str);
    fn print_json(&self, value: &serde_json::Value);
}

/// Human-readable output with status marks and indentation
pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn success(&self, message: &str) {
        println!("\u{2713} {}", message);
    }
    fn error(&self, message: &str) {
        eprintln!("\u{2717} Error: {}", message);
    }
    fn warn(&self, message: &str) {
        eprintln!("\u{26a0} Warning: {}", message);
    }
    fn info(&self, message: &str) {
        println!("  {}", message);
    }
    fn print_json(&self, _value: &serde_json::Value) {}
}

/// One JSON document per call on stdout; diagnostics on stderr
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn success(&self, message: &str) {
        println!("{}", serde_json::json!({"success": true, "message": message}));
    }
    fn error(&self, message: &str) {
        eprintln!("{}", serde_json::json!({"success": false, "error": message}));
    }
    fn warn(&self, message: &str) {
        eprintln!("{}", serde_json::json!({"level": "warning", "message": message}));
    }
    fn info(&self, _message: &str) {}
    fn print_json(&self, value: &serde_json::Value) {
        println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Human => Box::new(HumanFormatter),
    }
}

// ============================================================================
// Row rendering
// ============================================================================

/// Header matching [`conflict_row`]
pub const CONFLICT_HEADER: &str =
    "ID (short)     Type        Sev  Reason                          Participants";

/// One table row for a conflict
pub fn conflict_row(conflict: &Conflict) -> String {
    format!(
        "{:<14} {:<11} {:>3}  {:<31} {}",
        truncate(&conflict.id().to_string(), 14),
        conflict.conflict_type().to_string(),
        conflict.severity(),
        truncate(conflict.reason().unwrap_or("-"), 31),
        conflict.participants().join(", ")
    )
}

/// One table row for a history record, prefixed with its state
pub fn record_row(record: &ConflictRecord) -> String {
    let state = match (record.is_resolved(), record.resolution()) {
        (true, Some(res)) => res.status().to_string(),
        (false, Some(res)) if res.is_rolled_back() => "rolled back".to_string(),
        _ => "unresolved".to_string(),
    };
    format!("{:<15} {}", state, conflict_row(record.conflict()))
}

/// Serializes `value`, falling back to `null` for unserializable input
pub fn to_json<T: serde::Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('\u{2026}');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rift_core::domain::{ConflictType, Resolution};

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("0123456789abcdef", 5), "0123\u{2026}");
    }

    #[test]
    fn test_conflict_row_contains_fields() {
        let conflict = Conflict::new(ConflictType::Version, 3)
            .with_participant("modB")
            .with_reason("incompatible version");
        let row = conflict_row(&conflict);

        assert!(row.contains("Version"));
        assert!(row.contains("incompatible version"));
        assert!(row.ends_with("modB"));
    }

    #[test]
    fn test_record_row_states() {
        let conflict = Conflict::new(ConflictType::Path, 1);
        let resolved = ConflictRecord::resolved_by(
            conflict.clone(),
            Resolution::new("auto_merge", "merged").unwrap(),
        );
        assert!(record_row(&resolved).starts_with("merged"));

        let mut reverted = resolved.clone();
        reverted.revert();
        assert!(record_row(&reverted).starts_with("rolled back"));

        let failed = ConflictRecord::unresolved(conflict, "boom");
        assert!(record_row(&failed).starts_with("unresolved"));
    }
}
