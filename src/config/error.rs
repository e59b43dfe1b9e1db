//! Config errors, printed compiler-style with the offending location and,
//! for misspelled keys, the closest known key.

use std::fmt;
use std::path::{Path, PathBuf};
use strsim::jaro_winkler;

const SIMILARITY_THRESHOLD: f64 = 0.8;

/// Error loading or parsing a config file.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// YAML parse error.
    Parse {
        path: PathBuf,
        message: String,
        line: Option<usize>,
        column: Option<usize>,
        suggestion: Option<String>,
    },

    /// The YAML parsed but a value is out of range.
    Validation { path: PathBuf, message: String },
}

impl ConfigError {
    /// Build a parse error from the YAML deserializer's message.
    ///
    /// Locations are recovered from the "line N column M" text, and unknown
    /// keys get the closest entry of `known` as a suggestion.
    pub fn from_parse_message(path: PathBuf, message: String, known: &[&str]) -> Self {
        let line = number_after(&message, "line ");
        let column = number_after(&message, "column ");
        let suggestion = unknown_field(&message).and_then(|field| suggest(field, known));
        ConfigError::Parse {
            path,
            message,
            line,
            column,
            suggestion,
        }
    }

    fn path(&self) -> &Path {
        match self {
            ConfigError::Io { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Validation { path, .. } => path,
        }
    }

    /// `path[:line[:column]]`
    fn location(&self) -> String {
        let path = self.path().display();
        match self {
            ConfigError::Parse {
                line: Some(l),
                column: Some(c),
                ..
            } => format!("{}:{}:{}", path, l, c),
            ConfigError::Parse { line: Some(l), .. } => format!("{}:{}", path, l),
            _ => path.to_string(),
        }
    }
}

/// Rendered like a compiler diagnostic:
///
/// ```text
/// error: unknown field `wrapp`
///   --> jlv.yaml:2:1
///   |
///   = help: did you mean `wrap`?
/// ```
impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headline = match self {
            ConfigError::Io { .. } => "cannot read config file",
            ConfigError::Parse { message, .. } | ConfigError::Validation { message, .. } => {
                message.as_str()
            }
        };
        writeln!(f, "error: {}", headline)?;
        writeln!(f, "  --> {}", self.location())?;
        writeln!(f, "  |")?;
        match self {
            ConfigError::Io { source, .. } => writeln!(f, "  = {}", source),
            ConfigError::Parse {
                suggestion: Some(name),
                ..
            } => writeln!(f, "  = help: did you mean `{}`?", name),
            _ => Ok(()),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// The field named in serde's "unknown field `x`" message.
fn unknown_field(message: &str) -> Option<&str> {
    let rest = &message[message.find("unknown field")? + "unknown field".len()..];
    let start = rest.find('`')? + 1;
    let len = rest[start..].find('`')?;
    Some(&rest[start..start + len])
}

fn number_after(message: &str, label: &str) -> Option<usize> {
    let rest = &message[message.find(label)? + label.len()..];
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Closest known name to `name`, if any is similar enough.
pub fn suggest(name: &str, known: &[&str]) -> Option<String> {
    known
        .iter()
        .filter(|&&k| jaro_winkler(name, k) >= SIMILARITY_THRESHOLD)
        .max_by(|a, b| {
            jaro_winkler(name, a)
                .partial_cmp(&jaro_winkler(name, b))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KNOWN: &[&str] = &["wrap", "line_numbers", "filter_tool"];

    #[test]
    fn test_unknown_field_extraction() {
        assert_eq!(
            unknown_field("unknown field `wrapp`, expected one of `wrap`"),
            Some("wrapp")
        );
        assert_eq!(unknown_field("invalid type: string"), None);
    }

    #[test]
    fn test_suggest_closest() {
        assert_eq!(suggest("line_number", KNOWN), Some("line_numbers".into()));
        assert_eq!(suggest("zzz", KNOWN), None);
    }

    #[test]
    fn test_parse_message_location_and_help() {
        let err = ConfigError::from_parse_message(
            PathBuf::from("jlv.yaml"),
            "unknown field `filtr_tool` at line 3 column 1".into(),
            KNOWN,
        );
        let text = err.to_string();
        assert!(text.contains("jlv.yaml:3:1"), "{}", text);
        assert!(text.contains("did you mean `filter_tool`?"), "{}", text);
    }

    #[test]
    fn test_validation_format() {
        let err = ConfigError::Validation {
            path: PathBuf::from("/etc/jlv.yaml"),
            message: "bad width".into(),
        };
        assert_eq!(err.to_string(), "error: bad width\n  --> /etc/jlv.yaml\n  |\n");
    }
}
