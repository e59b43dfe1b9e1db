//! Config types for jlv.

use crate::app::groups::{DEFAULT_MAX_WIDTH, DEFAULT_MIN_WIDTH};
use serde::Deserialize;
use std::path::PathBuf;

/// Default filter program.
pub const DEFAULT_FILTER_TOOL: &str = "jq";

/// Every key the config file accepts, for typo suggestions.
pub const KNOWN_KEYS: &[&str] = &[
    "filter_tool",
    "wrap",
    "line_numbers",
    "log_file",
    "group_list",
    "min_width",
    "max_width",
    "selector",
    "format",
];

/// Raw config file structure (used for parsing).
///
/// Unknown fields are rejected with an error.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
    pub filter_tool: Option<String>,
    pub wrap: Option<bool>,
    pub line_numbers: Option<bool>,
    /// Diagnostic log destination (may contain tilde).
    pub log_file: Option<PathBuf>,
    pub group_list: Option<RawGroupList>,
    /// Default selector when `--selector` is absent.
    pub selector: Option<String>,
    /// Default format when `--output` is absent.
    pub format: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawGroupList {
    pub min_width: Option<u16>,
    pub max_width: Option<u16>,
}

/// Validated config with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// File this config came from, if any.
    pub path: Option<PathBuf>,
    pub filter_tool: String,
    pub wrap: bool,
    pub line_numbers: bool,
    pub log_file: Option<PathBuf>,
    pub list_min_width: u16,
    pub list_max_width: u16,
    pub selector: Option<String>,
    pub format: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: None,
            filter_tool: DEFAULT_FILTER_TOOL.to_string(),
            wrap: false,
            line_numbers: false,
            log_file: None,
            list_min_width: DEFAULT_MIN_WIDTH,
            list_max_width: DEFAULT_MAX_WIDTH,
            selector: None,
            format: None,
        }
    }
}
