//! Reading, parsing and validating the YAML config.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::app::groups::{DEFAULT_MAX_WIDTH, DEFAULT_MIN_WIDTH};
use crate::config::error::ConfigError;
use crate::config::types::{Config, RawConfig, DEFAULT_FILTER_TOOL, KNOWN_KEYS};
use crate::pipeline::runner::MIN_BOUND_WIDTH;
use tracing::info;

/// Resolve a leading `~` component against the home directory.
///
/// Anything else, including `~user/...`, is returned as given.
pub fn expand_path(path: &Path) -> PathBuf {
    let mut components = path.components();
    match (components.next(), dirs::home_dir()) {
        (Some(Component::Normal(first)), Some(home)) if first == "~" => {
            home.join(components.as_path())
        }
        _ => path.to_path_buf(),
    }
}

/// Load the discovered config, or defaults when there is none.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let config = parse(path, &content)?;
    info!(path = %path.display(), "config loaded");
    Ok(config)
}

/// Parse and validate config text read from `path`.
pub fn parse(path: &Path, content: &str) -> Result<Config, ConfigError> {
    let raw: RawConfig = if content.trim().is_empty() {
        RawConfig::default()
    } else {
        serde_saphyr::from_str(content).map_err(|e| {
            ConfigError::from_parse_message(path.to_path_buf(), e.to_string(), KNOWN_KEYS)
        })?
    };
    validate(path, raw)
}

fn validate(path: &Path, raw: RawConfig) -> Result<Config, ConfigError> {
    let invalid = |message: String| ConfigError::Validation {
        path: path.to_path_buf(),
        message,
    };

    let filter_tool = raw
        .filter_tool
        .unwrap_or_else(|| DEFAULT_FILTER_TOOL.to_string());
    if filter_tool.trim().is_empty() {
        return Err(invalid("filter_tool must not be empty".into()));
    }

    let group_list = raw.group_list.unwrap_or_default();
    let min_width = group_list.min_width.unwrap_or(DEFAULT_MIN_WIDTH);
    let max_width = group_list
        .max_width
        .unwrap_or(DEFAULT_MAX_WIDTH.max(min_width));
    if (min_width as usize) < MIN_BOUND_WIDTH {
        return Err(invalid(format!(
            "group_list.min_width must be at least {}, got {}",
            MIN_BOUND_WIDTH, min_width
        )));
    }
    if min_width > max_width {
        return Err(invalid(format!(
            "group_list.min_width ({}) is larger than group_list.max_width ({})",
            min_width, max_width
        )));
    }

    Ok(Config {
        path: Some(path.to_path_buf()),
        filter_tool,
        wrap: raw.wrap.unwrap_or(false),
        line_numbers: raw.line_numbers.unwrap_or(false),
        log_file: raw.log_file.as_deref().map(expand_path),
        list_min_width: min_width,
        list_max_width: max_width,
        selector: raw.selector,
        format: raw.format,
    })
}
