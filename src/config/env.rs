//! Environment variable substitution and template file resolution.

use crate::error::ConfigError;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Maximum size for a template file (1MB).
const MAX_TEMPLATE_FILE_SIZE: u64 = 1024 * 1024;

static ENV_VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid regex")
});

/// Resolves `${VAR_NAME}` patterns in a string.
///
/// Every undefined variable is reported in a single error.
pub fn resolve_env_vars(value: &str) -> Result<String, ConfigError> {
    let mut result = value.to_string();
    let mut missing = Vec::new();

    for cap in ENV_VAR_PATTERN.captures_iter(value) {
        let full_match = &cap[0];
        let var_name = &cap[1];

        match std::env::var(var_name) {
            Ok(var_value) => {
                result = result.replace(full_match, &var_value);
            }
            Err(_) => missing.push(var_name.to_string()),
        }
    }

    if missing.is_empty() {
        Ok(result)
    } else {
        Err(ConfigError::ValidationError(format!(
            "undefined environment variable{}: {}",
            if missing.len() > 1 { "s" } else { "" },
            missing.join(", ")
        )))
    }
}

/// Collects named template sources from inline definitions and files.
///
/// Relative file paths are resolved against `config_dir`. A name defined
/// both inline and as a file is an error.
pub fn resolve_template_sources(
    inline: &BTreeMap<String, String>,
    files: &BTreeMap<String, PathBuf>,
    config_dir: &Path,
) -> Result<BTreeMap<String, String>, ConfigError> {
    let mut sources = inline.clone();

    for (name, file_path) in files {
        if sources.contains_key(name) {
            return Err(ConfigError::InvalidTemplate {
                name: name.clone(),
                message: "defined both inline and as a file".to_string(),
            });
        }
        let content = read_template_file(file_path, config_dir).map_err(|message| {
            ConfigError::InvalidTemplate {
                name: name.clone(),
                message,
            }
        })?;
        tracing::debug!(template = %name, path = %file_path.display(), "Loaded template file");
        sources.insert(name.clone(), content);
    }

    Ok(sources)
}

fn read_template_file(file_path: &Path, config_dir: &Path) -> Result<String, String> {
    let path = if file_path.is_absolute() {
        file_path.to_path_buf()
    } else {
        config_dir.join(file_path)
    };

    let metadata = std::fs::metadata(&path)
        .map_err(|e| format!("cannot read template file '{}': {}", path.display(), e))?;

    if metadata.len() > MAX_TEMPLATE_FILE_SIZE {
        return Err(format!(
            "template file '{}' exceeds maximum size of 1MB ({} bytes)",
            path.display(),
            metadata.len()
        ));
    }

    std::fs::read_to_string(&path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::InvalidData {
            format!("template file '{}' must be valid UTF-8", path.display())
        } else {
            format!("cannot read template file '{}': {}", path.display(), e)
        }
    })
}
