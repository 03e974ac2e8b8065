use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub api_keys: Option<ApiKeysConfig>,
    pub model: Option<ModelConfig>,
    pub export: Option<ExportConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiKeysConfig {
    pub openai_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelConfig {
    pub name: Option<String>,
    pub base_url: Option<String>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    /// One of `xlsx`, `csv`, `json`, `markdown`.
    pub format: Option<String>,
    pub output: Option<String>,
}

/// Platform config directory path: `<config_dir>/kashaf/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("kashaf").join("config.toml"))
}

/// Load config by cascading CWD `.kashaf.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".kashaf.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparseable config file");
            None
        }
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        api_keys: Some(ApiKeysConfig {
            openai_key: overlay
                .api_keys
                .as_ref()
                .and_then(|a| a.openai_key.clone())
                .or_else(|| base.api_keys.as_ref().and_then(|a| a.openai_key.clone())),
        }),
        model: Some(ModelConfig {
            name: overlay
                .model
                .as_ref()
                .and_then(|m| m.name.clone())
                .or_else(|| base.model.as_ref().and_then(|m| m.name.clone())),
            base_url: overlay
                .model
                .as_ref()
                .and_then(|m| m.base_url.clone())
                .or_else(|| base.model.as_ref().and_then(|m| m.base_url.clone())),
            temperature: overlay
                .model
                .as_ref()
                .and_then(|m| m.temperature)
                .or_else(|| base.model.as_ref().and_then(|m| m.temperature)),
        }),
        export: Some(ExportConfig {
            format: overlay
                .export
                .as_ref()
                .and_then(|e| e.format.clone())
                .or_else(|| base.export.as_ref().and_then(|e| e.format.clone())),
            output: overlay
                .export
                .as_ref()
                .and_then(|e| e.output.clone())
                .or_else(|| base.export.as_ref().and_then(|e| e.output.clone())),
        }),
    }
}

/// Save the current config to the platform config directory.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf, String> {
    let path = config_path().ok_or_else(|| "Could not determine config directory".to_string())?;
    save_to_path(config, &path)?;
    Ok(path)
}

/// Write `config` as TOML to `path`, creating parent directories.
pub fn save_to_path(config: &ConfigFile, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let content =
        toml::to_string_pretty(config).map_err(|e| format!("Failed to serialize config: {}", e))?;
    std::fs::write(path, content).map_err(|e| format!("Failed to write config: {}", e))?;
    Ok(())
}
