mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Upper bound for `http.max_redirects`.
const MAX_REDIRECTS_LIMIT: usize = 32;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./trackprobe.toml",
        "~/.config/trackprobe/config.toml",
        "/etc/trackprobe/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.source.chunk_size == 0 {
        anyhow::bail!("source.chunk_size cannot be 0");
    }

    if config.http.max_redirects > MAX_REDIRECTS_LIMIT {
        anyhow::bail!(
            "http.max_redirects is {}, the maximum is {}",
            config.http.max_redirects,
            MAX_REDIRECTS_LIMIT
        );
    }

    if config.http.timeout_secs == 0 {
        tracing::warn!("http.timeout_secs is 0, requests will time out immediately");
    }

    Ok(())
}
