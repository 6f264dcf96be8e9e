//! CLI execution context.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use lila_client::{ApiClient, ClientConfig};
use tracing::debug;

use crate::output::Output;

/// File names looked for in the working directory and its parents.
pub const CONFIG_NAMES: [&str; 3] = ["lila.toml", ".lila.toml", "lila.json"];

/// Execution context for CLI commands.
pub struct Context {
    /// Client configuration.
    pub config: ClientConfig,
    /// Where the configuration came from, if a file was used.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (config, config_path) = if let Some(path) = config_path {
            let path = resolve(&cwd, path);
            let config = ClientConfig::load(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            (config, Some(path))
        } else if let Some(path) = Self::find_config(&cwd) {
            let config = ClientConfig::load(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            (config, Some(path))
        } else {
            let config = ClientConfig::from_env().context("Invalid configuration")?;
            (config, None)
        };

        match &config_path {
            Some(path) => debug!(path = %path.display(), "config loaded"),
            None => debug!("no config file found, using defaults"),
        }

        Ok(Self {
            config,
            config_path,
            output,
            cwd,
        })
    }

    /// Find a config file in the directory tree.
    pub fn find_config(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            for name in &CONFIG_NAMES {
                let candidate = current.join(name);
                if candidate.is_file() {
                    return Some(candidate);
                }
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// A backend client for this configuration.
    pub fn api(&self) -> Result<ApiClient> {
        ApiClient::from_config(&self.config).context("Failed to create the HTTP client")
    }

    /// A backend client that already holds a session token.
    pub fn signed_in_api(&self) -> Result<ApiClient> {
        let api = self.api()?;
        if !api.is_signed_in() {
            anyhow::bail!("Not signed in. Run `lila login` first.");
        }
        Ok(api)
    }
}

fn resolve(cwd: &Path, path: &str) -> PathBuf {
    let path = PathBuf::from(path);
    if path.is_absolute() {
        path
    } else {
        cwd.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("lila-cli-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_find_config_walks_up() {
        let root = scratch_dir("walk");
        let nested = root.join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(root.join("lila.toml"), "").unwrap();

        assert_eq!(Context::find_config(&nested), Some(root.join("lila.toml")));
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_find_config_prefers_toml() {
        let root = scratch_dir("prefer");
        std::fs::write(root.join("lila.json"), "{}").unwrap();
        std::fs::write(root.join(".lila.toml"), "").unwrap();

        assert_eq!(Context::find_config(&root), Some(root.join(".lila.toml")));
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_resolve_relative() {
        let cwd = PathBuf::from("/srv/shop");
        assert_eq!(resolve(&cwd, "conf/lila.toml"), cwd.join("conf/lila.toml"));
        assert_eq!(resolve(&cwd, "/etc/lila.toml"), PathBuf::from("/etc/lila.toml"));
    }
}
