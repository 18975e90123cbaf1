use anyhow::Context;
use deploygate_core::config::{config_path, Config, DEFAULT_CONFIG_FILE};
use std::path::{Path, PathBuf};

fn cwd() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Load the config.
///
/// Priority:
/// 1. `--config` flag / `DEPLOYGATE_CONFIG` env var (passed in as `explicit`)
/// 2. `deploygate.yaml` in the working directory, when present
/// 3. Built-in defaults
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    match config_path(explicit, &cwd()) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            Config::load(&path).with_context(|| format!("failed to load {}", path.display()))
        }
        None => Ok(Config::default()),
    }
}

/// Where `config init` writes: the explicit path, or `./deploygate.yaml`.
pub fn config_target(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| cwd().join(DEFAULT_CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_target_wins() {
        let dir = TempDir::new().unwrap();
        let explicit = dir.path().join("other.yaml");
        assert_eq!(config_target(Some(&explicit)), explicit);
    }

    #[test]
    fn explicit_file_is_loaded() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("gate.yaml");
        std::fs::write(&file, "listen: 127.0.0.1:9999\n").unwrap();
        assert_eq!(load_config(Some(&file)).unwrap().listen, "127.0.0.1:9999");
    }

    #[test]
    fn missing_explicit_file_names_the_path() {
        let dir = TempDir::new().unwrap();
        let err = load_config(Some(&dir.path().join("nope.yaml"))).unwrap_err();
        assert!(format!("{err:#}").contains("nope.yaml"));
    }
}
