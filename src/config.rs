//! Configuration loading.
//!
//! Settings come from up to three TOML files layered over built-in
//! defaults, later layers overriding earlier ones key by key:
//!
//! 1. `<config dir>/phpintel/config.toml` (user level)
//! 2. `<first project root>/.phpintel.toml` (project level)
//! 3. an explicit `--config PATH`
//!
//! A missing file is skipped silently.  An unreadable or malformed file is
//! logged and skipped, so a bad config never stops the server.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::index::INDEX_FILE_NAME;

/// File name of the per-project config file.
pub const PROJECT_CONFIG_FILE: &str = ".phpintel.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Name of the hidden index file kept in each project root.
    pub index_file: String,
    /// File extensions (without the dot) treated as PHP source.
    pub extensions: Vec<String>,
    /// Pause between files during a whole-project scan.
    pub scan_delay_ms: u64,
    /// Honour `.gitignore` and skip hidden files during discovery.
    pub respect_gitignore: bool,
    /// Tick of the progress indicator animation.
    pub progress_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            index_file: INDEX_FILE_NAME.to_string(),
            extensions: vec!["php".to_string()],
            scan_delay_ms: 10,
            respect_gitignore: false,
            progress_interval_ms: 100,
        }
    }
}

/// One layer as read from disk; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigLayer {
    index_file: Option<String>,
    extensions: Option<Vec<String>>,
    scan_delay_ms: Option<u64>,
    respect_gitignore: Option<bool>,
    progress_interval_ms: Option<u64>,
}

impl Config {
    /// Load the layered configuration for a session whose first project
    /// root is `project_root`, optionally topped by `explicit`.
    pub fn load(project_root: Option<&Path>, explicit: Option<&Path>) -> Self {
        let mut config = Self::default();

        let layers = [
            user_config_path(),
            project_root.map(|root| root.join(PROJECT_CONFIG_FILE)),
            explicit.map(Path::to_path_buf),
        ];
        for path in layers.into_iter().flatten() {
            if let Some(layer) = read_layer(&path) {
                tracing::debug!("phpintel: applying config {}", path.display());
                config.apply(layer);
            }
        }
        config
    }

    /// Parse a single TOML document over the defaults.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        let layer: ConfigLayer = toml::from_str(text)?;
        let mut config = Self::default();
        config.apply(layer);
        Ok(config)
    }

    fn apply(&mut self, layer: ConfigLayer) {
        if let Some(v) = layer.index_file.filter(|v| !v.is_empty()) {
            self.index_file = v;
        }
        if let Some(v) = layer.extensions {
            self.extensions = v
                .into_iter()
                .map(|ext| ext.trim_start_matches('.').to_string())
                .collect();
        }
        if let Some(v) = layer.scan_delay_ms {
            self.scan_delay_ms = v;
        }
        if let Some(v) = layer.respect_gitignore {
            self.respect_gitignore = v;
        }
        if let Some(v) = layer.progress_interval_ms {
            self.progress_interval_ms = v;
        }
    }

    pub fn scan_delay(&self) -> Duration {
        Duration::from_millis(self.scan_delay_ms)
    }

    /// Never zero, so it is always usable as a timer period.
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms.max(1))
    }

    /// Whether `path` has one of the configured source extensions.
    pub fn is_source_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }
}

/// `<platform config dir>/phpintel/config.toml`, if a home directory exists.
fn user_config_path() -> Option<PathBuf> {
    use etcetera::BaseStrategy;

    let strategy = etcetera::choose_base_strategy().ok()?;
    Some(strategy.config_dir().join("phpintel").join("config.toml"))
}

fn read_layer(path: &Path) -> Option<ConfigLayer> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!("phpintel: cannot read config {}: {}", path.display(), e);
            return None;
        }
    };
    match toml::from_str(&text) {
        Ok(layer) => Some(layer),
        Err(e) => {
            tracing::warn!("phpintel: ignoring malformed config {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.index_file, ".phpintel");
        assert_eq!(config.extensions, vec!["php"]);
        assert_eq!(config.scan_delay(), Duration::from_millis(10));
        assert!(!config.respect_gitignore);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = Config::from_toml("scan_delay_ms = 0\nextensions = [\".php\", \"inc\"]\n").unwrap();
        assert_eq!(config.scan_delay_ms, 0);
        assert_eq!(config.extensions, vec!["php", "inc"]);
        assert_eq!(config.index_file, ".phpintel");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::from_toml("colour = \"blue\"").is_err());
    }

    #[test]
    fn project_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(PROJECT_CONFIG_FILE),
            "index_file = \".symbols\"\nrespect_gitignore = true\n",
        )
        .unwrap();

        let config = Config::load(Some(dir.path()), None);
        assert_eq!(config.index_file, ".symbols");
        assert!(config.respect_gitignore);
    }

    #[test]
    fn explicit_file_wins_over_project_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PROJECT_CONFIG_FILE), "scan_delay_ms = 50\n").unwrap();
        let explicit = dir.path().join("override.toml");
        std::fs::write(&explicit, "scan_delay_ms = 1\n").unwrap();

        let config = Config::load(Some(dir.path()), Some(&explicit));
        assert_eq!(config.scan_delay_ms, 1);
    }

    #[test]
    fn malformed_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PROJECT_CONFIG_FILE), "scan_delay_ms = [").unwrap();

        let config = Config::load(Some(dir.path()), None);
        assert_eq!(config.scan_delay_ms, 10);
    }

    #[test]
    fn source_file_detection() {
        let config = Config::default();
        assert!(config.is_source_file(Path::new("/p/User.php")));
        assert!(config.is_source_file(Path::new("/p/Legacy.PHP")));
        assert!(!config.is_source_file(Path::new("/p/readme.md")));
        assert!(!config.is_source_file(Path::new("/p/Makefile")));
    }
}
