use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

/// Overrides for the fixed invocation made by `twextender-launch`
#[derive(Debug, Default, Clone, Deserialize)]
pub struct LaunchConfig {
    #[serde(default)]
    pub interpreter: Option<String>,
    #[serde(default)]
    pub program: Option<String>,
    #[serde(default)]
    pub target_date: Option<String>,
    #[serde(default)]
    pub journal_dir: Option<String>,
    #[serde(default)]
    pub tweets_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub quiet: bool,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub keys_file: Option<PathBuf>,
    #[serde(default)]
    pub lock_timeout_secs: Option<u64>,
    #[serde(default)]
    pub transaction_expiry_secs: Option<u64>,
    #[serde(default)]
    pub rate_limit_wait_secs: Option<u64>,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub download_category: Option<String>,
    #[serde(default)]
    pub launch: LaunchConfig,
}

impl Config {
    pub fn load() -> Self {
        Self::load_internal(false)
    }

    pub fn load_quiet() -> Self {
        Self::load_internal(true)
    }

    fn load_internal(quiet: bool) -> Self {
        Self::load_from(Self::get_config_paths(), quiet)
    }

    /// First candidate that reads and parses wins
    fn load_from(paths: Vec<PathBuf>, quiet: bool) -> Self {
        for path in paths {
            let Ok(content) = fs::read_to_string(&path) else {
                continue;
            };
            match toml::from_str::<Config>(&content) {
                Ok(config) => {
                    if !quiet {
                        eprintln!("Using twextender config {}", path.display());
                    }
                    return config;
                }
                Err(e) if !quiet => {
                    eprintln!("Warning: ignoring config {}: {}", path.display(), e);
                }
                Err(_) => {}
            }
        }

        Self::default()
    }

    fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. Explicit override
        if let Some(path) = std::env::var_os("TWEXTENDER_CONFIG") {
            paths.push(PathBuf::from(path));
        }

        // 2. XDG config: ~/.config/twextender/config.toml (Linux/cross-platform)
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".config").join("twextender").join("config.toml"));
        }

        // 3. macOS Application Support: ~/Library/Application Support/twextender/config.toml
        if let Some(config_dir) = dirs::config_dir() {
            let macos_path = config_dir.join("twextender").join("config.toml");
            if !paths.contains(&macos_path) {
                paths.push(macos_path);
            }
        }

        // 4. Home directory: ~/.twextender.toml
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".twextender.toml"));
        }

        paths
    }
}
