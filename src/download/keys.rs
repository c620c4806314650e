use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;

use super::DownloadError;

/// OAuth consumer keys and access tokens, read from a JSON file.
///
/// Only the consumer pair is needed for app-only authentication; the access
/// tokens are accepted so that existing key files load unchanged.
#[derive(Debug, Clone, Deserialize)]
pub struct Keys {
    pub consumer: String,
    pub consumer_secret: String,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub access_token_secret: Option<String>,
}

impl Keys {
    pub fn load(path: &Path) -> Result<Self, DownloadError> {
        let content = fs::read_to_string(path).map_err(|e| DownloadError::Keys {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| DownloadError::Keys {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// ~/.config/twextender/keys.json
    pub fn default_path() -> Option<PathBuf> {
        let home = dirs::home_dir()?;
        Some(home.join(".config").join("twextender").join("keys.json"))
    }

    /// Value for HTTP basic auth when requesting a bearer token
    pub(crate) fn basic_credentials(&self) -> String {
        STANDARD.encode(format!("{}:{}", self.consumer, self.consumer_secret))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_accepts_full_key_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys.json");
        fs::write(
            &path,
            r#"{"consumer": "ck", "consumer_secret": "cs", "access_token": "at", "access_token_secret": "ats"}"#,
        )
        .unwrap();
        let keys = Keys::load(&path).unwrap();
        assert_eq!(keys.consumer, "ck");
        assert_eq!(keys.access_token.as_deref(), Some("at"));
        assert_eq!(keys.basic_credentials(), "Y2s6Y3M=");
    }

    #[test]
    fn load_reports_missing_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(Keys::load(&missing), Err(DownloadError::Keys { .. })));

        let bad = dir.path().join("bad.json");
        fs::write(&bad, r#"{"consumer": "ck"}"#).unwrap();
        let err = Keys::load(&bad).unwrap_err();
        assert!(err.to_string().contains("consumer_secret"));
    }
}
