//! Hugging Face access token resolution.
//!
//! Public models need no token, but private or gated ones (and anonymous
//! rate limits) do. Checks in order:
//! 1. The configured token (`HUGGINGFACE_API_TOKEN` / `--hf-token`)
//! 2. `HF_TOKEN` environment variable
//! 3. Hugging Face CLI cache (`~/.cache/huggingface/token`)

use crate::error::BotError;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Hugging Face environment variable for authentication tokens.
const HF_TOKEN_ENV_VAR: &str = "HF_TOKEN";

/// Where a token was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenSource {
    Settings,
    EnvVar,
    HfCache,
}

impl TokenSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenSource::Settings => "settings",
            TokenSource::EnvVar => "env_var",
            TokenSource::HfCache => "hf_cache",
        }
    }
}

/// A resolved token and its origin.
#[derive(Clone)]
pub struct HfToken {
    pub value: String,
    pub source: TokenSource,
}

impl std::fmt::Debug for HfToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HfToken")
            .field("value", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// Resolve a token from the settings, the environment or the CLI cache.
pub fn resolve_token(explicit: Option<&str>) -> Option<HfToken> {
    let env_value = std::env::var(HF_TOKEN_ENV_VAR).ok();
    let cache_path = dirs::home_dir().map(|home| hf_cache_token_path(&home));
    resolve_token_from(explicit, env_value.as_deref(), cache_path.as_deref())
}

/// Location of the token written by `huggingface-cli login`.
pub fn hf_cache_token_path(home: &Path) -> PathBuf {
    home.join(".cache").join("huggingface").join("token")
}

fn resolve_token_from(
    explicit: Option<&str>,
    env_value: Option<&str>,
    cache_path: Option<&Path>,
) -> Option<HfToken> {
    if let Some(value) = non_empty(explicit) {
        return Some(HfToken {
            value,
            source: TokenSource::Settings,
        });
    }

    if let Some(value) = non_empty(env_value) {
        return Some(HfToken {
            value,
            source: TokenSource::EnvVar,
        });
    }

    let cached = cache_path.and_then(read_cached_token);
    non_empty(cached.as_deref()).map(|value| HfToken {
        value,
        source: TokenSource::HfCache,
    })
}

fn read_cached_token(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => {
            warn!("Ignoring Hugging Face token cache: {}", BotError::io_with_path(e, path));
            None
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cache_with(content: &str) -> (TempDir, PathBuf) {
        let temp = TempDir::new().unwrap();
        let path = hf_cache_token_path(temp.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        (temp, path)
    }

    #[test]
    fn test_explicit_token_wins() {
        let (_temp, path) = cache_with("hf_cached");
        let token = resolve_token_from(Some(" hf_explicit "), Some("hf_env"), Some(&path)).unwrap();
        assert_eq!(token.value, "hf_explicit");
        assert_eq!(token.source, TokenSource::Settings);
    }

    #[test]
    fn test_env_var_before_cache() {
        let (_temp, path) = cache_with("hf_cached");
        let token = resolve_token_from(Some(""), Some("hf_env"), Some(&path)).unwrap();
        assert_eq!(token.value, "hf_env");
        assert_eq!(token.source, TokenSource::EnvVar);
    }

    #[test]
    fn test_cache_file_is_trimmed() {
        let (_temp, path) = cache_with("hf_cached\n");
        let token = resolve_token_from(None, None, Some(&path)).unwrap();
        assert_eq!(token.value, "hf_cached");
        assert_eq!(token.source.as_str(), "hf_cache");
    }

    #[test]
    fn test_blank_sources_resolve_to_none() {
        let (_temp, path) = cache_with("   \n");
        assert!(resolve_token_from(Some("  "), Some(""), Some(&path)).is_none());
        assert!(resolve_token_from(None, None, None).is_none());
    }

    #[test]
    fn test_missing_or_unreadable_cache_is_skipped() {
        let temp = TempDir::new().unwrap();
        let missing = hf_cache_token_path(temp.path());
        assert!(resolve_token_from(None, None, Some(&missing)).is_none());
        // A directory where the file should be.
        assert!(resolve_token_from(None, None, Some(temp.path())).is_none());
    }

    #[test]
    fn test_debug_hides_value() {
        let token = HfToken {
            value: "hf_secret".into(),
            source: TokenSource::EnvVar,
        };
        assert!(!format!("{:?}", token).contains("hf_secret"));
    }
}
