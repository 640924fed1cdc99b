//! Configuration loading for fitgend.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag, must exist)
//! 2. `~/.fitgen/config.toml` (user)
//! 3. `/etc/fitgen/config.toml` (system)
//! 4. built-in defaults
//!
//! Secrets are loaded separately with mandatory permission checks:
//! 1. `~/.fitgen/secrets.toml` (user, must be 0600 or 0400)
//! 2. `/etc/fitgen/secrets.toml` (system, same rule)
//!
//! Keys missing from the secrets file fall back to `GEMINI_API_KEY`,
//! `OPENAI_API_KEY` and `PEXELS_API_KEY`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use crate::cache::{self, FileStore, LocalResponseCache};
use crate::providers::{gemini, pexels, speech};
use crate::resolver::{ModelResolver, ResolverPolicy};
use crate::{FitgenError, Result};

/// Server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Server network configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:8080).
    #[serde(default = "default_address")]
    pub address: String,
    /// Largest accepted request body in bytes (default: 10 MiB, for photos).
    #[serde(default = "default_body_limit")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            max_body_bytes: default_body_limit(),
        }
    }
}

fn default_address() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_body_limit() -> usize {
    10 * 1024 * 1024
}

/// Upstream provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProvidersConfig {
    /// Transport timeout per upstream request, in seconds (default: 60).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub images: ImagesConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            gemini: GeminiConfig::default(),
            speech: SpeechConfig::default(),
            images: ImagesConfig::default(),
        }
    }
}

fn default_timeout() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    #[serde(default = "default_gemini_url")]
    pub base_url: String,
    /// Replaces the static text model list used when discovery yields nothing.
    #[serde(default)]
    pub text_models: Option<Vec<String>>,
    /// Replaces the static vision model list.
    #[serde(default)]
    pub vision_models: Option<Vec<String>>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: default_gemini_url(),
            text_models: None,
            vision_models: None,
        }
    }
}

fn default_gemini_url() -> String {
    gemini::DEFAULT_BASE_URL.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpeechConfig {
    #[serde(default = "default_speech_url")]
    pub base_url: String,
    /// Speech models in preference order.
    #[serde(default)]
    pub models: Option<Vec<String>>,
    #[serde(default = "default_voice")]
    pub voice: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            base_url: default_speech_url(),
            models: None,
            voice: default_voice(),
        }
    }
}

fn default_speech_url() -> String {
    speech::DEFAULT_BASE_URL.to_string()
}

fn default_voice() -> String {
    speech::DEFAULT_VOICE.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImagesConfig {
    #[serde(default = "default_images_url")]
    pub base_url: String,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            base_url: default_images_url(),
        }
    }
}

fn default_images_url() -> String {
    pexels::DEFAULT_BASE_URL.to_string()
}

/// Image cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cache directory (default: the platform cache dir, e.g. `~/.cache/fitgen`).
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_ttl_days")]
    pub ttl_days: u64,
    #[serde(default = "default_cache_version")]
    pub version: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
            ttl_days: default_ttl_days(),
            version: default_cache_version(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_ttl_days() -> u64 {
    7
}

fn default_cache_version() -> String {
    cache::IMAGE_CACHE_VERSION.to_string()
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// An explicit path must exist. Without one, the first existing standard
    /// file wins; if none exists the built-in defaults are used.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => {
                info!("no config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            FitgenError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            FitgenError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(FitgenError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".fitgen").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        let system_config = PathBuf::from("/etc/fitgen/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.providers.timeout_secs)
    }

    pub fn text_resolver(&self) -> Result<ModelResolver> {
        match &self.providers.gemini.text_models {
            Some(models) => {
                ModelResolver::new(ResolverPolicy::gemini_text().static_fallback(models.clone()))
            }
            None => Ok(ModelResolver::gemini_text()),
        }
    }

    pub fn vision_resolver(&self) -> Result<ModelResolver> {
        match &self.providers.gemini.vision_models {
            Some(models) => {
                ModelResolver::new(ResolverPolicy::gemini_vision().static_fallback(models.clone()))
            }
            None => Ok(ModelResolver::gemini_vision()),
        }
    }

    pub fn speech_resolver(&self) -> Result<ModelResolver> {
        match &self.providers.speech.models {
            Some(models) => {
                ModelResolver::new(ResolverPolicy::speech().static_fallback(models.clone()))
            }
            None => Ok(ModelResolver::speech()),
        }
    }

    /// Build the durable image cache, or `None` when disabled or no cache
    /// directory can be determined.
    pub fn image_cache(&self) -> Option<Arc<LocalResponseCache>> {
        if !self.cache.enabled {
            return None;
        }
        let dir = self.cache.dir.clone().or_else(FileStore::default_dir)?;
        info!(dir = %dir.display(), version = %self.cache.version, "image cache enabled");
        Some(Arc::new(LocalResponseCache::new(
            Arc::new(FileStore::new(dir)),
            self.cache.version.clone(),
            self.cache_ttl(),
        )))
    }

    /// Image cache entry lifetime. Oversized `ttl_days` values saturate.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_days.saturating_mul(24 * 3600))
    }
}

/// Secrets configuration (API keys).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Secrets {
    #[serde(default)]
    pub gemini: Option<ApiKeySecret>,
    #[serde(default)]
    pub openai: Option<ApiKeySecret>,
    #[serde(default)]
    pub pexels: Option<ApiKeySecret>,
}

/// A single API key secret.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeySecret {
    pub api_key: String,
}

/// Upstream service whose key is looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Gemini,
    OpenAi,
    Pexels,
}

impl Service {
    fn env_var(self) -> &'static str {
        match self {
            Service::Gemini => "GEMINI_API_KEY",
            Service::OpenAi => "OPENAI_API_KEY",
            Service::Pexels => "PEXELS_API_KEY",
        }
    }
}

impl Secrets {
    /// Load secrets from the standard locations with permission checks.
    ///
    /// Returns empty secrets if no file exists (keys may come from env vars).
    pub fn load() -> Result<Self> {
        if let Some(home) = dirs::home_dir() {
            let user_secrets = home.join(".fitgen").join("secrets.toml");
            if user_secrets.exists() {
                return Self::load_from_file(&user_secrets);
            }
        }

        let system_secrets = PathBuf::from("/etc/fitgen/secrets.toml");
        if system_secrets.exists() {
            return Self::load_from_file(&system_secrets);
        }

        Ok(Secrets::default())
    }

    /// Load a secrets file after checking its permissions.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        Self::check_permissions(path)?;
        let content = fs::read_to_string(path).map_err(|e| {
            FitgenError::Configuration(format!("Failed to read secrets file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            FitgenError::Configuration(format!("Failed to parse secrets file {path:?}: {e}"))
        })
    }

    /// Reject secrets files readable by group or others.
    #[cfg(unix)]
    fn check_permissions(path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let metadata = fs::metadata(path).map_err(|e| {
            FitgenError::Configuration(format!("Failed to stat secrets file {path:?}: {e}"))
        })?;

        let mode = metadata.permissions().mode();
        if mode & 0o077 != 0 {
            return Err(FitgenError::Configuration(format!(
                "Secrets file {path:?} has insecure permissions {:o}. Must be 0600 or 0400.",
                mode & 0o777
            )));
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn check_permissions(_path: &Path) -> Result<()> {
        Ok(())
    }

    /// Key for `service`, falling back to its environment variable.
    /// Blank values count as missing.
    pub fn api_key(&self, service: Service) -> Option<String> {
        let from_file = match service {
            Service::Gemini => self.gemini.as_ref(),
            Service::OpenAi => self.openai.as_ref(),
            Service::Pexels => self.pexels.as_ref(),
        }
        .map(|s| s.api_key.clone());

        from_file
            .or_else(|| std::env::var(service.env_var()).ok())
            .filter(|k| !k.trim().is_empty())
    }
}
