use std::{fs, path::Path, path::PathBuf};

use common::crypto::DEFAULT_MODULUS_BITS;
use common::prelude::{PublicKey, SecretKey};
use serde::{Deserialize, Serialize};
use url::Url;

pub const APP_NAME: &str = "sealdrop";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const KEY_FILE_NAME: &str = "key.pem";
pub const PUBLIC_KEY_FILE_NAME: &str = "key.pub.jwk";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Port for the HTTP server
    #[serde(default = "default_port")]
    pub port: u16,
    /// Externally reachable base URL used when building secret links
    ///  (defaults to http://localhost:<port>)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_url: Option<Url>,
    /// Time-to-live applied when a request does not specify one
    #[serde(default = "default_ttl_minutes")]
    pub default_ttl_minutes: u64,
    #[serde(default = "default_min_ttl_minutes")]
    pub min_ttl_minutes: u64,
    #[serde(default = "default_max_ttl_minutes")]
    pub max_ttl_minutes: u64,
    /// Answer 410 for expired secrets. When false, expired and
    ///  unknown ids are indistinguishable (both 404).
    #[serde(default = "default_disclose_expiry")]
    pub disclose_expiry: bool,
    /// How often expired records are swept from memory
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Maximum accepted request body
    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,
}

fn default_port() -> u16 {
    3000
}

fn default_ttl_minutes() -> u64 {
    60
}

fn default_min_ttl_minutes() -> u64 {
    1
}

fn default_max_ttl_minutes() -> u64 {
    7 * 24 * 60
}

fn default_disclose_expiry() -> bool {
    true
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_body_limit_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            public_url: None,
            default_ttl_minutes: default_ttl_minutes(),
            min_ttl_minutes: default_min_ttl_minutes(),
            max_ttl_minutes: default_max_ttl_minutes(),
            disclose_expiry: default_disclose_expiry(),
            sweep_interval_secs: default_sweep_interval_secs(),
            body_limit_bytes: default_body_limit_bytes(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the sealdrop directory (~/.sealdrop)
    pub sealdrop_dir: PathBuf,
    /// Path to the private key (PKCS#8 PEM)
    pub key_path: PathBuf,
    /// Path to the public key (JWK), the file to hand to senders
    pub public_key_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the sealdrop directory path (custom or default ~/.sealdrop)
    pub fn sealdrop_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new sealdrop state directory with a fresh keypair
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
        key_bits: Option<usize>,
    ) -> Result<Self, StateError> {
        let sealdrop_dir = Self::sealdrop_dir(custom_path)?;

        if sealdrop_dir.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        // Generate the key before touching the filesystem so a bad size leaves nothing behind
        let key = SecretKey::generate_with_bits(key_bits.unwrap_or(DEFAULT_MODULUS_BITS))
            .map_err(|e| StateError::InvalidKey(e.to_string()))?;
        let private_pem = key
            .to_pem()
            .map_err(|e| StateError::InvalidKey(e.to_string()))?;
        let public_jwk = key
            .public()
            .to_jwk_string()
            .map_err(|e| StateError::InvalidKey(e.to_string()))?;

        fs::create_dir_all(&sealdrop_dir)?;

        let key_path = sealdrop_dir.join(KEY_FILE_NAME);
        write_private(&key_path, private_pem.as_bytes())?;

        let public_key_path = sealdrop_dir.join(PUBLIC_KEY_FILE_NAME);
        fs::write(&public_key_path, public_jwk)?;

        let config = config.unwrap_or_default();
        let config_path = sealdrop_dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        Ok(Self {
            sealdrop_dir,
            key_path,
            public_key_path,
            config_path,
            config,
        })
    }

    /// Load existing state from the sealdrop directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let sealdrop_dir = Self::sealdrop_dir(custom_path)?;

        if !sealdrop_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let key_path = sealdrop_dir.join(KEY_FILE_NAME);
        let public_key_path = sealdrop_dir.join(PUBLIC_KEY_FILE_NAME);
        let config_path = sealdrop_dir.join(CONFIG_FILE_NAME);

        if !key_path.exists() {
            return Err(StateError::MissingFile(KEY_FILE_NAME.to_string()));
        }
        if !public_key_path.exists() {
            return Err(StateError::MissingFile(PUBLIC_KEY_FILE_NAME.to_string()));
        }
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            sealdrop_dir,
            key_path,
            public_key_path,
            config_path,
            config,
        })
    }

    /// Load the private key from the key file
    pub fn load_key(&self) -> Result<SecretKey, StateError> {
        let pem = fs::read_to_string(&self.key_path)?;
        let key = SecretKey::from_pem(&pem).map_err(|e| StateError::InvalidKey(e.to_string()))?;
        Ok(key)
    }

    /// Load the public key from its JWK file
    pub fn load_public_key(&self) -> Result<PublicKey, StateError> {
        let text = fs::read_to_string(&self.public_key_path)?;
        let key = PublicKey::decode(&text).map_err(|e| StateError::InvalidKey(e.to_string()))?;
        Ok(key)
    }
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> Result<(), StateError> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents)?;
    Ok(())
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> Result<(), StateError> {
    fs::write(path, contents)?;
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("sealdrop directory not initialized. Run 'sealdrop init' first")]
    NotInitialized,

    #[error("sealdrop directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
