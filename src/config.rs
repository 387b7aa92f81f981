use crate::error::ConfigurationError;
use crate::util;
use std::env;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub static DEFAULT_AUTH_HEADER: &str = "x-auth-token";
pub static DEFAULT_STORAGE_NAME: &str = "auth-storage";

fn default_api_root() -> String {
    env::var("CBT_API_ROOT").unwrap_or("http://localhost:5000/api".to_string())
}

fn default_auth_header() -> String {
    DEFAULT_AUTH_HEADER.to_string()
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from(env::var("CBT_STORAGE_DIR").unwrap_or("./storage".to_string()))
}

fn default_storage_name() -> String {
    DEFAULT_STORAGE_NAME.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip)]
    file_path: PathBuf,

    #[serde(default = "default_api_root")]
    pub api_root: String,
    #[serde(default = "default_auth_header")]
    pub auth_header: String,

    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,
    #[serde(default = "default_storage_name")]
    pub storage_name: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            file_path: config_dir().join("settings.yml"),
            api_root: default_api_root(),
            auth_header: default_auth_header(),
            storage_dir: default_storage_dir(),
            storage_name: default_storage_name(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[inline]
fn config_dir() -> PathBuf {
    PathBuf::from(env::var("CONFIG_DIR").unwrap_or("./config".to_string()))
}

impl Config {
    pub fn load() -> Result<Config, ConfigurationError> {
        let config_file = util::find_first_subpath(
            config_dir(),
            &["settings.yml", "settings.yaml"],
            Path::exists,
        )
        .ok_or_else(|| ConfigurationError::NotFound(config_dir()))?;

        let file = File::open(&config_file)?;
        let mut config: Config = serde_yaml::from_reader(BufReader::new(file))?;
        config.file_path = config_file;

        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigurationError> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(&self.file_path)?;
        let mut out = BufWriter::new(file);
        serde_yaml::to_writer(&mut out, self)?;
        out.flush()?;
        Ok(())
    }

    /// API root with a trailing slash so relative endpoint paths join under it.
    pub fn api_root(&self) -> Result<Url, ConfigurationError> {
        let mut root = self.api_root.clone();
        if !root.ends_with('/') {
            root.push('/');
        }
        Ok(Url::parse(&root)?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn session_file(&self) -> PathBuf {
        self.storage_dir.join(format!("{}.json", self.storage_name))
    }
}
