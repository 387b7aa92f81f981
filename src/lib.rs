#[macro_use]
extern crate serde;

use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::api::http::ApiClient;
use crate::config::Config;
use crate::error::{ClientError, ConfigurationError};
use crate::store::auth::AuthStore;
use crate::store::quiz::QuizStore;
use crate::store::storage::FileStorage;

pub mod api;
pub mod config;
pub mod data;
pub mod error;
pub mod resp;
pub mod role;
pub mod route;
pub mod session;
pub mod store;
pub mod util;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

/// Everything a front end needs, wired to one API root.
#[derive(Debug, Clone)]
pub struct Client {
    pub config: Config,
    pub auth: AuthStore,
    pub api: ApiClient,
    pub quizzes: QuizStore<ApiClient>,
}

impl Client {
    pub fn new(config: Config) -> Result<Client, ClientError> {
        let auth = AuthStore::new(FileStorage::new(config.session_file()));
        let api = ApiClient::new(&config, auth.clone())?;
        let quizzes = QuizStore::new(Arc::new(api.clone()));

        Ok(Client {
            config,
            auth,
            api,
            quizzes,
        })
    }
}

pub async fn create(log_level: Option<Level>) -> Result<Client, ClientError> {
    if let Some(l) = log_level {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(l)
            .with_writer(std::io::stderr)
            .finish();

        if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("Unable to set global logger: {}", err);
        };
    }

    #[cfg(feature = "env-file")]
    {
        tracing::info!("Reading .env file...");
        if dotenv::dotenv().is_err() {
            tracing::warn!("Unable to load .env file.");
        }
    }

    tracing::info!("Loading configuration...");
    let c = match Config::load() {
        Ok(c) => {
            tracing::info!("Configuration loaded.");
            c
        }
        Err(ConfigurationError::NotFound(_)) => {
            let c = Config::default();
            if c.save().is_err() {
                tracing::warn!("Unable to save generated configuration.");
            }
            c
        }
        Err(other) => {
            tracing::error!("Configuration error: {}", other);
            return Err(other.into());
        }
    };

    tracing::info!("Using API root: {}", c.api_root);
    Client::new(c)
}
