use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use super::auth::Session;
use crate::error::ClientError;

/// Where the auth session survives restarts.
pub trait SessionStorage: Send + Sync {
    fn load(&self) -> Result<Option<Session>, ClientError>;
    fn save(&self, session: &Session) -> Result<(), ClientError>;
    fn clear(&self) -> Result<(), ClientError>;
}

/// JSON file named after the configured storage name.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> FileStorage {
        FileStorage { path: path.into() }
    }
}

impl SessionStorage for FileStorage {
    fn load(&self) -> Result<Option<Session>, ClientError> {
        match fs::read(&self.path) {
            Ok(data) => Ok(Some(serde_json::from_slice(&data)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, session: &Session) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(session)?)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    session: Mutex<Option<Session>>,
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> Result<Option<Session>, ClientError> {
        Ok(self
            .session
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone())
    }

    fn save(&self, session: &Session) -> Result<(), ClientError> {
        *self.session.lock().unwrap_or_else(|p| p.into_inner()) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        *self.session.lock().unwrap_or_else(|p| p.into_inner()) = None;
        Ok(())
    }
}
