//! Session indicator backed by a stored bearer token.
//!
//! The token is read once when the session is opened. Afterwards only
//! `establish` and `invalidate` change it; the backend stays the authority
//! on whether the token is still good.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

use crate::api::{ApiError, TodoBackend};
use crate::models::LoginRequest;
use crate::utils::{self, Profile};

pub const SESSION_FILE: &str = "session.toml";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Could not determine data directory")]
    DataDirError,
    #[error("Failed to read session file: {0}")]
    ReadError(String),
    #[error("Failed to parse session file: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to write session file: {0}")]
    WriteError(String),
    #[error("Login failed: {0}")]
    LoginFailed(#[from] ApiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    LoggedIn,
}

impl SessionState {
    pub fn label(self) -> &'static str {
        match self {
            SessionState::LoggedOut => "Logged out",
            SessionState::LoggedIn => "Logged in",
        }
    }
}

/// Where the token lives between runs
pub trait TokenStore: Send {
    fn load(&self) -> Result<Option<String>, SessionError>;
    fn save(&mut self, token: &str) -> Result<(), SessionError>;
    fn clear(&mut self) -> Result<(), SessionError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
}

/// Token kept under the `token` key of `session.toml`
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store located in the profile's data directory
    pub fn for_profile(profile: Profile) -> Result<Self, SessionError> {
        let data_dir = utils::get_data_dir(profile).ok_or(SessionError::DataDirError)?;
        Ok(Self::new(data_dir.join(SESSION_FILE)))
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, SessionError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)
            .map_err(|e| SessionError::ReadError(e.to_string()))?;
        let file: SessionFile = toml::from_str(&contents)?;
        Ok(file.token.filter(|token| !token.is_empty()))
    }

    fn save(&mut self, token: &str) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| SessionError::WriteError(e.to_string()))?;
        }
        let file = SessionFile {
            token: Some(token.to_string()),
        };
        let contents = toml::to_string(&file)
            .map_err(|e| SessionError::WriteError(format!("Failed to serialize session: {}", e)))?;
        fs::write(&self.path, contents).map_err(|e| SessionError::WriteError(e.to_string()))
    }

    fn clear(&mut self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionError::WriteError(e.to_string())),
        }
    }
}

/// Process-local store; nothing survives the process
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    token: Option<String>,
}

impl MemoryTokenStore {
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Some(token.to_string()),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, SessionError> {
        Ok(self.token.clone())
    }

    fn save(&mut self, token: &str) -> Result<(), SessionError> {
        self.token = Some(token.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), SessionError> {
        self.token = None;
        Ok(())
    }
}

pub struct Session {
    store: Box<dyn TokenStore>,
    token: Option<String>,
}

impl Session {
    pub fn open(store: Box<dyn TokenStore>) -> Result<Self, SessionError> {
        let token = store.load()?;
        debug!(logged_in = token.is_some(), "session opened");
        Ok(Self { store, token })
    }

    pub fn state(&self) -> SessionState {
        if self.token.is_some() {
            SessionState::LoggedIn
        } else {
            SessionState::LoggedOut
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Persist a freshly issued token
    pub fn establish(&mut self, token: String) -> Result<(), SessionError> {
        self.store.save(&token)?;
        self.token = Some(token);
        info!("session established");
        Ok(())
    }

    /// Forget the token (logout)
    pub fn invalidate(&mut self) -> Result<(), SessionError> {
        self.store.clear()?;
        self.token = None;
        info!("session cleared");
        Ok(())
    }

    /// Log in and keep the returned token. Nothing is stored on failure.
    pub async fn login(&mut self, backend: &dyn TodoBackend, request: &LoginRequest) -> Result<(), SessionError> {
        let response = backend.login(request).await?;
        self.establish(response.access_token)
    }
}
