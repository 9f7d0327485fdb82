//! Session Token Persistence
//!
//! The backend token is the only persisted artifact. It is kept as a single
//! site-wide cookie (`token=...; Path=/`) with a fixed lifetime, and cleared
//! by overwriting it with an already-expired value.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Cookie name carrying the session token
pub const TOKEN_COOKIE: &str = "token";

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// The persisted token cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub value: String,
    pub path: String,
    pub expires_at: DateTime<Utc>,
}

impl SessionCookie {
    /// Cookie for `token` valid for `max_age` from now
    pub fn new(token: impl Into<String>, max_age: std::time::Duration) -> Self {
        let max_age = Duration::from_std(max_age).unwrap_or_else(|_| Duration::days(1));
        Self {
            value: token.into(),
            path: "/".to_string(),
            expires_at: Utc::now() + max_age,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.value.is_empty() || self.expires_at <= Utc::now()
    }

    /// `Set-Cookie` rendering
    pub fn to_header(&self) -> String {
        let max_age = (self.expires_at - Utc::now()).num_seconds().max(0);
        format!(
            "{}={}; Path={}; Max-Age={}; Expires={}",
            TOKEN_COOKIE,
            self.value,
            self.path,
            max_age,
            self.expires_at.format(HTTP_DATE_FORMAT)
        )
    }

    /// The value written on logout
    pub fn cleared_header() -> String {
        format!(
            "{}=; Path=/; Expires=Thu, 01 Jan 1970 00:00:01 GMT",
            TOKEN_COOKIE
        )
    }

    /// Parse a `Set-Cookie` style line; `None` if it is not the token cookie
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.trim().split(';').map(str::trim);
        let (name, value) = parts.next()?.split_once('=')?;
        if name != TOKEN_COOKIE {
            return None;
        }

        let mut path = "/".to_string();
        let mut expires_at = None;
        let mut max_age_expiry = None;

        for attr in parts {
            let (key, val) = attr.split_once('=').unwrap_or((attr, ""));
            match key.to_ascii_lowercase().as_str() {
                "path" => path = val.to_string(),
                "expires" => {
                    expires_at = chrono::NaiveDateTime::parse_from_str(val, HTTP_DATE_FORMAT)
                        .ok()
                        .map(|naive| Utc.from_utc_datetime(&naive));
                }
                // Expires wins when both are present
                "max-age" => {
                    max_age_expiry = val
                        .parse::<i64>()
                        .ok()
                        .map(|secs| Utc::now() + Duration::seconds(secs));
                }
                _ => {}
            }
        }

        Some(Self {
            value: value.to_string(),
            path,
            expires_at: expires_at.or(max_age_expiry).unwrap_or_else(Utc::now),
        })
    }
}

/// Token persistence errors
#[derive(Error, Debug)]
pub enum TokenStoreError {
    #[error("Failed to access {path:?}: {error}")]
    Io { path: PathBuf, error: String },
}

/// Where the session token lives between runs
pub trait TokenStore: Send + Sync {
    /// The stored cookie, if present and not expired
    fn load(&self) -> Result<Option<SessionCookie>, TokenStoreError>;

    /// Persist a new cookie
    fn save(&self, cookie: &SessionCookie) -> Result<(), TokenStoreError>;

    /// Overwrite with an expired value
    fn clear(&self) -> Result<(), TokenStoreError>;
}

/// Cookie line kept in a file
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, line: &str) -> Result<(), TokenStoreError> {
        let io_err = |e: std::io::Error| TokenStoreError::Io {
            path: self.path.clone(),
            error: e.to_string(),
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        // temp file then rename into place
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, format!("{}\n", line)).map_err(io_err)?;
        restrict_permissions(&tmp);
        std::fs::rename(&tmp, &self.path).map_err(io_err)
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)) {
        tracing::warn!("Could not restrict permissions on {:?}: {}", path, e);
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) {}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<SessionCookie>, TokenStoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(TokenStoreError::Io {
                    path: self.path.clone(),
                    error: e.to_string(),
                })
            }
        };

        Ok(content
            .lines()
            .find_map(SessionCookie::parse)
            .filter(|cookie| !cookie.is_expired()))
    }

    fn save(&self, cookie: &SessionCookie) -> Result<(), TokenStoreError> {
        self.write(&cookie.to_header())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        self.write(&SessionCookie::cleared_header())
    }
}

/// In-process store, for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    cookie: Mutex<Option<SessionCookie>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with a cookie
    pub fn with_cookie(cookie: SessionCookie) -> Self {
        Self {
            cookie: Mutex::new(Some(cookie)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<SessionCookie>, TokenStoreError> {
        let cookie = self.cookie.lock().unwrap_or_else(|e| e.into_inner());
        Ok(cookie.clone().filter(|c| !c.is_expired()))
    }

    fn save(&self, cookie: &SessionCookie) -> Result<(), TokenStoreError> {
        *self.cookie.lock().unwrap_or_else(|e| e.into_inner()) = Some(cookie.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        *self.cookie.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}
