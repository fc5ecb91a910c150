use anyhow::{anyhow, Result};
use std::env;
use std::path::{Path, PathBuf};

pub const DEFAULT_API_PORT: u16 = 4000;
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 7;
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct FlqweenConfig {
    pub api_port: u16,
    pub paths: FlqweenPaths,
    pub auth: AuthConfig,
    pub file: FileConfig,
}

impl FlqweenConfig {
    pub fn from_env() -> Result<Self> {
        let paths = FlqweenPaths::discover()?;
        let api_port = env::var("PORT")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_API_PORT);
        Ok(Self {
            api_port,
            paths,
            auth: AuthConfig::from_env(),
            file: FileConfig::from_env(),
        })
    }

    pub fn new(api_port: u16, paths: FlqweenPaths) -> Self {
        Self {
            api_port,
            paths,
            auth: AuthConfig::default(),
            file: FileConfig::default(),
        }
    }

    pub fn with_auth(api_port: u16, paths: FlqweenPaths, auth: AuthConfig) -> Self {
        Self {
            api_port,
            paths,
            auth,
            file: FileConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Explicit signing secret. When absent a random secret is generated on
    /// first boot and persisted under `keys/`.
    pub jwt_secret: Option<String>,
    pub token_ttl_days: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_days: DEFAULT_TOKEN_TTL_DAYS,
        }
    }
}

impl AuthConfig {
    pub fn from_env() -> Self {
        let jwt_secret = env::var("FLQWEEN_JWT_SECRET").ok().and_then(|raw| {
            if raw.trim().is_empty() {
                None
            } else {
                Some(raw)
            }
        });
        let token_ttl_days = env::var("FLQWEEN_TOKEN_TTL_DAYS")
            .ok()
            .and_then(|raw| raw.parse::<i64>().ok())
            .filter(|days| *days > 0)
            .unwrap_or(DEFAULT_TOKEN_TTL_DAYS);
        Self {
            jwt_secret,
            token_ttl_days,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileConfig {
    pub max_upload_bytes: u64,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl FileConfig {
    pub fn from_env() -> Self {
        let max_upload_bytes = env::var("FLQWEEN_MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);
        Self { max_upload_bytes }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FlqweenPaths {
    pub base: PathBuf,
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub uploads_dir: PathBuf,
    pub keys_dir: PathBuf,
    pub jwt_secret_path: PathBuf,
}

impl FlqweenPaths {
    /// Resolves the base directory from `FLQWEEN_HOME`, falling back to the
    /// current working directory.
    pub fn discover() -> Result<Self> {
        let base = match env::var("FLQWEEN_HOME") {
            Ok(raw) if !raw.trim().is_empty() => PathBuf::from(raw),
            _ => env::current_dir()
                .map_err(|err| anyhow!("failed to resolve working directory: {err}"))?,
        };
        Self::from_base_dir(base)
    }

    pub fn from_base_dir<P: AsRef<Path>>(base: P) -> Result<Self> {
        let base = base.as_ref().to_path_buf();
        let data_dir = base.join("data");
        let db_path = data_dir.join("flqween.db");
        let uploads_dir = base.join("uploads");
        let keys_dir = base.join("keys");
        let jwt_secret_path = keys_dir.join("jwt_secret");

        Ok(Self {
            base,
            data_dir,
            db_path,
            uploads_dir,
            keys_dir,
            jwt_secret_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_derived_from_base() {
        let paths = FlqweenPaths::from_base_dir("/srv/flqween").unwrap();
        assert_eq!(paths.db_path, PathBuf::from("/srv/flqween/data/flqween.db"));
        assert_eq!(paths.uploads_dir, PathBuf::from("/srv/flqween/uploads"));
        assert_eq!(
            paths.jwt_secret_path,
            PathBuf::from("/srv/flqween/keys/jwt_secret")
        );
    }

    #[test]
    fn default_auth_config_uses_seven_day_tokens() {
        let auth = AuthConfig::default();
        assert!(auth.jwt_secret.is_none());
        assert_eq!(auth.token_ttl_days, 7);
    }
}
