use std::{env, path::PathBuf};

use actix_web::cookie::Key;

use crate::errors::AppError;

/// Runtime settings, read from the environment (and `.env` via dotenvy).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub port: u16,
    pub session_key: Vec<u8>,
    pub static_dir: PathBuf,
    pub fonts_dir: PathBuf,
}

// actix cookie keys need at least 512 bits of material
const MIN_SESSION_KEY_LEN: usize = 64;

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let session_key = lookup("SESSION_KEY")
            .ok_or_else(|| AppError::Config("SESSION_KEY environment variable not set".into()))?;
        if session_key.len() < MIN_SESSION_KEY_LEN {
            return Err(AppError::Config(format!(
                "SESSION_KEY must be at least {} bytes long",
                MIN_SESSION_KEY_LEN
            )));
        }

        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| AppError::Config(format!("invalid PORT '{}': {}", raw, e)))?,
            None => 8080,
        };

        Ok(Config {
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://oficina_admin.db".to_owned()),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_owned()),
            port,
            session_key: session_key.into_bytes(),
            static_dir: lookup("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("static")),
            fonts_dir: lookup("FONTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("fonts")),
        })
    }

    pub fn cookie_key(&self) -> Key {
        Key::from(self.session_key.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn applies_defaults() {
        let key = "k".repeat(64);
        let config = Config::from_lookup(lookup_from(&[("SESSION_KEY", &key)])).unwrap();
        assert_eq!(config.database_url, "sqlite://oficina_admin.db");
        assert_eq!(config.bind_addr, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.static_dir, PathBuf::from("static"));
        assert_eq!(config.fonts_dir, PathBuf::from("fonts"));
    }

    #[test]
    fn rejects_missing_or_short_session_key() {
        assert!(matches!(
            Config::from_lookup(lookup_from(&[])),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            Config::from_lookup(lookup_from(&[("SESSION_KEY", "short")])),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn rejects_bad_port() {
        let key = "k".repeat(64);
        let result = Config::from_lookup(lookup_from(&[("SESSION_KEY", &key), ("PORT", "http")]));
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
