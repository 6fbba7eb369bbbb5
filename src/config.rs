use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::sync::OnceLock;

/// When the resume is pushed to the artifact store relative to the
/// submission checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResumeUploadOrder {
    /// Upload as soon as the multipart body is read, then submit.
    #[default]
    First,
    /// Validate and probe for a prior application before uploading.
    Last,
}

impl FromStr for ResumeUploadOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" => Ok(Self::First),
            "last" => Ok(Self::Last),
            other => Err(format!("expected `first` or `last`, got `{}`", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub public_rps: u32,
    pub admin_rps: u32,
    pub admin_notify_email: String,
    pub public_base_url: String,
    pub mail_relay_url: Option<String>,
    pub mail_relay_secret: Option<String>,
    pub uploads_dir: String,
    pub resume_upload_order: ResumeUploadOrder,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            jwt_secret: get_env("JWT_SECRET")?,
            public_rps: get_env_parse("PUBLIC_RPS")?,
            admin_rps: get_env_parse("ADMIN_RPS")?,
            admin_notify_email: get_env("ADMIN_NOTIFY_EMAIL")?,
            public_base_url: get_base_url("PUBLIC_BASE_URL")?,
            mail_relay_url: env::var("MAIL_RELAY_URL").ok().filter(|v| !v.trim().is_empty()),
            mail_relay_secret: env::var("MAIL_RELAY_SECRET").ok(),
            uploads_dir: env::var("UPLOADS_DIR").unwrap_or_else(|_| "./uploads".to_string()),
            resume_upload_order: match env::var("RESUME_UPLOAD_ORDER") {
                Ok(raw) => raw.parse().map_err(|e| {
                    Error::Config(format!("Invalid value for RESUME_UPLOAD_ORDER: {}", e))
                })?,
                Err(_) => ResumeUploadOrder::default(),
            },
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse<T>(name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get_env(name)?;
    raw.parse()
        .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)))
}

fn get_base_url(name: &str) -> Result<String> {
    let raw = get_env(name)?;
    url::Url::parse(&raw)
        .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)))?;
    Ok(raw.trim_end_matches('/').to_string())
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_order_parses_case_insensitively() {
        assert_eq!("LAST".parse::<ResumeUploadOrder>(), Ok(ResumeUploadOrder::Last));
        assert_eq!(" first ".parse::<ResumeUploadOrder>(), Ok(ResumeUploadOrder::First));
        assert!("sometimes".parse::<ResumeUploadOrder>().is_err());
    }
}
