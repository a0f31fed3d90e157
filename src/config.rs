use anyhow::Context;
use std::time::Duration;

pub const DEFAULT_SELF_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATABASE_PATH: &str = "storage/storefront.db";
pub const DEFAULT_BUSY_TIMEOUT: &str = "5s";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub self_addr: String,
    pub port: u16,
    pub database_path: String,
    /// How long a write waits for the database lock before failing
    pub busy_timeout: Duration,
}

/// Loads `.env` into the process environment, creating an empty one if missing
pub fn load_env_file() -> Result<(), anyhow::Error> {
    match std::fs::File::open(".env") {
        Ok(_) => envmnt::load_file(".env")?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            std::fs::File::create(".env")?;
            envmnt::load_file(".env")?;
        }
        Err(err) => {
            return Err(anyhow::anyhow!("Unable to open .env file: {err}"));
        }
    }
    Ok(())
}

pub fn parse_duration(duration: &str) -> Result<Duration, anyhow::Error> {
    duration_str::parse(duration.trim())
        .map_err(|dur| anyhow::anyhow!("Unable to parse duration {dur}"))
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let port = match envmnt::get_parse("PORT") {
            Ok(port) => port,
            Err(envmnt::errors::EnvmntError::Missing(_)) => DEFAULT_PORT,
            Err(err) => return Err(anyhow::anyhow!("Invalid PORT: {err}")),
        };
        let busy_timeout = parse_duration(&envmnt::get_or(
            "SQLITE_BUSY_TIMEOUT",
            DEFAULT_BUSY_TIMEOUT,
        ))
        .context("Invalid SQLITE_BUSY_TIMEOUT")?;
        Ok(Self {
            self_addr: envmnt::get_or("SELF_ADDR", DEFAULT_SELF_ADDR),
            port,
            database_path: envmnt::get_or("DATABASE_PATH", DEFAULT_DATABASE_PATH),
            busy_timeout,
        })
    }
}
