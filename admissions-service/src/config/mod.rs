use anyhow::Result;
use dotenvy::dotenv;
use secrecy::Secret;
use serde::Deserialize;
use std::env;

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub database: DatabaseConfig,
    pub service_name: String,
    pub log_level: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let db_url =
            env::var("ADMISSIONS_DATABASE_URL").expect("ADMISSIONS_DATABASE_URL must be set");
        let max_connections = env::var("ADMISSIONS_DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()?;
        let min_connections = env::var("ADMISSIONS_DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| "1".to_string())
            .parse()?;
        let log_level = env::var("ADMISSIONS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            database: DatabaseConfig {
                url: Secret::new(db_url),
                max_connections,
                min_connections,
            },
            service_name: "admissions-service".to_string(),
            log_level,
        })
    }
}
