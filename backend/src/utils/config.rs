use anyhow::Result;
use std::env;

use crate::constants::DEFAULT_SERVER_PORT;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub messaging_api_url: String,
    pub messaging_api_key: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_SERVER_PORT.to_string())
                .parse()
                .unwrap_or(DEFAULT_SERVER_PORT),
            messaging_api_url: env::var("MESSAGING_API_URL")
                .map_err(|_| anyhow::anyhow!("MESSAGING_API_URL must be set"))?,
            messaging_api_key: env::var("MESSAGING_API_KEY")
                .map_err(|_| anyhow::anyhow!("MESSAGING_API_KEY must be set"))?,
        })
    }
}
