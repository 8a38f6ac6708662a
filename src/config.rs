use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
}

impl Config {
    /// Reads `.env` if present, then the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let port = match dotenv::var("PORT") {
            Ok(port) => port.parse().with_context(|| format!("PORT={port:?} is not a port number"))?,
            Err(_) => 5000,
        };

        Ok(Self {
            database_url: dotenv::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://watchparty.db?mode=rwc".to_owned()),
            host: dotenv::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_owned()),
            port,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
