use config::ConfigError;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use url::Url;

use std::fmt;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub geocoding: GeocodingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub user: String,
    #[serde(skip_serializing, default = "empty_secret")]
    pub password: SecretString,
    /// Connection target without credentials, e.g. `postgres://db:5432/rentals`
    /// or `sqlite:///var/lib/rentals/rentals.db`.
    pub connect_string: String,
    pub pool_min: u32,
    pub pool_max: u32,
    pub pool_increment: u32,
    pub acquire_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory uploaded objects are written under.
    pub base_path: String,
    /// Public URL prefix the stored objects are served from.
    pub public_base_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeocodingConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
}

fn empty_secret() -> SecretString {
    SecretString::from(String::new())
}

impl Config {
    /// Load configuration from environment variables, with defaults.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?)
            // Override with environment variables using `RENTALS__` prefix and `__` separator
            // e.g., RENTALS__DATABASE__PASSWORD="secret"
            .add_source(
                config::Environment::with_prefix("RENTALS")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl DatabaseConfig {
    /// Checks that credentials and pool bounds are usable.
    ///
    /// Runs before any connection attempt; a failure here is fatal at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.user.trim().is_empty() {
            return Err(ConfigError::NotFound("database.user".to_string()));
        }
        if self.password.expose_secret().is_empty() {
            return Err(ConfigError::NotFound("database.password".to_string()));
        }
        if self.connect_string.trim().is_empty() {
            return Err(ConfigError::NotFound("database.connect_string".to_string()));
        }
        if self.pool_max == 0 {
            return Err(ConfigError::Message(
                "database.pool_max must be at least 1".to_string(),
            ));
        }
        if self.pool_min > self.pool_max {
            return Err(ConfigError::Message(format!(
                "database.pool_min ({}) exceeds database.pool_max ({})",
                self.pool_min, self.pool_max
            )));
        }
        if self.pool_increment == 0 {
            return Err(ConfigError::Message(
                "database.pool_increment must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Constructs the database connection string.
    ///
    /// Credentials are injected into targets that carry a network authority.
    /// File-based targets are returned unchanged.
    pub fn connection_string(&self) -> Result<SecretString, ConfigError> {
        let mut url = Url::parse(&self.connect_string).map_err(|e| {
            ConfigError::Message(format!("Invalid database connect string: {}", e))
        })?;

        let has_authority = url.host_str().is_some_and(|host| !host.is_empty());
        if !has_authority {
            return Ok(SecretString::from(self.connect_string.clone()));
        }

        url.set_username(&self.user)
            .and_then(|_| url.set_password(Some(self.password.expose_secret())))
            .map_err(|_| {
                ConfigError::Message("Database connect string cannot carry credentials".to_string())
            })?;

        Ok(SecretString::from(url.to_string()))
    }
}

// Credentials and target have no usable default and must come from the environment
impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            user: String::new(),
            password: empty_secret(),
            connect_string: String::new(),
            pool_min: 1,
            pool_max: 10,
            pool_increment: 1,
            acquire_timeout_seconds: 30,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_path: "./storage".to_string(),
            public_base_url: "http://localhost:3000/uploads".to_string(),
        }
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: "Rentals/0.1 (rentals-backend)".to_string(),
            timeout_seconds: 10,
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Use serde to serialize to pretty JSON
        // Password is automatically skipped due to #[serde(skip_serializing)]
        match serde_json::to_string_pretty(&self) {
            Ok(json) => write!(f, "{}", json),
            Err(_) => write!(f, "Error serializing config"),
        }
    }
}
