use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the content collaborator serving quiz definitions.
    pub content_api_url: String,
    /// Base URL of the grading collaborator receiving finished answer sets.
    pub grading_api_url: String,
    pub bind_addr: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Load environment variables from root .env file (two levels up)
        // Try root .env first, then fallback to local .env
        let skip_root_env = env::var("SKIP_ROOT_ENV").is_ok();
        if skip_root_env {
            dotenvy::dotenv().ok();
        } else if dotenvy::from_path("../../.env").is_err() {
            // Fallback to current directory .env for backward compatibility
            dotenvy::dotenv().ok();
        }

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let config_builder = config::Config::builder()
            // Load base config from TOML file
            .add_source(
                config::File::with_name(&format!("config/{}", env)).required(false), // Allow missing config file, fallback to ENV
            )
            // Override with environment variables (prefix: APP_)
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        let settings = config_builder.build()?;

        let content_api_url = settings
            .get_string("collaborators.content_api_url")
            .or_else(|_| env::var("CONTENT_API_URL"))
            .unwrap_or_else(|_| "http://localhost:8000".to_string());

        let grading_api_url = settings
            .get_string("collaborators.grading_api_url")
            .or_else(|_| env::var("GRADING_API_URL"))
            .unwrap_or_else(|_| "http://localhost:8010".to_string());

        let bind_addr = settings
            .get_string("server.bind_addr")
            .or_else(|_| env::var("BIND_ADDR"))
            .unwrap_or_else(|_| "0.0.0.0:8081".to_string());

        Ok(Config {
            content_api_url,
            grading_api_url,
            bind_addr,
        })
    }
}
