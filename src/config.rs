// file: src/config.rs
// description: application configuration management with toml and environment support
// reference: https://docs.rs/config

use crate::error::{MindGardenError, Result};
use crate::utils::validation::Validator;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Flat environment variables documented in `.env.example`, mapped onto
/// their configuration keys. These take precedence over every other source.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("OPENAI_API_KEY", "openai.api_key"),
    ("OPENAI_ORG_ID", "openai.org_id"),
    ("NEO4J_URI", "database.uri"),
    ("NEO4J_USER", "database.user"),
    ("NEO4J_PASSWORD", "database.password"),
    ("LOG_LEVEL", "logging.level"),
    ("MODEL", "agent.model"),
    ("AGENT_NAME", "agent.name"),
];

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub openai: OpenAiConfig,
    pub database: DatabaseConfig,
    pub agent: AgentConfig,
    pub memory: MemoryConfig,
    pub paths: PathConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub org_id: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub name: Option<String>,
    pub max_connections: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentConfig {
    pub name: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Number of most recent turns sent to the model.
    pub history_window: usize,
    pub max_tool_rounds: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryBackend {
    Memory,
    Graph,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MemoryConfig {
    pub backend: MemoryBackend,
    pub retrieval_limit: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathConfig {
    pub data_dir: PathBuf,
    pub logs_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_level: String,
    pub max_file_size_mb: u64,
    pub retention_days: u64,
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// Same as [`Config::load`] but reads the flat variables through `lookup`,
    /// which keeps the layering testable without touching the process
    /// environment.
    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = config::Config::try_from(&Self::default_config())
            .map_err(|e| MindGardenError::Config(e.to_string()))?;

        let mut builder = config::Config::builder().add_source(defaults);

        builder = match path {
            Some(path) => builder.add_source(config::File::from(path)),
            None => builder
                .add_source(config::File::from(Path::new("config/default.toml")).required(false)),
        };

        builder = builder.add_source(
            config::Environment::with_prefix("MINDGARDEN")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        for (var, key) in ENV_OVERRIDES {
            let value = lookup(var).filter(|v| !v.trim().is_empty());
            builder = builder
                .set_override_option(*key, value)
                .map_err(|e| MindGardenError::Config(e.to_string()))?;
        }

        let settings = builder
            .build()
            .map_err(|e| MindGardenError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| MindGardenError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            openai: OpenAiConfig {
                api_key: String::new(),
                org_id: None,
                base_url: "https://api.openai.com/v1".to_string(),
                timeout_secs: 120,
            },
            database: DatabaseConfig {
                uri: "bolt://localhost:7687".to_string(),
                user: "neo4j".to_string(),
                password: "password".to_string(),
                name: None,
                max_connections: 8,
            },
            agent: AgentConfig {
                name: "Quinn".to_string(),
                model: "gpt-4o".to_string(),
                temperature: 0.7,
                max_tokens: None,
                history_window: 10,
                max_tool_rounds: 5,
            },
            memory: MemoryConfig {
                backend: MemoryBackend::Memory,
                retrieval_limit: 5,
            },
            paths: PathConfig {
                data_dir: PathBuf::from("data"),
                logs_dir: PathBuf::from("logs"),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_level: "debug".to_string(),
                max_file_size_mb: 10,
                retention_days: 7,
            },
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.openai.api_key.trim().is_empty()
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.paths.data_dir, &self.paths.logs_dir] {
            std::fs::create_dir_all(dir)
                .map_err(|e| MindGardenError::file_operation(dir.clone(), e))?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        Validator::validate_temperature(self.agent.temperature)
            .map_err(|e| MindGardenError::Config(e.to_string()))?;

        Validator::validate_bolt_uri(&self.database.uri)
            .map_err(|e| MindGardenError::Config(e.to_string()))?;

        if self.agent.history_window == 0 {
            return Err(MindGardenError::Config(
                "history_window must be greater than 0".to_string(),
            ));
        }

        if self.agent.max_tool_rounds == 0 {
            return Err(MindGardenError::Config(
                "max_tool_rounds must be greater than 0".to_string(),
            ));
        }

        if self.memory.retrieval_limit == 0 {
            return Err(MindGardenError::Config(
                "retrieval_limit must be greater than 0".to_string(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(MindGardenError::Config(
                "max_connections must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
