use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub socialgraph: SocialGraphConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
}

/// Service-wide configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SocialGraphConfig {
    pub db_path: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_http_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub port: u16,
    /// Directory served for every path that is not an API route.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_http_host(),
            port: default_http_port(),
            static_dir: default_static_dir(),
            allowed_origins: Vec::new(),
        }
    }
}

/// Read path configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
    /// Classification tag stamped on every projected node.
    #[serde(default = "default_node_label")]
    pub node_label: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            node_label: default_node_label(),
        }
    }
}

/// Synthetic dataset configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_relation_count")]
    pub default_relation_count: usize,
    /// Writes run at roughly 10 relationships/second, so this bounds how long
    /// a single reset request can hold the store.
    #[serde(default = "default_max_relation_count")]
    pub max_relation_count: usize,
    #[serde(default = "default_first_names")]
    pub first_names: Vec<String>,
    #[serde(default = "default_last_names")]
    pub last_names: Vec<String>,
    #[serde(default = "default_relation_kinds")]
    pub relation_kinds: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            default_relation_count: default_relation_count(),
            max_relation_count: default_max_relation_count(),
            first_names: default_first_names(),
            last_names: default_last_names(),
            relation_kinds: default_relation_kinds(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_http_host() -> String {
    "127.0.0.1".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_limit() -> usize {
    50
}

fn default_max_limit() -> usize {
    1000
}

fn default_node_label() -> String {
    "Person".to_string()
}

fn default_relation_count() -> usize {
    50
}

fn default_max_relation_count() -> usize {
    300
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn default_first_names() -> Vec<String> {
    owned(&[
        "Alice", "Bob", "Carol", "Dave", "Erin", "Frank", "Grace", "Heidi", "Ivan", "Judy",
        "Mallory", "Niaj", "Olivia", "Peggy", "Rupert", "Sybil", "Trent", "Victor", "Walter",
    ])
}

fn default_last_names() -> Vec<String> {
    owned(&[
        "Smith", "Jones", "Taylor", "Brown", "Williams", "Wilson", "Johnson", "Davies",
        "Robinson", "Wright", "Thompson", "Evans", "Walker", "White", "Roberts",
    ])
}

fn default_relation_kinds() -> Vec<String> {
    owned(&["KNOWS", "LIKES", "DISLIKES", "MANAGES", "REPORTS_TO", "MARRIED_TO", "FOLLOWS"])
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in SOCIALGRAPH_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        // .env is optional
        let _ = dotenv::dotenv();

        let config_path = std::env::var("SOCIALGRAPH_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        Self::from_toml(&config_str)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(config_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(config_str).context("Failed to parse config.toml")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.graph.max_limit == 0 {
            anyhow::bail!("graph.max_limit must be greater than 0");
        }

        if self.graph.default_limit > self.graph.max_limit {
            anyhow::bail!(
                "graph.default_limit ({}) must not exceed graph.max_limit ({})",
                self.graph.default_limit,
                self.graph.max_limit
            );
        }

        if self.graph.node_label.trim().is_empty() {
            anyhow::bail!("graph.node_label must not be empty");
        }

        let generator = &self.generator;
        if generator.default_relation_count > generator.max_relation_count {
            anyhow::bail!(
                "generator.default_relation_count ({}) must not exceed generator.max_relation_count ({})",
                generator.default_relation_count,
                generator.max_relation_count
            );
        }

        for (field, pool) in [
            ("first_names", &generator.first_names),
            ("last_names", &generator.last_names),
            ("relation_kinds", &generator.relation_kinds),
        ] {
            if pool.is_empty() {
                anyhow::bail!("generator.{} must contain at least one entry", field);
            }
            if pool.iter().any(|s| s.trim().is_empty()) {
                anyhow::bail!("generator.{} must not contain blank entries", field);
            }
        }

        Ok(())
    }

    /// Get database path
    pub fn db_path(&self) -> &Path {
        &self.socialgraph.db_path
    }

    /// Get the directory served as the visualization front end
    pub fn static_dir(&self) -> &Path {
        &self.server.static_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serialize config tests that mutate process-wide env so they don't race.
    static CONFIG_TEST_LOCK: Mutex<()> = Mutex::new(());

    const MINIMAL: &str = r#"
[socialgraph]
db_path = "./test.db"
"#;

    fn with_config_env(config_path: &Path, f: impl FnOnce()) {
        let original = std::env::var("SOCIALGRAPH_CONFIG").ok();
        std::env::set_var("SOCIALGRAPH_CONFIG", config_path.to_str().unwrap());
        f();
        std::env::remove_var("SOCIALGRAPH_CONFIG");
        if let Some(val) = original {
            std::env::set_var("SOCIALGRAPH_CONFIG", val);
        }
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::from_toml(MINIMAL).unwrap();
        assert_eq!(config.socialgraph.log_level, "info");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.graph.default_limit, 50);
        assert_eq!(config.graph.node_label, "Person");
        assert_eq!(config.generator.default_relation_count, 50);
        assert!(config.generator.max_relation_count >= 50);
        assert!(!config.generator.first_names.is_empty());
        assert!(!config.generator.relation_kinds.is_empty());
    }

    #[test]
    fn test_config_load_success() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(
            &config_path,
            r#"
[socialgraph]
db_path = "./graph.db"
log_level = "debug"

[server]
port = 9090

[generator]
max_relation_count = 20
default_relation_count = 10
relation_kinds = ["KNOWS"]
"#,
        )
        .unwrap();
        with_config_env(&config_path, || {
            let config = Config::load();
            assert!(config.is_ok(), "Config::load() failed: {:?}", config.err());
            let config = config.unwrap();
            assert_eq!(config.socialgraph.log_level, "debug");
            assert_eq!(config.server.port, 9090);
            assert_eq!(config.generator.max_relation_count, 20);
            assert_eq!(config.generator.relation_kinds, vec!["KNOWS".to_string()]);
        });
    }

    #[test]
    fn test_config_invalid_path() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        with_config_env(Path::new("nonexistent.toml"), || {
            assert!(Config::load().is_err());
        });
    }

    #[test]
    fn test_default_count_above_ceiling_rejected() {
        let err = Config::from_toml(
            r#"
[socialgraph]
db_path = "./test.db"

[generator]
default_relation_count = 500
max_relation_count = 100
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("max_relation_count"));
    }

    #[test]
    fn test_empty_name_pool_rejected() {
        let err = Config::from_toml(
            r#"
[socialgraph]
db_path = "./test.db"

[generator]
last_names = []
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("last_names"));
    }

    #[test]
    fn test_zero_max_limit_rejected() {
        let err = Config::from_toml(
            r#"
[socialgraph]
db_path = "./test.db"

[graph]
max_limit = 0
default_limit = 0
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("max_limit"));
    }
}
