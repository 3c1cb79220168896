use anyhow::{Context, Result};
use storage::services::leaderboard::DEFAULT_PARTICIPANTS;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Postgres connection string; the in-memory store is used when unset
    pub database_url: Option<String>,
    pub cors_origin: Option<String>,
    pub default_participants: Vec<String>,
    pub points_seed: Option<u64>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Ok(Self {
            host: non_empty("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: non_empty("PORT")
                .map(|port| port.parse::<u16>())
                .transpose()
                .context("PORT must be a number")?
                .unwrap_or(5000),
            database_url: non_empty("DATABASE_URL"),
            cors_origin: non_empty("CORS_ORIGIN"),
            default_participants: non_empty("DEFAULT_PARTICIPANTS")
                .map(|names| parse_names(&names))
                .unwrap_or_else(|| DEFAULT_PARTICIPANTS.iter().map(|s| s.to_string()).collect()),
            points_seed: non_empty("POINTS_SEED")
                .map(|seed| seed.parse::<u64>())
                .transpose()
                .context("POINTS_SEED must be an unsigned integer")?,
        })
    }
}

fn parse_names(names: &str) -> Vec<String> {
    names
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 5000);
        assert!(config.database_url.is_none());
        assert!(config.points_seed.is_none());
        assert_eq!(config.default_participants.len(), 10);
        assert_eq!(config.default_participants[0], "Rahul");
    }

    #[test]
    fn test_reads_values() {
        let config = config_from(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("DATABASE_URL", "postgres://localhost/leaderboard"),
            ("CORS_ORIGIN", "https://example.com"),
            ("DEFAULT_PARTICIPANTS", " Alice, ,Bob "),
            ("POINTS_SEED", "42"),
        ])
        .unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/leaderboard")
        );
        assert_eq!(config.cors_origin.as_deref(), Some("https://example.com"));
        assert_eq!(config.default_participants, vec!["Alice", "Bob"]);
        assert_eq!(config.points_seed, Some(42));
    }

    #[test]
    fn test_blank_database_url_selects_memory_store() {
        let config = config_from(&[("DATABASE_URL", "  ")]).unwrap();
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_rejects_invalid_port() {
        assert!(config_from(&[("PORT", "not-a-port")]).is_err());
        assert!(config_from(&[("POINTS_SEED", "-1")]).is_err());
    }
}
