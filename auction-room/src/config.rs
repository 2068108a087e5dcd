// Configuration loading and parsing (auction.toml, server.toml).

use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::auction::{AuctionRules, Crores};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub auction: AuctionConfig,
    pub ws_host: String,
    pub ws_port: u16,
    pub db_path: String,
    pub data_paths: DataPaths,
}

impl Config {
    /// Engine rules assembled from the `[rules]` and `[timer]` tables.
    pub fn rules(&self) -> AuctionRules {
        let r = &self.auction.rules;
        AuctionRules {
            purse: r.purse,
            max_squad: r.max_squad,
            max_overseas: r.max_overseas,
            domestic_country: r.domestic_country.clone(),
            min_increment: r.min_increment,
            timer_limit: self.auction.timer.limit_secs,
            bid_reset_secs: self.auction.timer.bid_reset_secs,
            max_retentions: r.max_retentions,
            max_rtm: r.max_rtm,
        }
    }

    /// (team_id, team_name) pairs in file order.
    pub fn team_pairs(&self) -> Vec<(String, String)> {
        self.auction
            .teams
            .iter()
            .map(|t| (t.id.clone(), t.name.clone()))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// auction.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct AuctionConfig {
    pub rules: RulesSection,
    pub timer: TimerSection,
    pub teams: Vec<TeamEntry>,
}

/// Money fields are written in crores (`purse = 120.0`).
#[derive(Debug, Clone, Deserialize)]
pub struct RulesSection {
    pub purse: Crores,
    pub max_squad: usize,
    pub max_overseas: usize,
    pub domestic_country: String,
    pub min_increment: Crores,
    pub max_retentions: u32,
    pub max_rtm: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimerSection {
    pub limit_secs: u32,
    pub bid_reset_secs: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamEntry {
    pub id: String,
    pub name: String,
}

// ---------------------------------------------------------------------------
// server.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct ServerFile {
    websocket: WebsocketSection,
    database: DatabaseSection,
    data_paths: DataPaths,
}

#[derive(Debug, Clone, Deserialize)]
struct WebsocketSection {
    #[serde(default = "default_ws_host")]
    host: String,
    port: u16,
}

fn default_ws_host() -> String {
    "127.0.0.1".into()
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub players: String,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/auction.toml` and `config/server.toml` relative
/// to `base_dir`. Does not copy defaults; see `load_config()`.
pub(crate) fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    let auction_path = config_dir.join("auction.toml");
    let auction: AuctionConfig = parse_file(&auction_path)?;

    let server_path = config_dir.join("server.toml");
    let server: ServerFile = parse_file(&server_path)?;

    let config = Config {
        auction,
        ws_host: server.websocket.host,
        ws_port: server.websocket.port,
        db_path: server.database.path,
        data_paths: server.data_paths,
    };

    validate(&config)?;

    Ok(config)
}

/// Files the room reads from `config/`.
const CONFIG_FILES: [&str; 2] = ["auction.toml", "server.toml"];

/// Copy any of [`CONFIG_FILES`] missing from `config/` out of `defaults/`.
/// Existing files are never overwritten. Returns the paths written.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() && !config_dir.exists() {
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "neither defaults/ nor config/ directory found in {}",
                base_dir.display()
            ),
        });
    }

    let copy_err = |message: String| ConfigError::DefaultsCopyError { message };
    let mut copied = Vec::new();
    for name in CONFIG_FILES {
        let source = defaults_dir.join(name);
        let target = config_dir.join(name);
        if target.exists() || !source.is_file() {
            continue;
        }
        std::fs::create_dir_all(&config_dir)
            .map_err(|e| copy_err(format!("failed to create config directory: {e}")))?;
        std::fs::copy(&source, &target)
            .map_err(|e| copy_err(format!("failed to copy {}: {e}", source.display())))?;
        copied.push(target);
    }

    Ok(copied)
}

/// Loads config relative to the current working directory, copying
/// defaults first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn parse_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = read_file(path)?;
    toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let rules = &config.auction.rules;

    let money_fields: &[(&str, Crores)] = &[
        ("rules.purse", rules.purse),
        ("rules.min_increment", rules.min_increment),
    ];
    for (name, val) in money_fields {
        if !val.is_positive() {
            return Err(invalid(name, format!("must be > 0, got {val}")));
        }
    }

    if rules.max_squad == 0 {
        return Err(invalid("rules.max_squad", "must be > 0"));
    }
    if rules.max_overseas > rules.max_squad {
        return Err(invalid(
            "rules.max_overseas",
            format!(
                "must not exceed max_squad ({}), got {}",
                rules.max_squad, rules.max_overseas
            ),
        ));
    }
    if rules.domestic_country.trim().is_empty() {
        return Err(invalid("rules.domestic_country", "must not be empty"));
    }

    let timer = &config.auction.timer;
    if timer.limit_secs == 0 {
        return Err(invalid("timer.limit_secs", "must be > 0"));
    }
    if timer.bid_reset_secs == 0 {
        return Err(invalid("timer.bid_reset_secs", "must be > 0"));
    }

    if config.auction.teams.is_empty() {
        return Err(invalid("teams", "at least one team is required"));
    }
    let mut seen = HashSet::new();
    for team in &config.auction.teams {
        if team.name.trim().is_empty() {
            return Err(invalid("teams.name", format!("team `{}` has an empty name", team.id)));
        }
        if !seen.insert(team.name.to_lowercase()) {
            return Err(invalid("teams.name", format!("duplicate team name `{}`", team.name)));
        }
    }

    if config.data_paths.players.trim().is_empty() {
        return Err(invalid("data_paths.players", "must not be empty"));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Crate root containing defaults/, whether tests run from the crate or
    /// the workspace root.
    fn project_root() -> PathBuf {
        let cwd = std::env::current_dir().unwrap();
        if cwd.join("defaults").exists() {
            cwd
        } else if cwd.join("auction-room/defaults").exists() {
            cwd.join("auction-room")
        } else {
            panic!("Cannot locate defaults/ directory from CWD {:?}", cwd);
        }
    }

    /// Temp dir with config/ populated from defaults/, auction.toml
    /// optionally rewritten by `edit`.
    fn temp_config(name: &str, edit: impl Fn(String) -> String) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let config_dir = tmp.join("config");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&config_dir).unwrap();

        let root = project_root();
        let auction = fs::read_to_string(root.join("defaults/auction.toml")).unwrap();
        fs::write(config_dir.join("auction.toml"), edit(auction)).unwrap();
        fs::copy(root.join("defaults/server.toml"), config_dir.join("server.toml")).unwrap();
        tmp
    }

    fn expect_validation_error(tmp: &Path, field: &str) {
        let err = load_config_from(tmp).unwrap_err();
        match err {
            ConfigError::ValidationError { field: f, .. } => assert_eq!(f, field),
            other => panic!("expected ValidationError for {field}, got: {other}"),
        }
        let _ = fs::remove_dir_all(tmp);
    }

    #[test]
    fn load_valid_config_from_default_files() {
        let tmp = temp_config("auction_config_defaults", |s| s);
        let config = load_config_from(&tmp).expect("should load valid config");

        let rules = config.rules();
        assert_eq!(rules, AuctionRules::default());
        assert_eq!(config.auction.teams.len(), 10);
        assert_eq!(config.team_pairs()[0].1, "Chennai Super Kings");

        assert_eq!(config.ws_host, "127.0.0.1");
        assert_eq!(config.ws_port, 9001);
        assert_eq!(config.db_path, "auction-room.db");
        assert_eq!(config.data_paths.players, "data/players.csv");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_purse() {
        let tmp = temp_config("auction_config_zero_purse", |s| {
            s.replace("purse = 120.0", "purse = 0.0")
        });
        expect_validation_error(&tmp, "rules.purse");
    }

    #[test]
    fn rejects_zero_timer_limit() {
        let tmp = temp_config("auction_config_zero_timer", |s| {
            s.replace("limit_secs = 30", "limit_secs = 0")
        });
        expect_validation_error(&tmp, "timer.limit_secs");
    }

    #[test]
    fn rejects_overseas_above_squad() {
        let tmp = temp_config("auction_config_overseas", |s| {
            s.replace("max_overseas = 8", "max_overseas = 30")
        });
        expect_validation_error(&tmp, "rules.max_overseas");
    }

    #[test]
    fn rejects_duplicate_team_names() {
        let tmp = temp_config("auction_config_dup_team", |s| {
            s.replace("Mumbai Indians", "Chennai Super Kings")
        });
        expect_validation_error(&tmp, "teams.name");
    }

    #[test]
    fn file_not_found_for_missing_server_toml() {
        let tmp = temp_config("auction_config_missing_server", |s| s);
        fs::remove_file(tmp.join("config/server.toml")).unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        match err {
            ConfigError::FileNotFound { path } => assert!(path.ends_with("server.toml")),
            other => panic!("expected FileNotFound, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = temp_config("auction_config_invalid", |_| "[rules\npurse = ".into());
        let err = load_config_from(&tmp).unwrap_err();
        match err {
            ConfigError::ParseError { path, .. } => assert!(path.ends_with("auction.toml")),
            other => panic!("expected ParseError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_copies_missing_files() {
        let tmp = std::env::temp_dir().join("auction_config_ensure_copies");
        let _ = fs::remove_dir_all(&tmp);
        let defaults_dir = tmp.join("defaults");
        fs::create_dir_all(&defaults_dir).unwrap();

        let root = project_root();
        fs::copy(root.join("defaults/auction.toml"), defaults_dir.join("auction.toml")).unwrap();
        fs::copy(root.join("defaults/server.toml"), defaults_dir.join("server.toml")).unwrap();
        fs::write(defaults_dir.join("notes.txt"), "scratch\n").unwrap();

        let copied = ensure_config_files(&tmp).expect("should succeed");
        assert_eq!(copied.len(), 2);
        assert!(tmp.join("config/auction.toml").exists());
        assert!(!tmp.join("config/notes.txt").exists());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_skips_existing() {
        let tmp = std::env::temp_dir().join("auction_config_ensure_skips");
        let _ = fs::remove_dir_all(&tmp);
        let defaults_dir = tmp.join("defaults");
        let config_dir = tmp.join("config");
        fs::create_dir_all(&defaults_dir).unwrap();
        fs::create_dir_all(&config_dir).unwrap();

        let root = project_root();
        fs::copy(root.join("defaults/auction.toml"), defaults_dir.join("auction.toml")).unwrap();
        fs::copy(root.join("defaults/server.toml"), defaults_dir.join("server.toml")).unwrap();
        fs::write(config_dir.join("auction.toml"), "# custom\n").unwrap();

        let copied = ensure_config_files(&tmp).expect("should succeed");
        assert_eq!(copied.len(), 1);
        assert!(copied[0].ends_with("server.toml"));
        let content = fs::read_to_string(config_dir.join("auction.toml")).unwrap();
        assert_eq!(content, "# custom\n");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_errors_when_both_dirs_missing() {
        let tmp = std::env::temp_dir().join("auction_config_both_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        let err = ensure_config_files(&tmp).unwrap_err();
        match &err {
            ConfigError::DefaultsCopyError { message } => {
                assert!(message.contains("neither defaults/ nor config/"));
            }
            other => panic!("expected DefaultsCopyError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }
}
