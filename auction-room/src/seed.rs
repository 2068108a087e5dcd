// Player seed data loading (players.csv).

use serde::Deserialize;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use tracing::warn;

use crate::auction::{Crores, Player, Role};
use crate::config::DataPaths;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Raw CSV row (private)
// ---------------------------------------------------------------------------

/// One row of players.csv. Extra columns are ignored.
#[derive(Debug, Deserialize)]
struct RawPlayer {
    id: u32,
    name: String,
    role: String,
    country: String,
    /// Crores, e.g. `2.00`.
    base_price: f64,
    #[serde(default)]
    set_name: String,
    #[serde(default)]
    set_order: Option<u32>,
    #[serde(default)]
    previous_team: Option<String>,
}

// ---------------------------------------------------------------------------
// Reader-based loader (private, testable without temp files)
// ---------------------------------------------------------------------------

fn load_players_from_reader<R: Read>(rdr: R) -> Result<Vec<Player>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut players = Vec::new();
    let mut seen_ids = HashSet::new();
    let mut seen_names = HashSet::new();

    for result in reader.deserialize::<RawPlayer>() {
        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                warn!("skipping malformed player row: {}", e);
                continue;
            }
        };
        let name = raw.name.trim();

        let Some(role) = Role::from_str_role(&raw.role) else {
            warn!("skipping player '{}': unknown role '{}'", name, raw.role);
            continue;
        };
        if !raw.base_price.is_finite() || raw.base_price <= 0.0 {
            warn!("skipping player '{}': invalid base price {}", name, raw.base_price);
            continue;
        }
        if !seen_ids.insert(raw.id) {
            warn!("skipping player '{}': duplicate id {}", name, raw.id);
            continue;
        }
        if !seen_names.insert(name.to_lowercase()) {
            warn!("skipping duplicate player name '{}'", name);
            continue;
        }

        let mut player = Player::new(
            raw.id,
            name,
            role,
            raw.country.trim(),
            Crores::from_f64(raw.base_price),
            raw.set_name.trim(),
            raw.set_order.unwrap_or(u32::MAX),
        );
        player.previous_team = raw
            .previous_team
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        players.push(player);
    }
    Ok(players)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Load the player registry from a CSV file. Rows that fail to parse are
/// skipped with a warning; an empty result is an error.
pub fn load_players(path: &Path) -> Result<Vec<Player>, SeedError> {
    let file = std::fs::File::open(path).map_err(|e| SeedError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let players = load_players_from_reader(file).map_err(|e| SeedError::Csv {
        path: path.display().to_string(),
        source: e,
    })?;
    if players.is_empty() {
        return Err(SeedError::Validation(format!(
            "{} produced zero valid player rows",
            path.display()
        )));
    }
    Ok(players)
}

pub fn load_all_from_paths(paths: &DataPaths) -> Result<Vec<Player>, SeedError> {
    load_players(Path::new(&paths.players))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::PlayerStatus;

    #[test]
    fn player_csv_roundtrip() {
        let csv_data = "\
id,name,role,country,base_price,set_name,set_order,previous_team
1,Virat Kohli,Batter,India,2.00,Marquee,1,Royal Challengers Bengaluru
2,Jos Buttler,WK,England,1.50,Marquee,1,";

        let players = load_players_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(players.len(), 2);

        assert_eq!(players[0].name, "Virat Kohli");
        assert_eq!(players[0].role, Role::Batter);
        assert_eq!(players[0].base_price, Crores::from_hundredths(200));
        assert_eq!(players[0].current_bid, players[0].base_price);
        assert_eq!(players[0].status, PlayerStatus::Available);
        assert_eq!(
            players[0].previous_team.as_deref(),
            Some("Royal Challengers Bengaluru")
        );

        assert_eq!(players[1].role, Role::WicketKeeper);
        assert_eq!(players[1].base_price, Crores::from_hundredths(150));
        assert!(players[1].previous_team.is_none());
    }

    #[test]
    fn optional_columns_may_be_missing() {
        let csv_data = "\
id,name,role,country,base_price
7,Shubman Gill,Batter,India,2.0";
        let players = load_players_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].set_name, "");
        assert_eq!(players[0].set_order, u32::MAX);
    }

    #[test]
    fn malformed_and_invalid_rows_skipped() {
        let csv_data = "\
id,name,role,country,base_price,set_name,set_order,previous_team
1,Good Player,Bowler,India,2.00,A,1,
x,Bad Id,Bowler,India,2.00,A,1,
2,Bad Role,Spinner,India,2.00,A,1,
3,Zero Price,Batter,India,0,A,1,
1,Same Id,Batter,India,2.00,A,1,
4,good player,Batter,India,2.00,A,1,";

        let players = load_players_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].name, "Good Player");
    }

    #[test]
    fn names_and_countries_trimmed() {
        let csv_data = "\
id,name,role,country,base_price,set_name,set_order,previous_team
1,  Rashid Khan ,Bowler, Afghanistan ,2.00,Marquee,1,  ";
        let players = load_players_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(players[0].name, "Rashid Khan");
        assert_eq!(players[0].country, "Afghanistan");
        assert!(players[0].previous_team.is_none());
    }

    #[test]
    fn load_players_missing_file_is_io_error() {
        let err = load_players(Path::new("/nonexistent/players.csv")).unwrap_err();
        assert!(matches!(err, SeedError::Io { .. }));
    }

    #[test]
    fn empty_file_is_validation_error() {
        let tmp = std::env::temp_dir().join("auction_seed_empty.csv");
        std::fs::write(&tmp, "id,name,role,country,base_price\n").unwrap();
        let err = load_players(&tmp).unwrap_err();
        assert!(matches!(err, SeedError::Validation(_)));
        let _ = std::fs::remove_file(&tmp);
    }

    #[test]
    fn bundled_players_csv_loads() {
        let cwd = std::env::current_dir().unwrap();
        let path = if cwd.join("data/players.csv").exists() {
            cwd.join("data/players.csv")
        } else {
            cwd.join("auction-room/data/players.csv")
        };
        let players = load_players(&path).unwrap();
        assert_eq!(players.len(), 24);
        assert!(players.iter().all(|p| p.base_price.is_positive()));
    }
}
