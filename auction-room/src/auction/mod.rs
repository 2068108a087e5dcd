pub mod bidding;
pub mod engine;
pub mod error;
pub mod event;
pub mod ledger;
pub mod money;
pub mod pending;
pub mod player;
pub mod retention;
pub mod rtm;
pub mod rules;
pub mod snapshot;
pub mod team;
pub mod timer;

pub use engine::AuctionEngine;
pub use error::AuctionError;
pub use event::AuctionEvent;
pub use money::Crores;
pub use pending::PendingKind;
pub use player::{Player, PlayerStatus, Role};
pub use rules::AuctionRules;
pub use snapshot::AuctionSnapshot;

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn cr(v: f64) -> Crores {
        Crores::from_f64(v)
    }

    pub fn fixture_teams() -> Vec<(String, String)> {
        [("alp", "Alpha"), ("bra", "Bravo"), ("cha", "Charlie")]
            .iter()
            .map(|(id, name)| (id.to_string(), name.to_string()))
            .collect()
    }

    /// Six players at a 2.00 base, two sets, mixed nationality.
    pub fn fixture_players() -> Vec<Player> {
        let rows = [
            (1, "Virat Kohli", Role::Batter, "India", "Marquee", 1),
            (2, "Jos Buttler", Role::WicketKeeper, "England", "Marquee", 1),
            (3, "Jasprit Bumrah", Role::Bowler, "India", "Marquee", 1),
            (4, "Rashid Khan", Role::Bowler, "Afghanistan", "Capped", 2),
            (5, "Hardik Pandya", Role::AllRounder, "India", "Capped", 2),
            (6, "Kagiso Rabada", Role::Bowler, "South Africa", "Capped", 2),
        ];
        rows.iter()
            .map(|(id, name, role, country, set, order)| {
                Player::new(*id, name, *role, country, cr(2.0), set, *order)
            })
            .collect()
    }

    pub fn engine() -> AuctionEngine {
        AuctionEngine::new(AuctionRules::default(), fixture_teams(), fixture_players())
    }

    pub fn started_engine() -> AuctionEngine {
        let mut e = engine();
        e.start_auction().expect("start auction");
        e
    }
}
