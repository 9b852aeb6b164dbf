//! Meal catalog and battle scoring.
//!
//! [`storage::MealStore`] persists meals in SQLite, [`battle::BattleArena`]
//! pits two of them against each other, and [`random::RandomOrgClient`]
//! supplies the draw that settles each fight. Call [`logging::init`] once at
//! startup before any of it.

pub mod battle;
pub mod config;
pub mod error;
pub mod logging;
pub mod meal;
pub mod random;
pub mod storage;

pub use battle::BattleArena;
pub use config::Settings;
pub use error::{Error, MealKey};
pub use meal::{Difficulty, LeaderboardEntry, Meal};
pub use random::{RandomOrgClient, RandomSource};
pub use storage::MealStore;
