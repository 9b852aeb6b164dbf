use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

// ── Enums ───────────────────────────────────────────────────────────

/// How hard a meal is to cook. Stored as `LOW`/`MED`/`HIGH` text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Difficulty {
    Low,
    Med,
    High,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Med => "MED",
            Self::High => "HIGH",
        }
    }
}

impl FromStr for Difficulty {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "LOW" => Ok(Self::Low),
            "MED" => Ok(Self::Med),
            "HIGH" => Ok(Self::High),
            other => Err(Error::InvalidDifficulty(other.to_string())),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one battle for one combatant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleOutcome {
    Win,
    Loss,
}

impl FromStr for BattleOutcome {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "win" => Ok(Self::Win),
            "loss" => Ok(Self::Loss),
            other => Err(Error::InvalidOutcome(other.to_string())),
        }
    }
}

/// Leaderboard ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Wins,
    WinPct,
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "wins" => Ok(Self::Wins),
            "win_pct" => Ok(Self::WinPct),
            other => Err(Error::InvalidSortKey(other.to_string())),
        }
    }
}

// ── Records ─────────────────────────────────────────────────────────

/// A live catalog row as returned by lookups. The stats columns stay in the
/// store; combatants only need identity and scoring inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub id: i64,
    pub meal: String,
    pub cuisine: String,
    pub price: f64,
    pub difficulty: Difficulty,
}

/// One leaderboard row. `win_pct` is wins/battles as a percentage, rounded
/// to one decimal place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub id: i64,
    pub meal: String,
    pub cuisine: String,
    pub price: f64,
    pub difficulty: Difficulty,
    pub battles: i64,
    pub wins: i64,
    pub win_pct: f64,
}
