use std::fmt;
use std::path::PathBuf;

use thiserror::Error as ThisError;

/// Key a meal was looked up by, carried by not-found/deleted errors so the
/// message names what the caller actually asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MealKey {
    Id(i64),
    Name(String),
}

impl fmt::Display for MealKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "ID {id}"),
            Self::Name(name) => write!(f, "name '{name}'"),
        }
    }
}

/// Everything that can go wrong in the catalog, the arena, or the random
/// source. Callers translate each variant into their own response shape.
#[derive(Debug, ThisError)]
pub enum Error {
    #[error("Invalid price: {0}. Price must be a positive number.")]
    InvalidPrice(f64),

    #[error("Invalid difficulty level: {0}. Must be 'LOW', 'MED', or 'HIGH'.")]
    InvalidDifficulty(String),

    #[error("Invalid sort_by parameter: {0}")]
    InvalidSortKey(String),

    #[error("Invalid result: {0}. Expected 'win' or 'loss'.")]
    InvalidOutcome(String),

    #[error("Combatant list is full, cannot add more combatants.")]
    RosterFull,

    #[error("Two combatants must be prepped for a battle.")]
    InsufficientCombatants,

    #[error("Meal with {0} not found")]
    NotFound(MealKey),

    #[error("Meal with {0} has been deleted")]
    Deleted(MealKey),

    /// Name-uniqueness violation, surfaced apart from other database errors.
    #[error("Meal with name '{0}' already exists")]
    DuplicateMeal(String),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("failed to read schema script {}: {source}", .path.display())]
    SchemaScript {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Request to random.org timed out.")]
    RandomTimeout,

    #[error("Request to random.org failed: {0}")]
    RandomRequest(#[source] reqwest::Error),

    #[error("Invalid response from random.org: {0}")]
    InvalidRandomResponse(String),
}
