use std::env;
use std::path::PathBuf;

use tracing::info;

/// Runtime settings, read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// DROP + CREATE script executed by `MealStore::reset_all`.
    pub schema_path: PathBuf,
}

impl Settings {
    /// Platform data directory for the catalog database.
    pub fn data_dir() -> PathBuf {
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join("meal_arena")
    }

    pub fn load() -> Self {
        Self {
            db_path: path_var("MEAL_ARENA_DB", || Self::data_dir().join("meals.db")),
            schema_path: path_var("SQL_CREATE_TABLE_PATH", || {
                PathBuf::from("sql/create_meal_table.sql")
            }),
        }
    }
}

fn path_var(key: &str, default: impl FnOnce() -> PathBuf) -> PathBuf {
    match env::var(key) {
        Ok(value) => PathBuf::from(value),
        Err(_) => {
            let fallback = default();
            info!("{key} not set, using default: {}", fallback.display());
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_var_falls_back_when_unset() {
        let path = path_var("MEAL_ARENA_DEFINITELY_UNSET", || PathBuf::from("x/y.sql"));
        assert_eq!(path, PathBuf::from("x/y.sql"));
    }

    #[test]
    fn data_dir_ends_with_crate_dir() {
        assert!(Settings::data_dir().ends_with("meal_arena"));
    }
}
