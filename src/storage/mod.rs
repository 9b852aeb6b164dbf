use std::path::PathBuf;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::{error, info, warn};

use crate::config::Settings;
use crate::error::{Error, MealKey};
use crate::meal::{BattleOutcome, Difficulty, LeaderboardEntry, Meal, SortKey};

/// Tagged lookup state of a meal row.
enum RowState {
    Live,
    Deleted,
    Missing,
}

/// Full row shape for lookups: id, meal, cuisine, price, difficulty, deleted.
type MealRow = (i64, String, String, f64, String, bool);

/// SQLite-backed meal catalog. Every operation runs on its own pooled
/// connection; the pool returns it on every exit path.
pub struct MealStore {
    pool: SqlitePool,
    schema_path: PathBuf,
}

impl MealStore {
    /// Open the catalog database, creating file and parent directories on
    /// first use.
    pub async fn connect(settings: &Settings) -> Result<Self, Error> {
        if let Some(parent) = settings.db_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        let url = format!("sqlite://{}?mode=rwc", settings.db_path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await
            .map_err(db_err)?;

        info!("Connected to meal catalog at {}", settings.db_path.display());
        Ok(Self {
            pool,
            schema_path: settings.schema_path.clone(),
        })
    }

    /// Wrap an existing pool. Tests use this with an in-memory database.
    pub fn from_pool(pool: SqlitePool, schema_path: impl Into<PathBuf>) -> Self {
        Self {
            pool,
            schema_path: schema_path.into(),
        }
    }

    /// Insert a new meal with zeroed stats. Price and difficulty are
    /// validated before the database is touched; a name collision surfaces
    /// as [`Error::DuplicateMeal`].
    pub async fn create_meal(
        &self,
        meal: &str,
        cuisine: &str,
        price: f64,
        difficulty: &str,
    ) -> Result<(), Error> {
        if !(price > 0.0) {
            return Err(Error::InvalidPrice(price));
        }
        let difficulty: Difficulty = difficulty.parse()?;

        let inserted = sqlx::query(
            r#"INSERT INTO meals (meal, cuisine, price, difficulty)
               VALUES (?, ?, ?, ?)"#,
        )
        .bind(meal)
        .bind(cuisine)
        .bind(price)
        .bind(difficulty.as_str())
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => {
                info!("Meal successfully added to the database: {meal}");
                Ok(())
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                error!("Duplicate meal name: {meal}");
                Err(Error::DuplicateMeal(meal.to_string()))
            }
            Err(e) => Err(db_err(e)),
        }
    }

    /// Soft-delete: flag the row, keep its stats.
    pub async fn delete_meal(&self, id: i64) -> Result<(), Error> {
        match self.row_state(id).await? {
            RowState::Missing => {
                info!("Meal with ID {id} not found");
                Err(Error::NotFound(MealKey::Id(id)))
            }
            RowState::Deleted => {
                info!("Meal with ID {id} has already been deleted");
                Err(Error::Deleted(MealKey::Id(id)))
            }
            RowState::Live => {
                sqlx::query("UPDATE meals SET deleted = TRUE WHERE id = ?")
                    .bind(id)
                    .execute(&self.pool)
                    .await
                    .map_err(db_err)?;
                info!("Meal with ID {id} marked as deleted.");
                Ok(())
            }
        }
    }

    pub async fn get_meal_by_id(&self, id: i64) -> Result<Meal, Error> {
        let row: Option<MealRow> = sqlx::query_as(
            "SELECT id, meal, cuisine, price, difficulty, deleted FROM meals WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        meal_from_row(row, MealKey::Id(id))
    }

    pub async fn get_meal_by_name(&self, name: &str) -> Result<Meal, Error> {
        let row: Option<MealRow> = sqlx::query_as(
            "SELECT id, meal, cuisine, price, difficulty, deleted FROM meals WHERE meal = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        meal_from_row(row, MealKey::Name(name.to_string()))
    }

    /// All non-deleted meals that have battled, ordered descending by the
    /// requested key.
    pub async fn leaderboard(&self, sort_by: &str) -> Result<Vec<LeaderboardEntry>, Error> {
        let key: SortKey = sort_by.parse().inspect_err(|_| {
            error!("Invalid sort_by parameter: {sort_by}");
        })?;
        let order = match key {
            SortKey::Wins => "wins DESC",
            SortKey::WinPct => "win_pct DESC",
        };

        let sql = format!(
            r#"SELECT id, meal, cuisine, price, difficulty, battles, wins,
                      (wins * 1.0 / battles) AS win_pct
               FROM meals WHERE deleted = FALSE AND battles > 0
               ORDER BY {order}"#
        );
        let rows: Vec<(i64, String, String, f64, String, i64, i64, f64)> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        if rows.is_empty() {
            warn!("The meal catalog is empty.");
        }

        let mut entries = Vec::with_capacity(rows.len());
        for (id, meal, cuisine, price, difficulty, battles, wins, win_pct) in rows {
            entries.push(LeaderboardEntry {
                id,
                meal,
                cuisine,
                price,
                difficulty: difficulty.parse()?,
                battles,
                wins,
                // wins/battles as a percentage, one decimal place
                win_pct: (win_pct * 1000.0).round() / 10.0,
            });
        }

        info!("Leaderboard retrieved successfully");
        Ok(entries)
    }

    /// Record one battle result: battles always increments, wins only on a
    /// win. Nothing is mutated when the row is missing or deleted.
    pub async fn update_meal_stats(&self, id: i64, result: &str) -> Result<(), Error> {
        match self.row_state(id).await? {
            RowState::Missing => {
                info!("Meal with ID {id} not found");
                return Err(Error::NotFound(MealKey::Id(id)));
            }
            RowState::Deleted => {
                info!("Meal with ID {id} has been deleted");
                return Err(Error::Deleted(MealKey::Id(id)));
            }
            RowState::Live => {}
        }

        let sql = match result.parse::<BattleOutcome>()? {
            BattleOutcome::Win => {
                "UPDATE meals SET battles = battles + 1, wins = wins + 1 WHERE id = ?"
            }
            BattleOutcome::Loss => "UPDATE meals SET battles = battles + 1 WHERE id = ?",
        };
        sqlx::query(sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(())
    }

    /// Recreate the meals table from the schema script, discarding all rows.
    pub async fn reset_all(&self) -> Result<(), Error> {
        let script =
            std::fs::read_to_string(&self.schema_path).map_err(|source| Error::SchemaScript {
                path: self.schema_path.clone(),
                source,
            })?;

        match sqlx::raw_sql(&script).execute(&self.pool).await {
            Ok(_) => {
                info!("Meals cleared successfully.");
                Ok(())
            }
            Err(e) => {
                error!("Database error while clearing meals: {e}");
                Err(Error::Database(e))
            }
        }
    }

    async fn row_state(&self, id: i64) -> Result<RowState, Error> {
        let row: Option<(bool,)> = sqlx::query_as("SELECT deleted FROM meals WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(match row {
            None => RowState::Missing,
            Some((true,)) => RowState::Deleted,
            Some((false,)) => RowState::Live,
        })
    }
}

fn meal_from_row(row: Option<MealRow>, key: MealKey) -> Result<Meal, Error> {
    match row {
        None => {
            info!("Meal with {key} not found");
            Err(Error::NotFound(key))
        }
        Some((.., true)) => {
            info!("Meal with {key} has been deleted");
            Err(Error::Deleted(key))
        }
        Some((id, meal, cuisine, price, difficulty, false)) => Ok(Meal {
            id,
            meal,
            cuisine,
            price,
            difficulty: difficulty.parse()?,
        }),
    }
}

fn db_err(e: sqlx::Error) -> Error {
    error!("Database error: {e}");
    Error::Database(e)
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;

    /// Fresh store on a single-connection in-memory database (a second
    /// pooled connection would see its own empty memory database).
    pub(crate) async fn memory_store() -> MealStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite");
        let schema = concat!(env!("CARGO_MANIFEST_DIR"), "/sql/create_meal_table.sql");
        let store = MealStore::from_pool(pool, schema);
        store.reset_all().await.expect("schema script");
        store
    }
}
