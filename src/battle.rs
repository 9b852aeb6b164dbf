use tracing::info;

use crate::error::Error;
use crate::meal::Meal;
use crate::random::RandomSource;
use crate::storage::MealStore;

/// Flat constant subtracted from every battle score. A per-difficulty
/// modifier was evidently intended here, but the shipped behavior subtracts
/// the same constant for every level and callers pin that formula.
const SCORE_FUDGE: f64 = 3.0;

/// Score gaps are normalized against this before meeting the random draw.
const DELTA_SCALE: f64 = 100.0;

/// In-memory arena holding up to two combatants. One arena per caller;
/// mutation goes through `&mut self`, so concurrent battles need separate
/// arenas.
#[derive(Debug, Default)]
pub struct BattleArena {
    combatants: Vec<Meal>,
}

impl BattleArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a meal for the next battle.
    pub fn prep_combatant(&mut self, meal: Meal) -> Result<(), Error> {
        if self.combatants.len() >= 2 {
            return Err(Error::RosterFull);
        }
        info!("Adding combatant to the roster: {}", meal.meal);
        self.combatants.push(meal);
        Ok(())
    }

    pub fn clear_combatants(&mut self) {
        self.combatants.clear();
    }

    /// Current roster, in prep order.
    pub fn combatants(&self) -> &[Meal] {
        &self.combatants
    }

    /// Deterministic score: price scaled by cuisine-name length, minus the
    /// flat fudge constant.
    pub fn battle_score(meal: &Meal) -> f64 {
        meal.price * meal.cuisine.len() as f64 - SCORE_FUDGE
    }

    /// Fight the two prepped combatants to a decision.
    ///
    /// The absolute score gap, normalized into [0, 1], meets one random draw:
    /// a draw under the gap goes to the higher scorer, anything else to the
    /// lower one. Both results are persisted before the loser leaves the
    /// roster. Returns the winner's name.
    pub async fn battle<R: RandomSource>(
        &mut self,
        store: &MealStore,
        random: &R,
    ) -> Result<String, Error> {
        if self.combatants.len() < 2 {
            return Err(Error::InsufficientCombatants);
        }

        let score_1 = Self::battle_score(&self.combatants[0]);
        let score_2 = Self::battle_score(&self.combatants[1]);
        let delta = ((score_1 - score_2).abs() / DELTA_SCALE).clamp(0.0, 1.0);

        let draw = random.fetch_random().await?;
        info!("Battle scores {score_1:.2} vs {score_2:.2}, delta {delta:.2}, draw {draw:.2}");

        let (higher, lower) = if score_1 > score_2 { (0, 1) } else { (1, 0) };
        let (winner, loser) = if draw < delta {
            (higher, lower)
        } else {
            (lower, higher)
        };

        store
            .update_meal_stats(self.combatants[winner].id, "win")
            .await?;
        store
            .update_meal_stats(self.combatants[loser].id, "loss")
            .await?;

        let winner_name = self.combatants[winner].meal.clone();
        info!(
            "Battle won by {winner_name} over {}",
            self.combatants[loser].meal
        );
        self.combatants.remove(loser);

        Ok(winner_name)
    }
}
