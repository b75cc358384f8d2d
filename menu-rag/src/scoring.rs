//! Goal-conditioned score bonuses.
//!
//! A bonus is added to an item's cosine similarity during re-ranking. Each
//! goal owns one ordered rule list; the first satisfied rule decides the
//! bonus and no rules are summed.

use crate::catalog::MenuItem;
use crate::intent::NutritionGoal;

const KCAL_PER_G_PROTEIN: f64 = 4.0;
const KCAL_PER_G_CARB: f64 = 4.0;
const KCAL_PER_G_FAT: f64 = 9.0;

/// Calories and the raw nutrient amounts of one item.
///
/// A nutrient is `None` when the catalog value was missing or unparseable.
/// A goal whose rules read such a nutrient yields no bonus at all.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacroProfile {
    pub calories: f64,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub fiber_g: Option<f64>,
}

impl MacroProfile {
    /// Build the profile, or `None` when calories are missing or zero.
    pub fn of(item: &MenuItem) -> Option<Self> {
        let calories = item.calories.filter(|c| *c != 0.0)?;
        Some(Self {
            calories,
            protein_g: item.protein_g,
            carbs_g: item.carbs_g,
            fat_g: item.fat_g,
            fiber_g: item.fiber_g,
        })
    }

    fn share(&self, grams: Option<f64>, kcal_per_g: f64) -> Option<f64> {
        grams.map(|g| g * kcal_per_g / self.calories * 100.0)
    }

    /// Percent of calories from protein.
    pub fn protein_pct(&self) -> Option<f64> {
        self.share(self.protein_g, KCAL_PER_G_PROTEIN)
    }

    /// Percent of calories from carbohydrates.
    pub fn carb_pct(&self) -> Option<f64> {
        self.share(self.carbs_g, KCAL_PER_G_CARB)
    }

    /// Percent of calories from fat.
    pub fn fat_pct(&self) -> Option<f64> {
        self.share(self.fat_g, KCAL_PER_G_FAT)
    }
}

/// Bonus for `item` under `goal`, in `[-0.3, 0.7]`.
///
/// Zero when no goal is active, when calories are missing or zero, when a
/// nutrient the goal's rules read is unknown, or when no rule is satisfied.
pub fn goal_bonus(item: &MenuItem, goal: Option<NutritionGoal>) -> f32 {
    let (Some(goal), Some(profile)) = (goal, MacroProfile::of(item)) else {
        return 0.0;
    };
    rule_bonus(goal, &profile).unwrap_or(0.0)
}

fn rule_bonus(goal: NutritionGoal, m: &MacroProfile) -> Option<f32> {
    let bonus = match goal {
        // Absolute protein grams drive recovery
        NutritionGoal::PostWorkout => {
            let protein_g = m.protein_g?;
            if protein_g >= 40.0 {
                0.7
            } else if protein_g >= 30.0 {
                0.5
            } else if protein_g >= 20.0 {
                0.3
            } else if protein_g < 15.0 {
                -0.3
            } else {
                0.0
            }
        }
        NutritionGoal::Cutting => {
            let protein_pct = m.protein_pct()?;
            if protein_pct >= 40.0 && m.calories < 400.0 {
                0.4
            } else if protein_pct >= 40.0 && m.calories < 600.0 {
                0.2
            } else if protein_pct >= 30.0 && m.calories < 400.0 {
                0.25
            } else if protein_pct >= 30.0 && m.calories < 600.0 {
                0.1
            } else if m.calories > 600.0 {
                -0.2
            } else {
                0.0
            }
        }
        NutritionGoal::Bulking => {
            let protein_pct = m.protein_pct()?;
            if (30.0..=40.0).contains(&protein_pct) && m.calories >= 300.0 {
                0.25
            } else if protein_pct >= 25.0 {
                0.1
            } else {
                0.0
            }
        }
        NutritionGoal::Keto => {
            let (fat_pct, carb_pct) = (m.fat_pct()?, m.carb_pct()?);
            if fat_pct >= 60.0 && carb_pct < 10.0 {
                0.35
            } else if fat_pct >= 50.0 {
                0.2
            } else {
                0.0
            }
        }
        // Fiber carries almost no calories, so grams rather than a ratio
        NutritionGoal::Fiber => {
            let fiber_g = m.fiber_g?;
            if fiber_g >= 8.0 {
                0.6
            } else if fiber_g >= 5.0 {
                0.4
            } else if fiber_g >= 3.0 {
                0.2
            } else {
                0.0
            }
        }
        NutritionGoal::Endurance => {
            let carb_pct = m.carb_pct()?;
            if carb_pct >= 60.0 {
                0.3
            } else if carb_pct >= 50.0 {
                0.15
            } else {
                0.0
            }
        }
    };
    Some(bonus)
}
