//! Per-session conversation memory and sticky filters.

use std::collections::BTreeSet;

use tracing::debug;

use crate::generation::{ChatMessage, Role};
use crate::intent::{DietaryRequirement, Intent, NutritionGoal};

/// Everything one session remembers between turns.
///
/// Dietary requirement and nutrition goal are sticky: once detected they stay
/// active until a different value replaces them or the session is reset.
/// Restaurant sets only grow until reset. One instance per session; the
/// retrieval engine takes it by `&mut`, so it is never shared between
/// concurrent turns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationState {
    history: Vec<ChatMessage>,
    dietary: Option<DietaryRequirement>,
    goal: Option<NutritionGoal>,
    excluded_restaurants: BTreeSet<String>,
    included_restaurants: BTreeSet<String>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one query's intent: detected values overwrite, absent values
    /// keep the previous ones, restaurant sets are unioned.
    pub fn update(&mut self, intent: &Intent) {
        if let Some(dietary) = intent.dietary {
            self.dietary = Some(dietary);
        }
        if let Some(goal) = intent.goal {
            self.goal = Some(goal);
        }
        self.excluded_restaurants.extend(intent.excluded_restaurants.iter().cloned());
        self.included_restaurants.extend(intent.included_restaurants.iter().cloned());

        debug!(
            dietary = ?self.dietary,
            goal = ?self.goal,
            excluded = self.excluded_restaurants.len(),
            included = self.included_restaurants.len(),
            "session filters updated"
        );
    }

    /// Clear history and every sticky filter.
    pub fn reset(&mut self) {
        *self = Self::default();
        debug!("session reset");
    }

    pub fn append_turn(&mut self, role: Role, text: impl Into<String>) {
        self.history.push(ChatMessage::new(role, text));
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn dietary_requirement(&self) -> Option<DietaryRequirement> {
        self.dietary
    }

    pub fn nutrition_goal(&self) -> Option<NutritionGoal> {
        self.goal
    }

    pub fn excluded_restaurants(&self) -> &BTreeSet<String> {
        &self.excluded_restaurants
    }

    pub fn included_restaurants(&self) -> &BTreeSet<String> {
        &self.included_restaurants
    }

    /// Human-readable list of the filters currently in force.
    pub fn active_filters(&self) -> Vec<String> {
        let mut filters = Vec::new();
        if let Some(dietary) = self.dietary {
            filters.push(format!("Dietary: {dietary}"));
        }
        if let Some(goal) = self.goal {
            filters.push(format!("Goal: {goal}"));
        }
        filters.extend(self.excluded_restaurants.iter().map(|r| format!("No {r}")));
        filters.extend(self.included_restaurants.iter().map(|r| format!("Only {r}")));
        filters
    }
}
