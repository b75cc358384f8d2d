//! Rule-based intent extraction from free-text queries.
//!
//! Every detector is a pure function of the lower-cased query and a fixed
//! vocabulary. Dietary and goal rules are ordered lists evaluated top to
//! bottom; the first rule with a matching keyword wins, so e.g. a query that
//! mentions both "vegan" and "vegetarian" resolves to vegan.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// A hard dietary constraint, in detection priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DietaryRequirement {
    Vegan,
    Vegetarian,
    Halal,
    GlutenFree,
}

impl DietaryRequirement {
    /// The normalized catalog label this requirement corresponds to.
    pub fn label(self) -> &'static str {
        match self {
            DietaryRequirement::Vegan => "vegan",
            DietaryRequirement::Vegetarian => "vegetarian",
            DietaryRequirement::Halal => "halal",
            DietaryRequirement::GlutenFree => "gluten free",
        }
    }
}

impl fmt::Display for DietaryRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A nutrition goal that drives re-ranking bonuses, in detection priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NutritionGoal {
    PostWorkout,
    Cutting,
    Bulking,
    Keto,
    Fiber,
    Endurance,
}

impl NutritionGoal {
    pub fn as_str(self) -> &'static str {
        match self {
            NutritionGoal::PostWorkout => "post-workout",
            NutritionGoal::Cutting => "cutting",
            NutritionGoal::Bulking => "bulking",
            NutritionGoal::Keto => "keto",
            NutritionGoal::Fiber => "fiber",
            NutritionGoal::Endurance => "endurance",
        }
    }

    /// Goals whose target attribute correlates weakly with the text
    /// embedding, so retrieval casts a wider similarity net.
    pub fn needs_wide_pool(self) -> bool {
        matches!(self, NutritionGoal::Fiber | NutritionGoal::PostWorkout)
    }
}

impl fmt::Display for NutritionGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const DIETARY_RULES: &[(&[&str], DietaryRequirement)] = &[
    (&["vegan"], DietaryRequirement::Vegan),
    (&["vegetarian"], DietaryRequirement::Vegetarian),
    (&["halal"], DietaryRequirement::Halal),
    (&["gluten free", "gluten-free"], DietaryRequirement::GlutenFree),
];

const GOAL_RULES: &[(&[&str], NutritionGoal)] = &[
    (
        &["post-workout", "post workout", "after workout", "recovery meal", "after gym", "after training"],
        NutritionGoal::PostWorkout,
    ),
    (&["cutting", "lean", "weight loss", "lose weight", "lose fat", "cut"], NutritionGoal::Cutting),
    (&["bulk", "gain", "muscle building", "mass"], NutritionGoal::Bulking),
    (&["keto", "low carb", "high fat"], NutritionGoal::Keto),
    (&["fiber", "high fiber", "digestive", "gut health"], NutritionGoal::Fiber),
    (&["endurance", "marathon", "run", "energy", "carb", "cardio"], NutritionGoal::Endurance),
];

/// First rule whose keywords occur in `lower` wins.
fn first_match<T: Copy>(rules: &[(&[&str], T)], lower: &str) -> Option<T> {
    rules
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|kw| lower.contains(kw)))
        .map(|(_, value)| *value)
}

/// Detect a dietary requirement. Case-insensitive substring match.
pub fn detect_dietary_requirement(text: &str) -> Option<DietaryRequirement> {
    first_match(DIETARY_RULES, &text.to_lowercase())
}

/// Detect a nutrition goal. Case-insensitive substring match.
pub fn detect_nutrition_goal(text: &str) -> Option<NutritionGoal> {
    first_match(GOAL_RULES, &text.to_lowercase())
}

/// Canonical restaurant names with the regex aliases that refer to them.
const RESTAURANTS: &[(&str, &[&str])] = &[
    // Main dining halls
    ("Marketplace", &["marketplace"]),
    ("The Farmstead", &["farmstead"]),
    ("Trinity Cafe", &["trinity"]),
    // Quick service
    ("Il Forno", &[r"il\s*forno"]),
    ("Sprout", &["sprout"]),
    ("The Skillet", &["skillet"]),
    ("Tandoor Indian Cuisine", &["tandoor"]),
    ("Ginger + Soy", &["ginger"]),
    ("Sazon", &["saz[oó]n"]),
    ("Gyotaku", &["gyotaku"]),
    ("It's Thyme", &[r"(?:it'?s\s+)?thyme"]),
    // Specialty
    ("J.B.'s Roast & Chops", &[r"j\.?\s*b\.?'?s"]),
    ("Gothic Grill", &["gothic"]),
    ("The Pitchfork", &["pitchfork"]),
    // Coffee shops
    ("Beyu Blue Coffee", &["beyu"]),
    ("Bseisu Coffee Bar", &["bseisu"]),
    ("Freeman Café", &["freeman"]),
    ("Nasher Museum Café", &["nasher"]),
    ("Zweli's Café at Duke Divinity", &["zweli"]),
    ("The Devils Krafthouse", &[r"devils?\s+krafthouse"]),
    // Delis
    ("Sanford Deli", &["sanford"]),
    ("Saladalia @ The Perk", &["saladalia", "perk"]),
    ("Bella Union", &["bella"]),
    ("Twinnie's", &["twinnie"]),
    ("Red Mango", &[r"red\s+mango"]),
    // Special
    ("Duke Marine Lab", &[r"marine\s+lab"]),
];

/// Stricter aliases for the scope cue, where the short form alone is too
/// loose to read as a place ("at bella" is not a restaurant).
const SCOPE_ALIASES: &[(&str, &[&str])] = &[
    ("Gothic Grill", &[r"gothic\s+grill"]),
    ("Zweli's Café at Duke Divinity", &["zweli'?s"]),
    ("Sanford Deli", &[r"sanford\s+deli"]),
    ("Bella Union", &[r"bella\s+union"]),
    ("Twinnie's", &["twinnie'?s"]),
    ("Duke Marine Lab", &[r"duke\s+marine\s+lab"]),
];

/// Catch-all allow-list target for "at the cafe" with no named cafe.
pub const GENERIC_CAFE: &str = "Cafe";

const EXCLUDE_CUE: &str =
    r"\b(?:no|not|exclude|without)\s+(?:(?:meals?|food)\s+)?(?:(?:at|from)\s+)?(?:the\s+)?";
const INCLUDE_CUE: &str = r"\b(?:from|at|only\s+at)\s+(?:the\s+)?";

/// Aliases for `name`, taking an entry in `overrides` over the shared table.
fn aliases_for(
    name: &str,
    aliases: &'static [&'static str],
    overrides: &[(&str, &'static [&'static str])],
) -> &'static [&'static str] {
    overrides.iter().find(|(n, _)| *n == name).map_or(aliases, |(_, a)| *a)
}

fn compile_rules(
    cue: &str,
    overrides: &[(&str, &'static [&'static str])],
) -> Vec<(Regex, &'static str)> {
    RESTAURANTS
        .iter()
        .flat_map(|&(name, aliases)| {
            aliases_for(name, aliases, overrides).iter().map(move |alias| (name, *alias))
        })
        .filter_map(|(name, alias)| Regex::new(&format!("{cue}{alias}")).ok().map(|re| (re, name)))
        .collect()
}

static EXCLUDE_RULES: LazyLock<Vec<(Regex, &'static str)>> =
    LazyLock::new(|| compile_rules(EXCLUDE_CUE, &[]));
static INCLUDE_RULES: LazyLock<Vec<(Regex, &'static str)>> =
    LazyLock::new(|| compile_rules(INCLUDE_CUE, SCOPE_ALIASES));
// "cafe" only when it ends the phrase, so "at the cafe" but not "at cafe bistro"
static GENERIC_CAFE_RULE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(&format!(r"{INCLUDE_CUE}caf[eé](?:$|[^\w\s])")).ok());

fn matching_restaurants(rules: &[(Regex, &'static str)], lower: &str) -> BTreeSet<String> {
    rules.iter().filter(|(re, _)| re.is_match(lower)).map(|(_, name)| (*name).to_string()).collect()
}

/// Restaurants the query explicitly rules out ("no sprout", "not at the skillet").
pub fn detect_excluded_restaurants(text: &str) -> BTreeSet<String> {
    matching_restaurants(&EXCLUDE_RULES, &text.to_lowercase())
}

/// Restaurants the query scopes to ("from marketplace", "only at il forno").
///
/// The generic cafe target applies only when no named restaurant matched.
pub fn detect_included_restaurants(text: &str) -> BTreeSet<String> {
    let lower = text.to_lowercase();
    let mut included = matching_restaurants(&INCLUDE_RULES, &lower);
    if included.is_empty()
        && GENERIC_CAFE_RULE.as_ref().is_some_and(|re| re.is_match(&lower))
    {
        included.insert(GENERIC_CAFE.to_string());
    }
    included
}

/// Every constraint one query expresses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub dietary: Option<DietaryRequirement>,
    pub goal: Option<NutritionGoal>,
    pub excluded_restaurants: BTreeSet<String>,
    pub included_restaurants: BTreeSet<String>,
}

impl Intent {
    pub fn is_empty(&self) -> bool {
        self.dietary.is_none()
            && self.goal.is_none()
            && self.excluded_restaurants.is_empty()
            && self.included_restaurants.is_empty()
    }
}

/// Run every detector over one query.
///
/// "no meals at marketplace" also reads as "at marketplace"; an explicit
/// negation in the same query wins, so the restaurant is not allow-listed.
pub fn extract_intent(text: &str) -> Intent {
    let excluded_restaurants = detect_excluded_restaurants(text);
    let included_restaurants = detect_included_restaurants(text)
        .into_iter()
        .filter(|name| !excluded_restaurants.contains(name))
        .collect();

    Intent {
        dietary: detect_dietary_requirement(text),
        goal: detect_nutrition_goal(text),
        excluded_restaurants,
        included_restaurants,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn every_alias_compiles() {
        let aliases: usize = RESTAURANTS.iter().map(|(_, a)| a.len()).sum();
        assert_eq!(EXCLUDE_RULES.len(), aliases);
        let scoped: usize =
            RESTAURANTS.iter().map(|&(n, a)| aliases_for(n, a, SCOPE_ALIASES).len()).sum();
        assert_eq!(INCLUDE_RULES.len(), scoped);
        // every override names a known restaurant
        for (name, _) in SCOPE_ALIASES {
            assert!(RESTAURANTS.iter().any(|(n, _)| n == name), "{name} is not a restaurant");
        }
        assert!(GENERIC_CAFE_RULE.is_some());
    }

    #[test]
    fn dietary_priority_order() {
        assert_eq!(
            detect_dietary_requirement("Vegan or vegetarian please"),
            Some(DietaryRequirement::Vegan)
        );
        assert_eq!(
            detect_dietary_requirement("something VEGETARIAN"),
            Some(DietaryRequirement::Vegetarian)
        );
        assert_eq!(detect_dietary_requirement("halal dinner"), Some(DietaryRequirement::Halal));
        assert_eq!(
            detect_dietary_requirement("gluten-free pasta"),
            Some(DietaryRequirement::GlutenFree)
        );
        assert_eq!(
            detect_dietary_requirement("Gluten Free bread"),
            Some(DietaryRequirement::GlutenFree)
        );
        assert_eq!(detect_dietary_requirement("anything tasty"), None);
    }

    #[test]
    fn goal_priority_order() {
        assert_eq!(
            detect_nutrition_goal("post-workout meal for cutting"),
            Some(NutritionGoal::PostWorkout)
        );
        assert_eq!(detect_nutrition_goal("High protein dinner for cutting"), Some(NutritionGoal::Cutting));
        assert_eq!(
            detect_nutrition_goal("High calorie protein meal for bulking"),
            Some(NutritionGoal::Bulking)
        );
        assert_eq!(detect_nutrition_goal("Keto friendly meal"), Some(NutritionGoal::Keto));
        assert_eq!(detect_nutrition_goal("low carb lunch"), Some(NutritionGoal::Keto));
        assert_eq!(detect_nutrition_goal("High fiber breakfast"), Some(NutritionGoal::Fiber));
        assert_eq!(detect_nutrition_goal("fuel for a marathon"), Some(NutritionGoal::Endurance));
        assert_eq!(detect_nutrition_goal("something tasty"), None);
    }

    #[test]
    fn wide_pool_goals() {
        assert!(NutritionGoal::Fiber.needs_wide_pool());
        assert!(NutritionGoal::PostWorkout.needs_wide_pool());
        assert!(!NutritionGoal::Keto.needs_wide_pool());
    }

    #[test]
    fn exclusion_requires_negation_cue() {
        assert_eq!(detect_excluded_restaurants("no Sprout please"), set(&["Sprout"]));
        assert_eq!(detect_excluded_restaurants("exclude the Skillet"), set(&["The Skillet"]));
        assert_eq!(
            detect_excluded_restaurants("no meals from marketplace"),
            set(&["Marketplace"])
        );
        assert_eq!(detect_excluded_restaurants("not at JB's"), set(&["J.B.'s Roast & Chops"]));
        assert!(detect_excluded_restaurants("Vegan protein sources at Sprout").is_empty());
        // "no" must be a whole word
        assert!(detect_excluded_restaurants("piano sprout").is_empty());
    }

    #[test]
    fn multiple_exclusions_in_one_query() {
        assert_eq!(
            detect_excluded_restaurants("no il forno and not tandoor"),
            set(&["Il Forno", "Tandoor Indian Cuisine"])
        );
    }

    #[test]
    fn inclusion_requires_scope_cue() {
        assert_eq!(detect_included_restaurants("only at Marketplace"), set(&["Marketplace"]));
        assert_eq!(
            detect_included_restaurants("Vegan protein sources at Sprout"),
            set(&["Sprout"])
        );
        assert_eq!(
            detect_included_restaurants("lunch from the perk"),
            set(&["Saladalia @ The Perk"])
        );
        assert_eq!(
            detect_included_restaurants("from Beyu Blue or at Red Mango"),
            set(&["Beyu Blue Coffee", "Red Mango"])
        );
        assert!(detect_included_restaurants("marketplace food").is_empty());
    }

    #[test]
    fn inclusion_needs_full_name_for_short_aliases() {
        assert!(detect_included_restaurants("at gothic").is_empty());
        assert!(detect_included_restaurants("lunch at bella").is_empty());
        assert!(detect_included_restaurants("from sanford").is_empty());
        assert!(detect_included_restaurants("at zweli").is_empty());
        assert_eq!(detect_included_restaurants("at Gothic Grill"), set(&["Gothic Grill"]));
        assert_eq!(detect_included_restaurants("only at bella union"), set(&["Bella Union"]));
        assert_eq!(detect_included_restaurants("from Sanford Deli"), set(&["Sanford Deli"]));
        assert_eq!(
            detect_included_restaurants("at Zweli's"),
            set(&["Zweli's Café at Duke Divinity"])
        );
        // the short form still negates
        assert_eq!(detect_excluded_restaurants("no gothic"), set(&["Gothic Grill"]));
        assert_eq!(detect_excluded_restaurants("not bella"), set(&["Bella Union"]));
    }

    #[test]
    fn generic_cafe_only_without_named_match() {
        assert_eq!(detect_included_restaurants("something at the cafe"), set(&[GENERIC_CAFE]));
        assert_eq!(detect_included_restaurants("something at the cafe."), set(&[GENERIC_CAFE]));
        assert!(detect_included_restaurants("at cafe bistro").is_empty());
        assert_eq!(
            detect_included_restaurants("at trinity cafe"),
            set(&["Trinity Cafe"])
        );
    }

    #[test]
    fn negation_wins_over_scope_in_same_query() {
        let intent = extract_intent("no meals at marketplace");
        assert_eq!(intent.excluded_restaurants, set(&["Marketplace"]));
        assert!(intent.included_restaurants.is_empty());
    }

    #[test]
    fn extract_combines_detectors() {
        let intent = extract_intent("Vegan keto lunch, not at Sprout, only at Marketplace");
        assert_eq!(intent.dietary, Some(DietaryRequirement::Vegan));
        assert_eq!(intent.goal, Some(NutritionGoal::Keto));
        assert_eq!(intent.excluded_restaurants, set(&["Sprout"]));
        assert_eq!(intent.included_restaurants, set(&["Marketplace"]));
        assert!(extract_intent("hello").is_empty());
    }
}
