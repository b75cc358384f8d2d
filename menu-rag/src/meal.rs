//! Heuristic that separates complete dishes from condiments, toppings and
//! supplements listed on the same menus.

use crate::catalog::MenuItem;

/// Name fragments that mark an item as not a meal.
const NON_MEAL_FRAGMENTS: &[&str] = &[
    "powder", "powdered", "sugar", "syrup", "honey",
    "salt", "pepper", "sauce", "dressing", "spread",
    "butter", "oil", "vinegar", "seasoning",
    "whey protein", "protein powder", "boost", "supplement",
    "condiment", "topping", "sprinkles",
    "mayo", "vinaigrette", "shot", "espresso",
    // salad bases
    "lettuce", "spinach", "kale", "arugula",
    // toppings
    "tomato", "onion", "pickle", "cucumber",
    "cheese slice", "american cheese", "cheddar cheese",
];

/// Whether an item looks like an actual meal.
///
/// Plain substring matching on the lower-cased name, so false positives
/// ("Spinach Lasagna") and false negatives are expected.
pub fn is_actual_meal(item: &MenuItem) -> bool {
    let name = item.name.to_lowercase();
    !NON_MEAL_FRAGMENTS.iter().any(|fragment| name.contains(fragment))
}
