//! Grounding text and instructions sent to the completion provider.

use crate::catalog::format_amount;
use crate::retrieval::RetrievalResult;

/// Fixed assistant instructions. Goal preference is already encoded in the
/// ranking; these constrain tone, specificity and recommendation count.
pub const SYSTEM_PROMPT: &str = "\
You are a helpful nutrition assistant for university students.

Your job is to recommend ACTUAL MEALS from campus dining locations based on students' nutrition goals.

When recommending meals, PRIORITIZE MACRO RATIOS, not just absolute values:
- For cutting/weight loss: prefer items with a HIGH protein-to-calorie ratio (>=40%) AND LOW total calories (<400 cal ideal).
  Grilled Chicken (45g protein, 250 cal, 72% protein) beats Chicken Wings (68g protein, 720 cal, 38% protein) for cutting.
- For clean bulking: prefer a MODERATE protein ratio (30-40%) with adequate calories.
- For post-workout recovery: prefer HIGH ABSOLUTE PROTEIN (30-50g) to rebuild muscle.
- For fiber: prefer the HIGHEST fiber content available and always state the grams.
- For keto: prefer a HIGH fat ratio (>=60%) and LOW carb ratio (<10%).
- For endurance: prefer a HIGH carb ratio (>=60%).

Rules:
- If the user can't eat at a restaurant, do not list options from it; recommend the next best option elsewhere.
- If the user only wants food from certain restaurants, only recommend food from those.
- Only recommend complete meals (entrees, sandwiches, salads, breakfast items).
- Never recommend protein powders, supplements, condiments, or bare bases like plain \"Spaghetti\".
- When the user asks for high protein, high fiber, or similar, give the grams or ratio in the answer.
- Explain why each item matches the goal, mentioning macro ratios when relevant.
- Name the dining location for every item.
- Be conversational and friendly.
- Recommend 3 food items per query.
- Keep responses concise (2-4 sentences per recommendation).";

/// Render retrieved items as a numbered list for grounding.
pub fn format_context(results: &RetrievalResult) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, candidate)| {
            let item = &candidate.item;
            format!(
                "{}. {} at {}\n   - Calories: {}\n   - Protein: {}, Carbs: {}, Fat: {}, Fiber: {}",
                i + 1,
                item.name,
                item.restaurant_display(),
                format_amount(item.calories),
                grams(item.protein_g),
                grams(item.carbs_g),
                grams(item.fat_g),
                grams(item.fiber_g),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn grams(value: Option<f64>) -> String {
    match value {
        Some(_) => format!("{}g", format_amount(value)),
        None => format_amount(None),
    }
}

/// The final user message: grounding context followed by the raw query.
pub fn grounded_user_message(context: &str, query: &str) -> String {
    format!("Based on these dining hall items:\n\n{context}\n\nUser query: {query}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MenuItem;
    use crate::retrieval::ScoredCandidate;

    fn result_of(items: Vec<MenuItem>) -> RetrievalResult {
        let candidates: Vec<ScoredCandidate> = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| ScoredCandidate {
                index,
                item,
                similarity: 0.5,
                bonus: 0.0,
                score: 0.5,
            })
            .collect();
        RetrievalResult::from_candidates(candidates)
    }

    #[test]
    fn renders_numbered_items_with_sentinels() {
        let results = result_of(vec![
            MenuItem::new("Grilled Chicken", "The Farmstead")
                .with_macros(250.0, 45.0, 0.0, 5.5)
                .with_fiber(0.0),
            MenuItem::new("Mystery Stew", ""),
        ]);
        let context = format_context(&results);
        assert_eq!(
            context,
            "1. Grilled Chicken at The Farmstead\n   - Calories: 250\n   - Protein: 45g, Carbs: 0g, Fat: 5.5g, Fiber: 0g\n\n\
             2. Mystery Stew at Unknown\n   - Calories: N/A\n   - Protein: N/A, Carbs: N/A, Fat: N/A, Fiber: N/A"
        );
    }

    #[test]
    fn empty_results_render_empty_context() {
        assert_eq!(format_context(&RetrievalResult::default()), "");
    }

    #[test]
    fn grounded_message_embeds_context_and_query() {
        let msg = grounded_user_message("1. Oatmeal at Marketplace", "high fiber breakfast");
        assert!(msg.starts_with("Based on these dining hall items:\n\n1. Oatmeal"));
        assert!(msg.ends_with("User query: high fiber breakfast"));
    }
}
