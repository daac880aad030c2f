use crate::models::GeneratedRecipe;

use super::{strip_code_fences, AiError, GeminiClient, KETO_MAX_CARBS_PER_SERVING};

/// Asks the model for a keto recipe built from the given ingredients and
/// parses its JSON reply. Callers validate that the list is non-empty.
pub async fn generate_recipe(
    client: &GeminiClient,
    ingredients: &[String],
) -> Result<GeneratedRecipe, AiError> {
    let prompt = format!(
        "You are a Keto diet expert. Create a delicious, keto-friendly recipe using ONLY these \
         ingredients: {}.\n\n\
         Requirements:\n\
         - Recipe must be strictly keto (under {KETO_MAX_CARBS_PER_SERVING}g net carbs per serving)\n\
         - Use only the provided ingredients (you can suggest common keto staples like salt, \
         pepper, olive oil if needed)\n\
         - Provide exact measurements\n\
         - Include step-by-step cooking instructions\n\
         - Calculate and provide macros per serving (carbs, protein, fat, calories)\n\n\
         Format your response as JSON with this structure:\n\
         {{\n\
           \"title\": \"Recipe name\",\n\
           \"ingredients\": [{{\"name\": \"ingredient\", \"amount\": \"quantity\"}}],\n\
           \"instructions\": \"step-by-step instructions\",\n\
           \"macros\": {{\"carbs\": number, \"protein\": number, \"fat\": number, \"calories\": number}},\n\
           \"cooking_time\": number (in minutes),\n\
           \"difficulty\": \"easy\" | \"medium\" | \"hard\",\n\
           \"category\": \"breakfast\" | \"lunch\" | \"dinner\" | \"snack\" | \"dessert\"\n\
         }}",
        ingredients.join(", "),
    );

    let reply = client.generate(&prompt, Some(0.7)).await?;
    parse_recipe_reply(&reply)
}

fn parse_recipe_reply(reply: &str) -> Result<GeneratedRecipe, AiError> {
    serde_json::from_str(strip_code_fences(reply)).map_err(|e| AiError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RecipeCategory, RecipeDifficulty};

    const REPLY: &str = r#"{
        "title": "Avocado Egg Bowl",
        "ingredients": [{"name": "avocado", "amount": "1"}, {"name": "eggs", "amount": "2"}],
        "instructions": "Halve the avocado. Fry the eggs. Assemble.",
        "macros": {"carbs": 6.0, "protein": 14.0, "fat": 32.0, "calories": 380.0},
        "cooking_time": 10,
        "difficulty": "easy",
        "category": "breakfast"
    }"#;

    #[test]
    fn parses_bare_reply() {
        let recipe = parse_recipe_reply(REPLY).unwrap();
        assert_eq!(recipe.title, "Avocado Egg Bowl");
        assert_eq!(recipe.difficulty, RecipeDifficulty::Easy);
        assert_eq!(recipe.category, RecipeCategory::Breakfast);
        assert_eq!(recipe.ingredients.len(), 2);
    }

    #[test]
    fn parses_fenced_reply() {
        let fenced = format!("```json\n{REPLY}\n```");
        assert!(parse_recipe_reply(&fenced).is_ok());
    }

    #[test]
    fn rejects_out_of_vocabulary_difficulty() {
        let bad = REPLY.replace("\"easy\"", "\"brutal\"");
        assert!(matches!(parse_recipe_reply(&bad), Err(AiError::Malformed(_))));
    }
}
