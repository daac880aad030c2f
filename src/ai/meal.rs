use crate::models::MealAnalysis;

use super::{strip_code_fences, AiError, GeminiClient, KETO_MAX_CARBS_PER_SERVING};

/// Sends a meal photo to the vision model and parses the structured
/// assessment. Accepts raw base64 or a full `data:` URL.
pub async fn analyze_meal_image(
    client: &GeminiClient,
    image_base64: &str,
) -> Result<MealAnalysis, AiError> {
    let prompt = format!(
        "Analyze this meal image. Count the number of vegetables and proteins, estimate macros \
         (carbs, protein, fat, calories), and provide a keto assessment. If the meal appears to \
         have more than {KETO_MAX_CARBS_PER_SERVING}g net carbs, include a carb warning.\n\n\
         Respond as JSON with this structure:\n\
         {{\n\
           \"vegetables\": number,\n\
           \"proteins\": number,\n\
           \"estimatedMacros\": {{\"carbs\": number, \"protein\": number, \"fat\": number, \"calories\": number}},\n\
           \"carbWarning\": string or null,\n\
           \"description\": \"brief description of the meal\"\n\
         }}",
    );

    let data = strip_data_url(image_base64);
    let reply = client
        .generate_with_image(&prompt, "image/jpeg", data)
        .await?;
    parse_analysis_reply(&reply)
}

fn parse_analysis_reply(reply: &str) -> Result<MealAnalysis, AiError> {
    serde_json::from_str(strip_code_fences(reply)).map_err(|e| AiError::Malformed(e.to_string()))
}

/// Uploads arrive either as raw base64 or as `data:image/...;base64,<data>`;
/// the provider wants only the payload.
fn strip_data_url(image: &str) -> &str {
    if !image.starts_with("data:") {
        return image;
    }
    image.split_once(',').map_or(image, |(_, data)| data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_base64_passes_through() {
        assert_eq!(strip_data_url("aGVsbG8="), "aGVsbG8=");
    }

    #[test]
    fn data_url_prefix_is_stripped() {
        assert_eq!(strip_data_url("data:image/jpeg;base64,aGVsbG8="), "aGVsbG8=");
        assert_eq!(strip_data_url("data:image/png;base64,Zm9v"), "Zm9v");
    }

    #[test]
    fn parses_analysis_reply() {
        let reply = r#"{
            "vegetables": 2,
            "proteins": 1,
            "estimatedMacros": {"carbs": 9.0, "protein": 28.0, "fat": 21.0, "calories": 350.0},
            "carbWarning": null,
            "description": "Grilled salmon with greens"
        }"#;
        let analysis = parse_analysis_reply(reply).unwrap();
        assert_eq!(analysis.vegetables, 2);
        assert!(analysis.carb_warning.is_none());
    }

    #[test]
    fn carb_warning_survives_round_trip() {
        let reply = r#"{
            "vegetables": 0,
            "proteins": 1,
            "estimatedMacros": {"carbs": 45.0, "protein": 12.0, "fat": 10.0, "calories": 520.0},
            "carbWarning": "This meal is well above keto carb limits.",
            "description": "Pasta with meatballs"
        }"#;
        let analysis = parse_analysis_reply(reply).unwrap();
        assert!(analysis.carb_warning.is_some());
    }
}
