use async_trait::async_trait;
use tracing::{debug, error};

use super::types::{InputTurn, MealAnalysis, ResponsesReply, ResponsesRequest};
use super::{CompletionClient, CompletionError};
use crate::config::OpenAiConfig;

const CHAT_INSTRUCTIONS: &str = "You are a friendly and professional fitness and nutrition \
coach for someone who does weight training, sports, and pays attention to their diet. Give \
clear, practical, and encouraging advice on workouts, nutrition, and healthy habits.";

const ANALYZE_INSTRUCTIONS: &str = "You are tasked with analyzing an image of a meal that \
will be provided to you. Your goal is to identify the different food items in the image and \
extract detailed nutritional information such as calories, protein, carbs, fats, sugar, and \
vitamins. The information must be extracted and returned in a structured JSON format. Please \
be accurate and make sure to provide the nutritional values for each food item detected.";

const ANALYZE_PROMPT: &str = "Analyze the meal image and provide the nutritional information \
in the provided JSON structure output";

const MAX_OUTPUT_TOKENS: u32 = 1000;
const TEMPERATURE: f64 = 0.7;

pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    chat_model: String,
    vision_model: String,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("chat_model", &self.chat_model)
            .field("vision_model", &self.vision_model)
            .finish()
    }
}

impl OpenAiClient {
    pub fn new(cfg: &OpenAiConfig) -> Result<Self, CompletionError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()?;
        Ok(Self {
            http,
            api_key: cfg.api_key.clone(),
            base_url: cfg.base_url.trim_end_matches('/').to_owned(),
            chat_model: cfg.chat_model.clone(),
            vision_model: cfg.vision_model.clone(),
        })
    }

    async fn send(&self, request: &ResponsesRequest) -> Result<String, CompletionError> {
        let response = self
            .http
            .post(format!("{}/v1/responses", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, "completion API rejected request");
            return Err(CompletionError::Status { status, body });
        }

        let reply: ResponsesReply = response.json().await?;
        debug!(model = %request.model, "completion received");
        reply.first_text().ok_or(CompletionError::EmptyOutput)
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, turns: Vec<InputTurn>) -> Result<String, CompletionError> {
        let request = ResponsesRequest {
            model: self.chat_model.clone(),
            input: turns,
            max_output_tokens: MAX_OUTPUT_TOKENS,
            temperature: TEMPERATURE,
            instructions: CHAT_INSTRUCTIONS.into(),
            text: None,
        };
        self.send(&request).await
    }

    async fn analyze_meal_image(
        &self,
        image_base64: &str,
    ) -> Result<MealAnalysis, CompletionError> {
        use super::types::{ContentPart, Role};

        let input = vec![
            InputTurn::user(ANALYZE_PROMPT),
            InputTurn {
                role: Role::User,
                content: vec![ContentPart::image_from_base64(image_base64)],
            },
        ];
        let request = ResponsesRequest {
            model: self.vision_model.clone(),
            input,
            max_output_tokens: MAX_OUTPUT_TOKENS,
            temperature: TEMPERATURE,
            instructions: ANALYZE_INSTRUCTIONS.into(),
            text: Some(meal_analysis_format()),
        };
        let raw = self.send(&request).await?;
        let analysis: MealAnalysis = serde_json::from_str(&raw)?;
        Ok(analysis)
    }
}

/// Response-format block constraining the vision call to the meal
/// nutrition schema. Every field required, no extra properties.
fn meal_analysis_format() -> serde_json::Value {
    serde_json::json!({
        "format": {
            "type": "json_schema",
            "name": "meal_nutrition_data",
            "strict": true,
            "schema": {
                "type": "object",
                "properties": {
                    "fooditems": {
                        "type": "array",
                        "description": "List of food items detected in the image",
                        "items": { "type": "string" }
                    },
                    "calories": { "type": "number", "description": "Total calories of the meal (kcal)" },
                    "protein":  { "type": "number", "description": "Protein in the meal (grams)" },
                    "carbs":    { "type": "number", "description": "Carbohydrates in the meal (grams)" },
                    "fats":     { "type": "number", "description": "Fats in the meal (grams)" },
                    "sugar":    { "type": "number", "description": "Sugar in the meal (grams)" },
                    "vitamins": { "type": "number", "description": "Vitamins in the meal" }
                },
                "additionalProperties": false,
                "required": ["fooditems", "calories", "protein", "carbs", "fats", "sugar", "vitamins"]
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_requires_every_field() {
        let format = meal_analysis_format();
        let schema = &format["format"]["schema"];
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        for field in ["fooditems", "calories", "protein", "carbs", "fats", "sugar", "vitamins"] {
            assert!(required.contains(&field), "{field} must be required");
        }
        assert_eq!(schema["additionalProperties"], false);
    }

    #[test]
    fn debug_masks_api_key() {
        let client = OpenAiClient::new(&crate::config::OpenAiConfig {
            api_key: "sk-secret".into(),
            base_url: "https://api.openai.com/".into(),
            chat_model: "gpt-4o-mini".into(),
            vision_model: "gpt-4o".into(),
            chat_history_limit: None,
        })
        .unwrap();
        let dump = format!("{client:?}");
        assert!(!dump.contains("sk-secret"));
        // trailing slash trimmed
        assert!(dump.contains("https://api.openai.com"));
    }
}
