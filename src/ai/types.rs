use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One content part of a conversational turn. User input carries
/// `input_text`/`input_image` parts, prior assistant replies `output_text`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ContentPart {
    #[serde(rename = "input_text")]
    InputText { text: String },
    #[serde(rename = "output_text")]
    OutputText { text: String },
    #[serde(rename = "input_image")]
    InputImage { image_url: String, detail: String },
}

impl ContentPart {
    pub fn image_from_base64(image_base64: &str) -> Self {
        Self::InputImage {
            image_url: format!("data:image/jpeg;base64,{image_base64}"),
            detail: "high".into(),
        }
    }
}

/// One role-tagged turn of the ordered input sequence.
#[derive(Debug, Clone, Serialize)]
pub struct InputTurn {
    pub role: Role,
    pub content: Vec<ContentPart>,
}

impl InputTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentPart::InputText { text: text.into() }],
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: vec![ContentPart::OutputText { text: text.into() }],
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResponsesRequest {
    pub model: String,
    pub input: Vec<InputTurn>,
    pub max_output_tokens: u32,
    pub temperature: f64,
    pub instructions: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsesReply {
    pub output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
pub struct OutputItem {
    pub content: Vec<OutputContent>,
}

#[derive(Debug, Deserialize)]
pub struct OutputContent {
    pub text: String,
}

impl ResponsesReply {
    /// Text of the first output item, if any.
    pub fn first_text(self) -> Option<String> {
        self.output
            .into_iter()
            .next()
            .and_then(|item| item.content.into_iter().next())
            .map(|c| c.text)
    }
}

/// Strictly-typed result of the meal-image analysis call. All fields are
/// required by the response schema; no additional properties are allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealAnalysis {
    #[serde(rename = "fooditems")]
    pub food_items: Vec<String>,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub sugar: f64,
    pub vitamins: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_turn_serializes_as_input_text() {
        let turn = InputTurn::user("hello coach");
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"][0]["type"], "input_text");
        assert_eq!(json["content"][0]["text"], "hello coach");
    }

    #[test]
    fn assistant_turn_serializes_as_output_text() {
        let turn = InputTurn::assistant("sure thing");
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"][0]["type"], "output_text");
    }

    #[test]
    fn image_part_becomes_data_url() {
        let part = ContentPart::image_from_base64("QUJD");
        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(json["type"], "input_image");
        assert_eq!(json["image_url"], "data:image/jpeg;base64,QUJD");
        assert_eq!(json["detail"], "high");
    }

    #[test]
    fn meal_analysis_parses_api_field_names() {
        let parsed: MealAnalysis = serde_json::from_str(
            r#"{"fooditems":["chicken","rice"],"calories":540.0,"protein":42.0,
                "carbs":55.0,"fats":9.0,"sugar":2.0,"vitamins":1.0}"#,
        )
        .unwrap();
        assert_eq!(parsed.food_items, vec!["chicken", "rice"]);
        assert_eq!(parsed.calories, 540.0);
    }

    #[test]
    fn request_omits_text_format_when_absent() {
        let req = ResponsesRequest {
            model: "gpt-4o-mini".into(),
            input: vec![InputTurn::user("hi")],
            max_output_tokens: 1000,
            temperature: 0.7,
            instructions: "coach".into(),
            text: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("text").is_none());
    }
}
