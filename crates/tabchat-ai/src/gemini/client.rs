//! Gemini API client struct, request building, and response parsing.

use crate::tools::to_gemini_tool;
use crate::{AiError, AiResponse, Message, Role, TokenUsage, ToolCall, ToolDefinition};

use super::config::GeminiConfig;

pub(crate) const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini API client.
pub struct GeminiClient {
    pub(crate) config: GeminiConfig,
    pub(crate) http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, AiError> {
        let http = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| AiError::NetworkError(e.to_string()))?;
        Ok(Self { config, http })
    }

    pub(crate) fn api_url(&self) -> String {
        format!("{}/{}:generateContent", GEMINI_API_BASE, self.config.model)
    }

    /// Build the JSON request body for the Gemini API.
    ///
    /// Tool results travel as `functionResponse` parts in a user turn, and
    /// the assistant turns that requested them replay their `functionCall`
    /// parts, so the model sees the full call/result pairing on every round.
    pub(crate) fn build_request_body(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> serde_json::Value {
        let mut contents = Vec::new();

        for msg in messages {
            let role = match msg.role {
                Role::User | Role::Tool => "user",
                Role::Assistant => "model",
                Role::System => continue, // handled via systemInstruction
            };

            let mut parts = Vec::new();
            if let Some(ref tool_response) = msg.tool_response {
                parts.push(serde_json::json!({
                    "functionResponse": {
                        "name": tool_response.name,
                        "response": { "result": tool_response.result },
                    }
                }));
            } else {
                if !msg.content.is_empty() || msg.tool_calls.is_empty() {
                    parts.push(serde_json::json!({ "text": msg.content }));
                }
                for call in &msg.tool_calls {
                    parts.push(serde_json::json!({
                        "functionCall": {
                            "name": call.name,
                            "args": call.arguments,
                        }
                    }));
                }
            }

            contents.push(serde_json::json!({
                "role": role,
                "parts": parts,
            }));
        }

        let mut body = serde_json::json!({
            "contents": contents,
            "generationConfig": {
                "maxOutputTokens": self.config.max_tokens,
                "temperature": self.config.temperature,
            }
        });

        // System instruction
        for msg in messages {
            if msg.role == Role::System {
                body["systemInstruction"] = serde_json::json!({
                    "parts": [{ "text": msg.content }]
                });
                break;
            }
        }

        if !tools.is_empty() {
            let tool_defs: Vec<_> = tools.iter().map(to_gemini_tool).collect();
            body["tools"] = serde_json::json!([{
                "functionDeclarations": tool_defs
            }]);
        }

        body
    }

    /// Parse a Gemini response.
    pub(crate) fn parse_response(&self, json: serde_json::Value) -> Result<AiResponse, AiError> {
        let candidates = json["candidates"]
            .as_array()
            .ok_or_else(|| AiError::ParseError("no candidates in response".to_string()))?;

        let first = candidates
            .first()
            .ok_or_else(|| AiError::ParseError("empty candidates".to_string()))?;

        let parts = first["content"]["parts"]
            .as_array()
            .cloned()
            .unwrap_or_default();

        let mut content = String::new();
        let mut tool_calls = Vec::new();

        for part in &parts {
            if let Some(text) = part["text"].as_str() {
                content.push_str(text);
            }
            if let Some(fc) = part.get("functionCall") {
                tool_calls.push(ToolCall {
                    id: uuid::Uuid::new_v4().to_string(),
                    name: fc["name"].as_str().unwrap_or("").to_string(),
                    arguments: fc["args"].clone(),
                });
            }
        }

        let usage = TokenUsage {
            input_tokens: json["usageMetadata"]["promptTokenCount"]
                .as_u64()
                .unwrap_or(0),
            output_tokens: json["usageMetadata"]["candidatesTokenCount"]
                .as_u64()
                .unwrap_or(0),
        };

        Ok(AiResponse {
            content,
            tool_calls,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn client() -> GeminiClient {
        GeminiClient::new(GeminiConfig::new("test-key")).unwrap()
    }

    #[test]
    fn url_targets_generate_content() {
        let c = client();
        assert_eq!(
            c.api_url(),
            format!("{GEMINI_API_BASE}/gemini-2.0-flash:generateContent")
        );
    }

    #[test]
    fn body_maps_roles_and_system_instruction() {
        let c = client();
        let messages = vec![
            Message::system("be helpful"),
            Message::user("hello"),
            Message::assistant("hi"),
        ];
        let body = c.build_request_body(&messages, &[]);

        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[0]["role"], json!("user"));
        assert_eq!(contents[1]["role"], json!("model"));
        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"],
            json!("be helpful")
        );
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn body_replays_function_call_and_response_parts() {
        let c = client();
        let call = ToolCall {
            id: "t1".into(),
            name: "dataframe_info".into(),
            arguments: json!({}),
        };
        let messages = vec![
            Message::user("what's in the data?"),
            Message::assistant_tool_calls("", vec![call]),
            Message::tool_response("dataframe_info", json!({"shape": {"rows": 3}})),
        ];
        let body = c.build_request_body(&messages, &[]);
        let contents = body["contents"].as_array().unwrap();

        assert_eq!(contents[1]["role"], json!("model"));
        assert_eq!(
            contents[1]["parts"][0]["functionCall"]["name"],
            json!("dataframe_info")
        );
        assert_eq!(contents[2]["role"], json!("user"));
        assert_eq!(
            contents[2]["parts"][0]["functionResponse"]["response"]["result"]["shape"]["rows"],
            json!(3)
        );
    }

    #[test]
    fn body_includes_function_declarations() {
        let c = client();
        let tools = crate::tools::analysis_tools();
        let body = c.build_request_body(&[Message::user("hi")], &tools);
        let declarations = body["tools"][0]["functionDeclarations"].as_array().unwrap();
        assert_eq!(declarations.len(), 4);
        assert_eq!(declarations[0]["name"], json!("dataframe_info"));
    }

    #[test]
    fn parses_text_and_function_calls() {
        let c = client();
        let response = json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "Let me check." },
                        { "functionCall": { "name": "python_analysis", "args": { "code": "result = df['a'].sum()" } } }
                    ]
                }
            }],
            "usageMetadata": { "promptTokenCount": 12, "candidatesTokenCount": 7 }
        });
        let parsed = c.parse_response(response).unwrap();
        assert_eq!(parsed.content, "Let me check.");
        assert_eq!(parsed.tool_calls.len(), 1);
        assert_eq!(parsed.tool_calls[0].name, "python_analysis");
        assert_eq!(parsed.usage.total_tokens(), 19);
        // ids are locally generated and unique
        assert!(!parsed.tool_calls[0].id.is_empty());
    }

    #[test]
    fn missing_candidates_is_a_parse_error() {
        let c = client();
        let err = c.parse_response(json!({})).unwrap_err();
        assert!(matches!(err, AiError::ParseError(_)));
    }
}
