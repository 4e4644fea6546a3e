// SPDX-License-Identifier: MIT

//! OpenAI-compatible chat completions

use super::{GenerationConfig, Model};
use crate::kit::error::{BoxError, ModelError};
use crate::kit::message::{Message, Part, Role, ToolCallRequest};
use crate::kit::tool::Tool;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::env;
use std::sync::Arc;

/// Chat-completions model over any OpenAI-compatible endpoint
pub struct OpenAIModel {
    client: Client,
    api_key: String,
    model_name: String,
    base_url: String,
}

impl OpenAIModel {
    /// Requires `OPENAI_API_KEY`; `OPENAI_BASE_URL` overrides the endpoint.
    pub fn new(model_name: impl Into<String>) -> Result<Self, ModelError> {
        let api_key =
            env::var("OPENAI_API_KEY").map_err(|_| ModelError::ApiKeyMissing("openai".into()))?;
        let base_url =
            env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".to_string());

        Ok(Self {
            client: Client::new(),
            api_key,
            model_name: model_name.into(),
            base_url,
        })
    }

    /// Convert one conversation entry into wire messages.
    ///
    /// A tool-role entry may hold several results; each becomes its own
    /// `tool` message keyed by call id.
    fn to_wire_messages(message: &Message) -> Vec<Value> {
        match message.role {
            Role::Tool => message
                .parts
                .iter()
                .filter_map(|p| match p {
                    Part::ToolResult(result) => Some(json!({
                        "role": "tool",
                        "tool_call_id": result.call_id,
                        "content": serde_json::to_string(&result.output).unwrap_or_default()
                    })),
                    _ => None,
                })
                .collect(),
            role => {
                let role = match role {
                    Role::System => "system",
                    Role::User => "user",
                    _ => "assistant",
                };
                let text = message.content();
                let tool_calls: Vec<Value> = message
                    .requested_tools()
                    .into_iter()
                    .map(|call| {
                        json!({
                            "id": call.id,
                            "type": "function",
                            "function": {
                                "name": call.name,
                                "arguments": serde_json::to_string(&call.args).unwrap_or_default()
                            }
                        })
                    })
                    .collect();

                if tool_calls.is_empty() {
                    vec![json!({ "role": role, "content": text })]
                } else {
                    vec![json!({
                        "role": role,
                        "content": if text.is_empty() { Value::Null } else { json!(text) },
                        "tool_calls": tool_calls
                    })]
                }
            }
        }
    }

    fn tools_to_wire(tools: &[Arc<dyn Tool>]) -> Vec<Value> {
        tools
            .iter()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name(),
                        "description": t.description(),
                        "parameters": t.schema()
                    }
                })
            })
            .collect()
    }

    fn parse_response(response: &Value) -> Result<Message, ModelError> {
        let message = response["choices"]
            .as_array()
            .and_then(|c| c.first())
            .map(|choice| &choice["message"])
            .ok_or_else(|| ModelError::InvalidResponse("no choices in response".into()))?;

        let mut parts = Vec::new();

        if let Some(content) = message["content"].as_str() {
            if !content.is_empty() {
                parts.push(Part::Text {
                    text: content.to_string(),
                });
            }
        }

        if let Some(tool_calls) = message["tool_calls"].as_array() {
            for tc in tool_calls {
                let name = tc["function"]["name"]
                    .as_str()
                    .ok_or_else(|| ModelError::InvalidResponse("tool call without name".into()))?;
                // Unparseable arguments stay a raw string so the tool node rejects them
                let args = match tc["function"]["arguments"].as_str() {
                    Some(raw) => serde_json::from_str(raw)
                        .unwrap_or_else(|_| Value::String(raw.to_string())),
                    None => json!({}),
                };

                let mut call = ToolCallRequest::new(name, args);
                if let Some(id) = tc["id"].as_str() {
                    call.id = id.to_string();
                }
                parts.push(Part::ToolCall(call));
            }
        }

        Ok(Message::new(Role::Assistant, parts))
    }
}

#[async_trait]
impl Model for OpenAIModel {
    async fn generate_content(
        &self,
        history: &[Message],
        config: Option<&GenerationConfig>,
        tools: Option<&[Arc<dyn Tool>]>,
    ) -> Result<Message, BoxError> {
        let url = format!("{}/chat/completions", self.base_url);

        let messages: Vec<Value> = history.iter().flat_map(Self::to_wire_messages).collect();

        let mut body = json!({
            "model": self.model_name,
            "messages": messages
        });

        if let Some(cfg) = config {
            if let Some(temp) = cfg.temperature {
                body["temperature"] = json!(temp);
            }
            if let Some(max_tokens) = cfg.max_output_tokens {
                body["max_tokens"] = json!(max_tokens);
            }
            if let Some(top_p) = cfg.top_p {
                body["top_p"] = json!(top_p);
            }
        }

        if let Some(tools) = tools {
            if !tools.is_empty() {
                body["tools"] = json!(Self::tools_to_wire(tools));
                body["tool_choice"] = json!("auto");
            }
        }

        log::debug!(
            "OpenAI request body: {}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await?;
            return Err(ModelError::Api {
                provider: "openai".to_string(),
                status: status.as_u16(),
                body: text,
            }
            .into());
        }

        let resp_json: Value = resp.json().await?;
        log::debug!("OpenAI response: {}", resp_json);

        Ok(Self::parse_response(&resp_json)?)
    }
}
