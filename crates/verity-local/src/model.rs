//! OpenAI-compatible chat.completions client with a bounded tool-call loop.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use verity_core::tool::ToolRegistry;
use verity_core::{
    CompletedToolCall, Error, GenerateRequest, GenerateResponse, ModelBackend, Result,
    ToolDefinition,
};

fn env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub const BASE_URL_ENV: &str = "VERITY_MODEL_BASE_URL";
pub const API_KEY_ENV: &str = "VERITY_MODEL_API_KEY";
pub const MODEL_ENV: &str = "VERITY_MODEL";

/// The flows declare at most one tool each, so a handful of rounds is plenty.
const MAX_TOOL_ROUNDS: usize = 4;

#[derive(Debug, Clone)]
pub struct OpenAiCompatModel {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: Option<f64>,
    max_tokens: Option<u64>,
}

impl OpenAiCompatModel {
    pub fn new(
        client: reqwest::Client,
        base_url: String,
        api_key: Option<String>,
        model: String,
    ) -> Self {
        Self {
            client,
            base_url,
            api_key,
            model,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn from_env(client: reqwest::Client, model_override: Option<String>) -> Result<Self> {
        let base_url = env(BASE_URL_ENV)
            .ok_or_else(|| Error::NotConfigured(format!("missing {BASE_URL_ENV}")))?;
        let api_key = env(API_KEY_ENV);
        let model = model_override
            .or_else(|| env(MODEL_ENV))
            .ok_or_else(|| Error::NotConfigured(format!("missing {MODEL_ENV}")))?;
        Ok(Self::new(client, base_url, api_key, model))
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u64) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint_chat_completions(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        )
    }

    fn tool_decl(def: &ToolDefinition) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": def.name,
                "description": def.description,
                "parameters": def.input_schema,
            }
        })
    }

    async fn round(&self, messages: &[Value], tool_decls: &[Value]) -> Result<ChoiceMessage> {
        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "stream": false,
        });
        if let Some(t) = self.temperature {
            body["temperature"] = json!(t);
        }
        if let Some(m) = self.max_tokens {
            body["max_tokens"] = json!(m);
        }
        if !tool_decls.is_empty() {
            body["tools"] = json!(tool_decls);
        }

        let mut rb = self
            .client
            .post(self.endpoint_chat_completions())
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(k) = &self.api_key {
            rb = rb.header(reqwest::header::AUTHORIZATION, format!("Bearer {k}"));
        }

        let resp = rb
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Model(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Model(format!("chat.completions HTTP {status}")));
        }

        let parsed: ChatCompletionsResponse =
            resp.json().await.map_err(|e| Error::Model(e.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| Error::Model("chat.completions returned no choices".to_string()))
    }
}

#[async_trait::async_trait]
impl ModelBackend for OpenAiCompatModel {
    async fn generate(
        &self,
        req: &GenerateRequest,
        registry: &ToolRegistry,
    ) -> Result<GenerateResponse> {
        let mut messages = Vec::new();
        if let Some(system) = &req.system {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": req.prompt}));

        let tool_decls: Vec<Value> = registry
            .definitions()
            .into_iter()
            .map(Self::tool_decl)
            .collect();
        let mut completed: Vec<CompletedToolCall> = Vec::new();

        for _ in 0..MAX_TOOL_ROUNDS {
            let msg = self.round(&messages, &tool_decls).await?;

            if msg.tool_calls.is_empty() {
                let content = msg.content.unwrap_or_default();
                let output = parse_json_output(&content)?;
                return Ok(GenerateResponse {
                    output,
                    tool_calls: completed,
                });
            }

            messages.push(json!({
                "role": "assistant",
                "content": &msg.content,
                "tool_calls": &msg.tool_calls,
            }));
            for call in &msg.tool_calls {
                let name = &call.function.name;
                let args: Value = serde_json::from_str(&call.function.arguments)
                    .map_err(|e| Error::Model(format!("tool {name} arguments: {e}")))?;
                let output = registry.invoke(name, args)?;
                tracing::debug!(tool = %name, "completed tool call");
                messages.push(json!({
                    "role": "tool",
                    "tool_call_id": call.id,
                    "content": tool_result_text(&output),
                }));
                completed.push(CompletedToolCall {
                    name: name.clone(),
                    output,
                });
            }
        }

        Err(Error::Model(format!(
            "tool-call loop did not settle within {MAX_TOOL_ROUNDS} rounds"
        )))
    }
}

fn tool_result_text(output: &Value) -> String {
    match output {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse the final assistant content as a JSON object, tolerating a
/// markdown code fence around it.
fn parse_json_output(content: &str) -> Result<Value> {
    let trimmed = content.trim();
    let inner = if let Some(stripped) = trimmed.strip_prefix("```") {
        let stripped = stripped.strip_prefix("json").unwrap_or(stripped);
        stripped
            .strip_suffix("```")
            .unwrap_or(stripped)
            .trim()
    } else {
        trimmed
    };
    serde_json::from_str(inner)
        .map_err(|e| Error::Validation(format!("model output is not valid JSON: {e}")))
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionsResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCallMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ToolCallMessage {
    id: String,
    #[serde(rename = "type", default = "function_call_type")]
    kind: String,
    function: FunctionCall,
}

fn function_call_type() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    /// JSON-encoded argument object, as the wire format delivers it.
    arguments: String,
}
