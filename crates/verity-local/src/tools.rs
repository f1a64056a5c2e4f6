//! Auxiliary tool callbacks.
//!
//! Both are deterministic pure functions of their inputs. They are exposed
//! two ways: as plain functions (the research flow calls its strategy tool
//! directly) and as registry [`Tool`]s the model can invoke mid-generation.

use schemars::{schema_for, JsonSchema};
use serde::Deserialize;
use serde_json::Value;
use verity_core::tool::{Tool, ToolDefinition};
use verity_core::Error;

pub const EXTRACT_REASONING: &str = "extract_reasoning";
pub const INCORPORATION_STRATEGY: &str = "incorporation_strategy";

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ExtractReasoningInput {
    /// The article text.
    pub article: String,
    /// Whether the article was judged fake.
    pub is_fake: bool,
}

/// Templated reasoning string for a classified article.
pub fn extract_reasoning(input: &ExtractReasoningInput) -> String {
    let label = if input.is_fake { "fake" } else { "real" };
    format!(
        "The article is {label} because of these reasons found in the article: {}",
        input.article
    )
}

pub fn extract_reasoning_tool() -> Tool {
    Tool {
        definition: ToolDefinition {
            name: EXTRACT_REASONING.to_string(),
            description: "Extract the parts of the article that most affect whether it is \
                          judged real or fake."
                .to_string(),
            input_schema: schema_value::<ExtractReasoningInput>(),
        },
        handler: Box::new(|input| {
            let input: ExtractReasoningInput = serde_json::from_value(input)
                .map_err(|e| Error::Validation(format!("{EXTRACT_REASONING} input: {e}")))?;
            Ok(Value::String(extract_reasoning(&input)))
        }),
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct IncorporationStrategyInput {
    /// The user-provided research topic.
    pub query: String,
}

/// How to work the requested topic into the paper.
pub fn incorporation_strategy(query: &str) -> String {
    format!("Focus on {query} as the core argument")
}

pub fn incorporation_strategy_tool() -> Tool {
    Tool {
        definition: ToolDefinition {
            name: INCORPORATION_STRATEGY.to_string(),
            description: "Determine how to best incorporate the user's topic into the \
                          research paper."
                .to_string(),
            input_schema: schema_value::<IncorporationStrategyInput>(),
        },
        handler: Box::new(|input| {
            let input: IncorporationStrategyInput = serde_json::from_value(input)
                .map_err(|e| Error::Validation(format!("{INCORPORATION_STRATEGY} input: {e}")))?;
            Ok(Value::String(incorporation_strategy(&input.query)))
        }),
    }
}

fn schema_value<T: JsonSchema>() -> Value {
    serde_json::to_value(schema_for!(T)).unwrap_or_else(|_| serde_json::json!({"type": "object"}))
}
