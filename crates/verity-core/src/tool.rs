//! Local tool callbacks the model may invoke mid-generation.
//!
//! A tool is a pure function with a declared input shape. The registry is a
//! plain name-keyed table: backends look a requested tool up by name, run the
//! handler, and feed the value back into the generation loop.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declared to the model so it knows the tool exists and what input it takes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema for the tool's input object.
    pub input_schema: serde_json::Value,
}

pub type ToolHandler = Box<dyn Fn(serde_json::Value) -> Result<serde_json::Value> + Send + Sync>;

pub struct Tool {
    pub definition: ToolDefinition,
    pub handler: ToolHandler,
}

impl Tool {
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn invoke(&self, input: serde_json::Value) -> Result<serde_json::Value> {
        (self.handler)(input)
    }
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("definition", &self.definition)
            .finish_non_exhaustive()
    }
}

/// A tool call the backend completed during generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedToolCall {
    pub name: String,
    pub output: serde_json::Value,
}

#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Tool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Tool) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    /// Run a registered tool by name. Unknown names are an error: a model
    /// must not be able to request arbitrary local functions.
    pub fn invoke(&self, name: &str, input: serde_json::Value) -> Result<serde_json::Value> {
        let tool = self
            .get(name)
            .ok_or_else(|| Error::Model(format!("model requested unknown tool: {name}")))?;
        tool.invoke(input)
    }

    pub fn definitions(&self) -> Vec<&ToolDefinition> {
        self.tools.values().map(|t| &t.definition).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
