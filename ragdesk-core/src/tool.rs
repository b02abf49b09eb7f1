//! The tool contract used by the answering agent.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::Result;
use crate::model::ToolDeclaration;

/// What a tool hands back to the agent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolOutput {
    /// Text appended to the model context as the tool result.
    pub content: String,
    /// Identifiers of the stored items the content was built from.
    pub sources: Vec<String>,
}

impl ToolOutput {
    pub fn text(content: impl Into<String>) -> Self {
        Self { content: content.into(), sources: Vec::new() }
    }
}

/// A capability the model may invoke by name.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the arguments. `None` means the tool takes no arguments.
    fn parameters_schema(&self) -> Option<Value> {
        None
    }

    /// The declaration advertised to the model.
    fn declaration(&self) -> ToolDeclaration {
        ToolDeclaration {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self
                .parameters_schema()
                .unwrap_or_else(|| json!({ "type": "object", "properties": {} })),
        }
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput>;
}
