//! Conversions between ragdesk types and `async-openai` types.

use std::collections::BTreeMap;

use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionMessageToolCallChunk,
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestToolMessageArgs,
    ChatCompletionRequestUserMessageArgs, ChatCompletionResponseMessage, ChatCompletionTool,
    ChatCompletionToolArgs, ChatCompletionToolType, CreateChatCompletionStreamResponse, FunctionCall,
    FunctionObjectArgs,
};
use ragdesk_core::{LlmResponse, Message, Role, ToolCall, ToolDeclaration};
use serde_json::{Value, json};

use crate::error::{ModelError, Result};

/// Convert a transcript entry to a request message.
pub(crate) fn message_to_request(message: &Message) -> Result<ChatCompletionRequestMessage> {
    let converted = match message.role {
        Role::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(message.content.as_str())
            .build()?
            .into(),
        Role::User => ChatCompletionRequestUserMessageArgs::default()
            .content(message.content.as_str())
            .build()?
            .into(),
        Role::Assistant => {
            let mut args = ChatCompletionRequestAssistantMessageArgs::default();
            if !message.content.is_empty() {
                args.content(message.content.as_str());
            }
            if !message.tool_calls.is_empty() {
                args.tool_calls(message.tool_calls.iter().map(to_openai_tool_call).collect::<Vec<_>>());
            }
            args.build()?.into()
        }
        Role::Tool => ChatCompletionRequestToolMessageArgs::default()
            .tool_call_id(message.tool_call_id.clone().unwrap_or_default())
            .content(message.content.as_str())
            .build()?
            .into(),
    };
    Ok(converted)
}

fn to_openai_tool_call(call: &ToolCall) -> ChatCompletionMessageToolCall {
    ChatCompletionMessageToolCall {
        id: call.id.clone(),
        r#type: ChatCompletionToolType::Function,
        function: FunctionCall { name: call.name.clone(), arguments: call.arguments.to_string() },
    }
}

/// Convert tool declarations to `function` tools.
pub(crate) fn convert_tools(tools: &[ToolDeclaration]) -> Result<Vec<ChatCompletionTool>> {
    tools
        .iter()
        .map(|tool| {
            let function = FunctionObjectArgs::default()
                .name(tool.name.as_str())
                .description(tool.description.as_str())
                .parameters(tool.parameters.clone())
                .build()?;
            Ok(ChatCompletionToolArgs::default()
                .r#type(ChatCompletionToolType::Function)
                .function(function)
                .build()?)
        })
        .collect()
}

/// Parse the JSON-encoded arguments of a tool call.
///
/// Some services send an empty string for calls without arguments.
fn parse_arguments(name: &str, raw: &str) -> Result<Value> {
    if raw.trim().is_empty() {
        return Ok(json!({}));
    }
    serde_json::from_str(raw).map_err(|e| {
        ModelError::InvalidResponse(format!("arguments of tool call '{name}' are not JSON: {e}"))
    })
}

/// Turn the message of a completed response into the model's decision.
pub(crate) fn from_response_message(message: ChatCompletionResponseMessage) -> Result<LlmResponse> {
    let text = message.content.unwrap_or_default();
    let openai_calls = message.tool_calls.unwrap_or_default();
    if openai_calls.is_empty() {
        return Ok(LlmResponse::Final(text));
    }
    let calls = openai_calls
        .into_iter()
        .map(|call| {
            let arguments = parse_arguments(&call.function.name, &call.function.arguments)?;
            Ok(ToolCall { id: call.id, name: call.function.name, arguments })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(LlmResponse::ToolCalls { text, calls })
}

/// Apply one streamed chunk: tool-call fragments go to `calls`, any text
/// fragment is returned.
pub(crate) fn apply_chunk(
    chunk: CreateChatCompletionStreamResponse,
    calls: &mut ToolCallAccumulator,
) -> Option<String> {
    let mut text = String::new();
    for choice in chunk.choices {
        if let Some(content) = choice.delta.content {
            text.push_str(&content);
        }
        for fragment in choice.delta.tool_calls.unwrap_or_default() {
            calls.push(fragment);
        }
    }
    (!text.is_empty()).then_some(text)
}

#[derive(Debug, Default)]
struct PartialCall {
    id: String,
    name: String,
    arguments: String,
}

/// Assembles tool calls from streamed fragments, keyed by call index.
///
/// Only the arguments are split across fragments. Ids and names are taken
/// whole from whichever fragment carries them.
#[derive(Debug, Default)]
pub(crate) struct ToolCallAccumulator {
    calls: BTreeMap<u32, PartialCall>,
}

impl ToolCallAccumulator {
    pub(crate) fn push(&mut self, fragment: ChatCompletionMessageToolCallChunk) {
        let call = self.calls.entry(fragment.index).or_default();
        if let Some(id) = fragment.id.filter(|id| !id.is_empty()) {
            call.id = id;
        }
        if let Some(function) = fragment.function {
            if let Some(name) = function.name.filter(|name| !name.is_empty()) {
                call.name = name;
            }
            if let Some(arguments) = function.arguments {
                call.arguments.push_str(&arguments);
            }
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// The assembled calls in index order.
    pub(crate) fn finish(self) -> Result<Vec<ToolCall>> {
        self.calls
            .into_values()
            .enumerate()
            .map(|(position, call)| {
                if call.name.is_empty() {
                    return Err(ModelError::InvalidResponse(
                        "streamed tool call without a name".into(),
                    ));
                }
                let arguments = parse_arguments(&call.name, &call.arguments)?;
                let id = if call.id.is_empty() { format!("call_{position}") } else { call.id };
                Ok(ToolCall { id, name: call.name, arguments })
            })
            .collect()
    }
}
