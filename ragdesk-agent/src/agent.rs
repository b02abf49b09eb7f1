//! The answering agent.
//!
//! Each turn runs Decide → (ToolCall → Decide)* → Finalize. The model sees
//! the system instruction, the bounded history, the new question and the
//! tool calls and results made so far in this turn. When it answers, the
//! question and answer are appended to history; the tool exchanges are not.

use std::collections::BTreeMap;
use std::pin::Pin;
use std::sync::Arc;

use async_stream::try_stream;
use futures::{Stream, StreamExt};
use ragdesk_core::{Llm, LlmChunk, LlmRequest, LlmResponse, Message, Tool, ToolCall};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{AgentError, Result};
use crate::history::{ConversationHistory, DEFAULT_HISTORY_CAPACITY};

/// Default bound on model calls per turn.
pub const DEFAULT_MAX_ITERATIONS: usize = 8;

/// Instruction used when none is configured.
pub const DEFAULT_INSTRUCTION: &str = "You are an assistant that answers questions about the \
uploaded documents. Use the provided tool to look up context before answering. Answer the \
question as detailed as possible from the provided context, making sure to include all the \
details. If the answer is not in the provided context, just say \"The answer is not in the \
context\". Do not provide a wrong answer.";

/// Outcome of one tool call within a turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResult {
    pub call_id: String,
    pub name: String,
    /// What the model was shown.
    pub content: String,
    pub is_error: bool,
}

/// The result of a completed turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Answer {
    pub text: String,
    /// Ids of the stored chunks the tools drew on, first use first.
    pub sources: Vec<String>,
    /// Every tool call the model made, in order.
    pub tool_calls: Vec<ToolCall>,
}

/// Progress of a streamed turn.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    ToolCall(ToolCall),
    ToolResult(ToolResult),
    /// A fragment of answer text. Fragments concatenate to [`Answer::text`].
    TextDelta(String),
    /// Always the last event of a successful turn.
    Done(Answer),
}

/// A stream of turn events, borrowing the agent.
pub type AgentEventStream<'a> = Pin<Box<dyn Stream<Item = Result<AgentEvent>> + Send + 'a>>;

/// A question-answering agent that calls tools in a bounded loop.
///
/// # Example
///
/// ```rust,ignore
/// use ragdesk_agent::AnsweringAgentBuilder;
///
/// let agent = AnsweringAgentBuilder::new("pdf_assistant")
///     .model(Arc::new(model))
///     .tool(Arc::new(RetrieverTool::new(pipeline)))
///     .build()?;
///
/// let answer = agent.answer("What does the warranty cover?").await?;
/// println!("{}", answer.text);
/// ```
pub struct AnsweringAgent {
    name: String,
    instruction: String,
    model: Arc<dyn Llm>,
    tools: BTreeMap<String, Arc<dyn Tool>>,
    max_iterations: usize,
    history: Mutex<ConversationHistory>,
}

impl std::fmt::Debug for AnsweringAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnsweringAgent")
            .field("name", &self.name)
            .field("model", &self.model.name())
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .field("max_iterations", &self.max_iterations)
            .finish()
    }
}

impl AnsweringAgent {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    /// Snapshot of the conversation history, oldest first.
    pub async fn history(&self) -> Vec<Message> {
        self.history.lock().await.messages()
    }

    /// Forget the conversation so far.
    pub async fn clear_history(&self) {
        self.history.lock().await.clear();
        info!(agent = %self.name, "conversation history cleared");
    }

    /// Answer `question`, calling tools as the model requests.
    ///
    /// # Errors
    ///
    /// - [`AgentError::Model`] if the generation service fails.
    /// - [`AgentError::MaxIterations`] if the model does not answer within
    ///   the configured number of calls.
    ///
    /// History is only updated when a turn succeeds.
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        info!(agent = %self.name, "turn started");
        let history = self.history().await;
        let mut scratchpad = Vec::new();
        let mut answer = Answer::default();

        for step in 0..self.max_iterations {
            debug!(agent = %self.name, step, "deciding");
            let request = self.request(&history, question, &scratchpad);
            match self.model.generate(request).await? {
                LlmResponse::Final(text) => {
                    answer.text.push_str(&text);
                    self.finish_turn(question, &answer).await;
                    return Ok(answer);
                }
                LlmResponse::ToolCalls { text, calls } => {
                    answer.text.push_str(&text);
                    self.run_tools(text, calls, &mut scratchpad, &mut answer).await;
                }
            }
        }

        warn!(agent = %self.name, limit = self.max_iterations, "no final answer");
        Err(AgentError::MaxIterations(self.max_iterations))
    }

    /// Streaming form of [`answer`](Self::answer).
    ///
    /// Events are produced lazily as the stream is polled. Dropping the
    /// stream abandons the turn and leaves history untouched.
    pub fn answer_stream<'a>(&'a self, question: &'a str) -> AgentEventStream<'a> {
        let stream = try_stream! {
            info!(agent = %self.name, "streamed turn started");
            let history = self.history().await;
            let mut scratchpad = Vec::new();
            let mut answer = Answer::default();
            let mut finished = false;

            for step in 0..self.max_iterations {
                debug!(agent = %self.name, step, "deciding");
                let request = self.request(&history, question, &scratchpad);
                let mut chunks = self.model.generate_stream(request).await?;
                let mut text = String::new();
                let mut calls = Vec::new();

                while let Some(chunk) = chunks.next().await {
                    match chunk? {
                        LlmChunk::Text(fragment) => {
                            text.push_str(&fragment);
                            answer.text.push_str(&fragment);
                            yield AgentEvent::TextDelta(fragment);
                        }
                        LlmChunk::ToolCalls(more) => calls.extend(more),
                    }
                }

                if calls.is_empty() {
                    finished = true;
                    break;
                }
                for call in &calls {
                    yield AgentEvent::ToolCall(call.clone());
                }
                for result in self.run_tools(text, calls, &mut scratchpad, &mut answer).await {
                    yield AgentEvent::ToolResult(result);
                }
            }

            if !finished {
                warn!(agent = %self.name, limit = self.max_iterations, "no final answer");
                Err::<(), _>(AgentError::MaxIterations(self.max_iterations))?;
            }
            self.finish_turn(question, &answer).await;
            yield AgentEvent::Done(answer);
        };
        Box::pin(stream)
    }

    fn request(&self, history: &[Message], question: &str, scratchpad: &[Message]) -> LlmRequest {
        let mut messages = Vec::with_capacity(history.len() + scratchpad.len() + 2);
        messages.push(Message::system(self.instruction.clone()));
        messages.extend_from_slice(history);
        messages.push(Message::user(question));
        messages.extend_from_slice(scratchpad);
        LlmRequest::new(messages).with_tools(self.tools.values().map(|t| t.declaration()).collect())
    }

    /// Execute `calls` in order, recording the exchange in `scratchpad`.
    async fn run_tools(
        &self,
        text: String,
        calls: Vec<ToolCall>,
        scratchpad: &mut Vec<Message>,
        answer: &mut Answer,
    ) -> Vec<ToolResult> {
        scratchpad.push(Message::assistant_tool_calls(text, calls.clone()));
        let mut results = Vec::with_capacity(calls.len());

        for call in calls {
            let result = match self.tools.get(&call.name) {
                None => {
                    warn!(agent = %self.name, tool = %call.name, "model requested unknown tool");
                    ToolResult {
                        call_id: call.id.clone(),
                        name: call.name.clone(),
                        content: format!("error: unknown tool '{}'", call.name),
                        is_error: true,
                    }
                }
                Some(tool) => match tool.execute(call.arguments.clone()).await {
                    Ok(output) => {
                        debug!(tool = %call.name, sources = output.sources.len(), "tool succeeded");
                        for source in output.sources {
                            if !answer.sources.contains(&source) {
                                answer.sources.push(source);
                            }
                        }
                        ToolResult {
                            call_id: call.id.clone(),
                            name: call.name.clone(),
                            content: output.content,
                            is_error: false,
                        }
                    }
                    Err(e) => {
                        warn!(tool = %call.name, error = %e, "tool failed");
                        ToolResult {
                            call_id: call.id.clone(),
                            name: call.name.clone(),
                            content: format!("error: {e}"),
                            is_error: true,
                        }
                    }
                },
            };
            scratchpad.push(Message::tool_result(&result.call_id, &result.content));
            answer.tool_calls.push(call);
            results.push(result);
        }
        results
    }

    async fn finish_turn(&self, question: &str, answer: &Answer) {
        let mut history = self.history.lock().await;
        history.push(Message::user(question));
        history.push(Message::assistant(answer.text.clone()));
        info!(
            agent = %self.name,
            tool_calls = answer.tool_calls.len(),
            sources = answer.sources.len(),
            history = history.len(),
            "turn finished"
        );
    }
}

/// Builder for [`AnsweringAgent`].
pub struct AnsweringAgentBuilder {
    name: String,
    instruction: String,
    model: Option<Arc<dyn Llm>>,
    tools: Vec<Arc<dyn Tool>>,
    max_iterations: usize,
    history_capacity: usize,
}

impl AnsweringAgentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instruction: DEFAULT_INSTRUCTION.to_string(),
            model: None,
            tools: Vec::new(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }

    pub fn instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    pub fn model(mut self, model: Arc<dyn Llm>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    /// Maximum model calls per turn.
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Maximum messages kept in history.
    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// # Errors
    ///
    /// Returns [`AgentError::Config`] if no model is set, two tools share a
    /// name, or `max_iterations` is zero.
    pub fn build(self) -> Result<AnsweringAgent> {
        let model = self.model.ok_or_else(|| AgentError::Config("model is required".into()))?;
        if self.max_iterations == 0 {
            return Err(AgentError::Config("max_iterations must be greater than zero".into()));
        }

        let mut tools = BTreeMap::new();
        for tool in self.tools {
            let name = tool.name().to_string();
            if tools.insert(name.clone(), tool).is_some() {
                return Err(AgentError::Config(format!("duplicate tool name '{name}'")));
            }
        }

        Ok(AnsweringAgent {
            name: self.name,
            instruction: self.instruction,
            model,
            tools,
            max_iterations: self.max_iterations,
            history: Mutex::new(ConversationHistory::new(self.history_capacity)),
        })
    }
}
