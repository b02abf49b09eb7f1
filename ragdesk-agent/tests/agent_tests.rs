//! Integration tests for the answering agent loop.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use ragdesk_agent::{AgentError, AgentEvent, AnsweringAgent, AnsweringAgentBuilder, Answer};
use ragdesk_core::{CoreError, LlmResponse, Role, Tool, ToolCall, ToolOutput};
use ragdesk_model::MockLlm;
use serde_json::{Value, json};

/// Returns a fixed passage for any query.
struct StaticRetriever;

#[async_trait]
impl Tool for StaticRetriever {
    fn name(&self) -> &str {
        "pdf_extractor"
    }

    fn description(&self) -> &str {
        "Looks up passages"
    }

    async fn execute(&self, args: Value) -> ragdesk_core::Result<ToolOutput> {
        let query = args["query"]
            .as_str()
            .ok_or_else(|| CoreError::Tool("missing required 'query' parameter".into()))?;
        Ok(ToolOutput {
            content: format!("Passage about {query}."),
            sources: vec!["manual.pdf#3".into(), "manual.pdf#3".into(), "manual.pdf#4".into()],
        })
    }
}

fn agent(model: Arc<MockLlm>) -> AnsweringAgent {
    AnsweringAgentBuilder::new("test_agent")
        .model(model)
        .tool(Arc::new(StaticRetriever))
        .build()
        .unwrap()
}

fn lookup(id: &str, query: &str) -> LlmResponse {
    LlmResponse::ToolCalls {
        text: String::new(),
        calls: vec![ToolCall { id: id.into(), name: "pdf_extractor".into(), arguments: json!({ "query": query }) }],
    }
}

#[tokio::test]
async fn answers_directly_without_tools() {
    let model = Arc::new(MockLlm::new("mock").with_response("Hello!"));
    let agent = agent(model.clone());

    let answer = agent.answer("hi").await.unwrap();
    assert_eq!(answer, Answer { text: "Hello!".into(), ..Answer::default() });

    let request = &model.requests()[0];
    assert_eq!(request.messages[0].role, Role::System);
    assert!(request.messages[0].content.contains("The answer is not in the context"));
    assert_eq!(request.messages.last().unwrap().content, "hi");
    assert_eq!(request.tools[0].name, "pdf_extractor");

    let history = agent.history().await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].content, "Hello!");
}

#[tokio::test]
async fn tool_results_are_fed_back_to_the_model() {
    let model = Arc::new(
        MockLlm::new("mock")
            .with_decision(lookup("call_1", "warranty"))
            .with_response("Two years."),
    );
    let agent = agent(model.clone());

    let answer = agent.answer("How long is the warranty?").await.unwrap();
    assert_eq!(answer.text, "Two years.");
    assert_eq!(answer.sources, vec!["manual.pdf#3", "manual.pdf#4"]);
    assert_eq!(answer.tool_calls.len(), 1);

    let second = &model.requests()[1];
    let n = second.messages.len();
    assert_eq!(second.messages[n - 2].role, Role::Assistant);
    assert_eq!(second.messages[n - 2].tool_calls[0].id, "call_1");
    assert_eq!(second.messages[n - 1].role, Role::Tool);
    assert_eq!(second.messages[n - 1].tool_call_id.as_deref(), Some("call_1"));
    assert_eq!(second.messages[n - 1].content, "Passage about warranty.");

    // Only the question and the answer are remembered.
    let history = agent.history().await;
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|m| m.tool_calls.is_empty() && m.role != Role::Tool));
}

#[tokio::test]
async fn unknown_and_failing_tools_become_error_results() {
    let model = Arc::new(
        MockLlm::new("mock")
            .with_tool_call("call_1", "web_search", json!({ "q": "x" }))
            .with_tool_call("call_2", "pdf_extractor", json!({ "wrong": "x" }))
            .with_response("Sorry, I could not find that."),
    );
    let agent = agent(model.clone());

    let answer = agent.answer("?").await.unwrap();
    assert_eq!(answer.text, "Sorry, I could not find that.");
    assert!(answer.sources.is_empty());

    let requests = model.requests();
    let unknown = requests[1].messages.last().unwrap();
    assert_eq!(unknown.content, "error: unknown tool 'web_search'");
    let failed = requests[2].messages.last().unwrap();
    assert!(failed.content.starts_with("error: "));
    assert!(failed.content.contains("query"));
}

#[tokio::test]
async fn stops_after_max_iterations() {
    let mut model = MockLlm::new("mock");
    for i in 0..3 {
        model = model.with_decision(lookup(&format!("call_{i}"), "loop"));
    }
    let model = Arc::new(model);
    let agent = AnsweringAgentBuilder::new("bounded")
        .model(model.clone())
        .tool(Arc::new(StaticRetriever))
        .max_iterations(3)
        .build()
        .unwrap();

    let err = agent.answer("loop forever").await.unwrap_err();
    assert!(matches!(err, AgentError::MaxIterations(3)));
    assert_eq!(model.call_count(), 3);
    assert!(agent.history().await.is_empty());
}

#[tokio::test]
async fn model_failure_leaves_history_untouched() {
    let model = Arc::new(MockLlm::new("mock").with_response("first").with_error("rate limited"));
    let agent = agent(model);

    agent.answer("one").await.unwrap();
    let err = agent.answer("two").await.unwrap_err();
    assert!(matches!(err, AgentError::Model(ref m) if m.contains("rate limited")));
    assert_eq!(agent.history().await.len(), 2);
}

#[tokio::test]
async fn history_is_capped_at_fifty_messages() {
    let mut model = MockLlm::new("mock");
    for turn in 0..30 {
        model = model.with_response(format!("answer {turn}"));
    }
    let model = Arc::new(model);
    let agent = agent(model.clone());

    for turn in 0..30 {
        agent.answer(&format!("question {turn}")).await.unwrap();
    }

    let history = agent.history().await;
    assert_eq!(history.len(), 50);
    // 60 messages were recorded; the first ten (turns 0-4) were dropped.
    assert_eq!(history[0].content, "question 5");
    assert_eq!(history[49].content, "answer 29");

    // The last request carried the capped history plus system and question.
    assert_eq!(model.requests()[29].messages.len(), 1 + 50 + 1);

    agent.clear_history().await;
    assert!(agent.history().await.is_empty());
}

#[tokio::test]
async fn stream_deltas_concatenate_to_the_answer() {
    let script = || {
        MockLlm::new("mock")
            .with_decision(LlmResponse::ToolCalls {
                text: "Let me check. ".into(),
                calls: vec![ToolCall {
                    id: "call_1".into(),
                    name: "pdf_extractor".into(),
                    arguments: json!({ "query": "battery" }),
                }],
            })
            .with_response("The battery lasts ten hours.")
    };

    let streaming = agent(Arc::new(script()));
    let events: Vec<AgentEvent> =
        streaming.answer_stream("battery life?").map(|e| e.unwrap()).collect().await;

    let deltas: String = events
        .iter()
        .filter_map(|e| match e {
            AgentEvent::TextDelta(t) => Some(t.as_str()),
            _ => None,
        })
        .collect();
    let Some(AgentEvent::Done(done)) = events.last() else {
        panic!("stream did not end with Done");
    };
    assert_eq!(deltas, done.text);
    assert!(events.iter().any(|e| matches!(e, AgentEvent::ToolCall(c) if c.id == "call_1")));
    assert!(events.iter().any(|e| matches!(e, AgentEvent::ToolResult(r) if !r.is_error)));

    let blocking = agent(Arc::new(script()));
    let answer = blocking.answer("battery life?").await.unwrap();
    assert_eq!(*done, answer);
    assert_eq!(streaming.history().await, blocking.history().await);
}

#[tokio::test]
async fn dropped_stream_does_not_touch_history() {
    let model = Arc::new(MockLlm::new("mock").with_response("a long streamed answer"));
    let agent = agent(model);

    {
        let mut stream = agent.answer_stream("question");
        let first = stream.next().await.unwrap().unwrap();
        assert!(matches!(first, AgentEvent::TextDelta(_)));
    }
    assert!(agent.history().await.is_empty());
}

#[test]
fn builder_rejects_invalid_settings() {
    assert!(matches!(AnsweringAgentBuilder::new("a").build(), Err(AgentError::Config(_))));

    let model = Arc::new(MockLlm::new("mock"));
    let duplicate = AnsweringAgentBuilder::new("a")
        .model(model.clone())
        .tool(Arc::new(StaticRetriever))
        .tool(Arc::new(StaticRetriever))
        .build();
    assert!(matches!(duplicate, Err(AgentError::Config(ref m)) if m.contains("pdf_extractor")));

    let zero = AnsweringAgentBuilder::new("a").model(model).max_iterations(0).build();
    assert!(matches!(zero, Err(AgentError::Config(_))));
}
