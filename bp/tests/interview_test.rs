//! End-to-end interview tests against a scripted LLM client

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bizplan::config::{Config, Messages};
use bizplan::llm::{ChatSession, GenerateRequest, GenerateResponse, LlmClient, LlmError, Message};
use bizplan::prompts::PromptLoader;
use bizplan::transcript::Speaker;
use bizplan::{DocumentKind, InterviewError, InterviewSession, Phase};

const CANVAS_JSON: &str = r#"{
    "keyPartners": ["Rice mill"],
    "keyActivities": ["Cooking"],
    "keyResources": ["Stall"],
    "valuePropositions": ["Fresh breakfast"],
    "customerRelationships": ["Regulars"],
    "channels": ["Street front"],
    "customerSegments": ["Office workers"],
    "costStructure": ["Ingredients"],
    "revenueStreams": ["Bowl sales"]
}"#;

/// Scripted client: chat replies in order, documents keyed by title
#[derive(Default)]
struct ScriptedLlm {
    chat_replies: Mutex<VecDeque<Result<String, u16>>>,
    chat_delay: Option<Duration>,
    canvas: Mutex<Option<String>>,
    failing_document: Option<DocumentKind>,
    chats_started: AtomicUsize,
    generate_calls: AtomicUsize,
}

impl ScriptedLlm {
    fn new(replies: &[&str]) -> Self {
        Self {
            chat_replies: Mutex::new(replies.iter().map(|r| Ok(r.to_string())).collect()),
            canvas: Mutex::new(Some(CANVAS_JSON.to_string())),
            ..Default::default()
        }
    }
}

struct ScriptedClient(Arc<ScriptedLlm>);

#[async_trait]
impl LlmClient for ScriptedClient {
    fn start_chat(&self, system_instruction: &str, _max_tokens: u32) -> Result<Box<dyn ChatSession>, LlmError> {
        assert!(system_instruction.contains("ONE question at a time"));
        self.0.chats_started.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedChat {
            llm: self.0.clone(),
            history: Vec::new(),
        }))
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, LlmError> {
        let llm = &self.0;
        llm.generate_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(kind) = llm.failing_document
            && request.prompt.contains(&format!("Document: {}", kind.title()))
        {
            return Err(LlmError::ApiError {
                status: 500,
                message: "upstream exploded".to_string(),
            });
        }

        let text = if request.response_format.is_json() {
            llm.canvas.lock().unwrap().clone()
        } else {
            let title = DocumentKind::ALL
                .into_iter()
                .find(|k| request.prompt.contains(&format!("Document: {}", k.title())))
                .map(|k| k.title())
                .unwrap_or("unknown");
            Some(format!("## {}\n\nGenerated body.", title))
        };

        Ok(GenerateResponse {
            text,
            ..Default::default()
        })
    }
}

struct ScriptedChat {
    llm: Arc<ScriptedLlm>,
    history: Vec<Message>,
}

#[async_trait]
impl ChatSession for ScriptedChat {
    async fn send(&mut self, text: &str) -> Result<String, LlmError> {
        if let Some(delay) = self.llm.chat_delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.llm.chat_replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(reply)) => {
                self.history.push(Message::user(text));
                self.history.push(Message::assistant(reply.clone()));
                Ok(reply)
            }
            Some(Err(status)) => Err(LlmError::ApiError {
                status,
                message: "chat failed".to_string(),
            }),
            None => Ok("Anything else?".to_string()),
        }
    }

    fn history(&self) -> &[Message] {
        &self.history
    }
}

fn session_for(llm: Arc<ScriptedLlm>) -> Arc<InterviewSession> {
    let prompts = Arc::new(PromptLoader::embedded_only());
    Arc::new(InterviewSession::from_config(Arc::new(ScriptedClient(llm)), prompts, &Config::default()).unwrap())
}

#[tokio::test]
async fn test_full_interview_produces_bundle() {
    let llm = Arc::new(ScriptedLlm::new(&["What is your idea?", "Who are your customers?"]));
    let session = session_for(llm.clone());

    let opening = session.start().await.unwrap();
    assert_eq!(opening.reply.text(), "What is your idea?");
    session.send("A mohinga stall").await.unwrap();
    assert_eq!(session.turn_count(), 3);

    let bundle = session.finish().await.unwrap();
    assert_eq!(session.phase(), Phase::Results);
    assert_eq!(llm.generate_calls.load(Ordering::SeqCst), 9);

    assert_eq!(bundle.hr_plan, "## HR Plan\n\nGenerated body.");
    assert_eq!(bundle.financial_plan, "## Financial Plan & Projections\n\nGenerated body.");
    let canvas = bundle.bmc.as_ref().unwrap();
    assert_eq!(canvas.customer_segments, vec!["Office workers"]);

    let speakers: Vec<Speaker> = session.transcript().turns().iter().map(|t| t.speaker()).collect();
    assert_eq!(speakers, vec![Speaker::Assistant, Speaker::User, Speaker::Assistant]);
}

#[tokio::test]
async fn test_finish_too_early_makes_no_calls() {
    let llm = Arc::new(ScriptedLlm::new(&["What is your idea?"]));
    let session = session_for(llm.clone());
    session.start().await.unwrap();

    let err = session.finish().await.unwrap_err();
    assert!(matches!(err, InterviewError::TooFewTurns { have: 1, need: 3, .. }));
    assert_eq!(err.to_string(), Messages::default().too_few_turns);
    assert_eq!(session.phase(), Phase::Interviewing);
    assert_eq!(llm.generate_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_malformed_canvas_still_completes() {
    let llm = Arc::new(ScriptedLlm::new(&[]));
    *llm.canvas.lock().unwrap() = Some(r#"{"keyPartners": "not a list"}"#.to_string());
    let session = session_for(llm);

    session.start().await.unwrap();
    session.send("Tea shop").await.unwrap();

    let bundle = session.finish().await.unwrap();
    assert!(bundle.bmc.is_none());
    assert!(bundle.summary_note.contains("Summary Note"));
    assert_eq!(
        bundle.render(DocumentKind::BusinessModelCanvas, "No data available"),
        "# Business Model Canvas\n\nNo data available\n"
    );
}

#[tokio::test]
async fn test_one_failed_document_discards_batch() {
    let llm = Arc::new(ScriptedLlm {
        failing_document: Some(DocumentKind::OpsPlan),
        ..ScriptedLlm::new(&[])
    });
    let session = session_for(llm.clone());
    session.start().await.unwrap();
    session.send("Bike repair").await.unwrap();
    let before = session.transcript();

    let err = session.finish().await.unwrap_err();
    match &err {
        InterviewError::GenerationFailed { source, .. } => {
            assert_eq!(source.failed_kinds(), vec![DocumentKind::OpsPlan]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.to_string(), Messages::default().generation_failed);

    assert_eq!(llm.generate_calls.load(Ordering::SeqCst), 9);
    assert_eq!(session.phase(), Phase::Interviewing);
    assert_eq!(session.transcript(), before);
    assert!(session.bundle().is_none());
}

#[tokio::test]
async fn test_reset_starts_fresh() {
    let llm = Arc::new(ScriptedLlm::new(&["First question"]));
    let session = session_for(llm.clone());
    session.start().await.unwrap();
    session.send("Noodles").await.unwrap();
    session.finish().await.unwrap();

    session.reset().unwrap();
    assert_eq!(session.phase(), Phase::Intro);
    assert!(session.transcript().is_empty());
    assert!(session.bundle().is_none());

    // A second reset is rejected rather than repeated
    assert!(matches!(
        session.reset(),
        Err(InterviewError::InvalidPhase { phase: Phase::Intro, .. })
    ));

    session.start().await.unwrap();
    assert_eq!(llm.chats_started.load(Ordering::SeqCst), 2);
    assert_eq!(session.turn_count(), 1);
}

#[tokio::test]
async fn test_send_failure_becomes_error_turn() {
    let llm = Arc::new(ScriptedLlm::new(&["Hello"]));
    llm.chat_replies.lock().unwrap().push_back(Err(429));
    let session = session_for(llm);
    session.start().await.unwrap();

    let exchange = session.send("Coffee cart").await.unwrap();
    assert!(exchange.degraded);
    assert_eq!(exchange.reply.text(), Messages::default().send_failed);

    let exchange = session.send("Near the university").await.unwrap();
    assert!(!exchange.degraded);
    assert_eq!(exchange.reply.text(), "Anything else?");
    assert_eq!(session.turn_count(), 5);
}

#[tokio::test]
async fn test_concurrent_send_rejected_while_pending() {
    let llm = Arc::new(ScriptedLlm {
        chat_delay: Some(Duration::from_millis(200)),
        ..ScriptedLlm::new(&["Q1", "Q2"])
    });
    let session = session_for(llm);
    session.start().await.unwrap();

    let pending = {
        let session = session.clone();
        tokio::spawn(async move { session.send("first answer").await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(matches!(session.send("second answer").await, Err(InterviewError::Busy)));
    pending.await.unwrap().unwrap();

    let users: Vec<String> = session
        .transcript()
        .turns()
        .iter()
        .filter(|t| t.is_user())
        .map(|t| t.text().to_string())
        .collect();
    assert_eq!(users, vec!["first answer".to_string()]);
}

#[tokio::test]
async fn test_cancelled_send_is_followed_by_error_turn() {
    let llm = Arc::new(ScriptedLlm {
        chat_delay: Some(Duration::from_millis(200)),
        ..ScriptedLlm::new(&["Q1", "Q2"])
    });
    let session = session_for(llm);
    session.start().await.unwrap();

    let cancelled = tokio::time::timeout(Duration::from_millis(20), session.send("lost answer")).await;
    assert!(cancelled.is_err());

    let exchange = session.send("kept answer").await.unwrap();
    assert_eq!(exchange.reply.text(), "Q2");

    let transcript = session.transcript();
    let speakers: Vec<Speaker> = transcript.turns().iter().map(|t| t.speaker()).collect();
    assert_eq!(
        speakers,
        vec![
            Speaker::Assistant,
            Speaker::User,
            Speaker::Assistant,
            Speaker::User,
            Speaker::Assistant
        ]
    );
    assert_eq!(transcript.turns()[1].text(), "lost answer");
    assert_eq!(transcript.turns()[2].text(), Messages::default().send_failed);
}
