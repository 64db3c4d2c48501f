//! InterviewSession - the interview state machine
//!
//! Drives `Intro -> Interviewing -> Generating -> Results`, owns the chat
//! handle and the transcript, and commits the document bundle only when all
//! nine generators succeed.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::InterviewError;
use crate::bundle::DocumentBundle;
use crate::config::{Config, Messages};
use crate::generate::DocumentGenerator;
use crate::llm::{ChatSession, LlmClient};
use crate::prompts::{PromptContext, PromptLoader};
use crate::transcript::{Transcript, Turn};

/// Interview lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// No interview running
    Intro,
    /// Accepting user answers
    Interviewing,
    /// Documents are being generated; input is closed
    Generating,
    /// Bundle available, read-only
    Results,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Intro => "intro",
            Self::Interviewing => "interviewing",
            Self::Generating => "generating",
            Self::Results => "results",
        };
        write!(f, "{}", name)
    }
}

/// Result of one round trip with the consultant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    /// The user's turn; `None` for the opening exchange
    pub user: Option<Turn>,
    /// The consultant's reply, or the localized fallback
    pub reply: Turn,
    /// True when `reply` is a fallback rather than model output
    pub degraded: bool,
}

/// Settings the session needs from configuration
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Rendered interviewer system instruction
    pub system_instruction: String,
    pub opening_utterance: String,
    pub min_turns: usize,
    pub chat_max_tokens: u32,
    pub messages: Messages,
}

impl SessionSettings {
    /// Render the interviewer prompt and collect interview settings
    pub fn from_config(config: &Config, prompts: &PromptLoader) -> Result<Self> {
        let system_instruction = prompts
            .render("interviewer", &PromptContext::interview(config.interview.language.as_str()))
            .context("Failed to render interviewer prompt")?;

        Ok(Self {
            system_instruction,
            opening_utterance: config.interview.opening_utterance.clone(),
            min_turns: config.interview.min_turns,
            chat_max_tokens: config.interview.chat_max_tokens,
            messages: config.messages.clone(),
        })
    }
}

/// Mutable session data, never held across an await
#[derive(Debug)]
struct SessionState {
    id: Uuid,
    phase: Phase,
    transcript: Transcript,
    bundle: Option<DocumentBundle>,
}

impl SessionState {
    fn fresh() -> Self {
        Self {
            id: Uuid::now_v7(),
            phase: Phase::Intro,
            transcript: Transcript::new(),
            bundle: None,
        }
    }
}

/// Orchestrates one interview at a time
///
/// All operations take `&self`; the session can be shared behind an `Arc`
/// so a front end may read the transcript while a reply is pending. The chat
/// handle sits behind an async mutex that is only ever `try_lock`ed, so a
/// second send while one is in flight is rejected with
/// [`InterviewError::Busy`] instead of queueing.
pub struct InterviewSession {
    llm: Arc<dyn LlmClient>,
    generator: DocumentGenerator,
    settings: SessionSettings,
    chat: tokio::sync::Mutex<Option<Box<dyn ChatSession>>>,
    state: Mutex<SessionState>,
}

impl InterviewSession {
    pub fn new(llm: Arc<dyn LlmClient>, generator: DocumentGenerator, settings: SessionSettings) -> Self {
        let state = SessionState::fresh();
        debug!(session_id = %state.id, min_turns = settings.min_turns, "InterviewSession::new: called");
        Self {
            llm,
            generator,
            settings,
            chat: tokio::sync::Mutex::new(None),
            state: Mutex::new(state),
        }
    }

    /// Build a session, its generator and its prompts from configuration
    pub fn from_config(llm: Arc<dyn LlmClient>, prompts: Arc<PromptLoader>, config: &Config) -> Result<Self> {
        let settings = SessionSettings::from_config(config, &prompts)?;
        let generator = DocumentGenerator::new(
            llm.clone(),
            prompts,
            config.interview.language.as_str(),
            config.generation.clone(),
            config.messages.clone(),
        );
        Ok(Self::new(llm, generator, settings))
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_chat(&self) -> Result<tokio::sync::MutexGuard<'_, Option<Box<dyn ChatSession>>>, InterviewError> {
        self.chat.try_lock().map_err(|_| {
            debug!("InterviewSession::lock_chat: busy");
            InterviewError::Busy
        })
    }

    fn require_phase(&self, operation: &'static str, expected: Phase) -> Result<(), InterviewError> {
        let phase = self.state().phase;
        if phase != expected {
            debug!(%operation, %phase, %expected, "InterviewSession::require_phase: rejected");
            return Err(InterviewError::InvalidPhase { operation, phase });
        }
        Ok(())
    }

    fn new_chat(&self) -> Option<Box<dyn ChatSession>> {
        match self
            .llm
            .start_chat(&self.settings.system_instruction, self.settings.chat_max_tokens)
        {
            Ok(chat) => Some(chat),
            Err(e) => {
                warn!(session_id = %self.session_id(), error = %e, "InterviewSession::new_chat: failed");
                None
            }
        }
    }

    /// Start the interview (`Intro -> Interviewing`)
    ///
    /// Opens a fresh chat and sends the opening utterance. The reply becomes
    /// the first turn. If the chat cannot be created or the send fails, a
    /// localized error turn is seeded instead and the interview still begins.
    pub async fn start(&self) -> Result<Exchange, InterviewError> {
        let mut chat = self.lock_chat()?;
        self.require_phase("start", Phase::Intro)?;
        let session_id = self.session_id();
        info!(%session_id, "Starting interview");

        *chat = self.new_chat();
        let reply = match chat.as_mut() {
            Some(handle) => match handle.send(&self.settings.opening_utterance).await {
                Ok(text) => Some(text),
                Err(e) => {
                    warn!(%session_id, error = %e, retry_after = ?e.retry_after(), "InterviewSession::start: opening send failed");
                    None
                }
            },
            None => None,
        };

        let degraded = reply.is_none();
        let text = match reply {
            Some(text) => self.reply_text(text),
            None => self.settings.messages.start_failed.clone(),
        };

        let mut state = self.state();
        let turn = state.transcript.push_assistant(text);
        state.phase = Phase::Interviewing;
        info!(%session_id, %degraded, "Interview started");

        Ok(Exchange {
            user: None,
            reply: turn,
            degraded,
        })
    }

    /// Send one user answer and wait for the consultant's reply
    ///
    /// The user turn is appended before the request goes out. A failed request
    /// appends a localized error turn so every answer is followed by a reply.
    pub async fn send(&self, text: &str) -> Result<Exchange, InterviewError> {
        let mut chat = self.lock_chat()?;
        self.require_phase("send", Phase::Interviewing)?;
        let text = text.trim();
        if text.is_empty() {
            return Err(InterviewError::EmptyInput);
        }

        let session_id = self.session_id();
        let user = self.state().transcript.push_user(text);
        debug!(%session_id, chars = text.chars().count(), "InterviewSession::send: user turn appended");
        let pending = PendingReplyGuard {
            state: &self.state,
            fallback: Some(self.settings.messages.send_failed.clone()),
        };

        if chat.is_none() {
            debug!(%session_id, "InterviewSession::send: no chat handle, creating one");
            *chat = self.new_chat();
        }

        let result = match chat.as_mut() {
            Some(handle) => handle.send(text).await.map_err(|e| {
                warn!(%session_id, error = %e, retry_after = ?e.retry_after(), "InterviewSession::send: request failed");
            }),
            None => Err(()),
        };

        let degraded = result.is_err();
        let reply_text = match result {
            Ok(reply) => self.reply_text(reply),
            Err(()) => self.settings.messages.send_failed.clone(),
        };
        let reply = pending.complete(reply_text);

        Ok(Exchange {
            user: Some(user),
            reply,
            degraded,
        })
    }

    fn reply_text(&self, reply: String) -> String {
        if reply.trim().is_empty() {
            debug!("InterviewSession::reply_text: empty reply");
            self.settings.messages.empty_reply.clone()
        } else {
            reply
        }
    }

    /// Finish the interview and generate all documents
    ///
    /// Requires at least `min_turns` turns. On success the session moves to
    /// `Results` and holds the bundle. On failure it returns to
    /// `Interviewing` with the transcript and chat untouched.
    pub async fn finish(&self) -> Result<DocumentBundle, InterviewError> {
        let _chat = self.lock_chat()?;
        let session_id = self.session_id();

        let snapshot = {
            let mut state = self.state();
            if state.phase != Phase::Interviewing {
                return Err(InterviewError::InvalidPhase {
                    operation: "finish",
                    phase: state.phase,
                });
            }
            let have = state.transcript.len();
            if have < self.settings.min_turns {
                info!(%session_id, have, need = self.settings.min_turns, "Finish rejected: too few turns");
                return Err(InterviewError::TooFewTurns {
                    have,
                    need: self.settings.min_turns,
                    message: self.settings.messages.too_few_turns.clone(),
                });
            }
            state.phase = Phase::Generating;
            state.transcript.snapshot()
        };
        info!(%session_id, turns = snapshot.len(), "Interview finished, generating documents");

        let guard = GeneratingGuard {
            state: &self.state,
            armed: true,
        };

        match self.generator.generate_all(&snapshot).await {
            Ok(bundle) => {
                guard.disarm();
                let mut state = self.state();
                state.bundle = Some(bundle.clone());
                state.phase = Phase::Results;
                info!(%session_id, "Documents ready");
                Ok(bundle)
            }
            Err(source) => {
                drop(guard);
                warn!(%session_id, error = %source, "Document generation failed, returning to interview");
                Err(InterviewError::GenerationFailed {
                    message: self.settings.messages.generation_failed.clone(),
                    source,
                })
            }
        }
    }

    /// Discard everything and return to `Intro`
    ///
    /// Only allowed from `Results`. The next `start` opens a new chat and a
    /// new transcript.
    pub fn reset(&self) -> Result<(), InterviewError> {
        let mut chat = self.lock_chat()?;
        let mut state = self.state();
        if state.phase != Phase::Results {
            return Err(InterviewError::InvalidPhase {
                operation: "reset",
                phase: state.phase,
            });
        }

        let previous = state.id;
        *chat = None;
        *state = SessionState::fresh();
        info!(previous_session_id = %previous, session_id = %state.id, "Interview reset");
        Ok(())
    }

    pub fn phase(&self) -> Phase {
        self.state().phase
    }

    pub fn session_id(&self) -> Uuid {
        self.state().id
    }

    /// Copy of the transcript so far
    pub fn transcript(&self) -> Transcript {
        self.state().transcript.clone()
    }

    pub fn turn_count(&self) -> usize {
        self.state().transcript.len()
    }

    /// The bundle, once in `Results`
    pub fn bundle(&self) -> Option<DocumentBundle> {
        self.state().bundle.clone()
    }

    pub fn min_turns(&self) -> usize {
        self.settings.min_turns
    }

    pub fn messages(&self) -> &Messages {
        &self.settings.messages
    }

    /// True while a send, start, finish or reset holds the chat
    pub fn is_busy(&self) -> bool {
        self.chat.try_lock().is_err()
    }

    /// True when a `send` would currently be accepted
    pub fn accepts_input(&self) -> bool {
        self.phase() == Phase::Interviewing && !self.is_busy()
    }

    /// True when a `finish` would pass its precondition
    pub fn can_finish(&self) -> bool {
        let state = self.state();
        state.phase == Phase::Interviewing && state.transcript.len() >= self.settings.min_turns
    }
}

/// Returns the session to `Interviewing` if generation does not complete
struct GeneratingGuard<'a> {
    state: &'a Mutex<SessionState>,
    armed: bool,
}

impl GeneratingGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for GeneratingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.phase == Phase::Generating {
            debug!(session_id = %state.id, "GeneratingGuard::drop: reverting to interviewing");
            state.phase = Phase::Interviewing;
        }
    }
}

/// Appends the fallback reply if a send is dropped before its reply lands
///
/// Keeps every user turn followed by exactly one assistant turn.
struct PendingReplyGuard<'a> {
    state: &'a Mutex<SessionState>,
    fallback: Option<String>,
}

impl PendingReplyGuard<'_> {
    fn complete(mut self, text: String) -> Turn {
        self.fallback = None;
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.transcript.push_assistant(text)
    }
}

impl Drop for PendingReplyGuard<'_> {
    fn drop(&mut self) {
        let Some(fallback) = self.fallback.take() else {
            return;
        };
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        warn!(session_id = %state.id, "PendingReplyGuard::drop: send cancelled, appending error turn");
        state.transcript.push_assistant(fallback);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::DocumentKind;
    use crate::llm::client::mock::{MockLlmClient, MockReply};
    use std::time::Duration;

    const CANVAS: &str = r#"{"keyPartners":[],"keyActivities":[],"keyResources":[],"valuePropositions":["V"],
        "customerRelationships":[],"channels":[],"customerSegments":[],"costStructure":[],"revenueStreams":[]}"#;

    fn session(mock: &MockLlmClient) -> Arc<InterviewSession> {
        let config = Config::default();
        let prompts = Arc::new(PromptLoader::embedded_only());
        Arc::new(InterviewSession::from_config(Arc::new(mock.clone()), prompts, &config).unwrap())
    }

    async fn interviewing(mock: &MockLlmClient, answers: usize) -> Arc<InterviewSession> {
        let session = session(mock);
        session.start().await.unwrap();
        for i in 0..answers {
            session.send(&format!("answer {i}")).await.unwrap();
        }
        session
    }

    #[tokio::test]
    async fn test_start_appends_first_reply() {
        let mock = MockLlmClient::new().with_chat_replies(vec![MockReply::text("What is your business idea?")]);
        let session = session(&mock);
        assert_eq!(session.phase(), Phase::Intro);

        let exchange = session.start().await.unwrap();
        assert!(!exchange.degraded);
        assert!(exchange.user.is_none());
        assert_eq!(exchange.reply.text(), "What is your business idea?");
        assert_eq!(session.phase(), Phase::Interviewing);
        assert_eq!(session.turn_count(), 1);
        assert_eq!(mock.chats_started(), 1);
    }

    #[tokio::test]
    async fn test_start_failure_seeds_error_turn() {
        let mock = MockLlmClient::new().with_chat_replies(vec![MockReply::Fail]);
        let session = session(&mock);

        let exchange = session.start().await.unwrap();
        assert!(exchange.degraded);
        assert_eq!(exchange.reply.text(), Messages::default().start_failed);
        assert_eq!(session.phase(), Phase::Interviewing);
        assert_eq!(session.turn_count(), 1);
    }

    #[tokio::test]
    async fn test_send_without_chat_appends_error_turn() {
        let mock = MockLlmClient::new().failing_start();
        let session = session(&mock);

        let exchange = session.start().await.unwrap();
        assert!(exchange.degraded);
        assert_eq!(session.phase(), Phase::Interviewing);

        let exchange = session.send("hello").await.unwrap();
        assert!(exchange.degraded);
        assert_eq!(exchange.reply.text(), Messages::default().send_failed);
        assert_eq!(session.turn_count(), 3);
    }

    #[tokio::test]
    async fn test_start_twice_rejected() {
        let mock = MockLlmClient::new();
        let session = interviewing(&mock, 0).await;
        assert!(matches!(
            session.start().await,
            Err(InterviewError::InvalidPhase {
                operation: "start",
                phase: Phase::Interviewing
            })
        ));
    }

    #[tokio::test]
    async fn test_send_before_start_rejected() {
        let mock = MockLlmClient::new();
        let session = session(&mock);
        assert!(matches!(
            session.send("hi").await,
            Err(InterviewError::InvalidPhase { phase: Phase::Intro, .. })
        ));
        assert_eq!(session.turn_count(), 0);
    }

    #[tokio::test]
    async fn test_send_rejects_blank_input() {
        let mock = MockLlmClient::new();
        let session = interviewing(&mock, 0).await;

        assert!(matches!(session.send("   \n").await, Err(InterviewError::EmptyInput)));
        assert_eq!(session.turn_count(), 1);
        assert_eq!(mock.chat_calls(), 1);
    }

    #[tokio::test]
    async fn test_send_appends_in_order() {
        let mock = MockLlmClient::new().with_chat_replies(vec![
            MockReply::text("Q1"),
            MockReply::text("Q2"),
            MockReply::Fail,
            MockReply::Empty,
        ]);
        let session = session(&mock);
        session.start().await.unwrap();

        let exchange = session.send("  bakery  ").await.unwrap();
        assert_eq!(exchange.user.unwrap().text(), "bakery");
        assert_eq!(exchange.reply.text(), "Q2");

        let exchange = session.send("students").await.unwrap();
        assert!(exchange.degraded);

        let exchange = session.send("cheap").await.unwrap();
        assert!(!exchange.degraded);
        assert_eq!(exchange.reply.text(), "...");

        let texts: Vec<String> = session.transcript().turns().iter().map(|t| t.text().to_string()).collect();
        assert_eq!(
            texts,
            vec![
                "Q1".to_string(),
                "bakery".to_string(),
                "Q2".to_string(),
                "students".to_string(),
                Messages::default().send_failed,
                "cheap".to_string(),
                "...".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_concurrent_send_is_busy() {
        let mock = MockLlmClient::new().with_chat_delay(Duration::from_millis(200));
        let session = interviewing(&mock, 0).await;

        let first = {
            let session = session.clone();
            tokio::spawn(async move { session.send("first").await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(session.is_busy());
        assert!(!session.accepts_input());
        assert!(matches!(session.send("second").await, Err(InterviewError::Busy)));
        assert!(matches!(session.finish().await, Err(InterviewError::Busy)));

        let exchange = first.await.unwrap().unwrap();
        assert_eq!(exchange.user.unwrap().text(), "first");

        let transcript = session.transcript();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript.turns().iter().filter(|t| t.is_user()).count(), 1);
        assert!(session.accepts_input());
    }

    #[tokio::test]
    async fn test_cancelled_send_keeps_turns_paired() {
        let mock = MockLlmClient::new().with_chat_delay(Duration::from_millis(200));
        let session = session(&mock);
        session.start().await.unwrap();

        let dropped = tokio::time::timeout(Duration::from_millis(20), session.send("dropped answer")).await;
        assert!(dropped.is_err());
        assert!(!session.is_busy());

        session.send("next answer").await.unwrap();

        let turns: Vec<(bool, String)> = session
            .transcript()
            .turns()
            .iter()
            .map(|t| (t.is_user(), t.text().to_string()))
            .collect();
        assert_eq!(
            turns,
            vec![
                (false, "Next question?".to_string()),
                (true, "dropped answer".to_string()),
                (false, Messages::default().send_failed),
                (true, "next answer".to_string()),
                (false, "Next question?".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_finish_requires_min_turns() {
        let mock = MockLlmClient::new();
        let session = interviewing(&mock, 0).await;

        match session.finish().await {
            Err(InterviewError::TooFewTurns { have, need, message }) => {
                assert_eq!(have, 1);
                assert_eq!(need, 3);
                assert_eq!(message, Messages::default().too_few_turns);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(session.phase(), Phase::Interviewing);
        assert_eq!(mock.generate_calls(), 0);
        assert!(!session.can_finish());
    }

    #[tokio::test]
    async fn test_finish_success_moves_to_results() {
        let mock = MockLlmClient::new().with_canvas_reply(MockReply::text(CANVAS));
        let session = interviewing(&mock, 1).await;
        assert!(session.can_finish());

        let bundle = session.finish().await.unwrap();
        assert_eq!(session.phase(), Phase::Results);
        assert_eq!(session.bundle(), Some(bundle.clone()));
        assert_eq!(bundle.bmc.unwrap().value_propositions, vec!["V"]);
        assert_eq!(mock.generate_calls(), 9);
        assert!(!session.accepts_input());
        assert!(matches!(
            session.send("more").await,
            Err(InterviewError::InvalidPhase { phase: Phase::Results, .. })
        ));
    }

    #[tokio::test]
    async fn test_finish_failure_reverts() {
        let mock = MockLlmClient::new()
            .with_canvas_reply(MockReply::text(CANVAS))
            .with_document_reply(&format!("Document: {}", DocumentKind::FinancialPlan.title()), MockReply::Fail);
        let session = interviewing(&mock, 1).await;
        let before = session.transcript();

        match session.finish().await {
            Err(InterviewError::GenerationFailed { message, source }) => {
                assert_eq!(message, Messages::default().generation_failed);
                assert_eq!(source.failed_kinds(), vec![DocumentKind::FinancialPlan]);
            }
            other => panic!("unexpected result: {other:?}"),
        }

        assert_eq!(session.phase(), Phase::Interviewing);
        assert_eq!(session.transcript(), before);
        assert!(session.bundle().is_none());

        // The chat survives and the interview continues
        session.send("one more detail").await.unwrap();
        assert_eq!(mock.chats_started(), 1);
    }

    #[tokio::test]
    async fn test_dropped_finish_reverts_phase() {
        struct SlowGenerate(MockLlmClient);

        #[async_trait::async_trait]
        impl LlmClient for SlowGenerate {
            fn start_chat(&self, s: &str, m: u32) -> std::result::Result<Box<dyn ChatSession>, crate::llm::LlmError> {
                self.0.start_chat(s, m)
            }

            async fn generate(
                &self,
                request: crate::llm::GenerateRequest,
            ) -> std::result::Result<crate::llm::GenerateResponse, crate::llm::LlmError> {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                self.0.generate(request).await
            }
        }

        let llm: Arc<dyn LlmClient> = Arc::new(SlowGenerate(MockLlmClient::new()));
        let prompts = Arc::new(PromptLoader::embedded_only());
        let session = InterviewSession::from_config(llm, prompts, &Config::default()).unwrap();
        session.start().await.unwrap();
        session.send("a").await.unwrap();

        let result = tokio::time::timeout(Duration::from_millis(50), session.finish()).await;
        assert!(result.is_err());
        assert_eq!(session.phase(), Phase::Interviewing);
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_reset_only_from_results() {
        let mock = MockLlmClient::new();
        let session = interviewing(&mock, 0).await;
        assert!(matches!(
            session.reset(),
            Err(InterviewError::InvalidPhase {
                operation: "reset",
                phase: Phase::Interviewing
            })
        ));
    }

    #[tokio::test]
    async fn test_reset_discards_everything() {
        let mock = MockLlmClient::new()
            .with_chat_replies(vec![MockReply::text("Q1"), MockReply::text("Q2")])
            .with_canvas_reply(MockReply::text(CANVAS));
        let session = interviewing(&mock, 1).await;
        let first_id = session.session_id();
        session.finish().await.unwrap();

        session.reset().unwrap();
        assert_eq!(session.phase(), Phase::Intro);
        assert_eq!(session.turn_count(), 0);
        assert!(session.bundle().is_none());
        assert_ne!(session.session_id(), first_id);

        let exchange = session.start().await.unwrap();
        assert_eq!(exchange.reply.text(), "Next question?");
        assert_eq!(session.turn_count(), 1);
        assert_eq!(mock.chats_started(), 2);
    }

    #[test]
    fn test_settings_render_language() {
        let mut config = Config::default();
        config.interview.language = "English".to_string();
        config.interview.min_turns = 5;

        let settings = SessionSettings::from_config(&config, &PromptLoader::embedded_only()).unwrap();
        assert!(settings.system_instruction.contains("speaking English"));
        assert_eq!(settings.min_turns, 5);
    }

    proptest::proptest! {
        #[test]
        fn prop_finish_requires_min_turns(answers in 0usize..4, min_turns in 1usize..8) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                let mock = MockLlmClient::new().with_canvas_reply(MockReply::text(CANVAS));
                let mut config = Config::default();
                config.interview.min_turns = min_turns;
                let session = InterviewSession::from_config(
                    Arc::new(mock.clone()),
                    Arc::new(PromptLoader::embedded_only()),
                    &config,
                )
                .unwrap();
                session.start().await.unwrap();
                for i in 0..answers {
                    session.send(&format!("answer {i}")).await.unwrap();
                }

                let turns = 1 + 2 * answers;
                assert_eq!(session.can_finish(), turns >= min_turns);
                let result = session.finish().await;
                if turns >= min_turns {
                    assert!(result.is_ok());
                    assert_eq!(session.phase(), Phase::Results);
                } else {
                    assert!(matches!(result, Err(InterviewError::TooFewTurns { .. })));
                    assert_eq!(session.phase(), Phase::Interviewing);
                    assert_eq!(mock.generate_calls(), 0);
                }
            });
        }
    }
}
