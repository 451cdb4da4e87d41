//! Coaching service - orchestrates one coaching request end to end.
//!
//! Every request re-derives its state from the full transcript:
//!
//! 1. validate the transcript
//! 2. extract [`BrewingParameters`]
//! 3. evaluate the slot-filling state
//! 4. `Incomplete` → ask for the highest-priority missing slot
//! 5. `Ready` → run the rule engine, then retrieve references and phrase an
//!    intro concurrently, each under its own timeout
//!
//! Collaborator failures never fail the request. They are logged and the
//! answer degrades: no citations, or deterministic text.

use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;

use crate::domain::answer::{Answer, AnswerComposer, ReferenceSnippet};
use crate::domain::brewing::{BrewingParameters, Recipe, RetrievalQuery, RuleEngine, Slot};
use crate::domain::conversation::{
    pending_slot, DialogueState, ParameterExtractor, SlotFillingMachine, Transcript,
    TranscriptError, TurnRole,
};
use crate::domain::foundation::RequestId;
use crate::ports::{AIProvider, CompletionRequest, Message, RetrievalError, Retriever};

use super::dispatcher::{AnswerStream, StreamingDispatcher};

/// Upper bound for `k` on debug retrieval.
pub const MAX_RETRIEVAL_K: usize = 20;

const QUESTION_PROMPT: &str = "You are a concise coffee brewing coach. \
Ask the user exactly one short, friendly question to learn the value named below. \
Do not ask about anything else and do not give advice yet.";

const INTRO_PROMPT: &str = "You are a concise coffee brewing coach. \
Write one or two friendly sentences introducing the recipe below. \
Do not state or change any numbers; the recipe text that follows will list them.";

/// Errors from the coaching service.
///
/// Only `MalformedTranscript` is returned to callers of `turn` and `stream`.
/// The other variants describe degraded collaborators.
#[derive(Debug, thiserror::Error)]
pub enum CoachError {
    #[error("malformed transcript: {0}")]
    MalformedTranscript(#[from] TranscriptError),

    #[error("retrieval unavailable: {0}")]
    RetrievalUnavailable(String),

    #[error("generation unavailable: {0}")]
    GenerationUnavailable(String),
}

impl From<RetrievalError> for CoachError {
    fn from(err: RetrievalError) -> Self {
        CoachError::RetrievalUnavailable(err.to_string())
    }
}

/// One raw turn as received at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTurn {
    pub role: String,
    pub content: String,
}

impl RawTurn {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Command for `turn` and `stream`.
#[derive(Debug, Clone, Default)]
pub struct CoachTurnCommand {
    pub messages: Vec<RawTurn>,
}

impl CoachTurnCommand {
    pub fn new(messages: Vec<RawTurn>) -> Self {
        Self { messages }
    }

    /// Shorthand for a single user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(vec![RawTurn::new("user", text)])
    }

    fn into_transcript(self) -> Result<Transcript, TranscriptError> {
        Transcript::from_raw(self.messages.into_iter().map(|m| (m.role, m.content)))
    }
}

/// Tunables for the service.
#[derive(Debug, Clone)]
pub struct CoachSettings {
    pub retrieval_k: usize,
    pub retrieval_timeout: Duration,
    pub generation_timeout: Duration,
    /// Use the generation collaborator for phrasing when one is configured.
    pub phrase_with_generator: bool,
    pub stream_buffer: usize,
}

impl Default for CoachSettings {
    fn default() -> Self {
        Self {
            retrieval_k: 2,
            retrieval_timeout: Duration::from_millis(1500),
            generation_timeout: Duration::from_millis(8000),
            phrase_with_generator: true,
            stream_buffer: 16,
        }
    }
}

/// The coaching dialogue engine behind `coach.turn`, `coach.stream`,
/// `recommend` and `retrieve.debug`.
pub struct CoachService {
    retriever: Arc<dyn Retriever>,
    generator: Option<Arc<dyn AIProvider>>,
    settings: CoachSettings,
    extractor: ParameterExtractor,
    slots: SlotFillingMachine,
    engine: RuleEngine,
    composer: AnswerComposer,
    dispatcher: StreamingDispatcher,
}

impl CoachService {
    pub fn new(retriever: Arc<dyn Retriever>, settings: CoachSettings) -> Self {
        let dispatcher = StreamingDispatcher::new(settings.stream_buffer)
            .with_first_token_timeout(settings.generation_timeout);
        Self {
            retriever,
            generator: None,
            settings,
            extractor: ParameterExtractor::new(),
            slots: SlotFillingMachine::new(),
            engine: RuleEngine::new(),
            composer: AnswerComposer::new(),
            dispatcher,
        }
    }

    /// Adds a generation collaborator for phrasing.
    pub fn with_generator(mut self, generator: Arc<dyn AIProvider>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn settings(&self) -> &CoachSettings {
        &self.settings
    }

    fn phrasing_generator(&self) -> Option<&Arc<dyn AIProvider>> {
        self.generator
            .as_ref()
            .filter(|_| self.settings.phrase_with_generator)
    }

    /// `coach.turn`: the complete answer for a transcript.
    pub async fn turn(&self, command: CoachTurnCommand) -> Result<Answer, CoachError> {
        let request_id = RequestId::new();
        let span = tracing::info_span!("coach_turn", request_id = %request_id);

        async move {
            let transcript = command.into_transcript()?;
            let (params, state) = self.analyse(&transcript);

            let answer = match state {
                DialogueState::Incomplete { beverage, missing } => {
                    let slot = missing.first().copied().unwrap_or(Slot::Beverage);
                    let fallback = self.slots.question(slot, beverage);
                    let text = self
                        .phrase_question(request_id, &transcript, slot)
                        .await
                        .unwrap_or(fallback);
                    self.composer.compose_question(text, missing)
                }
                DialogueState::Ready { .. } => self.recommend_with_context(request_id, &params).await,
            };

            tracing::info!(
                kind = answer.kind.as_str(),
                need = answer.need.len(),
                citations = answer.citations.len(),
                "coach turn answered"
            );
            Ok::<_, CoachError>(answer)
        }
        .instrument(span)
        .await
    }

    /// `coach.stream`: the same decision as [`turn`](Self::turn), delivered
    /// incrementally.
    pub async fn stream(&self, command: CoachTurnCommand) -> Result<AnswerStream, CoachError> {
        let request_id = RequestId::new();
        let span = tracing::info_span!("coach_stream", request_id = %request_id);

        async move {
            let transcript = command.into_transcript()?;
            let (params, state) = self.analyse(&transcript);
            let state_label = state.as_str();

            let stream = match state {
                DialogueState::Incomplete { beverage, missing } => {
                    let slot = missing.first().copied().unwrap_or(Slot::Beverage);
                    let answer = self
                        .composer
                        .compose_question(self.slots.question(slot, beverage), missing);

                    match self.open_question_stream(request_id, &transcript, slot).await {
                        Some(chunks) => self.dispatcher.dispatch_phrased(answer, chunks),
                        None => self.dispatcher.dispatch(answer),
                    }
                }
                DialogueState::Ready { .. } => {
                    let answer = self.recommend_with_context(request_id, &params).await;
                    self.dispatcher.dispatch(answer)
                }
            };

            tracing::info!(state = state_label, "coach stream dispatched");
            Ok::<_, CoachError>(stream)
        }
        .instrument(span)
        .await
    }

    /// `recommend`: direct rule-engine invocation.
    pub fn recommend(&self, params: &BrewingParameters) -> Recipe {
        self.engine.recommend(params)
    }

    /// `retrieve.debug`: raw retrieval, no rule engine involved.
    ///
    /// Unlike the coaching paths, a failing backend is reported.
    pub async fn retrieve_debug(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<ReferenceSnippet>, CoachError> {
        let k = k.min(MAX_RETRIEVAL_K);
        let snippets = self.retrieve_bounded(query, k).await?;
        tracing::debug!(query, k, found = snippets.len(), "debug retrieval");
        Ok(snippets)
    }

    fn analyse(&self, transcript: &Transcript) -> (BrewingParameters, DialogueState) {
        let params = self.extractor.extract(transcript);
        let state = self.slots.evaluate(&params);
        tracing::debug!(?params, state = state.as_str(), "parameters extracted");
        (params, state)
    }

    async fn recommend_with_context(&self, request_id: RequestId, params: &BrewingParameters) -> Answer {
        let recipe = self.engine.recommend(params);
        let query = RetrievalQuery::from_parameters(params);
        tracing::debug!(query = %query, "retrieving references");

        let (snippets, prose) = tokio::join!(
            self.retrieve_or_empty(query.as_str()),
            self.phrase_intro(request_id, &recipe),
        );

        self.composer
            .compose_recommendation(recipe, &snippets)
            .with_prose(prose)
    }

    async fn retrieve_bounded(&self, query: &str, k: usize) -> Result<Vec<ReferenceSnippet>, CoachError> {
        let timeout = self.settings.retrieval_timeout;
        match tokio::time::timeout(timeout, self.retriever.retrieve(query, k)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(RetrievalError::timeout(timeout.as_millis() as u64).into()),
        }
    }

    async fn retrieve_or_empty(&self, query: &str) -> Vec<ReferenceSnippet> {
        match self.retrieve_bounded(query, self.settings.retrieval_k).await {
            Ok(snippets) => snippets,
            Err(err) => {
                tracing::warn!(
                    backend = self.retriever.name(),
                    error = %err,
                    "continuing without citations"
                );
                Vec::new()
            }
        }
    }

    fn question_request(&self, request_id: RequestId, transcript: &Transcript, slot: Slot) -> CompletionRequest {
        let history = transcript.turns().iter().map(|t| match t.role {
            TurnRole::User => Message::user(&t.text),
            TurnRole::Assistant => Message::assistant(&t.text),
        });

        CompletionRequest::new(request_id)
            .with_system_prompt(format!("{}\nValue to ask for: {}.", QUESTION_PROMPT, slot.label()))
            .with_messages(history)
            .with_max_tokens(60)
            .with_temperature(0.2)
    }

    /// Generated question text, or `None` to use the deterministic one.
    ///
    /// The generated text is kept only when it still reads as a question
    /// about `slot`, so the next turn's bare answer is attributed correctly.
    async fn phrase_question(&self, request_id: RequestId, transcript: &Transcript, slot: Slot) -> Option<String> {
        let generator = self.phrasing_generator()?;
        let request = self.question_request(request_id, transcript, slot);

        let text = self.generate(generator, request).await?;
        if pending_slot(&text) == Some(slot) {
            Some(text)
        } else {
            tracing::debug!(slot = slot.as_str(), "generated question off target, using fallback");
            None
        }
    }

    async fn phrase_intro(&self, request_id: RequestId, recipe: &Recipe) -> Option<String> {
        let generator = self.phrasing_generator()?;
        let request = CompletionRequest::new(request_id)
            .with_system_prompt(INTRO_PROMPT)
            .with_message(
                crate::ports::MessageRole::User,
                format!("{}\n{}", recipe.title(), recipe.target_lines().join("\n")),
            )
            .with_max_tokens(80)
            .with_temperature(0.2);

        self.generate(generator, request).await
    }

    async fn generate(&self, generator: &Arc<dyn AIProvider>, request: CompletionRequest) -> Option<String> {
        let timeout = self.settings.generation_timeout;
        let outcome = match tokio::time::timeout(timeout, generator.complete(request)).await {
            Ok(Ok(response)) => {
                let text = response.content.trim().to_string();
                if text.is_empty() {
                    Err(CoachError::GenerationUnavailable("empty completion".to_string()))
                } else {
                    Ok(text)
                }
            }
            Ok(Err(e)) => Err(CoachError::GenerationUnavailable(e.to_string())),
            Err(_) => Err(CoachError::GenerationUnavailable(format!(
                "timed out after {}ms",
                timeout.as_millis()
            ))),
        };

        outcome
            .map_err(|err| {
                tracing::warn!(
                    provider = %generator.provider_info().name,
                    error = %err,
                    "using deterministic text"
                );
            })
            .ok()
    }

    async fn open_question_stream(
        &self,
        request_id: RequestId,
        transcript: &Transcript,
        slot: Slot,
    ) -> Option<crate::ports::ChunkStream> {
        let generator = self.phrasing_generator()?;
        let request = self.question_request(request_id, transcript, slot);
        let timeout = self.settings.generation_timeout;

        let err = match tokio::time::timeout(timeout, generator.stream_complete(request)).await {
            Ok(Ok(chunks)) => return Some(chunks),
            Ok(Err(e)) => CoachError::GenerationUnavailable(e.to_string()),
            Err(_) => CoachError::GenerationUnavailable(format!(
                "timed out after {}ms",
                timeout.as_millis()
            )),
        };
        tracing::warn!(error = %err, "streaming deterministic question");
        None
    }
}
