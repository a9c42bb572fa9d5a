//! Recommendation orchestrator: one chat turn end to end.
//!
//! ```text
//!   history + message ──┬──► reply (free text) ───────────────┐
//!                       └──► extraction (medical_extraction) ─┤ try_join
//!                                                             ▼
//!                      ready && keywords? ──► keyword search (10)
//!                                                  │ non-empty
//!                                                  ▼
//!                                     ranking (doctor_ranking)
//!                                                  │ filter to candidates
//!                                                  ▼
//!                                  session upsert (exactly once)
//! ```
//!
//! Any stage failure aborts the turn before the upsert, so a session never
//! records a reply without the extraction that accompanied it.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use medibridge_core::{
    ChatMessage, ChatRole, CoreError, CoreResult, DoctorListing, MediBridgeCore, PatientSession,
    Recommendation,
};
use medibridge_llm::{
    extraction_format, make_consultation_messages, make_extraction_messages,
    make_ranking_messages, parse_extraction, parse_ranking, ranking_format, ChatModel, Extraction,
    ExtractionError, LlmError, Message, RankingCandidate, ResponseFormat,
};

use crate::locks::SessionLocks;

/// Search results handed to the ranking call.
pub const RANKING_CANDIDATE_LIMIT: usize = 10;

pub const STAGE_REPLY: &str = "reply";
pub const STAGE_EXTRACTION: &str = "extraction";
pub const STAGE_RANKING: &str = "ranking";

#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("{stage} call failed: {source}")]
    Model {
        stage: &'static str,
        source: LlmError,
    },

    #[error("{stage} output rejected: {source}")]
    Malformed {
        stage: &'static str,
        source: ExtractionError,
    },

    #[error("{stage} call timed out after {after:?}")]
    Timeout {
        stage: &'static str,
        after: Duration,
    },

    #[error("Session store error: {0}")]
    Store(#[from] CoreError),

    #[error("Blocking task failed: {0}")]
    Join(String),
}

pub type TurnResult<T> = Result<T, TurnError>;

/// Result of one completed turn.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnOutcome {
    pub session_id: String,
    pub reply: String,
    pub recommendations: Vec<Recommendation>,
    pub extraction: Extraction,
}

/// Run `f` against the core on the blocking pool.
pub async fn run_blocking<T, F>(core: &MediBridgeCore, f: F) -> TurnResult<T>
where
    T: Send + 'static,
    F: FnOnce(&MediBridgeCore) -> CoreResult<T> + Send + 'static,
{
    let core = core.clone();
    tokio::task::spawn_blocking(move || f(&core))
        .await
        .map_err(|e| TurnError::Join(e.to_string()))?
        .map_err(TurnError::Store)
}

pub struct Orchestrator {
    core: MediBridgeCore,
    model: Arc<dyn ChatModel>,
    locks: SessionLocks,
    stage_timeout: Duration,
}

impl Orchestrator {
    pub fn new(core: MediBridgeCore, model: Arc<dyn ChatModel>, stage_timeout: Duration) -> Self {
        Self {
            core,
            model,
            locks: SessionLocks::new(),
            stage_timeout,
        }
    }

    pub fn core(&self) -> &MediBridgeCore {
        &self.core
    }

    /// Run one turn. Mints a session id when none (or a blank one) is given.
    ///
    /// `history` only seeds a session the store has never seen; a stored
    /// transcript always wins.
    pub async fn handle_turn(
        &self,
        session_id: Option<String>,
        message: String,
        history: Vec<ChatMessage>,
    ) -> TurnResult<TurnOutcome> {
        let session_id = session_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let _guard = self.locks.acquire(&session_id).await;

        let lookup_id = session_id.clone();
        let stored = run_blocking(&self.core, move |core| core.get_session(&lookup_id)).await?;
        let mut session = match stored {
            Some(session) => {
                if !history.is_empty() && history.len() != session.chat_history.len() {
                    tracing::warn!(
                        session_id = %session_id,
                        client = history.len(),
                        stored = session.chat_history.len(),
                        "Client history differs from stored transcript; using stored"
                    );
                }
                session
            }
            None => {
                let mut session = PatientSession::new(session_id.clone());
                session.chat_history = history;
                session
            }
        };

        let prior: Vec<Message> = session.chat_history.iter().map(to_model_message).collect();

        tracing::debug!(session_id = %session_id, prior = prior.len(), "Turn started");

        let (reply, extraction) = tokio::try_join!(
            self.complete(STAGE_REPLY, make_consultation_messages(&prior, &message), None),
            self.extract(&prior, &message),
        )?;

        let recommendations = if extraction.wants_recommendations() {
            self.recommend(&session_id, &extraction).await?
        } else {
            Vec::new()
        };

        session.record_turn(message, reply.clone());
        session.symptoms = non_empty(&extraction.symptoms);
        session.duration = non_empty(&extraction.duration);
        session.age = extraction.rounded_age();
        session.recommended_doctors = recommendations.clone();

        let stage = session.stage();
        run_blocking(&self.core, move |core| core.upsert_session(&session)).await?;

        tracing::info!(
            session_id = %session_id,
            ?stage,
            keywords = extraction.keywords.len(),
            recommendations = recommendations.len(),
            "Turn completed"
        );

        Ok(TurnOutcome {
            session_id,
            reply,
            recommendations,
            extraction,
        })
    }

    async fn complete(
        &self,
        stage: &'static str,
        messages: Vec<Message>,
        format: Option<ResponseFormat>,
    ) -> TurnResult<String> {
        match tokio::time::timeout(self.stage_timeout, self.model.complete(messages, format)).await
        {
            Err(_) => Err(TurnError::Timeout {
                stage,
                after: self.stage_timeout,
            }),
            Ok(Err(source)) => Err(TurnError::Model { stage, source }),
            Ok(Ok(completion)) => Ok(completion.text),
        }
    }

    async fn extract(&self, prior: &[Message], message: &str) -> TurnResult<Extraction> {
        let text = self
            .complete(
                STAGE_EXTRACTION,
                make_extraction_messages(prior, message),
                Some(extraction_format()),
            )
            .await?;
        let extraction = parse_extraction(&text).map_err(|source| TurnError::Malformed {
            stage: STAGE_EXTRACTION,
            source,
        })?;
        tracing::debug!(
            ready = extraction.ready_for_recommendation,
            keywords = ?extraction.keywords,
            "Extraction parsed"
        );
        Ok(extraction)
    }

    /// Search then rank. An empty search skips the ranking call.
    async fn recommend(
        &self,
        session_id: &str,
        extraction: &Extraction,
    ) -> TurnResult<Vec<Recommendation>> {
        let keywords = extraction.keywords.clone();
        let candidates = run_blocking(&self.core, move |core| {
            core.search_doctors(&keywords, RANKING_CANDIDATE_LIMIT)
        })
        .await?;

        tracing::debug!(session_id, candidates = candidates.len(), "Search finished");
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let ranking_input: Vec<RankingCandidate> =
            candidates.iter().map(to_ranking_candidate).collect();
        let text = self
            .complete(
                STAGE_RANKING,
                make_ranking_messages(&extraction.symptoms, &extraction.keywords, &ranking_input),
                Some(ranking_format()),
            )
            .await?;
        let mut ranking = parse_ranking(&text).map_err(|source| TurnError::Malformed {
            stage: STAGE_RANKING,
            source,
        })?;

        let candidate_ids: HashSet<i64> = candidates.iter().map(|c| c.doctor.id).collect();
        let dropped = ranking.retain_candidates(&candidate_ids);
        if !dropped.is_empty() {
            tracing::warn!(session_id, ?dropped, "Ranking cited doctors outside the candidate set");
        }

        Ok(ranking
            .selected_doctors
            .into_iter()
            .map(|s| Recommendation {
                doctor_id: s.doctor_id,
                reason: s.reason,
            })
            .collect())
    }
}

fn to_model_message(message: &ChatMessage) -> Message {
    match message.role {
        ChatRole::User => Message::user(message.content.clone()),
        ChatRole::Assistant => Message::assistant(message.content.clone()),
    }
}

fn to_ranking_candidate(listing: &DoctorListing) -> RankingCandidate {
    RankingCandidate {
        doctor_id: listing.doctor.id,
        name: listing.doctor.name.clone(),
        hospital: listing.hospital.name.clone(),
        department: listing.department.name.clone(),
        title: listing.doctor.title.clone(),
        expertise: listing.doctor.expertise.clone(),
        recommendation_score: listing.doctor.recommendation_score,
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
