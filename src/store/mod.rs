//! Persistence boundary consumed by the scoring core.
//!
//! Guarantees the orchestrator relies on:
//!   - `create` returns a durable id before the judge is called.
//!   - `update` on a terminal record is a no-op when the patch matches what is
//!     stored, and a `TerminalState` error when it would change anything.
//!   - `increment_user_stats` is an atomic increment, never read-modify-write
//!     from the caller's side.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::domain::{Quest, Scores, Submission, SubmissionStatus, UserRecord, UserStats};

pub mod memory;

pub use memory::MemoryStore;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
  #[error("{0} not found")]
  NotFound(String),
  #[error("submission {id} is already {status:?}")]
  TerminalState { id: String, status: SubmissionStatus },
  #[error("invalid record: {0}")]
  Invalid(String),
  #[error("storage backend error: {0}")]
  Backend(String),
}

/// Fields captured at intake. The store assigns the id and the `pending` status.
#[derive(Clone, Debug)]
pub struct PendingSubmission {
  pub quest_id: String,
  pub user_id: Option<String>,
  pub answer: String,
  pub word_count: u32,
  pub submitted_at: DateTime<Utc>,
}

/// Partial update applied to a stored submission. `None` leaves a field alone.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubmissionPatch {
  pub status: Option<SubmissionStatus>,
  pub scores: Option<Scores>,
  pub feedback: Option<String>,
  pub scored_at: Option<DateTime<Utc>>,
  pub processing_ms: Option<u64>,
}

impl SubmissionPatch {
  pub fn completed(scores: Scores, feedback: String, scored_at: DateTime<Utc>, processing_ms: u64) -> Self {
    Self {
      status: Some(SubmissionStatus::Completed),
      scores: Some(scores),
      feedback: Some(feedback),
      scored_at: Some(scored_at),
      processing_ms: Some(processing_ms),
    }
  }

  /// Error transition: status only, no score fields.
  pub fn failed() -> Self {
    Self { status: Some(SubmissionStatus::Error), ..Self::default() }
  }

  /// Result of applying this patch to `current`.
  pub fn apply_to(&self, current: &Submission) -> Submission {
    let mut next = current.clone();
    if let Some(status) = self.status { next.status = status; }
    if let Some(scores) = &self.scores { next.scores = Some(scores.clone()); }
    if let Some(feedback) = &self.feedback { next.feedback = Some(feedback.clone()); }
    if let Some(at) = self.scored_at { next.scored_at = Some(at); }
    if let Some(ms) = self.processing_ms { next.processing_ms = Some(ms); }
    next
  }
}

#[async_trait]
pub trait SubmissionStore: Send + Sync {
  async fn create(&self, pending: PendingSubmission) -> Result<String, StoreError>;
  async fn update(&self, id: &str, patch: SubmissionPatch) -> Result<Submission, StoreError>;
  async fn get_by_id(&self, id: &str) -> Result<Option<Submission>, StoreError>;
  async fn list_by_user(&self, user_id: &str) -> Result<Vec<Submission>, StoreError>;
  async fn list_by_quest(&self, quest_id: &str) -> Result<Vec<Submission>, StoreError>;
  /// Atomically add `score_delta` to the user's total and one to their count.
  async fn increment_user_stats(&self, user_id: &str, score_delta: i64) -> Result<UserStats, StoreError>;
}

#[async_trait]
pub trait QuestStore: Send + Sync {
  async fn get_quest(&self, id: &str) -> Result<Option<Quest>, StoreError>;
  /// The active quest dated `date`, if any.
  async fn daily_quest(&self, date: NaiveDate) -> Result<Option<Quest>, StoreError>;
  /// Administrative create or edit.
  async fn upsert_quest(&self, quest: Quest) -> Result<Quest, StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
  async fn get_user(&self, id: &str) -> Result<Option<UserRecord>, StoreError>;
  /// Create or edit a profile. Counters on an existing user are preserved.
  async fn upsert_user(&self, id: &str, display_name: &str, email: &str) -> Result<UserRecord, StoreError>;
}
