//! Submission scoring pipeline.
//!
//! Intake -> Pending (persisted) -> Scoring (in memory, record stays pending)
//! -> Completed | Error (persisted, terminal).
//!
//! Nothing is written before intake validation passes. Once a pending record
//! exists every path ends in a terminal status: the judge call is bounded by an
//! outer deadline, so a hung judge still resolves to `error`.

use std::{sync::Arc, time::Duration, time::Instant};

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::domain::{Identity, Quest, Submission};
use crate::judge::{Judge, JudgeError};
use crate::quest::today_jst;
use crate::scoring::ScoringRules;
use crate::store::{PendingSubmission, QuestStore, StoreError, SubmissionPatch, SubmissionStore, UserStore};
use crate::wordcount::count_words;

/// Intake policy switches.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SubmissionPolicy {
  /// Only accept answers to the quest that is active today (UTC+9).
  pub enforce_active_quest: bool,
  /// Accept submissions without a user identity.
  pub allow_guests: bool,
}

impl Default for SubmissionPolicy {
  fn default() -> Self {
    Self { enforce_active_quest: false, allow_guests: true }
  }
}

#[derive(Debug, Error)]
pub enum SubmitError {
  #[error("{0}")]
  Validation(String),
  #[error("quest {0} not found")]
  QuestNotFound(String),
  #[error("user {0} not found")]
  UserNotFound(String),
  #[error("quest {quest_id} is not active on {today}")]
  QuestNotActive { quest_id: String, today: NaiveDate },
  #[error("storage error: {0}")]
  Store(#[from] StoreError),
  #[error("submission task failed: {0}")]
  Task(String),
  /// The judge failed; `submission` is the persisted `error` record.
  #[error("scoring failed for submission {id}: {cause}", id = submission.id)]
  Scoring { submission: Box<Submission>, cause: JudgeError },
}

/// Input to `submit`.
#[derive(Clone, Debug)]
pub struct SubmissionRequest {
  pub quest_id: String,
  pub answer: String,
  pub identity: Identity,
}

pub struct SubmissionOrchestrator {
  judge: Arc<dyn Judge>,
  submissions: Arc<dyn SubmissionStore>,
  quests: Arc<dyn QuestStore>,
  users: Arc<dyn UserStore>,
  rules: ScoringRules,
  policy: SubmissionPolicy,
  deadline: Duration,
}

impl SubmissionOrchestrator {
  pub fn new(
    judge: Arc<dyn Judge>,
    submissions: Arc<dyn SubmissionStore>,
    quests: Arc<dyn QuestStore>,
    users: Arc<dyn UserStore>,
  ) -> Self {
    Self {
      judge,
      submissions,
      quests,
      users,
      rules: ScoringRules::default(),
      policy: SubmissionPolicy::default(),
      deadline: Duration::from_secs(120),
    }
  }

  pub fn with_rules(mut self, rules: ScoringRules) -> Self {
    self.rules = rules;
    self
  }

  pub fn with_policy(mut self, policy: SubmissionPolicy) -> Self {
    self.policy = policy;
    self
  }

  /// Outer bound on the judge call, retries included.
  pub fn with_deadline(mut self, deadline: Duration) -> Self {
    self.deadline = deadline;
    self
  }

  pub fn rules(&self) -> &ScoringRules { &self.rules }

  /// `submit` on its own task. The pipeline runs to a terminal status even
  /// if the caller stops waiting, e.g. an HTTP client disconnecting.
  pub async fn submit_detached(self: Arc<Self>, req: SubmissionRequest) -> Result<Submission, SubmitError> {
    tokio::spawn(async move { self.submit(req).await })
      .await
      .map_err(|e| SubmitError::Task(e.to_string()))?
  }

  /// Run one submission through the pipeline.
  #[instrument(
    level = "info",
    target = "scoring",
    skip(self, req),
    fields(quest_id = %req.quest_id, answer_len = req.answer.len(), guest = req.identity.user_id().is_none())
  )]
  pub async fn submit(&self, req: SubmissionRequest) -> Result<Submission, SubmitError> {
    let started = Instant::now();
    let quest = self.intake(&req).await?;

    let word_count = count_words(&req.answer);
    let id = self
      .submissions
      .create(PendingSubmission {
        quest_id: quest.id.clone(),
        user_id: req.identity.user_id().map(String::from),
        answer: req.answer.clone(),
        word_count,
        submitted_at: Utc::now(),
      })
      .await?;
    info!(target: "scoring", submission_id = %id, word_count, "Submission pending; calling judge");

    let judged = tokio::time::timeout(
      self.deadline,
      self.judge.score(Some(quest.prompt.as_str()), &req.answer, quest.word_count_min, quest.word_count_max),
    )
    .await
    .unwrap_or(Err(JudgeError::Timeout { after: self.deadline }));

    let raw = match judged {
      Ok(raw) => raw,
      Err(cause) => return Err(self.mark_failed(&id, cause).await),
    };

    let scores = self.rules.score(&raw, &req.answer, quest.word_count_min, quest.word_count_max);
    let processing_ms = started.elapsed().as_millis() as u64;
    let record = match self
      .submissions
      .update(&id, SubmissionPatch::completed(scores, raw.feedback, Utc::now(), processing_ms))
      .await
    {
      Ok(record) => record,
      Err(e) => return Err(self.abandon(&id, e).await),
    };

    let total = record.scores.as_ref().map(|s| s.total);
    info!(target: "scoring", submission_id = %id, ?total, processing_ms, "Submission completed");

    if let Some(user_id) = &record.user_id {
      self.record_stats(user_id, &record).await;
    }
    Ok(record)
  }

  async fn intake(&self, req: &SubmissionRequest) -> Result<Quest, SubmitError> {
    let quest_id = req.quest_id.trim();
    if quest_id.is_empty() {
      return Err(SubmitError::Validation("questId is required".into()));
    }
    if req.answer.trim().is_empty() {
      return Err(SubmitError::Validation("answer is required".into()));
    }

    match &req.identity {
      Identity::User(user_id) => {
        if user_id.trim().is_empty() {
          return Err(SubmitError::Validation("user id must not be empty".into()));
        }
        if self.users.get_user(user_id).await?.is_none() {
          return Err(SubmitError::UserNotFound(user_id.clone()));
        }
      }
      Identity::Guest if !self.policy.allow_guests => {
        return Err(SubmitError::Validation("a signed-in user is required".into()));
      }
      Identity::Guest => {}
    }

    let quest = self
      .quests
      .get_quest(quest_id)
      .await?
      .ok_or_else(|| SubmitError::QuestNotFound(quest_id.to_string()))?;

    if self.policy.enforce_active_quest {
      let today = today_jst();
      if !quest.is_active_on(today) {
        return Err(SubmitError::QuestNotActive { quest_id: quest.id, today });
      }
    }
    Ok(quest)
  }

  async fn mark_failed(&self, id: &str, cause: JudgeError) -> SubmitError {
    error!(target: "scoring", submission_id = %id, error = %cause, timeout = cause.is_timeout(), "Judge failed; marking submission as error");
    match self.submissions.update(id, SubmissionPatch::failed()).await {
      Ok(record) => SubmitError::Scoring { submission: Box::new(record), cause },
      Err(e) => {
        error!(target: "scoring", submission_id = %id, error = %e, "Could not persist error status");
        SubmitError::Store(e)
      }
    }
  }

  /// The completed write failed: try to leave the record in `error` rather
  /// than `pending`, then surface the original store error.
  async fn abandon(&self, id: &str, cause: StoreError) -> SubmitError {
    error!(target: "scoring", submission_id = %id, error = %cause, "Could not persist completed status; marking submission as error");
    if let Err(e) = self.submissions.update(id, SubmissionPatch::failed()).await {
      error!(target: "scoring", submission_id = %id, error = %e, "Could not persist error status");
    }
    SubmitError::Store(cause)
  }

  /// Best effort: the submission record is the source of truth, stats are a cache.
  async fn record_stats(&self, user_id: &str, record: &Submission) {
    let delta = record.countable_total().map(i64::from).unwrap_or(0);
    match self.submissions.increment_user_stats(user_id, delta).await {
      Ok(stats) => {
        debug!(target: "scoring", submission_id = %record.id, user_id, total_score = stats.total_score, submission_count = stats.submission_count, "User stats updated");
      }
      Err(e) => {
        warn!(target: "scoring", submission_id = %record.id, user_id, error = %e, "User stats update failed; submission stays completed");
      }
    }
  }
}
