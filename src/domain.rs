//! Domain models: quests, submissions, scores and the per-user aggregate.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Difficulty tag attached to a quest.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
  Easy,
  #[default]
  Medium,
  Hard,
}

/// A daily writing assignment.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Quest {
  pub id: String,
  /// Calendar date in the UTC+9 authoring zone.
  pub date: NaiveDate,
  pub title: String,
  pub prompt: String,
  /// Inclusive word-count bounds.
  pub word_count_min: u32,
  pub word_count_max: u32,
  #[serde(default)] pub difficulty: Difficulty,
  #[serde(default)] pub category: String,
  #[serde(default = "default_true")] pub is_active: bool,
}

fn default_true() -> bool { true }

/// The four dimensions as the judge reported them, plus its feedback text.
///
/// Dimensions are kept as the judge sent them (0..=25 expected). Anything the
/// judge left out or sent as garbage has already been coerced to 0 by the parser.
/// Fractional values are accepted and not rounded per dimension; only the
/// combined total is rounded to an integer during normalization.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct RawScores {
  pub grammar: f64,
  pub logic: f64,
  pub context: f64,
  pub fluency: f64,
  pub feedback: String,
}

/// Sentinel total meaning "scoring withheld".
pub const WITHHELD_TOTAL: i32 = -1;

/// Normalized scores stored on a completed submission.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Scores {
  pub grammar: f64,
  pub logic: f64,
  pub context: f64,
  pub fluency: f64,
  /// 0..=100, or `WITHHELD_TOTAL`.
  pub total: i32,
  pub is_correct: bool,
}

impl Scores {
  /// Withheld totals must never take part in ranking or averages.
  pub fn is_withheld(&self) -> bool { self.total < 0 }
}

/// Lifecycle of a submission. `Completed` and `Error` are terminal.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
  Pending,
  Completed,
  Error,
}

impl SubmissionStatus {
  pub fn is_terminal(self) -> bool { !matches!(self, SubmissionStatus::Pending) }

  pub fn as_str(self) -> &'static str {
    match self {
      SubmissionStatus::Pending => "pending",
      SubmissionStatus::Completed => "completed",
      SubmissionStatus::Error => "error",
    }
  }
}

/// One user's attempt at one quest.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Submission {
  pub id: String,
  pub quest_id: String,
  /// None only for guest submissions.
  pub user_id: Option<String>,
  pub answer: String,
  pub word_count: u32,
  pub scores: Option<Scores>,
  pub feedback: Option<String>,
  pub status: SubmissionStatus,
  pub submitted_at: DateTime<Utc>,
  pub scored_at: Option<DateTime<Utc>>,
  pub processing_ms: Option<u64>,
}

impl Submission {
  /// Total that may take part in aggregation: completed and not withheld.
  pub fn countable_total(&self) -> Option<i32> {
    if self.status != SubmissionStatus::Completed {
      return None;
    }
    self.scores.as_ref().filter(|s| !s.is_withheld()).map(|s| s.total)
  }
}

/// Who is submitting. Guests get no stats and no ranking.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Identity {
  User(String),
  Guest,
}

impl Identity {
  pub fn user_id(&self) -> Option<&str> {
    match self {
      Identity::User(id) => Some(id),
      Identity::Guest => None,
    }
  }
}

/// A registered user with running aggregate counters.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserRecord {
  pub id: String,
  pub display_name: String,
  #[serde(default)] pub email: String,
  #[serde(default)] pub total_score: i64,
  #[serde(default)] pub submission_count: u64,
}

/// Snapshot of a user's counters after an increment.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct UserStats {
  pub total_score: i64,
  pub submission_count: u64,
}
