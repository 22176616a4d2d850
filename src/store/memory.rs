//! In-memory store: submissions, quests and users behind tokio RwLocks.
//!
//! Each collection sits behind a single lock so multi-field writes (a terminal
//! update, a stats increment) are atomic with respect to concurrent readers.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{PendingSubmission, QuestStore, StoreError, SubmissionPatch, SubmissionStore, UserStore};
use crate::domain::{Quest, Submission, SubmissionStatus, UserRecord, UserStats};

#[derive(Default)]
struct Submissions {
  by_id: HashMap<String, Submission>,
  // Ids in creation order.
  by_user: HashMap<String, Vec<String>>,
  by_quest: HashMap<String, Vec<String>>,
}

#[derive(Default)]
struct Quests {
  by_id: HashMap<String, Quest>,
  by_date: HashMap<NaiveDate, Vec<String>>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
  submissions: Arc<RwLock<Submissions>>,
  quests: Arc<RwLock<Quests>>,
  users: Arc<RwLock<HashMap<String, UserRecord>>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
  #[instrument(level = "debug", target = "store", skip(self, pending), fields(quest_id = %pending.quest_id))]
  async fn create(&self, pending: PendingSubmission) -> Result<String, StoreError> {
    let id = Uuid::new_v4().to_string();
    let record = Submission {
      id: id.clone(),
      quest_id: pending.quest_id,
      user_id: pending.user_id,
      answer: pending.answer,
      word_count: pending.word_count,
      scores: None,
      feedback: None,
      status: SubmissionStatus::Pending,
      submitted_at: pending.submitted_at,
      scored_at: None,
      processing_ms: None,
    };

    let mut subs = self.submissions.write().await;
    if let Some(user) = &record.user_id {
      subs.by_user.entry(user.clone()).or_default().push(id.clone());
    }
    subs.by_quest.entry(record.quest_id.clone()).or_default().push(id.clone());
    subs.by_id.insert(id.clone(), record);
    debug!(target: "store", %id, "Pending submission stored");
    Ok(id)
  }

  #[instrument(level = "debug", target = "store", skip(self, patch), fields(status = ?patch.status))]
  async fn update(&self, id: &str, patch: SubmissionPatch) -> Result<Submission, StoreError> {
    let mut subs = self.submissions.write().await;
    let current = subs
      .by_id
      .get_mut(id)
      .ok_or_else(|| StoreError::NotFound(format!("submission {id}")))?;

    let next = patch.apply_to(current);
    if current.status.is_terminal() {
      if next == *current {
        return Ok(next);
      }
      return Err(StoreError::TerminalState { id: id.to_string(), status: current.status });
    }
    *current = next.clone();
    Ok(next)
  }

  async fn get_by_id(&self, id: &str) -> Result<Option<Submission>, StoreError> {
    Ok(self.submissions.read().await.by_id.get(id).cloned())
  }

  async fn list_by_user(&self, user_id: &str) -> Result<Vec<Submission>, StoreError> {
    let subs = self.submissions.read().await;
    Ok(collect(&subs, subs.by_user.get(user_id)))
  }

  async fn list_by_quest(&self, quest_id: &str) -> Result<Vec<Submission>, StoreError> {
    let subs = self.submissions.read().await;
    Ok(collect(&subs, subs.by_quest.get(quest_id)))
  }

  #[instrument(level = "debug", target = "store", skip(self))]
  async fn increment_user_stats(&self, user_id: &str, score_delta: i64) -> Result<UserStats, StoreError> {
    let mut users = self.users.write().await;
    let user = users
      .get_mut(user_id)
      .ok_or_else(|| StoreError::NotFound(format!("user {user_id}")))?;
    user.total_score += score_delta;
    user.submission_count += 1;
    Ok(UserStats { total_score: user.total_score, submission_count: user.submission_count })
  }
}

fn collect(subs: &Submissions, ids: Option<&Vec<String>>) -> Vec<Submission> {
  ids.map(|ids| ids.iter().filter_map(|id| subs.by_id.get(id).cloned()).collect())
    .unwrap_or_default()
}

#[async_trait]
impl QuestStore for MemoryStore {
  async fn get_quest(&self, id: &str) -> Result<Option<Quest>, StoreError> {
    Ok(self.quests.read().await.by_id.get(id).cloned())
  }

  async fn daily_quest(&self, date: NaiveDate) -> Result<Option<Quest>, StoreError> {
    let quests = self.quests.read().await;
    let found = quests
      .by_date
      .get(&date)
      .into_iter()
      .flatten()
      .filter_map(|id| quests.by_id.get(id))
      .find(|q| q.is_active_on(date))
      .cloned();
    Ok(found)
  }

  #[instrument(level = "debug", target = "store", skip(self, quest), fields(id = %quest.id, date = %quest.date))]
  async fn upsert_quest(&self, quest: Quest) -> Result<Quest, StoreError> {
    quest.validate().map_err(StoreError::Invalid)?;
    let mut quests = self.quests.write().await;
    if let Some(old) = quests.by_id.get(&quest.id).cloned() {
      if let Some(ids) = quests.by_date.get_mut(&old.date) {
        ids.retain(|id| id != &old.id);
      }
    }
    quests.by_date.entry(quest.date).or_default().push(quest.id.clone());
    quests.by_id.insert(quest.id.clone(), quest.clone());
    Ok(quest)
  }
}

#[async_trait]
impl UserStore for MemoryStore {
  async fn get_user(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
    Ok(self.users.read().await.get(id).cloned())
  }

  async fn upsert_user(&self, id: &str, display_name: &str, email: &str) -> Result<UserRecord, StoreError> {
    if id.trim().is_empty() {
      return Err(StoreError::Invalid("user id must not be empty".into()));
    }
    let mut users = self.users.write().await;
    let user = users.entry(id.to_string()).or_insert_with(|| UserRecord {
      id: id.to_string(),
      display_name: String::new(),
      email: String::new(),
      total_score: 0,
      submission_count: 0,
    });
    user.display_name = display_name.to_string();
    user.email = email.to_string();
    Ok(user.clone())
  }
}
