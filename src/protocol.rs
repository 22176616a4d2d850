//! Public protocol structs for the HTTP API (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Difficulty, Quest, Scores, Submission, UserRecord};

#[derive(Debug, Serialize)]
pub struct HealthOut {
    pub ok: bool,
    /// False when no judge is configured; submissions will end in `error`.
    pub judge: bool,
}

/// Body of `POST /api/v1/submissions`. Missing fields arrive empty and are
/// rejected by intake validation with a specific message.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubmissionIn {
    #[serde(default)]
    pub quest_id: String,
    #[serde(default)]
    pub answer: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestQuery {
    pub quest_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoresOut {
    pub grammar: f64,
    pub logic: f64,
    pub context: f64,
    pub fluency: f64,
    pub total: i32,
    pub is_correct: bool,
}

impl From<&Scores> for ScoresOut {
    fn from(s: &Scores) -> Self {
        Self {
            grammar: s.grammar,
            logic: s.logic,
            context: s.context,
            fluency: s.fluency,
            total: s.total,
            is_correct: s.is_correct,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOut {
    pub submission_id: String,
    pub quest_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quest_title: Option<String>,
    pub user_id: Option<String>,
    pub answer: String,
    pub word_count: u32,
    pub scores: Option<ScoresOut>,
    pub feedback: Option<String>,
    pub status: &'static str,
    pub submitted_at: DateTime<Utc>,
    pub scored_at: Option<DateTime<Utc>>,
    /// Milliseconds from intake to the completed record.
    pub processing_time: Option<u64>,
}

/// Convert internal Submission -> public SubmissionOut.
pub fn to_out(s: &Submission, quest_title: Option<String>) -> SubmissionOut {
    SubmissionOut {
        submission_id: s.id.clone(),
        quest_id: s.quest_id.clone(),
        quest_title,
        user_id: s.user_id.clone(),
        answer: s.answer.clone(),
        word_count: s.word_count,
        scores: s.scores.as_ref().map(ScoresOut::from),
        feedback: s.feedback.clone(),
        status: s.status.as_str(),
        submitted_at: s.submitted_at,
        scored_at: s.scored_at,
        processing_time: s.processing_ms,
    }
}

#[derive(Debug, Serialize)]
pub struct SubmissionListOut {
    pub submissions: Vec<SubmissionOut>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestOut {
    pub quest_id: String,
    pub date: NaiveDate,
    pub title: String,
    pub prompt: String,
    pub word_count_min: u32,
    pub word_count_max: u32,
    pub difficulty: Difficulty,
    pub category: String,
    pub is_active: bool,
}

impl From<Quest> for QuestOut {
    fn from(q: Quest) -> Self {
        Self {
            quest_id: q.id,
            date: q.date,
            title: q.title,
            prompt: q.prompt,
            word_count_min: q.word_count_min,
            word_count_max: q.word_count_max,
            difficulty: q.difficulty,
            category: q.category,
            is_active: q.is_active,
        }
    }
}

/// Body of `PUT /api/v1/quests/:id`. The id comes from the path.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestIn {
    pub date: NaiveDate,
    pub title: String,
    pub prompt: String,
    pub word_count_min: u32,
    pub word_count_max: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub category: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl QuestIn {
    pub fn into_quest(self, id: String) -> Quest {
        Quest {
            id,
            date: self.date,
            title: self.title,
            prompt: self.prompt,
            word_count_min: self.word_count_min,
            word_count_max: self.word_count_max,
            difficulty: self.difficulty,
            category: self.category,
            is_active: self.is_active,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIn {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOut {
    pub user_id: String,
    pub display_name: String,
    pub email: String,
    pub total_score: i64,
    pub submission_count: u64,
}

impl From<UserRecord> for UserOut {
    fn from(u: UserRecord) -> Self {
        Self {
            user_id: u.id,
            display_name: u.display_name,
            email: u.email,
            total_score: u.total_score,
            submission_count: u.submission_count,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingOut {
    pub rank: u32,
    pub user_id: String,
    pub display_name: String,
    pub submission_id: String,
    pub score: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardOut {
    pub quest_id: String,
    pub date: NaiveDate,
    pub ranking: Vec<RankingOut>,
    pub total_users: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsOut {
    pub today_score: Option<i32>,
    pub rank: Option<u32>,
    pub streak: u32,
    pub total_score: i64,
    pub submission_count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AverageOut {
    /// None when the user has no completed, scored submission.
    pub average_score: Option<f64>,
    pub counted: usize,
}
