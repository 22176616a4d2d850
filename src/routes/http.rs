//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs its parameters and basic result info.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
  Json,
};
use tracing::{info, instrument};

use super::USER_HEADER;
use crate::domain::{Identity, Quest};
use crate::error::ApiError;
use crate::orchestrator::SubmissionRequest;
use crate::protocol::*;
use crate::quest::today_jst;
use crate::state::AppState;
use crate::stats::{average_score, canonical_submission, dashboard, leaderboard};
use crate::store::{QuestStore, SubmissionStore, UserStore};

type ApiResult<T> = Result<T, ApiError>;

fn identity(headers: &HeaderMap) -> Identity {
  headers
    .get(USER_HEADER)
    .and_then(|v| v.to_str().ok())
    .map(str::trim)
    .filter(|v| !v.is_empty())
    .map(|v| Identity::User(v.to_string()))
    .unwrap_or(Identity::Guest)
}

fn require_user(headers: &HeaderMap) -> ApiResult<String> {
  match identity(headers) {
    Identity::User(id) => Ok(id),
    Identity::Guest => Err(ApiError::UserRequired),
  }
}

/// Quest named by `quest_id`, else today's (UTC+9) daily quest.
async fn resolve_quest(state: &AppState, quest_id: Option<String>) -> ApiResult<Quest> {
  match quest_id.filter(|q| !q.trim().is_empty()) {
    Some(id) => state
      .store
      .get_quest(&id)
      .await?
      .ok_or_else(|| ApiError::NotFound(format!("quest {id} not found"))),
    None => {
      let today = today_jst();
      state
        .store
        .daily_quest(today)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no quest for {today}")))
    }
  }
}

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut { ok: true, judge: state.judge_enabled })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_today_quest(State(state): State<Arc<AppState>>) -> ApiResult<Json<QuestOut>> {
  let quest = resolve_quest(&state, None).await?;
  info!(target: "writing_quest", id = %quest.id, date = %quest.date, "Today's quest served");
  Ok(Json(quest.into()))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_quest(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult<Json<QuestOut>> {
  let quest = resolve_quest(&state, Some(id)).await?;
  Ok(Json(quest.into()))
}

#[instrument(level = "info", skip(state, body), fields(date = %body.date))]
pub async fn http_put_quest(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(body): Json<QuestIn>,
) -> ApiResult<Json<QuestOut>> {
  let quest = state.store.upsert_quest(body.into_quest(id)).await?;
  info!(target: "writing_quest", id = %quest.id, date = %quest.date, active = quest.is_active, "Quest upserted");
  Ok(Json(quest.into()))
}

#[instrument(level = "info", skip(state, body), fields(id = %body.id))]
pub async fn http_post_user(
  State(state): State<Arc<AppState>>,
  Json(body): Json<UserIn>,
) -> ApiResult<Json<UserOut>> {
  let user = state.store.upsert_user(body.id.trim(), &body.display_name, &body.email).await?;
  info!(target: "writing_quest", id = %user.id, "User upserted");
  Ok(Json(user.into()))
}

#[instrument(level = "info", skip(state, headers, body), fields(quest_id = %body.quest_id, answer_len = body.answer.len()))]
pub async fn http_post_submission(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Json(body): Json<CreateSubmissionIn>,
) -> ApiResult<(StatusCode, Json<SubmissionOut>)> {
  let req = SubmissionRequest { quest_id: body.quest_id, answer: body.answer, identity: identity(&headers) };
  // Detached so a dropped connection cannot strand the record in `pending`.
  let record = state.orchestrator.clone().submit_detached(req).await?;
  info!(
    target: "writing_quest",
    id = %record.id,
    status = record.status.as_str(),
    total = ?record.scores.as_ref().map(|s| s.total),
    "HTTP submission scored"
  );
  Ok((StatusCode::CREATED, Json(to_out(&record, None))))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_submission(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> ApiResult<Json<SubmissionOut>> {
  let record = state
    .store
    .get_by_id(&id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("submission {id} not found")))?;
  Ok(Json(to_out(&record, None)))
}

/// The caller's canonical submission for a quest (today's by default).
#[instrument(level = "info", skip(state, headers))]
pub async fn http_get_my_submission(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Query(q): Query<QuestQuery>,
) -> ApiResult<Json<SubmissionOut>> {
  let user_id = require_user(&headers)?;
  let quest = resolve_quest(&state, q.quest_id).await?;
  let mine = state.store.list_by_user(&user_id).await?;
  let record = canonical_submission(&mine, &user_id, &quest.id)
    .ok_or_else(|| ApiError::NotFound(format!("no submission for quest {}", quest.id)))?;
  Ok(Json(to_out(record, Some(quest.title))))
}

/// The caller's history, newest first, with quest titles.
#[instrument(level = "info", skip(state, headers))]
pub async fn http_get_my_history(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
) -> ApiResult<Json<SubmissionListOut>> {
  let user_id = require_user(&headers)?;
  let mut mine = state.store.list_by_user(&user_id).await?;
  mine.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));

  let mut titles: HashMap<String, Option<String>> = HashMap::new();
  for s in &mine {
    if !titles.contains_key(&s.quest_id) {
      let title = state.store.get_quest(&s.quest_id).await?.map(|q| q.title);
      titles.insert(s.quest_id.clone(), title);
    }
  }

  let submissions = mine
    .iter()
    .map(|s| to_out(s, titles.get(&s.quest_id).cloned().flatten()))
    .collect::<Vec<_>>();
  info!(target: "writing_quest", %user_id, count = submissions.len(), "History served");
  Ok(Json(SubmissionListOut { submissions }))
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_get_my_stats(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
) -> ApiResult<Json<StatsOut>> {
  let user_id = require_user(&headers)?;
  let user = state
    .store
    .get_user(&user_id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("user {user_id} not found")))?;

  let today = today_jst();
  let today_quest = state.store.daily_quest(today).await?;
  let quest_subs = match &today_quest {
    Some(q) => state.store.list_by_quest(&q.id).await?,
    None => Vec::new(),
  };
  let user_subs = state.store.list_by_user(&user_id).await?;

  let mut quest_dates = HashMap::new();
  for s in &user_subs {
    if !quest_dates.contains_key(&s.quest_id) {
      if let Some(q) = state.store.get_quest(&s.quest_id).await? {
        quest_dates.insert(q.id, q.date);
      }
    }
  }

  let dash = dashboard(
    &user_id,
    today_quest.as_ref().map(|q| q.id.as_str()),
    &quest_subs,
    &user_subs,
    &quest_dates,
    today,
  );
  Ok(Json(StatsOut {
    today_score: dash.today_score,
    rank: dash.rank,
    streak: dash.streak,
    total_score: user.total_score,
    submission_count: user.submission_count,
  }))
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_get_my_average(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
) -> ApiResult<Json<AverageOut>> {
  let user_id = require_user(&headers)?;
  let mine = state.store.list_by_user(&user_id).await?;
  let counted = mine.iter().filter(|s| s.countable_total().is_some()).count();
  Ok(Json(AverageOut { average_score: average_score(&mine), counted }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_leaderboard(
  State(state): State<Arc<AppState>>,
  Query(q): Query<QuestQuery>,
) -> ApiResult<Json<LeaderboardOut>> {
  let quest = resolve_quest(&state, q.quest_id).await?;
  let subs = state.store.list_by_quest(&quest.id).await?;

  let mut ranking = Vec::new();
  for entry in leaderboard(&subs) {
    let display_name = state
      .store
      .get_user(&entry.user_id)
      .await?
      .map(|u| u.display_name)
      .unwrap_or_else(|| "Unknown".into());
    ranking.push(RankingOut {
      rank: entry.rank,
      user_id: entry.user_id,
      display_name,
      submission_id: entry.submission_id,
      score: entry.score,
    });
  }
  info!(target: "writing_quest", quest_id = %quest.id, ranked = ranking.len(), "Leaderboard served");
  let total_users = ranking.len();
  Ok(Json(LeaderboardOut { quest_id: quest.id, date: quest.date, ranking, total_users }))
}
