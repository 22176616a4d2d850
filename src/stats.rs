//! Read-side aggregation over stored submissions: canonical record per
//! (user, quest), daily leaderboard, averages and streaks.
//!
//! Withheld totals (-1) and non-completed records never take part in any
//! ranking or average.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{Submission, SubmissionStatus};

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
  pub rank: u32,
  pub user_id: String,
  pub submission_id: String,
  pub score: i32,
}

/// The record surfaced for `user_id` on `quest_id`: the latest completed one by
/// submit time, else the latest of any status.
pub fn canonical_submission<'a>(subs: &'a [Submission], user_id: &str, quest_id: &str) -> Option<&'a Submission> {
  let mine = || subs.iter().filter(|s| s.quest_id == quest_id && s.user_id.as_deref() == Some(user_id));
  mine()
    .filter(|s| s.status == SubmissionStatus::Completed)
    .max_by_key(|s| s.submitted_at)
    .or_else(|| mine().max_by_key(|s| s.submitted_at))
}

/// Rank one quest's submissions. One entry per signed-in user (their latest
/// completed record); withheld records are dropped; ties keep submission order.
pub fn leaderboard(subs: &[Submission]) -> Vec<LeaderboardEntry> {
  let mut latest: HashMap<&str, &Submission> = HashMap::new();
  for s in subs.iter().filter(|s| s.status == SubmissionStatus::Completed) {
    let Some(user) = s.user_id.as_deref() else { continue };
    match latest.get(user) {
      Some(prev) if prev.submitted_at > s.submitted_at => {}
      _ => {
        latest.insert(user, s);
      }
    }
  }

  let mut ranked: Vec<(&str, &Submission, i32)> = latest
    .into_iter()
    .filter_map(|(user, s)| s.countable_total().map(|t| (user, s, t)))
    .collect();
  // Submission order first, so the stable sort below breaks ties by it.
  ranked.sort_by(|a, b| a.1.submitted_at.cmp(&b.1.submitted_at).then_with(|| a.1.id.cmp(&b.1.id)));
  ranked.sort_by(|a, b| b.2.cmp(&a.2));

  ranked
    .into_iter()
    .enumerate()
    .map(|(i, (user, s, total))| LeaderboardEntry {
      rank: i as u32 + 1,
      user_id: user.to_string(),
      submission_id: s.id.clone(),
      score: total,
    })
    .collect()
}

/// Mean of completed, non-withheld totals. None when nothing qualifies.
pub fn average_score(subs: &[Submission]) -> Option<f64> {
  let totals: Vec<i32> = subs.iter().filter_map(Submission::countable_total).collect();
  if totals.is_empty() {
    return None;
  }
  Some(totals.iter().map(|&t| f64::from(t)).sum::<f64>() / totals.len() as f64)
}

/// Consecutive days ending at `today` present in `dates`. Zero if today is missing.
pub fn daily_streak(dates: impl IntoIterator<Item = NaiveDate>, today: NaiveDate) -> u32 {
  let days: BTreeSet<NaiveDate> = dates.into_iter().collect();
  let mut streak = 0;
  let mut day = today;
  while days.contains(&day) {
    streak += 1;
    match day.pred_opt() {
      Some(prev) => day = prev,
      None => break,
    }
  }
  streak
}

/// Dashboard numbers for one user.
#[derive(Clone, Debug, Serialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
  /// Total of today's canonical record; None if unscored or withheld.
  pub today_score: Option<i32>,
  pub rank: Option<u32>,
  pub streak: u32,
}

/// `quest_subs` are all submissions for today's quest, `user_subs` the user's
/// history, `quest_dates` maps quest ids to their dates.
pub fn dashboard(
  user_id: &str,
  today_quest_id: Option<&str>,
  quest_subs: &[Submission],
  user_subs: &[Submission],
  quest_dates: &HashMap<String, NaiveDate>,
  today: NaiveDate,
) -> Dashboard {
  let (today_score, rank) = match today_quest_id {
    Some(qid) => {
      let score = canonical_submission(quest_subs, user_id, qid).and_then(Submission::countable_total);
      let rank = leaderboard(quest_subs).into_iter().find(|e| e.user_id == user_id).map(|e| e.rank);
      (score, rank)
    }
    None => (None, None),
  };

  let completed_days = user_subs
    .iter()
    .filter(|s| s.status == SubmissionStatus::Completed)
    .filter_map(|s| quest_dates.get(&s.quest_id).copied());

  Dashboard { today_score, rank, streak: daily_streak(completed_days, today) }
}
