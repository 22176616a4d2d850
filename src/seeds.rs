//! Seed data: quests and users from config, plus a built-in quest so the app
//! has something to answer even without external config.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::config::{QuestCfg, UserCfg};
use crate::domain::{Difficulty, Quest};

/// Build a quest from a config entry. Missing id gets a fresh uuid, missing date is `today`.
pub fn quest_from_cfg(cfg: &QuestCfg, today: NaiveDate) -> Quest {
  Quest {
    id: cfg.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string()),
    date: cfg.date.unwrap_or(today),
    title: cfg.title.clone(),
    prompt: cfg.prompt.clone(),
    word_count_min: cfg.word_count_min,
    word_count_max: cfg.word_count_max,
    difficulty: cfg.difficulty,
    category: cfg.category.clone(),
    is_active: cfg.is_active.unwrap_or(true),
  }
}

/// Built-in quest dated `today`, used when config provides none for that day.
pub fn builtin_quest(today: NaiveDate) -> Quest {
  Quest {
    id: format!("daily-{today}"),
    date: today,
    title: "Remote work policy".into(),
    prompt: "Your company is considering a permanent hybrid work policy. Write a short \
             memo to your manager arguing for or against it, with at least two concrete reasons."
      .into(),
    word_count_min: 100,
    word_count_max: 200,
    difficulty: Difficulty::Medium,
    category: "business".into(),
    is_active: true,
  }
}

/// Demo account registered when config lists no users.
pub fn builtin_users() -> Vec<UserCfg> {
  vec![UserCfg { id: "demo".into(), display_name: "Demo Learner".into(), email: String::new() }]
}
