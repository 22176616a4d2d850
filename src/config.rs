//! Loading application configuration (judge, scoring rules, policy, seed data) from TOML.
//!
//! See `AppConfig` for the expected schema. Every section is optional; a missing
//! or unreadable file means defaults everywhere. Secrets (the OpenAI key) only
//! ever come from the environment.

use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::Difficulty;
use crate::judge::RetryPolicy;
use crate::orchestrator::SubmissionPolicy;
use crate::prompt::DEFAULT_FEEDBACK_LANGUAGE;
use crate::scoring::ScoringRules;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub judge: JudgeSettings,
  #[serde(default)]
  pub scoring: ScoringRules,
  #[serde(default)]
  pub policy: SubmissionPolicy,
  #[serde(default)]
  pub quests: Vec<QuestCfg>,
  #[serde(default)]
  pub users: Vec<UserCfg>,
}

/// Judge call tuning. Defaults: 3 attempts, 30s each, 500ms doubling backoff.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct JudgeSettings {
  pub model: String,
  pub temperature: f32,
  pub max_tokens: u32,
  pub attempt_timeout_secs: u64,
  pub max_attempts: u32,
  pub backoff_base_ms: u64,
  pub backoff_max_ms: u64,
  pub jitter: bool,
  /// Outer bound on the whole judge call, retries included.
  pub deadline_secs: u64,
  pub feedback_language: String,
}

impl Default for JudgeSettings {
  fn default() -> Self {
    Self {
      model: "gpt-4-turbo".into(),
      temperature: 0.3,
      max_tokens: 500,
      attempt_timeout_secs: 30,
      max_attempts: 3,
      backoff_base_ms: 500,
      backoff_max_ms: 8_000,
      jitter: true,
      deadline_secs: 120,
      feedback_language: DEFAULT_FEEDBACK_LANGUAGE.into(),
    }
  }
}

impl JudgeSettings {
  pub fn retry_policy(&self) -> RetryPolicy {
    RetryPolicy::new(
      self.max_attempts,
      Duration::from_millis(self.backoff_base_ms),
      Duration::from_millis(self.backoff_max_ms),
    )
    .with_jitter(self.jitter)
  }

  pub fn attempt_timeout(&self) -> Duration { Duration::from_secs(self.attempt_timeout_secs) }

  pub fn deadline(&self) -> Duration { Duration::from_secs(self.deadline_secs) }
}

/// Quest entry accepted in TOML configuration.
/// `date` is a quoted `YYYY-MM-DD`; when omitted the quest is dated today (UTC+9).
#[derive(Clone, Debug, Deserialize)]
pub struct QuestCfg {
  #[serde(default)] pub id: Option<String>,
  #[serde(default)] pub date: Option<chrono::NaiveDate>,
  pub title: String,
  pub prompt: String,
  pub word_count_min: u32,
  pub word_count_max: u32,
  #[serde(default)] pub difficulty: Difficulty,
  #[serde(default)] pub category: String,
  #[serde(default)] pub is_active: Option<bool>,
}

/// Pre-registered user.
#[derive(Clone, Debug, Deserialize)]
pub struct UserCfg {
  pub id: String,
  pub display_name: String,
  #[serde(default)] pub email: String,
}

/// Attempt to load `AppConfig` from APP_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_app_config_from_env() -> Option<AppConfig> {
  let path = std::env::var("APP_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_app_config(&s) {
      Ok(cfg) => {
        info!(target: "writing_quest", %path, quests = cfg.quests.len(), users = cfg.users.len(), "Loaded app config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "writing_quest", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "writing_quest", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

pub fn parse_app_config(s: &str) -> Result<AppConfig, toml::de::Error> {
  toml::from_str::<AppConfig>(s)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::scoring::Rubric;

  #[test]
  fn empty_file_gives_defaults() {
    let cfg = parse_app_config("").unwrap();
    assert_eq!(cfg.judge, JudgeSettings::default());
    assert_eq!(cfg.scoring, ScoringRules::default());
    assert!(!cfg.policy.enforce_active_quest);
    assert!(cfg.quests.is_empty());
  }

  #[test]
  fn sections_override_defaults() {
    let cfg = parse_app_config(
      r#"
[judge]
max_attempts = 5
attempt_timeout_secs = 10
jitter = false

[scoring]
withheld_below_words = 40
[scoring.rubric]
kind = "weighted"
grammar = 0.25
logic = 0.3
context = 0.25
fluency = 0.2

[policy]
enforce_active_quest = true

[[quests]]
id = "q-1"
date = "2026-10-19"
title = "Quarterly update"
prompt = "Summarise the quarter for your team."
word_count_min = 120
word_count_max = 250
difficulty = "hard"

[[users]]
id = "u-1"
display_name = "Aki"
"#,
    )
    .unwrap();
    assert_eq!(cfg.judge.max_attempts, 5);
    assert_eq!(cfg.judge.attempt_timeout(), Duration::from_secs(10));
    assert_eq!(cfg.judge.model, "gpt-4-turbo");
    assert_eq!(cfg.judge.retry_policy().max_attempts, 5);
    assert!(!cfg.judge.retry_policy().jitter);
    assert_eq!(cfg.scoring.withheld_below_words, 40);
    assert_eq!(cfg.scoring.rubric, Rubric::business_weighted());
    assert!(cfg.policy.enforce_active_quest);
    assert_eq!(cfg.quests[0].difficulty, Difficulty::Hard);
    assert_eq!(cfg.quests[0].date.map(|d| d.to_string()).as_deref(), Some("2026-10-19"));
    assert_eq!(cfg.users[0].display_name, "Aki");
  }
}
