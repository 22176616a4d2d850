//! Application state: the in-memory store, the scoring orchestrator and config.
//!
//! This module owns:
//!   - seeding quests and users (config first, built-ins as fallback)
//!   - choosing the judge: OpenAI when a key is present, otherwise a judge
//!     that fails every call so submissions still end in a terminal status

use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::config::{load_app_config_from_env, AppConfig};
use crate::judge::{openai::OpenAI, Judge, JudgeClient, UnavailableJudge};
use crate::orchestrator::SubmissionOrchestrator;
use crate::quest::today_jst;
use crate::seeds::{builtin_quest, builtin_users, quest_from_cfg};
use crate::store::{MemoryStore, QuestStore, UserStore};

pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<MemoryStore>,
    pub orchestrator: Arc<SubmissionOrchestrator>,
    pub judge_enabled: bool,
}

impl AppState {
    /// Build state from env: load config, pick the judge, seed the store.
    #[instrument(level = "info", skip_all)]
    pub async fn from_env() -> Self {
        let config = load_app_config_from_env().unwrap_or_default();

        match OpenAI::from_env(&config.judge) {
            Some(oa) => {
                info!(target: "writing_quest", base_url = %oa.base_url, model = %oa.model, "OpenAI judge enabled.");
                let judge = JudgeClient::new(oa, &config.judge);
                Self::build(config, Arc::new(judge), true).await
            }
            None => {
                warn!(target: "writing_quest", "OpenAI disabled (no OPENAI_API_KEY). Submissions will fail scoring.");
                Self::build(config, Arc::new(UnavailableJudge), false).await
            }
        }
    }

    /// Assemble state around an explicit judge. Used by `from_env` and tests.
    pub async fn build(config: AppConfig, judge: Arc<dyn Judge>, judge_enabled: bool) -> Self {
        let store = Arc::new(MemoryStore::new());
        seed_store(&store, &config).await;

        let orchestrator = SubmissionOrchestrator::new(judge, store.clone(), store.clone(), store.clone())
            .with_rules(config.scoring.clone())
            .with_policy(config.policy.clone())
            .with_deadline(config.judge.deadline());
        let orchestrator = Arc::new(orchestrator);

        Self { config, store, orchestrator, judge_enabled }
    }
}

async fn seed_store(store: &MemoryStore, config: &AppConfig) {
    let today = today_jst();

    for cfg in &config.quests {
        let quest = quest_from_cfg(cfg, today);
        let id = quest.id.clone();
        if let Err(e) = store.upsert_quest(quest).await {
            error!(target: "writing_quest", %id, error = %e, "Skipping config quest");
        }
    }

    // Always have a quest for today, but don't shadow one from config.
    match store.daily_quest(today).await {
        Ok(Some(q)) => info!(target: "writing_quest", id = %q.id, %today, "Today's quest from config"),
        _ => {
            let q = builtin_quest(today);
            info!(target: "writing_quest", id = %q.id, %today, "Seeding built-in quest for today");
            if let Err(e) = store.upsert_quest(q).await {
                error!(target: "writing_quest", error = %e, "Built-in quest rejected");
            }
        }
    }

    let users = if config.users.is_empty() { builtin_users() } else { config.users.clone() };
    for u in &users {
        if let Err(e) = store.upsert_user(&u.id, &u.display_name, &u.email).await {
            error!(target: "writing_quest", id = %u.id, error = %e, "Skipping config user");
        }
    }
    info!(target: "writing_quest", quests = config.quests.len(), users = users.len(), "Startup seed complete");
}
