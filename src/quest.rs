//! Quest calendar helpers: the UTC+9 authoring day and quest validation.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

use crate::domain::Quest;

/// Quests are authored against a fixed UTC+9 offset.
pub const AUTHORING_OFFSET_SECS: i32 = 9 * 3600;

/// Calendar date of `at` in the authoring zone.
pub fn authoring_date(at: DateTime<Utc>) -> NaiveDate {
  match FixedOffset::east_opt(AUTHORING_OFFSET_SECS) {
    Some(tz) => at.with_timezone(&tz).date_naive(),
    None => at.date_naive(),
  }
}

/// Today's date in the authoring zone.
pub fn today_jst() -> NaiveDate {
  authoring_date(Utc::now())
}

impl Quest {
  /// Reject quests that cannot be scored against.
  pub fn validate(&self) -> Result<(), String> {
    if self.id.trim().is_empty() {
      return Err("quest id must not be empty".into());
    }
    if self.title.trim().is_empty() {
      return Err("quest title must not be empty".into());
    }
    if self.prompt.trim().is_empty() {
      return Err("quest prompt must not be empty".into());
    }
    if self.word_count_min == 0 || self.word_count_max == 0 {
      return Err("word-count bounds must be positive".into());
    }
    if self.word_count_min > self.word_count_max {
      return Err(format!(
        "word_count_min ({}) exceeds word_count_max ({})",
        self.word_count_min, self.word_count_max
      ));
    }
    Ok(())
  }

  pub fn is_active_on(&self, date: NaiveDate) -> bool {
    self.is_active && self.date == date
  }
}
