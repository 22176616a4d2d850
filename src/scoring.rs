//! Score normalization and deterministic rule corrections.
//!
//! Two stages, always in this order:
//!   A. `normalize`: fold the four judge dimensions into a 0..=100 total.
//!   B. `correct`: word-count penalties, then the withheld override for
//!      degenerate (too short) essays. The override wins over the penalties.

use serde::{Deserialize, Serialize};

use crate::domain::{RawScores, Scores, WITHHELD_TOTAL};
use crate::wordcount::count_words;

/// Each dimension is scored 0..=25 by the judge.
pub const DIMENSION_MAX: f64 = 25.0;
pub const TOTAL_MAX: i32 = 100;

/// How the four dimensions become a total.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rubric {
  /// total = grammar + logic + context + fluency
  SimpleSum,
  /// Each dimension rescaled to 0..=100, then combined with these weights.
  Weighted {
    grammar: f64,
    logic: f64,
    context: f64,
    fluency: f64,
  },
}

impl Default for Rubric {
  fn default() -> Self { Rubric::SimpleSum }
}

impl Rubric {
  /// The alternate weighting seen in earlier iterations of the product.
  pub fn business_weighted() -> Self {
    Rubric::Weighted { grammar: 0.25, logic: 0.30, context: 0.25, fluency: 0.20 }
  }

  fn combine(&self, raw: &RawScores) -> f64 {
    match self {
      Rubric::SimpleSum => raw.grammar + raw.logic + raw.context + raw.fluency,
      Rubric::Weighted { grammar, logic, context, fluency } => {
        let scale = f64::from(TOTAL_MAX) / DIMENSION_MAX;
        (raw.grammar * grammar + raw.logic * logic + raw.context * context + raw.fluency * fluency) * scale
      }
    }
  }
}

/// Rubric choice plus the rule-correction constants.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringRules {
  pub rubric: Rubric,
  /// Deducted when the essay is shorter than the quest minimum.
  pub under_min_penalty: i32,
  /// Deducted when the essay is longer than the quest maximum.
  pub over_max_penalty: i32,
  /// Essays below this many words are not scored at all.
  pub withheld_below_words: u32,
}

impl Default for ScoringRules {
  fn default() -> Self {
    Self {
      rubric: Rubric::SimpleSum,
      under_min_penalty: 5,
      over_max_penalty: 3,
      withheld_below_words: 50,
    }
  }
}

impl ScoringRules {
  /// Stage A: combine dimensions, round, clamp to 0..=100.
  pub fn normalize(&self, raw: &RawScores) -> Scores {
    let combined = self.rubric.combine(raw);
    let total = if combined.is_finite() {
      (combined.round() as i64).clamp(0, i64::from(TOTAL_MAX)) as i32
    } else {
      0
    };
    Scores {
      grammar: raw.grammar,
      logic: raw.logic,
      context: raw.context,
      fluency: raw.fluency,
      total,
      is_correct: true,
    }
  }

  /// Stage B: band penalties (floored at 0), then the withheld override.
  pub fn correct(&self, scores: Scores, essay: &str, min_words: u32, max_words: u32) -> Scores {
    let words = count_words(essay);

    if words < self.withheld_below_words {
      return Scores { total: WITHHELD_TOTAL, is_correct: false, ..scores };
    }

    let mut total = scores.total;
    if words < min_words {
      total = (total - self.under_min_penalty).max(0);
    }
    if words > max_words {
      total = (total - self.over_max_penalty).max(0);
    }
    Scores { total, ..scores }
  }

  /// Both stages in order.
  pub fn score(&self, raw: &RawScores, essay: &str, min_words: u32, max_words: u32) -> Scores {
    self.correct(self.normalize(raw), essay, min_words, max_words)
  }
}

/// Stage A with the default simple-sum rubric.
pub fn normalize_total_score(raw: &RawScores) -> Scores {
  ScoringRules::default().normalize(raw)
}

/// Stage B with the default penalties and withheld floor.
pub fn apply_rule_correction(scores: Scores, essay: &str, min_words: u32, max_words: u32) -> Scores {
  ScoringRules::default().correct(scores, essay, min_words, max_words)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn raw(g: f64, l: f64, c: f64, f: f64) -> RawScores {
    RawScores { grammar: g, logic: l, context: c, fluency: f, feedback: String::new() }
  }

  fn essay(words: usize) -> String {
    vec!["word"; words].join(" ")
  }

  #[test]
  fn total_is_rounded_sum() {
    for (g, l, c, f) in [(0.0, 0.0, 0.0, 0.0), (25.0, 25.0, 25.0, 25.0), (20.0, 22.0, 18.0, 19.0), (7.0, 13.0, 1.0, 24.0)] {
      let s = normalize_total_score(&raw(g, l, c, f));
      assert_eq!(s.total, (g + l + c + f).round() as i32);
      assert!(s.is_correct);
    }
    assert_eq!(normalize_total_score(&raw(10.4, 10.4, 0.0, 0.0)).total, 21);
    assert_eq!(normalize_total_score(&raw(10.1, 10.1, 0.0, 0.0)).total, 20);
  }

  #[test]
  fn total_is_clamped() {
    assert_eq!(normalize_total_score(&raw(30.0, 30.0, 30.0, 30.0)).total, 100);
    assert_eq!(normalize_total_score(&raw(-10.0, 0.0, 0.0, 0.0)).total, 0);
    assert_eq!(normalize_total_score(&raw(f64::NAN, 1.0, 1.0, 1.0)).total, 0);
  }

  #[test]
  fn dimensions_are_carried_through_unchanged() {
    let s = normalize_total_score(&raw(20.0, 22.0, 18.0, 19.0));
    assert_eq!((s.grammar, s.logic, s.context, s.fluency), (20.0, 22.0, 18.0, 19.0));
  }

  #[test]
  fn weighted_rubric_scales_dimensions() {
    let rules = ScoringRules { rubric: Rubric::business_weighted(), ..ScoringRules::default() };
    assert_eq!(rules.normalize(&raw(25.0, 25.0, 25.0, 25.0)).total, 100);
    // 4 * (20*.25 + 10*.30 + 15*.25 + 5*.20) = 4 * 12.75 = 51
    assert_eq!(rules.normalize(&raw(20.0, 10.0, 15.0, 5.0)).total, 51);
  }

  #[test]
  fn short_essays_are_always_withheld() {
    for words in [0, 1, 30, 49] {
      for r in [raw(25.0, 25.0, 25.0, 25.0), raw(0.0, 0.0, 0.0, 0.0)] {
        let s = apply_rule_correction(normalize_total_score(&r), &essay(words), 10, 20);
        assert_eq!(s.total, -1, "words={words}");
        assert!(!s.is_correct);
        assert!(s.is_withheld());
      }
    }
    // Also wins over the band penalties.
    let s = apply_rule_correction(normalize_total_score(&raw(20.0, 20.0, 20.0, 20.0)), &essay(40), 150, 200);
    assert_eq!(s.total, -1);
  }

  #[test]
  fn under_minimum_deducts_five() {
    let base = normalize_total_score(&raw(20.0, 22.0, 18.0, 19.0));
    let s = apply_rule_correction(base.clone(), &essay(60), 150, 200);
    assert_eq!(s.total, base.total - 5);
    assert!(s.is_correct);

    let low = normalize_total_score(&raw(1.0, 1.0, 1.0, 0.0));
    assert_eq!(apply_rule_correction(low, &essay(60), 150, 200).total, 0);
  }

  #[test]
  fn over_maximum_deducts_three() {
    let base = normalize_total_score(&raw(20.0, 22.0, 18.0, 19.0));
    assert_eq!(apply_rule_correction(base.clone(), &essay(250), 150, 200).total, base.total - 3);

    let low = normalize_total_score(&raw(1.0, 1.0, 0.0, 0.0));
    assert_eq!(apply_rule_correction(low, &essay(250), 150, 200).total, 0);
  }

  #[test]
  fn within_band_is_untouched() {
    let base = normalize_total_score(&raw(20.0, 22.0, 18.0, 19.0));
    for words in [150, 175, 200] {
      assert_eq!(apply_rule_correction(base.clone(), &essay(words), 150, 200), base);
    }
  }

  #[test]
  fn custom_constants_apply() {
    let rules = ScoringRules { under_min_penalty: 10, withheld_below_words: 5, ..ScoringRules::default() };
    let s = rules.score(&raw(10.0, 10.0, 10.0, 10.0), &essay(6), 100, 200);
    assert_eq!(s.total, 30);
  }

  #[test]
  fn rubric_deserializes_from_toml() {
    let rules: ScoringRules = toml::from_str(
      "under_min_penalty = 4\n[rubric]\nkind = \"weighted\"\ngrammar = 0.25\nlogic = 0.3\ncontext = 0.25\nfluency = 0.2\n",
    )
    .unwrap();
    assert_eq!(rules.rubric, Rubric::business_weighted());
    assert_eq!(rules.under_min_penalty, 4);
    assert_eq!(rules.over_max_penalty, 3);
  }
}
