//! Judge reply parsing.
//!
//! The judge may wrap its JSON in prose or code fences. We take the first
//! balanced `{...}` span that parses as a JSON object. Dimension coercion is
//! explicit: a missing, null, non-numeric or non-finite dimension becomes 0 and
//! is logged, so a single malformed field never throws away usable feedback.

use serde_json::{Map, Value};
use tracing::warn;

use super::JudgeError;
use crate::domain::RawScores;
use crate::util::trunc_for_log;

pub const DIMENSIONS: [&str; 4] = ["grammar", "logic", "context", "fluency"];

/// Byte span of the balanced object starting at `start` (which must be a `{`).
fn balanced_object_end(text: &str, start: usize) -> Option<usize> {
  let mut depth = 0usize;
  let mut in_string = false;
  let mut escaped = false;
  for (offset, ch) in text[start..].char_indices() {
    if in_string {
      match ch {
        _ if escaped => escaped = false,
        '\\' => escaped = true,
        '"' => in_string = false,
        _ => {}
      }
      continue;
    }
    match ch {
      '"' => in_string = true,
      '{' => depth += 1,
      '}' => {
        depth = depth.checked_sub(1)?;
        if depth == 0 {
          return Some(start + offset + 1);
        }
      }
      _ => {}
    }
  }
  None
}

/// First top-level JSON object embedded in `text`.
pub fn first_json_object(text: &str) -> Option<Map<String, Value>> {
  let mut from = 0;
  while let Some(rel) = text[from..].find('{') {
    let start = from + rel;
    match balanced_object_end(text, start) {
      Some(end) => {
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&text[start..end]) {
          return Some(map);
        }
        from = start + 1;
      }
      // Unbalanced stray brace: keep scanning after it.
      None => from = start + 1,
    }
  }
  None
}

/// Coerce one dimension. Accepts numbers and numeric strings.
fn coerce_dimension(value: Option<&Value>) -> Option<f64> {
  let n = match value? {
    Value::Number(n) => n.as_f64()?,
    Value::String(s) => s.trim().parse::<f64>().ok()?,
    _ => return None,
  };
  n.is_finite().then_some(n)
}

/// Parse a judge reply into raw scores.
pub fn parse_judge_reply(text: &str) -> Result<RawScores, JudgeError> {
  let obj = first_json_object(text).ok_or_else(|| {
    JudgeError::Parse(format!("no JSON object in judge reply: {}", trunc_for_log(text.trim(), 200)))
  })?;

  let mut dims = [0.0f64; 4];
  for (slot, key) in dims.iter_mut().zip(DIMENSIONS) {
    match coerce_dimension(obj.get(key)) {
      Some(n) => *slot = n,
      None => {
        warn!(target: "scoring", field = key, raw = ?obj.get(key), "judge dimension missing or non-numeric; defaulting to 0");
      }
    }
  }

  let feedback = match obj.get("feedback") {
    Some(Value::String(s)) => s.trim().to_string(),
    _ => String::new(),
  };

  let [grammar, logic, context, fluency] = dims;
  Ok(RawScores { grammar, logic, context, fluency, feedback })
}
