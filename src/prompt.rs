//! Judge-facing instruction document.
//!
//! The rubric text is a constant. Only the topic, bounds, essay and feedback
//! language are substituted, so any change in judge behaviour caused by wording
//! shows up as a diff of `RUBRIC_TEMPLATE`.

use crate::util::fill_template;

/// Placeholder used when the quest has no explicit question.
pub const NO_TOPIC_PLACEHOLDER: &str =
  "(No explicit question provided. Evaluate the essay as a business English response.)";

/// Language the judge is asked to write feedback in unless configured otherwise.
pub const DEFAULT_FEEDBACK_LANGUAGE: &str = "English";

const RUBRIC_TEMPLATE: &str = r#"You are an expert English business writing evaluator.
Your task is to score the user's essay based on the provided "Question" and "Essay".
Score the essay on the following 4 dimensions (0-25 points each).

---
### SCORING CRITERIA

1. Grammar (0-25)
   - Grammatical correctness, spelling and punctuation.
   - Deduct points for basic errors (subject-verb agreement, tense) that impede understanding.

2. Logic (0-25)
   - Structure and coherence: is there a clear introduction, body and conclusion?
   - Argument validity: are the claims supported and the ideas logically connected?

3. Context (0-25)
   - Topical relevance: does the essay directly answer the given question?
   - An off-topic essay must score low here.

4. Fluency (0-25)
   - Naturalness and tone appropriate for a business setting.
   - Cohesion: are transitions used effectively to connect sentences?

---
QUESTION:
{topic}

WORD COUNT REQUIREMENT: {min_words}-{max_words}

---
ESSAY:
{essay}

---
Return ONLY a JSON object with exactly these keys:
{"grammar": <0-25>, "logic": <0-25>, "context": <0-25>, "fluency": <0-25>, "feedback": "<feedback>"}
The feedback must be at most 3 sentences, written in {language}."#;

/// Build the instruction document with the default feedback language.
pub fn build_prompt(topic: Option<&str>, essay: &str, min_words: u32, max_words: u32) -> String {
  build_prompt_in(topic, essay, min_words, max_words, DEFAULT_FEEDBACK_LANGUAGE)
}

/// Build the instruction document asking for feedback in `language`.
pub fn build_prompt_in(
  topic: Option<&str>,
  essay: &str,
  min_words: u32,
  max_words: u32,
  language: &str,
) -> String {
  let topic = topic.map(str::trim).filter(|t| !t.is_empty()).unwrap_or(NO_TOPIC_PLACEHOLDER);
  let min = min_words.to_string();
  let max = max_words.to_string();
  fill_template(
    RUBRIC_TEMPLATE,
    &[
      ("topic", topic),
      ("min_words", &min),
      ("max_words", &max),
      ("essay", essay),
      ("language", language),
    ],
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn includes_topic_bounds_essay_and_format() {
    let p = build_prompt(Some("Pitch a new product"), "My essay body.", 120, 250);
    assert!(p.contains("QUESTION:\nPitch a new product"));
    assert!(p.contains("WORD COUNT REQUIREMENT: 120-250"));
    assert!(p.contains("ESSAY:\nMy essay body."));
    for key in ["\"grammar\"", "\"logic\"", "\"context\"", "\"fluency\"", "\"feedback\""] {
      assert!(p.contains(key), "missing {key}");
    }
    assert!(p.contains("written in English"));
  }

  #[test]
  fn missing_or_blank_topic_uses_placeholder() {
    assert!(build_prompt(None, "x", 1, 2).contains(NO_TOPIC_PLACEHOLDER));
    assert!(build_prompt(Some("   "), "x", 1, 2).contains(NO_TOPIC_PLACEHOLDER));
  }

  #[test]
  fn rubric_is_identical_across_inputs() {
    let a = build_prompt(Some("A"), "first", 10, 20);
    let b = build_prompt(Some("B"), "second", 30, 40);
    let head = |s: &str| s.split("QUESTION:").next().unwrap_or_default().to_string();
    assert_eq!(head(&a), head(&b));
  }

  #[test]
  fn essay_placeholders_are_not_expanded() {
    let p = build_prompt(Some("T"), "I wrote {topic} literally", 1, 2);
    assert!(p.contains("I wrote {topic} literally"));
  }

  #[test]
  fn feedback_language_is_substituted() {
    let p = build_prompt_in(None, "x", 1, 2, "Japanese");
    assert!(p.contains("written in Japanese."));
  }
}
