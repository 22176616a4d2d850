//! Whitespace word counting.

/// Number of maximal runs of non-whitespace characters in `text`.
pub fn count_words(text: &str) -> u32 {
  text.split_whitespace().count() as u32
}

#[cfg(test)]
mod tests {
  use super::count_words;

  #[test]
  fn empty_and_blank_are_zero() {
    assert_eq!(count_words(""), 0);
    assert_eq!(count_words("   "), 0);
    assert_eq!(count_words("\n\t \r\n"), 0);
  }

  #[test]
  fn runs_of_whitespace_collapse() {
    assert_eq!(count_words("a b  c"), 3);
    assert_eq!(count_words("  leading and trailing  "), 3);
    assert_eq!(count_words("line\nbreaks\tand tabs"), 4);
  }

  #[test]
  fn punctuation_stays_attached() {
    assert_eq!(count_words("Hello, world! -- done."), 4);
  }
}
