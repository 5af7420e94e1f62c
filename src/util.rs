//! Small utility helpers used across modules.

/// Lower-case and trim a phrase for comparisons.
pub fn normalize_phrase(s: &str) -> String {
  s.trim().to_lowercase()
}

/// Join selected word-bank entries the way the sentence view displays them.
pub fn join_words(words: &[String]) -> String {
  words.join(" ")
}

/// Log-safe truncation for long strings (char-boundary aware).
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.chars().count() <= max {
    s.to_string()
  } else {
    let head: String = s.chars().take(max).collect();
    format!("{}… ({} chars total)", head, s.chars().count())
  }
}

/// Format a [0, 1] accuracy as a whole percentage.
pub fn percent(value: f32) -> String {
  format!("{:.0}%", value * 100.0)
}
