//! Answer evaluation for every exercise kind. Pure functions, no side effects.
//!
//! Malformed or empty learner input always evaluates to "incorrect"; nothing
//! in here returns an error.

use crate::domain::{ImageChoiceExercise, ParticleExercise, PronunciationExercise, SentenceExercise};
use crate::util::normalize_phrase;

/// Similarity above which a recognised phrase counts as the expected one.
pub const TEXT_SIMILARITY_THRESHOLD: f32 = 0.7;

const EXACT_MATCH_SCORE: f32 = 1.0;
const CONTAINMENT_SCORE: f32 = 0.8;

/// Word cards have no failure state: pressing "remember" is the answer.
pub fn evaluate_word_learning() -> bool {
  true
}

/// Exact match after joining the picked words, ignoring case and surrounding whitespace.
pub fn evaluate_sentence(submitted: &[String], exercise: &SentenceExercise) -> bool {
  let words: Vec<&str> = submitted
    .iter()
    .map(|w| w.trim())
    .filter(|w| !w.is_empty())
    .collect();
  if words.is_empty() {
    return false;
  }
  let expected = normalize_phrase(&exercise.correct_foreign);
  !expected.is_empty() && normalize_phrase(&words.join(" ")) == expected
}

pub fn evaluate_particle(answered_yes: bool, exercise: &ParticleExercise) -> bool {
  answered_yes == exercise.requires_particle
}

/// Accuracy must reach the threshold and the recognised text must resemble the phrase.
pub fn evaluate_pronunciation(
  accuracy: f32,
  spoken_text: &str,
  exercise: &PronunciationExercise,
  default_required: f32,
) -> bool {
  let required = exercise.required_accuracy.unwrap_or(default_required);
  accuracy >= required && pronunciation_text_matches(spoken_text, &exercise.foreign_phrase)
}

/// Text half of the pronunciation check.
pub fn pronunciation_text_matches(spoken_text: &str, expected_phrase: &str) -> bool {
  let spoken = normalize_phrase(spoken_text);
  let expected = normalize_phrase(expected_phrase);
  if spoken.is_empty() || expected.is_empty() {
    return false;
  }
  spoken.contains(&expected)
    || expected.contains(&spoken)
    || text_similarity(&expected, &spoken) > TEXT_SIMILARITY_THRESHOLD
}

pub fn evaluate_image_choice(selected_label: &str, exercise: &ImageChoiceExercise) -> bool {
  !selected_label.is_empty() && selected_label == exercise.correct_label
}

/// Word-overlap similarity in [0, 1].
///
/// Exact match scores 1.0 and containment 0.8. Otherwise a word of one
/// phrase matches when it equals, contains or is contained by some word of
/// the other; the matches are divided by the longer word count. The match
/// count is taken in both directions and the smaller one kept, so
/// `text_similarity(a, b) == text_similarity(b, a)`.
pub fn text_similarity(a: &str, b: &str) -> f32 {
  let a = normalize_phrase(a);
  let b = normalize_phrase(b);
  if a.is_empty() || b.is_empty() {
    return 0.0;
  }
  if a == b {
    return EXACT_MATCH_SCORE;
  }
  if a.contains(&b) || b.contains(&a) {
    return CONTAINMENT_SCORE;
  }

  let words_a: Vec<&str> = a.split_whitespace().collect();
  let words_b: Vec<&str> = b.split_whitespace().collect();
  let matched = matching_words(&words_a, &words_b).min(matching_words(&words_b, &words_a));
  matched as f32 / words_a.len().max(words_b.len()) as f32
}

fn matching_words(from: &[&str], against: &[&str]) -> usize {
  from
    .iter()
    .filter(|w1| against.iter().any(|w2| w1 == &w2 || w1.contains(*w2) || w2.contains(**w1)))
    .count()
}
