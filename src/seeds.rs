//! Built-in lesson: the "want" lesson content and the NPC script that drives it.
//!
//! Used whenever no lesson file is configured, so the server is useful out of the box.

use crate::domain::{
  AssetRef, DialogAction, DialogStep, ImageChoiceExercise, LessonContent, ParticleExercise, PronunciationExercise,
  SentenceExercise, WordCard,
};

pub const GUIDE: &str = "Гид";

fn bank(words: &[&str]) -> Vec<String> {
  words.iter().map(|w| w.to_string()).collect()
}

/// Exercise material for the first café lesson.
pub fn default_lesson_content() -> LessonContent {
  LessonContent {
    words: vec![WordCard {
      foreign_term: "want".into(),
      native_term: "хотеть".into(),
      audio: AssetRef::new("audio/words/want"),
      image: AssetRef::new("images/words/want"),
      category: "verbs".into(),
    }],
    sentences: vec![
      SentenceExercise {
        prompt_native: "Я хочу кофе".into(),
        correct_foreign: "I want coffee".into(),
        word_bank: bank(&["I", "want", "coffee", "to", "tea"]),
      },
      SentenceExercise {
        prompt_native: "Я хочу пить".into(),
        correct_foreign: "I want to drink".into(),
        word_bank: bank(&["I", "want", "to", "drink", "eat"]),
      },
      SentenceExercise {
        prompt_native: "Мы хотим есть".into(),
        correct_foreign: "We want to eat".into(),
        word_bank: bank(&["We", "want", "to", "eat", "I"]),
      },
      SentenceExercise {
        prompt_native: "Она хочет чай".into(),
        correct_foreign: "She wants tea".into(),
        word_bank: bank(&["She", "wants", "tea", "to", "want"]),
      },
    ],
    particles: vec![
      ParticleExercise {
        sentence_with_gap: "I want ____ coffee".into(),
        requires_particle: false,
        explanation: "После want сразу идёт существительное: I want coffee.".into(),
      },
      ParticleExercise {
        sentence_with_gap: "I want ____ drink".into(),
        requires_particle: true,
        explanation: "Перед глаголом после want нужна частица to: I want to drink.".into(),
      },
      ParticleExercise {
        sentence_with_gap: "We want ____ pizza".into(),
        requires_particle: false,
        explanation: "Pizza - существительное, частица to не нужна.".into(),
      },
      ParticleExercise {
        sentence_with_gap: "She wants ____ sleep".into(),
        requires_particle: true,
        explanation: "Sleep - глагол, поэтому wants to sleep.".into(),
      },
    ],
    pronunciations: vec![PronunciationExercise {
      foreign_phrase: "I want coffee".into(),
      native_translation: "Я хочу кофе".into(),
      reference_audio: AssetRef::new("audio/phrases/i_want_coffee"),
      required_accuracy: Some(0.7),
    }],
    image_choices: vec![ImageChoiceExercise {
      image: AssetRef::new("images/choices/coffee_cup"),
      correct_label: "I want coffee".into(),
      distractor_labels: bank(&["I want to coffee", "I wants coffee", "Me want coffee"]),
    }],
  }
}

/// The NPC script for `content`. One "continue" step is generated for every
/// particle exercise after the first.
pub fn default_script(content: &LessonContent) -> Vec<DialogStep> {
  use DialogAction::*;

  let mut steps = vec![
    DialogStep::line("Привет! Рад тебя видеть. Перед обедом заработаем первые очки опыта.", GUIDE),
    DialogStep::line("Чтобы сделать заказ на английском, сначала пройди несколько заданий.", GUIDE),
    DialogStep::line("Начнём с одного глагола. За него ты получишь первые монеты и опыт!", GUIDE),
    DialogStep::with_action("want - хотеть", GUIDE, StartWordLearning),
    DialogStep::with_action("Теперь повтори за мной, а я послушаю.", GUIDE, StartPronunciationExercise),
    DialogStep::line("Примеры:\nя хочу кофе - I want coffee\nя хочу пить - I want to drink", GUIDE),
    DialogStep::line("Заметь: перед глаголом после want появляется to.", GUIDE),
    DialogStep::with_action("Проверим правило! Выбери правильный перевод:", GUIDE, StartTranslationChoice),
    DialogStep::with_action("Первый квест: собери предложение из слов.", GUIDE, StartSentenceExercise),
    DialogStep::with_action("Молодец! Следующее предложение:", GUIDE, ContinueSentenceExercise),
    DialogStep::with_action("Отлично! Ещё одно:", GUIDE, ContinueSentenceExercise),
    DialogStep::with_action("Последнее предложение:", GUIDE, ContinueSentenceExercise),
    DialogStep::with_action("А теперь произнеси предложение вслух.", GUIDE, StartPronunciationExercise),
    DialogStep::with_action("Поздравляю! Первое задание выполнено!", GUIDE, ShowReward),
    DialogStep::line("Готов к следующему заданию?", GUIDE),
    DialogStep::with_action("Поставь частицу to там, где она нужна:", GUIDE, StartToExercise),
  ];

  for _ in content.particles.iter().skip(1) {
    steps.push(DialogStep::with_action("Следующее предложение:", GUIDE, ContinueToExercise));
  }

  steps.extend([
    DialogStep::with_action("Молодец! Повтори фразу ещё раз.", GUIDE, StartPronunciationExercise),
    DialogStep::with_action("Последний шаг: расставь слова по порядку.", GUIDE, FinalSentenceExercise),
    DialogStep::line("Ты справился!", GUIDE),
    DialogStep::with_action("Теперь можно идти и сделать первый заказ!", GUIDE, ShowFinalReward),
  ]);
  steps
}
