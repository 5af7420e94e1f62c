//! Reward step: grants XP/coins on open and completes by itself.

use std::time::Duration;

use super::{ExerciseHost, ExerciseKind, HostContext, LearnerInput, Outcome};
use crate::domain::Reward;
use crate::error::LessonResult;
use crate::presenter::View;

const DISPLAY_DELAY: Duration = Duration::from_secs(3);

pub struct RewardHost {
  id: String,
  reward: Reward,
}

impl RewardHost {
  pub fn new(step: usize, reward: Reward) -> Self {
    Self { id: format!("reward_{step}"), reward }
  }
}

impl ExerciseHost for RewardHost {
  fn kind(&self) -> ExerciseKind { ExerciseKind::Reward }

  fn exercise_id(&self) -> &str { &self.id }

  fn begin(&mut self, cx: &mut HostContext<'_>) -> LessonResult<Outcome> {
    cx.presenter.show_view(View::Reward);
    cx.presenter.show_prompt(
      "Поздравляем!",
      &format!("+{} опыта\n+{} монет", self.reward.xp, self.reward.coins),
    );
    cx.ledger.add_reward(self.reward);
    cx.presenter.show_stats(cx.ledger.xp(), cx.ledger.coins());
    Ok(Outcome::Correct)
  }

  fn handle(&mut self, _input: &LearnerInput, _cx: &mut HostContext<'_>) -> Outcome {
    Outcome::Pending
  }

  fn feedback_delay(&self) -> Duration { DISPLAY_DELAY }

  fn reward(&self) -> Option<Reward> { Some(self.reward) }
}
