pub use self::command::{Action, Command};
pub use self::queue::{EvaluationQueue, NO_EVALUATIONS, Outcome, apply_now, penalize, reward};

mod command;
mod queue;
