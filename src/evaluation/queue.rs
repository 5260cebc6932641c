use super::{Action, Command};
use crate::model::Registry;
use std::collections::VecDeque;
use std::fmt;
use tracing::{debug, instrument};

pub const NO_EVALUATIONS: &str = "No scheduled evaluations.";

/// What processing a single queued command did. Displays as the report
/// shown to the user.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// Nothing was pending.
    Idle,
    /// The score of a student has been updated.
    Applied(String),
    /// The command was dropped without touching any score.
    Rejected(String),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Outcome::Idle => write!(f, "{NO_EVALUATIONS}"),
            Outcome::Applied(report) | Outcome::Rejected(report) => write!(f, "{report}"),
        }
    }
}

/// Evaluation commands waiting to be applied, oldest first.
///
/// Commands are kept verbatim and only parsed when processed: a malformed
/// command is reported and dropped at that point, and processing moves on.
#[derive(Debug, Default)]
pub struct EvaluationQueue {
    pending: VecDeque<String>,
}

impl EvaluationQueue {
    pub fn new() -> EvaluationQueue {
        EvaluationQueue::default()
    }

    pub fn schedule(&mut self, command: impl Into<String>) {
        let command = command.into();
        debug!(%command, "evaluation scheduled");
        self.pending.push_back(command);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending(&self) -> impl Iterator<Item = &str> {
        self.pending.iter().map(String::as_str)
    }

    /// Apply the oldest command and describe the outcome.
    #[instrument(skip_all)]
    pub fn process_next(&mut self, registry: &mut Registry) -> Outcome {
        let Some(raw) = self.pending.pop_front() else {
            return Outcome::Idle;
        };
        let outcome = match raw.parse::<Command>() {
            Ok(command) => execute(registry, &command),
            Err(e) => Outcome::Rejected(e.to_string()),
        };
        debug!(command = %raw, %outcome, "evaluation processed");
        outcome
    }

    /// Process commands until the queue is empty, returning one report per
    /// command in queue order.
    pub fn process_all(&mut self, registry: &mut Registry) -> Vec<Outcome> {
        let mut results = Vec::with_capacity(self.pending.len());
        while !self.pending.is_empty() {
            results.push(self.process_next(registry));
        }
        results
    }
}

fn execute(registry: &mut Registry, command: &Command) -> Outcome {
    let Some(student) = registry.find_student_mut(&command.student_id) else {
        return Outcome::Rejected(format!("Student not found: {}", command.student_id));
    };
    let score = command
        .action
        .apply(student.performance_score(), command.amount);
    student.set_performance_score(score);
    let verb = match command.action {
        Action::Reward => "Rewarded",
        Action::Penalty => "Penalized",
    };
    Outcome::Applied(format!(
        "{verb} {} by {:?}. New score: {:?}",
        command.student_id,
        command.amount,
        student.performance_score()
    ))
}

/// Apply an evaluation right away, bypassing the queue.
pub fn apply_now(registry: &mut Registry, action: Action, student_id: &str, amount: f64) -> String {
    let Some(student) = registry.find_student_mut(student_id) else {
        return format!("Student not found: {}", student_id.trim());
    };
    let score = match action {
        Action::Reward => student.reward(amount),
        Action::Penalty => student.penalize(amount),
    };
    match action {
        Action::Reward => format!("Reward applied. New score: {score:?}"),
        Action::Penalty => format!("Penalty applied. New score: {score:?}"),
    }
}

pub fn reward(registry: &mut Registry, student_id: &str, amount: f64) -> String {
    apply_now(registry, Action::Reward, student_id, amount)
}

pub fn penalize(registry: &mut Registry, student_id: &str, amount: f64) -> String {
    apply_now(registry, Action::Penalty, student_id, amount)
}
