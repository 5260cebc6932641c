use std::error::Error;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Action {
    Reward,
    Penalty,
}

impl Action {
    /// `R` (any case) rewards. Every other code is taken as a penalty.
    pub fn from_code(code: &str) -> Action {
        if code.trim().eq_ignore_ascii_case("R") {
            Action::Reward
        } else {
            Action::Penalty
        }
    }

    pub fn code(self) -> char {
        match self {
            Action::Reward => 'R',
            Action::Penalty => 'P',
        }
    }

    /// New score once this action is applied. Penalties never go below zero.
    pub fn apply(self, score: f64, amount: f64) -> f64 {
        match self {
            Action::Reward => score + amount,
            Action::Penalty => (score - amount).max(0.0),
        }
    }
}

/// A parsed `<ACTION>,<studentId>,<amount>` evaluation command.
#[derive(Clone, Debug, PartialEq)]
pub struct Command {
    pub action: Action,
    pub student_id: String,
    pub amount: f64,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CommandError {
    /// Fewer than three fields.
    Malformed(String),
    /// The amount is not a finite number.
    InvalidAmount(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CommandError::Malformed(raw) => write!(f, "Malformed evaluation command: {raw}"),
            CommandError::InvalidAmount(raw) => {
                write!(f, "Invalid amount in scheduled command: {raw}")
            }
        }
    }
}

impl Error for CommandError {}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(raw: &str) -> Result<Command, CommandError> {
        let mut fields = raw.split(',').collect::<Vec<_>>();
        // Trailing empty fields do not count.
        while fields.last() == Some(&"") {
            fields.pop();
        }
        if fields.len() < 3 {
            return Err(CommandError::Malformed(raw.to_owned()));
        }
        let amount = fields[2]
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|a| a.is_finite())
            .ok_or_else(|| CommandError::InvalidAmount(raw.to_owned()))?;
        Ok(Command {
            action: Action::from_code(fields[0]),
            student_id: fields[1].trim().to_owned(),
            amount,
        })
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{},{},{:?}", self.action.code(), self.student_id, self.amount)
    }
}
