use thiserror::Error;

use crate::question::Tier;

/// Rejections of user input or out-of-order calls. None of these change state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("please enter your answer")]
    EmptyAnswer,
    #[error("'{0}' is not a number")]
    NotANumber(String),
    #[error("level {0} is locked")]
    TierLocked(Tier),
    #[error("this question has already been answered")]
    AlreadyAnswered,
    #[error("no question is waiting for an answer")]
    NoPendingQuestion,
    #[error("answer the current question first")]
    QuestionUnresolved,
    #[error("no level is in progress")]
    NoActiveRun,
    #[error("the level still has unanswered questions")]
    RunNotFinished,
    #[error("press 'n' for a new question first")]
    NoQuestion,
    #[error("the daily goal must be at least 1")]
    InvalidDailyGoal,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("progress storage i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored progress is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Parse a typed answer the way the quiz compares it: trimmed, numeric, finite.
pub fn parse_answer(raw: &str) -> Result<f64, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyAnswer);
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ValidationError::NotANumber(trimmed.to_string())),
    }
}
