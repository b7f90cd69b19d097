use rand::Rng;

use crate::error::{parse_answer, ValidationError};
use crate::question::{generate, table_question, OperatorFilter, Question, Tier, TABLE_BASES};
use crate::session::{AnswerOutcome, Resolution, Session};

/// What an untimed drill asks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrillKind {
    Practice { tier: Tier, filter: OperatorFilter },
    Tables { base: i64 },
}

impl DrillKind {
    pub fn practice() -> Self {
        DrillKind::Practice {
            tier: Tier::FIRST,
            filter: OperatorFilter::Any,
        }
    }

    pub fn tables() -> Self {
        DrillKind::Tables {
            base: *TABLE_BASES.start(),
        }
    }
}

/// Free practice and times-table drills: one question at a time, no timer,
/// each resolved answer counts toward the daily total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drill {
    kind: DrillKind,
    current: Option<Question>,
    answered: bool,
    correct: u32,
    wrong: u32,
}

impl Drill {
    pub fn new(kind: DrillKind) -> Self {
        Self {
            kind,
            current: None,
            answered: false,
            correct: 0,
            wrong: 0,
        }
    }

    pub fn kind(&self) -> DrillKind {
        self.kind
    }

    /// Changing the selection takes effect on the next question.
    pub fn set_kind(&mut self, kind: DrillKind) {
        self.kind = kind;
    }

    pub fn current(&self) -> Option<&Question> {
        self.current.as_ref()
    }

    pub fn is_answered(&self) -> bool {
        self.answered
    }

    pub fn correct(&self) -> u32 {
        self.correct
    }

    pub fn wrong(&self) -> u32 {
        self.wrong
    }

    pub fn new_question<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &Question {
        let question = match self.kind {
            DrillKind::Practice { tier, filter } => generate(tier, filter, rng),
            DrillKind::Tables { base } => table_question(base, rng),
        };
        self.answered = false;
        self.current.insert(question)
    }

    /// Checks `raw` against the current question and records the attempt on `session`.
    pub fn check(
        &mut self,
        raw: &str,
        session: &mut Session,
    ) -> Result<AnswerOutcome, ValidationError> {
        let question = self.current.as_ref().ok_or(ValidationError::NoQuestion)?;
        if self.answered {
            return Err(ValidationError::AlreadyAnswered);
        }
        let value = parse_answer(raw)?;
        let resolution = if question.is_correct(value) {
            self.correct += 1;
            Resolution::Correct
        } else {
            self.wrong += 1;
            Resolution::Wrong
        };
        let correct_answer = question.answer();
        self.answered = true;
        session.record_daily_attempt();
        Ok(AnswerOutcome {
            resolution,
            correct_answer,
        })
    }

    pub fn reset(&mut self) {
        *self = Drill::new(self.kind);
    }
}
