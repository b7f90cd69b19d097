use std::time::Duration;

use tracing::{debug, info};

use crate::clock::Clock;
use crate::error::{parse_answer, ValidationError};
use crate::progress::{accuracy_percent, DailyState, LevelProgress, Progress};
use crate::question::{OperatorFilter, Question, QuestionSource, Tier};
use crate::store::{load_or_default, persist, ProgressStore};
use crate::timer::Countdown;

pub const QUESTIONS_PER_LEVEL: usize = 125;
pub const QUESTION_TIME: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub questions_per_level: usize,
    pub question_time: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            questions_per_level: QUESTIONS_PER_LEVEL,
            question_time: QUESTION_TIME,
        }
    }
}

/// A missed question kept for the report and review
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrongAnswer {
    pub question: String,
    pub correct: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    InProgress(usize),
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Correct,
    Wrong,
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub resolution: Resolution,
    pub correct_answer: i64,
}

impl AnswerOutcome {
    pub fn is_correct(&self) -> bool {
        self.resolution == Resolution::Correct
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelReport {
    pub tier: Tier,
    pub total: u32,
    pub correct: u32,
    pub wrong: u32,
    pub accuracy: u8,
    pub best_accuracy: u8,
    pub newly_unlocked: Option<Tier>,
    pub wrong_list: Vec<WrongAnswer>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Next,
    Finished,
}

/// One timed pass through a tier's questions
#[derive(Debug, Clone)]
pub struct LevelRun {
    tier: Tier,
    total: usize,
    question_index: usize,
    correct: u32,
    wrong: u32,
    wrong_list: Vec<WrongAnswer>,
    current: Option<Question>,
    answered: bool,
    countdown: Countdown,
    report: Option<LevelReport>,
}

impl LevelRun {
    fn new(tier: Tier, total: usize) -> Self {
        Self {
            tier,
            total,
            question_index: 0,
            correct: 0,
            wrong: 0,
            wrong_list: Vec::new(),
            current: None,
            answered: false,
            countdown: Countdown::new(),
            report: None,
        }
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn question_index(&self) -> usize {
        self.question_index
    }

    pub fn correct_count(&self) -> u32 {
        self.correct
    }

    pub fn wrong_count(&self) -> u32 {
        self.wrong
    }

    pub fn wrong_list(&self) -> &[WrongAnswer] {
        &self.wrong_list
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.current.as_ref()
    }

    pub fn is_answered(&self) -> bool {
        self.answered
    }

    pub fn time_left(&self) -> Option<Duration> {
        self.countdown.remaining()
    }

    /// Accuracy over the questions resolved so far
    pub fn live_accuracy(&self) -> u8 {
        accuracy_percent(self.correct, self.wrong)
    }

    pub fn is_finished(&self) -> bool {
        self.question_index >= self.total
    }

    pub fn report(&self) -> Option<&LevelReport> {
        self.report.as_ref()
    }

    fn begin_question(&mut self, question: Question, budget: Duration) {
        self.current = Some(question);
        self.answered = false;
        self.countdown.start(budget);
    }

    fn resolve(&mut self, resolution: Resolution) -> Result<AnswerOutcome, ValidationError> {
        if self.answered {
            return Err(ValidationError::AlreadyAnswered);
        }
        let question = self
            .current
            .as_ref()
            .ok_or(ValidationError::NoPendingQuestion)?;
        let correct_answer = question.answer();
        if resolution == Resolution::Correct {
            self.correct += 1;
        } else {
            self.wrong += 1;
            self.wrong_list.push(WrongAnswer {
                question: question.text().to_string(),
                correct: correct_answer,
            });
        }
        self.answered = true;
        self.countdown.cancel();
        Ok(AnswerOutcome {
            resolution,
            correct_answer,
        })
    }
}

/// Owns the durable progress plus the level run in flight.
///
/// Every change to [`Progress`] is written back to the store as a whole blob.
pub struct Session {
    progress: Progress,
    store: Box<dyn ProgressStore>,
    clock: Box<dyn Clock>,
    questions: Box<dyn QuestionSource>,
    config: SessionConfig,
    run: Option<LevelRun>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("progress", &self.progress)
            .field("config", &self.config)
            .field("run", &self.run)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn open(
        store: Box<dyn ProgressStore>,
        clock: Box<dyn Clock>,
        questions: Box<dyn QuestionSource>,
        config: SessionConfig,
    ) -> Self {
        let progress = load_or_default(store.as_ref(), clock.today());
        // an empty run could never be advanced to its report
        let config = SessionConfig {
            questions_per_level: config.questions_per_level.max(1),
            ..config
        };
        Self {
            progress,
            store,
            clock,
            questions,
            config,
            run: None,
        }
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    pub fn level(&self, tier: Tier) -> LevelProgress {
        self.progress.level(tier)
    }

    pub fn daily(&self) -> &DailyState {
        &self.progress.daily
    }

    pub fn run(&self) -> Option<&LevelRun> {
        self.run.as_ref()
    }

    pub fn run_state(&self) -> RunState {
        match &self.run {
            None => RunState::NotStarted,
            Some(run) if run.is_finished() => RunState::Finished,
            Some(run) => RunState::InProgress(run.question_index),
        }
    }

    pub fn start_level(&mut self, tier: Tier) -> Result<(), ValidationError> {
        if !self.progress.is_unlocked(tier) {
            return Err(ValidationError::TierLocked(tier));
        }
        let mut run = LevelRun::new(tier, self.config.questions_per_level);
        let question = self.questions.next_question(tier, OperatorFilter::Any);
        run.begin_question(question, self.config.question_time);
        info!(tier = tier.number(), questions = run.total, "level started");
        self.run = Some(run);
        Ok(())
    }

    /// Abandons the current run without touching progress.
    pub fn quit_level(&mut self) -> bool {
        match self.run.take() {
            Some(run) => {
                info!(
                    tier = run.tier.number(),
                    at = run.question_index,
                    "level abandoned"
                );
                true
            }
            None => false,
        }
    }

    pub fn submit_answer(&mut self, raw: &str) -> Result<AnswerOutcome, ValidationError> {
        let run = self.active_run()?;
        if run.answered {
            return Err(ValidationError::AlreadyAnswered);
        }
        let question = run
            .current
            .as_ref()
            .ok_or(ValidationError::NoPendingQuestion)?;
        let value = parse_answer(raw)?;
        let resolution = if question.is_correct(value) {
            Resolution::Correct
        } else {
            Resolution::Wrong
        };
        self.resolve(resolution)
    }

    pub fn on_timeout(&mut self) -> Result<AnswerOutcome, ValidationError> {
        self.resolve(Resolution::TimedOut)
    }

    /// Drives the per-question countdown; returns the timeout outcome on the
    /// tick that expires it.
    pub fn tick(&mut self, elapsed: Duration) -> Option<AnswerOutcome> {
        let fired = self
            .run
            .as_mut()
            .filter(|run| !run.answered)
            .is_some_and(|run| run.countdown.tick(elapsed));
        if fired {
            self.on_timeout().ok()
        } else {
            None
        }
    }

    /// Moves past a resolved question. Leaving the last question finishes the level.
    pub fn advance(&mut self) -> Result<Advance, ValidationError> {
        let run = self.active_run()?;
        if !run.answered {
            return Err(ValidationError::QuestionUnresolved);
        }
        run.question_index += 1;
        run.current = None;
        if run.is_finished() {
            self.finish_level()?;
            return Ok(Advance::Finished);
        }
        let tier = run.tier;
        let question = self.questions.next_question(tier, OperatorFilter::Any);
        if let Some(run) = self.run.as_mut() {
            run.begin_question(question, self.config.question_time);
        }
        Ok(Advance::Next)
    }

    /// Folds a completed run into the durable progress and returns its report.
    pub fn finish_level(&mut self) -> Result<LevelReport, ValidationError> {
        let run = self.run.as_mut().ok_or(ValidationError::NoActiveRun)?;
        if run.report.is_some() {
            return Err(ValidationError::NoActiveRun);
        }
        if !run.is_finished() {
            return Err(ValidationError::RunNotFinished);
        }
        run.countdown.cancel();

        let accuracy = run.live_accuracy();
        let newly_unlocked = self.progress.complete_level(run.tier, accuracy);
        let report = LevelReport {
            tier: run.tier,
            total: run.correct + run.wrong,
            correct: run.correct,
            wrong: run.wrong,
            accuracy,
            best_accuracy: self.progress.level(run.tier).best_accuracy,
            newly_unlocked,
            wrong_list: run.wrong_list.clone(),
        };
        run.report = Some(report.clone());

        info!(
            tier = report.tier.number(),
            accuracy = report.accuracy,
            best = report.best_accuracy,
            "level finished"
        );
        if let Some(next) = newly_unlocked {
            info!(tier = next.number(), "level unlocked");
        }
        persist(self.store.as_ref(), &self.progress);
        Ok(report)
    }

    /// Counts one resolved attempt toward today's total, rolling the day over first.
    pub fn record_daily_attempt(&mut self) {
        let today = self.clock.today();
        self.progress.daily.record_attempt(today);
        persist(self.store.as_ref(), &self.progress);
    }

    /// Applies a pending day change so displays show today's numbers.
    pub fn refresh_day(&mut self) {
        let before = self.progress.daily;
        self.progress.daily.roll_over(self.clock.today());
        if self.progress.daily != before {
            persist(self.store.as_ref(), &self.progress);
        }
    }

    pub fn set_daily_goal(&mut self, goal: u32) -> Result<(), ValidationError> {
        if goal == 0 {
            return Err(ValidationError::InvalidDailyGoal);
        }
        if self.progress.daily.daily_goal != goal {
            self.progress.daily.daily_goal = goal;
            persist(self.store.as_ref(), &self.progress);
        }
        Ok(())
    }

    pub fn reset_progress(&mut self) {
        self.run = None;
        self.progress = Progress::new(self.clock.today());
        info!("progress reset");
        persist(self.store.as_ref(), &self.progress);
    }

    fn active_run(&mut self) -> Result<&mut LevelRun, ValidationError> {
        match self.run.as_mut() {
            Some(run) if !run.is_finished() => Ok(run),
            _ => Err(ValidationError::NoActiveRun),
        }
    }

    fn resolve(&mut self, resolution: Resolution) -> Result<AnswerOutcome, ValidationError> {
        let outcome = self.active_run()?.resolve(resolution)?;
        debug!(
            resolution = ?outcome.resolution,
            answer = outcome.correct_answer,
            "question resolved"
        );
        self.record_daily_attempt();
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::question::Operator;
    use crate::store::MemoryProgressStore;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;
    use std::rc::Rc;

    /// Always asks `n + 1`, so the answer is known
    struct Counting(i64);

    impl QuestionSource for Counting {
        fn next_question(&mut self, _tier: Tier, _filter: OperatorFilter) -> Question {
            self.0 += 1;
            Question::new(self.0, Operator::Add, 1)
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn session_with(questions: usize) -> (Session, MemoryProgressStore, Rc<FixedClock>) {
        let store = MemoryProgressStore::new();
        let clock = Rc::new(FixedClock::new(date("2024-01-01")));
        let session = Session::open(
            Box::new(store.clone()),
            Box::new(clock.clone()),
            Box::new(Counting(0)),
            SessionConfig {
                questions_per_level: questions,
                question_time: Duration::from_secs(60),
            },
        );
        (session, store, clock)
    }

    fn answer_current(session: &Session) -> String {
        session
            .run()
            .and_then(|r| r.current_question())
            .map(|q| q.answer().to_string())
            .unwrap()
    }

    #[test]
    fn opening_persists_defaults() {
        let (session, store, _) = session_with(3);
        assert_eq!(session.run_state(), RunState::NotStarted);
        assert!(store.blob().is_some());
        assert!(session.level(Tier::FIRST).unlocked);
    }

    #[test]
    fn locked_tier_cannot_start() {
        let (mut session, _, _) = session_with(3);
        let tier = Tier::new(2).unwrap();
        assert_eq!(
            session.start_level(tier),
            Err(ValidationError::TierLocked(tier))
        );
        assert_eq!(session.run_state(), RunState::NotStarted);
    }

    #[test]
    fn run_walks_through_states() {
        let (mut session, _, _) = session_with(2);
        session.start_level(Tier::FIRST).unwrap();
        assert_eq!(session.run_state(), RunState::InProgress(0));

        let ans = answer_current(&session);
        assert!(session.submit_answer(&ans).unwrap().is_correct());
        assert_eq!(session.advance(), Ok(Advance::Next));
        assert_eq!(session.run_state(), RunState::InProgress(1));

        let outcome = session.submit_answer("0").unwrap();
        assert_eq!(outcome.resolution, Resolution::Wrong);
        assert_eq!(session.advance(), Ok(Advance::Finished));
        assert_eq!(session.run_state(), RunState::Finished);

        let report = session.run().and_then(|r| r.report()).unwrap();
        assert_eq!(report.accuracy, 50);
        assert_eq!(report.correct, 1);
        assert_eq!(report.wrong, 1);
        assert_eq!(report.wrong_list.len(), 1);
        assert_eq!(report.wrong_list[0].question, "2 + 1 = ?");
        assert_eq!(report.wrong_list[0].correct, 3);
        assert_eq!(report.newly_unlocked, Tier::new(2));
    }

    #[test]
    fn double_submission_is_rejected() {
        let (mut session, _, _) = session_with(3);
        session.start_level(Tier::FIRST).unwrap();
        let ans = answer_current(&session);
        session.submit_answer(&ans).unwrap();
        assert_eq!(
            session.submit_answer(&ans),
            Err(ValidationError::AlreadyAnswered)
        );
        assert_eq!(session.on_timeout(), Err(ValidationError::AlreadyAnswered));
        let run = session.run().unwrap();
        assert_eq!(run.correct_count(), 1);
        assert_eq!(run.wrong_count(), 0);
        assert_eq!(session.daily().today_solved, 1);
    }

    #[test]
    fn invalid_input_is_not_an_attempt() {
        let (mut session, _, _) = session_with(3);
        session.start_level(Tier::FIRST).unwrap();
        assert_eq!(session.submit_answer("  "), Err(ValidationError::EmptyAnswer));
        assert_matches!(
            session.submit_answer("abc"),
            Err(ValidationError::NotANumber(_))
        );
        assert_eq!(session.daily().today_solved, 0);
        assert!(!session.run().unwrap().is_answered());
        assert_eq!(session.advance(), Err(ValidationError::QuestionUnresolved));
    }

    #[test]
    fn submit_without_run_fails() {
        let (mut session, _, _) = session_with(3);
        assert_eq!(session.submit_answer("1"), Err(ValidationError::NoActiveRun));
        assert_eq!(session.advance(), Err(ValidationError::NoActiveRun));
        assert_eq!(session.finish_level(), Err(ValidationError::NoActiveRun));
    }

    #[test]
    fn timeout_counts_as_wrong_attempt() {
        let (mut session, _, _) = session_with(3);
        session.start_level(Tier::FIRST).unwrap();
        assert_eq!(session.tick(Duration::from_secs(59)), None);
        let outcome = session.tick(Duration::from_secs(1)).unwrap();
        assert_eq!(outcome.resolution, Resolution::TimedOut);
        assert_eq!(session.tick(Duration::from_secs(60)), None);

        let run = session.run().unwrap();
        assert_eq!(run.wrong_count(), 1);
        assert_eq!(run.wrong_list().len(), 1);
        assert_eq!(session.daily().today_solved, 1);
    }

    #[test]
    fn answering_cancels_the_countdown() {
        let (mut session, _, _) = session_with(3);
        session.start_level(Tier::FIRST).unwrap();
        let ans = answer_current(&session);
        session.submit_answer(&ans).unwrap();
        assert_eq!(session.run().unwrap().time_left(), None);
        assert_eq!(session.tick(Duration::from_secs(120)), None);
        assert_eq!(session.run().unwrap().wrong_count(), 0);
    }

    #[test]
    fn next_question_rearms_the_countdown() {
        let (mut session, _, _) = session_with(3);
        session.start_level(Tier::FIRST).unwrap();
        session.tick(Duration::from_secs(30));
        session.submit_answer("0").unwrap();
        session.advance().unwrap();
        assert_eq!(
            session.run().unwrap().time_left(),
            Some(Duration::from_secs(60))
        );
    }

    #[test]
    fn finishing_early_is_refused() {
        let (mut session, _, _) = session_with(3);
        session.start_level(Tier::FIRST).unwrap();
        assert_eq!(session.finish_level(), Err(ValidationError::RunNotFinished));
    }

    #[test]
    fn finished_run_is_folded_in_only_once() {
        let (mut session, _, _) = session_with(1);
        session.start_level(Tier::FIRST).unwrap();
        session.submit_answer("0").unwrap();
        session.advance().unwrap();
        assert_eq!(session.finish_level(), Err(ValidationError::NoActiveRun));
        assert_eq!(session.submit_answer("1"), Err(ValidationError::NoActiveRun));
    }

    #[test]
    fn best_accuracy_is_monotonic_across_runs() {
        let (mut session, _, _) = session_with(4);
        let mut best = 0;
        for correct_answers in [2usize, 4, 1, 3, 0] {
            session.start_level(Tier::FIRST).unwrap();
            for i in 0..4 {
                let input = if i < correct_answers {
                    answer_current(&session)
                } else {
                    "-1".to_string()
                };
                session.submit_answer(&input).unwrap();
                session.advance().unwrap();
            }
            let now = session.level(Tier::FIRST).best_accuracy;
            assert!(now >= best);
            best = now;
        }
        assert_eq!(best, 100);
    }

    #[test]
    fn unlock_follows_completion() {
        let (mut session, _, _) = session_with(1);
        for tier in Tier::ALL.into_iter().skip(1) {
            assert!(!session.level(tier).unlocked);
        }
        session.start_level(Tier::FIRST).unwrap();
        session.on_timeout().unwrap();
        session.advance().unwrap();
        // even a 0% run counts as completion
        assert!(session.level(Tier::FIRST).completed);
        assert!(session.level(Tier::new(2).unwrap()).unlocked);
        assert!(!session.level(Tier::new(3).unwrap()).unlocked);
    }

    #[test]
    fn quitting_leaves_progress_alone() {
        let (mut session, _, _) = session_with(3);
        session.start_level(Tier::FIRST).unwrap();
        session.submit_answer("0").unwrap();
        assert!(session.quit_level());
        assert!(!session.quit_level());
        assert!(!session.level(Tier::FIRST).completed);
        assert_eq!(session.run_state(), RunState::NotStarted);
        // the attempt itself still counted for the day
        assert_eq!(session.daily().today_solved, 1);
    }

    #[test]
    fn daily_attempts_follow_the_clock() {
        let (mut session, store, clock) = session_with(3);
        session.record_daily_attempt();
        assert_eq!(session.daily().streak, 0);
        clock.advance_days(1);
        session.record_daily_attempt();
        assert_eq!(session.daily().streak, 1);
        assert_eq!(session.daily().today_solved, 1);
        clock.advance_days(1);
        session.refresh_day();
        assert_eq!(session.daily().streak, 2);
        assert_eq!(session.daily().today_solved, 0);

        let stored = crate::store::ProgressStore::load(&store).unwrap().unwrap();
        assert_eq!(&stored.daily, session.daily());
    }

    #[test]
    fn daily_goal_must_be_positive() {
        let (mut session, _, _) = session_with(3);
        assert_eq!(
            session.set_daily_goal(0),
            Err(ValidationError::InvalidDailyGoal)
        );
        session.set_daily_goal(50).unwrap();
        assert_eq!(session.daily().daily_goal, 50);
    }

    #[test]
    fn reset_restores_defaults() {
        let (mut session, store, _) = session_with(1);
        session.start_level(Tier::FIRST).unwrap();
        session.submit_answer("2").unwrap();
        session.advance().unwrap();
        session.reset_progress();
        assert_eq!(session.run_state(), RunState::NotStarted);
        assert!(!session.level(Tier::new(2).unwrap()).unlocked);
        let stored = crate::store::ProgressStore::load(&store).unwrap().unwrap();
        assert_eq!(&stored, session.progress());
    }

    #[test]
    fn zero_questions_still_plays_one() {
        let (mut session, _, _) = session_with(0);
        assert_eq!(session.config().questions_per_level, 1);
        session.start_level(Tier::FIRST).unwrap();
        assert_eq!(session.run_state(), RunState::InProgress(0));
        let answer = answer_current(&session);
        session.submit_answer(&answer).unwrap();
        assert_eq!(session.advance(), Ok(Advance::Finished));
        assert!(session.level(Tier::FIRST).completed);
        assert!(session.level(Tier::new(2).unwrap()).unlocked);
    }
}
