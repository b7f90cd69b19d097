use std::rc::Rc;
use std::sync::mpsc;
use std::time::Duration;

use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use mathdrill::clock::FixedClock;
use mathdrill::question::RandomQuestions;
use mathdrill::runtime::{AppEvent, ChannelEventSource, FixedTicker, Runner};
use mathdrill::session::{Advance, Resolution, RunState, SessionConfig};
use mathdrill::store::MemoryProgressStore;
use mathdrill::{Session, Tier};

fn session(questions: usize, question_time: Duration) -> Session {
    Session::open(
        Box::new(MemoryProgressStore::new()),
        Box::new(Rc::new(FixedClock::new(
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        ))),
        Box::new(RandomQuestions::seeded(42)),
        SessionConfig {
            questions_per_level: questions,
            question_time,
        },
    )
}

fn key(c: char) -> AppEvent {
    AppEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
}

// Headless level run: keystrokes flow through Runner/ChannelEventSource into
// an answer buffer that is submitted on Enter.
#[test]
fn headless_level_run_completes() {
    let mut session = session(3, Duration::from_secs(60));
    session.start_level(Tier::FIRST).unwrap();

    let (tx, rx) = mpsc::channel();
    let mut runner = Runner::new(
        ChannelEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(5)),
    );
    let mut buffer = String::new();

    for _ in 0..200u32 {
        if session.run_state() == RunState::Finished {
            break;
        }
        if !session.run().unwrap().is_answered() && buffer.is_empty() {
            let answer = session.run().unwrap().current_question().unwrap().answer();
            for c in answer.to_string().chars() {
                tx.send(key(c)).unwrap();
            }
            tx.send(AppEvent::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)))
                .unwrap();
        }
        match runner.step() {
            AppEvent::Tick(elapsed) => {
                session.tick(elapsed);
            }
            AppEvent::Resize => {}
            AppEvent::Key(k) => match k.code {
                KeyCode::Char(c) => buffer.push(c),
                KeyCode::Enter => {
                    let outcome = session.submit_answer(&buffer).unwrap();
                    assert!(outcome.is_correct());
                    buffer.clear();
                    session.advance().unwrap();
                }
                _ => {}
            },
        }
    }

    assert_eq!(session.run_state(), RunState::Finished);
    let report = session.run().unwrap().report().unwrap();
    assert_eq!(report.accuracy, 100);
    assert_eq!(report.newly_unlocked, Tier::new(2));
    assert_eq!(session.daily().today_solved, 3);
}

#[test]
fn headless_question_times_out_on_ticks() {
    let mut session = session(2, Duration::from_millis(40));
    session.start_level(Tier::FIRST).unwrap();

    let (_tx, rx) = mpsc::channel();
    let mut runner = Runner::new(
        ChannelEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(10)),
    );

    let mut timeouts = Vec::new();
    for _ in 0..20u32 {
        if let AppEvent::Tick(elapsed) = runner.step() {
            if let Some(outcome) = session.tick(elapsed) {
                timeouts.push(outcome);
            }
        }
    }

    // fires once, then stays quiet until the next question
    assert_eq!(timeouts.len(), 1);
    assert_eq!(timeouts[0].resolution, Resolution::TimedOut);
    assert_eq!(session.run().unwrap().wrong_count(), 1);

    assert_eq!(session.advance().unwrap(), Advance::Next);
    assert_eq!(session.run_state(), RunState::InProgress(1));
    assert!(session.run().unwrap().time_left().is_some());
}

#[test]
fn headless_answer_beats_the_timer() {
    let mut session = session(1, Duration::from_millis(30));
    session.start_level(Tier::FIRST).unwrap();
    let answer = session.run().unwrap().current_question().unwrap().answer();

    session.tick(Duration::from_millis(20));
    assert!(session.submit_answer(&answer.to_string()).unwrap().is_correct());
    // the countdown was cancelled on submit
    assert!(session.tick(Duration::from_millis(50)).is_none());
    assert_eq!(session.advance().unwrap(), Advance::Finished);
    assert_eq!(session.run().unwrap().report().unwrap().wrong, 0);
}
