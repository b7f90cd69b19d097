use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::question::Tier;

pub const DEFAULT_DAILY_GOAL: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelProgress {
    pub unlocked: bool,
    pub completed: bool,
    pub best_accuracy: u8,
}

impl LevelProgress {
    /// Folds one finished run into this level. Returns true if the best improved.
    pub fn record_run(&mut self, accuracy: u8) -> bool {
        self.completed = true;
        if accuracy > self.best_accuracy {
            self.best_accuracy = accuracy;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyState {
    pub last_date: NaiveDate,
    pub streak: u32,
    pub today_solved: u32,
    pub daily_goal: u32,
}

impl DailyState {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            last_date: today,
            streak: 0,
            today_solved: 0,
            daily_goal: DEFAULT_DAILY_GOAL,
        }
    }

    /// Applies the day-rollover rule without counting an attempt.
    pub fn roll_over(&mut self, today: NaiveDate) {
        if self.last_date == today {
            return;
        }
        let gap = today.signed_duration_since(self.last_date).num_days();
        self.streak = if gap == 1 { self.streak + 1 } else { 1 };
        self.today_solved = 0;
        self.last_date = today;
    }

    pub fn record_attempt(&mut self, today: NaiveDate) {
        self.roll_over(today);
        self.today_solved += 1;
    }

    pub fn goal_reached(&self) -> bool {
        self.today_solved >= self.daily_goal
    }
}

/// The durable application state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub levels: BTreeMap<Tier, LevelProgress>,
    pub daily: DailyState,
}

impl Progress {
    pub fn new(today: NaiveDate) -> Self {
        let levels = Tier::ALL
            .into_iter()
            .map(|tier| {
                let level = LevelProgress {
                    unlocked: tier == Tier::FIRST,
                    ..LevelProgress::default()
                };
                (tier, level)
            })
            .collect();
        Self {
            levels,
            daily: DailyState::new(today),
        }
    }

    pub fn level(&self, tier: Tier) -> LevelProgress {
        self.levels.get(&tier).copied().unwrap_or_default()
    }

    pub fn is_unlocked(&self, tier: Tier) -> bool {
        tier == Tier::FIRST || self.level(tier).unlocked
    }

    /// Records a finished run and unlocks the following tier.
    /// Returns the tier that became newly unlocked, if any.
    pub fn complete_level(&mut self, tier: Tier, accuracy: u8) -> Option<Tier> {
        self.levels.entry(tier).or_default().record_run(accuracy);
        let next = tier.next()?;
        let next_level = self.levels.entry(next).or_default();
        if next_level.unlocked {
            None
        } else {
            next_level.unlocked = true;
            Some(next)
        }
    }

    /// Repairs an older or hand-edited blob: fills in missing tiers, caps
    /// best accuracy at 100 and re-derives each unlock from the tier below.
    /// Returns true if anything had to change.
    pub fn normalize(&mut self) -> bool {
        let mut changed = false;
        let mut below_completed = true;
        for tier in Tier::ALL {
            let level = self.levels.entry(tier).or_insert_with(|| {
                changed = true;
                LevelProgress::default()
            });
            if level.best_accuracy > 100 {
                level.best_accuracy = 100;
                changed = true;
            }
            if level.unlocked != below_completed {
                level.unlocked = below_completed;
                changed = true;
            }
            below_completed = level.completed;
        }
        if self.daily.daily_goal == 0 {
            self.daily.daily_goal = DEFAULT_DAILY_GOAL;
            changed = true;
        }
        changed
    }

    pub fn completed_count(&self) -> usize {
        self.levels.values().filter(|l| l.completed).count()
    }
}

/// round(correct / total × 100), 0 for an empty run
pub fn accuracy_percent(correct: u32, wrong: u32) -> u8 {
    let total = correct + wrong;
    if total == 0 {
        return 0;
    }
    (f64::from(correct) / f64::from(total) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn tier(n: u8) -> Tier {
        Tier::new(n).unwrap()
    }

    #[test]
    fn default_state_unlocks_only_tier_one() {
        let p = Progress::new(date("2024-01-01"));
        assert_eq!(p.levels.len(), 8);
        for t in Tier::ALL {
            let level = p.level(t);
            assert_eq!(level.unlocked, t == Tier::FIRST);
            assert!(!level.completed);
            assert_eq!(level.best_accuracy, 0);
        }
        assert_eq!(p.daily.streak, 0);
        assert_eq!(p.daily.today_solved, 0);
        assert_eq!(p.daily.daily_goal, 20);
    }

    #[test]
    fn streak_continues_on_consecutive_day() {
        let mut d = DailyState {
            last_date: date("2024-01-01"),
            streak: 5,
            today_solved: 12,
            daily_goal: 20,
        };
        d.record_attempt(date("2024-01-02"));
        assert_eq!(d.streak, 6);
        assert_eq!(d.today_solved, 1);
        assert_eq!(d.last_date, date("2024-01-02"));
    }

    #[test]
    fn streak_restarts_after_gap() {
        let mut d = DailyState {
            last_date: date("2024-01-01"),
            streak: 5,
            today_solved: 12,
            daily_goal: 20,
        };
        d.record_attempt(date("2024-01-05"));
        assert_eq!(d.streak, 1);
        assert_eq!(d.today_solved, 1);
    }

    #[test]
    fn same_day_attempts_only_count() {
        let mut d = DailyState {
            last_date: date("2024-01-01"),
            streak: 5,
            today_solved: 12,
            daily_goal: 20,
        };
        d.record_attempt(date("2024-01-01"));
        d.record_attempt(date("2024-01-01"));
        assert_eq!(d.streak, 5);
        assert_eq!(d.today_solved, 14);
    }

    #[test]
    fn clock_going_backwards_restarts_streak() {
        let mut d = DailyState {
            last_date: date("2024-01-10"),
            streak: 3,
            today_solved: 2,
            daily_goal: 20,
        };
        d.record_attempt(date("2024-01-09"));
        assert_eq!(d.streak, 1);
        assert_eq!(d.last_date, date("2024-01-09"));
    }

    #[test]
    fn goal_tracking() {
        let mut d = DailyState::new(date("2024-01-01"));
        d.daily_goal = 2;
        d.record_attempt(date("2024-01-01"));
        assert!(!d.goal_reached());
        d.record_attempt(date("2024-01-01"));
        assert!(d.goal_reached());
    }

    #[test]
    fn best_accuracy_never_drops() {
        let mut p = Progress::new(date("2024-01-01"));
        let mut best = 0;
        for acc in [40, 80, 60, 80, 100, 0] {
            p.complete_level(tier(1), acc);
            let now = p.level(tier(1)).best_accuracy;
            assert!(now >= best);
            best = now;
        }
        assert_eq!(best, 100);
    }

    #[test]
    fn completion_unlocks_next_tier_once() {
        let mut p = Progress::new(date("2024-01-01"));
        assert!(!p.is_unlocked(tier(2)));
        assert_eq!(p.complete_level(tier(1), 0), Some(tier(2)));
        assert!(p.is_unlocked(tier(2)));
        assert!(p.level(tier(1)).completed);
        assert_eq!(p.complete_level(tier(1), 50), None);
        assert!(!p.is_unlocked(tier(3)));
    }

    #[test]
    fn last_tier_unlocks_nothing() {
        let mut p = Progress::new(date("2024-01-01"));
        assert_eq!(p.complete_level(Tier::LAST, 90), None);
        assert!(p.level(Tier::LAST).completed);
        assert_eq!(p.completed_count(), 1);
    }

    #[test]
    fn normalize_repairs_partial_blobs() {
        let mut p = Progress::new(date("2024-01-01"));
        p.levels.remove(&tier(5));
        p.levels.get_mut(&Tier::FIRST).unwrap().unlocked = false;
        p.daily.daily_goal = 0;
        assert!(p.normalize());
        assert_eq!(p.levels.len(), 8);
        assert!(p.is_unlocked(Tier::FIRST));
        assert_eq!(p.daily.daily_goal, DEFAULT_DAILY_GOAL);
        assert!(!p.normalize());
    }

    #[test]
    fn normalize_enforces_unlock_chain_and_accuracy_cap() {
        let raw = r#"{"levels":{
            "1":{"unlocked":true,"completed":true,"bestAccuracy":250},
            "2":{"unlocked":false,"completed":false,"bestAccuracy":0},
            "5":{"unlocked":true,"completed":false,"bestAccuracy":0}},
            "daily":{"lastDate":"2024-01-01","streak":0,"todaySolved":0,"dailyGoal":20}}"#;
        let mut p: Progress = serde_json::from_str(raw).unwrap();
        assert!(p.normalize());
        assert_eq!(p.level(tier(1)).best_accuracy, 100);
        assert!(p.is_unlocked(tier(2)));
        assert!(!p.is_unlocked(tier(3)));
        assert!(!p.is_unlocked(tier(5)));
        assert!(!p.normalize());
    }

    #[test]
    fn accuracy_rounding() {
        assert_eq!(accuracy_percent(0, 0), 0);
        assert_eq!(accuracy_percent(125, 0), 100);
        assert_eq!(accuracy_percent(2, 1), 67);
        assert_eq!(accuracy_percent(1, 2), 33);
        assert_eq!(accuracy_percent(1, 7), 13);
    }

    #[test]
    fn blob_uses_flat_camel_case_layout() {
        let mut p = Progress::new(date("2024-03-09"));
        p.complete_level(tier(1), 88);
        p.daily.record_attempt(date("2024-03-10"));

        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["levels"]["1"]["bestAccuracy"], 88);
        assert_eq!(json["levels"]["2"]["unlocked"], true);
        assert_eq!(json["daily"]["lastDate"], "2024-03-10");
        assert_eq!(json["daily"]["todaySolved"], 1);
        assert_eq!(json["daily"]["dailyGoal"], 20);

        let back: Progress = serde_json::from_value(json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn out_of_range_tier_key_is_rejected() {
        let raw = r#"{"levels":{"9":{"unlocked":true,"completed":false,"bestAccuracy":0}},
            "daily":{"lastDate":"2024-01-01","streak":0,"todaySolved":0,"dailyGoal":20}}"#;
        assert!(serde_json::from_str::<Progress>(raw).is_err());
    }
}
