use clap::ValueEnum;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

pub const TIER_COUNT: u8 = 8;

/// Multiplication tables offered by the tables drill
pub const TABLE_BASES: RangeInclusive<i64> = 2..=20;
const TABLE_FACTORS: RangeInclusive<i64> = 1..=10;

/// Difficulty level, always within 1..=8
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Tier(u8);

impl Tier {
    pub const FIRST: Tier = Tier(1);
    pub const LAST: Tier = Tier(TIER_COUNT);
    pub const ALL: [Tier; TIER_COUNT as usize] = [
        Tier(1),
        Tier(2),
        Tier(3),
        Tier(4),
        Tier(5),
        Tier(6),
        Tier(7),
        Tier(8),
    ];

    pub fn new(n: u8) -> Option<Self> {
        (1..=TIER_COUNT).contains(&n).then_some(Tier(n))
    }

    pub fn number(self) -> u8 {
        self.0
    }

    pub fn next(self) -> Option<Self> {
        Tier::new(self.0 + 1)
    }

    pub fn prev(self) -> Option<Self> {
        Tier::new(self.0.saturating_sub(1))
    }

    pub fn config(self) -> &'static TierConfig {
        &TIERS[usize::from(self.0 - 1)]
    }
}

impl TryFrom<u8> for Tier {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        Tier::new(n).ok_or_else(|| format!("tier {n} is outside 1..={TIER_COUNT}"))
    }
}

impl From<Tier> for u8 {
    fn from(t: Tier) -> Self {
        t.0
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum Operator {
    #[strum(to_string = "+")]
    Add,
    #[strum(to_string = "−")]
    Sub,
    #[strum(to_string = "×")]
    Mul,
    #[strum(to_string = "÷")]
    Div,
}

impl Operator {
    /// Exact integer evaluation; `None` when division leaves a remainder or overflows.
    pub fn apply(self, left: i64, right: i64) -> Option<i64> {
        match self {
            Operator::Add => left.checked_add(right),
            Operator::Sub => left.checked_sub(right),
            Operator::Mul => left.checked_mul(right),
            Operator::Div => match left.checked_rem(right) {
                Some(0) => left.checked_div(right),
                _ => None,
            },
        }
    }
}

/// Operator constraint picked by the user in practice mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum OperatorFilter {
    #[default]
    Any,
    Add,
    Sub,
    Mul,
    Div,
}

impl OperatorFilter {
    pub const ALL: [OperatorFilter; 5] = [
        OperatorFilter::Any,
        OperatorFilter::Add,
        OperatorFilter::Sub,
        OperatorFilter::Mul,
        OperatorFilter::Div,
    ];

    pub fn operator(self) -> Option<Operator> {
        match self {
            OperatorFilter::Any => None,
            OperatorFilter::Add => Some(Operator::Add),
            OperatorFilter::Sub => Some(Operator::Sub),
            OperatorFilter::Mul => Some(Operator::Mul),
            OperatorFilter::Div => Some(Operator::Div),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    left: i64,
    right: i64,
    operator: Operator,
    text: String,
    answer: i64,
}

impl Question {
    /// Builds a question from an already exact operand pair.
    /// Division truncates, so callers pass dividend = divisor × quotient.
    ///
    /// # Panics
    ///
    /// On division by zero or arithmetic overflow. Check untrusted operands
    /// with [`Operator::apply`] first.
    pub fn new(left: i64, operator: Operator, right: i64) -> Self {
        let answer = match operator {
            Operator::Add => left + right,
            Operator::Sub => left - right,
            Operator::Mul => left * right,
            Operator::Div => left / right,
        };
        Self {
            left,
            right,
            operator,
            text: format!("{left} {operator} {right} = ?"),
            answer,
        }
    }

    pub fn left(&self) -> i64 {
        self.left
    }

    pub fn right(&self) -> i64 {
        self.right
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn answer(&self) -> i64 {
        self.answer
    }

    pub fn is_correct(&self, value: f64) -> bool {
        value == self.answer as f64
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub min: i64,
    pub max: i64,
}

const fn span(min: i64, max: i64) -> Span {
    Span { min, max }
}

impl Span {
    fn sample<R: Rng + ?Sized>(self, rng: &mut R) -> i64 {
        rng.gen_range(self.min..=self.max)
    }

    pub fn contains(self, v: i64) -> bool {
        (self.min..=self.max).contains(&v)
    }
}

/// How the two operands of one operator are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandPolicy {
    Pair { left: Span, right: Span },
    /// dividend = divisor × quotient, shown as `dividend ÷ divisor`
    Quotient { divisor: Span, quotient: Span },
}

impl OperandPolicy {
    fn sample<R: Rng + ?Sized>(self, operator: Operator, rng: &mut R) -> (i64, i64) {
        match self {
            OperandPolicy::Pair { left, right } => {
                let (a, b) = (left.sample(rng), right.sample(rng));
                if operator == Operator::Sub && b > a {
                    (b, a)
                } else {
                    (a, b)
                }
            }
            OperandPolicy::Quotient { divisor, quotient } => {
                let d = divisor.sample(rng);
                let q = quotient.sample(rng);
                (d * q, d)
            }
        }
    }
}

/// One row of the difficulty table
#[derive(Debug, Clone, Copy)]
pub struct TierConfig {
    /// Percent weights, summing to 100
    pub mix: &'static [(Operator, u32)],
    pub add: OperandPolicy,
    pub sub: OperandPolicy,
    pub mul: Option<OperandPolicy>,
    pub div: Option<OperandPolicy>,
}

const fn pair(l: (i64, i64), r: (i64, i64)) -> OperandPolicy {
    OperandPolicy::Pair {
        left: span(l.0, l.1),
        right: span(r.0, r.1),
    }
}

const fn quotient(d: (i64, i64), q: (i64, i64)) -> OperandPolicy {
    OperandPolicy::Quotient {
        divisor: span(d.0, d.1),
        quotient: span(q.0, q.1),
    }
}

// Lowest tiers defining mul/div; forced operators borrow these below them.
const FIRST_MUL: OperandPolicy = pair((2, 9), (2, 9));
const FIRST_DIV: OperandPolicy = quotient((2, 12), (2, 20));

const ADD_SUB: &[(Operator, u32)] = &[(Operator::Add, 60), (Operator::Sub, 40)];
const LATE_MIX: &[(Operator, u32)] = &[
    (Operator::Add, 30),
    (Operator::Sub, 30),
    (Operator::Mul, 25),
    (Operator::Div, 15),
];

pub static TIERS: [TierConfig; TIER_COUNT as usize] = [
    TierConfig {
        mix: ADD_SUB,
        add: pair((1, 10), (1, 10)),
        sub: pair((1, 10), (1, 10)),
        mul: None,
        div: None,
    },
    TierConfig {
        mix: ADD_SUB,
        add: pair((5, 20), (1, 15)),
        sub: pair((5, 20), (1, 15)),
        mul: None,
        div: None,
    },
    TierConfig {
        mix: &[(Operator::Add, 50), (Operator::Sub, 30), (Operator::Mul, 20)],
        add: pair((10, 50), (10, 50)),
        sub: pair((20, 60), (10, 30)),
        mul: Some(FIRST_MUL),
        div: None,
    },
    TierConfig {
        mix: &[(Operator::Add, 40), (Operator::Sub, 30), (Operator::Mul, 30)],
        add: pair((20, 100), (20, 100)),
        sub: pair((40, 120), (10, 70)),
        mul: Some(pair((3, 12), (3, 12))),
        div: None,
    },
    TierConfig {
        mix: &[
            (Operator::Add, 35),
            (Operator::Sub, 30),
            (Operator::Mul, 20),
            (Operator::Div, 15),
        ],
        add: pair((50, 500), (50, 400)),
        sub: pair((100, 600), (50, 300)),
        mul: Some(pair((5, 20), (5, 20))),
        div: Some(FIRST_DIV),
    },
    TierConfig {
        mix: LATE_MIX,
        add: pair((100, 800), (100, 800)),
        sub: pair((300, 1000), (100, 700)),
        mul: Some(pair((10, 30), (10, 30))),
        div: Some(quotient((2, 15), (5, 40))),
    },
    TierConfig {
        mix: LATE_MIX,
        add: pair((200, 1500), (200, 1500)),
        sub: pair((500, 2000), (200, 1500)),
        mul: Some(pair((15, 40), (10, 40))),
        div: Some(quotient((2, 20), (5, 50))),
    },
    TierConfig {
        mix: LATE_MIX,
        add: pair((500, 3000), (500, 3000)),
        sub: pair((1000, 4000), (500, 3000)),
        mul: Some(pair((20, 60), (10, 60))),
        div: Some(quotient((2, 25), (10, 80))),
    },
];

impl TierConfig {
    /// Policy used for `operator`, including borrowed ones for forced operators
    pub fn policy(&self, operator: Operator) -> OperandPolicy {
        match operator {
            Operator::Add => self.add,
            Operator::Sub => self.sub,
            Operator::Mul => self.mul.unwrap_or(FIRST_MUL),
            Operator::Div => self.div.unwrap_or(FIRST_DIV),
        }
    }

    fn sample_operator<R: Rng + ?Sized>(&self, rng: &mut R) -> Operator {
        let roll = rng.gen_range(0..100);
        let mut threshold = 0;
        for &(operator, weight) in self.mix {
            threshold += weight;
            if roll < threshold {
                return operator;
            }
        }
        self.mix.last().map_or(Operator::Add, |&(op, _)| op)
    }
}

/// Draw one question for `tier`. A non-`Any` filter forces the operator.
pub fn generate<R: Rng + ?Sized>(tier: Tier, filter: OperatorFilter, rng: &mut R) -> Question {
    let config = tier.config();
    let operator = filter
        .operator()
        .unwrap_or_else(|| config.sample_operator(rng));
    let (left, right) = config.policy(operator).sample(operator, rng);
    Question::new(left, operator, right)
}

/// `base × n = ?` with n in 1..=10; base is clamped to the offered tables
pub fn table_question<R: Rng + ?Sized>(base: i64, rng: &mut R) -> Question {
    let base = base.clamp(*TABLE_BASES.start(), *TABLE_BASES.end());
    let factor = rng.gen_range(TABLE_FACTORS);
    Question::new(base, Operator::Mul, factor)
}

/// Where a session gets its level questions from
pub trait QuestionSource {
    fn next_question(&mut self, tier: Tier, filter: OperatorFilter) -> Question;
}

/// Production source backed by a seedable RNG
#[derive(Debug, Clone)]
pub struct RandomQuestions<R: Rng = StdRng> {
    rng: R,
}

impl RandomQuestions<StdRng> {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> RandomQuestions<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    pub fn rng(&mut self) -> &mut R {
        &mut self.rng
    }
}

impl<R: Rng> QuestionSource for RandomQuestions<R> {
    fn next_question(&mut self, tier: Tier, filter: OperatorFilter) -> Question {
        generate(tier, filter, &mut self.rng)
    }
}
