// Rational beat-length arithmetic.
//
// A Duration is a fraction of a whole note (numerator/denominator), kept
// in lowest terms at all times. Chords and notes both carry Durations, and
// the bar invariant (note durations sum exactly to the time signature) is
// enforced with rational arithmetic — no floating-point drift.
//
// Offset is the companion accumulator type: a cumulative position inside a
// bar, which (unlike Duration) may be zero. Offsets drive chord lookup by
// onset and accented-beat detection in fitness scoring.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};

/// A musical time span as a fraction of a whole note, in lowest terms.
///
/// Invariant: numerator > 0 and denominator > 0. Zero and negative spans
/// are not representable; subtraction that would reach them panics, and
/// `checked_sub` is the guard used by mutation operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Duration {
    numerator: u8,
    denominator: u8,
}

impl Duration {
    pub const WHOLE: Duration = Duration { numerator: 1, denominator: 1 };
    pub const HALF: Duration = Duration { numerator: 1, denominator: 2 };
    pub const QUARTER: Duration = Duration { numerator: 1, denominator: 4 };
    pub const EIGHTH: Duration = Duration { numerator: 1, denominator: 8 };
    pub const SIXTEENTH: Duration = Duration { numerator: 1, denominator: 16 };
    pub const THIRTY_SECOND: Duration = Duration { numerator: 1, denominator: 32 };

    /// Create a duration, reducing to lowest terms.
    ///
    /// Panics if either component is zero — all call sites construct from
    /// validated musical constants, so a zero here is a programming error.
    pub fn new(numerator: u8, denominator: u8) -> Self {
        assert!(numerator > 0, "duration numerator must be positive");
        assert!(denominator > 0, "duration denominator must be positive");
        Self::from_u32(numerator as u32, denominator as u32)
    }

    /// Reduce a u32 fraction and narrow it back to u8 components.
    fn from_u32(numerator: u32, denominator: u32) -> Self {
        let g = gcd(numerator, denominator);
        let n = numerator / g;
        let d = denominator / g;
        assert!(
            n <= u8::MAX as u32 && d <= u8::MAX as u32,
            "duration {n}/{d} does not fit the representable range"
        );
        Duration {
            numerator: n as u8,
            denominator: d as u8,
        }
    }

    pub fn numerator(&self) -> u8 {
        self.numerator
    }

    pub fn denominator(&self) -> u8 {
        self.denominator
    }

    /// True when the denominator is 1, 2, 4, 8, 16, ...
    ///
    /// Gates the syncopation operator: borrowing an eighth note across a
    /// bar line only stays exact when both touched notes live on the
    /// power-of-two duration lattice.
    pub fn is_denominator_power_of_two(&self) -> bool {
        self.denominator.is_power_of_two()
    }

    /// Subtraction that returns None instead of panicking when the result
    /// would be zero or negative.
    pub fn checked_sub(self, other: Duration) -> Option<Duration> {
        let lhs = self.numerator as u32 * other.denominator as u32;
        let rhs = other.numerator as u32 * self.denominator as u32;
        if lhs <= rhs {
            return None;
        }
        Some(Self::from_u32(
            lhs - rhs,
            self.denominator as u32 * other.denominator as u32,
        ))
    }

    /// Half of this span, or None if it cannot be represented.
    pub fn half(self) -> Option<Duration> {
        self.scaled(1, 2)
    }

    /// A quarter of this span (the short side of a 1:3 split).
    pub fn quarter_part(self) -> Option<Duration> {
        self.scaled(1, 4)
    }

    /// Three quarters of this span (the long side of a 1:3 split).
    pub fn three_quarter_part(self) -> Option<Duration> {
        self.scaled(3, 4)
    }

    fn scaled(self, num: u32, den: u32) -> Option<Duration> {
        let n = self.numerator as u32 * num;
        let d = self.denominator as u32 * den;
        let g = gcd(n, d);
        if n / g > u8::MAX as u32 || d / g > u8::MAX as u32 {
            return None;
        }
        Some(Self::from_u32(n, d))
    }
}

impl Add for Duration {
    type Output = Duration;

    fn add(self, other: Duration) -> Duration {
        Self::from_u32(
            self.numerator as u32 * other.denominator as u32
                + other.numerator as u32 * self.denominator as u32,
            self.denominator as u32 * other.denominator as u32,
        )
    }
}

impl Sub for Duration {
    type Output = Duration;

    fn sub(self, other: Duration) -> Duration {
        self.checked_sub(other)
            .expect("duration subtraction must leave a positive span")
    }
}

impl Ord for Duration {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = self.numerator as u32 * other.denominator as u32;
        let rhs = other.numerator as u32 * self.denominator as u32;
        lhs.cmp(&rhs)
    }
}

impl PartialOrd for Duration {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// A cumulative position inside a bar, as a reduced fraction of a whole
/// note. May be zero (the downbeat), which Duration cannot represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Offset {
    num: u32,
    den: u32,
}

impl Offset {
    pub fn zero() -> Self {
        Offset { num: 0, den: 1 }
    }

    /// Advance by one note/chord span.
    pub fn push(&mut self, d: Duration) {
        let num = self.num * d.denominator as u32 + d.numerator as u32 * self.den;
        let den = self.den * d.denominator as u32;
        let g = gcd(num, den);
        self.num = num / g;
        self.den = den / g;
    }

    /// True when this offset lands exactly on a beat of a signature with
    /// the given denominator (an integer multiple of 1/ts_denominator).
    pub fn is_on_beat(&self, ts_denominator: u8) -> bool {
        ts_denominator as u32 % self.den == 0
    }
}

impl Ord for Offset {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = self.num as u64 * other.den as u64;
        let rhs = other.num as u64 * self.den as u64;
        lhs.cmp(&rhs)
    }
}

impl PartialOrd for Offset {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn gcd(a: u32, b: u32) -> u32 {
    let (mut a, mut b) = (a, b);
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a.max(1)
}
