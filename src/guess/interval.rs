//! Inclusive integer search interval.

/// Candidate range `[low, high]`, inclusive on both ends.
///
/// Never empty: a narrowing step that would leave `low > high` is refused
/// and the interval stays as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchInterval {
    low: i64,
    high: i64,
}

/// Returned when a narrowing step would leave no candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exhausted;

impl SearchInterval {
    /// Create an interval; `None` if `low > high`.
    pub fn new(low: i64, high: i64) -> Option<Self> {
        (low <= high).then_some(Self { low, high })
    }

    pub fn low(&self) -> i64 {
        self.low
    }

    pub fn high(&self) -> i64 {
        self.high
    }

    /// `high - low`, the quantity every narrowing step reduces.
    pub fn span(&self) -> u64 {
        self.high.abs_diff(self.low)
    }

    /// Number of candidates left.
    pub fn candidates(&self) -> u64 {
        self.span().saturating_add(1)
    }

    /// Floor of the average of both ends, computed without overflow.
    pub fn midpoint(&self) -> i64 {
        ((i128::from(self.low) + i128::from(self.high)).div_euclid(2)) as i64
    }

    /// The true value is above `mid`: move `low` to `mid + 1`.
    pub fn raise_low(&mut self, mid: i64) -> Result<(), Exhausted> {
        match mid.checked_add(1) {
            Some(low) if low > self.low && low <= self.high => {
                self.low = low;
                Ok(())
            }
            _ => Err(Exhausted),
        }
    }

    /// The true value is below `mid`: move `high` to `mid - 1`.
    pub fn lower_high(&mut self, mid: i64) -> Result<(), Exhausted> {
        match mid.checked_sub(1) {
            Some(high) if high < self.high && high >= self.low => {
                self.high = high;
                Ok(())
            }
            _ => Err(Exhausted),
        }
    }
}

impl std::fmt::Display for SearchInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.low, self.high)
    }
}
