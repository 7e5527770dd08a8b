//! Impact counter tracking.
//!
//! The sensor reports a running total of impacts. A shot is inferred only when
//! the total goes up; equal or lower readings are remembered but produce
//! nothing.

/// A detected increase of the sensor's impact counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Impact {
    pub previous: i32,
    pub count: i32,
}

/// Last impact count seen on the current connection.
#[derive(Debug, Default)]
pub struct ImpactCounter {
    last: i32,
}

impl ImpactCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` and report an [`Impact`] iff it is strictly greater than
    /// the previous value. The stored value is replaced in every case.
    pub fn observe(&mut self, value: i32) -> Option<Impact> {
        let previous = self.last;
        self.last = value;
        (value > previous).then_some(Impact {
            previous,
            count: value,
        })
    }

    pub fn last(&self) -> i32 {
        self.last
    }

    /// Forget the previous connection's readings.
    pub fn reset(&mut self) {
        self.last = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_increases_are_impacts() {
        let mut counter = ImpactCounter::new();
        let fired: Vec<bool> = [0, 1, 1, 3, 3]
            .into_iter()
            .map(|v| counter.observe(v).is_some())
            .collect();
        assert_eq!(fired, vec![false, true, false, true, false]);
        assert_eq!(counter.last(), 3);
    }

    #[test]
    fn test_decrease_is_stored_but_not_an_impact() {
        let mut counter = ImpactCounter::new();
        assert!(counter.observe(7).is_some());
        assert_eq!(counter.observe(2), None);
        assert_eq!(counter.last(), 2);

        // The next increase is measured against the lower value
        assert_eq!(
            counter.observe(3),
            Some(Impact {
                previous: 2,
                count: 3
            })
        );
    }

    #[test]
    fn test_reset_starts_from_zero() {
        let mut counter = ImpactCounter::new();
        counter.observe(12);
        counter.reset();
        assert_eq!(counter.last(), 0);
        assert!(counter.observe(1).is_some());
    }
}
