//! Synthetic CPU load
//!
//! A load simulator spins through a fixed number of iterations once per
//! period. It has no output besides the busy time the accountant measures,
//! which gives every simulator tag a reproducible utilization signature.

use core::hint::black_box;

/// Fixed-iteration busy loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LoadSimulator {
    iterations: u32,
}

impl LoadSimulator {
    /// Create a simulator spinning `iterations` times per release
    pub const fn new(iterations: u32) -> Self {
        Self { iterations }
    }

    /// Iterations per release
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Per-release body: burn the configured iterations
    ///
    /// Returns the number of iterations executed.
    pub fn release(&self) -> u32 {
        let mut done: u32 = 0;
        for i in 0..self.iterations {
            // Keep the optimizer from folding the loop away
            black_box(i);
            done += 1;
        }
        done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runs_exact_iterations() {
        assert_eq!(LoadSimulator::new(33_300).release(), 33_300);
        assert_eq!(LoadSimulator::new(0).release(), 0);
    }

    #[test]
    fn test_release_is_repeatable() {
        let sim = LoadSimulator::new(1_000);
        assert_eq!(sim.release(), sim.release());
        assert_eq!(sim.iterations(), 1_000);
    }
}
