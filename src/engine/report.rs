//! The final minimisation report, rendered by the CLI as text or JSON.

use serde::Serialize;

use crate::core::Configuration;

/// Summary of a completed minimisation run.
///
/// `final_configuration` is excluded from the JSON rendering (it's an
/// internal handle, not data); the CLI serialises the actual reduced
/// bytes separately via the splitter.
#[derive(Debug, Clone, Serialize)]
pub struct MinimizationReport {
    /// Number of units in the original input.
    pub original_unit_count: usize,
    /// Number of units in the 1-minimal result.
    pub final_unit_count: usize,
    /// Number of accepted reductions (successful engine iterations).
    pub iterations: usize,
    /// Distinct verdicts recorded in the outcome cache by run's end.
    pub cache_entries: usize,
    /// The 1-minimal configuration itself.
    #[serde(skip)]
    pub final_configuration: Configuration,
}

impl MinimizationReport {
    /// Percentage reduction in unit count, `0.0` if the input was empty.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn reduction_percent(&self) -> f64 {
        if self.original_unit_count == 0 {
            return 0.0;
        }
        100.0 * (1.0 - (self.final_unit_count as f64 / self.original_unit_count as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::UnitId;

    #[test]
    fn reduction_percent_of_an_untouched_input_is_zero() {
        let report = MinimizationReport {
            original_unit_count: 10,
            final_unit_count: 10,
            iterations: 0,
            cache_entries: 0,
            final_configuration: Configuration::universe(10),
        };
        assert!((report.reduction_percent() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn reduction_percent_of_a_fully_minimized_input() {
        let report = MinimizationReport {
            original_unit_count: 8,
            final_unit_count: 2,
            iterations: 4,
            cache_entries: 12,
            final_configuration: Configuration::from_units(&[UnitId(3), UnitId(6)]),
        };
        assert!((report.reduction_percent() - 75.0).abs() < 1e-9);
    }
}
