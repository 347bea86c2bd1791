//! Row accounting for join stages that may silently drop rows.

use serde::Serialize;

/// Rows entering and leaving one join/filter stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinAudit {
    pub stage: String,
    pub rows_in: usize,
    pub rows_out: usize,
}

impl JoinAudit {
    pub fn new(stage: impl Into<String>, rows_in: usize, rows_out: usize) -> Self {
        Self {
            stage: stage.into(),
            rows_in,
            rows_out,
        }
    }

    /// Rows that did not survive the stage. Zero when a join fans out.
    pub fn dropped(&self) -> usize {
        self.rows_in.saturating_sub(self.rows_out)
    }

    /// Emit the audit through `tracing`; losses are warnings.
    pub fn log(&self) {
        if self.dropped() > 0 {
            tracing::warn!(
                stage = %self.stage,
                rows_in = self.rows_in,
                rows_out = self.rows_out,
                "{} rows dropped by {}",
                self.dropped(),
                self.stage
            );
        } else {
            tracing::info!(
                stage = %self.stage,
                rows_in = self.rows_in,
                rows_out = self.rows_out,
                "no rows lost"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dropped_saturates_on_fan_out() {
        assert_eq!(JoinAudit::new("annotate", 10, 7).dropped(), 3);
        assert_eq!(JoinAudit::new("annotate", 3, 5).dropped(), 0);
    }
}
