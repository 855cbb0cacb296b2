//! Aggregated results of a run.

use crate::test_case::{CaseResult, Outcome};
use core::fmt;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub total: usize,
    pub pass: usize,
    pub fail: usize,
    pub inapplicable: usize,
    pub pending: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub counts: Counts,
    pub cases: Vec<CaseResult>,
}

impl Report {
    pub fn new(cases: Vec<CaseResult>) -> Self {
        let mut counts = Counts {
            total: cases.len(),
            ..Counts::default()
        };
        for case in &cases {
            let slot = match case.outcome {
                Outcome::Pass => &mut counts.pass,
                Outcome::Fail => &mut counts.fail,
                Outcome::Inapplicable => &mut counts.inapplicable,
                Outcome::Pending => &mut counts.pending,
            };
            *slot += 1;
        }
        Self { counts, cases }
    }

    /// One progress symbol per case, in execution order.
    pub fn dots(&self) -> String {
        self.cases.iter().map(|case| case.outcome.symbol()).collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = &CaseResult> + '_ {
        self.cases
            .iter()
            .filter(|case| case.outcome == Outcome::Fail)
    }

    pub const fn passed(&self) -> bool {
        self.counts.fail == 0
    }

    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts = &self.counts;
        writeln!(formatter, "{}", self.dots())?;
        writeln!(
            formatter,
            "{} CASES: {} PASS, {} FAIL, {} N/A, {} PENDING",
            counts.total, counts.pass, counts.fail, counts.inapplicable, counts.pending
        )?;
        writeln!(formatter)?;
        for failure in self.failures() {
            writeln!(formatter, "FAILURE: {}", failure.description)?;
            for message in &failure.messages {
                writeln!(formatter, "    {message}")?;
            }
        }
        Ok(())
    }
}
