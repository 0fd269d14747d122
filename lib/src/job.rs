use std::fmt;

use crate::error::Result;

/// What a job did to a single file.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The file was rewritten.
    Changed,
    /// The file already had the desired content.
    Unchanged,
    /// The file was missing, not a file, or not eligible.
    Skipped,
}

/// Per-job tally of outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub job: &'static str,
    pub changed: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// A single-pass batch job over files on disk.
///
/// Jobs handle per-file problems themselves: a missing or unreadable file is
/// logged, tallied in the [`Report`], and the job moves on. An `Err` from
/// [`Job::run()`] means the job could not start at all, e.g. because the
/// site directory is missing.
pub trait Job {
    fn name(&self) -> &'static str;

    fn run(&self) -> Result<Report>;
}

impl Report {
    pub fn new(job: &'static str) -> Self {
        Report { job, ..Default::default() }
    }

    /// Tallies the outcome for `subject`, logging failures.
    pub fn record<S: fmt::Display>(&mut self, subject: S, result: Result<Outcome>) {
        match result {
            Ok(Outcome::Changed) => self.changed += 1,
            Ok(Outcome::Unchanged) => self.unchanged += 1,
            Ok(Outcome::Skipped) => self.skipped += 1,
            Err(e) => {
                tracing::error!(job = self.job, %subject, "{}", e.to_string().trim_end());
                self.failed += 1;
            }
        }
    }

    pub fn total(&self) -> usize {
        self.changed + self.unchanged + self.skipped + self.failed
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} changed, {} unchanged, {} skipped, {} failed",
            self.job, self.changed, self.unchanged, self.skipped, self.failed)
    }
}

/// Runs `jobs` one after another. A job that fails to run is logged and does
/// not prevent the jobs after it from running.
pub fn run_all(jobs: &[&dyn Job]) -> Vec<Result<Report>> {
    jobs.iter()
        .map(|job| {
            let _span = tracing::info_span!("job", name = job.name()).entered();
            let result = job.run();
            match &result {
                Ok(report) => tracing::info!("{report}"),
                Err(e) => tracing::error!("job did not run: {}", e.to_string().trim_end()),
            }

            result
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scripted(&'static str, Vec<Option<Outcome>>);

    impl Job for Scripted {
        fn name(&self) -> &'static str { self.0 }

        fn run(&self) -> Result<Report> {
            if self.1.is_empty() {
                return err!("nothing to do");
            }

            let mut report = Report::new(self.0);
            for (i, outcome) in self.1.iter().enumerate() {
                report.record(i, outcome.ok_or_else(|| error!("io")));
            }

            Ok(report)
        }
    }

    #[test]
    fn report_tallies_each_outcome() {
        let mut report = Report::new("canonicals");
        report.record("a", Ok(Outcome::Changed));
        report.record("b", Ok(Outcome::Changed));
        report.record("c", Ok(Outcome::Unchanged));
        report.record("d", Ok(Outcome::Skipped));
        report.record("e", Err(error!("boom")));

        assert_eq!(report.total(), 5);
        assert!(report.has_failures());
        assert_eq!(report.to_string(), "canonicals: 2 changed, 1 unchanged, 1 skipped, 1 failed");
    }

    #[test]
    fn failing_job_does_not_stop_the_rest() {
        let first = Scripted("first", vec![]);
        let second = Scripted("second", vec![Some(Outcome::Changed), None]);

        let results = run_all(&[&first as &dyn Job, &second]);
        assert_eq!(results.len(), 2);
        assert!(results[0].is_err());

        let report = results[1].as_ref().unwrap();
        assert_eq!((report.job, report.changed, report.failed), ("second", 1, 1));
    }
}
