#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// The run completed and a report was produced. A 0% success rate is a
    /// valid, reportable outcome, not a harness failure.
    Success = 0,

    /// Invalid configuration, unreachable target, or an internal failure.
    /// No report is produced in any of these cases.
    Failure = 1,
}

impl ExitCode {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}
