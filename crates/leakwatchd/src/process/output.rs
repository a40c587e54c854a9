use std::fmt;
use std::io::Write;

use super::errors::SupervisorError;

/// Output handle abstracting over the operator's stdout/stderr writers.
pub struct LifecycleOutput<W: Write, E: Write> {
    /// Standard output writer.
    pub stdout: W,
    /// Standard error writer.
    pub stderr: E,
}

impl<W: Write, E: Write> LifecycleOutput<W, E> {
    /// Wraps the given writers.
    pub const fn new(stdout: W, stderr: E) -> Self {
        Self { stdout, stderr }
    }

    /// Writes one line to stderr and flushes it.
    ///
    /// # Errors
    ///
    /// Returns [`SupervisorError::Output`] when the writer fails.
    pub fn stderr_line(&mut self, args: fmt::Arguments<'_>) -> Result<(), SupervisorError> {
        self.stderr.write_fmt(args).map_err(SupervisorError::Output)?;
        self.stderr.write_all(b"\n").map_err(SupervisorError::Output)?;
        self.stderr.flush().map_err(SupervisorError::Output)
    }
}
