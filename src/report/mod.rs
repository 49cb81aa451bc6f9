//! Reporters: [`SpecVisitor`](crate::runner::SpecVisitor) implementations that render a run.
//!
//! - `console` - pytest-style progress, failure details, and summary line
//! - `outline` - the specification as a tree of sentences (dry runs, `--list`)
//! - `json` - one JSON object per event
//!
//! Reporters write to any `io::Write`. Write errors do not interrupt the run: the first one is kept and
//! returned by `into_inner`.

pub mod console;
pub mod json;
pub mod outline;

use std::fmt;
use std::io::{self, Write};

pub use console::ConsoleReporter;
pub use json::JsonReporter;
pub use outline::OutlineReporter;

/// A writer that remembers its first error instead of returning it.
struct Output<W> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> Output<W> {
    fn new(out: W) -> Self {
        Self { out, error: None }
    }

    fn write(&mut self, args: fmt::Arguments<'_>) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.out.write_fmt(args) {
            self.error = Some(err);
        }
    }

    fn line(&mut self, args: fmt::Arguments<'_>) {
        self.write(args);
        self.write(format_args!("\n"));
    }

    fn flush(&mut self) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.out.flush() {
            self.error = Some(err);
        }
    }

    fn into_inner(mut self) -> io::Result<W> {
        self.flush();
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.out),
        }
    }
}
