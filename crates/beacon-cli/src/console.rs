//! Terminal [`Ui`] for the `beacon` binary.
//!
//! Headlines are rendered as `==> {prefix}: ...`, detail lines indented
//! under them. Errors go to the error stream.

use std::io::{Stderr, Stdout, Write};

use beacon_core::Ui;
use parking_lot::Mutex;

pub struct ConsoleUi<O, E> {
    prefix: String,
    out: Mutex<O>,
    err: Mutex<E>,
}

impl ConsoleUi<Stdout, Stderr> {
    pub fn stdio(prefix: impl Into<String>) -> Self {
        Self::new(prefix, std::io::stdout(), std::io::stderr())
    }
}

impl<O: Write + Send, E: Write + Send> ConsoleUi<O, E> {
    pub fn new(prefix: impl Into<String>, out: O, err: E) -> Self {
        Self {
            prefix: prefix.into(),
            out: Mutex::new(out),
            err: Mutex::new(err),
        }
    }

    pub fn into_inner(self) -> (O, E) {
        (self.out.into_inner(), self.err.into_inner())
    }
}

// A broken terminal is not a publish failure; write errors are dropped.
impl<O: Write + Send, E: Write + Send> Ui for ConsoleUi<O, E> {
    fn say(&self, message: &str) {
        let _ = writeln!(self.out.lock(), "==> {}: {message}", self.prefix);
    }

    fn message(&self, message: &str) {
        let _ = writeln!(self.out.lock(), "    {}: {message}", self.prefix);
    }

    fn error(&self, message: &str) {
        let _ = writeln!(self.err.lock(), "==> {}: {message}", self.prefix);
    }
}
