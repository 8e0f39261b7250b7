//! Output sink shared by builtins and the debugger.
//!
//! Program output and debugger messages go through the same sink so they
//! interleave in the order they were produced. Tests use the buffer sink to
//! capture a whole session as one string.

use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;

enum Sink {
    Stdout,
    Buffer(String),
}

#[derive(Clone)]
pub struct Output {
    sink: Arc<Mutex<Sink>>,
}

impl Output {
    /// Writes to the process's standard output.
    pub fn stdout() -> Self {
        Self {
            sink: Arc::new(Mutex::new(Sink::Stdout)),
        }
    }

    /// Captures everything in memory.
    pub fn buffer() -> Self {
        Self {
            sink: Arc::new(Mutex::new(Sink::Buffer(String::new()))),
        }
    }

    /// Write without a trailing newline.
    pub fn print(&self, msg: &str) {
        match &mut *self.sink.lock() {
            Sink::Stdout => {
                let mut stdout = io::stdout().lock();
                if let Err(error) = stdout.write_all(msg.as_bytes()).and_then(|_| stdout.flush()) {
                    tracing::warn!(%error, "failed to write to stdout");
                }
            }
            Sink::Buffer(buffer) => buffer.push_str(msg),
        }
    }

    pub fn println(&self, msg: &str) {
        self.print(&format!("{}\n", msg));
    }

    /// Everything captured so far. Always empty for stdout.
    pub fn contents(&self) -> String {
        match &*self.sink.lock() {
            Sink::Stdout => String::new(),
            Sink::Buffer(buffer) => buffer.clone(),
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::stdout()
    }
}
