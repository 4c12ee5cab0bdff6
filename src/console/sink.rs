use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// ANSI sequence that clears the viewport and homes the cursor.
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[1;1H";

/// The serialized console output sink.
///
/// Command results, prompts, and event-handler lines all funnel through one
/// mutex-guarded writer. The command loop and the server's connection tasks
/// write concurrently; holding the lock for a full line keeps their output
/// from interleaving mid-line.
pub struct ConsoleSink {
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleSink {
    /// A sink writing to the process's standard output.
    pub fn stdout() -> Arc<Self> {
        Self::from_writer(Box::new(io::stdout()))
    }

    /// A sink writing to an arbitrary writer. Tests use this to capture
    /// console output.
    pub fn from_writer(out: Box<dyn Write + Send>) -> Arc<Self> {
        Arc::new(Self {
            out: Mutex::new(out),
        })
    }

    /// Writes one line followed by a newline and flushes.
    pub fn line(&self, text: &str) -> io::Result<()> {
        let mut out = self.out.lock().unwrap();
        writeln!(out, "{}", text)?;
        out.flush()
    }

    /// Writes text without a trailing newline and flushes, leaving the
    /// cursor at the end of the prompt.
    pub fn prompt(&self, text: &str) -> io::Result<()> {
        let mut out = self.out.lock().unwrap();
        write!(out, "{}", text)?;
        out.flush()
    }

    /// Clears the terminal viewport.
    pub fn clear_screen(&self) -> io::Result<()> {
        let mut out = self.out.lock().unwrap();
        write!(out, "{}", CLEAR_SCREEN)?;
        out.flush()
    }
}
