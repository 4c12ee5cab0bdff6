use std::io::{self, Cursor, Write};
use std::sync::{Arc, Mutex};

use tcp_console::console::{ConsoleSink, InputCollector};

/// A cloneable writer that captures console output for assertions.
#[derive(Clone, Default)]
pub struct CapturedOutput {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CapturedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
    }
}

impl Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Builds an input collector fed from a script plus a sink capturing
/// everything the console writes.
#[allow(dead_code)]
pub fn scripted_console(
    script: &str,
) -> (
    InputCollector<Cursor<Vec<u8>>>,
    Arc<ConsoleSink>,
    CapturedOutput,
) {
    let output = CapturedOutput::new();
    let sink = ConsoleSink::from_writer(Box::new(output.clone()));
    let input = InputCollector::new(Cursor::new(script.as_bytes().to_vec()), sink.clone());
    (input, sink, output)
}
