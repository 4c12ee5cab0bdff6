use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use crate::console::sink::ConsoleSink;

/// Collects scalar values from the operator, with defaults and
/// re-prompt-on-invalid-input semantics.
///
/// Generic over the line source so tests can drive it with scripted input.
/// Prompts are written through the shared console sink; reads block the
/// calling task until a line arrives.
pub struct InputCollector<R> {
    reader: BufReader<R>,
    sink: Arc<ConsoleSink>,
}

impl<R: AsyncRead + Unpin> InputCollector<R> {
    pub fn new(source: R, sink: Arc<ConsoleSink>) -> Self {
        Self {
            reader: BufReader::new(source),
            sink,
        }
    }

    /// Reads the next input line, stripped of its line terminator. Returns
    /// `None` at end of input.
    pub async fn next_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line).await?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Reads the next line, treating end of input as an error. Used inside
    /// prompts that must produce a value.
    async fn required_line(&mut self) -> io::Result<String> {
        self.next_line().await?.ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "console input closed")
        })
    }

    /// Prompts for a string, showing `default` in brackets when non-empty.
    ///
    /// Blank input resolves to the default when one is set. With no default,
    /// blank input yields `None` if `allow_empty` and re-prompts otherwise,
    /// so `allow_empty = false` prompts never return `None`.
    pub async fn ask_string(
        &mut self,
        question: &str,
        default: &str,
        allow_empty: bool,
    ) -> io::Result<Option<String>> {
        loop {
            let mut prompt = String::from(question);
            if !default.is_empty() {
                prompt.push_str(&format!(" [{}]", default));
            }
            prompt.push(' ');
            self.sink.prompt(&prompt)?;

            let line = self.required_line().await?;

            if line.is_empty() {
                if !default.is_empty() {
                    return Ok(Some(default.to_string()));
                }
                if allow_empty {
                    return Ok(None);
                }
                continue;
            }

            return Ok(Some(line));
        }
    }

    /// Prompts for a yes/no answer, returning `default_yes` on blank input.
    ///
    /// Matching is deliberately permissive: with a yes default, only `n`/`no`
    /// (any case) answer no; with a no default, only `y`/`yes` answer yes.
    /// Any other non-blank input takes the default's branch value.
    pub async fn ask_bool(&mut self, question: &str, default_yes: bool) -> io::Result<bool> {
        let suffix = if default_yes { " [Y/n]? " } else { " [y/N]? " };
        self.sink.prompt(&format!("{}{}", question, suffix))?;

        let line = self.required_line().await?;

        if line.is_empty() {
            return Ok(default_yes);
        }

        let answer = line.to_lowercase();
        if default_yes {
            Ok(!matches!(answer.as_str(), "n" | "no"))
        } else {
            Ok(matches!(answer.as_str(), "y" | "yes"))
        }
    }

    /// Prompts for an integer, returning `default` on blank input.
    ///
    /// Non-numeric input reports an error and re-prompts. A zero value is
    /// only short-circuited when `allow_zero` is set; otherwise it falls
    /// through the range checks below and is returned as-is. Negative values
    /// re-prompt only when `positive_only` is set.
    pub async fn ask_int(
        &mut self,
        question: &str,
        default: i32,
        positive_only: bool,
        allow_zero: bool,
    ) -> io::Result<i32> {
        loop {
            self.sink.prompt(&format!("{} [{}] ", question, default))?;

            let line = self.required_line().await?;

            if line.is_empty() {
                return Ok(default);
            }

            let value: i32 = match line.parse() {
                Ok(value) => value,
                Err(_) => {
                    self.sink.line("Please enter a valid integer.")?;
                    continue;
                }
            };

            if value == 0 && allow_zero {
                return Ok(0);
            }

            if value < 0 && positive_only {
                self.sink.line("Please enter a value greater than zero.")?;
                continue;
            }

            return Ok(value);
        }
    }
}
