//! Interactive yes/no prompts on the terminal.

use std::io::Write as _;

use async_trait::async_trait;
use jobharvest_fetch::Confirmer;
use tokio::io::{AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::Mutex;
use tracing::debug;

/// Asks on stderr and reads the answer from stdin.
///
/// Only `y` or `yes` (any case) count as yes. End of input counts as no.
pub struct StdinConfirmer {
    reader: Mutex<BufReader<Stdin>>,
}

impl StdinConfirmer {
    pub fn new() -> Self {
        Self {
            reader: Mutex::new(BufReader::new(tokio::io::stdin())),
        }
    }
}

impl Default for StdinConfirmer {
    fn default() -> Self {
        Self::new()
    }
}

/// Interprets a typed answer.
pub fn is_yes(answer: &str) -> bool {
    let answer = answer.trim();
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}

#[async_trait]
impl Confirmer for StdinConfirmer {
    async fn confirm(&self, prompt: &str) -> bool {
        {
            let mut stderr = std::io::stderr().lock();
            let _ = write!(stderr, "{prompt} (y/n): ");
            let _ = stderr.flush();
        }

        let mut line = String::new();
        let mut reader = self.reader.lock().await;
        match reader.read_line(&mut line).await {
            Ok(0) => {
                debug!("Prompt input closed, treating as no");
                false
            }
            Ok(_) => is_yes(&line),
            Err(e) => {
                debug!(error = %e, "Failed to read prompt answer");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y"));
        assert!(is_yes("Y\n"));
        assert!(is_yes(" yes "));
        assert!(!is_yes(""));
        assert!(!is_yes("n"));
        assert!(!is_yes("yep"));
    }
}
