use crate::error::WorkflowError;
use std::io::{BufRead, Write};

/// The operator gate in front of every warehouse-mutating action.
pub trait Confirmation {
    /// `Ok(true)` to proceed, `Ok(false)` to abort.
    fn confirm(&mut self, question: &str) -> Result<bool, WorkflowError>;
}

/// Asks on `output` and reads answers from `input` until it gets a
/// case-insensitive `y` or `n`. End of input counts as `n`.
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl TerminalPrompt<std::io::StdinLock<'static>, std::io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> Confirmation for TerminalPrompt<R, W> {
    fn confirm(&mut self, question: &str) -> Result<bool, WorkflowError> {
        loop {
            write!(self.output, "{question} (y/n) ").map_err(WorkflowError::Prompt)?;
            self.output.flush().map_err(WorkflowError::Prompt)?;

            let mut answer = String::new();
            if self.input.read_line(&mut answer).map_err(WorkflowError::Prompt)? == 0 {
                writeln!(self.output).map_err(WorkflowError::Prompt)?;
                tracing::warn!("No answer on input; treating as 'n'");
                return Ok(false);
            }

            match answer.trim().to_lowercase().as_str() {
                "y" => return Ok(true),
                "n" => return Ok(false),
                _ => writeln!(self.output, "Invalid response. Please enter 'y' or 'n'").map_err(WorkflowError::Prompt)?,
            }
        }
    }
}

/// Answers yes without asking. Only reachable through an explicit `--yes`.
pub struct AutoApprove;

impl Confirmation for AutoApprove {
    fn confirm(&mut self, question: &str) -> Result<bool, WorkflowError> {
        tracing::info!(question, "Confirmation skipped (--yes)");
        Ok(true)
    }
}
