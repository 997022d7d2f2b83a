//! Session controller
//!
//! Resolves requested action tokens against the target registry and runs
//! them through the sequencer, either as a batch of tokens supplied on the
//! command line or as an interactive menu loop. The controller never
//! terminates the process itself; it returns to its caller, which performs
//! the final line release and exits.

use std::io::Write as _;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use crate::atx::registry::EXIT_SENTINEL;
use crate::atx::{ActionKind, ActionSequencer, TargetRegistry};
use crate::error::Result;

/// What the session does after handling one token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// Keep processing (re-prompt, or move to the next batch token)
    Continue,
    /// End the session gracefully
    Terminate,
}

/// One console session: a target registry plus the sequencer acting on it
pub struct Session {
    registry: TargetRegistry,
    sequencer: ActionSequencer,
}

impl Session {
    pub fn new(registry: TargetRegistry, sequencer: ActionSequencer) -> Self {
        Self {
            registry,
            sequencer,
        }
    }

    /// Run a fixed list of tokens, in order, then return
    ///
    /// Unresolved tokens are reported and skipped; only a hardware failure
    /// aborts the batch. The exit sentinel stops processing early.
    pub async fn run_batch(&self, tokens: &[String]) -> Result<()> {
        for token in tokens {
            if self.handle_token(token.trim()).await? == Step::Terminate {
                break;
            }
        }
        Ok(())
    }

    /// Run the menu loop until the exit sentinel or end of input
    pub async fn run_interactive<R>(&self, input: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        loop {
            self.print_menu();

            let Some(line) = lines.next_line().await? else {
                // End of input is a graceful exit, same as the sentinel
                println!();
                debug!("End of input, leaving menu");
                return Ok(());
            };

            if self.handle_token(line.trim()).await? == Step::Terminate {
                return Ok(());
            }
            println!();
        }
    }

    /// Resolve and execute one token
    async fn handle_token(&self, token: &str) -> Result<Step> {
        if token == EXIT_SENTINEL {
            println!("Exit");
            return Ok(Step::Terminate);
        }

        match self.registry.resolve(token) {
            Some(action) => {
                println!(
                    "    {} \"{}\" (pin {}).",
                    verb(action.kind),
                    action.target.label,
                    action.kind.line(action.target)
                );
                let report = self.sequencer.pulse(action.target, action.kind).await?;
                debug!(
                    "Completed {} of \"{}\" on line {}",
                    report.kind, report.label, report.line
                );
                println!("Done");
            }
            None => {
                debug!("Unresolved token {:?}", token);
                println!("Invalid action requested");
            }
        }
        Ok(Step::Continue)
    }

    fn print_menu(&self) {
        println!("Actions:");
        for (i, target) in self.registry.targets().iter().enumerate() {
            println!("  {}1: Power on \"{}\"", i + 1, target.label);
            println!("  {}2: Power off \"{}\"", i + 1, target.label);
            println!("  {}3: Reboot \"{}\"", i + 1, target.label);
        }
        println!("  {}: Exit\n", EXIT_SENTINEL);
        println!("What action do you want to start ?");
        print!("---> ");
        let _ = std::io::stdout().flush();
    }
}

fn verb(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::PowerOn => "Powering on",
        ActionKind::PowerOff => "Shutting down",
        ActionKind::Reboot => "Rebooting",
    }
}
