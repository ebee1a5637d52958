//! Ordered startup protocol on top of the command bus.
//!
//! Subscribe first, wait out a bounded settling delay, then issue a fixed
//! list of commands strictly one after another. Later commands can depend
//! on engine state changes made by earlier ones, so step N+1 is never
//! transmitted before step N's outcome is observed.

use std::time::Duration;

use blockline_protocol::CommandOutcome;

use crate::correlator::{CommandBus, CommandError};

/// Progress of a startup sequence. No backward transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceState {
    Idle,
    Subscribing,
    AwaitingSettle,
    RunningStep(usize),
    Completed,
    /// Transport failure; the sequence is not retried
    Failed,
}

pub struct StartupSequence {
    subscribe_event: String,
    settle: Duration,
    commands: Vec<String>,
    state: SequenceState,
}

impl StartupSequence {
    pub fn new(
        subscribe_event: impl Into<String>,
        settle: Duration,
        commands: Vec<String>,
    ) -> Self {
        Self {
            subscribe_event: subscribe_event.into(),
            settle,
            commands,
            state: SequenceState::Idle,
        }
    }

    pub fn state(&self) -> SequenceState {
        self.state
    }

    /// Run the sequence to completion.
    ///
    /// The settling delay is a bounded wait, not a correlation: the engine
    /// is not guaranteed to acknowledge subscriptions before it starts
    /// accepting commands. A logically-failed command does not abort the
    /// sequence; a transport failure does.
    pub async fn run(&mut self, bus: &CommandBus) -> Result<Vec<CommandOutcome>, CommandError> {
        self.state = SequenceState::Subscribing;
        tracing::info!(event = %self.subscribe_event, "subscribing to engine events");
        if let Err(e) = bus.subscribe(&self.subscribe_event).await {
            self.state = SequenceState::Failed;
            tracing::error!("subscribe failed: {e}");
            return Err(e);
        }

        self.state = SequenceState::AwaitingSettle;
        tokio::time::sleep(self.settle).await;

        let total = self.commands.len();
        let mut outcomes = Vec::with_capacity(total);
        for index in 0..total {
            self.state = SequenceState::RunningStep(index);
            let line = self.commands[index].clone();
            tracing::info!(step = index + 1, total, command = %line, "issuing startup command");

            match bus.command(line).await {
                Ok(outcome) => {
                    if !outcome.is_success() {
                        tracing::warn!(
                            step = index + 1,
                            status_message = outcome.status_message.as_deref().unwrap_or(""),
                            "startup command failed logically, continuing"
                        );
                    }
                    outcomes.push(outcome);
                }
                Err(e) => {
                    self.state = SequenceState::Failed;
                    tracing::error!(step = index + 1, "startup command failed: {e}");
                    return Err(e);
                }
            }
        }

        self.state = SequenceState::Completed;
        tracing::info!("startup sequence complete, connection stays open for events");
        Ok(outcomes)
    }
}
