//! Command lifecycle state machine.
//!
//! States run `Created → Validated → Gated → {Executed | Skipped} →
//! Finalized`. The terminal state is always `Finalized`: failures are
//! recorded as aggregator entries, never as aborted execution.

use std::time::{Duration, Instant};

use crate::command::Command;
use crate::context::RequestContext;
use crate::errors::{ErrorAggregator, SystemFault};

/// Lifecycle states for one command invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Lifecycle constructed, nothing run yet.
    Created,
    /// Parameter validation has completed (possibly with faults recorded).
    Validated,
    /// The execute-or-skip decision has been latched.
    Gated,
    /// The primary operation ran (possibly recording a fault).
    Executed,
    /// The primary operation was not invoked.
    Skipped,
    /// Finalize ran; the lifecycle is terminal.
    Finalized,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Created => "created",
            LifecycleState::Validated => "validated",
            LifecycleState::Gated => "gated",
            LifecycleState::Executed => "executed",
            LifecycleState::Skipped => "skipped",
            LifecycleState::Finalized => "finalized",
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors for out-of-order lifecycle transitions.
///
/// These are programming errors in the driver, not request failures.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("lifecycle for '{command}' is in state '{found}', expected '{expected}'")]
    OutOfOrder {
        command: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Observer hook for lifecycle transitions.
pub trait LifecycleObserver {
    /// Called after each transition with total elapsed time.
    fn on_transition(&self, command: &str, state: LifecycleState, elapsed: Duration);
}

/// Per-state timing marks for one lifecycle run.
#[derive(Debug, Clone)]
pub struct StateTimer {
    start: Instant,
    marks: Vec<(LifecycleState, Duration)>,
}

impl StateTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
            marks: Vec::new(),
        }
    }

    fn mark(&mut self, state: LifecycleState) {
        self.marks.push((state, self.start.elapsed()));
    }

    /// Time from lifecycle start to the given state, if reached.
    pub fn mark_for(&self, state: LifecycleState) -> Option<Duration> {
        self.marks.iter().find(|(s, _)| *s == state).map(|(_, d)| *d)
    }

    /// Total elapsed time since lifecycle start.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Post-primary steps run during finalize.
///
/// The optional-operation registry plugs in through this seam so the
/// state machine stays independent of how secondary steps are organized.
pub trait FinalizeSteps {
    fn run(&mut self, ctx: &RequestContext, errors: &mut ErrorAggregator);
}

/// Finalize steps for commands with no secondary operations.
#[derive(Debug, Default)]
pub struct NoFinalizeSteps;

impl FinalizeSteps for NoFinalizeSteps {
    fn run(&mut self, _ctx: &RequestContext, _errors: &mut ErrorAggregator) {}
}

/// The request-lifecycle state machine.
///
/// Binds one command, one request context, and one `ErrorAggregator` for
/// the duration of a request. Every fault raised by a hook is caught at
/// the step boundary and recorded; the pipeline never aborts early.
pub struct CommandLifecycle<C: Command> {
    command: C,
    ctx: RequestContext,
    errors: ErrorAggregator,
    state: LifecycleState,
    should_execute: Option<bool>,
    timer: StateTimer,
    observer: Option<Box<dyn LifecycleObserver>>,
}

impl<C: Command> CommandLifecycle<C> {
    /// Bind a command to a request context.
    pub fn new(command: C, ctx: RequestContext) -> Self {
        Self {
            command,
            ctx,
            errors: ErrorAggregator::new(),
            state: LifecycleState::Created,
            should_execute: None,
            timer: StateTimer::new(),
            observer: None,
        }
    }

    /// Attach a transition observer.
    pub fn with_observer(mut self, observer: Box<dyn LifecycleObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Current state.
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// The bound request context.
    pub fn context(&self) -> &RequestContext {
        &self.ctx
    }

    /// The request's fault channels.
    pub fn errors(&self) -> &ErrorAggregator {
        &self.errors
    }

    /// Mutable access to the fault channels.
    pub fn errors_mut(&mut self) -> &mut ErrorAggregator {
        &mut self.errors
    }

    /// The bound command.
    pub fn command(&self) -> &C {
        &self.command
    }

    /// The latched gate decision, once computed.
    pub fn should_execute(&self) -> Option<bool> {
        self.should_execute
    }

    /// Per-state timing marks.
    pub fn timer(&self) -> &StateTimer {
        &self.timer
    }

    /// `Created → Validated`: run the command's parameter validation.
    ///
    /// Validation failures land in the application channel via the hook; a
    /// crash lands in the system channel. The state advances regardless.
    pub fn validate(&mut self) -> Result<(), LifecycleError> {
        self.expect(LifecycleState::Created)?;
        if let Err(cause) = self.command.validate(&self.ctx, &mut self.errors) {
            self.errors.add_system_fault(SystemFault::internal(cause));
        }
        self.advance(LifecycleState::Validated);
        Ok(())
    }

    /// `Validated → Gated`: latch the execute-or-skip decision.
    ///
    /// The decision is computed once from the channels as they stand now;
    /// later faults never change it. Returns whether the gate is open.
    pub fn gate(&mut self) -> Result<bool, LifecycleError> {
        self.expect(LifecycleState::Validated)?;
        let open = !self.errors.has_errors();
        self.should_execute = Some(open);
        self.advance(LifecycleState::Gated);
        Ok(open)
    }

    /// `Gated → Executed | Skipped`: run the primary operation if gated open.
    pub fn run_primary(&mut self) -> Result<(), LifecycleError> {
        self.expect(LifecycleState::Gated)?;
        if self.should_execute == Some(true) {
            if let Err(cause) = self.command.execute(&self.ctx) {
                self.errors.add_system_fault(SystemFault::internal(cause));
            }
            self.advance(LifecycleState::Executed);
        } else {
            self.advance(LifecycleState::Skipped);
        }
        Ok(())
    }

    /// `Executed | Skipped → Finalized`: run post-primary steps.
    ///
    /// Runs unconditionally, whatever the gate decided and whatever faults
    /// were recorded, so a response can always be produced.
    pub fn finalize(&mut self, steps: &mut dyn FinalizeSteps) -> Result<(), LifecycleError> {
        match self.state {
            LifecycleState::Executed | LifecycleState::Skipped => {}
            found => {
                return Err(LifecycleError::OutOfOrder {
                    command: self.command.name().to_string(),
                    expected: "executed|skipped",
                    found: found.as_str(),
                })
            }
        }
        steps.run(&self.ctx, &mut self.errors);
        self.advance(LifecycleState::Finalized);
        Ok(())
    }

    /// Drive the lifecycle from `Created` straight to `Finalized`.
    pub fn run_to_completion(&mut self, steps: &mut dyn FinalizeSteps) -> Result<(), LifecycleError> {
        self.validate()?;
        self.gate()?;
        self.run_primary()?;
        self.finalize(steps)
    }

    /// Tear down a finalized lifecycle into its parts for envelope building.
    pub fn into_parts(self) -> (C, RequestContext, ErrorAggregator) {
        (self.command, self.ctx, self.errors)
    }

    fn expect(&self, expected: LifecycleState) -> Result<(), LifecycleError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(LifecycleError::OutOfOrder {
                command: self.command.name().to_string(),
                expected: expected.as_str(),
                found: self.state.as_str(),
            })
        }
    }

    fn advance(&mut self, next: LifecycleState) {
        self.state = next;
        self.timer.mark(next);
        tracing::debug!(
            command = self.command.name(),
            state = next.as_str(),
            "lifecycle advanced"
        );
        if let Some(observer) = &self.observer {
            observer.on_transition(self.command.name(), next, self.timer.elapsed());
        }
    }
}
