//! Command loop: receive a descriptor, dispatch it, send the framed result.

use remote_tasks_core::{
    Config, LoopEvent, LoopObserver, ProjectSnapshot, TaskRunner, Termination, Transport,
};
use remote_tasks_transport::{TaskResult, normalize_descriptor};

use crate::dispatch::Dispatch;

/// Command loop state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Waiting for the next descriptor.
    Awaiting,
    /// Producing the result for a descriptor.
    Dispatching,
    /// Stopped; absorbing.
    Terminated,
}

/// Outcome of [`CommandLoop::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSummary {
    /// Why the loop stopped.
    pub termination: Termination,
    /// Descriptors dispatched, whether or not the response reached the
    /// controller.
    pub tasks_handled: usize,
}

/// Drives one session over a transport.
///
/// The loop does not own the transport; the caller opens it before
/// [`handshake`](Self::handshake) and closes it after [`run`](Self::run)
/// returns.
pub struct CommandLoop<R, O>
where
    R: TaskRunner,
    O: LoopObserver,
{
    config: Config,
    runner: R,
    observer: O,
    state: LoopState,
}

impl<R, O> CommandLoop<R, O>
where
    R: TaskRunner,
    O: LoopObserver,
{
    /// Create a new command loop.
    #[must_use]
    pub const fn new(config: Config, runner: R, observer: O) -> Self {
        Self {
            config,
            runner,
            observer,
            state: LoopState::Awaiting,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> LoopState {
        self.state
    }

    /// The task runner.
    #[must_use]
    pub const fn runner(&self) -> &R {
        &self.runner
    }

    /// The observer.
    #[must_use]
    pub const fn observer(&self) -> &O {
        &self.observer
    }

    /// Send the unsolicited snapshot of the working directory.
    ///
    /// A failed send is reported to the observer and otherwise ignored.
    pub async fn handshake<T>(&mut self, transport: &mut T)
    where
        T: Transport + ?Sized,
    {
        let message = self.frame(self.snapshot_text());
        match transport.send(&message).await {
            Ok(()) => self.observer.on_event(&LoopEvent::HandshakeSent {
                bytes: message.len(),
            }),
            Err(e) => self.observer.on_event(&LoopEvent::SendFailed {
                error: e.to_string(),
            }),
        }
    }

    /// Answer descriptors until the exit token arrives or the connection
    /// goes away.
    ///
    /// Failed reads are skipped without a reply. After
    /// `config.max_receive_failures` failures in a row the loop gives up.
    pub async fn run<T>(&mut self, transport: &mut T) -> LoopSummary
    where
        T: Transport + ?Sized,
    {
        self.state = LoopState::Awaiting;
        let mut tasks_handled = 0;
        let mut consecutive_failures = 0;

        let termination = loop {
            let raw = match transport.receive(self.config.buffer_size).await {
                Ok(raw) => {
                    consecutive_failures = 0;
                    raw
                }
                Err(e) if e.is_disconnect() => break Termination::ConnectionClosed,
                Err(e) => {
                    consecutive_failures += 1;
                    self.observer.on_event(&LoopEvent::ReceiveFailed {
                        error: e.to_string(),
                        consecutive: consecutive_failures,
                    });
                    if consecutive_failures >= self.config.max_receive_failures {
                        break Termination::ReceiveFailures(consecutive_failures);
                    }
                    continue;
                }
            };

            let descriptor = normalize_descriptor(&raw);
            self.observer.on_event(&LoopEvent::Received {
                descriptor: descriptor.to_string(),
            });

            self.state = LoopState::Dispatching;
            let Some(output) = self.dispatch(descriptor).await else {
                break Termination::ExitRequested;
            };

            let message = self.frame(output);
            self.respond(transport, &message).await;
            tasks_handled += 1;
            self.state = LoopState::Awaiting;
        };

        self.state = LoopState::Terminated;
        self.observer.on_event(&LoopEvent::Terminated { termination });
        LoopSummary {
            termination,
            tasks_handled,
        }
    }

    /// Produce the result for one descriptor, or `None` for the exit token.
    async fn dispatch(&mut self, descriptor: &str) -> Option<String> {
        let output = match Dispatch::classify(descriptor, &self.config) {
            Dispatch::Exit => return None,
            Dispatch::Info => self.snapshot_text(),
            Dispatch::Task => self.runner.execute(descriptor).await,
        };
        self.observer.on_event(&LoopEvent::TaskExecuted {
            descriptor: descriptor.to_string(),
        });
        Some(output)
    }

    async fn respond<T>(&mut self, transport: &mut T, message: &str)
    where
        T: Transport + ?Sized,
    {
        let event = match transport.send(message).await {
            Ok(()) => LoopEvent::Sent {
                bytes: message.len(),
            },
            Err(e) => LoopEvent::SendFailed {
                error: e.to_string(),
            },
        };
        self.observer.on_event(&event);
    }

    /// Snapshot JSON, or the error text if the directory cannot be read.
    fn snapshot_text(&self) -> String {
        let dir = self.runner.working_dir();
        match ProjectSnapshot::capture(dir) {
            Ok(snapshot) => snapshot
                .to_json()
                .unwrap_or_else(|e| format!("failed to encode snapshot: {e}")),
            Err(e) => format!("failed to read {}: {e}", dir.display()),
        }
    }

    /// Frame `output` with the working directory as it is now.
    fn frame(&self, output: String) -> String {
        TaskResult::new(output, self.runner.working_dir()).frame(&self.config.separator)
    }
}
