use crate::config::ClientConfig;
use crate::request::{
    encode_extend, encode_generate, encode_transform, encode_undo, EncodedRequest,
};
use crate::response::{decode_poll, decode_submit, PollDecision, SubmitDecision};
use crate::transport::{Backend, RawResponse};
use crate::types::{
    ClientEvent, ExtendParams, GenerateParams, OperationKind, TransformParams, UndoParams,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

const STATUS_SHORT_MS: u32 = 2_000;
const STATUS_LONG_MS: u32 = 4_000;

/// Commands the UI sends to the controller task. Every operation-initiating
/// command silently replaces whatever operation is currently in flight.
#[derive(Debug, Clone)]
pub enum Command {
    Generate(GenerateParams),
    /// Extend-by-audio: same parameters as generate, different endpoint.
    ContinueAudio(GenerateParams),
    Extend(ExtendParams),
    Transform(TransformParams),
    Undo(UndoParams),
    Cancel,
    /// Set by the health-check collaborator; while false, every operation
    /// fails fast without touching the network.
    SetConnected(bool),
}

/// Cloneable handle the UI keeps; dropping every handle shuts the controller
/// down once in-flight work drains.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    command_tx: UnboundedSender<Command>,
}

impl ClientHandle {
    pub fn generate(&self, params: GenerateParams) {
        let _ = self.command_tx.send(Command::Generate(params));
    }

    pub fn continue_audio(&self, params: GenerateParams) {
        let _ = self.command_tx.send(Command::ContinueAudio(params));
    }

    pub fn extend(&self, params: ExtendParams) {
        let _ = self.command_tx.send(Command::Extend(params));
    }

    pub fn transform(&self, params: TransformParams) {
        let _ = self.command_tx.send(Command::Transform(params));
    }

    pub fn undo(&self, params: UndoParams) {
        let _ = self.command_tx.send(Command::Undo(params));
    }

    pub fn cancel(&self) {
        let _ = self.command_tx.send(Command::Cancel);
    }

    pub fn set_connected(&self, connected: bool) {
        let _ = self.command_tx.send(Command::SetConnected(connected));
    }
}

/// Spawns the controller task and returns the handle plus the event stream.
pub fn spawn(
    config: ClientConfig,
    backend: Arc<dyn Backend>,
) -> (ClientHandle, UnboundedReceiver<ClientEvent>) {
    let (command_tx, command_rx) = unbounded_channel();
    let (event_tx, event_rx) = unbounded_channel();
    let (task_tx, task_rx) = unbounded_channel();

    let controller = Controller {
        backend,
        config,
        event_tx,
        task_tx,
        connected: false,
        active: None,
        next_epoch: 0,
    };
    tokio::spawn(controller.run(command_rx, task_rx));

    (ClientHandle { command_tx }, event_rx)
}

/// Messages worker tasks send back into the controller loop. The epoch pins
/// each message to the operation that spawned the task, so a response from a
/// superseded operation is dropped instead of being misattributed.
enum TaskResult {
    Submitted { epoch: u64, raw: RawResponse },
    Polled { epoch: u64, raw: RawResponse },
}

enum Phase {
    Submitting,
    Polling { session_id: String, poll_task: JoinHandle<()> },
}

struct ActiveOp {
    epoch: u64,
    kind: OperationKind,
    phase: Phase,
}

impl ActiveOp {
    fn stop_polling(self) {
        if let Phase::Polling { poll_task, .. } = self.phase {
            poll_task.abort();
        }
    }
}

/// Owns all mutable client state. Commands and worker results funnel through
/// one loop, so `active` has a single writer and needs no locking.
struct Controller {
    backend: Arc<dyn Backend>,
    config: ClientConfig,
    event_tx: UnboundedSender<ClientEvent>,
    task_tx: UnboundedSender<TaskResult>,
    connected: bool,
    active: Option<ActiveOp>,
    next_epoch: u64,
}

impl Controller {
    async fn run(
        mut self,
        mut command_rx: UnboundedReceiver<Command>,
        mut task_rx: UnboundedReceiver<TaskResult>,
    ) {
        loop {
            tokio::select! {
                command = command_rx.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(result) = task_rx.recv() => self.handle_task_result(result),
            }
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Generate(params) => {
                self.start_operation(OperationKind::Generate, encode_generate(&params, false));
            }
            Command::ContinueAudio(params) => {
                self.start_operation(OperationKind::Continue, encode_generate(&params, true));
            }
            Command::Extend(params) => {
                self.start_operation(OperationKind::Extend, encode_extend(&params));
            }
            Command::Transform(params) => {
                self.start_operation(OperationKind::Transform, encode_transform(&params));
            }
            Command::Undo(params) => {
                self.start_operation(OperationKind::Undo, encode_undo(&params));
            }
            Command::Cancel => self.cancel_current_operation(),
            Command::SetConnected(connected) => {
                self.connected = connected;
            }
        }
    }

    fn start_operation(&mut self, kind: OperationKind, request: EncodedRequest) {
        if !self.connected {
            self.emit(ClientEvent::Error {
                message: "Backend not connected. Start the backend and try again.".into(),
            });
            return;
        }

        // Replacing an in-flight operation is a silent takeover; its worker
        // results become stale by epoch and get dropped on arrival.
        if let Some(previous) = self.active.take() {
            info!("superseding in-flight {} operation", previous.kind.label());
            previous.stop_polling();
        }

        self.next_epoch += 1;
        let epoch = self.next_epoch;
        self.active = Some(ActiveOp { epoch, kind, phase: Phase::Submitting });

        let backend = self.backend.clone();
        let task_tx = self.task_tx.clone();
        tokio::spawn(async move {
            let raw = backend.submit(request.path, &request.body).await;
            let _ = task_tx.send(TaskResult::Submitted { epoch, raw });
        });
    }

    fn cancel_current_operation(&mut self) {
        // Idempotent: a second cancel finds no active operation and is silent.
        let Some(active) = self.active.take() else {
            return;
        };
        debug!("cancelling {} operation", active.kind.label());
        active.stop_polling();
        self.emit(ClientEvent::Status {
            message: "Operation cancelled".into(),
            duration_ms: STATUS_SHORT_MS,
        });
    }

    fn handle_task_result(&mut self, result: TaskResult) {
        match result {
            TaskResult::Submitted { epoch, raw } => self.handle_submitted(epoch, &raw),
            TaskResult::Polled { epoch, raw } => self.handle_polled(epoch, &raw),
        }
    }

    fn handle_submitted(&mut self, epoch: u64, raw: &RawResponse) {
        let Some(active) = self.active.as_ref() else {
            return;
        };
        if active.epoch != epoch {
            debug!("dropping submission result from superseded operation");
            return;
        }
        let kind = active.kind;

        match decode_submit(kind, raw) {
            SubmitDecision::Error { message } => {
                self.active = None;
                self.emit(ClientEvent::Error { message });
            }
            SubmitDecision::DirectAudio { audio_base64, generation_time } => {
                self.active = None;
                self.emit(ClientEvent::AudioReady { audio_base64, session_id: String::new() });
                let message = match generation_time {
                    Some(seconds) => format!("{} complete ({seconds:.1}s)", kind.noun()),
                    None => format!("{} complete", kind.noun()),
                };
                self.emit(ClientEvent::Status { message, duration_ms: STATUS_LONG_MS });
                self.emit(ClientEvent::OperationComplete);
            }
            SubmitDecision::StartPolling { session_id } => {
                self.emit(ClientEvent::Status {
                    message: format!("{} started", kind.noun()),
                    duration_ms: STATUS_SHORT_MS,
                });
                let poll_task = self.spawn_poll_task(epoch, session_id.clone());
                if let Some(active) = self.active.as_mut() {
                    active.phase = Phase::Polling { session_id, poll_task };
                }
            }
        }
    }

    fn spawn_poll_task(&self, epoch: u64, session_id: String) -> JoinHandle<()> {
        let backend = self.backend.clone();
        let task_tx = self.task_tx.clone();
        let interval = Duration::from_millis(self.config.poll_interval_ms());
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of `interval` fires immediately; consume it so
            // the first poll lands one full interval after submission.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let raw = backend.poll_status(&session_id).await;
                if task_tx.send(TaskResult::Polled { epoch, raw }).is_err() {
                    break;
                }
            }
        })
    }

    fn handle_polled(&mut self, epoch: u64, raw: &RawResponse) {
        let Some(active) = self.active.as_ref() else {
            return;
        };
        if active.epoch != epoch {
            debug!("dropping poll result from superseded session");
            return;
        }
        let kind = active.kind;
        let Phase::Polling { session_id, .. } = &active.phase else {
            return;
        };
        let session_id = session_id.clone();

        match decode_poll(raw) {
            PollDecision::Transient => {
                warn!("transient poll failure for session {session_id}, will retry");
            }
            PollDecision::Pending => {}
            PollDecision::InProgress { percent } => {
                self.emit(ClientEvent::Progress { percent });
                self.emit(ClientEvent::Status {
                    message: format!("{}… {percent}%", kind.progress_verb()),
                    duration_ms: STATUS_SHORT_MS,
                });
            }
            PollDecision::Completed { audio_base64 } => {
                self.finish_polling();
                self.emit(ClientEvent::AudioReady { audio_base64, session_id });
                self.emit(ClientEvent::Status {
                    message: format!("{} complete", kind.noun()),
                    duration_ms: STATUS_LONG_MS,
                });
                self.emit(ClientEvent::OperationComplete);
            }
            PollDecision::ProcessingFailed => {
                self.finish_polling();
                self.emit(ClientEvent::Error { message: "Processing failed".into() });
            }
            PollDecision::FailedStatus { error } => {
                self.finish_polling();
                self.emit(ClientEvent::Error {
                    message: format!("{} failed: {error}", kind.noun()),
                });
                self.emit(ClientEvent::OperationComplete);
            }
            PollDecision::CompletedNoAudio => {
                self.finish_polling();
                self.emit(ClientEvent::Error {
                    message: format!("{} completed but no audio was received", kind.noun()),
                });
                self.emit(ClientEvent::OperationComplete);
            }
        }
    }

    fn finish_polling(&mut self) {
        if let Some(active) = self.active.take() {
            active.stop_polling();
        }
    }

    fn emit(&self, event: ClientEvent) {
        let _ = self.event_tx.send(event);
    }
}
