//! Demand-driven body stream over a push-based response handle.
//!
//! # State machine
//! ```text
//! Idle ──first poll──▶ Streaming ──end──▶ Completed
//!                          │  ▲   └─error─▶ Failed
//!                     data │  │ poll (resume)
//!                          ▼  │
//!                        chunk queued
//! any non-terminal state ──cancel / drop──▶ Cancelled
//! ```
//!
//! Demand is the consumer polling with nothing queued: only then is the handle
//! resumed. Every data callback pauses the handle before the chunk becomes
//! visible, so a well-behaved handle has at most one chunk in flight.

use bytes::Bytes;
use futures_util::stream::{FusedStream, Stream};
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::task::{Context, Poll, Waker};

use crate::client::ResponseHandle;
use crate::error::{BoxError, ConnectorError, ConnectorResult};
use crate::observability::metrics;

/// Lifecycle of a body stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyState {
    /// Nothing registered on the handle yet.
    Idle,
    /// Handlers registered; chunks flow on demand.
    Streaming,
    /// End of body delivered to the consumer.
    Completed,
    /// Error delivered to the consumer.
    Failed,
    /// Consumer gave up before the end.
    Cancelled,
}

impl BodyState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Outcome reported by the handle, held until queued chunks are drained.
enum Finish {
    End,
    Error(BoxError),
}

struct Shared {
    state: BodyState,
    queue: VecDeque<Bytes>,
    finish: Option<Finish>,
    /// A resume was issued and no chunk has answered it yet.
    awaiting: bool,
    waker: Option<Waker>,
}

impl Shared {
    /// Callbacks are only acted upon while streaming and before end or error.
    fn accepts_callbacks(&self) -> bool {
        self.state == BodyState::Streaming && self.finish.is_none()
    }

    fn take_waker(&mut self) -> Option<Waker> {
        self.waker.take()
    }
}

type SharedState = Arc<Mutex<Shared>>;

fn lock(shared: &SharedState) -> MutexGuard<'_, Shared> {
    shared.lock().expect("body state mutex poisoned")
}

/// What `poll_next` does once the state lock is released.
enum Step {
    Yield(Bytes),
    Register,
    Resume,
    Wait,
    Finish(Finish),
    Done,
}

/// Body chunks of one response, pulled by the consumer.
///
/// Dropping the stream before the end cancels it.
pub struct BodyStream {
    handle: Arc<dyn ResponseHandle>,
    shared: SharedState,
}

impl BodyStream {
    pub(crate) fn new(handle: Arc<dyn ResponseHandle>) -> Self {
        Self {
            handle,
            shared: Arc::new(Mutex::new(Shared {
                state: BodyState::Idle,
                queue: VecDeque::new(),
                finish: None,
                awaiting: false,
                waker: None,
            })),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> BodyState {
        lock(&self.shared).state
    }

    /// Stop consuming the body.
    ///
    /// No resume is issued afterwards and all handlers are released on the
    /// handle. Calling it again, or after the end, does nothing.
    pub fn cancel(&mut self) {
        let previous = {
            let mut shared = lock(&self.shared);
            let previous = shared.state;
            if !previous.is_terminal() {
                shared.state = BodyState::Cancelled;
                shared.queue.clear();
                shared.finish = None;
                shared.waker = None;
            }
            previous
        };

        match previous {
            BodyState::Streaming => {
                self.handle.release();
                metrics::record_body_outcome("cancelled");
                tracing::debug!("Body stream cancelled");
            }
            BodyState::Idle => {
                tracing::trace!("Body stream dropped before first demand");
            }
            _ => {}
        }
    }

    /// Pause default streaming, then attach error, data and end handlers.
    ///
    /// A handle may fire callbacks while they are being registered, so the
    /// state is already `Streaming` when this runs.
    fn register(&self) {
        self.handle.pause();

        let handle = Arc::downgrade(&self.handle);

        let shared = Arc::clone(&self.shared);
        self.handle.error_handler(Some(Box::new(move |err: BoxError| {
            let waker = {
                let mut shared = lock(&shared);
                if !shared.accepts_callbacks() {
                    return;
                }
                shared.finish = Some(Finish::Error(err));
                shared.take_waker()
            };
            if let Some(waker) = waker {
                waker.wake();
            }
        })));

        let shared = Arc::clone(&self.shared);
        self.handle.data_handler(Some(Box::new(move |chunk: Bytes| {
            on_data(&shared, &handle, chunk);
        })));

        let shared = Arc::clone(&self.shared);
        self.handle.end_handler(Some(Box::new(move || {
            let waker = {
                let mut shared = lock(&shared);
                if !shared.accepts_callbacks() {
                    return;
                }
                shared.finish = Some(Finish::End);
                shared.take_waker()
            };
            if let Some(waker) = waker {
                waker.wake();
            }
        })));

        tracing::trace!("Body handlers registered");
    }

    fn next_step(&self, cx: &Context<'_>) -> Step {
        let mut shared = lock(&self.shared);

        if shared.state.is_terminal() {
            return Step::Done;
        }
        if let Some(chunk) = shared.queue.pop_front() {
            return Step::Yield(chunk);
        }
        if let Some(finish) = shared.finish.take() {
            shared.state = match finish {
                Finish::End => BodyState::Completed,
                Finish::Error(_) => BodyState::Failed,
            };
            shared.waker = None;
            return Step::Finish(finish);
        }
        if shared.state == BodyState::Idle {
            shared.state = BodyState::Streaming;
            return Step::Register;
        }

        shared.waker = Some(cx.waker().clone());
        if shared.awaiting {
            Step::Wait
        } else {
            shared.awaiting = true;
            Step::Resume
        }
    }
}

/// Data callback: pause first, then publish the chunk.
///
/// Publishing before the pause would let the consumer take the chunk and
/// resume ahead of the pause.
fn on_data(shared: &SharedState, handle: &Weak<dyn ResponseHandle>, chunk: Bytes) {
    if !lock(shared).accepts_callbacks() {
        return;
    }
    if let Some(handle) = handle.upgrade() {
        handle.pause();
    }

    let waker = {
        let mut shared = lock(shared);
        if !shared.accepts_callbacks() {
            return;
        }
        shared.queue.push_back(chunk);
        shared.awaiting = false;
        shared.take_waker()
    };
    if let Some(waker) = waker {
        waker.wake();
    }
}

impl Stream for BodyStream {
    type Item = ConnectorResult<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        // Calls into the handle happen with the state lock released: a handle
        // may run callbacks synchronously from `pause`, `resume` or registration.
        loop {
            match this.next_step(cx) {
                Step::Yield(chunk) => {
                    metrics::record_body_chunk(chunk.len());
                    tracing::trace!(len = chunk.len(), "Body chunk delivered");
                    return Poll::Ready(Some(Ok(chunk)));
                }
                Step::Register => this.register(),
                Step::Resume => this.handle.resume(),
                Step::Wait => return Poll::Pending,
                Step::Finish(Finish::End) => {
                    this.handle.release();
                    metrics::record_body_outcome("completed");
                    tracing::debug!("Body stream completed");
                    return Poll::Ready(None);
                }
                Step::Finish(Finish::Error(err)) => {
                    this.handle.release();
                    metrics::record_body_outcome("failed");
                    tracing::warn!(error = %err, "Body stream failed");
                    return Poll::Ready(Some(Err(ConnectorError::BodyReadFailed(err))));
                }
                Step::Done => return Poll::Ready(None),
            }
        }
    }
}

impl FusedStream for BodyStream {
    fn is_terminated(&self) -> bool {
        self.state().is_terminal()
    }
}

impl Drop for BodyStream {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for BodyStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BodyStream")
            .field("state", &self.state())
            .finish()
    }
}
