use std::any::Any;
use std::future::Future;
use std::pin::Pin;
use std::rc::Weak;
use std::task::{Context, Poll, ready};

use futures::channel::oneshot;
use futures::future::{Fuse, FutureExt};
use pin_project::pin_project;
use thiserror::Error;

use super::{Inner, TaskId};

/// Reason a spawned task produced no output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error("task was cancelled")]
    Cancelled,
    #[error("task panicked: {0}")]
    Panicked(String),
}

/// A handle to a spawned task.
///
/// Awaiting it yields the task output. Dropping it detaches the task, which
/// keeps running in the background.
#[pin_project]
pub struct JoinHandle<T> {
    id: TaskId,
    #[pin]
    receiver: Fuse<oneshot::Receiver<Result<T, JoinError>>>,
    runtime: Weak<Inner>,
}

impl<T> JoinHandle<T> {
    pub(crate) fn new(
        id: TaskId,
        receiver: oneshot::Receiver<Result<T, JoinError>>,
        runtime: Weak<Inner>,
    ) -> Self {
        Self {
            id,
            receiver: receiver.fuse(),
            runtime,
        }
    }

    /// Requests cancellation of the task and returns immediately.
    ///
    /// The task is dropped at its current suspension point; awaiting this
    /// handle afterwards yields [`JoinError::Cancelled`].
    pub fn abort(&self) {
        self.abort_handle().abort();
    }

    /// Whether the task is no longer stored by the runtime.
    pub fn is_finished(&self) -> bool {
        self.abort_handle().is_finished()
    }

    /// A handle that can cancel the task without owning its output.
    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle {
            id: self.id,
            runtime: self.runtime.clone(),
        }
    }
}

/// Cancels a spawned task, see [`JoinHandle::abort_handle`].
#[derive(Clone)]
pub struct AbortHandle {
    id: TaskId,
    runtime: Weak<Inner>,
}

impl AbortHandle {
    /// Same as [`JoinHandle::abort`].
    pub fn abort(&self) {
        if let Some(runtime) = self.runtime.upgrade() {
            runtime.executor.cancel(self.id);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.runtime
            .upgrade()
            .is_none_or(|runtime| !runtime.executor.is_live(self.id))
    }
}

impl<T> Future for JoinHandle<T> {
    type Output = Result<T, JoinError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        match ready!(this.receiver.poll(cx)) {
            Ok(output) => Poll::Ready(output),
            // The sender went away with the task future.
            Err(oneshot::Canceled) => Poll::Ready(Err(JoinError::Cancelled)),
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_message_reads_common_payloads() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(&*boxed), "boom");

        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(&*boxed), "bang");

        let boxed: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(&*boxed), "unknown panic payload");
    }
}
