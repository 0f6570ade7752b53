use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Result};
use log::debug;
use parking_lot::Mutex;

/// Lifecycle phase shared by the showcase components.
///
/// Forward motion follows `Uninitialized -> Loading -> Ready`. `Disposed`
/// is reachable from every phase and is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Loading,
    Ready,
    Disposed,
}

impl Phase {
    /// Applies the transition to `next` if it is legal, returning whether
    /// the phase changed.
    pub fn advance(&mut self, next: Phase) -> bool {
        let allowed = match (*self, next) {
            (Phase::Disposed, _) => false,
            (_, Phase::Disposed) => true,
            (Phase::Uninitialized, Phase::Loading) => true,
            (Phase::Loading, Phase::Ready) => true,
            _ => false,
        };
        if allowed {
            *self = next;
        }
        allowed
    }

    pub fn is_disposed(self) -> bool {
        self == Phase::Disposed
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Uninitialized => "Uninitialized",
            Phase::Loading => "Loading",
            Phase::Ready => "Ready",
            Phase::Disposed => "Disposed",
        };
        f.write_str(name)
    }
}

enum SlotState<T> {
    Pending,
    Done(Result<T>),
    Taken,
    Dead,
}

/// One-shot hand-off between a worker thread and the component that owns it.
///
/// The worker fulfils the slot exactly once. The owner polls every frame and
/// takes the value when it lands. Abandoning the slot marks it dead so a
/// late fulfilment is dropped instead of reaching a disposed component.
pub struct Loader<T> {
    label: String,
    state: Arc<Mutex<SlotState<T>>>,
    handle: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Loader<T> {
    /// Spawns a worker thread that fulfils the slot with the job's result.
    pub fn spawn<F>(label: impl Into<String>, job: F) -> Self
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let label = label.into();
        let state = Arc::new(Mutex::new(SlotState::Pending));
        let slot = Arc::clone(&state);
        let thread_label = label.clone();
        let handle = thread::spawn(move || {
            let result = job();
            let mut guard = slot.lock();
            match *guard {
                SlotState::Pending => *guard = SlotState::Done(result),
                SlotState::Dead => {
                    debug!("{thread_label}: load finished after disposal, dropping result");
                }
                _ => {}
            }
        });
        Self {
            label,
            state,
            handle: Some(handle),
        }
    }

    /// Takes the result if the worker has delivered it.
    ///
    /// A worker that exits without fulfilling the slot (a panic in the job)
    /// surfaces here as an error instead of leaving the owner stuck in
    /// `Loading` forever.
    pub fn poll(&mut self) -> Option<Result<T>> {
        let delivered = {
            let mut guard = self.state.lock();
            match std::mem::replace(&mut *guard, SlotState::Taken) {
                SlotState::Done(result) => Some(result),
                other => {
                    *guard = other;
                    None
                }
            }
        };
        if let Some(result) = delivered {
            let _ = self.join_worker();
            return Some(result);
        }
        let worker_gone = self
            .handle
            .as_ref()
            .map_or(false, |handle| handle.is_finished());
        if worker_gone && matches!(*self.state.lock(), SlotState::Pending) {
            *self.state.lock() = SlotState::Taken;
            return Some(match self.join_worker() {
                Ok(()) => Err(anyhow!("{} loader exited without a result", self.label)),
                Err(err) => Err(err),
            });
        }
        None
    }

    /// Blocks until the worker delivers and returns its result.
    pub fn wait(&mut self) -> Result<T> {
        self.join_worker()?;
        let mut guard = self.state.lock();
        match std::mem::replace(&mut *guard, SlotState::Taken) {
            SlotState::Done(result) => result,
            _ => Err(anyhow!("{} loader finished without a result", self.label)),
        }
    }

    /// Marks the slot dead and detaches the worker. Any later fulfilment
    /// is discarded.
    pub fn abandon(&mut self) {
        *self.state.lock() = SlotState::Dead;
        self.handle.take();
    }

    fn join_worker(&mut self) -> Result<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        handle
            .join()
            .map_err(|panic| anyhow!("{} loader panicked: {panic:?}", self.label))
    }
}

impl<T> Drop for Loader<T> {
    fn drop(&mut self) {
        *self.state.lock() = SlotState::Dead;
        self.handle.take();
    }
}
