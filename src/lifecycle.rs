//! Activation lifetime for components that fetch on mount.
//!
//! A component owns a [`Lifecycle`] holding its state. Each activation gets
//! a fresh mount id; the spawned fetch receives a [`Lease`] for that id and
//! may only write the state while the id is still current. Deactivating
//! clears the id and aborts the task, so late resolutions are dropped.

use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::task::JoinHandle;
use tracing::error;

struct Slot<S> {
    mount: Option<u64>,
    next_mount: u64,
    value: S,
}

pub struct Lifecycle<S> {
    slot: Arc<RwLock<Slot<S>>>,
    task: Option<JoinHandle<()>>,
}

/// Write access to a component's state, valid for one activation.
pub struct Lease<S> {
    mount: u64,
    slot: Arc<RwLock<Slot<S>>>,
}

impl<S> Lifecycle<S> {
    pub fn new(value: S) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Slot {
                mount: None,
                next_mount: 0,
                value,
            })),
            task: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .mount
            .is_some()
    }

    /// Start a new activation with `value` as its initial state.
    ///
    /// Returns `None` when the component is already active.
    pub fn mount(&mut self, value: S) -> Option<Lease<S>> {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if slot.mount.is_some() {
            return None;
        }

        let mount = slot.next_mount;
        slot.next_mount += 1;
        slot.mount = Some(mount);
        slot.value = value;

        Some(Lease {
            mount,
            slot: Arc::clone(&self.slot),
        })
    }

    /// Run `work` as the task of the current activation.
    pub fn spawn<F>(&mut self, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Some(previous) = self.task.replace(tokio::spawn(work)) {
            previous.abort();
        }
    }

    /// Wait for the current activation's task to finish, if there is one.
    ///
    /// Cancel-safe: if this future is dropped early the task stays owned by
    /// the lifecycle and is still aborted on deactivation.
    pub async fn settled(&mut self) {
        if let Some(task) = self.task.as_mut() {
            let result = task.await;
            self.task = None;
            if let Err(e) = result {
                if e.is_panic() {
                    error!("Component task panicked: {}", e);
                }
            }
        }
    }

    /// End the current activation. Any lease handed out for it stops applying.
    pub fn deactivate(&mut self) {
        self.slot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .mount = None;

        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        f(&slot.value)
    }
}

impl<S: Clone> Lifecycle<S> {
    pub fn snapshot(&self) -> S {
        self.read(S::clone)
    }
}

impl<S> Drop for Lifecycle<S> {
    fn drop(&mut self) {
        self.deactivate();
    }
}

impl<S> Lease<S> {
    /// Apply `f` to the state if this lease's activation is still current.
    ///
    /// Returns whether the update was applied.
    pub fn apply(&self, f: impl FnOnce(&mut S)) -> bool {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if slot.mount != Some(self.mount) {
            return false;
        }
        f(&mut slot.value);
        true
    }

    #[cfg(test)]
    fn is_current(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .mount
            == Some(self.mount)
    }
}
