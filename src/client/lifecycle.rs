//! Connection lifecycle
//!
//! ```text
//! Uninitialized --init--> Initializing --ok--> Ready
//!       ^                      |
//!       +-------failed---------+
//!
//! any state --close--> Closed (terminal)
//! ```
//!
//! While initializing, the phase holds the one shared connect future. Every
//! concurrent `init()` and every operation issued in that window awaits the
//! same future, so at most one connection attempt is ever in flight.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::future::{BoxFuture, Shared};

use super::errors::{ClientError, ClientResult};
use crate::store::{KvStore, StoreResult};

/// The in-flight connection attempt, awaited by every caller
pub(crate) type InitFuture = Shared<BoxFuture<'static, ClientResult<Arc<dyn KvStore>>>>;

/// Observable lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Initializing,
    Ready,
    Closed,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Uninitialized => "uninitialized",
            LifecycleState::Initializing => "initializing",
            LifecycleState::Ready => "ready",
            LifecycleState::Closed => "closed",
        };
        f.write_str(name)
    }
}

enum Phase {
    Uninitialized,
    Initializing(InitFuture),
    Ready(Arc<dyn KvStore>),
    Closed,
}

/// What `begin` asks the caller to do
pub(crate) enum Begin {
    /// Already connected
    Ready,
    /// Await this attempt
    Pending(InitFuture),
}

/// Outcome of settling a finished connection attempt
pub(crate) enum Settled {
    Ready(Arc<dyn KvStore>),
    Failed(ClientError),
    /// The client was closed while connecting; the fresh handle must be
    /// released
    Closed(Option<Arc<dyn KvStore>>),
}

pub(crate) struct Lifecycle {
    phase: Mutex<Phase>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            phase: Mutex::new(Phase::Uninitialized),
        }
    }

    fn lock(&self) -> ClientResult<MutexGuard<'_, Phase>> {
        self.phase
            .lock()
            .map_err(|_| ClientError::Internal("lifecycle lock poisoned".into()))
    }

    pub fn state(&self) -> ClientResult<LifecycleState> {
        Ok(match &*self.lock()? {
            Phase::Uninitialized => LifecycleState::Uninitialized,
            Phase::Initializing(_) => LifecycleState::Initializing,
            Phase::Ready(_) => LifecycleState::Ready,
            Phase::Closed => LifecycleState::Closed,
        })
    }

    /// Starts an attempt with `start` unless one is running or done.
    ///
    /// `start` runs under the lifecycle lock and must only build the future.
    pub fn begin<F>(&self, start: F) -> ClientResult<Begin>
    where
        F: FnOnce() -> BoxFuture<'static, ClientResult<Arc<dyn KvStore>>>,
    {
        use futures_util::FutureExt;

        let mut phase = self.lock()?;
        match &*phase {
            Phase::Ready(_) => Ok(Begin::Ready),
            Phase::Closed => Err(ClientError::Closed),
            Phase::Initializing(pending) => Ok(Begin::Pending(pending.clone())),
            Phase::Uninitialized => {
                let pending = start().shared();
                *phase = Phase::Initializing(pending.clone());
                Ok(Begin::Pending(pending))
            }
        }
    }

    /// Records the result of the running attempt
    pub fn settle(&self, outcome: StoreResult<Arc<dyn KvStore>>) -> Settled {
        let mut phase = match self.lock() {
            Ok(phase) => phase,
            Err(e) => return Settled::Failed(e),
        };

        let closed = matches!(&*phase, Phase::Closed);
        match outcome {
            Ok(store) if closed => Settled::Closed(Some(store)),
            Err(_) if closed => Settled::Closed(None),
            Ok(store) => {
                *phase = Phase::Ready(Arc::clone(&store));
                Settled::Ready(store)
            }
            Err(e) => {
                *phase = Phase::Uninitialized;
                Settled::Failed(ClientError::Connect(e))
            }
        }
    }

    /// Store handle for an operation.
    ///
    /// Waits for a running attempt; fails fast when uninitialized or closed.
    pub async fn store(&self) -> ClientResult<Arc<dyn KvStore>> {
        let pending = {
            let phase = self.lock()?;
            match &*phase {
                Phase::Ready(store) => return Ok(Arc::clone(store)),
                Phase::Initializing(pending) => pending.clone(),
                Phase::Uninitialized => return Err(ClientError::NotInitialized),
                Phase::Closed => return Err(ClientError::Closed),
            }
        };
        pending.await
    }

    /// Moves to `Closed`, returning the handle to release if one was open
    pub fn close(&self) -> ClientResult<Option<Arc<dyn KvStore>>> {
        let mut phase = self.lock()?;
        match std::mem::replace(&mut *phase, Phase::Closed) {
            Phase::Ready(store) => Ok(Some(store)),
            _ => Ok(None),
        }
    }
}
