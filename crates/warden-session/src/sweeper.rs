//! Background task that periodically sweeps expired sessions.

use std::sync::Weak;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::store::StoreInner;

/// Handle to a running sweep task.
///
/// The task holds only a weak reference to the store, so it never keeps the
/// store alive. Dropping the handle cancels the task.
pub(crate) struct SweeperHandle {
    cancellation: CancellationToken,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Spawn the sweep loop on `runtime`, first tick one `period` from now.
    pub(crate) fn spawn(runtime: &Handle, store: Weak<StoreInner>, period: Duration) -> Self {
        let cancellation = CancellationToken::new();
        let cancelled = cancellation.clone();

        let task = runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(inner) = store.upgrade() else {
                            break;
                        };
                        inner.sweep();
                    }
                }
            }

            debug!("Session sweep task exited");
        });

        Self { cancellation, task }
    }

    /// Ask the task to exit at its next suspension point.
    pub(crate) fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.cancellation.is_cancelled() || self.task.is_finished()
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.cancellation.cancel();
    }
}
