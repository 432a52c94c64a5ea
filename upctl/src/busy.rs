//! Busy indicator shared by the form actions.
//!
//! Both actions may be in flight at once, so visibility is reference counted: the indicator is
//! visible while at least one [`BusyGuard`] is alive. Guards release on drop, which covers early
//! returns, errors, and futures dropped mid-request.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use crate::presenter::Presenter;

#[derive(Debug, Clone)]
pub struct BusyIndicator {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    /// Number of live guards
    in_flight: Mutex<usize>,
    /// Publishes visibility transitions
    visible: watch::Sender<bool>,
}

impl BusyIndicator {
    pub fn new() -> Self {
        let (visible, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                in_flight: Mutex::new(0),
                visible,
            }),
        }
    }

    /// Mark one operation as in flight. The indicator stays visible until the guard is dropped.
    pub fn acquire(&self) -> BusyGuard {
        let mut in_flight = self.inner.in_flight.lock();
        *in_flight += 1;
        if *in_flight == 1 {
            self.inner.visible.send_replace(true);
            tracing::trace!("Busy indicator shown");
        }
        BusyGuard { inner: self.inner.clone() }
    }

    pub fn is_visible(&self) -> bool {
        *self.inner.visible.borrow()
    }

    /// Number of operations currently holding the indicator.
    pub fn in_flight(&self) -> usize {
        *self.inner.in_flight.lock()
    }

    /// Watch visibility changes. The receiver sees the current value immediately.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.visible.subscribe()
    }

    /// Relay visibility transitions to a presenter until the returned forwarder is finished or
    /// dropped.
    pub fn forward_to(&self, presenter: Arc<dyn Presenter>) -> BusyForwarder {
        let mut rx = self.subscribe();
        let (stop, mut stopped) = oneshot::channel::<()>();

        let mut shown = *rx.borrow_and_update();
        if shown {
            presenter.set_busy(true);
        }

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let visible = *rx.borrow_and_update();
                        if visible != shown {
                            presenter.set_busy(visible);
                            shown = visible;
                        }
                    }
                    _ = &mut stopped => break,
                }
            }

            // A transition published just before the stop request still reaches the presenter
            let visible = *rx.borrow_and_update();
            if visible != shown {
                presenter.set_busy(visible);
            }
        });

        BusyForwarder { stop, handle }
    }
}

/// Background task relaying busy visibility to a presenter.
#[derive(Debug)]
pub struct BusyForwarder {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl BusyForwarder {
    /// Stop forwarding once the presenter has seen the current visibility.
    pub async fn finish(self) {
        // The task may already have exited, in which case there is nobody to tell
        let _ = self.stop.send(());
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "Busy indicator forwarder did not shut down cleanly");
        }
    }
}

impl Default for BusyIndicator {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard that releases one hold on the busy indicator when dropped.
#[must_use]
#[derive(Debug)]
pub struct BusyGuard {
    inner: Arc<Inner>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        let mut in_flight = self.inner.in_flight.lock();
        *in_flight = in_flight.saturating_sub(1);
        if *in_flight == 0 {
            self.inner.visible.send_replace(false);
            tracing::trace!("Busy indicator hidden");
        }
    }
}
