//! Observer bridge between the timer engine and any number of watchers

use std::sync::{Arc, Mutex};

use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};

use super::TimerSnapshot;

/// Buffered snapshots per observer before the oldest are dropped
///
/// At one tick per second an observer has to stall for over four minutes
/// before anything is lost.
pub const OBSERVER_BUFFER: usize = 256;

/// Shared holder of the current snapshot and the ordered snapshot stream
///
/// Cloning is cheap and every clone refers to the same stream. Only the
/// engine publishes; everybody else attaches and reads.
#[derive(Debug, Clone)]
pub struct StateBridge {
    inner: Arc<BridgeInner>,
}

#[derive(Debug)]
struct BridgeInner {
    /// Serializes publishing against attaching so an observer never misses
    /// or duplicates the snapshot published while it attaches
    publish_lock: Mutex<()>,
    current: watch::Sender<TimerSnapshot>,
    stream: broadcast::Sender<TimerSnapshot>,
}

impl StateBridge {
    pub fn new(initial: TimerSnapshot) -> Self {
        let (current, _) = watch::channel(initial);
        let (stream, _) = broadcast::channel(OBSERVER_BUFFER);
        Self {
            inner: Arc::new(BridgeInner {
                publish_lock: Mutex::new(()),
                current,
                stream,
            }),
        }
    }

    /// Latest published snapshot
    pub fn current(&self) -> TimerSnapshot {
        *self.inner.current.borrow()
    }

    /// Number of attached observers
    pub fn observer_count(&self) -> usize {
        self.inner.stream.receiver_count()
    }

    /// Attach a new observer; has no effect on the engine
    pub fn attach(&self) -> Observer {
        let _guard = self.inner.publish_lock.lock().unwrap_or_else(|e| e.into_inner());
        let observer = Observer {
            pending: Some(*self.inner.current.borrow()),
            stream: self.inner.stream.subscribe(),
            current: self.inner.current.subscribe(),
        };
        debug!("Observer attached ({} total)", self.inner.stream.receiver_count());
        observer
    }

    pub(crate) fn publish(&self, snapshot: TimerSnapshot) {
        let _guard = self.inner.publish_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.inner.current.send_replace(snapshot);
        // No receivers just means nobody is watching right now
        let _ = self.inner.stream.send(snapshot);
    }
}

/// One attachment to the snapshot stream; dropping it detaches
#[derive(Debug)]
pub struct Observer {
    pending: Option<TimerSnapshot>,
    stream: broadcast::Receiver<TimerSnapshot>,
    current: watch::Receiver<TimerSnapshot>,
}

impl Observer {
    /// Latest published snapshot, without consuming the stream
    pub fn current(&self) -> TimerSnapshot {
        *self.current.borrow()
    }

    /// Next snapshot in publish order; the first call yields the snapshot
    /// current at attach time. Returns `None` once the bridge is gone.
    ///
    /// An observer more than [`OBSERVER_BUFFER`] snapshots behind loses the
    /// oldest ones (logged at warn) and continues with the oldest retained.
    /// Delivery order is never broken.
    pub async fn next(&mut self) -> Option<TimerSnapshot> {
        if let Some(snapshot) = self.pending.take() {
            return Some(snapshot);
        }
        loop {
            match self.stream.recv().await {
                Ok(snapshot) => return Some(snapshot),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Observer fell behind, {} snapshots dropped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn observer_gets_current_then_later_snapshots() {
        let bridge = StateBridge::new(TimerSnapshot::armed(3000));
        bridge.publish(TimerSnapshot::new(3000, 3000, true));

        let mut observer = bridge.attach();
        bridge.publish(TimerSnapshot::new(2000, 3000, true));
        bridge.publish(TimerSnapshot::new(1000, 3000, true));

        assert_eq!(observer.next().await, Some(TimerSnapshot::new(3000, 3000, true)));
        assert_eq!(observer.next().await, Some(TimerSnapshot::new(2000, 3000, true)));
        assert_eq!(observer.next().await, Some(TimerSnapshot::new(1000, 3000, true)));
        assert_eq!(observer.current(), TimerSnapshot::new(1000, 3000, true));
    }

    #[tokio::test]
    async fn detaching_is_side_effect_free() {
        let bridge = StateBridge::new(TimerSnapshot::default());
        let first = bridge.attach();
        let mut second = bridge.attach();
        assert_eq!(bridge.observer_count(), 2);

        drop(first);
        assert_eq!(bridge.observer_count(), 1);

        bridge.publish(TimerSnapshot::armed(500));
        assert_eq!(bridge.current(), TimerSnapshot::armed(500));
        assert_eq!(second.next().await, Some(TimerSnapshot::default()));
        assert_eq!(second.next().await, Some(TimerSnapshot::armed(500)));
    }

    #[tokio::test]
    async fn publishing_without_observers_updates_current() {
        let bridge = StateBridge::new(TimerSnapshot::default());
        bridge.publish(TimerSnapshot::armed(1000));
        assert_eq!(bridge.current(), TimerSnapshot::armed(1000));
        assert_eq!(bridge.attach().current(), TimerSnapshot::armed(1000));
    }

    #[tokio::test]
    async fn lagging_observer_keeps_order() {
        let bridge = StateBridge::new(TimerSnapshot::armed(1_000_000));
        let mut observer = bridge.attach();
        assert!(observer.next().await.is_some());

        let total = OBSERVER_BUFFER as u64 + 10;
        for n in 1..=total {
            bridge.publish(TimerSnapshot::new(1_000_000 - n * 1000, 1_000_000, true));
        }

        // The ten oldest are gone; delivery resumes at the oldest retained
        let first = observer.next().await.unwrap();
        assert_eq!(first.time_left_ms, 1_000_000 - 11 * 1000);

        let mut last = first.time_left_ms;
        for _ in 1..OBSERVER_BUFFER {
            let snapshot = observer.next().await.unwrap();
            assert!(snapshot.time_left_ms < last);
            last = snapshot.time_left_ms;
        }
        assert_eq!(last, 1_000_000 - total * 1000);
    }
}
