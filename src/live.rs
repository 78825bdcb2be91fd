// Copyright (c) FandomHub Team
// SPDX-License-Identifier: Apache-2.0

//! Reactive query layer: writes publish a [`Topic`] on the [`ChangeBus`],
//! live queries recompute and deliver at-least-the-latest value to their
//! subscribers. Intermediate values may be skipped; the latest never is.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::{debug, error, warn};

use crate::error::StoreResult;

/// The table groups a write can touch. A live query subscribes to the topics
/// that can invalidate its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Users,
    Posts,
    Comments,
    Likes,
    Follows,
    Blocks,
    Subscriptions,
    Products,
    Cart,
    Orders,
    Notifications,
    Reports,
}

/// Broadcast bus carrying change topics from write paths to live queries.
#[derive(Clone)]
pub struct ChangeBus {
    tx: broadcast::Sender<Topic>,
}

impl ChangeBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    /// Publish a change. No subscribers is not an error; a write with nobody
    /// watching is still a write.
    pub fn publish(&self, topic: Topic) {
        let _ = self.tx.send(topic);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Topic> {
        self.tx.subscribe()
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new()
    }
}

/// A continuously-updated query result. Holds the latest value; `changed()`
/// resolves after any relevant write has been folded in.
pub struct LiveQuery<T> {
    rx: watch::Receiver<T>,
}

impl<T: Clone> LiveQuery<T> {
    pub fn latest(&self) -> T {
        self.rx.borrow().clone()
    }

    /// Waits for the next recomputation. Returns `false` once the producing
    /// side has shut down.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Waits for the next recomputation and returns the fresh value.
    pub async fn next(&mut self) -> Option<T> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

/// Builds a live query: computes the initial value synchronously, then
/// recomputes on every published topic in `topics`. A lagged subscriber
/// recomputes once rather than replaying missed notifications, which is
/// exactly the at-least-the-latest contract. Dropping the returned handle
/// stops the recompute task.
pub fn watch_query<T, F>(bus: &ChangeBus, topics: Vec<Topic>, compute: F) -> StoreResult<LiveQuery<T>>
where
    T: Clone + Send + Sync + 'static,
    F: Fn() -> StoreResult<T> + Send + Sync + 'static,
{
    let initial = compute()?;
    let (tx, rx) = watch::channel(initial);
    let mut changes = bus.subscribe();
    let compute = Arc::new(compute);

    tokio::spawn(async move {
        loop {
            let relevant = match changes.recv().await {
                Ok(topic) => topics.contains(&topic),
                // Missed some notifications; the next recompute catches up.
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    debug!(missed, "live query lagged, recomputing");
                    true
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            if !relevant {
                continue;
            }

            let f = Arc::clone(&compute);
            match tokio::task::spawn_blocking(move || f()).await {
                Ok(Ok(value)) => {
                    if tx.send(value).is_err() {
                        // Subscriber dropped the stream; stop recomputing.
                        break;
                    }
                }
                Ok(Err(e)) => warn!("live query recompute failed: {e}"),
                Err(e) => {
                    error!("live query task failed: {e}");
                    break;
                }
            }
        }
    });

    Ok(LiveQuery { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test(tokio::test)]
    async fn delivers_latest_value_after_publish() {
        let bus = ChangeBus::new();
        let counter = Arc::new(std::sync::atomic::AtomicI32::new(0));
        let c = Arc::clone(&counter);
        let mut live = watch_query(&bus, vec![Topic::Likes], move || {
            Ok(c.load(std::sync::atomic::Ordering::SeqCst))
        })
        .unwrap();

        assert_eq!(live.latest(), 0);

        counter.store(7, std::sync::atomic::Ordering::SeqCst);
        bus.publish(Topic::Likes);
        let next = tokio::time::timeout(std::time::Duration::from_secs(2), live.next())
            .await
            .expect("recompute within deadline");
        assert_eq!(next, Some(7));
    }

    #[tokio::test]
    async fn irrelevant_topics_do_not_wake_the_query() {
        let bus = ChangeBus::new();
        let mut live = watch_query(&bus, vec![Topic::Orders], || Ok(1)).unwrap();

        bus.publish(Topic::Follows);
        let woke = tokio::time::timeout(std::time::Duration::from_millis(200), live.changed())
            .await
            .is_ok();
        assert!(!woke, "follow changes must not recompute an order query");
    }
}
