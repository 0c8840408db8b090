//! In-process change notifications
//!
//! One `watch` channel per conversation that currently has subscribers.
//! Stores publish a full snapshot after every committed write; subscribers
//! always observe the newest state and never a partial diff.

use std::collections::HashMap;
use std::sync::Mutex;

use futures_util::{future, stream::BoxStream, StreamExt};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use uuid::Uuid;

use crate::domain::entities::ChatSnapshot;

/// Stream of full conversation snapshots; ends when the conversation is deleted
pub type SnapshotStream = BoxStream<'static, ChatSnapshot>;

type Channel = watch::Sender<Option<ChatSnapshot>>;

#[derive(Default)]
pub struct ChangeFeed {
    channels: Mutex<HashMap<Uuid, Channel>>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    fn channels(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Channel>> {
        self.channels
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Whether anyone is listening to `conversation_id`.
    ///
    /// A channel whose subscribers have all gone away is released here.
    pub fn has_subscribers(&self, conversation_id: Uuid) -> bool {
        let mut channels = self.channels();
        let Some(tx) = channels.get(&conversation_id) else {
            return false;
        };

        if tx.receiver_count() == 0 {
            channels.remove(&conversation_id);
            return false;
        }
        true
    }

    /// Subscribe starting from `current`.
    ///
    /// When a channel already exists its value is only replaced if `current`
    /// is further along, so a late reader never rewinds other subscribers.
    pub fn subscribe(&self, current: ChatSnapshot) -> SnapshotStream {
        let conversation_id = current.conversation.id;
        let mut channels = self.channels();

        let rx = match channels.get(&conversation_id) {
            Some(tx) => {
                tx.send_if_modified(|existing| match existing {
                    Some(prev) if prev.progress() >= current.progress() => false,
                    _ => {
                        *existing = Some(current.clone());
                        true
                    }
                });
                tx.subscribe()
            }
            None => {
                let (tx, rx) = watch::channel(Some(current));
                channels.insert(conversation_id, tx);
                rx
            }
        };

        WatchStream::new(rx)
            .take_while(|snapshot| future::ready(snapshot.is_some()))
            .filter_map(future::ready)
            .boxed()
    }

    /// Deliver a committed snapshot to current subscribers
    pub fn publish(&self, snapshot: ChatSnapshot) {
        let conversation_id = snapshot.conversation.id;
        let mut channels = self.channels();

        let Some(tx) = channels.get(&conversation_id) else {
            return;
        };

        if tx.receiver_count() == 0 {
            channels.remove(&conversation_id);
            return;
        }

        tx.send_if_modified(|existing| match existing {
            Some(prev) if prev.progress() > snapshot.progress() => false,
            _ => {
                *existing = Some(snapshot);
                true
            }
        });
    }

    /// End every subscription to a deleted conversation
    pub fn publish_deleted(&self, conversation_id: Uuid) {
        if let Some(tx) = self.channels().remove(&conversation_id) {
            tx.send_replace(None);
        }
    }
}
