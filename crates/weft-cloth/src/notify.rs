//! Notifications delivered to subscribers of a cloth world.

use std::sync::mpsc;

use serde::{Deserialize, Serialize};
use weft_types::{ClothId, RenderHandle};

/// Something a host application may want to react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClothNotification {
    /// A build attempt ended. Sent exactly once per attempt.
    BuildComplete { cloth: ClothId, success: bool },
    /// A renderer switched meshes (`custom` = simulation mesh installed).
    RendererMeshChange {
        cloth: ClothId,
        renderer: RenderHandle,
        custom: bool,
    },
}

/// Fan-out over `mpsc` senders. Dropped receivers are pruned on send.
#[derive(Debug, Default)]
pub(crate) struct Notifier {
    subscribers: Vec<mpsc::Sender<ClothNotification>>,
}

impl Notifier {
    pub fn subscribe(&mut self) -> mpsc::Receiver<ClothNotification> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn send(&mut self, notification: ClothNotification) {
        self.subscribers.retain(|tx| tx.send(notification).is_ok());
    }
}
