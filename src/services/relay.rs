use crate::models::StagedFile;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

/// Outcome of handing a staged file to the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Sent to the registered receiver.
    Pushed,
    /// Stored as the pending file. `replaced` is the previously pending file
    /// that was abandoned, if any.
    Held { replaced: Option<StagedFile> },
}

/// A registered receiver, returned by [`HandoffRelay::register_receiver`].
///
/// A file counts as delivered once `recv` has returned it. Dropping the subscription unregisters the receiver and hands
/// anything not yet returned back to the relay.
#[derive(Debug)]
pub struct Subscription {
    relay: Arc<HandoffRelay>,
    id: u64,
    receiver: mpsc::UnboundedReceiver<StagedFile>,
    pending: Option<StagedFile>,
}

impl Subscription {
    #[cfg(test)]
    fn take_pending(&mut self) -> Option<StagedFile> {
        self.pending.take()
    }

    /// Yields the file drained at registration first, then pushed files.
    /// Cancel safe.
    pub async fn recv(&mut self) -> Option<StagedFile> {
        if let Some(file) = self.pending.take() {
            return Some(file);
        }
        self.receiver.recv().await
    }

    #[cfg(test)]
    fn try_recv(&mut self) -> Result<StagedFile, mpsc::error::TryRecvError> {
        self.receiver.try_recv()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let unyielded = self.pending.take();
        self.relay
            .unregister_receiver(self.id, &mut self.receiver, unyielded);
    }
}

#[derive(Debug, Default)]
struct HandoffSlot {
    receiver: Option<(u64, mpsc::UnboundedSender<StagedFile>)>,
    next_receiver_id: u64,
    pending: Option<StagedFile>,
}

impl HandoffSlot {
    /// Sends to the registered receiver, clearing a registration whose
    /// receiving end is gone. Hands the file back if nobody took it.
    fn push(&mut self, file: StagedFile) -> Result<(), StagedFile> {
        let Some((id, tx)) = self.receiver.take() else {
            return Err(file);
        };

        match tx.send(file) {
            Ok(()) => {
                self.receiver = Some((id, tx));
                Ok(())
            }
            Err(mpsc::error::SendError(unsent)) => {
                tracing::warn!("Receiver went away, holding staged file instead");
                Err(unsent)
            }
        }
    }
}

/// Single-slot mailbox between intake and the application runtime.
///
/// Every operation takes the slot lock once, so a delivery racing a
/// registration ends up either pushed or drained by the registration, never
/// both. Nothing is awaited while the lock is held.
#[derive(Debug, Default)]
pub struct HandoffRelay {
    slot: Mutex<HandoffSlot>,
}

impl HandoffRelay {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, HandoffSlot> {
        // Every critical section leaves the slot consistent, so a poisoned lock is still usable.
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Installs a new push channel and drains the pending file, if any.
    /// A previously registered receiver is replaced and its channel closes.
    pub fn register_receiver(self: &Arc<Self>) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut slot = self.slot();
        let id = slot.next_receiver_id;
        slot.next_receiver_id += 1;
        if slot.receiver.replace((id, tx)).is_some() {
            tracing::debug!("Replacing previously registered receiver");
        }
        let pending = slot.pending.take();
        drop(slot);

        tracing::info!(drained = pending.is_some(), "Receiver registered");
        Subscription {
            relay: Arc::clone(self),
            id,
            receiver: rx,
            pending,
        }
    }

    /// Removes the registration `id` if it is still installed, then
    /// re-delivers every file the subscription never returned, oldest first.
    /// Files go to a newer receiver if one is registered, otherwise back into
    /// the slot with last-wins. A file already pending arrived after these,
    /// so it wins over all of them.
    fn unregister_receiver(
        &self,
        id: u64,
        receiver: &mut mpsc::UnboundedReceiver<StagedFile>,
        unyielded: Option<StagedFile>,
    ) {
        let mut slot = self.slot();
        if slot.receiver.as_ref().is_some_and(|(current, _)| *current == id) {
            slot.receiver = None;
            tracing::info!("Receiver unregistered");
        }

        receiver.close();
        let mut undelivered: Vec<StagedFile> = unyielded.into_iter().collect();
        while let Ok(file) = receiver.try_recv() {
            undelivered.push(file);
        }

        let newer_pending = slot.pending.is_some();
        for file in undelivered {
            let file = match slot.push(file) {
                Ok(()) => continue,
                Err(file) => file,
            };

            if newer_pending {
                tracing::warn!(
                    abandoned = %file.staged_path.display(),
                    "Undelivered file superseded by a newer pending file"
                );
                continue;
            }

            let staged = file.staged_path.clone();
            if let Some(old) = slot.pending.replace(file) {
                tracing::warn!(
                    abandoned = %old.staged_path.display(),
                    pending = %staged.display(),
                    "Pending file replaced before collection"
                );
            } else {
                tracing::info!(pending = %staged.display(), "Holding undelivered file for the next receiver");
            }
        }
    }

    pub fn deliver(&self, file: StagedFile) -> Delivery {
        let mut slot = self.slot();

        let file = match slot.push(file) {
            Ok(()) => {
                tracing::info!("Pushed staged file to receiver");
                return Delivery::Pushed;
            }
            Err(file) => file,
        };

        let staged = file.staged_path.clone();
        let replaced = slot.pending.replace(file);
        drop(slot);

        match &replaced {
            Some(old) => tracing::warn!(
                abandoned = %old.staged_path.display(),
                pending = %staged.display(),
                "Pending file replaced before collection"
            ),
            None => tracing::info!(pending = %staged.display(), "Holding staged file until a receiver asks"),
        }

        Delivery::Held { replaced }
    }

    /// Drains the pending file without registering a receiver.
    pub fn query_pending(&self) -> Option<StagedFile> {
        self.slot().pending.take()
    }

    pub fn is_receiver_registered(&self) -> bool {
        let mut slot = self.slot();
        if slot.receiver.as_ref().is_some_and(|(_, tx)| tx.is_closed()) {
            slot.receiver = None;
        }
        slot.receiver.is_some()
    }

    pub fn has_pending(&self) -> bool {
        self.slot().pending.is_some()
    }
}
