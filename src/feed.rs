//! In-process notifications of profile changes.
//!
//! The session layer subscribes per player instead of registering callbacks
//! with the store; the services publish after each committed write.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, instrument, warn};

use crate::progression::PlayerStats;
use crate::redeem::Balances;

/// What changed on a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ProfileChange {
    /// Stats after a settled match.
    Stats(PlayerStats),
    /// Balances after a redemption or gift.
    Balances(Balances),
}

/// A committed change to one player's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    /// Player whose profile changed.
    pub user_id: i32,
    /// The new values.
    pub change: ProfileChange,
}

/// Broadcast hub for [`ProfileUpdate`]s.
#[derive(Debug, Clone)]
pub struct ProfileFeed {
    sender: broadcast::Sender<ProfileUpdate>,
}

impl ProfileFeed {
    /// Creates a feed buffering up to `capacity` updates per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an update to every subscriber.
    #[instrument(skip(self, update), fields(user_id = update.user_id))]
    pub fn publish(&self, update: ProfileUpdate) {
        match self.sender.send(update) {
            Ok(receivers) => debug!(receivers, "Profile update published"),
            Err(_) => debug!("Profile update published with no receivers"),
        }
    }

    /// Subscribes to updates for one player.
    #[instrument(skip(self))]
    pub fn subscribe(&self, user_id: i32) -> ProfileSubscription {
        ProfileSubscription {
            user_id,
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for ProfileFeed {
    fn default() -> Self {
        Self::new(64)
    }
}

/// Receiver of one player's profile updates.
#[derive(Debug)]
pub struct ProfileSubscription {
    user_id: i32,
    receiver: broadcast::Receiver<ProfileUpdate>,
}

impl ProfileSubscription {
    /// Player this subscription follows.
    pub fn user_id(&self) -> i32 {
        self.user_id
    }

    /// Waits for the next change to this player's profile.
    ///
    /// Returns `None` once the feed is dropped. Updates lost to lag are
    /// skipped; the next delivered update carries the full current values.
    pub async fn recv(&mut self) -> Option<ProfileChange> {
        loop {
            match self.receiver.recv().await {
                Ok(update) if update.user_id == self.user_id => return Some(update.change),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(user_id = self.user_id, skipped, "Profile subscription lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Returns the next already-delivered change without waiting.
    pub fn try_recv(&mut self) -> Option<ProfileChange> {
        loop {
            match self.receiver.try_recv() {
                Ok(update) if update.user_id == self.user_id => return Some(update.change),
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(user_id = self.user_id, skipped, "Profile subscription lagged");
                }
                Err(_) => return None,
            }
        }
    }
}
