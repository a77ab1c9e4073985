//! Background auth-state watcher.
//!
//! Pushes the current user to a callback whenever the session changes and
//! re-checks the token against the server on a fixed interval, so a token
//! revoked elsewhere is noticed without any local action.

use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use crate::auth::models::AuthUser;
use crate::client::auth::AuthClient;
use crate::client::session::SessionEvent;

/// Shortest interval between server-side checks.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Handle to a running watcher. Dropping it stops the task; call
/// [`AuthSubscription::unsubscribe`] to also wait for it to finish.
pub struct AuthSubscription {
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl AuthSubscription {
    pub(crate) fn spawn<F>(client: AuthClient, poll_interval: Duration, mut callback: F) -> Self
    where
        F: FnMut(Option<AuthUser>) + Send + 'static,
    {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        // subscribe before spawning so no event between here and the first poll is lost
        let mut events = client.session().subscribe();
        let poll_interval = poll_interval.max(MIN_POLL_INTERVAL);

        let handle = tokio::spawn(async move {
            let mut timer = interval(poll_interval);
            // a slow check never queues a burst of catch-up checks
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = timer.tick() => {
                        let user = match client.current_user().await {
                            Ok(user) => Some(user),
                            Err(e) => {
                                tracing::debug!("auth check: {}", e);
                                None
                            }
                        };
                        callback(user);
                    }
                    event = events.recv() => match event {
                        Ok(SessionEvent::SignedIn(user)) => callback(Some(user)),
                        Ok(SessionEvent::SignedOut | SessionEvent::Evicted) => callback(None),
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::debug!("auth watcher skipped {} session events", skipped);
                            callback(client.current_user().await.ok());
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }

            tracing::debug!("auth watcher stopped");
        });

        tracing::debug!("auth watcher started, polling every {:?}", poll_interval);
        Self {
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    /// Stop the watcher and wait until the callback can no longer run.
    pub async fn unsubscribe(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!("auth watcher ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
