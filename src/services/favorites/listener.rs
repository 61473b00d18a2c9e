use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::{
    models::UserId,
    services::{favorites::FavoritesStore, identity::SessionContext},
};

/// Keeps a `FavoritesStore` in step with the session
///
/// Waits for the initial session lookup, then reacts to every identity
/// change: a new user triggers a reload, sign-out clears the favorites.
/// Token refreshes for the same user are ignored.
pub struct FavoritesListener {
    store: Arc<FavoritesStore>,
    session: SessionContext,
}

/// Stops the listener when `shutdown` is called or the handle is dropped
pub struct ListenerHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ListenerHandle {
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Favorites listener task failed");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().map(|t| !t.is_finished()).unwrap_or(false)
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl FavoritesListener {
    pub fn new(store: Arc<FavoritesStore>, session: SessionContext) -> Self {
        Self { store, session }
    }

    pub fn spawn(self) -> ListenerHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(self.run(shutdown_rx));

        ListenerHandle {
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        }
    }

    async fn run(self, mut shutdown_rx: oneshot::Receiver<()>) {
        let mut rx = self.session.subscribe();

        tokio::select! {
            _ = &mut shutdown_rx => return,
            _ = self.session.wait_initialized() => {}
        }

        let mut observed: Option<Option<UserId>> = None;

        loop {
            let current = rx.borrow_and_update().user_id().cloned();
            if observed.as_ref() != Some(&current) {
                self.apply(current.clone()).await;
                observed = Some(current);
            }

            tokio::select! {
                _ = &mut shutdown_rx => break,
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        tracing::debug!("Favorites listener stopped");
    }

    async fn apply(&self, identity: Option<UserId>) {
        match identity {
            None => {
                self.store.set_identity(None).await;
            }
            Some(user_id) => {
                self.store.set_identity(Some(user_id.clone())).await;

                // Detached; the store drops the result if the identity moves on.
                let store = self.store.clone();
                tokio::spawn(async move {
                    if let Err(e) = store.load_for_identity(user_id.clone()).await {
                        tracing::warn!(
                            user_id = %user_id,
                            error = %e,
                            "Initial favorites load failed"
                        );
                    }
                });
            }
        }
    }
}
