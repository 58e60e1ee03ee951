//! Connection supervisor
//!
//! Owns the snapshot and drives it from the update websocket:
//!
//! ```text
//! Disconnected ──connect()──► Connecting ──first message / wait──► Connected
//!      ▲                          │                                    │
//!      └────────── failure ───────┘◄──── idle timeout / close ─────────┘
//!                                          (automatic reconnect)
//! ```
//!
//! Every received packet is applied to the snapshot and fanned out to
//! subscribers on the receive task. A packet that fails to decode or names an
//! unknown kind is logged and dropped; it never ends the connection.
//!
//! Reconnects are single-flight: the receive loop and the idle watchdog may
//! both ask for one, but only one reconnect loop runs at a time. Connects are
//! serialized; a connect that finds the channel already up leaves it alone.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard};
use tokio::sync::{Mutex as AsyncMutex, mpsc, watch};
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::driver::{Driver, DriverEvent, PacketHandler};
use crate::session::HttpSession;
use crate::store::Snapshot;
use crate::subscription::Subscribers;
use crate::transport::Connector;
use crate::wire::WsPacket;
use crate::{ProtectError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

struct Shared {
    config: ClientConfig,
    session: Arc<dyn HttpSession>,
    connector: Arc<dyn Connector>,
    snapshot: RwLock<Snapshot>,
    subscribers: Subscribers,
    state: watch::Sender<ConnectionState>,
    /// Token of the currently open channel.
    current: Mutex<Option<CancellationToken>>,
    /// Held for the whole of a connect attempt.
    connecting: AsyncMutex<()>,
    reconnecting: AtomicBool,
    /// Set by an explicit `disconnect`; stops automatic reconnects.
    stopped: AtomicBool,
}

impl PacketHandler for Shared {
    fn handle_packet(&self, packet: WsPacket) {
        let result = self.snapshot.write().unwrap_or_else(PoisonError::into_inner).apply_packet(&packet);

        // Observers run after the write lock is released so they can read the snapshot.
        match result {
            Ok(Some(change)) => self.subscribers.notify(&Arc::new(change)),
            Ok(None) => {}
            Err(e) => warn!("Dropping update packet: {}", e),
        }
    }
}

impl Shared {
    fn set_state(&self, state: ConnectionState) {
        self.state.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            debug!("Connection state {:?} -> {:?}", current, state);
            *current = state;
            true
        });
    }

    fn close_channel(&self) {
        if let Some(token) = self.current.lock().unwrap_or_else(PoisonError::into_inner).take() {
            token.cancel();
        }
        self.set_state(ConnectionState::Disconnected);
    }

    async fn connect(self: &Arc<Self>) -> Result<()> {
        let _guard = self.connecting.lock().await;
        if *self.state.borrow() == ConnectionState::Connected {
            debug!("Already connected");
            return Ok(());
        }

        self.close_channel();
        self.set_state(ConnectionState::Connecting);

        match self.open().await {
            Ok(()) => {
                self.set_state(ConnectionState::Connected);
                Ok(())
            }
            Err(e) => {
                self.close_channel();
                Err(e)
            }
        }
    }

    async fn open(self: &Arc<Self>) -> Result<()> {
        let wait = self.config.connect_wait();
        let headers = self.session.auth_headers().await?;
        let last_update_id = self.snapshot.read().unwrap_or_else(PoisonError::into_inner).last_update_id();
        let url = self.config.websocket_url(last_update_id);

        info!("Connecting to {}", url);
        let channel = tokio::time::timeout(wait, self.connector.connect(&url, &headers))
            .await
            .map_err(|_| ProtectError::Timeout { duration: wait })??;

        let token = CancellationToken::new();
        if let Some(previous) = self.current.lock().unwrap_or_else(PoisonError::into_inner).replace(token.clone()) {
            previous.cancel();
        }
        let mut events = Driver::spawn(channel, self.clone(), self.config.idle_timeout(), token.clone());

        // A quiet controller is not a failure: the channel is up once the wait elapses.
        match tokio::time::timeout(wait, events.recv()).await {
            Ok(Some(DriverEvent::FirstMessage)) => debug!("First message received"),
            Err(_) => debug!("No message within {:?}, assuming connected", wait),
            Ok(Some(event)) => {
                return Err(ProtectError::connection_failed(format!("Channel ended before first message: {:?}", event)));
            }
            Ok(None) => return Err(ProtectError::connection_failed("Channel ended before first message")),
        }

        tokio::spawn(self.clone().monitor(events, token));
        info!("Connected");
        Ok(())
    }

    /// Watch one channel's driver and reconnect when it dies on its own.
    async fn monitor(self: Arc<Self>, mut events: mpsc::UnboundedReceiver<DriverEvent>, token: CancellationToken) {
        while let Some(event) = events.recv().await {
            if !event.is_terminal() {
                continue;
            }
            if token.is_cancelled() {
                break;
            }
            warn!("Connection lost: {:?}", event);
            self.spawn_reconnect();
            break;
        }
    }

    /// Start a reconnect loop in the background unless one is running.
    fn spawn_reconnect(self: &Arc<Self>) {
        if self.stopped.load(Ordering::Acquire) {
            return;
        }
        if self.reconnecting.swap(true, Ordering::AcqRel) {
            debug!("Reconnect already in progress");
            return;
        }

        let shared = self.clone();
        tokio::spawn(async move {
            if let Err(e) = shared.reconnect_loop().await {
                error!("Giving up reconnecting: {}", e);
            }
            shared.reconnecting.store(false, Ordering::Release);
        });
    }

    async fn reconnect_loop(self: &Arc<Self>) -> Result<()> {
        let mut attempt = 0u32;
        loop {
            self.close_channel();
            tokio::time::sleep(self.config.reconnect_wait()).await;
            if self.stopped.load(Ordering::Acquire) {
                debug!("Reconnect abandoned after disconnect");
                return Ok(());
            }

            attempt += 1;
            info!("Reconnect attempt {}", attempt);
            let result = match self.connect().await {
                Ok(()) if self.config.resync_on_reconnect => self.refresh_bootstrap().await,
                other => other,
            };

            match result {
                Ok(()) if self.stopped.load(Ordering::Acquire) => {
                    self.close_channel();
                    return Ok(());
                }
                Ok(()) => return Ok(()),
                Err(e) => {
                    error!("Reconnect attempt {} failed: {}", attempt, e);
                    if self.config.max_reconnect_attempts.is_some_and(|max| attempt >= max) {
                        return Err(e);
                    }
                }
            }
        }
    }

    async fn refresh_bootstrap(&self) -> Result<()> {
        let bootstrap = self.session.bootstrap().await?;
        let mut snapshot = Snapshot::from_wire_with_capacity(&bootstrap, self.config.max_event_history)?;
        snapshot.set_subscribed_kinds(self.config.subscribed_kinds.clone());

        info!("Bootstrap refreshed (last_update_id={})", snapshot.last_update_id());
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
        Ok(())
    }
}

/// Supervised connection to one controller.
///
/// Dropping the connection closes the channel and stops reconnecting.
pub struct Connection {
    shared: Arc<Shared>,
}

impl Connection {
    pub fn new(
        config: ClientConfig,
        session: Arc<dyn HttpSession>,
        connector: Arc<dyn Connector>,
        mut snapshot: Snapshot,
    ) -> Self {
        snapshot.set_subscribed_kinds(config.subscribed_kinds.clone());
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            shared: Arc::new(Shared {
                config,
                session,
                connector,
                snapshot: RwLock::new(snapshot),
                subscribers: Subscribers::new(),
                state,
                current: Mutex::new(None),
                connecting: AsyncMutex::new(()),
                reconnecting: AtomicBool::new(false),
                stopped: AtomicBool::new(false),
            }),
        }
    }

    /// Open the update channel.
    ///
    /// Succeeds once the first message arrives or the connect wait elapses
    /// with the channel still open. Returns at once when already connected.
    pub async fn connect(&self) -> Result<()> {
        self.shared.stopped.store(false, Ordering::Release);
        self.shared.connect().await
    }

    /// Close the channel and stop reconnecting. Safe in any state.
    pub async fn disconnect(&self) {
        self.shared.stopped.store(true, Ordering::Release);
        self.shared.close_channel();
        info!("Disconnected");
    }

    /// Close and reopen the channel, retrying with the configured delay.
    ///
    /// Returns immediately if a reconnect is already running.
    pub async fn reconnect(&self) -> Result<()> {
        if self.shared.reconnecting.swap(true, Ordering::AcqRel) {
            debug!("Reconnect already in progress");
            return Ok(());
        }
        self.shared.stopped.store(false, Ordering::Release);
        let result = self.shared.reconnect_loop().await;
        self.shared.reconnecting.store(false, Ordering::Release);
        result
    }

    /// Replace the snapshot with a freshly fetched bootstrap.
    pub async fn refresh_bootstrap(&self) -> Result<()> {
        self.shared.refresh_bootstrap().await
    }

    pub fn state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    /// Current state followed by every change.
    pub fn state_updates(&self) -> WatchStream<ConnectionState> {
        WatchStream::new(self.shared.state.subscribe())
    }

    /// Read access to the snapshot. Do not hold the guard across `.await`.
    pub fn snapshot(&self) -> RwLockReadGuard<'_, Snapshot> {
        self.shared.snapshot.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribers(&self) -> &Subscribers {
        &self.shared.subscribers
    }

    pub fn session(&self) -> &Arc<dyn HttpSession> {
        &self.shared.session
    }

    pub fn config(&self) -> &ClientConfig {
        &self.shared.config
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        debug!("Dropping connection");
        self.shared.stopped.store(true, Ordering::Release);
        self.shared.close_channel();
    }
}
