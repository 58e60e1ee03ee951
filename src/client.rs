//! User-facing client

use std::sync::{Arc, RwLockReadGuard};
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::connection::{Connection, ConnectionState};
use crate::draft::RecordDraft;
use crate::session::HttpSession;
use crate::sessions::ReqwestSession;
use crate::store::{ChangeNotification, Snapshot};
use crate::subscription::{Subscription, UpdateStream};
use crate::transport::Connector;
use crate::transports::WebsocketConnector;
use crate::types::ModelKind;
use crate::{ProtectError, Result};

/// Client for one NVR controller.
///
/// Fetches the bootstrap, keeps the snapshot current from the update
/// websocket and sends record edits back over REST.
///
/// ```rust,no_run
/// use nvrsync::{ClientConfig, ProtectClient};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> nvrsync::Result<()> {
/// let client = ProtectClient::connect(ClientConfig::new("192.168.1.1", "admin", "secret")).await?;
/// let mut updates = client.updates();
///
/// while let Some(change) = updates.next().await {
///     println!("{} {:?} changed {:?}", change.kind, change.id, change.changed_fields().collect::<Vec<_>>());
/// }
/// # Ok(())
/// # }
/// ```
pub struct ProtectClient {
    connection: Connection,
    timezone: String,
}

impl ProtectClient {
    /// Log in, fetch the bootstrap and open the update websocket.
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let session = Arc::new(ReqwestSession::new(&config)?);
        Self::with_transport(config, session, Arc::new(WebsocketConnector::new())).await
    }

    /// Same as [`connect`](Self::connect) with caller-supplied collaborators.
    pub async fn with_transport(
        config: ClientConfig,
        session: Arc<dyn HttpSession>,
        connector: Arc<dyn Connector>,
    ) -> Result<Self> {
        let client = Self::bootstrap(config, session, connector).await?;
        client.connection.connect().await?;
        Ok(client)
    }

    /// Fetch the bootstrap without opening the websocket.
    pub async fn bootstrap(
        config: ClientConfig,
        session: Arc<dyn HttpSession>,
        connector: Arc<dyn Connector>,
    ) -> Result<Self> {
        config.validate()?;
        let bootstrap = session.bootstrap().await?;
        let snapshot = Snapshot::from_wire_with_capacity(&bootstrap, config.max_event_history)?;

        let timezone = config.resolve_timezone(snapshot.nvr_timezone());
        info!(
            "Bootstrap loaded for {} (timezone {})",
            snapshot.nvr().name().unwrap_or("<unnamed nvr>"),
            timezone
        );

        let connection = Connection::new(config, session, connector, snapshot);
        Ok(Self { connection, timezone })
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Read access to the snapshot. Do not hold the guard across `.await`.
    pub fn snapshot(&self) -> RwLockReadGuard<'_, Snapshot> {
        self.connection.snapshot()
    }

    /// Timezone resolved at startup.
    pub fn timezone(&self) -> &str {
        &self.timezone
    }

    /// Call `observer` after every applied packet, on the receive task.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&Arc<ChangeNotification>) + Send + Sync + 'static,
    {
        self.connection.subscribers().subscribe(observer)
    }

    /// Stream of change notifications from now on.
    pub fn updates(&self) -> UpdateStream {
        self.connection.subscribers().stream()
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn state_updates(&self) -> WatchStream<ConnectionState> {
        self.connection.state_updates()
    }

    pub async fn disconnect(&self) {
        self.connection.disconnect().await
    }

    pub async fn reconnect(&self) -> Result<()> {
        self.connection.reconnect().await
    }

    pub async fn refresh_bootstrap(&self) -> Result<()> {
        self.connection.refresh_bootstrap().await
    }

    /// Start editing a stored record.
    pub fn edit(&self, kind: ModelKind, id: &str) -> Result<RecordDraft> {
        let snapshot = self.snapshot();
        let record = snapshot
            .get(kind, id)
            .ok_or_else(|| ProtectError::bad_request(format!("Unknown {} {}", kind, id)))?;
        Ok(RecordDraft::new(record.clone()))
    }

    /// Send the changed fields of `draft`. Nothing is sent when nothing changed.
    ///
    /// The snapshot is updated when the controller echoes the change.
    pub async fn save(&self, draft: &RecordDraft) -> Result<()> {
        let diff = draft.wire_diff();
        if diff.is_empty() {
            debug!("No changes to save for {} {:?}", draft.kind(), draft.id());
            return Ok(());
        }

        let path = draft.api_path()?;
        debug!("Saving {} changed fields to {}", diff.len(), path);
        self.connection.session().patch_json(&path, &diff).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::mock::{MockConnector, MockSession};
    use crate::test_utils::*;
    use crate::types::PercentInt;
    use futures::StreamExt;
    use serde_json::json;
    use uuid::Uuid;

    async fn client() -> (ProtectClient, Arc<MockConnector>, Arc<MockSession>) {
        let connector = Arc::new(MockConnector::default());
        let session = Arc::new(MockSession::default());
        let config = ClientConfig { resync_on_reconnect: false, ..ClientConfig::new("nvr.local", "admin", "pw") };
        let client = ProtectClient::bootstrap(config, session.clone(), connector.clone()).await.unwrap();
        (client, connector, session)
    }

    #[tokio::test]
    async fn bootstrap_loads_snapshot_and_timezone() {
        let (client, connector, session) = client().await;

        assert_eq!(session.bootstraps(), 1);
        assert_eq!(connector.connects(), 0);
        assert_eq!(client.timezone(), "America/New_York");
        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert_eq!(client.snapshot().records(ModelKind::Camera).count(), 2);
    }

    #[tokio::test]
    async fn configured_timezone_wins() {
        let session = Arc::new(MockSession::default());
        let config = ClientConfig { timezone: Some("Europe/Berlin".to_string()), ..ClientConfig::new("nvr.local", "a", "b") };
        let client = ProtectClient::bootstrap(config, session, Arc::new(MockConnector::default())).await.unwrap();

        assert_eq!(client.timezone(), "Europe/Berlin");
    }

    #[tokio::test]
    async fn invalid_config_is_rejected_before_any_request() {
        let session = Arc::new(MockSession::default());
        let config = ClientConfig::new("", "admin", "pw");
        let result = ProtectClient::bootstrap(config, session.clone(), Arc::new(MockConnector::default())).await;

        assert!(result.is_err());
        assert_eq!(session.bootstraps(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn updates_flow_through_the_client() {
        let connector = Arc::new(MockConnector::default());
        let feed = connector.push_channel();
        let config = ClientConfig { resync_on_reconnect: false, ..ClientConfig::new("nvr.local", "admin", "pw") };
        let client = ProtectClient::with_transport(config, Arc::new(MockSession::default()), connector.clone())
            .await
            .unwrap();
        let mut updates = client.updates();

        feed.send(Some(Ok(packet_bytes(
            action_json("update", "camera", Some(CAMERA_ID), Uuid::from_u128(5)),
            json!({"micVolume": 12}),
        ))))
        .unwrap();

        let change = updates.next().await.unwrap();
        assert_eq!(change.new.get_i64("mic_volume"), Some(12));
        client.disconnect().await;
        assert_eq!(client.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn save_sends_only_changed_fields() {
        let (client, _, session) = client().await;
        let mut draft = client.edit(ModelKind::Camera, CAMERA_ID).unwrap();
        draft.set_mic_volume(PercentInt::new(42).unwrap()).unwrap();

        client.save(&draft).await.unwrap();

        let patches = session.patches.lock().unwrap();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].0, format!("cameras/{}", CAMERA_ID));
        assert_eq!(serde_json::Value::Object(patches[0].1.clone()), json!({"micVolume": 42}));

        // The snapshot waits for the controller's echo.
        assert_eq!(client.snapshot().get(ModelKind::Camera, CAMERA_ID).unwrap().get_i64("mic_volume"), Some(100));
    }

    #[tokio::test]
    async fn save_without_changes_sends_nothing() {
        let (client, _, session) = client().await;
        let draft = client.edit(ModelKind::Light, LIGHT_ID).unwrap();

        client.save(&draft).await.unwrap();
        assert!(session.patches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn editing_unknown_record_fails() {
        let (client, _, _) = client().await;
        assert!(matches!(client.edit(ModelKind::Camera, "nope"), Err(ProtectError::BadRequest { .. })));
    }

    #[tokio::test]
    async fn rejected_edit_is_never_sent() {
        let (client, _, session) = client().await;
        let mut draft = client.edit(ModelKind::Camera, DOORBELL_ID).unwrap();

        assert!(draft.set_hdr(true).is_err());
        client.save(&draft).await.unwrap();
        assert!(session.patches.lock().unwrap().is_empty());
    }
}
