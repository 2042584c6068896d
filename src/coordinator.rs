use crate::controller::{AmpController, ControllerFactory};
use crate::error::{AnthemError, Result};
use crate::series::Series;
use crate::sources::SourceRegistry;
use crate::subscription::{ZoneUpdate, ZoneUpdates};
use crate::types::{SourceId, VolumeLevel, ZoneId, ZoneStatus, DEFAULT_ZONES};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Poll interval used when the entry has no `scan_interval` option
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(10);

const UPDATE_CHANNEL_CAPACITY: usize = 16;
const STOP_GRACE: Duration = Duration::from_millis(500);

/// Static settings a coordinator is built from
#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    pub port: String,
    pub series: Series,
    pub zones: Vec<ZoneId>,
    pub update_interval: Duration,
    /// Serial settings handed to the controller factory as-is
    pub serial_overrides: Option<serde_json::Value>,
}

impl CoordinatorSettings {
    pub fn new(port: impl Into<String>, series: Series) -> Self {
        Self {
            port: port.into(),
            series,
            zones: DEFAULT_ZONES.to_vec(),
            update_interval: DEFAULT_SCAN_INTERVAL,
            serial_overrides: None,
        }
    }

    pub fn with_update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval;
        self
    }

    pub fn with_zones(mut self, zones: impl Into<Vec<ZoneId>>) -> Self {
        self.zones = zones.into();
        self
    }

    pub fn with_serial_overrides(mut self, overrides: serde_json::Value) -> Self {
        self.serial_overrides = Some(overrides);
        self
    }
}

/// Result of the most recent refresh cycles
struct CoordinatorData {
    zones: BTreeMap<ZoneId, ZoneStatus>,
    last_update_success: bool,
    last_update: Option<Instant>,
}

struct Poller {
    stop_tx: broadcast::Sender<()>,
    handle: JoinHandle<()>,
}

struct Inner {
    settings: CoordinatorSettings,
    factory: Arc<dyn ControllerFactory>,
    /// The one connection to the receiver. Every device call holds this lock.
    link: tokio::sync::Mutex<Option<Box<dyn AmpController>>>,
    connected: AtomicBool,
    /// Set by `disconnect`; background refreshes must not reopen the port
    released: AtomicBool,
    sources: RwLock<SourceRegistry>,
    data: RwLock<CoordinatorData>,
    refresh_pending: AtomicBool,
    update_tx: broadcast::Sender<ZoneUpdate>,
    poller: Mutex<Option<Poller>>,
}

/// Polls every zone of one receiver and serializes commands to it
///
/// Cloning is cheap; all clones share the same connection and snapshots.
#[derive(Clone)]
pub struct ZoneCoordinator {
    inner: Arc<Inner>,
}

#[derive(Debug, Clone, Copy)]
enum Command {
    Power(bool),
    Volume(VolumeLevel),
    Mute(bool),
    Source(SourceId),
    VolumeUp,
    VolumeDown,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Power(_) => "set_power",
            Command::Volume(_) => "set_volume",
            Command::Mute(_) => "set_mute",
            Command::Source(_) => "set_source",
            Command::VolumeUp => "volume_up",
            Command::VolumeDown => "volume_down",
        }
    }
}

impl ZoneCoordinator {
    /// Create a disconnected coordinator
    ///
    /// The source registry is seeded from the factory's defaults for the
    /// configured series. No connection is attempted until the first
    /// refresh or an explicit [`connect`](Self::connect).
    pub fn new(settings: CoordinatorSettings, factory: Arc<dyn ControllerFactory>) -> Self {
        let sources = SourceRegistry::new(factory.default_sources(settings.series));
        debug!(series = %settings.series, sources = ?sources.as_map(), "Loaded device config");

        let (update_tx, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);

        Self {
            inner: Arc::new(Inner {
                settings,
                factory,
                link: tokio::sync::Mutex::new(None),
                connected: AtomicBool::new(false),
                released: AtomicBool::new(false),
                sources: RwLock::new(sources),
                data: RwLock::new(CoordinatorData {
                    zones: BTreeMap::new(),
                    last_update_success: true,
                    last_update: None,
                }),
                refresh_pending: AtomicBool::new(false),
                update_tx,
                poller: Mutex::new(None),
            }),
        }
    }

    pub fn series(&self) -> Series {
        self.inner.settings.series
    }

    pub fn port(&self) -> &str {
        &self.inner.settings.port
    }

    pub fn zones(&self) -> &[ZoneId] {
        &self.inner.settings.zones
    }

    pub fn update_interval(&self) -> Duration {
        self.inner.settings.update_interval
    }

    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }

    /// Whether the most recent refresh reached the device
    pub fn last_update_success(&self) -> bool {
        self.read_data().last_update_success
    }

    /// Time since the last successful refresh
    pub fn since_last_update(&self) -> Option<Duration> {
        self.read_data().last_update.map(|at| at.elapsed())
    }

    /// Snapshots from the last refresh (empty before the first one)
    pub fn data(&self) -> BTreeMap<ZoneId, ZoneStatus> {
        self.read_data().zones.clone()
    }

    /// Snapshot of one zone, empty when unknown
    pub fn zone_status(&self, zone: ZoneId) -> ZoneStatus {
        self.read_data().zones.get(&zone).copied().unwrap_or_default()
    }

    /// Subscribe to refresh notifications
    pub fn subscribe(&self) -> ZoneUpdates {
        ZoneUpdates::new(self.inner.update_tx.subscribe())
    }

    // ========== Sources ==========

    /// Copy of the id → name source mapping
    pub fn sources(&self) -> BTreeMap<SourceId, String> {
        self.read_sources().as_map().clone()
    }

    /// All known source names, ordered by id
    pub fn source_names(&self) -> Vec<String> {
        self.read_sources().names()
    }

    /// Look up a source id by display name
    pub fn source_id(&self, name: &str) -> Option<SourceId> {
        self.read_sources().id(name)
    }

    /// Name of a source, registering `Source <id>` for ids never seen before
    ///
    /// Registered names stay known for the lifetime of the coordinator and
    /// can be selected like any configured source.
    pub fn resolve_or_register_source(&self, id: SourceId) -> String {
        if let Some(name) = self.read_sources().name(id) {
            return name.to_string();
        }

        let (name, added) = self
            .inner
            .sources
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .resolve_or_register(id);
        if added {
            info!(source = id, name = %name, "Registered previously unknown source");
        }
        name
    }

    // ========== Connection ==========

    /// Open the controller if not already connected
    ///
    /// Returns `false` when no handle could be created; the failure is
    /// logged and the coordinator stays disconnected.
    pub async fn connect(&self) -> bool {
        let mut link = self.inner.link.lock().await;
        self.inner.released.store(false, Ordering::SeqCst);
        self.connect_locked(&mut link).await
    }

    async fn connect_locked(&self, link: &mut Option<Box<dyn AmpController>>) -> bool {
        if link.is_some() {
            return true;
        }

        let settings = &self.inner.settings;
        info!(series = %settings.series, port = %settings.port, "Connecting to Anthem receiver");

        match self
            .inner
            .factory
            .create(settings.series, &settings.port, settings.serial_overrides.as_ref())
            .await
        {
            Ok(Some(amp)) => {
                *link = Some(amp);
                self.inner.connected.store(true, Ordering::SeqCst);
                info!(series = %settings.series, port = %settings.port, "Connected to Anthem receiver");
                true
            }
            Ok(None) => {
                let err = AnthemError::ConnectionFailed {
                    port: settings.port.clone(),
                };
                error!("{}", err);
                self.inner.connected.store(false, Ordering::SeqCst);
                false
            }
            Err(e) => {
                error!(port = %settings.port, "Error connecting to Anthem receiver: {}", e);
                self.inner.connected.store(false, Ordering::SeqCst);
                false
            }
        }
    }

    /// Close the controller
    ///
    /// Close errors are logged and ignored. The handle and all zone
    /// snapshots are dropped either way. Until the next explicit
    /// [`connect`](Self::connect) or [`refresh`](Self::refresh), background
    /// refreshes leave the port closed.
    pub async fn disconnect(&self) {
        let mut link = self.inner.link.lock().await;
        self.inner.released.store(true, Ordering::SeqCst);
        let Some(amp) = link.take() else {
            self.inner.connected.store(false, Ordering::SeqCst);
            return;
        };

        if let Err(e) = amp.close().await {
            let err = AnthemError::DisconnectFailed(e.to_string());
            error!("{}", err);
        }
        self.inner.connected.store(false, Ordering::SeqCst);
        self.write_data().zones.clear();
        drop(link);

        info!(port = %self.port(), "Disconnected from Anthem receiver");
        let _ = self.inner.update_tx.send(ZoneUpdate::Disconnected);
    }

    // ========== Refresh ==========

    /// Query every configured zone and replace all snapshots
    ///
    /// Connects first when needed; if that fails the cycle ends with
    /// [`AnthemError::UpdateFailed`]. A zone whose query fails gets an empty
    /// snapshot without affecting the others.
    ///
    /// Calling this after [`disconnect`](Self::disconnect) reconnects.
    pub async fn refresh(&self) -> Result<BTreeMap<ZoneId, ZoneStatus>> {
        self.run_refresh(false).await.map(Option::unwrap_or_default)
    }

    /// Refresh on behalf of the poller or a command
    ///
    /// Skipped once the receiver has been released by `disconnect`.
    async fn background_refresh(&self) {
        match self.run_refresh(true).await {
            Ok(Some(_)) => {}
            Ok(None) => debug!("Skipped refresh: receiver released"),
            Err(e) => warn!("Background refresh failed: {}", e),
        }
    }

    async fn run_refresh(&self, background: bool) -> Result<Option<BTreeMap<ZoneId, ZoneStatus>>> {
        let result = self.refresh_locked(background).await;

        let update = match &result {
            Ok(Some(zones)) => Some(ZoneUpdate::Refreshed(zones.clone())),
            Ok(None) => None,
            Err(e) => Some(ZoneUpdate::UpdateFailed(e.to_string())),
        };
        if let Some(update) = update {
            let _ = self.inner.update_tx.send(update);
        }

        result
    }

    async fn refresh_locked(&self, background: bool) -> Result<Option<BTreeMap<ZoneId, ZoneStatus>>> {
        let mut link = self.inner.link.lock().await;

        if background {
            if self.inner.released.load(Ordering::SeqCst) {
                return Ok(None);
            }
        } else {
            self.inner.released.store(false, Ordering::SeqCst);
        }

        if !self.connect_locked(&mut link).await {
            self.write_data().last_update_success = false;
            return Err(AnthemError::UpdateFailed("Failed to connect to Anthem device".to_string()));
        }
        let Some(amp) = link.as_deref() else {
            self.write_data().last_update_success = false;
            return Err(AnthemError::UpdateFailed("Connection lost".to_string()));
        };

        let mut zones = BTreeMap::new();
        for &zone in &self.inner.settings.zones {
            let status = match amp.zone_status(zone).await {
                Ok(status) => status.unwrap_or_default(),
                Err(e) => {
                    let err = AnthemError::ZoneQueryFailed {
                        zone,
                        detail: e.to_string(),
                    };
                    error!("{}", err);
                    ZoneStatus::empty()
                }
            };

            if let Some(source) = status.source {
                self.resolve_or_register_source(source);
            }
            zones.insert(zone, status);
        }

        debug!(zones = ?zones, "Updated zone data");

        let mut data = self.write_data();
        data.zones = zones.clone();
        data.last_update_success = true;
        data.last_update = Some(Instant::now());

        Ok(Some(zones))
    }

    /// Schedule a refresh without waiting for it
    ///
    /// Requests made while one is still pending are merged. The refresh
    /// queues behind any cycle already holding the connection, and is
    /// dropped if the receiver was released in the meantime.
    pub fn request_refresh(&self) {
        if self.inner.refresh_pending.swap(true, Ordering::SeqCst) {
            debug!("Refresh already pending");
            return;
        }

        let coordinator = self.clone();
        tokio::spawn(async move {
            coordinator.inner.refresh_pending.store(false, Ordering::SeqCst);
            coordinator.background_refresh().await;
        });
    }

    /// Start refreshing on the configured interval
    ///
    /// The first scheduled refresh happens one interval from now. Calling
    /// this while polling is already running does nothing.
    pub fn start(&self) {
        let mut poller = self.inner.poller.lock().unwrap_or_else(PoisonError::into_inner);
        if poller.is_some() {
            debug!("Polling already running");
            return;
        }

        let period = self.update_interval();
        if period.is_zero() {
            warn!("Polling disabled: update interval is zero");
            return;
        }

        let (stop_tx, mut stop_rx) = broadcast::channel(1);
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = stop_rx.recv() => {
                        info!("Polling stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let Some(inner) = weak.upgrade() else {
                            break;
                        };
                        ZoneCoordinator { inner }.background_refresh().await;
                    }
                }
            }
        });

        info!(interval = ?period, port = %self.port(), "Polling started");
        *poller = Some(Poller { stop_tx, handle });
    }

    /// Stop interval polling
    ///
    /// A refresh already in progress is allowed to finish.
    pub async fn stop(&self) {
        let poller = self
            .inner
            .poller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(Poller { stop_tx, handle }) = poller {
            let _ = stop_tx.send(());
            if tokio::time::timeout(STOP_GRACE, handle).await.is_err() {
                warn!("Poll task still running after {:?}, detaching", STOP_GRACE);
            }
        }
    }

    // ========== Commands ==========

    pub async fn set_power(&self, zone: ZoneId, power: bool) {
        self.send_command(zone, Command::Power(power)).await
    }

    pub async fn set_volume(&self, zone: ZoneId, volume: VolumeLevel) {
        self.send_command(zone, Command::Volume(volume)).await
    }

    pub async fn set_mute(&self, zone: ZoneId, mute: bool) {
        self.send_command(zone, Command::Mute(mute)).await
    }

    pub async fn set_source(&self, zone: ZoneId, source: SourceId) {
        self.send_command(zone, Command::Source(source)).await
    }

    pub async fn volume_up(&self, zone: ZoneId) {
        self.send_command(zone, Command::VolumeUp).await
    }

    pub async fn volume_down(&self, zone: ZoneId) {
        self.send_command(zone, Command::VolumeDown).await
    }

    /// Run one command against the receiver, then request a refresh
    ///
    /// Never fails: a missing connection or a controller error is logged
    /// and the command is dropped.
    async fn send_command(&self, zone: ZoneId, command: Command) {
        let link = self.inner.link.lock().await;
        let Some(amp) = link.as_deref() else {
            warn!(zone, command = command.name(), "Cannot send command: not connected");
            return;
        };

        let result = match command {
            Command::Power(power) => amp.set_power(zone, power).await,
            Command::Volume(volume) => amp.set_volume(zone, volume).await,
            Command::Mute(mute) => amp.set_mute(zone, mute).await,
            Command::Source(source) => amp.set_source(zone, source).await,
            Command::VolumeUp => amp.volume_up(zone).await,
            Command::VolumeDown => amp.volume_down(zone).await,
        };
        drop(link);

        match result {
            Ok(()) => {
                debug!(zone, command = ?command, "Command sent");
                self.request_refresh();
            }
            Err(e) => {
                let err = AnthemError::CommandFailed {
                    command: command.name(),
                    zone,
                    detail: e.to_string(),
                };
                error!("{}", err);
            }
        }
    }

    fn read_data(&self) -> std::sync::RwLockReadGuard<'_, CoordinatorData> {
        self.inner.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_data(&self) -> std::sync::RwLockWriteGuard<'_, CoordinatorData> {
        self.inner.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_sources(&self) -> std::sync::RwLockReadGuard<'_, SourceRegistry> {
        self.inner.sources.read().unwrap_or_else(PoisonError::into_inner)
    }
}
