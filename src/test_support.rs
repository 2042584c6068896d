//! Recording controller doubles for unit tests

use crate::controller::{AmpController, ControllerFactory};
use crate::coordinator::{CoordinatorSettings, ZoneCoordinator};
use crate::error::{AnthemError, Result};
use crate::series::Series;
use crate::types::{SourceId, VolumeLevel, ZoneId, ZoneStatus};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ZoneStatus(ZoneId),
    SetPower(ZoneId, bool),
    SetVolume(ZoneId, VolumeLevel),
    SetMute(ZoneId, bool),
    SetSource(ZoneId, SourceId),
    VolumeUp(ZoneId),
    VolumeDown(ZoneId),
    Close,
}

#[derive(Default)]
struct MockState {
    calls: Vec<Call>,
    statuses: BTreeMap<ZoneId, Option<ZoneStatus>>,
    failing_zones: BTreeSet<ZoneId>,
    fail_commands: bool,
    fail_close: bool,
    query_delay: Option<Duration>,
    in_flight: usize,
    max_in_flight: usize,
}

/// Controller that records every call and answers from canned statuses
#[derive(Clone, Default)]
pub struct MockAmp {
    state: Arc<Mutex<MockState>>,
}

impl MockAmp {
    /// Every zone reports on, volume 0.5, unmuted, source 1
    pub fn new() -> Self {
        let amp = Self::default();
        for zone in 1..=3 {
            amp.set_status(zone, Some(playing(0.5, 1)));
        }
        amp
    }

    pub fn set_status(&self, zone: ZoneId, status: Option<ZoneStatus>) {
        self.state.lock().unwrap().statuses.insert(zone, status);
    }

    pub fn fail_zone(&self, zone: ZoneId) {
        self.state.lock().unwrap().failing_zones.insert(zone);
    }

    pub fn fail_commands(&self) {
        self.state.lock().unwrap().fail_commands = true;
    }

    /// Make every status query take `delay` to answer
    pub fn delay_queries(&self, delay: Duration) {
        self.state.lock().unwrap().query_delay = Some(delay);
    }

    /// Highest number of status queries seen running at once
    pub fn max_in_flight(&self) -> usize {
        self.state.lock().unwrap().max_in_flight
    }

    pub fn fail_close(&self) {
        self.state.lock().unwrap().fail_close = true;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Calls other than status queries
    pub fn commands(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| !matches!(call, Call::ZoneStatus(_)))
            .collect()
    }

    pub fn status_queries(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::ZoneStatus(_)))
            .count()
    }

    fn command(&self, call: Call) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if state.fail_commands {
            return Err(AnthemError::Controller("serial write failed".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl AmpController for MockAmp {
    async fn zone_status(&self, zone: ZoneId) -> Result<Option<ZoneStatus>> {
        let delay = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(Call::ZoneStatus(zone));
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);
            state.query_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().unwrap();
        state.in_flight -= 1;
        if state.failing_zones.contains(&zone) {
            return Err(AnthemError::Controller("no reply".to_string()));
        }
        Ok(state.statuses.get(&zone).copied().flatten())
    }

    async fn set_power(&self, zone: ZoneId, power: bool) -> Result<()> {
        self.command(Call::SetPower(zone, power))
    }

    async fn set_volume(&self, zone: ZoneId, volume: VolumeLevel) -> Result<()> {
        self.command(Call::SetVolume(zone, volume))
    }

    async fn set_mute(&self, zone: ZoneId, mute: bool) -> Result<()> {
        self.command(Call::SetMute(zone, mute))
    }

    async fn set_source(&self, zone: ZoneId, source: SourceId) -> Result<()> {
        self.command(Call::SetSource(zone, source))
    }

    async fn volume_up(&self, zone: ZoneId) -> Result<()> {
        self.command(Call::VolumeUp(zone))
    }

    async fn volume_down(&self, zone: ZoneId) -> Result<()> {
        self.command(Call::VolumeDown(zone))
    }

    async fn close(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Close);
        if state.fail_close {
            return Err(AnthemError::Controller("port busy".to_string()));
        }
        Ok(())
    }
}

/// Factory handing out clones of one [`MockAmp`], or nothing at all
pub struct MockFactory {
    amp: Option<MockAmp>,
    created: AtomicUsize,
}

impl MockFactory {
    pub fn new(amp: MockAmp) -> Arc<Self> {
        Arc::new(Self {
            amp: Some(amp),
            created: AtomicUsize::new(0),
        })
    }

    /// Factory whose `create` yields no handle
    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            amp: None,
            created: AtomicUsize::new(0),
        })
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ControllerFactory for MockFactory {
    async fn create(
        &self,
        _series: Series,
        _port: &str,
        _overrides: Option<&serde_json::Value>,
    ) -> Result<Option<Box<dyn AmpController>>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .amp
            .clone()
            .map(|amp| Box::new(amp) as Box<dyn AmpController>))
    }
}

pub fn playing(volume: VolumeLevel, source: SourceId) -> ZoneStatus {
    ZoneStatus {
        power: Some(true),
        volume: Some(volume),
        mute: Some(false),
        source: Some(source),
    }
}

pub fn settings() -> CoordinatorSettings {
    CoordinatorSettings::new("/dev/ttyUSB0", Series::D2v)
}

pub fn coordinator(factory: Arc<MockFactory>) -> ZoneCoordinator {
    ZoneCoordinator::new(settings(), factory)
}
