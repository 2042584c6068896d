#![allow(dead_code)]

use anthem_zones::{AmpController, ControllerFactory, Result, Series, SourceId, VolumeLevel, ZoneId, ZoneStatus};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SetPower(ZoneId, bool),
    SetVolume(ZoneId, VolumeLevel),
    SetMute(ZoneId, bool),
    SetSource(ZoneId, SourceId),
    VolumeUp(ZoneId),
    VolumeDown(ZoneId),
    Close,
}

/// Receiver double: answers status queries from a table and records commands
#[derive(Clone, Default)]
pub struct FakeReceiver {
    statuses: Arc<Mutex<BTreeMap<ZoneId, ZoneStatus>>>,
    commands: Arc<Mutex<Vec<Call>>>,
    queries: Arc<Mutex<Vec<ZoneId>>>,
}

impl FakeReceiver {
    pub fn set_status(&self, zone: ZoneId, status: ZoneStatus) {
        self.statuses.lock().unwrap().insert(zone, status);
    }

    pub fn commands(&self) -> Vec<Call> {
        self.commands.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<ZoneId> {
        self.queries.lock().unwrap().clone()
    }

    fn record(&self, call: Call) -> Result<()> {
        self.commands.lock().unwrap().push(call);
        Ok(())
    }
}

#[async_trait]
impl AmpController for FakeReceiver {
    async fn zone_status(&self, zone: ZoneId) -> Result<Option<ZoneStatus>> {
        self.queries.lock().unwrap().push(zone);
        Ok(self.statuses.lock().unwrap().get(&zone).copied())
    }

    async fn set_power(&self, zone: ZoneId, power: bool) -> Result<()> {
        self.record(Call::SetPower(zone, power))
    }

    async fn set_volume(&self, zone: ZoneId, volume: VolumeLevel) -> Result<()> {
        self.record(Call::SetVolume(zone, volume))
    }

    async fn set_mute(&self, zone: ZoneId, mute: bool) -> Result<()> {
        self.record(Call::SetMute(zone, mute))
    }

    async fn set_source(&self, zone: ZoneId, source: SourceId) -> Result<()> {
        self.record(Call::SetSource(zone, source))
    }

    async fn volume_up(&self, zone: ZoneId) -> Result<()> {
        self.record(Call::VolumeUp(zone))
    }

    async fn volume_down(&self, zone: ZoneId) -> Result<()> {
        self.record(Call::VolumeDown(zone))
    }

    async fn close(&self) -> Result<()> {
        self.record(Call::Close)
    }
}

pub struct FakeFactory {
    pub receiver: FakeReceiver,
    pub opened: Mutex<Vec<(Series, String)>>,
}

impl FakeFactory {
    pub fn new(receiver: FakeReceiver) -> Arc<Self> {
        Arc::new(Self {
            receiver,
            opened: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ControllerFactory for FakeFactory {
    async fn create(
        &self,
        series: Series,
        port: &str,
        _overrides: Option<&serde_json::Value>,
    ) -> Result<Option<Box<dyn AmpController>>> {
        self.opened.lock().unwrap().push((series, port.to_string()));
        Ok(Some(Box::new(self.receiver.clone())))
    }
}
