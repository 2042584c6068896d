use crate::config::ConfigEntry;
use crate::coordinator::ZoneCoordinator;
use serde_json::{json, Map, Value};

/// Placeholder written in place of redacted values
pub const REDACTED: &str = "**REDACTED**";

/// Entry data keys that identify the physical installation
pub const REDACT_KEYS: [&str; 2] = ["port", "serial_number"];

/// Replace the values of `keys` in a JSON object, recursing into nested values
pub fn redact(value: &Value, keys: &[&str]) -> Value {
    match value {
        Value::Object(map) => {
            let redacted: Map<String, Value> = map
                .iter()
                .map(|(k, v)| {
                    if keys.contains(&k.as_str()) {
                        (k.clone(), Value::String(REDACTED.to_string()))
                    } else {
                        (k.clone(), redact(v, keys))
                    }
                })
                .collect();
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(items.iter().map(|v| redact(v, keys)).collect()),
        other => other.clone(),
    }
}

/// Diagnostics for one config entry
///
/// Covers the entry (identity redacted), coordinator connection and timing,
/// and the latest zone snapshots.
pub fn entry_diagnostics(entry: &ConfigEntry, coordinator: &ZoneCoordinator) -> Value {
    let data = serde_json::to_value(&entry.data).unwrap_or(Value::Null);
    let options = serde_json::to_value(entry.options).unwrap_or(Value::Null);

    let sources: Map<String, Value> = coordinator
        .sources()
        .into_iter()
        .map(|(id, name)| (id.to_string(), Value::String(name)))
        .collect();

    let zone_data: Map<String, Value> = coordinator
        .data()
        .into_iter()
        .map(|(zone, status)| (zone.to_string(), serde_json::to_value(status).unwrap_or(Value::Null)))
        .collect();

    json!({
        "config_entry": {
            "entry_id": entry.entry_id,
            "version": entry.version,
            "domain": entry.domain,
            "title": entry.title,
            "data": redact(&data, &REDACT_KEYS),
            "options": options,
        },
        "coordinator": {
            "series": coordinator.series().as_str(),
            "is_connected": coordinator.is_connected(),
            "zones": coordinator.zones(),
            "sources": sources,
            "last_update_success": coordinator.last_update_success(),
            "update_interval": coordinator.update_interval().as_secs_f64(),
            "seconds_since_last_update": coordinator.since_last_update().map(|d| d.as_secs_f64()),
        },
        "zone_data": zone_data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EntryData, EntryOptions};
    use crate::series::Series;
    use crate::test_support::{coordinator, MockAmp, MockFactory};

    fn entry() -> ConfigEntry {
        ConfigEntry::new(
            "Test Anthem",
            EntryData {
                port: "/dev/ttyUSB0".to_string(),
                series: Series::D2v,
                serial_number: "123456".to_string(),
            },
            EntryOptions::default(),
        )
    }

    #[tokio::test]
    async fn redacts_identity() {
        let coordinator = coordinator(MockFactory::new(MockAmp::new()));

        let diagnostics = entry_diagnostics(&entry(), &coordinator);

        assert_eq!(diagnostics["config_entry"]["data"]["port"], REDACTED);
        assert_eq!(diagnostics["config_entry"]["data"]["serial_number"], REDACTED);
        assert_eq!(diagnostics["config_entry"]["data"]["series"], "d2v");
        assert!(!diagnostics.to_string().contains("ttyUSB0"));
    }

    #[tokio::test]
    async fn includes_coordinator_state() {
        let coordinator = coordinator(MockFactory::new(MockAmp::new()));
        coordinator.refresh().await.unwrap();

        let diagnostics = entry_diagnostics(&entry(), &coordinator);

        assert_eq!(diagnostics["config_entry"]["title"], "Test Anthem");
        assert_eq!(diagnostics["config_entry"]["options"]["scan_interval"], 10);
        assert_eq!(diagnostics["coordinator"]["series"], "d2v");
        assert_eq!(diagnostics["coordinator"]["is_connected"], true);
        assert_eq!(diagnostics["coordinator"]["zones"], json!([1, 2, 3]));
        assert_eq!(diagnostics["coordinator"]["sources"]["1"], "CD");
        assert_eq!(diagnostics["coordinator"]["last_update_success"], true);
        assert_eq!(diagnostics["coordinator"]["update_interval"], 10.0);
        assert_eq!(diagnostics["zone_data"]["1"]["power"], true);
        assert_eq!(diagnostics["zone_data"]["1"]["volume"], 0.5);
    }

    #[test]
    fn redact_recurses() {
        let value = json!({"outer": {"port": "/dev/ttyS0", "keep": 1}, "list": [{"serial_number": "x"}]});

        let redacted = redact(&value, &REDACT_KEYS);

        assert_eq!(redacted["outer"]["port"], REDACTED);
        assert_eq!(redacted["outer"]["keep"], 1);
        assert_eq!(redacted["list"][0]["serial_number"], REDACTED);
    }
}
