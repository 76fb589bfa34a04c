use crate::metric::{MetricKey, Value};
use crate::model::Plant;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Total,
    Inverter,
    Phase,
    String,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Total => "total",
            DeviceType::Inverter => "inverter",
            DeviceType::Phase => "phase",
            DeviceType::String => "string",
        }
    }
}

/// Path from a snapshot to the record holding a reading.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceLocator {
    pub device_type: DeviceType,
    /// `0` for plant totals
    pub inverter_id: u64,
    /// Phase or string name
    pub sub_device: Option<String>,
}

impl DeviceLocator {
    pub fn total() -> Self {
        DeviceLocator {
            device_type: DeviceType::Total,
            inverter_id: 0,
            sub_device: None,
        }
    }

    pub fn inverter(inverter_id: u64) -> Self {
        DeviceLocator {
            device_type: DeviceType::Inverter,
            inverter_id,
            sub_device: None,
        }
    }

    pub fn phase(inverter_id: u64, name: &str) -> Self {
        DeviceLocator {
            device_type: DeviceType::Phase,
            inverter_id,
            sub_device: Some(name.to_owned()),
        }
    }

    pub fn string(inverter_id: u64, name: &str) -> Self {
        DeviceLocator {
            device_type: DeviceType::String,
            inverter_id,
            sub_device: Some(name.to_owned()),
        }
    }

    fn matches(&self, name: &str) -> bool {
        self.sub_device.as_deref() == Some(name)
    }
}

/// Retrieve from a plant snapshot the value of `key` on the device selected by `locator`.
///
/// Returns `None` when the locator selects nothing in `plant`, or when `key` belongs to a
/// different kind of record than the locator points at. The first matching inverter, phase or
/// string wins.
pub fn resolve(plant: &Plant, key: MetricKey, locator: &DeviceLocator) -> Option<Value> {
    if locator.device_type == DeviceType::Total {
        return match key {
            MetricKey::Plant(field) => field.read(plant),
            _ => None,
        };
    }

    let inverter = plant
        .inverters
        .iter()
        .find(|inverter| inverter.id == locator.inverter_id)?;

    match (locator.device_type, key) {
        (DeviceType::Inverter, MetricKey::Inverter(field)) => field.read(inverter),
        (DeviceType::Phase, MetricKey::Phase(field)) => inverter
            .phases
            .iter()
            .find(|phase| locator.matches(&phase.name))
            .and_then(|phase| field.read(phase)),
        (DeviceType::String, MetricKey::String(field)) => inverter
            .mppts
            .iter()
            .flat_map(|mppt| mppt.strings.iter())
            .find(|string| locator.matches(&string.name))
            .and_then(|string| field.read(string)),
        (device_type, key) => {
            log::warn!("{:?} cannot be read from a {:?} device", key, device_type);
            None
        }
    }
}
