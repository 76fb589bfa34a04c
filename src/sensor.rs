use crate::metric::Value;
use crate::model::Plant;
use crate::resolver::{resolve, DeviceLocator, DeviceType};
use crate::sensor_types::{
    SensorDescription, INVERTER_SENSOR_TYPES, PHASE_SENSOR_TYPES, STRING_SENSOR_TYPES,
    TOTAL_SENSOR_TYPES,
};
use serde::Serialize;

const DEFAULT_ICON: &str = "mdi:solar-power";
const MANUFACTURER: &str = "SunWEG";

/// Device every sensor of a plant is grouped under.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceInfo {
    /// Plant id
    pub identifier: String,
    pub manufacturer: &'static str,
    pub name: String,
}

impl DeviceInfo {
    pub fn plant(plant_id: u64, name: &str) -> Self {
        DeviceInfo {
            identifier: plant_id.to_string(),
            manufacturer: MANUFACTURER,
            name: name.to_owned(),
        }
    }
}

/// Value of a sensor together with its unit of measurement.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Reading {
    pub value: Option<Value>,
    pub unit: Option<String>,
}

impl Reading {
    pub fn new(value: Option<Value>, unit: Option<&str>) -> Self {
        Reading {
            value,
            unit: unit.map(String::from),
        }
    }
}

/// Keep `previous` instead of `current` when a never-resetting reading drops to zero.
///
/// Only floating point readings are considered: integer zeros always pass through.
pub fn never_resets_filter(never_resets: bool, previous: &Reading, current: Reading) -> Reading {
    let current_is_zero = matches!(current.value, Some(Value::Float(v)) if v == 0.0);
    let previous_is_float = matches!(previous.value, Some(Value::Float(_)));

    if never_resets && current_is_zero && previous_is_float {
        log::debug!(
            "Ignoring zero reading, keeping {:?} {:?}",
            previous.value,
            previous.unit
        );
        previous.clone()
    } else {
        current
    }
}

/// Published view of a sensor.
#[derive(Debug, Clone, Serialize)]
pub struct SensorState {
    pub unique_id: String,
    pub name: String,
    pub icon: &'static str,
    pub device_type: DeviceType,
    pub device_class: Option<&'static str>,
    pub value: Option<Value>,
    pub unit: Option<String>,
    pub available: bool,
    pub device: DeviceInfo,
}

/// One reading of one device, refreshed from every new snapshot.
#[derive(Debug)]
pub struct Sensor {
    pub name: String,
    pub unique_id: String,
    pub description: &'static SensorDescription,
    pub locator: DeviceLocator,
    pub device: DeviceInfo,
    reading: Reading,
}

impl Sensor {
    pub fn new(
        name: String,
        unique_id: String,
        description: &'static SensorDescription,
        locator: DeviceLocator,
        device: DeviceInfo,
    ) -> Self {
        Sensor {
            name: format!("{} {}", name, description.name),
            unique_id,
            description,
            locator,
            device,
            reading: Reading::new(None, description.native_unit),
        }
    }

    pub fn reading(&self) -> &Reading {
        &self.reading
    }

    pub fn icon(&self) -> &'static str {
        self.description.icon.unwrap_or(DEFAULT_ICON)
    }

    /// Resolve value and unit from `plant` and store them, subject to the never-resets rule.
    pub fn handle_update(&mut self, plant: &Plant) {
        let value = resolve(plant, self.description.api_variable_key, &self.locator);
        let unit = match self.description.api_variable_unit {
            Some(key) => resolve(plant, key, &self.locator).map(|unit| unit.to_string()),
            None => self.reading.unit.clone(),
        };

        self.reading = never_resets_filter(
            self.description.never_resets,
            &self.reading,
            Reading { value, unit },
        );
    }

    pub fn state(&self, available: bool) -> SensorState {
        SensorState {
            unique_id: self.unique_id.clone(),
            name: self.name.clone(),
            icon: self.icon(),
            device_type: self.locator.device_type,
            device_class: self.description.device_class,
            value: self.reading.value.clone(),
            unit: self.reading.unit.clone(),
            available,
            device: self.device.clone(),
        }
    }
}

/// Create the sensors of every device found in `plant`.
///
/// Plant totals are keyed by the plant id of `device`, device readings by inverter serial number.
pub fn build_sensors(entry_name: &str, device: &DeviceInfo, plant: &Plant) -> Vec<Sensor> {
    let plant_id = &device.identifier;
    let mut sensors: Vec<Sensor> = TOTAL_SENSOR_TYPES
        .iter()
        .map(|description| {
            Sensor::new(
                format!("{} Total", entry_name),
                format!("{}-{}", plant_id, description.key),
                description,
                DeviceLocator::total(),
                device.clone(),
            )
        })
        .collect();

    for inverter in &plant.inverters {
        sensors.extend(INVERTER_SENSOR_TYPES.iter().map(|description| {
            Sensor::new(
                inverter.name.clone(),
                format!("{}-{}", inverter.sn, description.key),
                description,
                DeviceLocator::inverter(inverter.id),
                device.clone(),
            )
        }));

        for phase in &inverter.phases {
            sensors.extend(PHASE_SENSOR_TYPES.iter().map(|description| {
                Sensor::new(
                    format!("{} {}", inverter.name, phase.name),
                    format!("{}-{}-{}", inverter.sn, phase.name, description.key),
                    description,
                    DeviceLocator::phase(inverter.id, &phase.name),
                    device.clone(),
                )
            }));
        }

        for string in inverter.mppts.iter().flat_map(|mppt| mppt.strings.iter()) {
            sensors.extend(STRING_SENSOR_TYPES.iter().map(|description| {
                Sensor::new(
                    format!("{} {}", inverter.name, string.name),
                    format!("{}-{}-{}", inverter.sn, string.name, description.key),
                    description,
                    DeviceLocator::string(inverter.id, &string.name),
                    device.clone(),
                )
            }));
        }
    }

    log::info!("Created {} sensors for plant {}", sensors.len(), plant_id);
    sensors
}
