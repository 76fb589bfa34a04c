use crate::metric::{InverterField, MetricKey, PhaseField, PlantField, StringField};

/// Static description of a sensor exposed for every device of one type.
#[derive(Debug, PartialEq)]
pub struct SensorDescription {
    pub key: &'static str,
    pub name: &'static str,
    /// Field holding the reading
    pub api_variable_key: MetricKey,
    /// Field holding the unit of the reading, when the API reports one
    pub api_variable_unit: Option<MetricKey>,
    pub native_unit: Option<&'static str>,
    pub device_class: Option<&'static str>,
    pub icon: Option<&'static str>,
    /// Zero readings of a cumulative value are not trusted
    pub never_resets: bool,
}

pub static TOTAL_SENSOR_TYPES: &[SensorDescription] = &[
    SensorDescription {
        key: "total_money_total",
        name: "Money Total",
        api_variable_key: MetricKey::Plant(PlantField::Saving),
        api_variable_unit: None,
        native_unit: Some("R$"),
        device_class: None,
        icon: Some("mdi:cash"),
        never_resets: false,
    },
    SensorDescription {
        key: "total_energy_today",
        name: "Energy Today",
        api_variable_key: MetricKey::Plant(PlantField::TodayEnergy),
        api_variable_unit: Some(MetricKey::Plant(PlantField::TodayEnergyMetric)),
        native_unit: Some("kWh"),
        device_class: Some("energy"),
        icon: None,
        never_resets: true,
    },
    SensorDescription {
        key: "total_output_power",
        name: "Output Power",
        api_variable_key: MetricKey::Plant(PlantField::TotalPower),
        api_variable_unit: None,
        native_unit: Some("kW"),
        device_class: Some("power"),
        icon: None,
        never_resets: false,
    },
    SensorDescription {
        key: "total_energy_output",
        name: "Lifetime energy output",
        api_variable_key: MetricKey::Plant(PlantField::TotalEnergy),
        api_variable_unit: None,
        native_unit: Some("kWh"),
        device_class: Some("energy"),
        icon: None,
        never_resets: true,
    },
    SensorDescription {
        key: "kwh_per_kwp",
        name: "kWh por kWp",
        api_variable_key: MetricKey::Plant(PlantField::KwhPerKwp),
        api_variable_unit: None,
        native_unit: None,
        device_class: None,
        icon: None,
        never_resets: false,
    },
    SensorDescription {
        key: "last_update",
        name: "Last Update",
        api_variable_key: MetricKey::Plant(PlantField::LastUpdate),
        api_variable_unit: None,
        native_unit: None,
        device_class: Some("timestamp"),
        icon: None,
        never_resets: false,
    },
];

pub static INVERTER_SENSOR_TYPES: &[SensorDescription] = &[
    SensorDescription {
        key: "inverter_energy_today",
        name: "Energy today",
        api_variable_key: MetricKey::Inverter(InverterField::TodayEnergy),
        api_variable_unit: Some(MetricKey::Inverter(InverterField::TodayEnergyMetric)),
        native_unit: Some("kWh"),
        device_class: Some("energy"),
        icon: None,
        never_resets: true,
    },
    SensorDescription {
        key: "inverter_energy_total",
        name: "Lifetime energy output",
        api_variable_key: MetricKey::Inverter(InverterField::TotalEnergy),
        api_variable_unit: Some(MetricKey::Inverter(InverterField::TotalEnergyMetric)),
        native_unit: Some("kWh"),
        device_class: Some("energy"),
        icon: None,
        never_resets: true,
    },
    SensorDescription {
        key: "inverter_frequency",
        name: "AC frequency",
        api_variable_key: MetricKey::Inverter(InverterField::Frequency),
        api_variable_unit: None,
        native_unit: Some("Hz"),
        device_class: Some("frequency"),
        icon: None,
        never_resets: false,
    },
    SensorDescription {
        key: "inverter_current_wattage",
        name: "Output power",
        api_variable_key: MetricKey::Inverter(InverterField::Power),
        api_variable_unit: Some(MetricKey::Inverter(InverterField::PowerMetric)),
        native_unit: Some("kW"),
        device_class: Some("power"),
        icon: None,
        never_resets: false,
    },
    SensorDescription {
        key: "inverter_temperature",
        name: "Temperature",
        api_variable_key: MetricKey::Inverter(InverterField::Temperature),
        api_variable_unit: None,
        native_unit: Some("°C"),
        device_class: Some("temperature"),
        icon: Some("mdi:temperature-celsius"),
        never_resets: false,
    },
    SensorDescription {
        key: "inverter_power_factor",
        name: "Power Factor",
        api_variable_key: MetricKey::Inverter(InverterField::PowerFactor),
        api_variable_unit: None,
        native_unit: None,
        device_class: Some("power_factor"),
        icon: None,
        never_resets: false,
    },
];

pub static PHASE_SENSOR_TYPES: &[SensorDescription] = &[
    SensorDescription {
        key: "voltage",
        name: "Voltage",
        api_variable_key: MetricKey::Phase(PhaseField::Voltage),
        api_variable_unit: None,
        native_unit: Some("V"),
        device_class: Some("voltage"),
        icon: None,
        never_resets: false,
    },
    SensorDescription {
        key: "amperage",
        name: "Amperage",
        api_variable_key: MetricKey::Phase(PhaseField::Amperage),
        api_variable_unit: None,
        native_unit: Some("A"),
        device_class: Some("current"),
        icon: None,
        never_resets: false,
    },
];

pub static STRING_SENSOR_TYPES: &[SensorDescription] = &[
    SensorDescription {
        key: "voltage",
        name: "Voltage",
        api_variable_key: MetricKey::String(StringField::Voltage),
        api_variable_unit: None,
        native_unit: Some("V"),
        device_class: Some("voltage"),
        icon: None,
        never_resets: false,
    },
    SensorDescription {
        key: "amperage",
        name: "Amperage",
        api_variable_key: MetricKey::String(StringField::Amperage),
        api_variable_unit: None,
        native_unit: Some("A"),
        device_class: Some("current"),
        icon: None,
        never_resets: false,
    },
];
