//! Typed access to the readings of a snapshot.
//!
//! Every readable field is named by an enum variant per record kind, so sensor tables refer to
//! fields without any lookup by name at runtime.

use crate::model::{Inverter, Phase, Plant, PvString, Status};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

/// A single reading as published by a sensor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Float(f64),
    Int(i64),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl Value {
    /// Numeric representation used by the exporter. Text has none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            Value::Timestamp(ts) => Some(ts.and_utc().timestamp() as f64),
            Value::Text(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Float(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "{}", v),
            Value::Timestamp(v) => write!(f, "{}", v),
        }
    }
}

fn status(status: Status) -> Value {
    let text = match status {
        Status::Ok => "ok",
        Status::Error => "error",
        Status::Warn => "warn",
    };
    Value::Text(text.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlantField {
    TotalPower,
    KwhPerKwp,
    PerformanceRate,
    Saving,
    TodayEnergy,
    TodayEnergyMetric,
    TotalEnergy,
    TotalCarbonSaving,
    LastUpdate,
}

impl PlantField {
    pub fn read(self, plant: &Plant) -> Option<Value> {
        match self {
            PlantField::TotalPower => Some(Value::Float(plant.total_power)),
            PlantField::KwhPerKwp => Some(Value::Float(plant.kwh_per_kwp)),
            PlantField::PerformanceRate => Some(Value::Float(plant.performance_rate)),
            PlantField::Saving => Some(Value::Float(plant.saving)),
            PlantField::TodayEnergy => Some(Value::Float(plant.today_energy)),
            PlantField::TodayEnergyMetric => Some(Value::Text(plant.today_energy_metric.clone())),
            PlantField::TotalEnergy => Some(Value::Float(plant.total_energy)),
            PlantField::TotalCarbonSaving => Some(Value::Float(plant.total_carbon_saving)),
            PlantField::LastUpdate => plant.last_update.map(Value::Timestamp),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InverterField {
    TotalEnergy,
    TotalEnergyMetric,
    TodayEnergy,
    TodayEnergyMetric,
    PowerFactor,
    Frequency,
    Power,
    PowerMetric,
    Temperature,
    Status,
}

impl InverterField {
    pub fn read(self, inverter: &Inverter) -> Option<Value> {
        let value = match self {
            InverterField::TotalEnergy => Value::Float(inverter.total_energy),
            InverterField::TotalEnergyMetric => Value::Text(inverter.total_energy_metric.clone()),
            InverterField::TodayEnergy => Value::Float(inverter.today_energy),
            InverterField::TodayEnergyMetric => Value::Text(inverter.today_energy_metric.clone()),
            InverterField::PowerFactor => Value::Float(inverter.power_factor),
            InverterField::Frequency => Value::Float(inverter.frequency),
            InverterField::Power => Value::Float(inverter.power),
            InverterField::PowerMetric => Value::Text(inverter.power_metric.clone()),
            InverterField::Temperature => Value::Int(inverter.temperature),
            InverterField::Status => status(inverter.status),
        };
        Some(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseField {
    Voltage,
    Amperage,
    StatusVoltage,
    StatusAmperage,
}

impl PhaseField {
    pub fn read(self, phase: &Phase) -> Option<Value> {
        let value = match self {
            PhaseField::Voltage => Value::Float(phase.voltage),
            PhaseField::Amperage => Value::Float(phase.amperage),
            PhaseField::StatusVoltage => status(phase.status_voltage),
            PhaseField::StatusAmperage => status(phase.status_amperage),
        };
        Some(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringField {
    Voltage,
    Amperage,
    Status,
}

impl StringField {
    pub fn read(self, string: &PvString) -> Option<Value> {
        let value = match self {
            StringField::Voltage => Value::Float(string.voltage),
            StringField::Amperage => Value::Float(string.amperage),
            StringField::Status => status(string.status),
        };
        Some(value)
    }
}

/// Field of one of the snapshot's record kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKey {
    Plant(PlantField),
    Inverter(InverterField),
    Phase(PhaseField),
    String(StringField),
}
