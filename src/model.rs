use chrono::NaiveDateTime;
use num_derive::FromPrimitive;
use serde::de::Unexpected;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Plant selector as configured by the user.
///
/// `Default` is resolved to the first plant of the account on the first successful refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlantId {
    Default,
    Id(u64),
}

impl fmt::Display for PlantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlantId::Default => write!(f, "default"),
            PlantId::Id(id) => write!(f, "{}", id),
        }
    }
}

impl FromStr for PlantId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "default" | "0" => Ok(PlantId::Default),
            other => other
                .parse::<u64>()
                .map(PlantId::Id)
                .map_err(|e| format!("invalid plant id {:?}: {}", other, e)),
        }
    }
}

impl<'de> Deserialize<'de> for PlantId {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(d)?;

        /* Environment variables always arrive as strings, config files may carry numbers */
        match value {
            Value::Number(n) => match n.as_u64() {
                Some(0) => Ok(PlantId::Default),
                Some(id) => Ok(PlantId::Id(id)),
                None => Err(serde::de::Error::custom(format!("invalid plant id {}", n))),
            },
            Value::String(s) => s.parse().map_err(serde::de::Error::custom),
            Value::Bool(b) => Err(invalid_plant_id(Unexpected::Bool(b))),
            Value::Null => Err(invalid_plant_id(Unexpected::Other("null"))),
            Value::Array(_) => Err(invalid_plant_id(Unexpected::Seq)),
            Value::Object(_) => Err(invalid_plant_id(Unexpected::Map)),
        }
    }
}

fn invalid_plant_id<E: serde::de::Error>(unexpected: Unexpected) -> E {
    E::invalid_type(unexpected, &"a plant id or \"default\"")
}

#[derive(Debug, Clone)]
pub struct Api {
    pub api_url: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromPrimitive)]
pub enum Status {
    #[default]
    Ok = 0,
    Error = 1,
    Warn = 2,
}

impl Status {
    pub fn from_code(code: u64) -> Self {
        match num::FromPrimitive::from_u64(code) {
            Some(status) => status,
            None => {
                log::debug!("Unknown status code {}, treating as error", code);
                Status::Error
            }
        }
    }
}

/// Snapshot of a plant as returned by one refresh cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plant {
    pub id: u64,
    pub name: String,
    /// Current output power (kW)
    pub total_power: f64,
    pub kwh_per_kwp: f64,
    pub performance_rate: f64,
    /// Money saved, in R$
    pub saving: f64,
    pub today_energy: f64,
    pub today_energy_metric: String,
    pub total_energy: f64,
    pub total_carbon_saving: f64,
    pub last_update: Option<NaiveDateTime>,
    pub inverters: Vec<Inverter>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inverter {
    pub id: u64,
    pub name: String,
    pub sn: String,
    pub total_energy: f64,
    pub total_energy_metric: String,
    pub today_energy: f64,
    pub today_energy_metric: String,
    pub power_factor: f64,
    pub frequency: f64,
    pub power: f64,
    pub power_metric: String,
    pub temperature: i64,
    pub status: Status,
    pub phases: Vec<Phase>,
    pub mppts: Vec<Mppt>,
}

impl Inverter {
    /// Inverter as listed by a plant request, before `complete_inverter` fills in readings.
    pub fn summary(id: u64, name: &str, sn: &str) -> Self {
        Inverter {
            id,
            name: name.to_owned(),
            sn: sn.to_owned(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Phase {
    pub name: String,
    pub voltage: f64,
    pub amperage: f64,
    pub status_voltage: Status,
    pub status_amperage: Status,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mppt {
    pub name: String,
    pub strings: Vec<PvString>,
}

/// DC input string of an MPPT group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PvString {
    pub name: String,
    pub voltage: f64,
    pub amperage: f64,
    pub status: Status,
}

#[cfg(test)]
mod test {
    use super::{PlantId, Status};

    #[test]
    fn plant_id_from_str() {
        assert_eq!(PlantId::Default, "default".parse().unwrap());
        assert_eq!(PlantId::Default, "0".parse().unwrap());
        assert_eq!(PlantId::Id(123456), " 123456 ".parse().unwrap());
        assert!("plant".parse::<PlantId>().is_err());
    }

    #[test]
    fn plant_id_deserialize() {
        let id: PlantId = serde_json::from_str("\"default\"").unwrap();
        assert_eq!(PlantId::Default, id);
        let id: PlantId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(PlantId::Id(42), id);
        let id: PlantId = serde_json::from_str("42").unwrap();
        assert_eq!(PlantId::Id(42), id);

        let err = serde_json::from_str::<PlantId>("true").unwrap_err();
        assert!(err.to_string().starts_with("invalid type: boolean `true`"));
        let err = serde_json::from_str::<PlantId>("null").unwrap_err();
        assert!(err.to_string().starts_with("invalid type: null"));
    }

    #[test]
    fn status_from_code() {
        assert_eq!(Status::Ok, Status::from_code(0));
        assert_eq!(Status::Warn, Status::from_code(2));
        assert_eq!(Status::Error, Status::from_code(99));
    }
}
