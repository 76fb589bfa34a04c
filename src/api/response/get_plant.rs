use crate::model;
use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer};

const LAST_UPDATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn last_update<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDateTime>, D::Error> {
    match Option::<String>::deserialize(d)? {
        Some(s) => NaiveDateTime::parse_from_str(&s, LAST_UPDATE_FORMAT)
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

#[derive(Deserialize)]
pub struct InverterSummary {
    pub id: u64,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "esn")]
    pub sn: String,
}

#[derive(Deserialize)]
pub struct Data {
    pub id: u64,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "potenciaAtual")]
    pub total_power: f64,
    #[serde(rename = "kwhPorKwp")]
    pub kwh_per_kwp: f64,
    #[serde(rename = "taxaPerformance")]
    pub performance_rate: f64,
    #[serde(rename = "economia")]
    pub saving: f64,
    #[serde(rename = "energiaHoje")]
    pub today_energy: f64,
    #[serde(rename = "energiaHojeUnidade")]
    pub today_energy_metric: String,
    #[serde(rename = "energiaTotal")]
    pub total_energy: f64,
    #[serde(rename = "reducaoCarbono")]
    pub total_carbon_saving: f64,
    #[serde(rename = "ultimaAtualizacao", default, deserialize_with = "last_update")]
    pub last_update: Option<NaiveDateTime>,
    #[serde(rename = "inversores", default)]
    pub inverters: Vec<InverterSummary>,
}

#[derive(Deserialize)]
pub struct GetPlant {
    #[serde(rename = "usina")]
    pub data: Data,
}

impl From<Data> for model::Plant {
    fn from(data: Data) -> Self {
        model::Plant {
            id: data.id,
            name: data.name,
            total_power: data.total_power,
            kwh_per_kwp: data.kwh_per_kwp,
            performance_rate: data.performance_rate,
            saving: data.saving,
            today_energy: data.today_energy,
            today_energy_metric: data.today_energy_metric,
            total_energy: data.total_energy,
            total_carbon_saving: data.total_carbon_saving,
            last_update: data.last_update,
            inverters: data
                .inverters
                .iter()
                .map(|inv| model::Inverter::summary(inv.id, &inv.name, &inv.sn))
                .collect(),
        }
    }
}
