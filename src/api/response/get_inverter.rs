use crate::model;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct PhaseData {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "tensao")]
    pub voltage: f64,
    #[serde(rename = "corrente")]
    pub amperage: f64,
    #[serde(rename = "statusTensao", default)]
    pub status_voltage: u64,
    #[serde(rename = "statusCorrente", default)]
    pub status_amperage: u64,
}

#[derive(Deserialize)]
pub struct StringData {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "tensao")]
    pub voltage: f64,
    #[serde(rename = "corrente")]
    pub amperage: f64,
    #[serde(default)]
    pub status: u64,
}

#[derive(Deserialize)]
pub struct MpptData {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(default)]
    pub strings: Vec<StringData>,
}

#[derive(Deserialize)]
pub struct Data {
    pub id: u64,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "esn")]
    pub sn: String,
    #[serde(rename = "energiaTotal")]
    pub total_energy: f64,
    #[serde(rename = "energiaTotalUnidade")]
    pub total_energy_metric: String,
    #[serde(rename = "energiaHoje")]
    pub today_energy: f64,
    #[serde(rename = "energiaHojeUnidade")]
    pub today_energy_metric: String,
    #[serde(rename = "fatorPotencia")]
    pub power_factor: f64,
    #[serde(rename = "frequencia")]
    pub frequency: f64,
    #[serde(rename = "potencia")]
    pub power: f64,
    #[serde(rename = "potenciaUnidade")]
    pub power_metric: String,
    #[serde(rename = "temperatura")]
    pub temperature: i64,
    #[serde(default)]
    pub status: u64,
    #[serde(rename = "fases", default)]
    pub phases: Vec<PhaseData>,
    #[serde(default)]
    pub mppts: Vec<MpptData>,
}

#[derive(Deserialize)]
pub struct GetInverter {
    #[serde(rename = "inversor")]
    pub data: Data,
}

impl Data {
    /// Copy detailed readings into an inverter obtained from a plant listing.
    pub fn complete(self, inverter: &mut model::Inverter) {
        inverter.name = self.name;
        inverter.sn = self.sn;
        inverter.total_energy = self.total_energy;
        inverter.total_energy_metric = self.total_energy_metric;
        inverter.today_energy = self.today_energy;
        inverter.today_energy_metric = self.today_energy_metric;
        inverter.power_factor = self.power_factor;
        inverter.frequency = self.frequency;
        inverter.power = self.power;
        inverter.power_metric = self.power_metric;
        inverter.temperature = self.temperature;
        inverter.status = model::Status::from_code(self.status);
        inverter.phases = self
            .phases
            .into_iter()
            .map(|phase| model::Phase {
                name: phase.name,
                voltage: phase.voltage,
                amperage: phase.amperage,
                status_voltage: model::Status::from_code(phase.status_voltage),
                status_amperage: model::Status::from_code(phase.status_amperage),
            })
            .collect();
        inverter.mppts = self
            .mppts
            .into_iter()
            .map(|mppt| model::Mppt {
                name: mppt.name,
                strings: mppt
                    .strings
                    .into_iter()
                    .map(|string| model::PvString {
                        name: string.name,
                        voltage: string.voltage,
                        amperage: string.amperage,
                        status: model::Status::from_code(string.status),
                    })
                    .collect(),
            })
            .collect();
    }
}
