use serde::Deserialize;

#[derive(Deserialize)]
pub struct Data {
    pub id: u64,
    #[serde(rename = "nome")]
    pub name: String,
}

#[derive(Deserialize)]
pub struct ListPlants {
    #[serde(rename = "usinas")]
    pub data: Vec<Data>,
}
