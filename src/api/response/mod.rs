pub mod get_inverter;
pub mod get_plant;
pub mod list_plants;
pub mod login;

use serde::Deserialize;

/* Envelope shared by every response */
#[derive(Deserialize)]
pub struct ResponseStatus {
    pub success: bool,
    pub message: Option<String>,
}
