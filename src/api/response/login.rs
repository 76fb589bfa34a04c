use serde::Deserialize;

#[derive(Deserialize)]
pub struct Login {
    pub success: bool,
    pub token: Option<String>,
}
