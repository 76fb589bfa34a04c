#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate prometheus;
#[macro_use]
extern crate rocket;

use config::Config;
use rocket::http::ContentType;
use rocket::State;
use std::sync::Arc;
use std::time::Duration;
use sunweg_rs::api;
use sunweg_rs::integration::{EntryConfig, Integration};
use sunweg_rs::model::PlantId;
use sunweg_rs::sensor::SensorState;
use sunweg_rs::{Client, SetupError};

mod metrics;

const API_URL: &str = "https://api.sun.weg.net/api/";
const DEFAULT_NAME: &str = "SunWEG";
/// Delay before retrying a setup whose first refresh failed
const SETUP_RETRY_DELAY: Duration = Duration::from_secs(60);

#[derive(Clone, serde::Deserialize)]
pub struct SunWegConfig {
    api_url: String,
    username: String,
    password: String,
    name: String,
    plant_id: PlantId,
}

type SunWeg = Arc<Integration<Client>>;

/// Id of the entry set up from the configuration.
struct EntryId(String);

pub fn read_settings() -> Result<SunWegConfig, config::ConfigError> {
    let mut settings = Config::default();
    settings
        .set_default("api_url", API_URL)?
        .set_default("name", DEFAULT_NAME)?
        .set_default("plant_id", "default")?
        .merge(config::File::with_name("sunweg").required(false))?
        .merge(config::Environment::with_prefix("SUNWEG"))?;

    settings.try_into()
}

/// Set up the configured entry, retrying while the API cannot be reached. Rejected
/// credentials end the retries.
async fn setup(
    integration: &SunWeg,
    entry_id: &str,
    settings: &SunWegConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        let api = api::api(
            settings.api_url.to_owned(),
            settings.username.to_owned(),
            settings.password.to_owned(),
        );
        let client = Client::new(api)?;
        let config = EntryConfig {
            name: settings.name.to_owned(),
            plant_id: settings.plant_id,
        };

        match integration.setup_entry(entry_id, config, client).await {
            Ok(_) => return Ok(()),
            Err(SetupError::NotReady(e)) => {
                log::warn!("{}, retrying in {}s", e, SETUP_RETRY_DELAY.as_secs());
                tokio::time::sleep(SETUP_RETRY_DELAY).await;
            }
            Err(e) => return Err(Box::new(e)),
        }
    }
}

#[get("/metrics")]
fn metrics_route(state: &State<SunWeg>) -> Result<String, api::Error> {
    let integration: &Integration<Client> = state.inner();
    metrics::collect(integration);
    metrics::read()
}

#[get("/sensors")]
fn sensors_route(state: &State<SunWeg>) -> Result<(ContentType, String), api::Error> {
    let states: Vec<SensorState> = state
        .entries()
        .into_iter()
        .flat_map(|(_, entry)| entry.sensor_states())
        .collect();

    serde_json::to_string(&states)
        .map(|json| (ContentType::JSON, json))
        .or(Err(api::Error::FormatError))
}

#[get("/plant")]
fn plant_route(state: &State<SunWeg>, entry_id: &State<EntryId>) -> Option<String> {
    let entry = state.entry(&entry_id.0)?;
    entry
        .coordinator
        .last_snapshot()
        .map(|plant| format!("{:#?}", plant))
}

#[post("/refresh")]
async fn refresh_route(
    state: &State<SunWeg>,
    entry_id: &State<EntryId>,
) -> Result<String, api::Error> {
    match state.request_refresh(&entry_id.0).await {
        Some(Ok(())) => Ok(String::from("refreshed")),
        Some(Err(e)) => Err(api::Error::from(e)),
        None => Err(api::Error::InternalError),
    }
}

#[rocket::main]
async fn main() {
    env_logger::init();

    let settings = match read_settings() {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let entry_id = settings.username.to_owned();
    let integration: SunWeg = Arc::new(Integration::new());

    if let Err(e) = setup(&integration, &entry_id, &settings).await {
        log::error!("Unable to set up {}: {}", settings.name, e);
        std::process::exit(1);
    }

    let result = rocket::build()
        .manage(Arc::clone(&integration))
        .manage(EntryId(entry_id.to_owned()))
        .mount(
            "/",
            routes![metrics_route, sensors_route, plant_route, refresh_route],
        )
        .launch()
        .await;

    integration.unload_entry(&entry_id);

    if let Err(e) = result {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
