use crate::api::{Error, SunWegApi};
use crate::model::{Plant, PlantId};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::Mutex;

/// Period of scheduled refreshes.
pub const SCAN_INTERVAL: Duration = Duration::from_secs(5 * 60);
/// Upper bound of a single refresh.
pub const UPDATE_TIMEOUT: Duration = Duration::from_secs(10);

/// A refresh did not produce a new snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateFailed {
    /// The API rejected the session or the credentials.
    Login(String),
    Communication(String),
    Timeout(Duration),
}

impl UpdateFailed {
    pub fn is_login(&self) -> bool {
        matches!(self, UpdateFailed::Login(_))
    }
}

impl fmt::Display for UpdateFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateFailed::Login(e) => write!(f, "LoginError: {}", e),
            UpdateFailed::Communication(e) => write!(f, "Error communicating with API: {}", e),
            UpdateFailed::Timeout(after) => write!(
                f,
                "Timeout communicating with API after {}s",
                after.as_secs()
            ),
        }
    }
}

impl std::error::Error for UpdateFailed {}

impl From<Error> for UpdateFailed {
    fn from(err: Error) -> Self {
        match err {
            Error::LoginError(e) => UpdateFailed::Login(e),
            e => UpdateFailed::Communication(e.to_string()),
        }
    }
}

/// Error reported to HTTP clients of an on-demand refresh. Login failures keep their kind.
impl From<UpdateFailed> for Error {
    fn from(failed: UpdateFailed) -> Self {
        match failed {
            UpdateFailed::Login(e) => Error::LoginError(e),
            e => Error::ApiError(e.to_string()),
        }
    }
}

/// Plant the coordinator fetches, as known so far.
#[derive(Debug, Clone, PartialEq)]
pub struct PlantRef {
    pub id: PlantId,
    pub name: String,
}

/// Keeps the latest plant snapshot fetched from the API.
pub struct Coordinator<A> {
    api: A,
    plant: RwLock<PlantRef>,
    data: RwLock<Option<Arc<Plant>>>,
    last_update_success: AtomicBool,
    /// Held for the whole of a refresh so that refreshes never overlap
    refresh_lock: Mutex<()>,
}

impl<A: SunWegApi> Coordinator<A> {
    pub fn new(api: A, plant_id: PlantId, plant_name: &str) -> Self {
        Coordinator {
            api,
            plant: RwLock::new(PlantRef {
                id: plant_id,
                name: plant_name.to_owned(),
            }),
            data: RwLock::new(None),
            last_update_success: AtomicBool::new(false),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn plant(&self) -> PlantRef {
        self.plant
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Snapshot of the last successful refresh.
    pub fn last_snapshot(&self) -> Option<Arc<Plant>> {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_update_success(&self) -> bool {
        self.last_update_success.load(Ordering::SeqCst)
    }

    /// Fetch a full plant snapshot: the plant itself, then the details of each inverter.
    async fn fetch(&self, plant_id: PlantId) -> Result<Plant, Error> {
        let mut plant = match plant_id {
            PlantId::Default => self
                .api
                .list_plants()
                .await?
                .into_iter()
                .next()
                .ok_or(Error::NoPlants)?,
            PlantId::Id(id) => self.api.plant(id).await?,
        };

        for inverter in plant.inverters.iter_mut() {
            self.api.complete_inverter(inverter).await?;
        }
        Ok(plant)
    }

    /// Refresh the snapshot now.
    ///
    /// On failure the previous snapshot stays current and `last_update_success()` turns false
    /// until the next successful refresh.
    pub async fn refresh(&self) -> Result<Arc<Plant>, UpdateFailed> {
        let _guard = self.refresh_lock.lock().await;
        let plant_id = self.plant().id;

        let result = match tokio::time::timeout(UPDATE_TIMEOUT, self.fetch(plant_id)).await {
            Ok(result) => result.map_err(UpdateFailed::from),
            Err(_) => Err(UpdateFailed::Timeout(UPDATE_TIMEOUT)),
        };

        match result {
            Ok(plant) => {
                if plant_id == PlantId::Default {
                    log::info!("Using plant {} ({})", plant.id, plant.name);
                    *self.plant.write().unwrap_or_else(PoisonError::into_inner) = PlantRef {
                        id: PlantId::Id(plant.id),
                        name: plant.name.clone(),
                    };
                }

                let plant = Arc::new(plant);
                *self.data.write().unwrap_or_else(PoisonError::into_inner) = Some(plant.clone());
                self.last_update_success.store(true, Ordering::SeqCst);
                log::debug!("Fetched plant {} with {} inverters", plant.id, plant.inverters.len());
                Ok(plant)
            }
            Err(e) => {
                self.last_update_success.store(false, Ordering::SeqCst);
                log::error!("Error fetching SunWEG data: {}", e);
                Err(e)
            }
        }
    }
}
