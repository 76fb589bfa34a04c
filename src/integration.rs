use crate::api::SunWegApi;
use crate::coordinator::{Coordinator, UpdateFailed, SCAN_INTERVAL};
use crate::model::{Plant, PlantId};
use crate::sensor::{build_sensors, DeviceInfo, Sensor, SensorState};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// User supplied settings of one config entry.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct EntryConfig {
    pub name: String,
    pub plant_id: PlantId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SetupError {
    /// Credentials rejected before the first refresh.
    AuthenticationFailed(String),
    /// The first refresh failed, setup can be retried later.
    NotReady(UpdateFailed),
    AlreadySetUp(String),
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupError::AuthenticationFailed(s) => write!(f, "authentication failed: {}", s),
            SetupError::NotReady(e) => write!(f, "not ready: {}", e),
            SetupError::AlreadySetUp(id) => write!(f, "entry {} is already set up", id),
        }
    }
}

impl std::error::Error for SetupError {}

/// A set up config entry: its coordinator, the sensors created for it and the task refreshing
/// them.
pub struct Entry<A> {
    pub name: String,
    pub coordinator: Coordinator<A>,
    sensors: Mutex<Vec<Sensor>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<A: SunWegApi + 'static> Entry<A> {
    fn update_sensors(&self, plant: &Plant) {
        let mut sensors = self.sensors.lock().unwrap_or_else(PoisonError::into_inner);
        for sensor in sensors.iter_mut() {
            sensor.handle_update(plant);
        }
    }

    /// Refresh the coordinator and, on success, every sensor.
    pub async fn refresh(&self) -> Result<(), UpdateFailed> {
        let plant = self.coordinator.refresh().await?;
        self.update_sensors(&plant);
        Ok(())
    }

    pub fn sensor_states(&self) -> Vec<SensorState> {
        let available = self.coordinator.last_update_success();
        self.sensors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|sensor| sensor.state(available))
            .collect()
    }

    fn spawn_updates(self: &Arc<Self>) {
        let entry = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + SCAN_INTERVAL, SCAN_INTERVAL);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if let Err(e) = entry.refresh().await {
                    log::warn!("Scheduled refresh of {} failed: {}", entry.name, e);
                }
            }
        });
        *self.task.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
    }

    fn stop_updates(&self) {
        if let Some(handle) = self.task.lock().unwrap_or_else(PoisonError::into_inner).take() {
            handle.abort();
        }
    }
}

/// Active config entries, keyed by entry id.
pub struct Integration<A> {
    entries: RwLock<HashMap<String, Arc<Entry<A>>>>,
}

impl<A> Default for Integration<A> {
    fn default() -> Self {
        Integration {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<A: SunWegApi + 'static> Integration<A> {
    pub fn new() -> Self {
        Integration::default()
    }

    /// Authenticate, fetch the first snapshot, create the sensors and start periodic refreshes.
    pub async fn setup_entry(
        &self,
        entry_id: &str,
        config: EntryConfig,
        api: A,
    ) -> Result<Arc<Entry<A>>, SetupError> {
        if self.entry(entry_id).is_some() {
            return Err(SetupError::AlreadySetUp(entry_id.to_owned()));
        }

        match api.authenticate().await {
            Ok(true) => {}
            Ok(false) => {
                log::error!("Username or Password may be incorrect!");
                return Err(SetupError::AuthenticationFailed(String::from(
                    "invalid credentials",
                )));
            }
            Err(e) => return Err(SetupError::AuthenticationFailed(e.to_string())),
        }

        let coordinator = Coordinator::new(api, config.plant_id, &config.name);
        let plant = coordinator.refresh().await.map_err(SetupError::NotReady)?;

        let plant_id = plant.id;
        let device = DeviceInfo::plant(plant_id, &coordinator.plant().name);
        let mut sensors = build_sensors(&config.name, &device, &plant);
        for sensor in sensors.iter_mut() {
            sensor.handle_update(&plant);
        }

        let entry = Arc::new(Entry {
            name: config.name,
            coordinator,
            sensors: Mutex::new(sensors),
            task: Mutex::new(None),
        });

        {
            /* Another setup of the same id may have finished while this one was fetching */
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            if entries.contains_key(entry_id) {
                return Err(SetupError::AlreadySetUp(entry_id.to_owned()));
            }
            entries.insert(entry_id.to_owned(), Arc::clone(&entry));
            entry.spawn_updates();
        }
        log::info!("Set up entry {} for plant {}", entry_id, plant_id);
        Ok(entry)
    }

    /// Stop refreshing and forget the entry. Returns `false` if it was not set up.
    pub fn unload_entry(&self, entry_id: &str) -> bool {
        let removed = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(entry_id);

        match removed {
            Some(entry) => {
                entry.stop_updates();
                log::info!("Unloaded entry {}", entry_id);
                true
            }
            None => false,
        }
    }

    pub fn entry(&self, entry_id: &str) -> Option<Arc<Entry<A>>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(entry_id)
            .cloned()
    }

    pub fn entries(&self) -> Vec<(String, Arc<Entry<A>>)> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, entry)| (id.clone(), Arc::clone(entry)))
            .collect()
    }

    /// Refresh an entry outside of its schedule. `None` if the entry is unknown.
    pub async fn request_refresh(&self, entry_id: &str) -> Option<Result<(), UpdateFailed>> {
        let entry = self.entry(entry_id)?;
        Some(entry.refresh().await)
    }
}
