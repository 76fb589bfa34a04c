use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use sunweg_rs::coordinator::{Coordinator, PlantRef, SCAN_INTERVAL};
use sunweg_rs::metric::Value;
use sunweg_rs::model::{Inverter, Mppt, Phase, Plant, PlantId, PvString};
use sunweg_rs::{EntryConfig, Error, Integration, SetupError, SunWegApi, UpdateFailed};

struct MockApi {
    authenticated: bool,
    plants: Vec<Plant>,
    details: Vec<Inverter>,
    failure: Mutex<Option<Error>>,
    delay: Option<Duration>,
    list_calls: AtomicUsize,
    plant_calls: Arc<Mutex<Vec<u64>>>,
    complete_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockApi {
    fn new(plants: Vec<Plant>) -> Self {
        let details = plants
            .iter()
            .flat_map(|plant| plant.inverters.iter())
            .map(detailed)
            .collect();

        MockApi {
            authenticated: true,
            plants,
            details,
            failure: Mutex::new(None),
            delay: None,
            list_calls: AtomicUsize::new(0),
            plant_calls: Arc::new(Mutex::new(Vec::new())),
            complete_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Record `plant` calls into a log shared with other mocks.
    fn sharing_calls(mut self, calls: &Arc<Mutex<Vec<u64>>>) -> Self {
        self.plant_calls = Arc::clone(calls);
        self
    }

    fn fail_with(&self, error: Option<Error>) {
        *self.failure.lock().unwrap() = error;
    }

    fn check(&self) -> Result<(), Error> {
        match self.failure.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn plant_calls(&self) -> Vec<u64> {
        self.plant_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SunWegApi for MockApi {
    async fn authenticate(&self) -> Result<bool, Error> {
        Ok(self.authenticated)
    }

    async fn list_plants(&self) -> Result<Vec<Plant>, Error> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.plants.clone())
    }

    async fn plant(&self, id: u64) -> Result<Plant, Error> {
        self.plant_calls.lock().unwrap().push(id);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.check()?;
        self.plants
            .iter()
            .find(|plant| plant.id == id)
            .cloned()
            .ok_or_else(|| Error::ApiError(format!("unknown plant {}", id)))
    }

    async fn complete_inverter(&self, inverter: &mut Inverter) -> Result<(), Error> {
        self.complete_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        if let Some(detail) = self.details.iter().find(|d| d.id == inverter.id) {
            *inverter = detail.clone();
        }
        Ok(())
    }
}

fn detailed(summary: &Inverter) -> Inverter {
    let mut inverter = summary.clone();
    inverter.total_energy = 23.2;
    inverter.total_energy_metric = String::from("kWh");
    inverter.today_energy = 1.23;
    inverter.today_energy_metric = String::from("kWh");
    inverter.power = 1.5;
    inverter.power_metric = String::from("kW");
    inverter.frequency = 60.0;
    inverter.temperature = 41;
    inverter.phases = vec![Phase {
        name: String::from("PHASE_A"),
        voltage: 220.0,
        amperage: 4.5,
        ..Default::default()
    }];
    inverter.mppts = vec![Mppt {
        name: String::from("MPPT1"),
        strings: vec![PvString {
            name: String::from("STR1"),
            voltage: 410.0,
            amperage: 8.2,
            ..Default::default()
        }],
    }];
    inverter
}

fn plant() -> Plant {
    Plant {
        id: 123456,
        name: String::from("Plant #123"),
        total_power: 25.23,
        kwh_per_kwp: 2.38,
        saving: 12.34,
        today_energy: 1.23,
        today_energy_metric: String::from("kWh"),
        total_energy: 23.2,
        inverters: vec![Inverter::summary(21255, "INVERSOR01", "1234ABC")],
        ..Default::default()
    }
}

#[tokio::test]
async fn default_plant_is_adopted_then_fetched_directly() {
    let coordinator = Coordinator::new(MockApi::new(vec![plant()]), PlantId::Default, "name");

    let snapshot = coordinator.refresh().await.unwrap();
    assert_eq!(123456, snapshot.id);
    assert_eq!(
        PlantRef {
            id: PlantId::Id(123456),
            name: String::from("Plant #123"),
        },
        coordinator.plant()
    );
    assert_eq!(1, coordinator.api().list_calls.load(Ordering::SeqCst));
    assert!(coordinator.api().plant_calls().is_empty());

    coordinator.refresh().await.unwrap();
    coordinator.refresh().await.unwrap();
    assert_eq!(1, coordinator.api().list_calls.load(Ordering::SeqCst));
    assert_eq!(vec![123456, 123456], coordinator.api().plant_calls());
}

#[tokio::test]
async fn configured_plant_is_fetched_directly() {
    let coordinator = Coordinator::new(MockApi::new(vec![plant()]), PlantId::Id(123456), "name");

    let snapshot = coordinator.refresh().await.unwrap();
    assert_eq!(String::from("Plant #123"), snapshot.name);
    assert_eq!(String::from("name"), coordinator.plant().name);
    assert_eq!(0, coordinator.api().list_calls.load(Ordering::SeqCst));
    assert_eq!(vec![123456], coordinator.api().plant_calls());
}

#[tokio::test]
async fn every_inverter_is_completed() {
    let mut plant = plant();
    plant
        .inverters
        .push(Inverter::summary(21256, "INVERSOR02", "5678DEF"));
    let coordinator = Coordinator::new(MockApi::new(vec![plant]), PlantId::Id(123456), "name");

    let snapshot = coordinator.refresh().await.unwrap();
    assert_eq!(2, coordinator.api().complete_calls.load(Ordering::SeqCst));
    assert!(snapshot
        .inverters
        .iter()
        .all(|inverter| inverter.phases.len() == 1 && inverter.mppts.len() == 1));
    assert!(coordinator.last_update_success());
}

#[tokio::test]
async fn login_error_keeps_previous_snapshot() {
    let coordinator = Coordinator::new(MockApi::new(vec![plant()]), PlantId::Id(123456), "name");
    let first = coordinator.refresh().await.unwrap();

    coordinator
        .api()
        .fail_with(Some(Error::LoginError(String::from("Auth expired"))));
    let failed = coordinator.refresh().await.unwrap_err();
    assert!(failed.is_login());
    assert!(failed.to_string().starts_with("LoginError"));
    assert!(!coordinator.last_update_success());
    assert!(Arc::ptr_eq(&first, &coordinator.last_snapshot().unwrap()));

    /* The failure only lasts for one cycle */
    coordinator.api().fail_with(None);
    let second = coordinator.refresh().await.unwrap();
    assert!(coordinator.last_update_success());
    assert!(!Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn communication_error_keeps_previous_snapshot() {
    let coordinator = Coordinator::new(MockApi::new(vec![plant()]), PlantId::Id(123456), "name");
    let first = coordinator.refresh().await.unwrap();

    coordinator
        .api()
        .fail_with(Some(Error::ApiError(String::from("Error 500"))));
    let failed = coordinator.refresh().await.unwrap_err();
    assert_eq!("Error communicating with API: Error 500", failed.to_string());
    assert!(!coordinator.last_update_success());
    assert!(Arc::ptr_eq(&first, &coordinator.last_snapshot().unwrap()));
}

#[tokio::test]
async fn failure_without_snapshot() {
    let api = MockApi::new(vec![plant()]);
    api.fail_with(Some(Error::InvalidResponse(
        String::from("Doc"),
        String::from("Message"),
    )));
    let coordinator = Coordinator::new(api, PlantId::Id(123456), "name");

    assert!(coordinator.refresh().await.is_err());
    assert_eq!(None, coordinator.last_snapshot());
}

#[tokio::test]
async fn no_plants_for_default() {
    let coordinator = Coordinator::new(MockApi::new(Vec::new()), PlantId::Default, "name");

    assert!(coordinator.refresh().await.is_err());
    assert_eq!(PlantId::Default, coordinator.plant().id);
    assert_eq!(None, coordinator.last_snapshot());
}

#[tokio::test(start_paused = true)]
async fn slow_refresh_times_out() {
    let mut api = MockApi::new(vec![plant()]);
    api.delay = Some(Duration::from_secs(30));
    let coordinator = Coordinator::new(api, PlantId::Id(123456), "name");

    let failed = coordinator.refresh().await.unwrap_err();
    assert!(matches!(failed, UpdateFailed::Timeout(_)));
    assert_eq!(None, coordinator.last_snapshot());
    assert!(!coordinator.last_update_success());
}

#[tokio::test(start_paused = true)]
async fn refreshes_do_not_overlap() {
    let mut api = MockApi::new(vec![plant()]);
    api.delay = Some(Duration::from_secs(1));
    let coordinator = Coordinator::new(api, PlantId::Id(123456), "name");

    let (first, second) = tokio::join!(coordinator.refresh(), coordinator.refresh());
    assert!(first.is_ok() && second.is_ok());
    assert_eq!(2, coordinator.api().plant_calls().len());
    assert_eq!(1, coordinator.api().max_in_flight.load(Ordering::SeqCst));
}

fn entry_config(plant_id: PlantId) -> EntryConfig {
    EntryConfig {
        name: String::from("SunWEG"),
        plant_id,
    }
}

#[tokio::test]
async fn setup_with_wrong_password() {
    let integration = Integration::new();
    let mut api = MockApi::new(vec![plant()]);
    api.authenticated = false;

    let result = integration
        .setup_entry("entry", entry_config(PlantId::Default), api)
        .await;
    assert!(matches!(result, Err(SetupError::AuthenticationFailed(_))));
    assert!(integration.entry("entry").is_none());
}

#[tokio::test]
async fn setup_with_expired_auth_is_not_ready() {
    let integration = Integration::new();
    let api = MockApi::new(vec![plant()]);
    api.fail_with(Some(Error::LoginError(String::from("Auth expired"))));

    let result = integration
        .setup_entry("entry", entry_config(PlantId::Default), api)
        .await;
    assert!(matches!(result, Err(SetupError::NotReady(_))));
    assert!(integration.entry("entry").is_none());
}

#[tokio::test]
async fn setup_with_api_error_is_not_ready() {
    let integration = Integration::new();
    let api = MockApi::new(vec![plant()]);
    api.fail_with(Some(Error::ApiError(String::from("Error 500"))));

    let result = integration
        .setup_entry("entry", entry_config(PlantId::Default), api)
        .await;
    assert!(matches!(result, Err(SetupError::NotReady(_))));
}

#[tokio::test]
async fn setup_creates_sensors_and_unloads() {
    let integration = Integration::new();
    let entry = integration
        .setup_entry(
            "entry",
            entry_config(PlantId::Default),
            MockApi::new(vec![plant()]),
        )
        .await
        .unwrap();

    let states = entry.sensor_states();
    /* 6 totals, 6 inverter, 2 phase, 2 string */
    assert_eq!(16, states.len());
    assert!(states.iter().all(|state| state.available));

    let energy = states
        .iter()
        .find(|state| state.unique_id == "123456-total_energy_today")
        .unwrap();
    assert_eq!(Some(Value::Float(1.23)), energy.value);
    assert_eq!(Some(String::from("kWh")), energy.unit);

    let voltage = states
        .iter()
        .find(|state| state.unique_id == "1234ABC-PHASE_A-voltage")
        .unwrap();
    assert_eq!("INVERSOR01 PHASE_A Voltage", voltage.name);
    assert_eq!(Some(Value::Float(220.0)), voltage.value);
    assert!(states
        .iter()
        .all(|state| state.device.identifier == "123456" && state.device.name == "Plant #123"));

    assert!(matches!(
        integration
            .setup_entry("entry", entry_config(PlantId::Default), MockApi::new(vec![plant()]))
            .await,
        Err(SetupError::AlreadySetUp(_))
    ));

    assert!(integration.unload_entry("entry"));
    assert!(!integration.unload_entry("entry"));
    assert!(integration.entries().is_empty());
}

#[tokio::test]
async fn failed_refresh_marks_sensors_unavailable() {
    let integration = Integration::new();
    let entry = integration
        .setup_entry(
            "entry",
            entry_config(PlantId::Id(123456)),
            MockApi::new(vec![plant()]),
        )
        .await
        .unwrap();

    entry
        .coordinator
        .api()
        .fail_with(Some(Error::ApiError(String::from("Error 500"))));
    assert!(matches!(
        integration.request_refresh("entry").await,
        Some(Err(_))
    ));

    let states = entry.sensor_states();
    assert!(states.iter().all(|state| !state.available));
    let power = states
        .iter()
        .find(|state| state.unique_id == "123456-total_output_power")
        .unwrap();
    assert_eq!(Some(Value::Float(25.23)), power.value);

    assert!(integration.request_refresh("unknown").await.is_none());
    integration.unload_entry("entry");
}

#[tokio::test(start_paused = true)]
async fn concurrent_setups_of_one_entry() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut first = MockApi::new(vec![plant()]).sharing_calls(&calls);
    first.delay = Some(Duration::from_secs(1));
    let mut second = MockApi::new(vec![plant()]).sharing_calls(&calls);
    second.delay = Some(Duration::from_secs(1));

    let integration = Integration::new();
    let (a, b) = tokio::join!(
        integration.setup_entry("entry", entry_config(PlantId::Id(123456)), first),
        integration.setup_entry("entry", entry_config(PlantId::Id(123456)), second)
    );

    assert!(a.is_ok() != b.is_ok());
    assert!(matches!(
        a.err().or(b.err()),
        Some(SetupError::AlreadySetUp(_))
    ));
    assert_eq!(1, integration.entries().len());
    assert_eq!(2, calls.lock().unwrap().len());

    /* Nothing keeps polling once the surviving entry is gone */
    assert!(integration.unload_entry("entry"));
    tokio::time::sleep(SCAN_INTERVAL * 3).await;
    assert_eq!(2, calls.lock().unwrap().len());
}

#[tokio::test(start_paused = true)]
async fn scheduled_refreshes_survive_failures() {
    let integration = Integration::new();
    let entry = integration
        .setup_entry(
            "entry",
            entry_config(PlantId::Id(123456)),
            MockApi::new(vec![plant()]),
        )
        .await
        .unwrap();
    let api = entry.coordinator.api();
    assert_eq!(1, api.plant_calls().len());

    tokio::time::sleep(SCAN_INTERVAL - Duration::from_secs(1)).await;
    assert_eq!(1, api.plant_calls().len());

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(2, api.plant_calls().len());
    assert!(entry.coordinator.last_update_success());

    api.fail_with(Some(Error::ApiError(String::from("Error 500"))));
    tokio::time::sleep(SCAN_INTERVAL).await;
    assert_eq!(3, api.plant_calls().len());
    assert!(!entry.coordinator.last_update_success());
    assert!(entry.sensor_states().iter().all(|state| !state.available));

    api.fail_with(None);
    tokio::time::sleep(SCAN_INTERVAL).await;
    assert_eq!(4, api.plant_calls().len());
    assert!(entry.coordinator.last_update_success());

    integration.unload_entry("entry");
}
