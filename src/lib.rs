pub mod api;
pub mod coordinator;
pub mod integration;
pub mod metric;
pub mod model;
pub mod resolver;
pub mod sensor;
pub mod sensor_types;

pub use api::{Client, Error, SunWegApi};
pub use coordinator::{Coordinator, UpdateFailed};
pub use integration::{EntryConfig, Integration, SetupError};
