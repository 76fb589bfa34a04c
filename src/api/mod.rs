pub mod endpoint;
pub mod error;
pub mod response;

use crate::model;
use async_trait::async_trait;
pub use error::Error;
use reqwest::{RequestBuilder, Response};
use response::get_inverter::GetInverter;
use response::get_plant::GetPlant;
use response::list_plants::ListPlants;
use response::login::Login;
use response::ResponseStatus;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

const AUTH_TOKEN: &str = "X-Auth-Token-Update";

/// Operations of the Sun WEG cloud consumed by the coordinator.
#[async_trait]
pub trait SunWegApi: Send + Sync {
    /// Returns `false` when the credentials are rejected.
    async fn authenticate(&self) -> Result<bool, Error>;
    /// All plants of the account, fully populated.
    async fn list_plants(&self) -> Result<Vec<model::Plant>, Error>;
    async fn plant(&self, id: u64) -> Result<model::Plant, Error>;
    /// Fill phase, string and reading details into an inverter taken from a plant.
    async fn complete_inverter(&self, inverter: &mut model::Inverter) -> Result<(), Error>;
}

pub fn api(api_url: String, username: String, password: String) -> model::Api {
    model::Api {
        api_url,
        username,
        password,
    }
}

/// Map Non-200 API response to Error
fn map_api_err(error: reqwest::Error) -> Error {
    match error.status() {
        Some(http::StatusCode::TOO_MANY_REQUESTS) => Error::RateExceeded(error.to_string()),
        Some(http::StatusCode::UNAUTHORIZED) => Error::LoginError(error.to_string()),
        _ => Error::ApiError(error.to_string()),
    }
}

/// Process value of valid HTTP response (2xx) to identify API-level error indicated with
/// non-true `success`.
fn map_response_status(value: Value) -> Result<Value, Error> {
    match serde_json::from_value::<ResponseStatus>(value.clone()) {
        Ok(status) if status.success => Ok(value),
        Ok(status) => Err(Error::ApiError(
            status.message.unwrap_or_else(|| value.to_string()),
        )),
        Err(_) => Err(Error::UnexpectedApiResponse),
    }
}

pub struct Client {
    api: model::Api,
    client: reqwest::Client,
    token: RwLock<Option<String>>,
}

impl Client {
    pub fn new(api: model::Api) -> Result<Client, Error> {
        let client = reqwest::ClientBuilder::new()
            .cookie_store(true)
            .build()
            .or(Err(Error::InternalError))?;

        Ok(Client {
            api,
            client,
            token: RwLock::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api.api_url, path)
    }

    fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    async fn send(request: RequestBuilder) -> Result<Value, Error> {
        let text = request
            .send()
            .await
            .and_then(Response::error_for_status)
            .map_err(map_api_err)?
            .text()
            .await
            .map_err(|e| Error::ApiError(format!("Error reading API response: {}", e)))?;

        log::trace!("response_text: {}", text);

        serde_json::from_str::<Value>(&text)
            .map_err(|e| Error::InvalidResponse(text.to_owned(), e.to_string()))
    }

    /// Authenticated GET of `path`, logging in first when no session token is held.
    async fn get(&self, path: &str) -> Result<Value, Error> {
        let token = match self.token() {
            Some(token) => token,
            None => {
                if !self.authenticate().await? {
                    return Err(Error::LoginError(String::from(
                        "Username or password may be incorrect",
                    )));
                }
                self.token().ok_or(Error::InternalError)?
            }
        };

        let request = self.client.get(self.url(path)).header(AUTH_TOKEN, token);
        let result = Client::send(request).await.and_then(map_response_status);

        if let Err(Error::LoginError(e)) = &result {
            /* Session expired, log in again on the next request */
            log::debug!("Dropping session token after login error: {}", e);
            self.set_token(None);
        }
        result
    }
}

#[async_trait]
impl SunWegApi for Client {
    async fn authenticate(&self) -> Result<bool, Error> {
        let request_body = HashMap::from([
            ("usuario", json!(self.api.username)),
            ("senha", json!(self.api.password)),
            ("rememberMe", json!(true)),
        ]);

        let request = self.client.post(self.url(endpoint::LOGIN)).json(&request_body);

        let value = match Client::send(request).await {
            Ok(value) => value,
            Err(Error::LoginError(e)) => {
                log::debug!("Login rejected: {}", e);
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        let login =
            serde_json::from_value::<Login>(value).or(Err(Error::UnexpectedApiResponse))?;
        match login.token {
            Some(token) if login.success => {
                self.set_token(Some(token));
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_plants(&self) -> Result<Vec<model::Plant>, Error> {
        let response = self
            .get(endpoint::PLANTS)
            .await
            .map(serde_json::from_value::<ListPlants>)?
            .or(Err(Error::UnexpectedApiResponse))?;

        let mut plants = Vec::with_capacity(response.data.len());
        for summary in response.data {
            log::debug!("Found plant {} ({})", summary.id, summary.name);
            plants.push(self.plant(summary.id).await?);
        }
        Ok(plants)
    }

    async fn plant(&self, id: u64) -> Result<model::Plant, Error> {
        self.get(&format!("{}{}", endpoint::PLANT_DETAIL, id))
            .await
            .map(serde_json::from_value::<GetPlant>)?
            .or(Err(Error::UnexpectedApiResponse))
            .map(|response| response.data.into())
    }

    async fn complete_inverter(&self, inverter: &mut model::Inverter) -> Result<(), Error> {
        self.get(&format!("{}{}", endpoint::INVERTER_DETAIL, inverter.id))
            .await
            .map(serde_json::from_value::<GetInverter>)?
            .or(Err(Error::UnexpectedApiResponse))
            .map(|response| response.data.complete(inverter))
    }
}
