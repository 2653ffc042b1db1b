use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use shared::{
    domain::ReservationId,
    protocol::{
        DataEnvelope, DeleteConfirmation, Reservation, ReservationDraft, ReservationUpdate,
        ServiceErrorBody,
    },
};
use tracing::{debug, warn};
use url::Url;

use crate::error::{GatewayError, GatewayResult};

const LIST_FAILED: &str = "failed to fetch reservations";
const LIST_BY_DATE_FAILED: &str = "failed to fetch reservations for date";
const CREATE_FAILED: &str = "failed to create reservation";
const UPDATE_FAILED: &str = "failed to update reservation";
const DELETE_FAILED: &str = "failed to delete reservation";

const RESERVATIONS_PATH: &str = "reservas";
const BY_DATE_PATH: &str = "date";

/// Remote reservation service. Implementations never retry and never touch
/// controller state.
#[async_trait]
pub trait ReservationGateway: Send + Sync {
    async fn list_all(&self) -> GatewayResult<Vec<Reservation>>;
    async fn list_by_date(&self, date: NaiveDate) -> GatewayResult<Vec<Reservation>>;
    async fn create(&self, draft: &ReservationDraft) -> GatewayResult<Reservation>;
    async fn update(
        &self,
        id: &ReservationId,
        changes: &ReservationUpdate,
    ) -> GatewayResult<Reservation>;
    async fn remove(&self, id: &ReservationId) -> GatewayResult<DeleteConfirmation>;
}

#[derive(Debug, Clone)]
pub struct GatewayOptions {
    pub base_url: String,
    /// `None` lets a request wait indefinitely.
    pub request_timeout: Option<Duration>,
}

impl GatewayOptions {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout: None,
        }
    }
}

/// JSON-over-HTTP gateway for the `/reservas` resource.
pub struct HttpReservationGateway {
    http: Client,
    base_url: Url,
}

impl HttpReservationGateway {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::from_options(&GatewayOptions::new(base_url))
    }

    pub fn from_options(options: &GatewayOptions) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("failed to build http client")?;
        Self::with_client(http, &options.base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url.trim())
            .with_context(|| format!("invalid reservation service url: {base_url}"))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(anyhow!(
                "reservation service url must start with http:// or https://"
            ));
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn execute(&self, request: RequestBuilder, fallback: &str) -> GatewayResult<String> {
        let response = request.send().await.map_err(|err| {
            warn!("reservations: request failed: {err}");
            GatewayError::Transport(fallback.to_string())
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|err| {
            warn!(%status, "reservations: failed to read response body: {err}");
            GatewayError::Transport(fallback.to_string())
        })?;

        if status.is_success() {
            return Ok(body);
        }

        let reason = serde_json::from_str::<ServiceErrorBody>(&body)
            .ok()
            .and_then(|parsed| parsed.reason().map(str::to_string));
        match reason {
            Some(reason) => {
                warn!(%status, "reservations: service rejected request: {reason}");
                Err(GatewayError::Service(reason))
            }
            None => {
                warn!(%status, "reservations: request failed without a service reason");
                Err(GatewayError::Transport(fallback.to_string()))
            }
        }
    }

    async fn fetch_data<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        fallback: &str,
    ) -> GatewayResult<T> {
        let body = self.execute(request, fallback).await?;
        decode::<DataEnvelope<T>>(&body, fallback).map(|envelope| envelope.data)
    }
}

fn decode<T: DeserializeOwned>(body: &str, fallback: &str) -> GatewayResult<T> {
    serde_json::from_str(body).map_err(|err| {
        warn!("reservations: malformed response body: {err}");
        GatewayError::Transport(fallback.to_string())
    })
}

#[async_trait]
impl ReservationGateway for HttpReservationGateway {
    async fn list_all(&self) -> GatewayResult<Vec<Reservation>> {
        let url = self.endpoint(&[RESERVATIONS_PATH]);
        debug!(%url, "reservations: GET");
        self.fetch_data(self.http.get(url), LIST_FAILED).await
    }

    async fn list_by_date(&self, date: NaiveDate) -> GatewayResult<Vec<Reservation>> {
        let day = date.format("%Y-%m-%d").to_string();
        let url = self.endpoint(&[RESERVATIONS_PATH, BY_DATE_PATH, &day]);
        debug!(%url, "reservations: GET");
        self.fetch_data(self.http.get(url), LIST_BY_DATE_FAILED)
            .await
    }

    async fn create(&self, draft: &ReservationDraft) -> GatewayResult<Reservation> {
        let url = self.endpoint(&[RESERVATIONS_PATH]);
        debug!(%url, party_size = draft.party_size, "reservations: POST");
        self.fetch_data(self.http.post(url).json(draft), CREATE_FAILED)
            .await
    }

    async fn update(
        &self,
        id: &ReservationId,
        changes: &ReservationUpdate,
    ) -> GatewayResult<Reservation> {
        let url = self.endpoint(&[RESERVATIONS_PATH, id.as_str()]);
        debug!(%url, "reservations: PUT");
        self.fetch_data(self.http.put(url).json(changes), UPDATE_FAILED)
            .await
    }

    async fn remove(&self, id: &ReservationId) -> GatewayResult<DeleteConfirmation> {
        let url = self.endpoint(&[RESERVATIONS_PATH, id.as_str()]);
        debug!(%url, "reservations: DELETE");
        let body = self.execute(self.http.delete(url), DELETE_FAILED).await?;
        if body.trim().is_empty() {
            return Ok(DeleteConfirmation::default());
        }
        decode(&body, DELETE_FAILED)
    }
}

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod tests;
