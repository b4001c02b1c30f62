//! Blocking REST client for the collaborator inventory API.

use crate::model::item::Item;
use crate::model::location::{Area, Container, RecordId};
use crate::source::{RecordSource, SourceError, SourceResult};
use crate::wire::{self, DecodedList};
use log::{error, info};
use reqwest::blocking::{Client, Response};
use std::time::{Duration, Instant};

/// Default per-request timeout.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

const AREAS_PATH: &str = "areas";
const STORAGE_UNITS_PATH: &str = "storage_units";
const ITEMS_PATH: &str = "items";
const DELETE_MULTIPLE_PATH: &str = "storage_units/delete-multiple";

/// Record source backed by the `{success, data}` REST endpoints.
pub struct RestRecordSource {
    client: Client,
    base_url: String,
}

impl RestRecordSource {
    /// Builds a client for `base_url` (e.g. `http://localhost:3000/api`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> SourceResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("stowtree/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn get_body(&self, path: &str) -> SourceResult<String> {
        let url = self.endpoint(path);
        self.timed("GET", path, || self.client.get(&url).send())
    }

    fn timed<F>(&self, method: &str, path: &str, send: F) -> SourceResult<String>
    where
        F: FnOnce() -> reqwest::Result<Response>,
    {
        let started_at = Instant::now();
        let result = send()
            .map_err(SourceError::from)
            .and_then(|response| read_success_body(path, response));
        match &result {
            Ok(body) => info!(
                "event=http_fetch module=source status=ok method={} path={} bytes={} duration_ms={}",
                method,
                path,
                body.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=http_fetch module=source status=error method={} path={} duration_ms={} error={}",
                method,
                path,
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }
}

fn read_success_body(path: &str, response: Response) -> SourceResult<String> {
    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status {
            endpoint: path.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response.text()?)
}

impl RecordSource for RestRecordSource {
    fn fetch_areas(&self) -> SourceResult<Vec<Area>> {
        Ok(wire::decode_areas(&self.get_body(AREAS_PATH)?)?)
    }

    fn fetch_containers(&self) -> SourceResult<Vec<Container>> {
        Ok(wire::decode_containers(
            &self.get_body(STORAGE_UNITS_PATH)?,
        )?)
    }

    fn fetch_items(&self) -> SourceResult<DecodedList<Item>> {
        Ok(wire::decode_items(&self.get_body(ITEMS_PATH)?)?)
    }

    fn fetch_container(&self, id: &str) -> SourceResult<Container> {
        let path = format!("{STORAGE_UNITS_PATH}/{id}");
        let body = self.get_body(&path).map_err(|err| match err {
            SourceError::Status { status: 404, .. } => SourceError::NotFound(id.to_string()),
            other => other,
        })?;
        Ok(wire::decode_container(&body)?)
    }

    fn delete_containers(&self, ids: &[RecordId]) -> SourceResult<()> {
        let body = wire::encode_delete_request(ids)?;
        let url = self.endpoint(DELETE_MULTIPLE_PATH);
        let response_body = self.timed("POST", DELETE_MULTIPLE_PATH, || {
            self.client
                .post(&url)
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body)
                .send()
        })?;
        Ok(wire::decode_ack(&response_body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::{RestRecordSource, DEFAULT_HTTP_TIMEOUT};

    #[test]
    fn base_url_drops_trailing_slash() {
        let source = RestRecordSource::new("http://localhost:3000/api/", DEFAULT_HTTP_TIMEOUT)
            .unwrap();
        assert_eq!(source.base_url(), "http://localhost:3000/api");
        assert_eq!(
            source.endpoint("storage_units/c1"),
            "http://localhost:3000/api/storage_units/c1"
        );
    }
}
