//! Remote calendar store.
//!
//! The backend exposes the patient's events over REST:
//! - `GET  {base}/calendar?user_id={patient}` returns the full list
//! - `POST {base}/calendar` creates an event
//! - `PUT  {base}/calendar/{id}` replaces an event
//! - `DELETE {base}/calendar/{id}` removes an event
//!
//! The id is percent-encoded as a single path segment.
//!
//! Writes are best effort. Callers get a [`RemoteError`] they are free to
//! drop; the local cache stays authoritative.

use crate::error::{RemoteError, RemoteResult};
use crate::{CareEvent, Error, EventId, PatientId, Result};
use reqwest::Url;
use std::time::Duration;

/// Remote persistence for care events
pub trait RemoteStore {
    fn fetch_events(&self, patient: &PatientId) -> RemoteResult<Vec<CareEvent>>;
    fn create_event(&self, event: &CareEvent) -> RemoteResult<()>;
    fn update_event(&self, event: &CareEvent) -> RemoteResult<()>;
    fn delete_event(&self, id: &EventId) -> RemoteResult<()>;
}

impl RemoteStore for Box<dyn RemoteStore> {
    fn fetch_events(&self, patient: &PatientId) -> RemoteResult<Vec<CareEvent>> {
        (**self).fetch_events(patient)
    }

    fn create_event(&self, event: &CareEvent) -> RemoteResult<()> {
        (**self).create_event(event)
    }

    fn update_event(&self, event: &CareEvent) -> RemoteResult<()> {
        (**self).update_event(event)
    }

    fn delete_event(&self, id: &EventId) -> RemoteResult<()> {
        (**self).delete_event(id)
    }
}

/// Remote used when sync is switched off; every call reports `Disabled`
#[derive(Clone, Copy, Debug, Default)]
pub struct OfflineRemote;

impl RemoteStore for OfflineRemote {
    fn fetch_events(&self, _patient: &PatientId) -> RemoteResult<Vec<CareEvent>> {
        Err(RemoteError::Disabled)
    }

    fn create_event(&self, _event: &CareEvent) -> RemoteResult<()> {
        Err(RemoteError::Disabled)
    }

    fn update_event(&self, _event: &CareEvent) -> RemoteResult<()> {
        Err(RemoteError::Disabled)
    }

    fn delete_event(&self, _id: &EventId) -> RemoteResult<()> {
        Err(RemoteError::Disabled)
    }
}

/// Blocking HTTP client for the calendar backend
pub struct HttpRemote {
    base_url: Url,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl HttpRemote {
    /// Create a client for `base_url` with a per-request timeout
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| Error::Config(format!("Invalid remote URL {:?}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!("Remote URL {} cannot take a path", base_url)));
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            client,
            timeout_secs,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// `{base}/calendar` followed by `extra` as percent-encoded segments
    fn calendar_url(&self, extra: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("calendar");
            if let Some(segment) = extra {
                segments.push(segment);
            }
        }
        url
    }

    fn collection_url(&self) -> Url {
        self.calendar_url(None)
    }

    fn event_url(&self, id: &EventId) -> Url {
        self.calendar_url(Some(id.as_str()))
    }

    fn map_send_error(&self, e: reqwest::Error) -> RemoteError {
        if e.is_timeout() {
            RemoteError::Unavailable(format!("request timed out after {}s", self.timeout_secs))
        } else if e.is_connect() {
            RemoteError::Unavailable(format!("cannot connect to {}", self.base_url()))
        } else {
            RemoteError::Unavailable(e.to_string())
        }
    }

    fn check_status(
        response: reqwest::blocking::Response,
    ) -> RemoteResult<reqwest::blocking::Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().unwrap_or_default();
            Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

impl RemoteStore for HttpRemote {
    fn fetch_events(&self, patient: &PatientId) -> RemoteResult<Vec<CareEvent>> {
        let response = self
            .client
            .get(self.collection_url())
            .query(&[("user_id", patient.as_str())])
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let events = Self::check_status(response)?
            .json::<Vec<CareEvent>>()
            .map_err(|e| RemoteError::Decode(e.to_string()))?;

        tracing::debug!("Fetched {} events for patient {} from remote", events.len(), patient);
        Ok(events)
    }

    fn create_event(&self, event: &CareEvent) -> RemoteResult<()> {
        let response = self
            .client
            .post(self.collection_url())
            .json(event)
            .send()
            .map_err(|e| self.map_send_error(e))?;
        Self::check_status(response)?;
        tracing::debug!("Created event {} on remote", event.id);
        Ok(())
    }

    fn update_event(&self, event: &CareEvent) -> RemoteResult<()> {
        let response = self
            .client
            .put(self.event_url(&event.id))
            .json(event)
            .send()
            .map_err(|e| self.map_send_error(e))?;
        Self::check_status(response)?;
        tracing::debug!("Updated event {} on remote", event.id);
        Ok(())
    }

    fn delete_event(&self, id: &EventId) -> RemoteResult<()> {
        let response = self
            .client
            .delete(self.event_url(id))
            .send()
            .map_err(|e| self.map_send_error(e))?;
        Self::check_status(response)?;
        tracing::debug!("Deleted event {} on remote", id);
        Ok(())
    }
}
