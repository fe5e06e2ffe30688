//! Local-first event store.
//!
//! Every mutation is applied to the caller's list, written whole to the
//! local cache, and then forwarded to the remote store. Remote failures are
//! logged and dropped: the local cache is what gets displayed next time.
//! Loading is the one place the remote wins, overwriting the cache when it
//! answers.

use crate::cache::{EventCache, KeyValueStore};
use crate::error::RemoteError;
use crate::remote::RemoteStore;
use crate::template::{self, TemplateProvider};
use crate::{CareEvent, EventDraft, EventId, PatientId, Result};
use chrono::{NaiveDate, Utc};

/// Event store combining templates, local cache and remote
pub struct EventStore<R, S, T> {
    remote: R,
    cache: EventCache<S>,
    templates: T,
}

impl<R: RemoteStore, S: KeyValueStore, T: TemplateProvider> EventStore<R, S, T> {
    pub fn new(remote: R, store: S, templates: T) -> Self {
        Self {
            remote,
            cache: EventCache::new(store),
            templates,
        }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn cache(&self) -> &EventCache<S> {
        &self.cache
    }

    /// Load a patient's events, preferring the remote copy
    ///
    /// A successful fetch replaces the cache. Any remote failure falls back
    /// to whatever the cache holds (empty if nothing or garbage).
    pub fn load_events(&self, patient: &PatientId) -> Result<Vec<CareEvent>> {
        match self.remote.fetch_events(patient) {
            Ok(events) => {
                self.cache.save(patient, &events)?;
                tracing::info!("Loaded {} events for patient {} from remote", events.len(), patient);
                Ok(events)
            }
            Err(e) => {
                log_remote_failure("fetch", &e);
                let events = self.cache.load(patient);
                tracing::info!("Loaded {} cached events for patient {}", events.len(), patient);
                Ok(events)
            }
        }
    }

    /// Make sure `date` has events, materializing the template if it has none
    ///
    /// A date that already has any event, recurring or not, is left alone.
    pub fn ensure_events_for_date(
        &self,
        mut events: Vec<CareEvent>,
        patient: &PatientId,
        date: NaiveDate,
    ) -> Result<Vec<CareEvent>> {
        if events.iter().any(|e| e.date == date) {
            return Ok(events);
        }

        let generated = template::instantiate(&self.templates.template_for(patient), patient, date);
        if generated.is_empty() {
            tracing::debug!("No template events for patient {} on {}", patient, date);
            return Ok(events);
        }

        tracing::info!(
            "Materialized {} recurring events for patient {} on {}",
            generated.len(),
            patient,
            date
        );
        events.extend(generated);
        self.cache.save(patient, &events)?;
        Ok(events)
    }

    /// Flip the completed flag of one event
    ///
    /// Unknown ids leave the list untouched and write nothing.
    pub fn toggle_completed(&self, mut events: Vec<CareEvent>, id: &EventId) -> Result<Vec<CareEvent>> {
        let Some(event) = events.iter_mut().find(|e| &e.id == id) else {
            tracing::debug!("Toggle for unknown event {}, ignoring", id);
            return Ok(events);
        };
        event.completed = !event.completed;
        let updated = event.clone();

        self.cache.save(&updated.patient_id, &events)?;
        tracing::info!("Event {} marked completed={}", id, updated.completed);

        if let Err(e) = self.remote.update_event(&updated) {
            log_remote_failure("update", &e);
        }
        Ok(events)
    }

    /// Add a caregiver-entered event on `date`
    ///
    /// Succeeds as soon as the local write does; the remote create is best effort.
    pub fn create_event(
        &self,
        mut events: Vec<CareEvent>,
        draft: EventDraft,
        date: NaiveDate,
        patient: &PatientId,
    ) -> Result<(Vec<CareEvent>, CareEvent)> {
        draft.validate()?;

        let event = CareEvent {
            id: next_adhoc_id(&events, Utc::now().timestamp_millis()),
            title: draft.title,
            description: draft.description,
            kind: draft.kind,
            start_time: draft.start_time,
            end_time: draft.end_time,
            priority: draft.priority,
            completed: false,
            date,
            patient_id: patient.clone(),
            recurring: false,
            caregiver_notes: None,
        };

        events.push(event.clone());
        self.cache.save(patient, &events)?;
        tracing::info!("Created event {} ({}) for patient {} on {}", event.id, event.title, patient, date);

        if let Err(e) = self.remote.create_event(&event) {
            log_remote_failure("create", &e);
        }
        Ok((events, event))
    }

    /// Throw away a patient's cached events and start over from the template
    ///
    /// The new list replaces the old one in a single write; if that write
    /// fails the previous cache entry is still there.
    pub fn reset_to_template(&self, patient: &PatientId, date: NaiveDate) -> Result<Vec<CareEvent>> {
        let events = template::instantiate(&self.templates.template_for(patient), patient, date);
        self.cache.save(patient, &events)?;
        tracing::info!("Reset patient {} to {} template events on {}", patient, events.len(), date);
        Ok(events)
    }

    /// Remove one event
    pub fn delete_event(&self, mut events: Vec<CareEvent>, id: &EventId) -> Result<Vec<CareEvent>> {
        let Some(index) = events.iter().position(|e| &e.id == id) else {
            tracing::debug!("Delete for unknown event {}, ignoring", id);
            return Ok(events);
        };
        let removed = events.remove(index);

        self.cache.save(&removed.patient_id, &events)?;
        tracing::info!("Deleted event {} ({})", id, removed.title);

        if let Err(e) = self.remote.delete_event(id) {
            log_remote_failure("delete", &e);
        }
        Ok(events)
    }

    /// Attach caregiver notes to an event; blank text clears them
    pub fn set_caregiver_notes(
        &self,
        mut events: Vec<CareEvent>,
        id: &EventId,
        notes: &str,
    ) -> Result<Vec<CareEvent>> {
        let Some(event) = events.iter_mut().find(|e| &e.id == id) else {
            tracing::debug!("Notes for unknown event {}, ignoring", id);
            return Ok(events);
        };
        let notes = notes.trim();
        event.caregiver_notes = if notes.is_empty() {
            None
        } else {
            Some(notes.to_string())
        };
        let updated = event.clone();

        self.cache.save(&updated.patient_id, &events)?;
        tracing::info!("Updated caregiver notes on event {}", id);

        if let Err(e) = self.remote.update_event(&updated) {
            log_remote_failure("update", &e);
        }
        Ok(events)
    }
}

/// Fresh id for an ad hoc event: the current millisecond, bumped past any id in use
fn next_adhoc_id(events: &[CareEvent], now_millis: i64) -> EventId {
    let mut candidate = now_millis.max(1) as u64;
    loop {
        let id = EventId::from(candidate);
        if !events.iter().any(|e| e.id == id) {
            return id;
        }
        candidate += 1;
    }
}

fn log_remote_failure(operation: &str, error: &RemoteError) {
    match error {
        RemoteError::Disabled => {
            tracing::debug!("Remote {} skipped: {}", operation, error);
        }
        _ => {
            tracing::warn!("Remote {} failed, keeping local data: {}", operation, error);
        }
    }
}
