//! A caregiver's view of one patient's calendar.
//!
//! The session holds the selected date and the in-memory event list and
//! turns UI commands into [`EventStore`] operations. Moving to another date
//! materializes that date's routine the first time it is viewed.

use crate::cache::KeyValueStore;
use crate::remote::RemoteStore;
use crate::schedule;
use crate::store::EventStore;
use crate::template::TemplateProvider;
use crate::{CareEvent, EventDraft, EventId, PatientId, Result};
use chrono::{NaiveDate, NaiveDateTime};

pub struct CalendarSession<'a, R, S, T> {
    store: &'a EventStore<R, S, T>,
    patient: PatientId,
    selected: NaiveDate,
    events: Vec<CareEvent>,
}

impl<'a, R: RemoteStore, S: KeyValueStore, T: TemplateProvider> CalendarSession<'a, R, S, T> {
    /// Load the patient's events and make sure `date` is populated
    pub fn open(store: &'a EventStore<R, S, T>, patient: PatientId, date: NaiveDate) -> Result<Self> {
        let events = store.load_events(&patient)?;
        let events = store.ensure_events_for_date(events, &patient, date)?;
        Ok(Self {
            store,
            patient,
            selected: date,
            events,
        })
    }

    pub fn patient(&self) -> &PatientId {
        &self.patient
    }

    pub fn selected_date(&self) -> NaiveDate {
        self.selected
    }

    /// Every event held for the patient, all dates
    pub fn events(&self) -> &[CareEvent] {
        &self.events
    }

    pub fn find(&self, id: &EventId) -> Option<&CareEvent> {
        self.events.iter().find(|e| &e.id == id)
    }

    /// Events on the selected date, in stored order
    pub fn today_events(&self) -> Vec<&CareEvent> {
        schedule::events_for_date(&self.events, self.selected)
    }

    pub fn overdue_events(&self, now: NaiveDateTime) -> Vec<&CareEvent> {
        schedule::overdue_events(&self.events, now)
    }

    /// Add an event on the selected date
    pub fn add_event(&mut self, draft: EventDraft) -> Result<CareEvent> {
        let (events, created) =
            self.store
                .create_event(self.events.clone(), draft, self.selected, &self.patient)?;
        self.events = events;
        Ok(created)
    }

    pub fn toggle(&mut self, id: &EventId) -> Result<()> {
        self.apply(|store, events| store.toggle_completed(events, id))
    }

    pub fn delete(&mut self, id: &EventId) -> Result<()> {
        self.apply(|store, events| store.delete_event(events, id))
    }

    pub fn set_notes(&mut self, id: &EventId, notes: &str) -> Result<()> {
        self.apply(|store, events| store.set_caregiver_notes(events, id, notes))
    }

    /// Drop all stored events and re-create the routine for the selected date
    pub fn reset(&mut self) -> Result<()> {
        self.events = self.store.reset_to_template(&self.patient, self.selected)?;
        Ok(())
    }

    pub fn previous_day(&mut self) -> Result<()> {
        self.go_to(schedule::previous_day(self.selected))
    }

    pub fn next_day(&mut self) -> Result<()> {
        self.go_to(schedule::next_day(self.selected))
    }

    pub fn go_to_today(&mut self, today: NaiveDate) -> Result<()> {
        self.go_to(today)
    }

    /// Select `date`, materializing its routine if it has no events yet
    pub fn go_to(&mut self, date: NaiveDate) -> Result<()> {
        let patient = self.patient.clone();
        self.apply(|store, events| store.ensure_events_for_date(events, &patient, date))?;
        self.selected = date;
        Ok(())
    }

    /// Run a list-transforming store operation; on error the list is kept as it was
    fn apply<F>(&mut self, op: F) -> Result<()>
    where
        F: FnOnce(&EventStore<R, S, T>, Vec<CareEvent>) -> Result<Vec<CareEvent>>,
    {
        self.events = op(self.store, self.events.clone())?;
        Ok(())
    }
}
