//! Daily templates and recurring event materialization.
//!
//! A template is a patient's standing routine. Viewing a date with no stored
//! events instantiates the template for that date. Ids of generated events
//! spell out all three parts of their key:
//!
//! ```text
//! <patient>:<YYYY-MM-DD>:<ordinal>
//! ```
//!
//! The date and ordinal never contain `:`, so the id splits back apart from
//! the right whatever the patient id holds. Caregiver-entered ids are bare
//! digits and can never take this shape.

use crate::types::*;
use crate::{Error, Result};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use std::collections::HashMap;

const ID_SEPARATOR: char = ':';

/// Source of per-patient daily templates
pub trait TemplateProvider {
    /// Template for a patient; unknown patients get an empty template
    fn template_for(&self, patient: &PatientId) -> DailyTemplate;
}

/// The three demonstration patients that ship with the product
static BUILTIN_TEMPLATES: Lazy<HashMap<&'static str, DailyTemplate>> =
    Lazy::new(build_builtin_templates);

/// Templates compiled into the binary
#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinTemplates;

impl TemplateProvider for BuiltinTemplates {
    fn template_for(&self, patient: &PatientId) -> DailyTemplate {
        BUILTIN_TEMPLATES
            .get(patient.as_str())
            .cloned()
            .unwrap_or_default()
    }
}

/// Templates from the config file, falling back to the built-in ones
#[derive(Clone, Debug, Default)]
pub struct ConfiguredTemplates {
    overrides: HashMap<PatientId, DailyTemplate>,
}

impl ConfiguredTemplates {
    /// Validate and index the `[templates]` section of the config
    pub fn new(raw: &HashMap<String, Vec<EventArchetype>>) -> Result<Self> {
        let mut overrides = HashMap::new();
        for (patient, archetypes) in raw {
            for archetype in archetypes {
                archetype.validate().map_err(|e| {
                    Error::Config(format!("template for patient {}: {}", patient, e))
                })?;
            }
            overrides.insert(
                PatientId::new(patient.clone()),
                DailyTemplate::new(archetypes.clone()),
            );
        }
        tracing::debug!("Loaded {} configured templates", overrides.len());
        Ok(Self { overrides })
    }
}

impl TemplateProvider for ConfiguredTemplates {
    fn template_for(&self, patient: &PatientId) -> DailyTemplate {
        match self.overrides.get(patient) {
            Some(template) => template.clone(),
            None => BuiltinTemplates.template_for(patient),
        }
    }
}

/// Instantiate a template for one date
///
/// Generated events are incomplete, marked recurring, and keep template order.
pub fn instantiate(template: &DailyTemplate, patient: &PatientId, date: NaiveDate) -> Vec<CareEvent> {
    let events = template
        .archetypes()
        .iter()
        .enumerate()
        .map(|(ordinal, archetype)| CareEvent {
            id: recurring_id(patient, date, ordinal),
            title: archetype.title.clone(),
            description: archetype.description.clone(),
            kind: archetype.kind,
            start_time: archetype.start_time,
            end_time: archetype.end_time,
            priority: archetype.priority,
            completed: false,
            date,
            patient_id: patient.clone(),
            recurring: true,
            caregiver_notes: None,
        })
        .collect::<Vec<_>>();

    if !events.is_empty() {
        tracing::debug!(
            "Instantiated {} recurring events for patient {} on {}",
            events.len(),
            patient,
            date
        );
    }
    events
}

/// Id of the `ordinal`-th template event for `(patient, date)`
pub fn recurring_id(patient: &PatientId, date: NaiveDate, ordinal: usize) -> EventId {
    EventId::new(format!(
        "{}{sep}{}{sep}{}",
        patient,
        date,
        ordinal,
        sep = ID_SEPARATOR
    ))
}

/// Split a template event id back into patient, date and ordinal
pub fn parse_recurring_id(id: &EventId) -> Option<(PatientId, NaiveDate, usize)> {
    let mut parts = id.as_str().rsplitn(3, ID_SEPARATOR);
    let ordinal = parts.next()?.parse().ok()?;
    let date = parts.next()?.parse().ok()?;
    let patient = parts.next()?;
    Some((PatientId::from(patient), date, ordinal))
}

/// Whether an id was produced by template materialization
pub fn is_recurring_id(id: &EventId) -> bool {
    parse_recurring_id(id).is_some()
}

fn archetype(
    title: &str,
    description: &str,
    kind: EventType,
    start: (u32, u32),
    end: (u32, u32),
    priority: Priority,
) -> EventArchetype {
    let hm = |(hour, minute): (u32, u32)| {
        ClockTime::from_hm(hour, minute).unwrap_or(ClockTime::MIDNIGHT)
    };
    EventArchetype {
        title: title.into(),
        description: description.into(),
        kind,
        start_time: hm(start),
        end_time: hm(end),
        priority,
    }
}

fn build_builtin_templates() -> HashMap<&'static str, DailyTemplate> {
    let mut templates = HashMap::new();

    // Sarah Johnson
    templates.insert(
        "1",
        DailyTemplate::new(vec![
            archetype(
                "Morning Medication",
                "Take blood pressure medication",
                EventType::Medication,
                (9, 0),
                (9, 15),
                Priority::High,
            ),
            archetype(
                "Photo Album Time",
                "Look through the family photo album together",
                EventType::Activity,
                (11, 0),
                (11, 30),
                Priority::Medium,
            ),
            archetype(
                "Afternoon Walk",
                "Gentle walk in the park",
                EventType::Activity,
                (16, 0),
                (17, 0),
                Priority::Medium,
            ),
            archetype(
                "Evening Medication",
                "Take evening medication",
                EventType::Medication,
                (20, 0),
                (20, 15),
                Priority::High,
            ),
        ]),
    );

    // Robert Smith
    templates.insert(
        "2",
        DailyTemplate::new(vec![
            archetype(
                "Blood Sugar Check",
                "Check glucose before breakfast",
                EventType::Medication,
                (7, 30),
                (7, 45),
                Priority::Urgent,
            ),
            archetype(
                "Memory Exercise",
                "Word association and recall games",
                EventType::Activity,
                (10, 0),
                (10, 30),
                Priority::Medium,
            ),
            archetype(
                "Lunch Reminder",
                "Make sure lunch is eaten with water",
                EventType::Reminder,
                (12, 0),
                (12, 30),
                Priority::Medium,
            ),
            archetype(
                "Evening Insulin",
                "Evening insulin dose with dinner",
                EventType::Medication,
                (18, 0),
                (18, 15),
                Priority::Urgent,
            ),
        ]),
    );

    templates.insert(
        "3",
        DailyTemplate::new(vec![
            archetype(
                "Morning Vitamins",
                "Vitamin D and B12 with breakfast",
                EventType::Medication,
                (8, 30),
                (8, 45),
                Priority::Medium,
            ),
            archetype(
                "Music Therapy",
                "Listen to favourite songs from the 1960s",
                EventType::Activity,
                (14, 0),
                (14, 45),
                Priority::Low,
            ),
            archetype(
                "Call Family",
                "Video call with daughter",
                EventType::Reminder,
                (17, 0),
                (17, 30),
                Priority::Medium,
            ),
        ]),
    );

    templates
}
