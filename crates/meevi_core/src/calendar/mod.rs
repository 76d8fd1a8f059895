//! Merged calendar agenda.
//!
//! Combines expanded calendar-event occurrences with vaccine due dates so the
//! calendar view renders one sorted list.

use crate::model::calendar::{CalendarEvent, EventCategory};
use crate::model::vaccine::VaccineRecord;
use crate::model::RecordId;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgendaSource {
    Event,
    VaccineDue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgendaItem {
    pub date: NaiveDate,
    pub time: Option<String>,
    pub title: String,
    pub category: EventCategory,
    pub dog_id: Option<RecordId>,
    pub source: AgendaSource,
    /// Calendar event id or vaccine record id.
    pub source_id: RecordId,
    pub completed: bool,
}

/// Agenda for `from..=to`, ordered by date, then time, then title.
pub fn agenda(
    events: &[CalendarEvent],
    vaccines: &[VaccineRecord],
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<AgendaItem> {
    let mut items: Vec<AgendaItem> = events
        .iter()
        .flat_map(|event| {
            event
                .occurrences_between(from, to)
                .into_iter()
                .map(move |date| AgendaItem {
                    date,
                    time: event.time.clone(),
                    title: event.title.clone(),
                    category: event.category,
                    dog_id: event.dog_id,
                    source: AgendaSource::Event,
                    source_id: event.id,
                    // Completion applies to the anchor occurrence only.
                    completed: event.completed && date == event.date,
                })
        })
        .collect();

    items.extend(vaccines.iter().filter_map(|record| {
        let due = record.next_due_date?;
        (from..=to).contains(&due).then(|| AgendaItem {
            date: due,
            time: None,
            title: format!("{} due", record.vaccine_name),
            category: EventCategory::Vaccination,
            dog_id: Some(record.dog_id),
            source: AgendaSource::VaccineDue,
            source_id: record.id,
            completed: false,
        })
    }));

    items.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.time.cmp(&b.time))
            .then_with(|| a.title.cmp(&b.title))
    });
    items
}
