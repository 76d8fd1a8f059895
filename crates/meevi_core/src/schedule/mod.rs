//! Vaccination schedule lookup by age.
//!
//! # Responsibility
//! - Hold the static ordered list of recommended vaccines and age thresholds.
//! - Derive per-vaccine status by joining the list with recorded doses.
//!
//! # Invariants
//! - The schedule list is ordered by age threshold, then by declaration order.
//! - A vaccine is `Completed` when any recorded dose has the same normalized
//!   name; otherwise `Overdue` once the dog's age reaches the threshold.
//! - Without a birth date nothing is ever `Overdue`.

use crate::model::vaccine::VaccineRecord;
use crate::model::validation::collapse_whitespace;
use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;
use std::collections::HashSet;

/// One entry of the recommended schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledVaccine {
    pub name: &'static str,
    pub age_months: u32,
    pub description: &'static str,
}

pub const VACCINATION_SCHEDULE: &[ScheduledVaccine] = &[
    ScheduledVaccine {
        name: "DHPP (1st dose)",
        age_months: 2,
        description: "Distemper, hepatitis, parainfluenza and parvovirus, first puppy dose.",
    },
    ScheduledVaccine {
        name: "Bordetella",
        age_months: 2,
        description: "Kennel cough protection, recommended for social dogs.",
    },
    ScheduledVaccine {
        name: "DHPP (2nd dose)",
        age_months: 3,
        description: "Second core puppy dose, three to four weeks after the first.",
    },
    ScheduledVaccine {
        name: "Leptospirosis",
        age_months: 3,
        description: "Bacterial infection spread through water and wildlife.",
    },
    ScheduledVaccine {
        name: "DHPP (3rd dose)",
        age_months: 4,
        description: "Final core puppy dose.",
    },
    ScheduledVaccine {
        name: "Rabies",
        age_months: 4,
        description: "Required by law in most regions.",
    },
    ScheduledVaccine {
        name: "DHPP booster",
        age_months: 12,
        description: "First adult booster one year after the puppy series.",
    },
    ScheduledVaccine {
        name: "Rabies booster",
        age_months: 12,
        description: "Booster one year after the first rabies shot.",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VaccineStatus {
    Completed,
    Overdue,
    Upcoming,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleItem {
    pub name: &'static str,
    pub age_months: u32,
    pub description: &'static str,
    /// `birth_date + age_months`, when the birth date is known.
    pub due_date: Option<NaiveDate>,
    pub status: VaccineStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScheduleSummary {
    pub completed: u32,
    pub overdue: u32,
    pub upcoming: u32,
}

/// Whole months between `birth` and `today`; zero when `today` precedes `birth`.
pub fn age_in_months(birth: NaiveDate, today: NaiveDate) -> u32 {
    if today <= birth {
        return 0;
    }
    let mut months = (today.year() - birth.year()) * 12 + today.month() as i32
        - birth.month() as i32;
    if today.day() < birth.day() && !is_last_day_of_month(today) {
        months -= 1;
    }
    u32::try_from(months.max(0)).unwrap_or(0)
}

fn is_last_day_of_month(date: NaiveDate) -> bool {
    date.succ_opt().map_or(true, |next| next.month() != date.month())
}

/// Normalizes a vaccine name for set-membership: lowercase, single spaces.
pub fn normalize_vaccine_name(name: &str) -> String {
    collapse_whitespace(name).to_lowercase()
}

/// Joins the static schedule with recorded doses.
pub fn vaccination_schedule(
    birth_date: Option<NaiveDate>,
    recorded: &[VaccineRecord],
    today: NaiveDate,
) -> Vec<ScheduleItem> {
    let completed: HashSet<String> = recorded
        .iter()
        .map(|record| normalize_vaccine_name(&record.vaccine_name))
        .collect();
    let age = birth_date.map(|birth| age_in_months(birth, today));

    VACCINATION_SCHEDULE
        .iter()
        .map(|entry| {
            let status = if completed.contains(&normalize_vaccine_name(entry.name)) {
                VaccineStatus::Completed
            } else if age.is_some_and(|months| months >= entry.age_months) {
                VaccineStatus::Overdue
            } else {
                VaccineStatus::Upcoming
            };
            ScheduleItem {
                name: entry.name,
                age_months: entry.age_months,
                description: entry.description,
                due_date: birth_date
                    .and_then(|birth| birth.checked_add_months(Months::new(entry.age_months))),
                status,
            }
        })
        .collect()
}

pub fn summarize(items: &[ScheduleItem]) -> ScheduleSummary {
    items
        .iter()
        .fold(ScheduleSummary::default(), |mut summary, item| {
            match item.status {
                VaccineStatus::Completed => summary.completed += 1,
                VaccineStatus::Overdue => summary.overdue += 1,
                VaccineStatus::Upcoming => summary.upcoming += 1,
            }
            summary
        })
}

#[cfg(test)]
mod tests {
    use super::{
        age_in_months, normalize_vaccine_name, summarize, vaccination_schedule, VaccineStatus,
        VACCINATION_SCHEDULE,
    };
    use crate::model::vaccine::VaccineRecord;
use crate::model::validation::collapse_whitespace;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn age_counts_whole_months() {
        assert_eq!(age_in_months(date(2024, 1, 15), date(2024, 3, 14)), 1);
        assert_eq!(age_in_months(date(2024, 1, 15), date(2024, 3, 15)), 2);
        assert_eq!(age_in_months(date(2023, 11, 30), date(2024, 2, 29)), 3);
        assert_eq!(age_in_months(date(2024, 5, 1), date(2024, 4, 1)), 0);
    }

    #[test]
    fn schedule_is_ordered_by_age() {
        let ages: Vec<u32> = VACCINATION_SCHEDULE.iter().map(|v| v.age_months).collect();
        let mut sorted = ages.clone();
        sorted.sort();
        assert_eq!(ages, sorted);
    }

    #[test]
    fn two_month_vaccine_is_overdue_at_two_months_without_record() {
        let items = vaccination_schedule(Some(date(2024, 1, 1)), &[], date(2024, 3, 1));
        let first = items.iter().find(|i| i.name == "DHPP (1st dose)").unwrap();
        assert_eq!(first.status, VaccineStatus::Overdue);
        assert_eq!(first.due_date, Some(date(2024, 3, 1)));
        let rabies = items.iter().find(|i| i.name == "Rabies").unwrap();
        assert_eq!(rabies.status, VaccineStatus::Upcoming);
    }

    #[test]
    fn recorded_dose_marks_completed_case_insensitively() {
        let dog_id = Uuid::new_v4();
        let recorded = vec![VaccineRecord::new(dog_id, "  dhpp   (1st DOSE) ", date(2024, 3, 2))];
        let items = vaccination_schedule(Some(date(2024, 1, 1)), &recorded, date(2024, 3, 5));
        let first = items.iter().find(|i| i.name == "DHPP (1st dose)").unwrap();
        assert_eq!(first.status, VaccineStatus::Completed);
        let summary = summarize(&items);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.overdue, 1);
        assert_eq!(summary.upcoming, 6);
    }

    #[test]
    fn unknown_birth_date_never_overdue() {
        let items = vaccination_schedule(None, &[], date(2030, 1, 1));
        assert!(items.iter().all(|i| i.status == VaccineStatus::Upcoming));
        assert!(items.iter().all(|i| i.due_date.is_none()));
    }

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize_vaccine_name(" Rabies   Booster "), "rabies booster");
    }
}
