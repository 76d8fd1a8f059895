//! Per-dog care statistics for the stats view.

use crate::model::dog::Dog;
use crate::model::RecordId;
use crate::repo::care_repo::{CareRepository, CareTotals};
use crate::repo::vaccine_repo::VaccineRepository;
use crate::repo::RepoResult;
use crate::schedule::{summarize, vaccination_schedule};
use chrono::{DateTime, NaiveDate};
use serde::Serialize;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;
pub const DEFAULT_STATS_WINDOW_DAYS: u32 = 30;
const MAX_STATS_WINDOW_DAYS: u32 = 365;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DogStats {
    pub dog_id: RecordId,
    pub window_days: u32,
    pub feedings: u32,
    pub baths: u32,
    pub exercise_sessions: u32,
    pub exercise_minutes: u64,
    pub exercise_distance_km: f64,
    pub last_feeding_at: Option<i64>,
    pub last_bath_at: Option<i64>,
    pub days_since_last_bath: Option<i64>,
    pub vaccines_completed: u32,
    pub vaccines_overdue: u32,
}

/// Clamps a requested stats window to `1..=365` days, defaulting to 30.
pub fn normalize_window_days(window_days: Option<u32>) -> u32 {
    match window_days {
        Some(0) | None => DEFAULT_STATS_WINDOW_DAYS,
        Some(days) => days.min(MAX_STATS_WINDOW_DAYS),
    }
}

pub fn dog_stats<C, V>(
    care: &C,
    vaccines: &V,
    dog: &Dog,
    window_days: Option<u32>,
    now_ms: i64,
) -> RepoResult<DogStats>
where
    C: CareRepository,
    V: VaccineRepository,
{
    let window_days = normalize_window_days(window_days);
    let since = now_ms.saturating_sub(i64::from(window_days) * DAY_MS);
    let CareTotals {
        feedings,
        baths,
        exercise_sessions,
        exercise_minutes,
        exercise_distance_km,
    } = care.totals_since(dog.id, since)?;

    let last_feeding_at = care.latest_feeding_at(dog.id)?;
    let last_bath_at = care.latest_bath_at(dog.id)?;
    let days_since_last_bath = last_bath_at.map(|at| (now_ms.saturating_sub(at) / DAY_MS).max(0));

    let today = date_of(now_ms);
    let recorded = vaccines.list_for_dog(dog.id)?;
    let summary = summarize(&vaccination_schedule(dog.birth_date, &recorded, today));

    Ok(DogStats {
        dog_id: dog.id,
        window_days,
        feedings,
        baths,
        exercise_sessions,
        exercise_minutes,
        exercise_distance_km,
        last_feeding_at,
        last_bath_at,
        days_since_last_bath,
        vaccines_completed: summary.completed,
        vaccines_overdue: summary.overdue,
    })
}

fn date_of(epoch_ms: i64) -> NaiveDate {
    DateTime::from_timestamp_millis(epoch_ms)
        .unwrap_or_default()
        .date_naive()
}
