//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Translate core errors into flat response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Ids and dates cross the boundary as strings (UUID, `YYYY-MM-DD`).

use chrono::{Local, NaiveDate};
use log::warn;
use meevi_core::calendar::{agenda, AgendaItem, AgendaSource};
use meevi_core::db::open_db;
use meevi_core::local::{LocalItem, LocalStore};
use meevi_core::model::calendar::{CalendarEvent, EventCategory, Recurrence};
use meevi_core::model::care::{BathRecord, DiaryEntry, DiaryKind, ExerciseRecord, FeedingRecord};
use meevi_core::model::dog::{Dog, DogDraft};
use meevi_core::model::essentials::{ContactRole, DocumentKind, DogDocument, EmergencyContact};
use meevi_core::model::notification::Notification;
use meevi_core::model::preferences::UserPreferences;
use meevi_core::model::validation::{clean_optional, ValidationError};
use meevi_core::model::vaccine::VaccineRecord;
use meevi_core::realtime::{ChangeAction, ChangeTable};
use meevi_core::repo::care_repo::SqliteCareRepository;
use meevi_core::repo::diary_repo::{normalize_diary_limit, DiaryListQuery, SqliteDiaryRepository};
use meevi_core::repo::dog_repo::SqliteDogRepository;
use meevi_core::repo::notification_repo::{
    normalize_notification_limit, NotificationListQuery, SqliteNotificationRepository,
};
use meevi_core::repo::owner_repo::SqliteOwnerRepository;
use meevi_core::repo::preferences_repo::SqlitePreferencesRepository;
use meevi_core::repo::vaccine_repo::SqliteVaccineRepository;
use meevi_core::schedule::ScheduleItem;
use meevi_core::service::account_service::AccountService;
use meevi_core::service::care_service::CareService;
use meevi_core::service::diary_service::DiaryService;
use meevi_core::service::dog_service::DogService;
use meevi_core::service::notification_service::NotificationService;
use meevi_core::service::onboarding_service::OnboardingService;
use meevi_core::service::preferences_service::{PreferencesService, PreferencesUpdate};
use meevi_core::service::vaccine_service::VaccineService;
use meevi_core::sync::{CloudSyncService, SqliteRemoteStore, SyncDirection, SyncError};
use meevi_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    ChangeEvent, ChangeFeed, ChangeFilter, ReminderClock, ReminderEvaluator, Subscription,
};
use rusqlite::Connection;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use uuid::Uuid;

const DB_FILE_NAME: &str = "meevi.sqlite3";
const DB_PATH_ENV: &str = "MEEVI_DB_PATH";
static DB_PATH: OnceLock<PathBuf> = OnceLock::new();
const REMOTE_DB_FILE_NAME: &str = "meevi-remote.sqlite3";
const REMOTE_DB_PATH_ENV: &str = "MEEVI_REMOTE_DB_PATH";
static REMOTE_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
const DEFAULT_POLL_EVENTS: u32 = 100;
const MAX_POLL_EVENTS: u32 = 500;
static CHANGE_FEED: OnceLock<Arc<ChangeFeed>> = OnceLock::new();
static SUBSCRIPTIONS: OnceLock<Mutex<HashMap<u64, Subscription>>> = OnceLock::new();
static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(1);

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Generic write response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Id of the created or touched record.
    pub id: Option<String>,
    /// Stable error code (`validation_failed`, `not_found`, ...) on failure.
    pub error_code: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, id: impl ToString) -> Self {
        Self {
            ok: true,
            id: Some(id.to_string()),
            error_code: None,
            message: message.into(),
        }
    }

    fn failure(op: &str, err: FfiError) -> Self {
        warn!("event=ffi_call module=ffi status=error op={op} code={}", err.code);
        Self {
            ok: false,
            id: None,
            error_code: Some(err.code.to_string()),
            message: format!("{op} failed: {}", err.message),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DogItem {
    pub id: String,
    pub name: String,
    pub breed: Option<String>,
    pub birth_date: Option<String>,
    pub weight_kg: Option<f64>,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DogListResponse {
    pub ok: bool,
    pub items: Vec<DogItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationItem {
    pub id: String,
    pub dog_id: Option<String>,
    /// `vaccine|feeding|birthday`.
    pub kind: String,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationCheckResponse {
    pub ok: bool,
    pub created: Vec<NotificationItem>,
    pub skipped_duplicates: u32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationListResponse {
    pub ok: bool,
    pub items: Vec<NotificationItem>,
    pub unread_count: u32,
    pub applied_limit: u32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub name: String,
    pub age_months: u32,
    pub description: String,
    pub due_date: Option<String>,
    /// `completed|overdue|upcoming`.
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleResponse {
    pub ok: bool,
    pub age_months: Option<u32>,
    pub items: Vec<ScheduleEntry>,
    pub completed: u32,
    pub overdue: u32,
    pub upcoming: u32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatsResponse {
    pub ok: bool,
    pub window_days: u32,
    pub feedings: u32,
    pub baths: u32,
    pub exercise_sessions: u32,
    pub exercise_minutes: u64,
    pub exercise_distance_km: f64,
    pub last_feeding_at: Option<i64>,
    pub days_since_last_bath: Option<i64>,
    pub vaccines_completed: u32,
    pub vaccines_overdue: u32,
    pub message: String,
}

/// Registers an owner account.
#[flutter_rust_bridge::frb(sync)]
pub fn owner_register(email: String, display_name: Option<String>) -> ActionResponse {
    let result = with_connection(|conn| {
        let service = AccountService::new(SqliteOwnerRepository::try_new(conn)?);
        Ok(service.register_owner(email.trim(), display_name)?)
    });
    match result {
        Ok(owner) => ActionResponse::success("Owner registered.", owner.id),
        Err(err) => ActionResponse::failure("owner_register", err),
    }
}

/// Creates a dog profile.
///
/// `birth_date` is `YYYY-MM-DD` when provided.
#[flutter_rust_bridge::frb(sync)]
pub fn dog_create(
    owner_id: String,
    name: String,
    breed: Option<String>,
    birth_date: Option<String>,
    weight_kg: Option<f64>,
) -> ActionResponse {
    let result = with_connection(|conn| {
        let owner_id = parse_id("owner_id", &owner_id)?;
        let draft = DogDraft {
            name,
            breed,
            birth_date: parse_optional_date("birth_date", birth_date.as_deref())?,
            weight_kg,
            notes: None,
        };
        let service = DogService::new(SqliteDogRepository::try_new(conn)?)
            .with_change_feed(change_feed());
        Ok(service.create_dog(owner_id, draft)?)
    });
    match result {
        Ok(dog) => ActionResponse::success("Dog created.", dog.id),
        Err(err) => ActionResponse::failure("dog_create", err),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn dog_list(owner_id: String) -> DogListResponse {
    let result = with_connection(|conn| {
        let owner_id = parse_id("owner_id", &owner_id)?;
        let service = DogService::new(SqliteDogRepository::try_new(conn)?);
        Ok(service.list_dogs(owner_id)?)
    });
    match result {
        Ok(dogs) => DogListResponse {
            ok: true,
            message: format!("Found {} dog(s).", dogs.len()),
            items: dogs.into_iter().map(to_dog_item).collect(),
        },
        Err(err) => DogListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("dog_list failed: {}", err.message),
        },
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn feeding_log(
    dog_id: String,
    food_type: String,
    amount_grams: Option<f64>,
    fed_at_epoch_ms: i64,
) -> ActionResponse {
    let result = with_connection(|conn| {
        let dog_id = parse_id("dog_id", &dog_id)?;
        let mut record = FeedingRecord::new(dog_id, food_type, fed_at_epoch_ms);
        record.amount_grams = amount_grams;
        let service = care_service(conn)?;
        Ok(service.log_feeding(&record)?)
    });
    match result {
        Ok(id) => ActionResponse::success("Feeding logged.", id),
        Err(err) => ActionResponse::failure("feeding_log", err),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn bath_log(
    dog_id: String,
    bathed_at_epoch_ms: i64,
    products: Option<String>,
) -> ActionResponse {
    let result = with_connection(|conn| {
        let record = BathRecord::new(parse_id("dog_id", &dog_id)?, bathed_at_epoch_ms)
            .with_products(products);
        let service = care_service(conn)?;
        Ok(service.log_bath(&record)?)
    });
    match result {
        Ok(id) => ActionResponse::success("Bath logged.", id),
        Err(err) => ActionResponse::failure("bath_log", err),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn exercise_log(
    dog_id: String,
    exercise_type: String,
    duration_minutes: u32,
    distance_km: Option<f64>,
    performed_at_epoch_ms: i64,
) -> ActionResponse {
    let result = with_connection(|conn| {
        let mut record = ExerciseRecord::new(
            parse_id("dog_id", &dog_id)?,
            exercise_type,
            duration_minutes,
            performed_at_epoch_ms,
        );
        record.distance_km = distance_km;
        let service = care_service(conn)?;
        Ok(service.log_exercise(&record)?)
    });
    match result {
        Ok(id) => ActionResponse::success("Exercise logged.", id),
        Err(err) => ActionResponse::failure("exercise_log", err),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn vaccine_record(
    dog_id: String,
    vaccine_name: String,
    date_given: String,
    next_due_date: Option<String>,
    veterinarian: Option<String>,
) -> ActionResponse {
    let result = with_connection(|conn| {
        let record = VaccineRecord::new(
            parse_id("dog_id", &dog_id)?,
            vaccine_name,
            parse_date("date_given", &date_given)?,
        )
        .with_next_due(parse_optional_date("next_due_date", next_due_date.as_deref())?)
        .with_veterinarian(veterinarian);
        let service = VaccineService::new(SqliteVaccineRepository::try_new(conn)?)
            .with_change_feed(change_feed());
        Ok(service.record_vaccine(&record)?)
    });
    match result {
        Ok(id) => ActionResponse::success("Vaccine recorded.", id),
        Err(err) => ActionResponse::failure("vaccine_record", err),
    }
}

/// Marks onboarding complete; fails until the owner has a dog.
#[flutter_rust_bridge::frb(sync)]
pub fn onboarding_complete(owner_id: String) -> ActionResponse {
    let result = with_connection(|conn| {
        let owner_id = parse_id("owner_id", &owner_id)?;
        let service = OnboardingService::new(
            SqliteDogRepository::try_new(conn)?,
            SqlitePreferencesRepository::try_new(conn)?,
        );
        service.complete(owner_id)?;
        Ok(owner_id)
    });
    match result {
        Ok(owner_id) => ActionResponse::success("Onboarding completed.", owner_id),
        Err(err) => ActionResponse::failure("onboarding_complete", err),
    }
}

/// Runs the reminder rules for one owner using the device clock.
#[flutter_rust_bridge::frb(sync)]
pub fn notifications_check(owner_id: String) -> NotificationCheckResponse {
    let result = with_connection(|conn| {
        let owner_id = parse_id("owner_id", &owner_id)?;
        AccountService::new(SqliteOwnerRepository::try_new(conn)?).get_owner(owner_id)?;
        let feed = change_feed();
        let evaluator = ReminderEvaluator::try_new(conn)?.with_change_feed(&feed);
        Ok(evaluator.run(owner_id, ReminderClock::system())?)
    });
    match result {
        Ok(report) => NotificationCheckResponse {
            ok: true,
            message: format!(
                "Created {} notification(s), skipped {} duplicate(s).",
                report.created.len(),
                report.skipped_duplicates
            ),
            created: report.created.into_iter().map(to_notification_item).collect(),
            skipped_duplicates: report.skipped_duplicates,
        },
        Err(err) => NotificationCheckResponse {
            ok: false,
            created: Vec::new(),
            skipped_duplicates: 0,
            message: format!("notifications_check failed: {}", err.message),
        },
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn notifications_list(
    owner_id: String,
    unread_only: bool,
    limit: Option<u32>,
) -> NotificationListResponse {
    let applied_limit = normalize_notification_limit(limit);
    let result = with_connection(|conn| {
        let owner_id = parse_id("owner_id", &owner_id)?;
        let service = NotificationService::new(SqliteNotificationRepository::try_new(conn)?);
        let query = NotificationListQuery {
            unread_only,
            limit: Some(applied_limit),
        };
        Ok(service.inbox(owner_id, &query)?)
    });
    match result {
        Ok(inbox) => NotificationListResponse {
            ok: true,
            message: format!("{} unread.", inbox.unread_count),
            items: inbox.items.into_iter().map(to_notification_item).collect(),
            unread_count: inbox.unread_count,
            applied_limit,
        },
        Err(err) => NotificationListResponse {
            ok: false,
            items: Vec::new(),
            unread_count: 0,
            applied_limit,
            message: format!("notifications_list failed: {}", err.message),
        },
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn notification_mark_read(notification_id: String) -> ActionResponse {
    let result = with_connection(|conn| {
        let id = parse_id("notification_id", &notification_id)?;
        NotificationService::new(SqliteNotificationRepository::try_new(conn)?)
            .with_change_feed(change_feed())
            .mark_read(id)?;
        Ok(id)
    });
    match result {
        Ok(id) => ActionResponse::success("Notification marked read.", id),
        Err(err) => ActionResponse::failure("notification_mark_read", err),
    }
}

/// Recommended vaccination schedule for one dog as of today.
#[flutter_rust_bridge::frb(sync)]
pub fn vaccination_schedule(dog_id: String) -> ScheduleResponse {
    let result = with_connection(|conn| {
        let dog = load_dog(conn, &dog_id)?;
        let service = VaccineService::new(SqliteVaccineRepository::try_new(conn)?);
        Ok(service.schedule_for(&dog, Local::now().date_naive())?)
    });
    match result {
        Ok(schedule) => ScheduleResponse {
            ok: true,
            age_months: schedule.age_months,
            items: schedule.items.iter().map(to_schedule_entry).collect(),
            completed: schedule.summary.completed,
            overdue: schedule.summary.overdue,
            upcoming: schedule.summary.upcoming,
            message: format!("{} vaccine(s) overdue.", schedule.summary.overdue),
        },
        Err(err) => ScheduleResponse {
            ok: false,
            age_months: None,
            items: Vec::new(),
            completed: 0,
            overdue: 0,
            upcoming: 0,
            message: format!("vaccination_schedule failed: {}", err.message),
        },
    }
}

/// Care statistics for one dog over the last `window_days` (default 30).
#[flutter_rust_bridge::frb(sync)]
pub fn dog_stats(dog_id: String, window_days: Option<u32>) -> StatsResponse {
    let result = with_connection(|conn| {
        let dog = load_dog(conn, &dog_id)?;
        Ok(meevi_core::stats::dog_stats(
            &SqliteCareRepository::try_new(conn)?,
            &SqliteVaccineRepository::try_new(conn)?,
            &dog,
            window_days,
            meevi_core::clock::now_epoch_ms(),
        )?)
    });
    match result {
        Ok(stats) => StatsResponse {
            ok: true,
            window_days: stats.window_days,
            feedings: stats.feedings,
            baths: stats.baths,
            exercise_sessions: stats.exercise_sessions,
            exercise_minutes: stats.exercise_minutes,
            exercise_distance_km: stats.exercise_distance_km,
            last_feeding_at: stats.last_feeding_at,
            days_since_last_bath: stats.days_since_last_bath,
            vaccines_completed: stats.vaccines_completed,
            vaccines_overdue: stats.vaccines_overdue,
            message: String::new(),
        },
        Err(err) => StatsResponse {
            ok: false,
            window_days: meevi_core::stats::normalize_window_days(window_days),
            feedings: 0,
            baths: 0,
            exercise_sessions: 0,
            exercise_minutes: 0,
            exercise_distance_km: 0.0,
            last_feeding_at: None,
            days_since_last_bath: None,
            vaccines_completed: 0,
            vaccines_overdue: 0,
            message: format!("dog_stats failed: {}", err.message),
        },
    }
}

/// Calendar event in the owner's local collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEventItem {
    pub id: String,
    pub dog_id: Option<String>,
    pub title: String,
    /// `vaccination|vet_visit|grooming|medication|deworming|other`.
    pub category: String,
    pub date: String,
    pub time: Option<String>,
    /// `none|daily|weekly|monthly|yearly`.
    pub recurrence: String,
    pub notes: Option<String>,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEventListResponse {
    pub ok: bool,
    pub items: Vec<CalendarEventItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgendaEntry {
    pub date: String,
    pub time: Option<String>,
    pub title: String,
    pub category: String,
    pub dog_id: Option<String>,
    /// `event|vaccine_due`.
    pub source: String,
    pub source_id: String,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgendaResponse {
    pub ok: bool,
    pub items: Vec<AgendaEntry>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactItem {
    pub id: String,
    pub name: String,
    pub role: String,
    pub phone: String,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactListResponse {
    pub ok: bool,
    pub items: Vec<ContactItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentItem {
    pub id: String,
    pub dog_id: Option<String>,
    pub title: String,
    pub kind: String,
    pub file_url: Option<String>,
    pub expires_on: Option<String>,
    pub notes: Option<String>,
    /// Expired before the device's current date.
    pub is_expired: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentListResponse {
    pub ok: bool,
    pub items: Vec<DocumentItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiaryItem {
    pub id: String,
    pub dog_id: String,
    pub kind: String,
    pub title: String,
    pub notes: Option<String>,
    pub occurred_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiaryListResponse {
    pub ok: bool,
    pub items: Vec<DiaryItem>,
    pub applied_limit: u32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferencesResponse {
    pub ok: bool,
    pub vaccine_reminders: bool,
    pub feeding_reminders: bool,
    pub birthday_reminders: bool,
    pub feeding_interval_hours: u32,
    pub onboarding_completed: bool,
    pub error_code: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncCollectionCount {
    pub collection: String,
    pub rows: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncResponse {
    pub ok: bool,
    pub collections: Vec<SyncCollectionCount>,
    pub total_rows: u32,
    pub message: String,
}

/// One row-level change; views re-fetch the row instead of reading a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeItem {
    pub table: String,
    /// `insert|update|delete|bulk`.
    pub action: String,
    pub record_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangePollResponse {
    pub ok: bool,
    pub items: Vec<ChangeItem>,
    pub message: String,
}

/// Creates or replaces a calendar event.
///
/// Pass `event_id` to edit an existing event. `dog_id`, when set, must belong
/// to the owner.
#[flutter_rust_bridge::frb(sync)]
#[allow(clippy::too_many_arguments)]
pub fn calendar_event_put(
    owner_id: String,
    event_id: Option<String>,
    dog_id: Option<String>,
    title: String,
    category: String,
    date: String,
    time: Option<String>,
    recurrence: Option<String>,
    notes: Option<String>,
    completed: bool,
) -> ActionResponse {
    let result = with_connection(|conn| {
        let owner_id = parse_id("owner_id", &owner_id)?;
        let category = parse_label("category", &category, EventCategory::parse)?;
        let recurrence = match recurrence.as_deref() {
            None => Recurrence::None,
            Some(text) => parse_label("recurrence", text, Recurrence::parse)?,
        };
        let mut event =
            CalendarEvent::new(title, category, parse_date("date", &date)?).repeating(recurrence);
        if let Some(id) = event_id.as_deref() {
            event = event.with_id(parse_id("event_id", id)?)?;
        }
        if let Some(dog_id) = dog_id.as_deref() {
            event = event.for_dog(owned_dog_id(conn, owner_id, dog_id)?);
        }
        if let Some(time) = time {
            event = event.at_time(time);
        }
        event.notes = clean_optional(notes);
        event.completed = completed;
        put_local_item(conn, owner_id, &event)?;
        Ok(event.id)
    });
    match result {
        Ok(id) => ActionResponse::success("Calendar event saved.", id),
        Err(err) => ActionResponse::failure("calendar_event_put", err),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn calendar_event_list(owner_id: String) -> CalendarEventListResponse {
    match list_local_items::<CalendarEvent>(&owner_id) {
        Ok(events) => CalendarEventListResponse {
            ok: true,
            message: format!("Found {} event(s).", events.len()),
            items: events.into_iter().map(to_calendar_event_item).collect(),
        },
        Err(err) => CalendarEventListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("calendar_event_list failed: {}", err.message),
        },
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn calendar_event_delete(owner_id: String, event_id: String) -> ActionResponse {
    match delete_local_item::<CalendarEvent>(&owner_id, "event_id", &event_id) {
        Ok(id) => ActionResponse::success("Calendar event deleted.", id),
        Err(err) => ActionResponse::failure("calendar_event_delete", err),
    }
}

/// Calendar events and vaccine due dates for `from..=to` (`YYYY-MM-DD`), merged and sorted.
#[flutter_rust_bridge::frb(sync)]
pub fn calendar_agenda(owner_id: String, from: String, to: String) -> AgendaResponse {
    let result = with_connection(|conn| {
        let owner_id = parse_id("owner_id", &owner_id)?;
        let from = parse_date("from", &from)?;
        let to = parse_date("to", &to)?;
        if to < from {
            return Err(FfiError::invalid_input(format!(
                "to ({to}) must not be earlier than from ({from})"
            )));
        }
        let events = LocalStore::try_new(conn)?.list::<CalendarEvent>(owner_id)?;
        let dogs = DogService::new(SqliteDogRepository::try_new(conn)?).list_dogs(owner_id)?;
        let vaccine_service = VaccineService::new(SqliteVaccineRepository::try_new(conn)?);
        let mut vaccines = Vec::new();
        for dog in &dogs {
            vaccines.extend(vaccine_service.list_for_dog(dog.id)?);
        }
        Ok(agenda(&events, &vaccines, from, to))
    });
    match result {
        Ok(items) => AgendaResponse {
            ok: true,
            message: format!("{} agenda item(s).", items.len()),
            items: items.into_iter().map(to_agenda_entry).collect(),
        },
        Err(err) => AgendaResponse {
            ok: false,
            items: Vec::new(),
            message: format!("calendar_agenda failed: {}", err.message),
        },
    }
}

/// Creates or replaces an emergency contact; pass `contact_id` to edit.
#[flutter_rust_bridge::frb(sync)]
pub fn contact_put(
    owner_id: String,
    contact_id: Option<String>,
    name: String,
    role: String,
    phone: String,
    address: Option<String>,
    notes: Option<String>,
) -> ActionResponse {
    let result = with_connection(|conn| {
        let owner_id = parse_id("owner_id", &owner_id)?;
        let role = parse_label("role", &role, ContactRole::parse)?;
        let mut contact = EmergencyContact::new(name, role, phone).with_address(address);
        if let Some(id) = contact_id.as_deref() {
            contact = contact.with_id(parse_id("contact_id", id)?)?;
        }
        contact.notes = clean_optional(notes);
        put_local_item(conn, owner_id, &contact)?;
        Ok(contact.id)
    });
    match result {
        Ok(id) => ActionResponse::success("Contact saved.", id),
        Err(err) => ActionResponse::failure("contact_put", err),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn contact_list(owner_id: String) -> ContactListResponse {
    match list_local_items::<EmergencyContact>(&owner_id) {
        Ok(contacts) => ContactListResponse {
            ok: true,
            message: format!("Found {} contact(s).", contacts.len()),
            items: contacts.into_iter().map(to_contact_item).collect(),
        },
        Err(err) => ContactListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("contact_list failed: {}", err.message),
        },
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn contact_delete(owner_id: String, contact_id: String) -> ActionResponse {
    match delete_local_item::<EmergencyContact>(&owner_id, "contact_id", &contact_id) {
        Ok(id) => ActionResponse::success("Contact deleted.", id),
        Err(err) => ActionResponse::failure("contact_delete", err),
    }
}

/// Creates or replaces a dog document; pass `document_id` to edit.
#[flutter_rust_bridge::frb(sync)]
#[allow(clippy::too_many_arguments)]
pub fn document_put(
    owner_id: String,
    document_id: Option<String>,
    dog_id: Option<String>,
    title: String,
    kind: String,
    file_url: Option<String>,
    expires_on: Option<String>,
    notes: Option<String>,
) -> ActionResponse {
    let result = with_connection(|conn| {
        let owner_id = parse_id("owner_id", &owner_id)?;
        let kind = parse_label("kind", &kind, DocumentKind::parse)?;
        let mut document = DogDocument::new(title, kind);
        if let Some(id) = document_id.as_deref() {
            document = document.with_id(parse_id("document_id", id)?)?;
        }
        if let Some(dog_id) = dog_id.as_deref() {
            document.dog_id = Some(owned_dog_id(conn, owner_id, dog_id)?);
        }
        document.file_url = clean_optional(file_url);
        document.expires_on = parse_optional_date("expires_on", expires_on.as_deref())?;
        document.notes = clean_optional(notes);
        put_local_item(conn, owner_id, &document)?;
        Ok(document.id)
    });
    match result {
        Ok(id) => ActionResponse::success("Document saved.", id),
        Err(err) => ActionResponse::failure("document_put", err),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn document_list(owner_id: String) -> DocumentListResponse {
    let today = Local::now().date_naive();
    match list_local_items::<DogDocument>(&owner_id) {
        Ok(documents) => DocumentListResponse {
            ok: true,
            message: format!("Found {} document(s).", documents.len()),
            items: documents
                .into_iter()
                .map(|document| to_document_item(document, today))
                .collect(),
        },
        Err(err) => DocumentListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("document_list failed: {}", err.message),
        },
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn document_delete(owner_id: String, document_id: String) -> ActionResponse {
    match delete_local_item::<DogDocument>(&owner_id, "document_id", &document_id) {
        Ok(id) => ActionResponse::success("Document deleted.", id),
        Err(err) => ActionResponse::failure("document_delete", err),
    }
}

/// Adds a diary entry. `kind` is one of the `DiaryKind` labels (`vet`, `health`, ...).
#[flutter_rust_bridge::frb(sync)]
pub fn diary_log(
    dog_id: String,
    kind: String,
    title: String,
    notes: Option<String>,
    occurred_at_epoch_ms: i64,
) -> ActionResponse {
    let result = with_connection(|conn| {
        let entry = DiaryEntry::new(
            parse_id("dog_id", &dog_id)?,
            parse_label("kind", &kind, DiaryKind::parse)?,
            title,
            occurred_at_epoch_ms,
        )
        .with_notes(notes);
        let service = DiaryService::new(SqliteDiaryRepository::try_new(conn)?)
            .with_change_feed(change_feed());
        Ok(service.add_entry(&entry)?.id)
    });
    match result {
        Ok(id) => ActionResponse::success("Diary entry added.", id),
        Err(err) => ActionResponse::failure("diary_log", err),
    }
}

/// Newest-first diary page, optionally narrowed to one kind.
#[flutter_rust_bridge::frb(sync)]
pub fn diary_list(
    dog_id: String,
    kind: Option<String>,
    limit: Option<u32>,
    offset: Option<u32>,
) -> DiaryListResponse {
    let result = with_connection(|conn| {
        let dog_id = parse_id("dog_id", &dog_id)?;
        let kind = match kind.as_deref() {
            None => None,
            Some(text) => Some(parse_label("kind", text, DiaryKind::parse)?),
        };
        let service = DiaryService::new(SqliteDiaryRepository::try_new(conn)?);
        let query = DiaryListQuery {
            kind,
            limit,
            offset: offset.unwrap_or(0),
        };
        Ok(service.list_entries(dog_id, query)?)
    });
    match result {
        Ok(page) => DiaryListResponse {
            ok: true,
            message: format!("Found {} entr(ies).", page.items.len()),
            items: page.items.into_iter().map(to_diary_item).collect(),
            applied_limit: page.applied_limit,
        },
        Err(err) => DiaryListResponse {
            ok: false,
            items: Vec::new(),
            applied_limit: normalize_diary_limit(limit),
            message: format!("diary_list failed: {}", err.message),
        },
    }
}

/// Stored reminder preferences, or the defaults when none were saved.
#[flutter_rust_bridge::frb(sync)]
pub fn preferences_get(owner_id: String) -> PreferencesResponse {
    let result = with_connection(|conn| {
        let owner_id = parse_id("owner_id", &owner_id)?;
        AccountService::new(SqliteOwnerRepository::try_new(conn)?).get_owner(owner_id)?;
        Ok(PreferencesService::new(SqlitePreferencesRepository::try_new(conn)?).get(owner_id)?)
    });
    to_preferences_response("preferences_get", result)
}

/// Partial preferences update; `None` keeps the stored value.
#[flutter_rust_bridge::frb(sync)]
pub fn preferences_update(
    owner_id: String,
    vaccine_reminders: Option<bool>,
    feeding_reminders: Option<bool>,
    birthday_reminders: Option<bool>,
    feeding_interval_hours: Option<u32>,
) -> PreferencesResponse {
    let result = with_connection(|conn| {
        let owner_id = parse_id("owner_id", &owner_id)?;
        AccountService::new(SqliteOwnerRepository::try_new(conn)?).get_owner(owner_id)?;
        let service = PreferencesService::new(SqlitePreferencesRepository::try_new(conn)?)
            .with_change_feed(change_feed());
        let update = PreferencesUpdate {
            vaccine_reminders,
            feeding_reminders,
            birthday_reminders,
            feeding_interval_hours,
        };
        Ok(service.update(owner_id, update)?)
    });
    to_preferences_response("preferences_update", result)
}

/// Uploads the owner's local collections, overwriting the remote copy.
#[flutter_rust_bridge::frb(sync)]
pub fn sync_push(owner_id: String) -> SyncResponse {
    run_sync(SyncDirection::Push, &owner_id)
}

/// Replaces the owner's local collections with the remote copy.
#[flutter_rust_bridge::frb(sync)]
pub fn sync_pull(owner_id: String) -> SyncResponse {
    run_sync(SyncDirection::Pull, &owner_id)
}

/// Opens a change subscription scoped to one owner.
///
/// `tables` holds table names (`dogs`, `feeding_records`, `local_items`, ...);
/// empty subscribes to every table. The returned `id` is the subscription id.
#[flutter_rust_bridge::frb(sync)]
pub fn changes_subscribe(owner_id: String, tables: Vec<String>) -> ActionResponse {
    match subscribe_changes(&owner_id, &tables) {
        Ok(id) => ActionResponse::success("Subscribed to changes.", id),
        Err(err) => ActionResponse::failure("changes_subscribe", err),
    }
}

/// Drains up to `max_events` (default 100, max 500) pending changes.
#[flutter_rust_bridge::frb(sync)]
pub fn changes_poll(subscription_id: String, max_events: Option<u32>) -> ChangePollResponse {
    match poll_changes(&subscription_id, max_events) {
        Ok(events) => ChangePollResponse {
            ok: true,
            message: format!("{} change(s).", events.len()),
            items: events.into_iter().map(to_change_item).collect(),
        },
        Err(err) => ChangePollResponse {
            ok: false,
            items: Vec::new(),
            message: format!("changes_poll failed: {}", err.message),
        },
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn changes_unsubscribe(subscription_id: String) -> ActionResponse {
    let result = parse_subscription_id(&subscription_id).and_then(|id| {
        subscriptions()
            .remove(&id)
            .map(|_| id)
            .ok_or_else(|| FfiError::unknown_subscription(id))
    });
    match result {
        Ok(id) => ActionResponse::success("Unsubscribed.", id),
        Err(err) => ActionResponse::failure("changes_unsubscribe", err),
    }
}

/// Flattened failure carried into envelopes.
struct FfiError {
    code: &'static str,
    message: String,
}

impl FfiError {
    fn invalid_input(message: String) -> Self {
        Self {
            code: "invalid_input",
            message,
        }
    }

    fn unknown_subscription(id: u64) -> Self {
        Self {
            code: "not_found",
            message: format!("subscription {id} not found"),
        }
    }
}

impl From<meevi_core::ServiceError> for FfiError {
    fn from(value: meevi_core::ServiceError) -> Self {
        Self {
            code: value.code(),
            message: value.to_string(),
        }
    }
}

impl From<meevi_core::RepoError> for FfiError {
    fn from(value: meevi_core::RepoError) -> Self {
        meevi_core::ServiceError::from(value).into()
    }
}

impl From<ValidationError> for FfiError {
    fn from(value: ValidationError) -> Self {
        meevi_core::ServiceError::from(value).into()
    }
}

impl From<SyncError> for FfiError {
    fn from(value: SyncError) -> Self {
        Self {
            code: "sync_failed",
            message: value.to_string(),
        }
    }
}

impl From<meevi_core::DbError> for FfiError {
    fn from(value: meevi_core::DbError) -> Self {
        Self {
            code: value.code(),
            message: value.to_string(),
        }
    }
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn with_connection<T>(f: impl FnOnce(&Connection) -> Result<T, FfiError>) -> Result<T, FfiError> {
    let conn = open_db(resolve_db_path())?;
    f(&conn)
}

fn care_service(conn: &Connection) -> Result<CareService<SqliteCareRepository<'_>>, FfiError> {
    Ok(CareService::new(SqliteCareRepository::try_new(conn)?).with_change_feed(change_feed()))
}

fn load_dog(conn: &Connection, dog_id: &str) -> Result<Dog, FfiError> {
    let dog_id = parse_id("dog_id", dog_id)?;
    Ok(DogService::new(SqliteDogRepository::try_new(conn)?).get_dog(dog_id)?)
}

fn parse_id(field: &str, value: &str) -> Result<Uuid, FfiError> {
    Uuid::parse_str(value.trim())
        .map_err(|_| FfiError::invalid_input(format!("{field} must be a UUID, got `{value}`")))
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, FfiError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        FfiError::invalid_input(format!("{field} must be YYYY-MM-DD, got `{value}`"))
    })
}

fn parse_optional_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, FfiError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => parse_date(field, text).map(Some),
    }
}

fn to_dog_item(dog: Dog) -> DogItem {
    DogItem {
        id: dog.id.to_string(),
        name: dog.name,
        breed: dog.breed,
        birth_date: dog.birth_date.map(format_date),
        weight_kg: dog.weight_kg,
        photo_url: dog.photo_url,
    }
}

fn to_notification_item(notification: Notification) -> NotificationItem {
    NotificationItem {
        id: notification.id.to_string(),
        dog_id: notification.dog_id.map(|id| id.to_string()),
        kind: notification.kind.as_str().to_string(),
        title: notification.title,
        message: notification.message,
        is_read: notification.is_read,
        created_at: notification.created_at,
    }
}

fn to_schedule_entry(item: &ScheduleItem) -> ScheduleEntry {
    ScheduleEntry {
        name: item.name.to_string(),
        age_months: item.age_months,
        description: item.description.to_string(),
        due_date: item.due_date.map(format_date),
        status: match item.status {
            meevi_core::schedule::VaccineStatus::Completed => "completed",
            meevi_core::schedule::VaccineStatus::Overdue => "overdue",
            meevi_core::schedule::VaccineStatus::Upcoming => "upcoming",
        }
        .to_string(),
    }
}

fn change_feed() -> Arc<ChangeFeed> {
    Arc::clone(CHANGE_FEED.get_or_init(|| Arc::new(ChangeFeed::new())))
}

fn subscriptions() -> MutexGuard<'static, HashMap<u64, Subscription>> {
    SUBSCRIPTIONS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

fn subscribe_changes(owner_id: &str, tables: &[String]) -> Result<u64, FfiError> {
    let owner_id = parse_id("owner_id", owner_id)?;
    let tables = tables
        .iter()
        .map(|table| parse_label("tables", table, ChangeTable::parse))
        .collect::<Result<Vec<_>, _>>()?;
    let subscription = change_feed().subscribe(ChangeFilter::tables(tables).owner(owner_id));
    let id = NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed);
    subscriptions().insert(id, subscription);
    Ok(id)
}

fn poll_changes(
    subscription_id: &str,
    max_events: Option<u32>,
) -> Result<Vec<ChangeEvent>, FfiError> {
    let id = parse_subscription_id(subscription_id)?;
    let max_events = max_events
        .unwrap_or(DEFAULT_POLL_EVENTS)
        .clamp(1, MAX_POLL_EVENTS) as usize;
    let registry = subscriptions();
    let subscription = registry
        .get(&id)
        .ok_or_else(|| FfiError::unknown_subscription(id))?;
    let events = subscription.try_iter().take(max_events).collect();
    Ok(events)
}

fn parse_subscription_id(value: &str) -> Result<u64, FfiError> {
    value.trim().parse().map_err(|_| {
        FfiError::invalid_input(format!("subscription_id must be a number, got `{value}`"))
    })
}

fn list_local_items<T: LocalItem>(owner_id: &str) -> Result<Vec<T>, FfiError> {
    with_connection(|conn| {
        let owner_id = parse_id("owner_id", owner_id)?;
        Ok(LocalStore::try_new(conn)?.list::<T>(owner_id)?)
    })
}

fn put_local_item<T: LocalItem>(
    conn: &Connection,
    owner_id: Uuid,
    item: &T,
) -> Result<(), FfiError> {
    AccountService::new(SqliteOwnerRepository::try_new(conn)?).get_owner(owner_id)?;
    let store = LocalStore::try_new(conn)?;
    let action = match store.get::<T>(owner_id, item.item_id())? {
        Some(_) => ChangeAction::Update,
        None => ChangeAction::Insert,
    };
    store.put(owner_id, item)?;
    change_feed().publish(
        ChangeEvent::new(ChangeTable::LocalItems, action, item.item_id()).for_owner(owner_id),
    );
    Ok(())
}

fn delete_local_item<T: LocalItem>(
    owner_id: &str,
    id_field: &str,
    item_id: &str,
) -> Result<Uuid, FfiError> {
    with_connection(|conn| {
        let owner_id = parse_id("owner_id", owner_id)?;
        let item_id = parse_id(id_field, item_id)?;
        LocalStore::try_new(conn)?.delete::<T>(owner_id, item_id)?;
        change_feed().publish(
            ChangeEvent::new(ChangeTable::LocalItems, ChangeAction::Delete, item_id)
                .for_owner(owner_id),
        );
        Ok(item_id)
    })
}

fn owned_dog_id(conn: &Connection, owner_id: Uuid, dog_id: &str) -> Result<Uuid, FfiError> {
    let dog = load_dog(conn, dog_id)?;
    if dog.owner_id != owner_id {
        return Err(FfiError::invalid_input(format!(
            "dog {} does not belong to owner {owner_id}",
            dog.id
        )));
    }
    Ok(dog.id)
}

fn run_sync(direction: SyncDirection, owner_id: &str) -> SyncResponse {
    let op = match direction {
        SyncDirection::Push => "sync_push",
        SyncDirection::Pull => "sync_pull",
    };
    let result = with_connection(|conn| {
        let owner_id = parse_id("owner_id", owner_id)?;
        let remote = SqliteRemoteStore::try_new(open_db(resolve_remote_db_path())?)?;
        let service = CloudSyncService::new(LocalStore::try_new(conn)?, remote);
        let report = match direction {
            SyncDirection::Push => service.push(owner_id)?,
            SyncDirection::Pull => {
                let report = service.pull(owner_id)?;
                change_feed().publish(
                    ChangeEvent::new(ChangeTable::LocalItems, ChangeAction::Bulk, owner_id)
                        .for_owner(owner_id),
                );
                report
            }
        };
        Ok(report)
    });
    match result {
        Ok(report) => SyncResponse {
            ok: true,
            message: format!("{} {} row(s).", direction.as_str(), report.total_rows()),
            total_rows: saturating_u32(report.total_rows()),
            collections: report
                .collections
                .iter()
                .map(|(collection, rows)| SyncCollectionCount {
                    collection: collection.as_str().to_string(),
                    rows: saturating_u32(*rows),
                })
                .collect(),
        },
        Err(err) => {
            warn!("event=ffi_call module=ffi status=error op={op} code={}", err.code);
            SyncResponse {
                ok: false,
                collections: Vec::new(),
                total_rows: 0,
                message: format!("{op} failed: {}", err.message),
            }
        }
    }
}

fn resolve_remote_db_path() -> PathBuf {
    REMOTE_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(REMOTE_DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(REMOTE_DB_FILE_NAME)
        })
        .clone()
}

fn saturating_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn parse_label<T>(field: &str, value: &str, parse: fn(&str) -> Option<T>) -> Result<T, FfiError> {
    parse(value).ok_or_else(|| FfiError::invalid_input(format!("unknown {field} `{value}`")))
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn to_calendar_event_item(event: CalendarEvent) -> CalendarEventItem {
    CalendarEventItem {
        id: event.id.to_string(),
        dog_id: event.dog_id.map(|id| id.to_string()),
        title: event.title,
        category: event.category.as_str().to_string(),
        date: format_date(event.date),
        time: event.time,
        recurrence: event.recurrence.as_str().to_string(),
        notes: event.notes,
        completed: event.completed,
    }
}

fn to_agenda_entry(item: AgendaItem) -> AgendaEntry {
    AgendaEntry {
        date: format_date(item.date),
        time: item.time,
        title: item.title,
        category: item.category.as_str().to_string(),
        dog_id: item.dog_id.map(|id| id.to_string()),
        source: match item.source {
            AgendaSource::Event => "event",
            AgendaSource::VaccineDue => "vaccine_due",
        }
        .to_string(),
        source_id: item.source_id.to_string(),
        completed: item.completed,
    }
}

fn to_contact_item(contact: EmergencyContact) -> ContactItem {
    ContactItem {
        id: contact.id.to_string(),
        name: contact.name,
        role: contact.role.as_str().to_string(),
        phone: contact.phone,
        address: contact.address,
        notes: contact.notes,
    }
}

fn to_document_item(document: DogDocument, today: NaiveDate) -> DocumentItem {
    DocumentItem {
        is_expired: document.is_expired(today),
        id: document.id.to_string(),
        dog_id: document.dog_id.map(|id| id.to_string()),
        title: document.title,
        kind: document.kind.as_str().to_string(),
        file_url: document.file_url,
        expires_on: document.expires_on.map(format_date),
        notes: document.notes,
    }
}

fn to_diary_item(entry: DiaryEntry) -> DiaryItem {
    DiaryItem {
        id: entry.id.to_string(),
        dog_id: entry.dog_id.to_string(),
        kind: entry.kind.as_str().to_string(),
        title: entry.title,
        notes: entry.notes,
        occurred_at: entry.occurred_at,
    }
}

fn to_preferences_response(
    op: &str,
    result: Result<UserPreferences, FfiError>,
) -> PreferencesResponse {
    match result {
        Ok(preferences) => PreferencesResponse {
            ok: true,
            vaccine_reminders: preferences.vaccine_reminders,
            feeding_reminders: preferences.feeding_reminders,
            birthday_reminders: preferences.birthday_reminders,
            feeding_interval_hours: preferences.feeding_interval_hours,
            onboarding_completed: preferences.onboarding_completed,
            error_code: None,
            message: String::new(),
        },
        Err(err) => {
            warn!("event=ffi_call module=ffi status=error op={op} code={}", err.code);
            PreferencesResponse {
                ok: false,
                vaccine_reminders: false,
                feeding_reminders: false,
                birthday_reminders: false,
                feeding_interval_hours: 0,
                onboarding_completed: false,
                error_code: Some(err.code.to_string()),
                message: format!("{op} failed: {}", err.message),
            }
        }
    }
}

fn to_change_item(event: ChangeEvent) -> ChangeItem {
    ChangeItem {
        table: event.table.as_str().to_string(),
        action: event.action.as_str().to_string(),
        record_id: event.record_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        bath_log, calendar_agenda, calendar_event_delete, calendar_event_list,
        calendar_event_put, changes_poll, changes_subscribe, changes_unsubscribe, contact_delete,
        contact_list, contact_put, core_version, diary_list, diary_log, document_list,
        document_put, dog_create, dog_list, dog_stats, exercise_log, feeding_log, init_logging,
        notification_mark_read, notifications_check, notifications_list, onboarding_complete,
        owner_register, ping, preferences_get, preferences_update, sync_pull, sync_push,
        vaccination_schedule, vaccine_record,
    };
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_email(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}@example.com")
    }

    fn registered_owner(prefix: &str) -> String {
        let response = owner_register(unique_email(prefix), None);
        assert!(response.ok, "{}", response.message);
        response.id.expect("owner id")
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_bad_input() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
        assert!(!init_logging("verbose".to_string(), "/tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn dog_create_then_list_and_onboard() {
        let owner_id = registered_owner("dogs");

        let early = onboarding_complete(owner_id.clone());
        assert!(!early.ok);
        assert_eq!(early.error_code.as_deref(), Some("onboarding_requires_dog"));

        let created = dog_create(
            owner_id.clone(),
            "Rex".to_string(),
            Some("Beagle".to_string()),
            Some("2022-03-04".to_string()),
            Some(11.0),
        );
        assert!(created.ok, "{}", created.message);

        let listed = dog_list(owner_id.clone());
        assert!(listed.ok);
        assert_eq!(listed.items.len(), 1);
        assert_eq!(listed.items[0].birth_date.as_deref(), Some("2022-03-04"));

        assert!(onboarding_complete(owner_id).ok);
    }

    #[test]
    fn malformed_ids_and_dates_fail_without_panicking() {
        let response = dog_create("nope".to_string(), "Rex".to_string(), None, None, None);
        assert!(!response.ok);
        assert_eq!(response.error_code.as_deref(), Some("invalid_input"));

        let owner_id = registered_owner("dates");
        let bad_date = dog_create(
            owner_id,
            "Rex".to_string(),
            None,
            Some("04/03/2022".to_string()),
            None,
        );
        assert!(!bad_date.ok);
        assert!(bad_date.message.contains("birth_date"));
    }

    #[test]
    fn notifications_check_creates_feeding_reminder_once() {
        let owner_id = registered_owner("notify");
        let dog_id = dog_create(owner_id.clone(), "Pip".to_string(), None, None, None)
            .id
            .expect("dog id");

        let first = notifications_check(owner_id.clone());
        assert!(first.ok, "{}", first.message);
        assert_eq!(first.created.len(), 1);
        assert_eq!(first.created[0].kind, "feeding");
        assert_eq!(first.created[0].dog_id.as_deref(), Some(dog_id.as_str()));

        let second = notifications_check(owner_id.clone());
        assert!(second.created.is_empty());
        assert_eq!(second.skipped_duplicates, 1);

        let inbox = notifications_list(owner_id.clone(), true, Some(500));
        assert_eq!(inbox.applied_limit, 200);
        assert_eq!(inbox.unread_count, 1);

        assert!(notification_mark_read(inbox.items[0].id.clone()).ok);
        assert_eq!(notifications_list(owner_id, true, None).unread_count, 0);
    }

    #[test]
    fn notifications_check_rejects_unknown_owner() {
        let response = notifications_check(uuid::Uuid::new_v4().to_string());
        assert!(!response.ok);
        assert!(response.message.contains("not found"));
    }

    #[test]
    fn schedule_and_stats_reflect_logged_care() {
        let owner_id = registered_owner("stats");
        let dog_id = dog_create(owner_id, "Bo".to_string(), None, None, None)
            .id
            .expect("dog id");

        let now = meevi_core::clock::now_epoch_ms();
        assert!(feeding_log(dog_id.clone(), "Kibble".to_string(), Some(150.0), now).ok);
        assert!(exercise_log(dog_id.clone(), "Walk".to_string(), 25, Some(1.5), now).ok);
        assert!(!exercise_log(dog_id.clone(), "Walk".to_string(), 0, None, now).ok);
        assert!(vaccine_record(
            dog_id.clone(),
            "Rabies".to_string(),
            "2024-01-01".to_string(),
            Some("2025-01-01".to_string()),
            None
        )
        .ok);

        let schedule = vaccination_schedule(dog_id.clone());
        assert!(schedule.ok, "{}", schedule.message);
        assert_eq!(schedule.items.len(), 8);
        assert_eq!(schedule.completed, 1);
        assert_eq!(schedule.overdue, 0);

        let stats = dog_stats(dog_id, Some(7));
        assert!(stats.ok, "{}", stats.message);
        assert_eq!(stats.window_days, 7);
        assert_eq!(stats.feedings, 1);
        assert_eq!(stats.exercise_minutes, 25);
    }

    fn owner_with_dog(prefix: &str, dog_name: &str) -> (String, String) {
        let owner_id = registered_owner(prefix);
        let dog_id = dog_create(owner_id.clone(), dog_name.to_string(), None, None, None)
            .id
            .expect("dog id");
        (owner_id, dog_id)
    }

    #[test]
    fn calendar_events_merge_with_vaccine_due_dates() {
        let (owner_id, dog_id) = owner_with_dog("calendar", "Luna");
        assert!(vaccine_record(
            dog_id.clone(),
            "Rabies".to_string(),
            "2023-05-10".to_string(),
            Some("2024-05-10".to_string()),
            None
        )
        .ok);

        let saved = calendar_event_put(
            owner_id.clone(),
            None,
            Some(dog_id.clone()),
            "Flea pill".to_string(),
            "medication".to_string(),
            "2024-04-15".to_string(),
            Some("08:30".to_string()),
            Some("monthly".to_string()),
            None,
            false,
        );
        assert!(saved.ok, "{}", saved.message);
        let event_id = saved.id.expect("event id");

        let listed = calendar_event_list(owner_id.clone());
        assert_eq!(listed.items.len(), 1);
        assert_eq!(listed.items[0].recurrence, "monthly");

        let agenda = calendar_agenda(
            owner_id.clone(),
            "2024-05-01".to_string(),
            "2024-05-31".to_string(),
        );
        assert!(agenda.ok, "{}", agenda.message);
        let sources: Vec<_> = agenda
            .items
            .iter()
            .map(|item| (item.date.as_str(), item.source.as_str()))
            .collect();
        assert_eq!(
            sources,
            vec![("2024-05-10", "vaccine_due"), ("2024-05-15", "event")]
        );

        let reversed = calendar_agenda(
            owner_id.clone(),
            "2024-05-31".to_string(),
            "2024-05-01".to_string(),
        );
        assert!(!reversed.ok);

        assert!(calendar_event_delete(owner_id.clone(), event_id.clone()).ok);
        assert!(calendar_event_list(owner_id.clone()).items.is_empty());
        let again = calendar_event_delete(owner_id, event_id);
        assert_eq!(again.error_code.as_deref(), Some("not_found"));
    }

    #[test]
    fn calendar_event_rejects_unknown_category_and_foreign_dog() {
        let (owner_id, _) = owner_with_dog("cal-owner", "Ace");
        let (_, other_dog) = owner_with_dog("cal-other", "Max");

        let bad_category = calendar_event_put(
            owner_id.clone(),
            None,
            None,
            "Party".to_string(),
            "party".to_string(),
            "2024-04-15".to_string(),
            None,
            None,
            None,
            false,
        );
        assert_eq!(bad_category.error_code.as_deref(), Some("invalid_input"));

        let foreign = calendar_event_put(
            owner_id,
            None,
            Some(other_dog),
            "Walk".to_string(),
            "other".to_string(),
            "2024-04-15".to_string(),
            None,
            None,
            None,
            false,
        );
        assert!(!foreign.ok);
        assert!(foreign.message.contains("does not belong"));
    }

    #[test]
    fn contacts_are_replaced_by_id_and_documents_report_expiry() {
        let (owner_id, dog_id) = owner_with_dog("essentials", "Odie");

        let first = contact_put(
            owner_id.clone(),
            None,
            "Dr. Vet".to_string(),
            "veterinarian".to_string(),
            "+1 555 0100".to_string(),
            None,
            None,
        );
        assert!(first.ok, "{}", first.message);
        let contact_id = first.id.expect("contact id");
        let edited = contact_put(
            owner_id.clone(),
            Some(contact_id.clone()),
            "Dr. Vera".to_string(),
            "veterinarian".to_string(),
            "+1 555 0100".to_string(),
            Some("  ".to_string()),
            None,
        );
        assert!(edited.ok, "{}", edited.message);
        let contacts = contact_list(owner_id.clone());
        assert_eq!(contacts.items.len(), 1);
        assert_eq!(contacts.items[0].name, "Dr. Vera");
        assert_eq!(contacts.items[0].address, None);

        let bad_phone = contact_put(
            owner_id.clone(),
            None,
            "Sitter".to_string(),
            "sitter".to_string(),
            "call me".to_string(),
            None,
            None,
        );
        assert_eq!(bad_phone.error_code.as_deref(), Some("validation_failed"));

        assert!(document_put(
            owner_id.clone(),
            None,
            Some(dog_id),
            "Insurance".to_string(),
            "insurance".to_string(),
            None,
            Some("2020-01-01".to_string()),
            None,
        )
        .ok);
        let documents = document_list(owner_id.clone());
        assert_eq!(documents.items.len(), 1);
        assert!(documents.items[0].is_expired);

        assert!(contact_delete(owner_id.clone(), contact_id).ok);
        assert!(contact_list(owner_id).items.is_empty());
    }

    #[test]
    fn diary_entries_filter_by_kind() {
        let (_, dog_id) = owner_with_dog("diary", "Rufus");
        let now = meevi_core::clock::now_epoch_ms();

        assert!(diary_log(dog_id.clone(), "vet".to_string(), "Checkup".to_string(), None, now).ok);
        let bath = diary_log(dog_id.clone(), "bath".to_string(), "Bath".to_string(), None, now - 1);
        assert!(bath.ok, "{}", bath.message);
        let unknown = diary_log(dog_id.clone(), "party".to_string(), "Cake".to_string(), None, now);
        assert_eq!(unknown.error_code.as_deref(), Some("invalid_input"));

        let all = diary_list(dog_id.clone(), None, Some(0), None);
        assert!(all.ok, "{}", all.message);
        assert_eq!(all.items.len(), 2);
        assert_eq!(all.items[0].title, "Checkup");

        let vet_only = diary_list(dog_id, Some("vet".to_string()), None, None);
        assert_eq!(vet_only.items.len(), 1);
        assert_eq!(vet_only.applied_limit, 20);
    }

    #[test]
    fn preferences_update_keeps_unset_fields() {
        let owner_id = registered_owner("prefs");

        let defaults = preferences_get(owner_id.clone());
        assert!(defaults.ok, "{}", defaults.message);
        assert!(defaults.birthday_reminders);
        assert_eq!(defaults.feeding_interval_hours, 3);

        let updated = preferences_update(owner_id.clone(), None, None, Some(false), Some(6));
        assert!(updated.ok, "{}", updated.message);
        assert!(updated.vaccine_reminders);
        assert!(!updated.birthday_reminders);
        assert_eq!(preferences_get(owner_id.clone()).feeding_interval_hours, 6);

        let too_long = preferences_update(owner_id, None, None, None, Some(48));
        assert_eq!(too_long.error_code.as_deref(), Some("validation_failed"));

        let unknown = preferences_get(uuid::Uuid::new_v4().to_string());
        assert_eq!(unknown.error_code.as_deref(), Some("not_found"));
    }

    #[test]
    fn pull_restores_pushed_local_items() {
        let owner_id = registered_owner("sync");
        let contact_id = contact_put(
            owner_id.clone(),
            None,
            "Clinic".to_string(),
            "emergency_clinic".to_string(),
            "+1 555 0199".to_string(),
            None,
            None,
        )
        .id
        .expect("contact id");

        let pushed = sync_push(owner_id.clone());
        assert!(pushed.ok, "{}", pushed.message);
        assert_eq!(pushed.total_rows, 1);

        assert!(contact_delete(owner_id.clone(), contact_id.clone()).ok);
        let pulled = sync_pull(owner_id.clone());
        assert!(pulled.ok, "{}", pulled.message);
        assert_eq!(pulled.total_rows, 1);

        let contacts = contact_list(owner_id);
        assert_eq!(contacts.items.len(), 1);
        assert_eq!(contacts.items[0].id, contact_id);
    }

    #[test]
    fn change_subscription_sees_only_its_owner() {
        let (owner_id, dog_id) = owner_with_dog("changes", "Bean");
        let (_, other_dog) = owner_with_dog("changes-other", "Moss");

        let subscribed = changes_subscribe(owner_id.clone(), vec!["feeding_records".to_string()]);
        assert!(subscribed.ok, "{}", subscribed.message);
        let subscription_id = subscribed.id.expect("subscription id");

        let now = meevi_core::clock::now_epoch_ms();
        assert!(feeding_log(other_dog, "Kibble".to_string(), None, now).ok);
        let fed = feeding_log(dog_id.clone(), "Kibble".to_string(), None, now);
        assert!(bath_log(dog_id.clone(), now, None).ok);

        let polled = changes_poll(subscription_id.clone(), None);
        assert!(polled.ok, "{}", polled.message);
        assert_eq!(polled.items.len(), 1);
        assert_eq!(polled.items[0].action, "insert");
        assert_eq!(Some(polled.items[0].record_id.clone()), fed.id);
        assert!(changes_poll(subscription_id.clone(), None).items.is_empty());

        assert!(changes_unsubscribe(subscription_id.clone()).ok);
        assert!(!changes_poll(subscription_id, None).ok);

        let bad_table = changes_subscribe(owner_id, vec!["cats".to_string()]);
        assert_eq!(bad_table.error_code.as_deref(), Some("invalid_input"));
    }
}
