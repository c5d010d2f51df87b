//! Worker domain model
//!
//! A `Worker` is a tracked call-center staff member. Sub-records have
//! distinct owners:
//! - `checklist` changes one key at a time
//! - `stats` is replaced wholesale by call-stats sync
//! - `payment_info` changes only through manual updates
//! - `notes` only ever grows
//!
//! JSON field names are camelCase; the persisted file and the HTTP API
//! share this representation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::time;

/// Default hourly rate for newly created workers
pub const DEFAULT_HOURLY_RATE: f64 = 160.0;

/// Default commission for newly created workers
pub const DEFAULT_COMMISSION_RATE: f64 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerRole {
    #[default]
    Caller,
    Admin,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerStatus {
    Active,
    Inactive,
    #[default]
    Onboarding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Bank,
    Other,
}

/// Fixed set of onboarding tasks
///
/// Every key is always present. `#[serde(default)]` fills keys missing from
/// an older data file with `false` so a record is never partial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Checklist {
    pub contract_sent: bool,
    pub contract_signed: bool,
    pub one_week_meeting: bool,
    pub two_week_meeting: bool,
    pub monthly_review: bool,
    pub training_completed: bool,
    pub system_access_granted: bool,
    pub welcome_email_sent: bool,
    pub bank_details_received: bool,
    pub tax_form_received: bool,
}

/// Name of a single checklist item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChecklistKey {
    ContractSent,
    ContractSigned,
    OneWeekMeeting,
    TwoWeekMeeting,
    MonthlyReview,
    TrainingCompleted,
    SystemAccessGranted,
    WelcomeEmailSent,
    BankDetailsReceived,
    TaxFormReceived,
}

impl ChecklistKey {
    /// Parse from the camelCase key used over HTTP
    pub fn from_str(s: &str) -> Option<Self> {
        Self::all_variants()
            .iter()
            .copied()
            .find(|key| key.as_str() == s)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChecklistKey::ContractSent => "contractSent",
            ChecklistKey::ContractSigned => "contractSigned",
            ChecklistKey::OneWeekMeeting => "oneWeekMeeting",
            ChecklistKey::TwoWeekMeeting => "twoWeekMeeting",
            ChecklistKey::MonthlyReview => "monthlyReview",
            ChecklistKey::TrainingCompleted => "trainingCompleted",
            ChecklistKey::SystemAccessGranted => "systemAccessGranted",
            ChecklistKey::WelcomeEmailSent => "welcomeEmailSent",
            ChecklistKey::BankDetailsReceived => "bankDetailsReceived",
            ChecklistKey::TaxFormReceived => "taxFormReceived",
        }
    }

    pub fn all_variants() -> &'static [ChecklistKey] {
        &[
            ChecklistKey::ContractSent,
            ChecklistKey::ContractSigned,
            ChecklistKey::OneWeekMeeting,
            ChecklistKey::TwoWeekMeeting,
            ChecklistKey::MonthlyReview,
            ChecklistKey::TrainingCompleted,
            ChecklistKey::SystemAccessGranted,
            ChecklistKey::WelcomeEmailSent,
            ChecklistKey::BankDetailsReceived,
            ChecklistKey::TaxFormReceived,
        ]
    }
}

impl std::fmt::Display for ChecklistKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Checklist {
    pub fn get(&self, key: ChecklistKey) -> bool {
        match key {
            ChecklistKey::ContractSent => self.contract_sent,
            ChecklistKey::ContractSigned => self.contract_signed,
            ChecklistKey::OneWeekMeeting => self.one_week_meeting,
            ChecklistKey::TwoWeekMeeting => self.two_week_meeting,
            ChecklistKey::MonthlyReview => self.monthly_review,
            ChecklistKey::TrainingCompleted => self.training_completed,
            ChecklistKey::SystemAccessGranted => self.system_access_granted,
            ChecklistKey::WelcomeEmailSent => self.welcome_email_sent,
            ChecklistKey::BankDetailsReceived => self.bank_details_received,
            ChecklistKey::TaxFormReceived => self.tax_form_received,
        }
    }

    pub fn set(&mut self, key: ChecklistKey, value: bool) {
        let slot = match key {
            ChecklistKey::ContractSent => &mut self.contract_sent,
            ChecklistKey::ContractSigned => &mut self.contract_signed,
            ChecklistKey::OneWeekMeeting => &mut self.one_week_meeting,
            ChecklistKey::TwoWeekMeeting => &mut self.two_week_meeting,
            ChecklistKey::MonthlyReview => &mut self.monthly_review,
            ChecklistKey::TrainingCompleted => &mut self.training_completed,
            ChecklistKey::SystemAccessGranted => &mut self.system_access_granted,
            ChecklistKey::WelcomeEmailSent => &mut self.welcome_email_sent,
            ChecklistKey::BankDetailsReceived => &mut self.bank_details_received,
            ChecklistKey::TaxFormReceived => &mut self.tax_form_received,
        };
        *slot = value;
    }

    /// Number of completed items
    pub fn completed(&self) -> usize {
        ChecklistKey::all_variants()
            .iter()
            .filter(|key| self.get(**key))
            .count()
    }
}

/// Raw call counts produced by call-stats sync
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsCounts {
    pub total_calls: u64,
    pub meetings_booked: u64,
    /// Hours on the phone, one decimal place
    pub hours_called: f64,
}

/// Call-performance statistics for a worker
///
/// Construct through [`CallStats::from_counts`] so the conversion rate is
/// always derived from the counts.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CallStats {
    pub total_calls: u64,
    pub meetings_booked: u64,
    pub hours_called: f64,
    /// Meetings per call in percent, one decimal place
    pub conversion_rate: f64,
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl CallStats {
    pub fn from_counts(counts: StatsCounts, synced_at: Option<DateTime<Utc>>) -> Self {
        Self {
            total_calls: counts.total_calls,
            meetings_booked: counts.meetings_booked,
            hours_called: counts.hours_called,
            conversion_rate: conversion_rate(counts.meetings_booked, counts.total_calls),
            last_synced_at: synced_at,
        }
    }
}

/// Meetings / calls × 100 rounded to one decimal; 0 when there are no calls
pub fn conversion_rate(meetings: u64, total_calls: u64) -> f64 {
    if total_calls == 0 {
        return 0.0;
    }
    round_one_decimal(meetings as f64 / total_calls as f64 * 100.0)
}

pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInfo {
    pub hourly_rate: f64,
    pub commission_rate: f64,
    pub total_owed: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_payment_date: Option<NaiveDate>,
    pub next_payday: NaiveDate,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_account: Option<String>,
}

impl PaymentInfo {
    /// Default payment schedule for a new worker
    pub fn new_schedule(hourly_rate: f64, commission_rate: f64, today: NaiveDate) -> Self {
        Self {
            hourly_rate,
            commission_rate,
            total_owed: 0.0,
            last_payment_date: None,
            next_payday: time::next_payday(today),
            payment_method: PaymentMethod::Bank,
            bank_account: None,
        }
    }
}

/// Free-text note on a worker; never edited once appended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub content: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
}

impl Note {
    pub fn new(content: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            author: author.into(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Worker {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: WorkerRole,
    pub status: WorkerStatus,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Directory user id; set only for workers seen by directory sync
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_id: Option<String>,
    #[serde(default)]
    pub checklist: Checklist,
    #[serde(default)]
    pub stats: CallStats,
    pub payment_info: PaymentInfo,
    #[serde(default)]
    pub notes: Vec<Note>,
    pub created_at: NaiveDate,
    pub updated_at: NaiveDate,
}

impl Worker {
    /// Build a fresh worker with a new id, default checklist, zeroed stats
    /// and the default payment schedule
    pub fn create(input: NewWorker, today: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            email: input.email.trim().to_string(),
            phone: input.phone,
            role: input.role.unwrap_or_default(),
            status: input.status.unwrap_or_default(),
            start_date: input.start_date.unwrap_or(today),
            avatar_url: None,
            foreign_id: input.foreign_id,
            checklist: Checklist::default(),
            stats: CallStats::default(),
            payment_info: PaymentInfo::new_schedule(
                input.hourly_rate.unwrap_or(DEFAULT_HOURLY_RATE),
                input.commission_rate.unwrap_or(DEFAULT_COMMISSION_RATE),
                today,
            ),
            notes: Vec::new(),
            created_at: today,
            updated_at: today,
        }
    }

    /// Case-insensitive email comparison (emails are the natural key)
    pub fn has_email(&self, email: &str) -> bool {
        emails_match(&self.email, email)
    }

    /// Shallow merge of a partial update
    ///
    /// Nested records (`checklist`, `paymentInfo`) are replaced whole.
    pub fn apply_patch(&mut self, patch: WorkerPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(email) = patch.email {
            self.email = email.trim().to_string();
        }
        if let Some(phone) = patch.phone {
            self.phone = phone;
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(start_date) = patch.start_date {
            self.start_date = start_date;
        }
        if let Some(avatar_url) = patch.avatar_url {
            self.avatar_url = avatar_url;
        }
        if let Some(checklist) = patch.checklist {
            self.checklist = checklist;
        }
        if let Some(payment_info) = patch.payment_info {
            self.payment_info = payment_info;
        }
    }
}

/// Input for manually creating a worker
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWorker {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Option<WorkerRole>,
    #[serde(default)]
    pub status: Option<WorkerStatus>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub hourly_rate: Option<f64>,
    #[serde(default)]
    pub commission_rate: Option<f64>,
    #[serde(skip)]
    pub foreign_id: Option<String>,
}

/// Partial update of top-level worker fields
///
/// `id`, `notes`, `stats` and `createdAt` are not patchable: notes only
/// grow through note appends and stats only change through sync.
/// `phone` and `avatarUrl` distinguish an absent key (`None`) from an
/// explicit `null` (`Some(None)`), which clears the field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub phone: Option<Option<String>>,
    pub role: Option<WorkerRole>,
    pub status: Option<WorkerStatus>,
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub avatar_url: Option<Option<String>>,
    pub checklist: Option<Checklist>,
    pub payment_info: Option<PaymentInfo>,
}

fn present_or_null<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Canonical form of an email for comparison: trimmed, Unicode-lowercased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn emails_match(a: &str, b: &str) -> bool {
    normalize_email(a) == normalize_email(b)
}

/// A user seen in the external directory, keyed by email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryMember {
    pub name: String,
    pub email: String,
    pub foreign_id: String,
}
