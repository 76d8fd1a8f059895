//! Emergency contacts and dog documents kept in local-only collections.

use super::validation::{
    clean_optional, max_len, require_id, require_text, ValidationError, MAX_NAME_CHARS,
    MAX_NOTES_CHARS,
};
use super::RecordId;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 ()\-.]{2,24}$").expect("valid phone regex"));

const MAX_URL_CHARS: usize = 2_048;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactRole {
    Veterinarian,
    EmergencyClinic,
    Groomer,
    Sitter,
    Family,
    Other,
}

impl ContactRole {
    pub const ALL: [ContactRole; 6] = [
        ContactRole::Veterinarian,
        ContactRole::EmergencyClinic,
        ContactRole::Groomer,
        ContactRole::Sitter,
        ContactRole::Family,
        ContactRole::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Veterinarian => "veterinarian",
            Self::EmergencyClinic => "emergency_clinic",
            Self::Groomer => "groomer",
            Self::Sitter => "sitter",
            Self::Family => "family",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|item| item.as_str() == value.trim())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub id: RecordId,
    pub name: String,
    pub role: ContactRole,
    pub phone: String,
    pub address: Option<String>,
    pub notes: Option<String>,
}

impl EmergencyContact {
    pub fn with_id(mut self, id: RecordId) -> Result<Self, ValidationError> {
        require_id(&id)?;
        self.id = id;
        Ok(self)
    }

    pub fn new(name: impl Into<String>, role: ContactRole, phone: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into().trim().to_string(),
            role,
            phone: phone.into().trim().to_string(),
            address: None,
            notes: None,
        }
    }

    pub fn with_address(mut self, address: Option<String>) -> Self {
        self.address = clean_optional(address);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_id(&self.id)?;
        require_text("name", &self.name, MAX_NAME_CHARS)?;
        require_text("phone", &self.phone, 32)?;
        if !PHONE_RE.is_match(&self.phone) {
            return Err(ValidationError::InvalidFormat("phone"));
        }
        max_len("address", self.address.as_deref(), MAX_NOTES_CHARS)?;
        max_len("notes", self.notes.as_deref(), MAX_NOTES_CHARS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    VaccinationCard,
    Insurance,
    Pedigree,
    Microchip,
    Prescription,
    Other,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 6] = [
        DocumentKind::VaccinationCard,
        DocumentKind::Insurance,
        DocumentKind::Pedigree,
        DocumentKind::Microchip,
        DocumentKind::Prescription,
        DocumentKind::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::VaccinationCard => "vaccination_card",
            Self::Insurance => "insurance",
            Self::Pedigree => "pedigree",
            Self::Microchip => "microchip",
            Self::Prescription => "prescription",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|item| item.as_str() == value.trim())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DogDocument {
    pub id: RecordId,
    pub dog_id: Option<RecordId>,
    pub title: String,
    pub kind: DocumentKind,
    pub file_url: Option<String>,
    pub expires_on: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl DogDocument {
    pub fn with_id(mut self, id: RecordId) -> Result<Self, ValidationError> {
        require_id(&id)?;
        self.id = id;
        Ok(self)
    }

    pub fn new(title: impl Into<String>, kind: DocumentKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            dog_id: None,
            title: title.into().trim().to_string(),
            kind,
            file_url: None,
            expires_on: None,
            notes: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_id(&self.id)?;
        require_text("title", &self.title, MAX_NAME_CHARS)?;
        max_len("file_url", self.file_url.as_deref(), MAX_URL_CHARS)?;
        max_len("notes", self.notes.as_deref(), MAX_NOTES_CHARS)
    }

    /// Whether the document expired before `today`.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expires_on.is_some_and(|expires| expires < today)
    }
}

#[cfg(test)]
mod tests {
    use super::{ContactRole, DocumentKind, EmergencyContact};

    #[test]
    fn phone_format_is_checked() {
        let ok = EmergencyContact::new("Dr. Vet", ContactRole::Veterinarian, "+49 (30) 123-456");
        assert!(ok.validate().is_ok());
        let bad = EmergencyContact::new("Dr. Vet", ContactRole::Veterinarian, "call me");
        assert!(bad.validate().is_err());
    }

    #[test]
    fn labels_round_trip_through_parse() {
        for role in ContactRole::ALL {
            assert_eq!(ContactRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(
            DocumentKind::parse("vaccination_card"),
            Some(DocumentKind::VaccinationCard)
        );
        assert_eq!(DocumentKind::parse("passport"), None);
    }
}
