//! Client records.
//!
//! The JSON shape matches what the dashboard pages send: camelCase keys,
//! ids that may arrive as strings or as numeric `Date.now()` values, and
//! `number` as an older spelling of `mobileNumber`.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Last id handed out by [`RecordId::generate`], in epoch milliseconds.
static LAST_GENERATED: AtomicI64 = AtomicI64::new(0);

/// Identifier of a client or of one of its additional fields.
///
/// Accepts a JSON string or integer on input and always serializes as a
/// string, so `1718000000000` and `"1718000000000"` name the same record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

/// Id of a client.
pub type ClientId = RecordId;

impl RecordId {
    /// Generate a timestamp-derived id.
    ///
    /// Ids are the current time in milliseconds, bumped forward when two are
    /// requested within the same millisecond so that one process never hands
    /// out the same id twice.
    #[must_use]
    pub fn generate() -> Self {
        let now = Utc::now().timestamp_millis();
        let prev = LAST_GENERATED
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(if now > last { now } else { last + 1 })
            })
            .unwrap_or(now);
        let id = if now > prev { now } else { prev + 1 };
        Self(id.to_string())
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether no id was supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Check whether the id can be used as a file name.
    ///
    /// Only ASCII letters, digits, `-` and `_` are allowed.
    #[must_use]
    pub fn is_path_safe(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Self(s),
            Raw::Signed(n) => Self(n.to_string()),
            Raw::Unsigned(n) => Self(n.to_string()),
        })
    }
}

/// A free-text title/description pair attached to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalField {
    /// Field id, unique within its client.
    #[serde(default)]
    pub id: RecordId,
    /// Short label.
    pub title: String,
    /// Free text.
    #[serde(default)]
    pub description: String,
}

impl AdditionalField {
    /// Create a field with a generated id.
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: RecordId::generate(),
            title: title.into(),
            description: description.into(),
        }
    }
}

/// An insurance agent's prospect or customer.
///
/// Deserialized through [`ClientRecord`], so a body may carry `number`,
/// `mobileNumber` or both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "ClientRecord")]
pub struct Client {
    /// Client id. Empty when the caller left it to the server.
    pub id: ClientId,

    /// Display name.
    pub name: String,

    /// Contact number, normally ten digits.
    pub mobile_number: String,

    /// Age in years, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,

    /// Ordered free-text notes.
    pub additional_fields: Vec<AdditionalField>,

    /// Names of documents collected for this client. Only names are kept.
    pub documents: Vec<String>,
}

/// Wire shape of a client as the dashboard sends it.
///
/// The edit page spreads the stored record and then sets `number`, so both
/// keys can arrive together; `number` is the edited value and wins.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClientRecord {
    #[serde(default)]
    id: ClientId,
    name: String,
    #[serde(default)]
    mobile_number: Option<String>,
    #[serde(default)]
    number: Option<String>,
    #[serde(default)]
    age: Option<u32>,
    #[serde(default)]
    additional_fields: Vec<AdditionalField>,
    #[serde(default)]
    documents: Vec<String>,
}

impl From<ClientRecord> for Client {
    fn from(record: ClientRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            mobile_number: record
                .number
                .or(record.mobile_number)
                .unwrap_or_default(),
            age: record.age,
            additional_fields: record.additional_fields,
            documents: record.documents,
        }
    }
}

impl Client {
    /// Create a client with a fresh id and no extra fields.
    #[must_use]
    pub fn new(name: impl Into<String>, mobile_number: impl Into<String>) -> Self {
        Self {
            id: ClientId::generate(),
            name: name.into(),
            mobile_number: mobile_number.into(),
            age: None,
            additional_fields: Vec::new(),
            documents: Vec::new(),
        }
    }

    /// Set the age.
    #[must_use]
    pub fn with_age(mut self, age: u32) -> Self {
        self.age = Some(age);
        self
    }

    /// Append an additional field.
    #[must_use]
    pub fn with_field(mut self, field: AdditionalField) -> Self {
        self.additional_fields.push(field);
        self
    }

    /// Check the mobile number against `rule`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidClient`] if the number does not match.
    pub fn validate_mobile_number(&self, rule: &Regex) -> crate::Result<()> {
        if rule.is_match(&self.mobile_number) {
            Ok(())
        } else {
            Err(crate::Error::invalid_client(format!(
                "mobile number {:?} does not match {}",
                self.mobile_number,
                rule.as_str()
            )))
        }
    }
}

/// Free-text notes an agent keeps about one client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientNotes {
    /// The client the notes belong to.
    pub client_id: ClientId,
    /// The notes text; empty when nothing was saved.
    pub notes: String,
}
