//! Turns plain profile-store records into short indexable documents.
//!
//! Records are JSON objects; only the documented field names are read and any
//! missing, null or mistyped field is treated as empty. Values are written as
//! stored; only `bio` and `description` are trimmed.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::retrieval::store::{Metadata, VectorRecord};

/// A plain key/value record handed to the index by the profile store.
pub type Record = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Profile,
    PortfolioItem,
    Certification,
    Experience,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Profile => "profile",
            DocumentKind::PortfolioItem => "portfolio_item",
            DocumentKind::Certification => "certification",
            DocumentKind::Experience => "experience",
        }
    }

    /// Id prefix keeping record ids from independent tables disjoint.
    fn id_prefix(&self) -> Option<&'static str> {
        match self {
            DocumentKind::Profile => None,
            DocumentKind::PortfolioItem => Some("pf"),
            DocumentKind::Certification => Some("ct"),
            DocumentKind::Experience => Some("xp"),
        }
    }
}

/// A synthesized document plus the metadata it is stored with.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedDocument {
    pub id: String,
    pub kind: DocumentKind,
    pub text: String,
    pub title: String,
    pub url: Option<String>,
}

impl IndexedDocument {
    /// Store entry for this document. The entry id is scoped by user because all
    /// users share one collection.
    pub fn into_vector_record(self, user_id: &str) -> VectorRecord {
        let mut metadata = Metadata::new();
        metadata.insert("user_id".to_string(), user_id.to_string());
        metadata.insert("type".to_string(), self.kind.as_str().to_string());
        metadata.insert("title".to_string(), self.title);
        if let Some(url) = self.url {
            metadata.insert("url".to_string(), url);
        }
        VectorRecord {
            id: format!("{user_id}:{}", self.id),
            document: self.text,
            metadata,
        }
    }
}

pub fn profile_document(record: &Record) -> IndexedDocument {
    let name = field(record, "name");
    let text = format!(
        "Profile of {}. Education: {}. Skills: {}. Links: {}. Bio: {}. LinkedIn: {}. GitHub: {}.",
        name,
        field(record, "education"),
        list_csv(record, "skills"),
        list_csv(record, "links"),
        trimmed(record, "bio"),
        field(record, "linkedin"),
        field(record, "github"),
    );
    IndexedDocument {
        id: document_id(DocumentKind::Profile, record),
        kind: DocumentKind::Profile,
        text,
        title: name,
        url: None,
    }
}

pub fn portfolio_document(record: &Record) -> IndexedDocument {
    let title = field(record, "title");
    let text = format!(
        "Portfolio: {}. Skills: {}. {}",
        title,
        list_csv(record, "skills"),
        trimmed(record, "description"),
    );
    let url = field(record, "url");
    IndexedDocument {
        id: document_id(DocumentKind::PortfolioItem, record),
        kind: DocumentKind::PortfolioItem,
        text,
        title,
        url: (!url.is_empty()).then_some(url),
    }
}

pub fn certification_document(record: &Record) -> IndexedDocument {
    let title = field(record, "title");
    let text = format!(
        "Certification: {} by {}, date {}. Skills: {}.",
        title,
        field(record, "issuer"),
        field(record, "date"),
        list_csv(record, "skills"),
    );
    IndexedDocument {
        id: document_id(DocumentKind::Certification, record),
        kind: DocumentKind::Certification,
        text,
        title,
        url: None,
    }
}

pub fn experience_document(record: &Record) -> IndexedDocument {
    let role = field(record, "role");
    let text = format!(
        "Experience: {} at {} ({}). Skills: {}. {}",
        role,
        field(record, "organization"),
        field(record, "years"),
        list_csv(record, "skills"),
        trimmed(record, "description"),
    );
    IndexedDocument {
        id: document_id(DocumentKind::Experience, record),
        kind: DocumentKind::Experience,
        text,
        title: role,
        url: None,
    }
}

/// String value of a scalar field; empty for missing, null or compound values.
fn field(record: &Record, key: &str) -> String {
    match record.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn trimmed(record: &Record, key: &str) -> String {
    field(record, key).trim().to_string()
}

/// String items of a list joined with `", "`, unchanged. A plain string is used as is.
fn list_csv(record: &Record, key: &str) -> String {
    match record.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

/// The record's own id, when it has a usable one.
fn record_id(record: &Record) -> Option<String> {
    match record.get("id") {
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn document_id(kind: DocumentKind, record: &Record) -> String {
    match kind.id_prefix() {
        Some(prefix) => {
            let id = record_id(record).unwrap_or_else(|| Uuid::new_v4().to_string());
            format!("{prefix}-{id}")
        }
        None => Uuid::new_v4().to_string(),
    }
}
