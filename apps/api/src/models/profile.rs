use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::retrieval::documents::Record;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProfileRow {
    pub user_id: Uuid,
    pub name: String,
    pub education: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub links: Vec<String>,
    pub skills: Vec<String>,
    pub resume_text: Option<String>,
    pub resume_file_path: Option<String>,
    pub resume_file_name: Option<String>,
    pub resume_file_mime: Option<String>,
    pub bio: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PortfolioItemRow {
    pub id: i64,
    pub user_id: Uuid,
    pub title: String,
    pub url: Option<String>,
    pub skills: Vec<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CertificationRow {
    pub id: i64,
    pub user_id: Uuid,
    pub title: String,
    pub issuer: Option<String>,
    pub date: Option<String>,
    pub skills: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ExperienceRow {
    pub id: i64,
    pub user_id: Uuid,
    pub role: String,
    pub organization: Option<String>,
    pub years: Option<String>,
    pub skills: Vec<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ────────────────────────────────────────────────────────────────────────────
// Index records: the plain field maps the portfolio index is rebuilt from
// ────────────────────────────────────────────────────────────────────────────

fn into_record(value: serde_json::Value) -> Record {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Record::new(),
    }
}

impl ProfileRow {
    pub fn to_record(&self) -> Record {
        into_record(json!({
            "name": self.name,
            "education": self.education,
            "skills": self.skills,
            "links": self.links,
            "bio": self.bio,
            "linkedin": self.linkedin,
            "github": self.github,
        }))
    }
}

impl PortfolioItemRow {
    pub fn to_record(&self) -> Record {
        into_record(json!({
            "id": self.id,
            "title": self.title,
            "url": self.url,
            "skills": self.skills,
            "description": self.description,
        }))
    }
}

impl CertificationRow {
    pub fn to_record(&self) -> Record {
        into_record(json!({
            "id": self.id,
            "title": self.title,
            "issuer": self.issuer,
            "date": self.date,
            "skills": self.skills,
        }))
    }
}

impl ExperienceRow {
    pub fn to_record(&self) -> Record {
        into_record(json!({
            "id": self.id,
            "role": self.role,
            "organization": self.organization,
            "years": self.years,
            "skills": self.skills,
            "description": self.description,
        }))
    }
}
