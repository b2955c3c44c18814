//! Request bodies for the profile store and the rules that turn them into
//! values safe to persist.

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::text::normalize::{dedup_skills, parse_skills, safe_truncate, sanitize_links, validate_url};

pub const MAX_RESUME_CHARS: usize = 6000;

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

/// Skills arrive either as a JSON list or as free text ("Rust, Go\nSQL").
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SkillsInput {
    List(Vec<String>),
    Text(String),
}

impl Default for SkillsInput {
    fn default() -> Self {
        SkillsInput::List(Vec::new())
    }
}

impl SkillsInput {
    pub fn normalized(&self) -> Vec<String> {
        match self {
            SkillsInput::List(items) => dedup_skills(items.iter().map(String::as_str)),
            SkillsInput::Text(text) => parse_skills(text),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProfileInput {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub education: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub skills: SkillsInput,
    /// `None` keeps the stored résumé text; an empty string clears it.
    pub resume_text: Option<String>,
    pub bio: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidProfile {
    pub name: String,
    pub email: String,
    pub education: Option<String>,
    pub phone: Option<String>,
    pub links: Vec<String>,
    pub skills: Vec<String>,
    pub resume_text: Option<Option<String>>,
    pub bio: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
}

impl ProfileInput {
    pub fn validate(&self) -> Result<ValidProfile, AppError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("name is required".to_string()));
        }

        let email = self.email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(AppError::Validation("a valid email is required".to_string()));
        }

        let linkedin = non_empty(&self.linkedin);
        let github = non_empty(&self.github);

        let mut links: Vec<String> = Vec::new();
        let candidates = self
            .links
            .iter()
            .map(String::as_str)
            .chain(linkedin.as_deref())
            .chain(github.as_deref());
        for link in sanitize_links(candidates) {
            if !links.contains(&link) {
                links.push(link);
            }
        }

        Ok(ValidProfile {
            name: name.to_string(),
            email,
            education: non_empty(&self.education),
            phone: non_empty(&self.phone),
            links,
            skills: self.skills.normalized(),
            resume_text: self.resume_text.as_deref().map(truncate_resume),
            bio: non_empty(&self.bio),
            linkedin,
            github,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct PortfolioItemInput {
    pub user_id: Uuid,
    pub title: String,
    pub url: Option<String>,
    #[serde(default)]
    pub skills: SkillsInput,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidPortfolioItem {
    pub title: String,
    pub url: Option<String>,
    pub skills: Vec<String>,
    pub description: Option<String>,
}

impl PortfolioItemInput {
    pub fn validate(&self) -> Result<ValidPortfolioItem, AppError> {
        let title = required(&self.title, "title")?;
        let url = non_empty(&self.url);
        if let Some(url) = &url {
            if !validate_url(url) {
                return Err(AppError::Validation(
                    "url must be an http(s) URL with a host".to_string(),
                ));
            }
        }
        Ok(ValidPortfolioItem {
            title,
            url,
            skills: self.skills.normalized(),
            description: non_empty(&self.description),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CertificationInput {
    pub user_id: Uuid,
    pub title: String,
    pub issuer: Option<String>,
    pub date: Option<String>,
    #[serde(default)]
    pub skills: SkillsInput,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidCertification {
    pub title: String,
    pub issuer: Option<String>,
    pub date: Option<String>,
    pub skills: Vec<String>,
}

impl CertificationInput {
    pub fn validate(&self) -> Result<ValidCertification, AppError> {
        Ok(ValidCertification {
            title: required(&self.title, "title")?,
            issuer: non_empty(&self.issuer),
            date: non_empty(&self.date),
            skills: self.skills.normalized(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ExperienceInput {
    pub user_id: Uuid,
    pub role: String,
    pub organization: Option<String>,
    pub years: Option<String>,
    #[serde(default)]
    pub skills: SkillsInput,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidExperience {
    pub role: String,
    pub organization: Option<String>,
    pub years: Option<String>,
    pub skills: Vec<String>,
    pub description: Option<String>,
}

impl ExperienceInput {
    pub fn validate(&self) -> Result<ValidExperience, AppError> {
        Ok(ValidExperience {
            role: required(&self.role, "role")?,
            organization: non_empty(&self.organization),
            years: non_empty(&self.years),
            skills: self.skills.normalized(),
            description: non_empty(&self.description),
        })
    }
}

/// Trimmed résumé text capped at [`MAX_RESUME_CHARS`]; blank becomes `None`.
pub fn truncate_resume(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| safe_truncate(text, MAX_RESUME_CHARS))
}

pub fn is_valid_email(email: &str) -> bool {
    let re = EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)+$").expect("valid email regex")
    });
    re.is_match(email)
}

fn required(value: &str, field: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile_input(value: serde_json::Value) -> ProfileInput {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_profile_requires_name_and_email() {
        let input = profile_input(json!({
            "user_id": Uuid::nil(), "name": "  ", "email": "a@b.co"
        }));
        assert!(matches!(input.validate(), Err(AppError::Validation(_))));

        let input = profile_input(json!({
            "user_id": Uuid::nil(), "name": "Ada", "email": "not-an-email"
        }));
        assert!(matches!(input.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_profile_normalizes_fields() {
        let input = profile_input(json!({
            "user_id": Uuid::nil(),
            "name": " Ada Lovelace ",
            "email": " Ada@Example.COM ",
            "phone": "",
            "links": ["https://ada.example", "notaurl", "https://github.com/ada"],
            "skills": "Rust, rust\nMath",
            "linkedin": "https://linkedin.com/in/ada",
            "github": "https://github.com/ada"
        }));
        let valid = input.validate().unwrap();

        assert_eq!(valid.name, "Ada Lovelace");
        assert_eq!(valid.email, "ada@example.com");
        assert!(valid.phone.is_none());
        assert_eq!(valid.skills, vec!["Rust", "Math"]);
        assert_eq!(
            valid.links,
            vec![
                "https://ada.example",
                "https://github.com/ada",
                "https://linkedin.com/in/ada"
            ]
        );
        assert!(valid.resume_text.is_none());
    }

    #[test]
    fn test_profile_resume_text_is_truncated_or_cleared() {
        let long = "word ".repeat(2000);
        let input = profile_input(json!({
            "user_id": Uuid::nil(), "name": "A", "email": "a@b.co", "resume_text": long
        }));
        let resume = input.validate().unwrap().resume_text.unwrap().unwrap();
        assert!(resume.chars().count() <= MAX_RESUME_CHARS + 2);
        assert!(resume.ends_with(" …"));

        let input = profile_input(json!({
            "user_id": Uuid::nil(), "name": "A", "email": "a@b.co", "resume_text": "  "
        }));
        assert_eq!(input.validate().unwrap().resume_text, Some(None));
    }

    #[test]
    fn test_skills_accept_list() {
        let input: PortfolioItemInput = serde_json::from_value(json!({
            "user_id": Uuid::nil(), "title": "Site", "skills": [" CSS ", "css", "HTML"]
        }))
        .unwrap();
        assert_eq!(input.validate().unwrap().skills, vec!["CSS", "HTML"]);
    }

    #[test]
    fn test_portfolio_url_must_be_http() {
        let input: PortfolioItemInput = serde_json::from_value(json!({
            "user_id": Uuid::nil(), "title": "Site", "url": "ftp://files.example"
        }))
        .unwrap();
        assert!(matches!(input.validate(), Err(AppError::Validation(_))));

        let input: PortfolioItemInput = serde_json::from_value(json!({
            "user_id": Uuid::nil(), "title": "Site", "url": "  "
        }))
        .unwrap();
        assert!(input.validate().unwrap().url.is_none());
    }

    #[test]
    fn test_required_titles_and_roles() {
        let cert: CertificationInput =
            serde_json::from_value(json!({"user_id": Uuid::nil(), "title": ""})).unwrap();
        assert!(matches!(cert.validate(), Err(AppError::Validation(_))));

        let exp: ExperienceInput = serde_json::from_value(
            json!({"user_id": Uuid::nil(), "role": " SRE ", "years": "2020-2022"}),
        )
        .unwrap();
        let valid = exp.validate().unwrap();
        assert_eq!(valid.role, "SRE");
        assert_eq!(valid.years.as_deref(), Some("2020-2022"));
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_valid_email("first.last@sub.example.org"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("@c.com"));
    }
}
