//! Cover letter writer — fills the letter prompt from a profile, a job and
//! writing preferences, then makes one LLM call.

use serde::{Deserialize, Serialize};

use crate::generation::job_extractor::ExtractedJob;
use crate::generation::prompts::COVER_LETTER_PROMPT_TEMPLATE;
use crate::llm_client::prompts::PLAIN_TEXT_SYSTEM;
use crate::llm_client::{LlmClient, LlmError};

const MAX_PROFILE_SKILLS: usize = 20;
const MAX_LINKS: usize = 5;
const MAX_RESUME_CHARS: usize = 4000;
const MAX_JOB_SKILLS: usize = 20;
const MAX_JOB_DESCRIPTION_CHARS: usize = 6000;

/// How the letter should read. Missing fields take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub tone: String,
    pub style: String,
    pub length: String,
    pub template: Option<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            tone: "professional".to_string(),
            style: "concise".to_string(),
            length: "medium".to_string(),
            template: None,
        }
    }
}

/// The candidate facts that go into the prompt.
#[derive(Debug, Clone, Default)]
pub struct CandidateProfile {
    pub name: String,
    pub education: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub skills: Vec<String>,
    pub links: Vec<String>,
    pub resume_text: Option<String>,
}

/// Builds the letter prompt. `links` replaces the profile's own links when non-empty.
pub fn build_cover_letter_prompt(
    profile: &CandidateProfile,
    job: &ExtractedJob,
    preferences: &Preferences,
    links: &[String],
) -> String {
    let links: &[String] = if links.is_empty() { &profile.links } else { links };
    let resume = profile.resume_text.as_deref().unwrap_or_default().trim();

    let vars: [(&str, String); 15] = [
        ("name", profile.name.clone()),
        ("education", opt(&profile.education)),
        ("email", opt(&profile.email)),
        ("phone", opt(&profile.phone)),
        ("skills", head_csv(&profile.skills, MAX_PROFILE_SKILLS)),
        ("links", head_csv(links, MAX_LINKS)),
        ("resume_text", take_chars(resume, MAX_RESUME_CHARS)),
        ("job_role", opt(&job.role)),
        ("job_experience", opt(&job.experience)),
        ("job_skills", head_csv(&job.skills, MAX_JOB_SKILLS)),
        (
            "job_description",
            take_chars(job.description.as_deref().unwrap_or_default(), MAX_JOB_DESCRIPTION_CHARS),
        ),
        ("tone", preferences.tone.clone()),
        ("style", preferences.style.clone()),
        ("length", preferences.length.clone()),
        ("template", opt(&preferences.template)),
    ];

    fill_template(COVER_LETTER_PROMPT_TEMPLATE, &vars)
}

pub async fn generate_cover_letter(
    llm: &LlmClient,
    profile: &CandidateProfile,
    job: &ExtractedJob,
    preferences: &Preferences,
    links: &[String],
) -> Result<String, LlmError> {
    let prompt = build_cover_letter_prompt(profile, job, preferences, links);
    llm.call_text(&prompt, PLAIN_TEXT_SYSTEM).await
}

/// Single-pass `{key}` substitution; values are never rescanned, unknown keys stay as-is.
fn fill_template(template: &str, vars: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len() * 2);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let key = &after[..close];
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (v, close))
        });
        match value {
            Some((v, close)) => {
                out.push_str(v);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn opt(value: &Option<String>) -> String {
    value.as_deref().unwrap_or_default().to_string()
}

fn head_csv(items: &[String], max: usize) -> String {
    items
        .iter()
        .take(max)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn take_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> CandidateProfile {
        CandidateProfile {
            name: "Grace Hopper".to_string(),
            email: Some("grace@example.com".to_string()),
            skills: (1..=25).map(|i| format!("skill{i}")).collect(),
            links: vec!["https://profile.example".to_string()],
            resume_text: Some(format!("  {}  ", "x".repeat(5000))),
            ..Default::default()
        }
    }

    fn job() -> ExtractedJob {
        ExtractedJob {
            role: Some("Compiler Engineer".to_string()),
            experience: None,
            skills: vec!["COBOL".to_string()],
            description: Some("Write {tone} compilers.".to_string()),
        }
    }

    #[test]
    fn test_preferences_defaults_fill_missing_fields() {
        let prefs: Preferences = serde_json::from_str(r#"{"tone": "friendly"}"#).unwrap();
        assert_eq!(prefs.tone, "friendly");
        assert_eq!(prefs.style, "concise");
        assert_eq!(prefs.length, "medium");
        assert!(prefs.template.is_none());
    }

    #[test]
    fn test_prompt_applies_limits() {
        let prompt = build_cover_letter_prompt(&profile(), &job(), &Preferences::default(), &[]);
        assert!(prompt.contains("skill20"));
        assert!(!prompt.contains("skill21"));
        assert!(prompt.contains(&"x".repeat(4000)));
        assert!(!prompt.contains(&"x".repeat(4001)));
        assert!(prompt.contains("- Role: Compiler Engineer"));
        assert!(prompt.contains("specific to the role \"Compiler Engineer\""));
    }

    #[test]
    fn test_prompt_prefers_retrieved_links() {
        let links: Vec<String> = (1..=7).map(|i| format!("https://p{i}.example")).collect();
        let prompt = build_cover_letter_prompt(&profile(), &job(), &Preferences::default(), &links);
        assert!(prompt.contains("https://p5.example"));
        assert!(!prompt.contains("https://p6.example"));
        assert!(!prompt.contains("https://profile.example"));

        let prompt = build_cover_letter_prompt(&profile(), &job(), &Preferences::default(), &[]);
        assert!(prompt.contains("- Links: https://profile.example"));
    }

    #[test]
    fn test_substituted_values_are_not_rescanned() {
        let prompt = build_cover_letter_prompt(&profile(), &job(), &Preferences::default(), &[]);
        assert!(prompt.contains("Write {tone} compilers."));
        assert!(prompt.contains("with professional tone and concise style"));
    }

    #[test]
    fn test_fill_template_keeps_unknown_and_unclosed() {
        let vars = [("a", "1".to_string())];
        assert_eq!(fill_template("{a} {b} {a", &vars), "1 {b} {a");
    }
}
