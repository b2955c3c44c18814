//! Job extractor — turns cleaned posting text into structured job records via the LLM.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::AppError;
use crate::generation::prompts::EXTRACT_JOBS_PROMPT_TEMPLATE;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{LlmClient, LlmError};
use crate::text::normalize::coerce_skills;

pub const UNPARSABLE_JOBS_MESSAGE: &str = "Context too big. Unable to parse jobs.";

/// One job posting as extracted from the source text. Every field may be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedJob {
    pub role: Option<String>,
    pub experience: Option<String>,
    pub skills: Vec<String>,
    pub description: Option<String>,
}

impl ExtractedJob {
    /// Lenient conversion from whatever object the model produced.
    /// Scalars become strings; `skills` may be a list or a comma-separated string.
    pub fn from_object(object: &Map<String, Value>) -> Self {
        Self {
            role: scalar(object.get("role")),
            experience: scalar(object.get("experience")),
            skills: object.get("skills").map(coerce_skills).unwrap_or_default(),
            description: scalar(object.get("description")),
        }
    }
}

fn scalar(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Accepts a JSON array of postings or a single posting object.
/// Returns `None` when nothing usable is present.
pub fn jobs_from_value(value: &Value) -> Option<Vec<ExtractedJob>> {
    let jobs: Vec<ExtractedJob> = match value {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_object)
            .map(ExtractedJob::from_object)
            .collect(),
        Value::Object(object) => vec![ExtractedJob::from_object(object)],
        _ => Vec::new(),
    };
    (!jobs.is_empty()).then_some(jobs)
}

/// Asks the LLM for the postings in `page_text`.
///
/// Output that is not JSON, or JSON without any posting object, maps to a 422
/// with [`UNPARSABLE_JOBS_MESSAGE`]; transport and API failures map to `AppError::Llm`.
pub async fn extract_jobs(page_text: &str, llm: &LlmClient) -> Result<Vec<ExtractedJob>, AppError> {
    let prompt = EXTRACT_JOBS_PROMPT_TEMPLATE.replace("{page_data}", page_text);

    let value = match llm.call_json::<Value>(&prompt, JSON_ONLY_SYSTEM).await {
        Ok(value) => value,
        Err(LlmError::Parse(e)) => {
            tracing::warn!("Job extraction returned invalid JSON: {e}");
            return Err(AppError::UnprocessableEntity(UNPARSABLE_JOBS_MESSAGE.to_string()));
        }
        Err(LlmError::EmptyContent) => {
            return Err(AppError::UnprocessableEntity(UNPARSABLE_JOBS_MESSAGE.to_string()));
        }
        Err(e) => return Err(AppError::Llm(format!("Job extraction failed: {e}"))),
    };

    jobs_from_value(&value)
        .ok_or_else(|| AppError::UnprocessableEntity(UNPARSABLE_JOBS_MESSAGE.to_string()))
}
