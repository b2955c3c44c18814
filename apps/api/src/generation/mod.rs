// Cover-letter generation: job text sourcing, LLM job extraction and letter writing.
// All LLM calls go through llm_client; no direct Anthropic API calls here.

pub mod cover_letter;
pub mod handlers;
pub mod job_extractor;
pub mod job_source;
pub mod prompts;
