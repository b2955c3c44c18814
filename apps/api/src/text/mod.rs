// Text handling that needs no external services: normalization of scraped and
// pasted text, skill and link parsing, and résumé upload extraction.

pub mod normalize;
pub mod resume;
