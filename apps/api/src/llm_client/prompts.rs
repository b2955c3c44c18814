// Shared prompt fragments. Feature prompts live next to the code that uses them
// (see generation::prompts); this file holds the cross-cutting system prompts.

/// System prompt for calls whose answer is parsed as JSON.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// System prompt for calls whose answer is shown to the user verbatim.
pub const PLAIN_TEXT_SYSTEM: &str = "You write final, ready-to-send prose. \
    Respond with the requested text only: no headings, no JSON, no commentary \
    before or after it.";
