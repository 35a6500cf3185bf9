// Cross-cutting prompt fragments. Analyzer-specific prompts live in scoring/prompts.rs.

/// System prompt that enforces JSON-only output for structured calls.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured hiring analyst. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended to every candidate-analysis prompt.
pub const EVIDENCE_INSTRUCTION: &str = "\
    Base every judgment on the resume text provided. Do NOT invent employers, titles, \
    or achievements. When the resume does not support a rating, give a conservative \
    middle value and leave the evidence list empty.";
