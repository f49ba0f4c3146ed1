// Shared prompt fragments. Each caller keeps its own prompts.rs beside it;
// cross-cutting rules live here.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction against inventing data the source does not contain.
pub const NO_INVENTION_INSTRUCTION: &str = "\
    CRITICAL: Do NOT infer, interpolate, or invent details. \
    If the input does not support a value, use null or the schema's declared default.";
