// Prompt constants for the transformation backend.
// Reuses cross-cutting fragments from llm_client::prompts.

/// Role line of the transformation system prompt; combined with the shared
/// JSON-only and no-invention fragments.
pub const TRANSFORM_ROLE: &str =
    "You are a data transformation engine for blue-collar job data normalization. \
    You map records between JSON schemas.";

/// Transformation prompt. Replace `{data}`, `{inputSchema}` and `{outputSchema}`.
pub const TRANSFORM_PROMPT_TEMPLATE: &str = r#"Transform the input data from the input JSON schema to the output JSON schema.

INSTRUCTIONS:
1. Analyze the input data structure using the provided input schema
2. Transform the data to match the output schema exactly
3. Preserve all meaningful information that has a place in the output schema
4. Apply appropriate data type conversions when they are unambiguous (e.g. "12.5" -> 12.5)
5. Use null for fields that cannot be taken from the input, or the schema's declared default
6. Ensure the output strictly conforms to the output schema

IMPORTANT:
- Return ONLY valid JSON without any explanation, markdown, or additional text
- The output must validate against the output schema
- Maintain data integrity and accuracy throughout the transformation

INPUT DATA:
{data}

INPUT SCHEMA:
{inputSchema}

OUTPUT SCHEMA:
{outputSchema}
"#;

/// Appended on the second attempt. Replace `{reason}`.
pub const RETRY_RESTATEMENT_TEMPLATE: &str = r#"
YOUR PREVIOUS ANSWER WAS REJECTED: {reason}

Answer again. The response must be exactly one JSON object:
- the first character is "{" and the last character is "}"
- no code fences, no comments, no prose before or after it
- every property required by the OUTPUT SCHEMA is present, using null where the input has no value
- every value has the type the OUTPUT SCHEMA declares for it
"#;
