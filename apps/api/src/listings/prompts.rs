/// Persona for interview-question generation. Combined with `JSON_ONLY_SYSTEM`.
pub const QUESTIONS_SYSTEM: &str = "You are an experienced technical recruiter \
    preparing a short phone screen. Questions are read aloud by a voice agent, \
    so each must be a single spoken sentence without lists, code, or URLs.";

/// Replace `{count}`, `{listing_name}` and `{job_description}` before sending.
pub const QUESTIONS_PROMPT_TEMPLATE: &str = r#"Write {count} phone-screen interview questions for the job below.

Return a JSON object with this EXACT schema (no extra fields):
{"questions": ["question one?", "question two?"]}

Rules:
- Each question targets a concrete requirement from the job description.
- Open-ended questions only; no yes/no questions.
- At most 30 words per question.

Job title: {listing_name}

Job description:
{job_description}
"#;
