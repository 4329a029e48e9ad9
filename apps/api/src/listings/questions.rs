//! Interview questions for the phone screen, generated per listing.

use serde::Deserialize;
use tracing::{info, warn};

use crate::listings::prompts::{QUESTIONS_PROMPT_TEMPLATE, QUESTIONS_SYSTEM};
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::LlmClient;

pub const GENERATED_QUESTION_COUNT: usize = 5;
pub const MAX_QUESTIONS: usize = 20;

const PLACEHOLDER_QUESTIONS: [&str; 3] = [
    "Could you walk me through your most relevant recent experience for this role?",
    "What interests you about this position?",
    "What is your availability to start, and what are your compensation expectations?",
];

#[derive(Debug, Deserialize)]
struct GeneratedQuestions {
    questions: Vec<String>,
}

pub fn placeholder_questions() -> Vec<String> {
    PLACEHOLDER_QUESTIONS.iter().map(|q| q.to_string()).collect()
}

/// Trims each question and drops blank ones.
pub fn normalize_questions(questions: Vec<String>) -> Vec<String> {
    questions
        .into_iter()
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .collect()
}

/// Asks the LLM for interview questions. Never fails: any LLM error or an
/// empty answer falls back to the placeholder set.
pub async fn generate_questions(
    llm: &LlmClient,
    listing_name: &str,
    job_description: &str,
) -> Vec<String> {
    let prompt = QUESTIONS_PROMPT_TEMPLATE
        .replace("{count}", &GENERATED_QUESTION_COUNT.to_string())
        .replace("{listing_name}", listing_name)
        .replace("{job_description}", job_description);
    let system = format!("{QUESTIONS_SYSTEM} {JSON_ONLY_SYSTEM}");

    match llm.complete_json::<GeneratedQuestions>(&prompt, &system).await {
        Ok(generated) => {
            let mut questions = normalize_questions(generated.questions);
            questions.truncate(GENERATED_QUESTION_COUNT);
            if questions.is_empty() {
                warn!("LLM returned no usable questions for '{listing_name}', using placeholders");
                return placeholder_questions();
            }
            info!(
                "Generated {} interview questions for '{listing_name}'",
                questions.len()
            );
            questions
        }
        Err(e) => {
            warn!("Question generation failed for '{listing_name}', using placeholders: {e}");
            placeholder_questions()
        }
    }
}
