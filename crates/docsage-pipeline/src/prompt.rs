//! Prompt construction for the answering model.
//!
//! Only the first [`CONTEXT_LIMIT`] results are rendered into the prompt, in rank order.

use serde::Serialize;

use docsage_core::SearchResult;

pub const CONTEXT_LIMIT: usize = 5;
pub const NO_CONTEXT: &str = "No relevant documentation found.";
const UNKNOWN_SOURCE: &str = "Unknown";

const ANSWER_SYSTEM: &str = "You are a Technical Documentation Assistant that helps developers understand APIs, SDKs and software products from their documentation.

Guidelines:
1. Base your answers strictly on the provided documentation context
2. If the context does not contain the answer, say so clearly
3. Give specific, actionable answers and include code examples when relevant
4. Reference the source documents you used
5. Explain technical concepts in a clear, developer-friendly way

Always prioritize accuracy and cite your sources.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prompt {
    pub system: String,
    pub user: String,
    pub code_mode: bool,
}

/// Code mode is requested by an explicit language or by the words "code"/"example".
pub fn wants_code(question: &str, language: Option<&str>) -> bool {
    let q = question.to_lowercase();
    language.is_some_and(|l| !l.trim().is_empty()) || q.contains("code") || q.contains("example")
}

pub fn build_context(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return NO_CONTEXT.to_string();
    }
    results
        .iter()
        .take(CONTEXT_LIMIT)
        .enumerate()
        .map(|(i, r)| format!("[Document {} - {}]\n{}", i + 1, r.source().unwrap_or(UNKNOWN_SOURCE), r.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn answer_prompt(question: &str, results: &[SearchResult]) -> Prompt {
    let user = format!(
        "Based on the following technical documentation, please answer this question:\n\nQuestion: {question}\n\nDocumentation Context:\n{}\n\nPlease provide a comprehensive answer based on the documentation provided. If you include code examples, make sure they are functional and well-commented.",
        build_context(results)
    );
    Prompt { system: ANSWER_SYSTEM.to_string(), user, code_mode: false }
}

pub fn code_prompt(question: &str, results: &[SearchResult], language: Option<&str>) -> Prompt {
    let lang = language.filter(|l| !l.trim().is_empty()).map(|l| format!(" in {l}")).unwrap_or_default();
    let system = format!(
        "You are a Technical Documentation Assistant specialized in generating code examples{lang}.

Guidelines for code generation:
- Write complete, runnable code based on the documentation
- Include necessary imports and dependencies
- Add comments explaining key steps
- Handle errors where appropriate
- Follow the conventions of the language"
    );
    let user = format!(
        "Based on the following technical documentation, please generate a code example{lang} that demonstrates:\n\nRequest: {question}\n\nDocumentation Context:\n{}\n\nPlease provide:\n1. A complete, functional code example\n2. Clear comments explaining each step\n3. Any necessary setup or dependencies\n4. A brief explanation of how the code works",
        build_context(results)
    );
    Prompt { system, user, code_mode: true }
}

pub fn build_prompt(question: &str, results: &[SearchResult], language: Option<&str>) -> Prompt {
    if wants_code(question, language) { code_prompt(question, results, language) } else { answer_prompt(question, results) }
}

/// Mean score of `results` for answers, the top-ranked score for code examples.
/// 0.0 when there are no results.
pub fn confidence(results: &[SearchResult], code_mode: bool) -> f32 {
    match results.first() {
        None => 0.0,
        Some(top) if code_mode => top.score,
        Some(_) => results.iter().map(|r| r.score).sum::<f32>() / results.len() as f32,
    }
}

pub fn sources(results: &[SearchResult]) -> Vec<String> {
    results.iter().map(|r| r.source().unwrap_or(UNKNOWN_SOURCE).to_string()).collect()
}
