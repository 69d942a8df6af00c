pub mod fetch;
pub mod llm;
