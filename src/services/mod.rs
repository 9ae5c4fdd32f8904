pub mod binder;
pub mod form;
pub mod image;
pub mod llm;
pub mod progress;
pub mod prompts;
pub mod workflow;
