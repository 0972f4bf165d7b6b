// Services module: business logic with no HTTP types
pub mod analyzer;
pub mod bands;
pub mod llm;
pub mod patient;
pub mod prompt;
pub mod report;
pub mod risk_engine;
