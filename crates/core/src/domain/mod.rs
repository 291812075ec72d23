pub mod agent;
pub mod evaluation;
pub mod guideline;
pub mod service;
