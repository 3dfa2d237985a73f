pub mod generator;
pub mod prompts;

pub use generator::ReportGenerator;
