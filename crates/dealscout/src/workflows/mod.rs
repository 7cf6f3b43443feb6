pub mod import;
pub mod matching;
pub mod underwriting;
