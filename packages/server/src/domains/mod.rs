// Business domains
pub mod matching;
