pub mod file_classifier;
pub mod language;
pub mod rules;

pub use file_classifier::{Candidate, Classification, FileClassifier};
pub use language::{dominant_language, language_for_extension};
pub use rules::{normalize_name, Matcher, Rule};
