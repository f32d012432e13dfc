//! Turn a directory of loose files into separate project repositories.
//!
//! Files are scanned, classified by a precedence-ordered rule list, assembled into
//! groups (small ones folded into `misc`), copied into a staging area and handed to a
//! [`publisher::Publisher`] one group at a time.

pub mod assembler;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod organizer;
pub mod publisher;
pub mod report;
pub mod scanner;
pub mod ui;

pub use assembler::{Assembly, ProjectAssembler, ProjectGroup};
pub use classifier::{Candidate, Classification, FileClassifier};
pub use config::Config;
pub use organizer::Organizer;
pub use publisher::{PublishResult, Publisher};
pub use report::PublishReport;
pub use scanner::{FileEntry, Scanner};
