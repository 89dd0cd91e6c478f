// lambdactl - inspect AWS Lambda fleets and bulk-upgrade function runtimes
//
// Layout:
// - upgrade: runtime upgrade orchestrator (validate → inventory → plan → apply)
// - cloud:   CloudApi seam and its AWS SDK implementation
// - prompt:  operator prompts (multi-select, confirmation)
// - report:  terminal rendering of plans and summaries
// - list:    read-only function/layer listings
// - config:  layered TOML + environment configuration

pub mod cloud;
pub mod config;
pub mod error;
pub mod list;
pub mod prompt;
pub mod report;
pub mod upgrade;

mod init;

pub use init::init_tracing;
