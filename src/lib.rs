//! MLQuest · Client Engine for the ML Learning Platform
//!
//! - Typed REST client for the platform backend (auth, lessons, submissions, jobs, progress)
//! - Pure gamification core (XP/levels, streaks, hearts, badges)
//! - Scripted "Module 0" math quest with a built-in challenge bank
//! - Pluggable per-user progress snapshot store (in-memory or JSON file)
//! - Submission runner orchestration with timeout and cancellation
//!
//! Important env variables:
//!   MLQUEST_CONFIG_PATH  : path to TOML config (api/execution/storage overrides)
//!   MLQUEST_API_BASE_URL : backend base URL (default "http://localhost:8002")
//!   LOG_LEVEL    : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT   : "pretty" (default) or "json"

pub mod telemetry;
pub mod util;
pub mod domain;
pub mod protocol;
pub mod config;
pub mod seeds;
pub mod store;
pub mod gamification;
pub mod grading;
pub mod quest;
pub mod unlock;
pub mod client;
pub mod executor;
pub mod session;
