//! SmokeProbe library
//!
//! Configuration, result recording and the session controller behind the `smokeprobe`
//! binary. Exposed as a library so the run pipeline can be driven from integration tests
//! with scripted browsers and providers.

pub mod artifacts;
pub mod config;
pub mod report;
pub mod session;

pub use config::Config;
pub use report::{humanize_fatal_error, ResultRecorder};
pub use session::{RunRequest, SessionController, SessionOutcome};
