//! Browser automation driver for SmokeProbe.
//!
//! Higher layers talk to the browser exclusively through [`BrowserDriver`]. Two
//! implementations ship with the crate:
//! - [`ChromiumDriver`] launches Chromium through chromiumoxide and records a screencast of
//!   the main tab;
//! - [`ScriptedBrowser`] simulates a small site in memory for tests and dry runs.

pub mod chromium;
pub mod config;
pub mod driver;
pub mod error;
pub mod recorder;
pub mod scripted;
mod scripts;

pub use chromium::ChromiumDriver;
pub use config::DriverConfig;
pub use driver::{BrowserDriver, NewTab, MAIN_TAB};
pub use error::{AdapterError, AdapterErrorKind};
pub use recorder::{ScreencastRecorder, VIDEO_EXTENSION};
pub use scripted::{ClickEffect, ScriptedBrowser, ScriptedElement, ScriptedPage};
