//! SwitchTester Common Library
//!
//! Turns raw switch compliance tester output into reports and judges them:
//! raw log -> [`DetailedReport`] -> [`FlattenedReport`] -> [`Judgement`].

pub mod classify;
pub mod config;
pub mod error;
pub mod judge;
pub mod reduce;
pub mod ryu;
pub mod store;
pub mod types;
pub mod xunit;

// Re-export commonly used types
pub use config::{Config, OpenFlowVersion, Profile, Target};
pub use error::{Error, Result};
pub use judge::judge;
pub use reduce::flatten;
pub use ryu::{parse_ryu_log, RyuParser};
pub use store::{ArtifactStore, StagePlan, SwitchArtifacts};
pub use types::*;
pub use xunit::{parse_xunit, parse_xunit_dir};

/// SwitchTester version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default program configuration path
pub fn default_config_path() -> std::path::PathBuf {
    home_dir().join(".switch_tester.conf")
}

/// Home directory, falling back to the current directory
pub(crate) fn home_dir() -> std::path::PathBuf {
    dirs::home_dir().unwrap_or_else(|| std::path::PathBuf::from("."))
}

/// Home directory helper
mod dirs {
    pub fn home_dir() -> Option<std::path::PathBuf> {
        std::env::var_os("HOME").map(std::path::PathBuf::from)
    }
}
