//! SwitchTester CLI
//!
//! Runs the Ryu or OFTest compliance tester against a switch, stores its
//! reports and judges them against compatibility profiles.

pub mod commands;
pub mod output;
pub mod tester;
