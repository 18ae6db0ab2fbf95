//! Program configuration, target switch and application profile files
//!
//! All three are JSON documents. Each is validated once against its list
//! of required keys (reporting every missing key together) and then
//! deserialized into a typed struct.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Program configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Working directory holding one report directory per switch model
    pub directory: PathBuf,

    /// Rename existing reports to `*.bak` before producing new ones
    #[serde(default)]
    pub backup: bool,

    /// Run the tester even when a raw log already exists
    #[serde(default)]
    pub force_test: bool,

    #[serde(default)]
    pub verbose: bool,

    #[serde(default)]
    pub ryu: RyuSettings,

    #[serde(default)]
    pub oftest: OftestSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            directory: crate::home_dir().join("switch_tester"),
            backup: false,
            force_test: false,
            verbose: false,
            ryu: RyuSettings::default(),
            oftest: OftestSettings::default(),
        }
    }
}

/// Where to find the Ryu switch test tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RyuSettings {
    #[serde(default = "default_ryu_manager")]
    pub manager: String,

    /// Directory containing `tester.py` and `of13/`
    #[serde(default)]
    pub switch_test_dir: Option<PathBuf>,
}

fn default_ryu_manager() -> String {
    "ryu-manager".to_string()
}

impl Default for RyuSettings {
    fn default() -> Self {
        Self {
            manager: default_ryu_manager(),
            switch_test_dir: None,
        }
    }
}

impl RyuSettings {
    pub fn switch_test_dir(&self) -> PathBuf {
        self.switch_test_dir
            .clone()
            .unwrap_or_else(|| crate::home_dir().join("ryu/ryu/tests/switch"))
    }
}

/// Where to find OFTest and how to launch it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OftestSettings {
    /// OFTest checkout containing `oft` and `run_switch.py`
    #[serde(default)]
    pub directory: Option<PathBuf>,

    #[serde(default = "default_python")]
    pub python: String,

    /// OFTest needs raw sockets; run it under sudo
    #[serde(default = "default_sudo")]
    pub sudo: bool,
}

fn default_python() -> String {
    "python".to_string()
}

fn default_sudo() -> bool {
    true
}

impl Default for OftestSettings {
    fn default() -> Self {
        Self {
            directory: None,
            python: default_python(),
            sudo: default_sudo(),
        }
    }
}

impl OftestSettings {
    pub fn directory(&self) -> PathBuf {
        self.directory
            .clone()
            .unwrap_or_else(|| crate::home_dir().join("oftest"))
    }
}

impl Config {
    const REQUIRED: &'static [&'static str] = &["directory"];

    /// Load configuration, writing a default file first if none exists
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(
                "Config: Config file {} not found. Generating default config at location.",
                path.display()
            );
            let default = serde_json::json!({ "directory": Config::default().directory });
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, serde_json::to_string_pretty(&default)?)?;
        }

        debug!("Config: Loading config file {}.", path.display());
        let config = Self::from_json(&std::fs::read_to_string(path)?)?;
        debug!("Config: {} loaded successfully.", path.display());
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        require_keys("Config", &value, Self::REQUIRED)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Command line flags can only switch options on
    pub fn apply_flags(&mut self, backup: bool, force_test: bool, verbose: bool) {
        self.backup |= backup;
        self.force_test |= force_test;
        self.verbose |= verbose;
    }
}

/// OpenFlow protocol version a switch is tested against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenFlowVersion {
    /// Tested with OFTest
    V1_0,
    /// Tested with the Ryu switch test tool
    V1_3,
}

impl OpenFlowVersion {
    pub fn parse(version: &str) -> Result<Self> {
        match version {
            "1.0" => Ok(OpenFlowVersion::V1_0),
            "1.3" => Ok(OpenFlowVersion::V1_3),
            other => Err(Error::InvalidConfig(format!(
                "Unknown OpenFlow version: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for OpenFlowVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpenFlowVersion::V1_0 => f.write_str("1.0"),
            OpenFlowVersion::V1_3 => f.write_str("1.3"),
        }
    }
}

/// Target switch description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Target {
    pub model: String,
    pub description: String,
    pub of_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ryu: Option<RyuTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oftest: Option<OftestTarget>,
}

/// Datapath IDs for the Ryu tester/target switch pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RyuTarget {
    #[serde(deserialize_with = "string_or_number")]
    pub tester_dpid: String,
    #[serde(deserialize_with = "string_or_number")]
    pub target_dpid: String,
}

/// OFTest dataplane wiring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OftestTarget {
    /// Comma separated `port@interface` pairs, e.g. `1@veth1,2@veth3`
    pub interfaces: String,
    /// Launch OFTest's `run_switch.py` alongside the tests
    pub run_switch_script: bool,
}

impl OftestTarget {
    pub fn interface_args(&self) -> Vec<String> {
        self.interfaces
            .split(',')
            .map(str::trim)
            .filter(|i| !i.is_empty())
            .flat_map(|i| ["-i".to_string(), i.to_string()])
            .collect()
    }
}

impl Target {
    const REQUIRED: &'static [&'static str] = &["model", "description", "of-version"];
    const RYU_REQUIRED: &'static [&'static str] = &["tester-dpid", "target-dpid"];
    const OFTEST_REQUIRED: &'static [&'static str] = &["interfaces", "run-switch-script"];

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::not_found("Target switch file", path));
        }
        debug!("Target: Loading target switch file {}.", path.display());
        let target = Self::from_json(&std::fs::read_to_string(path)?)?;
        debug!("Target: {} loaded successfully", path.display());
        Ok(target)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        require_keys("Switch", &value, Self::REQUIRED)?;

        let version = value
            .get("of-version")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidConfig("Switch: of-version must be a string".into()))?;

        let (section, keys) = match OpenFlowVersion::parse(version)? {
            OpenFlowVersion::V1_3 => ("ryu", Self::RYU_REQUIRED),
            OpenFlowVersion::V1_0 => ("oftest", Self::OFTEST_REQUIRED),
        };
        match value.get(section) {
            Some(nested) => require_keys(&format!("Switch ({})", section), nested, keys)?,
            None => return Err(Error::configuration("Switch", vec![section.to_string()])),
        }

        Ok(serde_json::from_value(value)?)
    }

    pub fn version(&self) -> Result<OpenFlowVersion> {
        OpenFlowVersion::parse(&self.of_version)
    }
}

/// Application compatibility profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    /// Group labels that must all come out OK
    pub compatibility: Vec<String>,
}

impl Profile {
    const REQUIRED: &'static [&'static str] = &["name", "compatibility"];

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::not_found("Profile file", path));
        }
        debug!("Profile: Loading profile file {}.", path.display());
        let profile = Self::from_json(&std::fs::read_to_string(path)?)?;
        debug!("Profile: {} loaded successfully", path.display());
        Ok(profile)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        require_keys("Profile", &value, Self::REQUIRED)?;
        let profile: Profile = serde_json::from_value(value)?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn new(name: impl Into<String>, compatibility: Vec<String>) -> Result<Self> {
        let profile = Self {
            name: name.into(),
            compatibility,
        };
        profile.validate()?;
        Ok(profile)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        let duplicates: BTreeSet<&str> = self
            .compatibility
            .iter()
            .filter(|label| !seen.insert(label.as_str()))
            .map(String::as_str)
            .collect();
        if duplicates.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidConfig(format!(
                "Profile {}: duplicate compatibility entries: {}",
                self.name,
                duplicates.into_iter().collect::<Vec<_>>().join(", ")
            )))
        }
    }
}

/// Fail with every key of `keys` that `value` lacks
pub fn require_keys(context: &str, value: &Value, keys: &[&str]) -> Result<()> {
    let object = value
        .as_object()
        .ok_or_else(|| Error::InvalidConfig(format!("{}: expected a JSON object", context)))?;
    let missing: Vec<String> = keys
        .iter()
        .filter(|key| !object.contains_key(**key))
        .map(|key| key.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::configuration(context, missing))
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "expected a string or number, found {}",
            other
        ))),
    }
}
