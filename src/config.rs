//! Compiler configuration — loads optional ~/.sstc/config.yaml.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dsl::compile::DEFAULT_SPEED;
use crate::dsl::params::ParamRules;
use crate::dsl::Compiler;

/// Artifact encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl OutputFormat {
    /// Artifact file name used when no output path is given.
    pub fn default_output(self) -> &'static str {
        match self {
            OutputFormat::Json => "story.json",
            OutputFormat::Yaml => "story.yaml",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CompilerConfig {
    /// Legal parameter names for backgrounds, modes, scene, show, and hide.
    #[serde(default = "ParamRules::default_visual")]
    pub visual_params: Vec<String>,
    /// Legal parameter names for dialogue lines.
    #[serde(default = "ParamRules::default_dialogue")]
    pub dialogue_params: Vec<String>,
    /// Dialogue typing speed when a line has no `speed`.
    #[serde(default = "default_speed")]
    pub default_speed: f64,
    #[serde(default)]
    pub format: OutputFormat,
    /// Pretty-print JSON output.
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

fn default_speed() -> f64 {
    DEFAULT_SPEED
}

fn default_pretty() -> bool {
    true
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            visual_params: ParamRules::default_visual(),
            dialogue_params: ParamRules::default_dialogue(),
            default_speed: DEFAULT_SPEED,
            format: OutputFormat::default(),
            pretty: true,
        }
    }
}

impl CompilerConfig {
    pub fn rules(&self) -> ParamRules {
        ParamRules {
            visual: self.visual_params.clone(),
            dialogue: self.dialogue_params.clone(),
        }
    }

    /// A compiler using these settings.
    pub fn compiler(&self) -> Compiler {
        Compiler::new()
            .with_rules(self.rules())
            .with_default_speed(self.default_speed)
    }
}

/// Default config path: ~/.sstc/config.yaml.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".sstc").join("config.yaml"))
}

/// Load the user config, falling back to defaults if it is missing or invalid.
pub fn load_config() -> CompilerConfig {
    default_config_path()
        .and_then(|path| std::fs::read_to_string(path).ok())
        .and_then(|content| serde_yaml::from_str(&content).ok())
        .unwrap_or_default()
}

/// Load a config file named explicitly. Errors are returned, not swallowed.
pub fn load_config_from(path: &Path) -> Result<CompilerConfig, io::Error> {
    let content = std::fs::read_to_string(path)?;
    serde_yaml::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
