//! The compiled story artifact read by the playback runtime.
//!
//! Two sections: an asset catalogue and a script of label blocks. Each
//! command serializes as a map tagged by `command`, for example
//! `{"command": "scene", "background": "room"}`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Story {
    pub assets: Assets,
    pub script: Vec<LabelBlock>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Assets {
    /// Background name → image path.
    #[serde(default)]
    pub backgrounds: BTreeMap<String, String>,
    /// Music id → audio file path.
    #[serde(default)]
    pub music: BTreeMap<String, String>,
    #[serde(default)]
    pub characters: BTreeMap<String, CharacterAsset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterAsset {
    /// Display name shown in the dialogue box.
    pub name: String,
    /// Mode name → sprite.
    pub states: BTreeMap<String, StateAsset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateAsset {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<[f64; 2]>,
}

/// A run of commands. Only the entry block before the first label is unnamed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub commands: Vec<Command>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum Command {
    Scene {
        background: String,
    },
    Play {
        music: String,
    },
    Stop {
        music: String,
    },
    Show {
        character: String,
        state: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<[f64; 2]>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scale: Option<[f64; 2]>,
    },
    Hide {
        character: String,
    },
    Dialogue {
        speaker: String,
        text: String,
        speed: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<f64>,
    },
    Choice {
        prompt: String,
        options: Vec<ChoiceOption>,
    },
    Jump {
        target: String,
    },
    End,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub text: String,
    pub goto: String,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Scene { .. } => "scene",
            Command::Play { .. } => "play",
            Command::Stop { .. } => "stop",
            Command::Show { .. } => "show",
            Command::Hide { .. } => "hide",
            Command::Dialogue { .. } => "dialogue",
            Command::Choice { .. } => "choice",
            Command::Jump { .. } => "jump",
            Command::End => "end",
        }
    }

    /// Labels this command can transfer control to.
    pub fn targets(&self) -> Vec<&str> {
        match self {
            Command::Jump { target } => vec![target.as_str()],
            Command::Choice { options, .. } => options.iter().map(|o| o.goto.as_str()).collect(),
            _ => Vec::new(),
        }
    }
}

impl Story {
    /// All commands in execution order, across blocks.
    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.script.iter().flat_map(|block| block.commands.iter())
    }

    /// Label name → index of its first command in [`Story::commands`],
    /// in the order the labels were declared.
    pub fn label_index(&self) -> Vec<(&str, usize)> {
        let mut index = Vec::new();
        let mut start = 0;
        for block in &self.script {
            if let Some(label) = &block.label {
                index.push((label.as_str(), start));
            }
            start += block.commands.len();
        }
        index
    }

    pub fn block(&self, label: &str) -> Option<&LabelBlock> {
        self.script
            .iter()
            .find(|b| b.label.as_deref() == Some(label))
    }

    pub fn to_json(&self, pretty: bool) -> Result<String, serde_json::Error> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }
}
