//! Abstract Syntax Tree for the story language.
//!
//! Every node owns its children; the tree is built once by the parser and
//! only read afterwards.

use super::params::Parameters;

/// Speaker recorded for narrator lines (a bare string statement).
pub const NARRATOR: &str = "You";

/// A complete story program: top-level statements in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

/// One statement. Labels carry their own nested statements.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Background(BackgroundNode),
    Character(CharacterNode),
    Music(MusicNode),
    Scene(SceneNode),
    Show(ShowNode),
    Hide(HideNode),
    Dialogue(DialogueNode),
    Play(PlayNode),
    Stop(StopNode),
    Choice(ChoiceNode),
    Label(LabelNode),
    Jump(JumpNode),
    End,
}

impl Statement {
    /// Asset declarations: backgrounds, characters, and music.
    pub fn is_declaration(&self) -> bool {
        matches!(
            self,
            Statement::Background(_) | Statement::Character(_) | Statement::Music(_)
        )
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Statement::Background(_) => "background",
            Statement::Character(_) => "define",
            Statement::Music(_) => "music",
            Statement::Scene(_) => "scene",
            Statement::Show(_) => "show",
            Statement::Hide(_) => "hide",
            Statement::Dialogue(_) => "dialogue",
            Statement::Play(_) => "play",
            Statement::Stop(_) => "stop",
            Statement::Choice(_) => "choice",
            Statement::Label(_) => "label",
            Statement::Jump(_) => "jump",
            Statement::End => "end",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundNode {
    pub name: String,
    pub image: String,
    pub params: Parameters,
}

/// `define id "Display Name" { mode: (...), ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterNode {
    pub id: String,
    pub display_name: String,
    pub modes: Vec<CharacterMode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CharacterMode {
    pub name: String,
    pub image: String,
    pub params: Parameters,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MusicNode {
    pub id: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub background: String,
    pub params: Parameters,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShowNode {
    pub character: String,
    pub mode: String,
    pub params: Parameters,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HideNode {
    pub character: String,
    pub params: Parameters,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DialogueNode {
    /// Character id, or [`NARRATOR`].
    pub speaker: String,
    pub text: String,
    pub params: Parameters,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayNode {
    pub music: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StopNode {
    pub music: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceNode {
    pub prompt: String,
    pub options: Vec<OptionNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptionNode {
    pub text: String,
    pub target: String,
}

/// A labelled block. It runs until the next `label` or end of file.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelNode {
    pub name: String,
    pub body: Vec<Statement>,
    pub line: usize,
    pub col: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JumpNode {
    pub target: String,
}
