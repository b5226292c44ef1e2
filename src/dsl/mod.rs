//! Story compiler — source text → tokens → checked AST → [`Story`] artifact.

pub mod ast;
pub mod compile;
pub mod error;
pub mod lexer;
pub mod params;
pub mod parser;
pub mod story;
pub mod symbols;
pub mod token;

pub use ast::*;
pub use error::{CompileError, ErrorKind};
pub use parser::{CheckedProgram, ParseOutput};
pub use story::Story;

use std::io::Read;
use std::path::Path;

use compile::{compile_program, DEFAULT_SPEED};
use lexer::Lexer;
use params::ParamRules;
use parser::Parser;

/// The story compiler.
///
/// Holds the settings that vary between projects: the legal parameter
/// tables and the default dialogue speed.
#[derive(Debug, Clone)]
pub struct Compiler {
    rules: ParamRules,
    default_speed: f64,
}

impl Default for Compiler {
    fn default() -> Self {
        Self {
            rules: ParamRules::default(),
            default_speed: DEFAULT_SPEED,
        }
    }
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(mut self, rules: ParamRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_default_speed(mut self, speed: f64) -> Self {
        self.default_speed = speed;
        self
    }

    /// Parse and check source text.
    pub fn parse(&self, source: &str) -> Result<CheckedProgram, CompileError> {
        self.parse_reader(source.as_bytes())
    }

    pub fn parse_reader<R: Read>(&self, reader: R) -> Result<CheckedProgram, CompileError> {
        self.check(Lexer::new(reader))
    }

    /// Parse, check, and generate the story for source text.
    pub fn compile(&self, source: &str) -> Result<Story, CompileError> {
        self.compile_reader(source.as_bytes())
    }

    pub fn compile_reader<R: Read>(&self, reader: R) -> Result<Story, CompileError> {
        self.generate(Lexer::new(reader))
    }

    /// Compile a source file. The file is closed on every return path.
    pub fn compile_file(&self, path: &Path) -> Result<Story, CompileError> {
        tracing::info!(path = %path.display(), "compiling");
        self.generate(Lexer::open(path)?)
    }

    fn check<R: Read>(&self, lexer: Lexer<R>) -> Result<CheckedProgram, CompileError> {
        Parser::new(lexer)
            .with_rules(self.rules.clone())
            .parse_program()
    }

    fn generate<R: Read>(&self, lexer: Lexer<R>) -> Result<Story, CompileError> {
        let checked = self.check(lexer)?;
        let story = compile_program(&checked, self.default_speed)?;
        tracing::info!(
            backgrounds = story.assets.backgrounds.len(),
            characters = story.assets.characters.len(),
            music = story.assets.music.len(),
            blocks = story.script.len(),
            commands = story.commands().count(),
            "compiled story"
        );
        Ok(story)
    }
}
