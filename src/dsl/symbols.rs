//! Symbol table — declared names per namespace and pending label references.
//!
//! Asset names must be declared before use and never twice. Labels may be
//! referenced before they are declared, so references are only recorded
//! while parsing and checked once the whole program has been read.

use std::collections::{HashMap, HashSet};

use super::error::CompileError;

/// A `jump` or `option` target as it appeared in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelRef {
    pub name: String,
    pub line: usize,
    pub col: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    backgrounds: HashSet<String>,
    /// Character id → declared mode names.
    characters: HashMap<String, HashSet<String>>,
    music: HashSet<String>,
    labels: HashSet<String>,
    /// Label references in source order.
    references: Vec<LabelRef>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare_background(
        &mut self,
        name: &str,
        line: usize,
        col: usize,
    ) -> Result<(), CompileError> {
        if !self.backgrounds.insert(name.to_string()) {
            return Err(duplicate("background", name, line, col));
        }
        Ok(())
    }

    pub fn declare_character(
        &mut self,
        id: &str,
        line: usize,
        col: usize,
    ) -> Result<(), CompileError> {
        if self.characters.contains_key(id) {
            return Err(duplicate("character", id, line, col));
        }
        self.characters.insert(id.to_string(), HashSet::new());
        Ok(())
    }

    pub fn declare_mode(
        &mut self,
        character: &str,
        mode: &str,
        line: usize,
        col: usize,
    ) -> Result<(), CompileError> {
        let modes = self
            .characters
            .get_mut(character)
            .ok_or_else(|| undefined("character", character, line, col))?;
        if !modes.insert(mode.to_string()) {
            return Err(CompileError::semantic(
                format!("mode '{mode}' is already defined for character '{character}'"),
                line,
                col,
            ));
        }
        Ok(())
    }

    pub fn declare_music(&mut self, id: &str, line: usize, col: usize) -> Result<(), CompileError> {
        if !self.music.insert(id.to_string()) {
            return Err(duplicate("music", id, line, col));
        }
        Ok(())
    }

    pub fn declare_label(&mut self, name: &str, line: usize, col: usize) -> Result<(), CompileError> {
        if !self.labels.insert(name.to_string()) {
            return Err(duplicate("label", name, line, col));
        }
        Ok(())
    }

    pub fn require_background(&self, name: &str, line: usize, col: usize) -> Result<(), CompileError> {
        if !self.backgrounds.contains(name) {
            return Err(undefined("background", name, line, col));
        }
        Ok(())
    }

    pub fn require_character(&self, id: &str, line: usize, col: usize) -> Result<(), CompileError> {
        if !self.characters.contains_key(id) {
            return Err(undefined("character", id, line, col));
        }
        Ok(())
    }

    pub fn require_mode(
        &self,
        character: &str,
        mode: &str,
        line: usize,
        col: usize,
    ) -> Result<(), CompileError> {
        let modes = self
            .characters
            .get(character)
            .ok_or_else(|| undefined("character", character, line, col))?;
        if !modes.contains(mode) {
            return Err(CompileError::semantic(
                format!("undefined mode '{mode}' for character '{character}'"),
                line,
                col,
            ));
        }
        Ok(())
    }

    pub fn require_music(&self, id: &str, line: usize, col: usize) -> Result<(), CompileError> {
        if !self.music.contains(id) {
            return Err(undefined("music", id, line, col));
        }
        Ok(())
    }

    /// Record a label reference for the end-of-parse check.
    pub fn reference_label(&mut self, name: &str, line: usize, col: usize) {
        self.references.push(LabelRef {
            name: name.to_string(),
            line,
            col,
        });
    }

    pub fn has_label(&self, name: &str) -> bool {
        self.labels.contains(name)
    }

    /// Label references in source order.
    pub fn references(&self) -> &[LabelRef] {
        &self.references
    }

    /// References whose target was never declared, in source order.
    pub fn unresolved(&self) -> impl Iterator<Item = &LabelRef> {
        self.references
            .iter()
            .filter(|r| !self.labels.contains(&r.name))
    }

    /// Fail on the first reference to an undeclared label.
    pub fn check_references(&self) -> Result<(), CompileError> {
        match self.unresolved().next() {
            Some(r) => Err(CompileError::unresolved(
                format!("unresolved label '{}'", r.name),
                r.line,
                r.col,
            )),
            None => Ok(()),
        }
    }
}

fn duplicate(namespace: &str, name: &str, line: usize, col: usize) -> CompileError {
    CompileError::semantic(
        format!("{namespace} '{name}' is already defined"),
        line,
        col,
    )
}

fn undefined(namespace: &str, name: &str, line: usize, col: usize) -> CompileError {
    CompileError::semantic(format!("undefined {namespace} '{name}'"), line, col)
}
