//! Code generator: compiles a checked [`Program`] into a [`Story`].
//!
//! Top-level statements are bucketed into declarations (the asset
//! catalogue) and script (everything else, labels included). Each script
//! statement then maps to exactly one [`Command`].

use std::collections::BTreeMap;

use super::ast::*;
use super::error::CompileError;
use super::params::{number, Parameters};
use super::parser::CheckedProgram;
use super::story::*;
use super::symbols::SymbolTable;

/// Dialogue speed used when a line has no `speed` parameter.
pub const DEFAULT_SPEED: f64 = 30.0;

/// Top-level statements split by section, each in source order.
#[derive(Debug, Default)]
pub struct Buckets<'a> {
    pub declarations: Vec<&'a Statement>,
    /// Script statements and labels. Label bodies stay nested.
    pub script: Vec<&'a Statement>,
}

pub fn bucket(program: &Program) -> Buckets<'_> {
    let mut buckets = Buckets::default();
    for statement in &program.statements {
        if statement.is_declaration() {
            buckets.declarations.push(statement);
        } else {
            buckets.script.push(statement);
        }
    }
    buckets
}

/// Compile a checked program into a Story.
pub fn compile_program(
    checked: &CheckedProgram,
    default_speed: f64,
) -> Result<Story, CompileError> {
    let buckets = bucket(&checked.program);
    tracing::debug!(
        declarations = buckets.declarations.len(),
        script = buckets.script.len(),
        "bucketed program"
    );

    let assets = compile_assets(&buckets.declarations);

    let generator = Generator {
        symbols: &checked.symbols,
        default_speed,
    };
    let mut script: Vec<LabelBlock> = Vec::new();
    for statement in buckets.script {
        match statement {
            Statement::Label(label) => {
                let commands = label
                    .body
                    .iter()
                    .map(|s| generator.command(s, Some(label)))
                    .collect::<Result<Vec<_>, _>>()?;
                script.push(LabelBlock {
                    label: Some(label.name.clone()),
                    commands,
                });
            }
            other => {
                let command = generator.command(other, None)?;
                match script.last_mut() {
                    Some(block) if block.label.is_none() => block.commands.push(command),
                    _ => script.push(LabelBlock {
                        label: None,
                        commands: vec![command],
                    }),
                }
            }
        }
    }

    Ok(Story { assets, script })
}

fn compile_assets(declarations: &[&Statement]) -> Assets {
    let mut assets = Assets::default();
    for statement in declarations {
        match statement {
            Statement::Background(bg) => {
                assets.backgrounds.insert(bg.name.clone(), bg.image.clone());
            }
            Statement::Music(music) => {
                assets.music.insert(music.id.clone(), music.path.clone());
            }
            Statement::Character(character) => {
                let states: BTreeMap<String, StateAsset> = character
                    .modes
                    .iter()
                    .map(|mode| {
                        let state = StateAsset {
                            path: mode.image.clone(),
                            scale: uniform_scale(&mode.params),
                        };
                        (mode.name.clone(), state)
                    })
                    .collect();
                assets.characters.insert(
                    character.id.clone(),
                    CharacterAsset {
                        name: character.display_name.clone(),
                        states,
                    },
                );
            }
            _ => {}
        }
    }
    assets
}

/// `scale: s` → `[s, s]`.
fn uniform_scale(params: &Parameters) -> Option<[f64; 2]> {
    number(params, "scale").map(|s| [s, s])
}

/// `x`/`y` → `[x, y]` when either is given; the other defaults to 0.
fn position(params: &Parameters) -> Option<[f64; 2]> {
    match (number(params, "x"), number(params, "y")) {
        (None, None) => None,
        (x, y) => Some([x.unwrap_or(0.0), y.unwrap_or(0.0)]),
    }
}

struct Generator<'a> {
    symbols: &'a SymbolTable,
    default_speed: f64,
}

impl Generator<'_> {
    /// Translate one script statement. `label` is the enclosing block.
    fn command(
        &self,
        statement: &Statement,
        label: Option<&LabelNode>,
    ) -> Result<Command, CompileError> {
        let command = match statement {
            Statement::Scene(scene) => Command::Scene {
                background: scene.background.clone(),
            },
            Statement::Show(show) => Command::Show {
                character: show.character.clone(),
                state: show.mode.clone(),
                position: position(&show.params),
                scale: uniform_scale(&show.params),
            },
            Statement::Hide(hide) => Command::Hide {
                character: hide.character.clone(),
            },
            Statement::Dialogue(line) => Command::Dialogue {
                speaker: line.speaker.clone(),
                text: line.text.clone(),
                speed: number(&line.params, "speed").unwrap_or(self.default_speed),
                size: number(&line.params, "size"),
            },
            Statement::Play(play) => Command::Play {
                music: play.music.clone(),
            },
            Statement::Stop(stop) => Command::Stop {
                music: stop.music.clone(),
            },
            Statement::Choice(choice) => {
                let options = choice
                    .options
                    .iter()
                    .map(|option| {
                        self.target(&option.target).map(|goto| ChoiceOption {
                            text: option.text.clone(),
                            goto,
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Command::Choice {
                    prompt: choice.prompt.clone(),
                    options,
                }
            }
            Statement::Jump(jump) => Command::Jump {
                target: self.target(&jump.target)?,
            },
            Statement::End => Command::End,
            Statement::Background(_)
            | Statement::Character(_)
            | Statement::Music(_)
            | Statement::Label(_) => {
                let (name, line, col) = label
                    .map(|l| (l.name.as_str(), l.line, l.col))
                    .unwrap_or(("", 0, 0));
                return Err(CompileError::semantic(
                    format!(
                        "'{}' cannot appear inside label '{name}'",
                        statement.keyword()
                    ),
                    line,
                    col,
                ));
            }
        };
        Ok(command)
    }

    fn target(&self, label: &str) -> Result<String, CompileError> {
        if !self.symbols.has_label(label) {
            let (line, col) = self
                .symbols
                .references()
                .iter()
                .find(|r| r.name == label)
                .map(|r| (r.line, r.col))
                .unwrap_or((0, 0));
            return Err(CompileError::unresolved(
                format!("unresolved label '{label}'"),
                line,
                col,
            ));
        }
        Ok(label.to_string())
    }
}
