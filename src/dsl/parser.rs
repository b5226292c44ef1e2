//! Parser for the story language.
//!
//! Recursive descent over the lexer's token stream with a single `current`
//! token of lookahead (plus one peek to tell `ana "Hi"` dialogue apart
//! from other statements). Semantic checks run while parsing and fill the
//! [`SymbolTable`]; label references are checked by
//! [`ParseOutput::finish`] once the whole program has been read.

use std::io::Read;
use std::mem;

use super::ast::*;
use super::error::CompileError;
use super::lexer::Lexer;
use super::params::{ParamContext, ParamRules, ParamValue, Parameters};
use super::symbols::{LabelRef, SymbolTable};
use super::token::{Token, TokenKind};

pub struct Parser<R> {
    lexer: Lexer<R>,
    current: Token,
    symbols: SymbolTable,
    rules: ParamRules,
}

/// A parsed program whose label references are not yet checked.
#[derive(Debug)]
pub struct ParseOutput {
    pub program: Program,
    pub symbols: SymbolTable,
}

/// A parsed program with every label reference resolved.
#[derive(Debug)]
pub struct CheckedProgram {
    pub program: Program,
    pub symbols: SymbolTable,
}

impl ParseOutput {
    /// Label references that no `label` declares, in source order.
    pub fn unresolved(&self) -> impl Iterator<Item = &LabelRef> {
        self.symbols.unresolved()
    }

    /// Check every jump/option target against the declared labels.
    pub fn finish(self) -> Result<CheckedProgram, CompileError> {
        self.symbols.check_references()?;
        Ok(CheckedProgram {
            program: self.program,
            symbols: self.symbols,
        })
    }
}

impl<R: Read> Parser<R> {
    pub fn new(lexer: Lexer<R>) -> Self {
        let mut parser = Self {
            lexer,
            current: Token::new(TokenKind::Eof, "", 0, 0),
            symbols: SymbolTable::new(),
            rules: ParamRules::default(),
        };
        parser.advance();
        parser
    }

    pub fn with_rules(mut self, rules: ParamRules) -> Self {
        self.rules = rules;
        self
    }

    /// Parse and check the whole program.
    pub fn parse_program(self) -> Result<CheckedProgram, CompileError> {
        self.parse()?.finish()
    }

    /// Parse the whole token stream without the deferred label check.
    pub fn parse(mut self) -> Result<ParseOutput, CompileError> {
        let result = self.parse_statements();
        // A truncated read explains any syntax error that follows from it.
        if let Some(e) = self.lexer.take_io_error() {
            return Err(CompileError::io(format!("failed to read source: {e}")));
        }
        let program = result?;
        Ok(ParseOutput {
            program,
            symbols: self.symbols,
        })
    }

    fn parse_statements(&mut self) -> Result<Program, CompileError> {
        let mut statements = Vec::new();
        while !self.check(TokenKind::Eof) {
            let statement = if self.check(TokenKind::Label) {
                Statement::Label(self.parse_label()?)
            } else {
                self.parse_statement(None)?
            };
            statements.push(statement);
        }
        Ok(Program { statements })
    }

    /// Parse one non-label statement. `label` names the enclosing block.
    fn parse_statement(&mut self, label: Option<&str>) -> Result<Statement, CompileError> {
        let line = self.current.line;

        if let Some(label) = label {
            if matches!(
                self.current.kind,
                TokenKind::Background | TokenKind::Define | TokenKind::Music
            ) {
                return Err(CompileError::semantic(
                    format!(
                        "'{}' declarations are only allowed at top level, not inside label '{label}'",
                        self.current.lexeme
                    ),
                    self.current.line,
                    self.current.col,
                ));
            }
        }

        let kind = self.current.kind;
        let statement = match kind {
            TokenKind::Background => Statement::Background(self.parse_background()?),
            TokenKind::Define => Statement::Character(self.parse_define()?),
            TokenKind::Music => Statement::Music(self.parse_music()?),
            TokenKind::Scene => Statement::Scene(self.parse_scene()?),
            TokenKind::Show => Statement::Show(self.parse_show()?),
            TokenKind::Hide => Statement::Hide(self.parse_hide()?),
            TokenKind::Play => Statement::Play(PlayNode {
                music: self.parse_music_use()?,
            }),
            TokenKind::Stop => Statement::Stop(StopNode {
                music: self.parse_music_use()?,
            }),
            TokenKind::Choice => Statement::Choice(self.parse_choice()?),
            TokenKind::Jump => Statement::Jump(self.parse_jump()?),
            TokenKind::End => {
                self.advance();
                Statement::End
            }
            _ if self.is_dialogue() => Statement::Dialogue(self.parse_dialogue()?),
            _ => return Err(self.error_here("expected a statement")),
        };

        tracing::debug!(statement = statement.keyword(), line, "parsed statement");
        Ok(statement)
    }

    /// An identifier starts a dialogue line only when a string follows it.
    fn is_dialogue(&mut self) -> bool {
        match self.current.kind {
            TokenKind::String => true,
            TokenKind::Identifier => self.peek_kind() == TokenKind::String,
            _ => false,
        }
    }

    /// `label ID ":" statement*`, ending at the next `label` or end of file.
    fn parse_label(&mut self) -> Result<LabelNode, CompileError> {
        self.expect(TokenKind::Label, "expected 'label'")?;
        let name = self.expect(TokenKind::Identifier, "expected label name")?;
        self.expect(TokenKind::Colon, "expected ':' after label name")?;
        self.symbols.declare_label(&name.lexeme, name.line, name.col)?;

        let mut body = Vec::new();
        while !self.check(TokenKind::Label) && !self.check(TokenKind::Eof) {
            body.push(self.parse_statement(Some(&name.lexeme))?);
        }

        tracing::debug!(label = %name.lexeme, statements = body.len(), "parsed label");
        Ok(LabelNode {
            name: name.lexeme,
            body,
            line: name.line,
            col: name.col,
        })
    }

    /// `background ID "(" STRING ("," param)* ")"`
    fn parse_background(&mut self) -> Result<BackgroundNode, CompileError> {
        self.expect(TokenKind::Background, "expected 'background'")?;
        let name = self.expect(TokenKind::Identifier, "expected background name")?;
        self.symbols
            .declare_background(&name.lexeme, name.line, name.col)?;

        self.expect(TokenKind::LParen, "expected '(' after background name")?;
        let image = self.expect(TokenKind::String, "expected image path string")?;
        let params = self.parse_trailing_params(ParamContext::Visual)?;
        self.expect(TokenKind::RParen, "expected ')' to close background")?;

        Ok(BackgroundNode {
            name: name.lexeme,
            image: image.lexeme,
            params,
        })
    }

    /// `define ID STRING "{" mode ("," mode)* "}"`
    fn parse_define(&mut self) -> Result<CharacterNode, CompileError> {
        self.expect(TokenKind::Define, "expected 'define'")?;
        let id = self.expect(TokenKind::Identifier, "expected character id")?;
        self.symbols.declare_character(&id.lexeme, id.line, id.col)?;
        let display_name = self.expect(TokenKind::String, "expected character display name string")?;
        self.expect(TokenKind::LBrace, "expected '{' before character modes")?;

        let mut modes = vec![self.parse_mode(&id.lexeme)?];
        while self.check(TokenKind::Comma) {
            self.advance();
            modes.push(self.parse_mode(&id.lexeme)?);
        }
        self.expect(TokenKind::RBrace, "expected '}' to close character modes")?;

        Ok(CharacterNode {
            id: id.lexeme,
            display_name: display_name.lexeme,
            modes,
        })
    }

    /// `ID ":" "(" STRING ("," param)* ")"`
    fn parse_mode(&mut self, character: &str) -> Result<CharacterMode, CompileError> {
        let name = self.expect(TokenKind::Identifier, "expected mode name")?;
        self.symbols
            .declare_mode(character, &name.lexeme, name.line, name.col)?;
        self.expect(TokenKind::Colon, "expected ':' after mode name")?;
        self.expect(TokenKind::LParen, "expected '(' before mode image")?;
        let image = self.expect(TokenKind::String, "expected mode image path string")?;
        let params = self.parse_trailing_params(ParamContext::Visual)?;
        self.expect(TokenKind::RParen, "expected ')' to close mode")?;

        Ok(CharacterMode {
            name: name.lexeme,
            image: image.lexeme,
            params,
        })
    }

    /// `music ID STRING`
    fn parse_music(&mut self) -> Result<MusicNode, CompileError> {
        self.expect(TokenKind::Music, "expected 'music'")?;
        let id = self.expect(TokenKind::Identifier, "expected music id")?;
        self.symbols.declare_music(&id.lexeme, id.line, id.col)?;
        let path = self.expect(TokenKind::String, "expected music file path string")?;
        Ok(MusicNode {
            id: id.lexeme,
            path: path.lexeme,
        })
    }

    /// `("play" | "stop") ID`
    fn parse_music_use(&mut self) -> Result<String, CompileError> {
        let keyword = self.advance();
        let id = self.expect(
            TokenKind::Identifier,
            &format!("expected music id after '{}'", keyword.lexeme),
        )?;
        self.symbols.require_music(&id.lexeme, id.line, id.col)?;
        Ok(id.lexeme)
    }

    /// `scene ID ["(" params ")"]`
    fn parse_scene(&mut self) -> Result<SceneNode, CompileError> {
        self.expect(TokenKind::Scene, "expected 'scene'")?;
        let background = self.expect(TokenKind::Identifier, "expected background name")?;
        self.symbols
            .require_background(&background.lexeme, background.line, background.col)?;
        let params = self.parse_optional_params(ParamContext::Visual)?;
        Ok(SceneNode {
            background: background.lexeme,
            params,
        })
    }

    /// `show ID ID ["(" params ")"]`
    fn parse_show(&mut self) -> Result<ShowNode, CompileError> {
        self.expect(TokenKind::Show, "expected 'show'")?;
        let character = self.expect(TokenKind::Identifier, "expected character id")?;
        self.symbols
            .require_character(&character.lexeme, character.line, character.col)?;
        let mode = self.expect(TokenKind::Identifier, "expected mode name after character id")?;
        self.symbols
            .require_mode(&character.lexeme, &mode.lexeme, mode.line, mode.col)?;
        let params = self.parse_optional_params(ParamContext::Visual)?;
        Ok(ShowNode {
            character: character.lexeme,
            mode: mode.lexeme,
            params,
        })
    }

    /// `hide ID ["(" params ")"]`
    fn parse_hide(&mut self) -> Result<HideNode, CompileError> {
        self.expect(TokenKind::Hide, "expected 'hide'")?;
        let character = self.expect(TokenKind::Identifier, "expected character id")?;
        self.symbols
            .require_character(&character.lexeme, character.line, character.col)?;
        let params = self.parse_optional_params(ParamContext::Visual)?;
        Ok(HideNode {
            character: character.lexeme,
            params,
        })
    }

    /// `(STRING | ID STRING) ["(" params ")"]`
    fn parse_dialogue(&mut self) -> Result<DialogueNode, CompileError> {
        let speaker = if self.check(TokenKind::Identifier) {
            self.advance().lexeme
        } else {
            NARRATOR.to_string()
        };
        let text = self.expect(TokenKind::String, "expected dialogue text string")?;
        let params = self.parse_optional_params(ParamContext::Dialogue)?;
        Ok(DialogueNode {
            speaker,
            text: text.lexeme,
            params,
        })
    }

    /// `choice STRING ("option" STRING "->" ID)*`
    fn parse_choice(&mut self) -> Result<ChoiceNode, CompileError> {
        self.expect(TokenKind::Choice, "expected 'choice'")?;
        let prompt = self.expect(TokenKind::String, "expected choice prompt string")?;

        let mut options = Vec::new();
        while self.check(TokenKind::Option) {
            self.advance();
            let text = self.expect(TokenKind::String, "expected option text string")?;
            self.expect(TokenKind::Arrow, "expected '->' after option text")?;
            let target = self.expect(TokenKind::Identifier, "expected target label name")?;
            self.symbols
                .reference_label(&target.lexeme, target.line, target.col);
            options.push(OptionNode {
                text: text.lexeme,
                target: target.lexeme,
            });
        }

        Ok(ChoiceNode {
            prompt: prompt.lexeme,
            options,
        })
    }

    /// `jump ID`
    fn parse_jump(&mut self) -> Result<JumpNode, CompileError> {
        self.expect(TokenKind::Jump, "expected 'jump'")?;
        let target = self.expect(TokenKind::Identifier, "expected target label name")?;
        self.symbols
            .reference_label(&target.lexeme, target.line, target.col);
        Ok(JumpNode {
            target: target.lexeme,
        })
    }

    /// `["(" param ("," param)* ")"]`
    fn parse_optional_params(&mut self, context: ParamContext) -> Result<Parameters, CompileError> {
        if !self.check(TokenKind::LParen) {
            return Ok(Parameters::new());
        }
        self.advance();
        let mut params = Parameters::new();
        self.parse_param(context, &mut params)?;
        while self.check(TokenKind::Comma) {
            self.advance();
            self.parse_param(context, &mut params)?;
        }
        self.expect(TokenKind::RParen, "expected ')' to close parameters")?;
        Ok(params)
    }

    /// `("," param)*` after a leading image path.
    fn parse_trailing_params(&mut self, context: ParamContext) -> Result<Parameters, CompileError> {
        let mut params = Parameters::new();
        while self.check(TokenKind::Comma) {
            self.advance();
            self.parse_param(context, &mut params)?;
        }
        Ok(params)
    }

    /// `ID ":" (INT | FLOAT | ID | STRING)`
    fn parse_param(
        &mut self,
        context: ParamContext,
        params: &mut Parameters,
    ) -> Result<(), CompileError> {
        let name = self.expect(TokenKind::Identifier, "expected parameter name")?;
        self.expect(TokenKind::Colon, "expected ':' after parameter name")?;

        let value = match self.current.kind {
            TokenKind::Int => {
                let token = self.advance();
                let v = token.lexeme.parse::<i64>().map_err(|_| {
                    CompileError::semantic(
                        format!("integer '{}' for parameter '{}' is out of range", token.lexeme, name.lexeme),
                        token.line,
                        token.col,
                    )
                })?;
                ParamValue::Int(v)
            }
            TokenKind::Float => {
                let token = self.advance();
                let v = token
                    .lexeme
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| {
                        CompileError::semantic(
                            format!("number '{}' for parameter '{}' is out of range", token.lexeme, name.lexeme),
                            token.line,
                            token.col,
                        )
                    })?;
                ParamValue::Float(v)
            }
            TokenKind::Identifier | TokenKind::String => ParamValue::Str(self.advance().lexeme),
            _ => return Err(self.error_here("expected parameter value")),
        };

        self.rules
            .check(context, &name.lexeme, &value, name.line, name.col)?;
        if params.contains_key(&name.lexeme) {
            return Err(CompileError::semantic(
                format!("duplicate parameter '{}'", name.lexeme),
                name.line,
                name.col,
            ));
        }
        params.insert(name.lexeme, value);
        Ok(())
    }

    // --- Utility methods ---

    /// Consume the current token and move to the next non-comment token.
    fn advance(&mut self) -> Token {
        let next = loop {
            let token = self.lexer.next_token();
            if !token.is(TokenKind::Comment) {
                break token;
            }
        };
        mem::replace(&mut self.current, next)
    }

    /// Kind of the first non-comment token after `current`.
    fn peek_kind(&mut self) -> TokenKind {
        let mut n = 1;
        loop {
            let kind = self.lexer.peek_token(n).kind;
            if kind != TokenKind::Comment {
                return kind;
            }
            n += 1;
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.is(kind)
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> Result<Token, CompileError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_here(message))
        }
    }

    fn error_here(&self, message: &str) -> CompileError {
        let t = &self.current;
        match t.kind {
            TokenKind::Unknown => CompileError::lex(
                format!("{message}, found invalid token '{}'", t.lexeme),
                t.line,
                t.col,
            ),
            TokenKind::Eof => {
                CompileError::syntax(format!("{message}, found end of file"), t.line, t.col)
            }
            TokenKind::String => CompileError::syntax(
                format!("{message}, found string \"{}\"", t.lexeme),
                t.line,
                t.col,
            ),
            _ => CompileError::syntax(
                format!("{message}, found '{}'", t.lexeme),
                t.line,
                t.col,
            ),
        }
    }
}
