//! Token types for the story lexer.

use std::fmt;

/// A token produced by the lexer.
///
/// `lexeme` holds the token text with quotes stripped and escapes
/// resolved for strings, the comment body for comments, and the raw
/// source characters for everything else.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
    pub col: usize,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            line,
            col,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

/// The kind of token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Keywords
    Background,
    Define,
    Show,
    Hide,
    Scene,
    Music,
    Play,
    Stop,
    Choice,
    Option,
    Label,
    Jump,
    End,

    // Literals
    Identifier,
    String,
    Int,
    Float,

    // Punctuation
    Colon,
    Comma,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Arrow, // ->

    // Structural
    Comment,
    Eof,
    Unknown,
}

impl TokenKind {
    /// Resolve a word against the keyword table.
    pub fn keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "background" => TokenKind::Background,
            "define" => TokenKind::Define,
            "show" => TokenKind::Show,
            "hide" => TokenKind::Hide,
            "scene" => TokenKind::Scene,
            "music" => TokenKind::Music,
            "play" => TokenKind::Play,
            "stop" => TokenKind::Stop,
            "choice" => TokenKind::Choice,
            "option" => TokenKind::Option,
            "label" => TokenKind::Label,
            "jump" => TokenKind::Jump,
            "end" => TokenKind::End,
            _ => return None,
        };
        Some(kind)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Background => "BACKGROUND",
            TokenKind::Define => "DEFINE",
            TokenKind::Show => "SHOW",
            TokenKind::Hide => "HIDE",
            TokenKind::Scene => "SCENE",
            TokenKind::Music => "MUSIC",
            TokenKind::Play => "PLAY",
            TokenKind::Stop => "STOP",
            TokenKind::Choice => "CHOICE",
            TokenKind::Option => "OPTION",
            TokenKind::Label => "LABEL",
            TokenKind::Jump => "JUMP",
            TokenKind::End => "END",
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::String => "STRING",
            TokenKind::Int => "INT",
            TokenKind::Float => "FLOAT",
            TokenKind::Colon => "COLON",
            TokenKind::Comma => "COMMA",
            TokenKind::LParen => "LPAREN",
            TokenKind::RParen => "RPAREN",
            TokenKind::LBrace => "LBRACE",
            TokenKind::RBrace => "RBRACE",
            TokenKind::Arrow => "ARROW",
            TokenKind::Comment => "COMMENT",
            TokenKind::Eof => "EOF",
            TokenKind::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
