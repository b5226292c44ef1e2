//! Streaming lexer for the story language.
//!
//! Reads the source through a fixed-size buffer that is refilled on
//! exhaustion, and converts it into [`Token`]s on demand. Malformed input
//! never fails here: it becomes [`TokenKind::Unknown`] and the parser
//! decides whether that is fatal.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use super::error::CompileError;
use super::token::{Token, TokenKind};

const BUFFER_SIZE: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Identifier,
    Number,
    String,
    Error,
}

pub struct Lexer<R> {
    source: R,
    buffer: Vec<u8>,
    buffer_pos: usize,
    buffer_len: usize,
    /// Byte under the cursor; `None` once the source is exhausted.
    current: Option<u8>,
    end_of_input: bool,
    line: usize,
    col: usize,
    lookahead: VecDeque<Token>,
    io_error: Option<io::Error>,
}

impl Lexer<File> {
    /// Open a source file for lexing. The handle is closed when the lexer
    /// is dropped.
    pub fn open(path: &Path) -> Result<Self, CompileError> {
        let file = File::open(path).map_err(|e| {
            CompileError::io(format!("cannot open '{}': {e}", path.display()))
        })?;
        Ok(Self::new(file))
    }
}

impl<'a> Lexer<&'a [u8]> {
    pub fn from_source(source: &'a str) -> Self {
        Self::new(source.as_bytes())
    }
}

impl<R: Read> Lexer<R> {
    pub fn new(source: R) -> Self {
        let mut lexer = Self {
            source,
            buffer: vec![0; BUFFER_SIZE],
            buffer_pos: 0,
            buffer_len: 0,
            current: None,
            end_of_input: false,
            line: 1,
            col: 1,
            lookahead: VecDeque::new(),
            io_error: None,
        };
        lexer.bump();
        lexer
    }

    /// Consume and return the next token.
    pub fn next_token(&mut self) -> Token {
        let token = match self.lookahead.pop_front() {
            Some(token) => token,
            None => self.lex(),
        };
        tracing::trace!(kind = %token.kind, lexeme = %token.lexeme, line = token.line, "token");
        token
    }

    /// Return the `n`-th unconsumed token (1-based) without consuming any.
    pub fn peek_token(&mut self, n: usize) -> &Token {
        let n = n.max(1);
        while self.lookahead.len() < n {
            let token = self.lex();
            self.lookahead.push_back(token);
        }
        &self.lookahead[n - 1]
    }

    /// Lex the whole input, including the trailing `Eof` token.
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.is(TokenKind::Eof);
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }

    /// The read error that cut the input short, if any.
    pub fn take_io_error(&mut self) -> Option<io::Error> {
        self.io_error.take()
    }

    fn read_byte(&mut self) -> Option<u8> {
        if self.end_of_input {
            return None;
        }
        if self.buffer_pos >= self.buffer_len {
            loop {
                match self.source.read(&mut self.buffer) {
                    Ok(0) => {
                        self.end_of_input = true;
                        return None;
                    }
                    Ok(n) => {
                        self.buffer_len = n;
                        self.buffer_pos = 0;
                        break;
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        self.io_error = Some(e);
                        self.end_of_input = true;
                        return None;
                    }
                }
            }
        }
        let byte = self.buffer[self.buffer_pos];
        self.buffer_pos += 1;
        Some(byte)
    }

    /// Move the cursor past the current byte.
    fn bump(&mut self) {
        match self.current {
            Some(b'\n') => {
                self.line += 1;
                self.col = 1;
            }
            Some(_) => self.col += 1,
            None => {}
        }
        self.current = self.read_byte();
    }

    fn lex(&mut self) -> Token {
        let mut state = State::Start;
        let mut lexeme: Vec<u8> = Vec::new();
        let mut line = self.line;
        let mut col = self.col;

        loop {
            match state {
                State::Start => {
                    let Some(ch) = self.current else {
                        return Token::new(TokenKind::Eof, "", self.line, self.col);
                    };
                    line = self.line;
                    col = self.col;

                    match ch {
                        c if c.is_ascii_whitespace() => self.bump(),
                        b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                            lexeme.push(ch);
                            self.bump();
                            state = State::Identifier;
                        }
                        b'0'..=b'9' => {
                            lexeme.push(ch);
                            self.bump();
                            state = State::Number;
                        }
                        b'"' => {
                            self.bump(); // consume opening '"'
                            state = State::String;
                        }
                        b'#' => return self.lex_comment(line, col),
                        b'-' => {
                            self.bump();
                            match self.current {
                                Some(d) if d.is_ascii_digit() => {
                                    lexeme.push(b'-');
                                    state = State::Number;
                                }
                                Some(b'>') => {
                                    self.bump();
                                    return Token::new(TokenKind::Arrow, "->", line, col);
                                }
                                _ => return Token::new(TokenKind::Unknown, "-", line, col),
                            }
                        }
                        _ => match punctuation(ch) {
                            Some(kind) => {
                                self.bump();
                                return Token::new(kind, (ch as char).to_string(), line, col);
                            }
                            None => state = State::Error,
                        },
                    }
                }

                State::Identifier => {
                    while let Some(c) = self.current {
                        if !(c.is_ascii_alphanumeric() || c == b'_') {
                            break;
                        }
                        lexeme.push(c);
                        self.bump();
                    }
                    let word = text(lexeme);
                    let kind = TokenKind::keyword(&word).unwrap_or(TokenKind::Identifier);
                    return Token::new(kind, word, line, col);
                }

                State::Number => {
                    let mut seen_dot = false;
                    while let Some(c) = self.current {
                        if c.is_ascii_digit() {
                            lexeme.push(c);
                        } else if c == b'.' && !seen_dot {
                            seen_dot = true;
                            lexeme.push(c);
                        } else {
                            break;
                        }
                        self.bump();
                    }
                    let kind = if seen_dot {
                        TokenKind::Float
                    } else {
                        TokenKind::Int
                    };
                    return Token::new(kind, text(lexeme), line, col);
                }

                State::String => loop {
                    match self.current {
                        // Unterminated: degrade instead of failing.
                        None => return Token::new(TokenKind::Unknown, text(lexeme), line, col),
                        Some(b'"') => {
                            self.bump();
                            return Token::new(TokenKind::String, text(lexeme), line, col);
                        }
                        Some(b'\\') => {
                            self.bump();
                            if let Some(escaped) = self.current {
                                match escaped {
                                    b'n' => lexeme.push(b'\n'),
                                    b't' => lexeme.push(b'\t'),
                                    b'\\' | b'"' | b'\'' => lexeme.push(escaped),
                                    other => {
                                        lexeme.push(b'\\');
                                        lexeme.push(other);
                                    }
                                }
                                self.bump();
                            }
                        }
                        Some(c) => {
                            lexeme.push(c);
                            self.bump();
                        }
                    }
                },

                State::Error => {
                    while let Some(c) = self.current {
                        if c.is_ascii_whitespace() {
                            break;
                        }
                        lexeme.push(c);
                        self.bump();
                    }
                    return Token::new(TokenKind::Unknown, text(lexeme), line, col);
                }
            }
        }
    }

    fn lex_comment(&mut self, line: usize, col: usize) -> Token {
        self.bump(); // consume '#'
        let mut body = Vec::new();
        while let Some(c) = self.current {
            if c == b'\n' {
                break;
            }
            body.push(c);
            self.bump();
        }
        let body = text(body);
        Token::new(TokenKind::Comment, body.trim(), line, col)
    }
}

fn punctuation(ch: u8) -> Option<TokenKind> {
    let kind = match ch {
        b':' => TokenKind::Colon,
        b',' => TokenKind::Comma,
        b'(' => TokenKind::LParen,
        b')' => TokenKind::RParen,
        b'{' => TokenKind::LBrace,
        b'}' => TokenKind::RBrace,
        _ => return None,
    };
    Some(kind)
}

fn text(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::from_source(src)
            .tokenize()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lex_keywords() {
        let src = "background define show hide scene music play stop choice option label jump end";
        assert_eq!(
            kinds(src),
            vec![
                TokenKind::Background,
                TokenKind::Define,
                TokenKind::Show,
                TokenKind::Hide,
                TokenKind::Scene,
                TokenKind::Music,
                TokenKind::Play,
                TokenKind::Stop,
                TokenKind::Choice,
                TokenKind::Option,
                TokenKind::Label,
                TokenKind::Jump,
                TokenKind::End,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_identifier_with_underscore_and_digits() {
        let mut lexer = Lexer::from_source("_ana2 background_x");
        let first = lexer.next_token();
        assert_eq!(first.kind, TokenKind::Identifier);
        assert_eq!(first.lexeme, "_ana2");
        let second = lexer.next_token();
        assert_eq!(second.kind, TokenKind::Identifier);
        assert_eq!(second.lexeme, "background_x");
    }

    #[test]
    fn lex_punctuation() {
        assert_eq!(
            kinds(": , ( ) { } ->"),
            vec![
                TokenKind::Colon,
                TokenKind::Comma,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::Arrow,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_numbers() {
        let tokens = Lexer::from_source("42 1.5 -7 -0.25 3.").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Int);
        assert_eq!(tokens[0].lexeme, "42");
        assert_eq!(tokens[1].kind, TokenKind::Float);
        assert_eq!(tokens[1].lexeme, "1.5");
        assert_eq!(tokens[2].kind, TokenKind::Int);
        assert_eq!(tokens[2].lexeme, "-7");
        assert_eq!(tokens[3].kind, TokenKind::Float);
        assert_eq!(tokens[3].lexeme, "-0.25");
        assert_eq!(tokens[4].kind, TokenKind::Float);
    }

    #[test]
    fn lex_number_takes_at_most_one_dot() {
        let tokens = Lexer::from_source("1.2.3").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Float);
        assert_eq!(tokens[0].lexeme, "1.2");
        assert_eq!(tokens[1].kind, TokenKind::Unknown);
        assert_eq!(tokens[1].lexeme, ".3");
    }

    #[test]
    fn lex_lone_dash_is_unknown() {
        let tokens = Lexer::from_source("- x").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Unknown);
        assert_eq!(tokens[0].lexeme, "-");
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
    }

    #[test]
    fn lex_string_with_escapes() {
        let mut lexer = Lexer::from_source(r#""say \"hi\"\n\tand \\ \'bye\'""#);
        let token = lexer.next_token();
        assert_eq!(token.kind, TokenKind::String);
        assert_eq!(token.lexeme, "say \"hi\"\n\tand \\ 'bye'");
    }

    #[test]
    fn lex_unknown_escape_is_kept_verbatim() {
        let token = Lexer::from_source(r#""a\qb""#).next_token();
        assert_eq!(token.kind, TokenKind::String);
        assert_eq!(token.lexeme, "a\\qb");
    }

    #[test]
    fn lex_unterminated_string_is_unknown() {
        let tokens = Lexer::from_source("\"never closed").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Unknown);
        assert_eq!(tokens[0].lexeme, "never closed");
        assert_eq!(tokens[1].kind, TokenKind::Eof);
    }

    #[test]
    fn lex_utf8_string() {
        let token = Lexer::from_source("\"¡Hola, Ana!\"").next_token();
        assert_eq!(token.kind, TokenKind::String);
        assert_eq!(token.lexeme, "¡Hola, Ana!");
    }

    #[test]
    fn lex_comment_token() {
        let tokens = Lexer::from_source("scene room # the opening\nend").tokenize();
        assert_eq!(tokens[2].kind, TokenKind::Comment);
        assert_eq!(tokens[2].lexeme, "the opening");
        assert_eq!(tokens[3].kind, TokenKind::End);
        assert_eq!(tokens[3].line, 2);
    }

    #[test]
    fn lex_unknown_character_run() {
        let tokens = Lexer::from_source("@@bad ok").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Unknown);
        assert_eq!(tokens[0].lexeme, "@@bad");
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
    }

    #[test]
    fn lex_line_and_column_tracking() {
        let tokens = Lexer::from_source("scene room\n  show ana happy").tokenize();
        assert_eq!((tokens[0].line, tokens[0].col), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].col), (1, 7));
        assert_eq!((tokens[2].line, tokens[2].col), (2, 3));
        assert_eq!((tokens[4].line, tokens[4].col), (2, 12));
    }

    #[test]
    fn lex_empty_input() {
        let tokens = Lexer::from_source("").tokenize();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
    }

    #[test]
    fn eof_is_sticky() {
        let mut lexer = Lexer::from_source("end");
        assert_eq!(lexer.next_token().kind, TokenKind::End);
        for _ in 0..3 {
            assert_eq!(lexer.next_token().kind, TokenKind::Eof);
        }
    }

    #[test]
    fn peek_does_not_consume() {
        let mut lexer = Lexer::from_source("ana \"Hello\" end");
        assert_eq!(lexer.peek_token(2).kind, TokenKind::String);
        assert_eq!(lexer.peek_token(1).kind, TokenKind::Identifier);
        assert_eq!(lexer.peek_token(3).kind, TokenKind::End);
        assert_eq!(lexer.next_token().lexeme, "ana");
        assert_eq!(lexer.next_token().lexeme, "Hello");
        assert_eq!(lexer.next_token().kind, TokenKind::End);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
    }

    #[test]
    fn peek_past_end_yields_eof() {
        let mut lexer = Lexer::from_source("end");
        assert_eq!(lexer.peek_token(5).kind, TokenKind::Eof);
        assert_eq!(lexer.next_token().kind, TokenKind::End);
    }

    #[test]
    fn tokens_span_buffer_refills() {
        let name = "a".repeat(BUFFER_SIZE + 17);
        let src = format!("show {name} \"{}\"", "x".repeat(BUFFER_SIZE * 2));
        let tokens = Lexer::from_source(&src).tokenize();
        assert_eq!(tokens[1].lexeme.len(), BUFFER_SIZE + 17);
        assert_eq!(tokens[2].kind, TokenKind::String);
        assert_eq!(tokens[2].lexeme.len(), BUFFER_SIZE * 2);
        assert_eq!(tokens[3].kind, TokenKind::Eof);
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("disk on fire"))
        }
    }

    #[test]
    fn read_error_degrades_to_eof_and_is_retained() {
        let mut lexer = Lexer::new(FailingReader);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
        let err = lexer.take_io_error().unwrap();
        assert_eq!(err.to_string(), "disk on fire");
    }

    #[test]
    fn open_missing_file_is_io_error() {
        let result = Lexer::open(Path::new("/definitely/not/here.sst"));
        let err = result.err().unwrap();
        assert_eq!(err.kind, crate::dsl::error::ErrorKind::Io);
    }
}
