//! Lexer (tokenizer) for preprocessed C source text.
//!
//! Converts the expanded translation unit into a flat [`Token`] stream.
//! Positions are mapped back through the preprocessor's line table, so every
//! token points at the user's own sources. Lexical errors are reported to
//! the diagnostic engine and the offending character is skipped, which keeps
//! a best-effort token stream available for the parser.

use std::fmt;

use crate::diagnostics::DiagnosticEngine;
use crate::lang::{Dialect, LangOptions, Standard};
use crate::preprocess::ExpandedSource;
use crate::source::SourceLocation;

/// Token kinds produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    IntLiteral(i64),
    CharLiteral(i8),
    StringLiteral(String),
    BoolLiteral(bool),

    // Identifiers
    Ident(String),

    // Keywords
    Int,
    Char,
    Void,
    Bool,
    Struct,
    Const,
    If,
    Else,
    While,
    Do,
    For,
    Switch,
    Case,
    Default,
    Break,
    Continue,
    Return,
    Goto,
    Sizeof,
    Null,
    Nullptr,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Bang,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Shl,
    Shr,
    Assign,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,
    PlusPlus,
    MinusMinus,
    Dot,
    Arrow,
    Ellipsis,
    Question,
    Colon,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semicolon,
    Comma,

    // End of file
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::IntLiteral(n) => write!(f, "integer literal {}", n),
            TokenKind::CharLiteral(c) => {
                let byte = *c as u8;
                if byte.is_ascii_graphic() || byte == b' ' {
                    write!(f, "character literal '{}'", byte as char)
                } else {
                    write!(f, "character literal '\\x{:02x}'", byte)
                }
            }
            TokenKind::StringLiteral(s) => write!(f, "string literal \"{}\"", s),
            TokenKind::BoolLiteral(b) => write!(f, "'{}'", b),
            TokenKind::Ident(s) => write!(f, "identifier '{}'", s),
            TokenKind::Int => write!(f, "'int'"),
            TokenKind::Char => write!(f, "'char'"),
            TokenKind::Void => write!(f, "'void'"),
            TokenKind::Bool => write!(f, "'bool'"),
            TokenKind::Struct => write!(f, "'struct'"),
            TokenKind::Const => write!(f, "'const'"),
            TokenKind::If => write!(f, "'if'"),
            TokenKind::Else => write!(f, "'else'"),
            TokenKind::While => write!(f, "'while'"),
            TokenKind::Do => write!(f, "'do'"),
            TokenKind::For => write!(f, "'for'"),
            TokenKind::Switch => write!(f, "'switch'"),
            TokenKind::Case => write!(f, "'case'"),
            TokenKind::Default => write!(f, "'default'"),
            TokenKind::Break => write!(f, "'break'"),
            TokenKind::Continue => write!(f, "'continue'"),
            TokenKind::Return => write!(f, "'return'"),
            TokenKind::Goto => write!(f, "'goto'"),
            TokenKind::Sizeof => write!(f, "'sizeof'"),
            TokenKind::Null => write!(f, "'NULL'"),
            TokenKind::Nullptr => write!(f, "'nullptr'"),
            TokenKind::Plus => write!(f, "'+'"),
            TokenKind::Minus => write!(f, "'-'"),
            TokenKind::Star => write!(f, "'*'"),
            TokenKind::Slash => write!(f, "'/'"),
            TokenKind::Percent => write!(f, "'%'"),
            TokenKind::EqEq => write!(f, "'=='"),
            TokenKind::NotEq => write!(f, "'!='"),
            TokenKind::Lt => write!(f, "'<'"),
            TokenKind::Le => write!(f, "'<='"),
            TokenKind::Gt => write!(f, "'>'"),
            TokenKind::Ge => write!(f, "'>='"),
            TokenKind::AndAnd => write!(f, "'&&'"),
            TokenKind::OrOr => write!(f, "'||'"),
            TokenKind::Bang => write!(f, "'!'"),
            TokenKind::Amp => write!(f, "'&'"),
            TokenKind::Pipe => write!(f, "'|'"),
            TokenKind::Caret => write!(f, "'^'"),
            TokenKind::Tilde => write!(f, "'~'"),
            TokenKind::Shl => write!(f, "'<<'"),
            TokenKind::Shr => write!(f, "'>>'"),
            TokenKind::Assign => write!(f, "'='"),
            TokenKind::PlusEq => write!(f, "'+='"),
            TokenKind::MinusEq => write!(f, "'-='"),
            TokenKind::StarEq => write!(f, "'*='"),
            TokenKind::SlashEq => write!(f, "'/='"),
            TokenKind::PercentEq => write!(f, "'%='"),
            TokenKind::PlusPlus => write!(f, "'++'"),
            TokenKind::MinusMinus => write!(f, "'--'"),
            TokenKind::Dot => write!(f, "'.'"),
            TokenKind::Arrow => write!(f, "'->'"),
            TokenKind::Ellipsis => write!(f, "'...'"),
            TokenKind::Question => write!(f, "'?'"),
            TokenKind::Colon => write!(f, "':'"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::LBrace => write!(f, "'{{'"),
            TokenKind::RBrace => write!(f, "'}}'"),
            TokenKind::LBracket => write!(f, "'['"),
            TokenKind::RBracket => write!(f, "']'"),
            TokenKind::Semicolon => write!(f, "';'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Eof => write!(f, "end of file"),
        }
    }
}

/// One lexed token together with its user-source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub loc: SourceLocation,
}

impl Token {
    fn new(kind: TokenKind, loc: SourceLocation) -> Self {
        Self { kind, loc }
    }
}

/// Lexer over the expanded translation unit.
pub struct Lexer<'a> {
    expanded: &'a ExpandedSource,
    options: &'a LangOptions,
    diagnostics: &'a mut DiagnosticEngine,
    input: Vec<char>,
    position: usize,
    line: u32,
    column: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(
        expanded: &'a ExpandedSource,
        options: &'a LangOptions,
        diagnostics: &'a mut DiagnosticEngine,
    ) -> Self {
        Self {
            expanded,
            options,
            diagnostics,
            input: expanded.text().chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenizes the entire input. Never fails: lexical problems become
    /// diagnostics and the stream continues after the bad character.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace_and_comments();

            if self.is_at_end() {
                tokens.push(Token::new(TokenKind::Eof, self.current_location()));
                break;
            }

            if let Some(token) = self.next_token() {
                tokens.push(token);
            }
        }

        tokens
    }

    fn next_token(&mut self) -> Option<Token> {
        let loc = self.current_location();
        let c = self.advance()?;

        let kind = match c {
            '"' => return self.string_literal(loc),
            '\'' => return self.char_literal(loc),
            '0'..='9' => return self.number_literal(c, loc),
            'a'..='z' | 'A'..='Z' | '_' => {
                return Some(self.identifier_or_keyword(c, loc));
            }

            '+' => {
                if self.match_char('+') {
                    TokenKind::PlusPlus
                } else if self.match_char('=') {
                    TokenKind::PlusEq
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.match_char('-') {
                    TokenKind::MinusMinus
                } else if self.match_char('=') {
                    TokenKind::MinusEq
                } else if self.match_char('>') {
                    TokenKind::Arrow
                } else {
                    TokenKind::Minus
                }
            }
            '*' => {
                if self.match_char('=') {
                    TokenKind::StarEq
                } else {
                    TokenKind::Star
                }
            }
            '/' => {
                if self.match_char('=') {
                    TokenKind::SlashEq
                } else {
                    TokenKind::Slash
                }
            }
            '%' => {
                if self.match_char('=') {
                    TokenKind::PercentEq
                } else {
                    TokenKind::Percent
                }
            }
            '=' => {
                if self.match_char('=') {
                    TokenKind::EqEq
                } else {
                    TokenKind::Assign
                }
            }
            '!' => {
                if self.match_char('=') {
                    TokenKind::NotEq
                } else {
                    TokenKind::Bang
                }
            }
            '<' => {
                if self.match_char('=') {
                    TokenKind::Le
                } else if self.match_char('<') {
                    TokenKind::Shl
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.match_char('=') {
                    TokenKind::Ge
                } else if self.match_char('>') {
                    TokenKind::Shr
                } else {
                    TokenKind::Gt
                }
            }
            '&' => {
                if self.match_char('&') {
                    TokenKind::AndAnd
                } else {
                    TokenKind::Amp
                }
            }
            '|' => {
                if self.match_char('|') {
                    TokenKind::OrOr
                } else {
                    TokenKind::Pipe
                }
            }
            '.' => {
                if self.peek() == Some('.') && self.peek_ahead(1) == Some('.') {
                    self.advance();
                    self.advance();
                    TokenKind::Ellipsis
                } else {
                    TokenKind::Dot
                }
            }
            '^' => TokenKind::Caret,
            '~' => TokenKind::Tilde,
            '?' => TokenKind::Question,
            ':' => TokenKind::Colon,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,

            other => {
                self.diagnostics
                    .error(loc, format!("unexpected character '{}'", other));
                return None;
            }
        };

        Some(Token::new(kind, loc))
    }

    fn string_literal(&mut self, loc: SourceLocation) -> Option<Token> {
        let mut value = String::new();

        while let Some(c) = self.peek() {
            if c == '"' {
                self.advance();
                return Some(Token::new(TokenKind::StringLiteral(value), loc));
            }
            if c == '\n' {
                break;
            }

            if c == '\\' {
                self.advance();
                let escaped = match self.advance() {
                    Some(e) => e,
                    None => break,
                };
                match unescape(escaped) {
                    Some(unescaped) => value.push(unescaped),
                    None => {
                        self.diagnostics.error(
                            self.current_location(),
                            format!("unknown escape sequence '\\{}'", escaped),
                        );
                    }
                }
            } else {
                value.push(c);
                self.advance();
            }
        }

        self.diagnostics.error(loc, "unterminated string literal");
        None
    }

    fn char_literal(&mut self, loc: SourceLocation) -> Option<Token> {
        let c = match self.advance() {
            Some(c) => c,
            None => {
                self.diagnostics.error(loc, "unterminated character literal");
                return None;
            }
        };

        let value = if c == '\\' {
            let escaped = match self.advance() {
                Some(e) => e,
                None => {
                    self.diagnostics
                        .error(loc, "unterminated character literal");
                    return None;
                }
            };
            if escaped == 'x' {
                let hex1 = self.advance();
                let hex2 = self.advance();
                match (hex1, hex2) {
                    (Some(h1), Some(h2)) => {
                        let hex: String = [h1, h2].iter().collect();
                        match u8::from_str_radix(&hex, 16) {
                            Ok(v) => v as i8,
                            Err(_) => {
                                self.diagnostics.error(
                                    loc,
                                    format!("invalid hex escape '\\x{}'", hex),
                                );
                                0
                            }
                        }
                    }
                    _ => {
                        self.diagnostics
                            .error(loc, "incomplete hex escape sequence");
                        0
                    }
                }
            } else {
                match unescape(escaped) {
                    Some(u) => u as i8,
                    None => {
                        self.diagnostics.error(
                            loc,
                            format!("unknown escape sequence '\\{}'", escaped),
                        );
                        0
                    }
                }
            }
        } else {
            c as i8
        };

        if self.advance() != Some('\'') {
            self.diagnostics
                .error(loc, "expected closing quote in character literal");
            return None;
        }

        Some(Token::new(TokenKind::CharLiteral(value), loc))
    }

    fn number_literal(&mut self, first: char, loc: SourceLocation) -> Option<Token> {
        // Hex literal: 0x...
        if first == '0' && matches!(self.peek(), Some('x') | Some('X')) {
            self.advance();
            let mut digits = String::new();
            while let Some(c) = self.peek() {
                if c.is_ascii_hexdigit() {
                    digits.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
            return match i64::from_str_radix(&digits, 16) {
                Ok(value) => Some(Token::new(TokenKind::IntLiteral(value), loc)),
                Err(_) => {
                    self.diagnostics.error(
                        loc,
                        format!("invalid hex literal '0x{}'", digits),
                    );
                    None
                }
            };
        }

        let mut digits = String::new();
        digits.push(first);
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                digits.push(c);
                self.advance();
            } else {
                break;
            }
        }

        match digits.parse::<i64>() {
            Ok(value) => Some(Token::new(TokenKind::IntLiteral(value), loc)),
            Err(_) => {
                self.diagnostics
                    .error(loc, format!("invalid integer literal '{}'", digits));
                None
            }
        }
    }

    fn identifier_or_keyword(&mut self, first: char, loc: SourceLocation) -> Token {
        let mut ident = String::new();
        ident.push(first);

        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                ident.push(c);
                self.advance();
            } else {
                break;
            }
        }

        let cxx = self.options.dialect == Dialect::Cxx;
        let kind = match ident.as_str() {
            "int" => TokenKind::Int,
            "char" => TokenKind::Char,
            "void" => TokenKind::Void,
            "struct" => TokenKind::Struct,
            "const" => TokenKind::Const,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "do" => TokenKind::Do,
            "for" => TokenKind::For,
            "switch" => TokenKind::Switch,
            "case" => TokenKind::Case,
            "default" => TokenKind::Default,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "return" => TokenKind::Return,
            "goto" => TokenKind::Goto,
            "sizeof" => TokenKind::Sizeof,
            "NULL" => TokenKind::Null,
            "bool" if cxx => TokenKind::Bool,
            "true" if cxx => TokenKind::BoolLiteral(true),
            "false" if cxx => TokenKind::BoolLiteral(false),
            "nullptr" if cxx => TokenKind::Nullptr,
            _ => TokenKind::Ident(ident),
        };

        Token::new(kind, loc)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') | Some('\n') => {
                    self.advance();
                }
                Some('/') => {
                    if self.peek_ahead(1) == Some('/') {
                        if self.options.dialect == Dialect::C
                            && self.options.standard == Standard::C89
                        {
                            self.diagnostics.warning(
                                self.current_location(),
                                "'//' comments are not part of C89",
                            );
                        }
                        self.skip_line_comment();
                    } else if self.peek_ahead(1) == Some('*') {
                        self.skip_block_comment();
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.peek() {
            self.advance();
            if c == '\n' {
                break;
            }
        }
    }

    fn skip_block_comment(&mut self) {
        let start_loc = self.current_location();
        self.advance(); // '/'
        self.advance(); // '*'

        while !self.is_at_end() {
            if self.peek() == Some('*') && self.peek_ahead(1) == Some('/') {
                self.advance();
                self.advance();
                return;
            }
            self.advance();
        }

        self.diagnostics.error(start_loc, "unterminated block comment");
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.input.get(self.position).copied()?;
        self.position += 1;

        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(c)
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn current_location(&self) -> SourceLocation {
        self.expanded.location(self.line, self.column)
    }
}

fn unescape(c: char) -> Option<char> {
    match c {
        'n' => Some('\n'),
        't' => Some('\t'),
        'r' => Some('\r'),
        '\\' => Some('\\'),
        '"' => Some('"'),
        '\'' => Some('\''),
        '0' => Some('\0'),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceMap;

    fn lex_with(filename: &str, args: &[&str], source: &str) -> (Vec<Token>, DiagnosticEngine) {
        let options = LangOptions::from_args(filename, args).unwrap();
        let mut sources = SourceMap::new();
        let main = sources.add_file(filename, source);
        let mut diagnostics = DiagnosticEngine::new(false);
        let expanded = crate::preprocess::Preprocessor::new(
            &options,
            None,
            &mut sources,
            &mut diagnostics,
        )
        .expand(main);
        let tokens = Lexer::new(&expanded, &options, &mut diagnostics).tokenize();
        (tokens, diagnostics)
    }

    fn lex(source: &str) -> (Vec<Token>, DiagnosticEngine) {
        lex_with("input.c", &[], source)
    }

    #[test]
    fn test_simple_tokens() {
        let (tokens, _) = lex("int main() { return 0; }");

        assert_eq!(tokens[0].kind, TokenKind::Int);
        assert!(matches!(tokens[1].kind, TokenKind::Ident(ref s) if s == "main"));
        assert_eq!(tokens[2].kind, TokenKind::LParen);
        assert_eq!(tokens[3].kind, TokenKind::RParen);
        assert_eq!(tokens[4].kind, TokenKind::LBrace);
        assert_eq!(tokens[5].kind, TokenKind::Return);
        assert_eq!(tokens[6].kind, TokenKind::IntLiteral(0));
        assert_eq!(tokens[7].kind, TokenKind::Semicolon);
        assert_eq!(tokens[8].kind, TokenKind::RBrace);
        assert_eq!(tokens[9].kind, TokenKind::Eof);
    }

    #[test]
    fn test_operators() {
        let (tokens, _) = lex("++ -- += -= == != && || ...");

        assert_eq!(tokens[0].kind, TokenKind::PlusPlus);
        assert_eq!(tokens[1].kind, TokenKind::MinusMinus);
        assert_eq!(tokens[2].kind, TokenKind::PlusEq);
        assert_eq!(tokens[3].kind, TokenKind::MinusEq);
        assert_eq!(tokens[4].kind, TokenKind::EqEq);
        assert_eq!(tokens[5].kind, TokenKind::NotEq);
        assert_eq!(tokens[6].kind, TokenKind::AndAnd);
        assert_eq!(tokens[7].kind, TokenKind::OrOr);
        assert_eq!(tokens[8].kind, TokenKind::Ellipsis);
    }

    #[test]
    fn test_locations_are_one_based() {
        let (tokens, _) = lex("int x;\nint y;");

        assert_eq!(tokens[0].loc.line, 1);
        assert_eq!(tokens[0].loc.column, 1);
        assert_eq!(tokens[3].loc.line, 2);
        assert_eq!(tokens[3].loc.column, 1);
        assert_eq!(tokens[4].loc.line, 2);
        assert_eq!(tokens[4].loc.column, 5);
    }

    #[test]
    fn test_comments_skipped() {
        let (tokens, _) = lex("int x; // comment\nint y; /* block\ncomment */ int z;");

        let idents: Vec<_> = tokens
            .iter()
            .filter_map(|t| match &t.kind {
                TokenKind::Ident(s) => Some(s.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(idents, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_hex_literal() {
        let (tokens, _) = lex("int x = 0xFF;");
        assert_eq!(tokens[3].kind, TokenKind::IntLiteral(255));
    }

    #[test]
    fn test_string_literal_escapes() {
        let (tokens, _) = lex(r#"char *s = "hello\nworld";"#);
        match &tokens[4].kind {
            TokenKind::StringLiteral(s) => assert_eq!(s, "hello\nworld"),
            other => panic!("expected string literal, got {}", other),
        }
    }

    #[test]
    fn test_cxx_keywords_only_in_cxx_dialect() {
        let (tokens, _) = lex_with("input.cc", &[], "bool ok = true;");
        assert_eq!(tokens[0].kind, TokenKind::Bool);
        assert_eq!(tokens[2].kind, TokenKind::Assign);
        assert_eq!(tokens[3].kind, TokenKind::BoolLiteral(true));

        let (tokens, _) = lex("bool ok = true;");
        assert!(matches!(tokens[0].kind, TokenKind::Ident(ref s) if s == "bool"));
        assert!(matches!(tokens[3].kind, TokenKind::Ident(ref s) if s == "true"));
    }

    #[test]
    fn test_bad_character_recovers() {
        let (tokens, diagnostics) = lex("int @ x;");
        assert!(diagnostics.has_uncompilable_error());
        // The stream continues past the bad character.
        assert_eq!(tokens[0].kind, TokenKind::Int);
        assert!(matches!(tokens[1].kind, TokenKind::Ident(ref s) if s == "x"));
    }

    #[test]
    fn test_c89_line_comment_warning() {
        let (_, diagnostics) = lex_with("input.c", &["-std=c89"], "int x; // hm\n");
        assert_eq!(diagnostics.warning_count(), 1);
        assert!(!diagnostics.has_uncompilable_error());
    }
}
