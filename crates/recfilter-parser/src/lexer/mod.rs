//! The filter-source lexer. Pure: no state beyond input position. Total:
//! lexing never stops at the first problem, it collects every
//! unrecognised token alongside the token stream so a caller can report
//! them all in one pass.

mod token;

pub use token::{Token, TokenKind};

use crate::error::LexError;
use std::iter::Peekable;
use std::str::CharIndices;

pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

const KEYWORDS: &[(&str, TokenKind)] = &[
    ("or", TokenKind::Or),
    ("and", TokenKind::And),
    ("xor", TokenKind::Xor),
    ("not", TokenKind::Not),
    ("exists", TokenKind::Exists),
    ("like", TokenKind::Like),
    ("in", TokenKind::In),
    ("is", TokenKind::Is),
    ("eq", TokenKind::Eq),
    ("ne", TokenKind::Ne),
    ("gt", TokenKind::Gt),
    ("ge", TokenKind::Ge),
    ("lt", TokenKind::Lt),
    ("le", TokenKind::Le),
];

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    /// Tokenises the whole input, returning every token found (terminated
    /// by a trailing `Eof`) alongside every lexical error encountered.
    pub fn lex(mut self) -> (Vec<Token>, Vec<LexError>) {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();

        loop {
            self.skip_whitespace();
            let Some(&(pos, c)) = self.chars.peek() else {
                break;
            };
            match self.scan_one(pos, c) {
                Ok(tok) => tokens.push(tok),
                Err(e) => errors.push(e),
            }
        }
        tokens.push(Token::new(TokenKind::Eof, "", self.input.len()));
        (tokens, errors)
    }

    fn skip_whitespace(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_whitespace() {
                self.chars.next();
            } else {
                break;
            }
        }
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        self.chars.next()
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.chars.clone().nth(n).map(|(_, c)| c)
    }

    fn scan_one(&mut self, pos: usize, c: char) -> Result<Token, LexError> {
        match c {
            '(' => {
                self.bump();
                Ok(Token::new(TokenKind::LParen, "(", pos))
            }
            ')' => {
                self.bump();
                Ok(Token::new(TokenKind::RParen, ")", pos))
            }
            '[' => {
                self.bump();
                Ok(Token::new(TokenKind::LBracket, "[", pos))
            }
            ']' => {
                self.bump();
                Ok(Token::new(TokenKind::RBracket, "]", pos))
            }
            ',' | ';' => {
                self.bump();
                Ok(Token::new(TokenKind::Comma, c.to_string(), pos))
            }
            '"' => self.scan_string(pos),
            // A bare digit starts any numeric/IP/datetime literal; a leading
            // `:` is only reachable by an abbreviated IPv6 address (`::1`).
            c if c.is_ascii_digit() || c == ':' => Ok(self.scan_number_or_literal(pos)),
            c if is_ident_start(c) => Ok(self.scan_ident_or_variable(pos)),
            '|' | '&' | '^' | '=' | '!' | '<' | '>' | '~' | '+' | '-' | '*' | '/' | '%' | '?' => {
                self.scan_operator(pos)
            }
            other => {
                self.bump();
                Err(LexError {
                    text: other.to_string(),
                    pos,
                })
            }
        }
    }

    fn scan_string(&mut self, pos: usize) -> Result<Token, LexError> {
        self.bump(); // opening quote
        let mut text = String::new();
        loop {
            match self.bump() {
                Some((_, '"')) => return Ok(Token::new(TokenKind::Constant, text, pos)),
                Some((_, '\\')) => match self.bump() {
                    Some((_, '"')) => text.push('"'),
                    Some((_, '\\')) => text.push('\\'),
                    Some((_, other)) => {
                        text.push('\\');
                        text.push(other);
                    }
                    None => {
                        return Err(LexError {
                            text,
                            pos,
                        })
                    }
                },
                Some((_, c)) => text.push(c),
                None => {
                    return Err(LexError {
                        text: format!("\"{text}"),
                        pos,
                    })
                }
            }
        }
    }

    /// Greedily consumes a run of number/IP/datetime characters, then
    /// classifies the raw text. `-`/`+` only continue the run when
    /// immediately followed by a digit, so `5 - 3` still lexes as three
    /// tokens while `10.0.0.0-10.0.0.255` lexes as one.
    fn scan_number_or_literal(&mut self, pos: usize) -> Token {
        while let Some(c) = self.peek_char() {
            let continues = match c {
                '0'..='9' | '.' | ':' | '/' => true,
                'T' | 't' | 'Z' | 'z' => true,
                '-' | '+' => matches!(self.peek_nth(1), Some(d) if d.is_ascii_digit()),
                _ => false,
            };
            if !continues {
                break;
            }
            self.bump();
        }
        let end = self.current_pos();
        let text = &self.input[pos..end];
        Token::new(classify_literal(text), text, pos)
    }

    fn current_pos(&self) -> usize {
        self.chars
            .clone()
            .next()
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }

    fn scan_ident_or_variable(&mut self, pos: usize) -> Token {
        self.consume_name();
        let mut end = self.current_pos();

        // A function call: name immediately followed by `(`.
        if self.peek_char() == Some('(') {
            let text = &self.input[pos..end];
            return Token::new(TokenKind::Function, text, pos);
        }

        let first_word = &self.input[pos..end];
        if let Some((_, kw)) = KEYWORDS
            .iter()
            .find(|(kw, _)| kw.eq_ignore_ascii_case(first_word))
        {
            return Token::new(*kw, first_word, pos);
        }

        // Otherwise this is (the start of) a variable path: keep consuming
        // `[index]` and `.name[index]` continuations with no intervening
        // whitespace.
        loop {
            if self.peek_char() == Some('[') {
                self.consume_bracket_index();
                end = self.current_pos();
                continue;
            }
            if self.peek_char() == Some('.') && self.peek_nth(1).is_some_and(is_ident_start) {
                self.bump(); // '.'
                self.consume_name();
                end = self.current_pos();
                continue;
            }
            break;
        }
        let text = &self.input[pos..end];
        Token::new(TokenKind::Variable, text, pos)
    }

    fn consume_name(&mut self) {
        while let Some(c) = self.peek_char() {
            if is_ident_char(c) {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn consume_bracket_index(&mut self) {
        self.bump(); // '['
        while let Some(c) = self.peek_char() {
            self.bump();
            if c == ']' {
                break;
            }
        }
    }

    fn scan_operator(&mut self, pos: usize) -> Result<Token, LexError> {
        let two: Option<(char, char)> = self.peek_char().zip(self.peek_nth(1));
        if let Some((a, b)) = two {
            let pair = [a, b];
            let kind = match pair {
                ['|', '|'] => Some(TokenKind::OrShort),
                ['&', '&'] => Some(TokenKind::AndShort),
                ['^', '^'] => Some(TokenKind::XorShort),
                ['=', '='] => Some(TokenKind::Eq),
                ['!', '='] => Some(TokenKind::Ne),
                ['<', '>'] => Some(TokenKind::Ne),
                ['<', '='] => Some(TokenKind::Le),
                ['>', '='] => Some(TokenKind::Ge),
                ['=', '~'] => Some(TokenKind::Like),
                ['~', '~'] => Some(TokenKind::Like),
                _ => None,
            };
            if let Some(kind) = kind {
                self.bump();
                self.bump();
                return Ok(Token::new(kind, &self.input[pos..pos + 2], pos));
            }
        }

        let (_, c) = self.bump().unwrap();
        let kind = match c {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Times,
            '/' => TokenKind::Divide,
            '%' => TokenKind::Modulo,
            '<' => TokenKind::Lt,
            '>' => TokenKind::Gt,
            '=' => TokenKind::Eq,
            '!' => TokenKind::Not,
            '?' => TokenKind::Exists,
            other => {
                return Err(LexError {
                    text: other.to_string(),
                    pos,
                })
            }
        };
        Ok(Token::new(kind, c.to_string(), pos))
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn classify_literal(raw: &str) -> TokenKind {
    if raw.contains('T') || raw.contains('t') {
        return TokenKind::Datetime;
    }
    if raw.contains(':') {
        return TokenKind::Ipv6;
    }
    let dots = raw.chars().filter(|&c| c == '.').count();
    if dots >= 3 {
        TokenKind::Ipv4
    } else if dots == 1 {
        TokenKind::Float
    } else {
        TokenKind::Integer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let (tokens, errors) = Lexer::new(src).lex();
        assert!(errors.is_empty(), "unexpected lex errors: {errors:?}");
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_comparison_and_punctuation() {
        assert_eq!(
            kinds("(Source.IP4 == 127.0.0.1)"),
            vec![
                TokenKind::LParen,
                TokenKind::Variable,
                TokenKind::Eq,
                TokenKind::Ipv4,
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_word_and_symbol_operators_case_insensitively() {
        assert_eq!(
            kinds("A AND B or C && D"),
            vec![
                TokenKind::Variable,
                TokenKind::And,
                TokenKind::Variable,
                TokenKind::Or,
                TokenKind::Variable,
                TokenKind::AndShort,
                TokenKind::Variable,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_function_call() {
        assert_eq!(
            kinds("size(Source.IP4)"),
            vec![
                TokenKind::Function,
                TokenKind::LParen,
                TokenKind::Variable,
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_variable_with_indices() {
        let (tokens, _) = Lexer::new("Source[2].IP4[#]").lex();
        assert_eq!(tokens[0].kind, TokenKind::Variable);
        assert_eq!(tokens[0].text, "Source[2].IP4[#]");
    }

    #[test]
    fn lexes_quoted_constant() {
        let (tokens, _) = Lexer::new(r#""hello world""#).lex();
        assert_eq!(tokens[0].kind, TokenKind::Constant);
        assert_eq!(tokens[0].text, "hello world");
    }

    #[test]
    fn lexes_ip_list() {
        let kinds = kinds(r#"Source.IP4 in ["188.14.166.0/24", "10.0.0.0/8"]"#);
        assert_eq!(
            kinds,
            vec![
                TokenKind::Variable,
                TokenKind::In,
                TokenKind::LBracket,
                TokenKind::Constant,
                TokenKind::Comma,
                TokenKind::Constant,
                TokenKind::RBracket,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_abbreviated_ipv6() {
        let (tokens, _) = Lexer::new("::1").lex();
        assert_eq!(tokens[0].kind, TokenKind::Ipv6);
        assert_eq!(tokens[0].text, "::1");
    }

    #[test]
    fn lexes_datetime() {
        let (tokens, _) = Lexer::new("2016-06-21T13:08:27Z").lex();
        assert_eq!(tokens[0].kind, TokenKind::Datetime);
    }

    #[test]
    fn reports_unrecognised_tokens() {
        let (_, errors) = Lexer::new("Source @ 1").lex();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].text, "@");
    }
}
