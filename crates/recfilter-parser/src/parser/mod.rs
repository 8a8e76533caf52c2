//! The expression parser: precedence-climbing recursive descent over the
//! token stream from [`crate::lexer`], producing an [`Expr`] tree.
//! Unlike the lexer this stage fails fast: the grammar is small and
//! unambiguous enough that error recovery buys nothing a caller couldn't
//! get by fixing the first reported problem and re-parsing.

use crate::error::ParseError;
use crate::expr::{ComparisonOp, Expr, IntValue, Literal, LogicalOp, MathOp, UnaryOp};
use crate::ip::IpLit;
use crate::lexer::{Lexer, Token, TokenKind};
use chrono::{DateTime, Utc};

pub fn parse(input: &str) -> Result<Expr, ParseError> {
    let (tokens, errors) = Lexer::new(input).lex();
    if let Some(e) = errors.into_iter().next() {
        return Err(ParseError::Lex(e));
    }
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_or()?;
    parser.expect_eof()?;
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn bump(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect_eof(&self) -> Result<(), ParseError> {
        if self.peek().kind == TokenKind::Eof {
            Ok(())
        } else {
            Err(self.unexpected("end of expression"))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let tok = self.peek();
        if tok.kind == TokenKind::Eof {
            ParseError::UnexpectedEof {
                expected: expected.to_string(),
            }
        } else {
            ParseError::UnexpectedToken {
                found: tok.text.clone(),
                pos: tok.pos,
                expected: expected.to_string(),
            }
        }
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.peek().kind == kind {
            Some(self.bump())
        } else {
            None
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, ParseError> {
        self.eat(kind).ok_or_else(|| self.unexpected(expected))
    }

    /// `or_expr := and_expr ( (OR | XOR | "||" | "^^") and_expr )*`
    /// Right-associative: a chain folds from the right rather than the left.
    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_and()?;
        let op = match self.peek().kind {
            TokenKind::Or => Some(LogicalOp::Or),
            TokenKind::Xor => Some(LogicalOp::Xor),
            TokenKind::OrShort => Some(LogicalOp::OrShort),
            TokenKind::XorShort => Some(LogicalOp::XorShort),
            _ => None,
        };
        match op {
            Some(op) => {
                self.bump();
                let right = self.parse_or()?;
                Ok(Expr::logical(op, left, right))
            }
            None => Ok(left),
        }
    }

    /// `and_expr := not_expr ( (AND | "&&") not_expr )*`
    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_not()?;
        let op = match self.peek().kind {
            TokenKind::And => Some(LogicalOp::And),
            TokenKind::AndShort => Some(LogicalOp::AndShort),
            _ => None,
        };
        match op {
            Some(op) => {
                self.bump();
                let right = self.parse_and()?;
                Ok(Expr::logical(op, left, right))
            }
            None => Ok(left),
        }
    }

    /// `not_expr := (NOT | "!")* exists_expr`
    fn parse_not(&mut self) -> Result<Expr, ParseError> {
        if self.eat(TokenKind::Not).is_some() {
            let operand = self.parse_not()?;
            return Ok(Expr::unary(UnaryOp::Not, operand));
        }
        self.parse_exists()
    }

    /// `exists_expr := "?" exists_expr | comparison`
    fn parse_exists(&mut self) -> Result<Expr, ParseError> {
        if self.eat(TokenKind::Exists).is_some() {
            let operand = self.parse_exists()?;
            return Ok(Expr::unary(UnaryOp::Exists, operand));
        }
        self.parse_comparison()
    }

    /// `comparison := additive ( cmp_op additive )?` — non-chaining: at
    /// most one comparison per expression, per the grammar sketch.
    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_additive()?;
        let op = match self.peek().kind {
            TokenKind::Eq => Some(ComparisonOp::Eq),
            TokenKind::Ne => Some(ComparisonOp::Ne),
            TokenKind::Lt => Some(ComparisonOp::Lt),
            TokenKind::Le => Some(ComparisonOp::Le),
            TokenKind::Gt => Some(ComparisonOp::Gt),
            TokenKind::Ge => Some(ComparisonOp::Ge),
            TokenKind::Like => Some(ComparisonOp::Like),
            TokenKind::In => Some(ComparisonOp::In),
            TokenKind::Is => Some(ComparisonOp::Is),
            _ => None,
        };
        match op {
            Some(op) => {
                self.bump();
                let right = self.parse_additive()?;
                Ok(Expr::comparison(op, left, right))
            }
            None => Ok(left),
        }
    }

    /// `additive := multiplicative ( (+|-) additive )?`, right-associative:
    /// `A + B - C` builds as `A + (B - C)`.
    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_multiplicative()?;
        let op = match self.peek().kind {
            TokenKind::Plus => Some(MathOp::Add),
            TokenKind::Minus => Some(MathOp::Sub),
            _ => None,
        };
        match op {
            Some(op) => {
                self.bump();
                let right = self.parse_additive()?;
                Ok(Expr::math(op, left, right))
            }
            None => Ok(left),
        }
    }

    /// `multiplicative := atom ( (*|/|%) multiplicative )?`, right-associative.
    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_atom()?;
        let op = match self.peek().kind {
            TokenKind::Times => Some(MathOp::Mul),
            TokenKind::Divide => Some(MathOp::Div),
            TokenKind::Modulo => Some(MathOp::Mod),
            _ => None,
        };
        match op {
            Some(op) => {
                self.bump();
                let right = self.parse_multiplicative()?;
                Ok(Expr::math(op, left, right))
            }
            None => Ok(left),
        }
    }

    /// `atom := literal | variable | funcall | "[" list "]" | "(" or_expr ")"`
    fn parse_atom(&mut self) -> Result<Expr, ParseError> {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::LParen => {
                self.bump();
                let inner = self.parse_or()?;
                self.expect(TokenKind::RParen, "`)`")?;
                Ok(inner)
            }
            TokenKind::LBracket => {
                self.bump();
                let items = self.parse_list_items(TokenKind::RBracket)?;
                self.expect(TokenKind::RBracket, "`]`")?;
                Ok(Expr::List(items))
            }
            TokenKind::Function => {
                self.bump();
                self.expect(TokenKind::LParen, "`(`")?;
                let args = self.parse_list_items(TokenKind::RParen)?;
                self.expect(TokenKind::RParen, "`)`")?;
                Ok(Expr::Function {
                    name: tok.text,
                    args,
                })
            }
            TokenKind::Variable => {
                self.bump();
                Ok(Expr::Variable(tok.text))
            }
            TokenKind::Constant => {
                self.bump();
                Ok(Expr::Constant(tok.text))
            }
            TokenKind::Ipv4 | TokenKind::Ipv6 => {
                self.bump();
                let lit = Literal::<IpLit>::Raw(tok.text);
                Ok(if tok.kind == TokenKind::Ipv4 {
                    Expr::Ipv4(lit)
                } else {
                    Expr::Ipv6(lit)
                })
            }
            TokenKind::Datetime => {
                self.bump();
                Ok(Expr::Datetime(Literal::<DateTime<Utc>>::Raw(tok.text)))
            }
            TokenKind::Integer => {
                self.bump();
                let v: i64 = tok.text.parse().map_err(|_| ParseError::UnexpectedToken {
                    found: tok.text.clone(),
                    pos: tok.pos,
                    expected: "integer literal".to_string(),
                })?;
                Ok(Expr::Integer(IntValue(v)))
            }
            TokenKind::Float => {
                self.bump();
                let v: f64 = tok.text.parse().map_err(|_| ParseError::UnexpectedToken {
                    found: tok.text.clone(),
                    pos: tok.pos,
                    expected: "float literal".to_string(),
                })?;
                Ok(Expr::Float(v))
            }
            _ => Err(self.unexpected("a literal, variable, function call, list or `(`")),
        }
    }

    /// Parses zero or more comma/semicolon-separated items up to (but not
    /// consuming) `terminator`.
    fn parse_list_items(&mut self, terminator: TokenKind) -> Result<Vec<Expr>, ParseError> {
        let mut items = Vec::new();
        if self.peek().kind == terminator {
            return Ok(items);
        }
        loop {
            items.push(self.parse_or()?);
            if self.eat(TokenKind::Comma).is_some() {
                continue;
            }
            break;
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{ComparisonOp, Expr, MathOp};

    #[test]
    fn parses_simple_comparison() {
        let expr = parse("Source.IP4 == 127.0.0.1").unwrap();
        match expr {
            Expr::ComparisonBinOp { op, .. } => assert_eq!(op, ComparisonOp::Eq),
            other => panic!("unexpected expr: {other:?}"),
        }
    }

    #[test]
    fn or_binds_looser_than_and() {
        let expr = parse("A AND B OR C").unwrap();
        match expr {
            Expr::LogicalBinOp {
                op: LogicalOp::Or,
                left,
                ..
            } => match *left {
                Expr::LogicalBinOp {
                    op: LogicalOp::And, ..
                } => {}
                other => panic!("expected AND on the left of OR, got {other:?}"),
            },
            other => panic!("expected top-level OR, got {other:?}"),
        }
    }

    #[test]
    fn additive_is_right_associative() {
        let expr = parse("A - B - C").unwrap();
        match expr {
            Expr::MathBinOp {
                op: MathOp::Sub,
                right,
                ..
            } => match *right {
                Expr::MathBinOp {
                    op: MathOp::Sub, ..
                } => {}
                other => panic!("expected right-nested subtraction, got {other:?}"),
            },
            other => panic!("unexpected expr: {other:?}"),
        }
    }

    #[test]
    fn parses_function_call_and_list() {
        let expr = parse(r#"size(Source.IP4) gt 0"#).unwrap();
        match expr {
            Expr::ComparisonBinOp { op, left, .. } => {
                assert_eq!(op, ComparisonOp::Gt);
                match *left {
                    Expr::Function { name, args } => {
                        assert_eq!(name, "size");
                        assert_eq!(args.len(), 1);
                    }
                    other => panic!("unexpected left: {other:?}"),
                }
            }
            other => panic!("unexpected expr: {other:?}"),
        }
    }

    #[test]
    fn parses_in_list() {
        let expr = parse(r#"Source.IP4 in ["10.0.0.0/8", "172.16.0.0/12"]"#).unwrap();
        match expr {
            Expr::ComparisonBinOp {
                op: ComparisonOp::In,
                right,
                ..
            } => match *right {
                Expr::List(items) => assert_eq!(items.len(), 2),
                other => panic!("unexpected right: {other:?}"),
            },
            other => panic!("unexpected expr: {other:?}"),
        }
    }

    #[test]
    fn not_and_exists_are_prefix() {
        let expr = parse("NOT ?Source.IP4").unwrap();
        match expr {
            Expr::Unary {
                op: UnaryOp::Not,
                operand,
            } => match *operand {
                Expr::Unary {
                    op: UnaryOp::Exists,
                    ..
                } => {}
                other => panic!("unexpected operand: {other:?}"),
            },
            other => panic!("unexpected expr: {other:?}"),
        }
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(parse("A == B C").is_err());
    }

    #[test]
    fn rejects_unterminated_paren() {
        assert!(parse("(A == B").is_err());
    }
}
