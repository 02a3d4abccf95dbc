use crate::ast::*;
use crate::lexer::{Span, Token, TokenKind};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token: expected {expected}, found {found} at position {span:?}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },
    #[error("Unexpected end of file")]
    UnexpectedEof,
    #[error("Invalid number: {0}")]
    InvalidNumber(String),
    #[error("Unsupported relation '{found}' at position {span:?}: only >= constraints are allowed")]
    UnsupportedRelation { found: String, span: Span },
    #[error("Unsupported objective at position {span:?}: only min is allowed")]
    UnsupportedObjective { span: Span },
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse(source: &str) -> Result<Program, ParseError> {
        let tokens = crate::lexer::Lexer::tokenize(source);
        let mut parser = Parser::new(tokens);
        parser.parse_program()
    }

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> TokenKind {
        self.current().map(|t| t.kind).unwrap_or(TokenKind::Eof)
    }

    fn peek_kind_at(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn skip_newlines_and_comments(&mut self) {
        while matches!(
            self.peek_kind(),
            TokenKind::Newline | TokenKind::Comment
        ) {
            self.advance();
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.current() {
            Some(t) if t.kind != TokenKind::Eof => ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: format!("{:?} '{}'", t.kind, t.text),
                span: t.span,
            },
            _ => ParseError::UnexpectedEof,
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        self.skip_newlines_and_comments();
        match self.current().cloned() {
            Some(t) if t.kind == kind => {
                self.advance();
                Ok(t)
            }
            _ => Err(self.unexpected(&format!("{:?}", kind))),
        }
    }

    fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut items = Vec::new();

        loop {
            self.skip_newlines_and_comments();

            match self.peek_kind() {
                TokenKind::Eof => break,
                TokenKind::Min => items.push(Item::Objective(self.parse_objective()?)),
                TokenKind::Max => {
                    let span = self.current().map(|t| t.span).unwrap_or(Span::new(0, 0));
                    return Err(ParseError::UnsupportedObjective { span });
                }
                TokenKind::Ident | TokenKind::Number | TokenKind::Plus | TokenKind::Minus => {
                    items.push(Item::Inequality(self.parse_inequality()?))
                }
                _ => return Err(self.unexpected("objective or constraint")),
            }
        }

        Ok(Program { items })
    }

    fn parse_objective(&mut self) -> Result<Objective, ParseError> {
        let start = self.expect(TokenKind::Min)?.span;
        self.expect(TokenKind::Colon)?;
        let terms = self.parse_terms()?;
        let end = self.expect(TokenKind::Semicolon)?.span;

        Ok(Objective {
            span: start.merge(end),
            terms,
        })
    }

    fn parse_inequality(&mut self) -> Result<Inequality, ParseError> {
        let start = self.current().map(|t| t.span).unwrap_or(Span::new(0, 0));

        // Optional marker such as `R1:` in front of the terms
        let mut label = None;
        if matches!(self.peek_kind(), TokenKind::Ident | TokenKind::Number)
            && self.peek_kind_at(1) == TokenKind::Colon
        {
            label = self.advance().map(|t| t.text.clone());
            self.advance();
        }

        let terms = self.parse_terms()?;

        self.skip_newlines_and_comments();
        match self.peek_kind() {
            TokenKind::GreaterEq => {
                self.advance();
            }
            TokenKind::LessEq | TokenKind::Equals => {
                let token = self.current().cloned();
                let (found, span) = token
                    .map(|t| (t.text, t.span))
                    .unwrap_or_else(|| (String::new(), start));
                return Err(ParseError::UnsupportedRelation { found, span });
            }
            _ => return Err(self.unexpected(">=")),
        }

        let rhs = self.parse_signed_number()?;
        let end = self.expect(TokenKind::Semicolon)?.span;

        Ok(Inequality {
            span: start.merge(end),
            label,
            terms,
            rhs,
        })
    }

    /// `term (('+' | '-') term)*`, where a negative literal also starts a new term
    fn parse_terms(&mut self) -> Result<Vec<Term>, ParseError> {
        let mut terms = Vec::new();

        self.skip_newlines_and_comments();
        let sign = match self.peek_kind() {
            TokenKind::Plus => {
                self.advance();
                1.0
            }
            TokenKind::Minus => {
                self.advance();
                -1.0
            }
            _ => 1.0,
        };
        terms.push(self.parse_term(sign)?);

        loop {
            self.skip_newlines_and_comments();
            match self.peek_kind() {
                TokenKind::Plus => {
                    self.advance();
                    terms.push(self.parse_term(1.0)?);
                }
                TokenKind::Minus => {
                    self.advance();
                    terms.push(self.parse_term(-1.0)?);
                }
                TokenKind::Number
                    if self.current().is_some_and(|t| t.text.starts_with('-')) =>
                {
                    terms.push(self.parse_term(1.0)?);
                }
                _ => break,
            }
        }

        Ok(terms)
    }

    /// `number ['*'] ident` or a bare `ident`
    fn parse_term(&mut self, sign: f64) -> Result<Term, ParseError> {
        self.skip_newlines_and_comments();
        let start = self.current().map(|t| t.span).unwrap_or(Span::new(0, 0));

        let coefficient = match self.peek_kind() {
            TokenKind::Number => {
                let value = self.parse_number()?;
                self.skip_newlines_and_comments();
                if self.peek_kind() == TokenKind::Star {
                    self.advance();
                }
                value
            }
            TokenKind::Ident => 1.0,
            _ => return Err(self.unexpected("term")),
        };

        let variable = self.expect(TokenKind::Ident)?;

        Ok(Term {
            span: start.merge(variable.span),
            coefficient: sign * coefficient,
            variable: variable.text,
        })
    }

    fn parse_number(&mut self) -> Result<f64, ParseError> {
        let token = self.expect(TokenKind::Number)?;
        token
            .text
            .parse()
            .map_err(|_| ParseError::InvalidNumber(token.text.clone()))
    }

    fn parse_signed_number(&mut self) -> Result<f64, ParseError> {
        self.skip_newlines_and_comments();
        let sign = match self.peek_kind() {
            TokenKind::Minus => {
                self.advance();
                -1.0
            }
            TokenKind::Plus => {
                self.advance();
                1.0
            }
            _ => 1.0,
        };
        let value = self.parse_number()?;
        Ok(sign * value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_objective() {
        let program = Parser::parse("min: 3*x1 + 2*x2;").unwrap();
        assert_eq!(program.items.len(), 1);
        match &program.items[0] {
            Item::Objective(o) => {
                assert_eq!(o.terms.len(), 2);
                assert_eq!(o.terms[0].coefficient, 3.0);
                assert_eq!(o.terms[0].variable, "x1");
                assert_eq!(o.terms[1].coefficient, 2.0);
                assert_eq!(o.terms[1].variable, "x2");
                assert_eq!(o.span, Span::new(0, 17));
            }
            _ => panic!("Expected objective"),
        }
    }

    #[test]
    fn test_parse_constraint_with_marker() {
        let program = Parser::parse("R1: 3*x1 + 2*x2 >= 2;").unwrap();
        match &program.items[0] {
            Item::Inequality(i) => {
                assert_eq!(i.label.as_deref(), Some("R1"));
                assert_eq!(i.terms.len(), 2);
                assert_eq!(i.rhs, 2.0);
            }
            _ => panic!("Expected constraint"),
        }
    }

    #[test]
    fn test_parse_constraint_without_marker() {
        let program = Parser::parse("x1 + 4 x2 >= -1.5;").unwrap();
        match &program.items[0] {
            Item::Inequality(i) => {
                assert_eq!(i.label, None);
                assert_eq!(i.terms[0].coefficient, 1.0);
                assert_eq!(i.terms[1].coefficient, 4.0);
                assert_eq!(i.rhs, -1.5);
            }
            _ => panic!("Expected constraint"),
        }
    }

    #[test]
    fn test_parse_signs() {
        let program = Parser::parse("min: -2*a - 3*b + -4*c -5*d;").unwrap();
        let objective = program.objectives().next().unwrap();
        let coefficients: Vec<_> = objective.terms.iter().map(|t| t.coefficient).collect();
        assert_eq!(coefficients, vec![-2.0, -3.0, -4.0, -5.0]);
    }

    #[test]
    fn test_parse_benchmark() {
        let source = r#"// Benchmark: two variables
// objective first
min: 1*x0 + 1*x1;

R1: 1*x0 + 2*x1 >= 4;
R2: 3*x0 + 1*x1 >= 6;
"#;
        let program = Parser::parse(source).unwrap();
        assert_eq!(program.items.len(), 3);
        assert_eq!(program.objectives().count(), 1);
        assert_eq!(program.inequalities().count(), 2);
    }

    #[test]
    fn test_statement_spans_lines() {
        let source = "C1: 1*x0\n  + 2*x1\n  >= 4;";
        let program = Parser::parse(source).unwrap();
        let inequality = program.inequalities().next().unwrap();
        assert_eq!(inequality.terms.len(), 2);
        assert_eq!(inequality.span, Span::new(0, source.len()));
    }

    #[test]
    fn test_rejects_le() {
        let err = Parser::parse("R1: x >= 1;\nR2: x <= 3;").unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedRelation { ref found, .. } if found == "<="));
    }

    #[test]
    fn test_rejects_max() {
        let err = Parser::parse("max: x;").unwrap_err();
        assert_eq!(err, ParseError::UnsupportedObjective { span: Span::new(0, 3) });
    }

    #[test]
    fn test_missing_semicolon() {
        let err = Parser::parse("min: x1 + x2").unwrap_err();
        assert_eq!(err, ParseError::UnexpectedEof);
    }

    #[test]
    fn test_missing_variable() {
        let err = Parser::parse("min: 3*;").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }
}
