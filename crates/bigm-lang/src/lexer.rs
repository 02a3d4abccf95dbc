use std::str::Chars;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Keywords
    Min,
    Max,

    // Literals
    Ident,
    Number,

    // Operators
    Plus,
    Minus,
    Star,
    Colon,
    Semicolon,
    GreaterEq,
    LessEq,
    Equals,

    // Special
    Newline,
    Comment,
    Eof,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span, text: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            text: text.into(),
        }
    }
}

pub struct Lexer<'a> {
    source: &'a str,
    chars: Chars<'a>,
    pos: usize,
    current: Option<char>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut chars = source.chars();
        let current = chars.next();
        Self {
            source,
            chars,
            pos: 0,
            current,
        }
    }

    pub fn tokenize(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.current;
        self.current = self.chars.next();
        if let Some(c) = c {
            self.pos += c.len_utf8();
        }
        c
    }

    fn peek(&self) -> Option<char> {
        self.current
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.clone().next()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c == ' ' || c == '\t' || c == '\r' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn skip_line_comment(&mut self) -> Token {
        let start = self.pos;
        self.advance(); // first /
        self.advance(); // second /
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
        Token::new(
            TokenKind::Comment,
            Span::new(start, self.pos),
            &self.source[start..self.pos],
        )
    }

    fn skip_block_comment(&mut self) -> Token {
        let start = self.pos;
        self.advance(); // /
        self.advance(); // *
        loop {
            match self.peek() {
                Some('*') => {
                    self.advance();
                    if self.peek() == Some('/') {
                        self.advance();
                        break;
                    }
                }
                Some(_) => {
                    self.advance();
                }
                None => break, // Unterminated comment
            }
        }
        Token::new(
            TokenKind::Comment,
            Span::new(start, self.pos),
            &self.source[start..self.pos],
        )
    }

    fn read_digits(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_number(&mut self) -> Token {
        let start = self.pos;

        // Optional negative
        if self.peek() == Some('-') {
            self.advance();
        }

        // Integer part
        self.read_digits();

        // Decimal part
        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.advance(); // consume the dot
            self.read_digits();
        }

        // Exponent, only when digits follow so `2e` stays a number then an ident
        if matches!(self.peek(), Some('e' | 'E')) {
            let mut chars = self.chars.clone();
            let exponent = match chars.next() {
                Some('+' | '-') => chars.next().is_some_and(|c| c.is_ascii_digit()),
                Some(c) => c.is_ascii_digit(),
                None => false,
            };
            if exponent {
                self.advance(); // e
                if matches!(self.peek(), Some('+' | '-')) {
                    self.advance();
                }
                self.read_digits();
            }
        }

        Token::new(
            TokenKind::Number,
            Span::new(start, self.pos),
            &self.source[start..self.pos],
        )
    }

    fn read_ident(&mut self) -> Token {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }
        let text = &self.source[start..self.pos];
        let kind = match text {
            "min" => TokenKind::Min,
            "max" => TokenKind::Max,
            _ => TokenKind::Ident,
        };
        Token::new(kind, Span::new(start, self.pos), text)
    }

    fn single(&mut self, kind: TokenKind, start: usize) -> Token {
        self.advance();
        Token::new(kind, Span::new(start, self.pos), &self.source[start..self.pos])
    }

    fn double(&mut self, kind: TokenKind, start: usize) -> Token {
        self.advance();
        self.single(kind, start)
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let start = self.pos;

        let Some(c) = self.peek() else {
            return Token::new(TokenKind::Eof, Span::new(start, start), "");
        };

        match c {
            '\n' => self.single(TokenKind::Newline, start),
            '/' => match self.peek_next() {
                Some('/') => self.skip_line_comment(),
                Some('*') => self.skip_block_comment(),
                _ => self.single(TokenKind::Error, start),
            },
            '+' => self.single(TokenKind::Plus, start),
            '-' => {
                // Could be negative number or minus operator
                if self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
                    return self.read_number();
                }
                self.single(TokenKind::Minus, start)
            }
            '*' => self.single(TokenKind::Star, start),
            ':' => self.single(TokenKind::Colon, start),
            ';' => self.single(TokenKind::Semicolon, start),
            '>' if self.peek_next() == Some('=') => self.double(TokenKind::GreaterEq, start),
            '<' if self.peek_next() == Some('=') => self.double(TokenKind::LessEq, start),
            '=' => self.single(TokenKind::Equals, start),
            c if c.is_ascii_digit() => self.read_number(),
            c if c.is_alphabetic() || c == '_' => self.read_ident(),
            _ => self.single(TokenKind::Error, start),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::tokenize(source).iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            kinds("min max minimum"),
            vec![TokenKind::Min, TokenKind::Max, TokenKind::Ident, TokenKind::Eof]
        );
    }

    #[test]
    fn test_numbers() {
        let tokens = Lexer::tokenize("100 8.5 -20 0.005 1e3 2.5E-2");
        let texts: Vec<_> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["100", "8.5", "-20", "0.005", "1e3", "2.5E-2", ""]);
    }

    #[test]
    fn test_exponent_needs_digits() {
        let tokens = Lexer::tokenize("2e");
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].text, "2");
        assert_eq!(tokens[1].kind, TokenKind::Ident);
        assert_eq!(tokens[1].text, "e");
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("+ - * : ; >= <= ="),
            vec![
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Colon,
                TokenKind::Semicolon,
                TokenKind::GreaterEq,
                TokenKind::LessEq,
                TokenKind::Equals,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            kinds("// header\nmin /* inline */ x"),
            vec![
                TokenKind::Comment,
                TokenKind::Newline,
                TokenKind::Min,
                TokenKind::Comment,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_constraint_line() {
        let tokens = Lexer::tokenize("R1: 3*x1 + 2*x2 >= 2;");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Ident, // R1
                TokenKind::Colon,
                TokenKind::Number,
                TokenKind::Star,
                TokenKind::Ident,
                TokenKind::Plus,
                TokenKind::Number,
                TokenKind::Star,
                TokenKind::Ident,
                TokenKind::GreaterEq,
                TokenKind::Number,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
        assert_eq!(tokens[9].span, Span::new(16, 18));
    }

    #[test]
    fn test_stray_character() {
        let tokens = Lexer::tokenize("x > 1");
        assert_eq!(tokens[1].kind, TokenKind::Error);
        assert_eq!(tokens[1].text, ">");
    }
}
