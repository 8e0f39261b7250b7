use crate::error::{FunError, Span};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenType {
    // Single-character tokens
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Semicolon,
    Minus,
    Plus,
    Slash,
    Star,
    Percent,

    // One or two character tokens
    Equal,
    EqualEqual,
    BangEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    AndAnd,
    OrOr,

    // Literals
    Identifier,
    Integer,

    // Keywords
    Else,
    Fun,
    If,
    Return,
    Var,
    While,

    // Special
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub token_type: TokenType,
    pub lexeme: String,
    pub span: Span,
    /// 1-based line the token starts on.
    pub line: usize,
}

impl Token {
    pub fn new(token_type: TokenType, lexeme: String, span: Span, line: usize) -> Self {
        Self {
            token_type,
            lexeme,
            span,
            line,
        }
    }
}

pub struct Lexer {
    source: String,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: usize,
}

impl Lexer {
    pub fn new(source: String) -> Self {
        Self {
            source,
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
        }
    }

    pub fn scan_tokens(mut self) -> Result<Vec<Token>, FunError> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token()?;
        }

        self.tokens.push(Token::new(
            TokenType::Eof,
            String::new(),
            Span::single(self.current),
            self.line,
        ));

        Ok(self.tokens)
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn scan_token(&mut self) -> Result<(), FunError> {
        let c = self.advance();

        match c {
            '(' => self.add_token(TokenType::LeftParen),
            ')' => self.add_token(TokenType::RightParen),
            '{' => self.add_token(TokenType::LeftBrace),
            '}' => self.add_token(TokenType::RightBrace),
            ',' => self.add_token(TokenType::Comma),
            ';' => self.add_token(TokenType::Semicolon),
            '-' => self.add_token(TokenType::Minus),
            '+' => self.add_token(TokenType::Plus),
            '*' => self.add_token(TokenType::Star),
            '%' => self.add_token(TokenType::Percent),
            '!' => {
                if self.match_char('=') {
                    self.add_token(TokenType::BangEqual);
                } else {
                    return Err(self.unexpected(c, "'!' is only valid as part of '!='."));
                }
            }
            '=' => {
                let token_type = if self.match_char('=') {
                    TokenType::EqualEqual
                } else {
                    TokenType::Equal
                };
                self.add_token(token_type);
            }
            '<' => {
                let token_type = if self.match_char('=') {
                    TokenType::LessEqual
                } else {
                    TokenType::Less
                };
                self.add_token(token_type);
            }
            '>' => {
                let token_type = if self.match_char('=') {
                    TokenType::GreaterEqual
                } else {
                    TokenType::Greater
                };
                self.add_token(token_type);
            }
            '&' => {
                if self.match_char('&') {
                    self.add_token(TokenType::AndAnd);
                } else {
                    return Err(self.unexpected(c, "Logical and is written '&&'."));
                }
            }
            '|' => {
                if self.match_char('|') {
                    self.add_token(TokenType::OrOr);
                } else {
                    return Err(self.unexpected(c, "Logical or is written '||'."));
                }
            }
            '/' => {
                if self.match_char('/') {
                    // Comment goes until end of line
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else {
                    self.add_token(TokenType::Slash);
                }
            }
            ' ' | '\r' | '\t' => {}
            '\n' => self.line += 1,
            c if c.is_ascii_digit() => self.number()?,
            c if c.is_alphabetic() || c == '_' => self.identifier(),
            _ => {
                return Err(FunError::syntax(
                    self.line,
                    Span::new(self.start, self.current),
                    format!("Unexpected character: '{}'", c),
                ));
            }
        }

        Ok(())
    }

    fn unexpected(&self, c: char, help: &str) -> FunError {
        FunError::syntax_with_help(
            self.line,
            Span::new(self.start, self.current),
            format!("Unexpected character: '{}'", c),
            help,
        )
    }

    fn advance(&mut self) -> char {
        match self.source[self.current..].chars().next() {
            Some(c) => {
                self.current += c.len_utf8();
                c
            }
            None => '\0',
        }
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.peek() != expected {
            false
        } else {
            self.advance();
            true
        }
    }

    fn peek(&self) -> char {
        self.source[self.current..].chars().next().unwrap_or('\0')
    }

    fn number(&mut self) -> Result<(), FunError> {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        let number_slice = &self.source[self.start..self.current];
        if number_slice.parse::<i32>().is_err() {
            return Err(FunError::syntax_with_help(
                self.line,
                Span::new(self.start, self.current),
                format!("Invalid integer: {}", number_slice),
                "Integer literals must fit in a signed 32-bit value.",
            ));
        }

        self.add_token(TokenType::Integer);
        Ok(())
    }

    fn identifier(&mut self) {
        while self.peek().is_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let token_type = keyword(&self.source[self.start..self.current])
            .unwrap_or(TokenType::Identifier);
        self.add_token(token_type);
    }

    fn add_token(&mut self, token_type: TokenType) {
        let text = self.source[self.start..self.current].to_string();
        self.tokens.push(Token::new(
            token_type,
            text,
            Span::new(self.start, self.current),
            self.line,
        ));
    }
}

fn keyword(text: &str) -> Option<TokenType> {
    let token_type = match text {
        "else" => TokenType::Else,
        "fun" => TokenType::Fun,
        "if" => TokenType::If,
        "return" => TokenType::Return,
        "var" => TokenType::Var,
        "while" => TokenType::While,
        _ => return None,
    };
    Some(token_type)
}
