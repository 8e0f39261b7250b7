use crate::ast::{BinaryOp, Block, Expr, File, Stmt};
use crate::error::{FunError, Span};
use crate::lexer::{Lexer, Token, TokenType};
use std::sync::Arc;

/// Lex and parse a whole program.
pub fn parse_program(source: &str) -> Result<File, FunError> {
    let tokens = Lexer::new(source.to_string()).scan_tokens()?;
    Parser::new(tokens).parse()
}

/// Parse source text that must consist of exactly one expression, as used
/// for breakpoint conditions and the debugger's `evaluate` command.
pub fn parse_expression(source: &str) -> Result<Expr, FunError> {
    let file = parse_program(source)?;
    let mut statements = file.block.statements.into_iter();
    match (statements.next(), statements.next()) {
        (Some(Stmt::Expression(expr)), None) => Ok(expr),
        (first, _) => {
            let line = first.as_ref().map_or(file.line, Stmt::line);
            Err(FunError::syntax_with_help(
                line,
                Span::new(0, source.len().max(1)),
                "Expected a single expression",
                "Only expressions such as 't > 3' or 'f(x) + 1' are accepted here.",
            ))
        }
    }
}

/// Binary operator precedence levels, loosest first.
const PRECEDENCE: &[&[(TokenType, BinaryOp)]] = &[
    &[(TokenType::OrOr, BinaryOp::Or)],
    &[(TokenType::AndAnd, BinaryOp::And)],
    &[
        (TokenType::EqualEqual, BinaryOp::Equal),
        (TokenType::BangEqual, BinaryOp::NotEqual),
    ],
    &[
        (TokenType::Less, BinaryOp::Less),
        (TokenType::Greater, BinaryOp::Greater),
        (TokenType::LessEqual, BinaryOp::LessEqual),
        (TokenType::GreaterEqual, BinaryOp::GreaterEqual),
    ],
    &[
        (TokenType::Plus, BinaryOp::Add),
        (TokenType::Minus, BinaryOp::Subtract),
    ],
    &[
        (TokenType::Star, BinaryOp::Multiply),
        (TokenType::Slash, BinaryOp::Divide),
        (TokenType::Percent, BinaryOp::Remainder),
    ],
];

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0 }
    }

    pub fn parse(&mut self) -> Result<File, FunError> {
        let line = self.peek().line;
        let block = self.block()?;

        if !self.is_at_end() {
            let token = self.peek();
            return Err(FunError::syntax_with_help(
                token.line,
                token.span.clone(),
                format!("Expected statement, found '{}'", token.lexeme),
                "Found '}' without matching '{'. Check for unbalanced braces.",
            ));
        }

        Ok(File { block, line })
    }

    /// Statements up to a closing brace or the end of input.
    fn block(&mut self) -> Result<Block, FunError> {
        let line = self.peek().line;
        let mut statements = Vec::new();

        while !self.check(&TokenType::RightBrace) && !self.is_at_end() {
            statements.push(self.statement()?);
            while self.match_types(&[TokenType::Semicolon]) {}
        }

        Ok(Block { statements, line })
    }

    fn braced_block(&mut self, after: &str) -> Result<Block, FunError> {
        self.consume_with_help(
            TokenType::LeftBrace,
            &format!("Expected '{{' after {}", after),
            "Bodies are always wrapped in braces: { ... }",
        )?;
        let block = self.block()?;
        self.consume_with_help(
            TokenType::RightBrace,
            "Expected '}' after block",
            "Block statements must be closed with '}' after the opening '{'.",
        )?;
        Ok(block)
    }

    fn statement(&mut self) -> Result<Stmt, FunError> {
        if self.match_types(&[TokenType::Fun]) {
            self.function_definition()
        } else if self.match_types(&[TokenType::Var]) {
            self.variable_declaration()
        } else if self.match_types(&[TokenType::While]) {
            self.while_statement()
        } else if self.match_types(&[TokenType::If]) {
            self.if_statement()
        } else if self.match_types(&[TokenType::Return]) {
            let line = self.previous().line;
            let value = self.expression()?;
            Ok(Stmt::Return { value, line })
        } else if self.check(&TokenType::Identifier) && self.check_next(&TokenType::Equal) {
            self.assignment_statement()
        } else {
            Ok(Stmt::Expression(self.expression()?))
        }
    }

    fn function_definition(&mut self) -> Result<Stmt, FunError> {
        let line = self.previous().line;
        let name = self
            .consume(TokenType::Identifier, "Expected function name after 'fun'")?
            .lexeme
            .clone();

        self.consume_with_help(
            TokenType::LeftParen,
            "Expected '(' after function name",
            "Function definitions look like: fun name(a, b) { ... }",
        )?;
        let mut params = Vec::new();
        if !self.check(&TokenType::RightParen) {
            loop {
                let param = self.consume(TokenType::Identifier, "Expected parameter name")?;
                params.push(param.lexeme.clone());
                if !self.match_types(&[TokenType::Comma]) {
                    break;
                }
            }
        }
        self.consume(TokenType::RightParen, "Expected ')' after parameters")?;

        let body = self.braced_block("function parameters")?;
        Ok(Stmt::FunctionDefinition {
            name,
            params,
            body: Arc::new(body),
            line,
        })
    }

    fn variable_declaration(&mut self) -> Result<Stmt, FunError> {
        let line = self.previous().line;
        let name = self
            .consume(TokenType::Identifier, "Expected variable name after 'var'")?
            .lexeme
            .clone();

        let value = if self.match_types(&[TokenType::Equal]) {
            Some(self.expression()?)
        } else {
            None
        };

        Ok(Stmt::VariableDeclaration { name, value, line })
    }

    fn while_statement(&mut self) -> Result<Stmt, FunError> {
        let line = self.previous().line;
        let condition = self.parenthesized_condition("while")?;
        let body = self.braced_block("while condition")?;
        Ok(Stmt::While {
            condition,
            body,
            line,
        })
    }

    fn if_statement(&mut self) -> Result<Stmt, FunError> {
        let line = self.previous().line;
        let condition = self.parenthesized_condition("if")?;
        let body = self.braced_block("if condition")?;
        let else_body = if self.match_types(&[TokenType::Else]) {
            Some(self.braced_block("'else'")?)
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            body,
            else_body,
            line,
        })
    }

    fn parenthesized_condition(&mut self, keyword: &str) -> Result<Expr, FunError> {
        self.consume_with_help(
            TokenType::LeftParen,
            &format!("Expected '(' after '{}'", keyword),
            &format!(
                "Conditions must be enclosed in parentheses: {} (condition) {{ ... }}",
                keyword
            ),
        )?;
        let condition = self.expression()?;
        self.consume(
            TokenType::RightParen,
            &format!("Expected ')' after {} condition", keyword),
        )?;
        Ok(condition)
    }

    fn assignment_statement(&mut self) -> Result<Stmt, FunError> {
        let target = self.advance().clone();
        self.advance(); // '='

        let value = self.expression().map_err(|_| {
            FunError::syntax_with_help(
                target.line,
                target.span.clone(),
                format!("Expected expression after '{} ='", target.lexeme),
                "Assignments look like: name = expression",
            )
        })?;

        Ok(Stmt::Assignment {
            name: target.lexeme,
            value,
            line: target.line,
        })
    }

    fn expression(&mut self) -> Result<Expr, FunError> {
        self.binary(0)
    }

    fn binary(&mut self, level: usize) -> Result<Expr, FunError> {
        let Some(operators) = PRECEDENCE.get(level) else {
            return self.primary();
        };

        let mut expr = self.binary(level + 1)?;

        while let Some(operator) = self.match_operator(operators) {
            let operator_token = self.previous().clone();
            let right = self.binary(level + 1).map_err(|_| {
                FunError::syntax_with_help(
                    operator_token.line,
                    operator_token.span.clone(),
                    format!("Expected expression after '{}'", operator_token.lexeme),
                    "Binary operators require expressions on both sides.",
                )
            })?;

            let line = expr.line();
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
                line,
            };
        }

        Ok(expr)
    }

    fn match_operator(&mut self, operators: &[(TokenType, BinaryOp)]) -> Option<BinaryOp> {
        let operator = operators
            .iter()
            .find(|(token_type, _)| self.check(token_type))
            .map(|(_, operator)| *operator)?;
        self.advance();
        Some(operator)
    }

    fn primary(&mut self) -> Result<Expr, FunError> {
        if self.is_at_end() {
            let token = self.peek();
            return Err(FunError::syntax_with_help(
                token.line,
                token.span.clone(),
                "Unexpected end of input",
                "Expected an expression here. Check for unmatched parentheses or incomplete statements.",
            ));
        }

        let token = self.advance().clone();

        match token.token_type {
            TokenType::Integer => {
                let value = token.lexeme.parse::<i32>().map_err(|_| {
                    FunError::syntax(token.line, token.span.clone(), "Invalid integer")
                })?;
                Ok(Expr::Literal {
                    value,
                    line: token.line,
                })
            }
            TokenType::Identifier => {
                if self.match_types(&[TokenType::LeftParen]) {
                    self.finish_call(token)
                } else {
                    Ok(Expr::Identifier {
                        name: token.lexeme,
                        line: token.line,
                    })
                }
            }
            TokenType::LeftParen => {
                if self.check(&TokenType::RightParen) {
                    return Err(FunError::syntax_with_help(
                        token.line,
                        Span::new(token.span.start, self.peek().span.end),
                        "Empty parentheses are not allowed",
                        "Parentheses must contain an expression: (x + 1)",
                    ));
                }

                let expr = self.expression()?;
                self.consume_with_help(
                    TokenType::RightParen,
                    "Expected ')' after expression",
                    "Every opening parenthesis '(' must have a matching closing parenthesis ')'.",
                )?;
                Ok(expr)
            }
            _ => {
                let help_msg = match token.token_type {
                    TokenType::RightParen => {
                        "Found ')' without matching '('. Check for unbalanced parentheses."
                    }
                    TokenType::RightBrace => {
                        "Found '}' without matching '{'. Check for unbalanced braces."
                    }
                    _ => "Expected an integer, a variable, a call or a parenthesized expression here.",
                };

                Err(FunError::syntax_with_help(
                    token.line,
                    token.span,
                    format!("Expected expression, found '{}'", token.lexeme),
                    help_msg,
                ))
            }
        }
    }

    fn finish_call(&mut self, callee: Token) -> Result<Expr, FunError> {
        let mut args = Vec::new();

        if !self.check(&TokenType::RightParen) {
            loop {
                if self.is_at_end() {
                    return Err(FunError::syntax_with_help(
                        self.peek().line,
                        self.peek().span.clone(),
                        "Unexpected end of input in function call",
                        "Function calls must be closed with ')' after the arguments. Example: f(a, b)",
                    ));
                }

                args.push(self.expression()?);

                if !self.match_types(&[TokenType::Comma]) {
                    break;
                }
            }
        }

        self.consume_with_help(
            TokenType::RightParen,
            "Expected ')' after arguments",
            "Function calls must be closed with ')' after the arguments. Example: f(a, b)",
        )?;

        Ok(Expr::Call {
            name: callee.lexeme,
            args,
            line: callee.line,
        })
    }

    fn match_types(&mut self, types: &[TokenType]) -> bool {
        for token_type in types {
            if self.check(token_type) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn check(&self, token_type: &TokenType) -> bool {
        if self.is_at_end() {
            false
        } else {
            &self.peek().token_type == token_type
        }
    }

    fn check_next(&self, token_type: &TokenType) -> bool {
        self.tokens
            .get(self.current + 1)
            .is_some_and(|token| &token.token_type == token_type)
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn error_span(&self) -> (usize, Span) {
        if self.is_at_end() && self.current > 0 {
            // Point just past the last real token
            let last_token = &self.tokens[self.current - 1];
            (last_token.line, Span::single(last_token.span.end))
        } else {
            (self.peek().line, self.peek().span.clone())
        }
    }

    fn consume(&mut self, token_type: TokenType, message: &str) -> Result<&Token, FunError> {
        if self.check(&token_type) {
            Ok(self.advance())
        } else {
            let (line, span) = self.error_span();
            Err(FunError::syntax(line, span, message))
        }
    }

    fn consume_with_help(
        &mut self,
        token_type: TokenType,
        message: &str,
        help: &str,
    ) -> Result<&Token, FunError> {
        if self.check(&token_type) {
            Ok(self.advance())
        } else {
            let (line, span) = self.error_span();
            Err(FunError::syntax_with_help(line, span, message, help))
        }
    }
}
