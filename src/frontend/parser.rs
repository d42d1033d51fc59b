//! Parser for Ember
//!
//! Recursive descent over the token stream. Every binary level is built by
//! an iterative left fold, so all binary operators are left-associative. A
//! syntax error inside one top-level declaration is recorded and the parser
//! synchronizes to the next statement boundary; valid declarations around
//! the bad one still parse, which keeps partial ASTs useful for tooling.
//!
//! Blocks are flat statement runs: a function, `with`, loop or case body
//! continues until end of input or the start of the next declaration. There
//! is no dedent tracking; this is the documented block-termination
//! limitation, not an indentation algorithm waiting to happen.

use crate::frontend::ast::{
    ActorDecl, Decorator, Expr, FunctionDecl, Param, PatternCase, Stmt,
};
use crate::frontend::token::{Token, TokenKind};
use crate::utils::{ParseError, ParseResult};

/// The parser
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<ParseError>,
}

impl Parser {
    /// Create a parser over a token stream (as produced by the lexer,
    /// terminated by `Eof`)
    pub fn new(tokens: Vec<Token>) -> Self {
        let tokens = if tokens.is_empty() {
            vec![Token::eof(1)]
        } else {
            tokens
        };
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
        }
    }

    /// Parse a complete program.
    ///
    /// Never fails past this boundary: each top-level declaration that
    /// errors is recorded in [`Parser::errors`] and skipped via
    /// synchronization.
    pub fn parse(&mut self) -> Vec<Stmt> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            match self.declaration() {
                Ok(stmt) => statements.push(stmt),
                Err(err) => {
                    log::debug!("parse error, synchronizing: {err}");
                    self.errors.push(err);
                    self.synchronize();
                }
            }
        }

        statements
    }

    /// Parse errors recorded so far
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Take ownership of the recorded parse errors
    pub fn take_errors(&mut self) -> Vec<ParseError> {
        std::mem::take(&mut self.errors)
    }

    // ==================== Helper Methods ====================

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn current_kind(&self) -> TokenKind {
        self.current().kind
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos + 1).map(|t| t.kind)
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.pos.saturating_sub(1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current_kind() == kind
    }

    fn is_at_end(&self) -> bool {
        self.current_kind() == TokenKind::Eof
    }

    /// Consume the current token if it matches
    fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind, expected: &str) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let token = self.current();
            Err(ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: token.describe(),
                line: token.line,
            })
        }
    }

    /// Discard tokens until just past a `:` statement boundary or until a
    /// token that can begin a new top-level construct
    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Colon {
                return;
            }

            if matches!(
                self.current_kind(),
                TokenKind::Def
                    | TokenKind::If
                    | TokenKind::Return
                    | TokenKind::For
                    | TokenKind::While
                    | TokenKind::Match
                    | TokenKind::With
                    | TokenKind::Class
                    | TokenKind::Actor
            ) {
                return;
            }

            self.advance();
        }
    }

    // ==================== Declarations ====================

    fn declaration(&mut self) -> ParseResult<Stmt> {
        if self.check(TokenKind::At) {
            let decorators = self.decorator_list()?;
            return Ok(Stmt::Function(self.function_declaration(decorators)?));
        }
        if self.check(TokenKind::Actor) {
            return self.actor_declaration();
        }
        if self.check(TokenKind::Async) || self.check(TokenKind::Def) {
            return Ok(Stmt::Function(self.function_declaration(Vec::new())?));
        }
        self.statement()
    }

    /// Parse a run of `@name` / `@name(args)` decorators
    fn decorator_list(&mut self) -> ParseResult<Vec<Decorator>> {
        let mut decorators = Vec::new();

        while self.match_kind(TokenKind::At) {
            let name = self.consume(TokenKind::Identifier, "decorator name")?;
            let mut arguments = Vec::new();
            if self.match_kind(TokenKind::LParen) {
                if !self.check(TokenKind::RParen) {
                    loop {
                        arguments.push(self.expression()?);
                        if !self.match_kind(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.consume(TokenKind::RParen, "')' after decorator arguments")?;
            }
            decorators.push(Decorator { name, arguments });
        }

        Ok(decorators)
    }

    /// Parse `[async] def name [<T, ...>] (params) [-> type]: body`
    fn function_declaration(&mut self, decorators: Vec<Decorator>) -> ParseResult<FunctionDecl> {
        let is_async = self.match_kind(TokenKind::Async);
        self.consume(TokenKind::Def, "'def'")?;
        let name = self.consume(TokenKind::Identifier, "function name")?;

        let mut generic_params = Vec::new();
        if self.match_kind(TokenKind::Less) {
            loop {
                generic_params.push(self.consume(TokenKind::Identifier, "generic parameter name")?);
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
            self.consume(TokenKind::Greater, "'>' after generic parameters")?;
        }

        self.consume(TokenKind::LParen, "'(' after function name")?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let param_name = self.consume(TokenKind::Identifier, "parameter name")?;
                let type_hint = if self.match_kind(TokenKind::Colon) {
                    Some(self.type_expression()?)
                } else {
                    None
                };
                params.push(Param {
                    name: param_name,
                    type_hint,
                });
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RParen, "')' after parameters")?;

        let return_type = if self.match_kind(TokenKind::Arrow) {
            Some(self.type_expression()?)
        } else {
            None
        };

        self.consume(TokenKind::Colon, "':' after function signature")?;
        let body = self.block_body(false)?;

        Ok(FunctionDecl {
            name,
            params,
            body,
            decorators,
            generic_params,
            return_type,
            is_async,
        })
    }

    /// Parse `actor Name:` with an optional `state:` block and a run of
    /// method declarations
    fn actor_declaration(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::Actor, "'actor'")?;
        let name = self.consume(TokenKind::Identifier, "actor name")?;
        self.consume(TokenKind::Colon, "':' after actor name")?;

        let mut state_vars = Vec::new();
        if self.match_kind(TokenKind::State) {
            self.consume(TokenKind::Colon, "':' after 'state'")?;
            while !self.is_at_end() && !self.current_kind().starts_declaration() {
                state_vars.push(self.statement()?);
            }
        }

        let mut methods = Vec::new();
        while matches!(
            self.current_kind(),
            TokenKind::Def | TokenKind::Async | TokenKind::At
        ) {
            let decorators = self.decorator_list()?;
            methods.push(self.function_declaration(decorators)?);
        }

        Ok(Stmt::Actor(ActorDecl {
            name,
            state_vars,
            methods,
        }))
    }

    // ==================== Statements ====================

    fn statement(&mut self) -> ParseResult<Stmt> {
        if self.match_kind(TokenKind::If) {
            return self.if_statement();
        }
        if self.match_kind(TokenKind::Return) {
            return self.return_statement();
        }
        if self.match_kind(TokenKind::With) {
            return self.with_statement();
        }
        if self.match_kind(TokenKind::For) {
            return self.for_statement();
        }
        if self.match_kind(TokenKind::Match) {
            return self.match_statement();
        }
        // `name : type = value`: one token of lookahead disambiguates a
        // type-hinted declaration from a plain expression statement
        if self.check(TokenKind::Identifier) && self.peek_kind() == Some(TokenKind::Colon) {
            return self.type_hint_statement();
        }
        self.expression_statement()
    }

    /// Flat statement run forming a body. Ends at end of input or where
    /// the next declaration starts; inside a `match`, also at `case`.
    fn block_body(&mut self, stop_at_case: bool) -> ParseResult<Vec<Stmt>> {
        let mut body = Vec::new();

        while !self.is_at_end()
            && !self.current_kind().starts_declaration()
            && !(stop_at_case && self.check(TokenKind::Case))
        {
            body.push(self.statement()?);
        }

        Ok(body)
    }

    fn if_statement(&mut self) -> ParseResult<Stmt> {
        let condition = self.expression()?;
        self.consume(TokenKind::Colon, "':' after if condition")?;
        let then_branch = Box::new(self.statement()?);

        let else_branch = if self.match_kind(TokenKind::Else) {
            self.consume(TokenKind::Colon, "':' after else")?;
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn return_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.previous().clone();

        // A bare `return` at the end of a flat body has no expression of
        // its own; anything else after it is the return value
        let value = if self.is_at_end()
            || self.current_kind().starts_declaration()
            || matches!(self.current_kind(), TokenKind::Case | TokenKind::Else)
        {
            None
        } else {
            Some(self.expression()?)
        };

        Ok(Stmt::Return { keyword, value })
    }

    fn with_statement(&mut self) -> ParseResult<Stmt> {
        let resource = self.expression()?;
        self.consume(TokenKind::Colon, "':' after with resource")?;
        // No dedent detection: the body runs to the next declaration or
        // end of input
        let body = self.block_body(false)?;

        Ok(Stmt::With { resource, body })
    }

    fn for_statement(&mut self) -> ParseResult<Stmt> {
        let target = self.consume(TokenKind::Identifier, "loop variable")?;
        self.consume(TokenKind::In, "'in' after loop variable")?;
        let iterator = self.expression()?;

        let filter = if self.match_kind(TokenKind::If) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenKind::Colon, "':' after for clause")?;
        let body = self.block_body(false)?;

        Ok(Stmt::For {
            target,
            iterator,
            filter,
            body,
        })
    }

    fn match_statement(&mut self) -> ParseResult<Stmt> {
        let scrutinee = self.expression()?;
        self.consume(TokenKind::Colon, "':' after match scrutinee")?;

        let mut cases = Vec::new();
        while self.match_kind(TokenKind::Case) {
            let pattern = self.pattern()?;

            // `as` and `if` are matched by lexeme so the reserved kinds
            // and identifier spellings both work in a case clause
            let binding = if self.current().lexeme == "as" {
                self.advance();
                Some(self.consume(TokenKind::Identifier, "binding name after 'as'")?)
            } else {
                None
            };

            let guard = if self.current().lexeme == "if" {
                self.advance();
                Some(self.expression()?)
            } else {
                None
            };

            self.consume(TokenKind::Colon, "':' after case pattern")?;
            let body = self.block_body(true)?;

            cases.push(PatternCase {
                pattern,
                guard,
                binding,
                body,
            });
        }

        Ok(Stmt::PatternMatch { scrutinee, cases })
    }

    /// A pattern: a literal, an identifier, or an identifier call (`str()`)
    fn pattern(&mut self) -> ParseResult<Expr> {
        if matches!(
            self.current_kind(),
            TokenKind::Integer | TokenKind::Float | TokenKind::Str
        ) {
            let token = self.advance();
            return Ok(Expr::Literal {
                value: token.literal,
            });
        }

        if self.check(TokenKind::Identifier) {
            let name = self.advance();
            let expr = Expr::Variable { name };
            if self.match_kind(TokenKind::LParen) {
                let mut arguments = Vec::new();
                if !self.check(TokenKind::RParen) {
                    loop {
                        arguments.push(self.expression()?);
                        if !self.match_kind(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                let paren = self.consume(TokenKind::RParen, "')' after pattern arguments")?;
                return Ok(Expr::Call {
                    callee: Box::new(expr),
                    paren,
                    arguments,
                });
            }
            return Ok(expr);
        }

        let token = self.current();
        Err(ParseError::ExpectedPattern {
            found: token.describe(),
            line: token.line,
        })
    }

    fn type_hint_statement(&mut self) -> ParseResult<Stmt> {
        let name = self.advance(); // identifier
        self.advance(); // ':'
        let ty = self.type_expression()?;
        self.consume(TokenKind::Equals, "'=' after type hint")?;
        let value = self.expression()?;

        Ok(Stmt::Expression {
            expression: Expr::TypeHint {
                name,
                ty: Box::new(ty),
                value: Box::new(value),
            },
        })
    }

    /// A type annotation: an identifier optionally applied to bracketed
    /// type arguments (`int`, `List[T]`, `dict[str, int]`)
    fn type_expression(&mut self) -> ParseResult<Expr> {
        let name = self.consume(TokenKind::Identifier, "type name")?;
        let mut expr = Expr::Variable { name };

        while self.match_kind(TokenKind::LBracket) {
            let mut params = Vec::new();
            if !self.check(TokenKind::RBracket) {
                loop {
                    params.push(self.type_expression()?);
                    if !self.match_kind(TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.consume(TokenKind::RBracket, "']' after type parameters")?;
            expr = Expr::GenericType {
                base: Box::new(expr),
                params,
            };
        }

        Ok(expr)
    }

    fn expression_statement(&mut self) -> ParseResult<Stmt> {
        let expression = self.expression()?;
        Ok(Stmt::Expression { expression })
    }

    // ==================== Expressions ====================

    fn expression(&mut self) -> ParseResult<Expr> {
        if self.check_multi_assign() {
            return self.multi_assign();
        }
        self.assignment()
    }

    /// Pure lookahead for `ident (',' ident)+ '='`; consumes nothing
    fn check_multi_assign(&self) -> bool {
        if !self.check(TokenKind::Identifier) {
            return false;
        }

        let mut i = self.pos + 1;
        let mut saw_comma = false;
        loop {
            match self.tokens.get(i).map(|t| t.kind) {
                Some(TokenKind::Comma) => match self.tokens.get(i + 1).map(|t| t.kind) {
                    Some(TokenKind::Identifier) => {
                        saw_comma = true;
                        i += 2;
                    }
                    _ => return false,
                },
                Some(TokenKind::Equals) => return saw_comma,
                _ => return false,
            }
        }
    }

    fn multi_assign(&mut self) -> ParseResult<Expr> {
        let mut targets = vec![self.advance()];
        while self.match_kind(TokenKind::Comma) {
            targets.push(self.consume(TokenKind::Identifier, "assignment target")?);
        }
        self.consume(TokenKind::Equals, "'=' in multiple assignment")?;

        let mut values = vec![self.expression()?];
        while self.match_kind(TokenKind::Comma) {
            values.push(self.expression()?);
        }

        Ok(Expr::MultiAssign { targets, values })
    }

    fn assignment(&mut self) -> ParseResult<Expr> {
        let expr = self.or_expr()?;

        if self.match_kind(TokenKind::Equals) {
            let equals_line = self.previous().line;
            let value = self.assignment()?;
            return match expr {
                Expr::Variable { name } => Ok(Expr::Assign {
                    name,
                    value: Box::new(value),
                }),
                _ => Err(ParseError::InvalidAssignmentTarget { line: equals_line }),
            };
        }

        Ok(expr)
    }

    /// `|` / `or`. The keyword spellings share token kinds with the
    /// symbols, so the logical tiers coincide with the bitwise tiers:
    /// `|`,`or` bind loosest, then `^`, then `&`,`and`.
    fn or_expr(&mut self) -> ParseResult<Expr> {
        let mut expr = self.xor_expr()?;

        while self.check(TokenKind::Or) {
            let operator = self.advance();
            let right = self.xor_expr()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    /// `^`
    fn xor_expr(&mut self) -> ParseResult<Expr> {
        let mut expr = self.and_expr()?;

        while self.check(TokenKind::Xor) {
            let operator = self.advance();
            let right = self.and_expr()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    /// `&` / `and`
    fn and_expr(&mut self) -> ParseResult<Expr> {
        let mut expr = self.equality()?;

        while self.check(TokenKind::And) {
            let operator = self.advance();
            let right = self.equality()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    /// `==`
    fn equality(&mut self) -> ParseResult<Expr> {
        let mut expr = self.comparison()?;

        while self.check(TokenKind::EqEq) {
            let operator = self.advance();
            let right = self.comparison()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    /// `<` and `>`
    fn comparison(&mut self) -> ParseResult<Expr> {
        let mut expr = self.term()?;

        while matches!(self.current_kind(), TokenKind::Less | TokenKind::Greater) {
            let operator = self.advance();
            let right = self.term()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    /// `+` and `-`
    fn term(&mut self) -> ParseResult<Expr> {
        let mut expr = self.factor()?;

        while matches!(self.current_kind(), TokenKind::Plus | TokenKind::Minus) {
            let operator = self.advance();
            let right = self.factor()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    /// `*` and `/`
    fn factor(&mut self) -> ParseResult<Expr> {
        let mut expr = self.unary()?;

        while matches!(self.current_kind(), TokenKind::Star | TokenKind::Slash) {
            let operator = self.advance();
            let right = self.unary()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    /// Prefix `-` and `not`
    fn unary(&mut self) -> ParseResult<Expr> {
        if matches!(self.current_kind(), TokenKind::Minus | TokenKind::Not) {
            let operator = self.advance();
            let right = self.unary()?;
            return Ok(Expr::Unary {
                operator,
                right: Box::new(right),
            });
        }

        self.type_application()
    }

    /// `primary ('[' expr,* ']')*`; bracket application builds a
    /// GenericType node (`List[int]`, `items[0]`)
    fn type_application(&mut self) -> ParseResult<Expr> {
        let mut expr = self.primary()?;

        while self.match_kind(TokenKind::LBracket) {
            let mut params = Vec::new();
            if !self.check(TokenKind::RBracket) {
                loop {
                    params.push(self.expression()?);
                    if !self.match_kind(TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.consume(TokenKind::RBracket, "']' after type arguments")?;
            expr = Expr::GenericType {
                base: Box::new(expr),
                params,
            };
        }

        Ok(expr)
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        match self.current_kind() {
            TokenKind::Integer | TokenKind::Float | TokenKind::Str => {
                let token = self.advance();
                Ok(Expr::Literal {
                    value: token.literal,
                })
            }
            TokenKind::Identifier => {
                let name = self.advance();
                let expr = Expr::Variable { name };
                if self.match_kind(TokenKind::LParen) {
                    let mut arguments = Vec::new();
                    if !self.check(TokenKind::RParen) {
                        loop {
                            arguments.push(self.expression()?);
                            if !self.match_kind(TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    let paren = self.consume(TokenKind::RParen, "')' after arguments")?;
                    return Ok(Expr::Call {
                        callee: Box::new(expr),
                        paren,
                        arguments,
                    });
                }
                Ok(expr)
            }
            TokenKind::LParen => {
                self.advance();
                let expression = self.expression()?;
                self.consume(TokenKind::RParen, "')' after expression")?;
                Ok(Expr::Grouping {
                    expression: Box::new(expression),
                })
            }
            _ => {
                let token = self.current();
                Err(ParseError::ExpectedExpression {
                    found: token.describe(),
                    line: token.line,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::frontend::lexer::Lexer;
    use crate::frontend::token::Literal;

    fn parse_source(source: &str) -> (Vec<Stmt>, Vec<ParseError>) {
        let mut parser = Parser::new(Lexer::new(source).tokenize());
        let statements = parser.parse();
        let errors = parser.take_errors();
        (statements, errors)
    }

    fn parse_ok(source: &str) -> Vec<Stmt> {
        let (statements, errors) = parse_source(source);
        assert!(errors.is_empty(), "unexpected parse errors: {errors:?}");
        statements
    }

    fn only_expression(statements: &[Stmt]) -> &Expr {
        assert_eq!(statements.len(), 1);
        match &statements[0] {
            Stmt::Expression { expression } => expression,
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    #[test]
    fn test_type_hint_declaration() {
        let statements = parse_ok("x: int = 42");
        match only_expression(&statements) {
            Expr::TypeHint { name, ty, value } => {
                assert_eq!(name.lexeme, "x");
                match ty.as_ref() {
                    Expr::Variable { name } => assert_eq!(name.lexeme, "int"),
                    other => panic!("expected simple type, got {other:?}"),
                }
                assert_eq!(
                    **value,
                    Expr::Literal {
                        value: Some(Literal::Int(42))
                    }
                );
            }
            other => panic!("expected type hint, got {other:?}"),
        }
    }

    #[test]
    fn test_multiple_assignment() {
        let statements = parse_ok("x, y = 1, 2");
        match only_expression(&statements) {
            Expr::MultiAssign { targets, values } => {
                assert_eq!(targets.len(), 2);
                assert_eq!(targets[0].lexeme, "x");
                assert_eq!(targets[1].lexeme, "y");
                assert_eq!(
                    values,
                    &vec![
                        Expr::Literal {
                            value: Some(Literal::Int(1))
                        },
                        Expr::Literal {
                            value: Some(Literal::Int(2))
                        },
                    ]
                );
            }
            other => panic!("expected multi-assign, got {other:?}"),
        }
    }

    #[test]
    fn test_generic_function() {
        let statements = parse_ok("def first<T>(items: List[T]) -> T:\n    return items[0]");
        assert_eq!(statements.len(), 1);

        let func = match &statements[0] {
            Stmt::Function(func) => func,
            other => panic!("expected function, got {other:?}"),
        };

        assert_eq!(func.generic_params.len(), 1);
        assert_eq!(func.generic_params[0].lexeme, "T");

        let hint = func.params[0].type_hint.as_ref().unwrap();
        match hint {
            Expr::GenericType { base, params } => {
                assert_eq!(base.token().lexeme, "List");
                assert_eq!(params.len(), 1);
                assert_eq!(params[0].token().lexeme, "T");
            }
            other => panic!("expected generic type hint, got {other:?}"),
        }

        assert_eq!(
            func.return_type.as_ref().map(|t| t.token().lexeme.clone()),
            Some("T".to_string())
        );

        // `items[0]` reuses the bracket-application node
        match &func.body[0] {
            Stmt::Return {
                value: Some(Expr::GenericType { base, params }),
                ..
            } => {
                assert_eq!(base.token().lexeme, "items");
                assert_eq!(
                    params[0],
                    Expr::Literal {
                        value: Some(Literal::Int(0))
                    }
                );
            }
            other => panic!("expected return of bracket application, got {other:?}"),
        }
    }

    #[test]
    fn test_pattern_matching() {
        let statements = parse_ok(
            "match command:
                 case \"help\":
                     show_help()
                 case \"quit\":
                     quit()
                 case str() as cmd if cmd == \"go\":
                     run(cmd)",
        );
        assert_eq!(statements.len(), 1);

        let cases = match &statements[0] {
            Stmt::PatternMatch { cases, .. } => cases,
            other => panic!("expected match statement, got {other:?}"),
        };
        assert_eq!(cases.len(), 3);

        assert_eq!(
            cases[0].pattern,
            Expr::Literal {
                value: Some(Literal::Str("help".to_string()))
            }
        );
        assert_eq!(cases[0].body.len(), 1);

        let type_case = &cases[2];
        match &type_case.pattern {
            Expr::Call { callee, .. } => assert_eq!(callee.token().lexeme, "str"),
            other => panic!("expected call pattern, got {other:?}"),
        }
        assert_eq!(
            type_case.binding.as_ref().map(|b| b.lexeme.clone()),
            Some("cmd".to_string())
        );
        assert!(type_case.guard.is_some());
    }

    #[test]
    fn test_decorated_function() {
        let statements = parse_ok("@parallel\n@vectorize\ndef process(values):\n    return values");
        assert_eq!(statements.len(), 1);

        let func = match &statements[0] {
            Stmt::Function(func) => func,
            other => panic!("expected function, got {other:?}"),
        };
        assert_eq!(func.decorators.len(), 2);
        assert_eq!(func.decorators[0].name.lexeme, "parallel");
        assert_eq!(func.decorators[1].name.lexeme, "vectorize");
    }

    #[test]
    fn test_decorator_with_arguments() {
        let statements = parse_ok("@target(device=\"cuda\")\ndef train():\n    return 1");

        let func = match &statements[0] {
            Stmt::Function(func) => func,
            other => panic!("expected function, got {other:?}"),
        };
        assert_eq!(func.decorators.len(), 1);
        assert_eq!(func.decorators[0].arguments.len(), 1);
        match &func.decorators[0].arguments[0] {
            Expr::Assign { name, .. } => assert_eq!(name.lexeme, "device"),
            other => panic!("expected keyword-style argument, got {other:?}"),
        }
    }

    #[test]
    fn test_actor_declaration() {
        let statements = parse_ok(
            "actor WebServer:
                 state:
                     count: int = 0
                 async def handle(self, req):
                     return req",
        );
        assert_eq!(statements.len(), 1);

        let actor = match &statements[0] {
            Stmt::Actor(actor) => actor,
            other => panic!("expected actor, got {other:?}"),
        };
        assert_eq!(actor.name.lexeme, "WebServer");
        assert_eq!(actor.state_vars.len(), 1);
        assert_eq!(actor.methods.len(), 1);
        assert!(actor.methods[0].is_async);
        assert_eq!(actor.methods[0].name.lexeme, "handle");
        assert_eq!(actor.methods[0].params.len(), 2);
    }

    #[test]
    fn test_async_function() {
        let statements = parse_ok("async def fetch():\n    return 1");
        match &statements[0] {
            Stmt::Function(func) => assert!(func.is_async),
            other => panic!("expected function, got {other:?}"),
        }
    }

    #[test]
    fn test_bitwise_grouping() {
        let statements = parse_ok("x = (a & b) | (c ^ d)");
        match only_expression(&statements) {
            Expr::Assign { value, .. } => match value.as_ref() {
                Expr::Binary {
                    left,
                    operator,
                    right,
                } => {
                    assert_eq!(operator.kind, TokenKind::Or);
                    match left.as_ref() {
                        Expr::Grouping { expression } => {
                            assert_eq!(expression.token().kind, TokenKind::And)
                        }
                        other => panic!("expected grouping, got {other:?}"),
                    }
                    match right.as_ref() {
                        Expr::Grouping { expression } => {
                            assert_eq!(expression.token().kind, TokenKind::Xor)
                        }
                        other => panic!("expected grouping, got {other:?}"),
                    }
                }
                other => panic!("expected binary, got {other:?}"),
            },
            other => panic!("expected assignment, got {other:?}"),
        }
    }

    #[test]
    fn test_left_associativity() {
        let statements = parse_ok("1 + 2 - 3");
        match only_expression(&statements) {
            Expr::Binary {
                left,
                operator,
                right,
            } => {
                assert_eq!(operator.lexeme, "-");
                match left.as_ref() {
                    Expr::Binary { operator, .. } => assert_eq!(operator.lexeme, "+"),
                    other => panic!("expected nested binary on the left, got {other:?}"),
                }
                assert_eq!(
                    **right,
                    Expr::Literal {
                        value: Some(Literal::Int(3))
                    }
                );
            }
            other => panic!("expected binary, got {other:?}"),
        }
    }

    #[test]
    fn test_precedence() {
        let statements = parse_ok("1 + 2 * 3");
        match only_expression(&statements) {
            Expr::Binary {
                left,
                operator,
                right,
            } => {
                assert_eq!(operator.lexeme, "+");
                assert_eq!(
                    **left,
                    Expr::Literal {
                        value: Some(Literal::Int(1))
                    }
                );
                match right.as_ref() {
                    Expr::Binary { operator, .. } => assert_eq!(operator.lexeme, "*"),
                    other => panic!("expected nested binary on the right, got {other:?}"),
                }
            }
            other => panic!("expected binary, got {other:?}"),
        }
    }

    #[test]
    fn test_enhanced_for_loop() {
        let statements = parse_ok("for x in values if x > 0:\n    process(x)");
        assert_eq!(statements.len(), 1);

        match &statements[0] {
            Stmt::For {
                target,
                filter,
                body,
                ..
            } => {
                assert_eq!(target.lexeme, "x");
                match filter {
                    Some(Expr::Binary { operator, .. }) => {
                        assert_eq!(operator.kind, TokenKind::Greater)
                    }
                    other => panic!("expected binary filter, got {other:?}"),
                }
                assert_eq!(body.len(), 1);
            }
            other => panic!("expected for statement, got {other:?}"),
        }
    }

    #[test]
    fn test_if_else_single_statement_branches() {
        let statements = parse_ok("if x:\n    y = 1\nelse:\n    y = 2");
        assert_eq!(statements.len(), 1);

        match &statements[0] {
            Stmt::If {
                then_branch,
                else_branch,
                ..
            } => {
                assert!(matches!(**then_branch, Stmt::Expression { .. }));
                assert!(else_branch.is_some());
            }
            other => panic!("expected if statement, got {other:?}"),
        }
    }

    #[test]
    fn test_with_body_runs_to_next_declaration() {
        let statements = parse_ok("with session:\n    send(session)\ndef f():\n    return 1");
        assert_eq!(statements.len(), 2);

        match &statements[0] {
            Stmt::With { body, .. } => assert_eq!(body.len(), 1),
            other => panic!("expected with statement, got {other:?}"),
        }
        assert!(matches!(statements[1], Stmt::Function(_)));
    }

    #[test]
    fn test_invalid_assignment_target() {
        let (statements, errors) = parse_source("1 = 2");
        assert!(statements.is_empty());
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0],
            ParseError::InvalidAssignmentTarget { .. }
        ));
    }

    #[test]
    fn test_error_message_includes_lexeme() {
        let (_, errors) = parse_source("def f(:");
        assert_eq!(errors.len(), 1);
        let message = errors[0].to_string();
        assert!(message.contains("parameter name"), "{message}");
        assert!(message.contains("':'"), "{message}");
    }

    #[test]
    fn test_error_message_names_end_of_file() {
        let (_, errors) = parse_source("def f(");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("end of file"));
    }

    #[test]
    fn test_recovery_keeps_surrounding_functions() {
        let (statements, errors) = parse_source(
            "def good():
                 return 1
             def broken(:
                 return 2
             def last():
                 return 3",
        );

        assert_eq!(errors.len(), 1);
        let functions: Vec<&str> = statements
            .iter()
            .filter_map(|s| match s {
                Stmt::Function(f) => Some(f.name.lexeme.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(functions, vec!["good", "last"]);
    }

    #[test]
    fn test_expected_pattern_error() {
        let (_, errors) = parse_source("match x:\n    case +:\n        y = 1");
        assert!(errors
            .iter()
            .any(|e| matches!(e, ParseError::ExpectedPattern { .. })));
    }

    #[test]
    fn test_moderate_nesting_depth() {
        let source = format!("{}{}{}", "(".repeat(64), "1", ")".repeat(64));
        let statements = parse_ok(&source);
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn test_call_arguments() {
        let statements = parse_ok("f(1, g(2))");
        match only_expression(&statements) {
            Expr::Call { arguments, .. } => {
                assert_eq!(arguments.len(), 2);
                assert!(matches!(arguments[1], Expr::Call { .. }));
            }
            other => panic!("expected call, got {other:?}"),
        }
    }
}
