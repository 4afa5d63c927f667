use crate::arena::Handle;
use crate::ast::{
    AddressSpace, BlockStatement, Expression, ExpressionKind, Function, Statement, StatementKind, Type,
    Variable,
};
use crate::lexer::Token;
use crate::parser::{Failed, ParseResult, Parser};
use crate::source::Span;

impl Parser<'_> {
    /// `fn name '(' params? ')' ('->' type)? block`
    pub fn function_decl(&mut self) -> Result<Function, Failed> {
        let span = self.expect(&Token::KeywordFn, "function declaration")?;
        let (name, _) = self.expect_ident("function declaration")?;

        self.expect(&Token::LParen, "function declaration")?;
        let mut params = vec![];
        while !self.eat(&Token::RParen) {
            params.push(self.param()?);
            if !self.eat(&Token::Comma) {
                self.expect(&Token::RParen, "function declaration")?;
                break;
            }
        }

        let return_type = if self.eat(&Token::Arrow) {
            let span = self.peek_span();
            match self.type_decl()? {
                Some(ty) => ty,
                None => return Err(self.add_error(span, "unable to determine function return type")),
            }
        } else {
            self.module.intern_type(Type::Void)
        };

        let Some(body) = self.block()? else {
            let span = self.peek_span();
            return Err(self.add_error(span, "expected '{' for function body"));
        };

        Ok(Function {
            name,
            params,
            return_type,
            body,
            span,
        })
    }

    /// `attribute* name ':' type`
    fn param(&mut self) -> Result<Handle<Variable>, Failed> {
        let decorations = self.attributes()?;
        let (name, span) = self.expect_ident("parameter")?;
        self.expect(&Token::Colon, "parameter")?;
        let type_span = self.peek_span();
        let Some(ty) = self.type_decl()? else {
            return Err(self.add_error(type_span, "invalid type for parameter"));
        };
        Ok(self.module.add_variable(Variable {
            name,
            ty,
            space: AddressSpace::None,
            is_const: false,
            initializer: None,
            decorations,
            span,
        }))
    }

    /// `'{' statement* '}'`
    pub fn block(&mut self) -> ParseResult<BlockStatement> {
        if !self.check(&Token::LBrace) {
            return Ok(None);
        }
        let start = self.peek_span();
        self.pos += 1;

        let mut statements = vec![];
        loop {
            if self.eat(&Token::RBrace) {
                break;
            }
            if self.eat(&Token::Semicolon) {
                continue;
            }
            match self.statement()? {
                Some(stmt) => statements.push(stmt),
                None => {
                    let span = self.peek_span();
                    return Err(self.add_error(span, "expected '}' for block statement"));
                }
            }
        }

        let range = start.range.start..self.last_span().range.end;
        Ok(Some(BlockStatement {
            statements,
            span: Span::new(range, start.begin),
        }))
    }

    fn expect_block(&mut self, context: &str) -> Result<BlockStatement, Failed> {
        match self.block()? {
            Some(block) => Ok(block),
            None => {
                let span = self.peek_span();
                Err(self.add_error(span, format!("expected '{{' for {}", context)))
            }
        }
    }

    pub fn statement(&mut self) -> ParseResult<Statement> {
        let span = self.peek_span();
        let kind = match self.peek() {
            Some(Token::LBrace) => match self.block()? {
                Some(block) => StatementKind::Block(block),
                None => return Ok(None),
            },
            Some(Token::KeywordReturn) => {
                self.pos += 1;
                let value = self.logical_or_expression()?;
                self.expect(&Token::Semicolon, "return statement")?;
                StatementKind::Return(value)
            }
            Some(Token::KeywordIf) => self.if_statement()?,
            Some(Token::KeywordLoop) => self.loop_statement()?,
            Some(Token::KeywordBreak) => {
                self.pos += 1;
                self.expect(&Token::Semicolon, "break statement")?;
                StatementKind::Break
            }
            Some(Token::KeywordContinue) => {
                self.pos += 1;
                self.expect(&Token::Semicolon, "continue statement")?;
                StatementKind::Continue
            }
            Some(Token::KeywordDiscard) => {
                self.pos += 1;
                self.expect(&Token::Semicolon, "discard statement")?;
                StatementKind::Discard
            }
            Some(Token::KeywordVar) => {
                let Some(var) = self.variable_decl(vec![])? else {
                    return Ok(None);
                };
                if self.eat(&Token::Equal) {
                    let init_span = self.peek_span();
                    let Some(init) = self.logical_or_expression()? else {
                        return Err(self.add_error(init_span, "missing initializer for variable declaration"));
                    };
                    self.module.variables[var].initializer = Some(init);
                }
                self.expect(&Token::Semicolon, "variable declaration")?;
                StatementKind::VariableDecl(var)
            }
            Some(Token::KeywordConst) => {
                let var = self.const_decl()?;
                self.expect(&Token::Semicolon, "constant declaration")?;
                StatementKind::VariableDecl(var)
            }
            Some(Token::Underscore) => {
                self.pos += 1;
                let lhs = self
                    .module
                    .add_expression(ExpressionKind::Phony, span.clone());
                self.assignment_rhs(lhs)?
            }
            _ => {
                let Some(expr) = self.logical_or_expression()? else {
                    return Ok(None);
                };
                let is_call = matches!(
                    self.module.expressions[expr].kind,
                    ExpressionKind::Call { .. }
                );
                if is_call && self.eat(&Token::Semicolon) {
                    StatementKind::Call(expr)
                } else {
                    self.assignment_rhs(expr)?
                }
            }
        };

        let range = span.range.start..self.last_span().range.end;
        Ok(Some(Statement::new(kind, Span::new(range, span.begin))))
    }

    /// `'=' expr ';'` following an assignment target.
    fn assignment_rhs(&mut self, lhs: Handle<Expression>) -> Result<StatementKind, Failed> {
        self.expect(&Token::Equal, "assignment")?;
        let span = self.peek_span();
        let Some(rhs) = self.logical_or_expression()? else {
            return Err(self.add_error(span, "unable to parse right side of assignment"));
        };
        self.expect(&Token::Semicolon, "assignment")?;
        Ok(StatementKind::Assign { lhs, rhs })
    }

    /// `if expr block ('else' (if_statement | block))?`
    fn if_statement(&mut self) -> Result<StatementKind, Failed> {
        self.pos += 1;
        let span = self.peek_span();
        let Some(condition) = self.logical_or_expression()? else {
            return Err(self.add_error(span, "unable to parse condition expression"));
        };
        let accept = self.expect_block("if statement")?;

        let reject = if self.eat(&Token::KeywordElse) {
            if self.check(&Token::KeywordIf) {
                let span = self.peek_span();
                let nested = self.if_statement()?;
                let range = span.range.start..self.last_span().range.end;
                let nested_span = Span::new(range, span.begin);
                Some(BlockStatement {
                    statements: vec![Statement::new(nested, nested_span.clone())],
                    span: nested_span,
                })
            } else {
                Some(self.expect_block("else statement")?)
            }
        } else {
            None
        };

        Ok(StatementKind::If {
            condition,
            accept,
            reject,
        })
    }

    /// `loop '{' statement* ('continuing' block)? '}'`
    fn loop_statement(&mut self) -> Result<StatementKind, Failed> {
        self.pos += 1;
        let start = self.expect(&Token::LBrace, "loop statement")?;

        let mut statements = vec![];
        let mut continuing = None;
        loop {
            if self.eat(&Token::RBrace) {
                break;
            }
            if self.eat(&Token::Semicolon) {
                continue;
            }
            if self.eat(&Token::KeywordContinuing) {
                continuing = Some(self.expect_block("continuing statement")?);
                self.expect(&Token::RBrace, "loop statement")?;
                break;
            }
            match self.statement()? {
                Some(stmt) => statements.push(stmt),
                None => {
                    let span = self.peek_span();
                    return Err(self.add_error(span, "expected '}' for loop statement"));
                }
            }
        }

        let range = start.range.start..self.last_span().range.end;
        Ok(StatementKind::Loop {
            body: BlockStatement {
                statements,
                span: Span::new(range, start.begin),
            },
            continuing,
        })
    }
}
