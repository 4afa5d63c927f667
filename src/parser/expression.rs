use crate::arena::Handle;
use crate::ast::{BinaryOp, Expression, ExpressionKind, Literal, UnaryOp};
use crate::lexer::Token;
use crate::parser::{Failed, ParseResult, Parser};
use crate::source::Span;

type Level<'a> = fn(&mut Parser<'a>) -> ParseResult<Handle<Expression>>;

fn logical_or_op(token: &Token) -> Option<BinaryOp> {
    match token {
        Token::OrOr => Some(BinaryOp::LogicalOr),
        _ => None,
    }
}

fn logical_and_op(token: &Token) -> Option<BinaryOp> {
    match token {
        Token::AndAnd => Some(BinaryOp::LogicalAnd),
        _ => None,
    }
}

fn inclusive_or_op(token: &Token) -> Option<BinaryOp> {
    match token {
        Token::Or => Some(BinaryOp::Or),
        _ => None,
    }
}

fn exclusive_or_op(token: &Token) -> Option<BinaryOp> {
    match token {
        Token::Xor => Some(BinaryOp::Xor),
        _ => None,
    }
}

fn and_op(token: &Token) -> Option<BinaryOp> {
    match token {
        Token::And => Some(BinaryOp::And),
        _ => None,
    }
}

fn equality_op(token: &Token) -> Option<BinaryOp> {
    match token {
        Token::EqualEqual => Some(BinaryOp::Equal),
        Token::NotEqual => Some(BinaryOp::NotEqual),
        _ => None,
    }
}

fn relational_op(token: &Token) -> Option<BinaryOp> {
    match token {
        Token::Less => Some(BinaryOp::LessThan),
        Token::Greater => Some(BinaryOp::GreaterThan),
        Token::LessEqual => Some(BinaryOp::LessThanEqual),
        Token::GreaterEqual => Some(BinaryOp::GreaterThanEqual),
        _ => None,
    }
}

fn shift_op(token: &Token) -> Option<BinaryOp> {
    match token {
        Token::ShiftLeft => Some(BinaryOp::ShiftLeft),
        Token::ShiftRight => Some(BinaryOp::ShiftRight),
        _ => None,
    }
}

fn additive_op(token: &Token) -> Option<BinaryOp> {
    match token {
        Token::Plus => Some(BinaryOp::Add),
        Token::Minus => Some(BinaryOp::Subtract),
        _ => None,
    }
}

fn multiplicative_op(token: &Token) -> Option<BinaryOp> {
    match token {
        Token::Star => Some(BinaryOp::Multiply),
        Token::Slash => Some(BinaryOp::Divide),
        Token::Percent => Some(BinaryOp::Modulo),
        _ => None,
    }
}

impl<'a> Parser<'a> {
    fn expr_span(&self, expr: Handle<Expression>) -> Span {
        self.module.expressions[expr].span.clone()
    }

    /// One precedence level: `next (op next)*`.
    ///
    /// A failed left operand is a silent non-match. Once an operator is
    /// consumed, a missing right operand is an error reported at the token
    /// after the operator.
    fn binary_level(
        &mut self,
        next: Level<'a>,
        operator: fn(&Token) -> Option<BinaryOp>,
    ) -> ParseResult<Handle<Expression>> {
        let Some(mut lhs) = next(self)? else {
            return Ok(None);
        };

        while let Some(op) = self.peek().and_then(operator) {
            let op_span = self.peek_span();
            self.pos += 1;

            let rhs_span = self.peek_span();
            let Some(rhs) = next(self)? else {
                return Err(self.add_error(
                    rhs_span,
                    format!("unable to parse right side of {} expression", op),
                ));
            };

            let range = self.expr_span(lhs).range.start..self.expr_span(rhs).range.end;
            lhs = self.module.add_expression(
                ExpressionKind::Binary { op, lhs, rhs },
                Span::new(range, op_span.begin),
            );
        }

        Ok(Some(lhs))
    }

    pub fn expression(&mut self) -> ParseResult<Handle<Expression>> {
        self.logical_or_expression()
    }

    pub fn logical_or_expression(&mut self) -> ParseResult<Handle<Expression>> {
        self.binary_level(Self::logical_and_expression, logical_or_op)
    }

    pub fn logical_and_expression(&mut self) -> ParseResult<Handle<Expression>> {
        self.binary_level(Self::inclusive_or_expression, logical_and_op)
    }

    pub fn inclusive_or_expression(&mut self) -> ParseResult<Handle<Expression>> {
        self.binary_level(Self::exclusive_or_expression, inclusive_or_op)
    }

    pub fn exclusive_or_expression(&mut self) -> ParseResult<Handle<Expression>> {
        self.binary_level(Self::and_expression, exclusive_or_op)
    }

    pub fn and_expression(&mut self) -> ParseResult<Handle<Expression>> {
        self.binary_level(Self::equality_expression, and_op)
    }

    pub fn equality_expression(&mut self) -> ParseResult<Handle<Expression>> {
        self.binary_level(Self::relational_expression, equality_op)
    }

    pub fn relational_expression(&mut self) -> ParseResult<Handle<Expression>> {
        self.binary_level(Self::shift_expression, relational_op)
    }

    pub fn shift_expression(&mut self) -> ParseResult<Handle<Expression>> {
        self.binary_level(Self::additive_expression, shift_op)
    }

    pub fn additive_expression(&mut self) -> ParseResult<Handle<Expression>> {
        self.binary_level(Self::multiplicative_expression, additive_op)
    }

    pub fn multiplicative_expression(&mut self) -> ParseResult<Handle<Expression>> {
        self.binary_level(Self::unary_expression, multiplicative_op)
    }

    pub fn unary_expression(&mut self) -> ParseResult<Handle<Expression>> {
        let op = match self.peek() {
            Some(Token::Minus) => UnaryOp::Negation,
            Some(Token::Bang) => UnaryOp::Not,
            Some(Token::Tilde) => UnaryOp::Complement,
            _ => return self.postfix_expression(),
        };
        let span = self.peek_span();
        self.pos += 1;

        let operand_span = self.peek_span();
        let Some(expr) = self.unary_expression()? else {
            return Err(self.add_error(
                operand_span,
                format!("unable to parse right side of {} expression", op),
            ));
        };
        let range = span.range.start..self.expr_span(expr).range.end;
        Ok(Some(self.module.add_expression(
            ExpressionKind::Unary { op, expr },
            Span::new(range, span.begin),
        )))
    }

    /// `primary ('[' expr ']' | '.' ident)*`
    pub fn postfix_expression(&mut self) -> ParseResult<Handle<Expression>> {
        let Some(mut expr) = self.primary_expression()? else {
            return Ok(None);
        };

        loop {
            if self.check(&Token::LBracket) {
                let span = self.peek_span();
                self.pos += 1;
                let index_span = self.peek_span();
                let Some(index) = self.logical_or_expression()? else {
                    return Err(self.add_error(index_span, "unable to parse expression inside []"));
                };
                self.expect(&Token::RBracket, "array accessor")?;
                let range = self.expr_span(expr).range.start..self.last_span().range.end;
                expr = self.module.add_expression(
                    ExpressionKind::ArrayAccessor { array: expr, index },
                    Span::new(range, span.begin),
                );
            } else if self.check(&Token::Period) {
                let span = self.peek_span();
                self.pos += 1;
                let (member, member_span) = self.expect_ident("member accessor")?;
                let range = self.expr_span(expr).range.start..member_span.range.end;
                expr = self.module.add_expression(
                    ExpressionKind::MemberAccessor {
                        structure: expr,
                        member,
                    },
                    Span::new(range, span.begin),
                );
            } else {
                return Ok(Some(expr));
            }
        }
    }

    pub fn primary_expression(&mut self) -> ParseResult<Handle<Expression>> {
        let span = self.peek_span();
        let literal = match self.peek() {
            Some(Token::Bool(b)) => Some(Literal::Bool(*b)),
            Some(Token::Int(v)) => Some(Literal::Sint(*v)),
            Some(Token::Uint(v)) => Some(Literal::Uint(*v)),
            Some(Token::Float(v)) => Some(Literal::Float(*v)),
            _ => None,
        };
        if let Some(literal) = literal {
            self.pos += 1;
            return Ok(Some(
                self.module
                    .add_expression(ExpressionKind::ScalarConstructor(literal), span),
            ));
        }

        match self.peek() {
            Some(Token::LParen) => self.paren_expression().map(Some),
            Some(Token::Ident(name)) => {
                let constructs_type = (self.is_type_name(name)
                    && matches!(self.peek_at(1), Some(Token::Less) | Some(Token::LParen)))
                    || (self.module.find_alias(name).is_some()
                        && self.peek_at(1) == Some(&Token::LParen));
                if constructs_type {
                    self.type_constructor().map(Some)
                } else {
                    self.identifier_or_call().map(Some)
                }
            }
            _ => Ok(None),
        }
    }

    /// `'(' expr ')'`
    pub fn paren_expression(&mut self) -> Result<Handle<Expression>, Failed> {
        self.expect(&Token::LParen, "expression")?;
        let span = self.peek_span();
        let Some(expr) = self.logical_or_expression()? else {
            return Err(self.add_error(span, "unable to parse expression"));
        };
        self.expect(&Token::RParen, "expression")?;
        Ok(expr)
    }

    fn type_constructor(&mut self) -> Result<Handle<Expression>, Failed> {
        let span = self.peek_span();
        let Some(ty) = self.type_decl()? else {
            return Err(self.add_error(span, "unable to determine type for constructor"));
        };
        let values = self.argument_list("type constructor")?;
        let range = span.range.start..self.last_span().range.end;
        Ok(self.module.add_expression(
            ExpressionKind::TypeConstructor { ty, values },
            Span::new(range, span.begin),
        ))
    }

    fn identifier_or_call(&mut self) -> Result<Handle<Expression>, Failed> {
        let (first, span) = self.expect_ident("identifier")?;
        let mut segments = vec![first];
        while self.eat(&Token::Namespace) {
            let (segment, _) = self.expect_ident("namespaced identifier")?;
            segments.push(segment);
        }
        let range = span.range.start..self.last_span().range.end;
        let ident = self.module.add_expression(
            ExpressionKind::Identifier(segments),
            Span::new(range.clone(), span.begin),
        );

        if !self.check(&Token::LParen) {
            return Ok(ident);
        }
        let args = self.argument_list("function call")?;
        let range = range.start..self.last_span().range.end;
        Ok(self.module.add_expression(
            ExpressionKind::Call {
                function: ident,
                args,
            },
            Span::new(range, span.begin),
        ))
    }

    /// `'(' (expr (',' expr)* ','?)? ')'`
    fn argument_list(&mut self, context: &str) -> Result<Vec<Handle<Expression>>, Failed> {
        self.expect(&Token::LParen, context)?;
        let mut args = vec![];
        while !self.eat(&Token::RParen) {
            let span = self.peek_span();
            let Some(arg) = self.logical_or_expression()? else {
                return Err(self.add_error(span, format!("expected ')' for {}", context)));
            };
            args.push(arg);
            if !self.eat(&Token::Comma) {
                self.expect(&Token::RParen, context)?;
                break;
            }
        }
        Ok(args)
    }
}
