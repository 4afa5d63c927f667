pub mod expression;
pub mod function;
pub mod types;

#[cfg(test)]
pub mod test;

use tracing::{debug, trace};

use crate::arena::Handle;
use crate::ast::{
    AddressSpace, Decoration, DiagnosticDirective, DiagnosticSeverity, EntryPoint, Import, Module,
    PipelineStage, Type, Variable,
};
use crate::diagnostic::Diagnostics;
use crate::lexer::{SpannedToken, Token, end_of_input, tokenize};
use crate::source::Span;

/// Marker for a production that matched partially and recorded an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Failed;

/// `Ok(None)`: the production does not apply here, nothing was consumed.
/// `Err(Failed)`: the production committed and an error is recorded.
pub type ParseResult<T> = Result<Option<T>, Failed>;

pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<SpannedToken>,
    pos: usize,
    module: Module,
    diagnostics: Diagnostics,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        let (tokens, diagnostics) = tokenize(source);
        Parser {
            source,
            tokens,
            pos: 0,
            module: Module::new(),
            diagnostics,
        }
    }

    /// Parses the whole translation unit. Stops at the first syntax error.
    pub fn parse(&mut self) -> bool {
        debug!(tokens = self.tokens.len(), "parsing translation unit");
        if self.diagnostics.has_error() {
            return false;
        }
        while !self.at_end() {
            if self.global_decl().is_err() {
                break;
            }
        }
        debug!(
            functions = self.module.functions.len(),
            globals = self.module.global_variables.len(),
            errors = self.diagnostics.errors().count(),
            "parsed translation unit"
        );
        !self.has_error()
    }

    pub fn has_error(&self) -> bool {
        self.diagnostics.has_error()
    }

    pub fn error(&self) -> String {
        self.diagnostics.error()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn into_module(self) -> Module {
        self.module
    }

    pub fn into_parts(self) -> (Module, Diagnostics) {
        (self.module, self.diagnostics)
    }

    // token cursor

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.peek_at(0)
    }

    fn peek_at(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n).map(|t| &t.token)
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    /// Span of the next token, or the end of input.
    fn peek_span(&self) -> Span {
        match self.tokens.get(self.pos) {
            Some(t) => t.span.clone(),
            None => end_of_input(self.source),
        }
    }

    /// Span of the most recently consumed token.
    fn last_span(&self) -> Span {
        match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(t) => t.span.clone(),
            None => Span::default(),
        }
    }

    fn next(&mut self) -> Option<SpannedToken> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn add_error(&mut self, span: Span, message: impl Into<String>) -> Failed {
        self.diagnostics.add_error(span, message);
        Failed
    }

    /// Consumes `token` or records `expected '<token>' for <context>`.
    fn expect(&mut self, token: &Token, context: &str) -> Result<Span, Failed> {
        if self.eat(token) {
            return Ok(self.last_span());
        }
        let span = self.peek_span();
        Err(self.add_error(span, format!("expected '{}' for {}", token, context)))
    }

    fn expect_ident(&mut self, context: &str) -> Result<(String, Span), Failed> {
        if let Some(Token::Ident(name)) = self.peek() {
            let name = name.clone();
            self.pos += 1;
            return Ok((name, self.last_span()));
        }
        let span = self.peek_span();
        Err(self.add_error(span, format!("expected identifier for {}", context)))
    }

    /// Consumes a closing `>`, splitting a `>>` into two.
    fn expect_template_close(&mut self, context: &str) -> Result<(), Failed> {
        if self.check(&Token::ShiftRight) {
            let current = &mut self.tokens[self.pos];
            current.token = Token::Greater;
            current.span.range.start += 1;
            current.span.begin.column += 1;
            return Ok(());
        }
        self.expect(&Token::Greater, context).map(|_| ())
    }

    // module scope

    fn global_decl(&mut self) -> Result<(), Failed> {
        let span = self.peek_span();
        match self.peek() {
            Some(Token::Semicolon) => {
                self.pos += 1;
                Ok(())
            }
            Some(Token::KeywordImport) => self.import_decl(),
            Some(Token::KeywordDiagnostic) => self.diagnostic_directive(),
            Some(Token::Attr) | Some(Token::KeywordVar) => {
                let decorations = self.attributes()?;
                let Some(var) = self.variable_decl(decorations)? else {
                    let span = self.peek_span();
                    return Err(self.add_error(span, "expected variable declaration after attributes"));
                };
                if self.eat(&Token::Equal) {
                    let Some(init) = self.logical_or_expression()? else {
                        let span = self.peek_span();
                        return Err(self.add_error(span, "missing initializer for variable declaration"));
                    };
                    self.module.variables[var].initializer = Some(init);
                }
                self.expect(&Token::Semicolon, "variable declaration")?;
                self.module.global_variables.push(var);
                Ok(())
            }
            Some(Token::KeywordConst) => {
                let var = self.const_decl()?;
                self.expect(&Token::Semicolon, "constant declaration")?;
                self.module.global_variables.push(var);
                Ok(())
            }
            Some(Token::KeywordType) => self.type_alias(),
            Some(Token::KeywordEntryPoint) => self.entry_point_decl(),
            Some(Token::KeywordFn) => {
                let func = self.function_decl()?;
                trace!(name = %func.name, "parsed function");
                self.module.functions.push(func);
                Ok(())
            }
            Some(token) => {
                let message = format!("unexpected token '{}' at module scope", token);
                Err(self.add_error(span, message))
            }
            None => Ok(()),
        }
    }

    fn import_decl(&mut self) -> Result<(), Failed> {
        let span = self.peek_span();
        self.pos += 1;
        let path = match self.next() {
            Some(SpannedToken {
                token: Token::String(path),
                ..
            }) => path,
            _ => {
                let span = self.last_span();
                return Err(self.add_error(span, "expected path string for import"));
            }
        };
        self.expect(&Token::KeywordAs, "import")?;
        let (first, _) = self.expect_ident("import name")?;
        let mut segments = vec![first];
        while self.eat(&Token::Namespace) {
            let (segment, _) = self.expect_ident("import name")?;
            segments.push(segment);
        }
        self.expect(&Token::Semicolon, "import")?;
        self.module.imports.push(Import {
            path,
            name: segments.join("::"),
            span,
        });
        Ok(())
    }

    fn diagnostic_directive(&mut self) -> Result<(), Failed> {
        let span = self.peek_span();
        self.pos += 1;
        self.expect(&Token::LParen, "diagnostic directive")?;
        let (severity_name, severity_span) = self.expect_ident("diagnostic severity")?;
        let Some(severity) = DiagnosticSeverity::parse(&severity_name) else {
            return Err(self.add_error(
                severity_span,
                format!("invalid diagnostic severity '{}'", severity_name),
            ));
        };
        self.expect(&Token::Comma, "diagnostic directive")?;
        let (rule, _) = self.expect_ident("diagnostic rule name")?;
        self.expect(&Token::RParen, "diagnostic directive")?;
        self.expect(&Token::Semicolon, "diagnostic directive")?;
        self.module.diagnostic_directives.push(DiagnosticDirective {
            severity,
            rule,
            span,
        });
        Ok(())
    }

    /// `var (<space>)? name : type`. The address space stays `None` when omitted.
    fn variable_decl(
        &mut self,
        decorations: Vec<Decoration>,
    ) -> ParseResult<Handle<Variable>> {
        if !self.check(&Token::KeywordVar) {
            return Ok(None);
        }
        let span = self.peek_span();
        self.pos += 1;

        let mut space = AddressSpace::None;
        if self.eat(&Token::Less) {
            let (name, name_span) = self.expect_ident("variable address space")?;
            space = AddressSpace::parse(&name);
            if space == AddressSpace::Invalid {
                return Err(self.add_error(name_span, format!("invalid address space '{}'", name)));
            }
            self.expect_template_close("variable address space")?;
        }

        let (name, _) = self.expect_ident("variable declaration")?;
        self.expect(&Token::Colon, "variable declaration")?;
        let Some(ty) = self.type_decl()? else {
            let span = self.peek_span();
            return Err(self.add_error(span, "invalid type for variable declaration"));
        };

        Ok(Some(self.module.add_variable(Variable {
            name,
            ty,
            space,
            is_const: false,
            initializer: None,
            decorations,
            span,
        })))
    }

    /// `const name : type = expr`
    fn const_decl(&mut self) -> Result<Handle<Variable>, Failed> {
        let span = self.peek_span();
        self.pos += 1;
        let (name, _) = self.expect_ident("constant declaration")?;
        self.expect(&Token::Colon, "constant declaration")?;
        let Some(ty) = self.type_decl()? else {
            let span = self.peek_span();
            return Err(self.add_error(span, "invalid type for constant declaration"));
        };
        self.expect(&Token::Equal, "constant declaration")?;
        let Some(init) = self.logical_or_expression()? else {
            let span = self.peek_span();
            return Err(self.add_error(span, "missing initializer for constant declaration"));
        };
        Ok(self.module.add_variable(Variable {
            name,
            ty,
            space: AddressSpace::None,
            is_const: true,
            initializer: Some(init),
            decorations: Vec::new(),
            span,
        }))
    }

    fn type_alias(&mut self) -> Result<(), Failed> {
        self.pos += 1;
        let (name, name_span) = self.expect_ident("type alias")?;
        if self.module.find_alias(&name).is_some() {
            return Err(self.add_error(name_span, format!("redefinition of type alias '{}'", name)));
        }
        self.expect(&Token::Equal, "type alias")?;
        let Some(base) = self.type_decl()? else {
            let span = self.peek_span();
            return Err(self.add_error(span, "invalid type alias"));
        };
        self.expect(&Token::Semicolon, "type alias")?;
        let alias = self.module.intern_type(Type::Alias { name, base });
        self.module.aliases.push(alias);
        Ok(())
    }

    fn entry_point_decl(&mut self) -> Result<(), Failed> {
        let span = self.peek_span();
        self.pos += 1;
        let (stage_name, stage_span) = self.expect_ident("entry point stage")?;
        let Some(stage) = PipelineStage::parse(&stage_name) else {
            return Err(self.add_error(
                stage_span,
                format!("invalid value for entry point stage '{}'", stage_name),
            ));
        };
        self.expect(&Token::Equal, "entry point declaration")?;
        let (function, _) = self.expect_ident("entry point function name")?;
        self.expect(&Token::Semicolon, "entry point declaration")?;
        self.module.entry_points.push(EntryPoint {
            stage,
            function,
            span,
        });
        Ok(())
    }
}
