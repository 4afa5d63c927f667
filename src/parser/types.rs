use crate::arena::Handle;
use crate::ast::{AccessControl, AddressSpace, Builtin, Decoration, DecorationKind, Type};
use crate::lexer::Token;
use crate::parser::{Failed, ParseResult, Parser};
use crate::source::Span;

/// `matCxR` dimensions, if `name` spells one.
fn matrix_dimensions(name: &str) -> Option<(u32, u32)> {
    let dims = name.strip_prefix("mat")?.as_bytes();
    match dims {
        [c @ b'2'..=b'4', b'x', r @ b'2'..=b'4'] => Some(((c - b'0') as u32, (r - b'0') as u32)),
        _ => None,
    }
}

impl Parser<'_> {
    /// Builtin type spellings, not counting aliases.
    pub(crate) fn is_type_name(&self, name: &str) -> bool {
        matches!(
            name,
            "bool" | "i32" | "u32" | "f32" | "void" | "vec2" | "vec3" | "vec4" | "array" | "ptr"
        ) || matrix_dimensions(name).is_some()
    }

    pub fn type_decl(&mut self) -> ParseResult<Handle<Type>> {
        let Some(Token::Ident(name)) = self.peek() else {
            return Ok(None);
        };
        let name = name.clone();
        let span = self.peek_span();

        let scalar = match name.as_str() {
            "bool" => Some(Type::Bool),
            "i32" => Some(Type::I32),
            "u32" => Some(Type::U32),
            "f32" => Some(Type::F32),
            "void" => Some(Type::Void),
            _ => None,
        };
        if let Some(scalar) = scalar {
            self.pos += 1;
            return Ok(Some(self.module.intern_type(scalar)));
        }

        if let Some(size) = name.strip_prefix("vec").and_then(|n| n.parse::<u32>().ok()) {
            if (2..=4).contains(&size) {
                self.pos += 1;
                let component = self.template_subtype("vector")?;
                return Ok(Some(self.module.intern_type(Type::Vector { size, component })));
            }
        }

        if let Some((columns, rows)) = matrix_dimensions(&name) {
            self.pos += 1;
            let component = self.template_subtype("matrix")?;
            return Ok(Some(self.module.intern_type(Type::Matrix {
                columns,
                rows,
                component,
            })));
        }

        match name.as_str() {
            "array" => {
                self.pos += 1;
                self.array_type().map(Some)
            }
            "ptr" => {
                self.pos += 1;
                self.pointer_type().map(Some)
            }
            _ => match self.module.find_alias(&name) {
                Some(alias) => {
                    self.pos += 1;
                    Ok(Some(alias))
                }
                None => Err(self.add_error(span, format!("unknown type alias '{}'", name))),
            },
        }
    }

    /// `'<' type '>'`
    fn template_subtype(&mut self, context: &str) -> Result<Handle<Type>, Failed> {
        self.expect(&Token::Less, context)?;
        let span = self.peek_span();
        let Some(ty) = self.type_decl()? else {
            return Err(self.add_error(span, format!("unable to determine subtype for {}", context)));
        };
        self.expect_template_close(context)?;
        Ok(ty)
    }

    /// `'<' type (',' INT)? '>'`
    fn array_type(&mut self) -> Result<Handle<Type>, Failed> {
        self.expect(&Token::Less, "array declaration")?;
        let span = self.peek_span();
        let Some(base) = self.type_decl()? else {
            return Err(self.add_error(span, "unable to determine subtype for array declaration"));
        };
        let mut size = None;
        if self.eat(&Token::Comma) {
            let span = self.peek_span();
            size = match self.peek() {
                Some(Token::Int(n)) if *n > 0 => Some(*n as u32),
                Some(Token::Uint(n)) if *n > 0 => Some(*n),
                _ => return Err(self.add_error(span, "invalid size for array declaration")),
            };
            self.pos += 1;
        }
        self.expect_template_close("array declaration")?;
        Ok(self.module.intern_type(Type::Array { base, size }))
    }

    /// `'<' address_space ',' type '>'`
    fn pointer_type(&mut self) -> Result<Handle<Type>, Failed> {
        self.expect(&Token::Less, "ptr declaration")?;
        let (space_name, space_span) = self.expect_ident("ptr address space")?;
        let space = AddressSpace::parse(&space_name);
        if space == AddressSpace::Invalid {
            return Err(self.add_error(
                space_span,
                format!("invalid address space '{}' for ptr declaration", space_name),
            ));
        }
        self.expect(&Token::Comma, "ptr declaration")?;
        let span = self.peek_span();
        let Some(base) = self.type_decl()? else {
            return Err(self.add_error(span, "unable to determine subtype for ptr declaration"));
        };
        self.expect_template_close("ptr declaration")?;
        Ok(self.module.intern_type(Type::Pointer { space, base }))
    }

    /// `('@' name ('(' arg ')')?)*`
    pub fn attributes(&mut self) -> Result<Vec<Decoration>, Failed> {
        let mut decorations = vec![];
        while self.eat(&Token::Attr) {
            let (name, span) = self.expect_ident("attribute")?;
            let kind = match name.as_str() {
                "location" => DecorationKind::Location(self.attribute_int(&name)?),
                "binding" => DecorationKind::Binding(self.attribute_int(&name)?),
                "group" => DecorationKind::Group(self.attribute_int(&name)?),
                "builtin" => {
                    let (value, value_span) = self.attribute_ident(&name)?;
                    match Builtin::parse(&value) {
                        Some(builtin) => DecorationKind::Builtin(builtin),
                        None => {
                            return Err(self.add_error(
                                value_span,
                                format!("invalid value for builtin attribute '{}'", value),
                            ));
                        }
                    }
                }
                "access" => {
                    let (value, value_span) = self.attribute_ident(&name)?;
                    match AccessControl::parse(&value) {
                        Some(access) => DecorationKind::Access(access),
                        None => {
                            return Err(self.add_error(
                                value_span,
                                format!("invalid value for access attribute '{}'", value),
                            ));
                        }
                    }
                }
                _ => return Err(self.add_error(span, format!("invalid attribute '{}'", name))),
            };
            decorations.push(Decoration::new(kind, span));
        }
        Ok(decorations)
    }

    fn attribute_int(&mut self, name: &str) -> Result<u32, Failed> {
        let context = format!("{} attribute", name);
        self.expect(&Token::LParen, &context)?;
        let span = self.peek_span();
        let value = match self.peek() {
            Some(Token::Int(n)) if *n >= 0 => *n as u32,
            Some(Token::Uint(n)) => *n,
            _ => {
                return Err(self.add_error(span, format!("expected non-negative integer for {}", context)));
            }
        };
        self.pos += 1;
        self.expect(&Token::RParen, &context)?;
        Ok(value)
    }

    fn attribute_ident(&mut self, name: &str) -> Result<(String, Span), Failed> {
        let context = format!("{} attribute", name);
        self.expect(&Token::LParen, &context)?;
        let value = self.expect_ident(&context)?;
        self.expect(&Token::RParen, &context)?;
        Ok(value)
    }
}
