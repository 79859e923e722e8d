//! Recursive descent parser for the accepted Java subset.
//!
//! The grammar is deliberately narrow: exactly the shapes the translator's
//! rewrite rules know how to lower. Anything outside it is a parse error,
//! never a recovery point.

use super::error::ParseError;
use super::lexer::{Lexer, LexicalToken, Token};
use crate::ast::*;
use crate::error::Result;

pub struct Parser {
    tokens: Vec<LexicalToken>,
    current: usize,
}

impl Parser {
    pub fn new(source: &str) -> Result<Self> {
        let tokens = Lexer::new(source)
            .tokenize()
            .map_err(|message| ParseError::LexicalError { message })?;
        Ok(Self { tokens, current: 0 })
    }

    pub fn parse(mut self) -> Result<CompilationUnit> {
        let start = self.current_location();

        let package = if self.check(&Token::Package) {
            Some(self.parse_package_decl()?)
        } else {
            None
        };

        let mut imports = Vec::new();
        while self.check(&Token::Import) {
            imports.push(self.parse_import_decl()?);
        }

        let mut types = Vec::new();
        while !self.is_at_end() {
            types.push(self.parse_type_decl()?);
        }

        let span = Span::new(start, self.previous_location());
        Ok(CompilationUnit { package, imports, types, span })
    }

    // Token cursor helpers

    fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len()
    }

    fn peek(&self) -> Option<&LexicalToken> {
        self.tokens.get(self.current)
    }

    fn peek_type(&self) -> Option<&Token> {
        self.peek().map(|t| t.token_type())
    }

    fn peek_type_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.current + offset).map(|t| t.token_type())
    }

    fn previous(&self) -> &LexicalToken {
        &self.tokens[self.current.saturating_sub(1).min(self.tokens.len() - 1)]
    }

    fn current_location(&self) -> Location {
        match self.peek() {
            Some(tok) => tok.location(),
            None => self
                .tokens
                .last()
                .map(|t| t.location())
                .unwrap_or_else(|| Location::new(1, 1, 0)),
        }
    }

    fn previous_location(&self) -> Location {
        if self.tokens.is_empty() {
            Location::new(1, 1, 0)
        } else {
            self.previous().location()
        }
    }

    fn advance(&mut self) -> &LexicalToken {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn check(&self, token_type: &Token) -> bool {
        self.peek_type() == Some(token_type)
    }

    fn match_token(&mut self, token_type: &Token) -> bool {
        if self.check(token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, token_type: &Token, expected: &str) -> Result<&LexicalToken> {
        if self.check(token_type) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn unexpected(&self, expected: &str) -> crate::error::Error {
        match self.peek() {
            Some(tok) => ParseError::unexpected_token(
                expected,
                &format!("{:?}", tok.token_type()),
                tok.location(),
            )
            .into(),
            None => ParseError::UnexpectedEndOfInput {
                expected: expected.to_string(),
                location: self.previous_location(),
            }
            .into(),
        }
    }

    // Declarations

    fn parse_package_decl(&mut self) -> Result<String> {
        self.consume(&Token::Package, "'package'")?;
        let name = self.parse_qualified_name()?;
        self.consume(&Token::Semicolon, "';' after package name")?;
        Ok(name)
    }

    fn parse_import_decl(&mut self) -> Result<ImportDecl> {
        let start = self.current_location();
        self.consume(&Token::Import, "'import'")?;
        let is_static = self.match_token(&Token::Static);

        let mut parts = vec![self.parse_identifier()?];
        let mut is_wildcard = false;
        while self.match_token(&Token::Dot) {
            if self.match_token(&Token::Star) {
                is_wildcard = true;
                break;
            }
            parts.push(self.parse_identifier()?);
        }
        self.consume(&Token::Semicolon, "';' after import")?;

        Ok(ImportDecl {
            name: parts.join("."),
            is_static,
            is_wildcard,
            span: Span::new(start, self.previous_location()),
        })
    }

    fn parse_type_decl(&mut self) -> Result<TypeDecl> {
        let annotations = self.parse_annotations()?;
        let modifiers = self.parse_modifiers();
        match self.peek_type() {
            Some(Token::Class) => Ok(TypeDecl::Class(
                self.parse_class_decl(modifiers, annotations)?,
            )),
            Some(Token::Interface) => Ok(TypeDecl::Interface(
                self.parse_interface_decl(modifiers, annotations)?,
            )),
            Some(Token::Enum) => Err(ParseError::invalid_syntax(
                "enum declarations are outside the accepted subset",
                self.current_location(),
            )
            .into()),
            _ => Err(self.unexpected("type declaration")),
        }
    }

    fn parse_class_decl(
        &mut self,
        modifiers: Vec<Modifier>,
        annotations: Vec<Annotation>,
    ) -> Result<ClassDecl> {
        let start = self.current_location();
        self.consume(&Token::Class, "'class'")?;
        let name = self.parse_identifier()?;
        self.skip_type_arguments();

        let extends = if self.match_token(&Token::Extends) {
            Some(self.parse_type_ref()?)
        } else {
            None
        };

        let mut implements = Vec::new();
        if self.match_token(&Token::Implements) {
            implements.push(self.parse_type_ref()?);
            while self.match_token(&Token::Comma) {
                implements.push(self.parse_type_ref()?);
            }
        }

        self.consume(&Token::LBrace, "'{' after class header")?;
        let mut members = Vec::new();
        while !self.check(&Token::RBrace) && !self.is_at_end() {
            if self.match_token(&Token::Semicolon) {
                continue;
            }
            members.extend(self.parse_class_member()?);
        }
        self.consume(&Token::RBrace, "'}' after class body")?;

        Ok(ClassDecl {
            modifiers,
            annotations,
            name,
            extends,
            implements,
            members,
            span: Span::new(start, self.previous_location()),
        })
    }

    fn parse_interface_decl(
        &mut self,
        modifiers: Vec<Modifier>,
        annotations: Vec<Annotation>,
    ) -> Result<InterfaceDecl> {
        let start = self.current_location();
        self.consume(&Token::Interface, "'interface'")?;
        let name = self.parse_identifier()?;
        self.skip_type_arguments();

        let mut extends = Vec::new();
        if self.match_token(&Token::Extends) {
            extends.push(self.parse_type_ref()?);
            while self.match_token(&Token::Comma) {
                extends.push(self.parse_type_ref()?);
            }
        }

        self.consume(&Token::LBrace, "'{' after interface header")?;
        let mut members = Vec::new();
        while !self.check(&Token::RBrace) && !self.is_at_end() {
            if self.match_token(&Token::Semicolon) {
                continue;
            }
            members.extend(self.parse_class_member()?);
        }
        self.consume(&Token::RBrace, "'}' after interface body")?;

        Ok(InterfaceDecl {
            modifiers,
            annotations,
            name,
            extends,
            members,
            span: Span::new(start, self.previous_location()),
        })
    }

    /// One member declaration. A field with several declarators expands to
    /// several `FieldDecl`s so downstream passes never see declarator lists.
    fn parse_class_member(&mut self) -> Result<Vec<ClassMember>> {
        let annotations = self.parse_annotations()?;
        let modifiers = self.parse_modifiers();
        // Annotations may also sit between modifiers and the type.
        let mut annotations = annotations;
        annotations.extend(self.parse_annotations()?);

        match self.peek_type() {
            Some(Token::Class) | Some(Token::Interface) | Some(Token::Enum) => {
                return Err(ParseError::invalid_syntax(
                    "nested type declarations are outside the accepted subset",
                    self.current_location(),
                )
                .into());
            }
            _ => {}
        }

        // Constructor: bare identifier directly followed by a parameter list.
        if matches!(self.peek_type(), Some(Token::Identifier))
            && self.peek_type_at(1) == Some(&Token::LParen)
        {
            let ctor = self.parse_constructor(modifiers)?;
            return Ok(vec![ClassMember::Constructor(ctor)]);
        }

        // Method returning void.
        if self.match_token(&Token::Void) {
            let method = self.parse_method_rest(modifiers, annotations, None)?;
            return Ok(vec![ClassMember::Method(method)]);
        }

        let type_ref = self.parse_type_ref()?;
        let name = self.parse_identifier()?;

        if self.check(&Token::LParen) {
            let method = self.parse_method_tail(modifiers, annotations, Some(type_ref), name)?;
            return Ok(vec![ClassMember::Method(method)]);
        }

        // Field declaration, possibly with several declarators.
        let mut fields = Vec::new();
        let mut current_name = name;
        loop {
            let start = self.current_location();
            let mut dims = type_ref.array_dims;
            while self.match_token(&Token::LBracket) {
                self.consume(&Token::RBracket, "']' after array dimension")?;
                dims += 1;
            }
            let initializer = if self.match_token(&Token::Assign) {
                Some(self.parse_variable_initializer()?)
            } else {
                None
            };
            fields.push(ClassMember::Field(FieldDecl {
                modifiers: modifiers.clone(),
                annotations: annotations.clone(),
                type_ref: TypeRef {
                    name: type_ref.name.clone(),
                    array_dims: dims,
                    span: type_ref.span,
                },
                name: current_name,
                initializer,
                span: Span::new(start, self.previous_location()),
            }));
            if self.match_token(&Token::Comma) {
                current_name = self.parse_identifier()?;
            } else {
                break;
            }
        }
        self.consume(&Token::Semicolon, "';' after field declaration")?;
        Ok(fields)
    }

    fn parse_constructor(&mut self, modifiers: Vec<Modifier>) -> Result<ConstructorDecl> {
        let start = self.current_location();
        let name = self.parse_identifier()?;
        let parameters = self.parse_parameter_list()?;
        self.reject_throws()?;
        let body = self.parse_block()?;
        Ok(ConstructorDecl {
            modifiers,
            name,
            parameters,
            body,
            span: Span::new(start, self.previous_location()),
        })
    }

    fn parse_method_rest(
        &mut self,
        modifiers: Vec<Modifier>,
        annotations: Vec<Annotation>,
        return_type: Option<TypeRef>,
    ) -> Result<MethodDecl> {
        let name = self.parse_identifier()?;
        self.parse_method_tail(modifiers, annotations, return_type, name)
    }

    fn parse_method_tail(
        &mut self,
        modifiers: Vec<Modifier>,
        annotations: Vec<Annotation>,
        return_type: Option<TypeRef>,
        name: String,
    ) -> Result<MethodDecl> {
        let start = self.current_location();
        let parameters = self.parse_parameter_list()?;
        self.reject_throws()?;
        let body = if self.match_token(&Token::Semicolon) {
            None
        } else {
            Some(self.parse_block()?)
        };
        Ok(MethodDecl {
            modifiers,
            annotations,
            return_type,
            name,
            parameters,
            body,
            span: Span::new(start, self.previous_location()),
        })
    }

    fn reject_throws(&mut self) -> Result<()> {
        if self.check(&Token::Throws) {
            // The diagnostic layer is dropped from the output wholesale, and
            // with it checked exceptions; a throws clause is tolerated and
            // ignored so corpus signatures parse unchanged.
            self.advance();
            self.parse_qualified_name()?;
            while self.match_token(&Token::Comma) {
                self.parse_qualified_name()?;
            }
        }
        Ok(())
    }

    fn parse_parameter_list(&mut self) -> Result<Vec<Parameter>> {
        self.consume(&Token::LParen, "'(' before parameter list")?;
        let mut parameters = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                let start = self.current_location();
                let mut annotations = self.parse_annotations()?;
                while self.match_token(&Token::Final) {
                    annotations.extend(self.parse_annotations()?);
                }
                let type_ref = self.parse_type_ref()?;
                let name = self.parse_identifier()?;
                let mut type_ref = type_ref;
                while self.match_token(&Token::LBracket) {
                    self.consume(&Token::RBracket, "']' after array dimension")?;
                    type_ref.array_dims += 1;
                }
                parameters.push(Parameter {
                    annotations,
                    type_ref,
                    name,
                    span: Span::new(start, self.previous_location()),
                });
                if !self.match_token(&Token::Comma) {
                    break;
                }
            }
        }
        self.consume(&Token::RParen, "')' after parameter list")?;
        Ok(parameters)
    }

    fn parse_modifiers(&mut self) -> Vec<Modifier> {
        let mut modifiers = Vec::new();
        loop {
            let modifier = match self.peek_type() {
                Some(Token::Public) => Modifier::Public,
                Some(Token::Protected) => Modifier::Protected,
                Some(Token::Private) => Modifier::Private,
                Some(Token::Abstract) => Modifier::Abstract,
                Some(Token::Static) => Modifier::Static,
                Some(Token::Final) => Modifier::Final,
                _ => break,
            };
            self.advance();
            modifiers.push(modifier);
        }
        modifiers
    }

    fn parse_annotations(&mut self) -> Result<Vec<Annotation>> {
        let mut annotations = Vec::new();
        while self.check(&Token::At) {
            let start = self.current_location();
            self.advance();
            let name = self.parse_identifier()?;
            // Arguments carry no information the translator uses.
            if self.match_token(&Token::LParen) {
                let mut depth = 1usize;
                while depth > 0 {
                    match self.peek_type() {
                        Some(Token::LParen) => depth += 1,
                        Some(Token::RParen) => depth -= 1,
                        None => return Err(self.unexpected("')' closing annotation arguments")),
                        _ => {}
                    }
                    self.advance();
                }
            }
            annotations.push(Annotation {
                name,
                span: Span::new(start, self.previous_location()),
            });
        }
        Ok(annotations)
    }

    fn parse_identifier(&mut self) -> Result<String> {
        if matches!(self.peek_type(), Some(Token::Identifier)) {
            Ok(self.advance().lexeme().to_string())
        } else {
            Err(self.unexpected("identifier"))
        }
    }

    fn parse_qualified_name(&mut self) -> Result<String> {
        let mut parts = vec![self.parse_identifier()?];
        while self.check(&Token::Dot)
            && self.peek_type_at(1) == Some(&Token::Identifier)
        {
            self.advance();
            parts.push(self.parse_identifier()?);
        }
        Ok(parts.join("."))
    }

    // Types

    fn parse_type_ref(&mut self) -> Result<TypeRef> {
        let start = self.current_location();
        let name = match self.peek_type() {
            Some(t) if t.is_primitive_type() => self.advance().lexeme().to_string(),
            Some(Token::Identifier) => self.parse_identifier()?,
            _ => return Err(self.unexpected("type")),
        };
        self.skip_type_arguments();
        let mut array_dims = 0;
        while self.check(&Token::LBracket) && self.peek_type_at(1) == Some(&Token::RBracket) {
            self.advance();
            self.advance();
            array_dims += 1;
        }
        Ok(TypeRef {
            name,
            array_dims,
            span: Span::new(start, self.previous_location()),
        })
    }

    /// Skip `<...>` type arguments. The corpus is erased down to raw names
    /// plus the homogeneous `T`, so arguments carry nothing.
    fn skip_type_arguments(&mut self) {
        if !self.check(&Token::Lt) {
            return;
        }
        // Only skip when this is provably a type-argument list, not a
        // comparison: scan for a matching '>' before anything that cannot
        // occur inside one.
        let mut depth = 0usize;
        let mut idx = self.current;
        loop {
            match self.tokens.get(idx).map(|t| t.token_type()) {
                Some(Token::Lt) => depth += 1,
                Some(Token::Gt) => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                Some(Token::Identifier) | Some(Token::Comma) | Some(Token::Dot)
                | Some(Token::Question) => {}
                _ => return,
            }
            idx += 1;
        }
        self.current = idx + 1;
    }

    // Statements

    fn parse_block(&mut self) -> Result<Block> {
        let start = self.current_location();
        self.consume(&Token::LBrace, "'{' opening block")?;
        let mut statements = Vec::new();
        while !self.check(&Token::RBrace) && !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }
        self.consume(&Token::RBrace, "'}' closing block")?;
        Ok(Block {
            statements,
            span: Span::new(start, self.previous_location()),
        })
    }

    fn parse_statement(&mut self) -> Result<Stmt> {
        match self.peek_type() {
            None => Err(self.unexpected("statement")),
            Some(Token::LBrace) => Ok(Stmt::Block(self.parse_block()?)),
            Some(Token::Semicolon) => {
                self.advance();
                Ok(Stmt::Empty)
            }
            Some(Token::If) => self.parse_if_stmt(),
            Some(Token::While) => self.parse_while_stmt(),
            Some(Token::Do) => self.parse_do_while_stmt(),
            Some(Token::For) => self.parse_for_stmt(),
            Some(Token::Switch) => self.parse_switch_stmt(),
            Some(Token::Return) => {
                let start = self.current_location();
                self.advance();
                let value = if self.check(&Token::Semicolon) {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                self.consume(&Token::Semicolon, "';' after return")?;
                Ok(Stmt::Return(ReturnStmt {
                    value,
                    span: Span::new(start, self.previous_location()),
                }))
            }
            Some(Token::Break) => {
                let start = self.current_location();
                self.advance();
                let label = if matches!(self.peek_type(), Some(Token::Identifier)) {
                    Some(self.parse_identifier()?)
                } else {
                    None
                };
                self.consume(&Token::Semicolon, "';' after break")?;
                Ok(Stmt::Break(BreakStmt {
                    label,
                    span: Span::new(start, self.previous_location()),
                }))
            }
            Some(Token::Continue) => {
                let start = self.current_location();
                self.advance();
                let label = if matches!(self.peek_type(), Some(Token::Identifier)) {
                    Some(self.parse_identifier()?)
                } else {
                    None
                };
                self.consume(&Token::Semicolon, "';' after continue")?;
                Ok(Stmt::Continue(ContinueStmt {
                    label,
                    span: Span::new(start, self.previous_location()),
                }))
            }
            Some(Token::Try) | Some(Token::Throw) | Some(Token::Synchronized)
            | Some(Token::Assert) => Err(ParseError::invalid_syntax(
                format!(
                    "'{}' statements are outside the accepted subset",
                    self.peek().map(|t| t.lexeme()).unwrap_or_default()
                ),
                self.current_location(),
            )
            .into()),
            // Labeled statement: identifier directly followed by a colon.
            Some(Token::Identifier)
                if self.peek_type_at(1) == Some(&Token::Colon) =>
            {
                let start = self.current_location();
                let label = self.parse_identifier()?;
                self.advance(); // ':'
                let statement = Box::new(self.parse_statement()?);
                Ok(Stmt::Labeled(LabeledStmt {
                    label,
                    statement,
                    span: Span::new(start, self.previous_location()),
                }))
            }
            Some(Token::At) => self.parse_local_var_decl(),
            _ if self.is_local_decl_start() => self.parse_local_var_decl(),
            _ => {
                let start = self.current_location();
                let expr = self.parse_expression()?;
                self.consume(&Token::Semicolon, "';' after expression")?;
                Ok(Stmt::Expression(ExprStmt {
                    expr,
                    span: Span::new(start, self.previous_location()),
                }))
            }
        }
    }

    /// Lookahead for a local variable declaration: an optional `final`, then
    /// a type, then an identifier.
    fn is_local_decl_start(&self) -> bool {
        let mut idx = self.current;
        if self.peek_type_at(idx - self.current) == Some(&Token::Final) {
            idx += 1;
        }
        match self.tokens.get(idx).map(|t| t.token_type()) {
            Some(t) if t.is_primitive_type() => {}
            Some(Token::Identifier) => {}
            _ => return false,
        }
        idx += 1;
        // Array brackets on the type.
        while self.tokens.get(idx).map(|t| t.token_type()) == Some(&Token::LBracket)
            && self.tokens.get(idx + 1).map(|t| t.token_type()) == Some(&Token::RBracket)
        {
            idx += 2;
        }
        self.tokens.get(idx).map(|t| t.token_type()) == Some(&Token::Identifier)
    }

    fn parse_local_var_decl(&mut self) -> Result<Stmt> {
        let start = self.current_location();
        let mut annotations = self.parse_annotations()?;
        let mut modifiers = Vec::new();
        if self.match_token(&Token::Final) {
            modifiers.push(Modifier::Final);
        }
        annotations.extend(self.parse_annotations()?);
        let type_ref = self.parse_type_ref()?;

        let mut declarators = Vec::new();
        loop {
            let decl_start = self.current_location();
            let name = self.parse_identifier()?;
            let mut array_dims = 0;
            while self.match_token(&Token::LBracket) {
                self.consume(&Token::RBracket, "']' after array dimension")?;
                array_dims += 1;
            }
            let initializer = if self.match_token(&Token::Assign) {
                Some(self.parse_variable_initializer()?)
            } else {
                None
            };
            declarators.push(VarDeclarator {
                name,
                array_dims,
                initializer,
                span: Span::new(decl_start, self.previous_location()),
            });
            if !self.match_token(&Token::Comma) {
                break;
            }
        }
        self.consume(&Token::Semicolon, "';' after variable declaration")?;
        Ok(Stmt::Declaration(VarDeclStmt {
            modifiers,
            annotations,
            type_ref,
            declarators,
            span: Span::new(start, self.previous_location()),
        }))
    }

    fn parse_if_stmt(&mut self) -> Result<Stmt> {
        let start = self.current_location();
        self.consume(&Token::If, "'if'")?;
        self.consume(&Token::LParen, "'(' after if")?;
        let condition = self.parse_expression()?;
        self.consume(&Token::RParen, "')' after if condition")?;
        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.match_token(&Token::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Stmt::If(IfStmt {
            condition,
            then_branch,
            else_branch,
            span: Span::new(start, self.previous_location()),
        }))
    }

    fn parse_while_stmt(&mut self) -> Result<Stmt> {
        let start = self.current_location();
        self.consume(&Token::While, "'while'")?;
        self.consume(&Token::LParen, "'(' after while")?;
        let condition = self.parse_expression()?;
        self.consume(&Token::RParen, "')' after while condition")?;
        let body = Box::new(self.parse_statement()?);
        Ok(Stmt::While(WhileStmt {
            condition,
            body,
            span: Span::new(start, self.previous_location()),
        }))
    }

    fn parse_do_while_stmt(&mut self) -> Result<Stmt> {
        let start = self.current_location();
        self.consume(&Token::Do, "'do'")?;
        let body = Box::new(self.parse_statement()?);
        self.consume(&Token::While, "'while' after do body")?;
        self.consume(&Token::LParen, "'(' after while")?;
        let condition = self.parse_expression()?;
        self.consume(&Token::RParen, "')' after do-while condition")?;
        self.consume(&Token::Semicolon, "';' after do-while")?;
        Ok(Stmt::DoWhile(DoWhileStmt {
            body,
            condition,
            span: Span::new(start, self.previous_location()),
        }))
    }

    fn parse_for_stmt(&mut self) -> Result<Stmt> {
        let start = self.current_location();
        self.consume(&Token::For, "'for'")?;
        self.consume(&Token::LParen, "'(' after for")?;

        let init = if self.match_token(&Token::Semicolon) {
            Vec::new()
        } else if self.is_local_decl_start() {
            vec![self.parse_local_var_decl()?]
        } else {
            let mut stmts = Vec::new();
            loop {
                let expr_start = self.current_location();
                let expr = self.parse_expression()?;
                stmts.push(Stmt::Expression(ExprStmt {
                    expr,
                    span: Span::new(expr_start, self.previous_location()),
                }));
                if !self.match_token(&Token::Comma) {
                    break;
                }
            }
            self.consume(&Token::Semicolon, "';' after for initializer")?;
            stmts
        };

        let condition = if self.check(&Token::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume(&Token::Semicolon, "';' after for condition")?;

        let mut update = Vec::new();
        if !self.check(&Token::RParen) {
            update.push(self.parse_expression()?);
            while self.match_token(&Token::Comma) {
                update.push(self.parse_expression()?);
            }
        }
        self.consume(&Token::RParen, "')' after for clauses")?;

        let body = Box::new(self.parse_statement()?);
        Ok(Stmt::For(ForStmt {
            init,
            condition,
            update,
            body,
            span: Span::new(start, self.previous_location()),
        }))
    }

    fn parse_switch_stmt(&mut self) -> Result<Stmt> {
        let start = self.current_location();
        self.consume(&Token::Switch, "'switch'")?;
        self.consume(&Token::LParen, "'(' after switch")?;
        let expression = self.parse_expression()?;
        self.consume(&Token::RParen, "')' after switch expression")?;
        self.consume(&Token::LBrace, "'{' opening switch body")?;

        let mut cases = Vec::new();
        while !self.check(&Token::RBrace) && !self.is_at_end() {
            let case_start = self.current_location();
            let mut labels = Vec::new();
            let mut is_default = false;
            // Consecutive case/default labels share one group.
            loop {
                if self.match_token(&Token::Case) {
                    labels.push(self.parse_expression()?);
                    self.consume(&Token::Colon, "':' after case label")?;
                } else if self.match_token(&Token::Default) {
                    is_default = true;
                    self.consume(&Token::Colon, "':' after default")?;
                } else {
                    break;
                }
            }
            if labels.is_empty() && !is_default {
                return Err(self.unexpected("'case' or 'default'"));
            }
            let mut statements = Vec::new();
            while !self.check(&Token::Case)
                && !self.check(&Token::Default)
                && !self.check(&Token::RBrace)
                && !self.is_at_end()
            {
                statements.push(self.parse_statement()?);
            }
            cases.push(SwitchCase {
                labels,
                statements,
                span: Span::new(case_start, self.previous_location()),
            });
        }
        self.consume(&Token::RBrace, "'}' closing switch body")?;
        Ok(Stmt::Switch(SwitchStmt {
            expression,
            cases,
            span: Span::new(start, self.previous_location()),
        }))
    }

    // Expressions, precedence-climbing from assignment down to primary.

    pub fn parse_expression(&mut self) -> Result<Expr> {
        self.parse_assignment_expr()
    }

    fn parse_assignment_expr(&mut self) -> Result<Expr> {
        let start = self.current_location();
        let left = self.parse_conditional_expr()?;
        let operator = match self.peek_type() {
            Some(Token::Assign) => AssignmentOp::Assign,
            Some(Token::AddAssign) => AssignmentOp::AddAssign,
            Some(Token::SubAssign) => AssignmentOp::SubAssign,
            Some(Token::MulAssign) => AssignmentOp::MulAssign,
            Some(Token::DivAssign) => AssignmentOp::DivAssign,
            Some(Token::ModAssign) => AssignmentOp::ModAssign,
            Some(Token::AndAssign) => AssignmentOp::AndAssign,
            Some(Token::OrAssign) => AssignmentOp::OrAssign,
            Some(Token::XorAssign) => AssignmentOp::XorAssign,
            Some(Token::LShiftAssign) => AssignmentOp::LShiftAssign,
            Some(Token::RShiftAssign) => AssignmentOp::RShiftAssign,
            _ => return Ok(left),
        };
        self.advance();
        let value = self.parse_assignment_expr()?;
        Ok(Expr::Assignment(AssignmentExpr {
            target: Box::new(left),
            operator,
            value: Box::new(value),
            span: Span::new(start, self.previous_location()),
        }))
    }

    fn parse_conditional_expr(&mut self) -> Result<Expr> {
        let start = self.current_location();
        let condition = self.parse_binary_expr(0)?;
        if self.match_token(&Token::Question) {
            let then_expr = self.parse_expression()?;
            self.consume(&Token::Colon, "':' in conditional expression")?;
            let else_expr = self.parse_conditional_expr()?;
            Ok(Expr::Conditional(ConditionalExpr {
                condition: Box::new(condition),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
                span: Span::new(start, self.previous_location()),
            }))
        } else {
            Ok(condition)
        }
    }

    fn binary_op(&self) -> Option<(BinaryOp, u8)> {
        // Java precedence, highest binds tightest.
        match self.peek_type()? {
            Token::PipePipe => Some((BinaryOp::OrOr, 1)),
            Token::AndAnd => Some((BinaryOp::AndAnd, 2)),
            Token::Pipe => Some((BinaryOp::BitOr, 3)),
            Token::Caret => Some((BinaryOp::BitXor, 4)),
            Token::Amp => Some((BinaryOp::BitAnd, 5)),
            Token::Eq => Some((BinaryOp::Eq, 6)),
            Token::Ne => Some((BinaryOp::Ne, 6)),
            Token::Lt => Some((BinaryOp::Lt, 7)),
            Token::Le => Some((BinaryOp::Le, 7)),
            Token::Gt => Some((BinaryOp::Gt, 7)),
            Token::Ge => Some((BinaryOp::Ge, 7)),
            Token::LShift => Some((BinaryOp::LShift, 8)),
            Token::RShift => Some((BinaryOp::RShift, 8)),
            Token::URShift => Some((BinaryOp::URShift, 8)),
            Token::Plus => Some((BinaryOp::Add, 9)),
            Token::Minus => Some((BinaryOp::Sub, 9)),
            Token::Star => Some((BinaryOp::Mul, 10)),
            Token::Slash => Some((BinaryOp::Div, 10)),
            Token::Percent => Some((BinaryOp::Mod, 10)),
            _ => None,
        }
    }

    fn parse_binary_expr(&mut self, min_prec: u8) -> Result<Expr> {
        let start = self.current_location();
        let mut left = self.parse_unary_expr()?;
        loop {
            if matches!(self.peek_type(), Some(Token::InstanceOf)) {
                return Err(ParseError::invalid_syntax(
                    "'instanceof' is outside the accepted subset",
                    self.current_location(),
                )
                .into());
            }
            let (operator, prec) = match self.binary_op() {
                Some(pair) if pair.1 > min_prec => pair,
                _ => break,
            };
            self.advance();
            let right = self.parse_binary_expr(prec)?;
            left = Expr::Binary(BinaryExpr {
                left: Box::new(left),
                operator,
                right: Box::new(right),
                span: Span::new(start, self.previous_location()),
            });
        }
        Ok(left)
    }

    fn parse_unary_expr(&mut self) -> Result<Expr> {
        let start = self.current_location();
        let operator = match self.peek_type() {
            Some(Token::Plus) => Some(UnaryOp::Plus),
            Some(Token::Minus) => Some(UnaryOp::Minus),
            Some(Token::Bang) => Some(UnaryOp::Not),
            Some(Token::Tilde) => Some(UnaryOp::BitNot),
            Some(Token::Inc) => Some(UnaryOp::PreInc),
            Some(Token::Dec) => Some(UnaryOp::PreDec),
            _ => None,
        };
        if let Some(operator) = operator {
            self.advance();
            let operand = self.parse_unary_expr()?;
            return Ok(Expr::Unary(UnaryExpr {
                operator,
                operand: Box::new(operand),
                span: Span::new(start, self.previous_location()),
            }));
        }
        if self.is_cast_start() {
            self.consume(&Token::LParen, "'(' opening cast")?;
            let target_type = self.parse_type_ref()?;
            self.consume(&Token::RParen, "')' closing cast")?;
            let expr = self.parse_unary_expr()?;
            return Ok(Expr::Cast(CastExpr {
                target_type,
                expr: Box::new(expr),
                span: Span::new(start, self.previous_location()),
            }));
        }
        self.parse_postfix_expr()
    }

    /// A '(' starts a cast when it wraps a primitive type, or wraps a bare
    /// identifier (with optional array brackets) and the token after the
    /// closing ')' can begin an operand.
    fn is_cast_start(&self) -> bool {
        if !self.check(&Token::LParen) {
            return false;
        }
        let mut idx = self.current + 1;
        let primitive = match self.tokens.get(idx).map(|t| t.token_type()) {
            Some(t) if t.is_primitive_type() => true,
            Some(Token::Identifier) => false,
            _ => return false,
        };
        idx += 1;
        while self.tokens.get(idx).map(|t| t.token_type()) == Some(&Token::LBracket)
            && self.tokens.get(idx + 1).map(|t| t.token_type()) == Some(&Token::RBracket)
        {
            idx += 2;
        }
        if self.tokens.get(idx).map(|t| t.token_type()) != Some(&Token::RParen) {
            return false;
        }
        if primitive {
            return true;
        }
        matches!(
            self.tokens.get(idx + 1).map(|t| t.token_type()),
            Some(Token::Identifier)
                | Some(Token::This)
                | Some(Token::LParen)
                | Some(Token::StringLiteral)
                | Some(Token::CharLiteral)
                | Some(Token::DecimalInteger)
                | Some(Token::HexInteger)
                | Some(Token::Bang)
                | Some(Token::Tilde)
                | Some(Token::New)
        )
    }

    fn parse_postfix_expr(&mut self) -> Result<Expr> {
        let start = self.current_location();
        let mut expr = self.parse_primary_expr()?;
        loop {
            match self.peek_type() {
                Some(Token::Dot) => {
                    self.advance();
                    let name = self.parse_identifier()?;
                    if self.check(&Token::LParen) {
                        let arguments = self.parse_argument_list()?;
                        expr = Expr::MethodCall(MethodCallExpr {
                            target: Some(Box::new(expr)),
                            name,
                            arguments,
                            span: Span::new(start, self.previous_location()),
                        });
                    } else {
                        expr = Expr::FieldAccess(FieldAccessExpr {
                            target: Some(Box::new(expr)),
                            name,
                            span: Span::new(start, self.previous_location()),
                        });
                    }
                }
                Some(Token::LBracket) => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.consume(&Token::RBracket, "']' after array index")?;
                    expr = Expr::ArrayAccess(ArrayAccessExpr {
                        array: Box::new(expr),
                        index: Box::new(index),
                        span: Span::new(start, self.previous_location()),
                    });
                }
                Some(Token::Inc) => {
                    self.advance();
                    expr = Expr::Unary(UnaryExpr {
                        operator: UnaryOp::PostInc,
                        operand: Box::new(expr),
                        span: Span::new(start, self.previous_location()),
                    });
                }
                Some(Token::Dec) => {
                    self.advance();
                    expr = Expr::Unary(UnaryExpr {
                        operator: UnaryOp::PostDec,
                        operand: Box::new(expr),
                        span: Span::new(start, self.previous_location()),
                    });
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary_expr(&mut self) -> Result<Expr> {
        let start = self.current_location();
        match self.peek_type() {
            Some(Token::DecimalInteger) => {
                let lexeme = self.advance().lexeme().replace('_', "");
                let value = lexeme.parse::<i64>().map_err(|_| {
                    crate::error::Error::from(ParseError::invalid_syntax(
                        format!("integer literal out of range: {}", lexeme),
                        start,
                    ))
                })?;
                Ok(Expr::Literal(LiteralExpr {
                    value: Literal::Int(value),
                    span: Span::new(start, self.previous_location()),
                }))
            }
            Some(Token::HexInteger) => {
                let lexeme = self.advance().lexeme().to_string();
                Ok(Expr::Literal(LiteralExpr {
                    value: Literal::HexInt(lexeme),
                    span: Span::new(start, self.previous_location()),
                }))
            }
            Some(Token::StringLiteral) => {
                let lexeme = self.advance().lexeme().to_string();
                let value = unescape_string(&lexeme[1..lexeme.len() - 1])
                    .map_err(|m| crate::error::Error::from(ParseError::invalid_syntax(m, start)))?;
                Ok(Expr::Literal(LiteralExpr {
                    value: Literal::String(value),
                    span: Span::new(start, self.previous_location()),
                }))
            }
            Some(Token::CharLiteral) => {
                let lexeme = self.advance().lexeme().to_string();
                let value = unescape_char(&lexeme[1..lexeme.len() - 1])
                    .map_err(|m| crate::error::Error::from(ParseError::invalid_syntax(m, start)))?;
                Ok(Expr::Literal(LiteralExpr {
                    value: Literal::Char(value),
                    span: Span::new(start, self.previous_location()),
                }))
            }
            Some(Token::True) => {
                self.advance();
                Ok(Expr::Literal(LiteralExpr {
                    value: Literal::Boolean(true),
                    span: Span::new(start, self.previous_location()),
                }))
            }
            Some(Token::False) => {
                self.advance();
                Ok(Expr::Literal(LiteralExpr {
                    value: Literal::Boolean(false),
                    span: Span::new(start, self.previous_location()),
                }))
            }
            Some(Token::Null) => {
                self.advance();
                Ok(Expr::Literal(LiteralExpr {
                    value: Literal::Null,
                    span: Span::new(start, self.previous_location()),
                }))
            }
            Some(Token::This) => {
                self.advance();
                let span = Span::new(start, self.previous_location());
                if self.check(&Token::LParen) {
                    return Err(ParseError::invalid_syntax(
                        "explicit constructor invocation is outside the accepted subset",
                        start,
                    )
                    .into());
                }
                Ok(Expr::This(span))
            }
            Some(Token::Super) => Err(ParseError::invalid_syntax(
                "'super' is outside the accepted subset",
                start,
            )
            .into()),
            Some(Token::New) => self.parse_new_expr(),
            Some(Token::LParen) => {
                self.advance();
                let inner = self.parse_expression()?;
                self.consume(&Token::RParen, "')' closing parenthesized expression")?;
                Ok(Expr::Parenthesized(Box::new(inner)))
            }
            Some(Token::Identifier) => {
                let name = self.parse_identifier()?;
                if self.check(&Token::LParen) {
                    let arguments = self.parse_argument_list()?;
                    Ok(Expr::MethodCall(MethodCallExpr {
                        target: None,
                        name,
                        arguments,
                        span: Span::new(start, self.previous_location()),
                    }))
                } else {
                    Ok(Expr::Identifier(IdentifierExpr {
                        name,
                        span: Span::new(start, self.previous_location()),
                    }))
                }
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_new_expr(&mut self) -> Result<Expr> {
        let start = self.current_location();
        self.consume(&Token::New, "'new'")?;
        let base = match self.peek_type() {
            Some(t) if t.is_primitive_type() => self.advance().lexeme().to_string(),
            Some(Token::Identifier) => self.parse_identifier()?,
            _ => return Err(self.unexpected("type after 'new'")),
        };
        self.skip_type_arguments();
        let base_span = Span::new(start, self.previous_location());

        if self.check(&Token::LBracket) {
            let mut dims = Vec::new();
            let mut extra_dims = 0;
            while self.match_token(&Token::LBracket) {
                if self.match_token(&Token::RBracket) {
                    extra_dims += 1;
                    continue;
                }
                if extra_dims > 0 {
                    return Err(ParseError::invalid_syntax(
                        "sized dimension after empty dimension in array creation",
                        self.current_location(),
                    )
                    .into());
                }
                dims.push(self.parse_expression()?);
                self.consume(&Token::RBracket, "']' after array dimension")?;
            }
            let initializer = if self.check(&Token::LBrace) {
                Some(self.parse_array_initializer()?)
            } else {
                None
            };
            return Ok(Expr::NewArray(NewArrayExpr {
                elem_type: TypeRef {
                    name: base,
                    array_dims: 0,
                    span: base_span,
                },
                dims,
                extra_dims,
                initializer,
                span: Span::new(start, self.previous_location()),
            }));
        }

        let arguments = self.parse_argument_list()?;
        if self.check(&Token::LBrace) {
            return Err(ParseError::invalid_syntax(
                "anonymous class bodies are outside the accepted subset",
                self.current_location(),
            )
            .into());
        }
        Ok(Expr::New(NewExpr {
            target_type: TypeRef {
                name: base,
                array_dims: 0,
                span: base_span,
            },
            arguments,
            span: Span::new(start, self.previous_location()),
        }))
    }

    fn parse_argument_list(&mut self) -> Result<Vec<Expr>> {
        self.consume(&Token::LParen, "'(' before arguments")?;
        let mut arguments = Vec::new();
        if !self.check(&Token::RParen) {
            arguments.push(self.parse_expression()?);
            while self.match_token(&Token::Comma) {
                arguments.push(self.parse_expression()?);
            }
        }
        self.consume(&Token::RParen, "')' after arguments")?;
        Ok(arguments)
    }

    /// `= { ... }` or a plain expression.
    fn parse_variable_initializer(&mut self) -> Result<Expr> {
        if self.check(&Token::LBrace) {
            Ok(Expr::ArrayInitializer(self.parse_array_initializer()?))
        } else {
            self.parse_expression()
        }
    }

    fn parse_array_initializer(&mut self) -> Result<Vec<Expr>> {
        self.consume(&Token::LBrace, "'{' opening array initializer")?;
        let mut values = Vec::new();
        while !self.check(&Token::RBrace) {
            values.push(self.parse_variable_initializer()?);
            if !self.match_token(&Token::Comma) {
                break;
            }
        }
        self.consume(&Token::RBrace, "'}' closing array initializer")?;
        Ok(values)
    }
}

fn unescape_string(raw: &str) -> std::result::Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        out.push(unescape_one(&mut chars)?);
    }
    Ok(out)
}

fn unescape_char(raw: &str) -> std::result::Result<char, String> {
    let mut chars = raw.chars();
    let first = chars.next().ok_or_else(|| "empty character literal".to_string())?;
    let value = if first == '\\' {
        unescape_one(&mut chars)?
    } else {
        first
    };
    if chars.next().is_some() {
        return Err(format!("invalid character literal: '{}'", raw));
    }
    Ok(value)
}

fn unescape_one(chars: &mut std::str::Chars<'_>) -> std::result::Result<char, String> {
    match chars.next() {
        Some('n') => Ok('\n'),
        Some('t') => Ok('\t'),
        Some('r') => Ok('\r'),
        Some('b') => Ok('\u{0008}'),
        Some('f') => Ok('\u{000C}'),
        Some('0') => Ok('\0'),
        Some('\\') => Ok('\\'),
        Some('\'') => Ok('\''),
        Some('"') => Ok('"'),
        Some('u') => {
            let hex: String = chars.take(4).collect();
            if hex.len() != 4 {
                return Err("truncated unicode escape".to_string());
            }
            let code = u32::from_str_radix(&hex, 16)
                .map_err(|_| format!("invalid unicode escape: \\u{}", hex))?;
            char::from_u32(code).ok_or_else(|| format!("invalid code point: \\u{}", hex))
        }
        Some(other) => Err(format!("unknown escape: \\{}", other)),
        None => Err("dangling escape".to_string()),
    }
}
