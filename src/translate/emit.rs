//! The two-mode AST visitor/emitter: walks a compilation unit and prints
//! C++ declaration or definition text.
//!
//! Both modes share one rule set. Declaration mode groups members under
//! access-level headers and defers method bodies; definition mode fully
//! qualifies every member with the class name, expands constructors into
//! member-initializer lists, and lowers static fields into the per-class
//! `initializeStatics`/`releaseStatics` procedures.
//!
//! Anything outside the anticipated grammar subset is a fatal
//! `Unsupported` error: silently mis-translating is worse than stopping.

use crate::ast::*;
use crate::error::{Error, Result};

use super::labels::LabelInfo;
use super::locals::LocalSymbolTable;
use super::policy::TargetPolicy;
use super::symtab::{AtomTable, DefineRegistry, SymbolTable};
use super::types::{map_type, CppType, Storage};

/// Which of the two output files is being produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Declaration,
    Definition,
}

/// Method-name prefixes of the diagnostic layer, dropped from the output.
const DIAGNOSTIC_PREFIXES: &[&str] = &["fatal", "err", "warn", "maybeErr", "maybeWarn"];

/// Classes whose fields are accessed in pseudo-static style.
const PSEUDO_STATIC_CLASSES: &[&str] = &[
    "AttributeName",
    "ElementName",
    "HtmlAttributes",
    "MetaScanner",
    "NamedCharacters",
    "Portability",
    "StackNode",
    "StateSnapshot",
    "Tokenizer",
    "TreeBuilder",
    "UTF16Buffer",
];

/// Interned lookup tables of the two prefixed classes; real statics, not
/// named constants, so they never take the ATTR_/ELT_ prefix.
const META_FIELDS: &[&str] = &[
    "ATTRIBUTE_NAMES",
    "ATTRIBUTE_HASHES",
    "ELEMENT_NAMES",
    "ELEMENT_HASHES",
];

/// Immutable per-dispatch context, passed down through every call instead of
/// living as mutable flags on the emitter.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cx<'a> {
    /// Emitting the expression of a constructor-initializer-list entry.
    pub in_ctor_init: bool,
    /// The enclosing declaration is a raw (`@NoLength`) array.
    pub no_length: bool,
    /// Simple name of the method being emitted, if any.
    pub method: Option<&'a str>,
}

impl<'a> Cx<'a> {
    fn in_method(method: &'a str) -> Self {
        Cx {
            method: Some(method),
            ..Cx::default()
        }
    }
}

pub struct CppEmitter<'t> {
    policy: &'t dyn TargetPolicy,
    symtab: &'t mut SymbolTable,
    defines: &'t mut DefineRegistry,
    atoms: &'t mut AtomTable,
    labels: &'t LabelInfo,
    mode: Mode,
    class_name: String,
    out: String,
    indent: usize,
    current_access: Option<&'static str>,
    file_scope: Vec<String>,
    statics_init: Vec<String>,
    statics_release: Vec<String>,
}

impl<'t> CppEmitter<'t> {
    pub fn new(
        policy: &'t dyn TargetPolicy,
        symtab: &'t mut SymbolTable,
        defines: &'t mut DefineRegistry,
        atoms: &'t mut AtomTable,
        labels: &'t LabelInfo,
        mode: Mode,
    ) -> Self {
        Self {
            policy,
            symtab,
            defines,
            atoms,
            labels,
            mode,
            class_name: String::new(),
            out: String::new(),
            indent: 0,
            current_access: None,
            file_scope: Vec::new(),
            statics_init: Vec::new(),
            statics_release: Vec::new(),
        }
    }

    pub fn emit_unit(mut self, unit: &CompilationUnit) -> Result<String> {
        let class = unit.primary_class().ok_or_else(|| {
            Error::internal("compilation unit declares no class")
        })?;
        self.class_name = class.name.clone();
        match self.mode {
            Mode::Declaration => self.emit_header(class)?,
            Mode::Definition => self.emit_body(class)?,
        }
        Ok(self.out)
    }

    // Low-level text helpers

    fn prefixed(&self, name: &str) -> String {
        format!("{}{}", self.policy.class_prefix(), name)
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push(' ');
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn push_indent(&mut self) {
        self.indent += 2;
    }

    fn pop_indent(&mut self) {
        self.indent = self.indent.saturating_sub(2);
    }

    // Declaration mode

    fn emit_header(&mut self, class: &ClassDecl) -> Result<()> {
        let guard = format!("{}_h__", self.prefixed(&class.name));
        self.line(&format!("#ifndef {}", guard));
        self.line(&format!("#define {}", guard));
        self.blank();
        for include in self.policy.header_includes(&class.name) {
            self.line(&format!("#include \"{}\"", include));
        }
        self.blank();

        // Constants become translation-unit-scope defines ahead of the class
        // so every later reference in the unit, inline bodies included,
        // resolves through the registry.
        let mut wrote_define = false;
        for member in &class.members {
            if let ClassMember::Field(field) = member {
                if self.is_define_constant(field) {
                    let macro_name =
                        self.defines
                            .register(self.policy, &class.name, &field.name);
                    let init = field
                        .initializer
                        .as_ref()
                        .ok_or_else(|| Error::internal("constant without initializer"))?;
                    let mut locals = LocalSymbolTable::new();
                    let value = self.expr(init, Cx::default(), &mut locals)?;
                    self.line(&format!("#define {} {}", macro_name, value));
                    wrote_define = true;
                }
            }
        }
        if wrote_define {
            self.blank();
        }

        self.line(&format!("class {}", self.prefixed(&class.name)));
        self.line("{");

        for member in &class.members {
            match member {
                ClassMember::Field(field) => self.declare_field(field)?,
                ClassMember::Constructor(ctor) => self.declare_constructor(ctor)?,
                ClassMember::Method(method) => self.declare_method(method)?,
            }
        }

        self.set_access("public");
        self.push_indent();
        self.push_indent();
        self.line("static void initializeStatics();");
        self.line("static void releaseStatics();");
        self.pop_indent();
        self.pop_indent();

        if self.policy.needs_supplement(&class.name) {
            self.push_indent();
            self.push_indent();
            let supplement = format!("{}HSupplement.h", self.prefixed(&class.name));
            self.line(&format!("#include \"{}\"", supplement));
            self.pop_indent();
            self.pop_indent();
        }

        self.line("};");
        self.blank();
        self.line("#endif");
        Ok(())
    }

    fn set_access(&mut self, access: &'static str) {
        if self.current_access != Some(access) {
            self.push_indent();
            self.line(&format!("{}:", access));
            self.pop_indent();
            self.current_access = Some(access);
        }
    }

    fn access_of(modifiers: &[Modifier]) -> &'static str {
        if modifiers.contains(&Modifier::Private) {
            "private"
        } else if modifiers.contains(&Modifier::Protected) {
            "protected"
        } else {
            // Package access opens up: sibling classes of the corpus reach
            // these members across translation units.
            "public"
        }
    }

    fn is_define_constant(&self, field: &FieldDecl) -> bool {
        field.is_static()
            && field.is_final()
            && field.type_ref.name == "int"
            && field.type_ref.array_dims == 0
            && field.initializer.is_some()
    }

    fn declare_field(&mut self, field: &FieldDecl) -> Result<()> {
        let ty = map_type(&field.type_ref, &field.annotations, false, self.policy)?;
        self.symtab
            .put_field_type(&self.class_name, &field.name, ty.clone());
        if self.is_define_constant(field) {
            // Already emitted as a define ahead of the class.
            return Ok(());
        }
        self.set_access(Self::access_of(&field.modifiers));
        self.push_indent();
        self.push_indent();
        let stat = if field.is_static() { "static " } else { "" };
        let rendered = ty.render(self.policy);
        self.line(&format!("{}{} {};", stat, rendered, field.name));
        self.pop_indent();
        self.pop_indent();
        Ok(())
    }

    fn declare_constructor(&mut self, ctor: &ConstructorDecl) -> Result<()> {
        self.set_access(Self::access_of(&ctor.modifiers));
        let params = self.parameter_list(&ctor.parameters, &mut LocalSymbolTable::new())?;
        self.push_indent();
        self.push_indent();
        let name = self.prefixed(&ctor.name);
        self.line(&format!("{}({});", name, params));
        self.pop_indent();
        self.pop_indent();
        Ok(())
    }

    fn declare_method(&mut self, method: &MethodDecl) -> Result<()> {
        let return_type = self.method_return_type(method)?;
        if method.name == "destructor" {
            // Destructors are public no matter what the source declared.
            self.set_access("public");
            self.push_indent();
            self.push_indent();
            let name = self.prefixed(&self.class_name.clone());
            self.line(&format!("~{}();", name));
            self.pop_indent();
            self.pop_indent();
            return Ok(());
        }
        self.set_access(Self::access_of(&method.modifiers));
        let mut locals = LocalSymbolTable::new();
        let params = self.parameter_list(&method.parameters, &mut locals)?;
        let stat = if method.is_static() { "static " } else { "" };
        let ret = match &return_type {
            Some(ty) => ty.render(self.policy),
            None => "void".to_string(),
        };
        self.push_indent();
        self.push_indent();
        if method.has_annotation("Inline") {
            if let Some(body) = &method.body {
                self.line(&format!(
                    "inline {}{} {}({})",
                    stat, ret, method.name, params
                ));
                self.line("{");
                self.push_indent();
                let cx = Cx::in_method(&method.name);
                for stmt in &body.statements {
                    self.emit_stmt(stmt, cx, &mut locals)?;
                }
                self.pop_indent();
                self.line("}");
                self.blank();
                self.pop_indent();
                self.pop_indent();
                return Ok(());
            }
        }
        self.line(&format!("{}{} {}({});", stat, ret, method.name, params));
        self.pop_indent();
        self.pop_indent();
        Ok(())
    }

    fn method_return_type(&mut self, method: &MethodDecl) -> Result<Option<CppType>> {
        let ty = match &method.return_type {
            Some(type_ref) => Some(map_type(type_ref, &method.annotations, false, self.policy)?),
            None => None,
        };
        if let Some(ty) = &ty {
            self.symtab
                .put_method_return(&self.class_name, &method.name, ty.clone());
        }
        Ok(ty)
    }

    fn parameter_list(
        &mut self,
        parameters: &[Parameter],
        locals: &mut LocalSymbolTable,
    ) -> Result<String> {
        let mut rendered = Vec::with_capacity(parameters.len());
        for param in parameters {
            let ty = map_type(&param.type_ref, &param.annotations, false, self.policy)?;
            rendered.push(format!("{} {}", ty.render(self.policy), param.name));
            locals.declare(&param.name, ty);
        }
        Ok(rendered.join(", "))
    }

    // Definition mode

    fn emit_body(&mut self, class: &ClassDecl) -> Result<()> {
        let mut members_text = String::new();
        for member in &class.members {
            match member {
                ClassMember::Field(field) => self.define_field(field)?,
                ClassMember::Constructor(ctor) => {
                    let text = self.constructor_definition(ctor)?;
                    members_text.push_str(&text);
                }
                ClassMember::Method(method) => {
                    if let Some(text) = self.method_definition(method)? {
                        members_text.push_str(&text);
                    }
                }
            }
        }

        for include in self.policy.body_includes(&class.name) {
            self.line(&format!("#include \"{}\"", include));
        }
        self.blank();

        let file_scope = std::mem::take(&mut self.file_scope);
        for entry in &file_scope {
            self.line(entry);
        }
        if !file_scope.is_empty() {
            self.blank();
        }

        self.out.push_str(&members_text);

        let qualified = self.prefixed(&class.name);
        let statics_init = std::mem::take(&mut self.statics_init);
        self.line("void");
        self.line(&format!("{}::initializeStatics()", qualified));
        self.line("{");
        self.push_indent();
        for stmt in &statics_init {
            self.line(stmt);
        }
        self.pop_indent();
        self.line("}");
        self.blank();

        let statics_release = std::mem::take(&mut self.statics_release);
        self.line("void");
        self.line(&format!("{}::releaseStatics()", qualified));
        self.line("{");
        self.push_indent();
        for stmt in &statics_release {
            self.line(stmt);
        }
        self.pop_indent();
        self.line("}");

        if self.policy.needs_supplement(&class.name) {
            self.blank();
            let supplement = format!("{}CppSupplement.h", self.prefixed(&class.name));
            self.line(&format!("#include \"{}\"", supplement));
        }
        Ok(())
    }

    /// Lower one field for the definition file. Constants already live in
    /// the header; everything else static needs a member definition and,
    /// with an initializer, `initializeStatics`/`releaseStatics` entries.
    fn define_field(&mut self, field: &FieldDecl) -> Result<()> {
        let ty = map_type(&field.type_ref, &field.annotations, false, self.policy)?;
        self.symtab
            .put_field_type(&self.class_name, &field.name, ty.clone());

        if !field.is_static() {
            if field.initializer.is_some() {
                return Err(Error::unsupported(format!(
                    "instance field initializer on {}",
                    field.name
                )));
            }
            return Ok(());
        }
        if self.is_define_constant(field) {
            return Ok(());
        }

        let rendered = ty.render(self.policy);
        let qualified = format!("{}::{}", self.prefixed(&self.class_name.clone()), field.name);
        let primitive_element = matches!(field.type_ref.name.as_str(), "boolean" | "char" | "int");

        match &field.initializer {
            None => {
                if ty.is_pointer() {
                    let null = self.policy.null_literal();
                    self.file_scope
                        .push(format!("{} {} = {};", rendered, qualified, null));
                } else {
                    self.file_scope.push(format!("{} {};", rendered, qualified));
                }
                Ok(())
            }
            Some(Expr::ArrayInitializer(values)) if ty.is_array() && primitive_element => {
                // Two-step lowering: raw storage at translation-unit scope,
                // wrapped into the bounded container at static-init time.
                // The container cannot be constant-initialized from a brace
                // list in the target idiom.
                let elem = ty.element().render(self.policy);
                let mut locals = LocalSymbolTable::new();
                let mut rendered_values = Vec::with_capacity(values.len());
                for value in values {
                    rendered_values.push(self.expr(value, Cx::default(), &mut locals)?);
                }
                self.file_scope.push(format!(
                    "static {} const {}_DATA[] = {{ {} }};",
                    elem,
                    field.name,
                    rendered_values.join(", ")
                ));
                self.file_scope.push(format!("{} {};", rendered, qualified));
                self.statics_init.push(format!(
                    "{} = {}(({}*){}_DATA, {});",
                    field.name,
                    rendered,
                    elem,
                    field.name,
                    values.len()
                ));
                Ok(())
            }
            Some(Expr::ArrayInitializer(values)) if ty.is_array() => {
                let elem = ty.element();
                self.file_scope.push(format!("{} {};", rendered, qualified));
                self.statics_init.push(format!(
                    "{} = {}::newJArray({});",
                    field.name,
                    rendered,
                    values.len()
                ));
                let mut locals = LocalSymbolTable::new();
                for (index, value) in values.iter().enumerate() {
                    let rendered_value = self.expr(value, Cx::default(), &mut locals)?;
                    self.statics_init
                        .push(format!("{}[{}] = {};", field.name, index, rendered_value));
                }
                if elem.is_pointer() {
                    self.statics_release.push(format!(
                        "for ({} i = 0; i < {}.length; i++) {{ delete {}[i]; }}",
                        self.policy.int_type(),
                        field.name,
                        field.name
                    ));
                }
                self.statics_release
                    .push(format!("{}.release();", field.name));
                Ok(())
            }
            Some(init) => {
                if primitive_element && !ty.is_array() {
                    if field.type_ref.name != "int" {
                        return Err(Error::unsupported(format!(
                            "static {} field {} with initializer",
                            field.type_ref.name, field.name
                        )));
                    }
                    // Non-final int statics keep a plain initialized
                    // definition; only final ones become defines.
                    let mut locals = LocalSymbolTable::new();
                    let value = self.expr(init, Cx::default(), &mut locals)?;
                    self.file_scope
                        .push(format!("{} {} = {};", rendered, qualified, value));
                    return Ok(());
                }
                if ty.is_array() && !matches!(init, Expr::NewArray(_)) && primitive_element {
                    return Err(Error::unsupported(format!(
                        "static array field {} with non-literal initializer",
                        field.name
                    )));
                }
                let mut locals = LocalSymbolTable::new();
                let mut cx = Cx::default();
                cx.no_length = ty.no_length;
                let value = self.expr(init, cx, &mut locals)?;
                if ty.is_pointer() {
                    let null = self.policy.null_literal();
                    self.file_scope
                        .push(format!("{} {} = {};", rendered, qualified, null));
                } else {
                    self.file_scope.push(format!("{} {};", rendered, qualified));
                }
                self.statics_init
                    .push(format!("{} = {};", field.name, value));
                if ty.is_array() {
                    if !ty.no_length {
                        self.statics_release
                            .push(format!("{}.release();", field.name));
                    }
                } else if matches!(ty.storage, Storage::Owned | Storage::Pointer) {
                    self.statics_release
                        .push(format!("delete {};", field.name));
                }
                Ok(())
            }
        }
    }

    fn constructor_definition(&mut self, ctor: &ConstructorDecl) -> Result<String> {
        let saved = std::mem::take(&mut self.out);
        let saved_indent = self.indent;
        self.indent = 0;

        let mut locals = LocalSymbolTable::new();
        let params = self.parameter_list(&ctor.parameters, &mut locals)?;
        let name = self.prefixed(&ctor.name);

        // The leading chain of `this.x = <expr>;` statements becomes the
        // member-initializer list, in source order; everything after the
        // first other statement stays in the body.
        let mut initializers = Vec::new();
        let mut body_start = 0;
        for stmt in &ctor.body.statements {
            match simple_field_assignment(stmt) {
                Some((field, value)) => {
                    let cx = Cx {
                        in_ctor_init: true,
                        ..Cx::default()
                    };
                    let rendered = self.expr(value, cx, &mut locals)?;
                    initializers.push(format!("{}({})", field, rendered));
                    body_start += 1;
                }
                None => break,
            }
        }

        self.line(&format!("{}::{}({})", name, name, params));
        if !initializers.is_empty() {
            for (index, entry) in initializers.iter().enumerate() {
                let leader = if index == 0 { "  : " } else { "    " };
                let trailer = if index + 1 == initializers.len() { "" } else { "," };
                self.out.push_str(leader);
                self.out.push_str(entry);
                self.out.push_str(trailer);
                self.out.push('\n');
            }
        }
        self.line("{");
        self.push_indent();
        let trace = self.policy.constructor_trace(&self.class_name);
        self.line(&trace);
        let cx = Cx::default();
        locals.enter_scope();
        for stmt in &ctor.body.statements[body_start..] {
            self.emit_stmt(stmt, cx, &mut locals)?;
        }
        locals.exit_scope();
        self.pop_indent();
        self.line("}");
        self.blank();

        self.indent = saved_indent;
        Ok(std::mem::replace(&mut self.out, saved))
    }

    fn method_definition(&mut self, method: &MethodDecl) -> Result<Option<String>> {
        let return_type = self.method_return_type(method)?;
        let body = match &method.body {
            Some(body) => body,
            None => return Ok(None),
        };
        if method.has_annotation("Inline") {
            // Fully resolved in the header.
            return Ok(None);
        }

        let saved = std::mem::take(&mut self.out);
        let saved_indent = self.indent;
        self.indent = 0;

        let mut locals = LocalSymbolTable::new();
        let params = self.parameter_list(&method.parameters, &mut locals)?;
        let qualified = self.prefixed(&self.class_name.clone());

        if method.name == "destructor" {
            self.line(&format!("{}::~{}()", qualified, qualified));
            self.line("{");
            self.push_indent();
            let trace = self.policy.destructor_trace(&self.class_name);
            self.line(&trace);
            let cx = Cx::in_method("destructor");
            for stmt in &body.statements {
                self.emit_stmt(stmt, cx, &mut locals)?;
            }
            self.pop_indent();
            self.line("}");
            self.blank();
        } else {
            let ret = match &return_type {
                Some(ty) => ty.render(self.policy),
                None => "void".to_string(),
            };
            self.line(&ret);
            self.line(&format!("{}::{}({})", qualified, method.name, params));
            self.line("{");
            self.push_indent();
            let cx = Cx::in_method(&method.name);
            for stmt in &body.statements {
                self.emit_stmt(stmt, cx, &mut locals)?;
            }
            self.pop_indent();
            self.line("}");
            self.blank();
        }

        self.indent = saved_indent;
        Ok(Some(std::mem::replace(&mut self.out, saved)))
    }

    // Statements

    fn emit_stmt(&mut self, stmt: &Stmt, cx: Cx<'_>, locals: &mut LocalSymbolTable) -> Result<()> {
        match stmt {
            Stmt::Expression(expr_stmt) => {
                if is_diagnostic_call(&expr_stmt.expr) {
                    // The source's diagnostic layer has no counterpart in
                    // the generated code.
                    return Ok(());
                }
                let rendered = self.expr(&expr_stmt.expr, cx, locals)?;
                self.line(&format!("{};", rendered));
                Ok(())
            }
            Stmt::Declaration(decl) => self.emit_var_decl(decl, cx, locals),
            Stmt::If(if_stmt) => {
                let condition = self.expr(&if_stmt.condition, cx, locals)?;
                self.line(&format!("if ({}) {{", condition));
                self.emit_braced(&if_stmt.then_branch, cx, locals)?;
                if let Some(else_branch) = &if_stmt.else_branch {
                    self.line("} else {");
                    self.emit_braced(else_branch, cx, locals)?;
                }
                self.line("}");
                Ok(())
            }
            Stmt::While(while_stmt) => {
                let condition = self.expr(&while_stmt.condition, cx, locals)?;
                self.line(&format!("while ({}) {{", condition));
                self.emit_braced(&while_stmt.body, cx, locals)?;
                self.line("}");
                Ok(())
            }
            Stmt::DoWhile(do_stmt) => {
                self.line("do {");
                self.emit_braced(&do_stmt.body, cx, locals)?;
                let condition = self.expr(&do_stmt.condition, cx, locals)?;
                self.line(&format!("}} while ({});", condition));
                Ok(())
            }
            Stmt::For(for_stmt) => self.emit_for(for_stmt, None, cx, locals),
            Stmt::Labeled(labeled) => {
                let for_stmt = match labeled.statement.as_ref() {
                    Stmt::For(f) => f,
                    _ => {
                        return Err(Error::unsupported(format!(
                            "label '{}' on a statement that is not a for loop",
                            labeled.label
                        )));
                    }
                };
                if self.labels.is_referenced(&labeled.label) {
                    self.emit_for(for_stmt, Some(&labeled.label), cx, locals)?;
                    self.line(&format!("{}_end: ;", labeled.label));
                } else {
                    // Unreferenced labels downgrade to plain loops.
                    self.emit_for(for_stmt, None, cx, locals)?;
                }
                Ok(())
            }
            Stmt::Switch(switch_stmt) => self.emit_switch(switch_stmt, cx, locals),
            Stmt::Return(ret) => {
                match &ret.value {
                    Some(value) => {
                        let rendered = self.expr(value, cx, locals)?;
                        self.line(&format!("return {};", rendered));
                    }
                    None => self.line("return;"),
                }
                Ok(())
            }
            Stmt::Break(brk) => {
                match &brk.label {
                    Some(label) => self.line(&format!("goto {}_end;", label)),
                    None => self.line("break;"),
                }
                Ok(())
            }
            Stmt::Continue(cont) => {
                match &cont.label {
                    Some(label) => {
                        // A restart goto only matches continue semantics when
                        // the loop has no clauses to re-run or skip.
                        if self.labels.for_has_clauses(label) == Some(true) {
                            return Err(Error::unsupported(format!(
                                "continue to label '{}' on a for loop with clauses",
                                label
                            )));
                        }
                        self.line(&format!("goto {};", label));
                    }
                    None => self.line("continue;"),
                }
                Ok(())
            }
            Stmt::Block(block) => {
                self.line("{");
                self.push_indent();
                locals.enter_scope();
                for inner in &block.statements {
                    self.emit_stmt(inner, cx, locals)?;
                }
                locals.exit_scope();
                self.pop_indent();
                self.line("}");
                Ok(())
            }
            Stmt::Empty => Ok(()),
        }
    }

    /// Emit a loop or branch body between already-printed braces.
    fn emit_braced(
        &mut self,
        stmt: &Stmt,
        cx: Cx<'_>,
        locals: &mut LocalSymbolTable,
    ) -> Result<()> {
        self.push_indent();
        locals.enter_scope();
        match stmt {
            Stmt::Block(block) => {
                for inner in &block.statements {
                    self.emit_stmt(inner, cx, locals)?;
                }
            }
            other => self.emit_stmt(other, cx, locals)?,
        }
        locals.exit_scope();
        self.pop_indent();
        Ok(())
    }

    fn emit_var_decl(
        &mut self,
        decl: &VarDeclStmt,
        cx: Cx<'_>,
        locals: &mut LocalSymbolTable,
    ) -> Result<()> {
        for declarator in &decl.declarators {
            let line = self.declarator_string(decl, declarator, cx, locals)?;
            self.line(&format!("{};", line));
        }
        Ok(())
    }

    fn declarator_string(
        &mut self,
        decl: &VarDeclStmt,
        declarator: &VarDeclarator,
        cx: Cx<'_>,
        locals: &mut LocalSymbolTable,
    ) -> Result<String> {
        let type_ref = TypeRef {
            name: decl.type_ref.name.clone(),
            array_dims: decl.type_ref.array_dims + declarator.array_dims,
            span: decl.type_ref.span,
        };
        let ty = map_type(&type_ref, &decl.annotations, false, self.policy)?;
        let rendered = ty.render(self.policy);
        let text = match &declarator.initializer {
            Some(Expr::ArrayInitializer(_)) => {
                return Err(Error::unsupported(format!(
                    "array initializer on local {}",
                    declarator.name
                )));
            }
            Some(init) => {
                let mut value_cx = cx;
                value_cx.no_length = ty.no_length;
                let value = self.expr(init, value_cx, locals)?;
                format!("{} {} = {}", rendered, declarator.name, value)
            }
            None => format!("{} {}", rendered, declarator.name),
        };
        locals.declare(&declarator.name, ty);
        Ok(text)
    }

    fn emit_for(
        &mut self,
        for_stmt: &ForStmt,
        label: Option<&str>,
        cx: Cx<'_>,
        locals: &mut LocalSymbolTable,
    ) -> Result<()> {
        locals.enter_scope();
        let init = self.for_init_string(&for_stmt.init, cx, locals)?;
        let condition = match &for_stmt.condition {
            Some(c) => self.expr(c, cx, locals)?,
            None => String::new(),
        };
        let mut updates = Vec::with_capacity(for_stmt.update.len());
        for update in &for_stmt.update {
            updates.push(self.expr(update, cx, locals)?);
        }
        let head = format!("for ({}; {}; {}) {{", init, condition, updates.join(", "));
        match label {
            Some(label) => self.line(&format!("{}: {}", label, head)),
            None => self.line(&head),
        }
        self.emit_braced(&for_stmt.body, cx, locals)?;
        self.line("}");
        locals.exit_scope();
        Ok(())
    }

    fn for_init_string(
        &mut self,
        init: &[Stmt],
        cx: Cx<'_>,
        locals: &mut LocalSymbolTable,
    ) -> Result<String> {
        if init.is_empty() {
            return Ok(String::new());
        }
        if let [Stmt::Declaration(decl)] = init {
            let mut parts = Vec::with_capacity(decl.declarators.len());
            for declarator in &decl.declarators {
                parts.push(self.declarator_string(decl, declarator, cx, locals)?);
            }
            return Ok(parts.join(", "));
        }
        let mut parts = Vec::with_capacity(init.len());
        for stmt in init {
            match stmt {
                Stmt::Expression(expr_stmt) => {
                    parts.push(self.expr(&expr_stmt.expr, cx, locals)?);
                }
                _ => {
                    return Err(Error::unsupported(
                        "mixed declarations and expressions in for initializer",
                    ));
                }
            }
        }
        Ok(parts.join(", "))
    }

    fn emit_switch(
        &mut self,
        switch_stmt: &SwitchStmt,
        cx: Cx<'_>,
        locals: &mut LocalSymbolTable,
    ) -> Result<()> {
        let scrutinee = self.expr(&switch_stmt.expression, cx, locals)?;
        self.line(&format!("switch ({}) {{", scrutinee));
        self.push_indent();
        for case in &switch_stmt.cases {
            if case.labels.is_empty() {
                self.line("default:");
            }
            for label in &case.labels {
                let rendered = self.expr(label, cx, locals)?;
                self.line(&format!("case {}:", rendered));
            }
            self.push_indent();
            locals.enter_scope();
            let before = self.out.len();
            for stmt in &case.statements {
                self.emit_stmt(stmt, cx, locals)?;
            }
            if self.out.len() == before && !case.statements.is_empty() {
                // The whole body was diagnostic calls; keep the fallthrough
                // visible instead of an empty case.
                self.line("/* fall through */");
            }
            locals.exit_scope();
            self.pop_indent();
        }
        self.pop_indent();
        self.line("}");
        Ok(())
    }

    // Expressions

    fn expr(&mut self, expr: &Expr, cx: Cx<'_>, locals: &mut LocalSymbolTable) -> Result<String> {
        match expr {
            Expr::Literal(literal) => self.literal(&literal.value, cx),
            Expr::Identifier(identifier) => Ok(self.identifier(&identifier.name, locals)),
            Expr::This(_) => Ok("this".to_string()),
            Expr::Parenthesized(inner) => {
                let rendered = self.expr(inner, cx, locals)?;
                Ok(format!("({})", rendered))
            }
            Expr::Unary(unary) => self.unary(unary, cx, locals),
            Expr::Binary(binary) => self.binary(binary, cx, locals),
            Expr::Assignment(assignment) => self.assignment(assignment, cx, locals),
            Expr::Conditional(conditional) => {
                let condition = self.expr(&conditional.condition, cx, locals)?;
                let then_expr = self.expr(&conditional.then_expr, cx, locals)?;
                let else_expr = self.expr(&conditional.else_expr, cx, locals)?;
                Ok(format!("{} ? {} : {}", condition, then_expr, else_expr))
            }
            Expr::FieldAccess(access) => self.field_access(access, cx, locals),
            Expr::MethodCall(call) => self.method_call(call, cx, locals),
            Expr::ArrayAccess(access) => {
                let array = self.expr(&access.array, cx, locals)?;
                let index = self.expr(&access.index, cx, locals)?;
                Ok(format!("{}[{}]", array, index))
            }
            Expr::Cast(cast) => {
                let ty = map_type(&cast.target_type, &[], false, self.policy)?;
                let inner = self.expr(&cast.expr, cx, locals)?;
                Ok(format!("({}) {}", ty.render(self.policy), inner))
            }
            Expr::New(new) => {
                let ty = map_type(&new.target_type, &[], true, self.policy)?;
                let mut args = Vec::with_capacity(new.arguments.len());
                for arg in &new.arguments {
                    args.push(self.expr(arg, cx, locals)?);
                }
                Ok(format!(
                    "new {}({})",
                    ty.render(self.policy),
                    args.join(", ")
                ))
            }
            Expr::NewArray(new_array) => self.new_array(new_array, cx, locals),
            Expr::ArrayInitializer(_) => Err(Error::unsupported(
                "array initializer outside a static field declaration",
            )),
        }
    }

    fn literal(&mut self, literal: &Literal, cx: Cx<'_>) -> Result<String> {
        Ok(match literal {
            Literal::Int(value) => value.to_string(),
            Literal::HexInt(spelling) => spelling.clone(),
            Literal::Boolean(true) => self.policy.true_literal().to_string(),
            Literal::Boolean(false) => self.policy.false_literal().to_string(),
            Literal::Null => self.policy.null_literal().to_string(),
            Literal::Char(value) => quote_char(*value),
            Literal::String(value) => self.string_literal(value, cx),
        })
    }

    /// The priority-ordered string-literal rule chain. Order is load-bearing:
    /// later rules are only reached when earlier ones do not match.
    fn string_literal(&mut self, value: &str, cx: Cx<'_>) -> String {
        if let Some(constant) = self.policy.namespace_constant(value) {
            return constant.to_string();
        }
        if value.is_empty() && self.class_name == self.policy.no_namespace_class() {
            return self.policy.no_namespace_constant().to_string();
        }
        if value.starts_with("-/")
            || value.starts_with("+//")
            || value.starts_with("http://")
            || value == "XSLT"
            // Two corpus-specific exceptions scoped to isQuirky; kept as
            // named special cases, not generalized.
            || (cx.method == Some("isQuirky")
                && (value == "HTML" || value == "-//W3O//DTD W3 HTML Strict 3.0//EN//"))
        {
            return quote_string(value);
        }
        let atom = self.atoms.intern(value);
        self.policy.atom_ref(&atom)
    }

    fn identifier(&mut self, name: &str, locals: &LocalSymbolTable) -> String {
        if locals.contains(name) {
            return name.to_string();
        }
        // A bare reference to one of the class's own constants goes through
        // the define registry.
        if let Some(macro_name) = self.defines.get(&self.class_name, name) {
            return macro_name.to_string();
        }
        name.to_string()
    }

    fn unary(
        &mut self,
        unary: &UnaryExpr,
        cx: Cx<'_>,
        locals: &mut LocalSymbolTable,
    ) -> Result<String> {
        let operand = self.expr(&unary.operand, cx, locals)?;
        Ok(match unary.operator {
            UnaryOp::Plus => format!("+{}", operand),
            UnaryOp::Minus => format!("-{}", operand),
            UnaryOp::Not => format!("!{}", operand),
            UnaryOp::BitNot => format!("~{}", operand),
            UnaryOp::PreInc => format!("++{}", operand),
            UnaryOp::PreDec => format!("--{}", operand),
            UnaryOp::PostInc => format!("{}++", operand),
            UnaryOp::PostDec => format!("{}--", operand),
        })
    }

    fn binary(
        &mut self,
        binary: &BinaryExpr,
        cx: Cx<'_>,
        locals: &mut LocalSymbolTable,
    ) -> Result<String> {
        // Comparisons against null or zero become boolean idioms; the
        // rewrite fires only for exactly these right-hand literal shapes.
        if matches!(binary.operator, BinaryOp::Eq | BinaryOp::Ne) {
            if let Expr::Literal(literal) = binary.right.as_ref() {
                let matches_shape = matches!(literal.value, Literal::Null)
                    || matches!(literal.value, Literal::Int(0));
                if matches_shape {
                    let left = self.expr(&binary.left, cx, locals)?;
                    return Ok(match binary.operator {
                        BinaryOp::Ne => format!("!!{}", left),
                        _ => format!("!{}", left),
                    });
                }
            }
        }
        let left = self.expr(&binary.left, cx, locals)?;
        let right = self.expr(&binary.right, cx, locals)?;
        let op = match binary.operator {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::AndAnd => "&&",
            BinaryOp::OrOr => "||",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::LShift => "<<",
            BinaryOp::RShift => ">>",
            BinaryOp::URShift => {
                return Err(Error::unsupported("unsigned right shift"));
            }
        };
        Ok(format!("{} {} {}", left, op, right))
    }

    fn assignment(
        &mut self,
        assignment: &AssignmentExpr,
        cx: Cx<'_>,
        locals: &mut LocalSymbolTable,
    ) -> Result<String> {
        let target = self.expr(&assignment.target, cx, locals)?;
        let mut value_cx = cx;
        if let Some(ty) = self.expr_type(&assignment.target, locals) {
            value_cx.no_length = ty.no_length;
        }
        let value = self.expr(&assignment.value, value_cx, locals)?;
        let op = match assignment.operator {
            AssignmentOp::Assign => "=",
            AssignmentOp::AddAssign => "+=",
            AssignmentOp::SubAssign => "-=",
            AssignmentOp::MulAssign => "*=",
            AssignmentOp::DivAssign => "/=",
            AssignmentOp::ModAssign => "%=",
            AssignmentOp::AndAssign => "&=",
            AssignmentOp::OrAssign => "|=",
            AssignmentOp::XorAssign => "^=",
            AssignmentOp::LShiftAssign => "<<=",
            AssignmentOp::RShiftAssign => ">>=",
        };
        Ok(format!("{} {} {}", target, op, value))
    }

    fn field_access(
        &mut self,
        access: &FieldAccessExpr,
        cx: Cx<'_>,
        locals: &mut LocalSymbolTable,
    ) -> Result<String> {
        let target = match &access.target {
            Some(target) => target.as_ref(),
            None => return Ok(self.identifier(&access.name, locals)),
        };

        if let Expr::This(_) = target {
            // Initializer-list entries name members bare; elsewhere the
            // explicit this survives.
            return Ok(if cx.in_ctor_init {
                access.name.clone()
            } else {
                format!("this->{}", access.name)
            });
        }

        if let Expr::Identifier(identifier) = target {
            if identifier.name == "Integer" && access.name == "MAX_VALUE" {
                return Ok(self.policy.max_integer().to_string());
            }
            if !locals.contains(&identifier.name)
                && self
                    .symtab
                    .get_field_type(&self.class_name, &identifier.name)
                    .is_none()
                && is_class_reference(&identifier.name)
            {
                return Ok(self.class_field(&identifier.name, &access.name));
            }
        }

        let rendered = self.expr(target, cx, locals)?;
        if access.name == "length" {
            // Bounded arrays carry their length as a plain member.
            return Ok(format!("{}.length", rendered));
        }
        let separator = self.member_separator(target, locals);
        Ok(format!("{}{}{}", rendered, separator, access.name))
    }

    /// `Class.field` resolution: the define registry wins, then the
    /// qualified spelling with the ATTR_/ELT_ special case.
    fn class_field(&mut self, class: &str, field: &str) -> String {
        if let Some(macro_name) = self.defines.get(class, field) {
            return macro_name.to_string();
        }
        let named = if class == "AttributeName" && !META_FIELDS.contains(&field) {
            format!("ATTR_{}", field)
        } else if class == "ElementName" && !META_FIELDS.contains(&field) {
            format!("ELT_{}", field)
        } else {
            field.to_string()
        };
        format!("{}::{}", self.prefixed(class), named)
    }

    fn method_call(
        &mut self,
        call: &MethodCallExpr,
        cx: Cx<'_>,
        locals: &mut LocalSymbolTable,
    ) -> Result<String> {
        if let Some(rewritten) = self.helper_call(call, cx, locals)? {
            return Ok(rewritten);
        }

        let mut args = Vec::with_capacity(call.arguments.len());
        for arg in &call.arguments {
            args.push(self.expr(arg, cx, locals)?);
        }
        let args = args.join(", ");

        let target = match &call.target {
            None => return Ok(format!("{}({})", call.name, args)),
            Some(target) => target.as_ref(),
        };
        if let Expr::This(_) = target {
            return Ok(format!("this->{}({})", call.name, args));
        }
        if let Expr::Identifier(identifier) = target {
            if !locals.contains(&identifier.name)
                && self
                    .symtab
                    .get_field_type(&self.class_name, &identifier.name)
                    .is_none()
                && is_class_reference(&identifier.name)
            {
                return Ok(format!(
                    "{}::{}({})",
                    self.prefixed(&identifier.name),
                    call.name,
                    args
                ));
            }
        }
        let rendered = self.expr(target, cx, locals)?;
        let separator = self.member_separator(target, locals);
        Ok(format!("{}{}{}({})", rendered, separator, call.name, args))
    }

    /// Rewrites for the fixed set of helper-namespace calls. Returns `None`
    /// when the call is not one of them.
    fn helper_call(
        &mut self,
        call: &MethodCallExpr,
        cx: Cx<'_>,
        locals: &mut LocalSymbolTable,
    ) -> Result<Option<String>> {
        let scope = match &call.target {
            Some(target) => match target.as_ref() {
                Expr::Identifier(identifier) => identifier.name.as_str(),
                _ => return Ok(None),
            },
            None => return Ok(None),
        };
        match (scope, call.name.as_str()) {
            ("Portability", "releaseArray") if call.arguments.len() == 1 => {
                let arg = self.expr(&call.arguments[0], cx, locals)?;
                Ok(Some(format!("{}.release()", arg)))
            }
            ("Portability", "deleteArray") if call.arguments.len() == 1 => {
                let arg = self.expr(&call.arguments[0], cx, locals)?;
                Ok(Some(format!("delete[] {}", arg)))
            }
            ("Portability", "delete") if call.arguments.len() == 1 => {
                let arg = self.expr(&call.arguments[0], cx, locals)?;
                Ok(Some(format!("delete {}", arg)))
            }
            ("System", "arraycopy") if call.arguments.len() == 5 => {
                let src = self.expr(&call.arguments[0], cx, locals)?;
                let src_pos = self.expr(&call.arguments[1], cx, locals)?;
                let dst = self.expr(&call.arguments[2], cx, locals)?;
                let dst_pos = self.expr(&call.arguments[3], cx, locals)?;
                let len = self.expr(&call.arguments[4], cx, locals)?;
                let helper = format!("{}ArrayCopy::arraycopy", self.policy.class_prefix());
                let zero_offsets = is_zero_literal(&call.arguments[1])
                    && is_zero_literal(&call.arguments[3]);
                if zero_offsets {
                    Ok(Some(format!("{}({}, {}, {})", helper, src, dst, len)))
                } else if src == dst {
                    // Same-array move: the overlap-safe range form.
                    Ok(Some(format!(
                        "{}({}, {}, {}, {})",
                        helper, src, src_pos, dst_pos, len
                    )))
                } else {
                    Ok(Some(format!(
                        "{}({}, {}, {}, {}, {})",
                        helper, src, src_pos, dst, dst_pos, len
                    )))
                }
            }
            ("Arrays", "binarySearch") if call.arguments.len() == 2 => {
                let array = self.expr(&call.arguments[0], cx, locals)?;
                let key = self.expr(&call.arguments[1], cx, locals)?;
                Ok(Some(format!("{}.binarySearch({})", array, key)))
            }
            _ => Ok(None),
        }
    }

    fn new_array(
        &mut self,
        new_array: &NewArrayExpr,
        cx: Cx<'_>,
        locals: &mut LocalSymbolTable,
    ) -> Result<String> {
        if new_array.dims.len() > 1 || (new_array.extra_dims > 0 && !new_array.dims.is_empty()) {
            return Err(Error::unsupported("nested array allocation"));
        }
        if new_array.initializer.is_some() {
            return Err(Error::unsupported(
                "array allocation with inline initializer outside a static field",
            ));
        }
        let length = match new_array.dims.first() {
            Some(dim) => self.expr(dim, cx, locals)?,
            None => return Err(Error::unsupported("array allocation without a length")),
        };
        let elem = map_type(&new_array.elem_type, &[], false, self.policy)?;
        let elem_rendered = elem.render(self.policy);
        if cx.no_length {
            Ok(format!("new {}[{}]", elem_rendered, length))
        } else {
            Ok(format!(
                "{}<{},{}>::newJArray({})",
                self.policy.array_template(),
                elem_rendered,
                self.policy.int_type(),
                length
            ))
        }
    }

    // Shallow local type inference, for disambiguation only. `None` means
    // unknown; every caller has a default.

    fn expr_type(&self, expr: &Expr, locals: &LocalSymbolTable) -> Option<CppType> {
        match expr {
            Expr::Identifier(identifier) => locals
                .resolve(&identifier.name)
                .cloned()
                .or_else(|| {
                    self.symtab
                        .get_field_type(&self.class_name, &identifier.name)
                        .cloned()
                }),
            Expr::Parenthesized(inner) => self.expr_type(inner, locals),
            Expr::FieldAccess(access) => match &access.target {
                Some(target) if matches!(target.as_ref(), Expr::This(_)) => self
                    .symtab
                    .get_field_type(&self.class_name, &access.name)
                    .cloned(),
                Some(target) => {
                    if let Expr::Identifier(identifier) = target.as_ref() {
                        if is_class_reference(&identifier.name)
                            && !locals.contains(&identifier.name)
                        {
                            return self
                                .symtab
                                .get_field_type(&identifier.name, &access.name)
                                .cloned();
                        }
                    }
                    let owner = self.expr_type(target, locals)?;
                    self.symtab
                        .get_field_type(self.java_class_of(&owner)?, &access.name)
                        .cloned()
                }
                None => self
                    .symtab
                    .get_field_type(&self.class_name, &access.name)
                    .cloned(),
            },
            Expr::ArrayAccess(access) => {
                let array = self.expr_type(&access.array, locals)?;
                if array.is_array() {
                    Some(array.element())
                } else {
                    None
                }
            }
            Expr::MethodCall(call) => match &call.target {
                None => self
                    .symtab
                    .get_method_return(&self.class_name, &call.name)
                    .cloned(),
                Some(target) if matches!(target.as_ref(), Expr::This(_)) => self
                    .symtab
                    .get_method_return(&self.class_name, &call.name)
                    .cloned(),
                Some(target) => {
                    if let Expr::Identifier(identifier) = target.as_ref() {
                        if is_class_reference(&identifier.name)
                            && !locals.contains(&identifier.name)
                        {
                            return self
                                .symtab
                                .get_method_return(&identifier.name, &call.name)
                                .cloned();
                        }
                    }
                    let owner = self.expr_type(target, locals)?;
                    self.symtab
                        .get_method_return(self.java_class_of(&owner)?, &call.name)
                        .cloned()
                }
            },
            Expr::Cast(cast) => map_type(&cast.target_type, &[], false, self.policy).ok(),
            _ => None,
        }
    }

    /// Recover the Java class name behind a mapped reference type.
    fn java_class_of<'a>(&self, ty: &'a CppType) -> Option<&'a str> {
        ty.name.strip_prefix(self.policy.class_prefix())
    }

    /// `->` for pointers (and anything unknown), `.` for values and arrays.
    fn member_separator(&self, target: &Expr, locals: &LocalSymbolTable) -> &'static str {
        match self.expr_type(target, locals) {
            Some(ty) if ty.is_array() => ".",
            Some(ty) if ty.is_pointer() => "->",
            Some(_) => ".",
            None => "->",
        }
    }
}

/// `this.x = <expr>;`, the shape the initializer-list extraction accepts.
fn simple_field_assignment(stmt: &Stmt) -> Option<(&str, &Expr)> {
    let expr_stmt = match stmt {
        Stmt::Expression(e) => e,
        _ => return None,
    };
    let assignment = match &expr_stmt.expr {
        Expr::Assignment(a) if a.operator == AssignmentOp::Assign => a,
        _ => return None,
    };
    let access = match assignment.target.as_ref() {
        Expr::FieldAccess(access) => access,
        _ => return None,
    };
    match &access.target {
        Some(target) if matches!(target.as_ref(), Expr::This(_)) => {
            Some((&access.name, assignment.value.as_ref()))
        }
        _ => None,
    }
}

fn is_diagnostic_call(expr: &Expr) -> bool {
    let name = match expr {
        Expr::MethodCall(call) => &call.name,
        _ => return false,
    };
    DIAGNOSTIC_PREFIXES
        .iter()
        .any(|prefix| name.starts_with(prefix))
}

fn is_zero_literal(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Literal(LiteralExpr {
            value: Literal::Int(0),
            ..
        })
    )
}

/// Uppercase-initial identifiers that are not resolvable as variables are
/// treated as class references; the pseudo-static list names the corpus
/// classes this is known to be right for.
fn is_class_reference(name: &str) -> bool {
    PSEUDO_STATIC_CLASSES.contains(&name)
        || name
            .chars()
            .next()
            .map(|c| c.is_ascii_uppercase())
            .unwrap_or(false)
}

fn quote_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

fn quote_char(value: char) -> String {
    match value {
        '\'' => "'\\''".to_string(),
        '\\' => "'\\\\'".to_string(),
        '\n' => "'\\n'".to_string(),
        '\t' => "'\\t'".to_string(),
        '\r' => "'\\r'".to_string(),
        '\0' => "'\\0'".to_string(),
        c if c.is_ascii_graphic() || c == ' ' => format!("'{}'", c),
        c => format!("0x{:04x}", c as u32),
    }
}
