use swc_common::comments::{self, SingleThreadedComments};
use swc_common::sync::Lrc;
use swc_common::{BytePos, FileName, SourceMap, Span, Spanned};
use swc_ecma_ast::{
    BlockStmt, BlockStmtOrExpr, Callee, Class, ClassMember, Decl, DefaultDecl, Expr, ExprOrSpread,
    Function, JSXAttrOrSpread, JSXAttrValue, JSXElement, JSXElementChild, JSXExpr,
    JSXExprContainer, MemberExpr, MemberProp, ModuleDecl, ModuleItem, ObjectPatProp, OptChainBase,
    ParamOrTsParamProp, Pat, Program, Prop, PropOrSpread, Stmt, SuperProp, VarDecl, VarDeclOrExpr,
};
use swc_ecma_parser::lexer::Lexer;
use swc_ecma_parser::{EsConfig, Parser, StringInput, Syntax, TsConfig};
use tracing::warn;

use crate::config::{Dialect, Options};
use crate::error::ConvertError;
use crate::tree::{
    Comment, CommentKind, FunctionParts, NodeKind, SourceDocument, TextRange, TreeBuilder,
};

/// Parses `text` with [`swc_ecma_parser`] and lowers the result into a [`SourceDocument`].
///
/// # Example
/// ```rs
/// # use flotate::{config::Options, parse};
/// let doc = parse::parse("var x = 1;", &Options::default())?;
/// assert_eq!(doc.tree().comments().len(), 0);
/// ```
pub fn parse(text: &str, options: &Options) -> Result<SourceDocument, ConvertError> {
    let cm = Lrc::<SourceMap>::default();
    let fm = cm.new_source_file(FileName::Custom("input.js".into()), text.to_string());
    let base = fm.start_pos;
    let comments = SingleThreadedComments::default();

    let program = {
        let syntax = match options.dialect {
            Dialect::JavaScript => Syntax::Es(EsConfig {
                jsx: options.jsx,
                ..Default::default()
            }),
            Dialect::TypeScript => Syntax::Typescript(TsConfig {
                tsx: options.jsx,
                ..Default::default()
            }),
        };
        let lexer = Lexer::new(
            syntax,
            // EsVersion defaults to es5
            Default::default(),
            StringInput::from(&*fm),
            Some(&comments),
        );

        let mut parser = Parser::new_from(lexer);
        let program = parser.parse_program();

        for e in parser.take_errors() {
            warn!(message = %e.kind().msg(), span = ?e.span(), "recovered from parse error");
        }

        program.map_err(|e| ConvertError::Parse {
            message: e.kind().msg().into_owned(),
            range: relative(base, e.span()),
        })?
    };

    let mut lowering = Lowering {
        base,
        builder: TreeBuilder::new(text.len()),
    };
    match &program {
        Program::Module(module) => {
            for item in &module.body {
                lowering.walk_module_item(item);
            }
        }
        Program::Script(script) => {
            for statement in &script.body {
                lowering.walk_statement(statement);
            }
        }
    }

    let (leading, trailing) = comments.take_all();
    let leading = leading.take();
    let trailing = trailing.take();

    let mut all = Vec::new();
    let mut attached = Vec::new();
    for (pos, list) in leading.iter() {
        let ranges: Vec<TextRange> = list
            .iter()
            .map(|comment| relative(base, comment.span))
            .collect();
        all.extend(list.iter().map(|comment| lower_comment(base, comment)));
        attached.push((offset(base, *pos), ranges));
    }
    for list in trailing.values() {
        all.extend(list.iter().map(|comment| lower_comment(base, comment)));
    }

    let tree = lowering.builder.finish(all, attached);
    SourceDocument::new(text.to_string(), tree)
}

/// Converts a position into an offset into the parsed text. Positions before the file (dummy
/// spans) map past any real offset so validation rejects them.
fn offset(base: BytePos, pos: BytePos) -> usize {
    pos.0
        .checked_sub(base.0)
        .map(|offset| offset as usize)
        .unwrap_or(usize::MAX)
}

fn relative(base: BytePos, span: Span) -> TextRange {
    TextRange::new(offset(base, span.lo), offset(base, span.hi))
}

fn lower_comment(base: BytePos, comment: &comments::Comment) -> Comment {
    Comment {
        kind: match comment.kind {
            comments::CommentKind::Block => CommentKind::Block,
            comments::CommentKind::Line => CommentKind::Line,
        },
        range: relative(base, comment.span),
    }
}

/// Walks the swc AST, recording the nodes that matter for comment attachment and rewriting.
///
/// Leaf expressions (identifiers, literals, `this`) are not recorded since nothing can be
/// attached below them. Parentheses are transparent.
struct Lowering {
    base: BytePos,
    builder: TreeBuilder,
}

impl Lowering {
    fn range(&self, span: Span) -> TextRange {
        relative(self.base, span)
    }

    fn enter(&mut self, kind: NodeKind, span: Span) {
        let range = self.range(span);
        self.builder.enter(kind, range);
    }

    fn exit(&mut self) {
        self.builder.exit();
    }

    fn leaf(&mut self, kind: NodeKind, span: Span) {
        let range = self.range(span);
        self.builder.leaf(kind, range);
    }

    fn walk_module_item(&mut self, item: &ModuleItem) {
        match item {
            ModuleItem::Stmt(statement) => self.walk_statement(statement),

            ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => {
                self.enter(NodeKind::Other, export.span);
                self.walk_decl(&export.decl);
                self.exit();
            }

            ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultDecl(export)) => {
                self.enter(NodeKind::Other, export.span);
                match &export.decl {
                    DefaultDecl::Fn(function) => self.walk_function_expression(
                        function.ident.as_ref().map(|ident| ident.span),
                        &function.function,
                    ),
                    DefaultDecl::Class(class) => self.walk_class(&class.class),
                    _ => {}
                }
                self.exit();
            }

            ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultExpr(export)) => {
                self.enter(NodeKind::Other, export.span);
                self.walk_expression(&export.expr);
                self.exit();
            }

            ModuleItem::ModuleDecl(_) => {}
        }
    }

    fn walk_statement(&mut self, statement: &Stmt) {
        match statement {
            Stmt::Decl(decl) => self.walk_decl(decl),

            Stmt::Block(block) => self.walk_block(block),

            Stmt::Empty(_) | Stmt::Debugger(_) | Stmt::Break(_) | Stmt::Continue(_) => {}

            Stmt::Expr(e) => {
                self.enter(NodeKind::Other, e.span);
                self.walk_expression(&e.expr);
                self.exit();
            }

            Stmt::Return(return_) => {
                self.enter(NodeKind::Other, return_.span);
                if let Some(arg) = &return_.arg {
                    self.walk_expression(arg);
                }
                self.exit();
            }

            Stmt::Throw(throw) => {
                self.enter(NodeKind::Other, throw.span);
                self.walk_expression(&throw.arg);
                self.exit();
            }

            Stmt::If(if_) => {
                self.enter(NodeKind::Other, if_.span);
                self.walk_expression(&if_.test);
                self.walk_statement(&if_.cons);
                if let Some(alt) = &if_.alt {
                    self.walk_statement(alt);
                }
                self.exit();
            }

            Stmt::While(while_) => {
                self.enter(NodeKind::Other, while_.span);
                self.walk_expression(&while_.test);
                self.walk_statement(&while_.body);
                self.exit();
            }

            Stmt::DoWhile(do_while) => {
                self.enter(NodeKind::Other, do_while.span);
                self.walk_statement(&do_while.body);
                self.walk_expression(&do_while.test);
                self.exit();
            }

            Stmt::For(for_) => {
                self.enter(NodeKind::Other, for_.span);
                match &for_.init {
                    Some(VarDeclOrExpr::VarDecl(decl)) => self.walk_var_decl(decl),
                    Some(VarDeclOrExpr::Expr(e)) => self.walk_expression(e),
                    None => {}
                }
                if let Some(test) = &for_.test {
                    self.walk_expression(test);
                }
                if let Some(update) = &for_.update {
                    self.walk_expression(update);
                }
                self.walk_statement(&for_.body);
                self.exit();
            }

            Stmt::ForIn(for_in) => {
                self.enter(NodeKind::Other, for_in.span);
                self.walk_expression(&for_in.right);
                self.walk_statement(&for_in.body);
                self.exit();
            }

            Stmt::ForOf(for_of) => {
                self.enter(NodeKind::Other, for_of.span);
                self.walk_expression(&for_of.right);
                self.walk_statement(&for_of.body);
                self.exit();
            }

            Stmt::Labeled(labeled) => {
                self.enter(NodeKind::Other, labeled.span);
                self.walk_statement(&labeled.body);
                self.exit();
            }

            Stmt::With(with) => {
                self.enter(NodeKind::Other, with.span);
                self.walk_expression(&with.obj);
                self.walk_statement(&with.body);
                self.exit();
            }

            Stmt::Switch(switch) => {
                self.enter(NodeKind::Other, switch.span);
                self.walk_expression(&switch.discriminant);
                for case in &switch.cases {
                    self.enter(NodeKind::Other, case.span);
                    if let Some(test) = &case.test {
                        self.walk_expression(test);
                    }
                    for statement in &case.cons {
                        self.walk_statement(statement);
                    }
                    self.exit();
                }
                self.exit();
            }

            Stmt::Try(try_) => {
                self.enter(NodeKind::Other, try_.span);
                self.walk_block(&try_.block);
                if let Some(handler) = &try_.handler {
                    self.enter(NodeKind::Other, handler.span);
                    self.walk_block(&handler.body);
                    self.exit();
                }
                if let Some(finalizer) = &try_.finalizer {
                    self.walk_block(finalizer);
                }
                self.exit();
            }
        }
    }

    fn walk_block(&mut self, block: &BlockStmt) {
        self.enter(NodeKind::Other, block.span);
        for statement in &block.stmts {
            self.walk_statement(statement);
        }
        self.exit();
    }

    fn walk_decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Fn(decl) => {
                let function = &decl.function;
                let Some(body) = &function.body else {
                    return;
                };
                let parts = self.function_parts(decl.ident.span.hi, function, body);
                self.enter(NodeKind::FunctionDeclaration(parts), function.span);
                self.leaf(NodeKind::Identifier, decl.ident.span);
                self.walk_function_inner(function);
                self.exit();
            }

            Decl::Var(decl) => self.walk_var_decl(decl),

            Decl::Class(decl) => self.walk_class(&decl.class),

            _ => {}
        }
    }

    fn walk_var_decl(&mut self, decl: &VarDecl) {
        self.enter(NodeKind::VariableDeclaration, decl.span);
        for declarator in &decl.decls {
            let id = self.range(declarator.name.span());
            self.enter(NodeKind::VariableDeclarator { id }, declarator.span);
            if let Pat::Ident(name) = &declarator.name {
                self.leaf(NodeKind::Identifier, name.id.span);
            }
            self.walk_pattern(&declarator.name);
            if let Some(init) = &declarator.init {
                self.walk_expression(init);
            }
            self.exit();
        }
        self.exit();
    }

    fn walk_class(&mut self, class: &Class) {
        self.enter(NodeKind::Other, class.span);
        if let Some(super_class) = &class.super_class {
            self.walk_expression(super_class);
        }

        for member in &class.body {
            match member {
                ClassMember::Constructor(constructor) => {
                    let Some(body) = &constructor.body else {
                        continue;
                    };
                    let parts = FunctionParts {
                        body: self.range(body.span),
                        params: constructor
                            .params
                            .iter()
                            .map(|param| self.range(param.span()))
                            .collect(),
                        signature_start: offset(self.base, constructor.key.span().hi),
                        value_start: offset(self.base, constructor.span.lo),
                    };
                    self.enter(
                        NodeKind::MethodDefinition {
                            function: parts,
                            constructor: true,
                        },
                        constructor.span,
                    );
                    for param in &constructor.params {
                        if let ParamOrTsParamProp::Param(param) = param {
                            self.walk_pattern(&param.pat);
                        }
                    }
                    self.walk_block(body);
                    self.exit();
                }

                ClassMember::Method(method) => {
                    self.walk_method(method.span, method.key.span().hi, &method.function)
                }

                ClassMember::PrivateMethod(method) => {
                    self.walk_method(method.span, method.key.span.hi, &method.function)
                }

                ClassMember::ClassProp(prop) => {
                    self.enter(NodeKind::Other, prop.span);
                    if let Some(value) = &prop.value {
                        self.walk_expression(value);
                    }
                    self.exit();
                }

                ClassMember::PrivateProp(prop) => {
                    self.enter(NodeKind::Other, prop.span);
                    if let Some(value) = &prop.value {
                        self.walk_expression(value);
                    }
                    self.exit();
                }

                ClassMember::StaticBlock(block) => self.walk_block(&block.body),

                _ => {}
            }
        }
        self.exit();
    }

    fn walk_method(&mut self, span: Span, key_end: BytePos, function: &Function) {
        let Some(body) = &function.body else {
            return;
        };
        let parts = self.function_parts(key_end, function, body);
        self.enter(
            NodeKind::MethodDefinition {
                function: parts,
                constructor: false,
            },
            span,
        );
        self.walk_function_value(function);
        self.exit();
    }

    fn function_parts(
        &self,
        signature_start: BytePos,
        function: &Function,
        body: &BlockStmt,
    ) -> FunctionParts {
        FunctionParts {
            body: self.range(body.span),
            params: function
                .params
                .iter()
                .map(|param| self.range(param.span))
                .collect(),
            signature_start: offset(self.base, signature_start),
            value_start: offset(self.base, function.span.lo),
        }
    }

    /// Records the function value of a method or property as a plain node, so only its owner is
    /// rewritten.
    fn walk_function_value(&mut self, function: &Function) {
        self.enter(NodeKind::Other, function.span);
        self.walk_function_inner(function);
        self.exit();
    }

    fn walk_function_inner(&mut self, function: &Function) {
        for param in &function.params {
            self.walk_pattern(&param.pat);
        }
        if let Some(body) = &function.body {
            self.walk_block(body);
        }
    }

    fn walk_function_expression(&mut self, ident: Option<Span>, function: &Function) {
        let Some(body) = &function.body else {
            return;
        };
        let signature_start = ident.map(|span| span.hi).unwrap_or(function.span.lo);
        let parts = self.function_parts(signature_start, function, body);
        self.enter(NodeKind::FunctionExpression(parts), function.span);
        if let Some(ident) = ident {
            self.leaf(NodeKind::Identifier, ident);
        }
        self.walk_function_inner(function);
        self.exit();
    }

    /// Records the default values inside a binding pattern, however deeply nested.
    fn walk_pattern(&mut self, pattern: &Pat) {
        match pattern {
            Pat::Assign(assign) => {
                self.enter(NodeKind::Other, assign.span);
                self.walk_pattern(&assign.left);
                self.walk_expression(&assign.right);
                self.exit();
            }

            Pat::Array(array) => {
                for elem in array.elems.iter().flatten() {
                    self.walk_pattern(elem);
                }
            }

            Pat::Object(object) => {
                for prop in &object.props {
                    match prop {
                        ObjectPatProp::KeyValue(kv) => self.walk_pattern(&kv.value),
                        ObjectPatProp::Assign(assign) => {
                            if let Some(value) = &assign.value {
                                self.walk_expression(value);
                            }
                        }
                        ObjectPatProp::Rest(rest) => self.walk_pattern(&rest.arg),
                    }
                }
            }

            Pat::Rest(rest) => self.walk_pattern(&rest.arg),

            _ => {}
        }
    }

    fn walk_property(&mut self, prop: &Prop) {
        match prop {
            Prop::KeyValue(kv) => {
                let function = match &*kv.value {
                    Expr::Fn(f) => f
                        .function
                        .body
                        .as_ref()
                        .map(|body| self.function_parts(kv.key.span().hi, &f.function, body)),
                    _ => None,
                };
                self.enter(
                    NodeKind::Property {
                        function,
                        method: false,
                    },
                    kv.span(),
                );
                match &*kv.value {
                    Expr::Fn(f) => self.walk_function_value(&f.function),
                    value => self.walk_expression(value),
                }
                self.exit();
            }

            Prop::Method(method) => {
                let function = method.function.body.as_ref().map(|body| {
                    self.function_parts(method.key.span().hi, &method.function, body)
                });
                self.enter(
                    NodeKind::Property {
                        function,
                        method: true,
                    },
                    method.span(),
                );
                self.walk_function_value(&method.function);
                self.exit();
            }

            Prop::Getter(getter) => {
                let Some(body) = &getter.body else {
                    return;
                };
                let parts = FunctionParts {
                    body: self.range(body.span),
                    params: Vec::new(),
                    signature_start: offset(self.base, getter.key.span().hi),
                    value_start: offset(self.base, getter.span.lo),
                };
                self.enter(
                    NodeKind::Property {
                        function: Some(parts),
                        method: true,
                    },
                    getter.span,
                );
                self.walk_block(body);
                self.exit();
            }

            Prop::Setter(setter) => {
                let Some(body) = &setter.body else {
                    return;
                };
                let parts = FunctionParts {
                    body: self.range(body.span),
                    params: vec![self.range(setter.param.span())],
                    signature_start: offset(self.base, setter.key.span().hi),
                    value_start: offset(self.base, setter.span.lo),
                };
                self.enter(
                    NodeKind::Property {
                        function: Some(parts),
                        method: true,
                    },
                    setter.span,
                );
                self.walk_pattern(&setter.param);
                self.walk_block(body);
                self.exit();
            }

            Prop::Assign(assign) => {
                self.enter(
                    NodeKind::Property {
                        function: None,
                        method: false,
                    },
                    assign.span(),
                );
                self.walk_expression(&assign.value);
                self.exit();
            }

            Prop::Shorthand(_) => {}
        }
    }

    fn walk_arguments(&mut self, args: &[ExprOrSpread]) {
        for arg in args {
            self.walk_expression(&arg.expr);
        }
    }

    fn walk_member(&mut self, member: &MemberExpr) {
        self.walk_expression(&member.obj);
        if let MemberProp::Computed(computed) = &member.prop {
            self.walk_expression(&computed.expr);
        }
    }

    fn walk_opt_chain(&mut self, base: &OptChainBase) {
        match base {
            OptChainBase::Member(member) => self.walk_member(member),
            OptChainBase::Call(call) => {
                self.walk_expression(&call.callee);
                self.walk_arguments(&call.args);
            }
        }
    }

    fn walk_jsx_element(&mut self, element: &JSXElement) {
        for attr in &element.opening.attrs {
            match attr {
                JSXAttrOrSpread::JSXAttr(attr) => match &attr.value {
                    Some(JSXAttrValue::JSXExprContainer(container)) => {
                        self.walk_jsx_container(container)
                    }
                    Some(JSXAttrValue::JSXElement(element)) => self.walk_jsx_element(element),
                    Some(JSXAttrValue::JSXFragment(fragment)) => {
                        self.walk_jsx_children(&fragment.children)
                    }
                    _ => {}
                },
                JSXAttrOrSpread::SpreadElement(spread) => self.walk_expression(&spread.expr),
            }
        }
        self.walk_jsx_children(&element.children);
    }

    fn walk_jsx_children(&mut self, children: &[JSXElementChild]) {
        for child in children {
            match child {
                JSXElementChild::JSXExprContainer(container) => self.walk_jsx_container(container),
                JSXElementChild::JSXSpreadChild(spread) => self.walk_expression(&spread.expr),
                JSXElementChild::JSXElement(element) => self.walk_jsx_element(element),
                JSXElementChild::JSXFragment(fragment) => {
                    self.walk_jsx_children(&fragment.children)
                }
                _ => {}
            }
        }
    }

    fn walk_jsx_container(&mut self, container: &JSXExprContainer) {
        if let JSXExpr::Expr(e) = &container.expr {
            self.walk_expression(e);
        }
    }

    fn walk_expression(&mut self, expression: &Expr) {
        match expression {
            Expr::Ident(_) | Expr::Lit(_) | Expr::This(_) | Expr::MetaProp(_) => {}

            Expr::Paren(paren) => self.walk_expression(&paren.expr),

            Expr::Fn(function) => self.walk_function_expression(
                function.ident.as_ref().map(|ident| ident.span),
                &function.function,
            ),

            Expr::Assign(assign) => {
                self.enter(NodeKind::AssignmentExpression, assign.span);
                self.walk_expression(&assign.right);
                self.exit();
            }

            Expr::Object(object) => {
                self.enter(NodeKind::Other, object.span);
                for prop in &object.props {
                    match prop {
                        PropOrSpread::Prop(prop) => self.walk_property(prop),
                        PropOrSpread::Spread(spread) => self.walk_expression(&spread.expr),
                    }
                }
                self.exit();
            }

            Expr::Class(class) => self.walk_class(&class.class),

            Expr::Arrow(arrow) => {
                self.enter(NodeKind::Other, arrow.span);
                for param in &arrow.params {
                    self.walk_pattern(param);
                }
                let body: &BlockStmtOrExpr = &arrow.body;
                match body {
                    BlockStmtOrExpr::BlockStmt(block) => self.walk_block(block),
                    BlockStmtOrExpr::Expr(e) => self.walk_expression(e),
                }
                self.exit();
            }

            other => {
                self.enter(NodeKind::Other, other.span());
                match other {
                    Expr::Array(array) => {
                        for elem in array.elems.iter().flatten() {
                            self.walk_expression(&elem.expr);
                        }
                    }
                    Expr::Unary(unary) => self.walk_expression(&unary.arg),
                    Expr::Update(update) => self.walk_expression(&update.arg),
                    Expr::Bin(bin) => {
                        self.walk_expression(&bin.left);
                        self.walk_expression(&bin.right);
                    }
                    Expr::Member(member) => self.walk_member(member),
                    Expr::OptChain(chain) => self.walk_opt_chain(&chain.base),
                    Expr::SuperProp(prop) => {
                        if let SuperProp::Computed(computed) = &prop.prop {
                            self.walk_expression(&computed.expr);
                        }
                    }
                    Expr::JSXElement(element) => self.walk_jsx_element(element),
                    Expr::JSXFragment(fragment) => self.walk_jsx_children(&fragment.children),
                    Expr::Cond(cond) => {
                        self.walk_expression(&cond.test);
                        self.walk_expression(&cond.cons);
                        self.walk_expression(&cond.alt);
                    }
                    Expr::Call(call) => {
                        if let Callee::Expr(callee) = &call.callee {
                            self.walk_expression(callee);
                        }
                        self.walk_arguments(&call.args);
                    }
                    Expr::New(new) => {
                        self.walk_expression(&new.callee);
                        if let Some(args) = &new.args {
                            self.walk_arguments(args);
                        }
                    }
                    Expr::Seq(seq) => {
                        for e in &seq.exprs {
                            self.walk_expression(e);
                        }
                    }
                    Expr::Tpl(tpl) => {
                        for e in &tpl.exprs {
                            self.walk_expression(e);
                        }
                    }
                    Expr::TaggedTpl(tagged) => {
                        self.walk_expression(&tagged.tag);
                        for e in &tagged.tpl.exprs {
                            self.walk_expression(e);
                        }
                    }
                    Expr::Yield(yield_) => {
                        if let Some(arg) = &yield_.arg {
                            self.walk_expression(arg);
                        }
                    }
                    Expr::Await(await_) => self.walk_expression(&await_.arg),
                    Expr::TsAs(cast) => self.walk_expression(&cast.expr),
                    Expr::TsTypeAssertion(cast) => self.walk_expression(&cast.expr),
                    Expr::TsNonNull(non_null) => self.walk_expression(&non_null.expr),
                    Expr::TsConstAssertion(cast) => self.walk_expression(&cast.expr),
                    _ => {}
                }
                self.exit();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::*;
    use crate::tree::NodeKind;

    #[test]
    fn empty() {
        let doc = parse_helper("");
        assert_eq!(doc.tree().len(), 1);
        assert!(doc.tree().comments().is_empty());
    }

    #[test]
    fn function_declaration() {
        let source = "function foo(x, y) { return x; }";
        let doc = parse_helper(source);
        let (id, parts) = find_function(&doc, "function foo");

        assert!(matches!(
            doc.tree().node(id).kind,
            NodeKind::FunctionDeclaration(_)
        ));
        assert_eq!(doc.slice(parts.body), "{ return x; }");
        let params: Vec<&str> = parts.params.iter().map(|p| doc.slice(*p)).collect();
        assert_eq!(params, vec!["x", "y"]);
        assert_eq!(&source[parts.signature_start..parts.signature_start + 1], "(");
        assert!(doc.tree().identifier_child(id).is_some());
    }

    #[test]
    fn parenthesised_function_has_assignment_parent() {
        let doc = parse_helper("a.b = (function (x) {});");
        let (id, _) = find_function(&doc, "function (x)");
        let parent = doc.tree().node(id).parent.unwrap();
        assert_eq!(
            doc.tree().node(parent).kind,
            NodeKind::AssignmentExpression
        );
    }

    #[test]
    fn object_methods_are_properties() {
        let doc =
            parse_helper("var o = { a: function (x) {}, b(y) {}, get c() { return 1; }, d: 2 };");
        let properties: Vec<(bool, bool, &str)> = nodes(&doc)
            .filter_map(|id| match &doc.tree().node(id).kind {
                NodeKind::Property { function, method } => Some((
                    function.is_some(),
                    *method,
                    doc.slice(doc.tree().node(id).range),
                )),
                _ => None,
            })
            .collect();

        assert_eq!(
            properties,
            vec![
                (true, false, "a: function (x) {}"),
                (true, true, "b(y) {}"),
                (true, true, "get c() { return 1; }"),
                (false, false, "d: 2"),
            ]
        );
        assert!(!nodes(&doc)
            .any(|id| matches!(doc.tree().node(id).kind, NodeKind::FunctionExpression(_))));
    }

    #[test]
    fn class_members() {
        let doc =
            parse_helper("class Foo {\n  constructor(a) { this.a = a; }\n  m(b) { return b; }\n}");
        let methods: Vec<(bool, &str)> = nodes(&doc)
            .filter_map(|id| match &doc.tree().node(id).kind {
                NodeKind::MethodDefinition { constructor, .. } => {
                    Some((*constructor, doc.slice(doc.tree().node(id).range)))
                }
                _ => None,
            })
            .collect();

        assert_eq!(
            methods,
            vec![
                (true, "constructor(a) { this.a = a; }"),
                (false, "m(b) { return b; }"),
            ]
        );
    }

    #[test]
    fn variable_declarators() {
        let doc = parse_helper("var a = 1, b = function () {};");
        let ids: Vec<&str> = nodes(&doc)
            .filter_map(|id| match doc.tree().node(id).kind {
                NodeKind::VariableDeclarator { id } => Some(doc.slice(id)),
                _ => None,
            })
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn comments_are_collected_and_attached() {
        let source = "/* @flow */\n/** doc */\nvar x = 1; // trailing\n";
        let doc = parse_helper(source);
        let comments: Vec<&str> = doc
            .tree()
            .comments()
            .iter()
            .map(|c| doc.slice(c.range))
            .collect();
        assert_eq!(comments, vec!["/* @flow */", "/** doc */", "// trailing"]);

        let declaration = nodes(&doc)
            .find(|id| doc.tree().node(*id).kind == NodeKind::VariableDeclaration)
            .unwrap();
        assert_eq!(doc.tree().leading_comments(declaration).len(), 2);

        let comment_leaves = doc
            .tree()
            .node(doc.tree().root())
            .children
            .iter()
            .filter(|id| matches!(doc.tree().node(**id).kind, NodeKind::Comment(_)))
            .count();
        assert_eq!(comment_leaves, 3);
    }

    #[test]
    fn functions_below_optional_chains_and_jsx() {
        let doc = parse_helper(
            "a?.b(function (x) {});\nc?.[function (y) {}];\nvar el = <b onClick={function (e) {}}>{function (z) {}}<>{[function (w) {}]}</></b>;",
        );
        for prefix in [
            "function (x)",
            "function (y)",
            "function (e)",
            "function (z)",
            "function (w)",
        ] {
            let (id, _) = find_function(&doc, prefix);
            assert!(matches!(
                doc.tree().node(id).kind,
                NodeKind::FunctionExpression(_)
            ));
        }
    }

    #[test]
    fn defaults_inside_destructuring() {
        let doc = parse_helper(
            "function f({ a = function (x) {}, b: [c = function (y) {}] }, ...[d = function (z) {}]) {}\nvar { e = function (w) {} } = {};",
        );
        for prefix in ["function (x)", "function (y)", "function (z)", "function (w)"] {
            find_function(&doc, prefix);
        }
    }

    #[test]
    fn parse_error() {
        let err = crate::parse::parse("function (", &Default::default()).unwrap_err();
        assert!(!err.is_structural());
    }
}
