//! Recursive-descent parser for annotated declarations.
//!
//! The grammar is the restricted subset of C++ found in the engine headers:
//! classes, structs, unions and enums with their methods and fields. Inline
//! bodies, templates, operators and friends are stepped over by bracket
//! matching. Any token the grammar does not expect aborts the file.

use smol_str::SmolStr;
use typegen_common::{SourceFile, SourceId};
use typegen_model::{
    Annotations, FieldInfo, Graph, Member, MemberId, MemberKind, MethodInfo, Parameter, TypeInfo,
    TypeKind, TypeReference, Visibility,
};

use crate::error::{ParseError, Result};
use crate::lexer::tokenize;
use crate::stream::TokenStream;
use crate::token::{Token, TokenKind};

/// Side-channel output of one header.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HeaderOutput {
    /// `typedef` declarations annotated `CBindingRequisite`, verbatim.
    pub typedefs: Vec<String>,
}

/// Parse `source` into `graph`.
///
/// `skip` lists macro-like identifiers (export markers) that are dropped
/// from the token stream.
pub fn parse_header(graph: &mut Graph, source: &SourceFile, skip: &[String]) -> Result<HeaderOutput> {
    tracing::debug!(file = %source.path.display(), "parsing header");
    let tokens = tokenize(&source.path, &source.content)?;
    let stream = TokenStream::new(&source.path, &source.content, tokens, skip);
    let mut parser = Parser {
        graph,
        tokens: stream,
        source: source.id,
        output: HeaderOutput::default(),
    };
    let root = parser.graph.root();
    parser.parse_scope(root, None, Visibility::Public, false)?;
    Ok(parser.output)
}

/// Keywords that may precede a member's type.
#[derive(Debug, Default, Clone, Copy)]
struct Qualifiers {
    is_const: bool,
    is_virtual: bool,
    is_static: bool,
    is_extern: bool,
}

const MULTI_WORD_BUILTINS: &[&str] = &["unsigned", "signed", "long", "short"];
const BUILTIN_TAILS: &[&str] = &["int", "char", "double"];

struct Parser<'a, 'g> {
    graph: &'g mut Graph,
    tokens: TokenStream<'a>,
    source: SourceId,
    output: HeaderOutput,
}

impl<'a, 'g> Parser<'a, 'g> {
    /// Parse declarations into `scope` until its closing `}` (when `nested`)
    /// or end of input.
    fn parse_scope(
        &mut self,
        scope: MemberId,
        enclosing: Option<MemberId>,
        mut visibility: Visibility,
        nested: bool,
    ) -> Result<()> {
        let mut pending = Annotations::new();
        loop {
            let Some(token) = self.tokens.peek().cloned() else {
                if nested {
                    return Err(self.tokens.unexpected("'}'"));
                }
                return Ok(());
            };

            match token.kind {
                TokenKind::CommentProperty => {
                    self.tokens.next("annotation")?;
                    pending = self.annotations(&token)?;
                    continue;
                }
                TokenKind::Punctuation if token.is_punct('}') => {
                    if !nested {
                        return Err(self.tokens.unexpected("declaration"));
                    }
                    self.tokens.next("'}'")?;
                    return Ok(());
                }
                TokenKind::Punctuation if token.is_punct(';') => {
                    self.tokens.next("';'")?;
                    continue;
                }
                TokenKind::Identifier => {}
                _ => return Err(self.tokens.unexpected("declaration")),
            }

            let annotations = std::mem::take(&mut pending);
            match token.value.as_str() {
                "public" | "protected" | "private"
                    if self.tokens.peek_at(1).is_some_and(|t| t.is_punct(':')) =>
                {
                    self.tokens.next("access specifier")?;
                    self.tokens.expect_punct(':')?;
                    visibility = match token.value.as_str() {
                        "public" => Visibility::Public,
                        "protected" => Visibility::Protected,
                        _ => Visibility::Private,
                    };
                }
                "namespace" => self.parse_namespace(scope, enclosing, visibility)?,
                "extern"
                    if self
                        .tokens
                        .peek_at(1)
                        .is_some_and(|t| t.kind == TokenKind::Literal) =>
                {
                    self.tokens.next("extern")?;
                    self.tokens.next("linkage")?;
                    if self.tokens.accept_punct('{') {
                        self.parse_scope(scope, enclosing, visibility, true)?;
                    } else {
                        // Single-declaration linkage; the annotation belongs
                        // to what follows.
                        pending = annotations;
                    }
                }
                "template" => {
                    self.tokens.next("template")?;
                    if self.tokens.at_punct('<') {
                        self.tokens.template_arguments()?;
                    }
                    self.tokens.skip_declaration()?;
                }
                "friend" => self.tokens.skip_declaration()?,
                "using" => {
                    self.tokens.skip_to_semicolon()?;
                }
                "typedef" => self.parse_typedef(&token, &annotations)?,
                "class" | "struct" | "union" if self.is_type_definition() => {
                    let kind = match token.value.as_str() {
                        "class" => TypeKind::Class,
                        "struct" => TypeKind::Struct,
                        _ => TypeKind::Union,
                    };
                    self.parse_type(scope, kind, annotations, visibility)?;
                }
                "class" | "struct" | "union" if self.is_forward_declaration() => {
                    self.tokens.skip_to_semicolon()?;
                }
                "enum" if self.is_type_definition() => {
                    self.parse_enum(scope, annotations, visibility)?;
                }
                "enum" if self.is_forward_declaration() => {
                    self.tokens.skip_to_semicolon()?;
                }
                _ => self.parse_member(scope, enclosing, annotations, visibility)?,
            }
        }
    }

    fn annotations(&self, token: &Token) -> Result<Annotations> {
        Annotations::parse(&token.value).map_err(|source| ParseError::Annotation {
            location: self.tokens.location_of(token),
            source,
        })
    }

    fn add(&mut self, parent: MemberId, member: Member, line: u32) -> Result<MemberId> {
        let member = member.at(Some(self.source), line);
        self.graph
            .add_child(parent, member)
            .map_err(|source| ParseError::Graph {
                location: self.tokens.location_at(line),
                source,
            })
    }

    /// After a `class`/`struct`/`union`/`enum` keyword: is a body coming?
    fn is_type_definition(&self) -> bool {
        let mut ahead = 1;
        if self.tokens.peek_at(ahead).is_some_and(|t| t.is_ident("class")) {
            ahead += 1;
        }
        if self
            .tokens
            .peek_at(ahead)
            .is_some_and(|t| t.kind == TokenKind::Identifier)
        {
            ahead += 1;
        }
        self.tokens
            .peek_at(ahead)
            .is_some_and(|t| t.is_punct('{') || (t.is_punct(':') && !self.is_scope_at(ahead)))
    }

    fn is_scope_at(&self, ahead: usize) -> bool {
        self.tokens.peek_at(ahead + 1).is_some_and(|t| t.is_punct(':'))
    }

    /// `struct Foo;`
    fn is_forward_declaration(&self) -> bool {
        self.tokens
            .peek_at(1)
            .is_some_and(|t| t.kind == TokenKind::Identifier)
            && self.tokens.peek_at(2).is_some_and(|t| t.is_punct(';'))
    }

    fn parse_namespace(
        &mut self,
        scope: MemberId,
        enclosing: Option<MemberId>,
        visibility: Visibility,
    ) -> Result<()> {
        self.tokens.next("namespace")?;
        loop {
            if self.tokens.at_scope_separator() {
                self.tokens.next("':'")?;
                self.tokens.next("':'")?;
            } else if self.tokens.at_kind(TokenKind::Identifier) {
                self.tokens.next("namespace name")?;
            } else {
                break;
            }
        }
        if self.tokens.accept_punct('=') {
            self.tokens.skip_to_semicolon()?;
            return Ok(());
        }
        self.tokens.expect_punct('{')?;
        self.parse_scope(scope, enclosing, visibility, true)
    }

    fn parse_typedef(&mut self, first: &Token, annotations: &Annotations) -> Result<()> {
        self.tokens.next("typedef")?;
        let last = self.tokens.skip_to_semicolon()?;
        if annotations.contains("CBindingRequisite") {
            let text = self.tokens.text_between(first, &last);
            self.output.typedefs.push(text);
        }
        Ok(())
    }

    fn parse_type(
        &mut self,
        scope: MemberId,
        kind: TypeKind,
        annotations: Annotations,
        visibility: Visibility,
    ) -> Result<()> {
        let keyword = self.tokens.next("type keyword")?;
        let name = match self.tokens.peek() {
            Some(t) if t.kind == TokenKind::Identifier => self.tokens.next("type name")?.value,
            _ => String::new(),
        };

        let mut base = None;
        if self.tokens.accept_punct(':') {
            base = self.parse_base_list(kind)?;
        }

        let mut info = TypeInfo::new(kind).with_base(base);
        info.include_in_kinds = annotations.flag("IncludeInKinds");
        if let Some(list) = annotations.value("Implements") {
            info.interfaces = list
                .split(';')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(TypeReference::named)
                .collect();
        }

        let member = Member::new(name.as_str(), MemberKind::Type(info))
            .with_annotations(annotations)
            .with_visibility(visibility);
        let id = self.add(scope, member, keyword.line)?;

        self.tokens.expect_punct('{')?;
        let default_visibility = match kind {
            TypeKind::Class => Visibility::Private,
            _ => Visibility::Public,
        };
        self.parse_scope(id, Some(id), default_visibility, true)?;
        self.parse_trailing_declarators(scope, &name, visibility)
    }

    /// `: public Base, private Other` up to (not including) the `{`.
    ///
    /// The first public base is modelled; the rest are consumed.
    fn parse_base_list(&mut self, kind: TypeKind) -> Result<Option<TypeReference>> {
        let mut modelled = None;
        loop {
            let mut access = match kind {
                TypeKind::Class => Visibility::Private,
                _ => Visibility::Public,
            };
            loop {
                if self.tokens.accept_ident("virtual") {
                    continue;
                }
                if self.tokens.accept_ident("public") {
                    access = Visibility::Public;
                } else if self.tokens.accept_ident("protected") {
                    access = Visibility::Protected;
                } else if self.tokens.accept_ident("private") {
                    access = Visibility::Private;
                } else {
                    break;
                }
            }
            let base = self.parse_type_reference()?;
            if modelled.is_none() && access == Visibility::Public {
                modelled = Some(base);
            } else {
                tracing::debug!(base = %base, "additional base class not modelled");
            }
            if !self.tokens.accept_punct(',') {
                break;
            }
        }
        if !self.tokens.at_punct('{') {
            return Err(self.tokens.unexpected("'{'"));
        }
        Ok(modelled)
    }

    /// After the `}` of a type body: `} name, *other;` or just `};`.
    fn parse_trailing_declarators(
        &mut self,
        scope: MemberId,
        type_name: &str,
        visibility: Visibility,
    ) -> Result<()> {
        if self.tokens.accept_punct(';') {
            return Ok(());
        }
        if type_name.is_empty() {
            // Members of an anonymous type have nowhere to point.
            self.tokens.skip_to_semicolon()?;
            return Ok(());
        }
        let ty = TypeReference::named(type_name);
        self.parse_field_declarators(scope, ty, Qualifiers::default(), Annotations::new(), visibility)
    }

    fn parse_enum(
        &mut self,
        scope: MemberId,
        annotations: Annotations,
        visibility: Visibility,
    ) -> Result<()> {
        let keyword = self.tokens.next("enum")?;
        self.tokens.accept_ident("class");
        let name = match self.tokens.peek() {
            Some(t) if t.kind == TokenKind::Identifier => self.tokens.next("enum name")?.value,
            _ => String::new(),
        };
        if self.tokens.accept_punct(':') {
            // Underlying type.
            self.parse_type_reference()?;
        }

        let mut info = TypeInfo::new(TypeKind::Enum);
        info.include_in_kinds = annotations.flag("IncludeInKinds");
        let member = Member::new(name.as_str(), MemberKind::Type(info))
            .with_annotations(annotations)
            .with_visibility(visibility);
        let id = self.add(scope, member, keyword.line)?;

        self.tokens.expect_punct('{')?;
        let mut pending = Annotations::new();
        loop {
            if self.tokens.accept_punct('}') {
                break;
            }
            if let Some(token) = self.tokens.peek().cloned() {
                if token.kind == TokenKind::CommentProperty {
                    self.tokens.next("annotation")?;
                    pending = self.annotations(&token)?;
                    continue;
                }
            }
            let field = self.tokens.expect_identifier("enumerator")?;
            let value = if self.tokens.accept_punct('=') {
                self.tokens.capture_until(&[',', '}'], "enumerator value")?
            } else {
                None
            };
            let info = FieldInfo {
                ty: TypeReference::named(name.as_str()),
                is_const: true,
                is_static: true,
                value,
                ..FieldInfo::default()
            };
            let member = Member::new(field.value.as_str(), MemberKind::Field(info))
                .with_annotations(std::mem::take(&mut pending));
            self.add(id, member, field.line)?;
            if !self.tokens.accept_punct(',') && !self.tokens.at_punct('}') {
                return Err(self.tokens.unexpected("',' or '}'"));
            }
        }
        self.parse_trailing_declarators(scope, &name, visibility)
    }

    fn parse_qualifiers(&mut self) -> Qualifiers {
        let mut q = Qualifiers::default();
        loop {
            if self.tokens.accept_ident("virtual") {
                q.is_virtual = true;
            } else if self.tokens.accept_ident("const") {
                q.is_const = true;
            } else if self.tokens.accept_ident("static") {
                q.is_static = true;
            } else if self.tokens.accept_ident("extern") {
                q.is_extern = true;
            } else if self.tokens.accept_ident("inline")
                || self.tokens.accept_ident("explicit")
                || self.tokens.accept_ident("mutable")
                || self.tokens.accept_ident("constexpr")
            {
            } else {
                return q;
            }
        }
    }

    /// A method, constructor, destructor or field list.
    fn parse_member(
        &mut self,
        scope: MemberId,
        enclosing: Option<MemberId>,
        annotations: Annotations,
        visibility: Visibility,
    ) -> Result<()> {
        let line = self.tokens.location().line;
        let qualifiers = self.parse_qualifiers();

        if self.tokens.accept_punct('~') {
            let name = self.tokens.expect_identifier("destructor name")?;
            let info = MethodInfo {
                return_type: TypeReference::void(),
                is_destructor: true,
                is_virtual: qualifiers.is_virtual,
                ..MethodInfo::default()
            };
            return self.parse_method(scope, name.value.as_str(), info, annotations, visibility, line);
        }

        if let Some(owner) = enclosing {
            let owner_name = self.graph.get(owner).name.clone();
            let is_constructor = self.tokens.at_ident(&owner_name)
                && self.tokens.peek_at(1).is_some_and(|t| t.is_punct('('));
            if is_constructor {
                self.tokens.next("constructor name")?;
                let info = MethodInfo {
                    return_type: TypeReference::void(),
                    is_constructor: true,
                    ..MethodInfo::default()
                };
                return self.parse_method(scope, &owner_name, info, annotations, visibility, line);
            }
        }

        if self.tokens.at_ident("operator") {
            return self.tokens.skip_declaration();
        }

        let mut ty = self.parse_type_reference()?;
        ty.is_const |= qualifiers.is_const;

        if self.tokens.at_ident("operator") {
            return self.tokens.skip_declaration();
        }
        if self.tokens.at_punct('(') && self.tokens.peek_at(1).is_some_and(|t| t.is_punct('*')) {
            // Function-pointer field.
            self.tokens.skip_to_semicolon()?;
            return Ok(());
        }

        let is_method = self.tokens.at_kind(TokenKind::Identifier)
            && self.tokens.peek_at(1).is_some_and(|t| t.is_punct('('));
        if is_method {
            let name = self.tokens.next("method name")?;
            let info = MethodInfo {
                return_type: ty,
                is_virtual: qualifiers.is_virtual,
                is_static: qualifiers.is_static,
                ..MethodInfo::default()
            };
            return self.parse_method(scope, name.value.as_str(), info, annotations, visibility, line);
        }

        self.parse_field_declarators(scope, ty, qualifiers, annotations, visibility)
    }

    /// Parameters and tail of a method whose name has been consumed.
    fn parse_method(
        &mut self,
        scope: MemberId,
        name: &str,
        mut info: MethodInfo,
        annotations: Annotations,
        visibility: Visibility,
        line: u32,
    ) -> Result<()> {
        self.tokens.expect_punct('(')?;
        let (params, is_variadic) = self.parse_parameters()?;
        info.params = params;
        info.is_variadic = is_variadic;

        loop {
            if self.tokens.accept_ident("const") {
                info.is_const = true;
            } else if self.tokens.accept_ident("throw") {
                self.tokens.expect_punct('(')?;
                self.tokens.skip_balanced('(', ')')?;
            } else if self.tokens.accept_ident("override")
                || self.tokens.accept_ident("final")
                || self.tokens.accept_ident("noexcept")
            {
            } else {
                break;
            }
        }

        if self.tokens.accept_punct('=') {
            let value = self.tokens.expect_identifier("'0', 'default' or 'delete'")?;
            match value.value.as_str() {
                "0" => info.is_abstract = true,
                "default" | "delete" => {}
                _ => {
                    return Err(ParseError::Unexpected {
                        location: self.tokens.location_of(&value),
                        found: value.value,
                        expected: "'0', 'default' or 'delete'".to_string(),
                    })
                }
            }
            self.tokens.expect_punct(';')?;
        } else if self.tokens.accept_punct(':') {
            // Constructor initializer list, then the body.
            loop {
                self.parse_type_reference()?;
                if self.tokens.accept_punct('(') {
                    self.tokens.skip_balanced('(', ')')?;
                } else {
                    self.tokens.expect_punct('{')?;
                    self.tokens.skip_balanced('{', '}')?;
                }
                if !self.tokens.accept_punct(',') {
                    break;
                }
            }
            self.tokens.expect_punct('{')?;
            self.tokens.skip_balanced('{', '}')?;
            self.tokens.accept_punct(';');
        } else if self.tokens.accept_punct('{') {
            self.tokens.skip_balanced('{', '}')?;
            self.tokens.accept_punct(';');
        } else {
            self.tokens.expect_punct(';')?;
        }

        let member = Member::new(name, MemberKind::Method(info))
            .with_annotations(annotations)
            .with_visibility(visibility);
        self.add(scope, member, line)?;
        Ok(())
    }

    /// Parameter list after the opening `(`, through the closing `)`.
    fn parse_parameters(&mut self) -> Result<(Vec<Parameter>, bool)> {
        let mut params = Vec::new();
        if self.tokens.accept_punct(')') {
            return Ok((params, false));
        }
        if self.tokens.at_ident("void") && self.tokens.peek_at(1).is_some_and(|t| t.is_punct(')')) {
            self.tokens.next("void")?;
            self.tokens.next("')'")?;
            return Ok((params, false));
        }

        loop {
            let mut annotations = Annotations::new();
            if let Some(token) = self.tokens.peek().cloned() {
                if token.kind == TokenKind::CommentProperty {
                    self.tokens.next("annotation")?;
                    annotations = self.annotations(&token)?;
                }
            }

            if self.tokens.at_punct('.') {
                for _ in 0..3 {
                    self.tokens.expect_punct('.')?;
                }
                self.tokens.expect_punct(')')?;
                return Ok((params, true));
            }

            let mut ty = self.parse_type_reference()?;
            let mut name = SmolStr::default();

            if self.tokens.at_punct('(') && self.tokens.peek_at(1).is_some_and(|t| t.is_punct('*')) {
                // Callback parameter: `void (*cb) (int)` is passed as a pointer.
                self.tokens.next("'('")?;
                self.tokens.next("'*'")?;
                if self.tokens.at_kind(TokenKind::Identifier) {
                    name = SmolStr::new(self.tokens.next("parameter name")?.value);
                }
                self.tokens.expect_punct(')')?;
                self.tokens.expect_punct('(')?;
                self.tokens.skip_balanced('(', ')')?;
                ty = TypeReference::pointer_to("void");
            } else if self.tokens.at_kind(TokenKind::Identifier) {
                name = SmolStr::new(self.tokens.next("parameter name")?.value);
            }
            while self.tokens.accept_punct('[') {
                self.tokens.skip_balanced('[', ']')?;
                ty.pointer_depth += 1;
            }

            let mut param = Parameter::new(name, ty);
            if self.tokens.accept_punct('=') {
                param.default = self.tokens.capture_until(&[',', ')'], "default argument")?;
            }
            param.ty.is_out = annotations.contains("out");
            param.ty.is_ref = annotations.contains("ref");
            param.annotations = annotations;
            params.push(param);

            if self.tokens.accept_punct(')') {
                return Ok((params, false));
            }
            self.tokens.expect_punct(',')?;
        }
    }

    /// `type a, *b = 1, c[4], d : 3;`
    fn parse_field_declarators(
        &mut self,
        scope: MemberId,
        base: TypeReference,
        qualifiers: Qualifiers,
        annotations: Annotations,
        visibility: Visibility,
    ) -> Result<()> {
        loop {
            let mut ty = base.clone();
            while self.tokens.accept_punct('*') {
                ty.pointer_depth += 1;
            }
            if self.tokens.accept_punct('&') {
                ty.is_reference = true;
            }
            self.tokens.accept_ident("const");

            let name = self.tokens.expect_identifier("field name")?;
            let mut info = FieldInfo {
                is_const: ty.is_const,
                is_static: qualifiers.is_static,
                is_extern: qualifiers.is_extern,
                ..FieldInfo::default()
            };

            if self.tokens.accept_punct('[') {
                info.array = self.tokens.capture_until(&[']'], "array extent")?;
                self.tokens.expect_punct(']')?;
                while self.tokens.accept_punct('[') {
                    self.tokens.skip_balanced('[', ']')?;
                }
            }
            if self.tokens.accept_punct(':') {
                info.bits = self.tokens.capture_until(&[',', ';'], "bit-field width")?;
            }
            if self.tokens.accept_punct('=') {
                info.value = self.tokens.capture_until(&[',', ';'], "initializer")?;
            } else if self.tokens.at_punct('{') {
                info.value = self.tokens.capture_until(&[',', ';'], "initializer")?;
            }
            info.ty = ty;

            let member = Member::new(name.value.as_str(), MemberKind::Field(info))
                .with_annotations(annotations.clone())
                .with_visibility(visibility);
            self.add(scope, member, name.line)?;

            if self.tokens.accept_punct(';') {
                return Ok(());
            }
            self.tokens.expect_punct(',')?;
        }
    }

    /// `const unsigned int`, `Type::Kind`, `List<Foo *> *`, `struct _X &`.
    fn parse_type_reference(&mut self) -> Result<TypeReference> {
        let mut ty = TypeReference::default();
        let mut words: Vec<String> = Vec::new();

        loop {
            if self.tokens.accept_ident("const") {
                ty.is_const = true;
            } else if self.tokens.accept_ident("volatile")
                || self.tokens.accept_ident("struct")
                || self.tokens.accept_ident("class")
                || self.tokens.accept_ident("union")
                || self.tokens.accept_ident("enum")
                || self.tokens.accept_ident("typename")
            {
            } else {
                break;
            }
        }

        while let Some(word) = self
            .tokens
            .peek()
            .filter(|t| t.kind == TokenKind::Identifier && MULTI_WORD_BUILTINS.contains(&t.value.as_str()))
            .map(|t| t.value.clone())
        {
            self.tokens.next("type")?;
            words.push(word);
        }

        if words.is_empty() {
            let mut name = String::new();
            if self.tokens.at_scope_separator() {
                self.tokens.next("':'")?;
                self.tokens.next("':'")?;
            }
            name.push_str(&self.tokens.expect_identifier("type")?.value);
            while self.tokens.at_scope_separator() {
                self.tokens.next("':'")?;
                self.tokens.next("':'")?;
                name.push_str("::");
                name.push_str(&self.tokens.expect_identifier("qualified name")?.value);
            }
            ty.name = SmolStr::new(name);
        } else {
            if let Some(tail) = self
                .tokens
                .peek()
                .filter(|t| t.kind == TokenKind::Identifier && BUILTIN_TAILS.contains(&t.value.as_str()))
                .map(|t| t.value.clone())
            {
                self.tokens.next("type")?;
                words.push(tail);
            }
            ty.name = SmolStr::new(words.join(" "));
        }

        if self.tokens.at_punct('<') {
            ty.template_args = Some(self.tokens.template_arguments()?);
        }

        loop {
            if self.tokens.accept_ident("const") {
                if ty.pointer_depth == 0 {
                    ty.is_const = true;
                }
            } else if self.tokens.accept_punct('*') {
                ty.pointer_depth += 1;
            } else if self.tokens.accept_punct('&') {
                ty.is_reference = true;
            } else {
                return Ok(ty);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use typegen_common::SourceMap;

    fn parse(text: &str) -> (Graph, HeaderOutput) {
        let mut graph = Graph::new();
        let out = try_parse(&mut graph, text).unwrap();
        (graph, out)
    }

    fn try_parse(graph: &mut Graph, text: &str) -> Result<HeaderOutput> {
        let mut sources = SourceMap::new();
        let id = sources.add_file(PathBuf::from("test.h"), text.to_string());
        let file = sources.get(id).unwrap();
        parse_header(graph, file, &["MOON_API".to_string()])
    }

    fn method<'g>(graph: &'g Graph, ty: &str, name: &str) -> &'g MethodInfo {
        let ty = graph.find_type(ty).unwrap();
        graph
            .methods(ty)
            .into_iter()
            .map(|m| graph.get(m))
            .find(|m| m.name == name)
            .and_then(|m| m.as_method())
            .unwrap()
    }

    #[test]
    fn test_class_with_base_and_members() {
        let (graph, _) = parse(
            "/* @Namespace=System.Windows */\n\
             class MOON_API Widget : public Control {\n\
             public:\n\
                 Widget ();\n\
                 virtual ~Widget () {}\n\
                 int GetWidth () const;\n\
                 static int WidthProperty;\n\
             };",
        );
        let widget = graph.find_type("Widget").unwrap();
        let info = graph.type_info(widget).unwrap();
        assert_eq!(info.base.as_ref().unwrap().name, "Control");
        assert_eq!(graph.get(widget).annotations.value("Namespace"), Some("System.Windows"));

        assert!(method(&graph, "Widget", "Widget").is_constructor);
        let getter = method(&graph, "Widget", "GetWidth");
        assert!(getter.is_const);
        assert_eq!(getter.return_type.name, "int");

        let field = graph.fields(widget)[0];
        assert_eq!(graph.get(field).name, "WidthProperty");
        assert!(graph.get(field).as_field().unwrap().is_static);
    }

    #[test]
    fn test_only_first_public_base_is_modelled() {
        let (graph, _) = parse("class A : private Hidden, public B, public C { };");
        let a = graph.find_type("A").unwrap();
        assert_eq!(graph.type_info(a).unwrap().base.as_ref().unwrap().name, "B");
    }

    #[test]
    fn test_class_default_visibility_is_private() {
        let (graph, _) = parse("class A { void Hidden (); public: void Shown (); };\nstruct S { int x; };");
        let a = graph.find_type("A").unwrap();
        let vis: Vec<_> = graph
            .methods(a)
            .into_iter()
            .map(|m| (graph.get(m).name.to_string(), graph.get(m).visibility))
            .collect();
        assert!(vis.contains(&("Hidden".to_string(), Visibility::Private)));
        assert!(vis.contains(&("Shown".to_string(), Visibility::Public)));
        let s = graph.find_type("S").unwrap();
        assert_eq!(graph.get(graph.fields(s)[0]).visibility, Visibility::Public);
    }

    #[test]
    fn test_enum_values_are_captured_as_text() {
        let (graph, _) = parse("enum Flags { None = 0, A = 1 << 2, B, };");
        let flags = graph.find_type("Flags").unwrap();
        let values: Vec<_> = graph
            .children(flags)
            .map(|f| {
                let m = graph.get(f);
                (m.name.to_string(), m.as_field().unwrap().value.clone())
            })
            .collect();
        assert_eq!(
            values,
            vec![
                ("None".to_string(), Some("0".to_string())),
                ("A".to_string(), Some("1 << 2".to_string())),
                ("B".to_string(), None),
            ]
        );
    }

    #[test]
    fn test_pure_virtual_and_parameters() {
        let (graph, _) = parse(
            "class Shape {\npublic:\n virtual void Draw (cairo_t *cr, const char *name = \"x\", /* @out */ double *w) = 0;\n};",
        );
        let draw = method(&graph, "Shape", "Draw");
        assert!(draw.is_abstract);
        assert!(draw.is_virtual);
        assert_eq!(draw.params.len(), 3);
        assert_eq!(draw.params[0].ty.native(), "cairo_t *");
        assert_eq!(draw.params[1].ty.native(), "const char *");
        assert_eq!(draw.params[1].default.as_deref(), Some("\"x\""));
        assert!(draw.params[2].ty.is_out);
    }

    #[test]
    fn test_inline_bodies_and_initializers_skipped() {
        let (graph, _) = parse(
            "class A {\npublic:\n A () : x (0), y { 1 } { Init (); }\n int Get () { return x; }\n int x, *y;\n unsigned int flags : 3;\n};",
        );
        let a = graph.find_type("A").unwrap();
        assert_eq!(graph.methods(a).len(), 2);
        let names: Vec<_> = graph.fields(a).into_iter().map(|f| graph.get(f).name.to_string()).collect();
        assert_eq!(names, vec!["flags", "x", "y"]);
        let y = graph.fields(a)[2];
        assert_eq!(graph.get(y).as_field().unwrap().ty.pointer_depth, 1);
        let flags = graph.get(graph.fields(a)[0]).as_field().unwrap();
        assert_eq!(flags.ty.name, "unsigned int");
        assert_eq!(flags.bits.as_deref(), Some("3"));
    }

    #[test]
    fn test_operators_templates_friends_skipped() {
        let (graph, _) = parse(
            "template <typename T> class List { T *items; };\n\
             class A {\n\
                 friend class B;\n\
                 bool operator== (const A &other) const;\n\
                 operator bool () const { return true; }\n\
                 void (*callback) (int);\n\
                 using Base::Foo;\n\
             };",
        );
        assert!(graph.find_type("List").is_none());
        let a = graph.find_type("A").unwrap();
        assert_eq!(graph.children(a).count(), 0);
    }

    #[test]
    fn test_requisite_typedefs_are_retained() {
        let (_, out) = parse(
            "typedef int ignored;\n/* @CBindingRequisite */\ntypedef void (*Callback) (gpointer data);\n",
        );
        assert_eq!(out.typedefs, vec!["typedef void (*Callback) (gpointer data);".to_string()]);
    }

    #[test]
    fn test_namespaces_and_linkage_are_transparent() {
        let (graph, _) = parse(
            "G_BEGIN_DECLS\nnamespace Moonlight {\nextern \"C\" {\nvoid global_func (int x);\n}\nclass Inner { };\n}\nG_END_DECLS\n",
        );
        assert!(graph.find_type("Inner").is_some());
        let root = graph.root();
        let has_func = graph.methods(root).into_iter().any(|m| graph.get(m).name == "global_func");
        assert!(has_func);
    }

    #[test]
    fn test_anonymous_types_are_disambiguated() {
        let (graph, _) = parse("struct Outer { union { int a; double b; } u; struct { int c; }; };");
        let outer = graph.find_type("Outer").unwrap();
        let anon: Vec<_> = graph
            .children(outer)
            .filter(|c| graph.get(*c).is_anonymous())
            .collect();
        assert_eq!(anon.len(), 2);
    }

    #[test]
    fn test_qualified_and_template_types() {
        let (graph, _) = parse("class A {\npublic:\n Type::Kind GetKind ();\n List<Foo *> *GetItems ();\n};");
        assert_eq!(method(&graph, "A", "GetKind").return_type.name, "Type::Kind");
        let items = &method(&graph, "A", "GetItems").return_type;
        assert_eq!(items.template_args.as_deref(), Some("Foo *"));
        assert_eq!(items.pointer_depth, 1);
    }

    #[test]
    fn test_duplicate_member_is_error_with_location() {
        let mut graph = Graph::new();
        let err = try_parse(&mut graph, "class A {\n int x;\n int x;\n};").unwrap_err();
        assert!(matches!(err, ParseError::Graph { .. }));
        assert_eq!(err.location().line, 3);
    }

    #[test]
    fn test_overloads_coexist() {
        let (graph, _) = parse("class A { void F (int x); void F (double x); };");
        let a = graph.find_type("A").unwrap();
        assert_eq!(graph.methods(a).len(), 2);
    }

    #[test]
    fn test_missing_semicolon_is_error() {
        let mut graph = Graph::new();
        let err = try_parse(&mut graph, "class A { int x }").unwrap_err();
        assert!(matches!(err, ParseError::Unexpected { .. }));
    }

    #[test]
    fn test_unclosed_class_is_eof_error() {
        let mut graph = Graph::new();
        let err = try_parse(&mut graph, "class A { int x;").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEof { .. }));
    }

    #[test]
    fn test_duplicate_annotation_key_is_error() {
        let mut graph = Graph::new();
        let err = try_parse(&mut graph, "/* @A,A */ void f ();").unwrap_err();
        assert!(matches!(err, ParseError::Annotation { .. }));
        assert_eq!(err.location().line, 1);
    }

    #[test]
    fn test_forward_declarations_skipped() {
        let (graph, _) = parse("class Foo;\nstruct Bar;\nenum Baz;\nstruct Bar *make_bar (void);");
        assert!(graph.find_type("Foo").is_none());
        let root = graph.root();
        let make = graph.methods(root)[0];
        let info = graph.get(make).as_method().unwrap();
        assert_eq!(info.return_type.native(), "Bar *");
        assert!(info.params.is_empty());
    }

    #[test]
    fn test_implements_annotation() {
        let (graph, _) = parse("/* @Implements=IList;ICollection */\nclass C : public DependencyObject { };");
        let c = graph.find_type("C").unwrap();
        let names: Vec<_> = graph
            .type_info(c)
            .unwrap()
            .interfaces
            .iter()
            .map(|i| i.name.to_string())
            .collect();
        assert_eq!(names, vec!["IList", "ICollection"]);
    }
}
