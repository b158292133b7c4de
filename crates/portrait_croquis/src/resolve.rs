//! Declaration lookup.
//!
//! Analyzers never walk scopes themselves. They ask a [`Resolve`]
//! implementation for the declaration a name refers to, which for real
//! sources is [`SemanticResolver`] over `oxc_semantic`.

use oxc_ast::ast::{Class, Function, TSInterfaceDeclaration, TSTypeAliasDeclaration, VariableDeclarator};
use oxc_ast::AstKind;
use oxc_semantic::{ScopeId, Semantic};

/// What an imported binding names in its source module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Imported<'a> {
    Default,
    Named(&'a str),
    Namespace,
}

#[derive(Debug, Clone, Copy)]
pub struct ImportBinding<'a> {
    pub imported: Imported<'a>,
    pub source: &'a str,
}

/// The declaration a name resolves to.
#[derive(Debug, Clone, Copy)]
pub enum Binding<'a> {
    Variable(&'a VariableDeclarator<'a>),
    Function(&'a Function<'a>),
    Class(&'a Class<'a>),
    Import(ImportBinding<'a>),
    TypeAlias(&'a TSTypeAliasDeclaration<'a>),
    Interface(&'a TSInterfaceDeclaration<'a>),
    /// Declared, but by something the engine does not look into (parameters, catch clauses)
    Other,
}

impl<'a> Binding<'a> {
    #[inline]
    pub fn is_import(&self) -> bool {
        matches!(self, Self::Import(_))
    }

    #[inline]
    pub fn is_default_import(&self) -> bool {
        matches!(
            self,
            Self::Import(ImportBinding {
                imported: Imported::Default,
                ..
            })
        )
    }
}

pub trait Resolve<'a> {
    /// Resolve `name` as seen from `scope`, or from the module scope if `None`.
    fn resolve(&self, name: &str, scope: Option<ScopeId>) -> Option<Binding<'a>>;
}

pub struct SemanticResolver<'s, 'a> {
    semantic: &'s Semantic<'a>,
}

impl<'s, 'a> SemanticResolver<'s, 'a> {
    pub fn new(semantic: &'s Semantic<'a>) -> Self {
        Self { semantic }
    }
}

impl<'a> Resolve<'a> for SemanticResolver<'_, 'a> {
    fn resolve(&self, name: &str, scope: Option<ScopeId>) -> Option<Binding<'a>> {
        let scoping = self.semantic.scoping();
        let symbol = scope
            .and_then(|scope| scoping.find_binding(scope, name))
            .or_else(|| scoping.get_root_binding(name))?;

        let node = self.semantic.symbol_declaration(symbol);
        let binding = match node.kind() {
            AstKind::VariableDeclarator(decl) => Binding::Variable(decl),
            AstKind::Function(func) => Binding::Function(func),
            AstKind::Class(class) => Binding::Class(class),
            AstKind::TSTypeAliasDeclaration(alias) => Binding::TypeAlias(alias),
            AstKind::TSInterfaceDeclaration(interface) => Binding::Interface(interface),
            AstKind::ImportDefaultSpecifier(_) => self.import(node.id(), Imported::Default),
            AstKind::ImportNamespaceSpecifier(_) => self.import(node.id(), Imported::Namespace),
            AstKind::ImportSpecifier(spec) => {
                let imported = spec.imported.name().as_str();
                self.import(node.id(), Imported::Named(imported))
            }
            _ => Binding::Other,
        };
        Some(binding)
    }
}

impl<'a> SemanticResolver<'_, 'a> {
    fn import(&self, specifier: oxc_semantic::NodeId, imported: Imported<'a>) -> Binding<'a> {
        match self.semantic.nodes().parent_kind(specifier) {
            AstKind::ImportDeclaration(decl) => Binding::Import(ImportBinding {
                imported,
                source: decl.source.value.as_str(),
            }),
            _ => Binding::Other,
        }
    }
}

/// Resolver that knows nothing, for sources without a script.
pub struct NoopResolver;

impl<'a> Resolve<'a> for NoopResolver {
    fn resolve(&self, _name: &str, _scope: Option<ScopeId>) -> Option<Binding<'a>> {
        None
    }
}
