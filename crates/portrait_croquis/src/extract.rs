//! Per-file extraction driver.
//!
//! Splits the file, parses its template and scripts, finds every component
//! definition site and runs the matching analyzer over a fresh builder per
//! site. The default export also receives the `<script setup>` delta and the
//! template.

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    CallExpression, Class, Declaration, ExportDefaultDeclarationKind, Expression, ObjectExpression, Program, Statement,
};
use oxc_parser::Parser;
use oxc_semantic::{Semantic, SemanticBuilder};
use oxc_span::SourceType;
use portrait_armature::{parse_sfc, parse_template_with_options};
use portrait_carton::{camelize, capitalize, FxHashMap};
use portrait_relief::{Position, SfcBlock, TemplateParseOptions};

use crate::analyzer::{analyze_class, analyze_options, analyze_setup_block, analyze_setup_function, AnalysisContext};
use crate::classify::{
    classify_class, classify_object, classify_setup_function, decorate_registered_classes, decorated_class_name,
    is_decorate_call, ComponentSource,
};
use crate::codegen::generate;
use crate::comment::CommentTable;
use crate::error::ExtractError;
use crate::metadata::{ComponentMetadata, MetadataBuilder};
use crate::resolve::{Binding, Resolve, SemanticResolver};
use crate::template::{walk_template, TemplateWalk};
use crate::util::{unwrap_component_wrapper, FunctionLike};

/// Export name of the default export.
pub const DEFAULT_EXPORT: &str = "default";

/// Identifier chains followed when resolving an exported name.
const MAX_ALIAS_DEPTH: u32 = 4;

#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Used for error messages and to pick SFC or bare-script handling
    pub filename: String,
    /// Overrides the source type derived from `lang` or the file extension
    pub source_type: Option<SourceType>,
    /// Interpolation delimiters, `{{` and `}}` when unset
    pub delimiters: Option<(String, String)>,
}

/// One extracted component definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedComponent {
    /// `default` or the exported binding name
    pub export_name: String,
    pub metadata: ComponentMetadata,
    /// Generated object literal
    pub code: String,
}

/// A script to analyze, in file coordinates.
struct ScriptInput<'s> {
    content: &'s str,
    base: Position,
    lang: Option<&'s str>,
}

struct ParsedScript<'a> {
    source: &'a str,
    program: &'a Program<'a>,
    semantic: Semantic<'a>,
    comments: CommentTable,
}

/// Extract every component defined in one file.
pub fn extract_components<'src>(source: &'src str, options: &ExtractOptions) -> Result<Vec<ExtractedComponent>, ExtractError> {
    let path = options.filename.as_str();
    let is_sfc = path.ends_with(".vue");

    let (template, script, script_setup) = if is_sfc {
        let descriptor = parse_sfc(source, path).map_err(|err| ExtractError::sfc(path, &err))?;
        let block = |block: SfcBlock<'src>| ScriptInput {
            content: block.content,
            base: block.loc.start,
            lang: block.lang,
        };
        let template = descriptor.template.map(|block| (block.content, block.loc.start));
        (template, descriptor.script.map(block), descriptor.script_setup.map(block))
    } else {
        let input = ScriptInput {
            content: source,
            base: Position::new(0, 1, 1),
            lang: None,
        };
        (None, Some(input), None)
    };

    let template = template.map(|(content, base)| {
        let mut template_options = TemplateParseOptions {
            base,
            ..Default::default()
        };
        if let Some((open, close)) = &options.delimiters {
            template_options.delimiters = (open.as_str().into(), close.as_str().into());
        }
        let (root, errors) = parse_template_with_options(content, template_options);
        for error in &errors {
            tracing::warn!("{path}: {error}");
        }
        walk_template(&root)
    });

    let plain_allocator = Allocator::default();
    let plain = script
        .as_ref()
        .map(|input| parse_script(&plain_allocator, input, path, options))
        .transpose()?;
    let setup_allocator = Allocator::default();
    let setup = script_setup
        .as_ref()
        .map(|input| parse_script(&setup_allocator, input, path, options))
        .transpose()?;

    let mut components: Vec<(String, MetadataBuilder)> = Vec::new();
    if let Some(parsed) = &plain {
        let resolver = SemanticResolver::new(&parsed.semantic);
        let ctx = AnalysisContext::new(parsed.source, &parsed.comments, &resolver);
        for (export_name, source) in definition_sites(parsed.program, &resolver) {
            let Some(delta) = analyze_site(&ctx, source) else {
                continue;
            };
            let mut builder = MetadataBuilder::new();
            builder.merge(delta);
            components.push((export_name, builder));
        }
    }

    let has_default = components.iter().any(|(name, _)| name == DEFAULT_EXPORT);
    let needs_default = setup.is_some() || (template.is_some() && plain.is_none());
    if !has_default && needs_default {
        components.insert(0, (DEFAULT_EXPORT.to_string(), MetadataBuilder::new()));
    }

    if let Some((_, builder)) = components.iter_mut().find(|(name, _)| name == DEFAULT_EXPORT) {
        if let Some(parsed) = &setup {
            let resolver = SemanticResolver::new(&parsed.semantic);
            let ctx = AnalysisContext::new(parsed.source, &parsed.comments, &resolver);
            let site = Site {
                source: ComponentSource::SetupBlock(parsed.program),
                local: None,
                registration: None,
            };
            if let Some(delta) = analyze_site(&ctx, site) {
                builder.merge(delta);
            }
        }
        if let Some(walk) = template {
            apply_template(builder, walk, setup.as_ref());
        }
    }

    Ok(components
        .into_iter()
        .map(|(export_name, builder)| {
            let metadata = builder.finish();
            let code = generate(&metadata);
            ExtractedComponent {
                export_name,
                metadata,
                code,
            }
        })
        .collect())
}

fn source_type(input: &ScriptInput<'_>, path: &str, options: &ExtractOptions) -> SourceType {
    if let Some(source_type) = options.source_type {
        return source_type;
    }
    match input.lang {
        Some("ts") => SourceType::ts(),
        Some("tsx") => SourceType::tsx(),
        Some("jsx") => SourceType::jsx(),
        Some(_) => SourceType::mjs(),
        None if path.ends_with(".vue") => SourceType::mjs(),
        None => SourceType::from_path(path).unwrap_or_else(|_| SourceType::mjs()),
    }
}

fn parse_script<'a>(
    allocator: &'a Allocator,
    input: &ScriptInput<'a>,
    path: &str,
    options: &ExtractOptions,
) -> Result<ParsedScript<'a>, ExtractError> {
    let ret = Parser::new(allocator, input.content, source_type(input, path, options)).parse();
    if ret.panicked {
        return Err(ExtractError::script(path, input.content, input.base, &ret.errors));
    }
    for error in &ret.errors {
        tracing::warn!("{path}: recovered from script error: {error}");
    }

    let program: &'a Program<'a> = allocator.alloc(ret.program);
    let semantic = SemanticBuilder::new().build(program).semantic;
    let comments = CommentTable::from_script(input.content, &program.comments);
    Ok(ParsedScript {
        source: input.content,
        program,
        semantic,
        comments,
    })
}

/// Classify and analyze one site. `None` if it is not a component.
fn analyze_site<'a>(ctx: &AnalysisContext<'_, 'a>, site: Site<'a>) -> Option<ComponentMetadata> {
    match site.source {
        ComponentSource::Class { class, registered } => {
            let classification = classify_class(class, registered);
            tracing::debug!("class `{}`: {}", site.local.unwrap_or("<anonymous>"), classification.reason);
            if !classification.matches {
                return None;
            }
            Some(analyze_class(ctx, class, site.registration))
        }
        ComponentSource::Config(object) => {
            let classification = classify_object(object);
            tracing::debug!("object `{}`: {}", site.local.unwrap_or("<anonymous>"), classification.reason);
            if !classification.matches {
                return None;
            }
            Some(analyze_options(ctx, object))
        }
        ComponentSource::SetupFunction(func) => {
            let classification = classify_setup_function(func);
            tracing::debug!("function `{}`: {}", site.local.unwrap_or("<anonymous>"), classification.reason);
            if !classification.matches {
                return None;
            }
            Some(analyze_setup_function(ctx, func))
        }
        ComponentSource::SetupBlock(program) => Some(analyze_setup_block(ctx, program)),
    }
}

/// A definition site before classification.
#[derive(Clone, Copy)]
struct Site<'a> {
    source: ComponentSource<'a>,
    /// Local binding name, if the definition is bound to one
    local: Option<&'a str>,
    registration: Option<&'a CallExpression<'a>>,
}

/// Exported definitions of a module, paired with their export names.
fn definition_sites<'a>(program: &'a Program<'a>, resolver: &dyn Resolve<'a>) -> Vec<(String, Site<'a>)> {
    let finder = SiteFinder {
        resolver,
        registered: decorate_registered_classes(program),
    };
    let mut sites = Vec::new();

    for statement in &program.body {
        match statement {
            Statement::ExportDefaultDeclaration(export) => {
                let site = match &export.declaration {
                    ExportDefaultDeclarationKind::ClassDeclaration(class) => Some(finder.class(class, None)),
                    ExportDefaultDeclarationKind::FunctionDeclaration(_)
                    | ExportDefaultDeclarationKind::TSInterfaceDeclaration(_) => None,
                    other => other.as_expression().and_then(|expr| finder.expression(expr, None, 0)),
                };
                match site {
                    Some(site) => sites.push((DEFAULT_EXPORT.to_string(), site)),
                    None => tracing::debug!("default export is not a component candidate"),
                }
            }
            Statement::ExportNamedDeclaration(export) if export.source.is_none() => {
                match &export.declaration {
                    Some(Declaration::VariableDeclaration(declaration)) => {
                        for declarator in &declaration.declarations {
                            let Some(ident) = declarator.id.get_binding_identifier() else {
                                continue;
                            };
                            let name = ident.name.as_str();
                            if let Some(site) =
                                declarator.init.as_ref().and_then(|init| finder.expression(init, Some(name), 0))
                            {
                                sites.push((name.to_string(), site));
                            }
                        }
                    }
                    Some(Declaration::ClassDeclaration(class)) => {
                        if let Some(id) = &class.id {
                            sites.push((id.name.to_string(), finder.class(class, None)));
                        }
                    }
                    _ => {}
                }
                for specifier in &export.specifiers {
                    let local = specifier.local.name();
                    let exported = specifier.exported.name();
                    match finder.identifier(local.as_str(), 0) {
                        Some(site) => sites.push((exported.to_string(), site)),
                        None => tracing::debug!("export `{exported}` is not a component candidate"),
                    }
                }
            }
            _ => {}
        }
    }
    sites
}

struct SiteFinder<'r, 'a> {
    resolver: &'r dyn Resolve<'a>,
    registered: FxHashMap<&'a str, &'a CallExpression<'a>>,
}

impl<'a> SiteFinder<'_, 'a> {
    fn class(&self, class: &'a Class<'a>, local: Option<&'a str>) -> Site<'a> {
        let registration = class
            .id
            .as_ref()
            .and_then(|id| self.registered.get(id.name.as_str()))
            .or_else(|| local.and_then(|name| self.registered.get(name)))
            .copied();
        Site {
            source: ComponentSource::Class {
                class,
                registered: registration.is_some(),
            },
            local: local.or_else(|| class.id.as_ref().map(|id| id.name.as_str())),
            registration,
        }
    }

    fn object(&self, object: &'a ObjectExpression<'a>, local: Option<&'a str>) -> Site<'a> {
        Site {
            source: ComponentSource::Config(object),
            local,
            registration: None,
        }
    }

    fn expression(&self, expr: &'a Expression<'a>, local: Option<&'a str>, depth: u32) -> Option<Site<'a>> {
        let inner = unwrap_component_wrapper(expr);
        // A bare function is only a component inside a wrapper call.
        if !std::ptr::eq(inner, expr) {
            if let Some(func) = FunctionLike::from_expression(inner) {
                return Some(Site {
                    source: ComponentSource::SetupFunction(func),
                    local,
                    registration: None,
                });
            }
        }
        match inner.without_parentheses() {
            Expression::ObjectExpression(object) => Some(self.object(object, local)),
            Expression::ClassExpression(class) => Some(self.class(class, local)),
            Expression::Identifier(ident) => self.identifier(ident.name.as_str(), depth + 1),
            Expression::CallExpression(call) if is_decorate_call(call) => {
                self.identifier(decorated_class_name(call)?, depth + 1)
            }
            _ => None,
        }
    }

    fn identifier(&self, name: &str, depth: u32) -> Option<Site<'a>> {
        if depth > MAX_ALIAS_DEPTH {
            tracing::debug!("giving up resolving `{name}`");
            return None;
        }
        match self.resolver.resolve(name, None)? {
            Binding::Variable(declarator) => {
                let local = declarator.id.get_binding_identifier().map(|ident| ident.name.as_str());
                self.expression(declarator.init.as_ref()?, local, depth)
            }
            Binding::Class(class) => Some(self.class(class, None)),
            _ => None,
        }
    }
}

/// Template nodes, slots, and default imports used as tags.
fn apply_template(builder: &mut MetadataBuilder, walk: TemplateWalk, setup: Option<&ParsedScript<'_>>) {
    let TemplateWalk { nodes, slots, tags } = walk;
    builder.set_template(nodes);
    for (name, slot) in slots {
        builder.add_slot(name, slot);
    }

    let Some(setup) = setup else {
        return;
    };
    let resolver = SemanticResolver::new(&setup.semantic);
    for tag in tags {
        let name = capitalize(&camelize(&tag));
        let is_default_import = resolver
            .resolve(&name, None)
            .is_some_and(|binding| binding.is_default_import());
        if is_default_import {
            tracing::trace!("<{tag}> registers `{name}`");
            builder.add_component(name.clone(), name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::read_metadata;

    fn extract(source: &str, filename: &str) -> Vec<ExtractedComponent> {
        let options = ExtractOptions {
            filename: filename.to_string(),
            ..Default::default()
        };
        extract_components(source, &options).unwrap()
    }

    #[test]
    fn test_named_and_default_exports() {
        let components = extract(
            r#"import { defineComponent } from 'vue'
export const First = defineComponent({ name: 'First' })
export class Second extends Vue {}
const Third = { props: ['x'] }
const NotComponent = { foo: 1 }
export { Third as Renamed, NotComponent }
export default Vue.extend({ name: 'Main' })
"#,
            "components.ts",
        );
        let names: Vec<_> = components.iter().map(|c| c.export_name.as_str()).collect();
        assert_eq!(names, ["First", "Second", "Renamed", "default"]);
        assert_eq!(components[0].metadata.name.as_deref(), Some("First"));
        assert_eq!(components[1].metadata.name.as_deref(), Some("Second"));
        assert!(components[2].metadata.props.contains_key("x"));
        assert_eq!(components[3].metadata.name.as_deref(), Some("Main"));
    }

    #[test]
    fn test_each_export_gets_fresh_builder() {
        let components = extract(
            "export const A = { props: ['a'] }\nexport const B = { props: ['b'] }",
            "two.js",
        );
        assert_eq!(components[0].metadata.props.keys().collect::<Vec<_>>(), ["a"]);
        assert_eq!(components[1].metadata.props.keys().collect::<Vec<_>>(), ["b"]);
    }

    #[test]
    fn test_sfc_with_template_and_setup() {
        let source = r#"<template>
  <!-- Page header -->
  <AppHeader :title="title" />
  <slot name="footer" />
</template>

<script>
export default {
  name: 'Page',
  props: { title: String },
}
</script>

<script setup lang="ts">
import AppHeader from './AppHeader.vue'
import { helper } from './helper'
const count = ref(0)
</script>
"#;
        let components = extract(source, "Page.vue");
        assert_eq!(components.len(), 1);
        let meta = &components[0].metadata;
        assert_eq!(meta.name.as_deref(), Some("Page"));
        assert!(meta.props.contains_key("title"));
        assert_eq!(meta.setup.keys().collect::<Vec<_>>(), ["count"]);
        assert_eq!(meta.components.get("AppHeader").map(|c| c.as_str()), Some("AppHeader"));
        assert!(meta.slots.contains_key("footer"));

        let header = &meta.template[0];
        assert_eq!(header.content, "app-header");
        assert_eq!(header.comment.as_deref(), Some("Page header"));
        let start = source.find("<AppHeader").unwrap() as u32;
        assert_eq!(header.range[0], start);
    }

    #[test]
    fn test_template_only_sfc() {
        let components = extract("<template><div>{{ msg }}</div></template>", "Plain.vue");
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].export_name, DEFAULT_EXPORT);
        assert_eq!(components[0].metadata.template.len(), 1);
    }

    #[test]
    fn test_rejected_default_is_skipped() {
        let components = extract("export default { name: 'A', watch: {} }", "a.js");
        assert!(components.is_empty());
    }

    #[test]
    fn test_setup_function_component() {
        let components = extract(
            r#"import { defineComponent, ref } from 'vue'
export const Counter = defineComponent((props, { emit }) => {
  const count = ref(0)
  emit('ready', 1)
  return { count }
})
export const Silent = defineComponent(function () {})
export default () => ({ count: 1 })
"#,
            "counter.ts",
        );
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].export_name, "Counter");
        let meta = &components[0].metadata;
        assert_eq!(meta.setup.keys().collect::<Vec<_>>(), ["count"]);
        assert!(meta.emits.contains_key("ready"));
    }

    #[test]
    fn test_generated_code_round_trips() {
        let components = extract(
            r#"<template><ul><li v-for="(item, i) in items" :key="item.id">{{ item.label | upper }}</li></ul></template>
<script>
export default {
  data() {
    return {
      // Outer
      nested: {
        // Inner
        value: 1,
      },
    }
  },
  components: { Row: { props: ['cells'] } },
}
</script>"#,
            "List.vue",
        );
        let component = &components[0];
        assert_eq!(read_metadata(&component.code).unwrap(), component.metadata);
        let nested = component.metadata.data.get("nested.value").unwrap();
        assert_eq!(nested.comment.as_deref(), Some("Outer\nInner"));
    }

    #[test]
    fn test_script_parse_error_position() {
        let source = "<template><div/></template>\n<script>\nexport default {\n  name: 'A',,\n}\n</script>";
        let options = ExtractOptions {
            filename: "Broken.vue".to_string(),
            ..Default::default()
        };
        let err = extract_components(source, &options).unwrap_err();
        let ExtractError::ScriptParse { path, line, .. } = err else {
            panic!("expected a script parse error, got {err:?}");
        };
        assert_eq!(path, "Broken.vue");
        assert_eq!(line, 4);
    }
}
