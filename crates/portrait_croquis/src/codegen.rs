//! Code generation.
//!
//! Renders a [`ComponentMetadata`] as a JavaScript object literal. Ordered
//! maps become object literals keyed by quoted names, lists become array
//! literals, absent values become `undefined`. Two fields are spliced raw:
//! sub-component values (already generated code or source references) and
//! mixins (identifier references).

use portrait_carton::OrderedMap;

use crate::metadata::{
    ComponentMetadata, EmitEntry, ExpressionInfo, FilterEntry, InjectEntry, ModelOption, NamedEntry, PropEntry,
    ProvideEntry, SlotEntry, TemplateAttr, TemplateNode, TypeTag,
};

/// Render one component's metadata.
pub fn generate(meta: &ComponentMetadata) -> String {
    let mut ctx = CodeWriter::new();
    ctx.component(meta);
    ctx.into_code()
}

/// Indenting string buffer
pub struct CodeWriter {
    code: String,
    indent_level: u32,
}

impl Default for CodeWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeWriter {
    pub fn new() -> Self {
        Self {
            code: String::with_capacity(1024),
            indent_level: 0,
        }
    }

    #[inline]
    pub fn push(&mut self, code: &str) {
        self.code.push_str(code);
    }

    /// Add newline with proper indentation
    #[inline]
    pub fn newline(&mut self) {
        self.code.push('\n');
        for _ in 0..self.indent_level {
            self.code.push_str("  ");
        }
    }

    #[inline]
    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    #[inline]
    pub fn deindent(&mut self) {
        if self.indent_level > 0 {
            self.indent_level -= 1;
        }
    }

    pub fn into_code(self) -> String {
        self.code
    }

    /// Quoted, escaped string literal.
    fn string(&mut self, value: &str) {
        match serde_json::to_string(value) {
            Ok(quoted) => self.push(&quoted),
            Err(_) => self.push("undefined"),
        }
    }

    fn optional_string(&mut self, value: Option<&str>) {
        match value {
            Some(value) => self.string(value),
            None => self.push("undefined"),
        }
    }

    fn optional_bool(&mut self, value: Option<bool>) {
        match value {
            Some(true) => self.push("true"),
            Some(false) => self.push("false"),
            None => self.push("undefined"),
        }
    }

    fn string_list<'s>(&mut self, values: impl IntoIterator<Item = &'s str>) {
        self.push("[");
        for (i, value) in values.into_iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.string(value);
        }
        self.push("]");
    }

    fn tags(&mut self, tags: &[TypeTag]) {
        self.string_list(tags.iter().map(|tag| tag.as_str()));
    }

    /// `{ name: value, ... }` over a fixed field list, one field per line.
    fn record(&mut self, fields: impl FnOnce(&mut Self)) {
        self.push("{");
        self.indent();
        fields(self);
        self.deindent();
        self.newline();
        self.push("}");
    }

    fn field(&mut self, name: &str, value: impl FnOnce(&mut Self)) {
        self.newline();
        self.push(name);
        self.push(": ");
        value(self);
        self.push(",");
    }

    fn map<V>(&mut self, map: &OrderedMap<V>, mut entry: impl FnMut(&mut Self, &V)) {
        if map.is_empty() {
            self.push("{}");
            return;
        }
        self.push("{");
        self.indent();
        for (key, value) in map.iter() {
            self.newline();
            self.string(key);
            self.push(": ");
            entry(self, value);
            self.push(",");
        }
        self.deindent();
        self.newline();
        self.push("}");
    }

    fn list<T>(&mut self, items: &[T], mut item: impl FnMut(&mut Self, &T)) {
        if items.is_empty() {
            self.push("[]");
            return;
        }
        self.push("[");
        self.indent();
        for value in items {
            self.newline();
            item(self, value);
            self.push(",");
        }
        self.deindent();
        self.newline();
        self.push("]");
    }

    fn component(&mut self, meta: &ComponentMetadata) {
        self.record(|ctx| {
            ctx.field("name", |ctx| ctx.optional_string(meta.name.as_deref()));
            ctx.field("extends", |ctx| ctx.optional_string(meta.extends.as_deref()));
            ctx.field("model", |ctx| match &meta.model {
                Some(model) => ctx.model(model),
                None => ctx.push("undefined"),
            });
            ctx.field("mixins", |ctx| {
                ctx.push("[");
                ctx.push(&meta.mixins.join(", "));
                ctx.push("]");
            });
            ctx.field("components", |ctx| ctx.map(&meta.components, |ctx, code| ctx.push(code)));
            ctx.field("props", |ctx| ctx.map(&meta.props, Self::prop));
            ctx.field("emits", |ctx| ctx.map(&meta.emits, Self::emit));
            ctx.field("data", |ctx| ctx.map(&meta.data, Self::named));
            ctx.field("computed", |ctx| ctx.map(&meta.computed, Self::named));
            ctx.field("methods", |ctx| ctx.map(&meta.methods, Self::named));
            ctx.field("setup", |ctx| ctx.map(&meta.setup, Self::named));
            ctx.field("lifecycle", |ctx| ctx.map(&meta.lifecycle, Self::named));
            ctx.field("provide", |ctx| ctx.map(&meta.provide, Self::provide));
            ctx.field("inject", |ctx| ctx.map(&meta.inject, Self::inject));
            ctx.field("filters", |ctx| ctx.map(&meta.filters, Self::filter));
            ctx.field("slots", |ctx| ctx.map(&meta.slots, Self::slot));
            ctx.field("misc", |ctx| ctx.map(&meta.misc, Self::named));
            ctx.field("template", |ctx| ctx.list(&meta.template, Self::template_node));
        });
    }

    fn model(&mut self, model: &ModelOption) {
        self.push("{ prop: ");
        self.string(&model.prop);
        self.push(", event: ");
        self.string(&model.event);
        self.push(" }");
    }

    fn prop(&mut self, prop: &PropEntry) {
        self.record(|ctx| {
            ctx.field("default", |ctx| ctx.optional_string(prop.default.as_deref()));
            ctx.field("type", |ctx| ctx.tags(&prop.types));
            ctx.field("required", |ctx| ctx.optional_bool(prop.required));
            ctx.field("comment", |ctx| ctx.optional_string(prop.comment.as_deref()));
        });
    }

    fn emit(&mut self, emit: &EmitEntry) {
        self.record(|ctx| {
            ctx.field("type", |ctx| {
                ctx.push("[");
                for (i, position) in emit.types.iter().enumerate() {
                    if i > 0 {
                        ctx.push(", ");
                    }
                    ctx.tags(position);
                }
                ctx.push("]");
            });
            ctx.field("comment", |ctx| ctx.optional_string(emit.comment.as_deref()));
            ctx.field("validator", |ctx| ctx.optional_string(emit.validator.as_deref()));
        });
    }

    fn named(&mut self, entry: &NamedEntry) {
        self.push("{ comment: ");
        self.optional_string(entry.comment.as_deref());
        self.push(" }");
    }

    fn provide(&mut self, provide: &ProvideEntry) {
        self.record(|ctx| {
            ctx.field("keyKind", |ctx| ctx.string(key_kind_name(provide)));
            ctx.field("value", |ctx| ctx.optional_string(provide.value.as_deref()));
            ctx.field("valueKind", |ctx| ctx.string(value_kind_name(provide)));
            ctx.field("comment", |ctx| ctx.optional_string(provide.comment.as_deref()));
        });
    }

    fn inject(&mut self, inject: &InjectEntry) {
        self.record(|ctx| {
            ctx.field("from", |ctx| ctx.optional_string(inject.from.as_deref()));
            ctx.field("fromKind", |ctx| ctx.string(from_kind_name(inject)));
            ctx.field("default", |ctx| ctx.optional_string(inject.default.as_deref()));
            ctx.field("comment", |ctx| ctx.optional_string(inject.comment.as_deref()));
        });
    }

    fn filter(&mut self, filter: &FilterEntry) {
        self.push("{ comment: ");
        self.optional_string(filter.comment.as_deref());
        self.push(", reexported: ");
        self.push(if filter.reexported { "true" } else { "false" });
        self.push(" }");
    }

    fn slot(&mut self, slot: &SlotEntry) {
        self.push("{ comment: ");
        self.optional_string(slot.comment.as_deref());
        self.push(", props: ");
        self.string_list(slot.props.iter().map(|prop| prop.as_str()));
        self.push(" }");
    }

    fn template_node(&mut self, node: &TemplateNode) {
        self.record(|ctx| {
            ctx.field("kind", |ctx| ctx.string(node_kind_name(node)));
            ctx.field("content", |ctx| ctx.string(&node.content));
            ctx.field("attrs", |ctx| ctx.list(&node.attrs, Self::attr));
            ctx.field("expression", |ctx| ctx.expression(node.expression.as_ref()));
            ctx.field("children", |ctx| ctx.list(&node.children, Self::template_node));
            ctx.field("comment", |ctx| ctx.optional_string(node.comment.as_deref()));
            ctx.field("range", |ctx| ctx.push(&format!("[{}, {}]", node.range[0], node.range[1])));
        });
    }

    fn attr(&mut self, attr: &TemplateAttr) {
        self.record(|ctx| {
            ctx.field("name", |ctx| ctx.string(&attr.name));
            ctx.field("value", |ctx| ctx.optional_string(attr.value.as_deref()));
            ctx.field("expression", |ctx| ctx.expression(attr.expression.as_ref()));
        });
    }

    fn expression(&mut self, info: Option<&ExpressionInfo>) {
        let Some(info) = info else {
            self.push("undefined");
            return;
        };
        self.record(|ctx| {
            ctx.field("kind", |ctx| ctx.string(expression_kind_name(info)));
            ctx.field("scope", |ctx| ctx.string_list(info.scope.iter().map(|s| s.as_str())));
            ctx.field("source", |ctx| ctx.optional_string(info.source.as_deref()));
            ctx.field("callChain", |ctx| ctx.string_list(info.call_chain.iter().map(|s| s.as_str())));
            ctx.field("arguments", |ctx| ctx.string_list(info.arguments.iter().map(|s| s.as_str())));
        });
    }
}

fn key_kind_name(provide: &ProvideEntry) -> &'static str {
    use crate::metadata::KeyKind;
    match provide.key_kind {
        KeyKind::Literal => "literal",
        KeyKind::Dynamic => "dynamic",
    }
}

fn value_kind_name(provide: &ProvideEntry) -> &'static str {
    use crate::metadata::ValueKind;
    match provide.value_kind {
        ValueKind::Literal => "literal",
        ValueKind::Reference => "reference",
        ValueKind::Expression => "expression",
    }
}

fn from_kind_name(inject: &InjectEntry) -> &'static str {
    use crate::metadata::FromKind;
    match inject.from_kind {
        FromKind::Literal => "literal",
        FromKind::Identifier => "identifier",
    }
}

fn node_kind_name(node: &TemplateNode) -> &'static str {
    use crate::metadata::TemplateNodeKind;
    match node.kind {
        TemplateNodeKind::Element => "element",
        TemplateNodeKind::Text => "text",
        TemplateNodeKind::Expression => "expression",
    }
}

fn expression_kind_name(info: &ExpressionInfo) -> &'static str {
    use crate::metadata::ExpressionKind;
    match info.kind {
        ExpressionKind::Literal => "literal",
        ExpressionKind::Identifier => "identifier",
        ExpressionKind::Member => "member",
        ExpressionKind::Call => "call",
        ExpressionKind::Filter => "filter",
        ExpressionKind::Loop => "loop",
        ExpressionKind::Scope => "scope",
        ExpressionKind::Expression => "expression",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{ComputedPart, MetadataBuilder, ModelOption, PropEntry};
    use insta::assert_snapshot;

    #[test]
    fn test_generate_empty() {
        assert_snapshot!(generate(&ComponentMetadata::default()), @r#"
        {
          name: undefined,
          extends: undefined,
          model: undefined,
          mixins: [],
          components: {},
          props: {},
          emits: {},
          data: {},
          computed: {},
          methods: {},
          setup: {},
          lifecycle: {},
          provide: {},
          inject: {},
          filters: {},
          slots: {},
          misc: {},
          template: [],
        }
        "#);
    }

    #[test]
    fn test_generate_entries() {
        let mut builder = MetadataBuilder::new();
        builder.set_name("Demo");
        builder.set_model(ModelOption::default());
        builder.add_mixin("Base");
        builder.add_mixin("Logging");
        builder.add_component("Child", "Child");
        builder.add_prop(
            "count",
            PropEntry {
                default: Some("0".into()),
                types: vec![TypeTag::Number, TypeTag::Null],
                required: Some(false),
                comment: Some("Line \"one\"\nline two".into()),
            },
        );
        builder.add_emit(
            "update:count",
            EmitEntry {
                types: vec![vec![TypeTag::Number], vec![]],
                ..Default::default()
            },
        );
        builder.add_computed("double", ComputedPart::All, Some("Twice".into()));
        assert_snapshot!(generate(&builder.finish()), @r#"
        {
          name: "Demo",
          extends: undefined,
          model: { prop: "value", event: "input" },
          mixins: [Base, Logging],
          components: {
            "Child": Child,
          },
          props: {
            "count": {
              default: "0",
              type: ["Number", "null"],
              required: false,
              comment: "Line \"one\"\nline two",
            },
          },
          emits: {
            "update:count": {
              type: [["Number"], []],
              comment: undefined,
              validator: undefined,
            },
          },
          data: {},
          computed: {
            "double": { comment: "all: Twice" },
          },
          methods: {},
          setup: {},
          lifecycle: {},
          provide: {},
          inject: {},
          filters: {},
          slots: {},
          misc: {},
          template: [],
        }
        "#);
    }

    #[test]
    fn test_nested_component_code_is_spliced() {
        let mut inner = MetadataBuilder::new();
        inner.set_name("Inner");
        let inner_code = generate(&inner.finish());

        let mut outer = MetadataBuilder::new();
        outer.add_component("Inner", inner_code.as_str());
        let code = generate(&outer.finish());
        assert!(code.contains("\"Inner\": {\n  name: \"Inner\","));
        assert!(!code.contains("\\\"Inner\\\""));
    }
}
