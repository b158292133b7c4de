//! Component metadata model and its builder.
//!
//! A [`ComponentMetadata`] describes one component definition site. Analyzers
//! never write it directly: they fill a [`MetadataBuilder`], whose insert
//! methods apply the merge rules, and the driver folds the resulting deltas
//! together with [`MetadataBuilder::merge`].

use phf::phf_set;
use portrait_carton::{uncapitalize, OrderedMap, String};
use serde::Serialize;

/// Framework lifecycle hooks in their options-object spelling.
static LIFECYCLE_HOOKS: phf::Set<&'static str> = phf_set! {
    "beforeCreate",
    "created",
    "beforeMount",
    "mounted",
    "beforeUpdate",
    "updated",
    "activated",
    "deactivated",
    "beforeDestroy",
    "destroyed",
    "beforeUnmount",
    "unmounted",
    "errorCaptured",
    "renderTracked",
    "renderTriggered",
    "serverPrefetch",
};

/// Check if a name is a lifecycle hook in options spelling.
#[inline]
pub fn is_lifecycle_hook(name: &str) -> bool {
    LIFECYCLE_HOOKS.contains(name)
}

/// Normalize `mounted` and `onMounted` to `mounted`.
pub fn normalize_hook_name(name: &str) -> Option<String> {
    if is_lifecycle_hook(name) {
        return Some(String::from(name));
    }
    let rest = name.strip_prefix("on")?;
    if !rest.starts_with(|c: char| c.is_ascii_uppercase()) {
        return None;
    }
    let normalized = uncapitalize(rest);
    is_lifecycle_hook(&normalized).then_some(normalized)
}

/// Coarse runtime-type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TypeTag {
    String,
    Number,
    Boolean,
    Array,
    Object,
    Function,
    #[serde(rename = "null")]
    Null,
    RegExp,
}

impl TypeTag {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Number => "Number",
            Self::Boolean => "Boolean",
            Self::Array => "Array",
            Self::Object => "Object",
            Self::Function => "Function",
            Self::Null => "null",
            Self::RegExp => "RegExp",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "String" => Self::String,
            "Number" => Self::Number,
            "Boolean" => Self::Boolean,
            "Array" => Self::Array,
            "Object" => Self::Object,
            "Function" => Self::Function,
            "null" => Self::Null,
            "RegExp" => Self::RegExp,
            _ => return None,
        })
    }
}

/// Add tags not already present, keeping first-seen order.
pub fn union_tags(into: &mut Vec<TypeTag>, tags: impl IntoIterator<Item = TypeTag>) {
    for tag in tags {
        if !into.contains(&tag) {
            into.push(tag);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PropEntry {
    pub default: Option<String>,
    #[serde(rename = "type")]
    pub types: Vec<TypeTag>,
    pub required: Option<bool>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmitEntry {
    /// Tag set per argument position
    #[serde(rename = "type")]
    pub types: Vec<Vec<TypeTag>>,
    pub comment: Option<String>,
    pub validator: Option<String>,
}

/// Entry that only carries a comment.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NamedEntry {
    pub comment: Option<String>,
}

pub type DataEntry = NamedEntry;
pub type ComputedEntry = NamedEntry;
pub type MethodEntry = NamedEntry;
pub type SetupBinding = NamedEntry;
pub type LifecycleHookEntry = NamedEntry;
pub type MiscEntry = NamedEntry;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyKind {
    #[default]
    Literal,
    Dynamic,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    #[default]
    Literal,
    Reference,
    Expression,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvideEntry {
    pub key_kind: KeyKind,
    pub value: Option<String>,
    pub value_kind: ValueKind,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FromKind {
    #[default]
    Literal,
    Identifier,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectEntry {
    pub from: Option<String>,
    pub from_kind: FromKind,
    pub default: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterEntry {
    pub comment: Option<String>,
    /// The filter is an imported binding passed through unchanged
    pub reexported: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SlotEntry {
    pub comment: Option<String>,
    pub props: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelOption {
    pub prop: String,
    pub event: String,
}

impl Default for ModelOption {
    fn default() -> Self {
        Self {
            prop: String::const_new("value"),
            event: String::const_new("input"),
        }
    }
}

/// Computed definition side, used to tag comment lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputedPart {
    Get,
    Set,
    All,
}

impl ComputedPart {
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Set => "set",
            Self::All => "all",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateNodeKind {
    Element,
    Text,
    Expression,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpressionKind {
    Literal,
    Identifier,
    Member,
    Call,
    Filter,
    Loop,
    Scope,
    Expression,
}

/// Classified bound expression of an attribute or interpolation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpressionInfo {
    pub kind: ExpressionKind,
    /// Names introduced by a loop or slot scope
    pub scope: Vec<String>,
    /// Iterated source of a loop
    pub source: Option<String>,
    /// Function names in application order
    pub call_chain: Vec<String>,
    pub arguments: Vec<String>,
}

impl ExpressionInfo {
    pub fn new(kind: ExpressionKind) -> Self {
        Self {
            kind,
            scope: Vec::new(),
            source: None,
            call_chain: Vec::new(),
            arguments: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateAttr {
    pub name: String,
    pub value: Option<String>,
    pub expression: Option<ExpressionInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateNode {
    pub kind: TemplateNodeKind,
    /// Tag, condensed text, or expression source
    pub content: String,
    pub attrs: Vec<TemplateAttr>,
    pub expression: Option<ExpressionInfo>,
    pub children: Vec<TemplateNode>,
    pub comment: Option<String>,
    /// Byte offsets of the node in the file
    pub range: [u32; 2],
}

/// Everything extracted from one component definition site
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComponentMetadata {
    pub name: Option<String>,
    pub extends: Option<String>,
    pub model: Option<ModelOption>,
    pub mixins: Vec<String>,
    /// Generated code of nested definitions, or raw source of references
    pub components: OrderedMap<String>,
    pub props: OrderedMap<PropEntry>,
    pub emits: OrderedMap<EmitEntry>,
    pub data: OrderedMap<DataEntry>,
    pub computed: OrderedMap<ComputedEntry>,
    pub methods: OrderedMap<MethodEntry>,
    pub setup: OrderedMap<SetupBinding>,
    pub lifecycle: OrderedMap<LifecycleHookEntry>,
    pub provide: OrderedMap<ProvideEntry>,
    pub inject: OrderedMap<InjectEntry>,
    pub filters: OrderedMap<FilterEntry>,
    pub slots: OrderedMap<SlotEntry>,
    pub misc: OrderedMap<MiscEntry>,
    pub template: Vec<TemplateNode>,
}

/// Merge a re-inserted entry into the existing one.
pub trait MergeEntry {
    fn merge_from(&mut self, other: Self);
}

fn merge_comment(into: &mut Option<String>, other: Option<String>) {
    let Some(other) = other else {
        return;
    };
    match into {
        Some(existing) if existing.as_str() == other.as_str() => {}
        Some(existing) => {
            existing.push('\n');
            existing.push_str(&other);
        }
        None => *into = Some(other),
    }
}

impl MergeEntry for PropEntry {
    fn merge_from(&mut self, other: Self) {
        if self.default.is_none() {
            self.default = other.default;
        }
        union_tags(&mut self.types, other.types);
        if self.required.is_none() {
            self.required = other.required;
        }
        merge_comment(&mut self.comment, other.comment);
    }
}

impl MergeEntry for EmitEntry {
    fn merge_from(&mut self, other: Self) {
        for (position, incoming) in other.types.into_iter().enumerate() {
            match self.types.get_mut(position) {
                Some(existing) => {
                    if existing.is_empty() || incoming.iter().all(|tag| existing.contains(tag)) {
                        *existing = incoming;
                    }
                }
                None => self.types.push(incoming),
            }
        }
        merge_comment(&mut self.comment, other.comment);
        if self.validator.is_none() {
            self.validator = other.validator;
        }
    }
}

impl MergeEntry for NamedEntry {
    fn merge_from(&mut self, other: Self) {
        merge_comment(&mut self.comment, other.comment);
    }
}

impl MergeEntry for ProvideEntry {
    fn merge_from(&mut self, other: Self) {
        if self.value.is_none() {
            self.value = other.value;
            self.value_kind = other.value_kind;
        }
        merge_comment(&mut self.comment, other.comment);
    }
}

impl MergeEntry for InjectEntry {
    fn merge_from(&mut self, other: Self) {
        if self.from.is_none() {
            self.from = other.from;
            self.from_kind = other.from_kind;
        }
        if self.default.is_none() {
            self.default = other.default;
        }
        merge_comment(&mut self.comment, other.comment);
    }
}

impl MergeEntry for FilterEntry {
    fn merge_from(&mut self, other: Self) {
        self.reexported |= other.reexported;
        merge_comment(&mut self.comment, other.comment);
    }
}

impl MergeEntry for SlotEntry {
    fn merge_from(&mut self, other: Self) {
        for prop in other.props {
            if !self.props.contains(&prop) {
                self.props.push(prop);
            }
        }
        merge_comment(&mut self.comment, other.comment);
    }
}

fn merge_into<V: MergeEntry>(map: &mut OrderedMap<V>, key: impl Into<String>, entry: V) {
    let key = key.into();
    match map.get_mut(&key) {
        Some(existing) => existing.merge_from(entry),
        None => {
            map.insert(key, entry);
        }
    }
}

fn merge_maps<V: MergeEntry>(into: &mut OrderedMap<V>, from: OrderedMap<V>) {
    for (key, entry) in from {
        merge_into(into, key, entry);
    }
}

/// Accumulates one definition site's metadata.
///
/// Created fresh per site and consumed by [`MetadataBuilder::finish`].
#[derive(Debug, Default)]
pub struct MetadataBuilder {
    meta: ComponentMetadata,
}

impl MetadataBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn metadata(&self) -> &ComponentMetadata {
        &self.meta
    }

    /// The first name seen wins.
    pub fn set_name(&mut self, name: impl Into<String>) {
        if self.meta.name.is_none() {
            self.meta.name = Some(name.into());
        }
    }

    pub fn set_extends(&mut self, extends: impl Into<String>) {
        if self.meta.extends.is_none() {
            self.meta.extends = Some(extends.into());
        }
    }

    pub fn set_model(&mut self, model: ModelOption) {
        if self.meta.model.is_none() {
            self.meta.model = Some(model);
        }
    }

    pub fn add_mixin(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.meta.mixins.contains(&name) {
            self.meta.mixins.push(name);
        }
    }

    /// Register a sub-component. `code` is spliced verbatim by the generator.
    pub fn add_component(&mut self, name: impl Into<String>, code: impl Into<String>) {
        let name = name.into();
        if !self.meta.components.contains_key(&name) {
            self.meta.components.insert(name, code.into());
        }
    }

    pub fn add_prop(&mut self, name: impl Into<String>, entry: PropEntry) {
        merge_into(&mut self.meta.props, name, entry);
    }

    pub fn add_emit(&mut self, name: impl Into<String>, entry: EmitEntry) {
        merge_into(&mut self.meta.emits, name, entry);
    }

    pub fn add_data(&mut self, name: impl Into<String>, comment: Option<String>) {
        merge_into(&mut self.meta.data, name, NamedEntry { comment });
    }

    /// Each comment line is prefixed with the definition side.
    pub fn add_computed(&mut self, name: impl Into<String>, part: ComputedPart, comment: Option<String>) {
        let comment = comment.map(|text| {
            let mut tagged = String::default();
            for (i, line) in text.lines().enumerate() {
                if i > 0 {
                    tagged.push('\n');
                }
                tagged.push_str(part.tag());
                tagged.push_str(": ");
                tagged.push_str(line);
            }
            tagged
        });
        merge_into(&mut self.meta.computed, name, NamedEntry { comment });
    }

    pub fn add_method(&mut self, name: impl Into<String>, comment: Option<String>) {
        merge_into(&mut self.meta.methods, name, NamedEntry { comment });
    }

    pub fn add_setup(&mut self, name: impl Into<String>, comment: Option<String>) {
        merge_into(&mut self.meta.setup, name, NamedEntry { comment });
    }

    /// Returns false if `name` is not a lifecycle hook in either spelling.
    pub fn add_lifecycle(&mut self, name: &str, comment: Option<String>) -> bool {
        match normalize_hook_name(name) {
            Some(hook) => {
                merge_into(&mut self.meta.lifecycle, hook, NamedEntry { comment });
                true
            }
            None => false,
        }
    }

    pub fn add_misc(&mut self, name: impl Into<String>, comment: Option<String>) {
        merge_into(&mut self.meta.misc, name, NamedEntry { comment });
    }

    pub fn add_provide(&mut self, key: impl Into<String>, entry: ProvideEntry) {
        merge_into(&mut self.meta.provide, key, entry);
    }

    pub fn add_inject(&mut self, name: impl Into<String>, entry: InjectEntry) {
        merge_into(&mut self.meta.inject, name, entry);
    }

    pub fn add_filter(&mut self, name: impl Into<String>, entry: FilterEntry) {
        merge_into(&mut self.meta.filters, name, entry);
    }

    pub fn add_slot(&mut self, name: impl Into<String>, entry: SlotEntry) {
        merge_into(&mut self.meta.slots, name, entry);
    }

    pub fn set_template(&mut self, nodes: Vec<TemplateNode>) {
        self.meta.template = nodes;
    }

    /// Fold a delta produced by an analyzer into this builder.
    pub fn merge(&mut self, delta: ComponentMetadata) {
        let ComponentMetadata {
            name,
            extends,
            model,
            mixins,
            components,
            props,
            emits,
            data,
            computed,
            methods,
            setup,
            lifecycle,
            provide,
            inject,
            filters,
            slots,
            misc,
            template,
        } = delta;

        if let Some(name) = name {
            self.set_name(name);
        }
        if let Some(extends) = extends {
            self.set_extends(extends);
        }
        if let Some(model) = model {
            self.set_model(model);
        }
        for mixin in mixins {
            self.add_mixin(mixin);
        }
        for (name, code) in components {
            self.add_component(name, code);
        }
        merge_maps(&mut self.meta.props, props);
        merge_maps(&mut self.meta.emits, emits);
        merge_maps(&mut self.meta.data, data);
        merge_maps(&mut self.meta.computed, computed);
        merge_maps(&mut self.meta.methods, methods);
        merge_maps(&mut self.meta.setup, setup);
        merge_maps(&mut self.meta.lifecycle, lifecycle);
        merge_maps(&mut self.meta.provide, provide);
        merge_maps(&mut self.meta.inject, inject);
        merge_maps(&mut self.meta.filters, filters);
        merge_maps(&mut self.meta.slots, slots);
        merge_maps(&mut self.meta.misc, misc);
        if !template.is_empty() {
            self.meta.template = template;
        }
    }

    pub fn finish(self) -> ComponentMetadata {
        self.meta
    }
}
