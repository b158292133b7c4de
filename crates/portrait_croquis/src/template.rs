//! Template walking.
//!
//! Turns a parsed template into [`TemplateNode`]s: tags hyphenated, bound
//! attributes classified, whitespace-only text dropped and leading comments
//! attached. `<slot>` elements are collected along the way, and so is every
//! tag name, for implicit component registration.

use portrait_carton::{condense_whitespace, hyphenate, is_whitespace_only, OrderedMap, String};
use portrait_relief::{AttributeNode, ElementNode, TemplateChild, TemplateRoot};

use crate::comment::{CommentRange, CommentTable};
use crate::expression::{classify_expression, classify_loop, classify_scope};
use crate::metadata::{ExpressionInfo, MergeEntry, SlotEntry, TemplateAttr, TemplateNode, TemplateNodeKind};

/// Result of walking one template.
#[derive(Debug, Default)]
pub struct TemplateWalk {
    pub nodes: Vec<TemplateNode>,
    pub slots: OrderedMap<SlotEntry>,
    /// Tags as written, first occurrence order
    pub tags: Vec<String>,
}

pub fn walk_template(root: &TemplateRoot) -> TemplateWalk {
    let mut comments = Vec::new();
    collect_comments(&root.children, &mut comments);

    let mut walker = TemplateWalker {
        comments: CommentTable::new(comments),
        walk: TemplateWalk::default(),
    };
    walker.walk.nodes = walker.children(&root.children, root.loc.start_offset());
    walker.walk
}

fn collect_comments(children: &[TemplateChild], out: &mut Vec<CommentRange>) {
    for child in children {
        match child {
            TemplateChild::Comment(comment) => out.push(CommentRange {
                start: comment.loc.start_offset(),
                end: comment.loc.end_offset(),
                text: String::from(comment.content.trim()),
            }),
            TemplateChild::Element(el) => collect_comments(&el.children, out),
            _ => {}
        }
    }
}

struct TemplateWalker {
    comments: CommentTable,
    walk: TemplateWalk,
}

impl TemplateWalker {
    /// Walk siblings. `window_start` is where the first child's comment window opens.
    fn children(&mut self, children: &[TemplateChild], window_start: u32) -> Vec<TemplateNode> {
        let mut nodes = Vec::with_capacity(children.len());
        let mut window_start = window_start;

        for child in children {
            let loc = child.loc();
            let leading_comment = || self.comments.between(window_start, loc.start_offset());
            let node = match child {
                TemplateChild::Comment(_) => continue,
                TemplateChild::Text(text) if is_whitespace_only(&text.content) => continue,
                TemplateChild::Text(text) => TemplateNode {
                    kind: TemplateNodeKind::Text,
                    content: condense_whitespace(&text.content),
                    attrs: Vec::new(),
                    expression: None,
                    children: Vec::new(),
                    comment: leading_comment(),
                    range: [loc.start_offset(), loc.end_offset()],
                },
                TemplateChild::Interpolation(interp) => {
                    let content = interp.content.trim();
                    TemplateNode {
                        kind: TemplateNodeKind::Expression,
                        content: String::from(content),
                        attrs: Vec::new(),
                        expression: Some(classify_expression(content)),
                        children: Vec::new(),
                        comment: leading_comment(),
                        range: [loc.start_offset(), loc.end_offset()],
                    }
                }
                TemplateChild::Element(el) => {
                    let comment = leading_comment();
                    self.element(el, comment)
                }
            };
            window_start = loc.end_offset();
            nodes.push(node);
        }

        nodes
    }

    fn element(&mut self, el: &ElementNode, comment: Option<String>) -> TemplateNode {
        tracing::trace!("walking <{}>", el.tag);
        if !self.walk.tags.contains(&el.tag) {
            self.walk.tags.push(el.tag.clone());
        }
        if el.tag == "slot" {
            self.register_slot(el, comment.clone());
        }

        let attrs = el.attrs.iter().map(attribute).collect();
        let children = self.children(&el.children, el.open_tag_loc.end_offset());
        TemplateNode {
            kind: TemplateNodeKind::Element,
            content: hyphenate(&el.tag),
            attrs,
            expression: None,
            children,
            comment,
            range: [el.loc.start_offset(), el.loc.end_offset()],
        }
    }

    fn register_slot(&mut self, el: &ElementNode, comment: Option<String>) {
        let name = el
            .find_attr("name")
            .and_then(|attr| attr.value.clone())
            .unwrap_or_else(|| String::const_new("default"));
        let props = el
            .attrs
            .iter()
            .filter(|attr| attr.name != "name")
            .filter_map(|attr| {
                let name = bound_name(&attr.name).unwrap_or(&attr.name);
                (!name.is_empty()).then(|| String::from(name))
            })
            .collect();
        let entry = SlotEntry { comment, props };
        match self.walk.slots.get_mut(&name) {
            Some(existing) => existing.merge_from(entry),
            None => {
                self.walk.slots.insert(name, entry);
            }
        }
    }
}

/// Name bound by `:x` or `v-bind:x`.
fn bound_name(name: &str) -> Option<&str> {
    name.strip_prefix(':').or_else(|| name.strip_prefix("v-bind:"))
}

fn attribute(attr: &AttributeNode) -> TemplateAttr {
    TemplateAttr {
        name: attr.name.clone(),
        value: attr.value.clone(),
        expression: attr
            .value
            .as_deref()
            .and_then(|value| classify_attribute(&attr.name, value)),
    }
}

/// Classify the value of a directive or bound attribute. Static attributes
/// carry no expression.
fn classify_attribute(name: &str, value: &str) -> Option<ExpressionInfo> {
    if name == "v-for" {
        return Some(classify_loop(value));
    }
    if name == "slot-scope" || name == "scope" || name.starts_with('#') || name.starts_with("v-slot") {
        return Some(classify_scope(value));
    }
    let is_bound = name.starts_with(':') || name.starts_with('@') || name.starts_with("v-");
    is_bound.then(|| classify_expression(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::ExpressionKind;
    use portrait_armature::parse_template;

    fn walk(source: &str) -> TemplateWalk {
        let (root, errors) = parse_template(source);
        assert!(errors.is_empty(), "{errors:?}");
        walk_template(&root)
    }

    #[test]
    fn test_comment_attaches_to_following_sibling() {
        let result = walk("<div><!--c--><span/></div>");
        let div = &result.nodes[0];
        assert_eq!(div.comment, None);
        assert_eq!(div.children.len(), 1);
        assert_eq!(div.children[0].content, "span");
        assert_eq!(div.children[0].comment.as_deref(), Some("c"));
    }

    #[test]
    fn test_whitespace_text_is_pruned() {
        let result = walk("<div>\n  <span/>\n</div>");
        assert_eq!(result.nodes.len(), 1);
        assert_eq!(result.nodes[0].children.len(), 1);
    }

    #[test]
    fn test_text_is_condensed() {
        let result = walk("<p>\n  Hello\n   world  </p>");
        let text = &result.nodes[0].children[0];
        assert_eq!(text.kind, TemplateNodeKind::Text);
        assert_eq!(text.content, " Hello world ");
    }

    #[test]
    fn test_comment_window_between_siblings() {
        let result = walk("<!-- root --><a/><!-- one --><!-- two -->\n<b/><c/>");
        let nodes = &result.nodes;
        assert_eq!(nodes[0].comment.as_deref(), Some("root"));
        assert_eq!(nodes[1].comment.as_deref(), Some("one\ntwo"));
        assert_eq!(nodes[2].comment, None);
    }

    #[test]
    fn test_nested_comment_not_leaked_to_sibling() {
        let result = walk("<div><!-- inner --><i/></div><b/>");
        assert_eq!(result.nodes[1].comment, None);
        assert_eq!(result.nodes[0].children[0].comment.as_deref(), Some("inner"));
    }

    #[test]
    fn test_tag_and_attributes() {
        let result = walk(
            r#"<MyList :items="list" @select="onSelect" class="x"><li v-for="(item, i) in list" :key="item.id">{{ item.label | upper }}</li></MyList>"#,
        );
        let list = &result.nodes[0];
        assert_eq!(list.content, "my-list");
        assert_eq!(list.attrs[0].expression.as_ref().unwrap().kind, ExpressionKind::Identifier);
        assert_eq!(list.attrs[1].expression.as_ref().unwrap().kind, ExpressionKind::Identifier);
        assert!(list.attrs[2].expression.is_none());

        let li = &list.children[0];
        let for_expr = li.attrs[0].expression.as_ref().unwrap();
        assert_eq!(for_expr.kind, ExpressionKind::Loop);
        assert_eq!(for_expr.scope, vec![String::from("item"), String::from("i")]);
        assert_eq!(li.attrs[1].expression.as_ref().unwrap().kind, ExpressionKind::Member);

        let interp = &li.children[0];
        assert_eq!(interp.kind, TemplateNodeKind::Expression);
        assert_eq!(interp.expression.as_ref().unwrap().kind, ExpressionKind::Filter);

        assert_eq!(result.tags, vec![String::from("MyList"), String::from("li")]);
    }

    #[test]
    fn test_slots_collected() {
        let result = walk(
            r#"<div><!-- Header area --><slot name="header" :title="title"/><slot/><template #row="{ item }">{{ item }}</template></div>"#,
        );
        let header = result.slots.get("header").unwrap();
        assert_eq!(header.comment.as_deref(), Some("Header area"));
        assert_eq!(header.props, vec![String::from("title")]);
        assert!(result.slots.contains_key("default"));

        let template = &result.nodes[0].children[2];
        let scope = template.attrs[0].expression.as_ref().unwrap();
        assert_eq!(scope.kind, ExpressionKind::Scope);
        assert_eq!(scope.scope, vec![String::from("item")]);
    }
}
