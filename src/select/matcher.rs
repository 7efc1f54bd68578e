//! Selector matching against the arena tree.
//!
//! Complex selectors are matched right to left: the last compound must match
//! the candidate, then each combinator walks up or back through the tree
//! looking for an element that matches the compound before it.

use super::parser::{
    AttributeOp, AttributeSelector, Combinator, ComplexSelector, Compound, Pseudo, Simple,
    SelectorList,
};
use crate::tree::{Document, NodeId, NodeKind};

/// HTML attributes whose values compare case-insensitively unless the
/// selector says otherwise.
const CASE_INSENSITIVE_ATTRIBUTES: &[&str] = &[
    "accept",
    "accept-charset",
    "align",
    "alink",
    "axis",
    "bgcolor",
    "charset",
    "checked",
    "clear",
    "codetype",
    "color",
    "compact",
    "declare",
    "defer",
    "dir",
    "direction",
    "disabled",
    "enctype",
    "face",
    "frame",
    "hreflang",
    "http-equiv",
    "lang",
    "language",
    "link",
    "media",
    "method",
    "multiple",
    "nohref",
    "noresize",
    "noshade",
    "nowrap",
    "readonly",
    "rel",
    "rev",
    "rules",
    "scope",
    "scrolling",
    "selected",
    "shape",
    "target",
    "text",
    "type",
    "valign",
    "valuetype",
    "vlink",
];

/// Everything a match needs besides the selector and the candidate.
#[derive(Clone, Copy)]
pub(crate) struct MatchContext<'a> {
    pub doc: &'a Document,
    /// Exact name comparison and no HTML attribute rules.
    pub xml: bool,
    /// The nodes `:scope` and leading combinators refer to.
    pub scope: &'a [NodeId],
}

impl<'a> MatchContext<'a> {
    fn with_scope(self, scope: &'a [NodeId]) -> Self {
        Self { scope, ..self }
    }

    fn name_is(&self, id: NodeId, name: &str) -> bool {
        self.doc.node_name(id).is_some_and(|n| {
            if self.xml {
                n == name
            } else {
                n.eq_ignore_ascii_case(name)
            }
        })
    }

    fn attr(&self, id: NodeId, name: &str) -> Option<&'a str> {
        self.doc
            .attributes(id)
            .iter()
            .find(|a| {
                if self.xml {
                    a.name == name
                } else {
                    a.name.eq_ignore_ascii_case(name)
                }
            })
            .map(|a| a.value.as_str())
    }

    fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    fn type_is(&self, id: NodeId, ty: &str) -> bool {
        self.attr(id, "type").is_some_and(|t| t.eq_ignore_ascii_case(ty))
    }
}

/// Returns `true` if any selector of `list` matches `id`.
pub(crate) fn matches_list(ctx: MatchContext<'_>, id: NodeId, list: &SelectorList) -> bool {
    ctx.doc.is_element(id) && list.0.iter().any(|sel| matches_complex(ctx, id, sel))
}

pub(crate) fn matches_complex(ctx: MatchContext<'_>, id: NodeId, sel: &ComplexSelector) -> bool {
    match_from(ctx, id, sel, sel.compounds.len() - 1)
}

fn match_from(ctx: MatchContext<'_>, id: NodeId, sel: &ComplexSelector, index: usize) -> bool {
    if !matches_compound(ctx, id, &sel.compounds[index]) {
        return false;
    }
    if index == 0 {
        return match sel.leading {
            None => true,
            Some(combinator) => related_to_scope(ctx, id, combinator),
        };
    }
    let doc = ctx.doc;
    match sel.combinators[index - 1] {
        Combinator::Child => doc
            .parent(id)
            .filter(|&p| doc.is_element(p))
            .is_some_and(|p| match_from(ctx, p, sel, index - 1)),
        Combinator::Descendant => doc
            .ancestors(id)
            .skip(1)
            .take_while(|&a| doc.is_element(a))
            .any(|a| match_from(ctx, a, sel, index - 1)),
        Combinator::Adjacent => doc
            .prev_element_sibling(id)
            .is_some_and(|s| match_from(ctx, s, sel, index - 1)),
        Combinator::Sibling => {
            let mut cur = doc.prev_element_sibling(id);
            while let Some(s) = cur {
                if match_from(ctx, s, sel, index - 1) {
                    return true;
                }
                cur = doc.prev_element_sibling(s);
            }
            false
        }
    }
}

/// Checks a leading combinator against the scope nodes.
fn related_to_scope(ctx: MatchContext<'_>, id: NodeId, combinator: Combinator) -> bool {
    let doc = ctx.doc;
    let in_scope = |n: NodeId| ctx.scope.contains(&n);
    match combinator {
        Combinator::Child => doc.parent(id).is_some_and(in_scope),
        Combinator::Descendant => doc.ancestors(id).skip(1).any(in_scope),
        Combinator::Adjacent => doc.prev_element_sibling(id).is_some_and(in_scope),
        Combinator::Sibling => {
            let mut cur = doc.prev_sibling(id);
            while let Some(s) = cur {
                if in_scope(s) {
                    return true;
                }
                cur = doc.prev_sibling(s);
            }
            false
        }
    }
}

fn matches_compound(ctx: MatchContext<'_>, id: NodeId, compound: &Compound) -> bool {
    compound.0.iter().all(|simple| matches_simple(ctx, id, simple))
}

fn matches_simple(ctx: MatchContext<'_>, id: NodeId, simple: &Simple) -> bool {
    match simple {
        Simple::Universal => true,
        Simple::Type(name) => ctx.name_is(id, name),
        Simple::Id(value) => ctx.attr(id, "id") == Some(value.as_str()),
        Simple::Class(class) => ctx
            .attr(id, "class")
            .is_some_and(|c| c.split_ascii_whitespace().any(|w| w == class)),
        Simple::Attribute(attr) => matches_attribute(ctx, id, attr),
        Simple::Pseudo(pseudo) => matches_pseudo(ctx, id, pseudo),
    }
}

fn matches_attribute(ctx: MatchContext<'_>, id: NodeId, sel: &AttributeSelector) -> bool {
    let actual = ctx.attr(id, &sel.name);
    if sel.op == AttributeOp::Exists {
        return actual.is_some();
    }
    if sel.op == AttributeOp::NotEquals {
        return match actual {
            None => true,
            Some(v) if sel.value.is_empty() => !v.is_empty(),
            Some(v) => !text_eq(v, &sel.value, ignore_case(ctx, sel)),
        };
    }
    let Some(actual) = actual else {
        return false;
    };
    let fold = ignore_case(ctx, sel);
    let (actual, expected) = if fold {
        (actual.to_lowercase(), sel.value.to_lowercase())
    } else {
        (actual.to_string(), sel.value.clone())
    };
    match sel.op {
        AttributeOp::Equals => actual == expected,
        AttributeOp::Includes => {
            !expected.is_empty()
                && !expected.contains(char::is_whitespace)
                && actual.split_ascii_whitespace().any(|w| w == expected)
        }
        AttributeOp::DashMatch => {
            actual == expected
                || actual
                    .strip_prefix(expected.as_str())
                    .is_some_and(|rest| rest.starts_with('-'))
        }
        AttributeOp::Prefix => !expected.is_empty() && actual.starts_with(&expected),
        AttributeOp::Suffix => !expected.is_empty() && actual.ends_with(&expected),
        AttributeOp::Substring => !expected.is_empty() && actual.contains(&expected),
        AttributeOp::Exists | AttributeOp::NotEquals => false,
    }
}

fn ignore_case(ctx: MatchContext<'_>, sel: &AttributeSelector) -> bool {
    sel.ignore_case.unwrap_or_else(|| {
        !ctx.xml
            && CASE_INSENSITIVE_ATTRIBUTES
                .binary_search(&sel.name.to_ascii_lowercase().as_str())
                .is_ok()
    })
}

fn text_eq(a: &str, b: &str, fold: bool) -> bool {
    if fold {
        a.to_lowercase() == b.to_lowercase()
    } else {
        a == b
    }
}

fn matches_pseudo(ctx: MatchContext<'_>, id: NodeId, pseudo: &Pseudo) -> bool {
    let doc = ctx.doc;
    match pseudo {
        Pseudo::FirstChild => doc.prev_element_sibling(id).is_none(),
        Pseudo::LastChild => doc.next_element_sibling(id).is_none(),
        Pseudo::OnlyChild => {
            doc.prev_element_sibling(id).is_none() && doc.next_element_sibling(id).is_none()
        }
        Pseudo::FirstOfType => type_position(ctx, id, true, false) == 1,
        Pseudo::LastOfType => type_position(ctx, id, true, true) == 1,
        Pseudo::OnlyOfType => {
            type_position(ctx, id, true, false) == 1 && type_position(ctx, id, true, true) == 1
        }
        Pseudo::Nth {
            a,
            b,
            of_type,
            from_end,
        } => nth_matches(*a, *b, type_position(ctx, id, *of_type, *from_end)),
        Pseudo::Empty => is_empty(doc, id),
        Pseudo::Parent => !is_empty(doc, id),
        Pseudo::Root => is_root(doc, id),
        Pseudo::Scope => {
            if ctx.scope.is_empty() {
                is_root(doc, id)
            } else {
                ctx.scope.contains(&id)
            }
        }
        Pseudo::Not(list) => !matches_list(ctx, id, list),
        Pseudo::Is(list) => matches_list(ctx, id, list),
        Pseudo::Has(list) => {
            let scope = [id];
            has_relative_match(ctx.with_scope(&scope), list)
        }
        Pseudo::Contains(text) => doc.text_content(id).contains(text.as_str()),
        Pseudo::Checked => {
            (ctx.name_is(id, "input")
                && (ctx.type_is(id, "checkbox") || ctx.type_is(id, "radio"))
                && ctx.has_attr(id, "checked"))
                || is_selected(ctx, id)
        }
        Pseudo::Selected => is_selected(ctx, id),
        Pseudo::Disabled => is_disabled(ctx, id),
        Pseudo::Enabled => !is_disabled(ctx, id),
        Pseudo::Header => ["h1", "h2", "h3", "h4", "h5", "h6"]
            .iter()
            .any(|h| ctx.name_is(id, h)),
        Pseudo::Input => ["input", "textarea", "select", "button"]
            .iter()
            .any(|n| ctx.name_is(id, n)),
        Pseudo::Button => {
            ctx.name_is(id, "button") || (ctx.name_is(id, "input") && ctx.type_is(id, "button"))
        }
        Pseudo::Text => {
            ctx.name_is(id, "input")
                && ctx
                    .attr(id, "type")
                    .map_or(true, |t| t.is_empty() || t.eq_ignore_ascii_case("text"))
        }
        Pseudo::Link => {
            ["a", "area", "link"].iter().any(|n| ctx.name_is(id, n)) && ctx.has_attr(id, "href")
        }
        Pseudo::InputType(ty) => ctx.type_is(id, ty),
    }
}

/// 1-based position among element siblings, optionally only those with the
/// same name, counted from the start or the end.
fn type_position(ctx: MatchContext<'_>, id: NodeId, of_type: bool, from_end: bool) -> i32 {
    let doc = ctx.doc;
    let name = doc.node_name(id).unwrap_or_default();
    let step = |n: NodeId| {
        if from_end {
            doc.next_element_sibling(n)
        } else {
            doc.prev_element_sibling(n)
        }
    };
    let mut position = 1;
    let mut cur = step(id);
    while let Some(s) = cur {
        if !of_type || ctx.name_is(s, name) {
            position += 1;
        }
        cur = step(s);
    }
    position
}

/// Does `position` equal `a*n + b` for some `n >= 0`?
fn nth_matches(a: i32, b: i32, position: i32) -> bool {
    if a == 0 {
        return position == b;
    }
    let (a, diff) = (i64::from(a), i64::from(position) - i64::from(b));
    diff % a == 0 && diff / a >= 0
}

fn is_empty(doc: &Document, id: NodeId) -> bool {
    !doc.children(id).any(|c| match &doc.node(c).kind {
        NodeKind::Element { .. } => true,
        NodeKind::Text { content } | NodeKind::CData { content } => !content.is_empty(),
        _ => false,
    })
}

fn is_root(doc: &Document, id: NodeId) -> bool {
    doc.parent(id).map_or(true, |p| !doc.is_element(p))
}

/// `option` that is selected explicitly, or the implicit first option of a
/// single-select with no explicit selection.
fn is_selected(ctx: MatchContext<'_>, id: NodeId) -> bool {
    if !ctx.name_is(id, "option") {
        return false;
    }
    if ctx.has_attr(id, "selected") {
        return true;
    }
    let Some(select) = ctx.doc.parent(id).filter(|&p| ctx.name_is(p, "select")) else {
        return false;
    };
    !ctx.has_attr(select, "multiple")
        && !ctx
            .doc
            .element_children(select)
            .any(|o| ctx.name_is(o, "option") && ctx.has_attr(o, "selected"))
        && type_position(ctx, id, true, false) == 1
}

fn is_disabled(ctx: MatchContext<'_>, id: NodeId) -> bool {
    let doc = ctx.doc;
    let form_control = ["button", "input", "select", "textarea", "optgroup", "option"]
        .iter()
        .any(|n| ctx.name_is(id, n));
    if form_control && ctx.has_attr(id, "disabled") {
        return true;
    }
    if ctx.name_is(id, "option")
        && doc
            .parent(id)
            .is_some_and(|p| ctx.name_is(p, "optgroup") && ctx.has_attr(p, "disabled"))
    {
        return true;
    }
    let disabled_fieldset = |n: NodeId| ctx.name_is(n, "fieldset") && ctx.has_attr(n, "disabled");
    if !doc.ancestors(id).skip(1).any(disabled_fieldset) {
        return false;
    }
    // Content of a disabled fieldset's first legend stays enabled.
    !doc.ancestors(id).skip(1).any(|legend| {
        ctx.name_is(legend, "legend")
            && type_position(ctx, legend, true, false) == 1
            && doc.ancestors(legend).skip(1).any(disabled_fieldset)
    })
}

/// Matches a relative selector list with `ctx.scope` as the anchor.
fn has_relative_match(ctx: MatchContext<'_>, list: &SelectorList) -> bool {
    let mut found = false;
    for_each_candidate(ctx, list, |_| {
        found = true;
        false
    });
    found
}

/// Calls `visit` for every element under or beside the scope that matches
/// `list`, in document order per scope node. Stops when `visit` returns
/// `false`.
pub(crate) fn for_each_candidate(
    ctx: MatchContext<'_>,
    list: &SelectorList,
    mut visit: impl FnMut(NodeId) -> bool,
) {
    let doc = ctx.doc;
    let sibling_scoped: Vec<&ComplexSelector> = list
        .0
        .iter()
        .filter(|c| matches!(c.leading, Some(Combinator::Adjacent | Combinator::Sibling)))
        .collect();

    for &scope in ctx.scope {
        for id in doc.descendants(scope) {
            if matches_list(ctx, id, list) && !visit(id) {
                return;
            }
        }
        if sibling_scoped.is_empty() {
            continue;
        }
        let mut sibling = doc.next_sibling(scope);
        while let Some(s) = sibling {
            for id in std::iter::once(s).chain(doc.descendants(s)) {
                if doc.is_element(id)
                    && sibling_scoped.iter().any(|c| matches_complex(ctx, id, c))
                    && !visit(id)
                {
                    return;
                }
            }
            sibling = doc.next_sibling(s);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_nth_matches() {
        // 2n+1
        assert!(nth_matches(2, 1, 1));
        assert!(!nth_matches(2, 1, 2));
        assert!(nth_matches(2, 1, 3));
        // -n+3 selects the first three
        assert!(nth_matches(-1, 3, 3));
        assert!(nth_matches(-1, 3, 1));
        assert!(!nth_matches(-1, 3, 4));
        // plain index
        assert!(nth_matches(0, 2, 2));
        assert!(!nth_matches(0, 2, 3));
    }

    #[test]
    fn test_nth_matches_extreme_coefficients() {
        assert!(nth_matches(1, i32::MIN, 1));
        assert!(!nth_matches(-1, i32::MIN, 1));
        assert!(nth_matches(i32::MIN, 1, 1));
        assert!(!nth_matches(i32::MAX, i32::MIN, i32::MAX));
    }

    #[test]
    fn test_case_insensitive_attributes_sorted() {
        let mut sorted = CASE_INSENSITIVE_ATTRIBUTES.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, CASE_INSENSITIVE_ATTRIBUTES);
    }
}
