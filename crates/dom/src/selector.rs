//! Selector parsing and matching over [`DocumentSnapshot`]s.
//!
//! Grammar (a CSS subset with the jQuery extensions tour triggers use):
//!
//! ```text
//! list      := chain ("," chain)*
//! chain     := compound (combinator compound)*
//! combinator:= whitespace | ">"
//! compound  := (tag | "*")? ("#" ident | "." ident | "[" attr "]" | ":" pseudo)*
//! ```
//!
//! Chains are evaluated left to right over match sets, the way jQuery does
//! once a positional filter (`:first`, `:last`, `:eq(n)`, `:nth(n)`) is
//! involved: the filter narrows the set of the compound it is written on, and
//! the next compound only descends from what is left. Simple selectors written
//! after the positional filter apply to the narrowed set.

use crate::errors::PredicateError;
use crate::snapshot::{DocumentSnapshot, ElementNode};

#[derive(Clone, Debug, PartialEq)]
pub struct SelectorList {
    chains: Vec<Chain>,
}

#[derive(Clone, Debug, PartialEq)]
struct Chain {
    parts: Vec<ChainPart>,
}

#[derive(Clone, Debug, PartialEq)]
struct ChainPart {
    // Relation to the part on the left; `None` for the leftmost part.
    combinator: Option<Combinator>,
    compound: Compound,
    positional: Option<Positional>,
    // Filters written after `positional`.
    trailing: Compound,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Clone, Debug, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    dom_id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrCondition>,
    pseudos: Vec<Pseudo>,
}

#[derive(Clone, Debug, PartialEq)]
enum AttrCondition {
    Exists(String),
    Eq(String, String),
    NotEq(String, String),
    StartsWith(String, String),
    EndsWith(String, String),
    Contains(String, String),
    Includes(String, String),
}

#[derive(Clone, Debug, PartialEq)]
enum Pseudo {
    Not(SelectorList),
    Has(SelectorList),
    Contains(String),
    ContainsExact(String),
    PropValue(String),
    Visible,
    Hidden,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Positional {
    First,
    Last,
    Eq(i64),
}

impl Positional {
    fn pick(self, hits: Vec<usize>) -> Vec<usize> {
        let len = hits.len() as i64;
        let idx = match self {
            Positional::First => 0,
            Positional::Last => len - 1,
            Positional::Eq(n) if n < 0 => len + n,
            Positional::Eq(n) => n,
        };
        if (0..len).contains(&idx) {
            vec![hits[idx as usize]]
        } else {
            Vec::new()
        }
    }
}

impl SelectorList {
    pub fn parse(expr: &str) -> Result<Self, PredicateError> {
        let mut parser = Parser::new(expr);
        let list = parser.list()?;
        parser.skip_ws();
        if !parser.at_end() {
            return Err(PredicateError::syntax(
                expr,
                format!("unexpected '{}'", parser.peek().unwrap_or(' ')),
            ));
        }
        Ok(list)
    }

    /// Positions of matching elements in document order, without duplicates.
    pub fn select(&self, doc: &DocumentSnapshot) -> Vec<usize> {
        self.select_in(doc, None)
    }

    /// Like [`select`](Self::select), restricted to descendants of `scope`.
    fn select_in(&self, doc: &DocumentSnapshot, scope: Option<usize>) -> Vec<usize> {
        let mut found: Vec<usize> = Vec::new();
        for chain in &self.chains {
            found.extend(chain.select_in(doc, scope));
        }
        found.sort_unstable();
        found.dedup();
        found
    }

    fn matches(&self, doc: &DocumentSnapshot, position: usize) -> bool {
        self.chains.iter().any(|chain| {
            if chain.is_positional() {
                chain.select_in(doc, None).binary_search(&position).is_ok()
            } else {
                chain.matches_at(doc, position, chain.parts.len() - 1)
            }
        })
    }
}

impl Chain {
    fn is_positional(&self) -> bool {
        self.parts.iter().any(|part| part.positional.is_some())
    }

    fn select_in(&self, doc: &DocumentSnapshot, scope: Option<usize>) -> Vec<usize> {
        let candidates: Vec<usize> = match scope {
            Some(root) => doc.descendants(root).collect(),
            None => (0..doc.len()).collect(),
        };
        let mut current: Vec<usize> = Vec::new();
        for (index, part) in self.parts.iter().enumerate() {
            let hits: Vec<usize> = candidates
                .iter()
                .copied()
                .filter(|&pos| {
                    doc.node(pos).is_some_and(|node| {
                        part.compound.matches(doc, pos, node)
                            && (index == 0 || part.follows(doc, node, pos, &current))
                    })
                })
                .collect();
            current = part.narrow(doc, hits);
            if current.is_empty() {
                break;
            }
        }
        current
    }

    /// Right-to-left check of one position; only valid without positional
    /// filters, which depend on the whole match set.
    fn matches_at(&self, doc: &DocumentSnapshot, position: usize, part: usize) -> bool {
        let Some(node) = doc.node(position) else {
            return false;
        };
        let current = &self.parts[part];
        if !current.compound.matches(doc, position, node) {
            return false;
        }
        if part == 0 {
            return true;
        }
        match current.combinator {
            Some(Combinator::Child) => node
                .parent
                .is_some_and(|parent| self.matches_at(doc, parent, part - 1)),
            Some(Combinator::Descendant) | None => doc
                .ancestors(position)
                .any(|ancestor| self.matches_at(doc, ancestor, part - 1)),
        }
    }
}

impl ChainPart {
    /// Whether `node` relates to one of `previous` (sorted) through this
    /// part's combinator.
    fn follows(
        &self,
        doc: &DocumentSnapshot,
        node: &ElementNode,
        position: usize,
        previous: &[usize],
    ) -> bool {
        match self.combinator {
            Some(Combinator::Child) => node
                .parent
                .is_some_and(|parent| previous.binary_search(&parent).is_ok()),
            Some(Combinator::Descendant) | None => doc
                .ancestors(position)
                .any(|ancestor| previous.binary_search(&ancestor).is_ok()),
        }
    }

    fn narrow(&self, doc: &DocumentSnapshot, hits: Vec<usize>) -> Vec<usize> {
        let Some(positional) = self.positional else {
            return hits;
        };
        positional
            .pick(hits)
            .into_iter()
            .filter(|&pos| {
                doc.node(pos)
                    .is_some_and(|node| self.trailing.matches(doc, pos, node))
            })
            .collect()
    }
}

impl Compound {
    fn is_empty(&self) -> bool {
        *self == Compound::default()
    }

    fn matches(&self, doc: &DocumentSnapshot, position: usize, node: &ElementNode) -> bool {
        if let Some(tag) = &self.tag {
            if &node.tag != tag {
                return false;
            }
        }
        if let Some(id) = &self.dom_id {
            if node.dom_id.as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|class| node.has_class(class)) {
            return false;
        }
        if !self.attrs.iter().all(|cond| cond.matches(node)) {
            return false;
        }
        self.pseudos.iter().all(|pseudo| match pseudo {
            Pseudo::Not(inner) => !inner.matches(doc, position),
            Pseudo::Has(inner) => !inner.select_in(doc, Some(position)).is_empty(),
            Pseudo::Contains(text) => doc.text_content(position).contains(text.as_str()),
            Pseudo::ContainsExact(text) => doc.text_content(position).trim() == text,
            Pseudo::PropValue(value) => node.value.as_deref().unwrap_or("") == value,
            Pseudo::Visible => node.is_rendered(),
            Pseudo::Hidden => !node.is_rendered(),
        })
    }
}

impl AttrCondition {
    fn matches(&self, node: &ElementNode) -> bool {
        let lookup = |name: &str| -> Option<String> {
            match name {
                "class" => Some(node.classes.join(" ")),
                "value" => node.attr(name).or(node.value.as_deref()).map(str::to_string),
                _ => node.attr(name).map(str::to_string),
            }
        };
        match self {
            AttrCondition::Exists(name) => lookup(name).is_some(),
            AttrCondition::Eq(name, value) => lookup(name).is_some_and(|v| &v == value),
            // jQuery: also true when the attribute is absent.
            AttrCondition::NotEq(name, value) => lookup(name).map_or(true, |v| &v != value),
            AttrCondition::StartsWith(name, value) => {
                lookup(name).is_some_and(|v| v.starts_with(value.as_str()))
            }
            AttrCondition::EndsWith(name, value) => {
                lookup(name).is_some_and(|v| v.ends_with(value.as_str()))
            }
            AttrCondition::Contains(name, value) => {
                lookup(name).is_some_and(|v| v.contains(value.as_str()))
            }
            AttrCondition::Includes(name, value) => {
                lookup(name).is_some_and(|v| v.split_whitespace().any(|word| word == value))
            }
        }
    }
}

struct Parser<'a> {
    expr: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(expr: &'a str) -> Self {
        Self {
            expr,
            chars: expr.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), PredicateError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{expected}'")))
        }
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn error(&self, reason: impl Into<String>) -> PredicateError {
        PredicateError::syntax(self.expr, format!("{} at {}", reason.into(), self.pos))
    }

    fn list(&mut self) -> Result<SelectorList, PredicateError> {
        let mut chains = vec![self.chain()?];
        loop {
            self.skip_ws();
            if self.eat(',') {
                chains.push(self.chain()?);
            } else {
                break;
            }
        }
        Ok(SelectorList { chains })
    }

    fn chain(&mut self) -> Result<Chain, PredicateError> {
        self.skip_ws();
        let mut parts = Vec::new();
        let mut combinator = None;
        loop {
            parts.push(self.part(combinator)?);

            let spaced = self.skip_ws();
            match self.peek() {
                None | Some(',') | Some(')') => break,
                Some('>') => {
                    self.bump();
                    self.skip_ws();
                    combinator = Some(Combinator::Child);
                }
                Some('+') | Some('~') => {
                    return Err(PredicateError::unsupported(self.expr, "sibling combinator"));
                }
                Some(_) if spaced => combinator = Some(Combinator::Descendant),
                Some(other) => return Err(self.error(format!("unexpected '{other}'"))),
            }
        }
        Ok(Chain { parts })
    }

    fn part(&mut self, combinator: Option<Combinator>) -> Result<ChainPart, PredicateError> {
        let mut compound = Compound::default();
        let mut trailing = Compound::default();
        let mut positional = None;
        let mut universal = false;

        if self.eat('*') {
            universal = true;
        } else if self.peek().is_some_and(is_ident_char) {
            compound.tag = Some(self.ident()?.to_ascii_lowercase());
        }

        loop {
            let target = if positional.is_some() {
                &mut trailing
            } else {
                &mut compound
            };
            match self.peek() {
                Some('#') => {
                    self.bump();
                    target.dom_id = Some(self.ident()?);
                }
                Some('.') => {
                    self.bump();
                    target.classes.push(self.ident()?);
                }
                Some('[') => {
                    self.bump();
                    target.attrs.push(self.attr()?);
                }
                Some(':') => {
                    self.bump();
                    match self.pseudo()? {
                        PseudoItem::Filter(pseudo) => target.pseudos.push(pseudo),
                        PseudoItem::Positional(filter) => {
                            if positional.is_some() {
                                return Err(PredicateError::unsupported(
                                    self.expr,
                                    "more than one positional filter",
                                ));
                            }
                            positional = Some(filter);
                        }
                    }
                }
                _ => break,
            }
        }

        if compound.is_empty() && !universal && positional.is_none() {
            return Err(self.error("empty compound selector"));
        }
        Ok(ChainPart {
            combinator,
            compound,
            positional,
            trailing,
        })
    }

    fn ident(&mut self) -> Result<String, PredicateError> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("expected identifier"));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn attr(&mut self) -> Result<AttrCondition, PredicateError> {
        self.skip_ws();
        let name = self.ident()?;
        self.skip_ws();
        if self.eat(']') {
            return Ok(AttrCondition::Exists(name));
        }
        let op = match self.bump() {
            Some('=') => '=',
            Some(op @ ('!' | '^' | '$' | '*' | '~')) => {
                self.expect('=')?;
                op
            }
            _ => return Err(self.error("expected attribute operator")),
        };
        self.skip_ws();
        let value = self.attr_value()?;
        self.skip_ws();
        self.expect(']')?;
        Ok(match op {
            '=' => AttrCondition::Eq(name, value),
            '!' => AttrCondition::NotEq(name, value),
            '^' => AttrCondition::StartsWith(name, value),
            '$' => AttrCondition::EndsWith(name, value),
            '*' => AttrCondition::Contains(name, value),
            _ => AttrCondition::Includes(name, value),
        })
    }

    fn attr_value(&mut self) -> Result<String, PredicateError> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => self.quoted(quote),
            _ => {
                let start = self.pos;
                while self
                    .peek()
                    .is_some_and(|c| c != ']' && !c.is_whitespace())
                {
                    self.pos += 1;
                }
                Ok(self.chars[start..self.pos].iter().collect())
            }
        }
    }

    fn quoted(&mut self, quote: char) -> Result<String, PredicateError> {
        self.expect(quote)?;
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some('\\') => match self.bump() {
                    Some(escaped) => out.push(escaped),
                    None => return Err(self.error("unterminated escape")),
                },
                Some(ch) if ch == quote => return Ok(out),
                Some(ch) => out.push(ch),
            }
        }
    }

    /// Argument of a text pseudo-class: quoted, or raw up to the closing paren.
    fn text_argument(&mut self) -> Result<String, PredicateError> {
        self.skip_ws();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => self.quoted(quote)?,
            _ => {
                let start = self.pos;
                while self.peek().is_some_and(|c| c != ')') {
                    self.pos += 1;
                }
                self.chars[start..self.pos]
                    .iter()
                    .collect::<String>()
                    .trim()
                    .to_string()
            }
        };
        self.skip_ws();
        Ok(value)
    }

    fn pseudo(&mut self) -> Result<PseudoItem, PredicateError> {
        let name = self.ident()?;
        let item = match name.as_str() {
            "first" => PseudoItem::Positional(Positional::First),
            "last" => PseudoItem::Positional(Positional::Last),
            "visible" => PseudoItem::Filter(Pseudo::Visible),
            "hidden" => PseudoItem::Filter(Pseudo::Hidden),
            "eq" | "nth" => {
                self.expect('(')?;
                let raw = self.text_argument()?;
                let n = raw
                    .parse::<i64>()
                    .map_err(|_| self.error(format!("invalid index '{raw}'")))?;
                self.expect(')')?;
                PseudoItem::Positional(Positional::Eq(n))
            }
            "not" | "has" => {
                self.expect('(')?;
                let inner = self.list()?;
                self.skip_ws();
                self.expect(')')?;
                if name == "not" {
                    PseudoItem::Filter(Pseudo::Not(inner))
                } else {
                    PseudoItem::Filter(Pseudo::Has(inner))
                }
            }
            "contains" | "containsExact" | "propValue" => {
                self.expect('(')?;
                let text = self.text_argument()?;
                self.expect(')')?;
                PseudoItem::Filter(match name.as_str() {
                    "contains" => Pseudo::Contains(text),
                    "containsExact" => Pseudo::ContainsExact(text),
                    _ => Pseudo::PropValue(text),
                })
            }
            other => {
                return Err(PredicateError::unsupported(
                    self.expr,
                    format!(":{other}"),
                ))
            }
        };
        Ok(item)
    }
}

enum PseudoItem {
    Filter(Pseudo),
    Positional(Positional),
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;
    use crate::snapshot::ElementSpec;

    fn forum() -> DocumentSnapshot {
        DocumentSnapshot::from_tree(
            "/forum",
            Size::new(1280.0, 800.0),
            vec![ElementSpec::new("body", "body")
                .with_class("modal-open")
                .child(
                    ElementSpec::new("navbar", "div")
                        .with_id("oe_main_menu_navbar")
                        .child(
                            ElementSpec::new("new-page", "a")
                                .with_attr("data-action", "new_page")
                                .with_text("New Page"),
                        ),
                )
                .child(
                    ElementSpec::new("modal", "div").with_class("modal").child(
                        ElementSpec::new("editor", "form")
                            .with_id("editor_new_forum")
                            .child(
                                ElementSpec::new("name", "input")
                                    .with_attr("type", "text")
                                    .with_value(""),
                            )
                            .child(
                                ElementSpec::new("continue", "button")
                                    .with_class("btn")
                                    .with_class("btn-primary")
                                    .with_text(" Continue "),
                            ),
                    ),
                )
                .child(ElementSpec::new("a1", "a").with_class("answer").with_text("one"))
                .child(ElementSpec::new("a2", "a").with_class("answer").with_text("two"))
                .child(
                    ElementSpec::new("a3", "a")
                        .with_class("answer")
                        .with_text("three")
                        .hidden(),
                )],
        )
    }

    fn blog() -> DocumentSnapshot {
        let cell = |key: &str| {
            ElementSpec::new(key, "div")
                .with_class("o_existing_attachment_cell")
                .child(ElementSpec::new(format!("{key}-img"), "img"))
        };
        let section = |key: &str, text: &str| {
            ElementSpec::new(key, "section")
                .child(ElementSpec::new(format!("{key}-p1"), "p").with_text(text))
                .child(ElementSpec::new(format!("{key}-p2"), "p").with_text("more"))
        };
        DocumentSnapshot::from_tree(
            "/blog",
            Size::new(1280.0, 800.0),
            vec![ElementSpec::new("body", "body")
                .child(
                    ElementSpec::new("content", "div")
                        .with_id("blog_content")
                        .child(section("s1", "Start writing here..."))
                        .child(section("s2", "Second section")),
                )
                .child(
                    ElementSpec::new("dialog", "div")
                        .with_class("modal")
                        .with_class("o_select_media_dialog")
                        .child(cell("c0"))
                        .child(cell("c1")),
                )
                .child(
                    ElementSpec::new("post", "button").with_class("btn").child(
                        ElementSpec::new("post-label", "span").with_text("Post Your Question"),
                    ),
                )
                .child(
                    ElementSpec::new("title", "input")
                        .with_attr("type", "text")
                        .with_attr("value", "My event"),
                )
                .child(ElementSpec::new("untitled", "input").with_attr("type", "text"))],
        )
    }

    fn keys(doc: &DocumentSnapshot, expr: &str) -> Vec<String> {
        SelectorList::parse(expr)
            .unwrap()
            .select(doc)
            .into_iter()
            .map(|pos| doc.node(pos).unwrap().id.0.clone())
            .collect()
    }

    #[test]
    fn ids_attributes_and_descendants() {
        let doc = forum();
        assert_eq!(
            keys(&doc, "#oe_main_menu_navbar a[data-action=new_page]"),
            vec!["new-page"]
        );
        assert_eq!(keys(&doc, "#editor_new_forum input[type=text]"), vec!["name"]);
        assert_eq!(keys(&doc, ".modal > form > button.btn-primary"), vec!["continue"]);
        assert!(keys(&doc, "body > button").is_empty());
    }

    #[test]
    fn text_and_value_pseudos() {
        let doc = forum();
        assert_eq!(keys(&doc, "button:contains(\"Continue\")"), vec!["continue"]);
        assert_eq!(keys(&doc, "button:containsExact(Continue)"), vec!["continue"]);
        assert_eq!(keys(&doc, "input:propValue(\"\")"), vec!["name"]);
        assert!(keys(&doc, ".modal input[type=text]:not(:propValue(\"\"))").is_empty());
        assert_eq!(keys(&doc, "body:not(.modal-open)").len(), 0);
        assert_eq!(keys(&doc, "div:has(input)"), vec!["modal"]);
    }

    #[test]
    fn text_pseudos_read_descendant_text() {
        let doc = blog();
        assert_eq!(keys(&doc, "button:contains(\"Post Your Question\")"), vec!["post"]);
        assert_eq!(
            keys(&doc, "button:containsExact(Post Your Question)"),
            vec!["post"]
        );
        assert_eq!(
            keys(&doc, "section:containsExact(Second sectionmore)"),
            vec!["s2"]
        );
    }

    #[test]
    fn not_equal_attributes_include_missing_ones() {
        let doc = blog();
        assert_eq!(keys(&doc, "input[type=text][value!=\"\"]"), vec!["title", "untitled"]);
        assert_eq!(keys(&doc, "input[value!=\"My event\"]"), vec!["untitled"]);
    }

    #[test]
    fn positional_filters_apply_to_chain_matches() {
        let doc = forum();
        assert_eq!(keys(&doc, "a.answer:first"), vec!["a1"]);
        assert_eq!(keys(&doc, "a.answer:last"), vec!["a3"]);
        assert_eq!(keys(&doc, "a.answer:eq(1)"), vec!["a2"]);
        assert_eq!(keys(&doc, "a.answer:nth(1)"), vec!["a2"]);
        assert_eq!(keys(&doc, "a.answer:eq(-1)"), vec!["a3"]);
        assert!(keys(&doc, "a.answer:eq(9)").is_empty());
        assert_eq!(keys(&doc, "a.answer:visible"), vec!["a1", "a2"]);
    }

    #[test]
    fn positional_filters_narrow_before_descending() {
        let doc = blog();
        assert_eq!(
            keys(&doc, ".o_select_media_dialog .o_existing_attachment_cell:nth(1) img"),
            vec!["c1-img"]
        );
        assert_eq!(keys(&doc, "#blog_content section:first p:first"), vec!["s1-p1"]);
        let untouched =
            "#blog_content section:first p:first:not(:containsExact(Start writing here...))";
        assert!(keys(&doc, untouched).is_empty());
        assert_eq!(keys(&doc, "section:last p:first"), vec!["s2-p1"]);
        assert_eq!(keys(&doc, "section p:first"), vec!["s1-p1"]);
    }

    #[test]
    fn positional_filters_inside_has_are_scoped() {
        let doc = blog();
        assert_eq!(
            keys(&doc, ".modal:has(.o_existing_attachment_cell:nth(1))"),
            vec!["dialog"]
        );
        assert!(keys(&doc, ".modal:has(.o_existing_attachment_cell:nth(2))").is_empty());
        assert_eq!(keys(&doc, "section:has(p:last)"), vec!["s1", "s2"]);
    }

    #[test]
    fn groups_are_deduplicated_in_document_order() {
        let doc = forum();
        assert_eq!(
            keys(&doc, "a.answer:first, #editor_new_forum, a.answer"),
            vec!["editor", "a1", "a2", "a3"]
        );
    }

    #[test]
    fn bundled_tour_triggers_are_understood() {
        // Triggers of the website, blog, event and forum tours.
        const TRIGGERS: &[&str] = &[
            "a[data-action=edit]",
            "#snippet_structure .oe_snippet:eq(1)",
            "#wrapwrap .s_text_block_image_fw h2",
            ".oe_overlay_options .oe_options",
            ".oe_snippet_parent",
            "#wrapwrap .s_text_block_image_fw h2:not(:containsExact(\"Headline\"))",
            "#snippet_structure .oe_snippet:eq(6)",
            "button[data-action=save]",
            "a[data-action=show-mobile-preview]",
            ".modal-dialog:has(#mobile-viewport) button[data-dismiss=modal]",
            "#content-menu-button",
            "body:not(.modal-open)",
            "#oe_main_menu_navbar a[data-action=new_page]",
            "a[data-action=new_blog_post]",
            "#wrap",
            "#o_scroll .oe_snippet",
            "h1[data-oe-expression=\"blog_post.name\"]",
            "#oe_manipulators .oe_overlay.oe_active a.btn.btn-primary.btn-sm",
            "#wrap h1[data-oe-expression=\"blog_post.name\"]:not(:containsExact(\"\"))",
            "a:containsExact(Change Cover):eq(1)",
            ".o_select_media_dialog .o_existing_attachment_cell:nth(1) img",
            ".modal:has(.o_existing_attachment_cell:nth(1))",
            ".o_select_media_dialog .btn.o_save_button",
            ".o_existing_attachment_cell.o_selected",
            ".blog_content section.mt16",
            "#blog_content section:first p:first:not(:containsExact(Start writing here...))",
            "body:not(.editor_enable)",
            "button[data-dismiss=modal]",
            ".modal:has(#mobile-viewport)",
            "button.btn-danger.js_publish_btn",
            "#wrap h1",
            ".js_publish_management button.js_publish_btn.btn-success:visible",
            "a[data-action=new_event]",
            ".modal-dialog #editor_new_event input[type=text]",
            ".modal-dialog button.btn-primary.btn-continue",
            ".modal-dialog #editor_new_event input[type=text][value!=\"\"]",
            "#snippet_structure .oe_snippet:eq(2)",
            ".js_publish_management button[data-toggle=\"dropdown\"]",
            "a[data-action=new_forum]",
            "#editor_new_forum input[type=text]",
            "button.btn-primary",
            ".modal #editor_new_forum input[type=text]:not(:propValue(\"\"))",
            ".btn-block a:first",
            "input[name=post_name]",
            ".note-editable p",
            "input[name=post_name]:not(:propValue(\"\"))",
            ".select2-choices",
            ".note-editable p:not(:containsExact(\"<br>\"))",
            "button:contains(\"Post Your Question\")",
            "input[id=s2id_autogen2]:not(:propValue(\"Tags\"))",
            ".fa-star",
            "button:contains(\"Post Answer\")",
            ".fa-check-circle",
            "a[data-karma=\"20\"]:first",
            ".oe_answer_true",
        ];
        let docs = [forum(), blog()];
        for trigger in TRIGGERS {
            let selector = SelectorList::parse(trigger)
                .unwrap_or_else(|err| panic!("{trigger}: {err}"));
            for doc in &docs {
                let hits = selector.select(doc);
                assert!(hits.windows(2).all(|pair| pair[0] < pair[1]), "{trigger}");
            }
        }
        assert_eq!(keys(&forum(), "body:not(.modal-open)").len(), 0);
        assert_eq!(keys(&blog(), "body:not(.modal-open)"), vec!["body"]);
    }

    #[test]
    fn malformed_and_unsupported_expressions() {
        assert!(matches!(
            SelectorList::parse("a[data-action"),
            Err(PredicateError::Syntax { .. })
        ));
        assert!(matches!(
            SelectorList::parse(""),
            Err(PredicateError::Syntax { .. })
        ));
        assert!(matches!(
            SelectorList::parse("a:hover"),
            Err(PredicateError::Unsupported { .. })
        ));
        assert!(matches!(
            SelectorList::parse("li:first:last a"),
            Err(PredicateError::Unsupported { .. })
        ));
        assert!(matches!(
            SelectorList::parse("a + b"),
            Err(PredicateError::Unsupported { .. })
        ));
        assert!(matches!(
            SelectorList::parse("a:nth(x)"),
            Err(PredicateError::Syntax { .. })
        ));
    }
}
