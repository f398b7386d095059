//! CSS selector subset
//!
//! Parses and evaluates the selectors pagemark emits and the candidate union
//! it queries: type/universal, `#id`, `.class`, `[attr]`, `[attr=v]`,
//! `[attr^=v]`, `:nth-of-type(n)`, `:not(...)`, with descendant and child
//! combinators and comma-separated lists.

use crate::core::{PageError, Result};
use crate::dom::{Document, NodeId};

/// Parsed, comma-separated selector list
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorList {
    selectors: Vec<Complex>,
}

#[derive(Debug, Clone, PartialEq)]
struct Complex {
    compounds: Vec<Compound>,
    /// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`
    combinators: Vec<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    filters: Vec<Filter>,
}

#[derive(Debug, Clone, PartialEq)]
enum Filter {
    Id(String),
    Class(String),
    Attr { name: String, op: AttrOp },
    NthOfType(usize),
    Not(Box<Compound>),
}

#[derive(Debug, Clone, PartialEq)]
enum AttrOp {
    Exists,
    Equals(String),
    Prefix(String),
}

impl SelectorList {
    /// Parse a selector string
    pub fn parse(input: &str) -> Result<Self> {
        let mut parser = Parser::new(input);
        let mut selectors = Vec::new();
        loop {
            parser.skip_ws();
            selectors.push(parser.complex()?);
            parser.skip_ws();
            match parser.peek() {
                Some(',') => {
                    parser.bump();
                }
                None => break,
                Some(c) => return Err(parser.error(&format!("unexpected '{}'", c))),
            }
        }
        Ok(Self { selectors })
    }

    /// Whether `node` matches any selector of the list
    pub fn matches<D: Document + ?Sized>(&self, doc: &D, node: NodeId) -> bool {
        self.selectors.iter().any(|complex| {
            let last = complex.compounds.len() - 1;
            match_complex(doc, node, complex, last)
        })
    }
}

fn match_complex<D: Document + ?Sized>(
    doc: &D,
    node: NodeId,
    complex: &Complex,
    index: usize,
) -> bool {
    if !match_compound(doc, node, &complex.compounds[index]) {
        return false;
    }
    if index == 0 {
        return true;
    }
    match complex.combinators[index - 1] {
        Combinator::Child => doc
            .parent(node)
            .is_some_and(|parent| match_complex(doc, parent, complex, index - 1)),
        Combinator::Descendant => {
            let mut ancestor = doc.parent(node);
            while let Some(candidate) = ancestor {
                if match_complex(doc, candidate, complex, index - 1) {
                    return true;
                }
                ancestor = doc.parent(candidate);
            }
            false
        }
    }
}

fn match_compound<D: Document + ?Sized>(doc: &D, node: NodeId, compound: &Compound) -> bool {
    let Some(tag) = doc.tag_name(node) else {
        return false;
    };
    if let Some(expected) = &compound.tag {
        if *expected != tag {
            return false;
        }
    }
    compound.filters.iter().all(|filter| match filter {
        Filter::Id(id) => doc.attribute(node, "id").as_deref() == Some(id.as_str()),
        Filter::Class(class) => doc
            .attribute(node, "class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class)),
        Filter::Attr { name, op } => match (op, doc.attribute(node, name)) {
            (_, None) => false,
            (AttrOp::Exists, Some(_)) => true,
            (AttrOp::Equals(v), Some(actual)) => actual == *v,
            (AttrOp::Prefix(v), Some(actual)) => !v.is_empty() && actual.starts_with(v.as_str()),
        },
        Filter::NthOfType(n) => nth_of_type(doc, node, &tag) == *n,
        Filter::Not(inner) => !match_compound(doc, node, inner),
    })
}

/// 1-based position of `node` among its parent's children with the same tag
pub fn nth_of_type<D: Document + ?Sized>(doc: &D, node: NodeId, tag: &str) -> usize {
    match doc.parent(node) {
        Some(parent) => {
            let mut position = 0;
            for sibling in doc.children(parent) {
                if doc.tag_name(sibling).as_deref() == Some(tag) {
                    position += 1;
                }
                if sibling == node {
                    return position;
                }
            }
            position
        }
        None => 1,
    }
}

/// Escape an identifier the way `CSS.escape` does
pub fn css_escape(ident: &str) -> String {
    let chars: Vec<char> = ident.chars().collect();
    let mut out = String::with_capacity(ident.len());
    for (i, &c) in chars.iter().enumerate() {
        let code = c as u32;
        if c == '\0' {
            out.push('\u{FFFD}');
        } else if (0x01..=0x1f).contains(&code)
            || code == 0x7f
            || (i == 0 && c.is_ascii_digit())
            || (i == 1 && c.is_ascii_digit() && chars[0] == '-')
        {
            out.push_str(&format!("\\{:x} ", code));
        } else if i == 0 && c == '-' && chars.len() == 1 {
            out.push_str("\\-");
        } else if code >= 0x80 || c == '-' || c == '_' || c.is_ascii_alphanumeric() {
            out.push(c);
        } else {
            out.push('\\');
            out.push(c);
        }
    }
    out
}

/// Double-quote an attribute value for use inside `[attr=...]`
pub fn quote_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\a "),
            '\r' => out.push_str("\\d "),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

struct Parser<'a> {
    input: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(self.error(&format!("expected '{}', found '{}'", expected, c))),
            None => Err(self.error(&format!("expected '{}', found end of input", expected))),
        }
    }

    fn error(&self, msg: &str) -> PageError {
        PageError::selector(format!("{} at {} in `{}`", msg, self.pos, self.input))
    }

    fn complex(&mut self) -> Result<Complex> {
        let mut compounds = vec![self.compound()?];
        let mut combinators = Vec::new();
        loop {
            let had_ws = self.skip_ws();
            match self.peek() {
                None | Some(',') | Some(')') => break,
                Some('>') => {
                    self.bump();
                    self.skip_ws();
                    combinators.push(Combinator::Child);
                }
                Some(_) if had_ws => combinators.push(Combinator::Descendant),
                Some(c) => return Err(self.error(&format!("unexpected '{}'", c))),
            }
            compounds.push(self.compound()?);
        }
        Ok(Complex {
            compounds,
            combinators,
        })
    }

    fn compound(&mut self) -> Result<Compound> {
        let mut compound = Compound::default();
        let mut empty = true;

        match self.peek() {
            Some('*') => {
                self.bump();
                empty = false;
            }
            Some(c) if is_ident_char(c) || c == '\\' => {
                compound.tag = Some(self.ident()?.to_ascii_lowercase());
                empty = false;
            }
            _ => {}
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    compound.filters.push(Filter::Id(self.ident()?));
                }
                Some('.') => {
                    self.bump();
                    compound.filters.push(Filter::Class(self.ident()?));
                }
                Some('[') => {
                    self.bump();
                    compound.filters.push(self.attribute()?);
                }
                Some(':') => {
                    self.bump();
                    compound.filters.push(self.pseudo()?);
                }
                _ => break,
            }
            empty = false;
        }

        if empty {
            return Err(self.error("expected a selector"));
        }
        Ok(compound)
    }

    fn attribute(&mut self) -> Result<Filter> {
        self.skip_ws();
        let name = self.ident()?.to_ascii_lowercase();
        self.skip_ws();
        let op = match self.peek() {
            Some(']') => AttrOp::Exists,
            Some('=') => {
                self.bump();
                AttrOp::Equals(self.attr_value()?)
            }
            Some('^') => {
                self.bump();
                self.expect('=')?;
                AttrOp::Prefix(self.attr_value()?)
            }
            Some(c) => return Err(self.error(&format!("unsupported attribute operator '{}'", c))),
            None => return Err(self.error("unterminated attribute selector")),
        };
        self.skip_ws();
        self.expect(']')?;
        Ok(Filter::Attr { name, op })
    }

    fn attr_value(&mut self) -> Result<String> {
        self.skip_ws();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                let mut value = String::new();
                loop {
                    match self.bump() {
                        Some('\\') => value.push(self.escape()?),
                        Some(c) if c == quote => break,
                        Some(c) => value.push(c),
                        None => return Err(self.error("unterminated string")),
                    }
                }
                value
            }
            _ => self.ident()?,
        };
        self.skip_ws();
        Ok(value)
    }

    fn pseudo(&mut self) -> Result<Filter> {
        let name = self.ident()?.to_ascii_lowercase();
        match name.as_str() {
            "nth-of-type" => {
                self.expect('(')?;
                self.skip_ws();
                let start = self.pos;
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.pos += 1;
                }
                let digits: String = self.chars[start..self.pos].iter().collect();
                let n = digits
                    .parse::<usize>()
                    .map_err(|_| self.error("expected a position in :nth-of-type"))?;
                self.skip_ws();
                self.expect(')')?;
                Ok(Filter::NthOfType(n))
            }
            "not" => {
                self.expect('(')?;
                self.skip_ws();
                let inner = self.compound()?;
                self.skip_ws();
                self.expect(')')?;
                Ok(Filter::Not(Box::new(inner)))
            }
            other => Err(self.error(&format!("unsupported pseudo-class ':{}'", other))),
        }
    }

    fn ident(&mut self) -> Result<String> {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.bump();
                out.push(self.escape()?);
            } else if is_ident_char(c) {
                self.bump();
                out.push(c);
            } else {
                break;
            }
        }
        if out.is_empty() {
            return Err(self.error("expected an identifier"));
        }
        Ok(out)
    }

    /// Decode the escape following a consumed backslash
    fn escape(&mut self) -> Result<char> {
        let start = self.pos;
        while self.pos - start < 6 && self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
            self.pos += 1;
        }
        if self.pos > start {
            let hex: String = self.chars[start..self.pos].iter().collect();
            if self.peek().is_some_and(char::is_whitespace) {
                self.bump();
            }
            let code = u32::from_str_radix(&hex, 16).unwrap_or(0xFFFD);
            return Ok(match char::from_u32(code) {
                Some('\0') | None => '\u{FFFD}',
                Some(c) => c,
            });
        }
        self.bump().ok_or_else(|| self.error("dangling escape"))
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Rect;
    use crate::dom::{ElementSpec, MemoryDocument};

    fn sample() -> (MemoryDocument, Vec<NodeId>) {
        let mut doc = MemoryDocument::new("https://example.com/", "Sample");
        let body = doc.body_id();
        let form = doc.append_element(body, ElementSpec::new("form").attr("class", "login card"));
        let a = doc.append_element(
            form,
            ElementSpec::new("input")
                .attr("name", "user")
                .attr("type", "text")
                .rect(Rect::new(0.0, 0.0, 100.0, 20.0)),
        );
        let b = doc.append_element(form, ElementSpec::new("input").attr("type", "hidden"));
        let c = doc.append_element(body, ElementSpec::new("div").attr("id", "1:odd.id"));
        let d = doc.append_element(c, ElementSpec::new("button").attr("tabindex", "-1"));
        (doc, vec![form, a, b, c, d])
    }

    #[test]
    fn test_basic_matching() {
        let (doc, n) = sample();
        assert_eq!(doc.query_selector_all("form.login").unwrap(), vec![n[0]]);
        assert_eq!(
            doc.query_selector_all("input[name=\"user\"]").unwrap(),
            vec![n[1]]
        );
        assert_eq!(
            doc.query_selector_all("input:not([type=\"hidden\"])").unwrap(),
            vec![n[1]]
        );
        assert_eq!(
            doc.query_selector_all("form > input:nth-of-type(2)").unwrap(),
            vec![n[2]]
        );
        assert_eq!(doc.query_selector_all("body button").unwrap(), vec![n[4]]);
        assert!(doc.query_selector_all("form > button").unwrap().is_empty());
    }

    #[test]
    fn test_selector_list_is_document_ordered() {
        let (doc, n) = sample();
        assert_eq!(
            doc.query_selector_all("button, input[type='text']").unwrap(),
            vec![n[1], n[4]]
        );
    }

    #[test]
    fn test_prefix_operator() {
        let (doc, n) = sample();
        assert_eq!(
            doc.query_selector_all("[tabindex^=\"-\"]").unwrap(),
            vec![n[4]]
        );
        assert!(doc
            .query_selector_all("[tabindex]:not([tabindex^=\"-\"])")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_escaped_id_round_trips() {
        let (doc, n) = sample();
        let escaped = css_escape("1:odd.id");
        assert_eq!(escaped, "\\31 \\:odd\\.id");
        let selector = format!("#{}", escaped);
        assert_eq!(doc.query_selector_all(&selector).unwrap(), vec![n[3]]);
    }

    #[test]
    fn test_css_escape_rules() {
        assert_eq!(css_escape("plain-id_2"), "plain-id_2");
        assert_eq!(css_escape("-"), "\\-");
        assert_eq!(css_escape("-1x"), "-\\31 x");
        assert_eq!(css_escape("a b"), "a\\ b");
        assert_eq!(css_escape("größe"), "größe");
    }

    #[test]
    fn test_quote_attr_escapes() {
        assert_eq!(quote_attr("say \"hi\""), "\"say \\\"hi\\\"\"");
        let (mut doc, _) = sample();
        let body = doc.body_id();
        let node = doc.append_element(
            body,
            ElementSpec::new("a").attr("aria-label", "back\\slash \"q\""),
        );
        let selector = format!("a[aria-label={}]", quote_attr("back\\slash \"q\""));
        assert_eq!(doc.query_selector_all(&selector).unwrap(), vec![node]);
    }

    #[test]
    fn test_malformed_selectors_error() {
        for bad in ["", "div >", "[name", "a:hover", "#", "div,,p", "a[x~=y]"] {
            assert!(
                matches!(SelectorList::parse(bad), Err(PageError::Selector(_))),
                "expected error for {:?}",
                bad
            );
        }
    }
}
