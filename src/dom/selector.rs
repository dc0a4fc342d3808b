//! A small CSS selector engine.
//!
//! Supported syntax:
//!
//! - type (`button`), universal (`*`), id (`#name`) and class (`.save-user`)
//! - attribute presence (`[disabled]`) and equality (`[name=user-name]`,
//!   `[type="text"]`)
//! - compounds of the above (`button.set-age[type=button]`)
//! - descendant (`form input`) and child (`form > button`) combinators
//! - selector lists (`.set-name, .set-age`)
//!
//! Pseudo-classes and sibling combinators are rejected with
//! [`DomError::InvalidSelector`].

use crate::error::DomError;
use crate::node::NodeRef;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Complex>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    compounds: Vec<Compound>,
    /// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`.
    combinators: Vec<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<(String, Option<String>)>,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self, DomError> {
        let mut parser = Parser {
            source,
            chars: source.char_indices().peekable(),
        };
        let mut alternatives = vec![parser.complex()?];
        while parser.eat(',') {
            alternatives.push(parser.complex()?);
        }
        if let Some(&(_, c)) = parser.chars.peek() {
            return Err(parser.error(&format!("unexpected '{}'", c)));
        }
        Ok(Self { alternatives })
    }

    /// True if `node` is an element matching any alternative of the list.
    pub fn matches(&self, node: &NodeRef) -> bool {
        self.alternatives
            .iter()
            .any(|complex| complex.matches_at(complex.compounds.len() - 1, node))
    }
}

impl std::str::FromStr for Selector {
    type Err = DomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Selector::parse(s)
    }
}

impl Complex {
    fn matches_at(&self, index: usize, node: &NodeRef) -> bool {
        if !self.compounds[index].matches(node) {
            return false;
        }
        if index == 0 {
            return true;
        }

        match self.combinators[index - 1] {
            Combinator::Child => node
                .parent()
                .map(|parent| self.matches_at(index - 1, &parent))
                .unwrap_or(false),
            Combinator::Descendant => {
                let mut current = node.parent();
                while let Some(ancestor) = current {
                    if self.matches_at(index - 1, &ancestor) {
                        return true;
                    }
                    current = ancestor.parent();
                }
                false
            }
        }
    }
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attributes.is_empty()
    }

    fn matches(&self, node: &NodeRef) -> bool {
        let Some(tag) = node.tag() else {
            return false;
        };
        if let Some(expected) = &self.tag {
            if expected != "*" && *expected != tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if node.attr("id").as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|class| node.has_class(class)) {
            return false;
        }
        self.attributes.iter().all(|(name, expected)| {
            match (node.attr(name), expected) {
                (None, _) => false,
                (Some(_), None) => true,
                (Some(actual), Some(expected)) => actual == *expected,
            }
        })
    }
}

struct Parser<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl Parser<'_> {
    fn error(&self, reason: &str) -> DomError {
        DomError::InvalidSelector(format!("{} in \"{}\"", reason, self.source))
    }

    fn skip_whitespace(&mut self) -> bool {
        let mut skipped = false;
        while matches!(self.chars.peek(), Some((_, c)) if c.is_whitespace()) {
            self.chars.next();
            skipped = true;
        }
        skipped
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_whitespace();
        if matches!(self.chars.peek(), Some((_, c)) if *c == expected) {
            self.chars.next();
            self.skip_whitespace();
            true
        } else {
            false
        }
    }

    fn complex(&mut self) -> Result<Complex, DomError> {
        self.skip_whitespace();
        let mut compounds = vec![self.compound()?];
        let mut combinators = Vec::new();

        loop {
            let had_space = self.skip_whitespace();
            match self.chars.peek() {
                None | Some((_, ',')) => break,
                Some((_, '>')) => {
                    self.chars.next();
                    self.skip_whitespace();
                    combinators.push(Combinator::Child);
                }
                Some(_) if had_space => combinators.push(Combinator::Descendant),
                Some(&(_, c)) => return Err(self.error(&format!("unexpected '{}'", c))),
            }
            compounds.push(self.compound()?);
        }

        Ok(Complex {
            compounds,
            combinators,
        })
    }

    fn compound(&mut self) -> Result<Compound, DomError> {
        let mut compound = Compound::default();

        match self.chars.peek() {
            Some((_, '*')) => {
                self.chars.next();
                compound.tag = Some("*".to_string());
            }
            Some((_, c)) if is_ident_char(*c) => {
                compound.tag = Some(self.ident()?.to_ascii_lowercase());
            }
            _ => {}
        }

        loop {
            match self.chars.peek() {
                Some((_, '#')) => {
                    self.chars.next();
                    compound.id = Some(self.ident()?);
                }
                Some((_, '.')) => {
                    self.chars.next();
                    compound.classes.push(self.ident()?);
                }
                Some((_, '[')) => {
                    self.chars.next();
                    compound.attributes.push(self.attribute()?);
                }
                Some((_, ':')) => return Err(self.error("pseudo-classes are not supported")),
                _ => break,
            }
        }

        if compound.is_empty() {
            return Err(self.error("expected a selector"));
        }
        Ok(compound)
    }

    fn ident(&mut self) -> Result<String, DomError> {
        let mut ident = String::new();
        while let Some((_, c)) = self.chars.peek() {
            if !is_ident_char(*c) {
                break;
            }
            ident.push(*c);
            self.chars.next();
        }
        if ident.is_empty() {
            return Err(self.error("expected a name"));
        }
        Ok(ident)
    }

    fn attribute(&mut self) -> Result<(String, Option<String>), DomError> {
        self.skip_whitespace();
        let name = self.ident()?.to_ascii_lowercase();
        self.skip_whitespace();

        let value = match self.chars.next() {
            Some((_, ']')) => return Ok((name, None)),
            Some((_, '=')) => {
                self.skip_whitespace();
                self.attribute_value()?
            }
            _ => return Err(self.error("malformed attribute selector")),
        };

        self.skip_whitespace();
        match self.chars.next() {
            Some((_, ']')) => Ok((name, Some(value))),
            _ => Err(self.error("unterminated attribute selector")),
        }
    }

    fn attribute_value(&mut self) -> Result<String, DomError> {
        let quote = match self.chars.peek() {
            Some((_, q @ ('"' | '\''))) => *q,
            _ => return self.ident(),
        };
        self.chars.next();

        let mut value = String::new();
        for (_, c) in self.chars.by_ref() {
            if c == quote {
                return Ok(value);
            }
            value.push(c);
        }
        Err(self.error("unterminated string"))
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}
