//! Stylesheet parsing and the selector tables the cascade reads from.
//!
//! Sheets and `style` attributes are tokenized with cssparser. Only simple
//! selectors are recognized: a tag name, `#id`, or `.class`. Anything else
//! (descendant, attribute, pseudo-class selectors) is dropped when the
//! sheet is loaded, and at-rules are skipped along with their blocks.

use std::collections::{BTreeMap, HashMap};

use cssparser::{Delimiter, ParseError, Parser, ParserInput, ToCss, Token};

/// Property name to raw value. Names are lowercased, values trimmed.
pub type PropertyMap = BTreeMap<String, String>;

type CssResult<'i, T> = std::result::Result<T, ParseError<'i, ()>>;

#[derive(Debug, Clone, PartialEq)]
pub struct CssRule {
    pub selector: String,
    pub properties: PropertyMap,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Tag(String),
    Id(String),
    Class(String),
}

impl Selector {
    pub fn parse(source: &str) -> Option<Self> {
        let s = source.trim();
        let simple = |name: &str| {
            !name.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        };
        if let Some(id) = s.strip_prefix('#') {
            simple(id).then(|| Selector::Id(id.to_string()))
        } else if let Some(class) = s.strip_prefix('.') {
            simple(class).then(|| Selector::Class(class.to_string()))
        } else {
            simple(s).then(|| Selector::Tag(s.to_ascii_lowercase()))
        }
    }
}

/// Parse `name: value; name: value` pairs, as found in a `style`
/// attribute. Later duplicates win; malformed declarations are dropped.
pub fn parse_declarations(source: &str) -> PropertyMap {
    let mut input = ParserInput::new(source);
    let mut parser = Parser::new(&mut input);
    declaration_list(&mut parser)
}

/// Parse a stylesheet into rules, one per selector in each group, in source
/// order.
pub fn parse_stylesheet(source: &str) -> Vec<CssRule> {
    let mut input = ParserInput::new(source);
    let mut parser = Parser::new(&mut input);
    let mut rules = Vec::new();
    loop {
        let token = match parser.next() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };
        match token {
            Token::CDO | Token::CDC => {}
            Token::AtKeyword(name) => {
                log::debug!("skipping at-rule @{}", &*name);
                skip_at_rule(&mut parser);
            }
            first => {
                let Some((selectors, properties)) = qualified_rule(&mut parser, first) else {
                    log::debug!("unterminated rule at end of stylesheet");
                    break;
                };
                for selector in selectors {
                    rules.push(CssRule {
                        selector,
                        properties: properties.clone(),
                    });
                }
            }
        }
    }
    rules
}

/// Consume an at-rule's prelude up to its terminating semicolon or block.
/// An unread block is skipped whole, nested rules included, by the next
/// call to `next`.
fn skip_at_rule(parser: &mut Parser<'_, '_>) {
    while let Ok(token) = parser.next() {
        if matches!(token, Token::Semicolon | Token::CurlyBracketBlock) {
            break;
        }
    }
}

/// Read a selector group up to its `{` and the declarations inside.
/// `None` when the input ends before the block opens.
fn qualified_rule<'i>(parser: &mut Parser<'i, '_>, first: Token<'i>) -> Option<(Vec<String>, PropertyMap)> {
    let mut selectors = Vec::new();
    let mut current = String::new();
    let mut token = first;
    loop {
        match &token {
            Token::CurlyBracketBlock => break,
            Token::Comma => selectors.push(std::mem::take(&mut current)),
            Token::WhiteSpace(_) => current.push(' '),
            other => current.push_str(&other.to_css_string()),
        }
        token = match parser.next_including_whitespace() {
            Ok(next) => next.clone(),
            Err(_) => return None,
        };
    }
    selectors.push(current);
    let selectors = selectors
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    let properties = parser
        .parse_nested_block(|p| -> CssResult<'i, PropertyMap> { Ok(declaration_list(p)) })
        .unwrap_or_default();
    Some((selectors, properties))
}

fn declaration_list(parser: &mut Parser<'_, '_>) -> PropertyMap {
    let mut map = PropertyMap::new();
    while !parser.is_exhausted() {
        match parser.parse_until_after(Delimiter::Semicolon, |p| declaration(p)) {
            Ok(Some((name, value))) => {
                map.insert(name, value);
            }
            Ok(None) => {}
            Err(e) => log::debug!("dropping malformed declaration: {:?}", e.kind),
        }
    }
    map
}

fn declaration<'i>(parser: &mut Parser<'i, '_>) -> CssResult<'i, Option<(String, String)>> {
    let name = parser.expect_ident()?.to_ascii_lowercase();
    parser.expect_colon()?;
    let mut value = String::new();
    component_values(parser, &mut value)?;
    let value = value.trim();
    Ok((!value.is_empty()).then(|| (name, value.to_string())))
}

/// Serialize the remaining tokens back to text, one space per whitespace
/// run, dropping comments and `!important`.
fn component_values<'i>(parser: &mut Parser<'i, '_>, out: &mut String) -> CssResult<'i, ()> {
    loop {
        let token = match parser.next_including_whitespace() {
            Ok(token) => token.clone(),
            Err(_) => return Ok(()),
        };
        match token {
            Token::WhiteSpace(_) => out.push(' '),
            Token::Delim('!') => {
                if parser.try_parse(|p| p.expect_ident_matching("important")).is_err() {
                    out.push('!');
                }
            }
            Token::Function(name) => {
                out.push_str(&name);
                out.push('(');
                nested_values(parser, out)?;
                out.push(')');
            }
            Token::ParenthesisBlock => {
                out.push('(');
                nested_values(parser, out)?;
                out.push(')');
            }
            Token::SquareBracketBlock => {
                out.push('[');
                nested_values(parser, out)?;
                out.push(']');
            }
            Token::CurlyBracketBlock => {
                out.push('{');
                nested_values(parser, out)?;
                out.push('}');
            }
            other => out.push_str(&other.to_css_string()),
        }
    }
}

fn nested_values<'i>(parser: &mut Parser<'i, '_>, out: &mut String) -> CssResult<'i, ()> {
    parser.parse_nested_block(|p| component_values(p, out))
}

/// Properties keyed by simple selector. Sheets merge key by key in the
/// order they are added.
#[derive(Debug, Clone, Default)]
pub struct SelectorTables {
    pub by_tag: HashMap<String, PropertyMap>,
    pub by_id: HashMap<String, PropertyMap>,
    pub by_class: HashMap<String, PropertyMap>,
}

impl SelectorTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_stylesheet(&mut self, source: &str) {
        let rules = parse_stylesheet(source);
        log::debug!("loaded stylesheet with {} rules", rules.len());
        for rule in rules {
            self.add_rule(rule);
        }
    }

    pub fn add_rule(&mut self, rule: CssRule) {
        let table = match Selector::parse(&rule.selector) {
            Some(Selector::Tag(name)) => self.by_tag.entry(name),
            Some(Selector::Id(id)) => self.by_id.entry(id),
            Some(Selector::Class(class)) => self.by_class.entry(class),
            None => {
                log::debug!("unsupported selector '{}'", rule.selector);
                return;
            }
        };
        table.or_default().extend(rule.properties);
    }

    pub fn tag(&self, name: &str) -> Option<&PropertyMap> {
        self.by_tag.get(name)
    }

    pub fn id(&self, id: &str) -> Option<&PropertyMap> {
        self.by_id.get(id)
    }

    pub fn class(&self, class: &str) -> Option<&PropertyMap> {
        self.by_class.get(class)
    }
}
