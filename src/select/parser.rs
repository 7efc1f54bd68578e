//! CSS selector parsing.
//!
//! Turns selector text into a [`SelectorList`]. The grammar covers what
//! scrapers actually write: selector lists, compound selectors, the four
//! combinators (also in leading position, for scoped queries such as
//! `> li`), attribute operators with `i`/`s` flags, and the pseudo-classes
//! listed on [`Pseudo`].

use std::fmt;

/// A comma-separated list of complex selectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList(pub Vec<ComplexSelector>);

/// Compound selectors joined by combinators.
///
/// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`. A leading
/// combinator relates the first compound to the query scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    pub leading: Option<Combinator>,
    pub compounds: Vec<Compound>,
    pub combinators: Vec<Combinator>,
}

/// Relationship between two compound selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// `a b`
    Descendant,
    /// `a > b`
    Child,
    /// `a + b`
    Adjacent,
    /// `a ~ b`
    Sibling,
}

/// Simple selectors that must all match the same element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Compound(pub Vec<Simple>);

/// One simple selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Simple {
    Universal,
    Type(String),
    Id(String),
    Class(String),
    Attribute(AttributeSelector),
    Pseudo(Pseudo),
}

/// `[name op value flag]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelector {
    pub name: String,
    pub op: AttributeOp,
    pub value: String,
    /// `Some(true)` for the `i` flag, `Some(false)` for `s`.
    pub ignore_case: Option<bool>,
}

/// Attribute comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeOp {
    /// `[a]`
    Exists,
    /// `[a=v]`
    Equals,
    /// `[a!=v]`, true when the attribute is missing too
    NotEquals,
    /// `[a~=v]`, whitespace-separated word
    Includes,
    /// `[a|=v]`, `v` or `v-...`
    DashMatch,
    /// `[a^=v]`
    Prefix,
    /// `[a$=v]`
    Suffix,
    /// `[a*=v]`
    Substring,
}

/// Supported pseudo-classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pseudo {
    FirstChild,
    LastChild,
    OnlyChild,
    FirstOfType,
    LastOfType,
    OnlyOfType,
    /// `:nth-child(an+b)` and friends.
    Nth {
        a: i32,
        b: i32,
        of_type: bool,
        from_end: bool,
    },
    Empty,
    Parent,
    Root,
    Scope,
    Not(SelectorList),
    Is(SelectorList),
    /// Relative selectors, matched with the subject as scope.
    Has(SelectorList),
    Contains(String),
    Checked,
    Selected,
    Disabled,
    Enabled,
    Header,
    Input,
    Button,
    Text,
    Link,
    /// `:checkbox`, `:radio`, ... match on the `type` attribute.
    InputType(&'static str),
}

/// Parses selector text. The error is a human-readable message.
pub fn parse(input: &str) -> Result<SelectorList, String> {
    let mut parser = Parser { input, pos: 0 };
    let list = parser.parse_list(false)?;
    parser.skip_whitespace();
    if let Some(c) = parser.peek() {
        return Err(format!("Unexpected '{c}' at position {}", parser.pos));
    }
    Ok(list)
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl Parser<'_> {
    /// Parses a selector list, stopping before `)` when `nested`.
    fn parse_list(&mut self, nested: bool) -> Result<SelectorList, String> {
        let mut selectors = Vec::new();
        loop {
            self.skip_whitespace();
            selectors.push(self.parse_complex()?);
            self.skip_whitespace();
            match self.peek() {
                Some(',') => self.advance(),
                Some(')') if nested => break,
                None => break,
                Some(c) => return Err(format!("Unexpected '{c}' at position {}", self.pos)),
            }
        }
        Ok(SelectorList(selectors))
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector, String> {
        let leading = self.parse_combinator();
        let mut compounds = vec![self.parse_compound()?];
        let mut combinators = Vec::new();
        loop {
            let had_space = self.skip_whitespace();
            match self.peek() {
                None | Some(',' | ')') => break,
                _ => {}
            }
            let combinator = match self.parse_combinator() {
                Some(c) => c,
                None if had_space => Combinator::Descendant,
                None => break,
            };
            combinators.push(combinator);
            compounds.push(self.parse_compound()?);
        }
        Ok(ComplexSelector {
            leading,
            compounds,
            combinators,
        })
    }

    /// Consumes an explicit combinator and surrounding whitespace.
    fn parse_combinator(&mut self) -> Option<Combinator> {
        self.skip_whitespace();
        let combinator = match self.peek()? {
            '>' => Combinator::Child,
            '+' => Combinator::Adjacent,
            '~' => Combinator::Sibling,
            _ => return None,
        };
        self.advance();
        self.skip_whitespace();
        Some(combinator)
    }

    fn parse_compound(&mut self) -> Result<Compound, String> {
        let mut parts = Vec::new();
        match self.peek() {
            Some('*') => {
                self.advance();
                parts.push(Simple::Universal);
            }
            Some(c) if is_ident_start(c) => parts.push(Simple::Type(self.parse_identifier()?)),
            _ => {}
        }
        loop {
            match self.peek() {
                Some('#') => {
                    self.advance();
                    parts.push(Simple::Id(self.parse_identifier()?));
                }
                Some('.') => {
                    self.advance();
                    parts.push(Simple::Class(self.parse_identifier()?));
                }
                Some('[') => parts.push(Simple::Attribute(self.parse_attribute()?)),
                Some(':') => parts.push(Simple::Pseudo(self.parse_pseudo()?)),
                _ => break,
            }
        }
        if parts.is_empty() {
            return Err(match self.peek() {
                Some(c) => format!("Unexpected '{c}' at position {}", self.pos),
                None => "Expected a selector".to_string(),
            });
        }
        Ok(Compound(parts))
    }

    fn parse_attribute(&mut self) -> Result<AttributeSelector, String> {
        self.advance(); // '['
        self.skip_whitespace();
        let name = self.parse_identifier()?;
        self.skip_whitespace();

        let op = match self.peek() {
            Some(']') => {
                self.advance();
                return Ok(AttributeSelector {
                    name,
                    op: AttributeOp::Exists,
                    value: String::new(),
                    ignore_case: None,
                });
            }
            Some('=') => AttributeOp::Equals,
            Some(c) => {
                let op = match c {
                    '!' => AttributeOp::NotEquals,
                    '~' => AttributeOp::Includes,
                    '|' => AttributeOp::DashMatch,
                    '^' => AttributeOp::Prefix,
                    '$' => AttributeOp::Suffix,
                    '*' => AttributeOp::Substring,
                    _ => return Err(format!("Unexpected '{c}' in attribute selector")),
                };
                self.advance();
                if self.peek() != Some('=') {
                    return Err(format!("Expected '=' after '{c}' in attribute selector"));
                }
                op
            }
            None => return Err("Unterminated attribute selector".to_string()),
        };
        self.advance(); // '='
        self.skip_whitespace();

        let value = match self.peek() {
            Some(q @ ('"' | '\'')) => self.parse_string(q)?,
            _ => self.parse_unquoted_value()?,
        };
        self.skip_whitespace();

        let ignore_case = match self.peek() {
            Some('i' | 'I') => Some(true),
            Some('s' | 'S') => Some(false),
            _ => None,
        };
        if ignore_case.is_some() {
            self.advance();
            self.skip_whitespace();
        }
        self.expect(']')?;
        Ok(AttributeSelector {
            name,
            op,
            value,
            ignore_case,
        })
    }

    fn parse_unquoted_value(&mut self) -> Result<String, String> {
        let mut value = String::new();
        while let Some(c) = self.peek() {
            if c == ']' || c.is_whitespace() {
                break;
            }
            if c == '\\' {
                value.push(self.parse_escape()?);
            } else {
                value.push(c);
                self.advance();
            }
        }
        Ok(value)
    }

    fn parse_pseudo(&mut self) -> Result<Pseudo, String> {
        self.advance(); // ':'
        if self.peek() == Some(':') {
            return Err("Pseudo-elements are not supported".to_string());
        }
        let name = self.parse_identifier()?.to_ascii_lowercase();
        let pseudo = match name.as_str() {
            "first-child" => Pseudo::FirstChild,
            "last-child" => Pseudo::LastChild,
            "only-child" => Pseudo::OnlyChild,
            "first-of-type" => Pseudo::FirstOfType,
            "last-of-type" => Pseudo::LastOfType,
            "only-of-type" => Pseudo::OnlyOfType,
            "nth-child" | "nth-last-child" | "nth-of-type" | "nth-last-of-type" => {
                let (a, b) = self.parse_nth()?;
                Pseudo::Nth {
                    a,
                    b,
                    of_type: name.ends_with("of-type"),
                    from_end: name.starts_with("nth-last"),
                }
            }
            "empty" => Pseudo::Empty,
            "parent" => Pseudo::Parent,
            "root" => Pseudo::Root,
            "scope" => Pseudo::Scope,
            "not" => Pseudo::Not(self.parse_nested_list()?),
            "is" | "matches" | "where" | "any" => Pseudo::Is(self.parse_nested_list()?),
            "has" => Pseudo::Has(self.parse_nested_list()?),
            "contains" => Pseudo::Contains(self.parse_text_argument()?),
            "checked" => Pseudo::Checked,
            "selected" => Pseudo::Selected,
            "disabled" => Pseudo::Disabled,
            "enabled" => Pseudo::Enabled,
            "header" => Pseudo::Header,
            "input" => Pseudo::Input,
            "button" => Pseudo::Button,
            "text" => Pseudo::Text,
            "link" | "any-link" => Pseudo::Link,
            "checkbox" => Pseudo::InputType("checkbox"),
            "radio" => Pseudo::InputType("radio"),
            "file" => Pseudo::InputType("file"),
            "image" => Pseudo::InputType("image"),
            "password" => Pseudo::InputType("password"),
            "submit" => Pseudo::InputType("submit"),
            "reset" => Pseudo::InputType("reset"),
            _ => return Err(format!("Unknown pseudo-class :{name}")),
        };
        Ok(pseudo)
    }

    fn parse_nested_list(&mut self) -> Result<SelectorList, String> {
        self.expect('(')?;
        let list = self.parse_list(true)?;
        self.expect(')')?;
        Ok(list)
    }

    /// `:contains(text)`: quoted or bare text up to the closing paren.
    fn parse_text_argument(&mut self) -> Result<String, String> {
        self.expect('(')?;
        self.skip_whitespace();
        let text = match self.peek() {
            Some(q @ ('"' | '\'')) => self.parse_string(q)?,
            _ => {
                let start = self.pos;
                while self.peek().is_some_and(|c| c != ')') {
                    self.advance();
                }
                self.input[start..self.pos].trim_end().to_string()
            }
        };
        self.skip_whitespace();
        self.expect(')')?;
        Ok(text)
    }

    fn parse_nth(&mut self) -> Result<(i32, i32), String> {
        self.expect('(')?;
        let start = self.pos;
        while self.peek().is_some_and(|c| c != ')') {
            self.advance();
        }
        let expr = self.input[start..self.pos].to_string();
        self.expect(')')?;
        parse_an_plus_b(&expr)
    }

    fn parse_string(&mut self, quote: char) -> Result<String, String> {
        self.advance(); // opening quote
        let mut value = String::new();
        loop {
            match self.peek() {
                None => return Err("Unterminated string in selector".to_string()),
                Some(c) if c == quote => {
                    self.advance();
                    return Ok(value);
                }
                Some('\\') => value.push(self.parse_escape()?),
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }
    }

    fn parse_identifier(&mut self) -> Result<String, String> {
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                ident.push(self.parse_escape()?);
            } else if is_ident_char(c) {
                ident.push(c);
                self.advance();
            } else {
                break;
            }
        }
        if ident.is_empty() {
            return Err(match self.peek() {
                Some(c) => format!("Expected an identifier at position {}, got '{c}'", self.pos),
                None => "Expected an identifier".to_string(),
            });
        }
        Ok(ident)
    }

    /// `\` followed by 1-6 hex digits (and one optional space), or any
    /// other character taken literally.
    fn parse_escape(&mut self) -> Result<char, String> {
        self.advance(); // '\'
        let start = self.pos;
        while self.pos - start < 6 && self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
            self.advance();
        }
        if self.pos > start {
            let code = u32::from_str_radix(&self.input[start..self.pos], 16)
                .map_err(|e| e.to_string())?;
            if self.peek() == Some(' ') {
                self.advance();
            }
            return Ok(char::from_u32(code)
                .filter(|&c| c != '\0')
                .unwrap_or('\u{FFFD}'));
        }
        let c = self
            .peek()
            .ok_or_else(|| "Unterminated escape in selector".to_string())?;
        self.advance();
        Ok(c)
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
        self.pos > start
    }

    fn expect(&mut self, expected: char) -> Result<(), String> {
        if self.peek() == Some(expected) {
            self.advance();
            Ok(())
        } else {
            Err(match self.peek() {
                Some(c) => format!("Expected '{expected}' at position {}, got '{c}'", self.pos),
                None => format!("Expected '{expected}' at end of selector"),
            })
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-' || c == '\\' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
}

/// Parses the `an+b` micro-syntax, including `odd`, `even` and plain integers.
fn parse_an_plus_b(expr: &str) -> Result<(i32, i32), String> {
    let s: String = expr
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    let invalid = || format!("Invalid nth expression '{}'", expr.trim());
    match s.as_str() {
        "odd" => return Ok((2, 1)),
        "even" => return Ok((2, 0)),
        "" => return Err(invalid()),
        _ => {}
    }
    let Some(n_pos) = s.find('n') else {
        return s.parse().map(|b| (0, b)).map_err(|_| invalid());
    };
    let a = match &s[..n_pos] {
        "" | "+" => 1,
        "-" => -1,
        a => a.parse().map_err(|_| invalid())?,
    };
    let rest = &s[n_pos + 1..];
    let b = if rest.is_empty() {
        0
    } else {
        let rest = rest.strip_prefix('+').unwrap_or(rest);
        if rest.starts_with('+') {
            return Err(invalid());
        }
        rest.parse().map_err(|_| invalid())?
    };
    Ok((a, b))
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Descendant => " ",
            Self::Child => " > ",
            Self::Adjacent => " + ",
            Self::Sibling => " ~ ",
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn single(input: &str) -> ComplexSelector {
        let mut list = parse(input).unwrap();
        assert_eq!(list.0.len(), 1);
        list.0.remove(0)
    }

    #[test]
    fn test_parse_compound() {
        let sel = single("div.a.b#main[data-x]");
        assert_eq!(sel.compounds.len(), 1);
        let parts = &sel.compounds[0].0;
        assert_eq!(parts[0], Simple::Type("div".into()));
        assert_eq!(parts[1], Simple::Class("a".into()));
        assert_eq!(parts[2], Simple::Class("b".into()));
        assert_eq!(parts[3], Simple::Id("main".into()));
        assert!(matches!(&parts[4], Simple::Attribute(a) if a.op == AttributeOp::Exists));
    }

    #[test]
    fn test_parse_combinators() {
        let sel = single("ul > li + li ~ p  span");
        assert_eq!(sel.compounds.len(), 5);
        assert_eq!(
            sel.combinators,
            vec![
                Combinator::Child,
                Combinator::Adjacent,
                Combinator::Sibling,
                Combinator::Descendant
            ]
        );
    }

    #[test]
    fn test_parse_leading_combinator() {
        let sel = single("> li.apple");
        assert_eq!(sel.leading, Some(Combinator::Child));
        assert!(single("li").leading.is_none());
    }

    #[test]
    fn test_parse_list() {
        let list = parse(".apple, .pear ,li").unwrap();
        assert_eq!(list.0.len(), 3);
    }

    #[test]
    fn test_parse_attribute_operators() {
        let sel = single("[href^='http'][lang|=en][class~=x][title*=\"a b\"][rel$=me][id!=z][type=TEXT i]");
        let ops: Vec<AttributeOp> = sel.compounds[0]
            .0
            .iter()
            .map(|s| match s {
                Simple::Attribute(a) => a.op,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(
            ops,
            vec![
                AttributeOp::Prefix,
                AttributeOp::DashMatch,
                AttributeOp::Includes,
                AttributeOp::Substring,
                AttributeOp::Suffix,
                AttributeOp::NotEquals,
                AttributeOp::Equals
            ]
        );
        match &sel.compounds[0].0[6] {
            Simple::Attribute(a) => {
                assert_eq!(a.value, "TEXT");
                assert_eq!(a.ignore_case, Some(true));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_nth() {
        assert_eq!(parse_an_plus_b("odd").unwrap(), (2, 1));
        assert_eq!(parse_an_plus_b("even").unwrap(), (2, 0));
        assert_eq!(parse_an_plus_b("3").unwrap(), (0, 3));
        assert_eq!(parse_an_plus_b("-n+3").unwrap(), (-1, 3));
        assert_eq!(parse_an_plus_b("2n - 1").unwrap(), (2, -1));
        assert_eq!(parse_an_plus_b(" n ").unwrap(), (1, 0));
        assert!(parse_an_plus_b("x").is_err());
        assert!(parse_an_plus_b("2n++1").is_err());
    }

    #[test]
    fn test_parse_functional_pseudos() {
        let sel = single("li:not(.a, .b):has(> span):contains('Hi there')");
        let parts = &sel.compounds[0].0;
        assert!(matches!(&parts[1], Simple::Pseudo(Pseudo::Not(l)) if l.0.len() == 2));
        assert!(
            matches!(&parts[2], Simple::Pseudo(Pseudo::Has(l)) if l.0[0].leading == Some(Combinator::Child))
        );
        assert_eq!(parts[3], Simple::Pseudo(Pseudo::Contains("Hi there".into())));
    }

    #[test]
    fn test_parse_escapes() {
        let sel = single("#a\\:b .\\31 23");
        assert_eq!(sel.compounds[0].0[0], Simple::Id("a:b".into()));
        assert_eq!(sel.compounds[1].0[0], Simple::Class("123".into()));
    }

    #[test]
    fn test_unknown_pseudo_class() {
        let err = parse("li:hover").unwrap_err();
        assert_eq!(err, "Unknown pseudo-class :hover");
    }

    #[test]
    fn test_syntax_errors() {
        assert!(parse("").is_err());
        assert!(parse("div,").is_err());
        assert!(parse("div >").is_err());
        assert!(parse("[href").is_err());
        assert!(parse("a::before").is_err());
        assert!(parse("div)").is_err());
    }
}
