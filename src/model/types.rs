//! Type expressions used for argument and return types.
//!
//! Grammar:
//!
//! ```text
//! type  := alt ( '|' alt )*
//! alt   := 'list' '[' type ']' | 'dict' '[' type ']' | ident
//! ident := name ( '::' name )?
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A parsed type expression such as `str | list[file]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeExpr {
    Named(String),
    List(Box<TypeExpr>),
    Dict(Box<TypeExpr>),
    Union(Vec<TypeExpr>),
}

impl Default for TypeExpr {
    fn default() -> Self {
        TypeExpr::Named("void".to_string())
    }
}

impl TypeExpr {
    /// Every named type in the expression, left to right, duplicates removed.
    pub fn names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_names(&mut out);
        out
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            TypeExpr::Named(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            TypeExpr::List(inner) | TypeExpr::Dict(inner) => inner.collect_names(out),
            TypeExpr::Union(alts) => {
                for alt in alts {
                    alt.collect_names(out);
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Open,
    Close,
    Pipe,
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();
    while let Some((pos, c)) = chars.next() {
        match c {
            ' ' | '\t' => {}
            '[' => tokens.push(Token::Open),
            ']' => tokens.push(Token::Close),
            '|' => tokens.push(Token::Pipe),
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut ident = String::from(c);
                while let Some(&(_, next)) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' || next == ':' {
                        ident.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let parts: Vec<&str> = ident.split("::").collect();
                if parts.len() > 2 || parts.iter().any(|p| p.is_empty() || p.contains(':')) {
                    return Err(format!("malformed type name `{}`", ident));
                }
                tokens.push(Token::Ident(ident));
            }
            other => return Err(format!("unexpected `{}` at offset {}", other, pos)),
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn parse_type(&mut self) -> Result<TypeExpr, String> {
        let mut alts = vec![self.parse_alt()?];
        while self.peek() == Some(&Token::Pipe) {
            self.next();
            alts.push(self.parse_alt()?);
        }
        if alts.len() == 1 {
            Ok(alts.remove(0))
        } else {
            Ok(TypeExpr::Union(alts))
        }
    }

    fn parse_alt(&mut self) -> Result<TypeExpr, String> {
        match self.next() {
            Some(Token::Ident(name)) => {
                if self.peek() != Some(&Token::Open) {
                    return Ok(TypeExpr::Named(name));
                }
                let wrap: fn(Box<TypeExpr>) -> TypeExpr = match name.as_str() {
                    "list" => TypeExpr::List,
                    "dict" => TypeExpr::Dict,
                    _ => return Err(format!("`{}` does not take a type parameter", name)),
                };
                self.next();
                let inner = self.parse_type()?;
                match self.next() {
                    Some(Token::Close) => Ok(wrap(Box::new(inner))),
                    _ => Err(format!("missing `]` after `{}[`", name)),
                }
            }
            Some(Token::Open) => Err("unexpected `[`".to_string()),
            Some(Token::Close) => Err("unexpected `]`".to_string()),
            Some(Token::Pipe) => Err("unexpected `|`".to_string()),
            None => Err("unexpected end of type expression".to_string()),
        }
    }
}

impl FromStr for TypeExpr {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens = tokenize(s).map_err(|e| format!("invalid type `{}`: {}", s, e))?;
        let mut parser = Parser { tokens, pos: 0 };
        let ty = parser
            .parse_type()
            .map_err(|e| format!("invalid type `{}`: {}", s, e))?;
        if parser.pos < parser.tokens.len() {
            return Err(format!("invalid type `{}`: trailing input", s));
        }
        Ok(ty)
    }
}

impl TryFrom<String> for TypeExpr {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TypeExpr> for String {
    fn from(ty: TypeExpr) -> Self {
        ty.to_string()
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Named(name) => f.write_str(name),
            TypeExpr::List(inner) => write!(f, "list[{}]", inner),
            TypeExpr::Dict(inner) => write!(f, "dict[{}]", inner),
            TypeExpr::Union(alts) => {
                let parts: Vec<String> = alts.iter().map(|a| a.to_string()).collect();
                f.write_str(&parts.join(" | "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> TypeExpr {
        s.parse().unwrap()
    }

    #[test]
    fn plain_name() {
        assert_eq!(parse("str"), TypeExpr::Named("str".into()));
    }

    #[test]
    fn nested_containers() {
        assert_eq!(
            parse("list[dict[str]]"),
            TypeExpr::List(Box::new(TypeExpr::Dict(Box::new(TypeExpr::Named(
                "str".into()
            )))))
        );
    }

    #[test]
    fn union_inside_list() {
        let ty = parse("list[str|file]  | int");
        assert_eq!(ty.to_string(), "list[str | file] | int");
        assert_eq!(ty.names(), vec!["str", "file", "int"]);
    }

    #[test]
    fn bare_list_is_a_name() {
        assert_eq!(parse("list"), TypeExpr::Named("list".into()));
    }

    #[test]
    fn module_qualified_name() {
        assert_eq!(parse("fs::file").names(), vec!["fs::file"]);
    }

    #[test]
    fn names_are_deduplicated() {
        assert_eq!(parse("str | list[str]").names(), vec!["str"]);
    }

    #[test]
    fn syntax_errors() {
        for bad in ["", "list[str", "str |", "| str", "str]", "str[int]", "a:::b", "a::b::c", "str, int"] {
            assert!(bad.parse::<TypeExpr>().is_err(), "accepted `{}`", bad);
        }
    }
}
