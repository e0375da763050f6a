//! Cross-reference markup embedded in free text.
//!
//! - `[[target]]` anywhere in a line links to a symbol.
//! - A line holding only `::refman[target]` inserts the symbol's reference block.
//!
//! Neither form is recognized inside fenced code blocks or inline code spans.

use regex::Regex;
use std::convert::Infallible;
use std::sync::LazyLock;

static RE_LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\[([^\[\]]+)\]\]").unwrap());

static RE_INSERT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*::refman\[([^\[\]]+)\]\s*$").unwrap());

/// Callbacks invoked for each directive found by [`expand`].
pub trait Expand {
    type Error;

    /// Replacement text for `[[target]]`.
    fn link(&mut self, target: &str) -> Result<String, Self::Error>;

    /// Replacement for a `::refman[target]` line; `None` keeps the line as is.
    fn insert(&mut self, _target: &str) -> Result<Option<String>, Self::Error> {
        Ok(None)
    }
}

/// Rewrite every directive in `text`, line by line.
pub fn expand<X: Expand>(text: &str, x: &mut X) -> Result<String, X::Error> {
    let mut out = String::with_capacity(text.len());
    let mut fence: Option<String> = None;

    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let trimmed = line.trim_start();

        if let Some(marker) = &fence {
            if trimmed.starts_with(marker.as_str()) {
                fence = None;
            }
            out.push_str(line);
            continue;
        }
        if let Some(marker) = fence_marker(trimmed) {
            fence = Some(marker);
            out.push_str(line);
            continue;
        }
        if let Some(caps) = RE_INSERT.captures(line) {
            if let Some(block) = x.insert(caps[1].trim())? {
                out.push_str(&block);
                continue;
            }
        }
        expand_line(line, x, &mut out)?;
    }

    Ok(out)
}

/// Every `[[target]]` in `text`, in order of appearance.
pub fn references(text: &str) -> Vec<String> {
    struct Collect(Vec<String>);

    impl Expand for Collect {
        type Error = Infallible;

        fn link(&mut self, target: &str) -> Result<String, Infallible> {
            self.0.push(target.to_string());
            Ok(String::new())
        }
    }

    let mut collect = Collect(Vec::new());
    // Infallible: the collector never fails.
    let _ = expand(text, &mut collect);
    collect.0
}

/// Opening marker of a fenced code block (a run of 3+ backticks or tildes).
fn fence_marker(trimmed: &str) -> Option<String> {
    let first = trimmed.chars().next()?;
    if first != '`' && first != '~' {
        return None;
    }
    let run: String = trimmed.chars().take_while(|&c| c == first).collect();
    (run.len() >= 3).then_some(run)
}

/// Expand links in one line, leaving inline code spans untouched.
fn expand_line<X: Expand>(line: &str, x: &mut X, out: &mut String) -> Result<(), X::Error> {
    let parts: Vec<&str> = line.split('`').collect();
    // An odd number of backticks leaves the last one unmatched, i.e. literal.
    let unbalanced = parts.len() % 2 == 0;

    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            out.push('`');
        }
        let in_code = i % 2 == 1 && !(unbalanced && i == parts.len() - 1);
        if in_code {
            out.push_str(part);
            continue;
        }
        let mut last = 0;
        for caps in RE_LINK.captures_iter(part) {
            let whole = caps.get(0).map_or(0..0, |m| m.range());
            out.push_str(&part[last..whole.start]);
            out.push_str(&x.link(caps[1].trim())?);
            last = whole.end;
        }
        out.push_str(&part[last..]);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    impl Expand for Upper {
        type Error = String;

        fn link(&mut self, target: &str) -> Result<String, String> {
            if target == "bad" {
                return Err(target.to_string());
            }
            Ok(format!("<{}>", target.to_uppercase()))
        }

        fn insert(&mut self, target: &str) -> Result<Option<String>, String> {
            Ok(Some(format!("BLOCK({})", target)))
        }
    }

    #[test]
    fn links_are_replaced() {
        assert_eq!(
            expand("see [[foo]] and [[str.join]].", &mut Upper).unwrap(),
            "see <FOO> and <STR.JOIN>."
        );
    }

    #[test]
    fn insert_replaces_whole_line() {
        assert_eq!(
            expand("intro\n  ::refman[foo]  \nouter", &mut Upper).unwrap(),
            "intro\nBLOCK(foo)\nouter"
        );
    }

    #[test]
    fn insert_must_stand_alone() {
        assert_eq!(
            expand("text ::refman[foo]", &mut Upper).unwrap(),
            "text ::refman[foo]"
        );
    }

    #[test]
    fn fenced_code_is_untouched() {
        let text = "```\n[[foo]]\n::refman[foo]\n```\n[[foo]]";
        assert_eq!(
            expand(text, &mut Upper).unwrap(),
            "```\n[[foo]]\n::refman[foo]\n```\n<FOO>"
        );
    }

    #[test]
    fn tilde_fence() {
        let text = "~~~~\n[[foo]]\n~~~~";
        assert_eq!(expand(text, &mut Upper).unwrap(), text);
    }

    #[test]
    fn inline_code_is_untouched() {
        assert_eq!(
            expand("`[[foo]]` vs [[foo]]", &mut Upper).unwrap(),
            "`[[foo]]` vs <FOO>"
        );
    }

    #[test]
    fn unmatched_backtick_is_literal() {
        assert_eq!(expand("a ` [[foo]]", &mut Upper).unwrap(), "a ` <FOO>");
    }

    #[test]
    fn errors_propagate() {
        assert_eq!(expand("[[bad]]", &mut Upper), Err("bad".to_string()));
    }

    #[test]
    fn references_in_order() {
        assert_eq!(
            references("[[b]] then `[[skip]]` then [[ a ]]"),
            vec!["b".to_string(), "a".to_string()]
        );
    }

    #[test]
    fn trailing_newline_preserved() {
        assert_eq!(expand("[[x]]\n", &mut Upper).unwrap(), "<X>\n");
    }
}
