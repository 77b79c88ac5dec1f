// unwrap.rs — Collapse redundant braces before `while(0);`
//
// A mechanical rewrite can leave a `do { ... }` wrapper with one closing brace
// too many:
//
//     } // comment
//     } while(0);
//
// This pass deletes the second brace (and the whitespace between it and
// `while`), keeping the first brace and everything between the two braces
// byte for byte:
//
//     } // comment
//     while(0);
//
// Only whitespace, `//` comments and `/* */` comments may separate the two
// braces. Any other text between them is real code and the site is left
// alone. Matches never overlap; scanning resumes after each `while(0);`.
//
// Preconditions: none.
// Postconditions: output equals input when no site matches.
// Failure modes: none.
// Side effects: none.

use tracing::debug;

const WHILE_ZERO: &str = "while(0);";

/// One collapsed site, as byte offsets into the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnwrapSite {
    /// Offset of the first (kept) brace.
    pub first: usize,
    /// Offset of the second (removed) brace.
    pub second: usize,
    /// Offset one past the `while(0);` that closes the site.
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnwrapResult {
    pub text: String,
    pub sites: Vec<UnwrapSite>,
}

/// Byte cursor over the source, advancing by whole characters.
struct Cursor<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(source: &'a str, pos: usize) -> Self {
        Self { source, pos }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn eat(&mut self, s: &str) -> bool {
        if self.rest().starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    /// Consume one `//` or `/* */` comment. A line comment runs to the end of
    /// the line; an unterminated block comment is not a comment here.
    fn eat_comment(&mut self) -> bool {
        let rest = self.rest();
        if rest.starts_with("//") {
            self.pos += rest.find('\n').unwrap_or(rest.len());
            return true;
        }
        if rest.starts_with("/*") {
            if let Some(close) = rest[2..].find("*/") {
                self.pos += 2 + close + 2;
                return true;
            }
        }
        false
    }
}

/// Try to match a site whose first brace sits at `first`.
fn match_site(source: &str, first: usize) -> Option<UnwrapSite> {
    let mut cur = Cursor::new(source, first + 1);
    loop {
        cur.skip_whitespace();
        if !cur.eat_comment() {
            break;
        }
    }
    let second = cur.pos;
    if !cur.eat("}") {
        return None;
    }
    cur.skip_whitespace();
    if !cur.eat(WHILE_ZERO) {
        return None;
    }
    Some(UnwrapSite {
        first,
        second,
        end: cur.pos,
    })
}

/// Find every non-overlapping site, left to right.
pub fn find_sites(source: &str) -> Vec<UnwrapSite> {
    let mut sites = Vec::new();
    let mut from = 0;
    while let Some(off) = source[from..].find('}') {
        let first = from + off;
        match match_site(source, first) {
            Some(site) => {
                sites.push(site);
                from = site.end;
            }
            None => from = first + 1,
        }
    }
    sites
}

/// Collapse every `} <comments> } while(0);` site in `source`.
pub fn unwrap_braces(source: &str) -> UnwrapResult {
    let sites = find_sites(source);
    let mut text = String::with_capacity(source.len());
    let mut copied = 0;
    for site in &sites {
        text.push_str(&source[copied..site.second]);
        text.push_str(WHILE_ZERO);
        copied = site.end;
    }
    text.push_str(&source[copied..]);
    debug!(sites = sites.len(), "unwrap scan complete");
    UnwrapResult { text, sites }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unwrap(s: &str) -> String {
        unwrap_braces(s).text
    }

    #[test]
    fn comment_between_braces_is_preserved() {
        assert_eq!(
            unwrap("X } // comment\n } while(0);"),
            "X } // comment\n while(0);"
        );
    }

    #[test]
    fn adjacent_braces() {
        assert_eq!(unwrap("}} while(0);"), "}while(0);");
        assert_eq!(unwrap("}\n}\nwhile(0);\n"), "}\nwhile(0);\n");
    }

    #[test]
    fn block_comments_and_mixed_runs() {
        assert_eq!(
            unwrap("} /* a */ // b\n /* c\n d */ } while(0);"),
            "} /* a */ // b\n /* c\n d */ while(0);"
        );
    }

    #[test]
    fn real_code_between_braces_is_untouched() {
        let src = "} doSomething(); } while(0);";
        assert_eq!(unwrap(src), src);
        let src = "} x = 1; /* c */ } while(0);";
        assert_eq!(unwrap(src), src);
    }

    #[test]
    fn single_brace_before_while_is_untouched() {
        let src = "do {\n    x();\n} while(0);\n";
        assert_eq!(unwrap(src), src);
    }

    #[test]
    fn while_must_be_literal() {
        let src = "} } while (0);";
        assert_eq!(unwrap(src), src);
        let src = "} } while(1);";
        assert_eq!(unwrap(src), src);
    }

    #[test]
    fn unterminated_block_comment_blocks_the_match() {
        let src = "} /* open } while(0);";
        assert_eq!(unwrap(src), src);
    }

    #[test]
    fn comment_ending_early_exposes_code() {
        // The block comment closes at the first `*/`; `x */` is code.
        let src = "} /* a */ x */ } while(0);";
        assert_eq!(unwrap(src), src);
    }

    #[test]
    fn line_comment_swallows_rest_of_line() {
        // `} while(0);` after `//` is comment text, not a second brace.
        let src = "} // note } while(0);\n";
        assert_eq!(unwrap(src), src);
        assert_eq!(
            unwrap("} // note }\n} while(0);\n"),
            "} // note }\nwhile(0);\n"
        );
    }

    #[test]
    fn triple_brace_removes_exactly_one() {
        assert_eq!(unwrap("}}} while(0);"), "}}while(0);");
    }

    #[test]
    fn multiple_sites_do_not_overlap() {
        let src = "a } } while(0); b } // c\n } while(0); } } while(1);";
        let result = unwrap_braces(src);
        assert_eq!(result.sites.len(), 2);
        assert_eq!(
            result.text,
            "a } while(0); b } // c\n while(0); } } while(1);"
        );
    }

    #[test]
    fn site_offsets_point_at_braces() {
        let src = "x } } while(0);";
        let sites = find_sites(src);
        assert_eq!(
            sites,
            vec![UnwrapSite {
                first: 2,
                second: 4,
                end: src.len()
            }]
        );
    }

    #[test]
    fn no_braces_is_identity() {
        let src = "int main() { return 0; }\n";
        let result = unwrap_braces(src);
        assert!(result.sites.is_empty());
        assert_eq!(result.text, src);
    }
}
