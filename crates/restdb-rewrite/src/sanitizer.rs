//! Text-level cleanup of dangling boolean connectives.
//!
//! The rewriter removes predicates from the syntax tree, so well-formed input
//! never leaves `WHERE` or `AND` behind. These passes run on the serialized
//! SQL anyway and repair what the tree cannot express, e.g. hand-written
//! `WHERE ( )` groups.

use regex::Regex;
use std::sync::LazyLock;

/// Keywords that close a `WHERE` clause.
const CLAUSE_TERMINATORS: &[&str] = &["ORDER", "LIMIT", "OFFSET", "GROUP", "HAVING", "UNION"];

static EMPTY_AND_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bAND\s*\(\s*\)").expect("empty AND group pattern"));

static EMPTY_WHERE_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bWHERE\s*\(\s*\)").expect("empty WHERE group pattern"));

/// Run both passes: connective trimming, then empty-group removal.
pub fn sanitize(sql: &str) -> String {
    let trimmed = trim_dangling_connectives(sql);
    let stripped = strip_empty_groups(&trimmed);
    if stripped == trimmed {
        return trimmed;
    }

    tracing::debug!(
        original = %sql,
        sanitized = %stripped,
        "Removed empty predicate groups"
    );
    trim_dangling_connectives(&stripped)
}

/// Drop `WHERE`/`AND` tokens that no longer connect anything.
///
/// Quoted identifiers and string literals are never inspected or altered.
pub fn trim_dangling_connectives(sql: &str) -> String {
    let mut out: Vec<Segment<'_>> = Vec::new();

    for segment in segments(sql) {
        match segment {
            Segment::Space(_) => {
                if matches!(out.last(), None | Some(Segment::Space(_))) {
                    continue;
                }
                out.push(segment);
            }
            Segment::Word(word) if is_keyword(word, "AND") => {
                pop_trailing(&mut out, &["AND"]);
                match last_significant(&out) {
                    None | Some(Segment::Paren("(")) => {}
                    Some(Segment::Word(prev)) if is_keyword(prev, "WHERE") => {}
                    _ => out.push(segment),
                }
            }
            Segment::Word(word) if CLAUSE_TERMINATORS.iter().any(|k| is_keyword(word, k)) => {
                pop_trailing(&mut out, &["WHERE", "AND"]);
                out.push(segment);
            }
            Segment::Paren(")") => {
                pop_trailing(&mut out, &["WHERE", "AND"]);
                out.push(segment);
            }
            _ => out.push(segment),
        }
    }

    pop_trailing(&mut out, &["WHERE", "AND"]);
    out.iter().map(Segment::text).collect::<String>().trim().to_string()
}

/// Remove `AND ( )` groups and collapse `WHERE ( )` to a bare `WHERE`.
///
/// Quoted identifiers and string literals are left untouched.
pub fn strip_empty_groups(sql: &str) -> String {
    let mut current = sql.to_string();
    loop {
        let next = strip_unquoted_runs(&current);
        if next == current {
            return next;
        }
        current = next;
    }
}

/// One regex pass over each stretch of text between quoted runs.
fn strip_unquoted_runs(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut run = String::new();

    for segment in segments(sql) {
        match segment {
            Segment::Quoted(quoted) => {
                out.push_str(&strip_run(&run));
                run.clear();
                out.push_str(quoted);
            }
            other => run.push_str(other.text()),
        }
    }
    out.push_str(&strip_run(&run));
    out
}

fn strip_run(run: &str) -> String {
    let next = EMPTY_AND_GROUP.replace_all(run, "");
    EMPTY_WHERE_GROUP.replace_all(&next, "WHERE").into_owned()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Space(&'a str),
    Quoted(&'a str),
    Paren(&'a str),
    Word(&'a str),
}

impl<'a> Segment<'a> {
    fn text(&self) -> &'a str {
        match *self {
            Segment::Space(s) | Segment::Quoted(s) | Segment::Paren(s) | Segment::Word(s) => s,
        }
    }
}

fn is_quote(c: char) -> bool {
    matches!(c, '\'' | '"' | '`')
}

fn is_keyword(word: &str, keyword: &str) -> bool {
    word.eq_ignore_ascii_case(keyword)
}

/// Split SQL into whitespace runs, quoted runs, parentheses and bare words.
fn segments<'a>(sql: &'a str) -> Vec<Segment<'a>> {
    let mut out = Vec::new();
    let mut chars = sql.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        let kind: fn(&'a str) -> Segment<'a> = if c.is_whitespace() {
            while chars.next_if(|&(_, n)| n.is_whitespace()).is_some() {}
            Segment::Space
        } else if is_quote(c) {
            // A doubled quote is an escaped quote inside the run.
            while let Some((_, n)) = chars.next() {
                if n == c && chars.next_if(|&(_, m)| m == c).is_none() {
                    break;
                }
            }
            Segment::Quoted
        } else if c == '(' || c == ')' {
            Segment::Paren
        } else {
            while chars
                .next_if(|&(_, n)| !n.is_whitespace() && !is_quote(n) && n != '(' && n != ')')
                .is_some()
            {}
            Segment::Word
        };

        let end = chars.peek().map_or(sql.len(), |&(i, _)| i);
        out.push(kind(&sql[start..end]));
    }
    out
}

fn last_significant<'a>(out: &[Segment<'a>]) -> Option<Segment<'a>> {
    out.iter().rev().find(|s| !matches!(s, Segment::Space(_))).copied()
}

/// Pop trailing whitespace and any of `keywords`, repeatedly.
fn pop_trailing(out: &mut Vec<Segment<'_>>, keywords: &[&str]) {
    while let Some(i) = out.iter().rposition(|s| !matches!(s, Segment::Space(_))) {
        let segment = out[i];
        match segment {
            Segment::Word(word) if keywords.iter().any(|k| is_keyword(word, k)) => out.truncate(i),
            _ => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_clean_sql_untouched() {
        let sql = r#"SELECT * FROM "/ledgers" WHERE a = 1 AND b BETWEEN 1 AND 2 ORDER BY a LIMIT 5"#;
        assert_eq!(sanitize(sql), sql);
    }

    #[test]
    fn test_dangling_where_before_limit() {
        assert_eq!(
            trim_dangling_connectives("SELECT * FROM t WHERE LIMIT 1"),
            "SELECT * FROM t LIMIT 1"
        );
        assert_eq!(
            trim_dangling_connectives("SELECT * FROM t WHERE AND ORDER BY a"),
            "SELECT * FROM t ORDER BY a"
        );
    }

    #[test]
    fn test_connective_after_where() {
        assert_eq!(
            trim_dangling_connectives("SELECT * FROM t WHERE AND a = 1 AND AND b = 2"),
            "SELECT * FROM t WHERE a = 1 AND b = 2"
        );
    }

    #[test]
    fn test_trailing_connectives() {
        assert_eq!(
            trim_dangling_connectives("SELECT * FROM t WHERE a = 1 AND"),
            "SELECT * FROM t WHERE a = 1"
        );
        assert_eq!(trim_dangling_connectives("SELECT * FROM t WHERE"), "SELECT * FROM t");
    }

    #[test]
    fn test_empty_subquery_clause() {
        assert_eq!(
            trim_dangling_connectives("SELECT * FROM (SELECT a FROM b WHERE ) AS v"),
            "SELECT * FROM (SELECT a FROM b ) AS v"
        );
    }

    #[test]
    fn test_quoted_text_is_opaque() {
        let sql = r#"SELECT * FROM "WHERE" WHERE note = 'x AND  WHERE' AND "AND" = 1"#;
        assert_eq!(trim_dangling_connectives(sql), sql);
        let escaped = "SELECT * FROM t WHERE a = 'it''s AND' LIMIT 1";
        assert_eq!(trim_dangling_connectives(escaped), escaped);
    }

    #[test]
    fn test_strip_empty_groups() {
        assert_eq!(
            strip_empty_groups("SELECT * FROM t WHERE a = 1 AND ( )"),
            "SELECT * FROM t WHERE a = 1 "
        );
        assert_eq!(
            strip_empty_groups("SELECT * FROM t WHERE (AND ()) LIMIT 1"),
            "SELECT * FROM t WHERE LIMIT 1"
        );
    }

    #[test]
    fn test_empty_groups_inside_quotes_kept() {
        let sql = "SELECT * FROM \"WHERE ()\" WHERE note = 'x AND () y' AND ( )";
        assert_eq!(
            strip_empty_groups(sql),
            "SELECT * FROM \"WHERE ()\" WHERE note = 'x AND () y' "
        );
        assert_eq!(
            sanitize("SELECT * FROM t WHERE a = 'it''s WHERE ( )' AND ()"),
            "SELECT * FROM t WHERE a = 'it''s WHERE ( )'"
        );
    }

    #[test]
    fn test_sanitize_empty_groups() {
        assert_eq!(
            sanitize("SELECT * FROM t WHERE () AND a = 1 LIMIT 1"),
            "SELECT * FROM t WHERE a = 1 LIMIT 1"
        );
        assert_eq!(
            sanitize("SELECT * FROM t WHERE ( ) LIMIT 1"),
            "SELECT * FROM t LIMIT 1"
        );
        assert_eq!(
            sanitize("SELECT * FROM t WHERE a = 1 and ()"),
            "SELECT * FROM t WHERE a = 1"
        );
    }
}
