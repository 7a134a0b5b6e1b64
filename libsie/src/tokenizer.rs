use crate::{Result, SieError};
use pest::iterators::Pair;
use pest::Parser;

#[derive(Parser)]
#[grammar = "sie.pest"]
pub struct LineParser;

/// Splits one line into its decoded fields.
///
/// Fields are separated by spaces or tabs. A field wrapped in double quotes may
/// contain blanks, and a field wrapped in curly braces may contain blanks and
/// quoted sub-spans; the quotes inside a brace field are kept so the field can
/// be split again (that is how `#TRANS` carries its annotation list).
/// Backslash escapes are resolved in every field, except inside the quoted
/// sub-spans of a brace field, which are left for the second split.
///
/// A quote or brace that is still open at the end of the line makes the rest
/// of the line the final field. A blank line has no fields.
pub fn split_fields(line: &str) -> Result<Vec<String>> {
    let mut pairs =
        LineParser::parse(Rule::line, line).map_err(|e| SieError::Syntax(e.to_string()))?;
    let line = pairs
        .next()
        .ok_or(SieError::Syntax(format!("no fields in `{}'", line)))?;

    Ok(line.into_inner().filter_map(decode_field).collect())
}

fn decode_field(pair: Pair<Rule>) -> Option<String> {
    match pair.as_rule() {
        Rule::bare => Some(unescape(pair.as_str())),
        Rule::quoted => Some(unescape(inner_str(pair))),
        Rule::braced => Some(decode_braced(inner_str(pair))),
        Rule::block_open => Some("{".to_string()),
        _ => None,
    }
}

/// Text of the first inner pair, empty when there is none.
fn inner_str(token: Pair<Rule>) -> &str {
    token.into_inner().next().map(|p| p.as_str()).unwrap_or("")
}

/// Unescapes brace content outside of quoted sub-spans. Quoted sub-spans are
/// copied as written, escapes included, so `{6 "P\"1"}` still splits into
/// tag `6` and text `P"1`.
fn decode_braced(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_quote = false;
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' if in_quote => {
                out.push(c);
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            '\\' => match chars.next() {
                Some(escaped) => out.push(unescape_char(escaped)),
                None => out.push('\\'),
            },
            '"' => {
                in_quote = !in_quote;
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

fn unescape_char(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        other => other,
    }
}

/// Resolves backslash escapes. A trailing lone backslash is kept.
pub fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(escaped) => out.push(unescape_char(escaped)),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{split_fields, unescape};
    use anyhow::Result;

    #[test]
    fn split_plain_words() -> Result<()> {
        assert_eq!(split_fields("one two three")?, vec!["one", "two", "three"]);
        assert_eq!(split_fields("  one\t two  ")?, vec!["one", "two"]);
        Ok(())
    }

    #[test]
    fn split_quoted() -> Result<()> {
        assert_eq!(split_fields(r#"one "two three""#)?, vec!["one", "two three"]);
        assert_eq!(
            split_fields(r#"one "two three" four"#)?,
            vec!["one", "two three", "four"]
        );
        assert_eq!(
            split_fields(r#"one "two three" "four""#)?,
            vec!["one", "two three", "four"]
        );
        Ok(())
    }

    #[test]
    fn split_escaped_quotes() -> Result<()> {
        assert_eq!(
            split_fields(r#"one "two \" three" "four""#)?,
            vec!["one", "two \" three", "four"]
        );
        assert_eq!(
            split_fields(r#"one "two \" three\\" "four""#)?,
            vec!["one", "two \" three\\", "four"]
        );
        Ok(())
    }

    #[test]
    fn split_braces() -> Result<()> {
        assert_eq!(
            split_fields(r#"one two {three \"four\"} "five""#)?,
            vec!["one", "two", "three \"four\"", "five"]
        );
        assert_eq!(
            split_fields(r#"#TRANS 3010 {1 "Project X" 6 "K2"} -500.00"#)?,
            vec!["#TRANS", "3010", r#"1 "Project X" 6 "K2""#, "-500.00"]
        );
        assert_eq!(
            split_fields(r#"#TRANS 1930 {} 500.00"#)?,
            vec!["#TRANS", "1930", "", "500.00"]
        );
        Ok(())
    }

    #[test]
    fn escapes_inside_brace_quotes_survive_for_the_second_split() -> Result<()> {
        assert_eq!(
            split_fields(r#"#TRANS 3010 {6 "P\"1"} -10"#)?,
            vec!["#TRANS", "3010", r#"6 "P\"1""#, "-10"]
        );
        assert_eq!(split_fields(r#"{6 "P\"1"}"#)?, vec![r#"6 "P\"1""#]);
        assert_eq!(split_fields(r#"{6 "a\\" 7 b}"#)?, vec![r#"6 "a\\" 7 b"#]);
        assert_eq!(split_fields(r#"{a\tb}"#)?, vec!["a\tb"]);
        Ok(())
    }

    #[test]
    fn quoted_closing_brace_stays_in_brace_field() -> Result<()> {
        assert_eq!(
            split_fields(r#"{1 "a}b"} next"#)?,
            vec![r#"1 "a}b""#, "next"]
        );
        Ok(())
    }

    #[test]
    fn unterminated_field_takes_rest_of_line() -> Result<()> {
        assert_eq!(
            split_fields(r#"#FNAMN "Kastelo AB"#)?,
            vec!["#FNAMN", "Kastelo AB"]
        );
        assert_eq!(split_fields("one {two three")?, vec!["one", "two three"]);
        Ok(())
    }

    #[test]
    fn empty_and_block_lines() -> Result<()> {
        assert!(split_fields("")?.is_empty());
        assert!(split_fields(" \t ")?.is_empty());
        assert_eq!(split_fields("{")?, vec!["{"]);
        assert_eq!(split_fields("  }  ")?, vec!["}"]);
        assert_eq!(split_fields(r#"a """#)?, vec!["a", ""]);
        Ok(())
    }

    #[test]
    fn unescape_sequences() {
        assert_eq!(unescape(r"a\tb"), "a\tb");
        assert_eq!(unescape(r"tail\"), "tail\\");
        assert_eq!(unescape(r#"Project \"X\""#), "Project \"X\"");
    }
}
