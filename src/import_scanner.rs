//! Scans program source for `from NAMESPACE import SYMBOL` declarations
//! without executing it, and locates every usage of each imported symbol.
//!
//! This is deliberately not a full-language parser: the scan needs only the
//! narrow declaration grammar plus enough structural checking (terminated
//! strings, balanced brackets) to refuse text that is not going to execute
//! anyway.

use nom::{
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char as nom_char, space0, space1},
    combinator::{opt, recognize},
    multi::separated_list1,
    sequence::{pair, preceded, tuple},
    IResult,
};
use nom_supreme::final_parser::Location;
use regex::Regex;

use crate::vocabulary::Vocabulary;

/// One namespaced symbol reference: where it is declared and everywhere it
/// is used. Produced per scan, discarded after repair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReference {
    pub namespace: String,
    pub symbol: String,
    pub declaration: Location,
    pub usages: Vec<Location>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    UnterminatedString { line: usize },
    UnbalancedBracket { bracket: char, line: usize },
    MalformedImport { line: usize, found: String },
}

impl std::fmt::Display for ScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanError::UnterminatedString { line } => {
                write!(f, "unterminated string literal on line {}", line)
            }
            ScanError::UnbalancedBracket { bracket, line } => {
                write!(f, "unbalanced '{}' on line {}", bracket, line)
            }
            ScanError::MalformedImport { line, found } => {
                write!(f, "malformed import on line {}: {}", line, found)
            }
        }
    }
}

impl std::error::Error for ScanError {}

/// Extract every import reference whose namespace belongs to the
/// vocabulary. References to foreign namespaces are ignored; this scanner
/// does not vouch for them.
pub fn scan(source: &str, vocabulary: &Vocabulary) -> Result<Vec<ImportReference>, ScanError> {
    check_structure(source)?;

    let mut references: Vec<ImportReference> = Vec::new();
    let mut line_offset = 0usize;

    for (idx, raw_line) in source.split('\n').enumerate() {
        let line_no = idx + 1;
        let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
        let trimmed = line.trim_start();

        if trimmed.starts_with("from ") {
            let parsed = match import_line(trimmed) {
                Ok((_, parsed)) => parsed,
                Err(_) => {
                    return Err(ScanError::MalformedImport {
                        line: line_no,
                        found: trimmed.to_string(),
                    })
                }
            };

            if vocabulary.is_known_namespace(&parsed.namespace) {
                let indent = line.len() - trimmed.len();
                for (name, name_offset) in parsed.names {
                    let already_seen = references
                        .iter()
                        .any(|r| r.namespace == parsed.namespace && r.symbol == name);
                    if already_seen {
                        continue;
                    }
                    let offset = line_offset + indent + name_offset;
                    references.push(ImportReference {
                        namespace: parsed.namespace.clone(),
                        symbol: name,
                        declaration: Location::locate_tail(source, &source[offset..]),
                        usages: Vec::new(),
                    });
                }
            }
        }

        line_offset += raw_line.len() + 1;
    }

    for reference in references.iter_mut() {
        reference.usages = locate_identifier(source, &reference.symbol)
            .into_iter()
            .filter(|location| *location != reference.declaration)
            .collect();
    }

    Ok(references)
}

/// Every whole-identifier occurrence of `ident` in `source`.
pub fn locate_identifier(source: &str, ident: &str) -> Vec<Location> {
    let pattern = match Regex::new(&format!(r"\b{}\b", regex::escape(ident))) {
        Ok(pattern) => pattern,
        Err(_) => return Vec::new(),
    };
    pattern
        .find_iter(source)
        .map(|m| Location::locate_tail(source, &source[m.start()..]))
        .collect()
}

struct ParsedImport {
    namespace: String,
    /// (imported name, byte offset of the name within the parsed line)
    names: Vec<(String, usize)>,
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

fn dotted_path(input: &str) -> IResult<&str, &str> {
    recognize(separated_list1(nom_char('.'), identifier))(input)
}

/// `from DOTTED.PATH import IDENT [as IDENT] (, IDENT [as IDENT])*`,
/// optionally followed by a `#` comment. Aliases are accepted but the
/// imported name is what gets recorded.
fn import_line(line: &str) -> IResult<&str, ParsedImport> {
    let (rest, _) = tuple((tag("from"), space1))(line)?;
    let (rest, namespace) = dotted_path(rest)?;
    let (rest, _) = tuple((space1, tag("import"), space1))(rest)?;

    let mut names = Vec::new();
    let mut input = rest;
    loop {
        let offset = line.len() - input.len();
        let (next, name) = identifier(input)?;
        let (next, _) = opt(tuple((space1, tag("as"), space1, identifier)))(next)?;
        names.push((name.to_string(), offset));

        let (next, comma) = opt(preceded(space0, nom_char(',')))(next)?;
        if comma.is_none() {
            input = next;
            break;
        }
        let (next, _) = space0(next)?;
        input = next;
    }

    let (input, _) = space0(input)?;
    if !input.is_empty() && !input.starts_with('#') {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Eof,
        )));
    }

    Ok((
        "",
        ParsedImport {
            namespace: namespace.to_string(),
            names,
        },
    ))
}

#[derive(PartialEq)]
enum StringState {
    None,
    Single(char),
    Triple(char),
}

/// Structural sanity check standing in for a full parse: strings must
/// terminate (single-quoted ones on their own line) and brackets must
/// balance outside strings and comments.
fn check_structure(source: &str) -> Result<(), ScanError> {
    let chars: Vec<char> = source.chars().collect();
    let mut state = StringState::None;
    let mut stack: Vec<(char, usize)> = Vec::new();
    let mut line = 1usize;
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];
        match state {
            StringState::None => match c {
                '#' => {
                    while i < chars.len() && chars[i] != '\n' {
                        i += 1;
                    }
                    continue;
                }
                '\'' | '"' => {
                    if i + 2 < chars.len() && chars[i + 1] == c && chars[i + 2] == c {
                        state = StringState::Triple(c);
                        i += 3;
                        continue;
                    }
                    state = StringState::Single(c);
                }
                '(' | '[' | '{' => stack.push((c, line)),
                ')' | ']' | '}' => {
                    let expected = match c {
                        ')' => '(',
                        ']' => '[',
                        _ => '{',
                    };
                    match stack.pop() {
                        Some((open, _)) if open == expected => {}
                        _ => return Err(ScanError::UnbalancedBracket { bracket: c, line }),
                    }
                }
                '\n' => line += 1,
                _ => {}
            },
            StringState::Single(quote) => match c {
                '\\' => {
                    i += 2;
                    continue;
                }
                '\n' => return Err(ScanError::UnterminatedString { line }),
                c if c == quote => state = StringState::None,
                _ => {}
            },
            StringState::Triple(quote) => {
                if c == '\\' {
                    i += 2;
                    continue;
                }
                if c == quote && i + 2 < chars.len() && chars[i + 1] == quote && chars[i + 2] == quote
                {
                    state = StringState::None;
                    i += 3;
                    continue;
                }
                if c == '\n' {
                    line += 1;
                }
            }
        }
        i += 1;
    }

    if state != StringState::None {
        return Err(ScanError::UnterminatedString { line });
    }
    if let Some((bracket, open_line)) = stack.pop() {
        return Err(ScanError::UnbalancedBracket {
            bracket,
            line: open_line,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabulary::Vocabulary;

    #[test]
    fn scans_multi_symbol_import() {
        let source = "from diagrams.aws.compute import Lambda, ECS\n";
        let refs = scan(source, &Vocabulary::builtin()).unwrap();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].namespace, "diagrams.aws.compute");
        assert_eq!(refs[0].symbol, "Lambda");
        assert_eq!(refs[0].declaration, Location { line: 1, column: 34 });
        assert_eq!(refs[1].symbol, "ECS");
        assert_eq!(refs[1].declaration, Location { line: 1, column: 42 });
    }

    #[test]
    fn alias_records_the_imported_name() {
        let source = "from diagrams.aws.compute import Lambda as Fn\n";
        let refs = scan(source, &Vocabulary::builtin()).unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].symbol, "Lambda");
    }

    #[test]
    fn foreign_namespaces_are_ignored() {
        let source = "from diagrams import Diagram, Cluster\nfrom pathlib import Path\n";
        let refs = scan(source, &Vocabulary::builtin()).unwrap();
        assert!(refs.is_empty());
    }

    #[test]
    fn usage_sites_exclude_the_declaration() {
        let source = "\
from diagrams.aws.compute import Lambda

auth = Lambda(\"Auth\")
worker = Lambda(\"Worker\")
";
        let refs = scan(source, &Vocabulary::builtin()).unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].usages.len(), 2);
        assert_eq!(refs[0].usages[0], Location { line: 3, column: 8 });
        assert_eq!(refs[0].usages[1], Location { line: 4, column: 10 });
    }

    #[test]
    fn whole_identifier_discipline_for_usages() {
        // LambdaLayer must not count as a usage of Lambda
        let source = "from diagrams.aws.compute import Lambda\nx = LambdaLayer()\n";
        let refs = scan(source, &Vocabulary::builtin()).unwrap();
        assert_eq!(refs[0].usages.len(), 0);
    }

    #[test]
    fn duplicate_imports_collapse_to_one_reference() {
        let source = "\
from diagrams.aws.compute import Lambda
from diagrams.aws.compute import Lambda
";
        let refs = scan(source, &Vocabulary::builtin()).unwrap();
        assert_eq!(refs.len(), 1);
        // the second declaration shows up as a usage site
        assert_eq!(refs[0].usages.len(), 1);
    }

    #[test]
    fn malformed_import_line_fails_the_scan() {
        let source = "from diagrams.aws.compute import\n";
        let err = scan(source, &Vocabulary::builtin()).unwrap_err();
        assert!(matches!(err, ScanError::MalformedImport { line: 1, .. }));
    }

    #[test]
    fn trailing_comment_is_allowed() {
        let source = "from diagrams.aws.compute import Lambda  # handler\n";
        let refs = scan(source, &Vocabulary::builtin()).unwrap();
        assert_eq!(refs.len(), 1);
    }

    #[test]
    fn unbalanced_bracket_fails_the_scan() {
        let source = "x = Lambda(\"Auth\"\n";
        let err = scan(source, &Vocabulary::builtin()).unwrap_err();
        assert!(matches!(err, ScanError::UnbalancedBracket { .. }));
    }

    #[test]
    fn unterminated_string_fails_the_scan() {
        let source = "x = \"oops\ny = 1\n";
        let err = scan(source, &Vocabulary::builtin()).unwrap_err();
        assert!(matches!(err, ScanError::UnterminatedString { line: 1 }));
    }

    #[test]
    fn brackets_inside_strings_and_comments_do_not_count() {
        let source = "\
title = \"Platform (v2\"
# closing ) in a comment
doc = \"\"\"multi
line { [ text\"\"\"
";
        assert!(check_structure(source).is_ok());
    }
}
