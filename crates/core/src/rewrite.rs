use std::{borrow::Cow, sync::LazyLock};

use regex::{Captures, Regex};

use crate::{Dialect, IdentifierQuoting, Statement, TypeRewrite};

// A single-quoted literal (with `''` escapes) or a bare word. Literals are
// matched first so words inside them are never rewritten.
static LITERAL_OR_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"'(?:[^']|'')*'|[A-Za-z_][A-Za-z0-9_]*").expect("word pattern is valid")
});

/// Rewrites a statement into the connected engine's syntax.
#[must_use]
pub fn adapt_statement(statement: &Statement, dialect: &dyn Dialect) -> String {
    let quoted = rewrite_identifier_quoting(statement.sql(), dialect.identifier_quoting());
    if statement.is_create() {
        rewrite_type_names(&quoted, dialect.type_rewrites()).into_owned()
    } else {
        quoted.into_owned()
    }
}

/// Quotes a bare identifier for the engine, doubling embedded quote characters.
#[must_use]
pub fn quote_identifier(name: &str, quoting: IdentifierQuoting) -> String {
    let quote = match quoting {
        IdentifierQuoting::Ansi => '"',
        IdentifierQuoting::Backtick => '`',
    };
    let escaped = name.replace(quote, &format!("{quote}{quote}"));
    format!("{quote}{escaped}{quote}")
}

#[must_use]
pub fn rewrite_identifier_quoting(sql: &str, quoting: IdentifierQuoting) -> Cow<'_, str> {
    match quoting {
        IdentifierQuoting::Ansi if sql.contains('`') => Cow::Owned(sql.replace('`', "\"")),
        IdentifierQuoting::Ansi | IdentifierQuoting::Backtick => Cow::Borrowed(sql),
    }
}

#[must_use]
pub fn rewrite_type_names<'a>(sql: &'a str, rewrites: &[TypeRewrite]) -> Cow<'a, str> {
    if rewrites.is_empty() {
        return Cow::Borrowed(sql);
    }

    LITERAL_OR_WORD.replace_all(sql, |captures: &Captures<'_>| {
        let word = &captures[0];
        if word.starts_with('\'') {
            return word.to_string();
        }
        rewrites
            .iter()
            .find(|rewrite| rewrite.from.eq_ignore_ascii_case(word))
            .map_or_else(|| word.to_string(), |rewrite| rewrite.to.to_string())
    })
}
