//! Read-only guard for submitted SQL.
//!
//! Every query passes through [`QueryGuard::validate`] before an engine session is
//! opened. The default check is lexical:
//! - the trimmed statement must start with `SELECT` or `WITH`
//! - no mutating keyword may appear as a whole word anywhere in the text
//!
//! The keyword filter does not understand SQL, so a forbidden word inside a string
//! literal is still rejected. Strict mode also parses the statement with sqlparser
//! and requires every statement to be a query.
//!
//! Independently of the guard, sources only ever run a single statement:
//! [`require_single_statement`] splits on `;` tokens outside literals and
//! comments, so `SELECT 1; COPY ...` never reaches an engine.

use crate::error::{DataError, DataResult};
use crate::models::FileType;
use regex::Regex;
use sqlparser::ast::Statement;
use sqlparser::dialect::{Dialect, DuckDbDialect, SQLiteDialect};
use sqlparser::parser::Parser;
use sqlparser::tokenizer::{Token, Tokenizer};
use std::sync::LazyLock;
use tracing::warn;

/// Mutating keywords rejected for every engine, in reporting order.
const FORBIDDEN_KEYWORDS: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "DROP", "CREATE", "ALTER", "TRUNCATE", "REPLACE", "ATTACH",
    "DETACH",
];

/// Additionally rejected when the statement runs on SQLite.
const SQLITE_ONLY_KEYWORDS: &[&str] = &["PRAGMA"];

static KEYWORD_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    FORBIDDEN_KEYWORDS
        .iter()
        .chain(SQLITE_ONLY_KEYWORDS)
        .filter_map(|kw| {
            Regex::new(&format!(r"(?i)\b{}\b", kw))
                .ok()
                .map(|re| (*kw, re))
        })
        .collect()
});

/// Engine family a statement will run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlEngine {
    Sqlite,
    DuckDb,
}

impl SqlEngine {
    /// Engine serving a classified file, if any.
    pub fn for_file_type(file_type: FileType) -> Option<Self> {
        match file_type {
            FileType::Sqlite => Some(Self::Sqlite),
            FileType::Csv | FileType::Parquet | FileType::Json | FileType::Ndjson => {
                Some(Self::DuckDb)
            }
            FileType::Unknown => None,
        }
    }

    fn dialect(&self) -> Box<dyn Dialect> {
        match self {
            Self::Sqlite => Box::new(SQLiteDialect {}),
            Self::DuckDb => Box::new(DuckDbDialect {}),
        }
    }

    fn forbids(&self, keyword: &str) -> bool {
        FORBIDDEN_KEYWORDS.contains(&keyword)
            || (*self == Self::Sqlite && SQLITE_ONLY_KEYWORDS.contains(&keyword))
    }
}

/// Read-only validator.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryGuard {
    strict: bool,
}

impl QueryGuard {
    /// Keyword filter only.
    pub fn new() -> Self {
        Self { strict: false }
    }

    /// Keyword filter plus parser verification.
    pub fn strict() -> Self {
        Self { strict: true }
    }

    pub fn with_strict(strict: bool) -> Self {
        Self { strict }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Reject anything that is not a read-only query for `engine`.
    ///
    /// # Examples
    ///
    /// ```
    /// use datafile_mcp_server::tools::guard::{QueryGuard, SqlEngine};
    ///
    /// let guard = QueryGuard::new();
    /// assert!(guard.validate("SELECT insertions FROM stats", SqlEngine::Sqlite).is_ok());
    /// assert!(guard.validate("select 1; delete from t", SqlEngine::Sqlite).is_err());
    /// assert!(guard.validate("PRAGMA table_info(t)", SqlEngine::DuckDb).is_err());
    /// ```
    pub fn validate(&self, sql: &str, engine: SqlEngine) -> DataResult<()> {
        let result = validate_keywords(sql, engine).and_then(|()| {
            if self.strict {
                validate_statements(sql, engine)
            } else {
                Ok(())
            }
        });

        if let Err(ref e) = result {
            warn!(error = %e, strict = self.strict, "Rejected query");
        }
        result
    }
}

/// Lexical check: leading verb plus whole-word keyword scan.
pub fn validate_keywords(sql: &str, engine: SqlEngine) -> DataResult<()> {
    let upper = sql.trim().to_uppercase();
    if !(upper.starts_with("SELECT") || upper.starts_with("WITH")) {
        return Err(DataError::not_read_only(
            "statement must start with SELECT or WITH",
        ));
    }

    for (keyword, pattern) in KEYWORD_PATTERNS.iter() {
        if engine.forbids(keyword) && pattern.is_match(sql) {
            return Err(DataError::not_read_only(format!(
                "forbidden keyword {}",
                keyword
            )));
        }
    }
    Ok(())
}

/// Parser check: every statement must be a query.
pub fn validate_statements(sql: &str, engine: SqlEngine) -> DataResult<()> {
    let dialect = engine.dialect();
    let statements = Parser::parse_sql(dialect.as_ref(), sql).map_err(|e| {
        DataError::not_read_only(format!("statement could not be verified: {}", e))
    })?;

    if statements.is_empty() {
        return Err(DataError::not_read_only("empty statement"));
    }

    for stmt in &statements {
        if !matches!(stmt, Statement::Query(_)) {
            return Err(DataError::not_read_only(format!(
                "statement is not a query: {}",
                first_word(&stmt.to_string())
            )));
        }
    }
    Ok(())
}

/// Count the statements in `sql`. Empty statements (`;;`, a trailing `;`) are not counted.
pub fn statement_count(sql: &str, engine: SqlEngine) -> DataResult<usize> {
    let dialect = engine.dialect();
    let tokens = Tokenizer::new(dialect.as_ref(), sql).tokenize().map_err(|e| {
        DataError::query(
            format!("Could not tokenize statement: {}", e),
            "Check for unterminated string literals, quoted identifiers or comments",
        )
    })?;

    let mut count = 0;
    let mut open = false;
    for token in tokens {
        match token {
            Token::SemiColon => {
                if open {
                    count += 1;
                }
                open = false;
            }
            Token::Whitespace(_) | Token::EOF => {}
            _ => open = true,
        }
    }
    if open {
        count += 1;
    }
    Ok(count)
}

/// Reject input that is not exactly one statement.
pub fn require_single_statement(sql: &str, engine: SqlEngine) -> DataResult<()> {
    match statement_count(sql, engine)? {
        1 => Ok(()),
        0 => Err(DataError::not_read_only("empty statement")),
        n => Err(DataError::not_read_only(format!(
            "only a single statement is allowed, found {}",
            n
        ))),
    }
}

fn first_word(text: &str) -> String {
    text.split_whitespace()
        .next()
        .unwrap_or_default()
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(result: DataResult<()>) -> String {
        match result {
            Err(DataError::NotReadOnly { reason }) => reason,
            other => panic!("expected NotReadOnly, got {:?}", other),
        }
    }

    #[test]
    fn test_select_and_with_accepted() {
        let guard = QueryGuard::new();
        assert!(guard.validate("SELECT * FROM t", SqlEngine::Sqlite).is_ok());
        assert!(guard.validate("  select 1", SqlEngine::DuckDb).is_ok());
        assert!(
            guard
                .validate("WITH x AS (SELECT 1 AS a) SELECT a FROM x", SqlEngine::Sqlite)
                .is_ok()
        );
    }

    #[test]
    fn test_must_start_with_select_or_with() {
        let guard = QueryGuard::new();
        assert!(reason(guard.validate("VALUES (1)", SqlEngine::DuckDb)).contains("SELECT or WITH"));
        assert!(guard.validate("", SqlEngine::Sqlite).is_err());
        assert!(guard.validate("EXPLAIN SELECT 1", SqlEngine::Sqlite).is_err());
    }

    #[test]
    fn test_each_forbidden_keyword_named() {
        for kw in FORBIDDEN_KEYWORDS {
            let sql = format!("SELECT 1; {} something", kw.to_lowercase());
            let msg = reason(validate_keywords(&sql, SqlEngine::DuckDb));
            assert!(msg.contains(kw), "{} not named in {}", kw, msg);
        }
    }

    #[test]
    fn test_first_keyword_in_list_order_reported() {
        // DROP appears first in the text, but INSERT comes first in the list.
        let msg = reason(validate_keywords(
            "SELECT 1; DROP TABLE a; INSERT INTO b VALUES (1)",
            SqlEngine::Sqlite,
        ));
        assert!(msg.contains("INSERT"));
    }

    #[test]
    fn test_substrings_not_rejected() {
        let guard = QueryGuard::new();
        assert!(guard.validate("SELECT insertions, updated_at FROM log", SqlEngine::Sqlite).is_ok());
        assert!(guard.validate("SELECT created FROM dropped_items", SqlEngine::DuckDb).is_ok());
    }

    #[test]
    fn test_keyword_in_literal_is_rejected() {
        // The lexical filter does not distinguish literals.
        assert!(validate_keywords("SELECT 'please delete me'", SqlEngine::Sqlite).is_err());
    }

    #[test]
    fn test_pragma_only_forbidden_for_sqlite() {
        let sql = "SELECT * FROM pragma_table_info('t') WHERE 'PRAGMA' = 'PRAGMA'";
        assert!(reason(validate_keywords(sql, SqlEngine::Sqlite)).contains("PRAGMA"));
        assert!(validate_keywords(sql, SqlEngine::DuckDb).is_ok());
    }

    #[test]
    fn test_strict_mode_rejects_trailing_statement() {
        let sql = "WITH x AS (SELECT 1) SELECT * FROM x; VACUUM";
        assert!(QueryGuard::new().validate(sql, SqlEngine::Sqlite).is_ok());
        assert!(QueryGuard::strict().validate(sql, SqlEngine::Sqlite).is_err());
    }

    #[test]
    fn test_strict_mode_accepts_queries() {
        let guard = QueryGuard::strict();
        assert!(guard.validate("SELECT a, b FROM t WHERE a > 1", SqlEngine::Sqlite).is_ok());
        assert!(
            guard
                .validate("SELECT region, sum(total) FROM sales GROUP BY region", SqlEngine::DuckDb)
                .is_ok()
        );
    }

    #[test]
    fn test_strict_mode_rejects_unparseable() {
        assert!(QueryGuard::strict().validate("SELECT (1", SqlEngine::Sqlite).is_err());
    }

    #[test]
    fn test_statement_count_ignores_quoted_semicolons() {
        let sql = "SELECT 'a;b' AS \"x;y\" -- trailing; comment\n";
        assert_eq!(statement_count(sql, SqlEngine::DuckDb).unwrap(), 1);
        assert_eq!(statement_count("SELECT 1;", SqlEngine::Sqlite).unwrap(), 1);
        assert_eq!(statement_count("SELECT 1;; ;", SqlEngine::Sqlite).unwrap(), 1);
        assert_eq!(statement_count("  ", SqlEngine::Sqlite).unwrap(), 0);
    }

    #[test]
    fn test_multiple_statements_rejected() {
        let msg = reason(require_single_statement(
            "SELECT 1; COPY (SELECT 42) TO 'out.csv'",
            SqlEngine::DuckDb,
        ));
        assert!(msg.contains("found 2"));
        assert!(require_single_statement("SELECT 1; VACUUM INTO 'x.db'", SqlEngine::Sqlite).is_err());
        assert!(require_single_statement("WITH x AS (SELECT 1) SELECT * FROM x;", SqlEngine::Sqlite).is_ok());
    }

    #[test]
    fn test_unterminated_literal_is_query_error() {
        assert!(matches!(
            statement_count("SELECT 'open", SqlEngine::DuckDb),
            Err(DataError::Query { .. })
        ));
    }

    #[test]
    fn test_engine_for_file_type() {
        assert_eq!(SqlEngine::for_file_type(FileType::Sqlite), Some(SqlEngine::Sqlite));
        assert_eq!(SqlEngine::for_file_type(FileType::Ndjson), Some(SqlEngine::DuckDb));
        assert_eq!(SqlEngine::for_file_type(FileType::Unknown), None);
    }
}
