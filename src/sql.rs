//! Structured SQL statements and their rendering.
//!
//! Values are kept unescaped until [`Statement::render`]; string literals are
//! quoted in exactly one place, [`quote_literal`].

/// A value in a `VALUES` tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Int(i64),
    Text(String),
    /// `(SELECT column FROM table WHERE a = .. AND b = ..)`
    Lookup {
        column: &'static str,
        table: &'static str,
        filters: Vec<(&'static str, SqlValue)>,
    },
}

impl SqlValue {
    pub fn text(value: impl Into<String>) -> Self {
        SqlValue::Text(value.into())
    }

    fn render(&self) -> String {
        match self {
            SqlValue::Int(value) => value.to_string(),
            SqlValue::Text(value) => quote_literal(value),
            SqlValue::Lookup {
                column,
                table,
                filters,
            } => {
                let conditions: Vec<String> = filters
                    .iter()
                    .map(|(name, value)| format!("{} = {}", name, value.render()))
                    .collect();
                format!(
                    "(SELECT {} FROM {} WHERE {})",
                    column,
                    table,
                    conditions.join(" AND ")
                )
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnConflict {
    /// `ON CONFLICT DO NOTHING`
    DoNothing,
    /// `ON CONFLICT (columns) DO NOTHING`
    DoNothingOn(Vec<&'static str>),
}

impl OnConflict {
    fn render(&self) -> String {
        match self {
            OnConflict::DoNothing => "ON CONFLICT DO NOTHING".to_string(),
            OnConflict::DoNothingOn(columns) => {
                format!("ON CONFLICT ({}) DO NOTHING", columns.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Fixed SQL with no interpolated values (transaction control, DDL).
    Raw(&'static str),
    Insert {
        table: &'static str,
        columns: Vec<&'static str>,
        rows: Vec<Vec<SqlValue>>,
        on_conflict: Option<OnConflict>,
    },
}

impl Statement {
    /// Render to SQL text terminated by `;`. An insert without rows renders
    /// to `None`.
    pub fn render(&self) -> Option<String> {
        match self {
            Statement::Raw(sql) => Some(format!("{};", sql.trim_end_matches(';'))),
            Statement::Insert {
                table,
                columns,
                rows,
                on_conflict,
            } => {
                if rows.is_empty() {
                    return None;
                }
                let tuples: Vec<String> = rows.iter().map(|row| render_tuple(row)).collect();
                let mut sql = format!(
                    "INSERT INTO {} ({}) VALUES\n{}",
                    table,
                    columns.join(", "),
                    tuples.join(",\n")
                );
                if let Some(on_conflict) = on_conflict {
                    sql.push('\n');
                    sql.push_str(&on_conflict.render());
                }
                sql.push(';');
                Some(sql)
            }
        }
    }
}

/// Render a row as `(v1, v2, ...)`.
pub fn render_tuple(values: &[SqlValue]) -> String {
    let rendered: Vec<String> = values.iter().map(SqlValue::render).collect();
    format!("({})", rendered.join(", "))
}

/// Quote a string literal, doubling embedded single quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Render statements separated by blank lines.
pub fn render_script(statements: &[Statement]) -> String {
    let mut script = statements
        .iter()
        .filter_map(Statement::render)
        .collect::<Vec<_>>()
        .join("\n\n");
    script.push('\n');
    script
}
