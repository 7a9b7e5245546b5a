use crate::categories::CategorySet;
use crate::holiday_extractor::HolidayRecord;
use crate::sql::{self, OnConflict, SqlValue, Statement};

const CREATE_CATEGORIES_TABLE: &str = "CREATE TABLE IF NOT EXISTS holiday_categories (
    id SERIAL PRIMARY KEY,
    name VARCHAR(255) NOT NULL UNIQUE
)";

const CREATE_LINKS_TABLE: &str = "CREATE TABLE IF NOT EXISTS holiday_category_links (
    holiday_id INT REFERENCES holidays(id) ON DELETE CASCADE,
    category_id INT REFERENCES holiday_categories(id) ON DELETE CASCADE,
    PRIMARY KEY (holiday_id, category_id)
)";

/// How matched categories show up in the generated SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderPolicy {
    /// Categories appended to the holiday name: `Name [A, B]`.
    Embedded,
    /// Plain names plus `holiday_category_links` rows.
    #[default]
    NormalizedLink,
}

/// Append-only buffer of holiday rows and link statements, rendered once at
/// the end of the run.
#[derive(Debug)]
pub struct SqlScript {
    policy: RenderPolicy,
    holiday_rows: Vec<Vec<SqlValue>>,
    links: Vec<Statement>,
}

impl SqlScript {
    pub fn new(policy: RenderPolicy) -> Self {
        Self {
            policy,
            holiday_rows: Vec::new(),
            links: Vec::new(),
        }
    }

    pub fn holiday_count(&self) -> usize {
        self.holiday_rows.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn extend(&mut self, records: &[HolidayRecord]) {
        for record in records {
            self.push(record);
        }
    }

    pub fn push(&mut self, record: &HolidayRecord) {
        let name = match self.policy {
            RenderPolicy::Embedded => {
                format!("{} [{}]", record.name, record.categories.join(", "))
            }
            RenderPolicy::NormalizedLink => record.name.clone(),
        };
        self.holiday_rows.push(holiday_row(record, name));

        if self.policy == RenderPolicy::NormalizedLink {
            for category in &record.categories {
                self.links.push(link_statement(record, category));
            }
        }
    }

    /// Full statement list for the run, wrapped in a transaction.
    pub fn statements(&self, categories: &CategorySet) -> Vec<Statement> {
        let linked = self.policy == RenderPolicy::NormalizedLink;
        let mut statements = vec![Statement::Raw("BEGIN")];

        if linked {
            statements.push(Statement::Raw(CREATE_CATEGORIES_TABLE));
            statements.push(Statement::Raw(CREATE_LINKS_TABLE));
        }

        statements.push(Statement::Raw("DELETE FROM holidays"));
        statements.push(Statement::Insert {
            table: "holidays",
            columns: vec!["order_number", "date", "name"],
            rows: self.holiday_rows.clone(),
            on_conflict: None,
        });

        if linked {
            statements.extend(categories.iter().map(category_upsert));
            statements.extend(self.links.iter().cloned());
        }

        statements.push(Statement::Raw("COMMIT"));
        statements
    }

    pub fn render(&self, categories: &CategorySet) -> String {
        sql::render_script(&self.statements(categories))
    }
}

fn holiday_row(record: &HolidayRecord, name: String) -> Vec<SqlValue> {
    vec![
        SqlValue::Int(i64::from(record.ordinal)),
        SqlValue::Text(record.iso_date()),
        SqlValue::Text(name),
    ]
}

// Holidays are looked up by (date, order_number), the pair the extractor
// keeps unique.
fn link_statement(record: &HolidayRecord, category: &str) -> Statement {
    Statement::Insert {
        table: "holiday_category_links",
        columns: vec!["holiday_id", "category_id"],
        rows: vec![vec![
            SqlValue::Lookup {
                column: "id",
                table: "holidays",
                filters: vec![
                    ("date", SqlValue::Text(record.iso_date())),
                    ("order_number", SqlValue::Int(i64::from(record.ordinal))),
                ],
            },
            SqlValue::Lookup {
                column: "id",
                table: "holiday_categories",
                filters: vec![("name", SqlValue::text(category))],
            },
        ]],
        on_conflict: Some(OnConflict::DoNothing),
    }
}

fn category_upsert(label: &str) -> Statement {
    Statement::Insert {
        table: "holiday_categories",
        columns: vec!["name"],
        rows: vec![vec![SqlValue::text(label)]],
        on_conflict: Some(OnConflict::DoNothingOn(vec!["name"])),
    }
}
