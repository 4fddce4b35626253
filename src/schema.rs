// Explicit table definition for the task store

/// One column of a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    /// SQLite type affinity (INTEGER, TEXT, ...)
    pub sql_type: &'static str,
    pub nullable: bool,
    pub primary_key: bool,
    /// Literal SQL default, if any
    pub default: Option<&'static str>,
}

impl Column {
    fn to_sql(self) -> String {
        let mut sql = format!("{} {}", self.name, self.sql_type);
        if self.primary_key {
            // AUTOINCREMENT keeps ids from being reused after a delete
            sql.push_str(" PRIMARY KEY AUTOINCREMENT");
        } else if !self.nullable {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = self.default {
            sql.push_str(&format!(" DEFAULT {}", default));
        }
        sql
    }
}

/// A table and its columns, in declaration order
#[derive(Debug, Clone, Copy)]
pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
}

impl Table {
    /// Idempotent DDL for this table
    pub fn create_sql(&self) -> String {
        let columns: Vec<String> = self.columns.iter().map(|c| c.to_sql()).collect();
        format!("CREATE TABLE IF NOT EXISTS {} (\n    {}\n)", self.name, columns.join(",\n    "))
    }

    /// Comma-separated column names, in declaration order
    pub fn column_list(&self) -> String {
        self.columns.iter().map(|c| c.name).collect::<Vec<_>>().join(", ")
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// The tasks table.
///
/// `body` is free text. Older databases of this application declared it with an
/// integer type while every caller stored text; the text type is the one kept.
pub const TASKS: Table = Table {
    name: "tasks",
    columns: &[
        Column {
            name: "id",
            sql_type: "INTEGER",
            nullable: false,
            primary_key: true,
            default: None,
        },
        Column {
            name: "task",
            sql_type: "TEXT",
            nullable: false,
            primary_key: false,
            default: None,
        },
        Column {
            name: "body",
            sql_type: "TEXT",
            nullable: false,
            primary_key: false,
            default: None,
        },
        Column {
            name: "state",
            sql_type: "INTEGER",
            nullable: false,
            primary_key: false,
            default: Some("0"),
        },
    ],
};
