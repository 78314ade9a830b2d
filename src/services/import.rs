//! Bulk task intake from pasted tabular text.
//!
//! The batch arrives as CSV-style lines with a header row. Parsing and
//! reconciliation are separate steps: `parse_table` turns text into typed
//! rows (rejecting the whole batch only for a broken header), and
//! `reconcile` resolves owners and inserts whatever is not already present,
//! so re-sending the same batch is idempotent.

use anyhow::{bail, Result};
use chrono::NaiveDate;

use crate::database::connection::DatabaseManager;
use crate::database::models::{NewTask, Task, User};
use crate::utils::datetime::normalize_date;

const FALLBACK_DESCRIPTION: &str = "No description";

/// One typed row of the intake batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRow {
    pub full_name: String,
    pub practice_name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: NaiveDate,
    pub description: String,
    pub tg_username: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBatch {
    pub rows: Vec<ImportRow>,
    /// Rows dropped individually: missing full name or unparseable due date.
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub added: usize,
    pub duplicates: usize,
}

/// Parses the batch. A header without the required `full_name` and
/// `end_date` columns is a format error for the whole batch, raised before
/// any row is looked at.
pub fn parse_table(input: &str) -> Result<ParsedBatch> {
    let mut lines = input.lines().filter(|l| !l.trim().is_empty());

    let header_line = match lines.next() {
        Some(line) => line,
        None => bail!("The batch is empty"),
    };
    let headers: Vec<String> = split_csv_line(header_line)
        .into_iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let column = |name: &str| headers.iter().position(|h| h == name);

    let full_name_idx = column("full_name");
    let end_date_idx = column("end_date");
    let (full_name_idx, end_date_idx) = match (full_name_idx, end_date_idx) {
        (Some(f), Some(e)) => (f, e),
        _ => bail!("The batch must contain the columns: full_name and end_date"),
    };

    let practice_name_idx = column("practice_name");
    let description_idx = column("task_description");
    let start_date_idx = column("start_date");
    let tg_username_idx = column("tg_username");
    let phone_idx = column("phone");

    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for line in lines {
        let fields = split_csv_line(line);
        let field = |idx: Option<usize>| -> Option<String> {
            idx.and_then(|i| fields.get(i))
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty())
        };

        let full_name = match field(Some(full_name_idx)) {
            Some(name) => name,
            None => {
                skipped += 1;
                continue;
            }
        };

        let end_date = match field(Some(end_date_idx)).and_then(|d| normalize_date(&d)) {
            Some(date) => date,
            None => {
                skipped += 1;
                continue;
            }
        };

        let practice_name = field(practice_name_idx);
        let description = field(description_idx)
            .or_else(|| practice_name.clone())
            .unwrap_or_else(|| FALLBACK_DESCRIPTION.to_string());
        let start_date = field(start_date_idx).and_then(|d| normalize_date(&d));
        let tg_username = field(tg_username_idx).map(|u| {
            if u.starts_with('@') {
                u
            } else {
                format!("@{u}")
            }
        });
        let phone = field(phone_idx);

        rows.push(ImportRow {
            full_name,
            practice_name,
            start_date,
            end_date,
            description,
            tg_username,
            phone,
        });
    }

    Ok(ParsedBatch { rows, skipped })
}

/// Applies a parsed batch to the store. Owners are resolved by exact full
/// name (first match wins, new identity-less record otherwise); identical
/// (owner, due date, category, description) tuples are skipped.
pub async fn reconcile(db: &DatabaseManager, rows: &[ImportRow]) -> Result<ImportSummary> {
    let mut summary = ImportSummary { added: 0, duplicates: 0 };

    for row in rows {
        let owner = User::get_or_create_by_full_name(
            &db.pool,
            &row.full_name,
            row.tg_username.as_deref(),
            row.phone.as_deref(),
        )
        .await?;

        let exists = Task::duplicate_exists(
            &db.pool,
            &owner.id,
            row.practice_name.as_deref(),
            &row.description,
            row.end_date,
        )
        .await?;
        if exists {
            summary.duplicates += 1;
            continue;
        }

        Task::create(
            &db.pool,
            NewTask {
                user_id: owner.id,
                practice_name: row.practice_name.clone(),
                start_date: row.start_date,
                end_date: row.end_date,
                description: row.description.clone(),
            },
        )
        .await?;
        summary.added += 1;
    }

    Ok(summary)
}

/// Minimal CSV field splitting with double-quote support. Good enough for
/// pasted spreadsheet rows; a full RFC 4180 reader is not warranted here.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                chars.next();
                current.push('"');
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_csv_line_plain() {
        assert_eq!(split_csv_line("a,b,c"), vec!["a", "b", "c"]);
        assert_eq!(split_csv_line("a,,c"), vec!["a", "", "c"]);
    }

    #[test]
    fn test_split_csv_line_quoted() {
        assert_eq!(
            split_csv_line(r#"Jane Doe,"Prepare, review and submit",2025-07-15"#),
            vec!["Jane Doe", "Prepare, review and submit", "2025-07-15"]
        );
        assert_eq!(split_csv_line(r#""say ""hi""",x"#), vec![r#"say "hi""#, "x"]);
    }

    #[test]
    fn test_parse_table_missing_required_columns_is_fatal() {
        let err = parse_table("full_name,practice_name\nJane Doe,Internship").unwrap_err();
        assert!(err.to_string().contains("end_date"));

        assert!(parse_table("").is_err());
    }

    #[test]
    fn test_parse_table_skips_bad_rows_individually() {
        let batch = parse_table(
            "full_name,end_date\n\
             Jane Doe,2025-07-15\n\
             ,2025-07-15\n\
             John Smith,15/07/2025\n\
             Ann Lee,15.07.2025",
        )
        .unwrap();

        assert_eq!(batch.rows.len(), 2);
        assert_eq!(batch.skipped, 2);
        assert_eq!(batch.rows[0].full_name, "Jane Doe");
        assert_eq!(batch.rows[1].full_name, "Ann Lee");
        assert_eq!(batch.rows[0].end_date, batch.rows[1].end_date);
    }

    #[test]
    fn test_parse_table_description_fallback_and_username() {
        let batch = parse_table(
            "full_name,end_date,practice_name,tg_username\n\
             Jane Doe,2025-07-15,Field practice,jane\n\
             John Smith,2025-07-15,,",
        )
        .unwrap();

        assert_eq!(batch.rows[0].description, "Field practice");
        assert_eq!(batch.rows[0].tg_username.as_deref(), Some("@jane"));
        assert_eq!(batch.rows[1].description, FALLBACK_DESCRIPTION);
        assert_eq!(batch.rows[1].tg_username, None);
    }
}
