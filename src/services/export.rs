//! CSV snapshot of every task, sent to admins as a document. The column set
//! matches what the import accepts, so an export can be re-imported.

use crate::database::models::ExportRow;
use crate::utils::datetime::{format_date, format_datetime};

const EXPORT_HEADER: &str =
    "practice_name,start_date,end_date,full_name,tg_username,phone,task_description,status,next_reminder";

pub fn render_csv(rows: &[ExportRow]) -> String {
    let mut out = String::from(EXPORT_HEADER);
    out.push('\n');

    for row in rows {
        let fields = [
            row.practice_name.clone().unwrap_or_default(),
            row.start_date.map(format_date).unwrap_or_default(),
            format_date(row.end_date),
            row.full_name.clone(),
            row.tg_username.clone().unwrap_or_default(),
            row.phone.clone().unwrap_or_default(),
            row.description.clone(),
            row.status.as_str().to_string(),
            row.next_reminder.map(format_datetime).unwrap_or_default(),
        ];
        let line: Vec<String> = fields.iter().map(|f| escape_csv_field(f)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }

    out
}

fn escape_csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::TaskStatus;
    use chrono::NaiveDate;

    #[test]
    fn test_render_csv() {
        let rows = vec![ExportRow {
            practice_name: Some("Field practice".to_string()),
            start_date: None,
            end_date: NaiveDate::from_ymd_opt(2025, 7, 15).unwrap(),
            full_name: "Jane Doe".to_string(),
            tg_username: Some("@jane".to_string()),
            phone: None,
            description: "Prepare, then submit".to_string(),
            status: TaskStatus::Unseen,
            next_reminder: NaiveDate::from_ymd_opt(2025, 7, 8).unwrap().and_hms_opt(9, 0, 0),
        }];

        let csv = render_csv(&rows);
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), EXPORT_HEADER);
        assert_eq!(
            lines.next().unwrap(),
            "Field practice,,2025-07-15,Jane Doe,@jane,,\"Prepare, then submit\",unseen,2025-07-08 09:00:00"
        );
    }

    #[test]
    fn test_export_round_trips_through_import() {
        let rows = vec![ExportRow {
            practice_name: None,
            start_date: None,
            end_date: NaiveDate::from_ymd_opt(2025, 7, 15).unwrap(),
            full_name: "Jane Doe".to_string(),
            tg_username: None,
            phone: None,
            description: "Review the report".to_string(),
            status: TaskStatus::InProgress,
            next_reminder: None,
        }];

        let parsed = crate::services::import::parse_table(&render_csv(&rows)).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].full_name, "Jane Doe");
        assert_eq!(parsed.rows[0].description, "Review the report");
    }
}
