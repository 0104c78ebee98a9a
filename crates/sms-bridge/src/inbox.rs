//! SMS Inbox Records
//!
//! Parses the output of
//! `content query --uri content://sms/inbox --projection _id:address:body`:
//!
//! ```text
//! Row: 0 _id=41, address=+15550100, body=See you at dinner
//! Row: 1 _id=42, address=NULL, body=You WON!
//! Claim your prize today
//! ```
//!
//! `body` is the last column so commas inside it need no escaping; lines
//! that do not start a new row continue the previous body. Rows are numbered
//! from zero, so a body line that happens to begin with `Row: ` only opens a
//! row when it carries the next row number. A body forging exactly that
//! line is indistinguishable from real output.

use serde::{Deserialize, Serialize};
use spamguard_core::IncomingMessage;
use tracing::warn;

/// Column value the content provider prints for null
const NULL: &str = "NULL";

/// One message row of the SMS content provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsRecord {
    /// Provider row id, increasing with arrival
    pub id: u64,
    pub address: Option<String>,
    pub body: Option<String>,
}

/// Row number of a `Row: N ...` line
fn row_number(line: &str) -> Option<usize> {
    let rest = line.strip_prefix("Row: ")?;
    let (number, _) = rest.split_once(' ').unwrap_or((rest, ""));
    number.parse().ok()
}

impl SmsRecord {
    /// Parse one `Row:` line
    fn parse_row(line: &str) -> Option<Self> {
        let rest = line.strip_prefix("Row: ")?;
        let (_, columns) = rest.split_once(' ')?;

        let columns = columns.strip_prefix("_id=")?;
        let (id, columns) = columns.split_once(", address=")?;
        let (address, body) = columns.split_once(", body=")?;

        Some(Self {
            id: id.trim().parse().ok()?,
            address: non_null(address),
            body: non_null(body),
        })
    }
}

impl From<SmsRecord> for IncomingMessage {
    fn from(record: SmsRecord) -> Self {
        IncomingMessage::new(record.address, record.body)
    }
}

fn non_null(value: &str) -> Option<String> {
    (value != NULL).then(|| value.to_string())
}

/// Parse the full query output, sorted by id
pub fn parse_query_output(output: &str) -> Vec<SmsRecord> {
    let mut records: Vec<SmsRecord> = Vec::new();
    let mut in_row = false;
    let mut next_row = 0;

    for line in output.lines() {
        if row_number(line) == Some(next_row) {
            next_row += 1;
            match SmsRecord::parse_row(line) {
                Some(record) => {
                    records.push(record);
                    in_row = true;
                }
                None => {
                    warn!("Skipping unparsable inbox row: {:?}", line);
                    in_row = false;
                }
            }
        } else if in_row {
            if let Some(record) = records.last_mut() {
                let body = record.body.get_or_insert_with(String::new);
                body.push('\n');
                body.push_str(line);
            }
        }
    }

    records.sort_by_key(|r| r.id);
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rows() {
        let output = "\
Row: 0 _id=42, address=+15550100, body=Win a prize, today only
Row: 1 _id=41, address=NULL, body=See you at dinner
";
        let records = parse_query_output(output);
        assert_eq!(
            records,
            vec![
                SmsRecord { id: 41, address: None, body: Some("See you at dinner".into()) },
                SmsRecord {
                    id: 42,
                    address: Some("+15550100".into()),
                    body: Some("Win a prize, today only".into()),
                },
            ]
        );
    }

    #[test]
    fn test_multiline_body() {
        let output = "Row: 0 _id=7, address=ACME, body=First line\nsecond line\n\nfourth\n";
        let records = parse_query_output(output);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].body.as_deref(), Some("First line\nsecond line\n\nfourth"));
    }

    #[test]
    fn test_null_body() {
        let records = parse_query_output("Row: 0 _id=3, address=+1, body=NULL\n");
        assert_eq!(records[0].body, None);
    }

    #[test]
    fn test_no_result() {
        assert!(parse_query_output("No result found.\n").is_empty());
        assert!(parse_query_output("").is_empty());
    }

    #[test]
    fn test_garbage_row_does_not_swallow_next() {
        let output = "Row: 0 garbage\ncontinuation\nRow: 1 _id=9, address=+1, body=ok\n";
        let records = parse_query_output(output);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].body.as_deref(), Some("ok"));
    }

    #[test]
    fn test_body_line_that_looks_like_a_row() {
        let output = "\
Row: 0 _id=7, address=ACME, body=Quoting the log:
Row: 5 _id=99, address=+1, body=fake
still the first body
Row: 1 _id=8, address=+2, body=next
";
        let records = parse_query_output(output);
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].body.as_deref(),
            Some("Quoting the log:\nRow: 5 _id=99, address=+1, body=fake\nstill the first body")
        );
        assert_eq!(records[1].id, 8);
    }

    #[test]
    fn test_into_incoming_message() {
        let record = SmsRecord { id: 1, address: Some("+1".into()), body: Some("hi".into()) };
        let message: IncomingMessage = record.into();
        assert_eq!(message.sender.as_deref(), Some("+1"));
        assert_eq!(message.body(), Some("hi"));
    }
}
