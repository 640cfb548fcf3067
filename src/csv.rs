use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::Path;
use thiserror::Error;

use crate::engine::LedgerReport;
use crate::session::Command;
use crate::validate::ExpenseDraft;
use crate::{Amount, Trip};

/// Errors that can occur when reading or writing csv files
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("{path}: {source}")]
    Open { path: String, source: csv::Error },

    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: unrecognized event type '{event}'")]
    UnrecognizedType { line: usize, event: String },

    #[error("line {line}: {event} missing {field}")]
    MissingField {
        line: usize,
        event: &'static str,
        field: &'static str,
    },

    #[error("line {line}: amount {value} is out of range")]
    InvalidAmount { line: usize, value: f64 },

    #[error("failed to write report: {0}")]
    Write(#[from] csv::Error),

    #[error("failed to write report: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Deserialize)]
struct ParticipantRow {
    name: String,
    contribution: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct EventRow {
    r#type: String,
    id: Option<String>,
    title: Option<String>,
    amount: Option<f64>,
    paid_by: Option<String>,
    debtor: Option<String>,
    deduct_from_fund: Option<bool>,
    created_at: Option<DateTime<Utc>>,
}

fn amount(line: usize, value: f64) -> Result<Amount, CsvError> {
    Amount::try_from_float(value).ok_or(CsvError::InvalidAmount { line, value })
}

fn reader(path: &Path) -> Result<csv::Reader<std::fs::File>, CsvError> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| CsvError::Open {
            path: path.display().to_string(),
            source,
        })
}

/// Read a trip's participants, in file order, and their contributions.
///
/// The pooled total is the sum of the contributions.
pub fn read_trip(path: impl AsRef<Path>) -> Result<Trip, CsvError> {
    let mut contributions = Vec::new();
    for (idx, result) in reader(path.as_ref())?
        .into_deserialize::<ParticipantRow>()
        .enumerate()
    {
        let line = idx + 2; // 1-indexed, skip header
        let row = result.map_err(|source| CsvError::Parse { line, source })?;
        let contribution = match row.contribution {
            Some(value) => amount(line, value)?,
            None => Amount::ZERO,
        };
        contributions.push((row.name, contribution));
    }
    Ok(Trip::pooled(contributions))
}

/// Read trip events from a csv file
pub fn read_events(
    path: impl AsRef<Path>,
) -> Result<impl Iterator<Item = Result<Command, CsvError>>, CsvError> {
    let reader = reader(path.as_ref())?;

    Ok(reader
        .into_deserialize::<EventRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            let row = result.map_err(|source| CsvError::Parse { line, source })?;
            parse_event(line, row)
        }))
}

fn parse_event(line: usize, row: EventRow) -> Result<Command, CsvError> {
    let missing = |event, field| CsvError::MissingField { line, event, field };

    match row.r#type.as_str() {
        "expense" => Ok(Command::AddExpense(ExpenseDraft {
            id: row.id.ok_or_else(|| missing("expense", "id"))?,
            title: row.title.unwrap_or_default(),
            amount: amount(
                line,
                row.amount.ok_or_else(|| missing("expense", "amount"))?,
            )?,
            paid_by: row.paid_by,
            deduct_from_fund: row.deduct_from_fund.unwrap_or(false),
            created_at: row
                .created_at
                .ok_or_else(|| missing("expense", "created_at"))?,
        })),
        "delete" => Ok(Command::DeleteExpense(
            row.id.ok_or_else(|| missing("delete", "id"))?,
        )),
        "received" => Ok(Command::MarkReceived {
            payer: row.paid_by.ok_or_else(|| missing("received", "paid_by"))?,
            debtor: row.debtor.ok_or_else(|| missing("received", "debtor"))?,
        }),
        other => Err(CsvError::UnrecognizedType {
            line,
            event: other.to_string(),
        }),
    }
}

#[derive(Debug, Serialize)]
struct FundRow {
    total_pooled: String,
    total_expenses: String,
    deducted_from_fund: String,
    fund_remaining: String,
}

#[derive(Debug, Serialize)]
struct BalanceRow<'a> {
    name: &'a str,
    contribution: String,
    extra_paid: String,
    expense_share: String,
    balance: String,
}

#[derive(Debug, Serialize)]
struct TransferRow<'a> {
    from: &'a str,
    to: &'a str,
    amount: String,
    status: String,
}

/// Write a ledger report as four csv sections separated by a blank line:
/// fund totals, balances, reimbursements and settlements.
pub fn write_report(report: &LedgerReport, mut out: impl Write) -> Result<(), CsvError> {
    write_section(
        &mut out,
        &[
            "total_pooled",
            "total_expenses",
            "deducted_from_fund",
            "fund_remaining",
        ],
        [FundRow {
            total_pooled: report.total_pooled.to_string(),
            total_expenses: report.total_expenses.to_string(),
            deducted_from_fund: report.deducted_from_fund.to_string(),
            fund_remaining: report.fund_remaining.to_string(),
        }],
    )?;
    writeln!(out)?;

    write_section(
        &mut out,
        &["name", "contribution", "extra_paid", "expense_share", "balance"],
        report.participants.iter().map(|p| BalanceRow {
            name: &p.name,
            contribution: p.contribution.to_string(),
            extra_paid: p.extra_paid.to_string(),
            expense_share: p.expense_share.to_string(),
            balance: p.balance.to_string(),
        }),
    )?;
    writeln!(out)?;

    // payer first: the debtor owes them
    write_section(
        &mut out,
        &["payer", "debtor", "amount", "status"],
        report.reimbursements.iter().map(|r| TransferRow {
            from: &r.payer,
            to: &r.debtor,
            amount: r.amount.to_string(),
            status: r.status.to_string(),
        }),
    )?;
    writeln!(out)?;

    write_section(
        &mut out,
        &["from", "to", "amount", "status"],
        report.settlements.iter().map(|s| TransferRow {
            from: &s.from,
            to: &s.to,
            amount: s.amount.to_string(),
            status: s.status.to_string(),
        }),
    )?;

    out.flush()?;
    Ok(())
}

/// Header first so empty sections still carry one
fn write_section<W: Write, R: Serialize>(
    out: &mut W,
    header: &[&str],
    rows: impl IntoIterator<Item = R>,
) -> Result<(), CsvError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(out);
    writer.write_record(header)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::compute;
    use crate::model::{Acknowledgements, Expense, PaidBy, TripSnapshot};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    const EVENTS_HEADER: &str = "type,id,title,amount,paid_by,debtor,deduct_from_fund,created_at\n";

    fn read_all(content: &str) -> Vec<Result<Command, CsvError>> {
        let file = write_csv(&format!("{EVENTS_HEADER}{content}"));
        read_events(file.path()).unwrap().collect()
    }

    #[test]
    fn read_trip_keeps_file_order() {
        let file = write_csv("name,contribution\nZoe, 40\nAdam,60.5\nMia,\n");
        let trip = read_trip(file.path()).unwrap();

        assert_eq!(trip.participants, vec!["Zoe", "Adam", "Mia"]);
        assert_eq!(trip.contribution("Adam"), Amount::from_float(60.5));
        assert_eq!(trip.contribution("Mia"), Amount::ZERO);
        assert_eq!(trip.total_pooled, Amount::from_float(100.5));
    }

    #[test]
    fn read_trip_reports_missing_file() {
        let result = read_trip("/nonexistent/participants.csv");
        assert!(matches!(result, Err(CsvError::Open { .. })));
    }

    #[test]
    fn read_expense() {
        let results = read_all("expense,e1,Taxi,25.5,Bob,,false,2026-05-01T10:00:00Z\n");
        assert_eq!(results.len(), 1);

        match results.into_iter().next().unwrap().unwrap() {
            Command::AddExpense(draft) => {
                assert_eq!(draft.id, "e1");
                assert_eq!(draft.title, "Taxi");
                assert_eq!(draft.amount, Amount::from_float(25.5));
                assert_eq!(draft.paid_by.as_deref(), Some("Bob"));
                assert!(!draft.deduct_from_fund);
                assert_eq!(draft.created_at.to_rfc3339(), "2026-05-01T10:00:00+00:00");
            }
            other => panic!("expected expense, got {other:?}"),
        }
    }

    #[test]
    fn read_fund_expense_without_payer() {
        let results = read_all("expense,e2,Hotel,300,,,true,2026-05-01T11:00:00Z\n");
        match results.into_iter().next().unwrap().unwrap() {
            Command::AddExpense(draft) => {
                assert_eq!(draft.paid_by, None);
                assert!(draft.deduct_from_fund);
            }
            other => panic!("expected expense, got {other:?}"),
        }
    }

    #[test]
    fn read_delete_and_received() {
        let results = read_all("delete,e1,,,,,,\nreceived,,,,Bob,Alice,,\n");
        let commands: Vec<_> = results.into_iter().map(Result::unwrap).collect();
        assert_eq!(
            commands,
            vec![
                Command::DeleteExpense("e1".to_string()),
                Command::MarkReceived {
                    payer: "Bob".to_string(),
                    debtor: "Alice".to_string(),
                },
            ]
        );
    }

    #[test]
    fn read_returns_error_for_unknown_type() {
        let results = read_all("refund,e1,,,,,,\n");
        let err = results[0].as_ref().unwrap_err();
        assert!(matches!(err, CsvError::UnrecognizedType { line: 2, .. }));
    }

    #[test]
    fn read_returns_error_for_missing_fields() {
        let results = read_all(
            "expense,e1,Taxi,,Bob,,false,2026-05-01T10:00:00Z\nreceived,,,,Bob,,,\n",
        );
        assert!(matches!(
            results[0].as_ref().unwrap_err(),
            CsvError::MissingField { line: 2, field: "amount", .. }
        ));
        assert!(matches!(
            results[1].as_ref().unwrap_err(),
            CsvError::MissingField { line: 3, field: "debtor", .. }
        ));
    }

    #[test]
    fn read_returns_error_for_out_of_range_amount() {
        let results = read_all(
            "expense,e1,Taxi,inf,Bob,,false,2026-05-01T10:00:00Z\nexpense,e2,Taxi,1e300,Bob,,false,2026-05-01T10:00:00Z\n",
        );
        assert!(matches!(
            results[0].as_ref().unwrap_err(),
            CsvError::InvalidAmount { line: 2, .. }
        ));
        assert!(matches!(
            results[1].as_ref().unwrap_err(),
            CsvError::InvalidAmount { line: 3, .. }
        ));
    }

    #[test]
    fn read_trip_rejects_out_of_range_contribution() {
        let file = write_csv("name,contribution\nZoe,40\nAdam,NaN\n");
        let result = read_trip(file.path());
        assert!(matches!(result, Err(CsvError::InvalidAmount { line: 3, .. })));
    }

    #[test]
    fn read_returns_error_for_bad_timestamp() {
        let results = read_all("expense,e1,Taxi,10,Bob,,false,yesterday\n");
        assert!(matches!(
            results[0].as_ref().unwrap_err(),
            CsvError::Parse { line: 2, .. }
        ));
    }

    #[test]
    fn write_report_sections() {
        let trip = Trip::pooled([
            ("A".to_string(), Amount::ZERO),
            ("B".to_string(), Amount::ZERO),
        ]);
        let expenses = [Expense {
            id: "1".to_string(),
            title: "Fuel".to_string(),
            amount: Amount::from_float(30.0),
            paid_by: PaidBy::from("A"),
            deduct_from_fund: false,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        }];
        let report = compute(TripSnapshot::new(&trip, &expenses), &Acknowledgements::new()).unwrap();

        let mut out = Vec::new();
        write_report(&report, &mut out).unwrap();

        let expected = "\
total_pooled,total_expenses,deducted_from_fund,fund_remaining
0.00,30.00,0.00,0.00

name,contribution,extra_paid,expense_share,balance
A,0.00,30.00,15.00,15.00
B,0.00,0.00,15.00,-15.00

payer,debtor,amount,status
A,B,15.00,pending

from,to,amount,status
B,A,15.00,pending
";
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn write_report_keeps_headers_of_empty_sections() {
        let trip = Trip::pooled([
            ("A".to_string(), Amount::from_float(10.0)),
            ("B".to_string(), Amount::from_float(10.0)),
        ]);
        let report = compute(TripSnapshot::new(&trip, &[]), &Acknowledgements::new()).unwrap();

        let mut out = Vec::new();
        write_report(&report, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.ends_with("payer,debtor,amount,status\n\nfrom,to,amount,status\n"));
    }
}
