use std::io::Write;

use crate::error::SyncError;
use crate::model::ReportRow;

pub const HEADER: [&str; 6] = ["unit", "item", "dateAdded", "pub", "action", "funding"];

/// Append-only, tab-delimited result log. Every row is flushed as soon as
/// it is written.
///
/// Fields are written verbatim, never quoted. Tabs and line breaks inside a
/// field become spaces so each row stays one line of six columns.
pub struct ResultLog<W: Write> {
    writer: csv::Writer<W>,
    rows: usize,
}

impl<W: Write> ResultLog<W> {
    /// New log; writes the header row first.
    pub fn new(inner: W) -> Result<Self, SyncError> {
        let mut log = Self::continuing(inner);
        log.writer
            .write_record(HEADER)
            .map_err(|e| SyncError::Io(format!("result log header: {e}")))?;
        log.writer
            .flush()
            .map_err(|e| SyncError::Io(format!("result log flush: {e}")))?;
        Ok(log)
    }

    /// Continue an existing log (no header).
    pub fn continuing(inner: W) -> Self {
        let writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .quote_style(csv::QuoteStyle::Never)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(inner);
        Self { writer, rows: 0 }
    }

    pub fn write_row(&mut self, row: &ReportRow) -> Result<(), SyncError> {
        let fields = [
            &row.unit,
            &row.item,
            &row.date_added,
            &row.pub_id,
            &row.action,
            &row.funding,
        ];
        self.writer
            .write_record(fields.iter().map(|f| clean_field(f)))
            .map_err(|e| SyncError::Io(format!("result log write: {e}")))?;
        self.writer
            .flush()
            .map_err(|e| SyncError::Io(format!("result log flush: {e}")))?;
        self.rows += 1;
        Ok(())
    }

    /// Data rows written by this handle (header excluded).
    pub fn rows_written(&self) -> usize {
        self.rows
    }

    pub fn into_inner(self) -> Result<W, SyncError> {
        self.writer
            .into_inner()
            .map_err(|e| SyncError::Io(format!("result log close: {}", e.error())))
    }
}

fn clean_field(value: &str) -> String {
    value.replace(['\t', '\n', '\r'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(action: &str, funding: &str) -> ReportRow {
        ReportRow {
            unit: "lbnl_rw".into(),
            item: "qt12345678".into(),
            date_added: "2024-03-01".into(),
            pub_id: "4242".into(),
            action: action.into(),
            funding: funding.into(),
        }
    }

    #[test]
    fn header_then_rows() {
        let mut log = ResultLog::new(Vec::new()).unwrap();
        log.write_row(&row("added", "NSF")).unwrap();
        log.write_row(&row("changed", "NSF -> DOE||NSF")).unwrap();
        assert_eq!(log.rows_written(), 2);

        let out = String::from_utf8(log.into_inner().unwrap()).unwrap();
        assert_eq!(
            out,
            "unit\titem\tdateAdded\tpub\taction\tfunding\n\
             lbnl_rw\tqt12345678\t2024-03-01\t4242\tadded\tNSF\n\
             lbnl_rw\tqt12345678\t2024-03-01\t4242\tchanged\tNSF -> DOE||NSF\n"
        );
    }

    #[test]
    fn continuing_has_no_header() {
        let mut log = ResultLog::continuing(Vec::new());
        log.write_row(&row("removed", "NIH")).unwrap();
        let out = String::from_utf8(log.into_inner().unwrap()).unwrap();
        assert_eq!(out, "lbnl_rw\tqt12345678\t2024-03-01\t4242\tremoved\tNIH\n");
    }

    #[test]
    fn quotes_are_written_verbatim() {
        let mut log = ResultLog::continuing(Vec::new());
        log.write_row(&row("added", r#"The "Kavli" Foundation||NSF"#)).unwrap();
        let out = String::from_utf8(log.into_inner().unwrap()).unwrap();
        assert_eq!(
            out,
            "lbnl_rw\tqt12345678\t2024-03-01\t4242\tadded\tThe \"Kavli\" Foundation||NSF\n"
        );
    }

    #[test]
    fn tabs_and_newlines_cannot_split_a_row() {
        let mut log = ResultLog::continuing(Vec::new());
        log.write_row(&row("added", "Odd\tFunder\r\nName")).unwrap();
        let out = String::from_utf8(log.into_inner().unwrap()).unwrap();
        assert_eq!(out.lines().count(), 1);
        assert_eq!(out.trim_end().split('\t').count(), 6);
        assert!(out.ends_with("\tOdd Funder  Name\n"), "{out:?}");
    }

    #[test]
    fn rows_are_durable_before_close() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut log = ResultLog::new(file.reopen().unwrap()).unwrap();
        log.write_row(&row("added", "NSF")).unwrap();

        // Still open: contents must already be on disk.
        let text = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.ends_with("added\tNSF\n"));
    }
}
