use std::path::Path;

use csv::WriterBuilder;

use crate::error::ExtractError;
use crate::model::MetricRecord;

fn write_rows<W: std::io::Write>(
    writer: &mut csv::Writer<W>,
    record: &MetricRecord,
) -> Result<(), ExtractError> {
    writer.write_record(["", record.metric_header1.as_str()])?;
    writer.write_record(["", record.metric_header2.as_str()])?;
    writer.write_record([
        record.date.format("%Y-%m-%d").to_string(),
        record.value.to_string(),
    ])?;
    writer.flush()?;
    Ok(())
}

/// Writes the record as two header rows and one `date,value` row:
///
/// ```text
/// ,<metric_header1>
/// ,<metric_header2>
/// 2025-10-03,-26000
/// ```
pub fn write_record(path: &Path, record: &MetricRecord) -> Result<(), ExtractError> {
    let mut writer = WriterBuilder::new().from_path(path)?;
    write_rows(&mut writer, record)
}

pub fn write_record_to_string(record: &MetricRecord) -> Result<String, ExtractError> {
    let mut writer = WriterBuilder::new().from_writer(Vec::<u8>::new());
    write_rows(&mut writer, record)?;

    let bytes = writer
        .into_inner()
        .map_err(|error| ExtractError::Csv(error.into_error().into()))?;
    String::from_utf8(bytes)
        .map_err(|error| ExtractError::InvalidOption(format!("invalid utf-8 csv output: {error}")))
}
