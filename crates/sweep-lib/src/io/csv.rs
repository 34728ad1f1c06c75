use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim, WriterBuilder};
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::record::ReadingRecord;

/// Column order of the exported dataset.
pub const COLUMNS: [&str; 5] = ["stage_id", "level_cm", "sample_no", "adc", "voltaje_v"];

/// Order records by `(stage_id, sample_no)`; ties keep file order.
pub fn sort_records(records: &mut [ReadingRecord]) {
    records.sort_by_key(ReadingRecord::key);
}

/// Serialize records with a header row to any writer.
pub fn write_records<W: Write>(out: W, records: &[ReadingRecord]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(out);
    for record in records {
        writer.serialize(record).context("writing record")?;
    }
    if records.is_empty() {
        writer.write_record(COLUMNS)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write records to `path`, creating parent directories as needed.
pub fn write_records_csv(path: &Path, records: &[ReadingRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let file = fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_records(file, records).with_context(|| format!("writing {}", path.display()))
}

/// Read back a dataset written by [`write_records_csv`].
pub fn read_records_csv(path: &Path) -> Result<Vec<ReadingRecord>> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let headers = reader.headers().context("reading header")?.clone();
    if !headers.iter().eq(COLUMNS) {
        anyhow::bail!(
            "unexpected columns in {}: {:?}",
            path.display(),
            headers.iter().collect::<Vec<_>>()
        );
    }
    let mut records = Vec::new();
    for (idx, row) in reader.deserialize::<ReadingRecord>().enumerate() {
        let record = row.with_context(|| format!("parsing row {}", idx + 1))?;
        records.push(record);
    }
    Ok(records)
}
