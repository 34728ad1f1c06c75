use anyhow::Result;
use log::warn;
use serde::{Deserialize, Serialize};
use std::io::{self, Read};
use std::path::PathBuf;

use crate::config::SweepConfig;
use crate::error::SweepError;
use crate::io::{csv as csv_io, text as text_io};
use crate::record::{ReadingRecord, StageCount};
use crate::stage::{check_stage_counts, label_stages, plan_levels, segment_stages};

/// What a conversion produced, as reported to the operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepSummary {
    pub rows: usize,
    pub stages: usize,
    pub unmatched_lines: usize,
    pub orphaned: usize,
    pub levels_truncated: bool,
    pub stage_anomalies: Vec<StageCount>,
    #[serde(default)]
    pub output: Option<PathBuf>,
}

/// Sorted, labelled records ready to write, plus their summary.
#[derive(Debug, Clone)]
pub struct SweepOutcome {
    pub records: Vec<ReadingRecord>,
    pub summary: SweepSummary,
}

/// Extract, segment, label, check and sort the readings in `text`.
pub fn process_log(text: &str, config: &SweepConfig) -> Result<SweepOutcome, SweepError> {
    let scan = text_io::scan_log(text);
    if scan.readings.is_empty() {
        return Err(SweepError::NoSamples);
    }
    if scan.unmatched_lines > 0 {
        warn!(
            "{} non-blank line(s) did not contain a reading and were skipped",
            scan.unmatched_lines
        );
    }

    let segmentation = segment_stages(scan.readings);
    let orphaned = segmentation.orphans.len();
    if orphaned > 0 {
        if config.strict {
            return Err(SweepError::OrphanedReadings { count: orphaned });
        }
        warn!(
            "dropping {} reading(s) seen before the first stage start",
            orphaned
        );
    }

    let stages = segmentation.num_stages();
    let plan = plan_levels(stages)?;
    let mut records = label_stages(&segmentation.staged, &plan)?;
    let stage_anomalies = check_stage_counts(&records, config.expected_samples);
    csv_io::sort_records(&mut records);

    let summary = SweepSummary {
        rows: records.len(),
        stages,
        unmatched_lines: scan.unmatched_lines,
        orphaned,
        levels_truncated: plan.truncated,
        stage_anomalies,
        output: None,
    };
    Ok(SweepOutcome { records, summary })
}

/// Read the configured log (or stdin) and process it without writing.
pub fn check(config: &SweepConfig) -> Result<SweepOutcome> {
    let text = match &config.input {
        Some(path) => text_io::read_log(path)?,
        None => {
            let mut bytes = Vec::new();
            io::stdin().read_to_end(&mut bytes)?;
            text_io::decode_lossy(&bytes)
        }
    };
    Ok(process_log(&text, config)?)
}

/// Full conversion: read, process, write the CSV and report.
pub fn run(config: &SweepConfig) -> Result<SweepSummary> {
    let output = config.output.clone().ok_or(SweepError::MissingOutput)?;
    let SweepOutcome {
        records,
        mut summary,
    } = check(config)?;
    csv_io::write_records_csv(&output, &records)?;
    summary.output = Some(output);
    Ok(summary)
}
