use serde::{Deserialize, Serialize};

/// One reading pulled out of a log line, before any stage is known.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// 1-based position within its stage
    pub sample_no: u32,
    /// Stage length declared by the rig; informational only
    pub total_in_stage: u32,
    pub adc: u32,
    /// Volts, decimal comma already normalized
    pub voltage: f64,
}

/// A reading assigned to a 0-based stage by the segmenter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StagedReading {
    pub stage_id: usize,
    pub reading: Reading,
}

/// Output row. Field order is the CSV column order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReadingRecord {
    pub stage_id: usize,
    pub level_cm: u32,
    pub sample_no: u32,
    pub adc: u32,
    #[serde(rename = "voltaje_v")]
    pub voltage: f64,
    #[serde(skip)]
    pub total_in_stage: u32,
}

impl ReadingRecord {
    pub fn new(staged: &StagedReading, level_cm: u32) -> Self {
        Self {
            stage_id: staged.stage_id,
            level_cm,
            sample_no: staged.reading.sample_no,
            adc: staged.reading.adc,
            voltage: staged.reading.voltage,
            total_in_stage: staged.reading.total_in_stage,
        }
    }

    /// Sort key used by the writer.
    pub fn key(&self) -> (usize, u32) {
        (self.stage_id, self.sample_no)
    }
}

/// Distinct sample count observed for one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCount {
    pub stage_id: usize,
    pub distinct_samples: usize,
}
