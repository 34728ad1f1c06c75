//! Stage segmentation, level labelling and per-stage integrity checks.

use log::warn;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::SweepError;
use crate::record::{Reading, ReadingRecord, StageCount, StagedReading};

/// Level in cm for each stage of a full sweep: up 0..=8, then back down 7..=0.
///
/// 17 entries; 8 appears once.
pub const LEVEL_SWEEP_CM: [u32; 17] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 7, 6, 5, 4, 3, 2, 1, 0];

/// Samples a complete stage is expected to hold.
pub const DEFAULT_SAMPLES_PER_STAGE: usize = 30;

/// Readings split into stages, plus those seen before any stage started.
#[derive(Debug, Clone, Default)]
pub struct Segmentation {
    pub staged: Vec<StagedReading>,
    /// Readings preceding the first `sample_no == 1`
    pub orphans: Vec<Reading>,
}

impl Segmentation {
    /// Number of stages observed (max stage id + 1).
    pub fn num_stages(&self) -> usize {
        self.staged.last().map(|s| s.stage_id + 1).unwrap_or(0)
    }
}

/// Assign stage ids in file order. A stage starts at every `sample_no == 1`.
pub fn segment_stages<I>(readings: I) -> Segmentation
where
    I: IntoIterator<Item = Reading>,
{
    let (segmentation, _) = readings.into_iter().fold(
        (Segmentation::default(), None::<usize>),
        |(mut seg, current), reading| {
            let current = if reading.sample_no == 1 {
                Some(current.map_or(0, |id| id + 1))
            } else {
                current
            };
            match current {
                Some(stage_id) => seg.staged.push(StagedReading { stage_id, reading }),
                None => seg.orphans.push(reading),
            }
            (seg, current)
        },
    );
    segmentation
}

/// Levels chosen for the observed stage count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelPlan {
    /// `levels[stage_id]` is the stage's level in cm
    pub levels: Vec<u32>,
    /// Fewer stages than a full sweep were observed
    pub truncated: bool,
}

impl LevelPlan {
    pub fn level_for(&self, stage_id: usize) -> Option<u32> {
        self.levels.get(stage_id).copied()
    }
}

/// Map `num_stages` stages onto the sweep, using a prefix when short.
pub fn plan_levels(num_stages: usize) -> Result<LevelPlan, SweepError> {
    let expected = LEVEL_SWEEP_CM.len();
    if num_stages == 0 {
        return Err(SweepError::NoSamples);
    }
    if num_stages > expected {
        return Err(SweepError::TooManyStages {
            found: num_stages,
            max: expected,
        });
    }
    let truncated = num_stages != expected;
    if truncated {
        warn!(
            "detected {} stages, expected {} (0..8..0); labelling the first {} only",
            num_stages, expected, num_stages
        );
    }
    Ok(LevelPlan {
        levels: LEVEL_SWEEP_CM[..num_stages].to_vec(),
        truncated,
    })
}

/// Attach levels to staged readings.
pub fn label_stages(
    staged: &[StagedReading],
    plan: &LevelPlan,
) -> Result<Vec<ReadingRecord>, SweepError> {
    staged
        .iter()
        .map(|s| {
            plan.level_for(s.stage_id)
                .map(|level| ReadingRecord::new(s, level))
                .ok_or(SweepError::TooManyStages {
                    found: s.stage_id + 1,
                    max: plan.levels.len(),
                })
        })
        .collect()
}

/// Distinct sample numbers per stage, ordered by stage id.
pub fn stage_sample_counts(records: &[ReadingRecord]) -> Vec<StageCount> {
    let mut per_stage: BTreeMap<usize, BTreeSet<u32>> = BTreeMap::new();
    for record in records {
        per_stage
            .entry(record.stage_id)
            .or_default()
            .insert(record.sample_no);
    }
    per_stage
        .into_iter()
        .map(|(stage_id, samples)| StageCount {
            stage_id,
            distinct_samples: samples.len(),
        })
        .collect()
}

/// Stages whose distinct sample count is not `expected`. Logged, never fatal.
pub fn check_stage_counts(records: &[ReadingRecord], expected: usize) -> Vec<StageCount> {
    let bad: Vec<StageCount> = stage_sample_counts(records)
        .into_iter()
        .filter(|c| c.distinct_samples != expected)
        .collect();
    if !bad.is_empty() {
        warn!("some stages do not have {} unique samples:", expected);
        for count in &bad {
            warn!("  stage {}: {}", count.stage_id, count.distinct_samples);
        }
    }
    bad
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(sample_no: u32) -> Reading {
        Reading {
            sample_no,
            total_in_stage: 30,
            adc: sample_no * 10,
            voltage: sample_no as f64 / 100.0,
        }
    }

    fn stages_of(samples: &[u32]) -> Vec<usize> {
        segment_stages(samples.iter().map(|&n| reading(n)))
            .staged
            .iter()
            .map(|s| s.stage_id)
            .collect()
    }

    #[test]
    fn stage_advances_on_sample_one() {
        assert_eq!(stages_of(&[1, 2, 28, 1]), vec![0, 0, 0, 1]);
        assert_eq!(stages_of(&[1, 1, 1]), vec![0, 1, 2]);
    }

    #[test]
    fn stage_ids_step_by_one_exactly_at_resets() {
        let samples = [1, 2, 3, 1, 5, 1, 2, 1];
        let seg = segment_stages(samples.iter().map(|&n| reading(n)));
        for pair in seg.staged.windows(2) {
            let step = pair[1].stage_id - pair[0].stage_id;
            assert_eq!(step, usize::from(pair[1].reading.sample_no == 1));
        }
        assert_eq!(seg.num_stages(), 4);
    }

    #[test]
    fn readings_before_first_reset_are_orphans() {
        let seg = segment_stages([3, 4, 1, 2].map(reading));
        assert_eq!(seg.orphans.len(), 2);
        assert_eq!(seg.staged.len(), 2);
        assert_eq!(seg.staged[0].stage_id, 0);
    }

    #[test]
    fn empty_input_has_no_stages() {
        let seg = segment_stages(Vec::<Reading>::new());
        assert_eq!(seg.num_stages(), 0);
        assert!(matches!(plan_levels(0), Err(SweepError::NoSamples)));
    }

    #[test]
    fn full_sweep_uses_every_level() {
        let plan = plan_levels(17).unwrap();
        assert!(!plan.truncated);
        assert_eq!(plan.levels, vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 7, 6, 5, 4, 3, 2, 1, 0]);
    }

    #[test]
    fn short_sweep_takes_prefix() {
        let plan = plan_levels(10).unwrap();
        assert!(plan.truncated);
        assert_eq!(plan.levels, vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 7]);
        assert_eq!(plan.level_for(10), None);
    }

    #[test]
    fn long_sweep_is_an_error() {
        match plan_levels(18) {
            Err(SweepError::TooManyStages { found, max }) => assert_eq!((found, max), (18, 17)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn labels_follow_stage_id() {
        let seg = segment_stages([1, 2, 1, 2, 1].map(reading));
        let plan = plan_levels(seg.num_stages()).unwrap();
        let records = label_stages(&seg.staged, &plan).unwrap();
        let levels: Vec<u32> = records.iter().map(|r| r.level_cm).collect();
        assert_eq!(levels, vec![0, 0, 1, 1, 2]);
    }

    #[test]
    fn flags_stage_missing_a_sample() {
        let mut samples: Vec<u32> = (1..=30).collect();
        samples.extend((1..=30).filter(|&n| n != 17));
        let seg = segment_stages(samples.into_iter().map(reading));
        let plan = plan_levels(seg.num_stages()).unwrap();
        let records = label_stages(&seg.staged, &plan).unwrap();

        let bad = check_stage_counts(&records, DEFAULT_SAMPLES_PER_STAGE);
        assert_eq!(
            bad,
            vec![StageCount {
                stage_id: 1,
                distinct_samples: 29
            }]
        );
        assert_eq!(records.iter().filter(|r| r.stage_id == 1).count(), 29);
    }

    #[test]
    fn duplicate_samples_count_once() {
        let seg = segment_stages([1, 2, 2, 3].map(reading));
        let plan = plan_levels(1).unwrap();
        let records = label_stages(&seg.staged, &plan).unwrap();
        let counts = stage_sample_counts(&records);
        assert_eq!(counts[0].distinct_samples, 3);
    }
}
