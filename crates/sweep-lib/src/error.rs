use thiserror::Error;

/// Failures that stop a sweep conversion before any output is written.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("no samples found; check the input file format and path")]
    NoSamples,

    #[error("detected {found} stages but the level sweep only defines {max}")]
    TooManyStages { found: usize, max: usize },

    #[error("{count} reading(s) appear before the first stage start (sample 1)")]
    OrphanedReadings { count: usize },

    #[error("no output path configured")]
    MissingOutput,
}
