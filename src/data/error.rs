use chrono::NaiveDate;

/// Validation failures raised by the aggregation pipeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    /// The requested date range ends before it starts.
    #[error("end date {end} is before start date {start}")]
    EmptyRange { start: NaiveDate, end: NaiveDate },
}
