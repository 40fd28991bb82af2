/// State tag applied to every entity created by a transform run.
pub const STATE: &str = "IL";

/// Place filter for the raw-result input set.
pub const PLACE: &str = "Chicago";

/// County assigned to county-level offices.
pub const COUNTY: &str = "Cook";

/// Results are flushed to storage in chunks of this size.
pub const RESULT_BATCH_SIZE: usize = 1000;
