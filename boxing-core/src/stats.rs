/// Filled by every successful decode. Zero values mean no correction was
/// needed anywhere in the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DecodeStats {
    pub fec_accumulated_amount: u64,
    pub fec_accumulated_weight: u64,
    pub resolved_errors: u64,
    pub unresolved_errors: u64,
}

impl DecodeStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_resolved(&mut self, count: u64) {
        self.resolved_errors += count;
    }

    pub fn record_unresolved(&mut self, count: u64) {
        self.unresolved_errors += count;
    }
}
