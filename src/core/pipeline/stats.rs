//! Running token totals for one pipeline run. Scoped to the run, never a
//! shared counter.

use std::time::Instant;

use crate::core::events::{EventMetadata, InferenceStats};

pub struct StatsAggregator {
    total_input_tokens: u64,
    total_output_tokens: u64,
    steps_executed: usize,
    started_at: Instant,
}

impl StatsAggregator {
    pub fn start() -> Self {
        Self {
            total_input_tokens: 0,
            total_output_tokens: 0,
            steps_executed: 0,
            started_at: Instant::now(),
        }
    }

    /// Fold one worker step's measurement into the running totals.
    pub fn record(&mut self, stats: &InferenceStats) {
        self.total_input_tokens += stats.input_tokens;
        self.total_output_tokens += stats.output_tokens;
        self.steps_executed += 1;
    }

    /// Pipeline-level summary metadata for the final orchestrator message.
    pub fn summary(&self) -> EventMetadata {
        self.summary_with_duration(self.started_at.elapsed().as_millis() as u64)
    }

    fn summary_with_duration(&self, total_duration_ms: u64) -> EventMetadata {
        EventMetadata::PipelineSummary {
            pipeline_summary: true,
            total_input_tokens: self.total_input_tokens,
            total_output_tokens: self.total_output_tokens,
            total_duration_ms,
            agent_count: self.steps_executed,
        }
    }

    /// Average output tokens per second over the whole run, one decimal,
    /// 0 when the duration is 0.
    pub fn average_tokens_per_second(total_output_tokens: u64, total_duration_ms: u64) -> f64 {
        if total_duration_ms == 0 {
            return 0.0;
        }
        let per_second = total_output_tokens as f64 / (total_duration_ms as f64 / 1000.0);
        (per_second * 10.0).round() / 10.0
    }
}
