use std::collections::HashMap;

use crate::DecodeFailureSummary;
use crate::protocols::zwift::ZwiftError;

#[derive(Debug)]
struct FailureStats {
    message: String,
    count: u64,
    examples: Vec<String>,
}

/// Decode failures grouped by error id.
#[derive(Debug)]
pub(crate) struct FailureTally {
    max_examples: usize,
    by_id: HashMap<&'static str, FailureStats>,
}

impl FailureTally {
    pub(crate) fn new(max_examples: usize) -> Self {
        Self {
            max_examples,
            by_id: HashMap::new(),
        }
    }

    pub(crate) fn record(&mut self, err: &ZwiftError, context: String) {
        let entry = self.by_id.entry(err.id()).or_insert_with(|| FailureStats {
            message: err.to_string(),
            count: 0,
            examples: Vec::new(),
        });
        entry.count += 1;
        if entry.examples.len() < self.max_examples {
            entry.examples.push(context);
        }
    }

    pub(crate) fn into_summaries(self) -> Vec<DecodeFailureSummary> {
        let mut summaries: Vec<DecodeFailureSummary> = self
            .by_id
            .into_iter()
            .map(|(id, stats)| DecodeFailureSummary {
                id: id.to_string(),
                message: stats.message,
                count: stats.count,
                examples: stats.examples,
            })
            .collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }
}
