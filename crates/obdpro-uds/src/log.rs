//! Bounded UDS message log

use std::collections::VecDeque;

use obdpro_core::ExchangeRecord;

/// Default number of records kept
pub const DEFAULT_LOG_CAPACITY: usize = 50;

/// Number of trailing records handed to log analysis
pub const ANALYSIS_WINDOW: usize = 20;

/// Append-only history of exchange records, oldest evicted first
#[derive(Debug, Clone)]
pub struct MessageLog {
    records: VecDeque<ExchangeRecord>,
    capacity: usize,
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A capacity of zero is treated as one
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn append(&mut self, record: ExchangeRecord) {
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Append a request and its response back to back
    pub fn append_exchange(&mut self, request: ExchangeRecord, response: ExchangeRecord) {
        self.append(request);
        self.append(response);
    }

    /// The last `n` records, oldest first
    pub fn recent(&self, n: usize) -> Vec<ExchangeRecord> {
        let skip = self.records.len().saturating_sub(n);
        self.records.iter().skip(skip).cloned().collect()
    }

    /// Every record, oldest first
    pub fn snapshot(&self) -> Vec<ExchangeRecord> {
        self.records.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Render the last `n` records one per line
    pub fn format_recent(&self, n: usize) -> String {
        self.recent(n)
            .iter()
            .map(ExchangeRecord::log_line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
