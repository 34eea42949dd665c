//! Search bounds and their partition into chunks.

use super::MiningError;

/// An inclusive sub-range of the keyspace handed to one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchRange {
    pub start: u64,
    pub end: u64,
}

impl SearchRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Number of candidates in the range.
    pub fn size(&self) -> u128 {
        u128::from(self.end) - u128::from(self.start) + 1
    }

    pub fn contains(&self, candidate: u64) -> bool {
        (self.start..=self.end).contains(&candidate)
    }
}

/// Bounds and parallelism of one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    /// First candidate.
    pub start: u64,
    /// Last candidate, inclusive.
    pub limit: u64,
    /// Candidates per chunk.
    pub interval: u64,
    /// Workers dispatched per batch.
    pub max_workers: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            start: 0,
            limit: u64::MAX,
            interval: 1_000_000,
            max_workers: num_cpus::get(),
        }
    }
}

impl SearchConfig {
    pub fn new(start: u64, limit: u64, interval: u64, max_workers: usize) -> Self {
        Self {
            start,
            limit,
            interval,
            max_workers,
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), MiningError> {
        if self.interval == 0 {
            return Err(MiningError::InvalidConfig("interval must be at least 1".into()));
        }
        if self.max_workers == 0 {
            return Err(MiningError::InvalidConfig(
                "max_workers must be at least 1".into(),
            ));
        }
        if self.start > self.limit {
            return Err(MiningError::InvalidConfig(format!(
                "start {} is past limit {}",
                self.start, self.limit
            )));
        }
        Ok(())
    }

    /// Number of candidates in `[start, limit]`.
    pub fn domain_size(&self) -> u128 {
        if self.start > self.limit {
            0
        } else {
            u128::from(self.limit) - u128::from(self.start) + 1
        }
    }

    /// Chunks in ascending order.
    pub fn chunks(&self) -> Chunks {
        Chunks {
            next: (self.start <= self.limit).then_some(self.start),
            limit: self.limit,
            interval: self.interval.max(1),
        }
    }
}

/// Ascending, non-overlapping chunks covering `[start, limit]`.
#[derive(Debug, Clone)]
pub struct Chunks {
    next: Option<u64>,
    limit: u64,
    interval: u64,
}

impl Iterator for Chunks {
    type Item = SearchRange;

    fn next(&mut self) -> Option<SearchRange> {
        let start = self.next?;
        let end = start.saturating_add(self.interval - 1).min(self.limit);
        self.next = if end == self.limit { None } else { Some(end + 1) };
        Some(SearchRange { start, end })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunks_cover_domain() {
        let config = SearchConfig::new(5, 27, 10, 2);
        let chunks: Vec<_> = config.chunks().collect();
        assert_eq!(
            chunks,
            vec![
                SearchRange::new(5, 14),
                SearchRange::new(15, 24),
                SearchRange::new(25, 27),
            ]
        );
        let total: u128 = chunks.iter().map(SearchRange::size).sum();
        assert_eq!(total, config.domain_size());
    }

    #[test]
    fn test_single_candidate_domain() {
        let config = SearchConfig::new(7, 7, 100, 1);
        assert_eq!(config.chunks().collect::<Vec<_>>(), vec![SearchRange::new(7, 7)]);
    }

    #[test]
    fn test_chunks_at_u64_max() {
        let config = SearchConfig::new(u64::MAX - 4, u64::MAX, 3, 1);
        let chunks: Vec<_> = config.chunks().collect();
        assert_eq!(
            chunks,
            vec![
                SearchRange::new(u64::MAX - 4, u64::MAX - 2),
                SearchRange::new(u64::MAX - 1, u64::MAX),
            ]
        );
    }

    #[test]
    fn test_full_domain_is_lazy() {
        let config = SearchConfig::new(0, u64::MAX, u64::MAX, 1);
        let mut chunks = config.chunks();
        assert_eq!(chunks.next(), Some(SearchRange::new(0, u64::MAX - 1)));
        assert_eq!(chunks.next(), Some(SearchRange::new(u64::MAX, u64::MAX)));
        assert_eq!(chunks.next(), None);
        assert_eq!(config.domain_size(), 1u128 << 64);
    }

    #[test]
    fn test_validate() {
        assert!(SearchConfig::new(0, 10, 1, 1).validate().is_ok());
        assert!(SearchConfig::new(0, 10, 0, 1).validate().is_err());
        assert!(SearchConfig::new(0, 10, 1, 0).validate().is_err());
        assert!(SearchConfig::new(11, 10, 1, 1).validate().is_err());
        assert_eq!(SearchConfig::new(11, 10, 1, 1).chunks().count(), 0);
    }
}
