//! A model whose parameter is an index into a table of unary cost vectors.
//!
//! A node covers a contiguous index range and charges each pixel the cheapest
//! cost any candidate in its range would charge. That is a valid lower bound
//! for any cost table, which makes it a good adversary for the search: the
//! candidates need not share any structure.

use std::sync::Arc;

use branchcut_search::BranchModel;

/// One candidate: per-pixel background and foreground costs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnaryPair {
    pub background: Vec<i64>,
    pub foreground: Vec<i64>,
}

/// Candidates `lo..=hi` of a shared table.
#[derive(Debug, Clone)]
pub struct TableModel {
    candidates: Arc<[UnaryPair]>,
    pub lo: usize,
    pub hi: usize,
}

impl TableModel {
    /// Root over the whole table.
    ///
    /// # Panics
    ///
    /// Panics on an empty table.
    #[must_use]
    pub fn new(candidates: Vec<UnaryPair>) -> Self {
        assert!(!candidates.is_empty(), "table needs a candidate");
        let hi = candidates.len() - 1;
        Self {
            candidates: candidates.into(),
            lo: 0,
            hi,
        }
    }

    /// `count` candidates over `pixels` pixels with costs in `0..max_cost`,
    /// from a fixed linear congruential sequence.
    #[must_use]
    pub fn random(seed: u64, pixels: usize, count: usize, max_cost: u64) -> Self {
        let mut state = seed;
        let mut next = || {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            i64::try_from((state >> 33) % max_cost).expect("cost fits i64")
        };
        let candidates = (0..count)
            .map(|_| UnaryPair {
                background: (0..pixels).map(|_| next()).collect(),
                foreground: (0..pixels).map(|_| next()).collect(),
            })
            .collect();
        Self::new(candidates)
    }

    /// The candidate a leaf stands for.
    #[must_use]
    pub fn candidate(&self) -> Option<&UnaryPair> {
        (self.lo == self.hi).then(|| &self.candidates[self.lo])
    }
}

impl BranchModel for TableModel {
    fn is_leaf(&self) -> bool {
        self.lo == self.hi
    }

    fn branch_further(&self) -> (Self, Self) {
        let mid = (self.lo + self.hi) / 2;
        (
            Self {
                candidates: Arc::clone(&self.candidates),
                lo: self.lo,
                hi: mid,
            },
            Self {
                candidates: Arc::clone(&self.candidates),
                lo: mid + 1,
                hi: self.hi,
            },
        )
    }

    fn unary_costs(&self, background: &mut [i64], foreground: &mut [i64]) {
        let range = &self.candidates[self.lo..=self.hi];
        for (i, (bg, fg)) in background.iter_mut().zip(foreground.iter_mut()).enumerate() {
            *bg = range.iter().map(|c| c.background[i]).min().unwrap_or(0);
            *fg = range.iter().map(|c| c.foreground[i]).min().unwrap_or(0);
        }
    }

    fn describe(&self) -> serde_json::Value {
        serde_json::json!({"hi": self.hi, "lo": self.lo})
    }
}
