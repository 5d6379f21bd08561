use rand_core::{OsRng, RngCore};
use std::str::FromStr;

/// Source of candidate identifiers. Candidates may repeat; the store retries until unused.
pub trait IdGenerator: Send {
    fn next_id(&mut self) -> i64;
}

/// Uniform draw over `0..=i64::MAX`.
#[derive(Debug, Default)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn next_id(&mut self) -> i64 {
        (OsRng.next_u64() >> 1) as i64
    }
}

/// Monotonic counter starting at 1. Only ever advanced under the store lock.
#[derive(Debug)]
pub struct SequentialIds {
    next: i64,
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> i64 {
        let id = self.next;
        self.next = self.next.wrapping_add(1).max(0);
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdStrategy {
    Random,
    Sequential,
}

impl IdStrategy {
    pub fn generator(self) -> Box<dyn IdGenerator> {
        match self {
            IdStrategy::Random => Box::new(RandomIds),
            IdStrategy::Sequential => Box::new(SequentialIds::default()),
        }
    }
}

impl FromStr for IdStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(IdStrategy::Random),
            "sequential" => Ok(IdStrategy::Sequential),
            other => Err(format!("Unknown ID_STRATEGY '{}' (expected random|sequential)", other)),
        }
    }
}
