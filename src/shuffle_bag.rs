use crate::error::{PickerError, Result};
use crate::metrics::BagMetrics;
use crate::storage::{load_json, write_json_atomic};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Persistent sampling-without-replacement over candidate row ids.
///
/// Against a fixed candidate set every id is returned once before any id
/// repeats. When the candidate set changes between draws, ids that left the
/// set are dropped from the bag and ids that joined it only appear after the
/// next reshuffle.
pub struct ShuffleBag {
    path: PathBuf,
    bag: Mutex<VecDeque<usize>>,
}

impl ShuffleBag {
    /// Load the bag at `path`; a missing or corrupt file yields an empty bag.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let bag: VecDeque<usize> = load_json(&path).unwrap_or_default();
        debug!("Loaded shuffle bag with {} ids from {}", bag.len(), path.display());
        Self {
            path,
            bag: Mutex::new(bag),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<usize>> {
        self.bag.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ids left before the next reshuffle, front first
    pub fn remaining(&self) -> Vec<usize> {
        self.lock().iter().copied().collect()
    }

    pub fn draw(&self, candidates: &[usize]) -> Result<usize> {
        self.draw_with_rng(candidates, &mut rand::thread_rng())
    }

    /// Draw one id from `candidates`, refilling the bag with a fresh
    /// permutation when it holds no current candidate.
    pub fn draw_with_rng<R: Rng + ?Sized>(&self, candidates: &[usize], rng: &mut R) -> Result<usize> {
        if candidates.is_empty() {
            return Err(PickerError::EmptyCandidates);
        }
        let current: HashSet<usize> = candidates.iter().copied().collect();

        let mut bag = self.lock();
        let before = bag.len();
        bag.retain(|id| current.contains(id));
        if bag.len() != before {
            debug!("Dropped {} stale ids from shuffle bag", before - bag.len());
        }

        if bag.is_empty() {
            let mut seen = HashSet::with_capacity(candidates.len());
            let mut fresh: Vec<usize> = candidates
                .iter()
                .copied()
                .filter(|id| seen.insert(*id))
                .collect();
            fresh.shuffle(rng);
            info!("Reshuffled bag with {} candidates", fresh.len());
            BagMetrics::record_reshuffle(fresh.len());
            *bag = fresh.into();
        }

        let Some(id) = bag.pop_front() else {
            return Err(PickerError::EmptyCandidates);
        };
        BagMetrics::record_draw();

        if let Err(e) = write_json_atomic(&self.path, &*bag) {
            warn!("Failed to persist shuffle bag to {}: {}", self.path.display(), e);
            BagMetrics::record_persist_error();
        }
        Ok(id)
    }
}
