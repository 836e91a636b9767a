// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Retrace-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Retrace and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single fixation sample in screen pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fixation {
    pub x: i32,
    pub y: i32,
    /// Duration in milliseconds.
    pub duration: u32,
}

impl Fixation {
    pub const fn new(x: i32, y: i32, duration: u32) -> Self {
        Self { x, y, duration }
    }
}

/// The ordered fixations recorded during one visit to a screen.
///
/// An empty set is a tombstone: the visit is dropped on the next persist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FixationSet {
    fixations: Vec<Fixation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FixationSetError {
    #[error("fixation index {index} out of range (len={len})")]
    IndexOutOfRange { index: usize, len: usize },
}

impl FixationSet {
    pub fn new(fixations: Vec<Fixation>) -> Self {
        Self { fixations }
    }

    pub fn fixations(&self) -> &[Fixation] {
        &self.fixations
    }

    pub fn len(&self) -> usize {
        self.fixations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixations.is_empty()
    }

    pub fn is_tombstone(&self) -> bool {
        self.is_empty()
    }

    pub fn total_duration(&self) -> u64 {
        self.fixations.iter().map(|f| u64::from(f.duration)).sum()
    }

    pub fn push(&mut self, fixation: Fixation) {
        self.fixations.push(fixation);
    }

    pub fn insert(&mut self, index: usize, fixation: Fixation) -> Result<(), FixationSetError> {
        if index > self.fixations.len() {
            return Err(self.out_of_range(index));
        }
        self.fixations.insert(index, fixation);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<Fixation, FixationSetError> {
        if index >= self.fixations.len() {
            return Err(self.out_of_range(index));
        }
        Ok(self.fixations.remove(index))
    }

    /// Moves a fixation to a new position, keeping its duration and its place in the scanpath.
    pub fn move_to(&mut self, index: usize, x: i32, y: i32) -> Result<(), FixationSetError> {
        let err = self.out_of_range(index);
        let fixation = self.fixations.get_mut(index).ok_or(err)?;
        fixation.x = x;
        fixation.y = y;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.fixations.clear();
    }

    fn out_of_range(&self, index: usize) -> FixationSetError {
        FixationSetError::IndexOutOfRange {
            index,
            len: self.fixations.len(),
        }
    }
}

impl From<Vec<Fixation>> for FixationSet {
    fn from(fixations: Vec<Fixation>) -> Self {
        Self::new(fixations)
    }
}

impl FromIterator<Fixation> for FixationSet {
    fn from_iter<I: IntoIterator<Item = Fixation>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
