// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Retrace-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Retrace and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Horizontal line boundaries (pixel y-coordinates) delimiting the text lines of a screen.
///
/// `N` text lines are delimited by `N + 1` boundaries. Boundaries are strictly increasing; every
/// constructor and edit keeps that property or fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<i32>", into = "Vec<i32>")]
pub struct LineBoundarySet {
    boundaries: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineBoundaryError {
    #[error("line boundaries must be strictly increasing: {previous} then {next} at index {index}")]
    NotIncreasing {
        index: usize,
        previous: i32,
        next: i32,
    },
    #[error("line boundary index {index} out of range (len={len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("line boundary shift by {offset} overflows")]
    Overflow { offset: i32 },
}

impl LineBoundarySet {
    pub fn new(boundaries: Vec<i32>) -> Result<Self, LineBoundaryError> {
        validate_increasing(&boundaries)?;
        Ok(Self { boundaries })
    }

    pub fn boundaries(&self) -> &[i32] {
        &self.boundaries
    }

    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }

    /// Number of text lines delimited by the boundaries.
    pub fn line_count(&self) -> usize {
        self.boundaries.len().saturating_sub(1)
    }

    /// Returns the 0-based text line containing `y`, if any.
    pub fn line_at(&self, y: i32) -> Option<usize> {
        self.boundaries
            .windows(2)
            .position(|pair| pair[0] <= y && y < pair[1])
    }

    /// Places a single boundary at `y`.
    pub fn move_boundary(&mut self, index: usize, y: i32) -> Result<(), LineBoundaryError> {
        if index >= self.boundaries.len() {
            return Err(LineBoundaryError::IndexOutOfRange {
                index,
                len: self.boundaries.len(),
            });
        }

        let mut next = self.boundaries.clone();
        next[index] = y;
        validate_increasing(&next)?;
        self.boundaries = next;
        Ok(())
    }

    /// Shifts every boundary from `start` onwards by `offset`.
    ///
    /// The editor uses `start = 1` to nudge all lines while keeping the top boundary anchored.
    pub fn shift_from(&mut self, start: usize, offset: i32) -> Result<(), LineBoundaryError> {
        if start >= self.boundaries.len() {
            return Err(LineBoundaryError::IndexOutOfRange {
                index: start,
                len: self.boundaries.len(),
            });
        }

        let mut next = self.boundaries.clone();
        for boundary in &mut next[start..] {
            *boundary = boundary
                .checked_add(offset)
                .ok_or(LineBoundaryError::Overflow { offset })?;
        }
        validate_increasing(&next)?;
        self.boundaries = next;
        Ok(())
    }
}

impl TryFrom<Vec<i32>> for LineBoundarySet {
    type Error = LineBoundaryError;

    fn try_from(boundaries: Vec<i32>) -> Result<Self, Self::Error> {
        Self::new(boundaries)
    }
}

impl From<LineBoundarySet> for Vec<i32> {
    fn from(set: LineBoundarySet) -> Self {
        set.boundaries
    }
}

fn validate_increasing(boundaries: &[i32]) -> Result<(), LineBoundaryError> {
    for (index, pair) in boundaries.windows(2).enumerate() {
        if pair[1] <= pair[0] {
            return Err(LineBoundaryError::NotIncreasing {
                index: index + 1,
                previous: pair[0],
                next: pair[1],
            });
        }
    }
    Ok(())
}
