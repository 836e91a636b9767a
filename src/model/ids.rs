// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Retrace-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Retrace and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifies one screen (page) of a stimulus.
///
/// Screen ids are 1-based because they index the stimulus screens as presented to the
/// participant; `0` is rejected at construction and on deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct ScreenId(NonZeroU32);

impl ScreenId {
    pub fn new(value: u32) -> Result<Self, ScreenIdError> {
        NonZeroU32::new(value).map(Self).ok_or(ScreenIdError::Zero)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// Zero-based index into the stimulus screen list.
    pub fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for ScreenId {
    type Error = ScreenIdError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ScreenId> for u32 {
    fn from(id: ScreenId) -> Self {
        id.get()
    }
}

impl FromStr for ScreenId {
    type Err = ScreenIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<u32>()
            .map_err(|_| ScreenIdError::NotANumber(s.to_owned()))?;
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScreenIdError {
    #[error("screen ids are 1-based; 0 is not a valid screen id")]
    Zero,
    #[error("screen id must be a positive integer, got {0:?}")]
    NotANumber(String),
}

/// A 0-based position in a trial's visit ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisitPosition(usize);

impl VisitPosition {
    pub const fn new(value: usize) -> Self {
        Self(value)
    }

    pub const fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for VisitPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for VisitPosition {
    fn from(value: usize) -> Self {
        Self(value)
    }
}
