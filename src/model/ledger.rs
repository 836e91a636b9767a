// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Retrace-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Retrace and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeSet;

use thiserror::Error;

use super::ids::{ScreenId, VisitPosition};

/// Chronological list of the screens visited during a trial, one entry per visit.
///
/// Re-reading a screen produces a second entry for the same screen id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    screens: Vec<ScreenId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("ledger position {position} out of range (len={len})")]
    PositionOutOfRange { position: VisitPosition, len: usize },
}

impl Ledger {
    pub fn new(screens: Vec<ScreenId>) -> Self {
        Self { screens }
    }

    pub fn screens(&self) -> &[ScreenId] {
        &self.screens
    }

    pub fn len(&self) -> usize {
        self.screens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }

    pub fn get(&self, position: VisitPosition) -> Option<ScreenId> {
        self.screens.get(position.get()).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VisitPosition, ScreenId)> + '_ {
        self.screens
            .iter()
            .enumerate()
            .map(|(idx, screen_id)| (VisitPosition::new(idx), *screen_id))
    }

    /// Distinct screen ids, ascending.
    pub fn screen_ids(&self) -> BTreeSet<ScreenId> {
        self.screens.iter().copied().collect()
    }

    /// Number of visits to `screen_id`.
    pub fn occurrences(&self, screen_id: ScreenId) -> usize {
        self.screens.iter().filter(|id| **id == screen_id).count()
    }

    pub fn positions_of(&self, screen_id: ScreenId) -> Vec<VisitPosition> {
        self.iter()
            .filter(|(_, id)| *id == screen_id)
            .map(|(position, _)| position)
            .collect()
    }

    /// 1-based count of entries up to and including `position` that share its screen id.
    pub fn recurrence_rank(&self, position: VisitPosition) -> Option<usize> {
        let screen_id = self.get(position)?;
        Some(
            self.screens[..=position.get()]
                .iter()
                .filter(|id| **id == screen_id)
                .count(),
        )
    }

    /// Removes exactly the rows at `deleted`, keeping the survivors in order.
    ///
    /// Positions refer to this ledger as it was when they were computed; pruning a ledger that
    /// has been restructured since then removes the wrong rows.
    pub fn prune(&self, deleted: &BTreeSet<VisitPosition>) -> Result<Ledger, LedgerError> {
        if let Some(position) = deleted.iter().find(|p| p.get() >= self.screens.len()) {
            return Err(LedgerError::PositionOutOfRange {
                position: *position,
                len: self.screens.len(),
            });
        }

        let screens = self
            .iter()
            .filter(|(position, _)| !deleted.contains(position))
            .map(|(_, screen_id)| screen_id)
            .collect();
        Ok(Ledger { screens })
    }
}

impl FromIterator<ScreenId> for Ledger {
    fn from_iter<I: IntoIterator<Item = ScreenId>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
