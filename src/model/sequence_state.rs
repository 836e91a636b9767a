// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Retrace-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Retrace and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::fixation::FixationSet;
use super::ids::{ScreenId, VisitPosition};
use super::ledger::Ledger;
use super::lines::LineBoundarySet;

/// Reference to the rendered stimulus image of a screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenImage {
    path: PathBuf,
}

impl ScreenImage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// One visit to a screen: the fixations recorded during it and the line boundaries used to read
/// them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visit {
    screen_id: ScreenId,
    fixations: FixationSet,
    lines: LineBoundarySet,
}

impl Visit {
    pub fn new(screen_id: ScreenId, fixations: FixationSet, lines: LineBoundarySet) -> Self {
        Self {
            screen_id,
            fixations,
            lines,
        }
    }

    pub fn screen_id(&self) -> ScreenId {
        self.screen_id
    }

    pub fn fixations(&self) -> &FixationSet {
        &self.fixations
    }

    pub fn fixations_mut(&mut self) -> &mut FixationSet {
        &mut self.fixations
    }

    pub fn lines(&self) -> &LineBoundarySet {
        &self.lines
    }

    pub fn lines_mut(&mut self) -> &mut LineBoundarySet {
        &mut self.lines
    }

    pub fn is_tombstone(&self) -> bool {
        self.fixations.is_tombstone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceStateError {
    #[error("sequence state is missing ledger position {position} (ledger len={len})")]
    MissingPosition { position: VisitPosition, len: usize },
    #[error("sequence state has position {position} outside the ledger (len={len})")]
    UnexpectedPosition { position: VisitPosition, len: usize },
    #[error("visit at position {position} is for screen {visit} but the ledger records screen {ledger}")]
    ScreenMismatch {
        position: VisitPosition,
        ledger: ScreenId,
        visit: ScreenId,
    },
    #[error("no screen image for screen {screen_id}")]
    MissingScreenImage { screen_id: ScreenId },
}

/// Editable view of one trial's visits, keyed by ledger position.
///
/// The state carries the ledger as loaded when the session started. Keys are always exactly
/// `0..ledger.len()` and visit `i` is a visit to `ledger[i]`; edits may change fixations and line
/// boundaries but never the key set or a visit's screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceState {
    ledger: Ledger,
    visits: BTreeMap<VisitPosition, Visit>,
    screens: BTreeMap<ScreenId, ScreenImage>,
}

impl SequenceState {
    pub fn from_parts(
        ledger: Ledger,
        visits: BTreeMap<VisitPosition, Visit>,
        screens: BTreeMap<ScreenId, ScreenImage>,
    ) -> Result<Self, SequenceStateError> {
        let state = Self {
            ledger,
            visits,
            screens,
        };
        state.validate()?;
        Ok(state)
    }

    /// Checks the position/ledger correspondence.
    pub fn validate(&self) -> Result<(), SequenceStateError> {
        let len = self.ledger.len();

        if let Some(position) = self.visits.keys().find(|p| p.get() >= len) {
            return Err(SequenceStateError::UnexpectedPosition {
                position: *position,
                len,
            });
        }

        for (position, ledger_screen) in self.ledger.iter() {
            let Some(visit) = self.visits.get(&position) else {
                return Err(SequenceStateError::MissingPosition { position, len });
            };
            if visit.screen_id != ledger_screen {
                return Err(SequenceStateError::ScreenMismatch {
                    position,
                    ledger: ledger_screen,
                    visit: visit.screen_id,
                });
            }
        }

        for screen_id in self.ledger.screen_ids() {
            if !self.screens.contains_key(&screen_id) {
                return Err(SequenceStateError::MissingScreenImage { screen_id });
            }
        }

        Ok(())
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn len(&self) -> usize {
        self.visits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }

    pub fn visit(&self, position: VisitPosition) -> Option<&Visit> {
        self.visits.get(&position)
    }

    pub fn visit_mut(&mut self, position: VisitPosition) -> Option<&mut Visit> {
        self.visits.get_mut(&position)
    }

    /// Visits in ledger order.
    pub fn visits(&self) -> impl Iterator<Item = (VisitPosition, &Visit)> + '_ {
        self.visits.iter().map(|(position, visit)| (*position, visit))
    }

    pub fn screens(&self) -> &BTreeMap<ScreenId, ScreenImage> {
        &self.screens
    }

    pub fn screen_image(&self, screen_id: ScreenId) -> Option<&ScreenImage> {
        self.screens.get(&screen_id)
    }

    pub fn recurrence_rank(&self, position: VisitPosition) -> Option<usize> {
        self.ledger.recurrence_rank(position)
    }

    /// Marks a whole visit for deletion by emptying its fixations.
    pub fn tombstone(&mut self, position: VisitPosition) -> Result<(), SequenceStateError> {
        let len = self.ledger.len();
        let visit = self
            .visits
            .get_mut(&position)
            .ok_or(SequenceStateError::UnexpectedPosition { position, len })?;
        visit.fixations.clear();
        Ok(())
    }

    pub fn deleted_positions(&self) -> BTreeSet<VisitPosition> {
        self.visits
            .iter()
            .filter(|(_, visit)| visit.is_tombstone())
            .map(|(position, _)| *position)
            .collect()
    }
}
