// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Retrace-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Retrace and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::{BTreeMap, BTreeSet};

use tracing::info;

use crate::model::{FixationSet, Ledger, LineBoundarySet, ScreenId, SequenceState, VisitPosition};
use crate::store::{StoreError, TrialFolder};

/// Outcome of a successful [`persist`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistReport {
    /// Positions of the session-start ledger that were dropped.
    pub deleted_positions: BTreeSet<VisitPosition>,
    /// The ledger now on disk.
    pub ledger: Ledger,
    /// Every screen whose directory was rewritten.
    pub rewritten_screens: BTreeSet<ScreenId>,
}

#[derive(Default)]
struct SurvivingVisits {
    fixation_sets: Vec<FixationSet>,
    line_sets: Vec<LineBoundarySet>,
}

/// Writes an edited session back to the trial folder.
///
/// Tombstoned visits (empty fixation sets) are dropped and the survivors of each screen are
/// renumbered densely. Every screen of the session-start ledger is rewritten, then the pruned
/// ledger is saved. Screens rewritten before a failure stay rewritten and the ledger is left
/// untouched.
pub fn persist(folder: &TrialFolder, state: &SequenceState) -> Result<PersistReport, StoreError> {
    state.validate()?;

    let deleted_positions = state.deleted_positions();
    let ledger = state.ledger().prune(&deleted_positions)?;

    let mut surviving = state
        .ledger()
        .screen_ids()
        .into_iter()
        .map(|screen_id| (screen_id, SurvivingVisits::default()))
        .collect::<BTreeMap<_, _>>();
    for (_, visit) in state.visits().filter(|(_, visit)| !visit.is_tombstone()) {
        let entry = surviving.entry(visit.screen_id()).or_default();
        entry.fixation_sets.push(visit.fixations().clone());
        entry.line_sets.push(visit.lines().clone());
    }

    for (screen_id, visits) in &surviving {
        folder.write_visits(*screen_id, &visits.fixation_sets, &visits.line_sets)?;
    }

    folder.save_ledger(&ledger)?;

    info!(
        trial = ?folder.root(),
        deleted = deleted_positions.len(),
        visits = ledger.len(),
        screens = surviving.len(),
        "persisted trial"
    );

    Ok(PersistReport {
        deleted_positions,
        ledger,
        rewritten_screens: surviving.into_keys().collect(),
    })
}
