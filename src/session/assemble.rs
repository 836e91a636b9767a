// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Retrace-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Retrace and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::model::{FixationSet, LineBoundarySet, ScreenId, SequenceState, Visit};
use crate::stimulus::StimulusLayout;
use crate::store::{StoreError, TrialFolder};

/// Stored visits of one screen, newest first; visits are taken from the back.
struct StoredVisits {
    fixation_sets: Vec<FixationSet>,
    line_sets: Vec<LineBoundarySet>,
}

/// Builds the editable view of a trial from its ledger, its screen files and the stimulus.
///
/// Leftovers of an interrupted rewrite are repaired first. Every screen in the ledger must have
/// exactly as many stored fixation sets as it has ledger entries, and screens outside the ledger
/// must have none (emptied directories are fine); stored line sets are optional and fall back to
/// the stimulus defaults.
pub fn assemble<S>(folder: &TrialFolder, stimulus: &S) -> Result<SequenceState, StoreError>
where
    S: StimulusLayout + ?Sized,
{
    let recovered = folder.recover_interrupted_rewrites()?;
    if !recovered.is_empty() {
        info!(trial = ?folder.root(), recovered = recovered.len(), "repaired interrupted rewrites");
    }

    let ledger = folder.load_ledger()?;

    let ledgered = ledger.screen_ids();
    for screen_id in folder.screen_dirs()?.difference(&ledgered) {
        let stored = folder.stored_visit_count(*screen_id)?;
        if stored > 0 {
            return Err(StoreError::UnledgeredVisits {
                screen_id: *screen_id,
                stored,
            });
        }
    }

    let mut stored = BTreeMap::<ScreenId, StoredVisits>::new();
    let mut screens = BTreeMap::new();
    for screen_id in ledgered {
        let occurrences = ledger.occurrences(screen_id);

        let fixation_sets = folder.load_fixation_sets(screen_id)?;
        if fixation_sets.len() != occurrences {
            return Err(StoreError::VisitCountMismatch {
                screen_id,
                ledger: occurrences,
                stored: fixation_sets.len(),
            });
        }

        let mut line_sets = folder.load_line_boundary_sets(screen_id)?;
        if line_sets.is_empty() {
            let default = stimulus.default_line_boundaries(screen_id)?;
            debug!(screen_id = screen_id.get(), "using stimulus line boundaries");
            line_sets = vec![default; occurrences];
        } else if line_sets.len() != occurrences {
            return Err(StoreError::LineSetCountMismatch {
                screen_id,
                ledger: occurrences,
                stored: line_sets.len(),
            });
        }

        screens.insert(screen_id, stimulus.screen_image(screen_id)?);
        stored.insert(
            screen_id,
            StoredVisits {
                fixation_sets,
                line_sets,
            },
        );
    }

    let mut visits = BTreeMap::new();
    for (position, screen_id) in ledger.iter() {
        let next = stored.get_mut(&screen_id).and_then(|visits| {
            let fixations = visits.fixation_sets.pop()?;
            let lines = visits.line_sets.pop()?;
            Some((fixations, lines))
        });
        let Some((fixations, lines)) = next else {
            return Err(StoreError::VisitCountMismatch {
                screen_id,
                ledger: ledger.occurrences(screen_id),
                stored: ledger.recurrence_rank(position).unwrap_or(0).saturating_sub(1),
            });
        };
        visits.insert(position, Visit::new(screen_id, fixations, lines));
    }

    let state = SequenceState::from_parts(ledger, visits, screens)?;
    debug!(trial = ?folder.root(), visits = state.len(), "assembled trial");
    Ok(state)
}
