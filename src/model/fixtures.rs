// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Retrace-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Retrace and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;
use std::path::PathBuf;

use super::fixation::{Fixation, FixationSet};
use super::ids::{ScreenId, VisitPosition};
use super::ledger::Ledger;
use super::lines::LineBoundarySet;
use super::sequence_state::{ScreenImage, SequenceState, Visit};
use crate::stimulus::{StimulusFile, StimulusLine};
use crate::store::TrialFolder;

pub(crate) fn sid(id: u32) -> ScreenId {
    ScreenId::new(id).expect("screen id")
}

pub(crate) fn ledger(ids: &[u32]) -> Ledger {
    ids.iter().map(|id| sid(*id)).collect()
}

/// A short left-to-right scanpath; `seed` shifts it so every visit is distinguishable.
pub(crate) fn fixations(seed: i32) -> FixationSet {
    FixationSet::new(vec![
        Fixation::new(100 + seed, 120, 210),
        Fixation::new(180 + seed, 122, 190),
        Fixation::new(260 + seed, 175, 250),
    ])
}

pub(crate) fn lines(top: i32) -> LineBoundarySet {
    LineBoundarySet::new(vec![top, top + 55, top + 110]).expect("line boundaries")
}

/// Ledger `[1, 2, 1]`: screen 1 is re-read after screen 2.
pub(crate) fn revisit_state() -> SequenceState {
    let visits = BTreeMap::from([
        (VisitPosition::new(0), Visit::new(sid(1), fixations(0), lines(90))),
        (VisitPosition::new(1), Visit::new(sid(2), fixations(1), lines(92))),
        (VisitPosition::new(2), Visit::new(sid(1), fixations(2), lines(94))),
    ]);
    let screens = BTreeMap::from([
        (sid(1), ScreenImage::new("screens/1.png")),
        (sid(2), ScreenImage::new("screens/2.png")),
    ]);
    SequenceState::from_parts(ledger(&[1, 2, 1]), visits, screens).expect("revisit state")
}

/// Three screens, two text lines each.
pub(crate) fn stimulus() -> StimulusFile {
    let lines = (1..=3)
        .flat_map(|screen| {
            [100, 155].map(|top| StimulusLine {
                screen: sid(screen),
                bbox: [80, top, 1700, 40],
            })
        })
        .collect();
    StimulusFile::new(
        55,
        (1..=3).map(|id| PathBuf::from(format!("screens/{id}.png"))).collect(),
        lines,
    )
}

/// Writes a trial as upstream parsing would: ledger, flags and `fixations(seed)` per visit,
/// where `seed` is the ledger position. Line files are only written when `with_lines` is set.
pub(crate) fn seed_trial(folder: &TrialFolder, ledger_ids: &[u32], with_lines: bool) {
    let ledger = ledger(ledger_ids);
    let mut per_screen = BTreeMap::<ScreenId, (Vec<FixationSet>, Vec<LineBoundarySet>)>::new();
    for (position, screen_id) in ledger.iter() {
        let entry = per_screen.entry(screen_id).or_default();
        entry.0.push(fixations(position.get() as i32));
        entry.1.push(lines(90 + position.get() as i32));
    }

    for (screen_id, (fixation_sets, line_sets)) in &per_screen {
        folder
            .write_visits(*screen_id, fixation_sets, line_sets)
            .expect("seed screen visits");
        if !with_lines {
            for entry in std::fs::read_dir(folder.screen_dir(*screen_id)).expect("read screen dir") {
                let path = entry.expect("dir entry").path();
                let is_lines = path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with("lines"));
                if is_lines {
                    std::fs::remove_file(path).expect("remove lines file");
                }
            }
        }
    }

    folder.save_ledger(&ledger).expect("seed ledger");
    folder
        .save_flags(&crate::model::TrialFlags::default())
        .expect("seed flags");
}
