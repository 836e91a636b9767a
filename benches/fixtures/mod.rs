// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Retrace-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Retrace and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#![allow(dead_code)]

// Shared deterministic benchmark fixtures (no RNG).

use std::path::PathBuf;

use retrace::model::{Fixation, FixationSet, Ledger, LineBoundarySet, ScreenId};
use retrace::stimulus::{StimulusFile, StimulusLine};
use retrace::store::TrialFolder;

#[derive(Debug, Clone, Copy)]
pub enum Case {
    /// Linear reading: every screen once.
    Linear,
    /// Readers jumping back to earlier screens.
    Revisits,
}

#[derive(Debug, Clone, Copy)]
pub struct Params {
    pub screens: u32,
    pub visits: usize,
    pub fixations_per_visit: usize,
    pub lines_per_screen: usize,
    pub look_back: bool,
}

impl Case {
    pub fn id(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Revisits => "revisits",
        }
    }

    pub fn params(self) -> Params {
        match self {
            Self::Linear => Params {
                screens: 12,
                visits: 12,
                fixations_per_visit: 80,
                lines_per_screen: 10,
                look_back: false,
            },
            Self::Revisits => Params {
                screens: 12,
                visits: 40,
                fixations_per_visit: 60,
                lines_per_screen: 10,
                look_back: true,
            },
        }
    }
}

fn sid(id: u32) -> ScreenId {
    ScreenId::new(id).expect("screen id")
}

/// Forward reading; with `look_back`, a jump back two screens after every third visit.
pub fn ledger(params: Params) -> Ledger {
    let mut screens = Vec::with_capacity(params.visits);
    let mut current = 1u32;
    while screens.len() < params.visits {
        screens.push(sid(current));
        let look_back = params.look_back && screens.len() % 3 == 0 && current > 2;
        if look_back && screens.len() < params.visits {
            screens.push(sid(current - 2));
        }
        current = current % params.screens + 1;
    }
    screens.truncate(params.visits);
    Ledger::new(screens)
}

pub fn fixations(params: Params, seed: usize) -> FixationSet {
    (0..params.fixations_per_visit)
        .map(|idx| {
            let x = 80 + ((idx * 37 + seed * 11) % 1600) as i32;
            let y = 100 + ((idx / 8) % params.lines_per_screen) as i32 * 55;
            Fixation::new(x, y, 120 + ((idx + seed) % 200) as u32)
        })
        .collect()
}

pub fn stimulus(params: Params) -> StimulusFile {
    let lines = (1..=params.screens)
        .flat_map(|screen| {
            (0..params.lines_per_screen).map(move |line| StimulusLine {
                screen: sid(screen),
                bbox: [80, 100 + line as i32 * 55, 1600, 40],
            })
        })
        .collect();
    StimulusFile::new(
        55,
        (1..=params.screens)
            .map(|id| PathBuf::from(format!("screens/{id}.png")))
            .collect(),
        lines,
    )
}

fn lines(params: Params) -> LineBoundarySet {
    LineBoundarySet::new(
        (0..=params.lines_per_screen)
            .map(|line| 73 + line as i32 * 55)
            .collect(),
    )
    .expect("line boundaries")
}

/// Writes a full trial for `case` into `folder`.
pub fn seed_trial(folder: &TrialFolder, case: Case) {
    let params = case.params();
    let ledger = ledger(params);
    for screen_id in ledger.screen_ids() {
        let fixation_sets = ledger
            .positions_of(screen_id)
            .into_iter()
            .map(|position| fixations(params, position.get()))
            .collect::<Vec<_>>();
        let line_sets = vec![lines(params); fixation_sets.len()];
        folder
            .write_visits(screen_id, &fixation_sets, &line_sets)
            .expect("write_visits");
    }
    folder.save_ledger(&ledger).expect("save_ledger");
}
