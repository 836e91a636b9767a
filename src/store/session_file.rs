// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Retrace-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Retrace and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! JSON exchange format for an assembled [`SequenceState`].
//!
//! An external editor receives the state as a document, edits fixations and line boundaries,
//! and hands the document back. Reading it back runs the same position/ledger validation as
//! `SequenceState::from_parts`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::trial_folder::{write_atomic, StoreError, WriteDurability, FORMAT_VERSION};
use crate::model::{
    FixationSet, Ledger, LineBoundarySet, ScreenId, ScreenImage, SequenceState, Visit,
    VisitPosition,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SequenceStateJson {
    version: u32,
    ledger: Vec<ScreenId>,
    #[serde(default)]
    screens: Vec<ScreenJson>,
    visits: BTreeMap<usize, VisitJson>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScreenJson {
    screen_id: ScreenId,
    image: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct VisitJson {
    screen_id: ScreenId,
    fixations: FixationSet,
    lines: LineBoundarySet,
}

fn state_to_json(state: &SequenceState) -> SequenceStateJson {
    SequenceStateJson {
        version: FORMAT_VERSION,
        ledger: state.ledger().screens().to_vec(),
        screens: state
            .screens()
            .iter()
            .map(|(screen_id, image)| ScreenJson {
                screen_id: *screen_id,
                image: image.path().to_path_buf(),
            })
            .collect(),
        visits: state
            .visits()
            .map(|(position, visit)| {
                (
                    position.get(),
                    VisitJson {
                        screen_id: visit.screen_id(),
                        fixations: visit.fixations().clone(),
                        lines: visit.lines().clone(),
                    },
                )
            })
            .collect(),
    }
}

fn state_from_json(path: &Path, json: SequenceStateJson) -> Result<SequenceState, StoreError> {
    if json.version > FORMAT_VERSION {
        return Err(StoreError::UnsupportedVersion {
            path: path.to_path_buf(),
            found: json.version,
            supported: FORMAT_VERSION,
        });
    }

    let visits = json
        .visits
        .into_iter()
        .map(|(position, visit)| {
            (
                VisitPosition::new(position),
                Visit::new(visit.screen_id, visit.fixations, visit.lines),
            )
        })
        .collect();
    let screens = json
        .screens
        .into_iter()
        .map(|screen| (screen.screen_id, ScreenImage::new(screen.image)))
        .collect();

    Ok(SequenceState::from_parts(Ledger::new(json.ledger), visits, screens)?)
}

pub fn sequence_state_to_string(state: &SequenceState) -> Result<String, StoreError> {
    let raw = serde_json::to_string_pretty(&state_to_json(state)).map_err(|source| {
        StoreError::Json {
            path: PathBuf::from("<sequence state>"),
            source,
        }
    })?;
    Ok(format!("{raw}\n"))
}

pub fn write_sequence_state(
    path: &Path,
    state: &SequenceState,
    durability: WriteDurability,
) -> Result<(), StoreError> {
    let raw = sequence_state_to_string(state)?;
    write_atomic(path, raw.as_bytes(), durability)
}

pub fn read_sequence_state(path: &Path) -> Result<SequenceState, StoreError> {
    let raw = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let json: SequenceStateJson = serde_json::from_str(&raw).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    state_from_json(path, json)
}
