// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Retrace-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Retrace and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Per-screen visit files.
//!
//! A screen visited `k` times stores `fixations.json`, `fixations_1.json`, ...,
//! `fixations_{k-1}.json` (and the matching `lines*.json`) in chronological order. Enumeration
//! hands them back newest first.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{
    backup_dir_name, fixations_to_json, json_bytes, lines_from_json, lines_to_json,
    parse_asset_file_name, parse_screen_dir_name, parse_swap_leftover, read_versioned, refuse_symlink,
    remove_dir_if_exists, rename_dir, staging_dir_name, sync_dir, write_new_file, AssetKind,
    FixationsFileJson, LinesFileJson, RewriteStrategy, StoreError, SwapLeftover, TrialFolder,
};
use crate::model::{FixationSet, LineBoundarySet, ScreenId};

/// What [`TrialFolder::recover_interrupted_rewrites`] did about one leftover directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// The swap stopped after the old directory was moved aside; it was moved back.
    RestoredBackup(ScreenId),
    /// The swap completed but the old directory was never removed.
    DiscardedBackup(ScreenId),
    /// A half-built replacement directory was removed.
    DiscardedStaging(ScreenId),
}

impl TrialFolder {
    /// Creates the screen directory if needed.
    pub fn ensure_dir(&self, screen_id: ScreenId) -> Result<PathBuf, StoreError> {
        let dir = self.screen_dir(screen_id);
        refuse_symlink(&dir)?;
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(dir)
    }

    /// Stored fixation sets of a screen, most recent visit first.
    ///
    /// Only call this for screens that appear in the ledger: a screen without fixation files is
    /// an integrity failure.
    pub fn load_fixation_sets(&self, screen_id: ScreenId) -> Result<Vec<FixationSet>, StoreError> {
        let files = self.visit_files(screen_id, AssetKind::Fixations)?;
        if files.is_empty() {
            return Err(StoreError::NoFixationsFound {
                screen_id,
                dir: self.screen_dir(screen_id),
            });
        }

        let sets = files
            .into_iter()
            .map(|(_, path)| {
                let doc: FixationsFileJson = read_versioned(&path)?;
                Ok(FixationSet::new(doc.fixations))
            })
            .collect::<Result<Vec<_>, StoreError>>()?;
        debug!(screen_id = screen_id.get(), visits = sets.len(), "loaded fixation sets");
        Ok(sets)
    }

    /// Stored line boundary sets of a screen, most recent visit first.
    ///
    /// Empty when the lines were never edited.
    pub fn load_line_boundary_sets(
        &self,
        screen_id: ScreenId,
    ) -> Result<Vec<LineBoundarySet>, StoreError> {
        self.visit_files(screen_id, AssetKind::Lines)?
            .into_iter()
            .map(|(_, path)| {
                let doc: LinesFileJson = read_versioned(&path)?;
                lines_from_json(&path, doc)
            })
            .collect()
    }

    pub fn stored_visit_count(&self, screen_id: ScreenId) -> Result<usize, StoreError> {
        Ok(self.visit_files(screen_id, AssetKind::Fixations)?.len())
    }

    /// Screens that have a directory in the trial folder, whether or not it holds visits.
    pub fn screen_dirs(&self) -> Result<BTreeSet<ScreenId>, StoreError> {
        let entries = match fs::read_dir(self.root()) {
            Ok(entries) => entries,
            Err(source) if source.kind() == io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.root().to_path_buf(),
                    source,
                })
            }
        };

        let mut screens = BTreeSet::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Io {
                path: self.root().to_path_buf(),
                source,
            })?;
            if !entry.path().is_dir() {
                continue;
            }
            if let Some(screen_id) = entry.file_name().to_str().and_then(parse_screen_dir_name) {
                screens.insert(screen_id);
            }
        }
        Ok(screens)
    }

    /// Replaces every stored visit of a screen.
    ///
    /// The lists are in chronological order and name the files: entry 0 is unsuffixed, entry `i`
    /// gets suffix `_i`. Passing empty lists leaves an empty screen directory behind.
    pub fn write_visits(
        &self,
        screen_id: ScreenId,
        fixation_sets: &[FixationSet],
        line_sets: &[LineBoundarySet],
    ) -> Result<(), StoreError> {
        if fixation_sets.len() != line_sets.len() {
            return Err(StoreError::VisitListMismatch {
                screen_id,
                fixation_sets: fixation_sets.len(),
                line_sets: line_sets.len(),
            });
        }
        if let Some(index) = fixation_sets.iter().position(FixationSet::is_tombstone) {
            return Err(StoreError::TombstoneWrite { screen_id, index });
        }

        let dir = self.screen_dir(screen_id);
        let had_previous = refuse_symlink(&dir)?;

        match self.rewrite_strategy() {
            RewriteStrategy::InPlace => {
                remove_dir_if_exists(&dir)?;
                fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
                    path: dir.clone(),
                    source,
                })?;
                self.write_visit_files(&dir, fixation_sets, line_sets)?;
            }
            RewriteStrategy::StagedSwap => {
                let staging = self.root().join(staging_dir_name(screen_id));
                let backup = self.root().join(backup_dir_name(screen_id));

                remove_dir_if_exists(&staging)?;
                fs::create_dir_all(&staging).map_err(|source| StoreError::Io {
                    path: staging.clone(),
                    source,
                })?;
                self.write_visit_files(&staging, fixation_sets, line_sets)?;
                sync_dir(&staging, self.durability())?;

                remove_dir_if_exists(&backup)?;
                if had_previous {
                    rename_dir(&dir, &backup)?;
                }
                rename_dir(&staging, &dir)?;
                remove_dir_if_exists(&backup)?;
            }
        }

        sync_dir(self.root(), self.durability())?;
        debug!(
            screen_id = screen_id.get(),
            visits = fixation_sets.len(),
            "rewrote screen visits"
        );
        Ok(())
    }

    /// Repairs screen directories left behind by an interrupted staged swap.
    pub fn recover_interrupted_rewrites(&self) -> Result<Vec<Recovery>, StoreError> {
        let entries = match fs::read_dir(self.root()) {
            Ok(entries) => entries,
            Err(source) if source.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.root().to_path_buf(),
                    source,
                })
            }
        };

        let mut leftovers = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().to_str().and_then(parse_swap_leftover))
            .collect::<Vec<_>>();
        // Backups first: a restored backup must not race a staging dir of the same screen.
        leftovers.sort_by_key(|leftover| match leftover {
            SwapLeftover::Backup(id) => (0, *id),
            SwapLeftover::Staging(id) => (1, *id),
        });

        let mut recovered = Vec::with_capacity(leftovers.len());
        for leftover in leftovers {
            match leftover {
                SwapLeftover::Backup(screen_id) => {
                    let dir = self.screen_dir(screen_id);
                    let backup = self.root().join(backup_dir_name(screen_id));
                    if refuse_symlink(&dir)? {
                        remove_dir_if_exists(&backup)?;
                        warn!(screen_id = screen_id.get(), "discarded stale screen backup");
                        recovered.push(Recovery::DiscardedBackup(screen_id));
                    } else {
                        rename_dir(&backup, &dir)?;
                        warn!(
                            screen_id = screen_id.get(),
                            "restored screen directory from interrupted rewrite"
                        );
                        recovered.push(Recovery::RestoredBackup(screen_id));
                    }
                }
                SwapLeftover::Staging(screen_id) => {
                    remove_dir_if_exists(&self.root().join(staging_dir_name(screen_id)))?;
                    warn!(screen_id = screen_id.get(), "discarded partial screen rewrite");
                    recovered.push(Recovery::DiscardedStaging(screen_id));
                }
            }
        }

        if !recovered.is_empty() {
            sync_dir(self.root(), self.durability())?;
        }
        Ok(recovered)
    }

    fn write_visit_files(
        &self,
        dir: &Path,
        fixation_sets: &[FixationSet],
        line_sets: &[LineBoundarySet],
    ) -> Result<(), StoreError> {
        for (index, (fixations, lines)) in fixation_sets.iter().zip(line_sets).enumerate() {
            let fix_path = dir.join(AssetKind::Fixations.file_name(index));
            let raw = json_bytes(&fix_path, &fixations_to_json(fixations))?;
            write_new_file(&fix_path, &raw, self.durability())?;

            let lines_path = dir.join(AssetKind::Lines.file_name(index));
            let raw = json_bytes(&lines_path, &lines_to_json(lines))?;
            write_new_file(&lines_path, &raw, self.durability())?;
        }
        Ok(())
    }

    /// Files of `kind` in the screen directory, ordered by descending visit index.
    fn visit_files(
        &self,
        screen_id: ScreenId,
        kind: AssetKind,
    ) -> Result<Vec<(usize, PathBuf)>, StoreError> {
        let dir = self.screen_dir(screen_id);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(source) if source.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StoreError::Io { path: dir, source }),
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Io {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(parsed) = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(parse_asset_file_name)
            else {
                continue;
            };
            if parsed.0 == kind {
                files.push((parsed.1, path));
            }
        }

        files.sort_by(|a, b| b.0.cmp(&a.0));

        let expected = files.len();
        let dense = files
            .iter()
            .enumerate()
            .all(|(pos, (index, _))| *index == expected - 1 - pos);
        if !dense {
            let mut indexes = files.iter().map(|(index, _)| *index).collect::<Vec<_>>();
            indexes.sort_unstable();
            return Err(StoreError::VisitIndexGap {
                screen_id,
                kind: kind.stem(),
                indexes,
                expected,
            });
        }

        Ok(files)
    }
}
