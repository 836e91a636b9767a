// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Retrace-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Retrace and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fs;
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::model::{
    Fixation, FixationSet, Ledger, LedgerError, LineBoundaryError, LineBoundarySet, ScreenId,
    SequenceStateError, TrialFlags,
};
use crate::stimulus::StimulusError;

mod screen_assets;

pub use screen_assets::Recovery;

const LEDGER_FILENAME: &str = "screen_sequence.json";
const FLAGS_FILENAME: &str = "flags.json";
const SCREEN_DIR_PREFIX: &str = "screen_";

/// Version written into every persisted document.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error at {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("json error at {path:?}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{path:?} has format version {found}; only versions up to {supported} are supported")]
    UnsupportedVersion {
        path: PathBuf,
        found: u32,
        supported: u32,
    },
    #[error("trial has no visit ledger at {path:?}")]
    MissingLedger { path: PathBuf },
    #[error("trial has no flags at {path:?}")]
    MissingFlags { path: PathBuf },
    #[error("no fixations found for screen {screen_id} in {dir:?}")]
    NoFixationsFound { screen_id: ScreenId, dir: PathBuf },
    #[error("screen {screen_id} has {kind} files with indexes {indexes:?}; expected 0..{expected}")]
    VisitIndexGap {
        screen_id: ScreenId,
        kind: &'static str,
        indexes: Vec<usize>,
        expected: usize,
    },
    #[error("screen {screen_id} is visited {ledger} times in the ledger but has {stored} stored fixation sets")]
    VisitCountMismatch {
        screen_id: ScreenId,
        ledger: usize,
        stored: usize,
    },
    #[error("screen {screen_id} is visited {ledger} times in the ledger but has {stored} stored line sets")]
    LineSetCountMismatch {
        screen_id: ScreenId,
        ledger: usize,
        stored: usize,
    },
    #[error("screen {screen_id} has {stored} stored visits but does not appear in the ledger")]
    UnledgeredVisits { screen_id: ScreenId, stored: usize },
    #[error("refusing to write an empty fixation set for screen {screen_id} (visit {index})")]
    TombstoneWrite { screen_id: ScreenId, index: usize },
    #[error("screen {screen_id}: {fixation_sets} fixation sets but {line_sets} line sets")]
    VisitListMismatch {
        screen_id: ScreenId,
        fixation_sets: usize,
        line_sets: usize,
    },
    #[error("invalid line boundaries in {path:?}: {source}")]
    InvalidLineBoundaries {
        path: PathBuf,
        source: LineBoundaryError,
    },
    #[error("invalid sequence state: {0}")]
    InvalidSequenceState(#[from] SequenceStateError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Stimulus(#[from] StimulusError),
    #[error("refusing to write through symlink at {path:?}")]
    SymlinkRefused { path: PathBuf },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum WriteDurability {
    /// Fast, best-effort persistence.
    ///
    /// - Writes a temp file and renames atomically into place.
    /// - Does not perform per-file fsync/sync.
    #[default]
    BestEffort,

    /// Slower, best-effort durability.
    ///
    /// Flushes written files and directory entries to stable storage where possible. Exact
    /// guarantees are platform/filesystem-dependent.
    Durable,
}

/// How a screen directory is replaced when its visits are rewritten.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum RewriteStrategy {
    /// Build the new directory next to the old one and swap them with renames.
    ///
    /// An interrupted swap is repaired by [`TrialFolder::recover_interrupted_rewrites`].
    #[default]
    StagedSwap,

    /// Delete the directory and recreate it in place. A failure mid-rewrite loses the screen.
    InPlace,
}

/// The on-disk folder of one trial: visit ledger, flags and one directory per screen.
#[derive(Debug, Clone)]
pub struct TrialFolder {
    root: PathBuf,
    durability: WriteDurability,
    rewrite: RewriteStrategy,
}

impl TrialFolder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            durability: WriteDurability::default(),
            rewrite: RewriteStrategy::default(),
        }
    }

    pub fn with_durability(mut self, durability: WriteDurability) -> Self {
        self.durability = durability;
        self
    }

    pub fn with_rewrite_strategy(mut self, rewrite: RewriteStrategy) -> Self {
        self.rewrite = rewrite;
        self
    }

    pub fn durability(&self) -> WriteDurability {
        self.durability
    }

    pub fn rewrite_strategy(&self) -> RewriteStrategy {
        self.rewrite
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The trial's name is its directory name.
    pub fn trial_name(&self) -> Option<&str> {
        self.root.file_name().and_then(|name| name.to_str())
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.root.join(LEDGER_FILENAME)
    }

    pub fn flags_path(&self) -> PathBuf {
        self.root.join(FLAGS_FILENAME)
    }

    pub fn screen_dir(&self, screen_id: ScreenId) -> PathBuf {
        self.root.join(screen_dir_name(screen_id))
    }

    pub fn load_ledger(&self) -> Result<Ledger, StoreError> {
        let path = self.ledger_path();
        let doc: LedgerFileJson = match read_versioned(&path) {
            Ok(doc) => doc,
            Err(StoreError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::MissingLedger { path });
            }
            Err(err) => return Err(err),
        };

        let ledger = doc.visits.into_iter().map(|row| row.screen_id).collect::<Ledger>();
        debug!(path = ?path, visits = ledger.len(), "loaded visit ledger");
        Ok(ledger)
    }

    pub fn save_ledger(&self, ledger: &Ledger) -> Result<(), StoreError> {
        let path = self.ledger_path();
        let doc = LedgerFileJson {
            version: FORMAT_VERSION,
            visits: ledger
                .screens()
                .iter()
                .map(|screen_id| LedgerRowJson {
                    screen_id: *screen_id,
                })
                .collect(),
        };
        self.write_json(&path, &doc)?;
        debug!(path = ?path, visits = ledger.len(), "saved visit ledger");
        Ok(())
    }

    pub fn load_flags(&self) -> Result<TrialFlags, StoreError> {
        let path = self.flags_path();
        let doc: FlagsFileJson = match read_versioned(&path) {
            Ok(doc) => doc,
            Err(StoreError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::MissingFlags { path });
            }
            Err(err) => return Err(err),
        };

        Ok(TrialFlags {
            edited: doc.edited,
            is_wrong: doc.is_wrong,
            wrong_answer_count: doc.wrong_answer_count,
        })
    }

    pub fn save_flags(&self, flags: &TrialFlags) -> Result<(), StoreError> {
        let path = self.flags_path();
        let doc = FlagsFileJson {
            version: FORMAT_VERSION,
            edited: flags.edited,
            is_wrong: flags.is_wrong,
            wrong_answer_count: flags.wrong_answer_count,
        };
        self.write_json(&path, &doc)
    }

    /// Loads, updates and saves the flags in one step.
    pub fn update_flags(
        &self,
        update: impl FnOnce(&mut TrialFlags),
    ) -> Result<TrialFlags, StoreError> {
        let mut flags = self.load_flags()?;
        update(&mut flags);
        self.save_flags(&flags)?;
        Ok(flags)
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), StoreError> {
        let raw = json_bytes(path, value)?;
        write_atomic(path, &raw, self.durability)
    }
}

// Extracted file-format and filesystem helpers for `TrialFolder`.
include!("trial_folder/helpers.rs");
