// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Retrace-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Retrace and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::trial_folder::{RewriteStrategy, StoreError, TrialFolder, WriteDurability};
use crate::model::TrialFlags;

/// A participant's processed data: one [`TrialFolder`] per trial directory.
#[derive(Debug, Clone)]
pub struct ParticipantFolder {
    root: PathBuf,
    durability: WriteDurability,
    rewrite: RewriteStrategy,
}

impl ParticipantFolder {
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

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn trial(&self, name: &str) -> TrialFolder {
        TrialFolder::new(self.root.join(name))
            .with_durability(self.durability)
            .with_rewrite_strategy(self.rewrite)
    }

    /// Names of the trial directories, sorted. Hidden directories are skipped.
    pub fn trial_names(&self) -> Result<Vec<String>, StoreError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(source) if source.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.root.clone(),
                    source,
                })
            }
        };

        let mut names = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().to_str().map(ToOwned::to_owned))
            .filter(|name| !name.starts_with('.'))
            .collect::<Vec<_>>();
        names.sort();
        Ok(names)
    }

    pub fn load_all_flags(&self) -> Result<BTreeMap<String, TrialFlags>, StoreError> {
        self.trial_names()?
            .into_iter()
            .map(|name| {
                let flags = self.trial(&name).load_flags()?;
                Ok((name, flags))
            })
            .collect()
    }

    /// True when `expected_trials` trials exist and every one of them has been reviewed.
    pub fn all_edited(&self, expected_trials: usize) -> Result<bool, StoreError> {
        let flags = self.load_all_flags()?;
        Ok(flags.len() == expected_trials && flags.values().all(|flags| flags.edited))
    }
}

/// Orders trial names by the stimulus presentation order, dropping unknown names.
pub fn order_trials(trials: &[String], stimulus_order: &[String]) -> Vec<String> {
    stimulus_order
        .iter()
        .filter(|name| trials.contains(name))
        .cloned()
        .collect()
}
