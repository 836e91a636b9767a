// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Retrace-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Retrace and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Persistence for trials on disk.
//!
//! The store module reads/writes the trial folder format (visit ledger, flags and per-screen
//! visit files) plus the participant folder that groups trials.

pub mod participant;
pub mod session_file;
pub mod trial_folder;

pub use participant::{order_trials, ParticipantFolder};
pub use session_file::{read_sequence_state, sequence_state_to_string, write_sequence_state};
pub use trial_folder::{
    Recovery, RewriteStrategy, StoreError, TrialFolder, WriteDurability, FORMAT_VERSION,
};
