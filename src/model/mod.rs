// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Retrace-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Retrace and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model.
//!
//! A trial is a ledger of screen visits; each visit owns a fixation set and the line boundaries
//! used to read it. `SequenceState` is the editable view handed to the editor.

#[cfg(test)]
pub(crate) mod fixtures;
pub mod fixation;
pub mod flags;
pub mod ids;
pub mod ledger;
pub mod lines;
pub mod sequence_state;

pub use fixation::{Fixation, FixationSet, FixationSetError};
pub use flags::{FlagsError, TrialFlags};
pub use ids::{ScreenId, ScreenIdError, VisitPosition};
pub use ledger::{Ledger, LedgerError};
pub use lines::{LineBoundaryError, LineBoundarySet};
pub use sequence_state::{ScreenImage, SequenceState, SequenceStateError, Visit};
