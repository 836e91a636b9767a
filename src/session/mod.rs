// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Retrace-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Retrace and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Edit sessions: assembling a trial into a [`SequenceState`](crate::model::SequenceState) and
//! persisting the edited state.
//!
//! Loading and saving deliberately walk the screen files in opposite directions: screen files
//! enumerate newest first, while assembly hands visits to ledger positions oldest first and
//! persisting writes them oldest first.

mod assemble;
mod persist;

pub use assemble::assemble;
pub use persist::{persist, PersistReport};
