// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Retrace-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Retrace and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Retrace: trial revisit reconstruction and versioned persistence for eye-tracking reading
//! trials.
//!
//! A trial records the order in which a reader visited the screens of a stimulus. [`session`]
//! turns the on-disk trial folder ([`store`]) into an editable [`model::SequenceState`] and writes
//! edits back, dropping deleted visits and renumbering the survivors.

pub mod model;
pub mod session;
pub mod stimulus;
pub mod store;
