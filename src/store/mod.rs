// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triton-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triton and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Best-effort local persistence.
//!
//! The draft snapshot, the saved repository coordinates and the
//! realtime-poll preference each live in their own single-value slot. Every
//! slot is a convenience, not a guarantee: persistence failures are
//! swallowed and degrade to "no value".

pub mod draft;
pub mod slots;

pub use draft::{DraftSnapshot, DraftStore, DEFAULT_DEBOUNCE};
pub use slots::{SlotStore, CONFIG_SLOT, DRAFT_SLOT, REALTIME_SLOT};
