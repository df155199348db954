// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triton-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triton and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Document format: front-matter codec and slug/path derivation.

pub mod front_matter;
pub mod slug;

pub use front_matter::{parse_front_matter, serialize_post, ParsedFields};
pub use slug::{
    derived_path, file_meta, normalized_slug, permalink, post_path, slug_from_permalink, slugify,
    FileMeta,
};

/// Today's date as ISO `YYYY-MM-DD`, in the local time zone.
pub fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}
