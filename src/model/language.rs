// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triton-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triton and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The fixed set of languages a post can carry content for.
///
/// The variant order is both the serialization order of the per-language
/// front-matter blocks and the priority order when picking the first
/// language with content.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Tr,
    De,
    En,
    Nl,
}

impl Language {
    pub const ALL: [Language; 4] = [Language::Tr, Language::De, Language::En, Language::Nl];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tr => "tr",
            Self::De => "de",
            Self::En => "en",
            Self::Nl => "nl",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLanguageError {
    code: String,
}

impl ParseLanguageError {
    pub fn code(&self) -> &str {
        &self.code
    }
}

impl fmt::Display for ParseLanguageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported language code: {}", self.code)
    }
}

impl std::error::Error for ParseLanguageError {}

impl FromStr for Language {
    type Err = ParseLanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tr" => Ok(Self::Tr),
            "de" => Ok(Self::De),
            "en" => Ok(Self::En),
            "nl" => Ok(Self::Nl),
            other => Err(ParseLanguageError {
                code: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Language;

    #[test]
    fn codes_round_trip() {
        for language in Language::ALL {
            assert_eq!(language.as_str().parse::<Language>(), Ok(language));
        }
    }

    #[test]
    fn rejects_unknown_code() {
        assert!("fr".parse::<Language>().is_err());
        assert!("".parse::<Language>().is_err());
        assert!("TR".parse::<Language>().is_err());
    }
}
