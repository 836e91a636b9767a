// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Retrace-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Retrace and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Stimulus layout: screen images and the typeset text lines of each screen.
//!
//! The assembler only needs two things from a stimulus, so it talks to it through
//! [`StimulusLayout`]. [`StimulusFile`] is the JSON-backed implementation used by the CLI.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::model::{LineBoundaryError, LineBoundarySet, ScreenId, ScreenImage};

pub trait StimulusLayout {
    /// Line boundaries derived from typesetting metadata, used when a visit has no stored lines.
    fn default_line_boundaries(&self, screen_id: ScreenId)
        -> Result<LineBoundarySet, StimulusError>;

    fn screen_image(&self, screen_id: ScreenId) -> Result<ScreenImage, StimulusError>;
}

#[derive(Debug, Error)]
pub enum StimulusError {
    #[error("io error at {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("json error at {path:?}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("stimulus has {screens} screens; screen {screen_id} does not exist")]
    UnknownScreen { screen_id: ScreenId, screens: usize },
    #[error("stimulus has no text lines on screen {screen_id}")]
    NoLines { screen_id: ScreenId },
    #[error("line coordinates of screen {screen_id} overflow when placing boundaries")]
    CoordinateOverflow { screen_id: ScreenId },
    #[error("default line boundaries for screen {screen_id} are invalid: {source}")]
    InvalidBoundaries {
        screen_id: ScreenId,
        source: LineBoundaryError,
    },
}

/// A typeset text line of the stimulus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct StimulusLine {
    pub screen: ScreenId,
    /// `[x, y, width, height]` of the line's bounding box; `y` is the top edge.
    pub bbox: [i32; 4],
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct StimulusScreenJson {
    image: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct StimulusJson {
    linespacing: i32,
    #[serde(default)]
    screens: Vec<StimulusScreenJson>,
    #[serde(default)]
    lines: Vec<StimulusLine>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StimulusFile {
    linespacing: i32,
    screen_images: Vec<PathBuf>,
    lines: Vec<StimulusLine>,
}

impl StimulusFile {
    pub fn new(linespacing: i32, screen_images: Vec<PathBuf>, lines: Vec<StimulusLine>) -> Self {
        Self {
            linespacing,
            screen_images,
            lines,
        }
    }

    /// Reads a stimulus description; relative image paths resolve against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StimulusError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| StimulusError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let json: StimulusJson =
            serde_json::from_str(&raw).map_err(|source| StimulusError::Json {
                path: path.to_path_buf(),
                source,
            })?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let screen_images = json
            .screens
            .into_iter()
            .map(|screen| {
                if screen.image.is_absolute() {
                    screen.image
                } else {
                    base.join(screen.image)
                }
            })
            .collect();

        Ok(Self::new(json.linespacing, screen_images, json.lines))
    }

    pub fn linespacing(&self) -> i32 {
        self.linespacing
    }

    pub fn screen_count(&self) -> usize {
        self.screen_images.len()
    }

    pub fn lines(&self) -> &[StimulusLine] {
        &self.lines
    }
}

impl StimulusLayout for StimulusFile {
    fn default_line_boundaries(
        &self,
        screen_id: ScreenId,
    ) -> Result<LineBoundarySet, StimulusError> {
        let half_spacing = self.linespacing / 2;
        let mut boundaries = self
            .lines
            .iter()
            .filter(|line| line.screen == screen_id)
            .map(|line| {
                line.bbox[1]
                    .checked_sub(half_spacing)
                    .ok_or(StimulusError::CoordinateOverflow { screen_id })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let Some(last) = boundaries.last().copied() else {
            return Err(StimulusError::NoLines { screen_id });
        };
        // Close the last line.
        boundaries.push(
            last.checked_add(self.linespacing)
                .ok_or(StimulusError::CoordinateOverflow { screen_id })?,
        );

        LineBoundarySet::new(boundaries)
            .map_err(|source| StimulusError::InvalidBoundaries { screen_id, source })
    }

    fn screen_image(&self, screen_id: ScreenId) -> Result<ScreenImage, StimulusError> {
        self.screen_images
            .get(screen_id.index())
            .map(ScreenImage::new)
            .ok_or(StimulusError::UnknownScreen {
                screen_id,
                screens: self.screen_images.len(),
            })
    }
}
