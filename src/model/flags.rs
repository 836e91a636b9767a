// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Retrace-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Retrace and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use thiserror::Error;

/// Review metadata for one trial.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrialFlags {
    pub edited: bool,
    pub is_wrong: bool,
    pub wrong_answer_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FlagsError {
    #[error("wrong answer count {count} exceeds the {question_count} questions of the trial")]
    TooManyWrongAnswers { count: u32, question_count: u32 },
}

impl TrialFlags {
    pub fn mark_edited(&mut self) {
        self.edited = true;
    }

    /// Flipping the wrong flag counts as a review of the trial.
    pub fn toggle_wrong(&mut self) {
        self.is_wrong = !self.is_wrong;
        self.edited = true;
    }

    pub fn set_wrong_answer_count(
        &mut self,
        count: u32,
        question_count: u32,
    ) -> Result<(), FlagsError> {
        if count > question_count {
            return Err(FlagsError::TooManyWrongAnswers {
                count,
                question_count,
            });
        }
        self.wrong_answer_count = count;
        Ok(())
    }

    /// Short status shown next to the trial name in listings.
    pub fn status_marker(&self) -> String {
        let mut marker = String::new();
        if self.edited {
            marker.push_str(if self.is_wrong { "\u{274C} " } else { "\u{2705} " });
        }
        if self.wrong_answer_count > 0 {
            marker.push_str(&format!("\u{2b55} {} ", self.wrong_answer_count));
        }
        marker
    }
}

#[cfg(test)]
mod tests {
    use super::{FlagsError, TrialFlags};

    #[test]
    fn toggle_wrong_marks_edited() {
        let mut flags = TrialFlags::default();
        flags.toggle_wrong();
        assert!(flags.is_wrong);
        assert!(flags.edited);
        flags.toggle_wrong();
        assert!(!flags.is_wrong);
        assert!(flags.edited);
    }

    #[test]
    fn wrong_answer_count_is_bounded_by_questions() {
        let mut flags = TrialFlags::default();
        flags.set_wrong_answer_count(2, 3).unwrap();
        assert_eq!(flags.wrong_answer_count, 2);
        assert_eq!(
            flags.set_wrong_answer_count(4, 3),
            Err(FlagsError::TooManyWrongAnswers {
                count: 4,
                question_count: 3
            })
        );
        assert_eq!(flags.wrong_answer_count, 2);
    }

    #[test]
    fn status_marker_reflects_review_state() {
        let mut flags = TrialFlags::default();
        assert_eq!(flags.status_marker(), "");
        flags.mark_edited();
        assert_eq!(flags.status_marker(), "\u{2705} ");
        flags.is_wrong = true;
        flags.wrong_answer_count = 1;
        assert_eq!(flags.status_marker(), "\u{274C} \u{2b55} 1 ");
    }
}
