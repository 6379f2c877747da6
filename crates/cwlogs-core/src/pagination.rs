// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::error::PageError;

/// Result of fetching one page of a paginated API.
///
/// Exhaustion and failure are kept apart so callers never mistake an error for the end of
/// the data.
#[derive(Debug)]
pub enum PageOutcome {
    /// More pages follow; pass the cursor to the next call.
    HasMore(String),
    /// The sequence is complete.
    Exhausted,
    /// The sequence ended early.
    Failed(PageError),
}

impl PageOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, PageOutcome::Failed(_))
    }

    /// Cursor for the next call, if any.
    pub fn next_cursor(&self) -> Option<&str> {
        match self {
            PageOutcome::HasMore(cursor) => Some(cursor),
            PageOutcome::Exhausted | PageOutcome::Failed(_) => None,
        }
    }
}
