// Copyright 2025 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Unique element ids.

use alloc::borrow::Cow;
use alloc::format;
use alloc::string::String;
use core::cell::Cell;

/// Hands out unique ids for ARIA wiring.
///
/// Each generator is an explicit service: ids are unique per generator, so
/// share one generator between everything rendered into the same document.
#[derive(Debug)]
pub struct IdGenerator {
    prefix: Cow<'static, str>,
    next: Cell<u64>,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::with_prefix("floating-ui")
    }
}

impl IdGenerator {
    /// A generator producing `floating-ui-0`, `floating-ui-1`, ...
    pub fn new() -> Self {
        Self::default()
    }

    /// A generator producing `{prefix}-0`, `{prefix}-1`, ...
    pub fn with_prefix(prefix: impl Into<Cow<'static, str>>) -> Self {
        Self {
            prefix: prefix.into(),
            next: Cell::new(0),
        }
    }

    /// The next id.
    pub fn next_id(&self) -> String {
        let n = self.next.get();
        self.next.set(n + 1);
        format!("{}-{n}", self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_sequential_and_prefixed() {
        let ids = IdGenerator::new();
        assert_eq!(ids.next_id(), "floating-ui-0");
        assert_eq!(ids.next_id(), "floating-ui-1");
        let custom = IdGenerator::with_prefix("menu");
        assert_eq!(custom.next_id(), "menu-0");
    }
}
