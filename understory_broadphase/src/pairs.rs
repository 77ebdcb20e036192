// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pair keys and callback dispatch shared by the broad phases.

use core::fmt;

use crate::types::{Handle, PairCallback, UnpairCallback};

/// Unordered pair of handles, stored lower handle first.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct PairKey(Handle, Handle);

impl PairKey {
    #[inline]
    pub(crate) fn new(a: Handle, b: Handle) -> Self {
        if a <= b { Self(a, b) } else { Self(b, a) }
    }

    #[inline]
    pub(crate) fn handles(self) -> (Handle, Handle) {
        (self.0, self.1)
    }
}

/// Owner and sub-index of one side of a pair, as passed to callbacks.
pub(crate) type Side<O> = (O, u32);

/// The installed pair and unpair callbacks.
pub(crate) struct Callbacks<O, U> {
    pair: Option<PairCallback<O, U>>,
    unpair: Option<UnpairCallback<O, U>>,
}

impl<O, U> Default for Callbacks<O, U> {
    fn default() -> Self {
        Self {
            pair: None,
            unpair: None,
        }
    }
}

impl<O, U> fmt::Debug for Callbacks<O, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("pair", &self.pair.is_some())
            .field("unpair", &self.unpair.is_some())
            .finish()
    }
}

impl<O: Copy, U> Callbacks<O, U> {
    pub(crate) fn set_pair(&mut self, callback: PairCallback<O, U>) {
        self.pair = Some(callback);
    }

    pub(crate) fn set_unpair(&mut self, callback: UnpairCallback<O, U>) {
        self.unpair = Some(callback);
    }

    /// Fire the pair callback; `None` when none is installed.
    pub(crate) fn pair(&mut self, a: Side<O>, b: Side<O>) -> Option<U> {
        self.pair.as_mut().and_then(|cb| cb(a.0, a.1, b.0, b.1))
    }

    pub(crate) fn unpair(&mut self, a: Side<O>, b: Side<O>, user_data: Option<U>) {
        if let Some(cb) = self.unpair.as_mut() {
            cb(a.0, a.1, b.0, b.1, user_data);
        }
    }
}
