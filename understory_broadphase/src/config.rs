// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hash grid tuning parameters.

use crate::error::BroadPhaseError;

/// Bucket counts for the cell hash table.
const PRIMES: [u32; 29] = [
    5, 13, 23, 47, 97, 193, 389, 769, 1543, 3079, 6151, 12289, 24593, 49157, 98317, 196613, 393241,
    786433, 1572869, 3145739, 6291469, 12582917, 25165843, 50331653, 100663319, 201326611,
    402653189, 805306457, 1610612741,
];

/// Tuning for [`HashGrid`](crate::HashGrid).
///
/// None of these values change query results or pair state; they only trade
/// memory against time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HashGridConfig {
    /// Edge length of a square grid cell, in world units. Must be non-zero.
    pub cell_size: u32,
    /// Requested bucket count; the table uses the next prime above it.
    pub hash_table_size: u32,
    /// Entries covering more than this many cells skip the grid and are
    /// checked against every other entry instead.
    pub large_object_min_surface: u32,
}

impl Default for HashGridConfig {
    fn default() -> Self {
        Self {
            cell_size: 128,
            hash_table_size: 4096,
            large_object_min_surface: 512,
        }
    }
}

impl HashGridConfig {
    /// Set the cell edge length.
    #[must_use]
    pub const fn with_cell_size(mut self, cell_size: u32) -> Self {
        self.cell_size = cell_size;
        self
    }

    /// Set the requested bucket count.
    #[must_use]
    pub const fn with_hash_table_size(mut self, hash_table_size: u32) -> Self {
        self.hash_table_size = hash_table_size;
        self
    }

    /// Set the large-object threshold, in cells.
    #[must_use]
    pub const fn with_large_object_min_surface(mut self, surface: u32) -> Self {
        self.large_object_min_surface = surface;
        self
    }

    /// Number of buckets the table will actually use.
    pub fn bucket_count(&self) -> usize {
        larger_prime(self.hash_table_size) as usize
    }

    pub(crate) fn validate(&self) -> Result<(), BroadPhaseError> {
        if self.cell_size == 0 {
            return Err(BroadPhaseError::InvalidConfig("cell_size must be non-zero"));
        }
        Ok(())
    }
}

/// First prime from the table strictly greater than `n`, saturating at the
/// largest entry.
fn larger_prime(n: u32) -> u32 {
    PRIMES
        .iter()
        .copied()
        .find(|&p| p > n)
        .unwrap_or(PRIMES[PRIMES.len() - 1])
}
