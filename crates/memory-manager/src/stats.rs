// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Arena access statistics.
//!
//! [`ArenaStats`] counts the bulk data movement that went through an
//! arena: explicit writes and reads against caller buffers, region to
//! region copies, and fills (context scrubbing). Per-element kernel
//! accesses through borrowed slices are not counted.

/// Cumulative statistics about arena traffic.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ArenaStats {
    /// Bytes written from caller buffers into the arena.
    pub bytes_written: u64,
    /// Bytes read from the arena into caller buffers.
    pub bytes_read: u64,
    /// Number of region-to-region copies.
    pub copies: u64,
    /// Bytes moved by region-to-region copies.
    pub bytes_copied: u64,
    /// Number of fill operations.
    pub fills: u64,
    /// Bytes touched by fill operations.
    pub bytes_filled: u64,
}

impl ArenaStats {
    pub(crate) fn record_write(&mut self, bytes: usize) {
        self.bytes_written += bytes as u64;
    }

    pub(crate) fn record_read(&mut self, bytes: usize) {
        self.bytes_read += bytes as u64;
    }

    pub(crate) fn record_copy(&mut self, bytes: usize) {
        self.copies += 1;
        self.bytes_copied += bytes as u64;
    }

    pub(crate) fn record_fill(&mut self, bytes: usize) {
        self.fills += 1;
        self.bytes_filled += bytes as u64;
    }

    /// Total bytes moved in or out of the arena, fills excluded.
    pub fn total_traffic(&self) -> u64 {
        self.bytes_written + self.bytes_read + self.bytes_copied
    }

    /// Returns a human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "Arena traffic: {} B written, {} B read, {} copies ({} B), {} fills ({} B)",
            self.bytes_written,
            self.bytes_read,
            self.copies,
            self.bytes_copied,
            self.fills,
            self.bytes_filled,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let s = ArenaStats::default();
        assert_eq!(s.total_traffic(), 0);
        assert_eq!(s.copies, 0);
    }

    #[test]
    fn test_traffic() {
        let mut s = ArenaStats::default();
        s.record_write(100);
        s.record_read(50);
        s.record_copy(25);
        s.record_fill(1000);
        assert_eq!(s.total_traffic(), 175);
        assert_eq!(s.bytes_filled, 1000);
    }

    #[test]
    fn test_summary() {
        let mut s = ArenaStats::default();
        s.record_copy(64);
        s.record_copy(64);
        let summary = s.summary();
        assert!(summary.contains("2 copies (128 B)"));
    }
}
