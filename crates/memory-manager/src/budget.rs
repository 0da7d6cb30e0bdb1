// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Capacity of a single memory space, with human-readable parsing.
//!
//! On-chip tiers are sized in kilobytes and external memory in megabytes,
//! so configuration files write capacities as `"32K"` or `"16M"`.

use crate::MemoryError;
use std::fmt;

const KB: usize = 1024;
const MB: usize = 1024 * KB;
const GB: usize = 1024 * MB;

/// Suffixes accepted by [`MemoryBudget::parse`], longest first.
const SUFFIXES: [(&str, usize); 7] = [
    ("GB", GB),
    ("MB", MB),
    ("KB", KB),
    ("G", GB),
    ("M", MB),
    ("K", KB),
    ("B", 1),
];

/// Byte capacity of a memory space.
///
/// # Parsing
/// - `"32K"` or `"32KB"` → 32 × 1024 bytes
/// - `"16M"` or `"16MB"` → 16 × 1024² bytes
/// - `"1G"` or `"1GB"` → 1024³ bytes
/// - `"4096"` → raw byte count
///
/// # Examples
/// ```
/// use memory_manager::MemoryBudget;
///
/// let b = MemoryBudget::from_kb(32);
/// assert_eq!(b.as_bytes(), 32 * 1024);
///
/// let b = MemoryBudget::parse("16M").unwrap();
/// assert_eq!(b.as_kb(), 16 * 1024);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MemoryBudget {
    bytes: usize,
}

impl MemoryBudget {
    /// Creates a budget from a byte count.
    pub fn from_bytes(bytes: usize) -> Self {
        Self { bytes }
    }

    /// Creates a budget from kilobytes.
    pub fn from_kb(kb: usize) -> Self {
        Self { bytes: kb * KB }
    }

    /// Creates a budget from megabytes.
    pub fn from_mb(mb: usize) -> Self {
        Self { bytes: mb * MB }
    }

    /// Returns the budget in bytes.
    pub fn as_bytes(&self) -> usize {
        self.bytes
    }

    /// Returns the budget in kilobytes (truncated).
    pub fn as_kb(&self) -> usize {
        self.bytes / KB
    }

    /// Parses a human-readable capacity string. Case-insensitive.
    ///
    /// A capacity of zero is accepted: it describes a space the target
    /// does not have, and any record placed there fails planning.
    pub fn parse(s: &str) -> Result<Self, MemoryError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(MemoryError::InvalidBudget(s.to_string()));
        }

        let upper = trimmed.to_uppercase();
        let (digits, multiplier) = SUFFIXES
            .iter()
            .find(|(suffix, _)| upper.ends_with(suffix))
            .map(|&(suffix, mult)| (&trimmed[..trimmed.len() - suffix.len()], mult))
            .unwrap_or((trimmed, 1));

        let value: usize = digits
            .trim()
            .parse()
            .map_err(|_| MemoryError::InvalidBudget(s.to_string()))?;

        value
            .checked_mul(multiplier)
            .map(Self::from_bytes)
            .ok_or_else(|| MemoryError::InvalidBudget(format!("{s} (overflow)")))
    }
}

impl fmt::Display for MemoryBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bytes {
            b if b >= GB && b % GB == 0 => write!(f, "{} GB", b / GB),
            b if b >= MB && b % MB == 0 => write!(f, "{} MB", b / MB),
            b if b >= KB && b % KB == 0 => write!(f, "{} KB", b / KB),
            b => write!(f, "{b} B"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_kb() {
        let b = MemoryBudget::from_kb(32);
        assert_eq!(b.as_bytes(), 32768);
        assert_eq!(b.as_kb(), 32);
    }

    #[test]
    fn test_parse_kilobytes() {
        assert_eq!(MemoryBudget::parse("32K").unwrap().as_bytes(), 32 * 1024);
        assert_eq!(MemoryBudget::parse("32kb").unwrap().as_bytes(), 32 * 1024);
    }

    #[test]
    fn test_parse_megabytes() {
        assert_eq!(MemoryBudget::parse("16M").unwrap().as_bytes(), 16 * MB);
        assert_eq!(MemoryBudget::parse("16MB").unwrap().as_bytes(), 16 * MB);
    }

    #[test]
    fn test_parse_raw_and_byte_suffix() {
        assert_eq!(MemoryBudget::parse("4096").unwrap().as_bytes(), 4096);
        assert_eq!(MemoryBudget::parse("100B").unwrap().as_bytes(), 100);
        assert_eq!(MemoryBudget::parse("  8K ").unwrap().as_bytes(), 8192);
    }

    #[test]
    fn test_parse_zero_is_allowed() {
        assert_eq!(MemoryBudget::parse("0").unwrap().as_bytes(), 0);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(MemoryBudget::parse("").is_err());
        assert!(MemoryBudget::parse("abc").is_err());
        assert!(MemoryBudget::parse("12Q").is_err());
        assert!(MemoryBudget::parse("99999999999999999999G").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(MemoryBudget::from_mb(2048).to_string(), "2 GB");
        assert_eq!(MemoryBudget::from_mb(16).to_string(), "16 MB");
        assert_eq!(MemoryBudget::from_kb(32).to_string(), "32 KB");
        assert_eq!(MemoryBudget::from_bytes(100).to_string(), "100 B");
    }

    #[test]
    fn test_serde_roundtrip() {
        let b = MemoryBudget::from_kb(48);
        let json = serde_json::to_string(&b).unwrap();
        let back: MemoryBudget = serde_json::from_str(&json).unwrap();
        assert_eq!(b, back);
    }
}
