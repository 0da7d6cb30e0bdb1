// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Asynchronous block transfers between caller frames and on-chip records.
//!
//! The engine never copies block data itself in the pipelined schedules; it
//! submits a [`TransferRequest`] and later polls or waits for it, the way a
//! host drives a DMA channel:
//!
//! ```text
//! submit(req) ──▶ id        (returns immediately)
//! poll(port)               (advances in-flight transfers)
//! is_complete(id)          (completion flag)
//! wait(id, port)           (polls until the flag is set; bounded)
//! ```
//!
//! [`SimulatedDma`] completes each transfer a fixed number of polls after
//! submission and moves the bytes at completion time, so a record read
//! before its transfer has been waited still holds the previous block.

use kernel_ir::TransferShape;
use memory_manager::{MemoryArena, MemoryError, Region};
use std::collections::VecDeque;
use std::fmt;

/// Which way a transfer moves data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferDirection {
    /// Input frame → source block record.
    In,
    /// Sink input record → output frame.
    Out,
}

impl fmt::Display for TransferDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::In => "input",
            Self::Out => "output",
        })
    }
}

/// One 2-D block transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferRequest {
    pub direction: TransferDirection,
    pub block: usize,
    pub shape: TransferShape,
    /// The on-chip block record (already resolved to its ping-pong slot).
    pub record: Region,
}

/// Handle returned by [`TransferEngine::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransferId(u64);

/// The memories a transfer may touch while it is in flight.
pub struct TransferPort<'a> {
    pub arena: &'a mut MemoryArena,
    pub input: &'a [u8],
    pub output: &'a mut [u8],
}

/// Counters kept by a transfer engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct TransferStats {
    pub submitted: u64,
    pub completed: u64,
    pub polls: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
}

impl TransferStats {
    /// Difference between two snapshots.
    pub fn since(&self, earlier: &TransferStats) -> TransferStats {
        TransferStats {
            submitted: self.submitted - earlier.submitted,
            completed: self.completed - earlier.completed,
            polls: self.polls - earlier.polls,
            bytes_in: self.bytes_in - earlier.bytes_in,
            bytes_out: self.bytes_out - earlier.bytes_out,
        }
    }
}

/// Initiate / poll / wait interface of a data-movement engine.
pub trait TransferEngine: Send {
    /// Human-readable engine name.
    fn name(&self) -> &str;

    /// Queues a transfer. Never blocks.
    fn submit(&mut self, request: TransferRequest) -> TransferId;

    /// Advances every in-flight transfer by one step. Transfers that finish
    /// during this step move their bytes through `port`.
    fn poll(&mut self, port: &mut TransferPort<'_>) -> Result<(), MemoryError>;

    /// Whether `id` has finished. Unknown ids count as finished.
    fn is_complete(&self, id: TransferId) -> bool;

    /// Number of transfers still in flight.
    fn in_flight(&self) -> usize;

    fn stats(&self) -> TransferStats;

    /// Polls until `id` completes.
    fn wait(&mut self, id: TransferId, port: &mut TransferPort<'_>) -> Result<(), MemoryError> {
        while !self.is_complete(id) {
            self.poll(port)?;
        }
        Ok(())
    }

    /// Polls until nothing is in flight.
    fn wait_all(&mut self, port: &mut TransferPort<'_>) -> Result<(), MemoryError> {
        while self.in_flight() > 0 {
            self.poll(port)?;
        }
        Ok(())
    }
}

/// Moves one block between a frame and a record, row by row.
pub fn copy_block(request: &TransferRequest, port: &mut TransferPort<'_>) -> Result<(), MemoryError> {
    let shape = &request.shape;
    let record = port.arena.slice_mut(request.record)?;
    if record.len() < shape.record_extent() {
        return Err(MemoryError::LengthMismatch {
            expected: shape.record_extent(),
            actual: record.len(),
        });
    }
    let frame_len = match request.direction {
        TransferDirection::In => port.input.len(),
        TransferDirection::Out => port.output.len(),
    };
    if frame_len < shape.frame_extent() {
        return Err(MemoryError::LengthMismatch {
            expected: shape.frame_extent(),
            actual: frame_len,
        });
    }

    for r in 0..shape.rows {
        let f = shape.frame_offset + r * shape.frame_stride;
        let b = r * shape.record_stride;
        let n = shape.row_bytes;
        match request.direction {
            TransferDirection::In => record[b..b + n].copy_from_slice(&port.input[f..f + n]),
            TransferDirection::Out => port.output[f..f + n].copy_from_slice(&record[b..b + n]),
        }
    }
    Ok(())
}

// ── SimulatedDma ───────────────────────────────────────────────────

struct InFlight {
    id: TransferId,
    request: TransferRequest,
    remaining: u32,
}

/// Transfer engine that completes each transfer `latency` polls after it
/// was submitted, in submission order.
pub struct SimulatedDma {
    latency: u32,
    next_id: u64,
    queue: VecDeque<InFlight>,
    stats: TransferStats,
}

impl SimulatedDma {
    /// `latency` is clamped to at least one poll.
    pub fn new(latency: u32) -> Self {
        Self {
            latency: latency.max(1),
            next_id: 0,
            queue: VecDeque::new(),
            stats: TransferStats::default(),
        }
    }

    pub fn latency(&self) -> u32 {
        self.latency
    }
}

impl Default for SimulatedDma {
    fn default() -> Self {
        Self::new(1)
    }
}

impl TransferEngine for SimulatedDma {
    fn name(&self) -> &str {
        "simulated-dma"
    }

    fn submit(&mut self, request: TransferRequest) -> TransferId {
        let id = TransferId(self.next_id);
        self.next_id += 1;
        self.stats.submitted += 1;
        tracing::trace!(
            "dma submit #{}: {} block {} ({} bytes)",
            id.0,
            request.direction,
            request.block,
            request.shape.bytes(),
        );
        self.queue.push_back(InFlight {
            id,
            request,
            remaining: self.latency,
        });
        id
    }

    fn poll(&mut self, port: &mut TransferPort<'_>) -> Result<(), MemoryError> {
        self.stats.polls += 1;
        for t in self.queue.iter_mut() {
            t.remaining = t.remaining.saturating_sub(1);
        }
        while self.queue.front().is_some_and(|t| t.remaining == 0) {
            let Some(done) = self.queue.pop_front() else {
                break;
            };
            copy_block(&done.request, port)?;
            let bytes = done.request.shape.bytes() as u64;
            match done.request.direction {
                TransferDirection::In => self.stats.bytes_in += bytes,
                TransferDirection::Out => self.stats.bytes_out += bytes,
            }
            self.stats.completed += 1;
            tracing::trace!("dma complete #{}", done.id.0);
        }
        Ok(())
    }

    fn is_complete(&self, id: TransferId) -> bool {
        !self.queue.iter().any(|t| t.id == id)
    }

    fn in_flight(&self) -> usize {
        self.queue.len()
    }

    fn stats(&self) -> TransferStats {
        self.stats
    }
}

impl fmt::Debug for SimulatedDma {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulatedDma")
            .field("latency", &self.latency)
            .field("in_flight", &self.queue.len())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memory_manager::{MemoryMap, MemorySpace};

    fn arena() -> MemoryArena {
        MemoryArena::new(&MemoryMap::default(), [64, 0, 0, 0]).unwrap()
    }

    fn request(direction: TransferDirection, shape: TransferShape) -> TransferRequest {
        TransferRequest {
            direction,
            block: 0,
            shape,
            record: Region::new(MemorySpace::SramA, 0, 16),
        }
    }

    #[test]
    fn test_copy_is_deferred_until_completion() {
        let mut arena = arena();
        let input: Vec<u8> = (1..=16).collect();
        let mut output: Vec<u8> = Vec::new();
        let mut dma = SimulatedDma::new(3);
        let id = dma.submit(request(TransferDirection::In, TransferShape::contiguous(0, 16)));

        let mut port = TransferPort {
            arena: &mut arena,
            input: &input,
            output: &mut output,
        };
        dma.poll(&mut port).unwrap();
        dma.poll(&mut port).unwrap();
        assert!(!dma.is_complete(id));
        assert!(port.arena.slice(Region::new(MemorySpace::SramA, 0, 16)).unwrap().iter().all(|&b| b == 0));

        dma.wait(id, &mut port).unwrap();
        assert!(dma.is_complete(id));
        assert_eq!(port.arena.slice(Region::new(MemorySpace::SramA, 0, 16)).unwrap(), &input[..]);
        assert_eq!(dma.stats().polls, 3);
        assert_eq!(dma.stats().bytes_in, 16);
    }

    #[test]
    fn test_strided_round_trip() {
        let mut arena = arena();
        // 2×2 tile at (1, 1) of a 4-wide frame, record stride 4.
        let shape = TransferShape {
            frame_offset: 5,
            row_bytes: 2,
            rows: 2,
            frame_stride: 4,
            record_stride: 4,
        };
        let input: Vec<u8> = (0..16).collect();
        let mut output = vec![0u8; 16];
        let mut dma = SimulatedDma::default();
        let mut port = TransferPort {
            arena: &mut arena,
            input: &input,
            output: &mut output,
        };
        let a = dma.submit(request(TransferDirection::In, shape));
        dma.wait(a, &mut port).unwrap();
        assert_eq!(&port.arena.slice(Region::new(MemorySpace::SramA, 0, 8)).unwrap()[..], &[5, 6, 0, 0, 9, 10, 0, 0]);

        let b = dma.submit(request(TransferDirection::Out, shape));
        dma.wait_all(&mut port).unwrap();
        assert!(dma.is_complete(b));
        assert_eq!(output[5..7], [5, 6]);
        assert_eq!(output[9..11], [9, 10]);
        assert_eq!(output[0], 0);
    }

    #[test]
    fn test_completion_in_submission_order() {
        let mut arena = arena();
        let input = vec![7u8; 16];
        let mut output = vec![0u8; 16];
        let mut dma = SimulatedDma::new(2);
        let first = dma.submit(request(TransferDirection::In, TransferShape::contiguous(0, 16)));
        let mut port = TransferPort {
            arena: &mut arena,
            input: &input,
            output: &mut output,
        };
        dma.poll(&mut port).unwrap();
        let second = dma.submit(request(TransferDirection::Out, TransferShape::contiguous(0, 16)));
        dma.wait(first, &mut port).unwrap();
        assert!(!dma.is_complete(second));
        assert_eq!(dma.in_flight(), 1);
        dma.wait(second, &mut port).unwrap();
        assert_eq!(output, vec![7u8; 16]);
    }

    #[test]
    fn test_short_frame_is_an_error() {
        let mut arena = arena();
        let mut output: Vec<u8> = Vec::new();
        let mut dma = SimulatedDma::new(1);
        let id = dma.submit(request(TransferDirection::In, TransferShape::contiguous(8, 16)));
        let mut port = TransferPort {
            arena: &mut arena,
            input: &[0u8; 16],
            output: &mut output,
        };
        assert!(matches!(
            dma.wait(id, &mut port),
            Err(MemoryError::LengthMismatch { expected: 24, actual: 16 })
        ));
    }

    #[test]
    fn test_stats_since() {
        let a = TransferStats {
            submitted: 2,
            completed: 1,
            polls: 5,
            bytes_in: 10,
            bytes_out: 0,
        };
        let b = TransferStats {
            submitted: 5,
            completed: 5,
            polls: 9,
            bytes_in: 30,
            bytes_out: 8,
        };
        assert_eq!(b.since(&a).submitted, 3);
        assert_eq!(b.since(&a).bytes_out, 8);
    }
}
