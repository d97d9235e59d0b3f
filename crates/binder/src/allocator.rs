//! # Sibling Allocator
//!
//! Chooses the number (final path segment) for a new sibling so that inserting
//! never forces the existing siblings to be renamed.
//!
//! ## Tiered Gaps
//!
//! Numbers are sparse. Between two bounds, the allocator prefers:
//!
//! 1. the smallest multiple of 100 strictly inside the range,
//! 2. else the smallest multiple of 10,
//! 3. else the next integer after the lower bound.
//!
//! So typical edits keep numbers round for as long as possible:
//!
//! ```text
//! []                      -> 100
//! [100]                   -> 200
//! [100 .. 900]            -> 910
//! before 200 in [100,200] -> 110
//! ```
//!
//! When the numbers around an insertion point become tight the allocator
//! reports [`AllocError::NoSlotAvailable`]; the fix is to compact the sibling
//! set ([`compact_numbers`]), which resets it to uniform 100-spacing.
//!
//! ## Bounds
//!
//! `0` and `1000` are the implicit outer bounds (neither is a valid segment).
//! A set holding 999 siblings is full regardless of where the caller wants to
//! insert.
//!
//! Everything here is pure: slices in, numbers out.

use crate::error::AllocError;
use crate::path::MAX_SEGMENT;

const LOWER_BOUND: u16 = 0;
const UPPER_BOUND: u16 = MAX_SEGMENT + 1;
const CAPACITY: usize = MAX_SEGMENT as usize;
const MAX_COMPACT: usize = 9;

/// The roundest value strictly between `low` and `high`.
pub fn find_gap(low: u16, high: u16) -> Option<u16> {
    if high <= low.saturating_add(1) {
        return None;
    }
    for step in [100u16, 10] {
        match (low / step + 1).checked_mul(step) {
            Some(candidate) if candidate < high => return Some(candidate),
            _ => {}
        }
    }
    Some(low + 1)
}

/// 100, 10 or 1: how round a number is.
pub fn tier(value: u16) -> u16 {
    if value % 100 == 0 {
        100
    } else if value % 10 == 0 {
        10
    } else {
        1
    }
}

/// A number after every occupied one.
pub fn next_sibling_number(occupied: &[u16]) -> Result<u16, AllocError> {
    let sorted = prepare(occupied)?;
    let Some(&max) = sorted.last() else {
        return Ok(100);
    };
    find_gap(max, UPPER_BOUND).ok_or(AllocError::NoSlotAvailable {
        low: max,
        high: UPPER_BOUND,
    })
}

/// A number between `target` and its predecessor.
pub fn sibling_number_before(occupied: &[u16], target: u16) -> Result<u16, AllocError> {
    let sorted = prepare(occupied)?;
    let predecessor = sorted
        .iter()
        .rev()
        .find(|&&v| v < target)
        .copied()
        .unwrap_or(LOWER_BOUND);
    find_gap(predecessor, target).ok_or(AllocError::NoSlotAvailable {
        low: predecessor,
        high: target,
    })
}

/// A number after `target`, preferring the coarser of two gaps.
///
/// Computes the gap directly after `target` and, when `target` has a
/// successor, the gap after that successor. The skipped gap wins only if its
/// tier is strictly coarser; ties go to the direct gap. Note the result can
/// land after the successor. Callers that must keep `target`'s successor
/// ordering use [`sibling_number_directly_after`].
pub fn sibling_number_after(occupied: &[u16], target: u16) -> Result<u16, AllocError> {
    let sorted = prepare(occupied)?;
    let successor = successor_of(&sorted, target);
    let direct = find_gap(target, successor);

    let skipped = if successor < UPPER_BOUND {
        find_gap(successor, successor_of(&sorted, successor))
    } else {
        None
    };

    match (direct, skipped) {
        (Some(d), Some(s)) if tier(s) > tier(d) => Ok(s),
        (Some(d), _) => Ok(d),
        (None, Some(s)) => Ok(s),
        (None, None) => Err(AllocError::NoSlotAvailable {
            low: target,
            high: successor,
        }),
    }
}

/// A number strictly between `target` and its successor.
pub fn sibling_number_directly_after(occupied: &[u16], target: u16) -> Result<u16, AllocError> {
    let sorted = prepare(occupied)?;
    let successor = successor_of(&sorted, target);
    find_gap(target, successor).ok_or(AllocError::NoSlotAvailable {
        low: target,
        high: successor,
    })
}

/// `[100, 200, ..., count * 100]`.
pub fn compact_numbers(count: usize) -> Result<Vec<u16>, AllocError> {
    if count > MAX_COMPACT {
        return Err(AllocError::MaxSiblingsReached);
    }
    Ok((1..=count as u16).map(|i| i * 100).collect())
}

fn prepare(occupied: &[u16]) -> Result<Vec<u16>, AllocError> {
    if occupied.len() >= CAPACITY {
        return Err(AllocError::MaxSiblingsReached);
    }
    let mut sorted = occupied.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    Ok(sorted)
}

fn successor_of(sorted: &[u16], value: u16) -> u16 {
    sorted
        .iter()
        .find(|&&v| v > value)
        .copied()
        .unwrap_or(UPPER_BOUND)
}
