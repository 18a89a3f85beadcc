use thiserror::Error;

/// Errors raised by the combined-identifier codec.
///
/// Any of these would mean silently corrupted output if let through, so they
/// all abort the run.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The multiplier must exceed every point identifier in the input.
    #[error("max_point_id must be non-negative, got {0}")]
    InvalidMaxPointId(i64),
    /// A point identifier outside `0..=max_point_id` would collide with
    /// another sync index after encoding.
    #[error("point_id {point_id} outside 0..={max_point_id}; combined ids would collide")]
    PointIdOutOfRange { point_id: i64, max_point_id: i64 },
    /// A sync index must be non-negative for the encoding to be invertible.
    #[error("sync_index must be non-negative, got {0}")]
    InvalidSyncIndex(i64),
    /// The combined identifier does not fit in an i64.
    #[error("combined id overflows i64 for sync_index {sync_index}, point_id {point_id}")]
    Overflow { sync_index: i64, point_id: i64 },
}

/// Invertible mapping between `(sync_index, point_id)` and one combined
/// identifier: `combined = sync_index * (max_point_id + 1) + point_id`.
///
/// The batched assembler uses this to fold every bundle into a single
/// virtual one. Correctness hinges on the multiplier exceeding every point
/// identifier anywhere in the input, so `encode` validates its arguments
/// instead of trusting the caller.
#[derive(Clone, Copy, Debug)]
pub struct PointIdCodec {
    max_point_id: i64,
    multiplier: i64,
}

impl PointIdCodec {
    pub fn new(max_point_id: i64) -> Result<Self, CodecError> {
        if max_point_id < 0 {
            return Err(CodecError::InvalidMaxPointId(max_point_id));
        }
        let multiplier = max_point_id
            .checked_add(1)
            .ok_or(CodecError::InvalidMaxPointId(max_point_id))?;
        Ok(Self {
            max_point_id,
            multiplier,
        })
    }

    pub fn encode(&self, sync_index: i64, point_id: i64) -> Result<i64, CodecError> {
        if sync_index < 0 {
            return Err(CodecError::InvalidSyncIndex(sync_index));
        }
        if point_id < 0 || point_id > self.max_point_id {
            return Err(CodecError::PointIdOutOfRange {
                point_id,
                max_point_id: self.max_point_id,
            });
        }
        sync_index
            .checked_mul(self.multiplier)
            .and_then(|base| base.checked_add(point_id))
            .ok_or(CodecError::Overflow {
                sync_index,
                point_id,
            })
    }

    pub fn decode(&self, combined: i64) -> (i64, i64) {
        (combined / self.multiplier, combined % self.multiplier)
    }
}
