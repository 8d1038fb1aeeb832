//! Packed `(timestamp, chainId, block, txn)` ordering keys.
//!
//! A block order is rendered as fixed-width lowercase hex so that
//! lexicographic comparison of two keys packed against the same epoch
//! equals chronological comparison. Sort-by-key relies on this.
//!
//! With an epoch (the block order of a known ancestor Topic) the
//! timestamp and block fields are stored at half width after the epoch
//! values are subtracted, keeping identifiers compact for deep threads.

use serde::{Deserialize, Serialize};

use crate::error::BlockOrderError;

/// Hex digits per field at canonical width.
const TIMESTAMP_WIDTH: usize = 12; // 48 bits
const CHAIN_WIDTH: usize = 4; // 16 bits
const BLOCK_WIDTH: usize = 12; // 48 bits
const TXN_WIDTH: usize = 4; // 16 bits

/// Hex digits for the halved fields under an epoch.
const EPOCH_TIMESTAMP_WIDTH: usize = 6; // 24 bits
const EPOCH_BLOCK_WIDTH: usize = 6; // 24 bits

/// Total widths; parse disambiguates the two layouts by length.
pub const CANONICAL_LEN: usize = TIMESTAMP_WIDTH + CHAIN_WIDTH + BLOCK_WIDTH + TXN_WIDTH;
pub const EPOCH_LEN: usize = EPOCH_TIMESTAMP_WIDTH + CHAIN_WIDTH + EPOCH_BLOCK_WIDTH + TXN_WIDTH;

const TIMESTAMP_MASK: u64 = (1 << 48) - 1;
const BLOCK_MASK: u64 = (1 << 48) - 1;
const EPOCH_TIMESTAMP_MASK: u64 = (1 << 24) - 1;
const EPOCH_BLOCK_MASK: u64 = (1 << 24) - 1;

/// The unpacked ordering tuple.
///
/// Timestamps are unix seconds. Values beyond the field widths (2^48-1
/// for timestamp/block, 2^16-1 for chainId/txn) are a caller contract;
/// the codec masks them rather than erroring so packing stays total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockOrder {
    pub timestamp: u64,
    pub chain_id: u16,
    pub block: u64,
    pub txn: u16,
}

/// Result of parsing a packed key: the tuple, the input as given, and
/// the re-derived canonical (non-epoch) rendering used for storage and
/// comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBlockOrder {
    pub order: BlockOrder,
    pub packed: String,
    pub canonical: String,
}

impl BlockOrder {
    pub fn new(timestamp: u64, chain_id: u16, block: u64, txn: u16) -> Self {
        Self {
            timestamp,
            chain_id,
            block,
            txn,
        }
    }

    /// The all-zero order used by id normalization.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Canonical all-zero rendering.
    pub fn zero_packed() -> String {
        "0".repeat(CANONICAL_LEN)
    }

    /// Pack into fixed-width hex. With an epoch, the epoch's timestamp
    /// and block are subtracted (floored at 0) and those fields are
    /// written at half width.
    pub fn pack(&self, epoch: Option<&BlockOrder>) -> String {
        match epoch {
            None => format!(
                "{:0tw$x}{:0cw$x}{:0bw$x}{:0xw$x}",
                self.timestamp & TIMESTAMP_MASK,
                self.chain_id,
                self.block & BLOCK_MASK,
                self.txn,
                tw = TIMESTAMP_WIDTH,
                cw = CHAIN_WIDTH,
                bw = BLOCK_WIDTH,
                xw = TXN_WIDTH,
            ),
            Some(epoch) => {
                let timestamp = self.timestamp.saturating_sub(epoch.timestamp);
                let block = self.block.saturating_sub(epoch.block);
                format!(
                    "{:0tw$x}{:0cw$x}{:0bw$x}{:0xw$x}",
                    timestamp & EPOCH_TIMESTAMP_MASK,
                    self.chain_id,
                    block & EPOCH_BLOCK_MASK,
                    self.txn,
                    tw = EPOCH_TIMESTAMP_WIDTH,
                    cw = CHAIN_WIDTH,
                    bw = EPOCH_BLOCK_WIDTH,
                    xw = TXN_WIDTH,
                )
            }
        }
    }

    /// Inverse of [`BlockOrder::pack`]. Epoch offsets are re-added and a
    /// canonical (non-epoch) rendering is derived for storage.
    pub fn parse(
        packed: &str,
        epoch: Option<&BlockOrder>,
    ) -> Result<ParsedBlockOrder, BlockOrderError> {
        if !packed.is_ascii() {
            return Err(BlockOrderError::InvalidHex(packed.to_string()));
        }
        let (tw, bw, compressed) = match packed.len() {
            CANONICAL_LEN => (TIMESTAMP_WIDTH, BLOCK_WIDTH, false),
            EPOCH_LEN => (EPOCH_TIMESTAMP_WIDTH, EPOCH_BLOCK_WIDTH, true),
            other => return Err(BlockOrderError::InvalidLength(other)),
        };
        if compressed && epoch.is_none() {
            return Err(BlockOrderError::EpochRequired);
        }

        let mut offset = 0;
        let mut field = |width: usize| -> Result<u64, BlockOrderError> {
            let slice = &packed[offset..offset + width];
            offset += width;
            u64::from_str_radix(slice, 16)
                .map_err(|_| BlockOrderError::InvalidHex(slice.to_string()))
        };

        let mut timestamp = field(tw)?;
        let chain_id = field(CHAIN_WIDTH)? as u16;
        let mut block = field(bw)?;
        let txn = field(TXN_WIDTH)? as u16;

        if compressed {
            let epoch = epoch.ok_or(BlockOrderError::EpochRequired)?;
            timestamp += epoch.timestamp;
            block += epoch.block;
        }

        let order = BlockOrder::new(timestamp, chain_id, block, txn);
        Ok(ParsedBlockOrder {
            canonical: order.pack(None),
            packed: packed.to_string(),
            order,
        })
    }
}
