//! Load generator producing records for the inserters.

use crate::error::BenchError;
use crate::model::{
    AutoIncrementRecord, HighResTimestampRecord, IdentityRecord, Record, TimestampRecord,
    TypeTag, UuidRecord, Variant,
};
use chrono::Utc;
use rand::Rng;
use tokio::sync::mpsc::Sender;
use tracing::debug;

/// Build one record of `variant`.
///
/// `tag` is only used by variants that carry a type tag. High resolution
/// records read the clock exactly once.
pub fn build_record(variant: Variant, tag: TypeTag) -> Record {
    match variant {
        Variant::AutoIncrement => Record::AutoIncrement(AutoIncrementRecord { id: None, kind: tag }),
        Variant::Uuid => Record::Uuid(UuidRecord { id: None }),
        Variant::Identity => Record::Identity(IdentityRecord { id: None, kind: tag }),
        Variant::Timestamp => Record::Timestamp(TimestampRecord { created_at: None }),
        Variant::HighResTimestamp => {
            Record::HighResTimestamp(HighResTimestampRecord::from_instant(Utc::now()))
        }
    }
}

/// Build `count` records the way a single generator invocation would.
///
/// The type tag is drawn once and shared by every record in the batch.
pub fn build_batch<R: Rng + ?Sized>(variant: Variant, count: u64, rng: &mut R) -> Vec<Record> {
    let tag = TypeTag::random(rng);
    (0..count).map(|_| build_record(variant, tag)).collect()
}

/// Produces a fixed number of records of one variant per invocation.
pub struct LoadGenerator<R> {
    id: usize,
    variant: Variant,
    rng: R,
}

impl<R: Rng + Send> LoadGenerator<R> {
    /// Create a generator drawing its randomness from `rng`.
    pub fn new(id: usize, variant: Variant, rng: R) -> Self {
        Self { id, variant, rng }
    }

    /// Push exactly `count` records onto `output`, waiting on each send.
    ///
    /// Returns the number of records handed off.
    pub async fn generate(&mut self, count: u64, output: &Sender<Record>) -> Result<u64, BenchError> {
        let tag = TypeTag::random(&mut self.rng);
        debug!(
            "Generator {} producing {} {} records (type={})",
            self.id, count, self.variant, tag
        );

        for _ in 0..count {
            output
                .send(build_record(self.variant, tag))
                .await
                .map_err(|_| BenchError::ChannelClosed(self.id))?;
        }

        debug!("Generator {} finished", self.id);
        Ok(count)
    }
}
