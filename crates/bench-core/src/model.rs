//! Record variants benchmarked by the harness.
//!
//! Each variant maps to exactly one table. Primary keys are always assigned
//! by the database (or absent), so every record produced by a generator
//! carries `None` in its key slot.

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Alphabet used for the categorical `type` column.
pub const TYPE_ALPHABET: [&str; 7] = ["a", "b", "c", "d", "e", "f", "g"];

/// The closed set of record shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// `BIGSERIAL` id plus a type tag.
    AutoIncrement,
    /// Database-generated UUID id.
    Uuid,
    /// `GENERATED ALWAYS AS IDENTITY` id plus a type tag.
    Identity,
    /// Single `timestamptz` column filled by the database default.
    Timestamp,
    /// Creation instant split into whole seconds and nanoseconds.
    HighResTimestamp,
}

/// Sort direction of a recency column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

impl Variant {
    /// All variants, in declaration order.
    pub fn all() -> [Variant; 5] {
        [
            Variant::AutoIncrement,
            Variant::Uuid,
            Variant::Identity,
            Variant::Timestamp,
            Variant::HighResTimestamp,
        ]
    }

    /// Table backing this variant.
    pub fn table_name(&self) -> &'static str {
        match self {
            Variant::AutoIncrement => "big_serial_model",
            Variant::Uuid => "uuid_model",
            Variant::Identity => "identity_model",
            Variant::Timestamp => "timestamped_model",
            Variant::HighResTimestamp => "nanosecond_model",
        }
    }

    /// Whether records of this variant carry a [`TypeTag`].
    pub fn has_type_tag(&self) -> bool {
        matches!(self, Variant::AutoIncrement | Variant::Identity)
    }

    /// Columns that order rows from newest to oldest.
    ///
    /// UUID ids are random, so that variant has no usable recency key.
    pub fn recency_order(&self) -> Option<&'static [(&'static str, Order)]> {
        match self {
            Variant::AutoIncrement | Variant::Identity => Some(&[("id", Order::Desc)]),
            Variant::Timestamp => Some(&[("created_at", Order::Desc)]),
            Variant::HighResTimestamp => Some(&[
                ("created_at_seconds", Order::Desc),
                ("created_at_nanos", Order::Desc),
            ]),
            Variant::Uuid => None,
        }
    }

    /// Poll interval used by the periodic reader when none is configured.
    pub fn default_reader_interval(&self) -> Duration {
        match self {
            Variant::AutoIncrement | Variant::HighResTimestamp => Duration::from_millis(500),
            Variant::Uuid | Variant::Identity | Variant::Timestamp => Duration::from_secs(1),
        }
    }

    /// Prefix used in progress lines, e.g. `BigSerialInserter started...`.
    pub fn worker_label(&self) -> &'static str {
        match self {
            Variant::AutoIncrement => "BigSerial",
            Variant::Uuid => "UUID",
            Variant::Identity => "Identity",
            Variant::Timestamp => "Timestamped",
            Variant::HighResTimestamp => "Nano",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Variant::AutoIncrement => "auto-increment",
            Variant::Uuid => "uuid",
            Variant::Identity => "identity",
            Variant::Timestamp => "timestamp",
            Variant::HighResTimestamp => "high-res-timestamp",
        };
        f.write_str(name)
    }
}

/// Categorical tag stored in the `type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TypeTag(&'static str);

impl TypeTag {
    /// Draw a tag uniformly from [`TYPE_ALPHABET`].
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        TypeTag(TYPE_ALPHABET[rng.gen_range(0..TYPE_ALPHABET.len())])
    }

    /// Look up a tag by its letter.
    pub fn from_letter(letter: &str) -> Option<Self> {
        TYPE_ALPHABET
            .into_iter()
            .find(|candidate| *candidate == letter)
            .map(TypeTag)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutoIncrementRecord {
    pub id: Option<i64>,
    pub kind: TypeTag,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UuidRecord {
    pub id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentityRecord {
    pub id: Option<i64>,
    pub kind: TypeTag,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimestampRecord {
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighResTimestampRecord {
    pub created_at_seconds: i64,
    pub created_at_nanos: u32,
}

impl HighResTimestampRecord {
    /// Split one instant into its seconds and sub-second nanoseconds.
    pub fn from_instant(instant: DateTime<Utc>) -> Self {
        Self {
            created_at_seconds: instant.timestamp(),
            created_at_nanos: instant.timestamp_subsec_nanos(),
        }
    }

    /// Reassemble the instant this record was built from.
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.created_at_seconds, self.created_at_nanos)
    }
}

/// Database-assigned primary key value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryKey {
    Int(i64),
    Uuid(Uuid),
}

/// A work unit: one synthesized row awaiting insertion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum Record {
    AutoIncrement(AutoIncrementRecord),
    Uuid(UuidRecord),
    Identity(IdentityRecord),
    Timestamp(TimestampRecord),
    HighResTimestamp(HighResTimestampRecord),
}

impl Record {
    pub fn variant(&self) -> Variant {
        match self {
            Record::AutoIncrement(_) => Variant::AutoIncrement,
            Record::Uuid(_) => Variant::Uuid,
            Record::Identity(_) => Variant::Identity,
            Record::Timestamp(_) => Variant::Timestamp,
            Record::HighResTimestamp(_) => Variant::HighResTimestamp,
        }
    }

    /// Primary key, if one has been assigned by the store.
    pub fn primary_key(&self) -> Option<PrimaryKey> {
        match self {
            Record::AutoIncrement(r) => r.id.map(PrimaryKey::Int),
            Record::Identity(r) => r.id.map(PrimaryKey::Int),
            Record::Uuid(r) => r.id.map(PrimaryKey::Uuid),
            Record::Timestamp(_) | Record::HighResTimestamp(_) => None,
        }
    }

    /// Type tag, for the variants that have one.
    pub fn type_tag(&self) -> Option<TypeTag> {
        match self {
            Record::AutoIncrement(r) => Some(r.kind),
            Record::Identity(r) => Some(r.kind),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_table_names_are_unique() {
        let mut names: Vec<&str> = Variant::all().iter().map(|v| v.table_name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 5);
    }

    #[test]
    fn test_recency_order() {
        assert_eq!(
            Variant::HighResTimestamp.recency_order().unwrap(),
            &[
                ("created_at_seconds", Order::Desc),
                ("created_at_nanos", Order::Desc)
            ]
        );
        assert_eq!(
            Variant::AutoIncrement.recency_order().unwrap(),
            &[("id", Order::Desc)]
        );
        assert!(Variant::Uuid.recency_order().is_none());
    }

    #[test]
    fn test_default_reader_interval() {
        assert_eq!(
            Variant::AutoIncrement.default_reader_interval(),
            Duration::from_millis(500)
        );
        assert_eq!(
            Variant::Identity.default_reader_interval(),
            Duration::from_secs(1)
        );
    }

    #[test]
    fn test_type_tag_random_stays_in_alphabet() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let tag = TypeTag::random(&mut rng);
            assert!(TYPE_ALPHABET.contains(&tag.as_str()));
        }
    }

    #[test]
    fn test_type_tag_from_letter() {
        assert_eq!(TypeTag::from_letter("c").unwrap().as_str(), "c");
        assert!(TypeTag::from_letter("z").is_none());
    }

    #[test]
    fn test_high_res_from_instant_roundtrips() {
        let instant = DateTime::from_timestamp(1_700_000_000, 123_456_789).unwrap();
        let record = HighResTimestampRecord::from_instant(instant);
        assert_eq!(record.created_at_seconds, 1_700_000_000);
        assert_eq!(record.created_at_nanos, 123_456_789);
        assert_eq!(record.instant(), Some(instant));
    }

    #[test]
    fn test_variant_display_matches_cli_names() {
        for variant in Variant::all() {
            let parsed = Variant::from_str(&variant.to_string(), true).unwrap();
            assert_eq!(parsed, variant);
        }
    }
}
