//! Per-variant SQL statements.

use bench_core::{Record, Variant};

/// Build the INSERT statement for `record`.
///
/// Columns the database fills itself (keys, defaulted timestamps) are left
/// out, so a record with nothing else to write becomes `DEFAULT VALUES`.
pub fn insert_statement(record: &Record) -> String {
    let table = record.variant().table_name();
    match record {
        Record::AutoIncrement(_) | Record::Identity(_) => {
            format!("INSERT INTO \"{table}\" (\"type\") VALUES ($1)")
        }
        Record::Timestamp(r) if r.created_at.is_some() => {
            format!("INSERT INTO \"{table}\" (\"created_at\") VALUES ($1)")
        }
        Record::Uuid(_) | Record::Timestamp(_) => {
            format!("INSERT INTO \"{table}\" DEFAULT VALUES")
        }
        Record::HighResTimestamp(_) => format!(
            "INSERT INTO \"{table}\" (\"created_at_seconds\", \"created_at_nanos\") VALUES ($1, $2)"
        ),
    }
}

/// Build the query returning the newest rows of `variant`, limited by `$1`.
///
/// Returns `None` for variants without a recency key.
pub fn select_recent_statement(variant: Variant) -> Option<String> {
    let order = variant.recency_order()?;
    let order_by = order
        .iter()
        .map(|(column, direction)| format!("\"{column}\" {}", direction.as_sql()))
        .collect::<Vec<_>>()
        .join(", ");
    Some(format!(
        "SELECT * FROM \"{}\" ORDER BY {order_by} LIMIT $1",
        variant.table_name()
    ))
}

/// Generate a row count query.
pub fn count_statement(variant: Variant) -> String {
    format!("SELECT COUNT(*) FROM \"{}\"", variant.table_name())
}

/// Generate a TRUNCATE statement.
pub fn truncate_statement(variant: Variant) -> String {
    let restart = match variant {
        Variant::AutoIncrement | Variant::Identity => " RESTART IDENTITY",
        _ => "",
    };
    format!("TRUNCATE TABLE \"{}\"{restart}", variant.table_name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bench_core::generator::build_record;
    use bench_core::model::TimestampRecord;
    use bench_core::TypeTag;
    use chrono::Utc;

    fn tag() -> TypeTag {
        TypeTag::from_letter("d").unwrap()
    }

    #[test]
    fn test_insert_statements() {
        assert_eq!(
            insert_statement(&build_record(Variant::AutoIncrement, tag())),
            "INSERT INTO \"big_serial_model\" (\"type\") VALUES ($1)"
        );
        assert_eq!(
            insert_statement(&build_record(Variant::Identity, tag())),
            "INSERT INTO \"identity_model\" (\"type\") VALUES ($1)"
        );
        assert_eq!(
            insert_statement(&build_record(Variant::Uuid, tag())),
            "INSERT INTO \"uuid_model\" DEFAULT VALUES"
        );
        assert_eq!(
            insert_statement(&build_record(Variant::Timestamp, tag())),
            "INSERT INTO \"timestamped_model\" DEFAULT VALUES"
        );
        assert_eq!(
            insert_statement(&build_record(Variant::HighResTimestamp, tag())),
            "INSERT INTO \"nanosecond_model\" (\"created_at_seconds\", \"created_at_nanos\") VALUES ($1, $2)"
        );
    }

    #[test]
    fn test_insert_explicit_timestamp() {
        let record = Record::Timestamp(TimestampRecord {
            created_at: Some(Utc::now()),
        });
        assert_eq!(
            insert_statement(&record),
            "INSERT INTO \"timestamped_model\" (\"created_at\") VALUES ($1)"
        );
    }

    #[test]
    fn test_select_recent_statements() {
        assert_eq!(
            select_recent_statement(Variant::AutoIncrement).unwrap(),
            "SELECT * FROM \"big_serial_model\" ORDER BY \"id\" DESC LIMIT $1"
        );
        assert_eq!(
            select_recent_statement(Variant::HighResTimestamp).unwrap(),
            "SELECT * FROM \"nanosecond_model\" ORDER BY \"created_at_seconds\" DESC, \"created_at_nanos\" DESC LIMIT $1"
        );
        assert!(select_recent_statement(Variant::Uuid).is_none());
    }

    #[test]
    fn test_count_and_truncate() {
        assert_eq!(
            count_statement(Variant::Timestamp),
            "SELECT COUNT(*) FROM \"timestamped_model\""
        );
        assert_eq!(
            truncate_statement(Variant::AutoIncrement),
            "TRUNCATE TABLE \"big_serial_model\" RESTART IDENTITY"
        );
        assert_eq!(
            truncate_statement(Variant::HighResTimestamp),
            "TRUNCATE TABLE \"nanosecond_model\""
        );
    }
}
