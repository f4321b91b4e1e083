//! The JSON body for creating or replacing a transaction, and its validation.

use serde::{Deserialize, Serialize};
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, format_description::well_known::Rfc3339,
    macros::format_description,
};

use crate::{
    Error,
    category::find_category,
    database_id::AssetId,
    db::now_utc,
    timezone::assume_local_time,
    transaction::{NewTransaction, TransactionType},
};

/// The data for creating or replacing a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionForm {
    /// How much money was earned or spent, must be greater than zero.
    pub amount: f64,
    /// Whether the money was earned or spent.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// The category ID, e.g. "food".
    pub category_id: String,
    /// The category name. Defaults to the built-in name for `category_id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    /// When the transaction happened. Defaults to now.
    ///
    /// Either an RFC 3339 date-time, or a date or date-time without an offset
    /// which is read as local time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// A free text note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// The asset the money came from or went to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<AssetId>,
}

impl TransactionForm {
    /// Check the form and resolve its defaults.
    ///
    /// # Errors
    /// Returns [Error::InvalidAmount] for amounts that are not finite and positive,
    /// [Error::InvalidCategory] for a blank category ID or an unknown category
    /// without a name, and [Error::InvalidDate] for dates that cannot be parsed.
    pub fn validate(self, local_timezone: &str) -> Result<NewTransaction, Error> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(Error::InvalidAmount(self.amount));
        }

        let category_id = self.category_id.trim().to_owned();
        if category_id.is_empty() {
            return Err(Error::InvalidCategory(self.category_id));
        }

        let category_name = match self.category_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_owned(),
            _ => find_category(&category_id)
                .map(|category| category.name.to_owned())
                .ok_or_else(|| Error::InvalidCategory(category_id.clone()))?,
        };

        let date = match self.date.as_deref().map(str::trim) {
            None | Some("") => now_utc(),
            Some(raw) => parse_transaction_date(raw, local_timezone)?,
        };

        let note = self
            .note
            .map(|note| note.trim().to_owned())
            .filter(|note| !note.is_empty());

        Ok(NewTransaction {
            amount: self.amount,
            kind: self.kind,
            category_id,
            category_name,
            date,
            note,
            asset_id: self.asset_id,
        })
    }
}

/// Parse a transaction date.
///
/// Accepts RFC 3339 (`2026-01-19T12:30:00+13:00`), or local time as
/// `2026-01-19T12:30:00`, `2026-01-19T12:30` or `2026-01-19`.
///
/// # Errors
/// Returns [Error::InvalidDate] if `raw` is in none of these formats, or
/// [Error::InvalidTimezoneError] if `local_timezone` is not valid.
pub fn parse_transaction_date(raw: &str, local_timezone: &str) -> Result<OffsetDateTime, Error> {
    if let Ok(date_time) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(date_time.replace_nanosecond(0).unwrap_or(date_time));
    }

    let local_date_time = PrimitiveDateTime::parse(
        raw,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    )
    .or_else(|_| {
        PrimitiveDateTime::parse(raw, format_description!("[year]-[month]-[day]T[hour]:[minute]"))
    })
    .or_else(|_| {
        Date::parse(raw, format_description!("[year]-[month]-[day]")).map(Date::midnight)
    })
    .map_err(|_| Error::InvalidDate(raw.to_owned()))?;

    assume_local_time(local_date_time, local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(local_timezone.to_owned()))
}

#[cfg(test)]
mod tests {
    use time::macros::{date, datetime};

    use crate::{Error, timezone::local_date_of, transaction::TransactionType};

    use super::{TransactionForm, parse_transaction_date};

    fn form() -> TransactionForm {
        TransactionForm {
            amount: 32.0,
            kind: TransactionType::Expense,
            category_id: "food".to_owned(),
            category_name: None,
            date: Some("2026-01-19T12:30:00Z".to_owned()),
            note: Some("  Lunch ".to_owned()),
            asset_id: None,
        }
    }

    #[test]
    fn validate_fills_in_category_name() {
        let new_transaction = form().validate("Etc/UTC").unwrap();

        assert_eq!(new_transaction.category_name, "Food");
        assert_eq!(new_transaction.note.as_deref(), Some("Lunch"));
        assert_eq!(new_transaction.date, datetime!(2026-01-19 12:30 UTC));
    }

    #[test]
    fn validate_keeps_custom_category_name() {
        let custom = TransactionForm {
            category_id: "pets".to_owned(),
            category_name: Some("Pets".to_owned()),
            ..form()
        };

        let new_transaction = custom.validate("Etc/UTC").unwrap();

        assert_eq!(new_transaction.category_id, "pets");
        assert_eq!(new_transaction.category_name, "Pets");
    }

    #[test]
    fn validate_rejects_unknown_category_without_name() {
        let custom = TransactionForm {
            category_id: "pets".to_owned(),
            ..form()
        };

        assert_eq!(
            custom.validate("Etc/UTC"),
            Err(Error::InvalidCategory("pets".to_owned()))
        );
    }

    #[test]
    fn validate_rejects_blank_category() {
        let blank = TransactionForm {
            category_id: "  ".to_owned(),
            category_name: Some("Something".to_owned()),
            ..form()
        };

        assert!(matches!(
            blank.validate("Etc/UTC"),
            Err(Error::InvalidCategory(_))
        ));
    }

    #[test]
    fn validate_rejects_non_positive_amounts() {
        for amount in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let bad = TransactionForm { amount, ..form() };

            assert!(
                matches!(bad.validate("Etc/UTC"), Err(Error::InvalidAmount(_))),
                "want amount {amount} to be rejected"
            );
        }
    }

    #[test]
    fn validate_drops_blank_note() {
        let blank_note = TransactionForm {
            note: Some("   ".to_owned()),
            ..form()
        };

        assert_eq!(blank_note.validate("Etc/UTC").unwrap().note, None);
    }

    #[test]
    fn missing_date_defaults_to_now() {
        let no_date = TransactionForm {
            date: None,
            ..form()
        };
        let before = time::OffsetDateTime::now_utc() - time::Duration::seconds(1);

        let new_transaction = no_date.validate("Etc/UTC").unwrap();

        assert!(new_transaction.date >= before);
    }

    #[test]
    fn parses_rfc3339_with_offset() {
        assert_eq!(
            parse_transaction_date("2026-01-19T12:30:00+13:00", "Etc/UTC"),
            Ok(datetime!(2026-01-18 23:30 UTC))
        );
    }

    #[test]
    fn parses_local_date_time_in_local_timezone() {
        assert_eq!(
            parse_transaction_date("2026-01-19T12:30:00", "Pacific/Auckland"),
            Ok(datetime!(2026-01-19 12:30 +13))
        );
        assert_eq!(
            parse_transaction_date("2026-01-19T12:30", "Etc/UTC"),
            Ok(datetime!(2026-01-19 12:30 UTC))
        );
    }

    #[test]
    fn parses_date_as_local_midnight() {
        assert_eq!(
            parse_transaction_date("2026-07-01", "Pacific/Auckland"),
            Ok(datetime!(2026-07-01 00:00 +12))
        );
    }

    #[test]
    fn parses_date_as_local_midnight_on_daylight_saving_start() {
        assert_eq!(
            parse_transaction_date("2026-09-27", "Pacific/Auckland"),
            Ok(datetime!(2026-09-26 12:00 UTC))
        );
        assert_eq!(
            parse_transaction_date("2026-09-27T23:30", "Pacific/Auckland"),
            Ok(datetime!(2026-09-27 23:30 +13))
        );
    }

    #[test]
    fn local_date_survives_round_trip_on_daylight_saving_start() {
        let instant = parse_transaction_date("2026-09-27", "Pacific/Auckland").unwrap();

        assert_eq!(
            local_date_of(instant, "Pacific/Auckland"),
            Some(date!(2026 - 09 - 27))
        );
    }

    #[test]
    fn rejects_garbage_dates() {
        assert_eq!(
            parse_transaction_date("yesterday", "Etc/UTC"),
            Err(Error::InvalidDate("yesterday".to_owned()))
        );
    }
}
