//! Not-after time decoding.
//!
//! Decodes the raw content octets of a certificate's notAfter field into a
//! unix timestamp. The field is an undelimited digit string whose year width
//! depends on the ASN.1 encoding: UTCTime carries a 2-digit year with the
//! classic X.509 rollover (values below 70 are 20xx), GeneralizedTime a
//! 4-digit year. The remaining fields are fixed-width two-digit month, day,
//! hour, minute, second.
//!
//! The conversion is a naive calendar conversion: the broken-down time is
//! mapped to a timestamp with no timezone offset applied, matching the
//! renewal timing of the classic single-purpose ACME clients.

use chrono::NaiveDate;

use crate::error::CheckError;

/// Year width of the raw notAfter field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeEncoding {
    /// UTCTime: 2-digit year, 12 digits total.
    Utc,
    /// GeneralizedTime: 4-digit year, 14 digits total.
    Generalized,
}

impl TimeEncoding {
    /// Number of digits this variant requires before any suffix.
    fn required_digits(self) -> usize {
        match self {
            TimeEncoding::Utc => 12,
            TimeEncoding::Generalized => 14,
        }
    }
}

/// Decode a raw notAfter digit string into unix seconds.
///
/// Never reads past `encoding.required_digits()` bytes; a trailing `Z` or
/// fractional-seconds suffix is ignored. Short input, a non-digit in a
/// required position, or a calendar-invalid date is a decode failure.
pub fn decode_not_after(encoding: TimeEncoding, raw: &[u8]) -> Result<i64, CheckError> {
    let required = encoding.required_digits();
    if raw.len() < required {
        return Err(CheckError::Time(format!(
            "field too short: {} bytes, need {}",
            raw.len(),
            required
        )));
    }

    let digits = &raw[..required];
    let (year, rest) = match encoding {
        TimeEncoding::Utc => {
            let yy = two_digits(&digits[0..2])?;
            // X.509 UTCTime rollover: 00..69 are 2000-2069
            let yy = if yy < 70 { yy + 100 } else { yy };
            (1900 + i32::from(yy), &digits[2..])
        }
        TimeEncoding::Generalized => {
            let high = two_digits(&digits[0..2])?;
            let low = two_digits(&digits[2..4])?;
            (i32::from(high) * 100 + i32::from(low), &digits[4..])
        }
    };

    let month = two_digits(&rest[0..2])?;
    let day = two_digits(&rest[2..4])?;
    let hour = two_digits(&rest[4..6])?;
    let minute = two_digits(&rest[6..8])?;
    let second = two_digits(&rest[8..10])?;

    let datetime = NaiveDate::from_ymd_opt(year, u32::from(month), u32::from(day))
        .and_then(|d| d.and_hms_opt(u32::from(hour), u32::from(minute), u32::from(second)))
        .ok_or_else(|| {
            CheckError::Time(format!(
                "calendar-invalid date: {year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}"
            ))
        })?;

    Ok(datetime.and_utc().timestamp())
}

fn two_digits(pair: &[u8]) -> Result<u8, CheckError> {
    if !pair[0].is_ascii_digit() || !pair[1].is_ascii_digit() {
        return Err(CheckError::Time(format!(
            "non-digit in time field: {:?}",
            String::from_utf8_lossy(pair)
        )));
    }
    Ok((pair[0] - b'0') * 10 + (pair[1] - b'0'))
}
