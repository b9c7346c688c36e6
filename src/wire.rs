/*!
The compact binary form for timestamps.

This is a fixed-width bit-packed encoding of the broken-down UTC fields of
a timestamp, 8 bytes in the common case, with an optional sub-microsecond
tail. The layout is bit-for-bit the historical wire format it claims
compatibility with, so it is spelled out here in full.

Two 32-bit words, each serialized in little-endian byte order:

```text
word 1 (bit 31 is the most significant):
  bit  31     version flag, always 1
  bit  30     zone flag: 1 for UTC, 0 for local
  bits 14-29  year - 1900, 16-bit two's complement
  bits 10-13  month - 1 (0-11)
  bits  5-9   day (1-31)
  bits  0-4   hour (0-23)

word 2:
  bits 26-31  minute (0-59)
  bits 20-25  second (0-60, six bits so a leap second fits)
  bits  0-19  microsecond (0-999999)
```

The calendar fields are always the **UTC** reading of the instant,
regardless of the zone flag; the flag only records which zone the value
was carrying when it was encoded. That keeps decoding adapter-free.

When the nanosecond fraction is not a whole number of microseconds, the
three remaining decimal digits are appended as packed BCD: byte 8 holds
the hundreds digit in its high nibble and the tens digit in its low
nibble, and byte 9 (present only when the units digit is non-zero) holds
the units digit in its high nibble. A tail whose nibbles are not decimal
digits is silently ignored, per the historical behavior of tolerating
foreign sub-microsecond extensions.

# Example

```
use epochal::{wire, Timestamp, Zone};

let ts = Timestamp::new(946_757_701, 0)?;
let bytes = wire::encode(ts, Zone::Utc);
assert_eq!(bytes.len(), 8);
assert_eq!(wire::decode(&bytes)?, (ts, Zone::Utc));

# Ok::<(), epochal::Error>(())
```
*/

use alloc::vec::Vec;

use crate::{
    cal::{Utc, Zone},
    civil::DateTime,
    error::{DecodeError, Error, ErrorContext},
    resolve::Resolver,
    timestamp::Timestamp,
};

/// Encodes a timestamp and its zone into the binary form.
///
/// The result is 8 bytes when the fraction is a whole number of
/// microseconds, and 9 or 10 bytes otherwise. Encoding cannot fail:
/// every in-range timestamp has a UTC reading that fits the bit fields.
pub fn encode(ts: Timestamp, zone: Zone) -> Vec<u8> {
    let dt = DateTime::from_second_utc(ts.second())
        .expect("in-range timestamps always decode in UTC");
    let year_offset = (i32::from(dt.year()) - 1900) as u32 & 0xFFFF;
    let word1 = (1u32 << 31)
        | (if zone.is_utc() { 1 << 30 } else { 0 })
        | (year_offset << 14)
        | ((dt.month() as u32 - 1) << 10)
        | ((dt.day() as u32) << 5)
        | (dt.hour() as u32);
    let microsecond = ts.nanosecond() / 1_000;
    let word2 = ((dt.minute() as u32) << 26)
        | ((dt.second() as u32) << 20)
        | microsecond;

    let mut buf = Vec::with_capacity(10);
    buf.extend_from_slice(&word1.to_le_bytes());
    buf.extend_from_slice(&word2.to_le_bytes());

    let submicro = ts.nanosecond() % 1_000;
    if submicro != 0 {
        let hundreds = (submicro / 100) as u8;
        let tens = (submicro / 10 % 10) as u8;
        let units = (submicro % 10) as u8;
        buf.push(hundreds << 4 | tens);
        if units != 0 {
            buf.push(units << 4);
        }
    }
    buf
}

/// Decodes the binary form back into a timestamp and its zone.
///
/// The calendar fields are validated exactly like user input, the UTC
/// reading is resolved back through the epoch resolver, and the fraction
/// is folded in through the overflow normalizer.
///
/// # Errors
///
/// This returns an error (see [`Error::is_decode`]) when the input has
/// the wrong length, lacks the version flag, or reconstructs a calendar
/// field that fails validation, including a microsecond field of a
/// million or more and a datetime outside the representable timestamp
/// range.
pub fn decode(bytes: &[u8]) -> Result<(Timestamp, Zone), Error> {
    if !matches!(bytes.len(), 8 | 9 | 10) {
        return Err(Error::decode(DecodeError::Length { len: bytes.len() }));
    }
    let word1 = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
    let word2 = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
    if word1 >> 31 == 0 {
        return Err(Error::decode(DecodeError::Version));
    }
    let zone = if word1 >> 30 & 1 == 1 { Zone::Utc } else { Zone::Local };

    let year = i32::from((word1 >> 14 & 0xFFFF) as u16 as i16) + 1900;
    let month = (word1 >> 10 & 0xF) as i8 + 1;
    let day = (word1 >> 5 & 0x1F) as i8;
    let hour = (word1 & 0x1F) as i8;
    let minute = (word2 >> 26 & 0x3F) as i8;
    let second = (word2 >> 20 & 0x3F) as i8;
    let microsecond = word2 & 0xF_FFFF;

    if microsecond >= 1_000_000 {
        return Err(Error::decode(DecodeError::Micros { given: microsecond }));
    }
    if !(-9999..=9999).contains(&year) {
        return Err(Error::field("year", i64::from(year), -9999, 9999)
            .context(Error::decode(DecodeError::Field)));
    }
    let dt = DateTime::new(year as i16, month, day, hour, minute, second)
        .context(Error::decode(DecodeError::Field))?;
    let ts = Resolver::new(&Utc)
        .resolve(&dt, Zone::Utc)
        .context(Error::decode(DecodeError::Unrepresentable))?;

    let mut nanosecond = i64::from(microsecond) * 1_000;
    if bytes.len() >= 9 {
        let hundreds = bytes[8] >> 4;
        let tens = bytes[8] & 0xF;
        if hundreds <= 9 && tens <= 9 {
            let mut submicro =
                i64::from(hundreds) * 100 + i64::from(tens) * 10;
            if bytes.len() == 10 {
                let units = bytes[9] >> 4;
                if units <= 9 {
                    submicro += i64::from(units);
                }
            }
            nanosecond += submicro;
        }
    }
    let ts = Timestamp::normalized(ts.second(), nanosecond)?;
    Ok((ts, zone))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_bytes() {
        // 2000-01-01T20:15:01Z. Pinning the bytes pins the whole bit
        // layout: version and zone flags, the year offset, the zero-based
        // month, and the little-endian word order.
        let ts = Timestamp::new(946_757_701, 0).unwrap();
        let bytes = encode(ts, Zone::Utc);
        assert_eq!(
            bytes,
            &[0x34, 0x00, 0x19, 0xC0, 0x00, 0x00, 0x10, 0x3C],
        );
        assert_eq!(decode(&bytes).unwrap(), (ts, Zone::Utc));

        // The local flag only flips bit 30 of the first word.
        let bytes = encode(ts, Zone::Local);
        assert_eq!(
            bytes,
            &[0x34, 0x00, 0x19, 0x80, 0x00, 0x00, 0x10, 0x3C],
        );
        assert_eq!(decode(&bytes).unwrap(), (ts, Zone::Local));
    }

    #[test]
    fn lengths_by_fraction() {
        // Whole microseconds: 8 bytes.
        let ts = Timestamp::new(0, 123_456_000).unwrap();
        let bytes = encode(ts, Zone::Utc);
        assert_eq!(bytes.len(), 8);
        assert_eq!(decode(&bytes).unwrap(), (ts, Zone::Utc));

        // A zero units digit drops the second tail byte: 9 bytes.
        let ts = Timestamp::new(0, 123_456_780).unwrap();
        let bytes = encode(ts, Zone::Utc);
        assert_eq!(bytes.len(), 9);
        assert_eq!(bytes[8], 0x78);
        assert_eq!(decode(&bytes).unwrap(), (ts, Zone::Utc));

        // All three digits: 10 bytes.
        let ts = Timestamp::new(0, 123_456_789).unwrap();
        let bytes = encode(ts, Zone::Utc);
        assert_eq!(bytes.len(), 10);
        assert_eq!(bytes[8], 0x78);
        assert_eq!(bytes[9], 0x90);
        assert_eq!(decode(&bytes).unwrap(), (ts, Zone::Utc));
    }

    #[test]
    fn pre_epoch_and_pre_1900() {
        let ts = Timestamp::new(-1, 0).unwrap();
        assert_eq!(decode(&encode(ts, Zone::Utc)).unwrap(), (ts, Zone::Utc));

        // Years before 1900 pack a negative year offset.
        let dt = DateTime::constant(1, 1, 1, 0, 0, 0);
        let second = Resolver::new(&Utc)
            .resolve(&dt, Zone::Utc)
            .unwrap()
            .second();
        let ts = Timestamp::new(second, 250_000_000).unwrap();
        assert_eq!(decode(&encode(ts, Zone::Utc)).unwrap(), (ts, Zone::Utc));
    }

    #[test]
    fn rejects_bad_lengths() {
        let err = decode(&[]).unwrap_err();
        assert!(err.is_decode(), "{err}");
        let ts = Timestamp::new(0, 0).unwrap();
        let bytes = encode(ts, Zone::Utc);
        let err = decode(&bytes[..7]).unwrap_err();
        assert!(err.is_decode(), "{err}");
        let mut long = encode(ts, Zone::Utc);
        long.extend_from_slice(&[0, 0, 0]);
        let err = decode(&long).unwrap_err();
        assert!(err.is_decode(), "{err}");
    }

    #[test]
    fn rejects_missing_version_flag() {
        let ts = Timestamp::new(0, 0).unwrap();
        let mut bytes = encode(ts, Zone::Utc);
        bytes[3] &= 0x7F;
        let err = decode(&bytes).unwrap_err();
        assert!(err.is_decode(), "{err}");
    }

    #[test]
    fn rejects_invalid_fields() {
        let ts = Timestamp::new(0, 0).unwrap();
        // 1970-01-01T00:00:00, month field forced to 12 (= month 13).
        let mut bytes = encode(ts, Zone::Utc);
        let mut word1 = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        word1 |= 12 << 10;
        bytes[0..4].copy_from_slice(&word1.to_le_bytes());
        let err = decode(&bytes).unwrap_err();
        assert!(err.is_decode(), "{err}");
        assert!(err.is_invalid_field(), "{err}");

        // Microsecond field at its 20-bit maximum is out of range.
        let mut bytes = encode(ts, Zone::Utc);
        let mut word2 = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        word2 |= 0xF_FFFF;
        bytes[4..8].copy_from_slice(&word2.to_le_bytes());
        let err = decode(&bytes).unwrap_err();
        assert!(err.is_decode(), "{err}");
    }

    #[test]
    fn leap_second_field_folds_forward() {
        // A foreign writer may encode 23:59:60; the six-bit second field
        // admits it, and resolution folds it into the next minute.
        let ts = Timestamp::new(0, 0).unwrap();
        let mut bytes = encode(
            Timestamp::new(-1, 0).unwrap(), // 1969-12-31T23:59:59Z
            Zone::Utc,
        );
        let mut word2 = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        // second field 59 -> 60
        word2 = (word2 & !(0x3F << 20)) | (60 << 20);
        bytes[4..8].copy_from_slice(&word2.to_le_bytes());
        assert_eq!(decode(&bytes).unwrap(), (ts, Zone::Utc));
    }

    #[test]
    fn malformed_bcd_tail_is_ignored() {
        let ts = Timestamp::new(0, 123_456_789).unwrap();
        let mut bytes = encode(ts, Zone::Utc);
        bytes[8] = 0xAB;
        let (got, _) = decode(&bytes).unwrap();
        // The whole sub-microsecond correction is dropped.
        assert_eq!(got.nanosecond(), 123_456_000);

        // A bad units nibble drops only the units digit.
        let mut bytes = encode(ts, Zone::Utc);
        bytes[9] = 0xF0;
        let (got, _) = decode(&bytes).unwrap();
        assert_eq!(got.nanosecond(), 123_456_780);
    }

    quickcheck::quickcheck! {
        fn prop_roundtrip(ts: Timestamp, utc: bool) -> bool {
            let zone = if utc { Zone::Utc } else { Zone::Local };
            decode(&encode(ts, zone)).unwrap() == (ts, zone)
        }
    }
}
