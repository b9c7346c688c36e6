/*!
A collection of calendar related utility functions.

Everything in here is `const`, for two reasons. One is that the timestamp
bounds in `crate::timestamp` are derived from the civil bounds, and that
derivation has to happen at compile time. The other is that these routines
are the innermost loops of the resolver's search, and plain `i64`
arithmetic keeps them trivially inlineable.

# Algorithms

Algorithms are taken from
Neri C, Schneider L. "Euclidean affine functions and their application to calendar algorithms":
- https://github.com/cassioneri/eaf/
- https://www.youtube.com/watch?v=0s9F4QWAl-E
*/

pub(crate) const SECONDS_PER_CIVIL_DAY: i64 = 86_400;
pub(crate) const DAYS_IN_ERA: i64 = 146_097;
pub(crate) const DAYS_FROM_0000_01_01_TO_1970_01_01: i64 = 719_468;

/// Division that rounds toward negative infinity.
///
/// The divisor must be positive. Rounding toward negative infinity (and
/// not zero, like `/` does) is what makes pre-epoch arithmetic come out
/// right: `-1` nanosecond is one second back plus `999,999,999` forward.
#[inline]
pub(crate) const fn div_floor(numerator: i64, denominator: i64) -> i64 {
    let quotient = numerator / denominator;
    if numerator % denominator < 0 {
        quotient - 1
    } else {
        quotient
    }
}

/// The remainder corresponding to `div_floor`.
///
/// The divisor must be positive, and the result is always in
/// `0..denominator`.
#[inline]
pub(crate) const fn rem_floor(numerator: i64, denominator: i64) -> i64 {
    let remainder = numerator % denominator;
    if remainder < 0 {
        remainder + denominator
    } else {
        remainder
    }
}

/// Returns true if and only if the given year is a leap year.
///
/// A leap year is a year with 366 days. Typical years have 365 days.
#[inline]
pub(crate) const fn is_leap_year(year: i16) -> bool {
    let d = if year % 25 != 0 { 4 } else { 16 };
    (year % d) == 0
}

/// Return the number of days in the given month.
///
/// This correctly returns `29` when the year is a leap year and the month
/// is February. When the given month is invalid, this returns `0`.
#[inline]
pub(crate) const fn days_in_month(year: i16, month: i8) -> i8 {
    if month < 1 || month > 12 {
        return 0;
    }
    if month == 2 {
        if is_leap_year(year) {
            29
        } else {
            28
        }
    } else {
        30 | (month ^ month >> 3)
    }
}

/// Converts a Gregorian date to a number of days since the Unix epoch.
///
/// The fields must form a valid date. Works for any date in the supported
/// `-9999..=9999` year range (and a fair bit beyond, but nothing in this
/// crate asks for that).
///
/// ref: http://howardhinnant.github.io/date_algorithms.html
#[inline]
pub(crate) const fn to_epoch_days(year: i16, month: i8, day: i8) -> i64 {
    let year = year as i64;
    let month = month as i64;
    let day = day as i64;

    let (year, month) = if month <= 2 {
        (year - 1, month + 9)
    } else {
        (year, month - 3)
    };
    let era = div_floor(year, 400);
    let year_of_era = year - era * 400;
    let day_of_year = (153 * month + 2) / 5 + day - 1;
    let day_of_era =
        year_of_era * 365 + year_of_era / 4 - year_of_era / 100 + day_of_year;
    era * DAYS_IN_ERA + day_of_era - DAYS_FROM_0000_01_01_TO_1970_01_01
}

/// Converts a number of days since the Unix epoch to a Gregorian date.
///
/// The inverse of `to_epoch_days`. The caller must ensure the given day
/// lands in the `-9999..=9999` year range, since the year is returned as
/// an `i16`.
///
/// ref: http://howardhinnant.github.io/date_algorithms.html
#[inline]
pub(crate) const fn from_epoch_days(days: i64) -> (i16, i8, i8) {
    let days = days + DAYS_FROM_0000_01_01_TO_1970_01_01;
    let era = div_floor(days, DAYS_IN_ERA);
    let day_of_era = days - era * DAYS_IN_ERA;
    let year_of_era = (day_of_era - day_of_era / 1_460 + day_of_era / 36_524
        - day_of_era / (DAYS_IN_ERA - 1))
        / 365;
    let year = year_of_era + era * 400;
    let day_of_year =
        day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
    let month = (5 * day_of_year + 2) / 153;
    let day = day_of_year - (153 * month + 2) / 5 + 1;
    let month = if month < 10 { month + 3 } else { month - 9 };
    let year = if month <= 2 { year + 1 } else { year };
    (year as i16, month as i8, day as i8)
}

/// Returns the weekday for the given epoch day, with Sunday as `0`.
///
/// This works by using the knowledge that day `0` (1970-01-01) was a
/// Thursday.
///
/// ref: http://howardhinnant.github.io/date_algorithms.html
#[inline]
pub(crate) const fn weekday_from_epoch_days(days: i64) -> i8 {
    rem_floor(days + 4, 7) as i8
}

/// Returns the zero-based ordinal day of the year, `0..=365`.
#[inline]
pub(crate) const fn day_of_year(year: i16, month: i8, day: i8) -> i16 {
    (to_epoch_days(year, month, day) - to_epoch_days(year, 1, 1)) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_is_leap_year() {
        assert!(is_leap_year(2024));
        assert!(!is_leap_year(2023));
        assert!(!is_leap_year(2025));
        assert!(is_leap_year(2000));
        assert!(!is_leap_year(1900));
        assert!(!is_leap_year(1800));
        assert!(!is_leap_year(1700));
        assert!(is_leap_year(1600));
        assert!(is_leap_year(0));
        assert!(!is_leap_year(-1));
        assert!(is_leap_year(-4));
        assert!(!is_leap_year(-100));
        assert!(is_leap_year(400));
        assert!(!is_leap_year(9999));
        assert!(!is_leap_year(-9999));
    }

    #[test]
    fn t_days_in_month() {
        assert_eq!(31, days_in_month(2023, 1));
        assert_eq!(28, days_in_month(2023, 2));
        assert_eq!(29, days_in_month(2024, 2));
        assert_eq!(28, days_in_month(1900, 2));
        assert_eq!(29, days_in_month(2000, 2));
        assert_eq!(30, days_in_month(2023, 4));
        assert_eq!(31, days_in_month(2023, 8));
        assert_eq!(30, days_in_month(2023, 9));
        assert_eq!(31, days_in_month(2023, 12));
        assert_eq!(0, days_in_month(2023, 0));
        assert_eq!(0, days_in_month(2023, 13));
        assert_eq!(28, days_in_month(-9999, 2));
    }

    #[test]
    fn t_floor_helpers() {
        assert_eq!(0, div_floor(1, 86_400));
        assert_eq!(-1, div_floor(-1, 86_400));
        assert_eq!(-1, div_floor(-86_400, 86_400));
        assert_eq!(-2, div_floor(-86_401, 86_400));
        assert_eq!(86_399, rem_floor(-1, 86_400));
        assert_eq!(0, rem_floor(-86_400, 86_400));
        assert_eq!(1, rem_floor(1, 86_400));
    }

    #[test]
    fn t_epoch_day_anchors() {
        assert_eq!(0, to_epoch_days(1970, 1, 1));
        assert_eq!(-1, to_epoch_days(1969, 12, 31));
        assert_eq!(10_957, to_epoch_days(2000, 1, 1));
        assert_eq!(-4_371_587, to_epoch_days(-9999, 1, 1));
        assert_eq!(2_932_896, to_epoch_days(9999, 12, 31));
        assert_eq!((1970, 1, 1), from_epoch_days(0));
        assert_eq!((1969, 12, 31), from_epoch_days(-1));
        assert_eq!((-9999, 1, 1), from_epoch_days(-4_371_587));
        assert_eq!((9999, 12, 31), from_epoch_days(2_932_896));
    }

    #[test]
    fn all_days_to_date_roundtrip() {
        for days in to_epoch_days(-9999, 1, 1)..=to_epoch_days(9999, 12, 31) {
            let (year, month, day) = from_epoch_days(days);
            let got = to_epoch_days(year, month, day);
            assert_eq!(days, got, "for date {year:04}-{month:02}-{day:02}");
        }
    }

    #[test]
    fn all_date_to_days_roundtrip() {
        for year in -9999..=9999 {
            for month in 1..=12 {
                for day in 1..=days_in_month(year, month) {
                    let days = to_epoch_days(year, month, day);
                    let got = from_epoch_days(days);
                    assert_eq!(
                        (year, month, day),
                        got,
                        "for date {year:04}-{month:02}-{day:02}"
                    );
                }
            }
        }
    }

    #[test]
    fn t_weekday() {
        // 1970-01-01 was a Thursday.
        assert_eq!(4, weekday_from_epoch_days(0));
        assert_eq!(5, weekday_from_epoch_days(1));
        assert_eq!(3, weekday_from_epoch_days(-1));
        assert_eq!(0, weekday_from_epoch_days(3));
        // 2024-03-11 was a Monday.
        assert_eq!(1, weekday_from_epoch_days(to_epoch_days(2024, 3, 11)));
        // 2000-01-01 was a Saturday.
        assert_eq!(6, weekday_from_epoch_days(to_epoch_days(2000, 1, 1)));
    }

    #[test]
    fn t_day_of_year() {
        assert_eq!(0, day_of_year(2023, 1, 1));
        assert_eq!(364, day_of_year(2023, 12, 31));
        assert_eq!(365, day_of_year(2024, 12, 31));
        assert_eq!(59, day_of_year(2024, 2, 29));
        assert_eq!(235, day_of_year(2006, 8, 24));
    }
}
