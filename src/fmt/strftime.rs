/*!
Support for "printf" style formatting.

While the directives here closely resemble the corresponding [`strftime`]
POSIX function, it is not a goal to precisely match POSIX semantics: there
is no locale support (names are English), and no padding or case
extensions. The pattern language is a sequence of greedy conversion
directives interspersed with literals.

An empty pattern, or a pattern whose directives all expand to nothing
(like `%Z` on a value with no abbreviation), is not an error; it is a
successful, empty rendering.

[`strftime`]: https://pubs.opengroup.org/onlinepubs/9699919799/functions/strftime.html

# Example

```
use epochal::{fmt::strftime, Calendar, Utc, Zone};

let dt = Utc.to_datetime(946_757_701, Zone::Utc)?;
let got = strftime::format("%A, %B %d, %Y at %I:%M%p %Z", &dt)?;
assert_eq!(got, "Saturday, January 01, 2000 at 08:15PM UTC");

# Ok::<(), epochal::Error>(())
```

# Supported directives

`%Y` `%y` `%C` `%m` `%d` `%e` `%H` `%k` `%I` `%l` `%M` `%S` `%p` `%P`
`%a` `%A` `%b` `%h` `%B` `%j` `%w` `%u` `%U` `%W` `%Z` `%z` `%n` `%t`
`%%`.

`%Z` expands to nothing when the value carries no abbreviation
annotation. `%z` requires the UTC offset annotation and reports an error
without one, since inventing an offset would be worse than failing.
*/

use alloc::string::String;

use crate::{
    civil::{DateTime, Weekday},
    error::{err, Error, FormatError},
};

/// Formats the given datetime with a strftime-style pattern.
///
/// # Errors
///
/// This returns an error on an unsupported or unterminated directive, or
/// when `%z` is used on a value with no offset annotation.
pub fn format(pattern: &str, dt: &DateTime) -> Result<String, Error> {
    let mut buf = String::with_capacity(pattern.len().max(32));
    format_into(pattern, dt, &mut buf)?;
    Ok(buf)
}

/// Like [`format`], but writes into an existing `core::fmt::Write`
/// destination.
pub fn format_into<W: core::fmt::Write>(
    pattern: &str,
    dt: &DateTime,
    wtr: &mut W,
) -> Result<(), Error> {
    Formatter { fmt: pattern.as_bytes(), dt, wtr }.format()
}

struct Formatter<'f, 't, 'w, W> {
    fmt: &'f [u8],
    dt: &'t DateTime,
    wtr: &'w mut W,
}

impl<'f, 't, 'w, W: core::fmt::Write> Formatter<'f, 't, 'w, W> {
    fn format(&mut self) -> Result<(), Error> {
        while !self.fmt.is_empty() {
            if self.fmt[0] != b'%' {
                // Copy the maximal literal run through verbatim. Splitting
                // at an ASCII byte can't break a UTF-8 boundary, so the
                // run is guaranteed to be valid UTF-8.
                let end = self
                    .fmt
                    .iter()
                    .position(|&b| b == b'%')
                    .unwrap_or(self.fmt.len());
                let literal = core::str::from_utf8(&self.fmt[..end])
                    .expect("literal run split at ASCII is valid UTF-8");
                self.write_str(literal)?;
                self.fmt = &self.fmt[end..];
                continue;
            }
            if self.fmt.len() < 2 {
                return Err(Error::format(FormatError::UnexpectedEnd));
            }
            let directive = self.fmt[1];
            self.fmt = &self.fmt[2..];
            self.format_one(directive)?;
        }
        Ok(())
    }

    fn format_one(&mut self, directive: u8) -> Result<(), Error> {
        let dt = *self.dt;
        match directive {
            b'%' => self.write_str("%"),
            b'Y' => self.fmt_year(),
            b'y' => {
                self.write_args(format_args!(
                    "{:02}",
                    dt.year().rem_euclid(100)
                ))
            }
            b'C' => {
                self.write_args(format_args!(
                    "{:02}",
                    dt.year().div_euclid(100)
                ))
            }
            b'm' => self.write_args(format_args!("{:02}", dt.month())),
            b'd' => self.write_args(format_args!("{:02}", dt.day())),
            b'e' => self.write_args(format_args!("{:2}", dt.day())),
            b'H' => self.write_args(format_args!("{:02}", dt.hour())),
            b'k' => self.write_args(format_args!("{:2}", dt.hour())),
            b'I' => self.write_args(format_args!("{:02}", hour12(dt.hour()))),
            b'l' => self.write_args(format_args!("{:2}", hour12(dt.hour()))),
            b'M' => self.write_args(format_args!("{:02}", dt.minute())),
            b'S' => self.write_args(format_args!("{:02}", dt.second())),
            b'p' => {
                self.write_str(if is_am(dt.hour()) { "AM" } else { "PM" })
            }
            b'P' => {
                self.write_str(if is_am(dt.hour()) { "am" } else { "pm" })
            }
            b'a' => self.write_str(weekday_name_abbrev(dt.weekday())),
            b'A' => self.write_str(weekday_name_full(dt.weekday())),
            b'b' | b'h' => self.write_str(month_name_abbrev(dt.month())),
            b'B' => self.write_str(month_name_full(dt.month())),
            b'j' => {
                self.write_args(format_args!("{:03}", dt.day_of_year() + 1))
            }
            b'w' => self.write_args(format_args!(
                "{}",
                dt.weekday().to_sunday_zero_offset()
            )),
            b'u' => self.write_args(format_args!(
                "{}",
                dt.weekday().to_monday_one_offset()
            )),
            b'U' => {
                let week = (dt.day_of_year() + 7
                    - i16::from(dt.weekday().to_sunday_zero_offset()))
                    / 7;
                self.write_args(format_args!("{week:02}"))
            }
            b'W' => {
                let week = (dt.day_of_year() + 7
                    - i16::from(dt.weekday().to_monday_zero_offset()))
                    / 7;
                self.write_args(format_args!("{week:02}"))
            }
            b'Z' => match dt.abbreviation() {
                Some(abbreviation) => self.write_str(abbreviation),
                None => Ok(()),
            },
            b'z' => self.fmt_offset(),
            b'n' => self.write_str("\n"),
            b't' => self.write_str("\t"),
            unknown => Err(Error::format(FormatError::UnknownDirective {
                directive: unknown,
            })),
        }
    }

    fn fmt_year(&mut self) -> Result<(), Error> {
        let year = self.dt.year();
        if year < 0 {
            self.write_args(format_args!("-{:04}", -i32::from(year)))
        } else {
            self.write_args(format_args!("{year:04}"))
        }
    }

    fn fmt_offset(&mut self) -> Result<(), Error> {
        let Some(offset) = self.dt.offset() else {
            return Err(Error::format(FormatError::RequiresOffset {
                directive: b'z',
            }));
        };
        let (sign, seconds) = if offset.seconds() < 0 {
            ('-', -offset.seconds())
        } else {
            ('+', offset.seconds())
        };
        self.write_args(format_args!(
            "{sign}{:02}{:02}",
            seconds / 3_600,
            seconds / 60 % 60,
        ))
    }

    fn write_str(&mut self, s: &str) -> Result<(), Error> {
        self.wtr
            .write_str(s)
            .map_err(|_| err!("failed to write formatted output"))
    }

    fn write_args(
        &mut self,
        args: core::fmt::Arguments<'_>,
    ) -> Result<(), Error> {
        self.wtr
            .write_fmt(args)
            .map_err(|_| err!("failed to write formatted output"))
    }
}

/// Converts a 24-hour value to the 12-hour clock.
fn hour12(hour: i8) -> i8 {
    let hour = hour % 12;
    if hour == 0 {
        12
    } else {
        hour
    }
}

/// True for hours rendered as AM. Hour 24 is midnight, which is AM.
fn is_am(hour: i8) -> bool {
    hour % 24 < 12
}

/// Returns the "full" weekday name.
fn weekday_name_full(wd: Weekday) -> &'static str {
    match wd {
        Weekday::Sunday => "Sunday",
        Weekday::Monday => "Monday",
        Weekday::Tuesday => "Tuesday",
        Weekday::Wednesday => "Wednesday",
        Weekday::Thursday => "Thursday",
        Weekday::Friday => "Friday",
        Weekday::Saturday => "Saturday",
    }
}

/// Returns an abbreviated weekday name.
fn weekday_name_abbrev(wd: Weekday) -> &'static str {
    match wd {
        Weekday::Sunday => "Sun",
        Weekday::Monday => "Mon",
        Weekday::Tuesday => "Tue",
        Weekday::Wednesday => "Wed",
        Weekday::Thursday => "Thu",
        Weekday::Friday => "Fri",
        Weekday::Saturday => "Sat",
    }
}

/// Returns the "full" month name.
fn month_name_full(month: i8) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        unk => unreachable!("invalid month {unk}"),
    }
}

/// Returns the abbreviated month name.
fn month_name_abbrev(month: i8) -> &'static str {
    match month {
        1 => "Jan",
        2 => "Feb",
        3 => "Mar",
        4 => "Apr",
        5 => "May",
        6 => "Jun",
        7 => "Jul",
        8 => "Aug",
        9 => "Sep",
        10 => "Oct",
        11 => "Nov",
        12 => "Dec",
        unk => unreachable!("invalid month {unk}"),
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;
    use crate::cal::{Dst, Offset, Zone};

    fn sample() -> DateTime {
        // 2024-07-15 was a Monday.
        DateTime::constant(2024, 7, 15, 17, 30, 59)
            .with_offset(Offset::constant(-4))
            .with_dst(Dst::Yes)
            .with_zone(Zone::Local)
            .with_abbreviation("EDT")
            .unwrap()
    }

    #[test]
    fn numeric_directives() {
        let dt = sample();
        assert_eq!(
            format("%Y-%m-%d %H:%M:%S", &dt).unwrap(),
            "2024-07-15 17:30:59",
        );
        assert_eq!(format("%y/%C", &dt).unwrap(), "24/20");
        assert_eq!(format("%j", &dt).unwrap(), "197");
        assert_eq!(format("%e%t%k", &dt).unwrap(), "15\t17");
        assert_eq!(
            format("%I:%M %p (%P)", &dt).unwrap(),
            "05:30 PM (pm)",
        );
    }

    #[test]
    fn name_directives() {
        let dt = sample();
        assert_eq!(
            format("%A, %B %d, %Y", &dt).unwrap(),
            "Monday, July 15, 2024",
        );
        assert_eq!(format("%a %b/%h", &dt).unwrap(), "Mon Jul/Jul");
    }

    #[test]
    fn weekday_and_week_numbers() {
        let dt = sample();
        assert_eq!(format("%w%u", &dt).unwrap(), "11");
        assert_eq!(format("%U", &dt).unwrap(), "28");
        assert_eq!(format("%W", &dt).unwrap(), "29");

        let dt = DateTime::constant(2000, 1, 1, 0, 0, 0);
        assert_eq!(format("%j %w %u", &dt).unwrap(), "001 6 6");
        assert_eq!(format("%U %W", &dt).unwrap(), "00 00");
    }

    #[test]
    fn zone_directives() {
        let dt = sample();
        assert_eq!(format("%Z %z", &dt).unwrap(), "EDT -0400");

        let dt = DateTime::constant(2024, 7, 15, 17, 30, 59)
            .with_offset(Offset::constant_seconds(19_800));
        assert_eq!(format("%z", &dt).unwrap(), "+0530");
        // No abbreviation: %Z expands to nothing, successfully.
        assert_eq!(format("[%Z]", &dt).unwrap(), "[]");

        // No offset: %z is an error rather than an invented +0000.
        let dt = DateTime::constant(2024, 7, 15, 17, 30, 59);
        let err = format("%z", &dt).unwrap_err();
        assert!(err.to_string().contains("%z"), "{err}");
    }

    #[test]
    fn twelve_hour_edges() {
        let dt = DateTime::constant(2024, 7, 15, 0, 5, 0);
        assert_eq!(format("%I %p", &dt).unwrap(), "12 AM");
        let dt = DateTime::constant(2024, 7, 15, 12, 5, 0);
        assert_eq!(format("%I %p", &dt).unwrap(), "12 PM");
        let dt = DateTime::constant(2024, 7, 15, 24, 0, 0);
        assert_eq!(format("%I %p", &dt).unwrap(), "12 AM");
        let dt = DateTime::constant(2024, 7, 15, 13, 5, 0);
        assert_eq!(format("%l %p", &dt).unwrap(), " 1 PM");
    }

    #[test]
    fn literals_and_escapes() {
        let dt = sample();
        assert_eq!(format("", &dt).unwrap(), "");
        assert_eq!(format("100%% pure", &dt).unwrap(), "100% pure");
        assert_eq!(format("läuft %H%n", &dt).unwrap(), "läuft 17\n");
    }

    #[test]
    fn negative_year() {
        let dt = DateTime::constant(-43, 3, 15, 12, 0, 0);
        assert_eq!(format("%Y-%m-%d", &dt).unwrap(), "-0043-03-15");
        assert_eq!(format("%y", &dt).unwrap(), "57");
    }

    #[test]
    fn bad_patterns() {
        let dt = sample();
        let err = format("%", &dt).unwrap_err();
        assert!(err.to_string().contains("unterminated"), "{err}");
        let err = format("%Q", &dt).unwrap_err();
        assert!(err.to_string().contains("%Q"), "{err}");
    }
}
