/*!
The civil calendar boundary.

Everything that knows how a timestamp maps to wall-clock time lives behind
the [`Calendar`] trait. UTC is decoded by the engine itself with a closed
form; local time is whatever the calendar says it is. The engine makes no
assumptions about local time beyond what POSIX `localtime` promises: it
always answers, but it is not monotonic and not injective (DST gaps and
folds), and it may be expensive. Results are always copied out into owned
[`DateTime`] values; nothing in this crate retains adapter state between
calls, so calendars shared between threads only need to be `Sync`
themselves.

Three calendars ship with the crate: [`Utc`], [`Fixed`] and
[`Transitions`]. Hosts with a richer source of truth (a real tz database,
an RTOS vendor API) implement [`Calendar`] on their own type.
*/

use alloc::vec::Vec;

use crate::{
    civil::{Abbreviation, DateTime},
    error::Error,
};

/// A zone indicator: UTC, or whatever the host calendar calls local time.
///
/// This is deliberately not a time zone database identifier. `Local` has
/// no meaning on its own; it means "ask the [`Calendar`]".
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Zone {
    /// Coordinated universal time. Decoded by the engine itself.
    Utc,
    /// The host's local time, supplied by a [`Calendar`].
    Local,
}

impl Zone {
    /// Returns true when this is the UTC zone.
    pub fn is_utc(self) -> bool {
        matches!(self, Zone::Utc)
    }

    /// Returns true when this is the local zone.
    pub fn is_local(self) -> bool {
        matches!(self, Zone::Local)
    }
}

/// An enum indicating whether a particular datetime is in DST or not.
///
/// DST stands for "daylight saving time." When attached to a decoded
/// [`DateTime`], it reports which regime the calendar said was in effect.
/// When attached to an input of
/// [`Resolver::resolve`](crate::Resolver::resolve), it is a hint for
/// picking between the two occurrences of an ambiguous wall-clock time.
///
/// This type has a `From<bool>` trait implementation, where the bool is
/// interpreted as being `true` when DST is active.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum Dst {
    /// DST is not in effect. In other words, standard time is in effect.
    No,
    /// DST is in effect.
    Yes,
}

impl Dst {
    /// Returns true when this value is equal to `Dst::Yes`.
    pub fn is_dst(self) -> bool {
        matches!(self, Dst::Yes)
    }

    /// Returns true when this value is equal to `Dst::No`.
    ///
    /// `std` in this context refers to "standard time." That is, it is the
    /// offset from UTC used when DST is not in effect.
    pub fn is_std(self) -> bool {
        matches!(self, Dst::No)
    }
}

impl From<bool> for Dst {
    fn from(is_dst: bool) -> Dst {
        if is_dst {
            Dst::Yes
        } else {
            Dst::No
        }
    }
}

/// A fixed offset from UTC, in seconds.
///
/// Negative offsets correspond to time zones west of the prime meridian,
/// while positive offsets correspond to time zones east of the prime
/// meridian. Equivalently, in all cases, `civil-time - offset = UTC`.
///
/// The allowed range is `-86_399..=86_399` seconds, i.e. strictly less
/// than one civil day in either direction. That bound is what lets the
/// resolver bracket a local time by stepping single days, and what lets
/// the timestamp range guarantee that decoding never runs off the end of
/// the civil range.
///
/// # Display format
///
/// This type implements the `Display` trait. It will convert the offset
/// to a string format in the form `{sign}{hours}[:{minutes}[:{seconds}]]`,
/// where `minutes` and `seconds` are only present when non-zero.
#[derive(Clone, Copy, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct Offset {
    second: i32,
}

impl Offset {
    /// The offset of UTC itself: zero.
    pub const UTC: Offset = Offset { second: 0 };

    /// The minimum allowed offset, one second short of a day west.
    pub const MIN: Offset = Offset { second: -86_399 };

    /// The maximum allowed offset, one second short of a day east.
    pub const MAX: Offset = Offset { second: 86_399 };

    /// Creates an offset from a number of seconds east of UTC.
    ///
    /// # Errors
    ///
    /// This returns an error when the given number of seconds is not in
    /// the range `-86_399..=86_399`.
    pub fn from_seconds(second: i32) -> Result<Offset, Error> {
        if !(Offset::MIN.second..=Offset::MAX.second).contains(&second) {
            return Err(Error::range(
                "offset seconds",
                second,
                Offset::MIN.second,
                Offset::MAX.second,
            ));
        }
        Ok(Offset { second })
    }

    /// Creates an offset from a number of hours east of UTC, in a `const`
    /// context.
    ///
    /// # Panics
    ///
    /// When the number of hours is not in `-23..=23`.
    pub const fn constant(hours: i8) -> Offset {
        if hours <= -24 || hours >= 24 {
            panic!("invalid offset hours");
        }
        Offset { second: hours as i32 * 3_600 }
    }

    /// Creates an offset from a number of seconds east of UTC, in a
    /// `const` context.
    ///
    /// # Panics
    ///
    /// When the number of seconds is not in `-86_399..=86_399`.
    pub const fn constant_seconds(second: i32) -> Offset {
        if second <= -86_400 || second >= 86_400 {
            panic!("invalid offset seconds");
        }
        Offset { second }
    }

    /// Returns this offset as a number of seconds east of UTC.
    pub fn seconds(self) -> i32 {
        self.second
    }
}

impl core::fmt::Debug for Offset {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "Offset({self})")
    }
}

impl core::fmt::Display for Offset {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let (sign, second) = if self.second < 0 {
            ("-", -self.second)
        } else {
            ("+", self.second)
        };
        let (hours, minutes, seconds) =
            (second / 3_600, second / 60 % 60, second % 60);
        if seconds != 0 {
            write!(f, "{sign}{hours:02}:{minutes:02}:{seconds:02}")
        } else if minutes != 0 {
            write!(f, "{sign}{hours:02}:{minutes:02}")
        } else {
            write!(f, "{sign}{hours:02}")
        }
    }
}

/// The civil calendar function supplied by the host.
///
/// Implementations answer one question: what does the wall clock read at a
/// given epoch second? The engine calls this during local-time resolution
/// (never for UTC, which it decodes itself), treats every call as
/// potentially expensive, and never caches answers across calls.
///
/// Implementations are expected to be total over in-range seconds, like
/// POSIX `gmtime`/`localtime` which produce a result for any representable
/// `time_t`. An error from this trait is a host-level failure and
/// propagates as an adapter failure from whatever engine operation
/// triggered the call; the engine never retries.
///
/// Local time is permitted to be non-monotonic and non-injective: a DST
/// fold maps two distinct seconds to the same wall-clock reading, and a
/// DST gap leaves some wall-clock readings with no second at all. The
/// resolver is built around exactly that.
///
/// Implementations should attach what they know to the returned value:
/// the offset in effect (via [`DateTime::with_offset`]), the DST flag,
/// the abbreviation and the zone. The offset annotation is what makes
/// `%z` formatting work.
pub trait Calendar {
    /// Returns the broken-down local wall-clock time at the given epoch
    /// second.
    fn to_local_datetime(&self, second: i64) -> Result<DateTime, Error>;

    /// Returns the broken-down wall-clock time at the given epoch second
    /// in the given zone.
    ///
    /// The UTC case is answered by the engine's own closed-form Gregorian
    /// decode and never reaches [`Calendar::to_local_datetime`].
    ///
    /// # Errors
    ///
    /// For `Zone::Utc`, only when the second is outside the civil range.
    /// For `Zone::Local`, whatever the implementation reports.
    fn to_datetime(&self, second: i64, zone: Zone) -> Result<DateTime, Error> {
        match zone {
            Zone::Utc => Ok(DateTime::from_second_utc(second)?
                .with_offset(Offset::UTC)
                .with_dst(Dst::No)
                .with_zone(Zone::Utc)
                .with_abbreviation_unchecked("UTC")),
            Zone::Local => self.to_local_datetime(second),
        }
    }
}

impl<'a, C: Calendar + ?Sized> Calendar for &'a C {
    fn to_local_datetime(&self, second: i64) -> Result<DateTime, Error> {
        (**self).to_local_datetime(second)
    }
}

/// A calendar whose local time is UTC.
///
/// This is the right calendar for hosts with no local time configuration
/// at all, and it is what the wire decoder uses internally (marshaled
/// fields are always UTC).
#[derive(Clone, Copy, Debug, Default)]
pub struct Utc;

impl Calendar for Utc {
    fn to_local_datetime(&self, second: i64) -> Result<DateTime, Error> {
        Ok(DateTime::from_second_utc(second)?
            .with_offset(Offset::UTC)
            .with_dst(Dst::No)
            .with_zone(Zone::Local)
            .with_abbreviation_unchecked("UTC"))
    }
}

/// A calendar whose local time is UTC plus a constant offset.
///
/// No DST, no transitions. Local time under this calendar is monotonic
/// and injective, so resolution against it never hits the gap or fold
/// paths.
#[derive(Clone, Debug)]
pub struct Fixed {
    offset: Offset,
    abbreviation: Option<Abbreviation>,
}

impl Fixed {
    /// Creates a calendar with the given constant offset from UTC.
    pub fn new(offset: Offset) -> Fixed {
        Fixed { offset, abbreviation: None }
    }

    /// Sets the abbreviation reported on decoded datetimes.
    ///
    /// # Errors
    ///
    /// This returns an error if the abbreviation is longer than 30 bytes.
    pub fn with_abbreviation(self, abbreviation: &str) -> Result<Fixed, Error> {
        let Some(abbreviation) = Abbreviation::new(abbreviation) else {
            return Err(Error::field(
                "abbreviation length",
                abbreviation.len() as i64,
                0,
                30,
            ));
        };
        Ok(Fixed { abbreviation: Some(abbreviation), ..self })
    }

    /// Returns this calendar's offset.
    pub fn offset(&self) -> Offset {
        self.offset
    }
}

impl Calendar for Fixed {
    fn to_local_datetime(&self, second: i64) -> Result<DateTime, Error> {
        let shifted = second
            .checked_add(i64::from(self.offset.seconds()))
            .ok_or_else(|| {
                Error::range("epoch second", second, i64::MIN, i64::MAX)
            })?;
        let mut dt = DateTime::from_second_utc(shifted)?
            .with_offset(self.offset)
            .with_dst(Dst::No)
            .with_zone(Zone::Local);
        if let Some(ref abbreviation) = self.abbreviation {
            dt = dt.with_abbreviation(abbreviation.as_str())?;
        }
        Ok(dt)
    }
}

/// A calendar described by an explicit table of offset transitions.
///
/// This is the shape of a host-supplied tz rule set: a base regime in
/// effect since the beginning of time, and a sorted list of instants at
/// which the offset (and DST flag, and abbreviation) changes. Lookup is a
/// binary search for the last transition at or before the queried second.
///
/// A table with a spring-forward transition produces a DST gap, and one
/// with a fall-back transition produces a DST fold, which makes this the
/// fixture of choice for exercising the resolver's disambiguation.
///
/// # Example
///
/// ```
/// use epochal::{Calendar, Dst, Offset, Transitions, Zone};
///
/// // US Eastern around the March 2024 spring forward.
/// let mut cal = Transitions::new(Offset::constant(-5), "EST")?;
/// cal.push(1_710_054_000, Offset::constant(-4), Dst::Yes, "EDT")?;
///
/// let dt = cal.to_datetime(1_710_054_000 - 1, Zone::Local)?;
/// assert_eq!(dt.to_string(), "2024-03-10 01:59:59 -0500");
/// let dt = cal.to_datetime(1_710_054_000, Zone::Local)?;
/// assert_eq!(dt.to_string(), "2024-03-10 03:00:00 -0400");
///
/// # Ok::<(), epochal::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct Transitions {
    base: Regime,
    entries: Vec<(i64, Regime)>,
}

/// One offset regime: everything the calendar reports about local time
/// between two transitions.
#[derive(Clone, Copy, Debug)]
struct Regime {
    offset: Offset,
    dst: Dst,
    abbreviation: Option<Abbreviation>,
}

impl Regime {
    fn new(
        offset: Offset,
        dst: Dst,
        abbreviation: &str,
    ) -> Result<Regime, Error> {
        let abbreviation = if abbreviation.is_empty() {
            None
        } else {
            let Some(abbreviation) = Abbreviation::new(abbreviation) else {
                return Err(Error::field(
                    "abbreviation length",
                    abbreviation.len() as i64,
                    0,
                    30,
                ));
            };
            Some(abbreviation)
        };
        Ok(Regime { offset, dst, abbreviation })
    }
}

impl Transitions {
    /// Creates a transition table with the given standard-time regime in
    /// effect before the first transition.
    ///
    /// An empty `abbreviation` means none is reported.
    ///
    /// # Errors
    ///
    /// This returns an error if the abbreviation is longer than 30 bytes.
    pub fn new(
        std_offset: Offset,
        abbreviation: &str,
    ) -> Result<Transitions, Error> {
        Ok(Transitions {
            base: Regime::new(std_offset, Dst::No, abbreviation)?,
            entries: Vec::new(),
        })
    }

    /// Appends a transition taking effect at the given epoch second.
    ///
    /// # Errors
    ///
    /// This returns an error if `start` is not strictly after the previous
    /// transition, or if the abbreviation is longer than 30 bytes.
    pub fn push(
        &mut self,
        start: i64,
        offset: Offset,
        dst: Dst,
        abbreviation: &str,
    ) -> Result<(), Error> {
        if let Some(&(previous, _)) = self.entries.last() {
            if start <= previous {
                return Err(Error::range(
                    "transition start",
                    start,
                    previous + 1,
                    i64::MAX,
                ));
            }
        }
        self.entries.push((start, Regime::new(offset, dst, abbreviation)?));
        Ok(())
    }

    /// Returns the regime in effect at the given epoch second.
    fn lookup(&self, second: i64) -> &Regime {
        let i = self.entries.partition_point(|&(start, _)| start <= second);
        if i == 0 {
            &self.base
        } else {
            &self.entries[i - 1].1
        }
    }
}

impl Calendar for Transitions {
    fn to_local_datetime(&self, second: i64) -> Result<DateTime, Error> {
        let regime = self.lookup(second);
        trace!(
            "transition table maps second {second} to \
             offset {offset}, dst {dst:?}",
            offset = regime.offset,
            dst = regime.dst,
        );
        let shifted = second
            .checked_add(i64::from(regime.offset.seconds()))
            .ok_or_else(|| {
                Error::range("epoch second", second, i64::MIN, i64::MAX)
            })?;
        let mut dt = DateTime::from_second_utc(shifted)?
            .with_offset(regime.offset)
            .with_dst(regime.dst)
            .with_zone(Zone::Local);
        if let Some(ref abbreviation) = regime.abbreviation {
            dt = dt.with_abbreviation(abbreviation.as_str())?;
        }
        Ok(dt)
    }
}

/// US Eastern time for 2024, enough of it to exercise both DST
/// transitions.
///
/// Spring forward: 2024-03-10T07:00Z (02:00 EST becomes 03:00 EDT).
/// Fall back: 2024-11-03T06:00Z (02:00 EDT becomes 01:00 EST).
#[cfg(test)]
pub(crate) fn us_eastern_2024() -> Transitions {
    let mut cal = Transitions::new(Offset::constant(-5), "EST").unwrap();
    cal.push(1_710_054_000, Offset::constant(-4), Dst::Yes, "EDT").unwrap();
    cal.push(1_730_613_600, Offset::constant(-5), Dst::No, "EST").unwrap();
    cal
}
