/*!
A calendar/epoch time resolution engine.

This crate converts between an epoch [`Timestamp`] (seconds plus a
nanosecond fraction since `1970-01-01T00:00:00Z`) and broken-down civil
time (a [`DateTime`]: year, month, day, hour, minute, second, with derived
weekday and day-of-year), in either UTC or a host-supplied local zone,
together with overflow-checked arithmetic, strftime-style formatting and a
compact binary wire form.

The interesting direction is civil to epoch in local time. Local time is
an opaque function behind the [`Calendar`] trait, the moral equivalent of
POSIX `localtime`, and it is neither monotonic nor injective: DST makes
some wall-clock readings happen twice and others never. The [`Resolver`]
inverts it anyway, with a bounded numeric search, and resolves the
ambiguous cases by policy: readings in a gap extrapolate from the nearest
boundary, readings in a fold are picked by a DST hint (earlier occurrence
when there is none).

# Example

```
use epochal::{Calendar, DateTime, Resolver, Utc, Zone};

// Civil time to epoch seconds...
let dt = DateTime::new(2000, 1, 1, 20, 15, 1)?;
let ts = Resolver::new(&Utc).resolve(&dt, Zone::Utc)?;
assert_eq!(ts.second(), 946_757_701);

// ...and back again.
let back = Utc.to_datetime(ts.second(), Zone::Utc)?;
assert_eq!(back, dt);
assert_eq!(back.to_string(), "2000-01-01 20:15:01 UTC");

# Ok::<(), epochal::Error>(())
```

# Crate features

* **std** (enabled by default) - Implements the standard library's
`Error` trait for this crate's error type. This crate is otherwise
`no_std`, though it always requires `alloc`.
* **logging** - Emits some `log` crate messages from the local-time
search. Callers must install a logger to see them.
* **serde** - Implements `Serialize`/`Deserialize` for [`Timestamp`],
[`SignedDuration`] and [`Zone`].
*/

#![no_std]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
// We generally want all types to impl Debug.
#![warn(missing_debug_implementations)]

#[cfg(any(test, feature = "std"))]
extern crate std;

// Errors, abbreviation-free messages and the wire form all want the heap.
// A core-only mode would mean degrading all three; nothing so far has
// asked for one.
extern crate alloc;

pub use crate::{
    cal::{Calendar, Dst, Fixed, Offset, Transitions, Utc, Zone},
    civil::{DateTime, Weekday},
    error::Error,
    resolve::Resolver,
    timestamp::{SignedDuration, Timestamp},
};

#[macro_use]
mod logging;

mod cal;
mod civil;
mod error;
pub mod fmt;
mod resolve;
mod timestamp;
mod util;
pub mod wire;

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    /// DST behavior is pinned down to concrete seconds elsewhere; this is
    /// the end-to-end pass through the whole engine in one place: decode,
    /// resolve, format, marshal.
    #[test]
    fn engine_end_to_end() {
        let _ = env_logger::try_init();

        let cal = crate::cal::us_eastern_2024();
        let resolver = Resolver::new(&cal);

        let dt = DateTime::new(2024, 7, 15, 17, 30, 59).unwrap();
        let ts = resolver.resolve(&dt, Zone::Local).unwrap();
        let reading = cal.to_datetime(ts.second(), Zone::Local).unwrap();
        assert_eq!(reading, dt);
        assert_eq!(
            fmt::strftime::format("%Y-%m-%d %H:%M:%S %Z %z", &reading)
                .unwrap(),
            "2024-07-15 17:30:59 EDT -0400",
        );

        let (back, zone) = wire::decode(&wire::encode(ts, Zone::Local)).unwrap();
        assert_eq!(back, ts);
        assert_eq!(zone, Zone::Local);

        let later = ts
            .checked_add(SignedDuration::normalized(3_600, 500_000_000).unwrap())
            .unwrap();
        assert_eq!(later.seconds_since(ts), 3_600.5);
        assert_eq!(
            cal.to_datetime(later.second(), Zone::Local).unwrap().to_string(),
            "2024-07-15 18:30:59 -0400",
        );
    }
}
