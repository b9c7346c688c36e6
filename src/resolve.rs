/*!
Resolution of broken-down civil time back to a timestamp.

The UTC direction is a closed form. The local direction is the interesting
one: local time is an opaque, non-monotonic function supplied by the host
calendar, so the resolver inverts it numerically. It brackets the answer,
bisects (with an interpolated first guess per iteration, since wall-clock
time is nearly linear in the timestamp), and then deals with the two ways
the inversion can be ill-posed: wall-clock readings that never happen (DST
gap) and readings that happen twice (DST fold).
*/

use crate::{
    cal::{Calendar, Zone},
    civil::DateTime,
    error::{Error, ErrorContext},
    timestamp::{Timestamp, MAX_SECOND, MIN_SECOND},
    util::common::SECONDS_PER_CIVIL_DAY,
};

/// The number of local decodes a single resolution may issue before it
/// gives up. A well behaved calendar needs at most a few dozen: the
/// bracket is a handful of days wide and bisection halves it every
/// iteration. The cap only matters for calendars that violate the trait
/// contract (e.g. answers that jump around arbitrarily).
const MAX_DECODES: u32 = 128;

/// A probe distance used to discover the second occurrence of an
/// ambiguous wall-clock time. DST savings in the wild are at most two
/// hours; probing one period to each side and then correcting by the
/// observed civil difference lands exactly on the duplicate if one
/// exists.
const DST_PERIOD: i64 = 2 * 60 * 60;

/// Resolves broken-down civil time to a [`Timestamp`] against a
/// [`Calendar`].
///
/// A resolver borrows the calendar and carries the resolution options.
/// It keeps no state between calls: every [`Resolver::resolve`] is
/// independent and side-effect-free apart from the calendar decodes it
/// issues.
///
/// # Example
///
/// ```
/// use epochal::{DateTime, Resolver, Utc, Zone};
///
/// let dt = DateTime::new(2000, 1, 1, 20, 15, 1)?;
/// let ts = Resolver::new(&Utc).resolve(&dt, Zone::Utc)?;
/// assert_eq!(ts.second(), 946_757_701);
///
/// # Ok::<(), epochal::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct Resolver<'c, C: ?Sized> {
    calendar: &'c C,
    unsigned_epoch: bool,
}

impl<'c, C: Calendar + ?Sized> Resolver<'c, C> {
    /// Creates a resolver over the given calendar with default options:
    /// negative (pre-1970) results are allowed.
    pub fn new(calendar: &'c C) -> Resolver<'c, C> {
        Resolver { calendar, unsigned_epoch: false }
    }

    /// Sets whether resolved timestamps before the Unix epoch are
    /// rejected.
    ///
    /// This is for hosts whose epoch-second representation is unsigned.
    /// When enabled, a resolution that lands before 1970 fails with a
    /// negative-time error (see [`Error::is_negative_time`]) instead of
    /// returning a negative second.
    pub fn unsigned_epoch(self, yes: bool) -> Resolver<'c, C> {
        Resolver { unsigned_epoch: yes, ..self }
    }

    /// Finds the timestamp at which the calendar reads the given civil
    /// fields in the given zone.
    ///
    /// Only the six civil fields of `dt` participate; the derived weekday
    /// and day of year are outputs of decoding, never inputs here. The
    /// `dst` annotation, if set, is the disambiguation hint for ambiguous
    /// local readings.
    ///
    /// For `Zone::Utc` this is a closed-form computation. For
    /// `Zone::Local` it searches the calendar:
    ///
    /// * An unambiguous reading resolves to the unique timestamp that
    /// decodes back to `dt`.
    /// * A reading inside a DST gap (it never occurs on the wall clock)
    /// resolves, without error, to the nearest existing boundary plus the
    /// wall-clock distance into the gap. So on a clock that jumps from
    /// `02:00` to `03:00`, `02:30` resolves to the timestamp that reads
    /// `03:30`.
    /// * A reading inside a DST fold (it occurs twice) resolves to the
    /// occurrence whose DST flag matches the hint; with no hint, to the
    /// earlier occurrence, deterministically.
    ///
    /// # Errors
    ///
    /// * An out-of-range error when no timestamp within the representable
    /// range can produce the reading (see [`Error::is_out_of_range`]).
    /// * An adapter error when the calendar itself fails (see
    /// [`Error::is_adapter`]); the resolver never retries.
    /// * A negative-time error when the [`Resolver::unsigned_epoch`]
    /// option is set and the result precedes the epoch.
    pub fn resolve(
        &self,
        dt: &DateTime,
        zone: Zone,
    ) -> Result<Timestamp, Error> {
        // The leap-second-agnostic linearization of the civil fields.
        // Exact for UTC, and the first approximation for local time.
        let target = dt.utc_second();
        let ts = match zone {
            Zone::Utc => {
                if !(MIN_SECOND..=MAX_SECOND).contains(&target) {
                    return Err(Error::out_of_range("UTC datetime"));
                }
                Timestamp::new(target, 0)?
            }
            Zone::Local => self.resolve_local(dt, target)?,
        };
        if self.unsigned_epoch && ts.second() < 0 {
            return Err(Error::negative_time(ts.second()));
        }
        Ok(ts)
    }

    /// The local-time search. `target` is `dt.utc_second()`.
    fn resolve_local(
        &self,
        dt: &DateTime,
        target: i64,
    ) -> Result<Timestamp, Error> {
        let mut budget = DecodeBudget(MAX_DECODES);

        let guess = target.clamp(MIN_SECOND, MAX_SECOND);
        let mut lo = guess;
        let mut hi = guess;
        let mut dlo = self.decode(lo, &mut budget)?;
        let mut dhi = dlo;

        // Establish decode(lo) <= dt <= decode(hi). The offset bound is
        // under one civil day, so a couple of day-sized steps from the
        // UTC interpretation always settle each side, unless the answer
        // lies outside the representable range entirely.
        let mut steps = 0;
        while dlo > *dt {
            if lo == MIN_SECOND || steps >= 2 {
                return Err(Error::out_of_range("local datetime"));
            }
            lo = (lo - SECONDS_PER_CIVIL_DAY).max(MIN_SECOND);
            dlo = self.decode(lo, &mut budget)?;
            steps += 1;
        }
        let mut steps = 0;
        while dhi < *dt {
            if hi == MAX_SECOND || steps >= 2 {
                return Err(Error::out_of_range("local datetime"));
            }
            hi = (hi + SECONDS_PER_CIVIL_DAY).min(MAX_SECOND);
            dhi = self.decode(hi, &mut budget)?;
            steps += 1;
        }

        // Shrink the bracket to one second, stopping early on an exact
        // reading. Prefer a candidate interpolated from the civil
        // distances (local time is linear between transitions, so this
        // usually lands in one or two probes); fall back to the midpoint
        // whenever interpolation leaves the open interval.
        let mut found = if dlo == *dt {
            Some((lo, dlo))
        } else if dhi == *dt {
            Some((hi, dhi))
        } else {
            None
        };
        while found.is_none() && hi - lo > 1 {
            let numerator = target - dlo.utc_second();
            let denominator = dhi.utc_second() - dlo.utc_second();
            let mut mid = if denominator > 0 {
                let interpolated = i128::from(hi - lo)
                    * i128::from(numerator)
                    / i128::from(denominator);
                lo + interpolated as i64
            } else {
                lo + (hi - lo) / 2
            };
            if mid <= lo || mid >= hi {
                mid = lo + (hi - lo) / 2;
            }
            let dmid = self.decode(mid, &mut budget)?;
            trace!(
                "local search bracket [{lo}, {hi}], probed {mid} \
                 reading {dmid}",
                dmid = dmid,
            );
            match dmid.cmp(dt) {
                core::cmp::Ordering::Less => {
                    lo = mid;
                    dlo = dmid;
                }
                core::cmp::Ordering::Equal => found = Some((mid, dmid)),
                core::cmp::Ordering::Greater => {
                    hi = mid;
                    dhi = dmid;
                }
            }
        }

        let Some((primary, dprimary)) = found else {
            // The reading is inside a gap: decode(lo) < dt < decode(lo+1).
            // Extrapolate linearly from the boundary below, interpreting
            // the nonexistent reading as a wall-clock distance past it.
            let delta = target - dlo.utc_second();
            debug!(
                "local reading {dt} is in a wall-clock gap; \
                 extrapolating {delta}s past second {lo}",
            );
            let second = lo.checked_add(delta).unwrap_or(i64::MAX);
            return Timestamp::new(second, 0)
                .context(Error::out_of_range("local datetime in a gap"));
        };

        // The reading exists. It may exist twice (a fold); probe one DST
        // period to each side, correcting by the observed civil
        // difference, to find the other occurrence if there is one.
        let mut other = None;
        for probe_delta in [-DST_PERIOD, DST_PERIOD] {
            let probe = primary.saturating_add(probe_delta);
            if !(MIN_SECOND..=MAX_SECOND).contains(&probe) {
                continue;
            }
            let dprobe = self.decode(probe, &mut budget)?;
            let candidate = probe + (target - dprobe.utc_second());
            if candidate == primary
                || !(MIN_SECOND..=MAX_SECOND).contains(&candidate)
            {
                continue;
            }
            let dcandidate = self.decode(candidate, &mut budget)?;
            if dcandidate == *dt {
                other = Some((candidate, dcandidate));
                break;
            }
        }

        let second = match other {
            None => primary,
            Some((candidate, dcandidate)) => {
                let (earlier, dearlier, later, dlater) =
                    if candidate < primary {
                        (candidate, dcandidate, primary, dprimary)
                    } else {
                        (primary, dprimary, candidate, dcandidate)
                    };
                debug!(
                    "local reading {dt} is ambiguous: \
                     occurs at {earlier} and {later}",
                );
                match dt.dst() {
                    // No hint: the earlier occurrence, deterministically.
                    None => earlier,
                    Some(hint) => {
                        let earlier_matches = dearlier.dst() == Some(hint);
                        let later_matches = dlater.dst() == Some(hint);
                        if earlier_matches && !later_matches {
                            earlier
                        } else if later_matches && !earlier_matches {
                            later
                        } else if hint.is_dst() {
                            later
                        } else {
                            earlier
                        }
                    }
                }
            }
        };
        Timestamp::new(second, 0)
    }

    fn decode(
        &self,
        second: i64,
        budget: &mut DecodeBudget,
    ) -> Result<DateTime, Error> {
        budget.spend()?;
        self.calendar
            .to_local_datetime(second)
            .with_context(|| Error::adapter())
    }
}

/// Caps the number of adapter decodes per resolution.
struct DecodeBudget(u32);

impl DecodeBudget {
    fn spend(&mut self) -> Result<(), Error> {
        if self.0 == 0 {
            return Err(Error::out_of_range("local datetime"));
        }
        self.0 -= 1;
        Ok(())
    }
}
