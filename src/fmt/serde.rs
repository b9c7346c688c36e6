/*!
Serde trait implementations, enabled by the `serde` crate feature.

[`Timestamp`] and [`SignedDuration`] serialize as a two-element
`(second, nanosecond)` sequence, and [`Zone`] as the strings `"Utc"` and
`"Local"`. Deserialization goes back through the same validation as
ordinary construction, so malformed data is rejected rather than smuggled
into an invariant-violating value.

Note that this is unrelated to the compact binary form in
[`wire`](crate::wire); these impls exist for embedding values in
caller-defined serde documents.
*/

use serde::{
    de::{self, Deserialize, Deserializer, SeqAccess, Visitor},
    ser::{Serialize, SerializeTuple, Serializer},
};

use crate::{SignedDuration, Timestamp, Zone};

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.second())?;
        tuple.serialize_element(&self.nanosecond())?;
        tuple.end()
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Timestamp, D::Error> {
        let (second, nanosecond) = deserialize_pair(
            deserializer,
            "a [second, nanosecond] timestamp pair",
        )?;
        Timestamp::new(second, nanosecond).map_err(de::Error::custom)
    }
}

impl Serialize for SignedDuration {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.second())?;
        tuple.serialize_element(&self.nanosecond())?;
        tuple.end()
    }
}

impl<'de> Deserialize<'de> for SignedDuration {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<SignedDuration, D::Error> {
        let (second, nanosecond) = deserialize_pair(
            deserializer,
            "a [second, nanosecond] duration pair",
        )?;
        if nanosecond >= 1_000_000_000 {
            return Err(de::Error::custom(
                "duration nanosecond not in 0..1000000000",
            ));
        }
        SignedDuration::normalized(second, i64::from(nanosecond))
            .map_err(de::Error::custom)
    }
}

impl Serialize for Zone {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(match *self {
            Zone::Utc => "Utc",
            Zone::Local => "Local",
        })
    }
}

impl<'de> Deserialize<'de> for Zone {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Zone, D::Error> {
        struct ZoneVisitor;

        impl<'de> Visitor<'de> for ZoneVisitor {
            type Value = Zone;

            fn expecting(
                &self,
                f: &mut core::fmt::Formatter,
            ) -> core::fmt::Result {
                f.write_str(r#""Utc" or "Local""#)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Zone, E> {
                match v {
                    "Utc" => Ok(Zone::Utc),
                    "Local" => Ok(Zone::Local),
                    unknown => Err(de::Error::unknown_variant(
                        unknown,
                        &["Utc", "Local"],
                    )),
                }
            }
        }

        deserializer.deserialize_str(ZoneVisitor)
    }
}

/// Deserializes a `(second, nanosecond)` two-element sequence.
fn deserialize_pair<'de, D: Deserializer<'de>>(
    deserializer: D,
    expecting: &'static str,
) -> Result<(i64, u32), D::Error> {
    struct PairVisitor(&'static str);

    impl<'de> Visitor<'de> for PairVisitor {
        type Value = (i64, u32);

        fn expecting(
            &self,
            f: &mut core::fmt::Formatter,
        ) -> core::fmt::Result {
            f.write_str(self.0)
        }

        fn visit_seq<A: SeqAccess<'de>>(
            self,
            mut seq: A,
        ) -> Result<(i64, u32), A::Error> {
            let second: i64 = seq
                .next_element()?
                .ok_or_else(|| de::Error::invalid_length(0, &self))?;
            let nanosecond: u32 = seq
                .next_element()?
                .ok_or_else(|| de::Error::invalid_length(1, &self))?;
            Ok((second, nanosecond))
        }
    }

    deserializer.deserialize_tuple(2, PairVisitor(expecting))
}
