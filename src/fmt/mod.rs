/*!
Rendering of broken-down time as text.

The [`strftime`] submodule provides "printf" style formatting over a
decoded [`DateTime`](crate::DateTime). The default rendering (no pattern)
is the `Display` impl on `DateTime` itself.
*/

pub mod strftime;

#[cfg(feature = "serde")]
mod serde;
