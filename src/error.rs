use alloc::sync::Arc;

/// Creates a new ad hoc error value from `format_args!`.
macro_rules! err {
    ($($tt:tt)*) => {{
        crate::error::Error::from_args(format_args!($($tt)*))
    }}
}

pub(crate) use err;

/// An error that can occur in this crate.
///
/// The most common kinds of errors are a value being out of its allowed
/// range (either a calendar field or an epoch second), a local wall-clock
/// time for which no timestamp could be found, or a malformed marshaled
/// byte sequence.
///
/// # Introspection
///
/// Other than implementing the [`std::error::Error`] trait when the `std`
/// feature is enabled, and the `Debug` and `Display` traits, this error
/// type provides coarse predicates (like [`Error::is_range`]) for the
/// failure classes that are part of this crate's contract. The predicates
/// inspect the entire cause chain, so wrapping an error with more context
/// never hides its classification.
///
/// # Design
///
/// This crate follows the "one error type" pattern: a single `Error` for
/// every fallible operation, with structured kinds on the inside. Finer
/// grained public error types compose poorly once operations start calling
/// each other (the resolver calls the adapter, the wire decoder calls the
/// resolver, and so on).
#[derive(Clone)]
pub struct Error {
    /// The internal representation of an error.
    ///
    /// This is in an `Arc` to make an `Error` cheaply cloneable and one
    /// word in size. Errors sit on the cold path of nearly every API in
    /// this crate, so keeping the happy-path `Result` small matters more
    /// than the cost of an allocation when something goes wrong.
    inner: Option<Arc<ErrorInner>>,
}

#[derive(Debug)]
struct ErrorInner {
    kind: ErrorKind,
    cause: Option<Error>,
}

impl Error {
    /// Creates a new error value from `core::fmt::Arguments`.
    ///
    /// It is expected to use [`format_args!`](format_args) from Rust's
    /// standard library (available in `core`) to create a
    /// `core::fmt::Arguments`.
    pub fn from_args<'a>(message: core::fmt::Arguments<'a>) -> Error {
        Error::from(ErrorKind::Adhoc(AdhocError::from_args(message)))
    }

    /// Returns true when this error originated from a value out of this
    /// crate's supported epoch or arithmetic range.
    pub fn is_range(&self) -> bool {
        self.any_kind(|kind| matches!(*kind, ErrorKind::Range(_)))
    }

    /// Returns true when this error originated from a negative epoch
    /// second being produced while the unsigned-epoch option was in
    /// effect.
    pub fn is_negative_time(&self) -> bool {
        self.any_kind(|kind| matches!(*kind, ErrorKind::NegativeTime(_)))
    }

    /// Returns true when this error originated from a calendar field that
    /// failed validation (for example, month `13` or `1900-02-29`).
    pub fn is_invalid_field(&self) -> bool {
        self.any_kind(|kind| matches!(*kind, ErrorKind::Field(_)))
    }

    /// Returns true when this error originated from the local-time search
    /// failing to bracket a timestamp within the representable range.
    pub fn is_out_of_range(&self) -> bool {
        self.any_kind(|kind| matches!(*kind, ErrorKind::OutOfRange(_)))
    }

    /// Returns true when this error originated from the host's civil
    /// calendar function failing.
    pub fn is_adapter(&self) -> bool {
        self.any_kind(|kind| matches!(*kind, ErrorKind::Adapter(_)))
    }

    /// Returns true when this error originated from malformed marshaled
    /// bytes.
    pub fn is_decode(&self) -> bool {
        self.any_kind(|kind| matches!(*kind, ErrorKind::Decode(_)))
    }

    fn any_kind(&self, mut predicate: impl FnMut(&ErrorKind) -> bool) -> bool {
        self.chain().any(|err| predicate(err.kind()))
    }
}

impl Error {
    /// Creates a new error indicating that a `given` value is out of the
    /// specified `min..=max` range. The given `what` label is used in the
    /// error message as a human readable description of what exactly is
    /// out of range. (e.g., "seconds")
    #[inline(never)]
    #[cold]
    pub(crate) fn range(
        what: &'static str,
        given: impl Into<i128>,
        min: impl Into<i128>,
        max: impl Into<i128>,
    ) -> Error {
        Error::from(ErrorKind::Range(RangeError {
            what,
            given: given.into(),
            min: min.into(),
            max: max.into(),
        }))
    }

    /// Creates a new error indicating that a calendar field is invalid.
    ///
    /// This is distinct from `Error::range`: it is raised eagerly when
    /// validating broken-down calendar input, before any resolution work
    /// is attempted.
    #[inline(never)]
    #[cold]
    pub(crate) fn field(
        what: &'static str,
        given: impl Into<i64>,
        min: impl Into<i64>,
        max: impl Into<i64>,
    ) -> Error {
        Error::from(ErrorKind::Field(FieldError {
            what,
            given: given.into(),
            min: min.into(),
            max: max.into(),
        }))
    }

    /// Creates a new error indicating that a negative epoch second was
    /// produced where the unsigned-epoch configuration disallows one.
    #[inline(never)]
    #[cold]
    pub(crate) fn negative_time(second: i64) -> Error {
        Error::from(ErrorKind::NegativeTime(NegativeTimeError { second }))
    }

    /// Creates a new error indicating that the local-time search could not
    /// bracket a timestamp within the representable range.
    #[inline(never)]
    #[cold]
    pub(crate) fn out_of_range(what: &'static str) -> Error {
        Error::from(ErrorKind::OutOfRange(OutOfRangeError { what }))
    }

    /// Creates a new error indicating that the host civil calendar
    /// function itself failed. Used as context around the host's error.
    #[inline(never)]
    #[cold]
    pub(crate) fn adapter() -> Error {
        Error::from(ErrorKind::Adapter(AdapterError))
    }

    /// Creates a new error from the given wire decoding failure.
    #[inline(never)]
    #[cold]
    pub(crate) fn decode(err: DecodeError) -> Error {
        Error::from(ErrorKind::Decode(err))
    }

    /// Creates a new error from the given formatting failure.
    #[inline(never)]
    #[cold]
    pub(crate) fn format(err: FormatError) -> Error {
        Error::from(ErrorKind::Format(err))
    }

    pub(crate) fn context(self, consequent: impl IntoError) -> Error {
        self.context_impl(consequent.into_error())
    }

    #[inline(never)]
    #[cold]
    fn context_impl(self, consequent: Error) -> Error {
        let mut err = consequent;
        if err.inner.is_none() {
            err = Error::from(ErrorKind::Unknown);
        }
        let inner = err.inner.as_mut().unwrap();
        assert!(inner.cause.is_none(), "cause of consequence must be `None`");
        // OK because we just created this error so the Arc has one
        // reference.
        Arc::get_mut(inner).unwrap().cause = Some(self);
        err
    }

    /// Returns a chain of error values.
    ///
    /// This starts with the most recent error added to the chain. That is,
    /// the highest level context. The last error in the chain is always
    /// the "root" cause: the error closest to the point where something
    /// has gone wrong.
    ///
    /// The iterator returned is guaranteed to yield at least one error.
    fn chain(&self) -> impl Iterator<Item = &Error> {
        let mut err = self;
        core::iter::once(err).chain(core::iter::from_fn(move || {
            err = err.inner.as_ref().and_then(|inner| inner.cause.as_ref())?;
            Some(err)
        }))
    }

    /// Returns the kind of this error.
    fn kind(&self) -> &ErrorKind {
        self.inner
            .as_ref()
            .map(|inner| &inner.kind)
            .unwrap_or(&ErrorKind::Unknown)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let mut it = self.chain().peekable();
        while let Some(err) = it.next() {
            core::fmt::Display::fmt(err.kind(), f)?;
            if it.peek().is_some() {
                f.write_str(": ")?;
            }
        }
        Ok(())
    }
}

impl core::fmt::Debug for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if !f.alternate() {
            core::fmt::Display::fmt(self, f)
        } else {
            let Some(ref inner) = self.inner else {
                return f
                    .debug_struct("Error")
                    .field("kind", &"None")
                    .finish();
            };
            f.debug_struct("Error")
                .field("kind", &inner.kind)
                .field("cause", &inner.cause)
                .finish()
        }
    }
}

/// The underlying kind of a [`Error`].
#[derive(Debug)]
enum ErrorKind {
    Adhoc(AdhocError),
    Adapter(AdapterError),
    Decode(DecodeError),
    Field(FieldError),
    Format(FormatError),
    NegativeTime(NegativeTimeError),
    OutOfRange(OutOfRangeError),
    Range(RangeError),
    Unknown,
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use self::ErrorKind::*;

        match *self {
            Adhoc(ref err) => err.fmt(f),
            Adapter(ref err) => err.fmt(f),
            Decode(ref err) => err.fmt(f),
            Field(ref err) => err.fmt(f),
            Format(ref err) => err.fmt(f),
            NegativeTime(ref err) => err.fmt(f),
            OutOfRange(ref err) => err.fmt(f),
            Range(ref err) => err.fmt(f),
            Unknown => f.write_str("unknown epochal error"),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error { inner: Some(Arc::new(ErrorInner { kind, cause: None })) }
    }
}

/// A generic error message.
#[derive(Debug)]
struct AdhocError {
    message: alloc::boxed::Box<str>,
}

impl AdhocError {
    fn from_args<'a>(message: core::fmt::Arguments<'a>) -> AdhocError {
        use alloc::string::ToString;

        let message = message.to_string().into_boxed_str();
        AdhocError { message }
    }
}

impl core::fmt::Display for AdhocError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.message, f)
    }
}

/// An error that occurs when an input value is out of bounds.
///
/// The error message produced by this type will include a name describing
/// which input was out of bounds, the value given and its minimum and
/// maximum allowed values.
#[derive(Debug)]
struct RangeError {
    what: &'static str,
    given: i128,
    min: i128,
    max: i128,
}

impl core::fmt::Display for RangeError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let RangeError { what, given, min, max } = *self;
        write!(
            f,
            "parameter '{what}' with value {given} \
             is not in the required range of {min}..={max}",
        )
    }
}

/// An error that occurs when a broken-down calendar field is invalid.
#[derive(Debug)]
struct FieldError {
    what: &'static str,
    given: i64,
    min: i64,
    max: i64,
}

impl core::fmt::Display for FieldError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let FieldError { what, given, min, max } = *self;
        write!(
            f,
            "calendar field '{what}' with value {given} \
             is not in the required range of {min}..={max}",
        )
    }
}

/// An error for a negative epoch second under the unsigned-epoch option.
#[derive(Debug)]
struct NegativeTimeError {
    second: i64,
}

impl core::fmt::Display for NegativeTimeError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "epoch second {second} is negative, but negative timestamps \
             are disabled",
            second = self.second,
        )
    }
}

/// An error for a local-time search that found no answer in range.
#[derive(Debug)]
struct OutOfRangeError {
    what: &'static str,
}

impl core::fmt::Display for OutOfRangeError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "{what} not representable within the supported timestamp range",
            what = self.what,
        )
    }
}

/// An error used as context around a failing civil calendar adapter.
#[derive(Debug)]
struct AdapterError;

impl core::fmt::Display for AdapterError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str("civil calendar adapter failed")
    }
}

/// An error that occurs when decoding marshaled bytes.
#[derive(Debug)]
pub(crate) enum DecodeError {
    /// The input has an impossible length.
    Length { len: usize },
    /// The version flag bit is not set.
    Version,
    /// The microsecond field does not fit in `0..1_000_000`.
    Micros { given: u32 },
    /// A reconstructed calendar field failed validation. The underlying
    /// field error is attached as the cause.
    Field,
    /// The reconstructed fields are valid but name an instant outside
    /// the representable timestamp range.
    Unrepresentable,
}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match *self {
            DecodeError::Length { len } => write!(
                f,
                "marshaled timestamp must be 8, 9 or 10 bytes, \
                 but got {len} bytes",
            ),
            DecodeError::Version => {
                f.write_str("marshaled timestamp lacks the version flag bit")
            }
            DecodeError::Micros { given } => write!(
                f,
                "marshaled microsecond field has value {given}, \
                 which exceeds the maximum of 999999",
            ),
            DecodeError::Field => {
                f.write_str("marshaled timestamp has an invalid calendar field")
            }
            DecodeError::Unrepresentable => f.write_str(
                "marshaled timestamp is outside the representable range",
            ),
        }
    }
}

/// An error that occurs when formatting with a strftime-style pattern.
#[derive(Debug)]
pub(crate) enum FormatError {
    /// The pattern contains an unsupported conversion directive.
    UnknownDirective { directive: u8 },
    /// The pattern ends right after a `%`.
    UnexpectedEnd,
    /// The directive requires a UTC offset annotation, but the value being
    /// formatted has none.
    RequiresOffset { directive: u8 },
}

impl core::fmt::Display for FormatError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match *self {
            FormatError::UnknownDirective { directive } => write!(
                f,
                "unsupported conversion directive %{directive}",
                directive = char::from(directive),
            ),
            FormatError::UnexpectedEnd => {
                f.write_str("format pattern ends with an unterminated %")
            }
            FormatError::RequiresOffset { directive } => write!(
                f,
                "%{directive} requires a UTC offset, \
                 but none is known for this value",
                directive = char::from(directive),
            ),
        }
    }
}

/// A simple trait to encapsulate automatic conversion to `Error`.
///
/// This trait basically exists to make `Error::context` work without
/// needing to rely on public `From` impls.
pub(crate) trait IntoError {
    fn into_error(self) -> Error;
}

impl IntoError for Error {
    #[inline(always)]
    fn into_error(self) -> Error {
        self
    }
}

/// A trait for contextualizing error values.
///
/// This makes it easy to contextualize either `Error` or
/// `Result<T, Error>`. Specifically, in the latter case, it absolves one of
/// the need to call `map_err` everywhere one wants to add context to an
/// error.
///
/// This trick was borrowed from `anyhow`.
pub(crate) trait ErrorContext<T, E> {
    /// Contextualize the given consequent error with this (`self`) error as
    /// the cause.
    ///
    /// This is equivalent to saying that "consequent is caused by self."
    fn context(self, consequent: impl IntoError) -> Result<T, Error>;

    /// Like `context`, but hides error construction within a closure.
    ///
    /// This is useful when the creation of the consequent error is
    /// potentially costly (i.e., it allocates). The closure avoids paying
    /// the cost of contextual error creation in the happy path.
    fn with_context<C: IntoError>(
        self,
        consequent: impl FnOnce() -> C,
    ) -> Result<T, Error>;
}

impl<T, E> ErrorContext<T, E> for Result<T, E>
where
    E: IntoError,
{
    fn context(self, consequent: impl IntoError) -> Result<T, Error> {
        self.map_err(|err| {
            err.into_error().context_impl(consequent.into_error())
        })
    }

    fn with_context<C: IntoError>(
        self,
        consequent: impl FnOnce() -> C,
    ) -> Result<T, Error> {
        self.map_err(|err| {
            err.into_error().context_impl(consequent().into_error())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // We test that our 'Error' type is the size we expect. This isn't an
    // API guarantee, but if the size increases, we really want to make sure
    // we decide to do that intentionally. So this should be a speed bump.
    #[test]
    fn error_size() {
        let expected_size = core::mem::size_of::<usize>();
        assert_eq!(expected_size, core::mem::size_of::<Error>());
    }

    #[test]
    fn predicates_see_through_context() {
        let err = Error::field("month", 13, 1, 12);
        assert!(err.is_invalid_field());
        let err = err.context(Error::adapter());
        assert!(err.is_invalid_field());
        assert!(err.is_adapter());
        assert!(!err.is_range());
    }

    #[test]
    fn display_chains_causes() {
        let err = Error::range("second", 1i64, 0i64, 59i64)
            .context(err!("while validating a datetime"));
        let got = alloc::string::ToString::to_string(&err);
        assert!(got.starts_with("while validating a datetime: "), "{got}");
    }
}
