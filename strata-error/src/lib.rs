#![deny(missing_docs)]

//! This crate defines error & result types for Strata.
//!
//! The variants map onto the failure classes of the encoding-tree codec: requested rows outside a
//! node's extent, buffers whose contents violate the encoding invariants, descriptors written by
//! a newer version, encoder policies that cannot represent the data, and I/O failures surfaced
//! by the buffer store. No error is ever recovered from inside the codec.

mod ext;

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::fmt::{Debug, Display, Formatter};
use std::ops::Deref;
use std::sync::Arc;
use std::{fmt, io};

pub use ext::*;

/// A string that can be used as an error message.
#[derive(Debug)]
pub struct ErrString(Cow<'static, str>);

impl<T> From<T> for ErrString
where
    T: Into<Cow<'static, str>>,
{
    fn from(msg: T) -> Self {
        Self(msg.into())
    }
}

impl AsRef<str> for ErrString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for ErrString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for ErrString {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// The top-level error type for Strata.
#[derive(thiserror::Error)]
#[non_exhaustive]
pub enum StrataError {
    /// A requested row or index range lies outside the declared extent.
    #[error("index {0} out of bounds from {1} to {2}\nBacktrace:\n{3}")]
    OutOfBounds(usize, usize, usize, Box<Backtrace>),
    /// A requested row range is malformed or outside the extent of an encoding node.
    #[error("{0}\nBacktrace:\n{1}")]
    RangeError(ErrString, Box<Backtrace>),
    /// Stored offsets, indices or buffers violate the encoding invariants.
    #[error("{0}\nBacktrace:\n{1}")]
    CorruptData(ErrString, Box<Backtrace>),
    /// An unknown encoding variant, buffer location or compression scheme.
    #[error("{0}\nBacktrace:\n{1}")]
    UnsupportedEncoding(ErrString, Box<Backtrace>),
    /// The encoder was asked to produce a tree that cannot represent the given values.
    #[error("{0}\nBacktrace:\n{1}")]
    EncodingPolicy(ErrString, Box<Backtrace>),
    /// A buffer reference could not be resolved by the buffer store.
    #[error("{0}\nBacktrace:\n{1}")]
    NotFound(ErrString, Box<Backtrace>),
    /// An invalid argument was provided.
    #[error("{0}\nBacktrace:\n{1}")]
    InvalidArgument(ErrString, Box<Backtrace>),
    /// A serialized descriptor could not be read.
    #[error("{0}\nBacktrace:\n{1}")]
    InvalidSerde(ErrString, Box<Backtrace>),
    /// An assertion failed.
    #[error("{0}\nBacktrace:\n{1}")]
    AssertionFailed(ErrString, Box<Backtrace>),
    /// A wrapper for other errors, carrying additional context.
    #[error("{0}: {1}")]
    Context(ErrString, #[source] Box<StrataError>),
    /// A wrapper for shared errors that require cloning.
    #[error(transparent)]
    Shared(Arc<StrataError>),
    /// A wrapper for IO errors.
    #[error("{0}\nBacktrace:\n{1}")]
    IOError(io::Error, Box<Backtrace>),
    /// A wrapper for errors from the protobuf library.
    #[cfg(feature = "prost")]
    #[error("{0}\nBacktrace:\n{1}")]
    ProstDecodeError(prost::DecodeError, Box<Backtrace>),
    /// A wrapper for errors from the protobuf library.
    #[cfg(feature = "prost")]
    #[error("{0}\nBacktrace:\n{1}")]
    ProstEncodeError(prost::EncodeError, Box<Backtrace>),
}

impl StrataError {
    /// Adds additional context to an error.
    pub fn with_context<T: Into<ErrString>>(self, msg: T) -> Self {
        StrataError::Context(msg.into(), Box::new(self))
    }

    /// Returns true if this error, once unwrapped from any context, is a range error.
    pub fn is_range_error(&self) -> bool {
        matches!(
            self.root(),
            StrataError::OutOfBounds(..) | StrataError::RangeError(..)
        )
    }

    /// Returns true if this error, once unwrapped from any context, reports corrupt data.
    pub fn is_corrupt_data(&self) -> bool {
        matches!(self.root(), StrataError::CorruptData(..))
    }

    /// Returns true if this error, once unwrapped from any context, reports an unsupported
    /// encoding.
    pub fn is_unsupported_encoding(&self) -> bool {
        matches!(self.root(), StrataError::UnsupportedEncoding(..))
    }

    /// Returns true if this error, once unwrapped from any context, reports a policy violation
    /// detected by the encoder.
    pub fn is_encoding_policy(&self) -> bool {
        matches!(self.root(), StrataError::EncodingPolicy(..))
    }

    /// Returns true if this error, once unwrapped from any context, originated in the buffer
    /// store.
    pub fn is_io(&self) -> bool {
        matches!(
            self.root(),
            StrataError::IOError(..) | StrataError::NotFound(..)
        )
    }

    /// The innermost error, skipping over [`StrataError::Context`] and [`StrataError::Shared`].
    pub fn root(&self) -> &StrataError {
        match self {
            StrataError::Context(_, inner) => inner.root(),
            StrataError::Shared(inner) => inner.root(),
            other => other,
        }
    }
}

impl Debug for StrataError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

/// A type alias for Results that return StrataErrors as their error type.
pub type StrataResult<T> = Result<T, StrataError>;

/// A strata result that can be cloned and shared between concurrent readers.
pub type SharedStrataResult<T> = Result<T, Arc<StrataError>>;

impl From<Arc<StrataError>> for StrataError {
    fn from(value: Arc<StrataError>) -> Self {
        Self::from(&value)
    }
}

impl From<&Arc<StrataError>> for StrataError {
    fn from(e: &Arc<StrataError>) -> Self {
        if let StrataError::Shared(e_inner) = e.as_ref() {
            // don't re-wrap
            StrataError::Shared(Arc::clone(e_inner))
        } else {
            StrataError::Shared(Arc::clone(e))
        }
    }
}

impl From<io::Error> for StrataError {
    fn from(value: io::Error) -> Self {
        StrataError::IOError(value, Box::new(Backtrace::capture()))
    }
}

#[cfg(feature = "prost")]
impl From<prost::DecodeError> for StrataError {
    fn from(value: prost::DecodeError) -> Self {
        StrataError::ProstDecodeError(value, Box::new(Backtrace::capture()))
    }
}

#[cfg(feature = "prost")]
impl From<prost::EncodeError> for StrataError {
    fn from(value: prost::EncodeError) -> Self {
        StrataError::ProstEncodeError(value, Box::new(Backtrace::capture()))
    }
}

/// A trait for unwrapping a StrataResult.
pub trait StrataUnwrap {
    /// The type of the value being unwrapped.
    type Output;

    /// Returns the value of the result if it is Ok, otherwise panics with the error.
    /// Should be called only in contexts where the error condition represents a bug (programmer error).
    fn strata_unwrap(self) -> Self::Output;
}

impl<T, E> StrataUnwrap for Result<T, E>
where
    E: Into<StrataError>,
{
    type Output = T;

    #[inline(always)]
    fn strata_unwrap(self) -> Self::Output {
        self.map_err(|err| err.into())
            .unwrap_or_else(|err| strata_panic!(err))
    }
}

/// A trait for expect-ing a StrataResult or an Option.
pub trait StrataExpect {
    /// The type of the value being expected.
    type Output;

    /// Returns the value of the result if it is Ok, otherwise panics with the error.
    /// Should be called only in contexts where the error condition represents a bug (programmer error).
    fn strata_expect(self, msg: &str) -> Self::Output;
}

impl<T, E> StrataExpect for Result<T, E>
where
    E: Into<StrataError>,
{
    type Output = T;

    #[inline(always)]
    fn strata_expect(self, msg: &str) -> Self::Output {
        self.map_err(|err| err.into())
            .unwrap_or_else(|e| strata_panic!(e.with_context(msg.to_string())))
    }
}

impl<T> StrataExpect for Option<T> {
    type Output = T;

    #[inline(always)]
    fn strata_expect(self, msg: &str) -> Self::Output {
        self.unwrap_or_else(|| {
            let err = StrataError::AssertionFailed(
                msg.to_string().into(),
                Box::new(Backtrace::capture()),
            );
            strata_panic!(err)
        })
    }
}

/// A convenient macro for creating a StrataError.
#[macro_export]
macro_rules! strata_err {
    (OutOfBounds: $idx:expr, $start:expr, $stop:expr) => {{
        use std::backtrace::Backtrace;
        $crate::__private::must_use(
            $crate::StrataError::OutOfBounds($idx, $start, $stop, Box::new(Backtrace::capture()))
        )
    }};
    (Context: $msg:literal, $err:expr) => {{
        $crate::__private::must_use(
            $crate::StrataError::Context($msg.into(), Box::new($err))
        )
    }};
    ($variant:ident: $fmt:literal $(, $arg:expr)* $(,)?) => {{
        use std::backtrace::Backtrace;
        $crate::__private::must_use(
            $crate::StrataError::$variant(format!($fmt, $($arg),*).into(), Box::new(Backtrace::capture()))
        )
    }};
    ($variant:ident: $err:expr $(,)?) => {
        $crate::__private::must_use(
            $crate::StrataError::$variant($err)
        )
    };
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::strata_err!(InvalidArgument: $fmt, $($arg),*)
    };
}

/// A convenience macro for returning a StrataError.
#[macro_export]
macro_rules! strata_bail {
    ($($tt:tt)+) => {
        return Err($crate::strata_err!($($tt)+))
    };
}

/// A convenience macro for panicking with a StrataError.
#[macro_export]
macro_rules! strata_panic {
    (OutOfBounds: $idx:expr, $start:expr, $stop:expr) => {{
        $crate::strata_panic!($crate::strata_err!(OutOfBounds: $idx, $start, $stop))
    }};
    ($variant:ident: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::strata_panic!($crate::strata_err!($variant: $fmt, $($arg),*))
    };
    ($err:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {{
        let err: $crate::StrataError = $err;
        panic!("{}", err.with_context(format!($fmt, $($arg),*)))
    }};
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::strata_panic!($crate::strata_err!($fmt, $($arg),*))
    };
    ($err:expr) => {{
        let err: $crate::StrataError = $err;
        panic!("{}", err)
    }};
}

// Not public, referenced by macros only.
#[doc(hidden)]
pub mod __private {
    #[doc(hidden)]
    #[inline]
    #[must_use]
    pub const fn must_use(s: crate::StrataError) -> crate::StrataError {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fails_with_range() -> StrataResult<()> {
        strata_bail!(RangeError: "rows {}..{} exceed {}", 3, 9, 5)
    }

    #[test]
    fn context_preserves_root_kind() {
        let err = fails_with_range()
            .map_err(|e| e.with_context("decoding page 2"))
            .unwrap_err();
        assert!(err.is_range_error());
        assert!(err.to_string().starts_with("decoding page 2: rows 3..9 exceed 5"));
    }

    #[test]
    fn shared_errors_are_not_rewrapped() {
        let shared = Arc::new(strata_err!(CorruptData: "bad offset"));
        let once = StrataError::from(&shared);
        let twice = StrataError::from(Arc::new(once));
        assert!(twice.is_corrupt_data());
        match twice {
            StrataError::Shared(inner) => assert!(Arc::ptr_eq(&inner, &shared)),
            _ => unreachable!(),
        }
    }

    #[test]
    fn io_errors_classify_as_io() {
        let err = StrataError::from(io::Error::other("disk gone"));
        assert!(err.is_io());
        assert!(!err.is_corrupt_data());
    }

    #[test]
    fn flatten_nested_results() {
        let nested: StrataResult<StrataResult<u32>> = Ok(Err(strata_err!("inner")));
        assert!(nested.flatten().is_err());
        let ok: StrataResult<StrataResult<u32>> = Ok(Ok(7));
        assert_eq!(ok.flatten().unwrap(), 7);
    }
}
