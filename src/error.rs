// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason

use std::io;

/// Raw platform error code, as returned by [`io::Error::raw_os_error`].
pub type RawErrorCode = i32;

/// The error returned when a library fails to load.
///
/// This only carries the platform error code (`GetLastError` on windows, `errno` on unix).
/// Its [`Display`](std::fmt::Display) implementation renders the code as a decimal number
/// and nothing else. Convert into [`io::Error`] for a system message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[error("{code}")]
pub struct LoadError {
	code: RawErrorCode,
}

impl LoadError {
	/// Wraps a platform error code, as read from `GetLastError` or `errno`.
	#[inline]
	pub const fn from_raw(code: RawErrorCode) -> Self {
		Self { code }
	}

	/// Captures the calling thread's last OS error.
	///
	/// Must be called immediately after the failing system call.
	#[inline]
	pub(crate) fn last_os_error() -> Self {
		Self::from_raw(io::Error::last_os_error().raw_os_error().unwrap_or(0))
	}

	/// Returns the platform error code.
	#[inline]
	pub const fn code(&self) -> RawErrorCode {
		self.code
	}
}

impl From<LoadError> for io::Error {
	#[inline]
	fn from(value: LoadError) -> Self {
		io::Error::from_raw_os_error(value.code)
	}
}
