// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason
use std::ffi;
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::Library;

/// The address of an exported symbol.
///
/// Borrows the [`Library`] it was found in, so it can't outlive the loaded module.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[repr(transparent)]
pub struct Symbol<'a>(NonNull<ffi::c_void>, PhantomData<&'a Library>);

impl<'a> Symbol<'a> {
	#[inline]
	pub(crate) fn new(addr: *mut ffi::c_void) -> Option<Self> {
		NonNull::new(addr).map(|addr| Self(addr, PhantomData))
	}
	/// Returns the raw address.
	#[inline]
	pub const fn as_ptr(self) -> *mut ffi::c_void {
		self.0.as_ptr()
	}
	/// Casts to a pointer of another type.
	#[inline]
	pub const fn cast<T>(self) -> *mut T {
		self.0.as_ptr().cast()
	}
}
