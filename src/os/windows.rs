// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason
use std::borrow::Cow;
use std::ffi::{self, CStr, OsStr};
use std::os::windows::ffi::OsStrExt;
use std::sync::OnceLock;
use std::{io, mem};

use super::Handle;
use crate::cwd::LibraryPath;
use crate::error::{LoadError, RawErrorCode};

mod c;

/// Signature of `LoadLibraryW`.
#[cfg(not(target_vendor = "uwp"))]
pub(crate) type LoadFn = unsafe extern "system" fn(c::PCWSTR) -> c::HMODULE;
/// Signature of `LoadPackagedLibrary`, the only loader available to app packages.
#[cfg(target_vendor = "uwp")]
pub(crate) type LoadFn = unsafe extern "system" fn(c::PCWSTR, c::DWORD) -> c::HMODULE;

#[cfg(not(target_vendor = "uwp"))]
const LOAD_FN_NAME: &[u8] = b"LoadLibraryW\0";
#[cfg(target_vendor = "uwp")]
const LOAD_FN_NAME: &[u8] = b"LoadPackagedLibrary\0";

pub(crate) const INVALID_ARGUMENT: RawErrorCode = c::ERROR_INVALID_PARAMETER;

fn to_wide(path: &OsStr) -> Vec<u16> {
	path.encode_wide().chain(std::iter::once(0u16)).collect()
}

/// The load function this crate imports.
#[inline]
pub(crate) fn static_loader() -> LoadFn {
	#[cfg(not(target_vendor = "uwp"))]
	{
		c::LoadLibraryW
	}
	#[cfg(target_vendor = "uwp")]
	{
		c::LoadPackagedLibrary
	}
}

#[inline]
unsafe fn call_loader(load: LoadFn, name: c::PCWSTR) -> c::HMODULE {
	#[cfg(not(target_vendor = "uwp"))]
	{
		load(name)
	}
	#[cfg(target_vendor = "uwp")]
	{
		load(name, 0)
	}
}

/// Looks up the load function from the always resident `kernel32.dll`, once per process.
pub(crate) fn dynamic_loader() -> Option<LoadFn> {
	static LOAD_LIBRARY: OnceLock<Option<LoadFn>> = OnceLock::new();
	*LOAD_LIBRARY.get_or_init(|| unsafe {
		let kernel32 = c::GetModuleHandleW(to_wide(OsStr::new("kernel32.dll")).as_ptr());
		if kernel32.is_null() {
			log::debug!("`kernel32.dll` is not mapped: {}", io::Error::last_os_error());
			return None;
		}
		let addr = c::GetProcAddress(kernel32, LOAD_FN_NAME.as_ptr().cast());
		if addr.is_null() {
			log::debug!("load function not found in `kernel32.dll`: {}", io::Error::last_os_error());
			None
		} else {
			Some(mem::transmute::<*mut ffi::c_void, LoadFn>(addr))
		}
	})
}

/// The loader is always given the bare file name; dependencies are found through the
/// working directory.
#[inline]
pub(crate) fn module_name<'a>(path: &LibraryPath<'a>, _switched: bool) -> Cow<'a, OsStr> {
	Cow::Borrowed(path.file_name)
}

pub(crate) unsafe fn dylib_open(load: LoadFn, name: &OsStr) -> Result<Handle, LoadError> {
	let wide_str = to_wide(name);
	// an interior nul would silently truncate the name.
	if wide_str[..wide_str.len() - 1].contains(&0) {
		return Err(LoadError::from_raw(INVALID_ARGUMENT));
	}
	let handle = call_loader(load, wide_str.as_ptr());
	match Handle::new(handle) {
		Some(handle) => Ok(handle),
		None => {
			// `GetLastError` must be read before any other system call.
			let err = LoadError::last_os_error();
			log::debug!("loading `{}` failed ({err})", name.to_string_lossy());
			Err(err)
		}
	}
}

#[inline]
pub(crate) unsafe fn dylib_symbol(lib_handle: Handle, name: &CStr) -> *mut ffi::c_void {
	c::GetProcAddress(lib_handle.as_ptr(), name.as_ptr())
}

#[inline]
pub(crate) unsafe fn dylib_close(lib_handle: Handle) -> io::Result<()> {
	if c::FreeLibrary(lib_handle.as_ptr()) == 0 {
		Err(io::Error::last_os_error())
	} else {
		Ok(())
	}
}
