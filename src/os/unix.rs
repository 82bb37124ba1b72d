// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason
use std::borrow::Cow;
use std::ffi::{CStr, CString, OsStr, OsString};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::sync::OnceLock;
use std::{io, mem};

use super::Handle;
use crate::cwd::LibraryPath;
use crate::error::{LoadError, RawErrorCode};

/// Signature of `dlopen`.
pub(crate) type LoadFn = unsafe extern "C" fn(*const libc::c_char, libc::c_int) -> *mut libc::c_void;

pub(crate) const INVALID_ARGUMENT: RawErrorCode = libc::EINVAL;

// `dlerror` state is only known to be thread-local on these targets.
#[cfg(not(any(target_os = "linux", target_os = "macos", target_env = "gnu")))]
#[inline]
fn dylib_guard() -> parking_lot::MutexGuard<'static, ()> {
	static LOCK: parking_lot::Mutex<()> = parking_lot::const_mutex(());
	LOCK.lock()
}

#[cfg(any(target_os = "linux", target_os = "macos", target_env = "gnu"))]
#[inline(always)]
fn dylib_guard() {}

#[cfg(any(target_os = "linux", target_os = "emscripten"))]
unsafe fn errno_location() -> *mut libc::c_int {
	libc::__errno_location()
}

#[cfg(any(target_os = "android", target_os = "netbsd", target_os = "openbsd"))]
unsafe fn errno_location() -> *mut libc::c_int {
	libc::__errno()
}

#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
unsafe fn errno_location() -> *mut libc::c_int {
	libc::__error()
}

#[cfg(any(
	target_os = "linux",
	target_os = "emscripten",
	target_os = "android",
	target_os = "netbsd",
	target_os = "openbsd",
	target_os = "macos",
	target_os = "ios",
	target_os = "freebsd"
))]
#[inline]
unsafe fn clear_errno() {
	*errno_location() = 0;
}

#[cfg(not(any(
	target_os = "linux",
	target_os = "emscripten",
	target_os = "android",
	target_os = "netbsd",
	target_os = "openbsd",
	target_os = "macos",
	target_os = "ios",
	target_os = "freebsd"
)))]
#[inline]
unsafe fn clear_errno() {}

/// Reads the `errno` left by a failed `dlopen`.
///
/// `dlopen` is not required to set `errno` at all. When it didn't, the code is `ENOEXEC`
/// if `name` points at an existing file, `ENOENT` otherwise.
fn load_error(name: &OsStr) -> LoadError {
	let err = LoadError::last_os_error();
	if err.code() != 0 {
		return err;
	}
	let path = Path::new(name);
	let code = if path.components().count() > 1 && path.is_file() {
		libc::ENOEXEC
	} else {
		libc::ENOENT
	};
	LoadError::from_raw(code)
}

/// The `dlopen` this crate is linked against.
#[inline]
pub(crate) fn static_loader() -> LoadFn {
	libc::dlopen
}

/// Looks up `dlopen` through the global symbol scope, once per process.
pub(crate) fn dynamic_loader() -> Option<LoadFn> {
	static DLOPEN: OnceLock<Option<LoadFn>> = OnceLock::new();
	*DLOPEN.get_or_init(|| {
		let addr = unsafe { libc::dlsym(libc::RTLD_DEFAULT, b"dlopen\0".as_ptr().cast()) };
		if addr.is_null() {
			log::debug!("`dlopen` is not resolvable from the global scope");
			None
		} else {
			Some(unsafe { mem::transmute::<*mut libc::c_void, LoadFn>(addr) })
		}
	})
}

/// Picks the name handed to `dlopen`.
///
/// `dlopen` never searches the working directory for a bare name, so after a successful
/// switch the file is named relative to it. A path without a directory component is
/// passed through untouched, and a failed switch falls back to the bare file name.
pub(crate) fn module_name<'a>(path: &LibraryPath<'a>, switched: bool) -> Cow<'a, OsStr> {
	if switched {
		let mut name = OsString::from("./");
		name.push(path.file_name);
		Cow::Owned(name)
	} else if path.dir.is_none() {
		Cow::Borrowed(path.path)
	} else {
		Cow::Borrowed(path.file_name)
	}
}

pub(crate) unsafe fn dylib_open(load: LoadFn, name: &OsStr) -> Result<Handle, LoadError> {
	let Ok(c_str) = CString::new(name.as_bytes()) else {
		return Err(LoadError::from_raw(INVALID_ARGUMENT));
	};
	let _lock = dylib_guard();
	let _ = libc::dlerror(); // clear existing errors
	clear_errno();
	let handle = load(c_str.as_ptr(), libc::RTLD_NOW | libc::RTLD_LOCAL);
	match Handle::new(handle) {
		Some(handle) => Ok(handle),
		None => {
			// errno first, `dlerror` may clobber it.
			let err = load_error(name);
			log::debug!("dlopen `{}` failed ({err}): {}", name.to_string_lossy(), dylib_error());
			Err(err)
		}
	}
}

unsafe fn dylib_error() -> Cow<'static, str> {
	let msg = libc::dlerror();
	if msg.is_null() {
		Cow::Borrowed("no dlerror message")
	} else {
		Cow::Owned(CStr::from_ptr(msg).to_string_lossy().into_owned())
	}
}

#[inline]
pub(crate) unsafe fn dylib_symbol(lib_handle: Handle, name: &CStr) -> *mut libc::c_void {
	libc::dlsym(lib_handle.as_ptr(), name.as_ptr())
}

pub(crate) unsafe fn dylib_close(lib_handle: Handle) -> io::Result<()> {
	let _lock = dylib_guard();
	let _ = libc::dlerror(); // clear existing errors
	if libc::dlclose(lib_handle.as_ptr()) != 0 {
		Err(io::Error::new(io::ErrorKind::Other, dylib_error()))
	} else {
		Ok(())
	}
}
