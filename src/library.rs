// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason

use std::ffi::{self, OsStr};
use std::mem::ManuallyDrop;
use std::io;

use crate::cwd::{self, CurrentDir, LibraryPath};
use crate::os::{imp, Handle};
use crate::{LoadError, Symbol};

/// An owned handle to a shared library loaded by this process.
///
/// The handle is released exactly once, either explicitly through [`close`](Library::close)
/// or implicitly on drop. Every successful open returns an independent handle, even for a
/// library that is already loaded; the OS only bumps its own reference count.
#[derive(Debug)]
#[repr(transparent)]
pub struct Library(Handle);

// internal type is opaque and managed by OS, so it's `Send` safe
unsafe impl Send for Library {}
// symbol lookup is thread-safe on every supported platform
unsafe impl Sync for Library {}

impl Library {
	/// Attempts to load a shared library from `path`.
	///
	/// If `path` has a directory component, the working directory is switched to it for
	/// the duration of the load, so dependencies next to the library are found, and then
	/// restored. A failed switch is not an error: the library is then loaded by its bare
	/// file name through the default search order.
	///
	/// The switch is serialized with [`lock_current_dir`](crate::lock_current_dir), but
	/// code that touches the working directory without that lock may still observe it.
	///
	/// # Errors
	///
	/// Returns the platform error code captured right after the failed load.
	///
	/// # Examples
	///
	/// ```no_run
	/// use natlib::Library;
	///
	/// match Library::open("C:\\plugins\\widevinecdm.dll") {
	///     Ok(lib) => println!("loaded {:?}", lib),
	///     Err(err) => println!("load failed with code {err}"),
	/// }
	/// ```
	pub fn open<P: AsRef<OsStr>>(path: P) -> Result<Self, LoadError> {
		Self::open_with(path.as_ref(), imp::static_loader())
	}

	/// Like [`open`](Library::open), but the platform load function itself is looked up at
	/// run time from a module that is always resident, rather than imported.
	///
	/// The lookup happens once per process. Returns `None` if the load function can't be
	/// found or the library fails to load; no error code is kept.
	pub fn open_dynamically<P: AsRef<OsStr>>(path: P) -> Option<Self> {
		let load = imp::dynamic_loader()?;
		Self::open_with(path.as_ref(), load).ok()
	}

	fn open_with(path: &OsStr, load: imp::LoadFn) -> Result<Self, LoadError> {
		let path = LibraryPath::new(path);
		if path.file_name.is_empty() {
			return Err(LoadError::from_raw(imp::INVALID_ARGUMENT));
		}
		log::trace!("loading `{}`", path.path.to_string_lossy());
		let handle = match path.dir {
			Some(dir) => {
				let _lock = cwd::lock_current_dir();
				let switch = CurrentDir::enter(dir);
				let name = imp::module_name(&path, switch.is_some());
				// the error code is read inside `dylib_open`, before `switch` restores anything.
				unsafe { imp::dylib_open(load, &name) }
			}
			None => unsafe { imp::dylib_open(load, &imp::module_name(&path, false)) },
		}?;
		Ok(Self(handle))
	}

	/// Retrieves the address of an exported symbol.
	///
	/// `name` must match the export exactly. Returns `None` if the library does not export
	/// it, or if `name` contains a nul byte.
	///
	/// # Examples
	///
	/// ```no_run
	/// use natlib::Library;
	/// use std::mem;
	///
	/// let lib = Library::open("/opt/cdm/libwidevinecdm.so").unwrap();
	/// let sym = lib.symbol("GetCdmVersion").unwrap();
	/// let get_cdm_version: unsafe extern "C" fn() -> *const std::ffi::c_char =
	///     unsafe { mem::transmute(sym.cast::<()>()) };
	/// ```
	pub fn symbol(&self, name: &str) -> Option<Symbol<'_>> {
		let c_str = ffi::CString::new(name).ok()?;
		let addr = unsafe { imp::dylib_symbol(self.0, &c_str) };
		Symbol::new(addr)
	}

	/// Unloads the library, surfacing the OS result.
	///
	/// Dropping a `Library` does the same, minus the result.
	///
	/// # Errors
	///
	/// May error depending on system call.
	pub fn close(self) -> io::Result<()> {
		let this = ManuallyDrop::new(self);
		unsafe { imp::dylib_close(this.0) }
	}

	/// Consumes the `Library`, returning the raw OS handle without unloading it.
	#[inline]
	pub fn into_raw(self) -> *mut ffi::c_void {
		ManuallyDrop::new(self).0.as_ptr()
	}

	/// Adopts a raw OS handle. Returns `None` if `handle` is null.
	///
	/// # Safety
	///
	/// `handle` must come from the platform load function (or [`into_raw`](Library::into_raw))
	/// and the caller must give up its reference: the returned `Library` releases it.
	#[inline]
	pub unsafe fn from_raw(handle: *mut ffi::c_void) -> Option<Self> {
		Handle::new(handle).map(Self)
	}
}

impl Drop for Library {
	fn drop(&mut self) {
		if let Err(e) = unsafe { imp::dylib_close(self.0) } {
			log::debug!("failed to unload library {:p}: {e}", self.0);
		}
	}
}
