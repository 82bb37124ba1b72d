// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason
//! Run-time loading of native libraries.
//!
//! [`Library::open`] loads a shared library, switching the working directory to the
//! library's folder while it loads so that dependencies placed next to it are found.
//! Symbols are looked up with [`Library::symbol`], and the library is unloaded when the
//! `Library` is dropped or [closed](Library::close).
//!
//! ```no_run
//! use natlib::Library;
//!
//! let lib = Library::open("C:\\plugins\\foo.dll").unwrap();
//! assert!(lib.symbol("Bar").is_some());
//! assert!(lib.symbol("DoesNotExist").is_none());
//! lib.close().unwrap();
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

use std::env::consts;
use std::ffi::{OsStr, OsString};

mod cwd;
mod error;
mod library;
mod os;
mod sym;

pub use cwd::{lock_current_dir, CurrentDirLock};
pub use error::{LoadError, RawErrorCode};
pub use library::Library;
pub use sym::Symbol;

/// Builds the platform file name of a library from its bare name.
///
/// # Examples
///
/// ```
/// let name = natlib::library_filename("foo");
/// if cfg!(windows) {
///     assert_eq!(name, "foo.dll");
/// } else if cfg!(target_os = "macos") {
///     assert_eq!(name, "libfoo.dylib");
/// } else if cfg!(target_os = "linux") {
///     assert_eq!(name, "libfoo.so");
/// }
/// ```
pub fn library_filename<S: AsRef<OsStr>>(name: S) -> OsString {
	let name = name.as_ref();
	let mut file_name =
		OsString::with_capacity(consts::DLL_PREFIX.len() + name.len() + consts::DLL_SUFFIX.len());
	file_name.push(consts::DLL_PREFIX);
	file_name.push(name);
	file_name.push(consts::DLL_SUFFIX);
	file_name
}
