// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason

//! Scoped switching of the process working directory.
//!
//! Windows resolves a library's own dependencies relative to the working directory, so
//! [`Library::open`](crate::Library::open) temporarily moves into the library's folder.
//! The working directory is process-wide state, so every switch happens while holding
//! [`lock_current_dir`].

use std::ffi::OsStr;
use std::path::{self, Path, PathBuf};
use std::{env, fmt};

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

static CURRENT_DIR_LOCK: ReentrantMutex<()> = parking_lot::const_reentrant_mutex(());

/// Guard returned by [`lock_current_dir`].
///
/// While held, no library load on another thread can switch the working directory.
pub struct CurrentDirLock(#[allow(dead_code)] ReentrantMutexGuard<'static, ()>);

impl fmt::Debug for CurrentDirLock {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("CurrentDirLock")
	}
}

/// Acquires the lock that serializes working directory switches.
///
/// Code that reads or writes the working directory can take this lock to avoid observing
/// the temporary switch made while loading a library. The lock is reentrant, so the
/// holder may still load libraries from the same thread.
pub fn lock_current_dir() -> CurrentDirLock {
	CurrentDirLock(CURRENT_DIR_LOCK.lock())
}

#[inline]
fn is_separator(b: u8) -> bool {
	b.is_ascii() && path::is_separator(b as char)
}

/// A library location split at its last separator.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LibraryPath<'a> {
	/// The path as given by the caller.
	pub path: &'a OsStr,
	/// Everything before the last separator, `None` if that is empty.
	pub dir: Option<&'a Path>,
	/// Everything after the last separator.
	pub file_name: &'a OsStr,
}

impl<'a> LibraryPath<'a> {
	pub(crate) fn new(path: &'a OsStr) -> Self {
		let bytes = path.as_encoded_bytes();
		let (dir, file_name) = match bytes.iter().rposition(|&b| is_separator(b)) {
			Some(index) => {
				// separators are ASCII, so both halves stay valid encoded strings.
				let (dir, file_name) = unsafe {
					(
						OsStr::from_encoded_bytes_unchecked(&bytes[..index]),
						OsStr::from_encoded_bytes_unchecked(&bytes[index + 1..]),
					)
				};
				let dir = if dir.is_empty() { None } else { Some(Path::new(dir)) };
				(dir, file_name)
			}
			None => (None, path),
		};
		Self {
			path,
			dir,
			file_name,
		}
	}
}

/// A working directory switch that is undone on drop.
#[derive(Debug)]
pub(crate) struct CurrentDir {
	previous: PathBuf,
}

impl CurrentDir {
	/// Switches to `dir`, remembering the current directory.
	///
	/// Returns `None` if the current directory can't be read or `dir` can't be entered.
	/// Nothing is owed back in that case.
	pub(crate) fn enter(dir: &Path) -> Option<Self> {
		let previous = match env::current_dir() {
			Ok(previous) => previous,
			Err(e) => {
				log::debug!("cannot read working directory, not switching to `{}`: {e}", dir.display());
				return None;
			}
		};
		match env::set_current_dir(dir) {
			Ok(()) => {
				log::trace!("switched working directory to `{}`", dir.display());
				Some(Self { previous })
			}
			Err(e) => {
				log::debug!("cannot switch working directory to `{}`: {e}", dir.display());
				None
			}
		}
	}
}

impl Drop for CurrentDir {
	fn drop(&mut self) {
		if let Err(e) = env::set_current_dir(&self.previous) {
			log::debug!(
				"cannot restore working directory `{}`: {e}",
				self.previous.display()
			);
		}
	}
}
