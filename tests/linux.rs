#![cfg(all(target_os = "linux", target_env = "gnu"))]

use natlib::*;
use std::ffi::{c_char, c_int};
use std::path::PathBuf;
use std::{env, fs, mem};

// the libc this test binary runs against, as mapped by the loader.
fn libc_path() -> PathBuf {
	let maps = fs::read_to_string("/proc/self/maps").unwrap();
	maps.lines()
		.filter_map(|line| line.split_whitespace().nth(5))
		.map(PathBuf::from)
		.find(|path| {
			path.file_name()
				.and_then(|name| name.to_str())
				.is_some_and(|name| name.starts_with("libc.so") || name.starts_with("libc-"))
		})
		.expect("libc is not mapped")
}

#[test]
fn test_open_full_path() {
	let lib = Library::open(libc_path()).unwrap();
	let sym = lib.symbol("atoi").unwrap();
	let atoi: unsafe extern "C" fn(*const c_char) -> c_int = unsafe { mem::transmute(sym.as_ptr()) };
	let five = unsafe { atoi(b"5\0".as_ptr().cast()) };
	assert_eq!(five, 5);
	assert!(lib.symbol("natlib_does_not_exist").is_none());
	assert!(lib.symbol("atoi\0junk").is_none());
	lib.close().unwrap();
}

#[test]
fn test_open_bare_name() {
	let lib = Library::open("libc.so.6").unwrap();
	assert!(lib.symbol("malloc").is_some());
}

#[test]
fn test_directory_is_restored_after_success() {
	let _lock = lock_current_dir();
	let before = env::current_dir().unwrap();
	let lib = Library::open(libc_path()).unwrap();
	assert_eq!(env::current_dir().unwrap(), before);
	drop(lib);
	assert_eq!(env::current_dir().unwrap(), before);
}

#[test]
fn test_independent_handles() {
	let first = Library::open(libc_path()).unwrap();
	let second = Library::open(libc_path()).unwrap();
	let (first, second) = (first.into_raw(), second.into_raw());
	// the loader hands back the same module, counted twice.
	assert_eq!(first, second);
	unsafe {
		Library::from_raw(first).unwrap().close().unwrap();
		Library::from_raw(second).unwrap().close().unwrap();
	}
}

#[test]
fn test_open_dynamically() {
	let lib = Library::open_dynamically(libc_path()).unwrap();
	assert!(lib.symbol("atoi").is_some());
}

#[test]
fn test_not_a_library() {
	let path = env::temp_dir().join("natlib-not-a-library.so");
	fs::write(&path, b"definitely not an ELF image").unwrap();
	let _lock = lock_current_dir();
	let before = env::current_dir().unwrap();
	assert!(Library::open(&path).is_err());
	assert_eq!(env::current_dir().unwrap(), before);
	let _ = fs::remove_file(&path);
}

fn set_errno(code: c_int) {
	unsafe { *libc::__errno_location() = code };
}

#[test]
fn test_missing_library_ignores_stale_errno() {
	set_errno(libc::EDOM);
	let err = Library::open("natlib_missing_test_library.so").unwrap_err();
	assert_ne!(err.code(), 0);
	assert_ne!(err.code(), libc::EDOM);
}

#[test]
fn test_missing_library_in_directory_is_not_zero() {
	set_errno(0);
	let err = Library::open(env::temp_dir().join("natlib_missing_test_library.so")).unwrap_err();
	assert_ne!(err.code(), 0);
}

#[test]
fn test_not_a_library_ignores_stale_errno() {
	let path = env::temp_dir().join("natlib-stale-errno.so");
	fs::write(&path, b"still not an ELF image").unwrap();
	set_errno(libc::EDOM);
	let err = Library::open(&path).unwrap_err();
	assert_ne!(err.code(), 0);
	assert_ne!(err.code(), libc::EDOM);
	let _ = fs::remove_file(&path);
}

#[test]
fn test_library_is_send() {
	let lib = Library::open(libc_path()).unwrap();
	let t = std::thread::spawn(move || {
		assert!(lib.symbol("atoi").is_some());
		lib.close().unwrap();
	});
	t.join().unwrap();
}
