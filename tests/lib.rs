use natlib::*;
use std::ffi::OsString;
use std::{env, thread};

fn missing_name() -> OsString {
	library_filename("natlib_missing_test_library")
}

#[test]
fn test_missing_library() {
	let err = Library::open(missing_name()).unwrap_err();
	let code = err.to_string();
	assert!(!code.is_empty());
	assert!(code.trim_start_matches('-').chars().all(|c| c.is_ascii_digit()));
	assert_eq!(code, err.code().to_string());
	assert_ne!(err.code(), 0);
}

#[test]
fn test_missing_library_io_error() {
	let err = Library::open(missing_name()).unwrap_err();
	assert_ne!(err.code(), 0);
	let io_err: std::io::Error = err.into();
	assert_eq!(io_err.raw_os_error(), Some(err.code()));
}

#[test]
fn test_bare_name_keeps_current_dir() {
	let _lock = lock_current_dir();
	let before = env::current_dir().unwrap();
	assert!(Library::open(missing_name()).is_err());
	assert_eq!(env::current_dir().unwrap(), before);
}

#[test]
fn test_directory_is_restored_after_failure() {
	let _lock = lock_current_dir();
	let before = env::current_dir().unwrap();
	let path = env::temp_dir().join(missing_name());
	assert!(Library::open(&path).is_err());
	assert_eq!(env::current_dir().unwrap(), before);
}

#[test]
fn test_missing_directory_degrades_to_file_name() {
	let _lock = lock_current_dir();
	let before = env::current_dir().unwrap();
	let path = env::temp_dir()
		.join("natlib-no-such-directory")
		.join(missing_name());
	assert!(Library::open(&path).is_err());
	assert_eq!(env::current_dir().unwrap(), before);
}

#[test]
fn test_invalid_paths() {
	assert!(Library::open("").is_err());
	assert!(Library::open("natlib\0.dll").is_err());
	let _lock = lock_current_dir();
	let before = env::current_dir().unwrap();
	let dir_only = format!("{}/", env::temp_dir().display());
	assert!(Library::open(dir_only).is_err());
	assert_eq!(env::current_dir().unwrap(), before);
}

#[test]
fn test_open_dynamically_missing() {
	assert!(Library::open_dynamically(missing_name()).is_none());
	assert!(Library::open_dynamically(env::temp_dir().join(missing_name())).is_none());
}

#[test]
fn test_from_raw_null() {
	assert!(unsafe { Library::from_raw(std::ptr::null_mut()) }.is_none());
}

#[test]
fn test_concurrent_loads_restore_directory() {
	let before = {
		let _lock = lock_current_dir();
		env::current_dir().unwrap()
	};
	let threads: Vec<_> = (0..8)
		.map(|i| {
			thread::spawn(move || {
				let dir = if i % 2 == 0 {
					env::temp_dir()
				} else {
					env::temp_dir().join("natlib-no-such-directory")
				};
				for _ in 0..50 {
					assert!(Library::open(dir.join(missing_name())).is_err());
				}
			})
		})
		.collect();
	for t in threads {
		t.join().unwrap();
	}
	let _lock = lock_current_dir();
	assert_eq!(env::current_dir().unwrap(), before);
}
