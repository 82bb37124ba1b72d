// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason
#![allow(clippy::upper_case_acronyms)]
#![allow(non_snake_case)]

use std::ffi;

pub type HMODULE = *mut ffi::c_void;
pub type PCWSTR = *const u16;
pub type PCSTR = *const ffi::c_char;
pub type BOOL = i32;
pub type DWORD = u32;

pub const ERROR_INVALID_PARAMETER: i32 = 87;

extern "system" {
	pub fn LoadLibraryW(lplibfilename: PCWSTR) -> HMODULE;
	#[cfg(target_vendor = "uwp")]
	pub fn LoadPackagedLibrary(lplibfilename: PCWSTR, reserved: DWORD) -> HMODULE;
	pub fn GetModuleHandleW(lpmodulename: PCWSTR) -> HMODULE;
	pub fn GetProcAddress(hmodule: HMODULE, lpprocname: PCSTR) -> *mut ffi::c_void;
	pub fn FreeLibrary(hlibmodule: HMODULE) -> BOOL;
}
