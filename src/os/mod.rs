// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason
#[cfg(unix)]
pub(crate) mod unix;
#[cfg(windows)]
pub(crate) mod windows;

#[cfg(unix)]
pub(crate) use unix as imp;
#[cfg(windows)]
pub(crate) use windows as imp;

use std::{ffi, ptr};

/// Opaque module handle owned by a [`Library`](crate::Library).
pub(crate) type Handle = ptr::NonNull<ffi::c_void>;
