//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (`core-service`, `core-playback`, `core-runtime`). Host
//! applications can depend on `nowplaying-workspace` and enable the documented
//! features without needing to wire each crate individually.
//!
//! - `desktop-shims` (default): `core-service` with the `bridge-desktop`
//!   artwork fetcher, now-playing surface and audio session defaults.
//! - `headless`: the service, playback core and runtime without any desktop
//!   adapters; every bridge must be injected by the host.

#[cfg(feature = "headless")]
pub use core_playback as playback;
#[cfg(feature = "headless")]
pub use core_runtime as runtime;
#[cfg(any(feature = "desktop-shims", feature = "headless"))]
pub use core_service as service;
