//! Assets pre-cached at install time.
//!
//! Paths are relative to the worker scope. Anything not listed here is only
//! cached opportunistically the first time it is fetched.

/// The pre-cache manifest.
pub const PRECACHE_MANIFEST: &[&str] = &[
    "index.html",
    "css/tailwind.output.css",
    "js/app.js",
    "js/router.js",
    "js/config.js",
    "manifest.json",
    "images/icons/icon-192.png",
    "images/icons/icon-512.png",
];
