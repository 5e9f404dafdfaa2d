//! Locating fixture files that live next to a crate.

use std::path::{Path, PathBuf};

use anyhow::Context;

/// `crates/<crate_name>/testdata`, resolved from this crate's manifest.
pub fn crate_testdata_dir(crate_name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join(crate_name)
        .join("testdata")
}

/// Path to a fixture. `ISOXML_TESTDATA` overrides the crate directory.
pub fn testdata_path(crate_name: &str, name: &str) -> PathBuf {
    match std::env::var_os("ISOXML_TESTDATA") {
        Some(dir) => PathBuf::from(dir).join(name),
        None => crate_testdata_dir(crate_name).join(name),
    }
}

/// Read a fixture file to a string.
pub fn read_crate_test_file(crate_name: &str, name: &str) -> anyhow::Result<String> {
    let path = testdata_path(crate_name, name);
    std::fs::read_to_string(&path)
        .with_context(|| format!("reading fixture {} for {}", path.display(), crate_name))
}
