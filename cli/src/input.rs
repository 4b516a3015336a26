use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::Value;
use tracing::{debug, error};

use nfusion_common::record::{self, SourceScan};

/// Reads one scan file: a scan object or a bare array of host records. The file
/// path always becomes the source identifier.
///
/// Only a file that is not JSON, or not one of those two shapes, fails. Host
/// entries that do not decode are carried along and reported as skipped records.
pub fn load_scan(path: &Path) -> Result<SourceScan> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scan file {}", path.display()))?;

    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a scan record file", path.display()))?;

    let source = path.display().to_string();
    let scan = match value {
        Value::Object(_) => {
            let scan: SourceScan = serde_json::from_value(value)
                .with_context(|| format!("{} is not a scan record file", path.display()))?;
            SourceScan { source, ..scan }
        }
        Value::Array(_) => SourceScan::new(source, record::lenient_hosts(value)?),
        _ => bail!(
            "{} is not a scan record file: expected an object or an array of hosts",
            path.display()
        ),
    };

    debug!("Loaded {} host records from {}", scan.hosts.len(), scan.source);
    Ok(scan)
}

/// Loads every readable file. A file that cannot be loaded is logged and left
/// out; the run only fails when no file is left.
pub fn load_scans<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<SourceScan>> {
    let mut scans = Vec::with_capacity(paths.len());
    for path in paths {
        match load_scan(path.as_ref()) {
            Ok(scan) => scans.push(scan),
            Err(e) => error!("Skipping {}: {e:#}", path.as_ref().display()),
        }
    }

    if scans.is_empty() && !paths.is_empty() {
        bail!("None of the {} scan files could be loaded", paths.len());
    }
    Ok(scans)
}
