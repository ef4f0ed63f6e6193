use std::path::Path;

use anyhow::Result;
use tracing::info;

use super::manifest::to_json_4space;
use crate::build::BuildReport;
use crate::render::write_atomic;

/// Write the build report as 4-space JSON, atomically.
pub fn write_build_report(report: &BuildReport, out: &Path) -> Result<()> {
    let json = to_json_4space(report)?;
    write_atomic(out, &json)?;
    info!(
        "Build report written to {:?} ({} of {} succeeded)",
        out,
        report.succeeded(),
        report.total()
    );
    Ok(())
}
