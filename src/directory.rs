use anyhow::{Context as _, Result, bail};
use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    adjustment::{AdjustmentProfile, AdjustmentTable},
    transport::HttpTransport,
};

pub const ADJUSTMENT_PATH: &str = "/iaqdeviceadj";

#[derive(Debug, Deserialize)]
struct DirectoryResponse {
    #[serde(default)]
    result: Vec<AdjustmentProfile>,
}

/// An empty `base_uri` skips the lookup. On error the table keeps whatever
/// was merged before the failure.
pub async fn load_adjustments<T>(
    transport: &T,
    base_uri: &str,
    table: &mut AdjustmentTable,
) -> Result<usize>
where
    T: HttpTransport + ?Sized,
{
    if base_uri.is_empty() {
        return Ok(0);
    }

    let url = format!("{}{ADJUSTMENT_PATH}", base_uri.trim_end_matches('/'));
    let response = transport
        .get(&url)
        .await
        .context("failed to fetch device adjustments")?;

    merge_response(&response.body, table)
}

pub fn merge_response(body: &str, table: &mut AdjustmentTable) -> Result<usize> {
    let response: DirectoryResponse =
        serde_json::from_str(body).context("failed to decode device adjustments")?;

    table.merge(response.result);

    if table.is_empty() {
        warn!(body, "directory returned no device adjustments");
        bail!("no device adjustments in response: {body}");
    }

    info!(devices = table.len(), "loaded device adjustments");
    Ok(table.len())
}
