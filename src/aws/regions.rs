//! Region resolution

use super::api::AwsApi;
use crate::error::ResolveError;

/// Resolve the regions a sweep covers.
///
/// An explicit region short-circuits without any call. Otherwise the provider's
/// enabled regions are returned in provider order. A listing failure is fatal:
/// a partial region list would silently under-report.
pub async fn resolve(api: &dyn AwsApi, explicit: Option<&str>) -> Result<Vec<String>, ResolveError> {
    if let Some(region) = explicit.map(str::trim).filter(|r| !r.is_empty()) {
        return Ok(vec![region.to_string()]);
    }

    let regions = api.enabled_regions().await.map_err(|e| ResolveError {
        cause: format!("{:#}", e),
    })?;

    tracing::info!("Resolved {} enabled regions", regions.len());
    Ok(regions)
}
