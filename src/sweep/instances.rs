//! Instances that still accept IMDSv1

use super::{report_failure, CallFailure, Finding, Reporter};
use crate::aws::AwsApi;

pub async fn sweep(api: &dyn AwsApi, regions: &[String], out: &mut dyn Reporter) {
    out.note(&format!(
        "Checking for IMDSv1 enabled instances across {} regions...",
        regions.len()
    ));

    for region in regions {
        out.region(region);

        match api.instances(region).await {
            Ok(instances) => {
                for instance in instances.into_iter().filter(|i| i.allows_imdsv1()) {
                    out.found(Finding::Instance {
                        region: region.clone(),
                        instance_id: instance.instance_id,
                    });
                }
            }
            Err(e) => report_failure(
                out,
                CallFailure::new("DescribeInstances", &e).in_region(region),
            ),
        }
    }
}
