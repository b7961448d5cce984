//! Public EBS snapshot sweep

use super::{report_failure, CallFailure, Finding, Reporter};
use crate::aws::AwsApi;

pub async fn sweep(
    api: &dyn AwsApi,
    regions: &[String],
    accounts: &[String],
    out: &mut dyn Reporter,
) {
    for region in regions {
        out.region(region);

        for account in accounts {
            match api.public_snapshots(region, account).await {
                Ok(snapshots) => {
                    for snapshot in snapshots {
                        out.found(Finding::Snapshot {
                            region: region.clone(),
                            account: account.clone(),
                            snapshot,
                        });
                    }
                }
                Err(e) => report_failure(
                    out,
                    CallFailure::new("DescribeSnapshots", &e)
                        .in_region(region)
                        .for_account(account),
                ),
            }
        }
    }
}
