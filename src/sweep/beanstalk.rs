//! Elastic Beanstalk sweep: applications, then their environments

use super::{report_failure, CallFailure, Finding, Reporter};
use crate::aws::AwsApi;

pub async fn sweep(api: &dyn AwsApi, regions: &[String], out: &mut dyn Reporter) {
    out.note(&format!(
        "Checking Elastic Beanstalk in {} regions...",
        regions.len()
    ));

    for region in regions {
        out.region(region);

        let applications = match api.applications(region).await {
            Ok(applications) => applications,
            Err(e) => {
                report_failure(
                    out,
                    CallFailure::new("DescribeApplications", &e).in_region(region),
                );
                continue;
            }
        };

        if applications.is_empty() {
            out.note("No Elastic Beanstalk applications found");
            continue;
        }

        for application in applications {
            out.note(&format!("Application: {}", application));

            match api.environments(region, &application).await {
                Ok(environments) => {
                    for environment in environments {
                        out.found(Finding::Environment {
                            region: region.clone(),
                            application: application.clone(),
                            environment,
                        });
                    }
                }
                Err(e) => report_failure(
                    out,
                    CallFailure::new("DescribeEnvironments", &e).in_region(region),
                ),
            }
        }
    }
}
