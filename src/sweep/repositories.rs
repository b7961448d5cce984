//! Public ECR repository sweep
//!
//! ECR Public is a global service, so only accounts are iterated.

use super::{report_failure, CallFailure, Finding, Reporter};
use crate::aws::AwsApi;

pub async fn sweep(api: &dyn AwsApi, accounts: &[String], out: &mut dyn Reporter) {
    for account in accounts {
        match api.public_repositories(account).await {
            Ok(repositories) => {
                for repository in repositories {
                    out.found(Finding::Repository {
                        account: account.clone(),
                        repository,
                    });
                }
            }
            Err(e) => report_failure(
                out,
                CallFailure::new("DescribeRepositories", &e).for_account(account),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::stub::StubAws;
    use crate::sweep::Collector;

    #[tokio::test]
    async fn test_one_call_per_account_and_no_region_listing() {
        let mut stub = StubAws::with_regions(&["us-east-1", "eu-west-1", "ap-east-1"]);
        stub.fail("public_repositories:222");
        let mut out = Collector::default();

        let accounts = vec!["111".to_string(), "222".to_string(), "333".to_string()];
        sweep(&stub, &accounts, &mut out).await;

        assert_eq!(stub.count("public_repositories"), 3);
        assert_eq!(stub.count("enabled_regions"), 0);
        assert_eq!(out.findings.len(), 2);
        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.failures[0].account.as_deref(), Some("222"));
        assert!(out.regions.is_empty());
    }
}
