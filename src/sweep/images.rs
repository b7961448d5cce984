//! Machine image sweep
//!
//! Per region: one public query per account in order, then a single private
//! query covering every account at once.

use super::{report_failure, CallFailure, Finding, Reporter};
use crate::aws::AwsApi;

const CALL: &str = "DescribeImages";

pub async fn sweep(
    api: &dyn AwsApi,
    regions: &[String],
    accounts: &[String],
    out: &mut dyn Reporter,
) {
    tracing::info!(
        "Enumerating images across {} regions and {} accounts",
        regions.len(),
        accounts.len()
    );

    for region in regions {
        out.region(region);

        for account in accounts {
            match api.images(region, std::slice::from_ref(account), true).await {
                Ok(images) => {
                    if !images.is_empty() {
                        out.note(&format!("\nPublic AMIs found for account {}:", account));
                    }
                    for image in images {
                        out.found(Finding::Image {
                            region: region.clone(),
                            account: Some(account.clone()),
                            image,
                        });
                    }
                }
                Err(e) => report_failure(
                    out,
                    CallFailure::new(CALL, &e).in_region(region).for_account(account),
                ),
            }
        }

        if accounts.is_empty() {
            continue;
        }

        match api.images(region, accounts, false).await {
            Ok(images) => {
                if !images.is_empty() {
                    out.note("\nPrivate AMIs found:");
                }
                for image in images {
                    out.found(Finding::Image {
                        region: region.clone(),
                        account: None,
                        image,
                    });
                }
            }
            Err(e) => report_failure(out, CallFailure::new(CALL, &e).in_region(region)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::stub::StubAws;
    use crate::sweep::Collector;

    fn owned(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn image_ids(out: &Collector) -> Vec<String> {
        out.findings
            .iter()
            .filter_map(|f| match f {
                Finding::Image { image, .. } => Some(image.image_id.clone()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_public_then_private_per_region() {
        let stub = StubAws::default();
        let mut out = Collector::default();

        sweep(
            &stub,
            &owned(&["us-east-1", "eu-west-1"]),
            &owned(&["111", "222"]),
            &mut out,
        )
        .await;

        assert_eq!(
            image_ids(&out),
            vec![
                "ami-us-east-1-111",
                "ami-us-east-1-222",
                "ami-private-us-east-1",
                "ami-eu-west-1-111",
                "ami-eu-west-1-222",
                "ami-private-eu-west-1",
            ]
        );
        assert_eq!(out.regions, vec!["us-east-1", "eu-west-1"]);
        assert_eq!(stub.count("images"), 6);
        assert!(out.failures.is_empty());
    }

    #[tokio::test]
    async fn test_one_failing_cell_does_not_stop_the_sweep() {
        let mut stub = StubAws::default();
        stub.fail("images:us-west-2:222");
        let mut out = Collector::default();

        let regions = owned(&["us-east-1", "us-west-2"]);
        let accounts = owned(&["111", "222", "333"]);
        sweep(&stub, &regions, &accounts, &mut out).await;

        let public: Vec<_> = out
            .findings
            .iter()
            .filter(|f| matches!(f, Finding::Image { account: Some(_), .. }))
            .collect();
        assert_eq!(public.len(), regions.len() * accounts.len() - 1);
        assert_eq!(out.failures.len(), 1);

        let failure = &out.failures[0];
        assert_eq!(failure.call, "DescribeImages");
        assert_eq!(failure.region.as_deref(), Some("us-west-2"));
        assert_eq!(failure.account.as_deref(), Some("222"));

        // The private pass in the failing region still ran
        assert!(image_ids(&out).contains(&"ami-private-us-west-2".to_string()));
    }

    #[tokio::test]
    async fn test_passes_are_introduced_by_headers() {
        let stub = StubAws::default();
        let mut out = Collector::default();

        sweep(&stub, &owned(&["us-east-1"]), &owned(&["111", "222"]), &mut out).await;

        assert_eq!(
            out.notes,
            vec![
                "\nPublic AMIs found for account 111:",
                "\nPublic AMIs found for account 222:",
                "\nPrivate AMIs found:",
            ]
        );
    }

    #[tokio::test]
    async fn test_no_accounts_skips_private_pass() {
        let stub = StubAws::default();
        let mut out = Collector::default();

        sweep(&stub, &owned(&["us-east-1"]), &[], &mut out).await;

        assert_eq!(stub.total_calls(), 0);
        assert!(out.findings.is_empty());
        assert_eq!(out.regions, vec!["us-east-1"]);
    }

    proptest::proptest! {
        #[test]
        fn one_failing_cell_costs_exactly_one_finding(
            region_count in 1usize..5,
            account_count in 1usize..5,
            failing_region in 0usize..5,
            failing_account in 0usize..5,
        ) {
            let regions: Vec<String> = (0..region_count).map(|i| format!("region-{}", i)).collect();
            let accounts: Vec<String> = (0..account_count).map(|i| format!("{:012}", i)).collect();
            let region = &regions[failing_region % region_count];
            let account = &accounts[failing_account % account_count];

            let mut stub = StubAws::default();
            stub.fail(&format!("images:{}:{}", region, account));
            let mut out = Collector::default();
            tokio_test::block_on(sweep(&stub, &regions, &accounts, &mut out));

            let public = out
                .findings
                .iter()
                .filter(|f| matches!(f, Finding::Image { account: Some(_), .. }))
                .count();
            proptest::prop_assert_eq!(public, region_count * account_count - 1);
            proptest::prop_assert_eq!(out.failures.len(), 1);
            proptest::prop_assert_eq!(stub.count("images"), region_count * (account_count + 1));
        }
    }
}
