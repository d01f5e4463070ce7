//! One-shot audit orchestration.
//!
//! `execute` owns the store session; `run` holds the audit loop and is
//! written against the `ClubReader` seam so it can be driven in tests
//! without a store.

use std::io::Write;

use tracing::debug;

use crate::clubs::{ClubReader, MongoClubReader};
use crate::config::Config;
use crate::detect::detect;
use crate::error::AuditError;
use crate::report::{Reporter, Summary};
use crate::store::StoreSession;

/// Connect to the store, audit every club, and release the session on every
/// exit path.
pub async fn execute<W: Write>(config: &Config, out: &mut W) -> Result<Summary, AuditError> {
    let session = StoreSession::connect(config).await?;
    let result = {
        let reader = MongoClubReader::new(session.database(), config.socket_timeout);
        run(&reader, out).await
    };
    session.close().await;
    result
}

/// Audit every club the reader returns, reporting findings in store order
/// followed by the aggregate summary.
pub async fn run<R, W>(reader: &R, out: &mut W) -> Result<Summary, AuditError>
where
    R: ClubReader + ?Sized,
    W: Write,
{
    let clubs = reader.list_clubs_with_members().await?;

    let mut reporter = Reporter::new(out);
    let mut summary = Summary {
        total_clubs: clubs.len(),
        ..Default::default()
    };

    for club in &clubs {
        if let Some(finding) = detect(club) {
            debug!(
                club = %club.name,
                duplicates = finding.duplicates.len(),
                "found duplicate memberships"
            );
            reporter.finding(&finding)?;
            summary.record(&finding);
        }
    }

    reporter.summary(&summary)?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clubs::{Club, Membership, UserRef};
    use async_trait::async_trait;

    struct StaticReader {
        clubs: Vec<Club>,
    }

    #[async_trait]
    impl ClubReader for StaticReader {
        async fn list_clubs_with_members(&self) -> Result<Vec<Club>, AuditError> {
            Ok(self.clubs.clone())
        }
    }

    struct FailingReader;

    #[async_trait]
    impl ClubReader for FailingReader {
        async fn list_clubs_with_members(&self) -> Result<Vec<Club>, AuditError> {
            Err(AuditError::Query(anyhow::anyhow!("cursor dropped")))
        }
    }

    fn member(id: &str, name: Option<&str>) -> Membership {
        Membership {
            user: Some(UserRef {
                id: id.to_string(),
                name: name.map(str::to_string),
                email: None,
            }),
        }
    }

    fn club(id: &str, name: &str, members: Vec<Membership>) -> Club {
        Club {
            id: id.to_string(),
            name: name.to_string(),
            members,
        }
    }

    async fn audit(clubs: Vec<Club>) -> (Summary, String) {
        let reader = StaticReader { clubs };
        let mut out = Vec::new();
        let summary = run(&reader, &mut out).await.unwrap();
        (summary, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn empty_store_reports_zero_clubs_and_confirms() {
        let (summary, out) = audit(vec![]).await;
        assert_eq!(summary, Summary::default());
        assert!(out.contains("Clubs checked: 0"));
        assert!(out.contains("No duplicate memberships found"));
    }

    #[tokio::test]
    async fn clean_clubs_produce_no_finding_blocks() {
        let chess = club(
            "c1",
            "Chess",
            vec![member("u1", Some("Ann")), member("u2", Some("Bob"))],
        );
        let (summary, out) = audit(vec![chess]).await;
        assert_eq!(summary.total_clubs, 1);
        assert_eq!(summary.clubs_with_duplicates, 0);
        assert_eq!(summary.extra_memberships, 0);
        assert!(!out.contains("members:"));
        assert!(out.contains("No duplicate memberships found"));
    }

    #[tokio::test]
    async fn duplicates_aggregate_across_clubs() {
        let a = club(
            "a",
            "A",
            vec![
                member("u1", Some("Ann")),
                member("u1", Some("Ann")),
                member("u1", Some("Ann")),
                member("u2", Some("Bob")),
            ],
        );
        let b = club(
            "b",
            "B",
            vec![member("u3", Some("Cy")), member("u4", Some("Dee"))],
        );
        let (summary, out) = audit(vec![a, b]).await;
        assert_eq!(summary.total_clubs, 2);
        assert_eq!(summary.clubs_with_duplicates, 1);
        assert_eq!(summary.extra_memberships, 2);
        assert!(out.contains("Ann (u1): 3 memberships"));
        assert!(out.contains("4 total, 2 unique"));
        assert!(out.contains("fix-duplicate-clubs"));
        // Club B is clean and gets no block of its own.
        assert!(!out.contains("\"B\""));
    }

    #[tokio::test]
    async fn skipped_user_refs_never_reach_the_report() {
        let holes = club(
            "c5",
            "Holes",
            vec![
                Membership { user: None },
                member("u1", None),
                member("u1", None),
            ],
        );
        let (summary, out) = audit(vec![holes]).await;
        assert_eq!(summary.clubs_with_duplicates, 1);
        assert_eq!(summary.extra_memberships, 1);
        assert!(out.contains("2 total, 1 unique"));
        assert!(out.contains("u1 (u1): 2 memberships"));
    }

    #[tokio::test]
    async fn audit_is_idempotent_over_an_unchanging_store() {
        let clubs = vec![club(
            "c1",
            "Art",
            vec![member("u1", Some("Ann")), member("u1", Some("Ann"))],
        )];
        let (first_summary, first_out) = audit(clubs.clone()).await;
        let (second_summary, second_out) = audit(clubs).await;
        assert_eq!(first_summary, second_summary);
        assert_eq!(first_out, second_out);
    }

    #[tokio::test]
    async fn query_failure_propagates_before_any_output() {
        let mut out = Vec::new();
        let err = run(&FailingReader, &mut out).await.unwrap_err();
        assert!(matches!(err, AuditError::Query(_)));
        assert!(out.is_empty());
    }
}
