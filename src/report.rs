//! `srag report`: topic analytics for one user.

use anyhow::Result;

use syllabus_rag_core::analytics::analyze;
use syllabus_rag_core::models::AnalyticsReport;
use syllabus_rag_core::store::InteractionLog;

use crate::config::Config;
use crate::{db, services};

/// Build the report for `user` without touching any provider.
pub async fn build_report(config: &Config, user: &str) -> Result<AnalyticsReport> {
    let pool = db::connect(config).await?;
    let interactions = services::interaction_log(&pool).list_by_user(user).await?;
    let extractor = services::topic_extractor(config);

    tracing::debug!(user, interactions = interactions.len(), "building analytics report");
    Ok(analyze(&interactions, extractor.as_ref()))
}

pub async fn run_report(config: &Config, user: &str) -> Result<()> {
    let report = build_report(config, user).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::migrate;
    use chrono::Utc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_report_from_logged_interactions() {
        let tmp = TempDir::new().unwrap();
        let cfg = parse_config(&format!(
            "[db]\npath = \"{}\"\n",
            tmp.path().join("srag.sqlite").display()
        ))
        .unwrap();
        let pool = db::connect(&cfg).await.unwrap();
        migrate::run_migrations(&pool).await.unwrap();

        let log = services::interaction_log(&pool);
        let now = Utc::now();
        log.append("u1", "Help with calculus limits", "...", now).await.unwrap();
        log.append("u1", "More calculus and algebra", "...", now).await.unwrap();
        log.append("u1", "geometry proofs", "...", now).await.unwrap();
        log.append("u2", "statistics", "...", now).await.unwrap();

        let report = build_report(&cfg, "u1").await.unwrap();
        assert_eq!(report.topic_count["calculus"], 2);
        assert_eq!(report.topic_count["algebra"], 1);
        assert!(!report.topic_count.contains_key("statistics"));
        assert_eq!(report.strengths, vec!["calculus", "algebra"]);
        assert_eq!(report.gaps, vec!["geometry"]);
    }

    #[tokio::test]
    async fn test_report_for_unknown_user_is_empty() {
        let tmp = TempDir::new().unwrap();
        let cfg = parse_config(&format!(
            "[db]\npath = \"{}\"\n",
            tmp.path().join("srag.sqlite").display()
        ))
        .unwrap();
        let pool = db::connect(&cfg).await.unwrap();
        migrate::run_migrations(&pool).await.unwrap();

        let report = build_report(&cfg, "nobody").await.unwrap();
        assert_eq!(report, AnalyticsReport::default());
    }
}
