use tracing::{debug, info, warn};

use crate::{
    client::{ApiError, DroneApi},
    config::{PURGE_BUILDS_VAR, PURGE_LOGS_VAR, PurgeConfig},
    types::Build,
};

/// A failed purge run, tagged with the call that failed.
#[derive(Debug, thiserror::Error)]
pub enum PurgeError {
    #[error("failed retrieving build list")]
    ListBuilds(#[source] ApiError),

    #[error("failed to get info for build {build}")]
    FetchBuild {
        build: i64,
        #[source]
        source: ApiError,
    },

    #[error("log purge failed for build {build}, stage {stage}, step {step}")]
    PurgeLog {
        build: i64,
        stage: i64,
        step: i64,
        #[source]
        source: ApiError,
    },

    #[error("build purge failed for builds before {before}")]
    PurgeBuilds {
        before: i64,
        #[source]
        source: ApiError,
    },
}

/// What a completed run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub builds_listed: usize,
    /// Listed builds left alone because they are at or above the cutoff.
    pub builds_skipped: usize,
    /// Builds whose step logs were purged.
    pub builds_cleaned: usize,
    pub logs_purged: usize,
    pub builds_purged: bool,
}

/// Lists builds and runs whichever purges `config` enables, stopping at the first error.
pub async fn run<C>(client: &C, config: &PurgeConfig) -> Result<PurgeReport, PurgeError>
where
    C: DroneApi + ?Sized,
{
    let builds = client
        .list_builds(&config.namespace, &config.repo, config.list_options())
        .await
        .map_err(PurgeError::ListBuilds)?;
    info!(
        namespace = %config.namespace,
        repo = %config.repo,
        count = builds.len(),
        "Retrieved build list"
    );

    let mut report = PurgeReport {
        builds_listed: builds.len(),
        ..Default::default()
    };

    if config.purge_logs {
        purge_logs(client, config, &builds, &mut report).await?;
    } else {
        info!("{PURGE_LOGS_VAR}=false detected, all logs untouched");
    }

    if config.purge_builds {
        purge_builds(client, config).await?;
        report.builds_purged = true;
    } else {
        info!("{PURGE_BUILDS_VAR}=false detected, all builds untouched");
    }

    Ok(report)
}

async fn purge_logs<C>(
    client: &C,
    config: &PurgeConfig,
    builds: &[Build],
    report: &mut PurgeReport,
) -> Result<(), PurgeError>
where
    C: DroneApi + ?Sized,
{
    let (ns, repo) = (config.namespace.as_str(), config.repo.as_str());

    for summary in builds {
        if summary.number >= config.before {
            debug!(build = summary.number, before = config.before, "Keeping build logs");
            report.builds_skipped += 1;
            continue;
        }

        // The listed number passed the cutoff check, so every call below uses it.
        let number = summary.number;
        info!(
            build = number,
            author = %summary.author_name,
            event = %summary.event,
            status = %summary.status,
            "[Build {}] - {}",
            number,
            summary.title()
        );
        let build = client
            .get_build(ns, repo, number)
            .await
            .map_err(|source| PurgeError::FetchBuild {
                build: number,
                source,
            })?;
        if build.number != number {
            warn!(
                build = number,
                detail_number = build.number,
                "Build detail reports a different number"
            );
        }

        for stage in &build.stages {
            info!(
                build = number,
                status = %stage.status,
                "[Stage {}] - {}",
                stage.number,
                stage.name
            );
            for step in &stage.steps {
                info!(
                    build = number,
                    stage = stage.number,
                    status = %step.status,
                    "[Step {}] - {}",
                    step.number,
                    step.name
                );
                debug!("purging log");
                client
                    .purge_logs(ns, repo, number, stage.number, step.number)
                    .await
                    .map_err(|source| PurgeError::PurgeLog {
                        build: number,
                        stage: stage.number,
                        step: step.number,
                        source,
                    })?;
                report.logs_purged += 1;
            }
        }
        report.builds_cleaned += 1;
    }

    Ok(())
}

async fn purge_builds<C>(client: &C, config: &PurgeConfig) -> Result<(), PurgeError>
where
    C: DroneApi + ?Sized,
{
    info!(before = config.before, "Purging builds");
    client
        .purge_builds(&config.namespace, &config.repo, config.before)
        .await
        .map_err(|source| PurgeError::PurgeBuilds {
            before: config.before,
            source,
        })
}
