//! CLI handler for the `plan` subcommand
//!
//! Runs one planning session and prints the numbered candidate list.

use crate::cache::ResultCache;
use crate::cli::PlanArgs;
use crate::config::{Config, ProviderKind};
use crate::error::PipelineError;
use crate::limiter::RateLimiter;
use crate::output::{build_summary, render_candidates, write_summary};
use crate::planner::{PlanRequest, PlanningSession};
use crate::search::create_provider;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Exit code when every category came back empty
const EXIT_NO_CANDIDATES: i32 = 2;
const EXIT_INTERRUPTED: i32 = 130;

pub async fn execute(args: PlanArgs, config_path: &Path) -> anyhow::Result<()> {
    let mut config = Config::load_or_default(config_path)?;

    // Apply CLI overrides
    if let Some(fixture) = args.fixture {
        config.search.provider = ProviderKind::Fixture;
        config.search.fixture = Some(fixture);
    }
    if let Some(concurrency) = args.concurrency {
        config.concurrency = Some(concurrency);
    }
    if let Some(target) = args.target {
        config.reducer.target_count = target;
    }

    config.validate()?;

    let search = create_provider(&config.search)?;
    let cache = Arc::new(ResultCache::from_config(&config.cache));
    let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));

    let anchor = match (args.anchor, args.location) {
        (Some(anchor), _) => anchor,
        (None, Some(name)) => {
            limiter.wait_if_needed().await;
            let anchor = search
                .locate(&name)
                .await?
                .ok_or_else(|| anyhow::anyhow!("No place found for location '{}'", name))?;
            info!("Resolved '{}' to {}", name, anchor);
            anchor
        }
        (None, None) => anyhow::bail!("Either --anchor or --location is required"),
    };

    let session = PlanningSession::new(&config, cache.clone(), limiter.clone(), search);

    let request = PlanRequest {
        anchor,
        companion: args.companion,
        categories: args.categories.unwrap_or_default(),
        radius_m: args.radius.unwrap_or(config.search.radius_m),
    };

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling outstanding searches");
            interrupt.cancel();
        }
    });

    let report = match session.run(&request, &cancel).await {
        Ok(report) => report,
        Err(PipelineError::EmptyCandidatePool) => {
            eprintln!(
                "No candidate places found within {}m of {}",
                request.radius_m, request.anchor
            );
            std::process::exit(EXIT_NO_CANDIDATES);
        }
        Err(PipelineError::Cancelled) => {
            eprintln!("Cancelled");
            std::process::exit(EXIT_INTERRUPTED);
        }
        Err(e) => return Err(e.into()),
    };

    debug!("Cache: {:?}", cache.stats());
    debug!("Rate limit: {:?}", limiter.status());

    if report.degraded() > 0 {
        warn!(
            "{} of {} categories were served stale or empty",
            report.degraded(),
            report.outcomes.len()
        );
    }

    if let Some(ref output_dir) = args.output {
        let path = write_summary(output_dir, &request, &report)?;
        info!("Session report written to {}", path.display());
    }

    if args.json {
        let summary = build_summary(&request, &report);
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", render_candidates(&report.candidates));
    }

    info!(
        "Session {} finished in {:.1}s with {} candidates",
        report.session_id,
        report.duration.as_secs_f64(),
        report.candidates.len()
    );

    Ok(())
}
