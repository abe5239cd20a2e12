use anyhow::Context;
use chapter_feed::app::export::{write_chapters, write_details};
use chapter_feed::config::cli::CliArgs;
use chapter_feed::utils::error::ErrorSeverity;
use chapter_feed::utils::{logger, validation::Validate};
use chapter_feed::{ChapterEngine, FeedError, ReqwestTransport};
use clap::Parser;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    if logger::logs_are_json() {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    let config = match args.load_config().and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration validation failed: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };
    tracing::debug!("Source config: {:?}", config);

    let transport = ReqwestTransport::new(&config.http).context("building HTTP client")?;
    let engine = ChapterEngine::new(transport, config);

    let token = CancellationToken::new();
    let on_interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let mut buffer = Vec::new();
    let outcome = if args.details {
        match engine.details_cancellable(&args.manga_id, &token).await {
            Ok(details) => {
                tracing::info!(
                    "Fetched {} chapters for {}",
                    details.chapters.len(),
                    details.title.as_deref().unwrap_or(&args.manga_id)
                );
                write_details(&mut buffer, &details, args.format)
            }
            Err(e) => Err(e),
        }
    } else {
        match engine.chapters_cancellable(&args.manga_id, &token).await {
            Ok(chapters) => {
                tracing::info!("Fetched {} chapters for {}", chapters.len(), args.manga_id);
                write_chapters(&mut buffer, &chapters, args.format)
            }
            Err(e) => Err(e),
        }
    };

    if let Err(e) = outcome {
        exit_with(e);
    }

    match &args.output {
        Some(path) => {
            std::fs::write(path, &buffer)
                .with_context(|| format!("writing {}", path.display()))?;
            tracing::info!("Output saved to: {}", path.display());
        }
        None => {
            use std::io::Write;
            std::io::stdout().write_all(&buffer)?;
        }
    }

    Ok(())
}

fn exit_with(e: FeedError) -> ! {
    tracing::error!("Chapter fetch failed: {} (severity: {:?})", e, e.severity());
    eprintln!("❌ {}", e);
    if e.is_retryable() {
        eprintln!("💡 The upstream may be busy; try again later");
    }

    let exit_code = match e {
        FeedError::Cancelled => 130,
        _ if e.is_config_error() => 1,
        _ => match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium | ErrorSeverity::High => 2,
            ErrorSeverity::Critical => 3,
        },
    };
    std::process::exit(exit_code);
}
