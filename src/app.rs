//! Application orchestrator.
//! Loads/merges config, initializes logging, installs the signal handler, then runs the
//! pipeline (or its dry-run plan) and reports failures as structured log events.

use anyhow::{Context, Result};
use tracing::{debug, error, info};

use qbot::cli::Args;
use qbot::output as out;
use qbot::{Config, QbotError, default_config_path, load_config, pipeline, shutdown};

use crate::logging::init_tracing;

/// Run the CLI application.
pub fn run(args: Args) -> Result<()> {
    // Handle --print-config before logging init
    if args.print_config {
        print_config_location();
        return Ok(());
    }

    // Defaults <- XML file.
    let (mut cfg, cfg_path) = match load_config() {
        Ok(Some((cfg, path))) => (cfg, Some(path)),
        Ok(None) => (Config::default(), None),
        Err(e) => {
            out::print_error(&format!("Failed to load config: {e:#}"));
            return Err(e);
        }
    };

    // Logging settings are taken first so later config errors reach the log file.
    let log_level = args.effective_log_level().unwrap_or_else(|| cfg.log_level.clone());
    let log_file = args.log_file.clone().or_else(|| cfg.log_file.clone());
    // Held until `run` returns so events logged while unwinding an interrupt are flushed.
    let guard = init_tracing(&log_level, log_file.as_deref(), args.json).map_err(|e| {
        out::print_error(&format!("Failed to initialize logging: {e}"));
        e
    })?;

    // Only raise the flag; the pipeline stops at its next checkpoint and reports it.
    ctrlc::set_handler(|| {
        shutdown::request();
        out::print_warn("Received interrupt; stopping after the current step...");
    })
    .context("install signal handler")?;

    if let Some(path) = &cfg_path {
        debug!(path = %path.display(), "Using config file");
    }
    debug!(?args, "Starting qbot");

    let result = (|| -> Result<()> {
        // <- CLI flags.
        args.apply_overrides(&mut cfg).map_err(report)?;

        let source = args
            .resolved_source()
            .context("missing SOURCE_DIR argument")?;
        let category = args
            .media_category()
            .context("missing MEDIA_CATEGORY argument")?
            .map_err(report)?;

        if cfg.dry_run {
            let plan = pipeline::plan(&cfg, &source, category).map_err(report)?;
            for m in &plan.moves {
                out::print_user(&format!(
                    "Dry-run: would stage '{}' -> '{}'",
                    m.source.display(),
                    m.dest.display()
                ));
            }
            let filebot = qbot::Filebot::new(&cfg.filebot_bin);
            for request in &plan.requests {
                out::print_user(&format!("Dry-run: would run {}", filebot.display_command(request)));
            }
            if plan.requests.is_empty() {
                out::print_warn("Dry-run: no candidate extension would be found; nothing would be renamed");
            }
            return Ok(());
        }

        let summary = pipeline::run(&cfg, &source, category).map_err(report)?;
        info!(
            source = %source.display(),
            category = %category,
            staged = summary.staged.moved,
            groups = summary.groups.len(),
            "Post-processing completed"
        );
        out::print_success(&format!(
            "Processed '{}': {} file(s) staged, {} extension group(s) renamed",
            source.display(),
            summary.staged.moved,
            summary.groups.len()
        ));
        Ok(())
    })();

    // Ensure logs are flushed before exit
    drop(guard);

    result
}

fn print_config_location() {
    match default_config_path() {
        Some((p, true)) => {
            out::print_info(&format!("Using QBOT_CONFIG (explicit):\n  {}\n", p.display()));
            out::print_info("To override, unset QBOT_CONFIG or set it to another file.");
        }
        Some((p, false)) => {
            out::print_info(&format!("Default qbot config path:\n  {}\n", p.display()));
            if p.exists() {
                out::print_info("A config file exists at that location.");
            } else {
                out::print_info("No config file exists there; built-in defaults and CLI flags are used.");
            }
        }
        None => out::print_error("Could not determine a default config path"),
    }
}

/// Emit one structured error event for a pipeline failure and convert it for `main`.
fn report(e: QbotError) -> anyhow::Error {
    let code = e.code();
    match &e {
        QbotError::UnsupportedCategory(category) => {
            error!(code, %category, "Unsupported media category")
        }
        QbotError::UnrecognizedVariant { kind, value } => {
            error!(code, kind = *kind, %value, "Unrecognized option value")
        }
        QbotError::InvalidPath { path, reason } => {
            error!(code, path = %path.display(), %reason, "Invalid path")
        }
        QbotError::Walk { path, source } => {
            error!(code, path = %path.display(), error = %source, "Walk failed")
        }
        QbotError::PartialFailure { path, moved, source } => {
            error!(code, path = %path.display(), moved = *moved, cause = source.root_cause().code(), error = %source, "Staging aborted")
        }
        QbotError::InsufficientSpace {
            required,
            available,
            dest,
        } => {
            error!(code, required = *required, available = *available, dest = %dest.display(), "Not enough space")
        }
        QbotError::Invocation { message, output } => {
            error!(code, %message, output = %output.trim_end(), "filebot failed")
        }
        QbotError::NoMatchingFiles { pattern } => {
            error!(code, %pattern, "No files matched")
        }
        QbotError::Cleanup { path, source } => {
            error!(code, path = %path.display(), error = %source, "Cleanup failed")
        }
        QbotError::Interrupted => error!(code, "Aborted by user"),
        other => error!(code, error = %other, "Post-processing failed"),
    }
    anyhow::Error::new(e)
}
