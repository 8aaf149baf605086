//! Console logging
//!
//! Every line the tool prints goes through `tracing`. The formatter renders
//! events as `[LEVEL] message`, so progress shows up as `[INFO] ...`,
//! prompts and warnings as `[WARN] ...` and failures as `[ERROR] ...`.

use std::fmt;

use anyhow::{anyhow, Result};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Event formatter producing `[LEVEL] message key=value`
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleFormat;

impl<S, N> FormatEvent<S, N> for ConsoleFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(writer, "[{}] ", event.metadata().level())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Initialize logging based on verbosity level
///
/// `RUST_LOG` takes precedence over the verbosity flag.
pub fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .event_format(ConsoleFormat)
                .with_ansi(false),
        )
        .with(filter)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}
