//! zonectl - run execution requests against in-process zones.
//!
//! ```text
//! zonectl [--config PATH] [--zone ID] [--sync] [--broadcast SOURCE] <request-json>...
//! ```
//!
//! Zones listed in the config file are created on a [`LocalScheduler`] with the
//! demo functions from [`demo::registry`]. Each request is a JSON object as the
//! bridge accepts it, for example `{"module":"demo","function":"add","arguments":[2,40]}`.
//! Decoded responses are printed to stdout, one JSON object per line, in
//! completion order.

mod demo;

use anyhow::{Context, Result, bail};
use std::cell::Cell;
use std::io::{self, Write};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use zone_bridge::{EventLoop, ResponseCode, Zone, ZoneScheduler, ZoneSettings};
use zone_config::BridgeConfig;
use zone_local::LocalScheduler;

/// Zone created when the config file lists none.
const DEFAULT_ZONE: &str = "default";

const USAGE: &str = "usage: zonectl [--config PATH] [--zone ID] [--sync] [--broadcast SOURCE] <request-json>...";

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // stdout carries responses; logs go to stderr.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter)
        .init();
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Options {
    config: Option<PathBuf>,
    zone: Option<String>,
    sync: bool,
    broadcast: Option<String>,
    requests: Vec<String>,
}

enum Command {
    Run(Options),
    Help,
}

fn parse_args<I>(args: I) -> Result<Command>
where
    I: IntoIterator<Item = String>,
{
    let mut options = Options::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "--sync" => options.sync = true,
            "--config" => {
                let path = args.next().context("--config requires a path")?;
                options.config = Some(PathBuf::from(path));
            }
            "--zone" => {
                options.zone = Some(args.next().context("--zone requires an id")?);
            }
            "--broadcast" => {
                options.broadcast = Some(args.next().context("--broadcast requires a source")?);
            }
            flag if flag.starts_with("--") => bail!("unknown option '{flag}'\n{USAGE}"),
            _ => options.requests.push(arg),
        }
    }

    if options.requests.is_empty() && options.broadcast.is_none() {
        bail!("no requests given\n{USAGE}");
    }
    Ok(Command::Run(options))
}

/// Create every configured zone and bind the one requests should target.
fn bind_zone(
    scheduler: &Arc<dyn ZoneScheduler>,
    event_loop: &EventLoop,
    config: &BridgeConfig,
    target: Option<&str>,
) -> Result<Zone> {
    let mut bound = Vec::new();
    if config.zones.is_empty() {
        bound.push(
            Zone::create(
                Arc::clone(scheduler),
                event_loop.bridge(),
                DEFAULT_ZONE,
                ZoneSettings::new(),
            )
            .context("failed to create default zone")?,
        );
    }
    for zone in &config.zones {
        let settings = zone
            .zone_settings()
            .with_context(|| format!("invalid settings for zone '{}'", zone.id))?;
        bound.push(
            Zone::create(
                Arc::clone(scheduler),
                event_loop.bridge(),
                zone.id.clone(),
                settings,
            )
            .with_context(|| format!("failed to create zone '{}'", zone.id))?,
        );
    }

    match target {
        Some(id) => Zone::get(Arc::clone(scheduler), event_loop.bridge(), id)
            .with_context(|| format!("zone '{id}' is not configured")),
        None => bound
            .into_iter()
            .next()
            .context("no zones were created"),
    }
}

fn print_line(value: &serde_json::Value) {
    let mut stdout = io::stdout().lock();
    if let Err(e) = writeln!(stdout, "{value}") {
        tracing::warn!(error = %e, "Failed to write response");
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();

    let options = match parse_args(std::env::args().skip(1))? {
        Command::Run(options) => options,
        Command::Help => {
            println!("{USAGE}");
            return Ok(());
        }
    };

    let config = match &options.config {
        Some(path) => BridgeConfig::load_from(path),
        None => BridgeConfig::load(),
    }
    .context("failed to load configuration")?;

    let scheduler: Arc<dyn ZoneScheduler> = Arc::new(LocalScheduler::new(demo::registry()));
    let mut event_loop = EventLoop::with_budget(config.event_loop.poll_budget);
    let zone = bind_zone(&scheduler, &event_loop, &config, options.zone.as_deref())?;
    tracing::info!(zone = zone.id(), sync = options.sync, "Zone ready");

    let requests = options
        .requests
        .iter()
        .map(|raw| {
            serde_json::from_str::<serde_json::Value>(raw)
                .with_context(|| format!("request is not valid JSON: {raw}"))
        })
        .collect::<Result<Vec<_>>>()?;

    let failures = Rc::new(Cell::new(0_usize));
    submit(&zone, &options, &requests, &failures)?;

    while event_loop.pending() > 0 {
        event_loop.tick().await;
    }

    if failures.get() > 0 {
        bail!("{} responses reported a failure code", failures.get());
    }
    Ok(())
}

fn count_failure(failures: &Cell<usize>, code: ResponseCode) {
    if !code.is_success() {
        failures.set(failures.get() + 1);
    }
}

/// Hand the broadcast and every request to `zone`.
///
/// Sync results are counted before this returns. Async results are counted as
/// the event loop delivers them.
fn submit(
    zone: &Zone,
    options: &Options,
    requests: &[serde_json::Value],
    failures: &Rc<Cell<usize>>,
) -> Result<()> {
    if let Some(source) = &options.broadcast {
        if options.sync {
            let result = zone.broadcast_sync(source);
            count_failure(failures, result.code);
            print_line(&serde_json::json!({ "broadcast": result.code }));
        } else {
            let failures = Rc::clone(failures);
            zone.broadcast(source.clone(), move |result| {
                count_failure(&failures, result.code);
                print_line(&serde_json::json!({ "broadcast": result.code }));
            });
        }
    }

    for request in requests {
        if options.sync {
            let decoded = zone.execute_sync(request)?;
            count_failure(failures, decoded.code);
            print_line(&decoded.to_value());
        } else {
            let failures = Rc::clone(failures);
            zone.execute(request, move |decoded| {
                count_failure(&failures, decoded.code);
                print_line(&decoded.to_value());
            })?;
        }
    }
    Ok(())
}
