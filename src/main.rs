use anyhow::{Context, Result};
use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use wrap::completion::WrapHelper;
use wrap::config::{Args, Config};
use wrap::plugin::Plugin;
use wrap::repl::EditorSource;
use wrap::{Repl, Session};

fn main() -> ExitCode {
    let args: Args = argh::from_env();
    let config = Config::from_args(args);
    setup_logging(config.debug);

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("wrap: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(debug: bool) {
    let filter = EnvFilter::try_from_env("WRAP_LOG")
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(config: Config) -> Result<()> {
    if !config.color {
        colored::control::set_override(false);
    }

    // Ctrl-C while a child runs reaches the child through the terminal's
    // process group; the REPL itself keeps going.
    ctrlc::set_handler(|| tracing::debug!("interrupt received"))
        .context("failed to install interrupt handler")?;

    let mut session = Session::new(config.base.clone());
    let plugin = Plugin::lookup(&config.base.program);
    let subcommands = plugin.subcommands(&config.base.program);
    tracing::info!(
        base = %config.base.program,
        ?plugin,
        subcommands = subcommands.len(),
        "starting session"
    );

    let helper = WrapHelper::new(subcommands, session.current_dir.clone());
    let mut source = EditorSource::new(&config, helper).context("failed to initialize line editor")?;
    session.history = source.history_entries();

    Repl::default()
        .run(&mut source, &mut session, &mut io::stdout(), &mut io::stderr())
        .context("line editor failed")?;
    Ok(())
}
