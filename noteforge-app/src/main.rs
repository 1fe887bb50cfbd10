use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use noteforge_app::cli::commands::{open_forge, run_cli};
use noteforge_app::cli::opts::{Cli, Command};
use noteforge_app::tui::app::TuiApp;

fn main() -> Result<()> {
    let args = Cli::parse();

    match &args.cmd {
        // The TUI owns the terminal; keep log lines off it unless asked for.
        Command::Tui => {
            init_tracing("off");
            let rt = Arc::new(Runtime::new()?);
            let ctx = rt.block_on(open_forge(&args))?;
            let mut app = TuiApp::new(ctx.forge, ctx.settings, rt);
            app.run()
        }
        _ => {
            init_tracing("info,hyper=warn,sqlx=warn");
            let rt = Runtime::new()?;
            rt.block_on(run_cli(args))
        }
    }
}

fn init_tracing(default_directives: &str) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directives.into());
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
