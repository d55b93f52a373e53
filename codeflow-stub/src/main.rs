//! Review service stub - canned responses for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use codeflow_stub::{StubFixtures, StubState, load_fixtures, router};

#[derive(Parser)]
#[command(name = "codeflow-stub")]
#[command(about = "Deterministic stand-in for the code review service")]
struct Args {
    /// Address to bind the server to
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,

    /// Port to listen on
    #[arg(long, default_value = "5000")]
    port: u16,

    /// TOML file with canned responses (built-in defaults when omitted)
    #[arg(long)]
    fixtures: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("codeflow_stub=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let fixtures = match &args.fixtures {
        Some(path) => {
            info!(fixtures = %path.display(), "loading fixtures");
            load_fixtures(path)?
        }
        None => StubFixtures::default(),
    };
    let app = router(StubState::new(fixtures));

    let addr: SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
