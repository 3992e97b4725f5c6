//! certproc checker - main entry point
//!
//! Invoked by the coordinating parent with an inherited channel endpoint
//! and the parameters of one certificate check.

use std::os::fd::{FromRawFd, RawFd};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use certproc_checker::{evaluate, gateway};
use certproc_proto::Channel;

/// Certificate-lifecycle checker process for certproc
#[derive(Parser, Debug)]
#[command(name = "certproc-checker")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Inherited channel endpoint file descriptor
    #[arg(long = "fd", default_value_t = 3, env = "CERTPROC_FD")]
    fd: RawFd,

    /// Certificate storage directory
    #[arg(short = 'd', long = "certdir", env = "CERTPROC_CERTDIR")]
    certdir: PathBuf,

    /// Certificate file name within the storage directory
    #[arg(short = 'c', long = "certfile")]
    certfile: String,

    /// Force renewal regardless of expiry
    #[arg(long = "force")]
    force: bool,

    /// Offer the certificate for revocation instead of checking it
    #[arg(long = "revoke")]
    revoke: bool,

    /// Enable verbose logging (debug level)
    #[arg(long = "verbose")]
    verbose: bool,

    /// Authoritative list of domain names the certificate must cover
    #[arg(required = true)]
    domains: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Diagnostics go to stderr; the channel carries only outcome codes
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cert_path = cli.certdir.join(&cli.certfile);
    debug!(
        path = %cert_path.display(),
        force = cli.force,
        revoke = cli.revoke,
        domains = ?cli.domains,
        "starting certificate check"
    );

    let now = chrono::Utc::now().timestamp();
    let (outcome, facts) = evaluate(&cert_path, &cli.domains, cli.force, cli.revoke, now);

    let stream = channel_from_fd(cli.fd).context("failed to adopt the channel endpoint")?;
    gateway::report(Channel::new(stream), outcome, facts.as_ref(), cli.revoke)
        .await
        .context("report exchange failed")?;

    Ok(())
}

/// Adopt the inherited endpoint as an async Unix stream.
fn channel_from_fd(fd: RawFd) -> Result<tokio::net::UnixStream> {
    // Safety: the descriptor is inherited from the parent, already
    // connected, and owned exclusively by this process from here on
    let std_stream = unsafe { std::os::unix::net::UnixStream::from_raw_fd(fd) };
    std_stream
        .set_nonblocking(true)
        .context("failed to set the endpoint non-blocking")?;
    tokio::net::UnixStream::from_std(std_stream)
        .context("failed to register the endpoint with the runtime")
}
