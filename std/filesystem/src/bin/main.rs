//! Binary entry point for the mcp-filesystem MCP server.

use clap::Parser;
use mcp_filesystem::{
    Error, FilesystemServer, ServerConfig,
    exclude::{DEFAULT_EXCLUDES, ExclusionPatterns},
    validate::AllowedRoots,
};
use rmcp::ServiceExt;
use std::path::PathBuf;

/// MCP Filesystem Server — provides sandboxed filesystem tools.
#[derive(Parser)]
#[command(name = "mcp-filesystem", version, about)]
struct Cli {
    /// Allowed directories the server may access.
    #[arg(required = true, num_args = 1..)]
    allowed_dirs: Vec<PathBuf>,

    /// Refuse every tool that modifies the filesystem.
    #[arg(long)]
    read_only: bool,

    /// Extra entry-name glob to hide from listings and searches.
    #[arg(long = "exclude", value_name = "GLOB")]
    exclude: Vec<String>,

    /// Do not hide `*.pyc`, `__pycache__` and `.git` by default.
    #[arg(long)]
    no_default_excludes: bool,

    /// Largest file, in MiB, that read_file and edit_file will load.
    #[arg(long, value_name = "MB", default_value_t = 10)]
    max_file_size_mb: u64,
}

impl Cli {
    fn into_config(self) -> Result<ServerConfig, Error> {
        let roots = AllowedRoots::new(&self.allowed_dirs)?;
        let mut patterns: Vec<String> = if self.no_default_excludes {
            Vec::new()
        } else {
            DEFAULT_EXCLUDES.iter().map(|p| p.to_string()).collect()
        };
        patterns.extend(self.exclude);

        Ok(ServerConfig::new(roots)
            .with_read_only(self.read_only)
            .with_exclusions(ExclusionPatterns::new(patterns)?)
            .with_max_file_size(self.max_file_size_mb.saturating_mul(1024 * 1024)))
    }
}

#[tokio::main]
async fn main() {
    if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .init();
    }
    let cli = Cli::parse();
    let config = match cli.into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    tracing::info!(
        roots = ?config.roots.iter().collect::<Vec<_>>(),
        read_only = config.read_only,
        excludes = ?config.exclusions.iter().collect::<Vec<_>>(),
        "starting filesystem server"
    );

    let server = FilesystemServer::new(config);
    let transport = rmcp::transport::stdio();
    server
        .serve(transport)
        .await
        .expect("failed to start server")
        .waiting()
        .await
        .expect("server error");
}
