// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Galatea CLI entrypoint.
//!
//! By default this serves MCP over stdio (intended for tool integrations).
//! Use `--http-port` to serve MCP over streamable HTTP at
//! `http://127.0.0.1:<port>/mcp` instead.

use std::error::Error;
use std::sync::Arc;

use axum::Router;
use rmcp::transport::{
    streamable_http_server::session::local::LocalSessionManager, StreamableHttpServerConfig,
    StreamableHttpService,
};
use tracing_subscriber::EnvFilter;

use galatea::client::LocalConnector;
use galatea::config::Config;
use galatea::mcp::GalateaMcp;
use galatea::model::CellType;

const DEMO_CELLS: &[(CellType, &str)] = &[
    (CellType::Markdown, "# Galatea demo notebook"),
    (CellType::Code, "x = 6 * 7"),
    (CellType::Code, "x"),
];

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--notebook <path>] [--demo]\n  {program} [--notebook <path>] [--demo] --http-port <port>\n\nStdio mode (default) serves MCP on stdin/stdout.\n--http-port serves MCP over streamable HTTP at `http://127.0.0.1:<port>/mcp` instead.\n\n--notebook overrides the NOTEBOOK_PATH environment variable.\n--demo seeds the target notebook with a few demo cells.\n\nEnvironment: SERVER_URL, TOKEN, NOTEBOOK_PATH, GALATEA_WAIT_SECONDS, RUST_LOG."
    );
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    notebook: Option<String>,
    http_port: Option<u16>,
    demo: bool,
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--notebook" => {
                if options.notebook.is_some() {
                    return Err(());
                }
                options.notebook = Some(args.next().ok_or(())?);
            }
            "--http-port" => {
                if options.http_port.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                let port: u16 = raw.parse().map_err(|_| ())?;
                options.http_port = Some(port);
            }
            "--demo" => {
                if options.demo {
                    return Err(());
                }
                options.demo = true;
            }
            _ => return Err(()),
        }
    }

    Ok(options)
}

async fn serve_http(mcp: GalateaMcp, port: u16) -> Result<(), Box<dyn Error>> {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    let addr = listener.local_addr()?;

    let config = StreamableHttpServerConfig {
        stateful_mode: true,
        ..StreamableHttpServerConfig::default()
    };
    let shutdown_token = config.cancellation_token.clone();

    let session_manager = Arc::new(LocalSessionManager::default());
    let mcp_service = StreamableHttpService::new(move || Ok(mcp.clone()), session_manager, config);
    let router = Router::new().nest_service("/mcp", mcp_service);

    tracing::info!(%addr, "serving MCP over streamable HTTP at /mcp");
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            shutdown_token.cancel();
        })
        .await?;
    Ok(())
}

fn main() {
    let result = (|| -> Result<(), Box<dyn Error>> {
        // Stdio carries the MCP protocol, so logs go to stderr.
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_writer(std::io::stderr)
            .init();

        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "galatea".to_owned());
        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };

        let mut config = Config::from_env();
        if let Some(notebook) = options.notebook {
            config.notebook_path = notebook;
        }

        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
        runtime.block_on(async move {
            tracing::info!(
                server_url = %config.server_url,
                authenticated = config.token.is_some(),
                target = %config.notebook_path,
                "starting galatea"
            );

            let connector = LocalConnector::new();
            if options.demo {
                connector.seed(&config.notebook_path, DEMO_CELLS).await;
            }

            let mcp = GalateaMcp::connect(
                Arc::new(connector),
                &config.notebook_path,
                config.default_wait,
            )
            .await?;

            match options.http_port {
                Some(port) => serve_http(mcp, port).await,
                None => {
                    mcp.serve_stdio().await?;
                    Ok(())
                }
            }
        })
    })();

    if let Err(err) = result {
        eprintln!("galatea: {err}");
        std::process::exit(1);
    }
}
