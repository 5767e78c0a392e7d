//! meshgate-ctl: command-line interface for the meshgate gateway.

mod cmd;

use anyhow::{Context, Result};

const DEFAULT_PORT: u16 = 8080;

fn print_usage() {
    println!("Usage: meshgate-ctl [--port <port>] <command>");
    println!();
    println!("Commands:");
    println!("  peers             List peers known to the seed directory");
    println!("  aggregate <path>  Query <path> on every online peer");
    println!("  stats             Aggregate /api/logs/stats");
    println!("  health            Aggregate /api/logs/health");
    println!("  logs              Show events buffered by the gateway");
    println!("  tail [peer]       Follow live events (optionally one peer)");
    println!();
    println!("Options:");
    println!("  --port <port>   Gateway port (default: {})", DEFAULT_PORT);
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    // Parse --port option
    let mut port = DEFAULT_PORT;
    let mut remaining: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        if args[i] == "--port" {
            i += 1;
            port = args
                .get(i)
                .context("--port requires a value")?
                .parse()
                .context("--port must be a number")?;
        } else {
            remaining.push(&args[i]);
        }
        i += 1;
    }

    match remaining.as_slice() {
        ["peers"] | [] => cmd::peers::cmd_peers(port).await,
        ["aggregate", path] => cmd::events::cmd_aggregate(port, path).await,
        ["stats"] => cmd::events::cmd_named(port, "stats").await,
        ["health"] => cmd::events::cmd_named(port, "health").await,
        ["logs"] => cmd::events::cmd_named(port, "logs").await,
        ["tail"] => cmd::tail::cmd_tail(port, None).await,
        ["tail", peer] => cmd::tail::cmd_tail(port, Some(*peer)).await,
        ["help"] | ["--help"] | ["-h"] => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}
