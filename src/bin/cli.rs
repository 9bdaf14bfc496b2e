//! Terminal client for a Touchline gateway.

use std::io::{BufRead, Write};

use clap::Parser;
use touchline::{GatewayClient, SearchResponse};
use tracing_subscriber::EnvFilter;

/// Ask a running Touchline gateway football questions.
#[derive(Parser)]
#[command(name = "touchline-cli", version, about)]
struct Cli {
    /// Gateway endpoint.
    #[arg(short, long, env = "TOUCHLINE_ENDPOINT", default_value = "http://127.0.0.1:8787/")]
    endpoint: String,

    /// Bearer token identifying the user (anonymous when omitted).
    #[arg(long, env = "TOUCHLINE_TOKEN")]
    token: Option<String>,

    /// Ask one question and exit. Without it, start an interactive prompt.
    query: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("touchline=warn")),
        )
        .init();

    let cli = Cli::parse();
    let mut client = GatewayClient::new(cli.endpoint);
    if let Some(token) = cli.token {
        client = client.with_bearer(token);
    }

    if !cli.query.is_empty() {
        let response = client.search(&cli.query.join(" ")).await?;
        render(&response);
        return Ok(());
    }

    run_interactive(&mut client).await
}

async fn run_interactive(client: &mut GatewayClient) -> anyhow::Result<()> {
    println!("Touchline v{}", env!("CARGO_PKG_VERSION"));
    println!("Ask a football question. :history lists recent queries, :quit exits.");

    let stdin = std::io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        match line.trim() {
            "" => continue,
            ":quit" | ":q" => break,
            ":history" => {
                if client.recent().is_empty() {
                    println!("(no recent searches)");
                }
                for (i, query) in client.recent().iter().enumerate() {
                    println!("{:>2}. {query}", i + 1);
                }
            }
            query => match client.search(query).await {
                Ok(response) => render(&response),
                Err(e) => eprintln!("error: {}", e.message()),
            },
        }
    }
    Ok(())
}

fn render(response: &SearchResponse) {
    println!();
    println!("{}", response.summary);
    if !response.sources.is_empty() {
        println!();
        println!("Sources:");
        for (i, source) in response.sources.iter().enumerate() {
            println!("  [{}] {}", i + 1, source.title);
            if source.url != "#" {
                println!("      {}", source.url);
            }
        }
    }
    println!();
}
