use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "catalog-cli")]
#[command(about = "Management CLI for the image catalog", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Bearer token; only needed for protected commands.
    #[arg(short, long)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List images
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        size: u32,
        #[arg(long, default_value = "desc")]
        order: String,
    },
    /// Show one image
    Get { id: String },
    /// Delete an image (admin token required)
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = format!("{}/api/v1/images", cli.url.trim_end_matches('/'));

    let mut headers = HeaderMap::new();
    if let Some(token) = &cli.token {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", token))?);
    }

    let res = match cli.command {
        Commands::List { page, size, order } => {
            client
                .get(&base)
                .query(&[("page", page.to_string()), ("size", size.to_string()), ("order", order)])
                .headers(headers)
                .send()
                .await?
        }
        Commands::Get { id } => client.get(format!("{}/{}", base, id)).headers(headers).send().await?,
        Commands::Delete { id } => {
            client
                .delete(format!("{}/{}", base, id))
                .headers(headers)
                .send()
                .await?
        }
    };
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        let reason = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|v| v.get("err").and_then(Value::as_str).map(str::to_owned))
            .unwrap_or(text);
        eprintln!("Error: catalog returned status {}: {}", status, reason);
        return Ok(());
    }

    if text.is_empty() {
        println!("{}", status);
        return Ok(());
    }
    let json: Value = serde_json::from_str(&text)?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
