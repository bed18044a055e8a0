use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "curation-cli")]
#[command(about = "Command line client for the playlist curation API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Bearer token; required for authenticated routes
    #[arg(short, long, env = "CURATION_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service status
    Status,
    /// List every playlist
    List,
    /// Show a single playlist
    Get { id: i64 },
    /// Create a playlist with optional tags
    Create {
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Delete a playlist
    Delete { id: i64 },
    /// Recommend playlists sharing a tag with the given one
    Recommend { id: i64 },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let mut headers = HeaderMap::new();
    if let Some(token) = &cli.token {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))?,
        );
    }

    let res = match cli.command {
        Commands::Status => {
            client.get(format!("{}/health", base))
                .send()
                .await?
        }
        Commands::List => {
            client.get(format!("{}/api/v1/playlists", base))
                .headers(headers)
                .send()
                .await?
        }
        Commands::Get { id } => {
            client.get(format!("{}/api/v1/playlists/{}", base, id))
                .headers(headers)
                .send()
                .await?
        }
        Commands::Create { title, description, tags } => {
            let body = serde_json::json!({
                "title": title,
                "description": description,
                "tags": tags
            });
            client.post(format!("{}/api/v1/playlists", base))
                .headers(headers)
                .json(&body)
                .send()
                .await?
        }
        Commands::Delete { id } => {
            client.delete(format!("{}/api/v1/playlists/{}", base, id))
                .headers(headers)
                .send()
                .await?
        }
        Commands::Recommend { id } => {
            client.get(format!("{}/api/v1/playlists/{}/recommendation", base, id))
                .headers(headers)
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    if status == reqwest::StatusCode::NO_CONTENT {
        println!("{}", status);
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
