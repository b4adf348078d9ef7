use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tokio::io::AsyncWriteExt;

#[derive(Parser)]
#[command(name = "docuserv-cli")]
#[command(about = "Client for the docuserv document store", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a new document
    Create { id: String, file: PathBuf },
    /// Replace an existing document
    Update { id: String, file: PathBuf },
    /// Download a document to stdout or a file
    Get {
        id: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete a document
    Delete { id: String },
    /// Check server status
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let documents = format!("{}/storage/documents", cli.url.trim_end_matches('/'));

    match cli.command {
        Commands::Create { id, file } => {
            let content = tokio::fs::read(&file).await?;
            let res = client
                .post(&documents)
                .header("x-documentid", &id)
                .body(content)
                .send()
                .await?;
            report(res).await?;
        }
        Commands::Update { id, file } => {
            let content = tokio::fs::read(&file).await?;
            let form = Form::new().part("document", Part::bytes(content).file_name(id));
            let res = client.put(&documents).multipart(form).send().await?;
            report(res).await?;
        }
        Commands::Get { id, output } => {
            let mut res = client.get(format!("{documents}/{id}")).send().await?;
            if !res.status().is_success() {
                return report(res).await;
            }
            let mut out: Box<dyn tokio::io::AsyncWrite + Unpin> = match output {
                Some(path) => Box::new(tokio::fs::File::create(path).await?),
                None => Box::new(tokio::io::stdout()),
            };
            while let Some(chunk) = res.chunk().await? {
                out.write_all(&chunk).await?;
            }
            out.flush().await?;
        }
        Commands::Delete { id } => {
            let res = client.delete(format!("{documents}/{id}")).send().await?;
            report(res).await?;
        }
        Commands::Health => {
            let res = client.get(format!("{}/health", cli.url.trim_end_matches('/'))).send().await?;
            let json: Value = res.json().await?;
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(())
}

async fn report(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if status.is_success() {
        println!("{}", status);
        return Ok(());
    }
    eprintln!("Error: server returned status {}", status);
    if let Ok(text) = res.text().await {
        if !text.is_empty() {
            eprintln!("Response: {}", text);
        }
    }
    std::process::exit(1);
}
