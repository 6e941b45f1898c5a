mod cli;

use std::io::{BufRead, Write};
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use tabchat_ai::{Engine, GeminiClient, GeminiConfig, InMemorySessionStore};
use tabchat_common::SessionId;
use tabchat_data::ChartFileRenderer;

/// Load environment variables from a .env file (KEY=VALUE lines).
fn load_dotenv() {
    let manifest_dir = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let candidates = [
        // Workspace root — two levels up from crates/tabchat-app/
        manifest_dir.join("..").join("..").join(".env"),
        // Current directory
        std::path::PathBuf::from(".env"),
    ];

    for path in &candidates {
        if let Ok(contents) = std::fs::read_to_string(path) {
            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    let key = key.trim();
                    let value = value.trim().trim_matches('"').trim_matches('\'');
                    if std::env::var(key).is_err() {
                        std::env::set_var(key, value);
                    }
                }
            }
            return;
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env file before anything else
    load_dotenv();

    let args = cli::parse();

    let log_directive = args.log_level.as_deref().unwrap_or("tabchat=info");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                log_directive
                    .parse()
                    .unwrap_or_else(|_| "tabchat=info".parse().unwrap()),
            ),
        )
        .init();

    let Ok(api_key) = std::env::var("GOOGLE_API_KEY") else {
        eprintln!("GOOGLE_API_KEY is not set (export it or put it in .env)");
        std::process::exit(1);
    };
    let model = args
        .model
        .or_else(|| std::env::var("GEMINI_MODEL").ok())
        .unwrap_or_else(|| "gemini-2.0-flash".to_string());

    info!(%model, "starting tabchat");
    let client = match GeminiClient::new(GeminiConfig::new(api_key).with_model(model)) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("failed to build Gemini client: {e}");
            std::process::exit(1);
        }
    };

    let engine = Engine::new(
        Arc::new(InMemorySessionStore::new()),
        Arc::new(client),
        Arc::new(ChartFileRenderer::new(args.viz_dir)),
    )
    .with_max_tool_rounds(args.max_tool_rounds);

    let session = SessionId::new();
    let bytes = match std::fs::read(&args.csv) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("cannot read {}: {e}", args.csv.display());
            std::process::exit(1);
        }
    };
    let filename = args
        .csv
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.csv.display().to_string());

    let summary = match engine.upload_csv(&session, &filename, &bytes).await {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("upload failed: {e}");
            std::process::exit(1);
        }
    };
    info!(
        filename = %summary.filename,
        rows = summary.info["shape"]["rows"].as_u64().unwrap_or(0),
        columns = summary.info["shape"]["columns"].as_u64().unwrap_or(0),
        "dataset ready"
    );
    println!("{}", summary.message);
    println!("Ask questions about the data. Commands: /info, /clear, /quit");

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        let _ = std::io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("input error: {e}");
                break;
            }
        }

        match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/info" => match engine.session_info(&session).await {
                Ok(info) => println!(
                    "{}",
                    serde_json::to_string_pretty(&info).unwrap_or_default()
                ),
                Err(e) => eprintln!("{e}"),
            },
            "/clear" => {
                engine.clear(&session).await;
                if let Err(e) = engine.upload_csv(&session, &filename, &bytes).await {
                    eprintln!("reload failed: {e}");
                    break;
                }
                println!("History cleared.");
            }
            message => match engine.chat(&session, message).await {
                Ok(outcome) => {
                    println!("{}", outcome.reply);
                    for url in &outcome.visualizations {
                        println!("[chart] {url}");
                    }
                }
                Err(e) => eprintln!("{e}"),
            },
        }
    }
}
