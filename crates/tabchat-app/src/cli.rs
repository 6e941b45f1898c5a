use clap::Parser;

/// tabchat — chat with a CSV file through Gemini tool calling.
#[derive(Parser, Debug)]
#[command(name = "tabchat", version, about)]
pub struct Args {
    /// CSV file to load into the session.
    pub csv: std::path::PathBuf,

    /// Gemini model override.
    #[arg(long)]
    pub model: Option<String>,

    /// Directory chart documents are written to.
    #[arg(long, default_value = "visualizations")]
    pub viz_dir: std::path::PathBuf,

    /// Maximum tool-call rounds per chat turn.
    #[arg(long, default_value_t = 10)]
    pub max_tool_rounds: u32,

    /// Log level override (debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,
}

pub fn parse() -> Args {
    Args::parse()
}
