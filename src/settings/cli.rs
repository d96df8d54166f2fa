use super::Parser;

#[derive(Parser, Debug)]
#[command(version, about = "Friend graph service")]
pub struct Cli {
    /// Path to a TOML settings file.
    #[arg(long)]
    pub settings: Option<String>,
}
