//! Schema command - Write the JSON Schema for portrait.config.json

use clap::Args;
use std::path::PathBuf;

use crate::config::write_schema;

#[derive(Args, Default)]
pub struct SchemaArgs {
    /// Project directory (default: current directory)
    #[arg(long)]
    pub dir: Option<PathBuf>,
}

pub fn run(args: SchemaArgs) {
    match write_schema(args.dir.as_deref()) {
        Ok(path) => eprintln!("✓ Wrote {}", path.display()),
        Err(e) => {
            eprintln!("Failed to write schema: {}", e);
            std::process::exit(1);
        }
    }
}
