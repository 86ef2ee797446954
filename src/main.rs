use anyhow::Context;
use clap::Parser;
use peel::{Config, Resolver, Step, DEFAULT_MAX_DEPTH};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[clap(version, about)]
struct Cli {
    #[clap(help = "File to unwrap")]
    path: PathBuf,
    #[clap(
        long,
        default_value_t = DEFAULT_MAX_DEPTH,
        help = "Give up after this many gzip/bzip2 layers"
    )]
    max_depth: usize,
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let resolver = Resolver::new(Config::new().max_depth(cli.max_depth));
    for step in resolver.steps(&cli.path) {
        let step = step.with_context(|| format!("Failed to unwrap {}", cli.path.display()))?;
        match step {
            Step::Decompressed { format, .. } => println!("[+] Found {} compression", format),
            #[cfg(feature = "tar")]
            Step::Extracted { extraction, .. } => {
                println!("[+] Found a tar archive");
                println!("[+] Your file is in: {}", extraction.destination.display());
            }
            Step::Finished { path } => println!("[+] Your file is in: {}", path.display()),
        }
    }

    Ok(())
}
