//! replug CLI - interactive host for exercising plugin module reloads.
//!
//! Loads one plugin image and drives it from stdin: `reload` swaps in
//! whatever bytes currently live at the image path, `vars` and
//! `get <name>` inspect the preserved variables, `quit` (or EOF) unloads
//! and exits. Rebuilding the plugin and typing `reload` is the whole
//! development loop; watching the file for changes is a supervisor's job,
//! not this host's.

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::ptr;

use anyhow::Result;
use clap::Parser;

use replug::Module;

#[derive(Parser)]
#[command(name = "replug", version, about = "Load a plugin image and swap it at runtime")]
struct Cli {
    /// Path to the plugin image, reused verbatim on every reload
    image: PathBuf,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt().with_env_filter("debug").init();
    } else {
        tracing_subscriber::fmt().with_env_filter("info").init();
    }

    let mut module = Module::load(&cli.image, ptr::null_mut());
    println!(
        "loaded {} ({} preserved variables)",
        module.path().display(),
        module.var_names().len()
    );

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        match line.trim() {
            "reload" => {
                module.reload();
                println!("reloaded {}", module.path().display());
            }
            "vars" => {
                for name in module.var_names() {
                    let size = module.var_bytes(&name).map_or(0, |bytes| bytes.len());
                    println!("{name}  ({size} bytes)");
                }
            }
            cmd if cmd.starts_with("get ") => {
                let name = cmd["get ".len()..].trim();
                match module.var_bytes(name) {
                    Some(bytes) => println!("{name} = {bytes:02x?}"),
                    None => println!("no preserved variable named {name}"),
                }
            }
            "quit" | "exit" => break,
            "" => {}
            other => eprintln!("unknown command: {other} (try reload, vars, get <name>, quit)"),
        }
    }

    module.unload();
    Ok(())
}
