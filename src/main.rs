use clap::{Parser, Subcommand};
use icfinfo::batch::decode_paths;
use icfinfo::decoder::{decode_file, StorageInfo};
use icfinfo::entry::Entry;
use icfinfo::source::PlainDecryptor;
use icfinfo::IcfError;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "icfinfo", about = "Inspect decrypted ICF storage-information containers")]
struct Cli {
    /// Log decoding steps (repeat for trace output)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the installed artifact list of one or more containers
    List {
        #[arg(required = true, num_args = 1..)]
        input: Vec<PathBuf>,
        /// Emit JSON instead of the text report
        #[arg(long)]
        json: bool,
    },
    /// Show every entry block in file order
    Entries {
        input: PathBuf,
    },
    /// Show container header fields
    Info {
        input: PathBuf,
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {

        // ── List ─────────────────────────────────────────────────────────────
        Commands::List { input, json } => {
            let results = decode_paths(&input, &PlainDecryptor);
            let failed = results.iter().filter(|r| r.is_err()).count();

            if json {
                let docs: Vec<serde_json::Value> = input.iter().zip(&results).map(|(path, r)| {
                    match r {
                        Ok(info) => serde_json::json!({
                            "path":      path.display().to_string(),
                            "app_id":    info.app_id(),
                            "filenames": info.filenames,
                        }),
                        Err(e) => serde_json::json!({
                            "path":  path.display().to_string(),
                            "error": e.kind(),
                            "message": e.to_string(),
                        }),
                    }
                }).collect();
                println!("{}", serde_json::to_string_pretty(&docs)?);
            } else {
                for (path, r) in input.iter().zip(&results) {
                    if input.len() > 1 {
                        println!("==> {} <==", path.display());
                    }
                    print!("{}", render_report(r));
                }
            }

            if failed > 0 {
                return Err(format!("{failed} container(s) failed to decode").into());
            }
        }

        // ── Entries ──────────────────────────────────────────────────────────
        Commands::Entries { input } => {
            let info = decode_file(&input, &PlainDecryptor)?;
            println!("{:>4} {:>3} {:<12} {:>6}  Details", "#", "En", "Kind", "Tag");
            for (i, rec) in info.entries.iter().enumerate() {
                let details = match &rec.entry {
                    Entry::System { version, timestamp }
                    | Entry::Application { version, timestamp } => format!("{version} {timestamp}"),
                    Entry::Patch { from_version, from_timestamp, to_version, to_timestamp } => {
                        format!("{from_version} {from_timestamp} -> {to_version} {to_timestamp}")
                    }
                    Entry::Option { option_id, timestamp } => {
                        format!("{} {timestamp}", icfinfo::naming::identifier_text(option_id))
                    }
                    Entry::Unknown { payload, .. } => hex::encode(payload),
                };
                println!("{:>4} {:>3} {:<12} {:#06x}  {}",
                    i, if rec.enabled { "y" } else { "n" },
                    rec.entry.kind_name(), rec.entry.type_tag(), details);
            }
        }

        // ── Info ─────────────────────────────────────────────────────────────
        Commands::Info { input, json } => {
            let info = decode_file(&input, &PlainDecryptor)?;
            let hdr = &info.header;
            if json {
                println!("{}", serde_json::to_string_pretty(hdr)?);
            } else {
                println!("── ICF Container ────────────────────────────────────────");
                println!("  Path           {}", input.display());
                println!("  Size           {} B", hdr.declared_size);
                println!("  Entries        {}", hdr.entry_count);
                println!("  App ID         {}", info.app_id());
                println!("  Platform ID    {}", info.platform_id());
                println!("  Generation     {}", hdr.platform_generation);
                println!("  Main checksum  {:08x}", hdr.main_checksum);
                println!("  Sub checksum   {:08x}", hdr.sub_checksum);
                println!("  Enabled        {}/{}",
                    info.entries.iter().filter(|e| e.enabled).count(), info.entries.len());
            }
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}

fn render_report(result: &Result<StorageInfo, IcfError>) -> String {
    let mut out = String::from("\nSTORAGE INFORMATION\n\n");
    match result {
        Ok(info) => {
            out.push_str(&format!("[{}]\n\n", info.app_id()));
            for name in &info.filenames {
                out.push_str(name);
                out.push('\n');
            }
            out.push_str("\n- END -\n\n");
        }
        Err(e) => {
            out.push_str("--- ERROR ---\n");
            out.push_str(&format!("{e}\n"));
        }
    }
    out
}
