use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use pagestore::{HEADER_SIZE, PAGE_SIZE, PageFile, PageFileResult, PageNum};

#[derive(Parser)]
#[command(name = "pagestore", about = "Create and inspect page files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new page file
    Create {
        path: PathBuf,
        /// Grow the file to at least this many pages
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
    /// Print header metadata for a page file
    Info { path: PathBuf },
    /// Hex-dump a single page
    Dump { path: PathBuf, page: PageNum },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> PageFileResult<()> {
    match cli.command {
        Command::Create { path, pages } => {
            PageFile::create(&path)?;
            if pages > 1 {
                let mut pf = PageFile::open(&path)?;
                pf.ensure_capacity(pages)?;
                pf.close()?;
            }
            println!("created {} with {} page(s)", path.display(), pages.max(1));
            Ok(())
        }
        Command::Info { path } => {
            let mut pf = PageFile::open(&path)?;
            println!("file:        {}", pf.path().display());
            println!("page size:   {} bytes", PAGE_SIZE);
            println!("page count:  {}", pf.total_pages());
            println!(
                "file length: {} bytes",
                HEADER_SIZE + pf.total_pages() * PAGE_SIZE
            );
            pf.close()
        }
        Command::Dump { path, page } => {
            let mut pf = PageFile::open(&path)?;
            let mut buf = vec![0u8; PAGE_SIZE];
            pf.read_block(page, &mut buf)?;
            pf.close()?;
            dump_page(page, &buf);
            Ok(())
        }
    }
}

fn dump_page(page: PageNum, buf: &[u8]) {
    println!("page {} ({} bytes)", page, buf.len());
    for (i, chunk) in buf.chunks(16).enumerate() {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{:02x}", b)).collect();
        let ascii: String = chunk
            .iter()
            .map(|&b| {
                if b.is_ascii_graphic() || b == b' ' {
                    b as char
                } else {
                    '.'
                }
            })
            .collect();
        println!("{:08x}  {:<47}  |{}|", i * 16, hex.join(" "), ascii);
    }
}
