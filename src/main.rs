use clap::Parser;
use diffparser::{Diff, DiffParser, ParseOptions, TabMode};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "diffparser")]
#[command(about = "Summarize the files and lines changed by a git diff")]
struct Cli {
    /// Diff file to read (defaults to stdin)
    file: Option<PathBuf>,

    /// Treat tab characters as line breaks
    #[arg(long)]
    tab_breaks_line: bool,

    /// Fail if the input has no `diff --git` file blocks
    #[arg(long)]
    require_files: bool,
}

impl Cli {
    fn options(&self) -> ParseOptions {
        let tab_mode = if self.tab_breaks_line {
            TabMode::LineBreak
        } else {
            TabMode::Literal
        };
        ParseOptions::new()
            .with_tab_mode(tab_mode)
            .require_files(self.require_files)
    }
}

/// One `added<TAB>removed<TAB>hunks<TAB>path` line per changed file
fn summary(diff: &Diff) -> String {
    diff.iter()
        .map(|file| {
            format!(
                "{}\t{}\t{}\t{}\n",
                file.added_count(),
                file.removed_count(),
                file.chunks().len(),
                file.file_out()
            )
        })
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();
    let options = cli.options();

    let diff = match &cli.file {
        Some(path) => DiffParser::new(BufReader::new(File::open(path)?))
            .with_options(options)
            .parse()?,
        None => DiffParser::new(io::stdin().lock())
            .with_options(options)
            .parse()?,
    };

    print!("{}", summary(&diff));
    Ok(())
}
