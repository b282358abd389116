// A module to parse command line arguments

use ::clap::Parser;
use ::std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "pdfxref",
    version = "0.1.0",
    about = "Read, check and rewrite PDF files"
)]

pub struct Args {
    #[clap(short, long, help = "Enable verbose output")]
    pub verbose: bool,
    #[clap(short, long, help = "A space-separated list of PDF files")]
    pub files: Vec<PathBuf>,
    #[clap(short, long, help = "The directory containing the PDF files")]
    pub directory: Option<PathBuf>,
    #[clap(long, help = "Fail on malformed syntax instead of repairing it")]
    pub strict: bool,
    #[clap(long, value_name = "DIR", help = "Save each file into DIR")]
    pub rewrite: Option<PathBuf>,
    #[clap(
        long,
        requires = "rewrite",
        help = "Append an incremental update instead of a new file"
    )]
    pub incremental: bool,
    #[clap(
        long,
        requires = "rewrite",
        help = "Write a cross-reference stream instead of a table"
    )]
    pub xref_stream: bool,
    #[clap(
        long,
        requires = "rewrite",
        help = "Pack objects into object streams"
    )]
    pub object_streams: bool,
}
