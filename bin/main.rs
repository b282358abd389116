mod arg;
mod fs;

use ::clap::Parser;
use ::env_logger::Builder;
use ::log::error;
use ::log::info;
use ::log::warn;
use ::log::LevelFilter;
use ::pdfxref::Document;
use ::pdfxref::ParseOptions;
use ::pdfxref::PdfResult;
use ::pdfxref::SourceErr;
use ::pdfxref::WriteOptions;
use ::pdfxref::XRefFormat;
use ::std::fs::create_dir_all;
use ::std::fs::File;
use ::std::io::BufWriter;
use ::std::path::Path;

use self::arg::Args;
use self::fs::append_pdf_files;
use self::fs::filter_pdf_files;
use self::fs::output_path;

fn main() {
    let args = Args::parse();
    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let mut files = filter_pdf_files(args.files.clone());
    if let Some(dir) = &args.directory {
        append_pdf_files(&mut files, dir);
    }
    let parse_options = if args.strict {
        ParseOptions::strict()
    } else {
        ParseOptions::lenient()
    };
    if let Some(dir) = &args.rewrite {
        if let Err(err) = create_dir_all(dir) {
            error!("Failed to create {}: {}", dir.display(), err);
            return;
        }
    }

    for file in files {
        info!("Processing file: {}", file.display());
        let mut document = match Document::open_file(&file, parse_options) {
            Ok(document) => document,
            Err(err) => {
                error!("Failed to open {}: {}", file.display(), err);
                continue;
            }
        };
        summarise(&mut document);
        if let Some(dir) = &args.rewrite {
            let path = output_path(dir, &file);
            if let Err(err) = rewrite(&mut document, &path, write_options(&args)) {
                error!("Failed to write {}: {}", path.display(), err);
            }
        }
    }
}

fn write_options(args: &Args) -> WriteOptions {
    let options = if args.incremental {
        WriteOptions::incremental()
    } else {
        WriteOptions::full()
    };
    let options = if args.xref_stream {
        options.set_xref_format(XRefFormat::Stream)
    } else {
        options
    };
    options.set_object_streams(args.object_streams)
}

fn summarise(document: &mut Document) {
    let errors = document.load_all();
    for err in &errors {
        warn!("{}", err);
    }
    info!(
        "PDF-{}, {} objects, {} revisions{}, {} unreadable objects",
        document.version(),
        document.len(),
        document.revisions().len(),
        if document.is_rebuilt() {
            " (rebuilt)"
        } else {
            ""
        },
        errors.len()
    );
}

fn rewrite(document: &mut Document, path: &Path, options: WriteOptions) -> PdfResult<()> {
    let file =
        File::create(path).map_err(|err| SourceErr::Open(path.to_path_buf(), err.kind()))?;
    let mut out = BufWriter::new(file);
    let report = document.save(&mut out, options)?;
    for warning in &report.warnings {
        warn!("{}", warning);
    }
    info!(
        "Saved {} with the cross-reference at offset {}",
        path.display(),
        report.xref_offset
    );
    Ok(())
}
