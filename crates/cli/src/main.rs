//! `folio` command line tool.
//!
//! Loads files through the document engine to report their metadata, print
//! their decoded content, or rewrite them with a different encoding or
//! newline convention.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use folio_document::{DocumentHandle, DocumentRegistry, Encoding, IoCompletion, IoResult, Newlines};

#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(about = "Inspect and convert text documents")]
struct Args {
	/// Verbose logging (repeat for more)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	verbose: u8,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show file type, encoding, newlines, settings and variables
	Info {
		/// File to inspect
		path: PathBuf,
	},
	/// Print the decoded content with `\n` line endings
	Cat {
		/// File to print
		path: PathBuf,
	},
	/// Rewrite a file with another encoding or newline convention
	Convert {
		/// File to convert
		path: PathBuf,

		/// Target encoding (utf-8, utf-8-bom, utf-16le, utf-16be, iso-8859-1)
		#[arg(short, long)]
		encoding: Option<Encoding>,

		/// Target newlines (lf, crlf, cr)
		#[arg(short, long)]
		newlines: Option<Newlines>,

		/// Write here instead of replacing the input
		#[arg(short, long, value_name = "PATH")]
		output: Option<PathBuf>,

		/// Keep the previous content as `<name>~`
		#[arg(short, long)]
		backup: bool,
	},
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();
	setup_tracing(args.verbose);

	match args.command {
		Command::Info { path } => info(&path).await,
		Command::Cat { path } => cat(&path).await,
		Command::Convert {
			path,
			encoding,
			newlines,
			output,
			backup,
		} => convert(&path, encoding, newlines, output, backup).await,
	}
}

async fn open(path: &Path) -> anyhow::Result<DocumentHandle> {
	let doc = DocumentRegistry::global().open_path(path);
	let completion = doc
		.load()
		.with_context(|| format!("cannot load {}", path.display()))?
		.completion()
		.await;
	check(completion, "loading", path)?;
	Ok(doc)
}

fn check(completion: IoCompletion, action: &str, path: &Path) -> anyhow::Result<()> {
	match completion.result {
		IoResult::Success => Ok(()),
		IoResult::Cancel => bail!("{action} {} was cancelled", path.display()),
		IoResult::Failure => bail!(
			"{}",
			completion
				.error_message
				.unwrap_or_else(|| format!("{action} {} failed", path.display()))
		),
	}
}

async fn info(path: &Path) -> anyhow::Result<()> {
	let doc = open(path).await?;
	let report = doc.with(|d| {
		let mut lines = vec![
			format!("name:       {}", d.display_name()),
			format!("file type:  {}", d.file_type()),
			format!("encoding:   {}", d.disk_encoding()),
			format!("newlines:   {}", d.disk_newlines()),
			format!("lines:      {}", d.buffer().len_lines()),
			format!("bytes:      {}", d.buffer().len_bytes()),
			format!("tab size:   {}", d.tab_size()),
			format!("soft tabs:  {}", d.soft_tabs()),
			format!(
				"spelling:   {}",
				match (d.spell_checking(), d.spelling_language()) {
					(false, _) => "off".to_string(),
					(true, Some(lang)) => lang,
					(true, None) => "on".to_string(),
				}
			),
			"variables:".to_string(),
		];
		lines.extend(d.variables().into_iter().map(|(k, v)| format!("  {k}={v}")));
		lines
	});

	let mut out = std::io::stdout().lock();
	for line in report {
		writeln!(out, "{line}")?;
	}
	doc.close();
	Ok(())
}

async fn cat(path: &Path) -> anyhow::Result<()> {
	let doc = open(path).await?;
	let text = doc.with(|d| d.content());
	std::io::stdout().lock().write_all(text.as_bytes())?;
	doc.close();
	Ok(())
}

async fn convert(
	path: &Path,
	encoding: Option<Encoding>,
	newlines: Option<Newlines>,
	output: Option<PathBuf>,
	backup: bool,
) -> anyhow::Result<()> {
	let doc = open(path).await?;
	let (from_encoding, from_newlines) = doc.with_mut(|d| {
		let from = (d.disk_encoding(), d.disk_newlines());
		d.set_disk_encoding(encoding);
		d.set_disk_newlines(newlines);
		d.set_keep_backup_file(backup);
		from
	});

	let target = output.unwrap_or_else(|| path.to_path_buf());
	let task = if target == path {
		doc.save()
	} else {
		doc.save_as(&target)
	}
	.with_context(|| format!("cannot save {}", target.display()))?;
	check(task.completion().await, "saving", &target)?;

	let (to_encoding, to_newlines) = doc.with(|d| (d.disk_encoding(), d.disk_newlines()));
	tracing::debug!(path = %target.display(), "converted");
	println!(
		"{}: {from_encoding}/{from_newlines} -> {to_encoding}/{to_newlines}",
		target.display()
	);
	doc.close();
	Ok(())
}

fn setup_tracing(verbosity: u8) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbosity {
		0 => EnvFilter::new("warn"),
		1 => EnvFilter::new("folio_document=debug,info"),
		_ => EnvFilter::new("folio_document=trace,debug"),
	});
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.init();
}
