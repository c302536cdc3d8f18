//  Copyright (C) 2017-2019  The AXIOM TEAM Association.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! SAF-T Cash Register audit file validator: interactive CLI entry point.

use clap::Parser;
use log::{error, LevelFilter};
use std::io::{self, Write};
use std::path::PathBuf;

use saftcr_cli::config;
use saftcr_cli::engine::{self, EngineContext};
use saftcr_cli::logger;
use saftcr_crypto::certificate::{CertificateCache, TrustedCertificates};
use saftcr_crypto::priority::SignaturePriority;
use saftcr_report::{AuditTrailLabels, DescriptionTable};
use saftcr_schema::SchemaIndex;

/// SAF-T Cash Register audit file validator.
#[derive(Parser, Debug)]
#[command(name = "saftcr", version, about)]
struct Cli {
    /// Path to the XSD-derived schema index source.
    #[arg(long, value_name = "PATH")]
    schema: PathBuf,
    /// Directory of trusted issuer certificates (`*.cer`).
    #[arg(long, value_name = "DIR")]
    trust_dir: PathBuf,
    /// Error-code description workbook (`.xlsx`).
    #[arg(long, value_name = "PATH")]
    descriptions: PathBuf,
    /// Audit-trail label workbook (`.xlsx`).
    #[arg(long, value_name = "PATH")]
    audit_trail_labels: PathBuf,
    /// Where rendered reports are written (a locale-named sibling
    /// directory is created automatically if not set).
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,
    /// Log level. Defaults to INFO.
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<LevelFilter>,
    /// Also print logs to stdout.
    #[arg(long)]
    log_stdout: bool,
}

fn main() {
    let cli = Cli::parse();

    let log_dir = match config::config_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = logger::init(&log_dir, cli.log_level.unwrap_or(LevelFilter::Info), cli.log_stdout) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    match run(cli, log_dir) {
        Ok(()) => {}
        Err(e) => {
            error!("fatal error: {}", e);
            eprintln!("fatal error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli, config_dir: PathBuf) -> Result<(), failure::Error> {
    let engine_config = config::load_or_create(&config_dir)?;

    let schema = SchemaIndex::load(&cli.schema)?;
    let trust = TrustedCertificates::load(&cli.trust_dir)?;
    let descriptions = DescriptionTable::load(&cli.descriptions)?;
    let audit_trail_labels = AuditTrailLabels::load(&cli.audit_trail_labels)?;

    let ctx = EngineContext {
        schema,
        trust,
        certificate_cache: CertificateCache::new(),
        signature_priority: SignaturePriority::new(),
        descriptions,
        audit_trail_labels,
        config: engine_config,
    };

    let output_dir = cli.output_dir.unwrap_or_else(|| PathBuf::from(checked_dir_name(&ctx.config.language)));

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("Path to audit file (blank to quit): ");
        stdout.flush()?;
        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            // EOF (e.g. Ctrl-D), treated the same as a blank answer.
            break;
        }
        let path = line.trim();
        if path.is_empty() {
            break;
        }

        let source_path = PathBuf::from(path);
        match engine::analyze_file(&ctx, &source_path, &output_dir) {
            Ok(outcome) => {
                println!("{} -> {}", outcome.prefix.as_str(), outcome.report_path.display());
                prompt_delete_source(&source_path, &ctx.config.language, &stdin, &mut stdout)?;
            }
            Err(e) => {
                error!("analysis of {} failed: {}", source_path.display(), e);
                eprintln!("could not analyse {}: {}", source_path.display(), e);
            }
        }
    }

    Ok(())
}

fn checked_dir_name(lang: &str) -> &'static str {
    if lang == "dk" {
        "Tjekket"
    } else {
        "Checked"
    }
}

fn prompt_delete_source(
    source_path: &std::path::Path,
    lang: &str,
    stdin: &io::Stdin,
    stdout: &mut io::Stdout,
) -> io::Result<()> {
    let (prompt, yes, no) = if lang == "dk" {
        ("Slet kildefilen? [ja/nej]: ", "ja", "nej")
    } else {
        ("Delete the source file? [yes/no]: ", "yes", "no")
    };
    loop {
        print!("{}", prompt);
        stdout.flush()?;
        let mut answer = String::new();
        stdin.read_line(&mut answer)?;
        let answer = answer.trim();
        if answer.eq_ignore_ascii_case(yes) {
            if let Err(e) = std::fs::remove_file(source_path) {
                eprintln!("could not delete {}: {}", source_path.display(), e);
            }
            return Ok(());
        }
        if answer.eq_ignore_ascii_case(no) {
            return Ok(());
        }
        println!("Please answer '{}' or '{}'.", yes, no);
    }
}
