use anyhow::{Context, Result};
use serde::Serialize;
use tinytemplate::TinyTemplate;

use crate::convert::output::{ConvertReadLibraryOutput, ConvertedReadLibrary};

/// included report template
static REPORT: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/report.txt"));

/// Rendering context for the whole report
#[derive(Serialize)]
struct ReportContext {
    count: usize,
    libraries: Vec<LibraryContext>,
}

#[derive(Serialize)]
struct LibraryContext {
    name: String,
    reference: String,
    files: Vec<FileContext>,
    stats: Option<String>,
}

#[derive(Serialize)]
struct FileContext {
    label: &'static str,
    path: String,
}

/// Render a human readable summary of converted libraries
pub fn render(output: &ConvertReadLibraryOutput) -> Result<String> {
    let mut tt = TinyTemplate::new();
    tt.set_default_formatter(&tinytemplate::format_unescaped);
    tt.add_template("report", REPORT).context("Report template")?;

    let context = ReportContext {
        count: output.files.len(),
        libraries: output.files.iter().map(|(name, lib)| library_context(name, lib)).collect(),
    };

    tt.render("report", &context).context("Rendered report")
}

fn library_context(name: &str, lib: &ConvertedReadLibrary) -> LibraryContext {
    let files = lib
        .file_paths()
        .into_iter()
        .map(|(label, path)| FileContext { label, path: path.to_string() })
        .collect();

    LibraryContext {
        name: name.to_string(),
        reference: lib.reference.clone().unwrap_or_else(|| "no reference".to_string()),
        files,
        stats: stats_line(lib),
    }
}

fn stats_line(lib: &ConvertedReadLibrary) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(tech) = &lib.sequencing_tech {
        parts.push(tech.clone());
    }
    if let Some(count) = lib.read_count {
        parts.push(format!("{count} reads"));
    }
    if let Some(size) = lib.read_size {
        parts.push(format!("{size} bases"));
    }
    if let Some(gc) = lib.gc_content {
        parts.push(format!("GC {:.1}%", gc * 100.0));
    }
    if let (Some(mean), Some(sd)) = (lib.insert_size_mean, lib.insert_size_std_dev) {
        parts.push(format!("insert {mean:.1} ± {sd:.1}"));
    }
    match parts.is_empty() {
        true => None,
        false => Some(parts.join(", ")),
    }
}
