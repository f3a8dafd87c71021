use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::CoreError;
use crate::model::row::Row;
use crate::services::ledger::Ledger;

/// Ordem das colunas do export. O loader aceita esses mesmos nomes, então
/// um export reaberto retoma a sessão de onde parou.
pub const EXPORT_COLUMNS: &[&str] = &[
    "id",
    "prompt",
    "completion",
    "translated_prompt",
    "translated_completion",
    "corrected_prompt",
    "corrected_completion",
    "prompt_status",
    "completion_status",
    "annotator",
];

pub fn to_delimited(ledger: &Ledger, delim: char) -> String {
    let sep = delim.to_string();

    let mut out: Vec<String> = Vec::with_capacity(ledger.len() + 1);
    out.push(EXPORT_COLUMNS.join(&sep));

    for row in ledger.rows() {
        out.push(render_row(row, delim, &sep));
    }

    out.join("\n")
}

pub fn export_to_file(ledger: &Ledger, path: &Path, delim: char) -> Result<(), CoreError> {
    let mut text = to_delimited(ledger, delim);
    text.push('\n');

    write_atomic(path, text.as_bytes())?;

    info!(path = %path.display(), rows = ledger.len(), "ledger exported");
    Ok(())
}

fn render_row(row: &Row, delim: char, sep: &str) -> String {
    [
        row.id.to_string(),
        escape(&row.prompt.source, delim),
        escape(&row.completion.source, delim),
        escape(&row.prompt.target, delim),
        escape(&row.completion.target, delim),
        escape(&row.prompt.corrected, delim),
        escape(&row.completion.corrected, delim),
        row.prompt.status.as_str().to_string(),
        row.completion.status.as_str().to_string(),
        escape(&row.annotator, delim),
    ]
    .join(sep)
}

fn escape(cell: &str, delim: char) -> String {
    if cell.contains(delim) || cell.contains('"') || cell.contains('\n') || cell.contains('\r') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

// Escreve num .tmp ao lado e renomeia por cima: um export interrompido
// não corrompe o arquivo anterior.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CoreError> {
    let tmp = tmp_path(path);

    if let Some(parent) = tmp.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| CoreError::ExportFailed(e.to_string()))?;
        }
    }

    fs::write(&tmp, bytes).map_err(|e| CoreError::ExportFailed(e.to_string()))?;

    if path.exists() {
        fs::remove_file(path).map_err(|e| CoreError::ExportFailed(e.to_string()))?;
    }

    fs::rename(&tmp, path).map_err(|e| CoreError::ExportFailed(e.to_string()))?;

    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut p = path.to_path_buf();
    let file_name = match path.file_name().and_then(|s| s.to_str()) {
        Some(n) => n.to_string(),
        None => "export".to_string(),
    };
    p.set_file_name(format!("{file_name}.tmp"));
    p
}
