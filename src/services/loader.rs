use std::path::Path;

use tracing::{info, warn};

use crate::error::CoreError;
use crate::model::row::{FieldPair, ReviewStatus, Row};
use crate::services::encoding;

// Nomes aceitos por coluna. O primeiro de cada lista é o canônico que o
// export escreve; os demais são legados dos datasets antigos.
const PROMPT_COLS: &[&str] = &["prompt", "source_prompt"];
const COMPLETION_COLS: &[&str] = &["completion", "source_completion"];
const TRANSLATED_PROMPT_COLS: &[&str] = &["translated_prompt", "yoruba_prompt", "target_prompt"];
const TRANSLATED_COMPLETION_COLS: &[&str] = &[
    "translated_completion",
    "yoruba_completion",
    "target_completion",
];
const CORRECTED_PROMPT_COLS: &[&str] = &["corrected_prompt", "corrected_yoruba_prompt"];
const CORRECTED_COMPLETION_COLS: &[&str] = &["corrected_completion", "corrected_yoruba_completion"];
const PROMPT_STATUS_COLS: &[&str] = &["prompt_status"];
const COMPLETION_STATUS_COLS: &[&str] = &["completion_status"];
const ANNOTATOR_COLS: &[&str] = &["annotator", "username"];

pub fn load_from_file(path: &Path, delimiter: Option<char>) -> Result<Vec<Row>, CoreError> {
    let bytes = std::fs::read(path)
        .map_err(|e| CoreError::SourceUnavailable(format!("{}: {e}", path.display())))?;

    let text = encoding::decode(&bytes);
    let rows = parse_dataset(&text, delimiter)?;

    info!(path = %path.display(), rows = rows.len(), "dataset loaded");
    Ok(rows)
}

pub fn parse_dataset(text: &str, delimiter: Option<char>) -> Result<Vec<Row>, CoreError> {
    let delim = delimiter.unwrap_or_else(|| sniff_delimiter(text));

    let mut records = parse_delimited(text, delim);
    if records.is_empty() {
        return Err(CoreError::SourceUnavailable(
            "dataset is empty (no header row)".to_string(),
        ));
    }

    let header = records.remove(0);
    let cols = HeaderMap::new(&header);

    // Colunas de texto são obrigatórias; as de anotação são opcionais
    // (presentes quando o arquivo é um export anterior — retomada).
    let prompt = cols.require(PROMPT_COLS)?;
    let completion = cols.require(COMPLETION_COLS)?;
    let t_prompt = cols.require(TRANSLATED_PROMPT_COLS)?;
    let t_completion = cols.require(TRANSLATED_COMPLETION_COLS)?;

    let c_prompt = cols.find(CORRECTED_PROMPT_COLS);
    let c_completion = cols.find(CORRECTED_COMPLETION_COLS);
    let s_prompt = cols.find(PROMPT_STATUS_COLS);
    let s_completion = cols.find(COMPLETION_STATUS_COLS);
    let annotator = cols.find(ANNOTATOR_COLS);

    let required_width = [prompt, completion, t_prompt, t_completion]
        .into_iter()
        .max()
        .unwrap_or(0)
        + 1;

    let mut rows: Vec<Row> = Vec::with_capacity(records.len());

    for (i, record) in records.iter().enumerate() {
        // +2: uma pelo header, uma pelo índice começar em 0
        let line = i + 2;

        if record.len() < required_width {
            return Err(CoreError::BadRecord {
                line,
                reason: format!(
                    "expected at least {required_width} columns, found {}",
                    record.len()
                ),
            });
        }

        let cell = |idx: Option<usize>| -> String {
            idx.and_then(|c| record.get(c)).cloned().unwrap_or_default()
        };

        let status_cell = |idx: Option<usize>| -> ReviewStatus {
            let raw = cell(idx);
            ReviewStatus::parse(&raw).unwrap_or_else(|| {
                warn!(line, value = %raw, "unknown status, treating as unchecked");
                ReviewStatus::Unchecked
            })
        };

        rows.push(Row {
            id: rows.len(),
            prompt: FieldPair {
                source: record[prompt].clone(),
                target: record[t_prompt].clone(),
                corrected: cell(c_prompt),
                status: status_cell(s_prompt),
            },
            completion: FieldPair {
                source: record[completion].clone(),
                target: record[t_completion].clone(),
                corrected: cell(c_completion),
                status: status_cell(s_completion),
            },
            annotator: cell(annotator).trim().to_string(),
        });
    }

    Ok(rows)
}

struct HeaderMap {
    names: Vec<String>,
}

impl HeaderMap {
    fn new(header: &[String]) -> Self {
        HeaderMap {
            names: header
                .iter()
                .map(|h| h.trim().to_lowercase())
                .collect(),
        }
    }

    fn find(&self, aliases: &[&str]) -> Option<usize> {
        for alias in aliases {
            if let Some(idx) = self.names.iter().position(|n| n == alias) {
                return Some(idx);
            }
        }
        None
    }

    fn require(&self, aliases: &[&str]) -> Result<usize, CoreError> {
        self.find(aliases).ok_or_else(|| {
            CoreError::SourceUnavailable(format!("required column not found: {}", aliases[0]))
        })
    }
}

fn sniff_delimiter(text: &str) -> char {
    let header = text.lines().next().unwrap_or("");
    if header.contains('\t') {
        '\t'
    } else {
        ','
    }
}

/// Parser de texto delimitado no estilo RFC 4180: célula entre aspas pode
/// conter delimitador, quebra de linha e aspas duplicadas.
fn parse_delimited(text: &str, delim: char) -> Vec<Vec<String>> {
    // BOM na frente do header atrapalha o match de nome de coluna.
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut records: Vec<Vec<String>> = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;

    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    cell.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                cell.push(ch);
            }
            continue;
        }

        match ch {
            '"' if cell.is_empty() => in_quotes = true,
            '\r' => {} // CRLF: o \n fecha o registro
            '\n' => {
                record.push(std::mem::take(&mut cell));
                records.push(std::mem::take(&mut record));
            }
            c if c == delim => record.push(std::mem::take(&mut cell)),
            _ => cell.push(ch),
        }
    }

    if !cell.is_empty() || !record.is_empty() {
        record.push(cell);
        records.push(record);
    }

    // linhas em branco não são registros
    records.retain(|r| !(r.len() == 1 && r[0].trim().is_empty()));

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC: &str = "\
prompt,completion,translated_prompt,translated_completion
hello,world,bawo,aye
good morning,good night,e kaaro,o daaro";

    #[test]
    fn parses_minimal_dataset() {
        let rows = parse_dataset(BASIC, None).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].prompt.source, "hello");
        assert_eq!(rows[0].prompt.target, "bawo");
        assert_eq!(rows[1].completion.source, "good night");
        assert_eq!(rows[1].completion.target, "o daaro");
        assert_eq!(rows[0].prompt.corrected, "");
        assert!(!rows[0].is_annotated());
    }

    #[test]
    fn sniffs_tab_delimiter() {
        let text = "prompt\tcompletion\ttranslated_prompt\ttranslated_completion\na\tb\tc\td";
        let rows = parse_dataset(text, None).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].completion.source, "b");
        assert_eq!(rows[0].completion.target, "d");
    }

    #[test]
    fn accepts_legacy_column_names() {
        let text = "prompt,completion,yoruba_prompt,yoruba_completion,username\nhi,bye,pele,o dabo,ade";
        let rows = parse_dataset(text, None).unwrap();
        assert_eq!(rows[0].prompt.target, "pele");
        assert_eq!(rows[0].annotator, "ade");
    }

    #[test]
    fn quoted_cells_keep_delimiter_newline_and_quotes() {
        let text = concat!(
            "prompt,completion,translated_prompt,translated_completion\n",
            "\"a, b\",\"say \"\"hi\"\"\",\"line\nbreak\",plain"
        );
        let rows = parse_dataset(text, None).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].prompt.source, "a, b");
        assert_eq!(rows[0].completion.source, "say \"hi\"");
        assert_eq!(rows[0].prompt.target, "line\nbreak");
    }

    #[test]
    fn resumes_prior_annotations() {
        let text = concat!(
            "prompt,completion,translated_prompt,translated_completion,",
            "corrected_prompt,corrected_completion,prompt_status,completion_status,annotator\n",
            "hi,bye,pele,o dabo,fixed,,incorrect,correct,alice\n",
            "yes,no,beeni,rara,,,,,"
        );
        let rows = parse_dataset(text, None).unwrap();

        assert_eq!(rows[0].prompt.corrected, "fixed");
        assert_eq!(rows[0].prompt.status, ReviewStatus::Incorrect);
        assert_eq!(rows[0].completion.status, ReviewStatus::Correct);
        assert_eq!(rows[0].annotator, "alice");
        assert!(rows[0].is_annotated());

        assert_eq!(rows[1].prompt.status, ReviewStatus::Unchecked);
        assert!(!rows[1].is_annotated());
    }

    #[test]
    fn unknown_status_degrades_to_unchecked() {
        let text = concat!(
            "prompt,completion,translated_prompt,translated_completion,prompt_status\n",
            "a,b,c,d,maybe"
        );
        let rows = parse_dataset(text, None).unwrap();
        assert_eq!(rows[0].prompt.status, ReviewStatus::Unchecked);
    }

    #[test]
    fn missing_required_column_fails() {
        let text = "prompt,completion,translated_prompt\na,b,c";
        let err = parse_dataset(text, None).unwrap_err();
        assert!(matches!(err, CoreError::SourceUnavailable(_)));
    }

    #[test]
    fn empty_input_fails() {
        assert!(parse_dataset("", None).is_err());
        assert!(parse_dataset("\n\n", None).is_err());
    }

    #[test]
    fn short_record_reports_line_number() {
        let text = "prompt,completion,translated_prompt,translated_completion\na,b,c,d\nx,y";
        let err = parse_dataset(text, None).unwrap_err();
        match err {
            CoreError::BadRecord { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn header_only_dataset_is_empty_ledger() {
        let text = "prompt,completion,translated_prompt,translated_completion\n";
        let rows = parse_dataset(text, None).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn strips_utf8_bom_before_header_match() {
        let text = "\u{feff}prompt,completion,translated_prompt,translated_completion\na,b,c,d";
        let rows = parse_dataset(text, None).unwrap();
        assert_eq!(rows.len(), 1);
    }
}
