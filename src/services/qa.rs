use serde::Serialize;

use crate::model::row::{Field, ReviewStatus, Row};

#[derive(Debug, Serialize)]
pub struct QaIssue {
    pub row_id: usize,
    pub field: String,
    pub code: String,
    pub message: String,
}

/// Checagens de consistência sobre o estado atual do ledger. Nenhuma
/// delas bloqueia save ou export; são avisos para o revisor.
pub fn run(rows: &[Row]) -> Vec<QaIssue> {
    let mut issues: Vec<QaIssue> = Vec::new();

    for row in rows {
        for field in Field::ALL {
            let name = field.as_str();
            let pair = row.field(field);
            let corrected_trim = pair.corrected.trim();

            match pair.status {
                ReviewStatus::Incorrect => {
                    // Marcou errado mas não disse o certo.
                    if corrected_trim.is_empty() {
                        issues.push(QaIssue {
                            row_id: row.id,
                            field: name.to_string(),
                            code: "INCORRECT_WITHOUT_CORRECTION".to_string(),
                            message: "Field marked incorrect but no corrected text was given"
                                .to_string(),
                        });
                    } else if corrected_trim == pair.target.trim() {
                        issues.push(QaIssue {
                            row_id: row.id,
                            field: name.to_string(),
                            code: "CORRECTION_SAME_AS_TARGET".to_string(),
                            message: "Corrected text is identical to the machine translation"
                                .to_string(),
                        });
                    }
                }
                ReviewStatus::Correct => {
                    // "Correto" com correção por cima é contraditório.
                    if !corrected_trim.is_empty() {
                        issues.push(QaIssue {
                            row_id: row.id,
                            field: name.to_string(),
                            code: "CORRECT_WITH_CORRECTION".to_string(),
                            message: "Field marked correct but carries corrected text".to_string(),
                        });
                    }
                }
                ReviewStatus::Unchecked => {
                    // Acontece em datasets importados com coluna de correção
                    // preenchida mas sem status.
                    if !corrected_trim.is_empty() {
                        issues.push(QaIssue {
                            row_id: row.id,
                            field: name.to_string(),
                            code: "CORRECTED_BUT_UNCHECKED".to_string(),
                            message: "Corrected text present but the field was never reviewed"
                                .to_string(),
                        });
                    }
                }
            }
        }

        if row.is_annotated() && row.annotator.trim().is_empty() {
            issues.push(QaIssue {
                row_id: row.id,
                field: "row".to_string(),
                code: "ANNOTATED_WITHOUT_ANNOTATOR".to_string(),
                message: "Row is fully reviewed but has no annotator recorded".to_string(),
            });
        }
    }

    issues
}
