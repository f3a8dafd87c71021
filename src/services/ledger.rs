use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::CoreError;
use crate::model::row::{Field, Row, Verdict};
use crate::model::session::SessionContext;

#[derive(Debug, Serialize)]
pub struct ProgressSummary {
    pub total: usize,
    pub annotated: usize,
    pub remaining: usize,
    pub percent: f32,
    pub per_user: BTreeMap<String, usize>,
}

/// Coleção ordenada de linhas sob revisão, dona de todo o estado de
/// anotação da sessão. Nada aqui toca disco: persistir é decisão do
/// chamador (export sob demanda).
#[derive(Debug, Clone)]
pub struct Ledger {
    rows: Vec<Row>,
}

impl Ledger {
    /// Reatribui ids ordinais no load: únicos e estáveis enquanto o
    /// dataset estiver carregado.
    pub fn new(mut rows: Vec<Row>) -> Self {
        for (i, row) in rows.iter_mut().enumerate() {
            row.id = i;
        }
        Ledger { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    // Dataset é de tamanho fixo após o load: o maior id válido é len - 1.
    fn check_bounds(&self, id: usize) -> Result<(), CoreError> {
        if self.is_empty() || id > self.rows.len() - 1 {
            return Err(CoreError::OutOfRange {
                id,
                len: self.rows.len(),
            });
        }
        Ok(())
    }

    pub fn get_row(&self, id: usize) -> Result<&Row, CoreError> {
        self.check_bounds(id)?;
        Ok(&self.rows[id])
    }

    /// Sobrescreve a correção e o status de UM campo da linha, mais o
    /// annotator da linha inteira (last-writer-wins). O outro campo não
    /// é tocado — é isso que permite salvar prompt e completion em
    /// ações separadas. Retorna o snapshot atualizado.
    pub fn save_correction(
        &mut self,
        id: usize,
        field: Field,
        corrected_text: &str,
        verdict: Verdict,
        ctx: &SessionContext,
    ) -> Result<Row, CoreError> {
        self.check_bounds(id)?;

        let annotator = ctx.annotator.trim();
        if annotator.is_empty() {
            return Err(CoreError::MissingIdentity);
        }

        let row = &mut self.rows[id];
        let pair = row.field_mut(field);
        pair.corrected = corrected_text.to_string();
        pair.status = verdict.into();
        row.annotator = annotator.to_string();

        Ok(row.clone())
    }

    /// Posição inicial do cursor num load: primeira linha incompleta,
    /// ou len quando o dataset já chega todo anotado.
    pub fn first_incomplete(&self) -> usize {
        self.next_incomplete(0)
    }

    fn next_incomplete(&self, from: usize) -> usize {
        for i in from..self.rows.len() {
            if !self.rows[i].is_annotated() {
                return i;
            }
        }
        self.rows.len()
    }

    pub fn set_cursor(&self, ctx: &mut SessionContext, id: usize) -> Result<(), CoreError> {
        self.check_bounds(id)?;
        ctx.cursor = id;
        Ok(())
    }

    /// Modo sequencial: pula para a próxima linha ainda não anotada.
    /// Quando não sobra nenhuma à frente, estaciona em len — estado
    /// terminal de exibição ("tudo anotado"), não é erro.
    pub fn advance_cursor(&self, ctx: &mut SessionContext) -> usize {
        if ctx.cursor < self.rows.len() {
            ctx.cursor = self.next_incomplete(ctx.cursor + 1);
        } else {
            ctx.cursor = self.rows.len();
        }
        ctx.cursor
    }

    pub fn is_done(&self, ctx: &SessionContext) -> bool {
        ctx.cursor >= self.rows.len()
    }

    /// Agregados de progresso. Crédito por usuário segue o ÚLTIMO
    /// annotator de cada linha concluída, não todo mundo que já mexeu.
    pub fn progress_summary(&self) -> ProgressSummary {
        let total = self.rows.len();
        let mut annotated = 0usize;
        let mut per_user: BTreeMap<String, usize> = BTreeMap::new();

        for row in &self.rows {
            if !row.is_annotated() {
                continue;
            }

            annotated += 1;

            // Linha pode chegar concluída de um arquivo sem coluna de
            // annotator; não vira usuário "".
            if !row.annotator.is_empty() {
                *per_user.entry(row.annotator.clone()).or_insert(0) += 1;
            }
        }

        let percent = if total == 0 {
            0.0
        } else {
            (annotated as f32 / total as f32) * 100.0
        };

        ProgressSummary {
            total,
            annotated,
            remaining: total - annotated,
            percent,
            per_user,
        }
    }
}
