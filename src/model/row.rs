use serde::{Deserialize, Serialize};

/// Estado de revisão de um campo. `Unchecked` significa "ainda não revisado";
/// é diferente de uma correção vazia (que significa "tradução já estava boa").
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Unchecked,
    Correct,
    Incorrect,
}

impl Default for ReviewStatus {
    fn default() -> Self {
        ReviewStatus::Unchecked
    }
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Unchecked => "unchecked",
            ReviewStatus::Correct => "correct",
            ReviewStatus::Incorrect => "incorrect",
        }
    }

    /// Parser leniente para colunas de status vindas de arquivos externos.
    /// Célula vazia = ainda não revisado.
    pub fn parse(s: &str) -> Option<ReviewStatus> {
        match s.trim().to_lowercase().as_str() {
            "" | "unchecked" => Some(ReviewStatus::Unchecked),
            "correct" => Some(ReviewStatus::Correct),
            "incorrect" | "wrong" => Some(ReviewStatus::Incorrect),
            _ => None,
        }
    }
}

/// Veredito que um save pode carregar. Não existe veredito "unchecked":
/// uma linha só volta a Unchecked recarregando o dataset original.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Correct,
    Incorrect,
}

impl From<Verdict> for ReviewStatus {
    fn from(v: Verdict) -> Self {
        match v {
            Verdict::Correct => ReviewStatus::Correct,
            Verdict::Incorrect => ReviewStatus::Incorrect,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Prompt,
    Completion,
}

impl Field {
    pub const ALL: [Field; 2] = [Field::Prompt, Field::Completion];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Prompt => "prompt",
            Field::Completion => "completion",
        }
    }
}

/// Uma unidade revisável: texto original, tradução de máquina e a
/// correção do anotador. `source` e `target` nunca mudam depois do load.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct FieldPair {
    #[serde(default)]
    pub source: String,

    #[serde(default)]
    pub target: String,

    #[serde(default)]
    pub corrected: String,

    #[serde(default)]
    pub status: ReviewStatus,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Row {
    pub id: usize,

    #[serde(default)]
    pub prompt: FieldPair,

    #[serde(default)]
    pub completion: FieldPair,

    /// Último usuário que salvou esta linha; vazio = nunca salva.
    #[serde(default)]
    pub annotator: String,
}

impl Row {
    pub fn field(&self, field: Field) -> &FieldPair {
        match field {
            Field::Prompt => &self.prompt,
            Field::Completion => &self.completion,
        }
    }

    pub fn field_mut(&mut self, field: Field) -> &mut FieldPair {
        match field {
            Field::Prompt => &mut self.prompt,
            Field::Completion => &mut self.completion,
        }
    }

    /// Linha concluída = prompt E completion revisados.
    pub fn is_annotated(&self) -> bool {
        self.prompt.status != ReviewStatus::Unchecked
            && self.completion.status != ReviewStatus::Unchecked
    }
}
