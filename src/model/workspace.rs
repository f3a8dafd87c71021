use serde::{Deserialize, Serialize};

fn default_delimiter() -> String {
    ",".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct WorkspaceInfo {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub workspace_path: String,

    #[serde(default, alias = "csv_path")]
    pub dataset_path: String,

    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    #[serde(default, alias = "source_lang")]
    pub source_language: String,

    #[serde(default, alias = "target_lang")]
    pub target_language: String,

    /// Roster informativo para o front-end montar o seletor de usuário.
    /// A identidade continua sendo texto livre, sem verificação.
    #[serde(default, alias = "users")]
    pub annotators: Vec<String>,
}
