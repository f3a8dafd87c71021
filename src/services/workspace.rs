use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::CoreError;
use crate::model::workspace::WorkspaceInfo;

fn workspaces_base_dir() -> PathBuf {
    if let Ok(home) = std::env::var("ATUNSE_HOME") {
        return PathBuf::from(home).join("Workspaces");
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("Workspaces")
}

/// Converte o nome do workspace em nome seguro de diretório: se vier um
/// caminho, usa só o basename; caracteres fora de letra/número/espaço/_-.
/// viram '_'.
fn safe_workspace_dir_name(name: &str) -> String {
    let mut n = name.trim().to_string();

    if n.contains('\\') || n.contains('/') {
        if let Some(bn) = Path::new(&n).file_name().and_then(|s| s.to_str()) {
            n = bn.to_string();
        }
    }

    let mut out = String::with_capacity(n.len());
    for ch in n.chars() {
        let ok = ch.is_ascii_alphanumeric() || ch == ' ' || ch == '_' || ch == '-' || ch == '.';
        out.push(if ok { ch } else { '_' });
    }

    let out = out.trim().trim_matches('.').to_string();
    if out.is_empty() {
        "Workspace".to_string()
    } else {
        out
    }
}

pub fn list_workspaces() -> Vec<WorkspaceInfo> {
    let dir = workspaces_base_dir();
    let mut workspaces = Vec::new();

    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path().join("workspace.json");
            if !path.exists() {
                continue;
            }
            match fs::read_to_string(&path) {
                Ok(data) => match serde_json::from_str::<WorkspaceInfo>(&data) {
                    Ok(ws) => workspaces.push(ws),
                    Err(e) => warn!(path = %path.display(), error = %e, "skipping invalid workspace.json"),
                },
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable workspace.json"),
            }
        }
    }

    workspaces
}

pub fn create_workspace(
    name: String,
    dataset_path: String,
    delimiter: String,
    source_language: String,
    target_language: String,
    annotators: Vec<String>,
) -> Result<WorkspaceInfo, CoreError> {
    let base = workspaces_base_dir();

    let safe_name = safe_workspace_dir_name(&name);
    let workspace_dir = base.join(&safe_name);

    if workspace_dir.exists() {
        return Err(CoreError::Workspace("workspace already exists".into()));
    }

    fs::create_dir_all(&workspace_dir)
        .map_err(|e| CoreError::Workspace(format!("failed to create workspace directory: {e}")))?;

    let workspace = WorkspaceInfo {
        name, // nome de exibição fica como veio
        workspace_path: workspace_dir.to_string_lossy().to_string(),
        dataset_path,
        delimiter,
        source_language,
        target_language,
        annotators,
    };

    write_descriptor(&workspace_dir, &workspace)?;

    Ok(workspace)
}

pub fn open_workspace(workspace_path: String) -> Result<WorkspaceInfo, CoreError> {
    let path = Path::new(&workspace_path).join("workspace.json");

    if !path.exists() {
        return Err(CoreError::Workspace("workspace.json not found".into()));
    }

    let data = fs::read_to_string(path)
        .map_err(|e| CoreError::Workspace(format!("failed to read workspace.json: {e}")))?;

    serde_json::from_str::<WorkspaceInfo>(&data)
        .map_err(|e| CoreError::Workspace(format!("invalid workspace.json: {e}")))
}

pub fn save_workspace(mut workspace: WorkspaceInfo) -> Result<WorkspaceInfo, CoreError> {
    let base = workspaces_base_dir();

    let workspace_dir: PathBuf = {
        let wp = workspace.workspace_path.trim().to_string();
        if wp.is_empty() {
            base.join(safe_workspace_dir_name(&workspace.name))
        } else {
            PathBuf::from(wp)
        }
    };

    fs::create_dir_all(&workspace_dir)
        .map_err(|e| CoreError::Workspace(format!("failed to create workspace directory: {e}")))?;

    workspace.workspace_path = workspace_dir.to_string_lossy().to_string();

    // delimitador vazio quebra o export; garante o default
    if workspace.delimiter.is_empty() {
        workspace.delimiter = ",".to_string();
    }

    write_descriptor(&workspace_dir, &workspace)?;

    Ok(workspace)
}

fn write_descriptor(dir: &Path, workspace: &WorkspaceInfo) -> Result<(), CoreError> {
    let json = serde_json::to_string_pretty(workspace)
        .map_err(|e| CoreError::Workspace(format!("failed to serialize workspace: {e}")))?;

    fs::write(dir.join("workspace.json"), json)
        .map_err(|e| CoreError::Workspace(format!("failed to write workspace.json: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_workspace_dir_names() {
        assert_eq!(safe_workspace_dir_name("Yoruba QA"), "Yoruba QA");
        assert_eq!(safe_workspace_dir_name("  batch:3? "), "batch_3_");
        assert_eq!(safe_workspace_dir_name("/data/sets/batch1"), "batch1");
        assert_eq!(safe_workspace_dir_name("..."), "Workspace");
        assert_eq!(safe_workspace_dir_name(""), "Workspace");
    }
}
