#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Ping,
    DatasetLoad,
    SessionIdentify,
    RowGet,
    RowSave,
    CursorGet,
    CursorSet,
    CursorAdvance,
    Progress,
    RunQa,
    Export,
    DetectEncoding,
    WorkspaceList,
    WorkspaceCreate,
    WorkspaceOpen,
    WorkspaceSave,
    Unknown,
}

impl From<&str> for Command {
    fn from(s: &str) -> Self {
        match s {
            "ping" => Command::Ping,
            "dataset.load" => Command::DatasetLoad,
            "session.identify" => Command::SessionIdentify,
            "row.get" => Command::RowGet,
            "row.save" => Command::RowSave,
            "cursor.get" => Command::CursorGet,
            "cursor.set" => Command::CursorSet,
            "cursor.advance" => Command::CursorAdvance,
            "progress" => Command::Progress,
            "qa.run" | "run_qa" => Command::RunQa,
            "export" => Command::Export,
            "encoding.detect" | "detect_encoding" => Command::DetectEncoding,
            "workspace.list" => Command::WorkspaceList,
            "workspace.create" => Command::WorkspaceCreate,
            "workspace.open" => Command::WorkspaceOpen,
            "workspace.save" => Command::WorkspaceSave,
            _ => Command::Unknown,
        }
    }
}
