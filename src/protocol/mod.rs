use std::path::Path;

use serde_json::{json, Value};

use crate::error::CoreError;
use crate::model::row::{Field, Verdict};
use crate::model::session::SessionContext;
use crate::model::workspace::WorkspaceInfo;
use crate::services::{encoding, export, ledger::Ledger, loader, qa, workspace};

mod command;
use command::Command;

/// Estado de uma sessão de anotação: um por processo. O ledger só existe
/// depois de um dataset.load bem-sucedido.
#[derive(Default)]
pub struct Session {
    ledger: Option<Ledger>,
    ctx: SessionContext,
}

fn get_cmd(req: &Value) -> &str {
    req.get("cmd").and_then(|v| v.as_str()).unwrap_or("")
}

fn get_id(req: &Value) -> Value {
    req.get("id").cloned().unwrap_or(Value::Null)
}

fn get_payload<'a>(req: &'a Value) -> &'a Value {
    static EMPTY: Value = Value::Null;
    req.get("payload").unwrap_or(&EMPTY)
}

fn ok(id: Value, payload: Value) -> String {
    json!({
        "id": id,
        "status": "ok",
        "payload": payload
    })
    .to_string()
}

fn err(id: Value, message: impl Into<String>) -> String {
    json!({
        "id": id,
        "status": "error",
        "message": message.into()
    })
    .to_string()
}

fn get_row_id(payload: &Value) -> Result<usize, String> {
    payload
        .get("id")
        .and_then(|v| v.as_u64())
        .map(|v| v as usize)
        .ok_or_else(|| "payload.id is required".to_string())
}

fn get_delimiter(payload: &Value) -> Option<char> {
    payload
        .get("delimiter")
        .and_then(|v| v.as_str())
        .and_then(|s| s.chars().next())
}

pub fn handle(session: &mut Session, input: &str) -> String {
    let req: Value = match serde_json::from_str(input) {
        Ok(v) => v,
        Err(_) => {
            return json!({
                "status": "error",
                "message": "invalid json"
            })
            .to_string();
        }
    };

    let id = get_id(&req);
    let cmd_str = get_cmd(&req);
    let payload = get_payload(&req);

    match Command::from(cmd_str) {
        Command::Ping => ok(id, json!({ "message": "atunse-core alive" })),

        Command::DatasetLoad => {
            let path_str = payload.get("path").and_then(|v| v.as_str()).unwrap_or("");
            if path_str.is_empty() {
                return err(id, "payload.path is required");
            }

            match loader::load_from_file(Path::new(path_str), get_delimiter(payload)) {
                Ok(rows) => {
                    let ledger = Ledger::new(rows);

                    // retomada: cursor começa na primeira linha incompleta
                    session.ctx.cursor = ledger.first_incomplete();
                    let cursor = session.ctx.cursor;
                    let done = ledger.is_done(&session.ctx);
                    let progress = ledger.progress_summary();

                    session.ledger = Some(ledger);

                    ok(
                        id,
                        json!({
                            "rows": progress.total,
                            "cursor": cursor,
                            "done": done,
                            "progress": progress
                        }),
                    )
                }
                Err(e) => err(id, e.to_string()),
            }
        }

        Command::SessionIdentify => {
            let annotator = payload
                .get("annotator")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .trim();

            if annotator.is_empty() {
                return err(id, CoreError::MissingIdentity.to_string());
            }

            session.ctx.annotator = annotator.to_string();
            ok(id, json!({ "annotator": session.ctx.annotator }))
        }

        Command::RowGet => {
            let row_id = match get_row_id(payload) {
                Ok(v) => v,
                Err(e) => return err(id, e),
            };

            let ledger = match session.ledger.as_ref() {
                Some(l) => l,
                None => return err(id, "no dataset loaded"),
            };

            match ledger.get_row(row_id) {
                Ok(row) => ok(id, json!({ "row": row })),
                Err(e) => err(id, e.to_string()),
            }
        }

        Command::RowSave => {
            let row_id = match get_row_id(payload) {
                Ok(v) => v,
                Err(e) => return err(id, e),
            };

            let field = match payload.get("field").and_then(|v| v.as_str()) {
                Some("prompt") => Field::Prompt,
                Some("completion") => Field::Completion,
                _ => return err(id, "payload.field must be \"prompt\" or \"completion\""),
            };

            let verdict = match payload.get("status").and_then(|v| v.as_str()) {
                Some("correct") => Verdict::Correct,
                Some("incorrect") => Verdict::Incorrect,
                _ => return err(id, "payload.status must be \"correct\" or \"incorrect\""),
            };

            let corrected = payload
                .get("corrected_text")
                .and_then(|v| v.as_str())
                .unwrap_or("");

            let Session { ledger, ctx } = session;
            let ledger = match ledger.as_mut() {
                Some(l) => l,
                None => return err(id, "no dataset loaded"),
            };

            match ledger.save_correction(row_id, field, corrected, verdict, ctx) {
                Ok(row) => ok(
                    id,
                    json!({ "row": row, "progress": ledger.progress_summary() }),
                ),
                Err(e) => err(id, e.to_string()),
            }
        }

        Command::CursorGet => {
            let ledger = match session.ledger.as_ref() {
                Some(l) => l,
                None => return err(id, "no dataset loaded"),
            };

            ok(
                id,
                json!({ "cursor": session.ctx.cursor, "done": ledger.is_done(&session.ctx) }),
            )
        }

        Command::CursorSet => {
            let row_id = match get_row_id(payload) {
                Ok(v) => v,
                Err(e) => return err(id, e),
            };

            let Session { ledger, ctx } = session;
            let ledger = match ledger.as_ref() {
                Some(l) => l,
                None => return err(id, "no dataset loaded"),
            };

            match ledger.set_cursor(ctx, row_id) {
                Ok(()) => ok(
                    id,
                    json!({ "cursor": ctx.cursor, "done": ledger.is_done(ctx) }),
                ),
                Err(e) => err(id, e.to_string()),
            }
        }

        Command::CursorAdvance => {
            let Session { ledger, ctx } = session;
            let ledger = match ledger.as_ref() {
                Some(l) => l,
                None => return err(id, "no dataset loaded"),
            };

            let cursor = ledger.advance_cursor(ctx);
            ok(id, json!({ "cursor": cursor, "done": ledger.is_done(ctx) }))
        }

        Command::Progress => {
            let ledger = match session.ledger.as_ref() {
                Some(l) => l,
                None => return err(id, "no dataset loaded"),
            };

            let summary = ledger.progress_summary();
            ok(id, serde_json::to_value(summary).unwrap_or(json!({})))
        }

        Command::RunQa => {
            let ledger = match session.ledger.as_ref() {
                Some(l) => l,
                None => return err(id, "no dataset loaded"),
            };

            ok(id, json!({ "issues": qa::run(ledger.rows()) }))
        }

        Command::Export => {
            let ledger = match session.ledger.as_ref() {
                Some(l) => l,
                None => return err(id, "no dataset loaded"),
            };

            let delim = get_delimiter(payload).unwrap_or(',');

            match payload.get("path").and_then(|v| v.as_str()) {
                Some(path) if !path.is_empty() => {
                    match export::export_to_file(ledger, Path::new(path), delim) {
                        Ok(()) => ok(id, json!({ "path": path, "rows": ledger.len() })),
                        Err(e) => err(id, e.to_string()),
                    }
                }
                // sem path: devolve o texto e deixa a persistência com o chamador
                _ => ok(id, json!({ "text": export::to_delimited(ledger, delim) })),
            }
        }

        Command::DetectEncoding => {
            let path_str = payload.get("path").and_then(|v| v.as_str()).unwrap_or("");
            if path_str.is_empty() {
                return err(id, "payload.path is required");
            }

            match encoding::detect_from_file(Path::new(path_str)) {
                Ok(result) => ok(id, serde_json::to_value(result).unwrap_or(json!({}))),
                Err(e) => err(id, e.to_string()),
            }
        }

        Command::WorkspaceList => ok(id, json!({ "workspaces": workspace::list_workspaces() })),

        Command::WorkspaceCreate => {
            let name = payload.get("name").and_then(|v| v.as_str()).unwrap_or("").to_string();
            let dataset_path = payload
                .get("dataset_path")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            let delimiter = payload
                .get("delimiter")
                .and_then(|v| v.as_str())
                .unwrap_or(",")
                .to_string();

            let source_language = payload
                .get("source_language")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            let target_language = payload
                .get("target_language")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();

            let annotators: Vec<String> = payload
                .get("annotators")
                .and_then(|v| v.as_array())
                .map(|arr| {
                    arr.iter()
                        .filter_map(|v| v.as_str())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();

            if name.is_empty() {
                return err(id, "payload.name is required");
            }
            if dataset_path.is_empty() {
                return err(id, "payload.dataset_path is required");
            }

            match workspace::create_workspace(
                name,
                dataset_path,
                delimiter,
                source_language,
                target_language,
                annotators,
            ) {
                Ok(ws) => ok(id, json!({ "workspace_path": ws.workspace_path })),
                Err(e) => err(id, e.to_string()),
            }
        }

        Command::WorkspaceOpen => {
            let workspace_path = payload
                .get("workspace_path")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            if workspace_path.is_empty() {
                return err(id, "payload.workspace_path is required");
            }

            match workspace::open_workspace(workspace_path) {
                Ok(ws) => ok(id, json!({ "workspace": ws })),
                Err(e) => err(id, e.to_string()),
            }
        }

        Command::WorkspaceSave => {
            let workspace_val = payload.get("workspace").cloned().unwrap_or(Value::Null);
            if workspace_val.is_null() {
                return err(id, "payload.workspace is required");
            }

            let ws: WorkspaceInfo = match serde_json::from_value(workspace_val) {
                Ok(v) => v,
                Err(e) => return err(id, format!("invalid payload.workspace: {e}")),
            };

            match workspace::save_workspace(ws) {
                Ok(saved) => ok(id, json!({ "workspace": saved })),
                Err(e) => err(id, e.to_string()),
            }
        }

        Command::Unknown => err(id, "unknown command"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(cmd: &str, payload: Value) -> String {
        json!({ "id": 1, "cmd": cmd, "payload": payload }).to_string()
    }

    fn parse(response: &str) -> Value {
        serde_json::from_str(response).unwrap()
    }

    fn loaded_session() -> Session {
        let text = "prompt,completion,translated_prompt,translated_completion\n\
                    hello,world,bawo,aye\n\
                    yes,no,beeni,rara";
        let rows = loader::parse_dataset(text, None).unwrap();
        let ledger = Ledger::new(rows);
        let cursor = ledger.first_incomplete();
        Session {
            ledger: Some(ledger),
            ctx: SessionContext {
                annotator: String::new(),
                cursor,
            },
        }
    }

    #[test]
    fn ping_answers() {
        let mut session = Session::default();
        let resp = parse(&handle(&mut session, &request("ping", Value::Null)));
        assert_eq!(resp["status"], "ok");
    }

    #[test]
    fn invalid_json_is_an_error() {
        let mut session = Session::default();
        let resp = parse(&handle(&mut session, "{not json"));
        assert_eq!(resp["status"], "error");
        assert_eq!(resp["message"], "invalid json");
    }

    #[test]
    fn unknown_command_is_an_error() {
        let mut session = Session::default();
        let resp = parse(&handle(&mut session, &request("nope", Value::Null)));
        assert_eq!(resp["status"], "error");
        assert_eq!(resp["message"], "unknown command");
    }

    #[test]
    fn row_commands_require_a_loaded_dataset() {
        let mut session = Session::default();
        for cmd in ["row.get", "progress", "cursor.advance", "export", "qa.run"] {
            let resp = parse(&handle(&mut session, &request(cmd, json!({ "id": 0 }))));
            assert_eq!(resp["status"], "error", "cmd {cmd}");
            assert_eq!(resp["message"], "no dataset loaded", "cmd {cmd}");
        }
    }

    #[test]
    fn dataset_load_reports_missing_file() {
        let mut session = Session::default();
        let resp = parse(&handle(
            &mut session,
            &request("dataset.load", json!({ "path": "does/not/exist.csv" })),
        ));
        assert_eq!(resp["status"], "error");
        assert!(resp["message"]
            .as_str()
            .unwrap()
            .starts_with("dataset source unavailable"));
    }

    #[test]
    fn save_requires_identity_first() {
        let mut session = loaded_session();

        let resp = parse(&handle(
            &mut session,
            &request(
                "row.save",
                json!({ "id": 0, "field": "prompt", "status": "correct" }),
            ),
        ));
        assert_eq!(resp["status"], "error");
        assert_eq!(resp["message"], "annotator identity is required");

        // linha segue intocada
        let resp = parse(&handle(&mut session, &request("row.get", json!({ "id": 0 }))));
        assert_eq!(resp["payload"]["row"]["prompt"]["status"], "unchecked");
    }

    #[test]
    fn identify_rejects_blank_names() {
        let mut session = Session::default();
        let resp = parse(&handle(
            &mut session,
            &request("session.identify", json!({ "annotator": "   " })),
        ));
        assert_eq!(resp["status"], "error");
    }

    #[test]
    fn full_annotation_flow() {
        let mut session = loaded_session();

        let resp = parse(&handle(
            &mut session,
            &request("session.identify", json!({ "annotator": "alice" })),
        ));
        assert_eq!(resp["status"], "ok");

        let resp = parse(&handle(
            &mut session,
            &request(
                "row.save",
                json!({
                    "id": 0,
                    "field": "prompt",
                    "corrected_text": "ẹ n lẹ",
                    "status": "incorrect"
                }),
            ),
        ));
        assert_eq!(resp["status"], "ok");
        assert_eq!(resp["payload"]["row"]["annotator"], "alice");
        assert_eq!(resp["payload"]["progress"]["annotated"], 0);

        let resp = parse(&handle(
            &mut session,
            &request(
                "row.save",
                json!({ "id": 0, "field": "completion", "status": "correct" }),
            ),
        ));
        assert_eq!(resp["payload"]["progress"]["annotated"], 1);
        assert_eq!(resp["payload"]["progress"]["per_user"]["alice"], 1);

        // modo sequencial: pula a linha 0 já concluída
        let resp = parse(&handle(&mut session, &request("cursor.advance", Value::Null)));
        assert_eq!(resp["payload"]["cursor"], 1);
        assert_eq!(resp["payload"]["done"], false);

        let resp = parse(&handle(&mut session, &request("cursor.advance", Value::Null)));
        assert_eq!(resp["payload"]["cursor"], 2);
        assert_eq!(resp["payload"]["done"], true);

        let resp = parse(&handle(&mut session, &request("export", Value::Null)));
        let text = resp["payload"]["text"].as_str().unwrap();
        assert!(text.starts_with("id,prompt,completion"));
        assert!(text.contains("ẹ n lẹ"));
    }

    #[test]
    fn row_save_out_of_range() {
        let mut session = loaded_session();
        handle(
            &mut session,
            &request("session.identify", json!({ "annotator": "bob" })),
        );

        let resp = parse(&handle(
            &mut session,
            &request(
                "row.save",
                json!({ "id": 9, "field": "prompt", "status": "correct" }),
            ),
        ));
        assert_eq!(resp["status"], "error");
        assert_eq!(resp["message"], "row 9 out of range (dataset has 2 rows)");
    }

    #[test]
    fn row_save_validates_field_and_status() {
        let mut session = loaded_session();
        handle(
            &mut session,
            &request("session.identify", json!({ "annotator": "bob" })),
        );

        let resp = parse(&handle(
            &mut session,
            &request(
                "row.save",
                json!({ "id": 0, "field": "title", "status": "correct" }),
            ),
        ));
        assert_eq!(resp["status"], "error");

        // "unchecked" não é veredito válido num save
        let resp = parse(&handle(
            &mut session,
            &request(
                "row.save",
                json!({ "id": 0, "field": "prompt", "status": "unchecked" }),
            ),
        ));
        assert_eq!(resp["status"], "error");
    }

    #[test]
    fn cursor_set_random_access() {
        let mut session = loaded_session();

        let resp = parse(&handle(
            &mut session,
            &request("cursor.set", json!({ "id": 1 })),
        ));
        assert_eq!(resp["payload"]["cursor"], 1);

        let resp = parse(&handle(
            &mut session,
            &request("cursor.set", json!({ "id": 5 })),
        ));
        assert_eq!(resp["status"], "error");
    }
}
