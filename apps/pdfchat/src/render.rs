//! Text rendering of the session state. Nothing here mutates anything.

use client_core::SessionState;
use shared::domain::DocumentStatus;

pub const HELP: &str = "\
Commands:
  /file PATH   select a PDF to upload
  /upload      upload the selected PDF
  /status      re-check whether a document is indexed
  /show        redraw the session
  /help        show this help
  /quit        leave the session
Anything else is sent as a question about the uploaded PDF.";

pub const NOT_READY_HINT: &str = "Please upload a PDF first to start chatting!";

pub fn status_line(state: &SessionState) -> String {
    document_status_line(state.document_status())
}

pub fn document_status_line(status: DocumentStatus) -> String {
    if status.ready {
        format!("PDF loaded: yes ({} chunks)", status.index_size)
    } else {
        "PDF loaded: no".to_string()
    }
}

pub fn upload_line(state: &SessionState) -> String {
    match (&state.selected_file, state.pending_upload) {
        (Some(file), true) => format!("Uploading {}...", file.name()),
        (None, true) => "Uploading...".to_string(),
        (Some(file), false) => format!("Selected: {}", file.name()),
        (None, false) => "No file selected".to_string(),
    }
}

pub fn answer_block(state: &SessionState) -> Option<String> {
    let answer = state.last_answer.as_deref().filter(|a| !a.is_empty())?;
    let mut out = format!("Answer:\n{answer}");

    if let Some(context) = state.last_context.as_ref().filter(|c| !c.is_empty()) {
        out.push_str("\n\nRetrieved context:");
        for (index, chunk) in context.iter().enumerate() {
            out.push_str(&format!("\n[{}] {}", index + 1, chunk));
        }
    }
    Some(out)
}

pub fn session(state: &SessionState) -> String {
    let mut lines = vec![status_line(state), upload_line(state)];
    if let Some(error) = &state.last_error {
        lines.push(format!("Upload error: {error}"));
    }
    if state.pending_query {
        lines.push("Thinking...".to_string());
    } else if !state.document_ready {
        lines.push(NOT_READY_HINT.to_string());
    }
    if let Some(answer) = answer_block(state) {
        lines.push(String::new());
        lines.push(answer);
    }
    lines.join("\n")
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
