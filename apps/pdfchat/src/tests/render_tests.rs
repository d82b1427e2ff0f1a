use super::*;

use client_core::FileHandle;

fn ready_state() -> SessionState {
    SessionState {
        document_ready: true,
        index_size: 42,
        ..SessionState::default()
    }
}

#[test]
fn status_line_shows_chunk_count_only_when_ready() {
    assert_eq!(status_line(&ready_state()), "PDF loaded: yes (42 chunks)");

    let not_ready = SessionState {
        index_size: 42,
        ..SessionState::default()
    };
    assert_eq!(status_line(&not_ready), "PDF loaded: no");
}

#[test]
fn upload_line_tracks_selection_and_progress() {
    let mut state = SessionState::default();
    assert_eq!(upload_line(&state), "No file selected");

    state.selected_file = Some(FileHandle::from_bytes("paper.pdf", vec![1]).expect("file"));
    assert_eq!(upload_line(&state), "Selected: paper.pdf");

    state.pending_upload = true;
    assert_eq!(upload_line(&state), "Uploading paper.pdf...");
}

#[test]
fn answer_block_numbers_context_chunks() {
    let state = SessionState {
        last_answer: Some("Paris".into()),
        last_context: Some(vec!["A".into(), "B".into()]),
        ..ready_state()
    };
    assert_eq!(
        answer_block(&state).expect("answer"),
        "Answer:\nParis\n\nRetrieved context:\n[1] A\n[2] B"
    );
}

#[test]
fn error_answer_renders_without_context() {
    let state = SessionState {
        last_answer: Some("Error: index not ready".into()),
        last_context: None,
        ..ready_state()
    };
    assert_eq!(
        answer_block(&state).expect("answer"),
        "Answer:\nError: index not ready"
    );
}

#[test]
fn no_answer_renders_nothing() {
    assert_eq!(answer_block(&SessionState::default()), None);
}

#[test]
fn session_view_warns_until_document_is_ready() {
    let view = session(&SessionState::default());
    assert!(view.contains(NOT_READY_HINT));

    let view = session(&SessionState {
        last_error: Some("Only PDF files are allowed".into()),
        ..ready_state()
    });
    assert!(!view.contains(NOT_READY_HINT));
    assert!(view.contains("Upload error: Only PDF files are allowed"));
}
