//! Interactive terminal session: reads input lines, forwards them to the
//! controller and prints whatever the controller reports back.

use std::path::PathBuf;

use client_core::{Key, QueryOutcome, SessionController, SessionEvent, UploadOutcome};
use tokio::{
    io::{self, AsyncBufRead, AsyncBufReadExt, BufReader},
    sync::{
        broadcast::{
            self,
            error::{RecvError, TryRecvError},
        },
        oneshot,
    },
    task::JoinSet,
};
use tracing::{debug, warn};

use crate::render;

const BUSY_HINT: &str = "Still thinking about the last question...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    SelectFile(PathBuf),
    Upload,
    Status,
    Show,
    Help,
    Quit,
    Question(String),
    Unknown(String),
}

pub fn parse_input(line: &str) -> Input {
    let trimmed = line.trim();
    let Some(command) = trimmed.strip_prefix('/') else {
        return Input::Question(line.trim_end_matches(['\r', '\n']).to_string());
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };
    match name {
        "file" | "open" if !arg.is_empty() => Input::SelectFile(PathBuf::from(arg)),
        "upload" => Input::Upload,
        "status" => Input::Status,
        "show" => Input::Show,
        "help" | "?" => Input::Help,
        "quit" | "exit" | "q" => Input::Quit,
        _ => Input::Unknown(trimmed.to_string()),
    }
}

pub async fn run(controller: SessionController) -> anyhow::Result<()> {
    run_session(controller, BufReader::new(io::stdin())).await
}

/// Drives one session from `input` until `/quit` or end of input.
///
/// Uploads and questions run on background tasks so the prompt stays
/// responsive. They are all joined before this returns, and the printer
/// flushes every event they produced.
pub async fn run_session<R>(controller: SessionController, input: R) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let (stop_printer, stopped) = oneshot::channel();
    let printer = tokio::spawn(print_events(
        controller.clone(),
        controller.subscribe_events(),
        stopped,
    ));
    let mut tasks = JoinSet::new();

    controller.start().await;
    println!("{}", render::session(&controller.snapshot()));
    println!("Type /help for commands.");

    let mut lines = input.lines();
    let read_result = loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break Ok(()),
            Err(err) => break Err(err),
        };
        match parse_input(&line) {
            Input::SelectFile(path) => {
                // Failures arrive as a ValidationFailed event.
                if let Ok(file) = controller.select_file_path(&path).await {
                    println!("Selected: {} ({} bytes)", file.name(), file.len());
                }
            }
            Input::Upload => spawn_upload(&mut tasks, &controller),
            Input::Status => {
                if let Err(err) = controller.refresh_status().await {
                    println!("Could not reach the backend: {err}");
                }
            }
            Input::Show => println!("{}", render::session(&controller.snapshot())),
            Input::Help => println!("{}", render::HELP),
            Input::Quit => break Ok(()),
            Input::Unknown(command) => println!("Unknown command {command}; try /help"),
            Input::Question(text) => dispatch_question(&mut tasks, &controller, text),
        }
    };

    while let Some(joined) = tasks.join_next().await {
        if let Err(err) = joined {
            warn!(error = %err, "session task did not finish");
        }
    }
    let _ = stop_printer.send(());
    if let Err(err) = printer.await {
        warn!(error = %err, "event printer did not finish");
    }
    read_result?;
    Ok(())
}

fn dispatch_question(tasks: &mut JoinSet<()>, controller: &SessionController, text: String) {
    let state = controller.snapshot();
    // The question input is disabled until a document is indexed.
    if !state.document_ready {
        println!("{}", render::NOT_READY_HINT);
        return;
    }
    if state.pending_query {
        println!("{BUSY_HINT}");
        return;
    }
    let controller = controller.clone();
    tasks.spawn(async move {
        match controller.commit_input(Key::Enter, text).await {
            Ok(QueryOutcome::AlreadyPending) => println!("{BUSY_HINT}"),
            Ok(QueryOutcome::Answered { .. } | QueryOutcome::Ignored) => {}
            Err(err) => debug!(error = %err, "question not answered"),
        }
    });
}

fn spawn_upload(tasks: &mut JoinSet<()>, controller: &SessionController) {
    let controller = controller.clone();
    tasks.spawn(async move {
        match controller.upload_selected().await {
            Ok(UploadOutcome::Uploaded { .. }) => {}
            Ok(UploadOutcome::AlreadyPending) => println!("An upload is already in progress."),
            // Reported through events.
            Err(_) => {}
        }
    });
}

async fn print_events(
    controller: SessionController,
    mut events: broadcast::Receiver<SessionEvent>,
    mut stop: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            received = events.recv() => match received {
                Ok(event) => print_event(&event, &controller),
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "session events lagged"),
                Err(RecvError::Closed) => return,
            },
            _ = &mut stop => break,
        }
    }
    // Whatever the finished tasks sent is still queued.
    loop {
        match events.try_recv() {
            Ok(event) => print_event(&event, &controller),
            Err(TryRecvError::Lagged(skipped)) => debug!(skipped, "session events lagged"),
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}

fn print_event(event: &SessionEvent, controller: &SessionController) {
    if let Some(text) = describe_event(event, controller) {
        println!("{text}");
    }
}

fn describe_event(event: &SessionEvent, controller: &SessionController) -> Option<String> {
    match event {
        SessionEvent::Notice(message) => Some(format!("** {message}")),
        SessionEvent::ValidationFailed(message) => Some(format!("!! {message}")),
        SessionEvent::UploadFailed(message) => Some(format!("!! Upload failed: {message}")),
        SessionEvent::StatusChanged(status) => Some(render::document_status_line(*status)),
        SessionEvent::AnswerReady | SessionEvent::QueryFailed(_) => {
            render::answer_block(&controller.snapshot())
        }
    }
}

#[cfg(test)]
#[path = "tests/repl_tests.rs"]
mod tests;
