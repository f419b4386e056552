use pdfqa_rag::AnswerPayload;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::warn;

use crate::app::App;

const PROMPT: &str = "question> ";

pub async fn run(app: &App) -> anyhow::Result<()> {
    let orchestrator = app.orchestrator(None)?;
    let mut editor = DefaultEditor::new()?;

    println!(
        "Asking collection '{}'. Type 'exit' or press Ctrl-D to quit.",
        app.config.collection_name
    );

    loop {
        let line = match editor.readline(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question, "exit" | "quit") {
            break;
        }
        if let Err(e) = editor.add_history_entry(question) {
            warn!(error = %e, "failed to record history");
        }

        match orchestrator.answer_payload(question).await {
            AnswerPayload::Answer { text, sources } => {
                println!("\n{text}\n");
                for source in &sources {
                    println!("  - {} (page {})", source.source_name, source.page);
                }
                println!();
            }
            AnswerPayload::Error { error } => eprintln!("error: {error}\n"),
        }
    }
    Ok(())
}
