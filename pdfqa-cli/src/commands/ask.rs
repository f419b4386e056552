use crate::app::App;

pub async fn run(app: &App, question: &str, k: Option<usize>) -> anyhow::Result<()> {
    let payload = app.orchestrator(k)?.answer_payload(question).await;
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}
