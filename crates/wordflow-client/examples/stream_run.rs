use wordflow_client::prelude::*;
use wordflow_client::init_observability;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), ClientError> {
    init_observability();
    let client = WordflowClient::from_env()?;

    let apps = client.fetch_apps().await?;
    let Some(app) = apps.first() else {
        eprintln!("no apps visible to this credential");
        return Ok(());
    };
    let mut versions = client.fetch_versions(&app.org_slug, &app.app_slug).await?;
    sort_versions_desc(&mut versions);
    let Some(version) = versions.first().cloned() else {
        eprintln!("app {} has no versions", app.app_slug);
        return Ok(());
    };

    let mut builder = client.run(&app.org_slug, &app.app_slug, version.clone());
    for input in &version.inputs {
        if input.input_type.is_file_like() {
            eprintln!("skipping: newest version needs a file input ({})", input.name);
            return Ok(());
        }
        builder = builder.text(&input.name, "demo input");
    }

    let mut run = builder.start_stream().await?;
    while let Some(event) = run.next_event().await {
        match event {
            RunEvent::OutputsUpdated { outputs, .. } => {
                if let Some(last) = outputs.last() {
                    println!("[{}] {}", last.path, last.content);
                }
            }
            RunEvent::AwaitingInput { ask, .. } => {
                println!("run asks: {}", ask.content.value);
                run.answer("yes").await?;
            }
            RunEvent::Error { error, .. } => eprintln!("run error: {error}"),
            RunEvent::Completed { .. } => break,
            RunEvent::Started { .. } => {}
        }
    }

    let record = run.finish().await?;
    println!("run finished at {} with {} fragments", record.run_time, record.outputs.len());
    Ok(())
}
