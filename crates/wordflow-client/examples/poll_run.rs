use wordflow_client::prelude::*;
use wordflow_client::{init_observability, poll_until_terminal};

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
        builder = builder.text(&input.name, "demo input");
    }
    let run = builder.start_stream().await?;
    let run_id = run.run_id().to_string();
    // Ignore the stream and watch the run through the polling fallback.
    drop(run);

    let snapshot = poll_until_terminal(&client, &run_id).await?;
    println!("run {run_id} ended with status {:?}", snapshot.status);
    if let Some(outputs) = snapshot.outputs {
        for (path, value) in outputs {
            println!("[{path}] {value}");
        }
    }
    Ok(())
}
