//! `medassist server` — Start the MedAssist HTTP server.

pub async fn run(
    host: String,
    port: u16,
    output_dir: Option<String>,
    workflow: Option<String>,
    warm_up: bool,
) -> Result<(), String> {
    let config = medassist_server::ServerConfig {
        host: host.clone(),
        port,
        output_dir,
        workflow,
        warm_up,
    };

    println!("Starting MedAssist server on {}:{}...", host, port);

    let addr = medassist_server::start_server(config).await?;
    println!("MedAssist server listening on http://{}", addr);

    // Keep the process running until interrupted
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("Failed to listen for Ctrl+C: {}", e))?;

    println!("\nShutting down...");
    Ok(())
}
