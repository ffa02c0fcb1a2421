//! Linear chain demo: two command modules connected by a file artifact.
//!
//! Module `greet` writes a greeting file; module `shout` waits for it and
//! produces an uppercased copy. Run with:
//!
//! ```bash
//! cargo run --example linear_chain
//! ```

use std::time::Duration;

use miette::{IntoDiagnostic, Result};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use sluice::data::FileArtifact;
use sluice::processor::CommandProcessor;
use sluice::workflow::{ModuleSpec, Workflow};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let dir = std::env::temp_dir().join("sluice-linear-chain");
    std::fs::create_dir_all(&dir).into_diagnostic()?;
    let greeting = dir.join("greeting.txt");
    let shouted = dir.join("shouted.txt");
    // Stale outputs from a previous run would satisfy the gates immediately.
    for path in [&greeting, &shouted] {
        if path.exists() {
            std::fs::remove_file(path).into_diagnostic()?;
        }
    }

    let workflow = Workflow::builder()
        .add_data("greeting", FileArtifact::new(&greeting))
        .add_data("shouted", FileArtifact::new(&shouted))
        .add_processor(CommandProcessor::new(
            "write-greeting",
            format!("echo hello world > {}", greeting.display()),
        ))
        .add_processor(CommandProcessor::new(
            "uppercase",
            format!(
                "tr '[:lower:]' '[:upper:]' < {} > {}",
                greeting.display(),
                shouted.display()
            ),
        ))
        .add_module(
            ModuleSpec::new("greet", "write-greeting")
                .with_outputs(["greeting"])
                .with_check_interval(Duration::from_millis(200)),
        )
        .add_module(
            ModuleSpec::new("shout", "uppercase")
                .with_inputs(["greeting"])
                .with_outputs(["shouted"])
                .with_check_interval(Duration::from_millis(200)),
        )
        .add_start_module("greet")
        .build()?;

    let report = workflow.run().await?;
    let content = std::fs::read_to_string(&shouted).into_diagnostic()?;
    info!(
        run_id = %report.run_id,
        modules = report.modules_finished,
        output = %content.trim(),
        "pipeline finished"
    );
    Ok(())
}
