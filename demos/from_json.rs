//! Resolver demo: the diamond pipeline as a JSON definition document.
//!
//! ```bash
//! cargo run --example from_json
//! ```

use miette::{IntoDiagnostic, Result};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use sluice::resolver::Resolver;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let dir = std::env::temp_dir().join("sluice-from-json");
    std::fs::create_dir_all(&dir).into_diagnostic()?;
    for name in ["left.txt", "right.txt", "merged.txt"] {
        let path = dir.join(name);
        if path.exists() {
            std::fs::remove_file(path).into_diagnostic()?;
        }
    }
    let base = dir.display();

    let definition = format!(
        r#"{{
            "datas": {{
                "left":   {{ "path": "{base}/left.txt" }},
                "right":  {{ "path": "{base}/right.txt" }},
                "merged": {{ "path": "{base}/merged.txt" }}
            }},
            "processors": {{
                "make-left":  {{ "type": "command", "command": "echo left > {base}/left.txt" }},
                "make-right": {{ "type": "command", "command": "echo right > {base}/right.txt" }},
                "merge": {{
                    "type": "command",
                    "command": [
                        "cat {base}/left.txt > {base}/merged.txt",
                        "cat {base}/right.txt >> {base}/merged.txt"
                    ]
                }}
            }},
            "modules": {{
                "a": {{ "processor": "make-left",  "outputs": ["left"] }},
                "b": {{ "processor": "make-right", "outputs": ["right"] }},
                "c": {{
                    "processor": "merge",
                    "inputs": ["left", "right"],
                    "outputs": ["merged"],
                    "checkInterval": 1
                }}
            }},
            "startNodes": ["a", "b"]
        }}"#
    );

    let workflow = Resolver::default().resolve_json(&definition)?;
    info!(
        modules = workflow.module_count(),
        datas = workflow.data_count(),
        "workflow resolved"
    );

    let report = workflow.run().await?;
    let merged = std::fs::read_to_string(dir.join("merged.txt")).into_diagnostic()?;
    info!(
        run_id = %report.run_id,
        elapsed_ms = report.elapsed.as_millis() as u64,
        merged = %merged.replace('\n', " "),
        "pipeline finished"
    );
    Ok(())
}
