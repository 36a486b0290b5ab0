use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use nsone_exporter::app::Application;
use nsone_exporter::config::Cli;
use utils::version;

/// Sets up global panic hooks.
fn setup_global_hooks() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        default_hook(panic_info);
        tracing::error!("Thread panicked: {}", panic_info);
    }));
}

fn main() -> Result<()> {
    setup_global_hooks();

    let cli = Cli::parse();

    let _guard = match &cli.log_dir {
        Some(dir) => Some(utils::logging::init_with_file(dir, "nsone-exporter.log")),
        None => {
            utils::logging::init();
            None
        }
    };

    tracing::info!(
        branch = version::branch().unwrap_or("unknown"),
        "Starting nsone exporter {}",
        &**version::VERSION
    );

    // the blocking HTTP client has to be created and dropped outside of the runtime
    let app = Application::build(&cli)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let result = runtime.block_on(app.run());
    drop(runtime);

    app.shutdown();
    result
}
