//! release_flow binary: guarded alpha/beta/stable release trains.

use release_flow::cli;
use release_flow::cli::OutputManager;
use release_flow::config::EnvConfig;
use std::process;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match cli::run(EnvConfig::from_env()).await {
        Ok(exit_code) => {
            process::exit(exit_code);
        }
        Err(e) => {
            let output = OutputManager::new(false);
            output.error(&format!("Fatal error: {e}"));

            let suggestions = e.recovery_suggestions();
            if !suggestions.is_empty() {
                eprintln!("\n💡 Recovery suggestions:");
                for suggestion in suggestions {
                    eprintln!("  • {suggestion}");
                }
            }

            process::exit(1);
        }
    }
}
