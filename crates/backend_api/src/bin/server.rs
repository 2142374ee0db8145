use anyhow::Context;
use backend_api::{init_tracing, run_server, AppState, FileRecordRepository};
use std::sync::Arc;
use std::{env, path::PathBuf};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();
    init_tracing();

    let settings_path = env::var("SETTINGS_PATH").ok().map(PathBuf::from);
    let settings = settings_loader::load_settings_with_fallback(settings_path.as_ref())?
        .unwrap_or_else(|| {
            tracing::warn!("No settings file found; using defaults");
            models::Settings::default()
        });
    let settings = settings_loader::apply_overrides(settings, |key| env::var(key).ok());

    // Relative paths are taken from the workspace root so the server behaves
    // the same whether started from the root or from the crate directory.
    let crate_root = env::current_dir().context("Reading current directory")?;
    let workspace_root = find_workspace_root(&crate_root).unwrap_or_else(|| crate_root.clone());
    let mut settings = settings_loader::resolve_relative_paths(settings, &workspace_root);

    settings.database_path = utils::ensure_database_exists(&settings.database_path)?;

    tracing::info!(
        workspace_root = %workspace_root.display(),
        database = %settings.database_path.display(),
        charts_dir = %settings.charts_dir.display(),
        "Expense API Server"
    );

    let repo = Arc::new(FileRecordRepository::new(&settings.database_path));
    let host = settings.server.host.clone();
    let port = settings.server.port;

    run_server(AppState::new(repo, settings), &host, port).await?;

    Ok(())
}

/// Find the Cargo workspace root by traversing up until a Cargo.toml that contains a [workspace] section.
fn find_workspace_root(start: &std::path::Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    for _ in 0..10 {
        let candidate = dir.join("Cargo.toml");
        if let Ok(content) = std::fs::read_to_string(&candidate) {
            if content.contains("[workspace]") {
                return Some(dir);
            }
        }
        if !dir.pop() {
            break;
        }
    }
    None
}
