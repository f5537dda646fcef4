use log::{error, info};
use std::process::ExitCode;

use parquet_media_viewer::config::ViewerConfig;
use parquet_media_viewer::services::{PageCoordinator, SettingsStore};
use parquet_media_viewer::startup::{StartupOptions, USAGE};
use parquet_media_viewer::state::SortCriterion;
use parquet_media_viewer::ui::ContactSheetSurface;
use parquet_media_viewer::{AppError, Result};

fn main() -> ExitCode {
    #[cfg(debug_assertions)]
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .init();
    #[cfg(not(debug_assertions))]
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let options = StartupOptions::from_env()?;
    if options.help {
        println!("{}", USAGE);
        return Ok(());
    }

    let store = SettingsStore::new();
    let mut settings = store.load();

    let path = options
        .file
        .clone()
        .or_else(|| settings.last_file.clone())
        .ok_or_else(|| AppError::InvalidArgument(format!("no file given\n{}", USAGE)))?;

    let mut config = ViewerConfig::default();
    if let Some(columns) = options.columns {
        config = config.with_columns_per_row(columns);
    }
    if let Some(page_size) = options.page_size {
        config = config.with_page_size(page_size);
    }

    let mut coordinator = PageCoordinator::with_thread_pool(ContactSheetSurface::new(), config)?;
    let column = coordinator.open_dataset(&path)?;
    settings.record_opened_file(&path);
    if let Err(e) = store.save(&settings) {
        log::warn!("{}", e);
    }

    if let Some(query) = &options.search {
        coordinator.search(query);
    }
    if options.sort != SortCriterion::None && !coordinator.sort(options.sort) {
        eprintln!("Sort {} could not be applied, keeping the current order", options.sort);
    }
    if options.page != coordinator.current_page() && !coordinator.go_to_page(options.page) {
        eprintln!(
            "Page {} is out of range (1..={}), showing page {}",
            options.page,
            coordinator.total_pages(),
            coordinator.current_page()
        );
    }
    coordinator.wait_until_idle();

    let view_len = coordinator.view().map(|v| v.len()).unwrap_or(0);
    let query_note = match coordinator.view().map(|v| v.query()) {
        Some(query) if !query.is_empty() => format!(" matching '{}'", query),
        _ => String::new(),
    };
    println!(
        "{}: column '{}' ({}), {} rows{}, page {}/{}",
        path.display(),
        column.name,
        column.mode,
        view_len,
        query_note,
        coordinator.current_page(),
        coordinator.total_pages()
    );
    for placement in coordinator.surface().placements() {
        let status = match placement.bitmap.placeholder_kind() {
            Some(kind) => kind.to_string(),
            None => format!("{}x{}", placement.bitmap.width(), placement.bitmap.height()),
        };
        println!(
            "[{},{}] {} {}",
            placement.position.row, placement.position.column, status, placement.tooltip
        );
    }

    if let Some(output) = &options.output {
        coordinator.surface().save(output, config.columns_per_row)?;
        info!("Contact sheet written to {}", output.display());
    }
    Ok(())
}
