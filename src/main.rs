mod app;

use app::ProblemTrackerApp;
use clap::Parser;
use problem_tracker::config::Config;
use problem_tracker::database::db::open_database;
use tracing_subscriber::EnvFilter;

fn main() -> eframe::Result<()> {
    let config = Config::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let conn = match open_database(&config.db) {
        Ok(conn) => conn,
        Err(e) => {
            tracing::error!("Failed to open database {}: {}", config.db.display(), e);
            std::process::exit(1);
        }
    };

    let review_date = config.review_date_or_today();
    tracing::info!(%review_date, "starting problem tracker");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([900.0, 700.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Problem Tracker",
        options,
        Box::new(move |_cc| Ok(Box::new(ProblemTrackerApp::new(conn, review_date)))),
    )
}
