use anyhow::Result;
use std::{env, fs, path::PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use vahanscraper::{
    browser::Session,
    extract::CellPolicy,
    navigate, pipeline,
    store::FactStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    std::panic::set_hook(Box::new(|info| {
        eprintln!("panic: {:?}", info);
    }));

    // ─── 2) configure ────────────────────────────────────────────────
    let data_dir = PathBuf::from(env::var("VAHAN_DATA_DIR").unwrap_or_else(|_| "data".into()));
    let headless = env::var("VAHAN_HEADLESS").map(|v| v != "0").unwrap_or(true);
    fs::create_dir_all(&data_dir)?;

    let vehicle_store = FactStore::new(data_dir.join(pipeline::VEHICLE_FACTS), "Category");
    let maker_store = FactStore::new(data_dir.join(pipeline::MANUFACTURER_FACTS), "Manufacturer");

    // ─── 3) launch browser & open dashboard ──────────────────────────
    let session = Session::launch(headless).await?;
    session.goto(navigate::DASHBOARD_URL).await?;
    info!(url = navigate::DASHBOARD_URL, "dashboard loaded");

    // ─── 4) vehicle-type pipeline ────────────────────────────────────
    pipeline::run_vehicle_pipeline(
        session.page(),
        &vehicle_store,
        pipeline::YEARS,
        CellPolicy::CoerceZero,
    )
    .await?;

    // ─── 5) manufacturer pipeline ────────────────────────────────────
    pipeline::run_manufacturer_pipeline(
        session.page(),
        &maker_store,
        pipeline::YEARS,
        CellPolicy::CoerceZero,
    )
    .await?;

    // ─── 6) shut down ────────────────────────────────────────────────
    session.close().await?;
    info!("all done");
    Ok(())
}
