mod app;
mod simulate;
mod store;

pub use app::App;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let app = App::new()?;
    app.run()?;

    Ok(())
}
