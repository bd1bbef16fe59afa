pub mod app;
pub mod assets;
pub mod game;
pub mod input;
pub mod io;
pub mod renderer;
pub mod settings;

use app::App;
use settings::RenderSettings;
use winit::event_loop::EventLoop;

fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init();
}

pub fn run() -> Result<(), String> {
    init_logging();

    log::info!("Starting wgpu sprite renderer");

    let settings = RenderSettings::load();
    let event_loop =
        EventLoop::new().map_err(|err| format!("Failed to create event loop: {}", err))?;
    let mut app = App::new(settings);

    event_loop
        .run_app(&mut app)
        .map_err(|err| format!("Event loop error: {}", err))?;

    log::info!("Application shutdown complete");
    Ok(())
}
