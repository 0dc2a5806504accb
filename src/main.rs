mod atoms;
mod config;
mod effect;
mod key_mapping;
mod keyboard;
mod launcher;
mod monitor;
mod registry;
mod state;
mod wm;
mod x11;

fn main() {
    env_logger::init();

    match wm::WindowManager::new() {
        Ok(mut wm) => {
            if let Err(e) = wm.run() {
                log::error!("Window manager runtime error: {e:?}");
                std::process::exit(1);
            }
        }
        Err(e) => {
            log::error!("Failed to initialize window manager: {e:?}");
            std::process::exit(1);
        }
    }
}
