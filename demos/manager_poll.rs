//! Drive a simulated board through the manager.
//!
//! `RUST_LOG=inputkit=trace cargo run --example manager_poll`

use inputkit::backends::virtual_input::VirtualHal;
use inputkit::{DeviceManager, InputConfig, LogListener};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const BOARD: &str = r#"
[[button]]
id = "select"
pin = 14

[[encoder]]
id = "volume"
pin_a = 32
pin_b = 33
button = { pin = 25, debounce_ms = 20 }
"#;

fn main() -> inputkit::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut hal = VirtualHal::new(true);
    let mut io = DeviceManager::new();
    InputConfig::from_toml_str(BOARD)?.register(&mut io, &mut hal)?;
    io.set_global_callback(LogListener);

    if let Some(volume) = io.rotary_encoder_mut("volume") {
        volume.set_encoder_callback(|delta| println!("volume {delta:+}"));
        volume.set_button_callback(|pressed| println!("mute {}", if pressed { "on" } else { "off" }));
    }
    io.initialize();

    let clock = hal.clock_handle().clone();
    let (Some(select), Some(knob), Some(mute)) = (hal.pin(14), hal.counter(0), hal.pin(25)) else {
        return Ok(());
    };

    // 10 ms ticks: turn the knob, press select with some chatter, tap mute.
    for tick in 0..40u32 {
        match tick {
            2 | 3 | 4 => knob.rotate(2),
            6 => knob.rotate(-1),
            10 => select.set_level(false),
            11 => select.set_level(true),
            12 => select.set_level(false),
            20 => mute.set_level(false),
            25 => mute.set_level(true),
            30 => select.set_level(true),
            _ => {}
        }
        io.update();

        if let Some(button) = io.button_mut("select") {
            if button.was_pressed() {
                println!("select pressed");
            }
            if button.was_released() {
                println!("select released");
            }
        }
        io.clear_all_input_flags();
        clock.advance(Duration::from_millis(10));
    }

    println!("{}", io.snapshot().to_json()?);
    Ok(())
}
