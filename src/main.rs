use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use motor_link::{
    scan_devices, BlinkUsb, DeviceConfig, DeviceError, EncoderUsb, FirmwareVariant, USB_PID,
    USB_VID,
};

const POLL_INTERVAL_MS: u64 = 200;

fn main() {
    #[cfg(feature = "logging")]
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let variant = match args.next().map(|s| s.parse::<FirmwareVariant>()) {
        None => FirmwareVariant::Encoder,
        Some(Ok(v)) => v,
        Some(Err(e)) => {
            eprintln!("{}", e);
            eprintln!("Usage: motor-link [blink|encoder] [duty]");
            return;
        }
    };
    let duty = args.next().unwrap_or_else(|| "1000".to_string());

    println!("Scanning for USB devices...");
    let devices = scan_devices();
    println!("Found {} devices:", devices.len());
    for (i, info) in devices.iter().enumerate() {
        let marker = if info.matches(USB_VID, USB_PID) { "<-- motor board" } else { "" };
        println!("  [{}] {} {}", i, info, marker);
    }

    let config = DeviceConfig::default();
    let result = match variant {
        FirmwareVariant::Blink => run_blink(&config, &duty),
        FirmwareVariant::Encoder => run_encoder(&config, &duty),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        if let DeviceError::DeviceNotFound(..) = e {
            println!("\nNote: On Windows, you may need to install a libusb driver");
            println!("using Zadig (https://zadig.akeo.ie/)");
        }
    }
}

fn run_blink(config: &DeviceConfig, duty: &str) -> Result<(), DeviceError> {
    let mut board = BlinkUsb::open_with(config)?;
    println!("Connected ({} firmware)", FirmwareVariant::Blink);

    board.toggle_led1()?;
    board.set_duty(duty)?;
    println!("Duty readback: {}", board.get_duty()?);

    board.close();
    println!("Disconnected!");
    Ok(())
}

fn run_encoder(config: &DeviceConfig, duty: &str) -> Result<(), DeviceError> {
    let mut board = EncoderUsb::open_with(config)?;
    println!("Connected ({} firmware)", FirmwareVariant::Encoder);

    board.toggle_led1()?;
    board.set_duty_f(duty)?;
    board.set_duty_r(0)?;
    println!(
        "Duty readback: forward={}, reverse={}",
        board.get_duty_f()?,
        board.get_duty_r()?
    );

    let running = Arc::new(AtomicBool::new(true));
    #[cfg(feature = "ctrlc")]
    {
        let running_clone = running.clone();
        if let Err(e) = ctrlc::set_handler(move || running_clone.store(false, Ordering::SeqCst)) {
            eprintln!("Failed to set Ctrl+C handler: {}", e);
        }
        println!("Polling sensors, press Ctrl+C to stop");
    }
    #[cfg(not(feature = "ctrlc"))]
    let mut remaining = 10;

    while running.load(Ordering::SeqCst) {
        // 单次读失败不终止轮询
        match (board.get_angle(), board.get_angle_speed(), board.get_current()) {
            (Ok(angle), Ok(speed), Ok(current)) => println!(
                "angle={:?} ({:.1} deg), speed={:?}, current={:?}",
                angle.as_bytes(),
                angle.angle_degrees().unwrap_or_default(),
                speed.as_bytes(),
                current.as_bytes()
            ),
            (angle, speed, current) => {
                for e in [angle.err(), speed.err(), current.err()].into_iter().flatten() {
                    eprintln!("Read failed: {}", e);
                }
            }
        }

        #[cfg(not(feature = "ctrlc"))]
        {
            remaining -= 1;
            if remaining == 0 {
                running.store(false, Ordering::SeqCst);
            }
        }
        thread::sleep(Duration::from_millis(POLL_INTERVAL_MS));
    }

    board.set_duty_f(0)?;
    board.close();
    println!("Disconnected!");
    Ok(())
}
