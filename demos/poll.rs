//! Poll the first NOLO CV1 at ~60 Hz and print the HMD pose.
//!
//! Usage: cargo run --example poll
//! Press Ctrl+C to stop.

use nolo::FloatKind;
use std::time::{Duration, Instant};

fn main() {
    env_logger::init();

    let mut driver = match nolo::Driver::new() {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Failed to init driver: {}", e);
            std::process::exit(1);
        }
    };

    let mut device = match driver.open_first() {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Failed to open device: {}", e);
            std::process::exit(1);
        }
    };

    println!("Polling {} (Ctrl+C to stop)...", device.path());

    let frame = Duration::from_millis(16);
    let start = Instant::now();
    let mut frames: u64 = 0;
    let mut reports: u64 = 0;

    loop {
        match device.poll() {
            Ok(n) => reports += n as u64,
            Err(e) => eprintln!("Read error: {}", e),
        }
        frames += 1;

        // Print every ~60th frame to avoid flooding the terminal
        if frames % 60 == 1 {
            let rot = device.getf(FloatKind::RotationQuat);
            let pos = device.getf(FloatKind::PositionVector);
            if let (Ok(rot), Ok(pos)) = (rot, pos) {
                let (r, p) = (rot.as_slice(), pos.as_slice());
                println!(
                    "pos=[{:+.4}, {:+.4}, {:+.4}]  quat=[{:+.3}, {:+.3}, {:+.3}, {:+.3}]  base={:?}",
                    p[0], p[1], p[2], r[0], r[1], r[2], r[3],
                    device.base_station().map(|b| b.battery),
                );
            }
            let elapsed = start.elapsed().as_secs_f64();
            println!("--- {} reports in {:.1}s ({:.1} Hz) ---", reports, elapsed, reports as f64 / elapsed);
        }

        std::thread::sleep(frame);
    }
}
