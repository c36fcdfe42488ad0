//! List all connected NOLO CV1 devices.

fn main() {
    env_logger::init();

    let mut driver = match nolo::Driver::new() {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match driver.device_list() {
        Ok(devices) => {
            println!("Found {} NOLO device(s):", devices.len());
            for (i, dev) in devices.iter().enumerate() {
                println!(
                    "  [{}] {} {} (rev {})  driver={}  path={}",
                    i, dev.vendor, dev.product, dev.revision, dev.driver, dev.path
                );
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
