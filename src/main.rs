use std::time::Duration;

use anyhow::{bail, Result};
use tracing_subscriber::EnvFilter;
use wifictl::devices::tp_link::wa901nd::Wa901nd;
use wifictl::Device;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [host, user, password] = args.as_slice() else {
        bail!("usage: wifictl <host> <user> <password>");
    };

    let mut device = Wa901nd::with_timeout(host.as_str(), Duration::from_secs(10));
    device.login(user, password)?;
    println!("Logged in to {host}");

    let status = device.wifi_status()?;
    println!(
        "wifi {}: ssid {:?}, channel {}",
        if status.enabled { "on" } else { "off" },
        status.ssid,
        status.channel
    );
    Ok(())
}
