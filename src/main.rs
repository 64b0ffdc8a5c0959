use log::error;
use log::info;
use log::warn;
use std::env;
use std::process;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use pktfeed::BatchBuffer;
use pktfeed::CaptureDriver;
use pktfeed::Config;
use pktfeed::Device;
use pktfeed::FlushTimer;
use pktfeed::Flusher;
use pktfeed::PktfeedError;
use pktfeed::PnetSource;
use pktfeed::Stats;
use pktfeed::TcpClient;
use pktfeed::logging;

fn load_config() -> (Config, Option<String>) {
    match Config::locate() {
        Some(path) => match Config::load(&path) {
            Ok(config) => (config, None),
            Err(e) => (
                Config::default(),
                Some(format!("failed to load {} ({}), using defaults", path.display(), e)),
            ),
        },
        None => (Config::default(), None),
    }
}

fn run() -> Result<(), PktfeedError> {
    let (mut config, config_warning) = load_config();
    logging::init(&config.log_level);
    if let Some(w) = config_warning {
        warn!("{}", w);
    }
    if let Some(device) = env::args().nth(1) {
        config.device = Some(device);
    }
    let device = match &config.device {
        Some(d) => d.clone(),
        None => {
            error!("usage: pktfeed <device>, available devices:");
            for d in Device::list() {
                let ips: Vec<String> = d.ips.iter().map(|ip| ip.to_string()).collect();
                error!("  {} [{}] {}", d.name, ips.join(", "), d.desc.unwrap_or_default());
            }
            return Err(PktfeedError::NoDeviceConfigured);
        }
    };

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            running.store(false, Ordering::SeqCst);
        }) {
            warn!("unable to install ctrl-c handler: {}", e);
        }
    }

    let mut source = PnetSource::open(&device, &config)?;

    let stats = Arc::new(Stats::new());
    let buffer = Arc::new(BatchBuffer::new(config.batch_size));
    let mut client = TcpClient::new(&config.host, config.port);
    client.connect_timeout(config.connect_timeout());
    client.write_timeout(config.write_timeout());
    let flusher = Arc::new(Flusher::new(buffer, Box::new(client), stats.clone()));
    let timer = FlushTimer::spawn(flusher.clone(), config.flush_interval())?;

    info!(
        "capturing packets in batches of {} to {}:{}",
        config.batch_size, config.host, config.port
    );
    let driver = CaptureDriver::new(flusher, stats.clone());
    let result = driver.run(&mut source, &running);

    timer.stop()?;
    info!("{}", stats.snapshot());
    result
}

fn main() {
    match run() {
        Ok(_) => (),
        Err(e) => {
            if e.is_capture_open_failure() {
                error!("error opening device: {}", e);
            } else {
                error!("{}", e);
            }
            process::exit(1);
        }
    }
}
