use anyhow::{bail, Context, Result};
use log::{debug, error, info, warn};
use sertail_core::{
    RenderOptions, SerialConfig, SerialEvent, SerialService, TextEncoding, Transcript,
};

mod settings;

fn main() -> Result<()> {
    simplelog::SimpleLogger::init(simplelog::LevelFilter::Debug, simplelog::Config::default())
        .context("failed to initialize logger")?;

    let settings = settings::load();
    let cfg = SerialConfig {
        port_name: settings.port.clone(),
        baud_rate: settings.baud_rate,
        ..Default::default()
    };

    info!("opening {} at {} baud", cfg.port_name, cfg.baud_rate);
    let service = match SerialService::open(cfg) {
        Ok(service) => service,
        Err(e) => {
            let ports = SerialService::list_ports();
            if ports.is_empty() {
                error!("no serial ports present on this system");
            }
            for port in &ports {
                info!("available port: {} ({})", port.port_name, port.port_type);
            }
            return Err(e).context("failed to open serial port");
        }
    };

    let encoding: TextEncoding = settings.encoding.parse().unwrap_or_else(|_| {
        warn!("unknown encoding {:?}, using ISO-8859-1", settings.encoding);
        TextEncoding::default()
    });
    let opts = RenderOptions {
        show_timestamp: settings.show_timestamp,
        show_hex: settings.show_hex,
        encoding,
    };
    let mut transcript = Transcript::new(settings.max_entries);

    let mut failure = None;
    for event in service.events().iter() {
        match event {
            SerialEvent::Rx(data) => {
                debug!("rx {} bytes: {}", data.len(), hex::encode(&data));
                let entry = transcript.push(data);
                println!("{}", entry.render(&opts));
            }
            SerialEvent::Error(msg) => failure = Some(msg),
            SerialEvent::Closed => break,
        }
    }

    let stats = service.stats();
    info!("link closed after {} chunks ({} bytes)", stats.chunks, stats.bytes);

    if let Some(msg) = failure {
        bail!("serial link failed: {msg}");
    }
    Ok(())
}
