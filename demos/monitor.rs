use oso_hotwater::{MessageLogMode, Session};
use std::env;

#[tokio::main]
async fn main() -> oso_hotwater::Result<()> {
    tracing_subscriber::fmt::init();

    let key = env::var("OSO_SUBSCRIPTION_KEY").expect("set OSO_SUBSCRIPTION_KEY");
    let args: Vec<String> = env::args().collect();
    let log_path = args.iter().position(|a| a == "--log").and_then(|i| args.get(i + 1));

    let mut builder = Session::builder(key);
    if let Some(path) = log_path {
        builder = builder.message_log(MessageLogMode::Diffed, path);
    }
    let session = builder.build()?;

    println!("Connecting to OSO cloud...");
    let entities = session.start(None).await?;
    println!("Found {} water heater(s). Polling for updates...", entities.water_heater.len());

    loop {
        if let Err(e) = session.refresh().await {
            eprintln!("Refresh error: {e}");
            return Err(e);
        }
        for id in session.snapshot().device_ids() {
            if let Some(status) = session.water_heater(id) {
                println!(
                    "[{}] {:.1}\u{00b0}C -> {:.1}\u{00b0}C | {} | mode: {} | {}",
                    status.device_name,
                    status.attributes.current_temperature,
                    status.target_temperature,
                    status.current_operation,
                    status.attributes.heater_mode,
                    if status.online { "online" } else { "OFFLINE" },
                );
            }
        }
        tokio::time::sleep(session.scan_interval()).await;
    }
}
