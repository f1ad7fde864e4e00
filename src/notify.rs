use log::{error, info};

/// Message shown after a bulk action settles.
pub const SETTLED_MESSAGE: &str = "Transactions completed successfully!";

/// Sink for operator-facing messages.
///
/// `alert` is the blocking, must-acknowledge channel used for failures,
/// `success` the transient banner shown after a settled batch and `info`
/// a neutral hint (for example where to install a wallet).
pub trait Notifier: Send + Sync {
    fn alert(&self, message: &str);
    fn success(&self, message: &str);
    fn info(&self, message: &str);
}

/// Writes notifications to the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn alert(&self, message: &str) {
        error!("alert: {}", message);
        eprintln!("!! {}", message);
    }

    fn success(&self, message: &str) {
        info!("{}", message);
        println!("✔ {}", message);
    }

    fn info(&self, message: &str) {
        info!("{}", message);
        println!("{}", message);
    }
}
