use anyhow::{Context, Result};
use std::io::{self, BufRead};
use std::thread;
use tokio::sync::mpsc;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Sends one activation per line read from stdin. The channel closes on EOF.
pub fn stdin_activation() -> Result<mpsc::UnboundedReceiver<()>> {
    let (tx, rx) = mpsc::unbounded_channel();
    thread::Builder::new()
        .name("activation-stdin".into())
        .spawn(move || forward_lines(io::stdin().lock(), tx))
        .context("failed to spawn activation reader")?;
    Ok(rx)
}

fn forward_lines<R: BufRead>(reader: R, tx: mpsc::UnboundedSender<()>) {
    for line in reader.lines() {
        match line {
            Ok(_) => {
                if tx.send(()).is_err() {
                    return;
                }
            }
            Err(err) => {
                log_warn!("activation input failed: {err}");
                break;
            }
        }
    }
    log_info!("activation input closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn each_line_is_one_activation_and_eof_closes() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        forward_lines(Cursor::new("\n\nanything\n"), tx);

        let mut count = 0;
        while let Ok(()) = rx.try_recv() {
            count += 1;
        }
        assert_eq!(count, 3);
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }
}
