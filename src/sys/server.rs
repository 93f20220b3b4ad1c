use crate::events::AppEvent;
use async_channel::Sender;
use carousel::{RemoteCommand, SOCKET_PATH};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::net::UnixListener;

pub async fn run_server(tx: Sender<AppEvent>) {
    if fs_err::metadata(SOCKET_PATH).is_ok() {
        let _ = fs_err::remove_file(SOCKET_PATH);
    }

    let listener = match UnixListener::bind(SOCKET_PATH) {
        Ok(l) => l,
        Err(e) => {
            log::error!("Failed to bind unix socket {}: {}", SOCKET_PATH, e);
            return;
        }
    };
    log::info!("Listening on {}", SOCKET_PATH);

    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                let tx = tx.clone();
                tokio::spawn(async move {
                    forward_commands(BufReader::new(stream), tx).await;
                });
            }
            Err(e) => {
                log::error!("Failed to accept connection: {}", e);
            }
        }
    }
}

/// Parses one command per line until the peer hangs up or the UI is gone.
async fn forward_commands<R>(reader: R, tx: Sender<AppEvent>)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();

    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<RemoteCommand>() {
            Ok(command) => {
                log::debug!("Remote command: {}", command);
                if tx.send(AppEvent::Command(command)).await.is_err() {
                    break;
                }
            }
            Err(e) => log::warn!("Ignoring control message {:?}: {}", line, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_forward_commands_skips_garbage() {
        let (tx, rx) = async_channel::unbounded();
        let input: &[u8] = b"next\n\nbogus\ngoto 2\nprev\n";

        forward_commands(input, tx).await;

        let mut received = Vec::new();
        while let Ok(AppEvent::Command(c)) = rx.try_recv() {
            received.push(c);
        }
        assert_eq!(
            received,
            vec![
                RemoteCommand::Next,
                RemoteCommand::Goto(2),
                RemoteCommand::Previous
            ]
        );
    }

    #[tokio::test]
    async fn test_forward_commands_stops_when_ui_closed() {
        let (tx, rx) = async_channel::unbounded();
        drop(rx);
        let input: &[u8] = b"next\nnext\n";
        forward_commands(input, tx).await;
    }
}
