//! Moves bytes between a russh channel and the engine's shell pipe.

use log::{debug, trace, warn};
use russh::client::Msg;
use russh::{Channel, ChannelMsg, Sig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::channel::{ChannelControl, RemoteShell, Signal};

const PUMP_CHUNK_SIZE: usize = 4096;

fn to_sig(signal: Signal) -> Sig {
    match signal {
        Signal::Interrupt => Sig::INT,
    }
}

/// Run until either side closes.
///
/// Remote output (stdout and stderr) is written to the pipe, engine input is
/// forwarded as channel data, and control requests become SSH signals or a
/// channel close. The pipe is shut down on exit so the engine observes end
/// of stream.
pub(crate) async fn run(mut channel: Channel<Msg>, remote: RemoteShell) {
    let RemoteShell {
        stream,
        mut control,
    } = remote;
    let (mut from_engine, mut to_engine) = tokio::io::split(stream);
    let mut chunk = [0u8; PUMP_CHUNK_SIZE];
    let mut engine_writing = true;

    loop {
        tokio::select! {
            msg = channel.wait() => match msg {
                Some(ChannelMsg::Data { data }) | Some(ChannelMsg::ExtendedData { data, .. }) => {
                    trace!("pump: {} bytes from remote", data.len());
                    if to_engine.write_all(&data).await.is_err() {
                        break;
                    }
                }
                Some(ChannelMsg::ExitStatus { exit_status }) => {
                    debug!("remote shell exited with status {}", exit_status);
                }
                Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => break,
                Some(_) => {}
            },
            read = from_engine.read(&mut chunk), if engine_writing => match read {
                Ok(0) | Err(_) => engine_writing = false,
                Ok(n) => {
                    if let Err(e) = channel.data(&chunk[..n]).await {
                        warn!("failed to forward input to remote: {}", e);
                        break;
                    }
                }
            },
            request = control.recv() => match request {
                Some(ChannelControl::Signal(signal)) => {
                    if let Err(e) = channel.signal(to_sig(signal)).await {
                        warn!("failed to deliver {:?}: {}", signal, e);
                    }
                }
                Some(ChannelControl::Close) | None => break,
            },
        }
    }

    let _ = channel.eof().await;
    let _ = channel.close().await;
    let _ = to_engine.shutdown().await;
    debug!("shell pump stopped");
}
