//! Ctrl-C handling.
//!
//! Once tokio has seen a `ctrl_c()` listener it owns SIGINT for the rest of
//! the process, so every blocking point of the interactive flow has to watch
//! for the signal itself.

use std::future::Future;

use futures::stream::{self, BoxStream, StreamExt};

/// Exit status of a process killed by SIGINT.
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Resolves on the next Ctrl-C. Never resolves if the signal cannot be
/// watched.
pub async fn interrupted() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::warn!("Cannot listen for Ctrl-C: {}", err);
        std::future::pending::<()>().await;
    }
}

/// One item per Ctrl-C. The pending listener lives inside the stream, so a
/// press between two polls is not lost.
pub fn interrupts() -> BoxStream<'static, ()> {
    stream::unfold((), |()| async {
        interrupted().await;
        Some(((), ()))
    })
    .boxed()
}

/// Resolve `fut`, or `None` when `interrupt` fires first.
pub async fn until_interrupted<F, I>(fut: F, interrupt: I) -> Option<F::Output>
where
    F: Future,
    I: Future<Output = ()>,
{
    tokio::select! {
        biased;
        _ = interrupt => None,
        output = fut => Some(output),
    }
}

/// Await `fut`; Ctrl-C meanwhile ends the process like an unhandled SIGINT.
pub async fn or_exit<F: Future>(fut: F) -> F::Output {
    match until_interrupted(fut, interrupted()).await {
        Some(output) => output,
        None => {
            println!();
            log::debug!("Interrupted, exiting");
            std::process::exit(INTERRUPTED_EXIT_CODE)
        }
    }
}
