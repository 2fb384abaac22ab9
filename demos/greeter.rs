//! # Demo: greeter
//!
//! An input dialog flow: ask for a name, then show a greeting. Rejecting the dialog ends
//! the run with `UserCancelled`.
//!
//! Shows how to:
//! - Await a single firing with [`wait_signal`].
//! - Arm a [`SignalWaiter`] before the dialog is shown so no firing is missed.
//! - Race two signals with `tokio::select!` inside a guest task.
//!
//! ## Flow
//! ```text
//! main ─► show dialog ─► select {
//!            accepted(name) ─► "Hello {name}" ─► message box ─► wait(ok) ─► Ok(greeting)
//!            rejected       ─► Err(UserCancelled)
//!         }
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example greeter
//! RUST_LOG=info cargo run --example greeter -- --reject
//! ```

use std::sync::Arc;
use std::time::Duration;

use loopbridge::{
    BridgeError, Connection, EventLoop, LogWriter, Runner, RunnerConfig, Signal, SignalWaiter,
    Subscribe, sleep, spawn, wait_signal,
};
use tracing_subscriber::EnvFilter;

/// Text input dialog.
#[derive(Clone)]
struct InputDialog {
    shown: Signal<&'static str>,
    accepted: Signal<String>,
    rejected: Signal<()>,
}

/// Message box with a single button.
#[derive(Clone)]
struct MessageBox {
    shown: Signal<String>,
    ok: Signal<()>,
}

impl InputDialog {
    fn new() -> Self {
        Self {
            shown: Signal::new("input.shown"),
            accepted: Signal::new("input.accepted"),
            rejected: Signal::new("input.rejected"),
        }
    }

    async fn ask(&self, prompt: &'static str) -> Result<String, BridgeError> {
        let rejected = SignalWaiter::new(&self.rejected);
        self.shown.emit(prompt);

        tokio::select! {
            biased;
            _ = rejected.wait() => Err(BridgeError::UserCancelled),
            name = wait_signal(&self.accepted) => name,
        }
    }
}

impl MessageBox {
    fn new() -> Self {
        Self {
            shown: Signal::new("message.shown"),
            ok: Signal::new("message.ok"),
        }
    }

    async fn show(&self, text: String) -> Result<(), BridgeError> {
        let ok = SignalWaiter::new(&self.ok);
        self.shown.emit(text);
        ok.wait().await;
        Ok(())
    }
}

/// Plays the user: types a name (or rejects), then acknowledges the greeting.
fn simulate_user(input: &InputDialog, message: &MessageBox, reject: bool) -> Vec<Connection> {
    let (accepted, rejected) = (input.accepted.clone(), input.rejected.clone());
    let on_input = input.shown.connect(move |prompt| {
        println!("dialog: {prompt}");
        let (accepted, rejected) = (accepted.clone(), rejected.clone());
        drop(spawn(async move {
            sleep(Duration::from_millis(200)).await;
            if reject {
                rejected.emit(());
            } else {
                accepted.emit("Ferris".to_owned());
            }
        }));
    });

    let ok = message.ok.clone();
    let on_message = message.shown.connect(move |text| {
        println!("message box: {text}");
        let ok = ok.clone();
        drop(spawn(async move {
            sleep(Duration::from_millis(200)).await;
            ok.emit(());
        }));
    });

    vec![on_input, on_message]
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let reject = std::env::args().any(|arg| arg == "--reject");

    let input = InputDialog::new();
    let message = MessageBox::new();
    let _user = simulate_user(&input, &message, reject);

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let runner = Runner::builder(EventLoop::arc())
        .config(RunnerConfig {
            timeout: Duration::from_secs(10),
            ..RunnerConfig::default()
        })
        .with_subscribers(subs)
        .build();

    let outcomes = runner.run(async move {
        let name = input.ask("What is your name?").await?;
        let greeting = format!("Hello {name}, welcome to the team!");
        message.show(greeting.clone()).await?;
        Ok(greeting)
    })?;

    match outcomes.unwrap() {
        Ok(resolved) => println!("done: {resolved:?}"),
        Err(BridgeError::UserCancelled) => println!("dialog rejected"),
        Err(err) => return Err(err.into()),
    }
    Ok(())
}
