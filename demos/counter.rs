//! # Demo: counter
//!
//! Two buttons feed one emissions stream; the guest counts clicks up and down until the
//! last window closes.
//!
//! Shows how to:
//! - Fan several [`Signal`]s into one stream with [`open_emissions`].
//! - Tell firings apart with [`Emission::is_from`](loopbridge::Emission::is_from).
//! - End a run cleanly by closing the last window.
//!
//! ## Flow
//! ```text
//! user script (guest task) ── emit ──► increment / decrement
//!                                            │
//!                              open_emissions(&[decrement, increment])
//!                                            ▼
//!                              main: recv() ─► count ± 1 ─► label
//! close_last_window() ─► runner scope cancelled ─► Outcome::Cancelled
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example counter
//! ```

use std::sync::Arc;
use std::time::Duration;

use loopbridge::{
    BridgeError, Capacity, EventLoop, LogWriter, Resolved, Runner, Signal, Subscribe,
    open_emissions, sleep, spawn,
};
use tracing_subscriber::EnvFilter;

/// The window's widgets, reduced to what the demo observes.
#[derive(Clone)]
struct Window {
    increment: Signal<()>,
    decrement: Signal<()>,
    label: Signal<i64>,
}

impl Window {
    fn build() -> Self {
        Self {
            increment: Signal::new("increment.clicked"),
            decrement: Signal::new("decrement.clicked"),
            label: Signal::new("label.text_changed"),
        }
    }
}

/// Plays the user: a few clicks, then closes the window.
async fn user(window: Window, host: Arc<EventLoop>) {
    let clicks = [
        &window.increment,
        &window.increment,
        &window.decrement,
        &window.increment,
    ];
    for button in clicks {
        sleep(Duration::from_millis(100)).await;
        tracing::info!(button = button.name(), "click");
        button.emit(());
    }
    sleep(Duration::from_millis(100)).await;
    host.close_last_window();
}

async fn count(window: Window) -> Result<i64, BridgeError> {
    let mut emissions = open_emissions(
        &[window.decrement.clone(), window.increment.clone()],
        Capacity::Unbounded,
    );

    let mut count = 0;
    while let Some(emission) = emissions.recv().await {
        if emission.is_from(&window.decrement) {
            count -= 1;
        } else if emission.is_from(&window.increment) {
            count += 1;
        }
        window.label.emit(count);
    }
    Ok(count)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let host = EventLoop::arc();
    host.set_quit_on_last_window_closed(true);

    let window = Window::build();
    let _label = window
        .label
        .connect(|count| println!("label: {count}"));

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let runner = Runner::builder(host.clone()).with_subscribers(subs).build();

    let script_host = Arc::clone(&host);
    let outcomes = runner.run(async move {
        let _user = spawn(user(window.clone(), script_host));
        count(window).await
    })?;

    match outcomes.unwrap()? {
        Resolved::Cancelled => println!("window closed"),
        resolved => println!("finished: {resolved:?}"),
    }
    Ok(())
}
