use anyhow::Result;
use crossbeam_channel::{unbounded, RecvTimeoutError};
use pupil_shell::{
    config::AppConfig,
    host::{self, WebviewMessage},
    init_debug_log_file, log_debug, log_file_path, App,
};
use std::io::{self, Write};
use std::time::{Duration, Instant};

fn main() -> Result<()> {
    let config = AppConfig::parse_args()?;
    init_debug_log_file();
    log_debug("=== Pupil shell session started ===");
    log_debug(&format!("Log file: {:?}", log_file_path()));

    let (inbound_tx, inbound_rx) = unbounded();
    let reader = host::spawn_stdin_reader(inbound_tx);
    let (outbound_tx, outbound_rx) = unbounded();

    let poll_interval = Duration::from_millis(config.poll_ms);
    let log_timings = config.log_timings;
    let mut app = App::new(config, outbound_tx);

    let mut stdout = io::stdout().lock();
    host::write_message(&mut stdout, &WebviewMessage::Ready)?;

    // One message or one timer tick per iteration; the session owns all state.
    loop {
        match inbound_rx.recv_timeout(poll_interval) {
            Ok(message) => {
                let started = Instant::now();
                app.handle_message(message, started);
                if log_timings {
                    log_debug(&format!(
                        "main: message handled in {:?}",
                        started.elapsed()
                    ));
                }
            }
            Err(RecvTimeoutError::Timeout) => app.tick(Instant::now()),
            Err(RecvTimeoutError::Disconnected) => break,
        }
        while let Ok(message) = outbound_rx.try_recv() {
            host::write_message(&mut stdout, &message)?;
        }
    }

    // stdin closed: flush whatever the last message produced before exiting
    drop(app);
    while let Ok(message) = outbound_rx.try_recv() {
        host::write_message(&mut stdout, &message)?;
    }
    stdout.flush()?;
    let _ = reader.join();
    log_debug("=== Pupil shell session exiting ===");
    Ok(())
}
