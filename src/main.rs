// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

mod args;

use args::Args;
use clap::Parser;
use edge_viewer::{
    bridge::NativeBridge,
    image::encode_png,
    session::ProcessingMode,
    stats::{FpsMeter, FrameMetadata},
};
use std::{
    error::Error,
    fs,
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::{Duration, Instant},
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Submits `args.frames` frames from one capture thread and returns the last
/// non-empty output.
fn capture_loop(bridge: &NativeBridge, frame: &[u8], args: &Args, id: usize) -> Option<Vec<u8>> {
    let (width, height) = (args.width(), args.height());
    let period_ns = 1_000_000_000 / i64::from(args.fps.max(1));
    let mut meter = FpsMeter::default();
    let mut last = None;

    for n in 0..args.frames {
        // Capture clocks start at an arbitrary positive epoch.
        let timestamp_ns = 1_000_000_000 + i64::from(n) * period_ns;

        bridge.ensure_configured(width, height);
        let now = Instant::now();
        let rgba = bridge.process_frame(Some(frame), width, height, timestamp_ns);
        let process_time = now.elapsed();
        let fps = meter.update(timestamp_ns);

        if rgba.is_empty() {
            warn!("thread {} frame {}: no output for {}x{}", id, n, width, height);
            continue;
        }

        debug!(
            "thread {} frame {} size: {}KB process: {:?} fps: {:.1}",
            id,
            n,
            rgba.len() / 1024,
            process_time,
            fps
        );

        if args.stats {
            let meta = FrameMetadata {
                fps,
                width,
                height,
                mode: bridge.session().mode(),
            };
            println!("{}", meta.to_json());
        }
        last = Some(rgba);
    }

    info!("thread {} done, average {:.1} fps", id, meter.average());
    last
}

/// Flips the processing mode on a fixed cadence, standing in for the host's
/// UI thread.
fn toggle_loop(bridge: &NativeBridge, every: u32, fps: u32, done: &AtomicBool) {
    let interval = Duration::from_secs_f64(f64::from(every) / f64::from(fps.max(1)));
    while !done.load(Ordering::Relaxed) {
        thread::sleep(interval);
        let mode = bridge.session().toggle_mode();
        info!("mode switched to {}", mode);
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let frame = match &args.input {
        Some(path) => fs::read(path)?,
        None => args.pattern.render(args.width(), args.height()),
    };
    info!(
        "edge viewer {}x{} frame: {} bytes mode: {:?}",
        args.width(),
        args.height(),
        frame.len(),
        args.mode
    );

    let bridge = NativeBridge::new();
    bridge.set_mode(ProcessingMode::from(args.mode).is_edge());

    let done = AtomicBool::new(false);
    let outputs: Vec<Option<Vec<u8>>> = thread::scope(|s| {
        let (bridge, frame, args, done) = (&bridge, &frame, &args, &done);

        let toggler = args
            .toggle_every
            .filter(|&every| every > 0)
            .map(|every| s.spawn(move || toggle_loop(bridge, every, args.fps, done)));

        let workers: Vec<_> = (0..args.threads.max(1))
            .map(|id| s.spawn(move || capture_loop(bridge, frame, args, id)))
            .collect();

        let outputs: Vec<Option<Vec<u8>>> = workers
            .into_iter()
            .map(|w| w.join().unwrap_or_default())
            .collect();

        done.store(true, Ordering::Relaxed);
        if let Some(toggler) = toggler {
            let _ = toggler.join();
        }
        outputs
    });

    let last = outputs.into_iter().flatten().last();
    match (&args.output, last) {
        (Some(path), Some(rgba)) => {
            let png = encode_png(&rgba, args.width() as u32, args.height() as u32)?;
            fs::write(path, &png)?;
            info!("saved {} ({} bytes)", path.display(), png.len());
        }
        (Some(path), None) => warn!("no frame produced, {} not written", path.display()),
        (None, _) => {}
    }

    bridge.release();
    Ok(())
}
