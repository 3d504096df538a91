// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use edge_viewer::{
    edge::{apply_edge_filter, EdgeConfig},
    image::{nv21_from_luma, nv21_to_rgba},
    session::{ProcessingMode, ProcessingSession},
};
use serial_test::serial;
use std::{sync::Arc, thread};

fn box_frame(width: usize, height: usize) -> Vec<u8> {
    nv21_from_luma(width, height, |x, y| {
        if x > width / 4 && x < width * 3 / 4 && y > height / 4 && y < height * 3 / 4 {
            220
        } else {
            30
        }
    })
}

fn nv21_len(width: usize, height: usize) -> usize {
    width * height + width.div_ceil(2) * 2 * height.div_ceil(2)
}

#[test]
fn test_valid_sizes() {
    let session = ProcessingSession::new();
    for &(w, h) in &[(1, 1), (2, 2), (3, 5), (16, 9), (64, 48), (320, 240)] {
        for edge in [true, false] {
            session.set_mode(edge);
            let frame = vec![100u8; nv21_len(w, h)];
            let out = session.process(&frame, w as i32, h as i32);
            assert_eq!(out.len(), w * h * 4, "{w}x{h} edge={edge}");
        }
    }
}

#[test]
fn test_invalid_input_is_empty() {
    let session = ProcessingSession::new();
    let frame = vec![100u8; nv21_len(16, 16)];
    for edge in [true, false] {
        session.set_mode(edge);
        assert!(session.process(&frame, 0, 16).is_empty());
        assert!(session.process(&frame, 16, 0).is_empty());
        assert!(session.process(&frame, -16, 16).is_empty());
        assert!(session.process(&frame, 16, i32::MIN).is_empty());
        assert!(session.process(&[], 16, 16).is_empty());
        // Too small for the claimed geometry.
        assert!(session.process(&frame, 32, 32).is_empty());
        assert!(session.process(&frame[..nv21_len(16, 16) - 1], 16, 16).is_empty());
    }
}

#[test]
fn test_passthrough_matches_conversion() {
    let session = ProcessingSession::new();
    session.set_mode(false);

    let frame = box_frame(64, 48);
    let out = session.process(&frame, 64, 48);
    assert_eq!(out, nv21_to_rgba(&frame, 64, 48));
}

#[test]
fn test_edge_mode_flat_field_is_black() {
    let session = ProcessingSession::new();
    session.set_mode(true);

    let frame = vec![128u8; nv21_len(64, 48)];
    let out = session.process(&frame, 64, 48);
    assert_eq!(out.len(), 64 * 48 * 4);
    assert!(out.chunks_exact(4).all(|px| px == [0, 0, 0, 255]));
}

#[test]
fn test_edge_mode_finds_box_outline() {
    let session = ProcessingSession::new();
    assert_eq!(session.mode(), ProcessingMode::Edge);

    let frame = box_frame(64, 48);
    let out = session.process(&frame, 64, 48);
    let rgba = nv21_to_rgba(&frame, 64, 48);
    assert_eq!(out, apply_edge_filter(&rgba, 64, 48, &EdgeConfig::default()));

    let white = out.chunks_exact(4).filter(|px| px[0] == 255).count();
    assert!(white > 0);
    // Centre of the box and the background corner are flat.
    assert_eq!(out[(24 * 64 + 32) * 4], 0);
    assert_eq!(out[0], 0);
}

#[test]
fn test_configure_is_advisory() {
    let session = ProcessingSession::new();
    session.configure(100, 100);
    session.set_mode(false);

    let frame = vec![128u8; 64 * 48 * 3 / 2];
    let out = session.process(&frame, 64, 48);
    assert_eq!(out.len(), 64 * 48 * 4);
    assert_eq!(session.configured_size(), (100, 100));
}

#[test]
fn test_mode_change_applies_to_next_frame() {
    let session = ProcessingSession::new();
    let frame = box_frame(32, 32);

    let edges = session.process(&frame, 32, 32);
    session.set_mode(false);
    let raw = session.process(&frame, 32, 32);
    session.set_mode(true);
    let edges_again = session.process(&frame, 32, 32);

    assert_ne!(edges, raw);
    assert_eq!(edges, edges_again);
}

fn is_valid_rgba(out: &[u8], width: usize, height: usize) -> bool {
    out.len() == width * height * 4 && out.chunks_exact(4).all(|px| px[3] == 255)
}

#[test]
#[serial]
fn test_concurrent_process() {
    let session = Arc::new(ProcessingSession::new());
    let frame = Arc::new(box_frame(96, 64));
    let expected = session.process(&frame, 96, 64);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let session = session.clone();
            let frame = frame.clone();
            thread::spawn(move || {
                (0..20)
                    .map(|_| session.process(&frame, 96, 64))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for handle in handles {
        for out in handle.join().unwrap() {
            assert!(is_valid_rgba(&out, 96, 64));
            assert_eq!(out, expected);
        }
    }
}

#[test]
#[serial]
fn test_concurrent_mode_toggle() {
    let session = Arc::new(ProcessingSession::new());
    let frame = Arc::new(box_frame(64, 48));

    session.set_mode(true);
    let edges = session.process(&frame, 64, 48);
    session.set_mode(false);
    let raw = session.process(&frame, 64, 48);

    let toggler = {
        let session = session.clone();
        thread::spawn(move || {
            for _ in 0..200 {
                session.toggle_mode();
                thread::yield_now();
            }
        })
    };

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let session = session.clone();
            let frame = frame.clone();
            thread::spawn(move || {
                (0..25)
                    .map(|_| session.process(&frame, 64, 48))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    toggler.join().unwrap();
    for worker in workers {
        for out in worker.join().unwrap() {
            // Each frame was produced entirely in one mode.
            assert!(is_valid_rgba(&out, 64, 48));
            assert!(out == edges || out == raw);
        }
    }
}

#[test]
#[serial]
fn test_concurrent_configure_and_invalid_frames() {
    let session = Arc::new(ProcessingSession::new());
    let frame = Arc::new(box_frame(32, 24));

    let handles: Vec<_> = (0..6)
        .map(|i| {
            let session = session.clone();
            let frame = frame.clone();
            thread::spawn(move || {
                for n in 0..30 {
                    session.configure(i * 10 + n, -n);
                    let out = if n % 3 == 0 {
                        session.process(&frame, 0, 24)
                    } else {
                        session.process(&frame, 32, 24)
                    };
                    if n % 3 == 0 {
                        assert!(out.is_empty());
                    } else {
                        assert!(is_valid_rgba(&out, 32, 24));
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    let (w, h) = session.configured_size();
    assert!((0..90).contains(&w));
    assert!(h <= 0);
}
