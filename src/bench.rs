//! `fecprobe bench` — loss-simulation benchmark with structured JSON output.
//!
//! A sender thread encodes groups of random payloads and pushes them
//! through a simulated link (random drops, bounded reordering) into a
//! bounded channel. The receiving side — the single thread that owns the
//! group buffer — parses, reassembles, and pops decoded groups, recording
//! per-group decode latency. The run ends with a JSON report.

use anyhow::Result;
use crossbeam_channel::{bounded, Receiver, Sender};
use fec_transport::{
    clock, CodedPacket, GroupBuffer, GroupEncoder, InsertStatus, TransportMetrics,
    TransportMetricsSnapshot,
};
use serde::Serialize;
use std::path::PathBuf;

use crate::config::ProbeConfig;

#[derive(Debug, Serialize)]
pub struct BenchReport {
    pub generated_at: String,
    pub k: usize,
    pub n: usize,
    pub share_len: usize,
    pub loss_rate: f64,
    pub reorder_window: usize,
    pub groups_sent: u64,
    pub packets_sent: u64,
    pub packets_delivered: u64,
    pub groups_recovered: u64,
    pub groups_lost: u64,
    pub group_recovery_pct: f64,
    pub payload_bytes_recovered: u64,
    pub decode_latency_p50_us: Option<u64>,
    pub decode_latency_p95_us: Option<u64>,
    pub decode_latency_p99_us: Option<u64>,
    pub elapsed_ms: u64,
    pub transport: TransportMetricsSnapshot,
}

struct LinkStats {
    packets_sent: u64,
    packets_delivered: u64,
}

/// Sender side: encode groups, impair the stream, feed the channel.
fn run_sender(
    config: &ProbeConfig,
    groups: u64,
    rng: &mut fastrand::Rng,
    tx: Sender<Vec<u8>>,
) -> Result<LinkStats> {
    let mut encoder = GroupEncoder::new(config.k, config.n, config.share_len)?;
    let mut stats = LinkStats { packets_sent: 0, packets_delivered: 0 };

    // Reorder by shuffling within a window of packets before release.
    let mut window: Vec<Vec<u8>> = Vec::with_capacity(config.reorder_window);
    let flush = |window: &mut Vec<Vec<u8>>, rng: &mut fastrand::Rng, stats: &mut LinkStats| {
        for i in (1..window.len()).rev() {
            window.swap(i, rng.usize(0..=i));
        }
        for pkt in window.drain(..) {
            stats.packets_delivered += 1;
            if tx.send(pkt).is_err() {
                break;
            }
        }
    };

    let payload: Vec<Vec<u8>> = (0..config.k)
        .map(|_| (0..config.share_len).map(|_| rng.u8(..)).collect())
        .collect();
    let refs: Vec<&[u8]> = payload.iter().map(|r| r.as_slice()).collect();

    for _ in 0..groups {
        let packets = encoder.encode_group(&refs, clock::now_us_wire())?;
        for pkt in packets {
            stats.packets_sent += 1;
            if rng.f64() < config.loss_rate {
                continue; // lost in flight
            }
            window.push(pkt);
            if window.len() >= config.reorder_window {
                flush(&mut window, rng, &mut stats);
            }
        }
    }
    flush(&mut window, rng, &mut stats);

    Ok(stats)
}

/// Receiver side: the one thread that owns the group buffer.
fn run_receiver(
    config: &ProbeConfig,
    rx: Receiver<Vec<u8>>,
    metrics: std::sync::Arc<TransportMetrics>,
) -> Result<(u64, u64, Vec<u64>)> {
    let mut buffer = GroupBuffer::new(config.buffer_capacity, metrics)?;
    let mut groups_recovered = 0u64;
    let mut payload_bytes = 0u64;
    let mut latencies_us: Vec<u64> = Vec::new();

    // Hold a decoded front group until the window has moved this many
    // groups past it; popping immediately would let a reordered straggler
    // re-open its sequence number as a fresh, unfinishable group.
    let settle_groups = config.reorder_window.div_ceil(config.n) + 1;

    let mut drain = |buffer: &mut GroupBuffer, settle: usize| {
        while buffer.len() > settle && buffer.first().map(|g| g.is_decoded()).unwrap_or(false) {
            if let Some(group) = buffer.pop() {
                if let Some(rows) = group.data_rows() {
                    groups_recovered += 1;
                    payload_bytes += rows.iter().map(|r| r.len() as u64).sum::<u64>();
                    let age = clock::now_us_wire().wrapping_sub(group.tstamp());
                    latencies_us.push(age as u64);
                }
            }
        }
    };

    for datagram in rx.iter() {
        let pkt = match CodedPacket::parse(&datagram) {
            Ok(pkt) => pkt,
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed datagram");
                continue;
            }
        };
        loop {
            match buffer.insert(&pkt) {
                Ok(InsertStatus::DroppedOverflow) => {
                    // Window full: give up on the oldest group.
                    buffer.pop();
                    continue;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "packet rejected");
                }
            }
            break;
        }
        drain(&mut buffer, settle_groups);
    }

    // Stream over: drain what decoded, evict the rest.
    while !buffer.is_empty() {
        drain(&mut buffer, 0);
        if buffer.pop().is_none() && buffer.is_empty() {
            break;
        }
    }

    Ok((groups_recovered, payload_bytes, latencies_us))
}

fn percentile(sorted: &[u64], pct: usize) -> Option<u64> {
    if sorted.is_empty() {
        return None;
    }
    let n = sorted.len();
    Some(sorted[(n * pct / 100).min(n - 1)])
}

pub fn run(config: &ProbeConfig, groups: u64, output: Option<PathBuf>) -> Result<()> {
    config.validate()?;

    eprintln!(
        "fecprobe bench — {} groups of ({}, {}) × {}B through a {:.1}% lossy link...",
        groups,
        config.k,
        config.n,
        config.share_len,
        config.loss_rate * 100.0
    );

    let mut rng = match config.seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    };

    let metrics = TransportMetrics::new();
    let (tx, rx) = bounded::<Vec<u8>>(4096);

    let started = clock::now_us();

    let recv_metrics = metrics.clone();
    let recv_config = config.clone();
    let receiver = std::thread::Builder::new()
        .name("fec-recv".into())
        .spawn(move || run_receiver(&recv_config, rx, recv_metrics))?;

    let link = run_sender(config, groups, &mut rng, tx)?;
    let (groups_recovered, payload_bytes, mut latencies) = receiver
        .join()
        .map_err(|_| anyhow::anyhow!("receiver thread panicked"))??;

    let elapsed_ms = (clock::now_us() - started) / 1_000;
    latencies.sort_unstable();

    let report = BenchReport {
        generated_at: chrono::Utc::now().to_rfc3339(),
        k: config.k,
        n: config.n,
        share_len: config.share_len,
        loss_rate: config.loss_rate,
        reorder_window: config.reorder_window,
        groups_sent: groups,
        packets_sent: link.packets_sent,
        packets_delivered: link.packets_delivered,
        groups_recovered,
        groups_lost: groups.saturating_sub(groups_recovered),
        group_recovery_pct: if groups > 0 {
            groups_recovered as f64 / groups as f64 * 100.0
        } else {
            0.0
        },
        payload_bytes_recovered: payload_bytes,
        decode_latency_p50_us: percentile(&latencies, 50),
        decode_latency_p95_us: percentile(&latencies, 95),
        decode_latency_p99_us: percentile(&latencies, 99),
        elapsed_ms,
        transport: metrics.snapshot(),
    };

    let json = serde_json::to_string_pretty(&report)?;
    match output {
        Some(path) => {
            std::fs::write(&path, &json)?;
            eprintln!("Report written to {}", path.display());
        }
        None => println!("{json}"),
    }

    eprintln!();
    eprintln!("=== BENCH SUMMARY ===");
    eprintln!(
        "  groups {}/{} recovered ({:.2}%)  shares rebuilt={}  dup={}  stale={}  overflow={}",
        report.groups_recovered,
        report.groups_sent,
        report.group_recovery_pct,
        report.transport.shares_recovered,
        report.transport.packets_duplicate,
        report.transport.packets_stale,
        report.transport.packets_overflow,
    );
    if let Some(p50) = report.decode_latency_p50_us {
        eprintln!(
            "  decode latency µs: p50={}  p95={}  p99={}",
            p50,
            report.decode_latency_p95_us.unwrap_or(p50),
            report.decode_latency_p99_us.unwrap_or(p50),
        );
    }

    Ok(())
}
