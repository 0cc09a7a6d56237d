// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Concurrent submit/drain load check.
//!
//! Submits `jobs` payloads from `concurrency` tasks, then drains the queue
//! with the same number of lease+ack workers. Every submitted id must come
//! back exactly once with the payload it was submitted with.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tokio::task::JoinSet;
use tw_core::{JobId, Payload};

use crate::client::{ClientError, QueueClient};
use crate::exit_error::ExitError;
use crate::output::{print_result, OutputFormat};

#[derive(Args, Debug, Clone)]
pub struct StressArgs {
    /// Total jobs to submit
    #[arg(long, default_value_t = 1000)]
    pub jobs: usize,
    /// Concurrent submitters (and drainers)
    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u16).range(1..))]
    pub concurrency: u16,
}

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct StressReport {
    pub submitted: usize,
    pub drained: usize,
    /// Ids handed out by more than one SUBMIT
    pub duplicate_ids: usize,
    /// Submitted ids never leased during the drain
    pub missing: usize,
    /// Leased jobs that were not part of this run
    pub foreign: usize,
    /// Leased payloads that differ from what was submitted under that id
    pub corrupted: usize,
    /// Leases of an id already delivered, plus ACKs the daemon refused
    pub redelivered: usize,
    pub submit_ms: u64,
    pub drain_ms: u64,
}

impl StressReport {
    pub fn is_clean(&self) -> bool {
        self.duplicate_ids == 0
            && self.missing == 0
            && self.corrupted == 0
            && self.redelivered == 0
            && self.drained == self.submitted + self.foreign
    }

    /// Account for one lease made during the drain.
    fn record_drained(
        &mut self,
        expected: &HashMap<JobId, Vec<u8>>,
        seen: &mut HashSet<JobId>,
        delivery: Delivery,
    ) {
        self.drained += 1;
        match expected.get(&delivery.id) {
            Some(sent) if **sent == *delivery.payload => {}
            Some(_) => self.corrupted += 1,
            None => self.foreign += 1,
        }
        if !seen.insert(delivery.id) {
            self.redelivered += 1;
        }
        if !delivery.acked {
            self.redelivered += 1;
        }
    }
}

/// One lease taken by a drainer and the outcome of its ACK.
struct Delivery {
    id: JobId,
    payload: Payload,
    acked: bool,
}

fn payload_for(worker: usize, seq: usize) -> Vec<u8> {
    format!("stress-{worker}-{seq}").into_bytes()
}

/// Split `total` across `workers` as evenly as possible.
fn share(total: usize, workers: usize, index: usize) -> usize {
    total / workers + usize::from(index < total % workers)
}

pub async fn run(args: &StressArgs, client: &QueueClient) -> Result<StressReport, ClientError> {
    let workers = usize::from(args.concurrency);
    let mut report = StressReport::default();

    let started = Instant::now();
    let mut submitters = JoinSet::new();
    for worker in 0..workers {
        let client = client.clone();
        let count = share(args.jobs, workers, worker);
        submitters.spawn(async move {
            let mut submitted = Vec::with_capacity(count);
            for seq in 0..count {
                let payload = payload_for(worker, seq);
                let id = client.submit(payload.clone()).await?;
                submitted.push((id, payload));
            }
            Ok::<_, ClientError>(submitted)
        });
    }

    let mut expected: HashMap<JobId, Vec<u8>> = HashMap::with_capacity(args.jobs);
    while let Some(joined) = submitters.join_next().await {
        for (id, payload) in joined?? {
            report.submitted += 1;
            if expected.insert(id, payload).is_some() {
                report.duplicate_ids += 1;
            }
        }
    }
    report.submit_ms = started.elapsed().as_millis() as u64;

    let started = Instant::now();
    let mut drainers = JoinSet::new();
    for _ in 0..workers {
        let client = client.clone();
        drainers.spawn(async move {
            let mut drained = Vec::new();
            while let Some((id, payload)) = client.lease().await? {
                let acked = client.ack(id).await?;
                drained.push(Delivery { id, payload, acked });
            }
            Ok::<_, ClientError>(drained)
        });
    }

    let mut seen = HashSet::with_capacity(expected.len());
    while let Some(joined) = drainers.join_next().await {
        for delivery in joined?? {
            report.record_drained(&expected, &mut seen, delivery);
        }
    }
    report.drain_ms = started.elapsed().as_millis() as u64;
    report.missing = expected.keys().filter(|id| !seen.contains(*id)).count();

    Ok(report)
}

pub async fn handle(args: StressArgs, client: &QueueClient, format: OutputFormat) -> Result<()> {
    let report = run(&args, client).await?;
    print_result(format, &report, |r| {
        format!(
            "Submitted {} jobs in {}ms, drained {} in {}ms\n\
             duplicate ids: {}, missing: {}, corrupted: {}, redelivered: {}, foreign: {}",
            r.submitted,
            r.submit_ms,
            r.drained,
            r.drain_ms,
            r.duplicate_ids,
            r.missing,
            r.corrupted,
            r.redelivered,
            r.foreign
        )
    })?;
    if !report.is_clean() {
        return Err(ExitError::rejected("stress run found inconsistent deliveries").into());
    }
    Ok(())
}

#[cfg(test)]
#[path = "stress_tests.rs"]
mod tests;
