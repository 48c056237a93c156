//! Structural verification of built tables
//!
//! Checks the invariants a correct build guarantees:
//!
//! - every non-empty slot points inside the data file
//! - records do not overlap and together cover the data file exactly
//! - every stored key decodes and appears only once
//! - every key is found along its own probe sequence before an empty slot
//! - the slot count is prime, so probe sequences cover the whole table

use crate::capacity::is_prime;
use crate::key::{KeyKind, StoredKey};
use crate::layout::Slot;
use crate::probe::ProbeSequence;
use crate::table::MappedTable;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Problems found after this many are counted but not listed.
const MAX_LISTED_PROBLEMS: usize = 100;

/// Result of inspecting a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableReport {
    /// Number of slots
    pub modulus: u64,
    /// Slots holding a record
    pub occupied: u64,
    /// `occupied / modulus`
    pub load_factor: f64,
    /// Size of the data file
    pub data_bytes: u64,
    /// Probes needed to reach each key, mapped to how many keys needed it
    pub probe_lengths: BTreeMap<u64, u64>,
    /// Total number of problems found
    pub problem_count: usize,
    /// Descriptions of the first problems found
    pub problems: Vec<String>,
}

impl TableReport {
    /// Returns `true` when no problems were found.
    pub const fn is_ok(&self) -> bool {
        self.problem_count == 0
    }

    /// Average number of probes per stored key.
    pub fn mean_probe_length(&self) -> f64 {
        let (total, keys) = self
            .probe_lengths
            .iter()
            .fold((0u64, 0u64), |(total, keys), (&len, &count)| {
                (total + len * count, keys + count)
            });
        if keys == 0 {
            0.0
        } else {
            total as f64 / keys as f64
        }
    }

    fn problem(&mut self, message: String) {
        self.problem_count += 1;
        if self.problems.len() < MAX_LISTED_PROBLEMS {
            warn!("{}", message);
            self.problems.push(message);
        }
    }
}

/// Walk every slot of `table` and check it against the build invariants.
pub fn inspect(table: &MappedTable, kind: KeyKind) -> TableReport {
    let modulus = table.modulus();
    let data_bytes = table.data_len();
    let mut report = TableReport {
        modulus,
        occupied: 0,
        load_factor: 0.0,
        data_bytes,
        probe_lengths: BTreeMap::new(),
        problem_count: 0,
        problems: Vec::new(),
    };

    if !is_prime(modulus) {
        report.problem(format!(
            "slot count {modulus} is not prime, probe sequences do not cover every slot"
        ));
    }

    let mut ranges: Vec<Slot> = Vec::new();
    let mut seen: HashMap<StoredKey<'_>, u64> = HashMap::new();

    for (slot_index, slot) in table.occupied() {
        report.occupied += 1;

        let record = match table.record(slot) {
            Ok(record) => record,
            Err(e) => {
                report.problem(format!("slot {slot_index}: {e}"));
                continue;
            }
        };
        ranges.push(slot);

        let key = match kind.parse(record) {
            Ok((key, _)) => key,
            Err(e) => {
                report.problem(format!("slot {slot_index}: undecodable key: {e}"));
                continue;
            }
        };

        if let Some(first) = seen.insert(key, slot_index) {
            report.problem(format!(
                "key {key} stored in slots {first} and {slot_index}"
            ));
        }

        match probe_distance(table, &key, slot_index) {
            Ok(probes) => *report.probe_lengths.entry(probes).or_default() += 1,
            Err(Some(blocked_at)) => report.problem(format!(
                "key {key} in slot {slot_index} is unreachable: probe hits empty slot {blocked_at}"
            )),
            Err(None) => report.problem(format!(
                "key {key} in slot {slot_index} is unreachable: not on its probe sequence"
            )),
        }
    }

    check_coverage(&mut report, ranges, data_bytes);

    report.load_factor = report.occupied as f64 / modulus as f64;
    debug!(
        "Inspected {} slots: {} occupied, {} problems",
        modulus, report.occupied, report.problem_count
    );
    report
}

/// Number of probes a lookup for `key` takes to reach `target`.
///
/// Fails with the empty slot that stops the lookup first, or `None` when the
/// sequence ends without visiting `target`.
fn probe_distance(
    table: &MappedTable,
    key: &StoredKey<'_>,
    target: u64,
) -> Result<u64, Option<u64>> {
    let mut probes = 0;
    for slot_index in ProbeSequence::new(key, table.modulus()) {
        probes += 1;
        if slot_index == target {
            return Ok(probes);
        }
        if table.slot(slot_index).is_empty() {
            return Err(Some(slot_index));
        }
    }
    Err(None)
}

fn check_coverage(report: &mut TableReport, mut ranges: Vec<Slot>, data_bytes: u64) {
    ranges.sort_unstable_by_key(|slot| slot.from);

    let mut cursor = 0u64;
    for slot in ranges {
        if slot.from > cursor {
            report.problem(format!(
                "data bytes {cursor}..{} belong to no record",
                slot.from
            ));
        } else if slot.from < cursor {
            report.problem(format!(
                "record {}..{} overlaps the previous record ending at {cursor}",
                slot.from, slot.to
            ));
        }
        cursor = cursor.max(slot.to);
    }

    if cursor < data_bytes {
        report.problem(format!(
            "data bytes {cursor}..{data_bytes} belong to no record"
        ));
    }
}
