//! packnorm public API.
//!
//! The transport layer calls [`normalize`] once per decoded result. Container
//! fields still holding generic wire nodes come back as concrete containers of
//! their declared element type; everything else is left alone.

#![forbid(unsafe_code)]

use std::time::Instant;

use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use packnorm_core::{
    BoundedQueue, Capability, Container, Element, ElementType, Error, Item, Kind, Node, Policy, Remap, Remapped,
    Result, Shape,
};
pub use packnorm_schema::{eligible, survey, Eligibility, FieldDescriptor, FieldRef, FieldTable, Record};

/// Counters for one normalization call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeReport {
    pub record: String,
    pub skipped_leaf: bool,
    pub fields_visited: usize,
    pub fields_remapped: usize,
    pub elements_converted: usize,
    pub elements_passed_through: usize,
    pub elements_collapsed: usize,
}

impl NormalizeReport {
    fn absorb(&mut self, r: Remapped) {
        self.fields_remapped += 1;
        self.elements_converted += r.converted;
        self.elements_passed_through += r.passed_through;
        self.elements_collapsed += r.collapsed;
    }
}

/// Normalization pass with a configurable replacement policy.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    policy: Policy,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: Policy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Normalize `result` in place.
    ///
    /// Stops at the first failing field. Fields processed before it keep their
    /// replacement, so a failed call leaves `result` unusable.
    pub fn run<R: Record>(&self, result: &mut R) -> Result<NormalizeReport> {
        let t0 = Instant::now();
        counter!("normalize_calls", 1u64);
        let out = self.run_fields(result);
        histogram!("normalize_latency_ms", t0.elapsed().as_secs_f64() * 1000.0);
        match &out {
            Ok(report) => {
                counter!("normalize_fields_remapped", report.fields_remapped as u64);
                counter!("normalize_elements_converted", report.elements_converted as u64);
            }
            Err(e) => {
                counter!("normalize_errors", 1u64);
                debug!(record = R::record_name(), error = %e, "normalize failed");
            }
        }
        out
    }

    fn run_fields<R: Record>(&self, result: &mut R) -> Result<NormalizeReport> {
        let mut report = NormalizeReport { record: R::record_name().to_string(), ..Default::default() };
        if packnorm_schema::is_uninteresting::<R>() {
            report.skipped_leaf = true;
            return Ok(report);
        }
        for field in eligible::<R>() {
            report.fields_visited += 1;
            let Some(FieldRef::Container(container)) = field.access(result)? else {
                continue;
            };
            let remapped = container.remap(field.name(), field.element_type(), &self.policy)?;
            debug!(
                record = R::record_name(),
                field = field.name(),
                kind = ?remapped.kind,
                converted = remapped.converted,
                passed_through = remapped.passed_through,
                "remapped container field"
            );
            report.absorb(remapped);
        }
        Ok(report)
    }

    /// Normalize and hand the same object back.
    pub fn normalize<R: Record>(&self, mut result: R) -> Result<R> {
        self.run(&mut result)?;
        Ok(result)
    }
}

/// Normalize `result` with the default policy.
pub fn normalize<R: Record>(result: R) -> Result<R> {
    Normalizer::default().normalize(result)
}

pub fn normalize_in_place<R: Record>(result: &mut R) -> Result<NormalizeReport> {
    Normalizer::default().run(result)
}
