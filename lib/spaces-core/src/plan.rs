//! Machine-slot assignment plan
//!
//! One slot per bundle unit, in service declaration order, with a bootstrap
//! slot prepended. The bootstrap slot carries every segment used anywhere in
//! the bundle.

use crate::{Result, Segment, SpacesError};
use spaces_api::Bundle;

/// What a machine slot will host
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlotRole {
    Bootstrap,
    Unit { service: String, index: u32 },
}

/// Segment requirements for one machine
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MachineSlot {
    pub role: SlotRole,
    pub segments: Vec<String>,
}

impl MachineSlot {
    pub fn is_bootstrap(&self) -> bool {
        self.role == SlotRole::Bootstrap
    }
}

/// Ordered machine slots; slot 0 is always the bootstrap slot
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssignmentPlan {
    slots: Vec<MachineSlot>,
}

impl AssignmentPlan {
    pub fn from_bundle(bundle: &Bundle) -> Self {
        let mut all_segments: Vec<String> = Vec::new();
        let mut unit_slots = Vec::with_capacity(bundle.unit_count());

        for (service, spec) in &bundle.services {
            let segments: Vec<String> = spec.segments().into_iter().map(String::from).collect();
            for segment in &segments {
                if !all_segments.contains(segment) {
                    all_segments.push(segment.clone());
                }
            }
            for index in 0..spec.num_units {
                unit_slots.push(MachineSlot {
                    role: SlotRole::Unit {
                        service: service.clone(),
                        index,
                    },
                    segments: segments.clone(),
                });
            }
        }

        let mut slots = Vec::with_capacity(unit_slots.len() + 1);
        slots.push(MachineSlot {
            role: SlotRole::Bootstrap,
            segments: all_segments,
        });
        slots.extend(unit_slots);
        Self { slots }
    }

    pub fn slots(&self) -> &[MachineSlot] {
        &self.slots
    }

    /// Machines needed, bootstrap included
    pub fn machine_count(&self) -> usize {
        self.slots.len()
    }

    /// Every segment the bundle binds to, in first-seen order
    pub fn all_segments(&self) -> &[String] {
        &self.slots[0].segments
    }

    /// Reject plans that bind to segments missing from the topology
    pub fn validate_against(&self, segments: &[Segment]) -> Result<()> {
        for name in self.all_segments() {
            if !segments.iter().any(|s| s.name() == name) {
                return Err(SpacesError::UnknownSegment(name.clone()));
            }
        }
        Ok(())
    }
}
