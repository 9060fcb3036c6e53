//! Standard reconstruction components and the table that declares them.
//!
//! A component consumes a few record kinds and produces one or more interval
//! kinds. The table is built once and injected into each session, which
//! instantiates a component only when one of its interval kinds is queried.

pub mod android;
pub mod bus;
pub mod clock;
pub mod cpu;
pub mod irq;

use crate::reconstruct::{IntervalKind, Reconstructor};
use crate::utils::error::RegistryError;
use std::collections::BTreeMap;

// Re-export main types
pub use android::AndroidComponent;
pub use bus::BusComponent;
pub use clock::ClockComponent;
pub use cpu::CpuComponent;
pub use irq::IrqComponent;

/// Builds a fresh, empty component
pub type ComponentFactory = fn() -> Box<dyn Reconstructor>;

/// Declaration of one component
#[derive(Debug, Clone, Copy)]
pub struct ComponentSpec {
    pub name: &'static str,
    pub produces: &'static [IntervalKind],
    pub factory: ComponentFactory,
}

impl ComponentSpec {
    /// Record kinds fed to the component: the union of what its kinds read
    pub fn consumes(&self) -> Vec<&'static str> {
        let mut kinds: Vec<&'static str> = self
            .produces
            .iter()
            .flat_map(|kind| kind.consumes().iter().copied())
            .collect();
        kinds.sort_unstable();
        kinds.dedup();
        kinds
    }
}

fn new_android() -> Box<dyn Reconstructor> {
    Box::new(AndroidComponent::new())
}

fn new_clock() -> Box<dyn Reconstructor> {
    Box::new(ClockComponent::new())
}

fn new_cpu() -> Box<dyn Reconstructor> {
    Box::new(CpuComponent::new())
}

fn new_irq() -> Box<dyn Reconstructor> {
    Box::new(IrqComponent::new())
}

fn new_bus() -> Box<dyn Reconstructor> {
    Box::new(BusComponent::new())
}

const STANDARD_COMPONENTS: &[ComponentSpec] = &[
    ComponentSpec {
        name: "android",
        produces: &[
            IntervalKind::Section,
            IntervalKind::AsyncSection,
            IntervalKind::Counter,
        ],
        factory: new_android,
    },
    ComponentSpec {
        name: "clock",
        produces: &[IntervalKind::ClockFrequency],
        factory: new_clock,
    },
    ComponentSpec {
        name: "cpu",
        produces: &[
            IntervalKind::CpuFrequency,
            IntervalKind::CpuIdle,
            IntervalKind::TaskRun,
        ],
        factory: new_cpu,
    },
    ComponentSpec {
        name: "irq",
        produces: &[IntervalKind::Irq, IntervalKind::Softirq, IntervalKind::Workqueue],
        factory: new_irq,
    },
    ComponentSpec {
        name: "bus",
        produces: &[IntervalKind::BusVote],
        factory: new_bus,
    },
];

/// Components available to a session, indexed by the kinds they produce
#[derive(Debug, Clone, Default)]
pub struct ComponentTable {
    specs: Vec<ComponentSpec>,
    owners: BTreeMap<IntervalKind, usize>,
}

impl ComponentTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with every built-in component
    ///
    /// # Errors
    /// * `RegistryError::DuplicateProducer` - Two built-ins claim one kind
    pub fn standard() -> Result<Self, RegistryError> {
        let mut table = Self::new();
        for spec in STANDARD_COMPONENTS {
            table.register(*spec)?;
        }
        Ok(table)
    }

    /// Add a component
    ///
    /// **Public** - tests and embedders can register their own components
    ///
    /// # Errors
    /// * `RegistryError::DuplicateProducer` - A kind already has a producer
    pub fn register(&mut self, spec: ComponentSpec) -> Result<(), RegistryError> {
        for kind in spec.produces {
            if let Some(&owner) = self.owners.get(kind) {
                return Err(RegistryError::DuplicateProducer {
                    kind: kind.to_string(),
                    owner: self.specs[owner].name.to_string(),
                });
            }
        }

        let index = self.specs.len();
        for kind in spec.produces {
            self.owners.insert(*kind, index);
        }
        self.specs.push(spec);
        Ok(())
    }

    /// Index and declaration of the component producing `kind`
    pub fn owner(&self, kind: IntervalKind) -> Option<(usize, &ComponentSpec)> {
        let index = *self.owners.get(&kind)?;
        Some((index, &self.specs[index]))
    }

    pub fn specs(&self) -> &[ComponentSpec] {
        &self.specs
    }

    /// Interval kinds with a producer, in kind order
    pub fn kinds(&self) -> impl Iterator<Item = IntervalKind> + '_ {
        self.owners.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_covers_every_kind() {
        let table = ComponentTable::standard().unwrap();
        assert_eq!(table.len(), 5);
        for kind in IntervalKind::ALL {
            assert!(table.owner(kind).is_some(), "no producer for {}", kind);
        }
    }

    #[test]
    fn test_duplicate_producer_rejected() {
        let mut table = ComponentTable::standard().unwrap();
        let err = table
            .register(ComponentSpec {
                name: "clock2",
                produces: &[IntervalKind::ClockFrequency],
                factory: new_clock,
            })
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateProducer {
                kind: "clock_frequency".to_string(),
                owner: "clock".to_string()
            }
        );
    }

    #[test]
    fn test_consumes_is_union_of_requirements() {
        let table = ComponentTable::standard().unwrap();
        let (_, irq) = table.owner(IntervalKind::Irq).unwrap();
        assert_eq!(
            irq.consumes(),
            vec![
                "irq_handler_entry",
                "irq_handler_exit",
                "softirq_entry",
                "softirq_exit",
                "workqueue_execute_end",
                "workqueue_execute_start",
            ]
        );
    }
}
