use std::sync::Arc;

use crate::error::BehaviorError;
use crate::record::Record;

/// Moment in a record's load/persist flow at which behaviors run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// Record populated from a query result.
    AfterFind,
    AfterInsert,
    AfterUpdate,
    BeforeInsert,
    BeforeUpdate,
}

impl LifecycleEvent {
    pub const ALL: [LifecycleEvent; 5] = [
        LifecycleEvent::AfterFind,
        LifecycleEvent::AfterInsert,
        LifecycleEvent::AfterUpdate,
        LifecycleEvent::BeforeInsert,
        LifecycleEvent::BeforeUpdate,
    ];

    /// Hook a behavior runs for this event.
    pub fn hook(self) -> Hook {
        match self {
            LifecycleEvent::AfterFind => Hook::AfterLoad,
            LifecycleEvent::AfterInsert | LifecycleEvent::AfterUpdate => Hook::AfterPersist,
            LifecycleEvent::BeforeInsert | LifecycleEvent::BeforeUpdate => Hook::BeforePersist,
        }
    }
}

impl std::fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleEvent::AfterFind => write!(f, "after_find"),
            LifecycleEvent::AfterInsert => write!(f, "after_insert"),
            LifecycleEvent::AfterUpdate => write!(f, "after_update"),
            LifecycleEvent::BeforeInsert => write!(f, "before_insert"),
            LifecycleEvent::BeforeUpdate => write!(f, "before_update"),
        }
    }
}

/// The three integration points a behavior implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    AfterLoad,
    AfterPersist,
    BeforePersist,
}

/// Behavior attached to a record type.
///
/// Stateless apart from its configuration: every hook receives the record it
/// operates on. Hooks not overridden do nothing.
pub trait Behavior: Send + Sync {
    /// Name for logs.
    fn name(&self) -> &str;

    /// Events this behavior subscribes to. Default: all of them.
    fn events(&self) -> &[LifecycleEvent] {
        &LifecycleEvent::ALL
    }

    fn after_load(&self, _record: &mut dyn Record) -> Result<(), BehaviorError> {
        Ok(())
    }

    fn after_persist(&self, _record: &mut dyn Record) -> Result<(), BehaviorError> {
        Ok(())
    }

    fn before_persist(&self, _record: &mut dyn Record) -> Result<(), BehaviorError> {
        Ok(())
    }
}

/// Host-side callback table: behaviors in attachment order.
#[derive(Default, Clone)]
pub struct Lifecycle {
    behaviors: Vec<Arc<dyn Behavior>>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, behavior: Arc<dyn Behavior>) {
        tracing::debug!(behavior = behavior.name(), events = ?behavior.events(), "behavior attached");
        self.behaviors.push(behavior);
    }

    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }

    /// Run `event` on every subscribed behavior. The first error stops the
    /// dispatch and is returned to the host, which aborts the operation.
    pub fn trigger(
        &self,
        event: LifecycleEvent,
        record: &mut dyn Record,
    ) -> Result<(), BehaviorError> {
        let hook = event.hook();
        for behavior in &self.behaviors {
            if !behavior.events().contains(&event) {
                continue;
            }
            tracing::trace!(behavior = behavior.name(), %event, "dispatching");
            let result = match hook {
                Hook::AfterLoad => behavior.after_load(record),
                Hook::AfterPersist => behavior.after_persist(record),
                Hook::BeforePersist => behavior.before_persist(record),
            };
            if let Err(e) = result {
                tracing::warn!(behavior = behavior.name(), %event, error = %e, "behavior failed");
                return Err(e);
            }
        }
        Ok(())
    }
}
