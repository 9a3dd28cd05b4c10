//! Named effect dispenser
//!
//! Telemetry code addresses effects by name (`effects.get("buffeting")`) and
//! lets the registry create them on first use.

use std::collections::BTreeMap;

use tracing::debug;

use crate::connection::DeviceConnection;
use crate::haptic::HapticEffect;

/// Named collection of [`HapticEffect`]s on one connection
#[derive(Debug)]
pub struct EffectRegistry {
    connection: DeviceConnection,
    effects: BTreeMap<String, HapticEffect>,
}

impl EffectRegistry {
    pub fn new(connection: DeviceConnection) -> Self {
        Self {
            connection,
            effects: BTreeMap::new(),
        }
    }

    /// Effect registered under `name`, created empty on first access
    pub fn get(&mut self, name: &str) -> &mut HapticEffect {
        let connection = &self.connection;
        self.effects.entry(name.to_string()).or_insert_with(|| {
            debug!("Registering effect \"{}\"", name);
            HapticEffect::named(connection.clone(), name)
        })
    }

    /// Destroy and forget the named effect; returns whether it existed
    pub fn dispose(&mut self, name: &str) -> bool {
        match self.effects.remove(name) {
            Some(mut effect) => {
                effect.destroy();
                true
            }
            None => false,
        }
    }

    /// Destroy every effect
    pub fn clear(&mut self) {
        for (_, mut effect) in std::mem::take(&mut self.effects) {
            effect.destroy();
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.effects.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.effects.keys().map(String::as_str).collect()
    }

    /// Visit every effect, e.g. to stop all of them at the end of a frame
    pub fn for_each(&mut self, mut f: impl FnMut(&str, &mut HapticEffect)) {
        for (name, effect) in self.effects.iter_mut() {
            f(name, effect);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionConfig;
    use rhino_transport::mock::{MockOpener, MockTransport};
    use rhino_transport::protocol::report_id;

    fn registry() -> (MockTransport, EffectRegistry) {
        let mock = MockTransport::new();
        let conn =
            DeviceConnection::with_opener(MockOpener::new(mock.clone()), ConnectionConfig::default())
                .unwrap();
        (mock, EffectRegistry::new(conn))
    }

    #[test]
    fn test_get_creates_once() {
        let (_mock, mut effects) = registry();
        effects.get("spring").spring(Some(100), Some(100));
        let slot = effects.get("spring").slot();
        assert_eq!(slot, 1);
        assert_eq!(effects.len(), 1);
        assert_eq!(effects.get("spring").name(), Some("spring"));
    }

    #[test]
    fn test_dispose_frees_slot() {
        let (mock, mut effects) = registry();
        effects.get("a").damper(Some(100), None);
        effects.get("b").damper(Some(200), None);
        assert!(effects.dispose("a"));
        assert!(!effects.dispose("a"));
        assert!(!effects.contains("a"));
        assert_eq!(mock.allocated_slots(), vec![2]);
    }

    #[test]
    fn test_clear_and_names() {
        let (mock, mut effects) = registry();
        effects.get("z").inertia(Some(1), None);
        effects.get("m").friction(Some(1), None);
        assert_eq!(effects.names(), vec!["m", "z"]);

        effects.clear();
        assert!(effects.is_empty());
        assert!(mock.allocated_slots().is_empty());
        assert_eq!(mock.writes_with_id(report_id::BLOCK_FREE).len(), 2);
    }

    #[test]
    fn test_for_each_stop() {
        let (_mock, mut effects) = registry();
        effects.get("a").spring(Some(1), None).start(false);
        effects.get("b").spring(Some(2), None).start(false);
        effects.for_each(|_, e| {
            e.stop(None);
        });
        assert!(!effects.get("a").started());
        assert!(!effects.get("b").started());
    }
}
