//! Connector lifecycle.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use super::collection::MetadataCollection;
use super::config::ConnectorConfig;
use crate::catalog::CatalogAccess;
use crate::error::{Error, Result};
use crate::mapping::{MappingTable, TypeMappingRegistry};

/// Connector state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Initialized,
    Started,
    Stopped,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Created => write!(f, "created"),
            LifecycleState::Initialized => write!(f, "initialized"),
            LifecycleState::Started => write!(f, "started"),
            LifecycleState::Stopped => write!(f, "stopped"),
        }
    }
}

/// A catalog connector driven through `initialize`, `start` and `stop`.
///
/// Repository operations are only handed out while started.
pub struct Connector {
    config: Arc<ConnectorConfig>,
    catalog: Arc<dyn CatalogAccess>,
    registry: RwLock<Option<Arc<TypeMappingRegistry>>>,
    state: RwLock<LifecycleState>,
}

impl Connector {
    /// Create a connector in the `Created` state.
    pub fn new(config: ConnectorConfig, catalog: Arc<dyn CatalogAccess>) -> Self {
        Self {
            config: Arc::new(config),
            catalog,
            registry: RwLock::new(None),
            state: RwLock::new(LifecycleState::Created),
        }
    }

    /// Current state.
    pub fn state(&self) -> LifecycleState {
        *self.state.read()
    }

    /// The connector configuration.
    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    /// Load the mapping table named by the configuration and build the
    /// registry.
    pub fn initialize(&self) -> Result<()> {
        let table = match &self.config.mapping_path {
            Some(path) => MappingTable::from_path(path)?,
            None => MappingTable::default(),
        };
        self.initialize_with(table)
    }

    /// Build the registry from an already loaded mapping table.
    pub fn initialize_with(&self, table: MappingTable) -> Result<()> {
        let mut state = self.state.write();
        expect_state(*state, LifecycleState::Created, "initialize")?;
        let registry =
            TypeMappingRegistry::from_table(&table, self.config.reserved_types.iter().cloned());
        *self.registry.write() = Some(Arc::new(registry));
        *state = LifecycleState::Initialized;
        info!(
            repository = %self.config.repository_name,
            mappings = table.len(),
            "Connector initialized"
        );
        Ok(())
    }

    /// Begin serving repository operations.
    pub fn start(&self) -> Result<()> {
        let mut state = self.state.write();
        expect_state(*state, LifecycleState::Initialized, "start")?;
        *state = LifecycleState::Started;
        info!(repository = %self.config.repository_name, "Connector started");
        Ok(())
    }

    /// Stop serving repository operations. Stopping is final.
    pub fn stop(&self) -> Result<()> {
        let mut state = self.state.write();
        match *state {
            LifecycleState::Initialized | LifecycleState::Started => {
                *state = LifecycleState::Stopped;
                *self.registry.write() = None;
                info!(repository = %self.config.repository_name, "Connector stopped");
                Ok(())
            }
            current => Err(Error::InvalidLifecycle {
                action: "stop",
                state: current,
            }),
        }
    }

    /// The repository operations of a started connector.
    pub fn metadata_collection(&self) -> Result<MetadataCollection> {
        let state = self.state.read();
        expect_state(*state, LifecycleState::Started, "serve requests")?;
        let registry = self.registry.read().clone().ok_or(Error::InvalidLifecycle {
            action: "serve requests",
            state: *state,
        })?;
        Ok(MetadataCollection::new(
            self.config.clone(),
            registry,
            self.catalog.clone(),
        ))
    }
}

fn expect_state(current: LifecycleState, expected: LifecycleState, action: &'static str) -> Result<()> {
    if current == expected {
        Ok(())
    } else {
        Err(Error::InvalidLifecycle {
            action,
            state: current,
        })
    }
}
