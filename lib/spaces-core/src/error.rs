use spaces_api::BundleError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SpacesError>;

#[derive(Error, Debug)]
pub enum SpacesError {
    #[error("Invalid topology configuration: {0}")]
    InvalidTopologyConfig(String),

    #[error("Invalid bundle: {0}")]
    InvalidBundle(#[from] BundleError),

    #[error("Bundle binds to segment {0:?}, which is not configured")]
    UnknownSegment(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unable to find a MAAS fabric called {0:?}. You need to set it up before running this tool.")]
    ManagedFabricNotFound(String),

    #[error("No MAAS subnet with CIDR {0} exists. Subnets must be created with the managed network before running this tool.")]
    SubnetNotFound(String),

    #[error("Could not find the MAAS managed network on node {0}")]
    ManagedNetworkNotFound(String),

    #[error("Bootstrap node not configured")]
    NoBootstrapNode,

    #[error("Bundle needs {required} machines (including bootstrap) but MAAS has {available}")]
    NotEnoughNodes { required: usize, available: usize },

    #[error("MAAS has no {kind} named {name:?}")]
    MissingInventoryObject { kind: &'static str, name: String },

    #[error("{command} returned {status}: {output}")]
    RemoteCommand {
        command: String,
        status: i32,
        output: String,
    },

    #[error("{0} timed out")]
    CommandTimeout(String),

    #[error("Failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unexpected response from {command}: {source}")]
    Decode {
        command: String,
        #[source]
        source: serde_json::Error,
    },
}

impl SpacesError {
    /// Errors caused by configuration, raised before any remote mutation
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SpacesError::InvalidTopologyConfig(_)
                | SpacesError::InvalidBundle(_)
                | SpacesError::UnknownSegment(_)
                | SpacesError::Config(_)
        )
    }

    /// Errors caused by an environment that was never prepared; never retried
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            SpacesError::ManagedFabricNotFound(_)
                | SpacesError::SubnetNotFound(_)
                | SpacesError::ManagedNetworkNotFound(_)
                | SpacesError::NoBootstrapNode
                | SpacesError::NotEnoughNodes { .. }
                | SpacesError::MissingInventoryObject { .. }
        )
    }
}
