//! Bundling strategy selection.
//!
//! The stager's composition rule is fixed: try the local slot if it is
//! filled, otherwise (or on failure) the container slot. Each [`BundleMode`]
//! is expressed purely by how the two slots are filled:
//!
//! | mode | local slot | container slot |
//! |---|---|---|
//! | `local-with-docker-fallback` | [`LocalEngine`] | [`DockerImage`] |
//! | `local-only` | [`LocalEngine`] | [`UnavailableImage`] |
//! | `docker-only` | empty | [`DockerImage`] |
//!
//! [`LocalEngine`]: crate::engine::LocalEngine
//! [`DockerImage`]: crate::engine::DockerImage

use layerpack_schema::BundleMode;

use crate::engine::{
    ContainerEngine, DOCKER_DISABLED_MESSAGE, EngineFactory, EngineSelection, UnavailableImage,
};

/// Bundling options accepted at the packaging entry point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BundlingOptions {
    /// Requested mode; `local-with-docker-fallback` when omitted.
    pub bundle_mode: Option<BundleMode>,
}

impl BundlingOptions {
    /// Options requesting `mode`.
    pub fn with_mode(mode: BundleMode) -> Self {
        Self {
            bundle_mode: Some(mode),
        }
    }

    /// The effective mode.
    pub fn mode(&self) -> BundleMode {
        self.bundle_mode.unwrap_or_default()
    }
}

/// Fill the engine slots for `mode`.
///
/// Only the engines the mode needs are constructed; `docker-only` never asks
/// the factory for a local engine. No processes run here.
pub fn select(mode: BundleMode, factory: &dyn EngineFactory) -> EngineSelection {
    let selection = match mode {
        BundleMode::LocalWithDockerFallback => EngineSelection {
            local: Some(factory.local_engine()),
            container: ContainerEngine::Docker(factory.container_image()),
        },
        BundleMode::LocalOnly => EngineSelection {
            local: Some(factory.local_engine()),
            container: ContainerEngine::Unavailable(UnavailableImage::new(
                DOCKER_DISABLED_MESSAGE,
            )),
        },
        BundleMode::DockerOnly => EngineSelection {
            local: None,
            container: ContainerEngine::Docker(factory.container_image()),
        },
    };

    tracing::debug!(
        "Selected engines for {mode}: local={}, container={}",
        selection.local.is_some(),
        if selection.container.is_available() {
            "docker"
        } else {
            "unavailable"
        }
    );
    selection
}

/// [`select`] driven by entry-point options.
pub fn select_with_options(
    options: &BundlingOptions,
    factory: &dyn EngineFactory,
) -> EngineSelection {
    select(options.mode(), factory)
}
