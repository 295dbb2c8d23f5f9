//! Prelude module for common estimator types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use danang_estimator::prelude::*;`

pub use crate::core::{
    config::{
        CameraTransitionConfig, EndpointConfig, EstimatorConfig, LibraryAssets,
        LibraryWaitConfig, MapSessionConfig, MapStyle,
    },
    geo::Coordinate,
};

pub use crate::district::{canonical_key, resolve, AdminPrefix, District};

pub use crate::map::{
    events::{EventManager, SessionEvent},
    library::{
        ControlPosition, FlyToOptions, MapControl, MapInstance, MapLibrary, MapViewOptions,
        MarkerId, MarkerOptions, PopupContent,
    },
    loader::LibraryLoader,
    session::{MapSession, SessionState},
    token::{HttpTokenSource, StaticTokenSource, TokenSource},
};

pub use crate::prediction::{
    gateway::{PredictionGateway, Predictor},
    request::PredictionInput,
    response::{Estimates, ModelEstimate, PredictionResult},
};

pub use crate::form::{FieldError, FormState};
pub use crate::estimator::Estimator;

pub use crate::runtime::{runtime, spawn, AsyncHandle, AsyncSpawner};

pub use crate::{Error as EstimatorError, Result};

pub use std::{
    pin::Pin,
    sync::{Arc, Mutex},
    time::Duration,
};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};

pub use futures::Future;
