//! The pipeline component model.
//!
//! This module provides:
//! - [`Component`], the closed union every pipeline node belongs to
//! - [`Service`], the leaf wrapping a single user handler
//! - [`ServiceGroup`], the sequential/concurrent composite
//! - Start conditions and before/after extra handlers

mod component;
pub mod conditions;
mod extra;
mod group;
mod service;

pub use component::{Component, ComponentCore};
pub use conditions::StartCondition;
pub use extra::{
    extra_handler_fn, ExtraHandler, ExtraHandlerFunction, ExtraHandlerRuntime, ExtraHandlerStage,
    GlobalExtraHandlerKind, ServiceRuntimeInfo,
};
pub use group::ServiceGroup;
pub use service::{Service, ServiceHandler};
