#![allow(clippy::too_many_arguments, clippy::type_complexity)]

pub mod domain;
pub mod handlers;
pub mod projections;
pub mod shared;
pub mod system;
pub mod usecases;
