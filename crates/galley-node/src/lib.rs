//! Galley's box-and-glue node model.
//!
//! This crate provides the vocabulary of paragraph typesetting: fixed-point
//! [geometry](geom), the closed set of [node variants](node::Node), and the
//! arena-backed [chains](node::NodeList) that link nodes into lists. The
//! packers and the line breaker live in `galley-layout` and operate purely
//! on the types defined here.

pub mod diag;
pub mod geom;
pub mod node;
